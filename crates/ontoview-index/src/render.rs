//! Render functions producing display strings for entities

use ontoview_core::vocabulary;
use ontoview_core::{AnnotationProperty, AnnotationValue, Axiom, Entity, OntologySet};
use thiserror::Error;

/// Escape delimiter used to disambiguate colliding renderings
pub const ESCAPE_DELIMITER: char = '\'';

/// Failure to produce a rendering for one entity
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    #[error("No rendering available for {0}")]
    Unavailable(Entity),

    #[error("Renderer failed for {entity}: {message}")]
    Failed { entity: Entity, message: String },
}

/// Host-supplied `Entity -> String` function.
///
/// Must be callable repeatedly and must not depend on anything but the entity
/// and the ontologies it is given.
pub trait EntityRenderer {
    fn render(&self, entity: &Entity, ontologies: &OntologySet<'_>) -> Result<String, RenderError>;
}

impl<F> EntityRenderer for F
where
    F: Fn(&Entity) -> Result<String, RenderError>,
{
    fn render(&self, entity: &Entity, _ontologies: &OntologySet<'_>) -> Result<String, RenderError> {
        self(entity)
    }
}

/// Wrap a rendering in the escape delimiter
pub fn escape(rendering: &str) -> String {
    format!("{0}{1}{0}", ESCAPE_DELIMITER, rendering)
}

/// Whether the text is already wrapped in the escape delimiter
pub fn is_escaped(text: &str) -> bool {
    text.len() >= 2 && text.starts_with(ESCAPE_DELIMITER) && text.ends_with(ESCAPE_DELIMITER)
}

/// Renders the IRI short form
#[derive(Debug, Clone, Copy, Default)]
pub struct ShortFormRenderer;

impl EntityRenderer for ShortFormRenderer {
    fn render(&self, entity: &Entity, _ontologies: &OntologySet<'_>) -> Result<String, RenderError> {
        let short = entity.iri.short_form();
        if short.is_empty() {
            return Err(RenderError::Unavailable(entity.clone()));
        }
        Ok(short.to_string())
    }
}

/// Renders the value of a label annotation, falling back to the short form
#[derive(Debug, Clone)]
pub struct LabelRenderer {
    property: AnnotationProperty,
    language: Option<String>,
}

impl Default for LabelRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl LabelRenderer {
    /// Renderer over `rdfs:label`
    pub fn new() -> Self {
        Self {
            property: vocabulary::RDFS_LABEL.clone(),
            language: None,
        }
    }

    pub fn with_property(mut self, property: AnnotationProperty) -> Self {
        self.property = property;
        self
    }

    /// Prefer labels in this language when several exist
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    fn rank(&self, language: Option<&str>) -> u8 {
        match (self.language.as_deref(), language) {
            (Some(wanted), Some(found)) if wanted.eq_ignore_ascii_case(found) => 0,
            (_, None) => 1,
            _ => 2,
        }
    }
}

impl EntityRenderer for LabelRenderer {
    fn render(&self, entity: &Entity, ontologies: &OntologySet<'_>) -> Result<String, RenderError> {
        let best = ontologies
            .annotation_assertions(&entity.iri)
            .filter_map(|axiom| match axiom {
                Axiom::AnnotationAssertion {
                    property,
                    value: AnnotationValue::Literal(literal),
                    ..
                } if *property == self.property => Some(literal),
                _ => None,
            })
            .min_by(|a, b| {
                self.rank(a.language.as_deref())
                    .cmp(&self.rank(b.language.as_deref()))
                    .then_with(|| a.lexical.cmp(&b.lexical))
            });

        match best {
            Some(literal) if !literal.lexical.is_empty() => Ok(literal.lexical.clone()),
            _ => ShortFormRenderer.render(entity, ontologies),
        }
    }
}
