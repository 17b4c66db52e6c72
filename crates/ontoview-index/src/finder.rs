//! Lookup of entities by rendering, wildcard, regular expression or IRI

use crate::index::EntityIndex;
use crate::render::{is_escaped, ESCAPE_DELIMITER};
use ontoview_core::{Entity, EntityKind, Iri};
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;
use tracing::warn;

/// Wildcard character for [`EntityFinder::by_wildcard`]
pub const WILDCARD: char = '*';

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FinderError {
    #[error("Invalid search pattern {pattern:?}: {message}")]
    InvalidPattern { pattern: String, message: String },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMode {
    #[default]
    Wildcard,
    Regex,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FinderConfig {
    /// Mode used by [`EntityFinder::find`]
    pub default_mode: MatchMode,
    /// Regular expressions ignore case
    pub case_insensitive: bool,
}

impl Default for FinderConfig {
    fn default() -> Self {
        Self {
            default_mode: MatchMode::Wildcard,
            case_insensitive: true,
        }
    }
}

/// Read-only query facade over an [`EntityIndex`]
#[derive(Debug, Clone, Copy)]
pub struct EntityFinder<'a> {
    index: &'a EntityIndex,
    config: &'a FinderConfig,
}

impl<'a> EntityFinder<'a> {
    pub fn new(index: &'a EntityIndex, config: &'a FinderConfig) -> Self {
        Self { index, config }
    }

    /// Exact rendering lookup, falling back to the escaped form
    pub fn by_rendering(&self, kind: EntityKind, text: &str) -> Option<Entity> {
        self.index.by_rendering(kind, text).cloned()
    }

    /// Entities of `kind` whose rendering matches a `*` wildcard pattern.
    ///
    /// Matching ignores case. A pattern without `*` must match the whole
    /// rendering, and a blank pattern matches nothing.
    pub fn by_wildcard(&self, kind: EntityKind, pattern: &str) -> HashSet<Entity> {
        let Some(matcher) = Wildcard::parse(pattern) else {
            return HashSet::new();
        };
        self.index
            .entries(kind)
            .filter(|(rendering, _)| matcher.matches(unescaped(rendering)))
            .map(|(_, entity)| entity.clone())
            .collect()
    }

    /// Entities of `kind` with a rendering containing a match of `pattern`
    pub fn try_by_regex(&self, kind: EntityKind, pattern: &str) -> Result<HashSet<Entity>, FinderError> {
        let regex = self.compile(pattern)?;
        Ok(self
            .index
            .entries(kind)
            .filter(|(rendering, _)| regex.is_match(unescaped(rendering)))
            .map(|(_, entity)| entity.clone())
            .collect())
    }

    /// Like [`try_by_regex`](Self::try_by_regex), but an invalid pattern is
    /// logged and yields no results
    pub fn by_regex(&self, kind: EntityKind, pattern: &str) -> HashSet<Entity> {
        self.try_by_regex(kind, pattern).unwrap_or_else(|err| {
            warn!("{}", err);
            HashSet::new()
        })
    }

    /// All indexed entities with this IRI, one per kind it is used as
    pub fn by_iri(&self, iri: &Iri) -> HashSet<Entity> {
        EntityKind::ALL
            .iter()
            .map(|kind| Entity::new(*kind, iri.clone()))
            .filter(|entity| self.index.contains(entity))
            .collect()
    }

    /// Search one kind using the configured default mode
    pub fn find(&self, kind: EntityKind, pattern: &str) -> HashSet<Entity> {
        match self.config.default_mode {
            MatchMode::Wildcard => self.by_wildcard(kind, pattern),
            MatchMode::Regex => self.by_regex(kind, pattern),
        }
    }

    /// Search every kind using the configured default mode
    pub fn find_any(&self, pattern: &str) -> HashSet<Entity> {
        EntityKind::ALL
            .iter()
            .flat_map(|kind| self.find(*kind, pattern))
            .collect()
    }

    fn compile(&self, pattern: &str) -> Result<Regex, FinderError> {
        RegexBuilder::new(pattern)
            .case_insensitive(self.config.case_insensitive)
            .build()
            .map_err(|err| FinderError::InvalidPattern {
                pattern: pattern.to_string(),
                message: err.to_string(),
            })
    }
}

fn unescaped(rendering: &str) -> &str {
    if is_escaped(rendering) {
        &rendering[ESCAPE_DELIMITER.len_utf8()..rendering.len() - ESCAPE_DELIMITER.len_utf8()]
    } else {
        rendering
    }
}

/// Compiled `*` pattern
#[derive(Debug, Clone, PartialEq, Eq)]
enum Wildcard {
    Any,
    Exact(String),
    Segments {
        anchored_start: bool,
        anchored_end: bool,
        parts: Vec<String>,
    },
}

impl Wildcard {
    fn parse(pattern: &str) -> Option<Self> {
        let pattern = pattern.trim();
        if pattern.is_empty() {
            return None;
        }
        if pattern.chars().all(|c| c == WILDCARD) {
            return Some(Wildcard::Any);
        }
        let lowered = pattern.to_lowercase();
        if !lowered.contains(WILDCARD) {
            return Some(Wildcard::Exact(lowered));
        }

        Some(Wildcard::Segments {
            anchored_start: !lowered.starts_with(WILDCARD),
            anchored_end: !lowered.ends_with(WILDCARD),
            parts: lowered
                .split(WILDCARD)
                .filter(|part| !part.is_empty())
                .map(str::to_string)
                .collect(),
        })
    }

    fn matches(&self, text: &str) -> bool {
        match self {
            Wildcard::Any => true,
            Wildcard::Exact(expected) => text.to_lowercase() == *expected,
            Wildcard::Segments {
                anchored_start,
                anchored_end,
                parts,
            } => {
                let text = text.to_lowercase();
                let mut rest = text.as_str();
                let mut parts = parts.as_slice();

                if *anchored_start {
                    let Some((first, tail)) = parts.split_first() else {
                        return true;
                    };
                    let Some(after) = rest.strip_prefix(first.as_str()) else {
                        return false;
                    };
                    rest = after;
                    parts = tail;
                }

                let mut suffix = None;
                if *anchored_end {
                    if let Some((last, init)) = parts.split_last() {
                        suffix = Some(last);
                        parts = init;
                    }
                }

                for part in parts {
                    match rest.find(part.as_str()) {
                        Some(at) => rest = &rest[at + part.len()..],
                        None => return false,
                    }
                }

                suffix.map_or(true, |last| rest.ends_with(last.as_str()))
            }
        }
    }
}
