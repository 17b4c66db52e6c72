//! Bidirectional entity <-> rendering index, partitioned by entity kind

use crate::kind_map::KindMap;
use crate::render::{escape, is_escaped, EntityRenderer, ESCAPE_DELIMITER};
use ontoview_core::vocabulary;
use ontoview_core::{changed_entities, Entity, EntityKind, Iri, OntologyChange, OntologySet};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use tracing::{debug, info, warn};

/// Index configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// Annotation properties indexed even when no ontology mentions them
    pub annotation_properties: Vec<Iri>,
    /// Index the built-in `xsd:` / `rdfs:Literal` datatypes
    pub builtin_datatypes: bool,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            annotation_properties: Vec::new(),
            builtin_datatypes: true,
        }
    }
}

/// Ordered copy of the index contents, for comparisons and export
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexSnapshot {
    pub kinds: BTreeMap<EntityKind, BTreeMap<String, Entity>>,
}

impl IndexSnapshot {
    pub fn len(&self) -> usize {
        self.kinds.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Entity <-> rendering index.
///
/// For every indexed entity its stored rendering is a key of exactly the
/// kind map matching its kind, and the union of the kind maps' values is the
/// set of indexed entities.
///
/// Entities sharing a rendering within a kind are seated canonically: the
/// smallest holds the plain rendering, the next holds its escaped form unless
/// another entity renders as that text, and any further ones wait unindexed
/// until a slot frees up. The result depends only on the set of entities, never on
/// the order they arrived in.
#[derive(Debug, Clone)]
pub struct EntityIndex {
    by_rendering: KindMap<HashMap<String, Entity>>,
    /// Natural rendering -> every entity of the kind that renders as it
    colliders: KindMap<HashMap<String, BTreeSet<Entity>>>,
    /// What the renderer produced, for every tracked entity
    naturals: HashMap<Entity, String>,
    /// Stored key of every indexed entity
    keys: HashMap<Entity, String>,
    builtins: HashSet<Entity>,
    config: IndexConfig,
}

impl Default for EntityIndex {
    fn default() -> Self {
        Self::new(IndexConfig::default())
    }
}

impl EntityIndex {
    pub fn new(config: IndexConfig) -> Self {
        Self {
            by_rendering: KindMap::default(),
            colliders: KindMap::default(),
            naturals: HashMap::new(),
            keys: HashMap::new(),
            builtins: Self::builtins_for(&config),
            config,
        }
    }

    fn builtins_for(config: &IndexConfig) -> HashSet<Entity> {
        let mut builtins: HashSet<Entity> = vocabulary::BUILTIN_ENTITIES
            .iter()
            .chain(vocabulary::BUILTIN_ANNOTATION_PROPERTIES.iter())
            .cloned()
            .collect();
        builtins.extend(
            config
                .annotation_properties
                .iter()
                .map(|iri| Entity::annotation_property(iri.clone())),
        );
        if config.builtin_datatypes {
            builtins.extend(vocabulary::BUILTIN_DATATYPES.iter().cloned());
        }
        builtins
    }

    pub fn config(&self) -> &IndexConfig {
        &self.config
    }

    /// Entities indexed regardless of the ontologies' signatures
    pub fn is_builtin(&self, entity: &Entity) -> bool {
        self.builtins.contains(entity)
    }

    /// Replace the contents with a fresh index of the ontologies' signature
    /// plus the built-ins. The new state is assembled separately and swapped
    /// in, so no partial state is ever observable.
    pub fn rebuild(&mut self, ontologies: &OntologySet<'_>, renderer: &dyn EntityRenderer) {
        let mut fresh = EntityIndex {
            by_rendering: KindMap::default(),
            colliders: KindMap::default(),
            naturals: HashMap::new(),
            keys: HashMap::new(),
            builtins: self.builtins.clone(),
            config: self.config.clone(),
        };

        let entities: BTreeSet<Entity> = ontologies
            .signature()
            .into_iter()
            .chain(self.builtins.iter().cloned())
            .collect();
        for entity in &entities {
            fresh.add_entity(entity, renderer, ontologies);
        }

        *self = fresh;
        info!(
            "Rebuilt entity index over {} ontologies: {} entities",
            ontologies.len(),
            self.len()
        );
    }

    /// Index one entity; no-op if it is already present.
    ///
    /// Returns whether the entity ended up holding a rendering.
    pub fn add_entity(
        &mut self,
        entity: &Entity,
        renderer: &dyn EntityRenderer,
        ontologies: &OntologySet<'_>,
    ) -> bool {
        if self.naturals.contains_key(entity) {
            return false;
        }
        match renderer.render(entity, ontologies) {
            Ok(rendering) => self.insert_rendering(entity.clone(), rendering),
            Err(err) => {
                warn!("Excluding {} from the entity index: {}", entity, err);
                false
            }
        }
    }

    fn insert_rendering(&mut self, entity: Entity, natural: String) -> bool {
        let kind = entity.kind;
        self.colliders
            .get_mut(kind)
            .entry(natural.clone())
            .or_default()
            .insert(entity.clone());
        self.naturals.insert(entity.clone(), natural.clone());
        self.reseat(kind, &natural);

        let indexed = self.keys.contains_key(&entity);
        if !indexed {
            warn!(
                "Rendering {:?} of {} collides even when escaped; entity held back",
                natural, entity
            );
        }
        indexed
    }

    /// Forget an entity's rendering and re-seat whoever shared it
    fn detach(&mut self, entity: &Entity) -> Option<String> {
        let natural = self.naturals.remove(entity)?;
        let groups = self.colliders.get_mut(entity.kind);
        if let Some(group) = groups.get_mut(&natural) {
            group.remove(entity);
            if group.is_empty() {
                groups.remove(&natural);
            }
        }
        self.reseat(entity.kind, &natural);
        Some(natural)
    }

    /// Recompute the two keys whose holders depend on `natural`'s colliders
    fn reseat(&mut self, kind: EntityKind, natural: &str) {
        self.seat(kind, natural.to_string());
        self.seat(kind, escape(natural));
    }

    fn seat(&mut self, kind: EntityKind, key: String) {
        let holder = self.holder_of(kind, &key);
        let map = self.by_rendering.get_mut(kind);
        let previous = match &holder {
            Some(holder) => map.insert(key.clone(), holder.clone()),
            None => map.remove(&key),
        };
        if let Some(previous) = previous.filter(|p| Some(p) != holder.as_ref()) {
            if self.keys.get(&previous) == Some(&key) {
                self.keys.remove(&previous);
            }
        }
        if let Some(holder) = holder {
            self.keys.insert(holder, key);
        }
    }

    /// A key belongs to the smallest entity rendering as it; failing that,
    /// an escaped key belongs to the second smallest entity rendering as the
    /// unescaped text
    fn holder_of(&self, kind: EntityKind, key: &str) -> Option<Entity> {
        let groups = self.colliders.get(kind);
        if let Some(first) = groups.get(key).and_then(|group| group.first()) {
            return Some(first.clone());
        }
        let inner = unescape(key)?;
        groups.get(inner).and_then(|group| group.iter().nth(1)).cloned()
    }

    /// Drop one entity; no-op if absent.
    ///
    /// Entities that shared its rendering move up: an escaped holder takes
    /// the plain rendering and a held-back one takes the escaped form.
    pub fn remove_entity(&mut self, entity: &Entity) -> bool {
        self.detach(entity).is_some()
    }

    /// Remove the current rendering, then re-add if the entity is still
    /// referenced. An unchanged rendering leaves the entry untouched.
    pub fn update_entity(
        &mut self,
        entity: &Entity,
        still_referenced: bool,
        renderer: &dyn EntityRenderer,
        ontologies: &OntologySet<'_>,
    ) {
        if !still_referenced {
            self.remove_entity(entity);
            return;
        }

        let rendering = match renderer.render(entity, ontologies) {
            Ok(rendering) => rendering,
            Err(err) => {
                warn!("Excluding {} from the entity index: {}", entity, err);
                self.remove_entity(entity);
                return;
            }
        };

        if self.naturals.get(entity) == Some(&rendering) {
            return;
        }
        self.detach(entity);
        self.insert_rendering(entity.clone(), rendering);
    }

    /// Incremental update after a change batch.
    ///
    /// Every entity in the signature of a changed axiom, plus every entity
    /// named by the subject of a changed annotation assertion, is updated
    /// exactly once.
    pub fn handle_changes(
        &mut self,
        ontologies: &OntologySet<'_>,
        changes: &[OntologyChange],
        renderer: &dyn EntityRenderer,
    ) {
        let relevant: Vec<&OntologyChange> = changes
            .iter()
            .filter(|change| ontologies.contains_ontology(change.ontology()))
            .collect();
        let mut touched: BTreeSet<Entity> = changed_entities(relevant.iter().copied()).into_iter().collect();

        for subject in relevant.iter().filter_map(|change| change.axiom().annotation_subject()) {
            touched.extend(ontologies.entities_with_iri(subject));
            touched.extend(
                EntityKind::ALL
                    .iter()
                    .map(|kind| Entity::new(*kind, subject.clone()))
                    .filter(|entity| self.naturals.contains_key(entity)),
            );
        }

        for entity in &touched {
            let still_referenced = self.is_builtin(entity) || ontologies.contains_entity(entity);
            self.update_entity(entity, still_referenced, renderer, ontologies);
        }

        debug!(
            "Entity index processed {} changes touching {} entities",
            changes.len(),
            touched.len()
        );
    }

    /// Stored key lookup without the escape fallback
    pub fn exact(&self, kind: EntityKind, key: &str) -> Option<&Entity> {
        self.by_rendering.get(kind).get(key)
    }

    /// Lookup by rendering; if absent and `text` is not already escaped, the
    /// escaped form is tried
    pub fn by_rendering(&self, kind: EntityKind, text: &str) -> Option<&Entity> {
        self.exact(kind, text).or_else(|| {
            if is_escaped(text) {
                None
            } else {
                self.exact(kind, &escape(text))
            }
        })
    }

    pub fn rendering_of(&self, entity: &Entity) -> Option<&str> {
        self.keys.get(entity).map(String::as_str)
    }

    pub fn all_renderings(&self, kind: EntityKind) -> HashSet<String> {
        self.by_rendering.get(kind).keys().cloned().collect()
    }

    /// `(rendering, entity)` pairs of one kind
    pub fn entries(&self, kind: EntityKind) -> impl Iterator<Item = (&str, &Entity)> {
        self.by_rendering
            .get(kind)
            .iter()
            .map(|(rendering, entity)| (rendering.as_str(), entity))
    }

    pub fn entities(&self, kind: EntityKind) -> impl Iterator<Item = &Entity> {
        self.by_rendering.get(kind).values()
    }

    pub fn contains(&self, entity: &Entity) -> bool {
        self.keys.contains_key(entity)
    }

    /// Entities that rendered but share their rendering with two smaller
    /// entities of the same kind
    pub fn held_back(&self) -> impl Iterator<Item = &Entity> {
        self.naturals.keys().filter(|entity| !self.keys.contains_key(*entity))
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn snapshot(&self) -> IndexSnapshot {
        IndexSnapshot {
            kinds: self
                .by_rendering
                .iter()
                .filter(|(_, map)| !map.is_empty())
                .map(|(kind, map)| {
                    let ordered = map
                        .iter()
                        .map(|(rendering, entity)| (rendering.clone(), entity.clone()))
                        .collect();
                    (kind, ordered)
                })
                .collect(),
        }
    }

    /// Clear everything; the index can be rebuilt afterwards
    pub fn dispose(&mut self) {
        for map in self.by_rendering.values_mut() {
            map.clear();
        }
        for groups in self.colliders.values_mut() {
            groups.clear();
        }
        self.naturals.clear();
        self.keys.clear();
    }
}

fn unescape(key: &str) -> Option<&str> {
    if !is_escaped(key) {
        return None;
    }
    key.strip_prefix(ESCAPE_DELIMITER)?.strip_suffix(ESCAPE_DELIMITER)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{RenderError, ShortFormRenderer};
    use ontoview_core::{Axiom, Ontology, OntologyId, OwlClass, TypedEntity};

    fn class(name: &str) -> Entity {
        Entity::class(format!("http://example.org/{}", name))
    }

    fn bare_index() -> EntityIndex {
        EntityIndex::new(IndexConfig {
            annotation_properties: Vec::new(),
            builtin_datatypes: false,
        })
    }

    #[test]
    fn test_add_is_idempotent() {
        let mut index = bare_index();
        let set = OntologySet::empty();

        assert!(index.add_entity(&class("Dog"), &ShortFormRenderer, &set));
        assert!(!index.add_entity(&class("Dog"), &ShortFormRenderer, &set));
        assert_eq!(index.len(), 1);
        assert_eq!(index.by_rendering(EntityKind::Class, "Dog"), Some(&class("Dog")));
    }

    #[test]
    fn test_collision_is_escaped_and_promoted() {
        let mut index = bare_index();
        let set = OntologySet::empty();
        let first = Entity::class("http://a.org/Dog");
        let second = Entity::class("http://b.org/Dog");

        index.add_entity(&first, &ShortFormRenderer, &set);
        index.add_entity(&second, &ShortFormRenderer, &set);

        assert_eq!(index.rendering_of(&first), Some("Dog"));
        assert_eq!(index.rendering_of(&second), Some("'Dog'"));
        assert_eq!(index.by_rendering(EntityKind::Class, "'Dog'"), Some(&second));

        index.remove_entity(&first);
        assert_eq!(index.rendering_of(&second), Some("Dog"));
        assert_eq!(index.by_rendering(EntityKind::Class, "Dog"), Some(&second));
        assert_eq!(index.exact(EntityKind::Class, "'Dog'"), None);
    }

    #[test]
    fn test_collision_seating_ignores_arrival_order() {
        let set = OntologySet::empty();
        let smaller = Entity::class("http://a.org/Dog");
        let larger = Entity::class("http://b.org/Dog");

        let mut forward = bare_index();
        forward.add_entity(&smaller, &ShortFormRenderer, &set);
        forward.add_entity(&larger, &ShortFormRenderer, &set);

        let mut backward = bare_index();
        backward.add_entity(&larger, &ShortFormRenderer, &set);
        assert_eq!(backward.rendering_of(&larger), Some("Dog"));
        backward.add_entity(&smaller, &ShortFormRenderer, &set);

        assert_eq!(backward.rendering_of(&smaller), Some("Dog"));
        assert_eq!(backward.rendering_of(&larger), Some("'Dog'"));
        assert_eq!(forward.snapshot(), backward.snapshot());
    }

    #[test]
    fn test_held_back_entity_is_admitted_when_a_slot_frees() {
        let mut index = bare_index();
        let set = OntologySet::empty();
        let a = Entity::class("http://a.org/Dog");
        let b = Entity::class("http://b.org/Dog");
        let c = Entity::class("http://c.org/Dog");

        for entity in [&c, &b, &a] {
            index.add_entity(entity, &ShortFormRenderer, &set);
        }
        assert_eq!(index.len(), 2);
        assert!(!index.contains(&c));
        assert_eq!(index.held_back().collect::<Vec<_>>(), vec![&c]);

        index.remove_entity(&a);
        assert_eq!(index.rendering_of(&b), Some("Dog"));
        assert_eq!(index.rendering_of(&c), Some("'Dog'"));
        assert_eq!(index.held_back().count(), 0);

        index.remove_entity(&b);
        assert_eq!(index.rendering_of(&c), Some("Dog"));
        assert_eq!(index.exact(EntityKind::Class, "'Dog'"), None);
    }

    #[test]
    fn test_plain_rendering_outranks_escaped_collider() {
        let mut index = bare_index();
        let set = OntologySet::empty();
        let quoted = Entity::class("http://z.org/Quoted");
        let a = Entity::class("http://a.org/Dog");
        let b = Entity::class("http://b.org/Dog");
        let renderer = |entity: &Entity| -> Result<String, RenderError> {
            Ok(if entity.iri.short_form() == "Quoted" {
                "'Dog'".to_string()
            } else {
                entity.iri.short_form().to_string()
            })
        };

        index.add_entity(&a, &renderer, &set);
        index.add_entity(&b, &renderer, &set);
        assert_eq!(index.rendering_of(&b), Some("'Dog'"));

        index.add_entity(&quoted, &renderer, &set);
        assert_eq!(index.rendering_of(&quoted), Some("'Dog'"));
        assert!(!index.contains(&b));

        index.remove_entity(&quoted);
        assert_eq!(index.rendering_of(&b), Some("'Dog'"));
    }

    #[test]
    fn test_kinds_do_not_collide() {
        let mut index = bare_index();
        let set = OntologySet::empty();
        let as_class = Entity::class("http://example.org/Dog");
        let as_individual = Entity::individual("http://example.org/Dog");

        index.add_entity(&as_class, &ShortFormRenderer, &set);
        index.add_entity(&as_individual, &ShortFormRenderer, &set);

        assert_eq!(index.rendering_of(&as_class), Some("Dog"));
        assert_eq!(index.rendering_of(&as_individual), Some("Dog"));
    }

    #[test]
    fn test_render_failure_excludes_entity() {
        let mut index = bare_index();
        let failing = |entity: &Entity| -> Result<String, RenderError> {
            if entity.iri.short_form() == "Broken" {
                Err(RenderError::Failed {
                    entity: entity.clone(),
                    message: "boom".to_string(),
                })
            } else {
                Ok(entity.iri.short_form().to_string())
            }
        };
        let ontology = Ontology::with_axioms(
            OntologyId::anonymous(),
            vec![Axiom::sub_class_of(
                OwlClass::new("http://example.org/Broken"),
                OwlClass::new("http://example.org/Fine"),
            )],
        );
        let set = OntologySet::new(vec![&ontology]);

        index.rebuild(&set, &failing);

        assert!(!index.contains(&class("Broken")));
        assert!(index.contains(&class("Fine")));
    }

    #[test]
    fn test_rebuild_includes_builtins() {
        let mut index = EntityIndex::default();
        index.rebuild(&OntologySet::empty(), &ShortFormRenderer);

        assert!(index.contains(&vocabulary::OWL_THING.to_entity()));
        assert_eq!(
            index.by_rendering(EntityKind::Class, "Thing"),
            Some(&Entity::class(vocabulary::OWL_THING_IRI))
        );
        assert!(index.by_rendering(EntityKind::AnnotationProperty, "label").is_some());
        assert!(index.by_rendering(EntityKind::Datatype, "string").is_some());
    }

    #[test]
    fn test_update_removes_unreferenced() {
        let mut index = bare_index();
        let set = OntologySet::empty();
        index.add_entity(&class("Dog"), &ShortFormRenderer, &set);

        index.update_entity(&class("Dog"), false, &ShortFormRenderer, &set);
        assert!(!index.contains(&class("Dog")));
        assert!(index.all_renderings(EntityKind::Class).is_empty());
    }

    #[test]
    fn test_dispose_clears() {
        let mut index = EntityIndex::default();
        index.rebuild(&OntologySet::empty(), &ShortFormRenderer);
        assert!(!index.is_empty());

        index.dispose();
        assert!(index.is_empty());
        assert!(index.snapshot().is_empty());
    }
}
