//! Ontologies, ontology sets and change batches

use crate::model::{Axiom, Entity, EntityKind, Iri};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt;

/// Ontology identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OntologyId(pub Iri);

impl OntologyId {
    pub fn new(iri: impl Into<Iri>) -> Self {
        Self(iri.into())
    }

    /// Fresh identifier for an ontology without an IRI
    pub fn anonymous() -> Self {
        Self(Iri::new(format!("urn:uuid:{}", uuid::Uuid::new_v4())))
    }

    pub fn is_anonymous(&self) -> bool {
        self.0.as_str().starts_with("urn:uuid:")
    }

    pub fn iri(&self) -> &Iri {
        &self.0
    }
}

impl fmt::Display for OntologyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}>", self.0)
    }
}

/// Mutable collection of axioms with reference indices
#[derive(Debug, Clone)]
pub struct Ontology {
    id: OntologyId,
    imports: BTreeSet<OntologyId>,
    axioms: HashSet<Axiom>,
    /// Entity -> axioms whose signature mentions it
    references: HashMap<Entity, HashSet<Axiom>>,
    /// Annotation subject -> annotation assertions about it
    annotations: HashMap<Iri, HashSet<Axiom>>,
}

impl Ontology {
    pub fn new(id: OntologyId) -> Self {
        Self {
            id,
            imports: BTreeSet::new(),
            axioms: HashSet::new(),
            references: HashMap::new(),
            annotations: HashMap::new(),
        }
    }

    pub fn with_axioms(id: OntologyId, axioms: impl IntoIterator<Item = Axiom>) -> Self {
        let mut ontology = Self::new(id);
        for axiom in axioms {
            ontology.add_axiom(axiom);
        }
        ontology
    }

    pub fn id(&self) -> &OntologyId {
        &self.id
    }

    pub fn imports(&self) -> &BTreeSet<OntologyId> {
        &self.imports
    }

    pub(crate) fn add_import(&mut self, import: OntologyId) -> bool {
        self.imports.insert(import)
    }

    pub(crate) fn remove_import(&mut self, import: &OntologyId) -> bool {
        self.imports.remove(import)
    }

    /// Add an axiom; returns false if it was already present
    pub fn add_axiom(&mut self, axiom: Axiom) -> bool {
        if self.axioms.contains(&axiom) {
            return false;
        }

        for entity in axiom.signature() {
            self.references
                .entry(entity)
                .or_insert_with(HashSet::new)
                .insert(axiom.clone());
        }
        if let Some(subject) = axiom.annotation_subject() {
            self.annotations
                .entry(subject.clone())
                .or_insert_with(HashSet::new)
                .insert(axiom.clone());
        }

        self.axioms.insert(axiom)
    }

    /// Remove an axiom; returns false if it was absent
    pub fn remove_axiom(&mut self, axiom: &Axiom) -> bool {
        if !self.axioms.remove(axiom) {
            return false;
        }

        for entity in axiom.signature() {
            if let Some(referencing) = self.references.get_mut(&entity) {
                referencing.remove(axiom);
                if referencing.is_empty() {
                    self.references.remove(&entity);
                }
            }
        }
        if let Some(subject) = axiom.annotation_subject() {
            if let Some(assertions) = self.annotations.get_mut(subject) {
                assertions.remove(axiom);
                if assertions.is_empty() {
                    self.annotations.remove(subject);
                }
            }
        }

        true
    }

    pub fn contains_axiom(&self, axiom: &Axiom) -> bool {
        self.axioms.contains(axiom)
    }

    pub fn axioms(&self) -> impl Iterator<Item = &Axiom> {
        self.axioms.iter()
    }

    pub fn axiom_count(&self) -> usize {
        self.axioms.len()
    }

    /// Whether the entity is in this ontology's signature
    pub fn contains_entity(&self, entity: &Entity) -> bool {
        self.references.contains_key(entity)
    }

    pub fn signature(&self) -> impl Iterator<Item = &Entity> {
        self.references.keys()
    }

    pub fn axioms_referencing<'a>(&'a self, entity: &Entity) -> impl Iterator<Item = &'a Axiom> {
        self.references.get(entity).into_iter().flatten()
    }

    pub fn annotation_assertions<'a>(&'a self, subject: &Iri) -> impl Iterator<Item = &'a Axiom> {
        self.annotations.get(subject).into_iter().flatten()
    }

    /// Entities of any kind in the signature carrying this identifier
    pub fn entities_with_iri(&self, iri: &Iri) -> HashSet<Entity> {
        EntityKind::ALL
            .iter()
            .map(|kind| Entity::new(*kind, iri.clone()))
            .filter(|entity| self.contains_entity(entity))
            .collect()
    }

    pub(crate) fn clear(&mut self) {
        self.axioms.clear();
        self.references.clear();
        self.annotations.clear();
    }
}

/// Borrowed view over the active ontologies
#[derive(Debug, Clone, Default)]
pub struct OntologySet<'a> {
    ontologies: Vec<&'a Ontology>,
}

impl<'a> OntologySet<'a> {
    pub fn new(ontologies: Vec<&'a Ontology>) -> Self {
        Self { ontologies }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a Ontology> + '_ {
        self.ontologies.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.ontologies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ontologies.is_empty()
    }

    pub fn ids(&self) -> BTreeSet<OntologyId> {
        self.ontologies.iter().map(|o| o.id().clone()).collect()
    }

    pub fn contains_ontology(&self, id: &OntologyId) -> bool {
        self.ontologies.iter().any(|o| o.id() == id)
    }

    /// Whether any ontology in the set mentions the entity
    pub fn contains_entity(&self, entity: &Entity) -> bool {
        self.ontologies.iter().any(|o| o.contains_entity(entity))
    }

    /// Union of the signatures
    pub fn signature(&self) -> HashSet<Entity> {
        self.ontologies
            .iter()
            .flat_map(|o| o.signature().cloned())
            .collect()
    }

    /// Axioms mentioning the entity; duplicates across ontologies are repeated
    pub fn axioms_referencing<'s>(&'s self, entity: &'s Entity) -> impl Iterator<Item = &'a Axiom> + 's {
        self.ontologies
            .iter()
            .flat_map(move |o| o.axioms_referencing(entity))
    }

    pub fn annotation_assertions<'s>(&'s self, subject: &'s Iri) -> impl Iterator<Item = &'a Axiom> + 's {
        self.ontologies
            .iter()
            .flat_map(move |o| o.annotation_assertions(subject))
    }

    pub fn axioms(&self) -> impl Iterator<Item = &'a Axiom> + '_ {
        self.ontologies.iter().flat_map(|o| o.axioms())
    }

    pub fn entities_with_iri(&self, iri: &Iri) -> HashSet<Entity> {
        self.ontologies
            .iter()
            .flat_map(|o| o.entities_with_iri(iri))
            .collect()
    }
}

/// A single axiom-level edit of one ontology
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OntologyChange {
    AddAxiom { ontology: OntologyId, axiom: Axiom },
    RemoveAxiom { ontology: OntologyId, axiom: Axiom },
}

impl OntologyChange {
    pub fn add(ontology: &OntologyId, axiom: Axiom) -> Self {
        OntologyChange::AddAxiom {
            ontology: ontology.clone(),
            axiom,
        }
    }

    pub fn remove(ontology: &OntologyId, axiom: Axiom) -> Self {
        OntologyChange::RemoveAxiom {
            ontology: ontology.clone(),
            axiom,
        }
    }

    pub fn ontology(&self) -> &OntologyId {
        match self {
            OntologyChange::AddAxiom { ontology, .. } | OntologyChange::RemoveAxiom { ontology, .. } => ontology,
        }
    }

    pub fn axiom(&self) -> &Axiom {
        match self {
            OntologyChange::AddAxiom { axiom, .. } | OntologyChange::RemoveAxiom { axiom, .. } => axiom,
        }
    }
}

/// Deduplicated union of the signatures of every changed axiom
pub fn changed_entities<'a>(changes: impl IntoIterator<Item = &'a OntologyChange>) -> HashSet<Entity> {
    changes
        .into_iter()
        .flat_map(|change| change.axiom().signature())
        .collect()
}

/// Coarse model events besides axiom-level changes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModelEvent {
    /// A different reasoning oracle was selected
    ReasonerChanged,
    /// The active ontology (and so the active set) changed
    ActiveOntologyChanged,
    /// The reasoner finished classifying
    OntologyClassified,
    /// An ontology's contents were replaced wholesale
    OntologyReloaded(OntologyId),
}
