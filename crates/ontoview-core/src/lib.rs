//! # Ontoview core model
//!
//! Entity, axiom and ontology types shared by the index, reasoner and
//! hierarchy crates:
//! - typed entities over a closed [`EntityKind`] tag
//! - class expressions and axioms with signatures
//! - ontologies with per-entity reference indices
//! - the ontology manager and its atomic change batches

pub mod manager;
pub mod model;
pub mod ontology;
pub mod vocabulary;

pub use manager::{ActiveScope, OntologyManager};
pub use model::{
    AnnotationProperty, AnnotationValue, Axiom, ClassExpression, DataProperty, Datatype, Entity,
    EntityKind, Iri, Literal, NamedIndividual, ObjectProperty, ObjectPropertyExpression, OwlClass,
    TypedEntity,
};
pub use ontology::{changed_entities, ModelEvent, Ontology, OntologyChange, OntologyId, OntologySet};

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("Unknown ontology: {0}")]
    UnknownOntology(OntologyId),

    #[error("Ontology already exists: {0}")]
    DuplicateOntology(OntologyId),

    #[error("Cannot remove the active ontology: {0}")]
    ActiveOntologyRemoval(OntologyId),
}
