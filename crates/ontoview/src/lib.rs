//! # Ontoview - ontology indexing and hierarchy maintenance
//!
//! Ontoview keeps the derived state an ontology editor needs in step with
//! every edit: a bidirectional entity/rendering index, asserted and inferred
//! class and property hierarchies, and an entity finder for search boxes.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use ontoview::prelude::*;
//!
//! fn main() -> Result<(), SessionError> {
//!     let mut session = EditorSession::default();
//!     let id = OntologyId::new("http://example.org/zoo");
//!     session.create_ontology(id.clone())?;
//!
//!     let dog = OwlClass::new("http://example.org/zoo#Dog");
//!     let animal = OwlClass::new("http://example.org/zoo#Animal");
//!     session.apply_changes(vec![OntologyChange::add(&id, Axiom::sub_class_of(dog.clone(), animal))])?;
//!
//!     let parents = session.class_hierarchy().parents(&dog)?;
//!     println!("Dog has {} parent(s)", parents.len());
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! - **`ontoview-core`**: entities, axioms, ontologies and the ontology manager
//! - **`ontoview-index`**: entity index, render functions and entity finder
//! - **`ontoview-reasoner`**: reasoning oracle contract and structural reasoner
//! - **`ontoview-hierarchy`**: asserted, inferred and root-override hierarchies
//! - **`ontoview`**: [`EditorSession`] wiring them together

pub mod config;
pub mod session;
pub mod telemetry;

pub use ontoview_core as core;
pub use ontoview_hierarchy as hierarchy;
pub use ontoview_index as index;
pub use ontoview_reasoner as reasoner;

pub use config::{ReasonerConfig, SessionConfig};
pub use session::{EditorSession, SessionError, SuperclassHierarchy};
pub use telemetry::init_tracing;

/// Prelude module for convenient imports
///
/// ```rust
/// use ontoview::prelude::*;
/// ```
pub mod prelude {
    pub use crate::config::{ReasonerConfig, SessionConfig};
    pub use crate::session::{EditorSession, SessionError};
    pub use ontoview_core::{
        vocabulary, ActiveScope, AnnotationProperty, Axiom, ClassExpression, DataProperty, Entity, EntityKind,
        Iri, Literal, ModelEvent, NamedIndividual, ObjectProperty, OntologyChange, OntologyId, OwlClass,
        TypedEntity,
    };
    pub use ontoview_hierarchy::{HierarchyConfig, HierarchyError, HierarchyProvider, ListenerId};
    pub use ontoview_index::{EntityFinder, EntityRenderer, FinderConfig, IndexConfig, LabelRenderer, MatchMode};
    pub use ontoview_reasoner::{NullOracle, ReasoningOracle, StructuralReasoner};
}

/// Current version of Ontoview
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
