//! # Ontoview reasoner
//!
//! The reasoning oracle seam used by the inferred hierarchies:
//! - [`ReasoningOracle`], the black-box satisfiability/subsumption contract
//! - [`OracleHandle`], the session's swappable reference to the current oracle
//! - [`NullOracle`] for sessions without a reasoner
//! - [`StructuralReasoner`], a buffered classifier over told axioms

pub mod oracle;
pub mod structural;
mod taxonomy;

pub use oracle::{NullOracle, OracleHandle, ReasoningOracle};
pub use structural::{ReasonerStatus, StructuralReasoner};

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReasonerError {
    #[error("Ontology too large to classify: {axioms} logical axioms (limit {limit})")]
    TooLarge { axioms: usize, limit: usize },

    #[error("Reasoner failed: {0}")]
    Failed(String),
}
