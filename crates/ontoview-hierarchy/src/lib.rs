//! # Ontoview hierarchy
//!
//! Navigable parent/child views over classes and properties:
//! - [`AssertedHierarchy`], maintained incrementally from told axioms
//! - [`InferredHierarchy`], answered by the session's reasoning oracle
//! - [`RootOverrideHierarchy`], an inverted view rooted at a chosen entity
//!
//! Every provider publishes a payload-free change notification through its
//! [`ListenerRegistry`]; subscribers re-query.

pub mod asserted;
pub mod inferred;
pub mod listeners;
pub mod provider;
pub mod root_override;

pub use asserted::{AssertedEntity, AssertedHierarchy};
pub use inferred::{InferableEntity, InferredHierarchy};
pub use listeners::{ListenerId, ListenerRegistry};
pub use provider::{transitive, HierarchyConfig, HierarchyProvider};
pub use root_override::RootOverrideHierarchy;

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HierarchyError {
    #[error("Hierarchy provider has been disposed")]
    Disposed,
}
