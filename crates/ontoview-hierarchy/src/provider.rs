//! Hierarchy provider contract shared by the asserted and inferred strategies

use crate::listeners::ListenerRegistry;
use crate::HierarchyError;
use ontoview_core::{ModelEvent, OntologyChange, OntologySet, TypedEntity};
use serde::{Deserialize, Serialize};
use std::collections::{HashSet, VecDeque};

/// Options for asserted hierarchies
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HierarchyConfig {
    /// `SubClassOf(A, B and C)` makes `B` and `C` parents of `A`
    pub named_conjuncts_as_parents: bool,
}

impl Default for HierarchyConfig {
    fn default() -> Self {
        Self {
            named_conjuncts_as_parents: true,
        }
    }
}

/// Navigable parent/child view over one entity kind.
///
/// Queries on an entity the provider does not know return empty sets. Every
/// query on a disposed provider fails with [`HierarchyError::Disposed`].
pub trait HierarchyProvider<E: TypedEntity> {
    fn roots(&self) -> Result<HashSet<E>, HierarchyError>;

    fn children(&self, entity: &E) -> Result<HashSet<E>, HierarchyError>;

    fn parents(&self, entity: &E) -> Result<HashSet<E>, HierarchyError>;

    fn equivalents(&self, entity: &E) -> Result<HashSet<E>, HierarchyError>;

    /// Transitive closure of [`parents`](Self::parents), excluding `entity`
    fn ancestors(&self, entity: &E) -> Result<HashSet<E>, HierarchyError> {
        transitive(entity, |e| self.parents(e))
    }

    /// Transitive closure of [`children`](Self::children), excluding `entity`
    fn descendants(&self, entity: &E) -> Result<HashSet<E>, HierarchyError> {
        transitive(entity, |e| self.children(e))
    }

    /// Rebind to a new active ontology set and recompute
    fn set_ontologies(&mut self, ontologies: &OntologySet<'_>) -> Result<(), HierarchyError>;

    /// Apply an already-committed change batch; `ontologies` is the active set
    /// after the batch
    fn handle_changes(
        &mut self,
        ontologies: &OntologySet<'_>,
        changes: &[OntologyChange],
    ) -> Result<(), HierarchyError>;

    fn handle_event(&mut self, event: &ModelEvent) -> Result<(), HierarchyError>;

    fn is_consistent(&self) -> Result<bool, HierarchyError> {
        Ok(true)
    }

    /// Drop every subscription; the provider answers nothing afterwards
    fn dispose(&mut self);

    fn is_disposed(&self) -> bool;

    fn listeners(&self) -> &ListenerRegistry;
}

/// Breadth-first closure of `step` from `start`; `start` itself is never
/// included, even on a cycle back to it
pub fn transitive<E, F>(start: &E, mut step: F) -> Result<HashSet<E>, HierarchyError>
where
    E: TypedEntity,
    F: FnMut(&E) -> Result<HashSet<E>, HierarchyError>,
{
    let mut seen = HashSet::new();
    let mut queue = VecDeque::from([start.clone()]);
    while let Some(current) = queue.pop_front() {
        for next in step(&current)? {
            if next != *start && seen.insert(next.clone()) {
                queue.push_back(next);
            }
        }
    }
    Ok(seen)
}
