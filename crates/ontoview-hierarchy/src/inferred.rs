//! Hierarchies answered by the reasoning oracle

use crate::listeners::ListenerRegistry;
use crate::provider::HierarchyProvider;
use crate::HierarchyError;
use ontoview_core::{DataProperty, ModelEvent, ObjectProperty, OntologyChange, OntologySet, OwlClass, TypedEntity};
use ontoview_reasoner::{OracleHandle, ReasoningOracle};
use std::collections::HashSet;
use tracing::debug;

/// Entity kind the oracle classifies
pub trait InferableEntity: TypedEntity {
    fn sub_entities(oracle: &dyn ReasoningOracle, entity: &Self, direct: bool) -> HashSet<Self>;
    fn super_entities(oracle: &dyn ReasoningOracle, entity: &Self, direct: bool) -> HashSet<Self>;
    fn equivalent_entities(oracle: &dyn ReasoningOracle, entity: &Self) -> HashSet<Self>;
    fn unsatisfiable_entities(oracle: &dyn ReasoningOracle) -> HashSet<Self>;
}

impl InferableEntity for OwlClass {
    fn sub_entities(oracle: &dyn ReasoningOracle, entity: &Self, direct: bool) -> HashSet<Self> {
        oracle.sub_classes(entity, direct)
    }

    fn super_entities(oracle: &dyn ReasoningOracle, entity: &Self, direct: bool) -> HashSet<Self> {
        oracle.super_classes(entity, direct)
    }

    fn equivalent_entities(oracle: &dyn ReasoningOracle, entity: &Self) -> HashSet<Self> {
        oracle.equivalent_classes(entity)
    }

    fn unsatisfiable_entities(oracle: &dyn ReasoningOracle) -> HashSet<Self> {
        oracle.unsatisfiable_classes()
    }
}

impl InferableEntity for ObjectProperty {
    fn sub_entities(oracle: &dyn ReasoningOracle, entity: &Self, direct: bool) -> HashSet<Self> {
        oracle.sub_object_properties(entity, direct)
    }

    fn super_entities(oracle: &dyn ReasoningOracle, entity: &Self, direct: bool) -> HashSet<Self> {
        oracle.super_object_properties(entity, direct)
    }

    fn equivalent_entities(oracle: &dyn ReasoningOracle, entity: &Self) -> HashSet<Self> {
        oracle.equivalent_object_properties(entity)
    }

    fn unsatisfiable_entities(oracle: &dyn ReasoningOracle) -> HashSet<Self> {
        oracle.unsatisfiable_object_properties()
    }
}

impl InferableEntity for DataProperty {
    fn sub_entities(oracle: &dyn ReasoningOracle, entity: &Self, direct: bool) -> HashSet<Self> {
        oracle.sub_data_properties(entity, direct)
    }

    fn super_entities(oracle: &dyn ReasoningOracle, entity: &Self, direct: bool) -> HashSet<Self> {
        oracle.super_data_properties(entity, direct)
    }

    fn equivalent_entities(oracle: &dyn ReasoningOracle, entity: &Self) -> HashSet<Self> {
        oracle.equivalent_data_properties(entity)
    }

    fn unsatisfiable_entities(oracle: &dyn ReasoningOracle) -> HashSet<Self> {
        oracle.unsatisfiable_data_properties()
    }
}

/// Inferred hierarchy over one entity kind.
///
/// Holds no derived state: every query takes one snapshot of the current
/// oracle and answers from it, so an oracle swapped mid-query does not mix
/// two oracles' answers. An inconsistent oracle yields empty results.
#[derive(Debug)]
pub struct InferredHierarchy<E: InferableEntity> {
    oracle: OracleHandle,
    listeners: ListenerRegistry,
    disposed: bool,
    _kind: std::marker::PhantomData<E>,
}

impl<E: InferableEntity> InferredHierarchy<E> {
    pub fn new(oracle: OracleHandle) -> Self {
        Self {
            oracle,
            listeners: ListenerRegistry::new(),
            disposed: false,
            _kind: std::marker::PhantomData,
        }
    }

    pub fn oracle(&self) -> &OracleHandle {
        &self.oracle
    }

    /// Snapshot of a live, consistent oracle
    fn consistent_oracle(&self) -> Result<Option<std::sync::Arc<dyn ReasoningOracle>>, HierarchyError> {
        if self.disposed {
            return Err(HierarchyError::Disposed);
        }
        let oracle = self.oracle.current();
        Ok(oracle.is_consistent().then_some(oracle))
    }

    fn is_unsatisfiable(oracle: &dyn ReasoningOracle, entity: &E) -> bool {
        !entity.is_bottom() && !oracle.is_satisfiable(&entity.to_entity())
    }
}

impl<E: InferableEntity> HierarchyProvider<E> for InferredHierarchy<E> {
    fn roots(&self) -> Result<HashSet<E>, HierarchyError> {
        let Some(_oracle) = self.consistent_oracle()? else {
            return Ok(HashSet::new());
        };
        Ok(E::top().into_iter().collect())
    }

    fn children(&self, entity: &E) -> Result<HashSet<E>, HierarchyError> {
        let Some(oracle) = self.consistent_oracle()? else {
            return Ok(HashSet::new());
        };
        let oracle = oracle.as_ref();
        if entity.is_bottom() {
            return Ok(E::unsatisfiable_entities(oracle)
                .into_iter()
                .filter(|e| !e.is_bottom())
                .collect());
        }
        if Self::is_unsatisfiable(oracle, entity) {
            return Ok(HashSet::new());
        }
        // Unsatisfiable entities are listed under bottom only
        let unsatisfiable = E::unsatisfiable_entities(oracle);
        Ok(E::sub_entities(oracle, entity, true)
            .into_iter()
            .filter(|e| !e.is_bottom() && !unsatisfiable.contains(e))
            .collect())
    }

    fn parents(&self, entity: &E) -> Result<HashSet<E>, HierarchyError> {
        let Some(oracle) = self.consistent_oracle()? else {
            return Ok(HashSet::new());
        };
        let oracle = oracle.as_ref();
        if entity.is_bottom() {
            return Ok(HashSet::new());
        }
        if Self::is_unsatisfiable(oracle, entity) {
            return Ok(E::bottom().into_iter().collect());
        }
        Ok(E::super_entities(oracle, entity, true))
    }

    fn equivalents(&self, entity: &E) -> Result<HashSet<E>, HierarchyError> {
        let Some(oracle) = self.consistent_oracle()? else {
            return Ok(HashSet::new());
        };
        let oracle = oracle.as_ref();
        if Self::is_unsatisfiable(oracle, entity) {
            return Ok(HashSet::new());
        }
        let mut equivalents = E::equivalent_entities(oracle, entity);
        equivalents.remove(entity);
        Ok(equivalents)
    }

    fn set_ontologies(&mut self, _ontologies: &OntologySet<'_>) -> Result<(), HierarchyError> {
        if self.disposed {
            return Err(HierarchyError::Disposed);
        }
        self.listeners.fire();
        Ok(())
    }

    /// The oracle buffers edits itself; results move only on a model event
    fn handle_changes(
        &mut self,
        _ontologies: &OntologySet<'_>,
        _changes: &[OntologyChange],
    ) -> Result<(), HierarchyError> {
        if self.disposed {
            return Err(HierarchyError::Disposed);
        }
        Ok(())
    }

    fn handle_event(&mut self, event: &ModelEvent) -> Result<(), HierarchyError> {
        if self.disposed {
            return Err(HierarchyError::Disposed);
        }
        match event {
            ModelEvent::ReasonerChanged
            | ModelEvent::ActiveOntologyChanged
            | ModelEvent::OntologyClassified
            | ModelEvent::OntologyReloaded(_) => {
                debug!(kind = %E::KIND, ?event, "Inferred hierarchy invalidated");
                self.listeners.fire();
            }
        }
        Ok(())
    }

    fn is_consistent(&self) -> Result<bool, HierarchyError> {
        Ok(self.consistent_oracle()?.is_some())
    }

    fn dispose(&mut self) {
        self.listeners.clear();
        self.disposed = true;
    }

    fn is_disposed(&self) -> bool {
        self.disposed
    }

    fn listeners(&self) -> &ListenerRegistry {
        &self.listeners
    }
}
