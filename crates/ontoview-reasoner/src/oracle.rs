//! Reasoning oracle contract and a swappable handle to the current oracle

use crate::ReasonerError;
use ontoview_core::vocabulary;
use ontoview_core::{DataProperty, Entity, ObjectProperty, OntologyChange, OwlClass};
use parking_lot::RwLock;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

/// Black-box satisfiability and subsumption service.
///
/// Implementations may classify on a worker thread; every method must answer
/// from whatever state is current without blocking for a classification in
/// flight. `direct` restricts results to immediate neighbours.
pub trait ReasoningOracle: Send + Sync {
    fn name(&self) -> &str;

    fn is_consistent(&self) -> bool;

    fn is_satisfiable(&self, entity: &Entity) -> bool;

    fn sub_classes(&self, class: &OwlClass, direct: bool) -> HashSet<OwlClass>;
    fn super_classes(&self, class: &OwlClass, direct: bool) -> HashSet<OwlClass>;
    fn equivalent_classes(&self, class: &OwlClass) -> HashSet<OwlClass>;
    fn unsatisfiable_classes(&self) -> HashSet<OwlClass>;

    fn sub_object_properties(&self, property: &ObjectProperty, direct: bool) -> HashSet<ObjectProperty>;
    fn super_object_properties(&self, property: &ObjectProperty, direct: bool) -> HashSet<ObjectProperty>;
    fn equivalent_object_properties(&self, property: &ObjectProperty) -> HashSet<ObjectProperty>;
    fn unsatisfiable_object_properties(&self) -> HashSet<ObjectProperty>;

    fn sub_data_properties(&self, property: &DataProperty, direct: bool) -> HashSet<DataProperty>;
    fn super_data_properties(&self, property: &DataProperty, direct: bool) -> HashSet<DataProperty>;
    fn equivalent_data_properties(&self, property: &DataProperty) -> HashSet<DataProperty>;
    fn unsatisfiable_data_properties(&self) -> HashSet<DataProperty>;

    /// Record edits; they take effect at the next [`flush`](Self::flush)
    fn ontologies_changed(&self, changes: &[OntologyChange]);

    fn has_pending_changes(&self) -> bool;

    /// Apply pending edits and reclassify
    fn flush(&self) -> Result<(), ReasonerError>;
}

/// Oracle used when no reasoner is selected.
///
/// Always consistent and everything satisfiable except the bottom entities.
/// It knows no subsumptions, so an inferred hierarchy over it holds the top
/// entity alone.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullOracle;

impl NullOracle {
    fn is_bottom(entity: &Entity) -> bool {
        *entity == Entity::class(vocabulary::OWL_NOTHING_IRI)
            || *entity == Entity::object_property(vocabulary::OWL_BOTTOM_OBJECT_PROPERTY_IRI)
            || *entity == Entity::data_property(vocabulary::OWL_BOTTOM_DATA_PROPERTY_IRI)
    }
}

impl ReasoningOracle for NullOracle {
    fn name(&self) -> &str {
        "null"
    }

    fn is_consistent(&self) -> bool {
        true
    }

    fn is_satisfiable(&self, entity: &Entity) -> bool {
        !Self::is_bottom(entity)
    }

    fn sub_classes(&self, _class: &OwlClass, _direct: bool) -> HashSet<OwlClass> {
        HashSet::new()
    }

    fn super_classes(&self, _class: &OwlClass, _direct: bool) -> HashSet<OwlClass> {
        HashSet::new()
    }

    fn equivalent_classes(&self, _class: &OwlClass) -> HashSet<OwlClass> {
        HashSet::new()
    }

    fn unsatisfiable_classes(&self) -> HashSet<OwlClass> {
        HashSet::new()
    }

    fn sub_object_properties(&self, _property: &ObjectProperty, _direct: bool) -> HashSet<ObjectProperty> {
        HashSet::new()
    }

    fn super_object_properties(&self, _property: &ObjectProperty, _direct: bool) -> HashSet<ObjectProperty> {
        HashSet::new()
    }

    fn equivalent_object_properties(&self, _property: &ObjectProperty) -> HashSet<ObjectProperty> {
        HashSet::new()
    }

    fn unsatisfiable_object_properties(&self) -> HashSet<ObjectProperty> {
        HashSet::new()
    }

    fn sub_data_properties(&self, _property: &DataProperty, _direct: bool) -> HashSet<DataProperty> {
        HashSet::new()
    }

    fn super_data_properties(&self, _property: &DataProperty, _direct: bool) -> HashSet<DataProperty> {
        HashSet::new()
    }

    fn equivalent_data_properties(&self, _property: &DataProperty) -> HashSet<DataProperty> {
        HashSet::new()
    }

    fn unsatisfiable_data_properties(&self) -> HashSet<DataProperty> {
        HashSet::new()
    }

    fn ontologies_changed(&self, _changes: &[OntologyChange]) {}

    fn has_pending_changes(&self) -> bool {
        false
    }

    fn flush(&self) -> Result<(), ReasonerError> {
        Ok(())
    }
}

/// Shared reference to the session's current oracle.
///
/// Clones share the slot, so replacing the oracle through one clone is seen
/// by all of them. Queries take a [`current`](Self::current) snapshot first
/// and finish against that oracle even if it is replaced meanwhile.
#[derive(Clone)]
pub struct OracleHandle {
    slot: Arc<RwLock<Arc<dyn ReasoningOracle>>>,
}

impl OracleHandle {
    pub fn new(oracle: Arc<dyn ReasoningOracle>) -> Self {
        Self {
            slot: Arc::new(RwLock::new(oracle)),
        }
    }

    pub fn current(&self) -> Arc<dyn ReasoningOracle> {
        Arc::clone(&self.slot.read())
    }

    /// Install a new oracle and return the previous one
    pub fn replace(&self, oracle: Arc<dyn ReasoningOracle>) -> Arc<dyn ReasoningOracle> {
        std::mem::replace(&mut *self.slot.write(), oracle)
    }
}

impl Default for OracleHandle {
    fn default() -> Self {
        Self::new(Arc::new(NullOracle))
    }
}

impl fmt::Debug for OracleHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OracleHandle")
            .field("oracle", &self.current().name())
            .finish()
    }
}
