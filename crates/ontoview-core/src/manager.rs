//! Ontology manager: owns every loaded ontology and decides which are active

use crate::model::Axiom;
use crate::ontology::{Ontology, OntologyChange, OntologyId, OntologySet};
use crate::CoreError;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info};

/// Which ontologies make up the active set
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActiveScope {
    /// Only the active ontology
    ActiveOnly,
    /// The active ontology and everything it imports, transitively
    ImportsClosure,
    /// A user-curated set of visible ontologies
    Custom(BTreeSet<OntologyId>),
}

impl Default for ActiveScope {
    fn default() -> Self {
        ActiveScope::ImportsClosure
    }
}

/// Registry of loaded ontologies plus the active-set policy
#[derive(Debug, Default)]
pub struct OntologyManager {
    ontologies: BTreeMap<OntologyId, Ontology>,
    active: Option<OntologyId>,
    scope: ActiveScope,
}

impl OntologyManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty ontology. The first ontology created becomes active.
    pub fn create_ontology(&mut self, id: OntologyId) -> Result<&mut Ontology, CoreError> {
        if self.ontologies.contains_key(&id) {
            return Err(CoreError::DuplicateOntology(id));
        }
        if self.active.is_none() {
            self.active = Some(id.clone());
        }
        info!("Created ontology {}", id);
        Ok(self.ontologies.entry(id.clone()).or_insert_with(|| Ontology::new(id)))
    }

    pub fn remove_ontology(&mut self, id: &OntologyId) -> Result<Ontology, CoreError> {
        if self.active.as_ref() == Some(id) {
            return Err(CoreError::ActiveOntologyRemoval(id.clone()));
        }
        let removed = self
            .ontologies
            .remove(id)
            .ok_or_else(|| CoreError::UnknownOntology(id.clone()))?;
        for ontology in self.ontologies.values_mut() {
            ontology.remove_import(id);
        }
        Ok(removed)
    }

    pub fn ontology(&self, id: &OntologyId) -> Option<&Ontology> {
        self.ontologies.get(id)
    }

    pub fn ontology_ids(&self) -> impl Iterator<Item = &OntologyId> {
        self.ontologies.keys()
    }

    pub fn add_import(&mut self, importer: &OntologyId, imported: &OntologyId) -> Result<bool, CoreError> {
        if !self.ontologies.contains_key(imported) {
            return Err(CoreError::UnknownOntology(imported.clone()));
        }
        let ontology = self
            .ontologies
            .get_mut(importer)
            .ok_or_else(|| CoreError::UnknownOntology(importer.clone()))?;
        Ok(ontology.add_import(imported.clone()))
    }

    pub fn remove_import(&mut self, importer: &OntologyId, imported: &OntologyId) -> Result<bool, CoreError> {
        let ontology = self
            .ontologies
            .get_mut(importer)
            .ok_or_else(|| CoreError::UnknownOntology(importer.clone()))?;
        Ok(ontology.remove_import(imported))
    }

    /// The ontology and everything it imports, transitively (cycles tolerated)
    pub fn imports_closure(&self, id: &OntologyId) -> BTreeSet<OntologyId> {
        let mut closure = BTreeSet::new();
        let mut stack = vec![id.clone()];
        while let Some(current) = stack.pop() {
            let Some(ontology) = self.ontologies.get(&current) else {
                continue;
            };
            if closure.insert(current) {
                stack.extend(ontology.imports().iter().cloned());
            }
        }
        closure
    }

    pub fn active_ontology(&self) -> Option<&OntologyId> {
        self.active.as_ref()
    }

    pub fn set_active_ontology(&mut self, id: &OntologyId) -> Result<(), CoreError> {
        if !self.ontologies.contains_key(id) {
            return Err(CoreError::UnknownOntology(id.clone()));
        }
        self.active = Some(id.clone());
        Ok(())
    }

    pub fn scope(&self) -> &ActiveScope {
        &self.scope
    }

    pub fn set_scope(&mut self, scope: ActiveScope) -> Result<(), CoreError> {
        if let ActiveScope::Custom(ids) = &scope {
            if let Some(unknown) = ids.iter().find(|id| !self.ontologies.contains_key(*id)) {
                return Err(CoreError::UnknownOntology(unknown.clone()));
            }
        }
        self.scope = scope;
        Ok(())
    }

    /// Identifiers of the currently visible ontologies
    pub fn active_ids(&self) -> BTreeSet<OntologyId> {
        match (&self.scope, &self.active) {
            (ActiveScope::Custom(ids), _) => ids
                .iter()
                .filter(|id| self.ontologies.contains_key(*id))
                .cloned()
                .collect(),
            (_, None) => BTreeSet::new(),
            (ActiveScope::ActiveOnly, Some(active)) => std::iter::once(active.clone()).collect(),
            (ActiveScope::ImportsClosure, Some(active)) => self.imports_closure(active),
        }
    }

    pub fn active_set(&self) -> OntologySet<'_> {
        OntologySet::new(
            self.active_ids()
                .iter()
                .filter_map(|id| self.ontologies.get(id))
                .collect(),
        )
    }

    /// Apply a batch all-or-nothing and return the changes that took effect.
    ///
    /// Every ontology named by the batch must exist before anything is
    /// applied. Adding an axiom that is already present, or removing one
    /// that is absent, is dropped from the returned batch.
    pub fn apply_changes(&mut self, changes: Vec<OntologyChange>) -> Result<Vec<OntologyChange>, CoreError> {
        if let Some(unknown) = changes
            .iter()
            .map(OntologyChange::ontology)
            .find(|id| !self.ontologies.contains_key(*id))
        {
            return Err(CoreError::UnknownOntology(unknown.clone()));
        }

        let requested = changes.len();
        let mut applied = Vec::with_capacity(requested);
        for change in changes {
            let Some(ontology) = self.ontologies.get_mut(change.ontology()) else {
                continue;
            };
            let effective = match &change {
                OntologyChange::AddAxiom { axiom, .. } => ontology.add_axiom(axiom.clone()),
                OntologyChange::RemoveAxiom { axiom, .. } => ontology.remove_axiom(axiom),
            };
            if effective {
                applied.push(change);
            }
        }

        debug!("Applied {} of {} requested changes", applied.len(), requested);
        Ok(applied)
    }

    /// Replace an ontology's axioms wholesale
    pub fn reload_ontology(&mut self, id: &OntologyId, axioms: impl IntoIterator<Item = Axiom>) -> Result<(), CoreError> {
        let ontology = self
            .ontologies
            .get_mut(id)
            .ok_or_else(|| CoreError::UnknownOntology(id.clone()))?;
        ontology.clear();
        for axiom in axioms {
            ontology.add_axiom(axiom);
        }
        info!("Reloaded ontology {} with {} axioms", id, ontology.axiom_count());
        Ok(())
    }
}
