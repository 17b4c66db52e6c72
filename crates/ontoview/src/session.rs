//! Editing session wiring the ontology manager to the index, the oracle and
//! the hierarchy providers

use crate::config::SessionConfig;
use ontoview_core::{
    ActiveScope, AnnotationProperty, Axiom, CoreError, DataProperty, ModelEvent, ObjectProperty, OntologyChange,
    OntologyId, OntologyManager, OwlClass,
};
use ontoview_hierarchy::{AssertedHierarchy, HierarchyError, HierarchyProvider, InferredHierarchy, RootOverrideHierarchy};
use ontoview_index::{EntityFinder, EntityIndex, EntityRenderer, ShortFormRenderer};
use ontoview_reasoner::{OracleHandle, ReasonerError, ReasonerStatus, ReasoningOracle, StructuralReasoner};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("Ontology model error: {0}")]
    Core(#[from] CoreError),

    #[error("Reasoner error: {0}")]
    Reasoner(#[from] ReasonerError),

    #[error("Hierarchy error: {0}")]
    Hierarchy(#[from] HierarchyError),

    #[error("Session has been disposed")]
    Disposed,
}

/// Superclass view of the inferred class hierarchy
pub type SuperclassHierarchy = RootOverrideHierarchy<OwlClass, InferredHierarchy<OwlClass>>;

/// One editing session over a set of ontologies.
///
/// Every applied change batch reaches the entity index first, then the
/// oracle's change buffer, then the asserted hierarchies. Model events
/// (reasoner swapped, active set changed, classification done, ontology
/// reloaded) go to the inferred hierarchies. All notifications are delivered
/// before the triggering call returns.
pub struct EditorSession {
    config: SessionConfig,
    manager: OntologyManager,
    renderer: Box<dyn EntityRenderer>,
    index: EntityIndex,
    oracle: OracleHandle,
    /// Set while the oracle is a structural reasoner owned by this session
    structural: Option<Arc<StructuralReasoner>>,
    classes: AssertedHierarchy<OwlClass>,
    object_properties: AssertedHierarchy<ObjectProperty>,
    data_properties: AssertedHierarchy<DataProperty>,
    annotation_properties: AssertedHierarchy<AnnotationProperty>,
    inferred_classes: InferredHierarchy<OwlClass>,
    inferred_object_properties: InferredHierarchy<ObjectProperty>,
    inferred_data_properties: InferredHierarchy<DataProperty>,
    superclasses: SuperclassHierarchy,
    disposed: bool,
}

impl EditorSession {
    pub fn new(config: SessionConfig) -> Self {
        Self::with_renderer(config, Box::new(ShortFormRenderer))
    }

    pub fn with_renderer(config: SessionConfig, renderer: Box<dyn EntityRenderer>) -> Self {
        let manager = OntologyManager::new();
        let oracle = OracleHandle::default();
        let mut index = EntityIndex::new(config.index.clone());
        index.rebuild(&manager.active_set(), renderer.as_ref());

        let hierarchy = config.hierarchy.clone();
        Self {
            classes: AssertedHierarchy::new(hierarchy.clone()),
            object_properties: AssertedHierarchy::new(hierarchy.clone()),
            data_properties: AssertedHierarchy::new(hierarchy.clone()),
            annotation_properties: AssertedHierarchy::new(hierarchy),
            inferred_classes: InferredHierarchy::new(oracle.clone()),
            inferred_object_properties: InferredHierarchy::new(oracle.clone()),
            inferred_data_properties: InferredHierarchy::new(oracle.clone()),
            superclasses: RootOverrideHierarchy::new(InferredHierarchy::new(oracle.clone())),
            structural: None,
            config,
            manager,
            renderer,
            index,
            oracle,
            disposed: false,
        }
    }

    fn ensure_live(&self) -> Result<(), SessionError> {
        if self.disposed {
            Err(SessionError::Disposed)
        } else {
            Ok(())
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn manager(&self) -> &OntologyManager {
        &self.manager
    }

    pub fn index(&self) -> &EntityIndex {
        &self.index
    }

    /// Finder over the current index using the configured defaults
    pub fn finder(&self) -> EntityFinder<'_> {
        EntityFinder::new(&self.index, &self.config.finder)
    }

    pub fn oracle(&self) -> &OracleHandle {
        &self.oracle
    }

    pub fn class_hierarchy(&self) -> &AssertedHierarchy<OwlClass> {
        &self.classes
    }

    pub fn object_property_hierarchy(&self) -> &AssertedHierarchy<ObjectProperty> {
        &self.object_properties
    }

    pub fn data_property_hierarchy(&self) -> &AssertedHierarchy<DataProperty> {
        &self.data_properties
    }

    pub fn annotation_property_hierarchy(&self) -> &AssertedHierarchy<AnnotationProperty> {
        &self.annotation_properties
    }

    pub fn inferred_class_hierarchy(&self) -> &InferredHierarchy<OwlClass> {
        &self.inferred_classes
    }

    pub fn inferred_object_property_hierarchy(&self) -> &InferredHierarchy<ObjectProperty> {
        &self.inferred_object_properties
    }

    pub fn inferred_data_property_hierarchy(&self) -> &InferredHierarchy<DataProperty> {
        &self.inferred_data_properties
    }

    pub fn superclass_hierarchy(&self) -> &SuperclassHierarchy {
        &self.superclasses
    }

    /// Status of the session-owned structural reasoner, if one is in use
    pub fn reasoner_status(&self) -> Option<ReasonerStatus> {
        self.structural.as_ref().map(|reasoner| reasoner.status())
    }

    pub fn create_ontology(&mut self, id: OntologyId) -> Result<(), SessionError> {
        self.ensure_live()?;
        let before = self.manager.active_ids();
        self.manager.create_ontology(id)?;
        if self.manager.active_ids() != before {
            self.active_set_changed()?;
        }
        Ok(())
    }

    pub fn set_active_ontology(&mut self, id: &OntologyId) -> Result<(), SessionError> {
        self.ensure_live()?;
        self.manager.set_active_ontology(id)?;
        self.active_set_changed()
    }

    pub fn set_scope(&mut self, scope: ActiveScope) -> Result<(), SessionError> {
        self.ensure_live()?;
        self.manager.set_scope(scope)?;
        self.active_set_changed()
    }

    pub fn add_import(&mut self, importer: &OntologyId, imported: &OntologyId) -> Result<bool, SessionError> {
        self.ensure_live()?;
        let before = self.manager.active_ids();
        let added = self.manager.add_import(importer, imported)?;
        if self.manager.active_ids() != before {
            self.active_set_changed()?;
        }
        Ok(added)
    }

    pub fn remove_import(&mut self, importer: &OntologyId, imported: &OntologyId) -> Result<bool, SessionError> {
        self.ensure_live()?;
        let before = self.manager.active_ids();
        let removed = self.manager.remove_import(importer, imported)?;
        if self.manager.active_ids() != before {
            self.active_set_changed()?;
        }
        Ok(removed)
    }

    /// Apply a change batch atomically and propagate the effective changes.
    ///
    /// Returns the changes that actually altered an ontology.
    pub fn apply_changes(&mut self, changes: Vec<OntologyChange>) -> Result<Vec<OntologyChange>, SessionError> {
        self.ensure_live()?;
        let applied = self.manager.apply_changes(changes)?;
        if applied.is_empty() {
            return Ok(applied);
        }

        {
            let set = self.manager.active_set();
            self.index.handle_changes(&set, &applied, self.renderer.as_ref());
            self.oracle.current().ontologies_changed(&applied);
            self.classes.handle_changes(&set, &applied)?;
            self.object_properties.handle_changes(&set, &applied)?;
            self.data_properties.handle_changes(&set, &applied)?;
            self.annotation_properties.handle_changes(&set, &applied)?;
        }
        debug!(changes = applied.len(), "Propagated change batch");

        if self.config.reasoner.auto_classify {
            self.classify()?;
        }
        Ok(applied)
    }

    /// Replace an ontology's contents wholesale
    pub fn reload_ontology(&mut self, id: &OntologyId, axioms: Vec<Axiom>) -> Result<(), SessionError> {
        self.ensure_live()?;
        self.manager.reload_ontology(id, axioms)?;
        if self.manager.active_ids().contains(id) {
            self.rebuild_derived_state()?;
        }
        self.broadcast(&ModelEvent::OntologyReloaded(id.clone()))?;
        info!(ontology = %id, "Reloaded ontology");
        Ok(())
    }

    /// Install a host-supplied oracle
    pub fn set_reasoner(&mut self, oracle: Arc<dyn ReasoningOracle>) -> Result<(), SessionError> {
        self.ensure_live()?;
        self.structural = None;
        let previous = self.oracle.replace(oracle);
        info!(previous = previous.name(), current = self.oracle.current().name(), "Reasoner replaced");
        self.broadcast(&ModelEvent::ReasonerChanged)
    }

    /// Install a structural reasoner bound to the active set; it is rebound
    /// whenever the active set changes
    pub fn use_structural_reasoner(&mut self) -> Result<(), SessionError> {
        self.ensure_live()?;
        let reasoner = self.bind_structural();
        self.oracle.replace(reasoner.clone());
        self.structural = Some(reasoner);
        info!("Structural reasoner selected");
        self.broadcast(&ModelEvent::ReasonerChanged)?;
        if self.config.reasoner.auto_classify {
            self.classify()?;
        }
        Ok(())
    }

    /// Flush the oracle's pending changes and reclassify
    pub fn classify(&mut self) -> Result<(), SessionError> {
        self.ensure_live()?;
        self.oracle.current().flush()?;
        self.broadcast(&ModelEvent::OntologyClassified)
    }

    /// Root the superclass view at `class`, or clear it
    pub fn set_superclass_root(&mut self, class: Option<OwlClass>) -> Result<(), SessionError> {
        self.ensure_live()?;
        self.superclasses.set_root(class)?;
        Ok(())
    }

    /// Release every subscription; the session accepts nothing afterwards
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.classes.dispose();
        self.object_properties.dispose();
        self.data_properties.dispose();
        self.annotation_properties.dispose();
        self.inferred_classes.dispose();
        self.inferred_object_properties.dispose();
        self.inferred_data_properties.dispose();
        self.superclasses.dispose();
        self.index.dispose();
        self.structural = None;
        self.disposed = true;
        info!("Editor session disposed");
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    fn bind_structural(&self) -> Arc<StructuralReasoner> {
        let mut reasoner = StructuralReasoner::new(&self.manager.active_set());
        if let Some(limit) = self.config.reasoner.max_axioms {
            reasoner = reasoner.with_axiom_limit(limit);
        }
        Arc::new(reasoner)
    }

    fn rebuild_derived_state(&mut self) -> Result<(), SessionError> {
        {
            let set = self.manager.active_set();
            self.index.rebuild(&set, self.renderer.as_ref());
            self.classes.set_ontologies(&set)?;
            self.object_properties.set_ontologies(&set)?;
            self.data_properties.set_ontologies(&set)?;
            self.annotation_properties.set_ontologies(&set)?;
        }

        if self.structural.is_some() {
            let reasoner = self.bind_structural();
            self.oracle.replace(reasoner.clone());
            self.structural = Some(reasoner);
        }
        Ok(())
    }

    fn active_set_changed(&mut self) -> Result<(), SessionError> {
        self.rebuild_derived_state()?;
        self.broadcast(&ModelEvent::ActiveOntologyChanged)?;
        if self.structural.is_some() && self.config.reasoner.auto_classify {
            self.classify()?;
        }
        info!(ontologies = self.manager.active_ids().len(), "Active ontology set changed");
        Ok(())
    }

    fn broadcast(&mut self, event: &ModelEvent) -> Result<(), SessionError> {
        self.classes.handle_event(event)?;
        self.object_properties.handle_event(event)?;
        self.data_properties.handle_event(event)?;
        self.annotation_properties.handle_event(event)?;
        self.inferred_classes.handle_event(event)?;
        self.inferred_object_properties.handle_event(event)?;
        self.inferred_data_properties.handle_event(event)?;
        self.superclasses.handle_event(event)?;
        Ok(())
    }
}

impl Default for EditorSession {
    fn default() -> Self {
        Self::new(SessionConfig::default())
    }
}

impl std::fmt::Debug for EditorSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditorSession")
            .field("active", &self.manager.active_ids())
            .field("indexed", &self.index.len())
            .field("oracle", &self.oracle)
            .field("disposed", &self.disposed)
            .finish()
    }
}
