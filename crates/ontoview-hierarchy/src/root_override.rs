//! Inverted "superclass" view rooted at a caller-selected entity

use crate::listeners::ListenerRegistry;
use crate::provider::HierarchyProvider;
use crate::HierarchyError;
use ontoview_core::{ModelEvent, OntologyChange, OntologySet, TypedEntity};
use std::collections::HashSet;
use std::marker::PhantomData;

/// Presents the ancestors of `root` as if they were its descendants, so a
/// generic tree widget can show a superclass hierarchy.
///
/// `children(x)` is `parents(x)` of the wrapped provider with the kind's top
/// left out. Only `root` and its ancestors are part of the view; every other
/// entity reads as unknown. Without a root the view is empty.
#[derive(Debug)]
pub struct RootOverrideHierarchy<E: TypedEntity, P: HierarchyProvider<E>> {
    inner: P,
    root: Option<E>,
    listeners: ListenerRegistry,
    disposed: bool,
    _kind: PhantomData<E>,
}

impl<E: TypedEntity, P: HierarchyProvider<E>> RootOverrideHierarchy<E, P> {
    pub fn new(inner: P) -> Self {
        Self {
            inner,
            root: None,
            listeners: ListenerRegistry::new(),
            disposed: false,
            _kind: PhantomData,
        }
    }

    pub fn with_root(inner: P, root: E) -> Self {
        let mut view = Self::new(inner);
        view.root = Some(root);
        view
    }

    pub fn root(&self) -> Option<&E> {
        self.root.as_ref()
    }

    pub fn set_root(&mut self, root: Option<E>) -> Result<(), HierarchyError> {
        self.ensure_live()?;
        if self.root != root {
            self.root = root;
            self.listeners.fire();
        }
        Ok(())
    }

    pub fn inner(&self) -> &P {
        &self.inner
    }

    fn ensure_live(&self) -> Result<(), HierarchyError> {
        if self.disposed {
            Err(HierarchyError::Disposed)
        } else {
            Ok(())
        }
    }

    /// `root` plus its ancestors, top excluded
    fn scope(&self) -> Result<HashSet<E>, HierarchyError> {
        let Some(root) = &self.root else {
            return Ok(HashSet::new());
        };
        let mut scope = self.inner.ancestors(root)?;
        scope.insert(root.clone());
        scope.retain(|e| !e.is_top());
        Ok(scope)
    }
}

impl<E: TypedEntity, P: HierarchyProvider<E>> HierarchyProvider<E> for RootOverrideHierarchy<E, P> {
    fn roots(&self) -> Result<HashSet<E>, HierarchyError> {
        self.ensure_live()?;
        Ok(self.root.iter().cloned().collect())
    }

    fn children(&self, entity: &E) -> Result<HashSet<E>, HierarchyError> {
        self.ensure_live()?;
        if !self.scope()?.contains(entity) {
            return Ok(HashSet::new());
        }
        let mut supers = self.inner.parents(entity)?;
        supers.retain(|e| !e.is_top());
        Ok(supers)
    }

    fn parents(&self, entity: &E) -> Result<HashSet<E>, HierarchyError> {
        self.ensure_live()?;
        if self.root.as_ref() == Some(entity) {
            return Ok(HashSet::new());
        }
        let scope = self.scope()?;
        if !scope.contains(entity) {
            return Ok(HashSet::new());
        }
        let mut subs = self.inner.children(entity)?;
        subs.retain(|e| scope.contains(e));
        Ok(subs)
    }

    fn equivalents(&self, entity: &E) -> Result<HashSet<E>, HierarchyError> {
        self.ensure_live()?;
        self.inner.equivalents(entity)
    }

    fn set_ontologies(&mut self, ontologies: &OntologySet<'_>) -> Result<(), HierarchyError> {
        self.ensure_live()?;
        self.inner.set_ontologies(ontologies)?;
        self.listeners.fire();
        Ok(())
    }

    fn handle_changes(
        &mut self,
        ontologies: &OntologySet<'_>,
        changes: &[OntologyChange],
    ) -> Result<(), HierarchyError> {
        self.ensure_live()?;
        self.inner.handle_changes(ontologies, changes)?;
        if !changes.is_empty() {
            self.listeners.fire();
        }
        Ok(())
    }

    fn handle_event(&mut self, event: &ModelEvent) -> Result<(), HierarchyError> {
        self.ensure_live()?;
        self.inner.handle_event(event)?;
        self.listeners.fire();
        Ok(())
    }

    fn is_consistent(&self) -> Result<bool, HierarchyError> {
        self.ensure_live()?;
        self.inner.is_consistent()
    }

    fn dispose(&mut self) {
        self.inner.dispose();
        self.listeners.clear();
        self.root = None;
        self.disposed = true;
    }

    fn is_disposed(&self) -> bool {
        self.disposed
    }

    fn listeners(&self) -> &ListenerRegistry {
        &self.listeners
    }
}
