//! Hierarchies built from told subsumption axioms

use crate::listeners::ListenerRegistry;
use crate::provider::{HierarchyConfig, HierarchyProvider};
use crate::HierarchyError;
use ontoview_core::{
    changed_entities, AnnotationProperty, Axiom, ClassExpression, DataProperty, ModelEvent, ObjectProperty,
    OntologyChange, OntologySet, OwlClass, TypedEntity,
};
use std::collections::{HashMap, HashSet, VecDeque};
use tracing::{debug, info};

/// Entity kind whose told parents and equivalents can be read off single axioms
pub trait AssertedEntity: TypedEntity {
    /// Named parents of `entity` stated by `axiom`
    fn told_parents(axiom: &Axiom, entity: &Self, config: &HierarchyConfig) -> Vec<Self>;

    /// Named entities `axiom` states to be equivalent to `entity`
    fn told_equivalents(axiom: &Axiom, entity: &Self) -> Vec<Self>;
}

impl AssertedEntity for OwlClass {
    fn told_parents(axiom: &Axiom, entity: &Self, config: &HierarchyConfig) -> Vec<Self> {
        let lift = |expr: &ClassExpression| -> Vec<OwlClass> {
            if config.named_conjuncts_as_parents {
                expr.named_conjuncts().into_iter().cloned().collect()
            } else {
                expr.named().into_iter().cloned().collect()
            }
        };
        match axiom {
            Axiom::SubClassOf { sub, sup } if sub.named() == Some(entity) => lift(sup),
            Axiom::EquivalentClasses(operands)
                if config.named_conjuncts_as_parents && operands.iter().any(|op| op.named() == Some(entity)) =>
            {
                operands
                    .iter()
                    .filter(|op| matches!(op, ClassExpression::IntersectionOf(_)))
                    .flat_map(|op| op.named_conjuncts())
                    .filter(|c| *c != entity)
                    .cloned()
                    .collect()
            }
            _ => Vec::new(),
        }
    }

    fn told_equivalents(axiom: &Axiom, entity: &Self) -> Vec<Self> {
        let Axiom::EquivalentClasses(operands) = axiom else {
            return Vec::new();
        };
        // Named operands plus the named disjuncts of union operands
        let names: Vec<&OwlClass> = operands.iter().flat_map(|op| op.named_disjuncts()).collect();
        if !names.contains(&entity) {
            return Vec::new();
        }
        names.into_iter().filter(|c| *c != entity).cloned().collect()
    }
}

impl AssertedEntity for ObjectProperty {
    fn told_parents(axiom: &Axiom, entity: &Self, _config: &HierarchyConfig) -> Vec<Self> {
        match axiom {
            Axiom::SubObjectPropertyOf { sub, sup } if sub.named() == Some(entity) => {
                sup.named().into_iter().cloned().collect()
            }
            _ => Vec::new(),
        }
    }

    fn told_equivalents(axiom: &Axiom, entity: &Self) -> Vec<Self> {
        match axiom {
            Axiom::EquivalentObjectProperties(properties)
                if properties.iter().any(|p| p.named() == Some(entity)) =>
            {
                properties
                    .iter()
                    .filter_map(|p| p.named())
                    .filter(|p| *p != entity)
                    .cloned()
                    .collect()
            }
            _ => Vec::new(),
        }
    }
}

impl AssertedEntity for DataProperty {
    fn told_parents(axiom: &Axiom, entity: &Self, _config: &HierarchyConfig) -> Vec<Self> {
        match axiom {
            Axiom::SubDataPropertyOf { sub, sup } if sub == entity => vec![sup.clone()],
            _ => Vec::new(),
        }
    }

    fn told_equivalents(axiom: &Axiom, entity: &Self) -> Vec<Self> {
        match axiom {
            Axiom::EquivalentDataProperties(properties) if properties.contains(entity) => {
                properties.iter().filter(|p| *p != entity).cloned().collect()
            }
            _ => Vec::new(),
        }
    }
}

impl AssertedEntity for AnnotationProperty {
    fn told_parents(axiom: &Axiom, entity: &Self, _config: &HierarchyConfig) -> Vec<Self> {
        match axiom {
            Axiom::SubAnnotationPropertyOf { sub, sup } if sub == entity => vec![sup.clone()],
            _ => Vec::new(),
        }
    }

    fn told_equivalents(_axiom: &Axiom, _entity: &Self) -> Vec<Self> {
        Vec::new()
    }
}

/// Told hierarchy over one entity kind, kept in step with change batches.
///
/// Forward and reverse adjacency are updated per affected entity; ancestors
/// and descendants are walked on demand. For kinds with a top entity the
/// hierarchy is top-rooted: parentless members hang under top, and so does
/// one member of every told cycle that nothing else anchors.
#[derive(Debug)]
pub struct AssertedHierarchy<E: AssertedEntity> {
    config: HierarchyConfig,
    members: HashSet<E>,
    parents: HashMap<E, HashSet<E>>,
    children: HashMap<E, HashSet<E>>,
    equivalents: HashMap<E, HashSet<E>>,
    /// Members other than top without told parents
    orphans: HashSet<E>,
    /// Members of told cycles unreachable from any root
    cycle_roots: HashSet<E>,
    listeners: ListenerRegistry,
    disposed: bool,
}

impl<E: AssertedEntity> AssertedHierarchy<E> {
    pub fn new(config: HierarchyConfig) -> Self {
        let mut hierarchy = Self {
            config,
            members: HashSet::new(),
            parents: HashMap::new(),
            children: HashMap::new(),
            equivalents: HashMap::new(),
            orphans: HashSet::new(),
            cycle_roots: HashSet::new(),
            listeners: ListenerRegistry::new(),
            disposed: false,
        };
        hierarchy.members.extend(E::top());
        hierarchy
    }

    /// Build over `ontologies` without notifying anyone
    pub fn with_ontologies(config: HierarchyConfig, ontologies: &OntologySet<'_>) -> Self {
        let mut hierarchy = Self::new(config);
        hierarchy.rebuild(ontologies);
        hierarchy
    }

    pub fn config(&self) -> &HierarchyConfig {
        &self.config
    }

    pub fn contains(&self, entity: &E) -> bool {
        self.members.contains(entity)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    fn ensure_live(&self) -> Result<(), HierarchyError> {
        if self.disposed {
            Err(HierarchyError::Disposed)
        } else {
            Ok(())
        }
    }

    fn rebuild(&mut self, ontologies: &OntologySet<'_>) {
        self.members.clear();
        self.parents.clear();
        self.children.clear();
        self.equivalents.clear();
        self.orphans.clear();
        self.members.extend(E::top());

        let mut signature: Vec<E> = ontologies
            .signature()
            .iter()
            .filter_map(E::from_entity)
            .collect();
        signature.sort();
        for entity in &signature {
            self.recompute(entity, ontologies);
        }
        self.recompute_cycle_roots();

        info!(
            kind = %E::KIND,
            members = self.members.len(),
            "Rebuilt asserted hierarchy"
        );
    }

    /// Re-derive membership, told parents and equivalents of one entity.
    /// Returns whether any edge changed.
    fn recompute(&mut self, entity: &E, ontologies: &OntologySet<'_>) -> bool {
        let as_entity = entity.to_entity();
        let member = entity.is_top() || ontologies.contains_entity(&as_entity);

        let mut told = HashSet::new();
        let mut equivalents = HashSet::new();
        if member {
            for axiom in ontologies.axioms_referencing(&as_entity) {
                if !entity.is_top() {
                    told.extend(E::told_parents(axiom, entity, &self.config));
                }
                equivalents.extend(E::told_equivalents(axiom, entity));
            }
            told.remove(entity);
            equivalents.remove(entity);
        }

        let previous = self.parents.remove(entity).unwrap_or_default();
        let changed = previous != told || self.members.contains(entity) != member;
        for stale in previous.difference(&told) {
            if let Some(siblings) = self.children.get_mut(stale) {
                siblings.remove(entity);
                if siblings.is_empty() {
                    self.children.remove(stale);
                }
            }
        }
        for fresh in told.difference(&previous) {
            self.children.entry(fresh.clone()).or_default().insert(entity.clone());
        }

        if member {
            self.members.insert(entity.clone());
            if told.is_empty() && !entity.is_top() {
                self.orphans.insert(entity.clone());
            } else {
                self.orphans.remove(entity);
            }
            if !told.is_empty() {
                self.parents.insert(entity.clone(), told);
            }
            if equivalents.is_empty() {
                self.equivalents.remove(entity);
            } else {
                self.equivalents.insert(entity.clone(), equivalents);
            }
        } else {
            self.members.remove(entity);
            self.orphans.remove(entity);
            self.equivalents.remove(entity);
        }
        changed
    }

    /// Every member reachable from top, the orphans or existing roots is
    /// anchored; each unanchored member lying on a told cycle becomes a
    /// cycle root.
    fn recompute_cycle_roots(&mut self) {
        let mut anchored: HashSet<E> = HashSet::new();
        let mut queue: VecDeque<E> = self.orphans.iter().cloned().chain(E::top()).collect();
        while let Some(current) = queue.pop_front() {
            if !anchored.insert(current.clone()) {
                continue;
            }
            for child in self.children.get(&current).into_iter().flatten() {
                if !anchored.contains(child) {
                    queue.push_back(child.clone());
                }
            }
        }

        let unanchored: HashSet<&E> = self.members.iter().filter(|m| !anchored.contains(*m)).collect();
        let mut cycle_roots = HashSet::new();
        for candidate in &unanchored {
            if self.reaches_itself(candidate, &unanchored) {
                cycle_roots.insert((*candidate).clone());
            }
        }
        if !cycle_roots.is_empty() {
            debug!(kind = %E::KIND, cycles = cycle_roots.len(), "Anchored told cycles");
        }
        self.cycle_roots = cycle_roots;
    }

    fn reaches_itself(&self, start: &E, within: &HashSet<&E>) -> bool {
        let mut seen = HashSet::new();
        let mut queue = VecDeque::from([start]);
        while let Some(current) = queue.pop_front() {
            for parent in self.parents.get(current).into_iter().flatten() {
                if parent == start {
                    return true;
                }
                if within.contains(parent) && seen.insert(parent) {
                    queue.push_back(parent);
                }
            }
        }
        false
    }

    fn told_parents(&self, entity: &E) -> HashSet<E> {
        self.parents.get(entity).cloned().unwrap_or_default()
    }

    fn told_children(&self, entity: &E) -> HashSet<E> {
        self.children.get(entity).cloned().unwrap_or_default()
    }
}

impl<E: AssertedEntity> Default for AssertedHierarchy<E> {
    fn default() -> Self {
        Self::new(HierarchyConfig::default())
    }
}

impl<E: AssertedEntity> HierarchyProvider<E> for AssertedHierarchy<E> {
    fn roots(&self) -> Result<HashSet<E>, HierarchyError> {
        self.ensure_live()?;
        Ok(match E::top() {
            Some(top) => HashSet::from([top]),
            None => self.orphans.union(&self.cycle_roots).cloned().collect(),
        })
    }

    fn children(&self, entity: &E) -> Result<HashSet<E>, HierarchyError> {
        self.ensure_live()?;
        if !self.members.contains(entity) {
            return Ok(HashSet::new());
        }
        let mut children = self.told_children(entity);
        if entity.is_top() {
            children.extend(self.orphans.iter().cloned());
            children.extend(self.cycle_roots.iter().cloned());
        }
        Ok(children)
    }

    fn parents(&self, entity: &E) -> Result<HashSet<E>, HierarchyError> {
        self.ensure_live()?;
        if !self.members.contains(entity) || entity.is_top() {
            return Ok(HashSet::new());
        }
        let mut parents = self.told_parents(entity);
        if let Some(top) = E::top() {
            if parents.is_empty() || self.cycle_roots.contains(entity) {
                parents.insert(top);
            }
        }
        Ok(parents)
    }

    fn equivalents(&self, entity: &E) -> Result<HashSet<E>, HierarchyError> {
        self.ensure_live()?;
        Ok(self.equivalents.get(entity).cloned().unwrap_or_default())
    }

    fn set_ontologies(&mut self, ontologies: &OntologySet<'_>) -> Result<(), HierarchyError> {
        self.ensure_live()?;
        self.rebuild(ontologies);
        self.listeners.fire();
        Ok(())
    }

    fn handle_changes(
        &mut self,
        ontologies: &OntologySet<'_>,
        changes: &[OntologyChange],
    ) -> Result<(), HierarchyError> {
        self.ensure_live()?;
        let relevant = changes
            .iter()
            .filter(|change| ontologies.contains_ontology(change.ontology()));
        let mut affected: Vec<E> = changed_entities(relevant)
            .iter()
            .filter_map(E::from_entity)
            .collect();
        if affected.is_empty() {
            return Ok(());
        }
        affected.sort();

        let mut changed = false;
        for entity in &affected {
            changed |= self.recompute(entity, ontologies);
        }
        if changed {
            self.recompute_cycle_roots();
        }

        debug!(
            kind = %E::KIND,
            affected = affected.len(),
            changed,
            "Applied change batch to asserted hierarchy"
        );
        self.listeners.fire();
        Ok(())
    }

    fn handle_event(&mut self, event: &ModelEvent) -> Result<(), HierarchyError> {
        self.ensure_live()?;
        debug!(kind = %E::KIND, ?event, "Asserted hierarchy ignores model event");
        Ok(())
    }

    fn dispose(&mut self) {
        self.listeners.clear();
        self.members.clear();
        self.parents.clear();
        self.children.clear();
        self.equivalents.clear();
        self.orphans.clear();
        self.cycle_roots.clear();
        self.disposed = true;
    }

    fn is_disposed(&self) -> bool {
        self.disposed
    }

    fn listeners(&self) -> &ListenerRegistry {
        &self.listeners
    }
}
