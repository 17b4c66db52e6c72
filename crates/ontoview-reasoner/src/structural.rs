//! Structural classifier over told axioms.
//!
//! Answers from the closure of named subsumptions, completed with simple
//! definitions (`A ≡ B ⊓ C`) and union splitting, and detects unsatisfiable
//! classes through disjointness, complements and `owl:Nothing`. It is sound
//! for what it reports but not complete; hosts wanting full OWL 2 reasoning
//! plug another [`ReasoningOracle`] in.

use crate::oracle::ReasoningOracle;
use crate::taxonomy::{Definition, Taxonomy};
use crate::ReasonerError;
use chrono::{DateTime, Utc};
use ontoview_core::vocabulary;
use ontoview_core::{
    Axiom, ClassExpression, DataProperty, Entity, EntityKind, ObjectProperty, OntologyChange, OntologyId, OntologySet,
    OwlClass, TypedEntity,
};
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Snapshot of the reasoner's bookkeeping
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReasonerStatus {
    pub name: String,
    pub ontologies: Vec<OntologyId>,
    pub axiom_count: usize,
    pub pending_changes: usize,
    pub consistent: bool,
    pub unsatisfiable_classes: usize,
    pub last_classified: Option<DateTime<Utc>>,
}

#[derive(Debug)]
struct Classification {
    consistent: bool,
    classes: Taxonomy<OwlClass>,
    object_properties: Taxonomy<ObjectProperty>,
    data_properties: Taxonomy<DataProperty>,
}

impl Classification {
    fn unclassified() -> Self {
        Self {
            consistent: true,
            classes: Taxonomy::trivial(vocabulary::OWL_THING.clone(), vocabulary::OWL_NOTHING.clone()),
            object_properties: Taxonomy::trivial(
                vocabulary::OWL_TOP_OBJECT_PROPERTY.clone(),
                vocabulary::OWL_BOTTOM_OBJECT_PROPERTY.clone(),
            ),
            data_properties: Taxonomy::trivial(
                vocabulary::OWL_TOP_DATA_PROPERTY.clone(),
                vocabulary::OWL_BOTTOM_DATA_PROPERTY.clone(),
            ),
        }
    }

    fn compute<'a>(axioms: impl Iterator<Item = &'a Axiom>) -> Self {
        let mut collector = Collector::default();
        for axiom in axioms {
            collector.visit(axiom);
        }
        collector.finish()
    }
}

/// Told facts gathered from the axioms, one pass
#[derive(Default)]
struct Collector {
    classes: HashSet<OwlClass>,
    class_edges: HashMap<OwlClass, HashSet<OwlClass>>,
    definitions: Vec<Definition<OwlClass>>,
    disjoint_sets: Vec<Vec<OwlClass>>,
    complements: Vec<(OwlClass, OwlClass)>,
    asserted_types: Vec<ClassExpression>,
    object_properties: HashSet<ObjectProperty>,
    object_edges: HashMap<ObjectProperty, HashSet<ObjectProperty>>,
    data_properties: HashSet<DataProperty>,
    data_edges: HashMap<DataProperty, HashSet<DataProperty>>,
}

fn add_edge<T: Clone + Eq + std::hash::Hash>(edges: &mut HashMap<T, HashSet<T>>, sub: &T, sup: &T) {
    if sub != sup {
        edges.entry(sub.clone()).or_default().insert(sup.clone());
    }
}

impl Collector {
    fn visit(&mut self, axiom: &Axiom) {
        for entity in axiom.signature() {
            match entity.kind {
                EntityKind::Class => {
                    self.classes.insert(OwlClass(entity.iri));
                }
                EntityKind::ObjectProperty => {
                    self.object_properties.insert(ObjectProperty(entity.iri));
                }
                EntityKind::DataProperty => {
                    self.data_properties.insert(DataProperty(entity.iri));
                }
                _ => {}
            }
        }

        match axiom {
            Axiom::SubClassOf { sub, sup } => {
                let conjuncts = sup.named_conjuncts();
                for subclass in sub.named_disjuncts() {
                    for parent in &conjuncts {
                        add_edge(&mut self.class_edges, subclass, *parent);
                    }
                    if let ClassExpression::ComplementOf(inner) = sup {
                        if let Some(negated) = inner.named() {
                            self.complements.push((subclass.clone(), negated.clone()));
                        }
                    }
                }
            }
            Axiom::EquivalentClasses(operands) => {
                for (i, left) in operands.iter().enumerate() {
                    let Some(named) = left.named() else { continue };
                    for (j, right) in operands.iter().enumerate() {
                        if i == j {
                            continue;
                        }
                        for conjunct in right.named_conjuncts() {
                            add_edge(&mut self.class_edges, named, conjunct);
                        }
                        if matches!(right, ClassExpression::UnionOf(_)) {
                            for disjunct in right.named_disjuncts() {
                                add_edge(&mut self.class_edges, disjunct, named);
                            }
                        }
                        if let ClassExpression::IntersectionOf(parts) = right {
                            if parts.iter().all(|p| !p.is_anonymous()) {
                                let conjuncts = right.named_conjuncts().into_iter().cloned().collect();
                                self.definitions.push((named.clone(), conjuncts));
                            }
                        }
                    }
                }
            }
            Axiom::DisjointClasses(operands) => {
                let named: Vec<OwlClass> = operands.iter().filter_map(|c| c.named().cloned()).collect();
                if named.len() > 1 {
                    self.disjoint_sets.push(named);
                }
            }
            Axiom::SubObjectPropertyOf { sub, sup } => {
                if let (Some(sub), Some(sup)) = (sub.named(), sup.named()) {
                    add_edge(&mut self.object_edges, sub, sup);
                }
            }
            Axiom::EquivalentObjectProperties(properties) => {
                let named: Vec<&ObjectProperty> = properties.iter().filter_map(|p| p.named()).collect();
                for a in &named {
                    for b in &named {
                        add_edge(&mut self.object_edges, *a, *b);
                    }
                }
            }
            Axiom::SubDataPropertyOf { sub, sup } => add_edge(&mut self.data_edges, sub, sup),
            Axiom::EquivalentDataProperties(properties) => {
                for a in properties {
                    for b in properties {
                        add_edge(&mut self.data_edges, a, b);
                    }
                }
            }
            Axiom::ClassAssertion(class, _) => self.asserted_types.push(class.clone()),
            _ => {}
        }
    }

    fn finish(self) -> Classification {
        let thing = vocabulary::OWL_THING.clone();
        let nothing = vocabulary::OWL_NOTHING.clone();

        let told = Taxonomy::build(
            self.classes.clone(),
            self.class_edges.clone(),
            &self.definitions,
            HashSet::new(),
            thing.clone(),
            nothing.clone(),
        );

        let mut clashes = HashSet::new();
        for member in told.members() {
            let Some(supers) = told.closure_of(member) else { continue };
            let disjoint_clash = self
                .disjoint_sets
                .iter()
                .any(|set| set.iter().filter(|c| supers.contains(*c)).take(2).count() == 2);
            let complement_clash = self
                .complements
                .iter()
                .any(|(sub, negated)| supers.contains(sub) && supers.contains(negated));
            if disjoint_clash || complement_clash {
                clashes.insert(member.clone());
            }
        }

        let classes = if clashes.is_empty() {
            told
        } else {
            Taxonomy::build(self.classes, self.class_edges, &self.definitions, clashes, thing.clone(), nothing.clone())
        };

        let consistent = classes.is_satisfiable(&thing)
            && self.asserted_types.iter().all(|expr| {
                expr.named_conjuncts()
                    .into_iter()
                    .all(|c| classes.is_satisfiable(c))
            });

        Classification {
            consistent,
            classes,
            object_properties: Taxonomy::build(
                self.object_properties,
                self.object_edges,
                &[],
                HashSet::new(),
                vocabulary::OWL_TOP_OBJECT_PROPERTY.clone(),
                vocabulary::OWL_BOTTOM_OBJECT_PROPERTY.clone(),
            ),
            data_properties: Taxonomy::build(
                self.data_properties,
                self.data_edges,
                &[],
                HashSet::new(),
                vocabulary::OWL_TOP_DATA_PROPERTY.clone(),
                vocabulary::OWL_BOTTOM_DATA_PROPERTY.clone(),
            ),
        }
    }
}

#[derive(Debug, Default)]
struct Pending {
    changes: Vec<OntologyChange>,
    /// Set until the first classification
    stale: bool,
}

/// Oracle bound to a fixed set of ontologies (typically the active ontology
/// and its imports closure).
///
/// Edits to other ontologies are ignored. Edits to bound ones are buffered
/// until [`flush`](ReasoningOracle::flush), which reclassifies and swaps the
/// result in; readers keep the previous classification until then.
#[derive(Debug)]
pub struct StructuralReasoner {
    bound: BTreeSet<OntologyId>,
    max_axioms: Option<usize>,
    /// Logical axiom -> number of bound ontologies holding it
    axioms: Mutex<HashMap<Axiom, usize>>,
    pending: Mutex<Pending>,
    classification: RwLock<Arc<Classification>>,
    last_classified: RwLock<Option<DateTime<Utc>>>,
}

impl StructuralReasoner {
    pub const NAME: &'static str = "structural";

    pub fn new(ontologies: &OntologySet<'_>) -> Self {
        let mut axioms: HashMap<Axiom, usize> = HashMap::new();
        for axiom in ontologies.axioms().filter(|a| a.is_logical()) {
            *axioms.entry(axiom.clone()).or_default() += 1;
        }
        debug!(
            "Structural reasoner bound to {} ontologies with {} logical axioms",
            ontologies.len(),
            axioms.len()
        );

        Self {
            bound: ontologies.ids(),
            max_axioms: None,
            axioms: Mutex::new(axioms),
            pending: Mutex::new(Pending {
                changes: Vec::new(),
                stale: true,
            }),
            classification: RwLock::new(Arc::new(Classification::unclassified())),
            last_classified: RwLock::new(None),
        }
    }

    /// Refuse to classify more than `limit` distinct logical axioms
    pub fn with_axiom_limit(mut self, limit: usize) -> Self {
        self.max_axioms = Some(limit);
        self
    }

    pub fn bound_ontologies(&self) -> &BTreeSet<OntologyId> {
        &self.bound
    }

    pub fn status(&self) -> ReasonerStatus {
        let classification = self.snapshot();
        ReasonerStatus {
            name: Self::NAME.to_string(),
            ontologies: self.bound.iter().cloned().collect(),
            axiom_count: self.axioms.lock().len(),
            pending_changes: self.pending.lock().changes.len(),
            consistent: classification.consistent,
            unsatisfiable_classes: classification
                .classes
                .unsatisfiable()
                .iter()
                .filter(|c| !c.is_bottom())
                .count(),
            last_classified: *self.last_classified.read(),
        }
    }

    fn snapshot(&self) -> Arc<Classification> {
        Arc::clone(&self.classification.read())
    }
}

impl ReasoningOracle for StructuralReasoner {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn is_consistent(&self) -> bool {
        self.snapshot().consistent
    }

    fn is_satisfiable(&self, entity: &Entity) -> bool {
        let classification = self.snapshot();
        match entity.kind {
            EntityKind::Class => classification.classes.is_satisfiable(&OwlClass(entity.iri.clone())),
            EntityKind::ObjectProperty => classification
                .object_properties
                .is_satisfiable(&ObjectProperty(entity.iri.clone())),
            EntityKind::DataProperty => classification
                .data_properties
                .is_satisfiable(&DataProperty(entity.iri.clone())),
            _ => true,
        }
    }

    fn sub_classes(&self, class: &OwlClass, direct: bool) -> HashSet<OwlClass> {
        self.snapshot().classes.subs(class, direct)
    }

    fn super_classes(&self, class: &OwlClass, direct: bool) -> HashSet<OwlClass> {
        self.snapshot().classes.supers(class, direct)
    }

    fn equivalent_classes(&self, class: &OwlClass) -> HashSet<OwlClass> {
        self.snapshot().classes.equivalents(class)
    }

    fn unsatisfiable_classes(&self) -> HashSet<OwlClass> {
        self.snapshot().classes.unsatisfiable()
    }

    fn sub_object_properties(&self, property: &ObjectProperty, direct: bool) -> HashSet<ObjectProperty> {
        self.snapshot().object_properties.subs(property, direct)
    }

    fn super_object_properties(&self, property: &ObjectProperty, direct: bool) -> HashSet<ObjectProperty> {
        self.snapshot().object_properties.supers(property, direct)
    }

    fn equivalent_object_properties(&self, property: &ObjectProperty) -> HashSet<ObjectProperty> {
        self.snapshot().object_properties.equivalents(property)
    }

    fn unsatisfiable_object_properties(&self) -> HashSet<ObjectProperty> {
        self.snapshot().object_properties.unsatisfiable()
    }

    fn sub_data_properties(&self, property: &DataProperty, direct: bool) -> HashSet<DataProperty> {
        self.snapshot().data_properties.subs(property, direct)
    }

    fn super_data_properties(&self, property: &DataProperty, direct: bool) -> HashSet<DataProperty> {
        self.snapshot().data_properties.supers(property, direct)
    }

    fn equivalent_data_properties(&self, property: &DataProperty) -> HashSet<DataProperty> {
        self.snapshot().data_properties.equivalents(property)
    }

    fn unsatisfiable_data_properties(&self) -> HashSet<DataProperty> {
        self.snapshot().data_properties.unsatisfiable()
    }

    fn ontologies_changed(&self, changes: &[OntologyChange]) {
        let relevant: Vec<OntologyChange> = changes
            .iter()
            .filter(|c| self.bound.contains(c.ontology()) && c.axiom().is_logical())
            .cloned()
            .collect();
        if relevant.is_empty() {
            return;
        }
        debug!("Structural reasoner buffered {} changes", relevant.len());
        self.pending.lock().changes.extend(relevant);
    }

    fn has_pending_changes(&self) -> bool {
        let pending = self.pending.lock();
        pending.stale || !pending.changes.is_empty()
    }

    fn flush(&self) -> Result<(), ReasonerError> {
        let changes = {
            let mut pending = self.pending.lock();
            if !pending.stale && pending.changes.is_empty() {
                return Ok(());
            }
            pending.stale = false;
            std::mem::take(&mut pending.changes)
        };

        let started = Instant::now();
        let classification = {
            let mut axioms = self.axioms.lock();
            for change in changes {
                match change {
                    OntologyChange::AddAxiom { axiom, .. } => *axioms.entry(axiom).or_default() += 1,
                    OntologyChange::RemoveAxiom { axiom, .. } => {
                        if let Some(count) = axioms.get_mut(&axiom) {
                            *count -= 1;
                            if *count == 0 {
                                axioms.remove(&axiom);
                            }
                        }
                    }
                }
            }

            if let Some(limit) = self.max_axioms {
                if axioms.len() > limit {
                    self.pending.lock().stale = true;
                    return Err(ReasonerError::TooLarge {
                        axioms: axioms.len(),
                        limit,
                    });
                }
            }
            Classification::compute(axioms.keys())
        };

        let unsatisfiable = classification.classes.unsatisfiable().len();
        let consistent = classification.consistent;
        let class_count = classification.classes.len();
        *self.classification.write() = Arc::new(classification);
        *self.last_classified.write() = Some(Utc::now());

        info!(
            "Classified {} classes in {:?}: consistent={}, unsatisfiable={}",
            class_count,
            started.elapsed(),
            consistent,
            unsatisfiable
        );
        Ok(())
    }
}
