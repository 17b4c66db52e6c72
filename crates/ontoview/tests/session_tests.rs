use ontoview::prelude::*;
use ontoview::ReasonerConfig;
use ontoview_reasoner::ReasonerError;
use proptest::prelude::*;
use std::cell::Cell;
use std::collections::HashSet;
use std::rc::Rc;
use std::sync::Arc;

fn ex(name: &str) -> String {
    format!("http://example.org/zoo#{}", name)
}

fn class(name: &str) -> OwlClass {
    OwlClass::new(ex(name))
}

fn session() -> (EditorSession, OntologyId) {
    let mut session = EditorSession::default();
    let id = OntologyId::new("http://example.org/zoo");
    session.create_ontology(id.clone()).unwrap();
    (session, id)
}

fn counter(registry: &ontoview::hierarchy::ListenerRegistry) -> Rc<Cell<usize>> {
    let count = Rc::new(Cell::new(0));
    let inner = Rc::clone(&count);
    registry.add(move || inner.set(inner.get() + 1));
    count
}

#[test]
fn test_dog_animal_scenario() {
    let (mut session, id) = session();
    let axiom = Axiom::sub_class_of(class("Dog"), class("Animal"));

    session.apply_changes(vec![OntologyChange::add(&id, axiom.clone())]).unwrap();

    let hierarchy = session.class_hierarchy();
    assert_eq!(hierarchy.children(&class("Animal")).unwrap(), HashSet::from([class("Dog")]));
    assert_eq!(hierarchy.parents(&class("Dog")).unwrap(), HashSet::from([class("Animal")]));
    assert!(hierarchy.roots().unwrap().contains(&vocabulary::OWL_THING));
    let finder = session.finder();
    assert_eq!(finder.by_rendering(EntityKind::Class, "Dog"), Some(class("Dog").to_entity()));
    assert_eq!(finder.by_rendering(EntityKind::Class, "Animal"), Some(class("Animal").to_entity()));

    session.apply_changes(vec![OntologyChange::remove(&id, axiom)]).unwrap();

    let hierarchy = session.class_hierarchy();
    assert!(hierarchy.children(&class("Animal")).unwrap().is_empty());
    assert!(hierarchy.parents(&class("Dog")).unwrap().is_empty());
    assert!(!session.index().contains(&class("Dog").to_entity()));
    assert!(!session.index().contains(&class("Animal").to_entity()));
}

#[test]
fn test_change_batch_notifies_each_asserted_hierarchy_once() {
    let (mut session, id) = session();
    let classes = counter(session.class_hierarchy().listeners());
    let objects = counter(session.object_property_hierarchy().listeners());

    session
        .apply_changes(vec![
            OntologyChange::add(&id, Axiom::declaration(class("Cat"))),
            OntologyChange::add(&id, Axiom::sub_class_of(class("Cat"), class("Animal"))),
        ])
        .unwrap();

    assert_eq!(classes.get(), 1);
    assert_eq!(objects.get(), 0);
    assert!(session.index().contains(&class("Cat").to_entity()));
}

#[test]
fn test_ineffective_batch_notifies_nobody() {
    let (mut session, id) = session();
    let notified = counter(session.class_hierarchy().listeners());

    let applied = session
        .apply_changes(vec![OntologyChange::remove(&id, Axiom::declaration(class("Ghost")))])
        .unwrap();

    assert!(applied.is_empty());
    assert_eq!(notified.get(), 0);
}

#[test]
fn test_unknown_ontology_rejects_whole_batch() {
    let (mut session, id) = session();
    let unknown = OntologyId::new("http://example.org/unknown");

    let result = session.apply_changes(vec![
        OntologyChange::add(&id, Axiom::declaration(class("Dog"))),
        OntologyChange::add(&unknown, Axiom::declaration(class("Cat"))),
    ]);

    assert!(matches!(result, Err(SessionError::Core(_))));
    assert!(!session.index().contains(&class("Dog").to_entity()));
    assert!(!session.class_hierarchy().contains(&class("Dog")));
}

#[test]
fn test_structural_reasoner_with_auto_classify() {
    let mut config = SessionConfig::default();
    config.reasoner = ReasonerConfig {
        auto_classify: true,
        max_axioms: None,
    };
    let mut session = EditorSession::new(config);
    let id = OntologyId::new("http://example.org/zoo");
    session.create_ontology(id.clone()).unwrap();
    session.use_structural_reasoner().unwrap();
    let notified = counter(session.inferred_class_hierarchy().listeners());

    session
        .apply_changes(vec![
            OntologyChange::add(&id, Axiom::DisjointClasses(vec![class("Cat").into(), class("Dog").into()])),
            OntologyChange::add(&id, Axiom::sub_class_of(class("CatDog"), class("Cat"))),
            OntologyChange::add(&id, Axiom::sub_class_of(class("CatDog"), class("Dog"))),
        ])
        .unwrap();

    assert_eq!(notified.get(), 1);
    let inferred = session.inferred_class_hierarchy();
    assert_eq!(
        inferred.parents(&class("CatDog")).unwrap(),
        HashSet::from([vocabulary::OWL_NOTHING.clone()])
    );
    assert!(inferred.children(&vocabulary::OWL_NOTHING).unwrap().contains(&class("CatDog")));

    let status = session.reasoner_status().unwrap();
    assert!(status.consistent);
    assert_eq!(status.unsatisfiable_classes, 1);
    assert!(status.last_classified.is_some());
}

#[test]
fn test_inferred_results_wait_for_classify() {
    let (mut session, id) = session();
    session.use_structural_reasoner().unwrap();
    session.classify().unwrap();

    session
        .apply_changes(vec![OntologyChange::add(&id, Axiom::sub_class_of(class("Dog"), class("Animal")))])
        .unwrap();
    assert!(session.inferred_class_hierarchy().children(&class("Animal")).unwrap().is_empty());
    assert!(session.oracle().current().has_pending_changes());

    session.classify().unwrap();
    assert_eq!(
        session.inferred_class_hierarchy().children(&class("Animal")).unwrap(),
        HashSet::from([class("Dog")])
    );
}

#[test]
fn test_axiom_limit_surfaces_as_reasoner_error() {
    let mut config = SessionConfig::default();
    config.reasoner.max_axioms = Some(1);
    let mut session = EditorSession::new(config);
    let id = OntologyId::new("http://example.org/zoo");
    session.create_ontology(id.clone()).unwrap();
    session.use_structural_reasoner().unwrap();
    session
        .apply_changes(vec![
            OntologyChange::add(&id, Axiom::sub_class_of(class("Dog"), class("Animal"))),
            OntologyChange::add(&id, Axiom::sub_class_of(class("Cat"), class("Animal"))),
        ])
        .unwrap();

    let result = session.classify();
    assert!(matches!(
        result,
        Err(SessionError::Reasoner(ReasonerError::TooLarge { axioms: 2, limit: 1 }))
    ));
}

#[test]
fn test_active_ontology_switch_rebuilds_everything() {
    let (mut session, zoo) = session();
    let garden = OntologyId::new("http://example.org/garden");
    session.create_ontology(garden.clone()).unwrap();
    session
        .apply_changes(vec![
            OntologyChange::add(&zoo, Axiom::sub_class_of(class("Dog"), class("Animal"))),
            OntologyChange::add(&garden, Axiom::sub_class_of(class("Oak"), class("Tree"))),
        ])
        .unwrap();
    assert!(!session.index().contains(&class("Oak").to_entity()));

    let inferred_notified = counter(session.inferred_class_hierarchy().listeners());
    let asserted_notified = counter(session.class_hierarchy().listeners());
    session.set_active_ontology(&garden).unwrap();

    assert_eq!(inferred_notified.get(), 1);
    assert_eq!(asserted_notified.get(), 1);
    assert!(session.index().contains(&class("Oak").to_entity()));
    assert!(!session.index().contains(&class("Dog").to_entity()));
    assert_eq!(
        session.class_hierarchy().children(&class("Tree")).unwrap(),
        HashSet::from([class("Oak")])
    );
}

#[test]
fn test_import_extends_active_set() {
    let (mut session, zoo) = session();
    let shared = OntologyId::new("http://example.org/shared");
    session.create_ontology(shared.clone()).unwrap();
    session
        .apply_changes(vec![OntologyChange::add(&shared, Axiom::sub_class_of(class("Animal"), class("Organism")))])
        .unwrap();
    assert!(!session.class_hierarchy().contains(&class("Animal")));

    assert!(session.add_import(&zoo, &shared).unwrap());
    assert_eq!(
        session.class_hierarchy().parents(&class("Animal")).unwrap(),
        HashSet::from([class("Organism")])
    );

    session.set_scope(ActiveScope::ActiveOnly).unwrap();
    assert!(!session.class_hierarchy().contains(&class("Animal")));
}

#[test]
fn test_reload_replaces_derived_state() {
    let (mut session, id) = session();
    session
        .apply_changes(vec![OntologyChange::add(&id, Axiom::sub_class_of(class("Dog"), class("Animal")))])
        .unwrap();
    let notified = counter(session.inferred_class_hierarchy().listeners());

    session
        .reload_ontology(&id, vec![Axiom::sub_class_of(class("Cat"), class("Animal"))])
        .unwrap();

    assert_eq!(notified.get(), 1);
    assert!(!session.index().contains(&class("Dog").to_entity()));
    assert_eq!(
        session.class_hierarchy().children(&class("Animal")).unwrap(),
        HashSet::from([class("Cat")])
    );
}

#[test]
fn test_set_reasoner_fires_inferred_listeners() {
    let (mut session, _) = session();
    session.use_structural_reasoner().unwrap();
    let notified = counter(session.inferred_data_property_hierarchy().listeners());

    session.set_reasoner(Arc::new(NullOracle)).unwrap();

    assert_eq!(notified.get(), 1);
    assert_eq!(session.oracle().current().name(), "null");
    assert!(session.reasoner_status().is_none());
}

#[test]
fn test_superclass_view() {
    let (mut session, id) = session();
    session
        .apply_changes(vec![
            OntologyChange::add(&id, Axiom::sub_class_of(class("Dog"), class("Mammal"))),
            OntologyChange::add(&id, Axiom::sub_class_of(class("Mammal"), class("Animal"))),
        ])
        .unwrap();
    session.use_structural_reasoner().unwrap();
    session.classify().unwrap();

    session.set_superclass_root(Some(class("Dog"))).unwrap();
    let view = session.superclass_hierarchy();
    assert_eq!(view.roots().unwrap(), HashSet::from([class("Dog")]));
    assert_eq!(view.children(&class("Dog")).unwrap(), HashSet::from([class("Mammal")]));
    assert_eq!(
        view.descendants(&class("Dog")).unwrap(),
        HashSet::from([class("Mammal"), class("Animal")])
    );
}

#[test]
fn test_label_renderer_session_finds_by_label() {
    let mut session = EditorSession::with_renderer(SessionConfig::default(), Box::new(LabelRenderer::new()));
    let id = OntologyId::new("http://example.org/zoo");
    session.create_ontology(id.clone()).unwrap();
    session
        .apply_changes(vec![
            OntologyChange::add(&id, Axiom::declaration(class("C1"))),
            OntologyChange::add(&id, Axiom::label(ex("C1"), Literal::plain("Golden Retriever"))),
        ])
        .unwrap();

    let finder = session.finder();
    assert_eq!(finder.by_wildcard(EntityKind::Class, "golden*").len(), 1);
    assert_eq!(
        finder.by_rendering(EntityKind::Class, "Golden Retriever"),
        Some(class("C1").to_entity())
    );
}

#[test]
fn test_disposed_session_rejects_everything() {
    let (mut session, id) = session();
    session.dispose();
    session.dispose();

    assert!(session.is_disposed());
    assert!(session.index().is_empty());
    assert!(matches!(
        session.apply_changes(vec![OntologyChange::add(&id, Axiom::declaration(class("Dog")))]),
        Err(SessionError::Disposed)
    ));
    assert_eq!(
        session.class_hierarchy().roots(),
        Err(HierarchyError::Disposed)
    );
}

fn numbered(i: usize) -> OwlClass {
    OwlClass::new(format!("http://example.org/zoo#C{}", i))
}

fn edit_to_change(id: &OntologyId, (add, label, a, b): (bool, bool, usize, usize)) -> OntologyChange {
    let axiom = if label {
        Axiom::label(numbered(a).0, Literal::plain(format!("Label{}", b)))
    } else {
        Axiom::sub_class_of(numbered(a), numbered(b))
    };
    if add {
        OntologyChange::add(id, axiom)
    } else {
        OntologyChange::remove(id, axiom)
    }
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 48,
        failure_persistence: None,
        ..ProptestConfig::default()
    })]

    #[test]
    fn incremental_session_matches_fresh_session(
        batches in prop::collection::vec(
            prop::collection::vec((any::<bool>(), any::<bool>(), 0..6usize, 0..6usize), 1..5),
            1..6,
        )
    ) {
        let renderer = || Box::new(LabelRenderer::new());
        let mut edited = EditorSession::with_renderer(SessionConfig::default(), renderer());
        let id = OntologyId::new("http://example.org/zoo");
        edited.create_ontology(id.clone()).unwrap();
        for batch in batches {
            let changes = batch.into_iter().map(|edit| edit_to_change(&id, edit)).collect();
            edited.apply_changes(changes).unwrap();
        }

        let axioms: Vec<Axiom> = edited.manager().ontology(&id).unwrap().axioms().cloned().collect();
        let mut fresh = EditorSession::with_renderer(SessionConfig::default(), renderer());
        fresh.create_ontology(id.clone()).unwrap();
        fresh
            .apply_changes(axioms.into_iter().map(|axiom| OntologyChange::add(&id, axiom)).collect())
            .unwrap();

        prop_assert_eq!(edited.index().snapshot(), fresh.index().snapshot());
        let mut universe: Vec<OwlClass> = (0..6).map(numbered).collect();
        universe.push(vocabulary::OWL_THING.clone());
        for class in &universe {
            prop_assert_eq!(
                edited.class_hierarchy().parents(class).unwrap(),
                fresh.class_hierarchy().parents(class).unwrap()
            );
            prop_assert_eq!(
                edited.class_hierarchy().children(class).unwrap(),
                fresh.class_hierarchy().children(class).unwrap()
            );
        }
    }
}
