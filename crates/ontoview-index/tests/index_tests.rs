use ontoview_core::{
    Axiom, Entity, EntityKind, Literal, NamedIndividual, OntologyChange, OntologyId, OntologyManager, OwlClass,
};
use ontoview_index::{EntityIndex, EntityRenderer, IndexConfig, LabelRenderer, ShortFormRenderer};
use proptest::prelude::*;

const CLASS_COUNT: usize = 8;

fn ex(name: &str) -> String {
    format!("http://example.org/zoo#{}", name)
}

fn class(name: &str) -> OwlClass {
    OwlClass::new(ex(name))
}

fn manager() -> (OntologyManager, OntologyId) {
    let mut manager = OntologyManager::new();
    let id = OntologyId::new("http://example.org/zoo");
    manager.create_ontology(id.clone()).unwrap();
    (manager, id)
}

fn bare_config() -> IndexConfig {
    IndexConfig {
        annotation_properties: Vec::new(),
        builtin_datatypes: false,
    }
}

fn apply(
    manager: &mut OntologyManager,
    index: &mut EntityIndex,
    renderer: &dyn EntityRenderer,
    changes: Vec<OntologyChange>,
) {
    let applied = manager.apply_changes(changes).unwrap();
    index.handle_changes(&manager.active_set(), &applied, renderer);
}

fn assert_bijective(index: &EntityIndex) {
    for kind in EntityKind::ALL {
        for (rendering, entity) in index.entries(kind) {
            assert_eq!(entity.kind, kind);
            assert_eq!(index.rendering_of(entity), Some(rendering));
        }
    }
    let per_kind: usize = EntityKind::ALL.iter().map(|k| index.entities(*k).count()).sum();
    assert_eq!(per_kind, index.len());
}

#[test]
fn test_subclass_add_then_remove() {
    let (mut manager, id) = manager();
    let mut index = EntityIndex::new(bare_config());
    index.rebuild(&manager.active_set(), &ShortFormRenderer);
    let builtin_count = index.len();

    let axiom = Axiom::sub_class_of(class("Dog"), class("Animal"));
    apply(
        &mut manager,
        &mut index,
        &ShortFormRenderer,
        vec![OntologyChange::add(&id, axiom.clone())],
    );

    let dog = Entity::from(class("Dog"));
    assert_eq!(index.by_rendering(EntityKind::Class, "Dog"), Some(&dog));
    assert_eq!(index.rendering_of(&dog), Some("Dog"));
    assert!(index.by_rendering(EntityKind::Class, "Animal").is_some());
    assert_eq!(index.len(), builtin_count + 2);

    apply(
        &mut manager,
        &mut index,
        &ShortFormRenderer,
        vec![OntologyChange::remove(&id, axiom)],
    );

    assert!(index.by_rendering(EntityKind::Class, "Dog").is_none());
    assert!(index.rendering_of(&dog).is_none());
    assert_eq!(index.len(), builtin_count);
    assert_bijective(&index);
}

#[test]
fn test_builtins_survive_removal() {
    let (mut manager, id) = manager();
    let mut index = EntityIndex::new(bare_config());
    index.rebuild(&manager.active_set(), &ShortFormRenderer);

    let thing = OwlClass::new(ontoview_core::vocabulary::OWL_THING_IRI);
    let axiom = Axiom::sub_class_of(class("Dog"), thing.clone());
    apply(&mut manager, &mut index, &ShortFormRenderer, vec![OntologyChange::add(&id, axiom.clone())]);
    apply(&mut manager, &mut index, &ShortFormRenderer, vec![OntologyChange::remove(&id, axiom)]);

    assert!(index.contains(&Entity::from(thing)));
}

#[test]
fn test_label_change_rerenders_subject() {
    let (mut manager, id) = manager();
    let renderer = LabelRenderer::new();
    let mut index = EntityIndex::new(bare_config());

    apply(
        &mut manager,
        &mut index,
        &renderer,
        vec![OntologyChange::add(&id, Axiom::declaration(class("Dog")))],
    );
    assert_eq!(index.rendering_of(&Entity::from(class("Dog"))), Some("Dog"));

    let label = Axiom::label(ex("Dog"), Literal::plain("Hound"));
    apply(&mut manager, &mut index, &renderer, vec![OntologyChange::add(&id, label.clone())]);
    assert_eq!(index.rendering_of(&Entity::from(class("Dog"))), Some("Hound"));
    assert!(index.by_rendering(EntityKind::Class, "Dog").is_none());

    apply(&mut manager, &mut index, &renderer, vec![OntologyChange::remove(&id, label)]);
    assert_eq!(index.rendering_of(&Entity::from(class("Dog"))), Some("Dog"));
}

#[test]
fn test_label_change_rerenders_every_punned_kind() {
    let (mut manager, id) = manager();
    let renderer = LabelRenderer::new();
    let mut index = EntityIndex::new(bare_config());

    apply(
        &mut manager,
        &mut index,
        &renderer,
        vec![
            OntologyChange::add(&id, Axiom::declaration(class("Rex"))),
            OntologyChange::add(&id, Axiom::declaration(NamedIndividual::new(ex("Rex")))),
            OntologyChange::add(&id, Axiom::label(ex("Rex"), Literal::plain("T-Rex"))),
        ],
    );

    assert_eq!(index.rendering_of(&Entity::class(ex("Rex"))), Some("T-Rex"));
    assert_eq!(index.rendering_of(&Entity::individual(ex("Rex"))), Some("T-Rex"));
}

#[test]
fn test_changes_outside_active_set_are_ignored() {
    let (mut manager, _) = manager();
    let other = OntologyId::new("http://example.org/other");
    manager.create_ontology(other.clone()).unwrap();
    let mut index = EntityIndex::new(bare_config());
    index.rebuild(&manager.active_set(), &ShortFormRenderer);

    apply(
        &mut manager,
        &mut index,
        &ShortFormRenderer,
        vec![OntologyChange::add(&other, Axiom::declaration(class("Cat")))],
    );

    assert!(index.by_rendering(EntityKind::Class, "Cat").is_none());
}

#[test]
fn test_colliding_short_forms_are_escaped() {
    let (mut manager, id) = manager();
    let mut index = EntityIndex::new(bare_config());
    let first = OwlClass::new("http://a.example.org/Dog");
    let second = OwlClass::new("http://b.example.org/Dog");

    apply(
        &mut manager,
        &mut index,
        &ShortFormRenderer,
        vec![
            OntologyChange::add(&id, Axiom::declaration(first.clone())),
            OntologyChange::add(&id, Axiom::declaration(second.clone())),
        ],
    );

    let renderings = index.all_renderings(EntityKind::Class);
    assert!(renderings.contains("Dog"));
    assert!(renderings.contains("'Dog'"));
    assert_bijective(&index);

    let plain_holder = index.by_rendering(EntityKind::Class, "Dog").cloned().unwrap();
    apply(
        &mut manager,
        &mut index,
        &ShortFormRenderer,
        vec![OntologyChange::remove(&id, Axiom::declaration(plain_holder.clone()))],
    );

    let survivor = if plain_holder == Entity::from(&first) { second } else { first };
    assert_eq!(index.by_rendering(EntityKind::Class, "Dog"), Some(&Entity::from(survivor)));
    assert_bijective(&index);
}

#[test]
fn test_arrival_order_does_not_change_collision_seating() {
    let (mut manager, id) = manager();
    let mut index = EntityIndex::new(bare_config());
    index.rebuild(&manager.active_set(), &ShortFormRenderer);
    let earlier = OwlClass::new("http://b.example.org/Dog");
    let later = OwlClass::new("http://a.example.org/Dog");

    apply(&mut manager, &mut index, &ShortFormRenderer, vec![OntologyChange::add(&id, Axiom::declaration(earlier))]);
    apply(&mut manager, &mut index, &ShortFormRenderer, vec![OntologyChange::add(&id, Axiom::declaration(later.clone()))]);

    let mut rebuilt = EntityIndex::new(bare_config());
    rebuilt.rebuild(&manager.active_set(), &ShortFormRenderer);
    assert_eq!(index.by_rendering(EntityKind::Class, "Dog"), Some(&Entity::from(later)));
    assert_eq!(index.snapshot(), rebuilt.snapshot());
}

#[test]
fn test_third_collider_is_indexed_once_the_plain_holder_leaves() {
    let (mut manager, id) = manager();
    let mut index = EntityIndex::new(bare_config());
    let hosts: Vec<OwlClass> = ["a", "b", "c"]
        .iter()
        .map(|host| OwlClass::new(format!("http://{}.example.org/Dog", host)))
        .collect();

    apply(
        &mut manager,
        &mut index,
        &ShortFormRenderer,
        hosts.iter().map(|c| OntologyChange::add(&id, Axiom::declaration(c.clone()))).collect(),
    );
    assert!(!index.contains(&Entity::from(&hosts[2])));
    assert_eq!(index.len(), 2);

    apply(
        &mut manager,
        &mut index,
        &ShortFormRenderer,
        vec![OntologyChange::remove(&id, Axiom::declaration(hosts[0].clone()))],
    );

    assert_eq!(index.rendering_of(&Entity::from(&hosts[1])), Some("Dog"));
    assert_eq!(index.rendering_of(&Entity::from(&hosts[2])), Some("'Dog'"));
    assert_bijective(&index);
}

#[test]
fn test_snapshot_serializes() {
    let (mut manager, id) = manager();
    let mut index = EntityIndex::new(bare_config());
    apply(
        &mut manager,
        &mut index,
        &ShortFormRenderer,
        vec![OntologyChange::add(&id, Axiom::sub_class_of(class("Dog"), class("Animal")))],
    );

    let json = serde_json::to_string(&index.snapshot()).unwrap();
    assert!(json.contains("\"Dog\""));
    let back: ontoview_index::IndexSnapshot = serde_json::from_str(&json).unwrap();
    assert_eq!(back, index.snapshot());
}

#[derive(Debug, Clone)]
enum Edit {
    SubClass(usize, usize, bool),
    Label(usize, usize, bool),
}

fn edit_strategy() -> impl Strategy<Value = Edit> {
    prop_oneof![
        (0..CLASS_COUNT, 0..CLASS_COUNT, any::<bool>()).prop_map(|(a, b, add)| Edit::SubClass(a, b, add)),
        (0..CLASS_COUNT, 0..3usize, any::<bool>()).prop_map(|(a, v, add)| Edit::Label(a, v, add)),
    ]
}

fn edit_to_change(id: &OntologyId, edit: &Edit) -> OntologyChange {
    let (axiom, add) = match edit {
        Edit::SubClass(a, b, add) => (
            Axiom::sub_class_of(class(&format!("C{}", a)), class(&format!("C{}", b))),
            *add,
        ),
        Edit::Label(a, v, add) => (
            Axiom::label(ex(&format!("C{}", a)), Literal::plain(format!("Label{}", v))),
            *add,
        ),
    };
    if add {
        OntologyChange::add(id, axiom)
    } else {
        OntologyChange::remove(id, axiom)
    }
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 128,
        failure_persistence: None,
        ..ProptestConfig::default()
    })]

    #[test]
    fn incremental_updates_match_full_rebuild(
        batches in prop::collection::vec(prop::collection::vec(edit_strategy(), 1..6), 1..8)
    ) {
        let (mut manager, id) = manager();
        let renderer = LabelRenderer::new();
        let mut incremental = EntityIndex::default();
        incremental.rebuild(&manager.active_set(), &renderer);

        for batch in &batches {
            let changes = batch.iter().map(|edit| edit_to_change(&id, edit)).collect();
            let applied = manager.apply_changes(changes).unwrap();
            incremental.handle_changes(&manager.active_set(), &applied, &renderer);
        }

        let mut rebuilt = EntityIndex::default();
        rebuilt.rebuild(&manager.active_set(), &renderer);
        prop_assert_eq!(incremental.snapshot(), rebuilt.snapshot());
    }

    #[test]
    fn renderings_stay_bijective_under_collisions(
        hosts in prop::collection::vec(0..4usize, 1..12),
        removals in prop::collection::vec(0..12usize, 0..6)
    ) {
        let (mut manager, id) = manager();
        let mut index = EntityIndex::new(bare_config());
        index.rebuild(&manager.active_set(), &ShortFormRenderer);
        let declarations: Vec<Axiom> = hosts
            .iter()
            .enumerate()
            .map(|(i, host)| Axiom::declaration(OwlClass::new(format!("http://h{}.example.org/{}/Dog", host, i))))
            .collect();

        let adds = declarations.iter().cloned().map(|a| OntologyChange::add(&id, a)).collect();
        let applied = manager.apply_changes(adds).unwrap();
        index.handle_changes(&manager.active_set(), &applied, &ShortFormRenderer);

        let removes = removals
            .iter()
            .filter_map(|i| declarations.get(*i).cloned())
            .map(|a| OntologyChange::remove(&id, a))
            .collect();
        let applied = manager.apply_changes(removes).unwrap();
        index.handle_changes(&manager.active_set(), &applied, &ShortFormRenderer);

        for kind in EntityKind::ALL {
            for (rendering, entity) in index.entries(kind) {
                prop_assert_eq!(index.rendering_of(entity), Some(rendering));
            }
        }
        let dogs = index.entities(EntityKind::Class).filter(|e| e.iri.short_form() == "Dog").count();
        prop_assert!(dogs <= 2);

        let mut rebuilt = EntityIndex::new(bare_config());
        rebuilt.rebuild(&manager.active_set(), &ShortFormRenderer);
        prop_assert_eq!(index.snapshot(), rebuilt.snapshot());
    }
}
