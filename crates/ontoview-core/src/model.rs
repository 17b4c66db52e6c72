//! Entity, expression and axiom model

use crate::vocabulary;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

/// Closed set of entity kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EntityKind {
    Class,
    ObjectProperty,
    DataProperty,
    AnnotationProperty,
    NamedIndividual,
    Datatype,
}

impl EntityKind {
    pub const COUNT: usize = 6;

    pub const ALL: [EntityKind; EntityKind::COUNT] = [
        EntityKind::Class,
        EntityKind::ObjectProperty,
        EntityKind::DataProperty,
        EntityKind::AnnotationProperty,
        EntityKind::NamedIndividual,
        EntityKind::Datatype,
    ];

    /// Stable position of this kind inside [`EntityKind::ALL`]
    pub fn ordinal(self) -> usize {
        match self {
            EntityKind::Class => 0,
            EntityKind::ObjectProperty => 1,
            EntityKind::DataProperty => 2,
            EntityKind::AnnotationProperty => 3,
            EntityKind::NamedIndividual => 4,
            EntityKind::Datatype => 5,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            EntityKind::Class => "Class",
            EntityKind::ObjectProperty => "ObjectProperty",
            EntityKind::DataProperty => "DataProperty",
            EntityKind::AnnotationProperty => "AnnotationProperty",
            EntityKind::NamedIndividual => "NamedIndividual",
            EntityKind::Datatype => "Datatype",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Immutable, cheaply cloned identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Iri(Arc<str>);

impl Iri {
    pub fn new(s: impl Into<String>) -> Self {
        Self(Arc::from(s.into()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Fragment after `#`, else the last non-empty `/` segment, else the whole IRI
    pub fn short_form(&self) -> &str {
        let s = self.as_str();
        if let Some((_, fragment)) = s.rsplit_once('#') {
            if !fragment.is_empty() {
                return fragment;
            }
        }
        s.trim_end_matches('/')
            .rsplit('/')
            .next()
            .filter(|segment| !segment.is_empty())
            .unwrap_or(s)
    }
}

impl From<&str> for Iri {
    fn from(s: &str) -> Self {
        Iri::new(s)
    }
}

impl From<String> for Iri {
    fn from(s: String) -> Self {
        Iri::new(s)
    }
}

impl From<&Iri> for Iri {
    fn from(iri: &Iri) -> Self {
        iri.clone()
    }
}

impl AsRef<str> for Iri {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for Iri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A named entity: kind tag plus identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Entity {
    pub kind: EntityKind,
    pub iri: Iri,
}

impl Entity {
    pub fn new(kind: EntityKind, iri: impl Into<Iri>) -> Self {
        Self { kind, iri: iri.into() }
    }

    pub fn class(iri: impl Into<Iri>) -> Self {
        Self::new(EntityKind::Class, iri)
    }

    pub fn object_property(iri: impl Into<Iri>) -> Self {
        Self::new(EntityKind::ObjectProperty, iri)
    }

    pub fn data_property(iri: impl Into<Iri>) -> Self {
        Self::new(EntityKind::DataProperty, iri)
    }

    pub fn annotation_property(iri: impl Into<Iri>) -> Self {
        Self::new(EntityKind::AnnotationProperty, iri)
    }

    pub fn individual(iri: impl Into<Iri>) -> Self {
        Self::new(EntityKind::NamedIndividual, iri)
    }

    pub fn datatype(iri: impl Into<Iri>) -> Self {
        Self::new(EntityKind::Datatype, iri)
    }

    /// Typed view of this entity, if the kind matches
    pub fn as_typed<T: TypedEntity>(&self) -> Option<T> {
        T::from_entity(self)
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(<{}>)", self.kind, self.iri)
    }
}

/// Entity type with a fixed kind, used to parameterize hierarchies
pub trait TypedEntity: Clone + Eq + Hash + Ord + fmt::Debug + Send + Sync + 'static {
    const KIND: EntityKind;

    fn iri(&self) -> &Iri;

    fn from_iri(iri: Iri) -> Self;

    /// Canonical top entity of this kind, if the kind has one
    fn top() -> Option<Self> {
        None
    }

    /// Canonical bottom entity of this kind, if the kind has one
    fn bottom() -> Option<Self> {
        None
    }

    fn to_entity(&self) -> Entity {
        Entity::new(Self::KIND, self.iri().clone())
    }

    fn from_entity(entity: &Entity) -> Option<Self> {
        (entity.kind == Self::KIND).then(|| Self::from_iri(entity.iri.clone()))
    }

    fn is_top(&self) -> bool {
        Self::top().as_ref() == Some(self)
    }

    fn is_bottom(&self) -> bool {
        Self::bottom().as_ref() == Some(self)
    }
}

macro_rules! typed_entity {
    ($(#[$meta:meta])* $name:ident => $kind:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(pub Iri);

        impl $name {
            pub fn new(iri: impl Into<Iri>) -> Self {
                Self(iri.into())
            }
        }

        impl From<$name> for Entity {
            fn from(typed: $name) -> Entity {
                Entity::new(EntityKind::$kind, typed.0)
            }
        }

        impl From<&$name> for Entity {
            fn from(typed: &$name) -> Entity {
                Entity::new(EntityKind::$kind, typed.0.clone())
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

typed_entity!(
    /// OWL class
    OwlClass => Class
);
typed_entity!(
    /// OWL object property
    ObjectProperty => ObjectProperty
);
typed_entity!(
    /// OWL data property
    DataProperty => DataProperty
);
typed_entity!(
    /// OWL annotation property
    AnnotationProperty => AnnotationProperty
);
typed_entity!(
    /// OWL named individual
    NamedIndividual => NamedIndividual
);
typed_entity!(
    /// OWL datatype
    Datatype => Datatype
);

impl TypedEntity for OwlClass {
    const KIND: EntityKind = EntityKind::Class;

    fn iri(&self) -> &Iri {
        &self.0
    }

    fn from_iri(iri: Iri) -> Self {
        Self(iri)
    }

    fn top() -> Option<Self> {
        Some(vocabulary::OWL_THING.clone())
    }

    fn bottom() -> Option<Self> {
        Some(vocabulary::OWL_NOTHING.clone())
    }
}

impl TypedEntity for ObjectProperty {
    const KIND: EntityKind = EntityKind::ObjectProperty;

    fn iri(&self) -> &Iri {
        &self.0
    }

    fn from_iri(iri: Iri) -> Self {
        Self(iri)
    }

    fn top() -> Option<Self> {
        Some(vocabulary::OWL_TOP_OBJECT_PROPERTY.clone())
    }

    fn bottom() -> Option<Self> {
        Some(vocabulary::OWL_BOTTOM_OBJECT_PROPERTY.clone())
    }
}

impl TypedEntity for DataProperty {
    const KIND: EntityKind = EntityKind::DataProperty;

    fn iri(&self) -> &Iri {
        &self.0
    }

    fn from_iri(iri: Iri) -> Self {
        Self(iri)
    }

    fn top() -> Option<Self> {
        Some(vocabulary::OWL_TOP_DATA_PROPERTY.clone())
    }

    fn bottom() -> Option<Self> {
        Some(vocabulary::OWL_BOTTOM_DATA_PROPERTY.clone())
    }
}

impl TypedEntity for AnnotationProperty {
    const KIND: EntityKind = EntityKind::AnnotationProperty;

    fn iri(&self) -> &Iri {
        &self.0
    }

    fn from_iri(iri: Iri) -> Self {
        Self(iri)
    }
}

impl TypedEntity for NamedIndividual {
    const KIND: EntityKind = EntityKind::NamedIndividual;

    fn iri(&self) -> &Iri {
        &self.0
    }

    fn from_iri(iri: Iri) -> Self {
        Self(iri)
    }
}

impl TypedEntity for Datatype {
    const KIND: EntityKind = EntityKind::Datatype;

    fn iri(&self) -> &Iri {
        &self.0
    }

    fn from_iri(iri: Iri) -> Self {
        Self(iri)
    }

    fn top() -> Option<Self> {
        Some(vocabulary::RDFS_LITERAL.clone())
    }
}

/// Object property expression: a named property or its inverse
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObjectPropertyExpression {
    Property(ObjectProperty),
    InverseOf(ObjectProperty),
}

impl ObjectPropertyExpression {
    /// The property itself when the expression is not an inverse
    pub fn named(&self) -> Option<&ObjectProperty> {
        match self {
            ObjectPropertyExpression::Property(p) => Some(p),
            ObjectPropertyExpression::InverseOf(_) => None,
        }
    }

    pub fn property(&self) -> &ObjectProperty {
        match self {
            ObjectPropertyExpression::Property(p) | ObjectPropertyExpression::InverseOf(p) => p,
        }
    }
}

impl From<ObjectProperty> for ObjectPropertyExpression {
    fn from(p: ObjectProperty) -> Self {
        ObjectPropertyExpression::Property(p)
    }
}

/// Class expression (named class or anonymous construct)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClassExpression {
    /// Named class
    Class(OwlClass),

    /// C1 ⊓ ... ⊓ Cn
    IntersectionOf(Vec<ClassExpression>),

    /// C1 ⊔ ... ⊔ Cn
    UnionOf(Vec<ClassExpression>),

    /// ¬C
    ComplementOf(Box<ClassExpression>),

    /// ∃R.C
    SomeValuesFrom {
        property: ObjectPropertyExpression,
        filler: Box<ClassExpression>,
    },

    /// ∀R.C
    AllValuesFrom {
        property: ObjectPropertyExpression,
        filler: Box<ClassExpression>,
    },

    /// ∃R.{i}
    HasValue {
        property: ObjectPropertyExpression,
        individual: NamedIndividual,
    },

    /// {i1, ..., in}
    OneOf(Vec<NamedIndividual>),

    /// ∃D.T
    DataSomeValuesFrom {
        property: DataProperty,
        range: Datatype,
    },
}

impl ClassExpression {
    pub fn named(&self) -> Option<&OwlClass> {
        match self {
            ClassExpression::Class(c) => Some(c),
            _ => None,
        }
    }

    pub fn is_anonymous(&self) -> bool {
        self.named().is_none()
    }

    /// Named classes reachable through (nested) intersections.
    ///
    /// A named class is its own only conjunct; any other anonymous construct
    /// contributes nothing. This is a navigation heuristic, not a logical
    /// normalisation.
    pub fn named_conjuncts(&self) -> Vec<&OwlClass> {
        let mut out = Vec::new();
        self.collect_conjuncts(&mut out);
        out
    }

    fn collect_conjuncts<'a>(&'a self, out: &mut Vec<&'a OwlClass>) {
        match self {
            ClassExpression::Class(c) => out.push(c),
            ClassExpression::IntersectionOf(operands) => {
                for operand in operands {
                    operand.collect_conjuncts(out);
                }
            }
            _ => {}
        }
    }

    /// Named operands of a top-level union
    pub fn named_disjuncts(&self) -> Vec<&OwlClass> {
        match self {
            ClassExpression::Class(c) => vec![c],
            ClassExpression::UnionOf(operands) => {
                operands.iter().flat_map(|op| op.named_disjuncts()).collect()
            }
            _ => Vec::new(),
        }
    }

    fn collect_signature(&self, out: &mut HashSet<Entity>) {
        match self {
            ClassExpression::Class(c) => {
                out.insert(c.to_entity());
            }
            ClassExpression::IntersectionOf(operands) | ClassExpression::UnionOf(operands) => {
                for operand in operands {
                    operand.collect_signature(out);
                }
            }
            ClassExpression::ComplementOf(inner) => inner.collect_signature(out),
            ClassExpression::SomeValuesFrom { property, filler }
            | ClassExpression::AllValuesFrom { property, filler } => {
                out.insert(property.property().to_entity());
                filler.collect_signature(out);
            }
            ClassExpression::HasValue { property, individual } => {
                out.insert(property.property().to_entity());
                out.insert(individual.to_entity());
            }
            ClassExpression::OneOf(individuals) => {
                out.extend(individuals.iter().map(TypedEntity::to_entity));
            }
            ClassExpression::DataSomeValuesFrom { property, range } => {
                out.insert(property.to_entity());
                out.insert(range.to_entity());
            }
        }
    }
}

impl From<OwlClass> for ClassExpression {
    fn from(c: OwlClass) -> Self {
        ClassExpression::Class(c)
    }
}

impl From<&OwlClass> for ClassExpression {
    fn from(c: &OwlClass) -> Self {
        ClassExpression::Class(c.clone())
    }
}

/// Typed literal value
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Literal {
    pub lexical: String,
    pub datatype: Option<Datatype>,
    pub language: Option<String>,
}

impl Literal {
    pub fn plain(lexical: impl Into<String>) -> Self {
        Self {
            lexical: lexical.into(),
            datatype: None,
            language: None,
        }
    }

    pub fn lang(lexical: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            lexical: lexical.into(),
            datatype: None,
            language: Some(language.into()),
        }
    }

    pub fn typed(lexical: impl Into<String>, datatype: Datatype) -> Self {
        Self {
            lexical: lexical.into(),
            datatype: Some(datatype),
            language: None,
        }
    }
}

/// Value of an annotation
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnnotationValue {
    Literal(Literal),
    Iri(Iri),
}

/// Logical or non-logical statement held by an ontology
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Axiom {
    /// Declaration(E)
    Declaration(Entity),

    /// SubClassOf(C1 C2)
    SubClassOf {
        sub: ClassExpression,
        sup: ClassExpression,
    },

    /// EquivalentClasses(C1 ... Cn)
    EquivalentClasses(Vec<ClassExpression>),

    /// DisjointClasses(C1 ... Cn)
    DisjointClasses(Vec<ClassExpression>),

    /// SubObjectPropertyOf(P1 P2)
    SubObjectPropertyOf {
        sub: ObjectPropertyExpression,
        sup: ObjectPropertyExpression,
    },

    /// EquivalentObjectProperties(P1 ... Pn)
    EquivalentObjectProperties(Vec<ObjectPropertyExpression>),

    /// ObjectPropertyDomain(P C)
    ObjectPropertyDomain(ObjectPropertyExpression, ClassExpression),

    /// ObjectPropertyRange(P C)
    ObjectPropertyRange(ObjectPropertyExpression, ClassExpression),

    /// SubDataPropertyOf(D1 D2)
    SubDataPropertyOf { sub: DataProperty, sup: DataProperty },

    /// EquivalentDataProperties(D1 ... Dn)
    EquivalentDataProperties(Vec<DataProperty>),

    /// DataPropertyDomain(D C)
    DataPropertyDomain(DataProperty, ClassExpression),

    /// DataPropertyRange(D T)
    DataPropertyRange(DataProperty, Datatype),

    /// SubAnnotationPropertyOf(A1 A2)
    SubAnnotationPropertyOf {
        sub: AnnotationProperty,
        sup: AnnotationProperty,
    },

    /// ClassAssertion(C i)
    ClassAssertion(ClassExpression, NamedIndividual),

    /// ObjectPropertyAssertion(P i1 i2)
    ObjectPropertyAssertion(ObjectPropertyExpression, NamedIndividual, NamedIndividual),

    /// DataPropertyAssertion(D i v)
    DataPropertyAssertion(DataProperty, NamedIndividual, Literal),

    /// AnnotationAssertion(A s v); the subject is an identifier, not an entity
    AnnotationAssertion {
        property: AnnotationProperty,
        subject: Iri,
        value: AnnotationValue,
    },
}

impl Axiom {
    pub fn declaration(entity: impl Into<Entity>) -> Self {
        Axiom::Declaration(entity.into())
    }

    pub fn sub_class_of(sub: impl Into<ClassExpression>, sup: impl Into<ClassExpression>) -> Self {
        Axiom::SubClassOf {
            sub: sub.into(),
            sup: sup.into(),
        }
    }

    pub fn sub_object_property_of(sub: ObjectProperty, sup: ObjectProperty) -> Self {
        Axiom::SubObjectPropertyOf {
            sub: sub.into(),
            sup: sup.into(),
        }
    }

    /// rdfs:label annotation on `subject`
    pub fn label(subject: impl Into<Iri>, value: Literal) -> Self {
        Axiom::AnnotationAssertion {
            property: vocabulary::RDFS_LABEL.clone(),
            subject: subject.into(),
            value: AnnotationValue::Literal(value),
        }
    }

    /// Declarations and annotations carry no logical content
    pub fn is_logical(&self) -> bool {
        !matches!(self, Axiom::Declaration(_) | Axiom::AnnotationAssertion { .. })
    }

    /// Subject of an annotation assertion
    pub fn annotation_subject(&self) -> Option<&Iri> {
        match self {
            Axiom::AnnotationAssertion { subject, .. } => Some(subject),
            _ => None,
        }
    }

    /// Every named entity mentioned by the axiom
    pub fn signature(&self) -> HashSet<Entity> {
        let mut out = HashSet::new();
        match self {
            Axiom::Declaration(entity) => {
                out.insert(entity.clone());
            }
            Axiom::SubClassOf { sub, sup } => {
                sub.collect_signature(&mut out);
                sup.collect_signature(&mut out);
            }
            Axiom::EquivalentClasses(classes) | Axiom::DisjointClasses(classes) => {
                for class in classes {
                    class.collect_signature(&mut out);
                }
            }
            Axiom::SubObjectPropertyOf { sub, sup } => {
                out.insert(sub.property().to_entity());
                out.insert(sup.property().to_entity());
            }
            Axiom::EquivalentObjectProperties(properties) => {
                out.extend(properties.iter().map(|p| p.property().to_entity()));
            }
            Axiom::ObjectPropertyDomain(property, class) | Axiom::ObjectPropertyRange(property, class) => {
                out.insert(property.property().to_entity());
                class.collect_signature(&mut out);
            }
            Axiom::SubDataPropertyOf { sub, sup } => {
                out.insert(sub.to_entity());
                out.insert(sup.to_entity());
            }
            Axiom::EquivalentDataProperties(properties) => {
                out.extend(properties.iter().map(TypedEntity::to_entity));
            }
            Axiom::DataPropertyDomain(property, class) => {
                out.insert(property.to_entity());
                class.collect_signature(&mut out);
            }
            Axiom::DataPropertyRange(property, datatype) => {
                out.insert(property.to_entity());
                out.insert(datatype.to_entity());
            }
            Axiom::SubAnnotationPropertyOf { sub, sup } => {
                out.insert(sub.to_entity());
                out.insert(sup.to_entity());
            }
            Axiom::ClassAssertion(class, individual) => {
                class.collect_signature(&mut out);
                out.insert(individual.to_entity());
            }
            Axiom::ObjectPropertyAssertion(property, subject, object) => {
                out.insert(property.property().to_entity());
                out.insert(subject.to_entity());
                out.insert(object.to_entity());
            }
            Axiom::DataPropertyAssertion(property, individual, literal) => {
                out.insert(property.to_entity());
                out.insert(individual.to_entity());
                if let Some(datatype) = &literal.datatype {
                    out.insert(datatype.to_entity());
                }
            }
            Axiom::AnnotationAssertion { property, value, .. } => {
                out.insert(property.to_entity());
                if let AnnotationValue::Literal(Literal { datatype: Some(datatype), .. }) = value {
                    out.insert(datatype.to_entity());
                }
            }
        }
        out
    }
}
