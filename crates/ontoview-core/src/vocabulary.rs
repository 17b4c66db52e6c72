//! Built-in OWL / RDFS / XSD vocabulary

use crate::model::{
    AnnotationProperty, DataProperty, Datatype, Entity, Iri, ObjectProperty, OwlClass, TypedEntity,
};
use lazy_static::lazy_static;
use std::collections::HashSet;

pub const OWL_NS: &str = "http://www.w3.org/2002/07/owl#";
pub const RDFS_NS: &str = "http://www.w3.org/2000/01/rdf-schema#";
pub const XSD_NS: &str = "http://www.w3.org/2001/XMLSchema#";

pub const OWL_THING_IRI: &str = "http://www.w3.org/2002/07/owl#Thing";
pub const OWL_NOTHING_IRI: &str = "http://www.w3.org/2002/07/owl#Nothing";
pub const OWL_TOP_OBJECT_PROPERTY_IRI: &str = "http://www.w3.org/2002/07/owl#topObjectProperty";
pub const OWL_BOTTOM_OBJECT_PROPERTY_IRI: &str = "http://www.w3.org/2002/07/owl#bottomObjectProperty";
pub const OWL_TOP_DATA_PROPERTY_IRI: &str = "http://www.w3.org/2002/07/owl#topDataProperty";
pub const OWL_BOTTOM_DATA_PROPERTY_IRI: &str = "http://www.w3.org/2002/07/owl#bottomDataProperty";
pub const RDFS_LABEL_IRI: &str = "http://www.w3.org/2000/01/rdf-schema#label";
pub const RDFS_COMMENT_IRI: &str = "http://www.w3.org/2000/01/rdf-schema#comment";
pub const RDFS_SEE_ALSO_IRI: &str = "http://www.w3.org/2000/01/rdf-schema#seeAlso";
pub const RDFS_IS_DEFINED_BY_IRI: &str = "http://www.w3.org/2000/01/rdf-schema#isDefinedBy";
pub const OWL_VERSION_INFO_IRI: &str = "http://www.w3.org/2002/07/owl#versionInfo";
pub const OWL_DEPRECATED_IRI: &str = "http://www.w3.org/2002/07/owl#deprecated";
pub const RDFS_LITERAL_IRI: &str = "http://www.w3.org/2000/01/rdf-schema#Literal";

const XSD_DATATYPES: &[&str] = &[
    "string", "boolean", "decimal", "integer", "double", "float", "dateTime", "anyURI",
];

lazy_static! {
    pub static ref OWL_THING: OwlClass = OwlClass::new(OWL_THING_IRI);
    pub static ref OWL_NOTHING: OwlClass = OwlClass::new(OWL_NOTHING_IRI);
    pub static ref OWL_TOP_OBJECT_PROPERTY: ObjectProperty = ObjectProperty::new(OWL_TOP_OBJECT_PROPERTY_IRI);
    pub static ref OWL_BOTTOM_OBJECT_PROPERTY: ObjectProperty = ObjectProperty::new(OWL_BOTTOM_OBJECT_PROPERTY_IRI);
    pub static ref OWL_TOP_DATA_PROPERTY: DataProperty = DataProperty::new(OWL_TOP_DATA_PROPERTY_IRI);
    pub static ref OWL_BOTTOM_DATA_PROPERTY: DataProperty = DataProperty::new(OWL_BOTTOM_DATA_PROPERTY_IRI);
    pub static ref RDFS_LABEL: AnnotationProperty = AnnotationProperty::new(RDFS_LABEL_IRI);
    pub static ref RDFS_COMMENT: AnnotationProperty = AnnotationProperty::new(RDFS_COMMENT_IRI);
    pub static ref RDFS_LITERAL: Datatype = Datatype::new(RDFS_LITERAL_IRI);

    /// Top and bottom class and property entities
    pub static ref BUILTIN_ENTITIES: HashSet<Entity> = [
        OWL_THING.to_entity(),
        OWL_NOTHING.to_entity(),
        OWL_TOP_OBJECT_PROPERTY.to_entity(),
        OWL_BOTTOM_OBJECT_PROPERTY.to_entity(),
        OWL_TOP_DATA_PROPERTY.to_entity(),
        OWL_BOTTOM_DATA_PROPERTY.to_entity(),
    ]
    .into_iter()
    .collect();

    /// Annotation vocabulary every session indexes
    pub static ref BUILTIN_ANNOTATION_PROPERTIES: HashSet<Entity> = [
        RDFS_LABEL_IRI,
        RDFS_COMMENT_IRI,
        RDFS_SEE_ALSO_IRI,
        RDFS_IS_DEFINED_BY_IRI,
        OWL_VERSION_INFO_IRI,
        OWL_DEPRECATED_IRI,
    ]
    .into_iter()
    .map(Entity::annotation_property)
    .collect();

    pub static ref BUILTIN_DATATYPES: HashSet<Entity> = XSD_DATATYPES
        .iter()
        .map(|local| Entity::datatype(format!("{}{}", XSD_NS, local)))
        .chain(std::iter::once(RDFS_LITERAL.to_entity()))
        .collect();
}

/// `owl:`, `rdfs:` or `xsd:` entity
pub fn is_builtin_iri(iri: &Iri) -> bool {
    let s = iri.as_str();
    s.starts_with(OWL_NS) || s.starts_with(RDFS_NS) || s.starts_with(XSD_NS)
}
