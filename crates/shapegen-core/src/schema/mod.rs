//! The schema graph handed over by the loader: documents, endpoints and an
//! arena of shapes with stable identities.

pub mod annotations;
pub mod document;
pub mod node;

pub use annotations::{AnnotationName, Annotations};
pub use document::{
    Document, DocumentSet, Endpoint, HttpMethod, Operation, Parameter, Payload, Response,
};
pub use node::{
    ArrayShape, DocumentId, EnumShape, Facets, ObjectShape, PropertyShape, Reference,
    ScalarKind, ScalarShape, SchemaNode, Shape, ShapeId, UnionShape,
};
