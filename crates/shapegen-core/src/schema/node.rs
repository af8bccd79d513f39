use std::fmt;

use serde::Serialize;

use super::annotations::Annotations;
use crate::error::Location;

/// Index of a document inside a [`DocumentSet`](super::DocumentSet).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct DocumentId(pub u32);

/// Stable identity of a shape: its owning document and arena slot.
///
/// Lowering assigns ids in source order, so the same document always yields
/// the same ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ShapeId {
    pub document: DocumentId,
    pub index: u32,
}

impl fmt::Display for ShapeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}:{}", self.document.0, self.index)
    }
}

/// A node of the schema graph.
#[derive(Debug, Clone)]
pub struct Shape {
    pub id: ShapeId,
    /// Declared name, `None` for inline shapes.
    pub name: Option<String>,
    pub node: SchemaNode,
    pub description: Option<String>,
    pub default: Option<serde_json::Value>,
    pub annotations: Annotations,
    pub location: Location,
}

impl Shape {
    pub fn is_declared(&self) -> bool {
        self.name.is_some()
    }

    pub fn as_object(&self) -> Option<&ObjectShape> {
        match &self.node {
            SchemaNode::Object(object) => Some(object),
            _ => None,
        }
    }
}

/// Closed set of shape kinds produced by the loader.
#[derive(Debug, Clone)]
pub enum SchemaNode {
    Object(ObjectShape),
    Array(ArrayShape),
    Union(UnionShape),
    Scalar(ScalarShape),
    Enum(EnumShape),
    Nil,
    Any,
    Reference(Reference),
}

impl SchemaNode {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Object(_) => "object",
            Self::Array(_) => "array",
            Self::Union(_) => "union",
            Self::Scalar(_) => "scalar",
            Self::Enum(_) => "enum",
            Self::Nil => "nil",
            Self::Any => "any",
            Self::Reference(_) => "reference",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ObjectShape {
    /// Parent shape; usually a [`SchemaNode::Reference`] to a declared type.
    pub parent: Option<ShapeId>,
    pub properties: Vec<PropertyShape>,
    /// Value shape for string-keyed extra members.
    pub additional_properties: Option<ShapeId>,
    pub discriminator: Option<String>,
    pub discriminator_value: Option<String>,
    pub externally_discriminated: bool,
}

#[derive(Debug, Clone)]
pub struct PropertyShape {
    pub name: String,
    pub shape: ShapeId,
    pub required: bool,
    pub location: Location,
}

#[derive(Debug, Clone, Default)]
pub struct ArrayShape {
    pub items: Option<ShapeId>,
    pub unique: bool,
    pub min_items: Option<u64>,
    pub max_items: Option<u64>,
}

#[derive(Debug, Clone, Default)]
pub struct UnionShape {
    pub members: Vec<ShapeId>,
    pub discriminator: Option<String>,
    pub externally_discriminated: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScalarKind {
    String,
    Boolean,
    Integer,
    Number,
    Date,
    Time,
    DateTimeOnly,
    DateTime,
    Duration,
    Uuid,
    Uri,
    Binary,
}

impl ScalarKind {
    /// Maps a source keyword such as `datetime-only` or `file`.
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        let kind = match keyword {
            "string" => Self::String,
            "boolean" => Self::Boolean,
            "integer" => Self::Integer,
            "number" => Self::Number,
            "date" | "date-only" => Self::Date,
            "time" | "time-only" => Self::Time,
            "datetime-only" => Self::DateTimeOnly,
            "datetime" | "date-time" => Self::DateTime,
            "duration" => Self::Duration,
            "uuid" => Self::Uuid,
            "uri" => Self::Uri,
            "binary" | "file" => Self::Binary,
            _ => return None,
        };
        Some(kind)
    }
}

/// Constraint facets carried over from the source for validation metadata.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Facets {
    pub min_length: Option<u64>,
    pub max_length: Option<u64>,
    pub pattern: Option<String>,
    pub minimum: Option<f64>,
    pub maximum: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct ScalarShape {
    pub kind: ScalarKind,
    pub format: Option<String>,
    pub facets: Facets,
}

#[derive(Debug, Clone)]
pub struct EnumShape {
    pub scalar: ScalarKind,
    /// Width of the raw values, e.g. `int64`.
    pub format: Option<String>,
    pub values: Vec<serde_json::Value>,
}

/// A by-name pointer to a declared type, `alias.Name` for library types.
#[derive(Debug, Clone)]
pub struct Reference {
    pub name: String,
}

impl Reference {
    /// Splits `alias.Name` into the library alias and the type name.
    pub fn split(&self) -> (Option<&str>, &str) {
        match self.name.split_once('.') {
            Some((alias, name)) => (Some(alias), name),
            None => (None, self.name.as_str()),
        }
    }
}
