use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;

use super::types::TypeName;
use crate::schema::HttpMethod;

/// Everything a renderer needs to emit one service method.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MethodDescriptor {
    pub name: String,
    pub http_method: HttpMethod,
    pub path: String,
    pub parameters: Vec<ParameterBinding>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<BodyBinding>,
    pub content_types: Vec<String>,
    pub accept_types: Vec<String>,
    /// Problem code → problem binding, in declaration order.
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub problems: IndexMap<String, ProblemBinding>,
    pub response: ResponseKind,
    /// Response type as the target declares it (possibly wrapped).
    pub return_type: TypeName,
    pub implementation: Implementation,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub modifiers: Vec<MethodModifier>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nullify: Option<NullifyVariant>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub documentation: Option<String>,
}

impl MethodDescriptor {
    pub fn parameter(&self, name: &str) -> Option<&ParameterBinding> {
        self.parameters.iter().find(|p| p.name == name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ParameterLocation {
    Uri,
    Query,
    Header,
    Cookie,
    QueryString,
    /// Supplied by the server framework, not read from the request.
    Context,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParameterBinding {
    /// Name on the wire.
    pub name: String,
    pub identifier: String,
    pub location: ParameterLocation,
    pub type_name: TypeName,
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BodyBinding {
    pub identifier: String,
    pub type_name: TypeName,
    pub media_types: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProblemBinding {
    pub type_uri: String,
    pub status: u16,
    pub type_name: TypeName,
}

/// Logical response of a method before target wrapping.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ResponseKind {
    NoContent,
    Body {
        type_name: TypeName,
    },
    /// Untyped server-sent events.
    EventSource,
    /// Typed events keyed by event name; `element` covers every event type.
    EventStream {
        events: IndexMap<String, TypeName>,
        element: TypeName,
    },
}

impl ResponseKind {
    pub fn type_name(&self) -> Option<&TypeName> {
        match self {
            Self::Body { type_name } => Some(type_name),
            Self::EventStream { element, .. } => Some(element),
            Self::NoContent | Self::EventSource => None,
        }
    }
}

/// Server stubs are abstract; clients call through a request executor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Implementation {
    Abstract,
    RequestExecution { collaborator: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum MethodModifier {
    Asynchronous,
    Reactive,
    RequestOnly,
    ResponseOnly,
}

/// Companion method returning `null` for the listed failures.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NullifyVariant {
    pub name: String,
    pub statuses: Vec<u16>,
    pub problems: Vec<String>,
    pub return_type: TypeName,
}
