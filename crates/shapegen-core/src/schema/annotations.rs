use indexmap::IndexMap;
use serde_json::Value;

use crate::target::GenerationMode;

/// Annotation names understood by the resolver and the drivers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnnotationName {
    Group,
    ServiceName,
    ModelPackage,
    ServicePackage,
    JvmType,
    SwiftType,
    TypeScriptType,
    JvmImplementation,
    SwiftImplementation,
    TypeScriptImplementation,
    Nested,
    Patchable,
    ExternalDiscriminator,
    ExternallyDiscriminated,
    ProblemBaseUri,
    ProblemBaseUriParams,
    ProblemUriParams,
    ProblemTypes,
    Problems,
    Nullify,
    EventSource,
    EventStream,
    RequestOnly,
    ResponseOnly,
    Reactive,
    Asynchronous,
    Sse,
    JsonBody,
}

impl AnnotationName {
    pub const fn id(self) -> &'static str {
        match self {
            Self::Group => "group",
            Self::ServiceName => "serviceName",
            Self::ModelPackage => "modelPackage",
            Self::ServicePackage => "servicePackage",
            Self::JvmType => "jvmType",
            Self::SwiftType => "swiftType",
            Self::TypeScriptType => "typeScriptType",
            Self::JvmImplementation => "jvmImplementation",
            Self::SwiftImplementation => "swiftImplementation",
            Self::TypeScriptImplementation => "typeScriptImplementation",
            Self::Nested => "nested",
            Self::Patchable => "patchable",
            Self::ExternalDiscriminator => "externalDiscriminator",
            Self::ExternallyDiscriminated => "externallyDiscriminated",
            Self::ProblemBaseUri => "problemBaseUri",
            Self::ProblemBaseUriParams => "problemBaseUriParams",
            Self::ProblemUriParams => "problemUriParams",
            Self::ProblemTypes => "problemTypes",
            Self::Problems => "problems",
            Self::Nullify => "nullify",
            Self::EventSource => "eventSource",
            Self::EventStream => "eventStream",
            Self::RequestOnly => "requestOnly",
            Self::ResponseOnly => "responseOnly",
            Self::Reactive => "reactive",
            Self::Asynchronous => "asynchronous",
            Self::Sse => "sse",
            Self::JsonBody => "jsonBody",
        }
    }
}

/// Raw annotation values attached to a document, endpoint, operation or shape.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Annotations(IndexMap<String, Value>);

impl Annotations {
    pub fn new(values: IndexMap<String, Value>) -> Self {
        Self(values)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Looks up `name`. With a mode, `name:client`/`name:server` wins over the
    /// bare spelling; an `x-` prefix is accepted on either.
    pub fn get(&self, name: AnnotationName, mode: Option<GenerationMode>) -> Option<&Value> {
        let id = name.id();
        if let Some(mode) = mode {
            let qualified = format!("{id}:{}", mode.id());
            if let Some(value) = self.lookup(&qualified) {
                return Some(value);
            }
        }
        self.lookup(id)
    }

    fn lookup(&self, key: &str) -> Option<&Value> {
        self.0
            .get(key)
            .or_else(|| self.0.get(&format!("x-{key}")))
    }

    pub fn string(&self, name: AnnotationName, mode: Option<GenerationMode>) -> Option<&str> {
        self.get(name, mode).and_then(Value::as_str)
    }

    pub fn flag(&self, name: AnnotationName, mode: Option<GenerationMode>) -> bool {
        self.get(name, mode).and_then(Value::as_bool).unwrap_or(false)
    }

    /// A single string or a list, flattened to strings; numbers are kept
    /// in their decimal spelling.
    pub fn strings(&self, name: AnnotationName, mode: Option<GenerationMode>) -> Vec<String> {
        fn scalar(value: &Value) -> Option<String> {
            match value {
                Value::String(s) => Some(s.clone()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            }
        }

        match self.get(name, mode) {
            Some(Value::Array(values)) => values.iter().filter_map(scalar).collect(),
            Some(value) => scalar(value).into_iter().collect(),
            None => Vec::new(),
        }
    }
}
