use std::fmt;

use indexmap::IndexMap;
use serde::Serialize;

use super::annotations::Annotations;
use super::node::{DocumentId, SchemaNode, Shape, ShapeId};
use crate::error::{Location, ResolveError};

/// One loaded source document with its shape arena.
#[derive(Debug, Clone)]
pub struct Document {
    pub id: DocumentId,
    pub file: String,
    pub title: Option<String>,
    pub version: Option<String>,
    pub base_uri: Option<String>,
    pub base_uri_parameters: IndexMap<String, String>,
    pub media_types: Vec<String>,
    pub accepts: Vec<String>,
    /// Library alias → loaded library document.
    pub uses: IndexMap<String, DocumentId>,
    pub annotations: Annotations,
    /// Declared type name → shape.
    pub types: IndexMap<String, ShapeId>,
    pub endpoints: Vec<Endpoint>,
    pub shapes: Vec<Shape>,
    /// Loaded only because another document uses it.
    pub is_library: bool,
    pub location: Location,
}

impl Document {
    pub fn shape(&self, id: ShapeId) -> Option<&Shape> {
        if id.document != self.id {
            return None;
        }
        self.shapes.get(id.index as usize)
    }

    pub fn operations(&self) -> impl Iterator<Item = (&Endpoint, &Operation)> {
        self.endpoints
            .iter()
            .flat_map(|endpoint| endpoint.operations.iter().map(move |op| (endpoint, op)))
    }
}

#[derive(Debug, Clone)]
pub struct Endpoint {
    pub path: String,
    pub uri_parameters: Vec<Parameter>,
    pub operations: Vec<Operation>,
    pub annotations: Annotations,
    pub location: Location,
}

#[derive(Debug, Clone)]
pub struct Operation {
    pub method: HttpMethod,
    pub operation_id: Option<String>,
    pub display_name: Option<String>,
    pub description: Option<String>,
    pub query_parameters: Vec<Parameter>,
    pub headers: Vec<Parameter>,
    pub cookies: Vec<Parameter>,
    pub query_string: Option<ShapeId>,
    pub body: Vec<Payload>,
    pub responses: Vec<Response>,
    pub annotations: Annotations,
    pub location: Location,
}

#[derive(Debug, Clone)]
pub struct Parameter {
    pub name: String,
    pub shape: ShapeId,
    pub required: bool,
    pub location: Location,
}

#[derive(Debug, Clone)]
pub struct Payload {
    pub media_type: String,
    pub shape: ShapeId,
}

#[derive(Debug, Clone)]
pub struct Response {
    pub status: u16,
    pub headers: Vec<Parameter>,
    pub body: Vec<Payload>,
    pub location: Location,
}

impl Response {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Put,
    Post,
    Delete,
    Options,
    Head,
    Patch,
    Trace,
}

impl HttpMethod {
    pub fn parse(method: &str) -> Option<Self> {
        let method = match method.to_ascii_lowercase().as_str() {
            "get" => Self::Get,
            "put" => Self::Put,
            "post" => Self::Post,
            "delete" => Self::Delete,
            "options" => Self::Options,
            "head" => Self::Head,
            "patch" => Self::Patch,
            "trace" => Self::Trace,
            _ => return None,
        };
        Some(method)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Put => "PUT",
            Self::Post => "POST",
            Self::Delete => "DELETE",
            Self::Options => "OPTIONS",
            Self::Head => "HEAD",
            Self::Patch => "PATCH",
            Self::Trace => "TRACE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Every document of one generation invocation, primaries first in the
/// order supplied, then the libraries they pulled in.
#[derive(Debug, Clone, Default)]
pub struct DocumentSet {
    documents: Vec<Document>,
}

impl DocumentSet {
    pub fn new(documents: Vec<Document>) -> Self {
        Self { documents }
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    /// Documents whose endpoints are generated.
    pub fn primaries(&self) -> impl Iterator<Item = &Document> {
        self.documents.iter().filter(|doc| !doc.is_library)
    }

    pub fn document(&self, id: DocumentId) -> Option<&Document> {
        self.documents.get(id.0 as usize)
    }

    pub fn shape(&self, id: ShapeId) -> Option<&Shape> {
        self.document(id.document)?.shape(id)
    }

    /// Like [`shape`](Self::shape) for ids that came out of this set.
    pub fn expect_shape(&self, id: ShapeId) -> Result<&Shape, ResolveError> {
        self.shape(id).ok_or_else(|| ResolveError::UnresolvedRef {
            name: id.to_string(),
            location: Location::default(),
        })
    }

    /// Finds the declaration a name refers to from inside `from`.
    pub fn lookup_type(&self, from: DocumentId, name: &str) -> Option<ShapeId> {
        let document = self.document(from)?;
        if let Some(id) = document.types.get(name) {
            return Some(*id);
        }
        let (alias, local) = name.split_once('.')?;
        let library = self.document(*document.uses.get(alias)?)?;
        library.types.get(local).copied()
    }

    /// Follows reference chains to the first non-reference shape.
    ///
    /// A chain that loops back on itself is reported as unresolved.
    pub fn dereference(&self, id: ShapeId) -> Result<&Shape, ResolveError> {
        let mut current = self.expect_shape(id)?;
        let mut hops = 0usize;
        while let SchemaNode::Reference(reference) = &current.node {
            let target = self
                .lookup_type(current.id.document, &reference.name)
                .ok_or_else(|| ResolveError::UnresolvedRef {
                    name: reference.name.clone(),
                    location: current.location.clone(),
                })?;
            hops += 1;
            if hops > self.documents.len() + self.shape_count() {
                return Err(ResolveError::UnresolvedRef {
                    name: reference.name.clone(),
                    location: current.location.clone(),
                });
            }
            current = self.expect_shape(target)?;
        }
        Ok(current)
    }

    fn shape_count(&self) -> usize {
        self.documents.iter().map(|doc| doc.shapes.len()).sum()
    }
}
