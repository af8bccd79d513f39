//! Turns the operations of a document into service types.
//!
//! The walk itself is shared; a [`ServiceDriver`] supplies what differs per
//! target variant, mostly how a logical response becomes a declared return
//! type.

mod service;

pub use service::ServiceAssembler;

use crate::ir::{DeclaredName, MethodDescriptor, MethodModifier, ResponseKind, TypeKind, TypeName};
use crate::schema::Operation;
use crate::target::{GenerationMode, TargetProfile};

/// Role suffixes appended to an operation's type name to scope the shapes
/// resolved for it. Parameter roles also carry the parameter name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    UriParam,
    QueryParam,
    HeaderParam,
    CookieParam,
    QueryString,
    RequestBody,
    ResponseBody,
}

impl Role {
    pub fn suffix(self) -> &'static str {
        match self {
            Self::UriParam => "UriParam",
            Self::QueryParam => "QueryParam",
            Self::HeaderParam => "HeaderParam",
            Self::CookieParam => "CookieParam",
            Self::QueryString => "QueryString",
            Self::RequestBody => "RequestBody",
            Self::ResponseBody => "ResponseBody",
        }
    }
}

/// Settings shared by every service assembled for one invocation.
#[derive(Debug, Clone)]
pub struct DriverContext {
    /// Package services go to unless a document names its own.
    pub service_package: String,
    /// Appended to group names, e.g. `API`.
    pub service_suffix: String,
    /// Caller priority for media type negotiation.
    pub media_types: Vec<String>,
}

/// Variant-specific parts of method assembly.
pub trait ServiceDriver<T: TargetProfile> {
    /// Identifier used in logs.
    fn name(&self) -> &'static str;

    /// Collaborator client methods call through.
    fn request_executor(&self) -> &'static str;

    fn service_kind(&self, mode: GenerationMode) -> TypeKind {
        match mode {
            GenerationMode::Client => TypeKind::Class,
            GenerationMode::Server => TypeKind::Interface,
        }
    }

    /// Modifiers the variant adds to a method.
    fn modifiers(
        &self,
        _mode: GenerationMode,
        _operation: &Operation,
        _response: &ResponseKind,
    ) -> Vec<MethodModifier> {
        Vec::new()
    }

    /// Declared return type for `response`. `modifiers` already includes
    /// request-only and response-only markers.
    fn return_type(
        &self,
        profile: &T,
        mode: GenerationMode,
        response: &ResponseKind,
        modifiers: &[MethodModifier],
    ) -> TypeName;

    /// Last adjustments to an assembled method, such as parameters the
    /// framework injects.
    fn finish_method(
        &self,
        _mode: GenerationMode,
        _operation: &Operation,
        _method: &mut MethodDescriptor,
    ) {
    }
}

/// Return type of a response before any target wrapping.
pub fn logical_return_type(response: &ResponseKind, any: TypeName) -> TypeName {
    match response {
        ResponseKind::NoContent => TypeName::Unit,
        ResponseKind::Body { type_name } => type_name.clone(),
        ResponseKind::EventSource => any,
        ResponseKind::EventStream { element, .. } => element.clone(),
    }
}

/// `base<argument>` for a library type given by its qualified name.
pub fn wrapped(base: &str, argument: TypeName) -> TypeName {
    TypeName::generic(DeclaredName::from_qualified(base), vec![argument])
}

/// A library type given by its qualified name.
pub fn library_type(qualified: &str) -> TypeName {
    TypeName::Declared(DeclaredName::from_qualified(qualified))
}

#[cfg(test)]
mod tests;
