//! Swift client services built on async functions.

use shapegen_core::driver::{ServiceDriver, library_type, logical_return_type, wrapped};
use shapegen_core::ir::{MethodModifier, ResponseKind, TypeName};
use shapegen_core::schema::Operation;
use shapegen_core::target::{GenerationMode, TargetProfile};

use crate::profile::SwiftTarget;

const ASYNC_STREAM: &str = "Swift.AsyncStream";

#[derive(Debug, Clone, Copy, Default)]
pub struct SwiftClientDriver;

impl ServiceDriver<SwiftTarget> for SwiftClientDriver {
    fn name(&self) -> &'static str {
        "swift"
    }

    fn request_executor(&self) -> &'static str {
        "Sunday.RequestFactory"
    }

    fn modifiers(
        &self,
        _mode: GenerationMode,
        _operation: &Operation,
        _response: &ResponseKind,
    ) -> Vec<MethodModifier> {
        vec![MethodModifier::Asynchronous]
    }

    fn return_type(
        &self,
        profile: &SwiftTarget,
        _mode: GenerationMode,
        response: &ResponseKind,
        modifiers: &[MethodModifier],
    ) -> TypeName {
        if modifiers.contains(&MethodModifier::RequestOnly) {
            return library_type("Foundation.URLRequest");
        }
        if modifiers.contains(&MethodModifier::ResponseOnly) {
            return library_type("Foundation.HTTPURLResponse");
        }
        match response {
            ResponseKind::EventSource => library_type("Sunday.EventSource"),
            ResponseKind::EventStream { element, .. } => wrapped(ASYNC_STREAM, element.clone()),
            ResponseKind::NoContent | ResponseKind::Body { .. } => {
                logical_return_type(response, profile.any())
            }
        }
    }
}
