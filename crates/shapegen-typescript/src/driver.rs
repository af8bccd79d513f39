use shapegen_core::driver::{ServiceDriver, library_type, logical_return_type, wrapped};
use shapegen_core::ir::{MethodModifier, ResponseKind, TypeName};
use shapegen_core::schema::Operation;
use shapegen_core::target::{GenerationMode, TargetProfile};

use crate::profile::TypeScriptTarget;

const OBSERVABLE: &str = "rxjs.Observable";
const PROMISE: &str = "Promise";

/// Client whose methods return observables, or promises when
/// `abortable_promises` is set. Streams are always observables.
#[derive(Debug, Clone, Copy, Default)]
pub struct TypeScriptClientDriver {
    pub abortable_promises: bool,
}

impl ServiceDriver<TypeScriptTarget> for TypeScriptClientDriver {
    fn name(&self) -> &'static str {
        "typescript"
    }

    fn request_executor(&self) -> &'static str {
        "@outfoxx/sunday.RequestFactory"
    }

    fn modifiers(
        &self,
        _mode: GenerationMode,
        _operation: &Operation,
        _response: &ResponseKind,
    ) -> Vec<MethodModifier> {
        vec![MethodModifier::Reactive]
    }

    fn return_type(
        &self,
        profile: &TypeScriptTarget,
        _mode: GenerationMode,
        response: &ResponseKind,
        modifiers: &[MethodModifier],
    ) -> TypeName {
        let streaming = matches!(
            response,
            ResponseKind::EventSource | ResponseKind::EventStream { .. }
        );
        if matches!(response, ResponseKind::EventSource) {
            return library_type("EventSource");
        }
        let result = if modifiers.contains(&MethodModifier::RequestOnly) {
            library_type("Request")
        } else if modifiers.contains(&MethodModifier::ResponseOnly) {
            library_type("Response")
        } else {
            match logical_return_type(response, profile.any()) {
                TypeName::Unit => TypeName::primitive("void"),
                other => other,
            }
        };
        let wrapper = if self.abortable_promises && !streaming {
            PROMISE
        } else {
            OBSERVABLE
        };
        wrapped(wrapper, result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body() -> ResponseKind {
        ResponseKind::Body {
            type_name: TypeName::primitive("string"),
        }
    }

    #[test]
    fn results_are_observable_by_default() {
        let driver = TypeScriptClientDriver::default();
        let target = TypeScriptTarget;
        let result = driver.return_type(&target, GenerationMode::Client, &body(), &[]);
        assert_eq!(result.to_string(), "rxjs.Observable<string>");

        let raw = driver.return_type(
            &target,
            GenerationMode::Client,
            &body(),
            &[MethodModifier::Reactive, MethodModifier::ResponseOnly],
        );
        assert_eq!(raw.to_string(), "rxjs.Observable<Response>");
    }

    #[test]
    fn promises_leave_streams_observable() {
        let driver = TypeScriptClientDriver {
            abortable_promises: true,
        };
        let target = TypeScriptTarget;
        let result = driver.return_type(&target, GenerationMode::Client, &ResponseKind::NoContent, &[]);
        assert_eq!(result.to_string(), "Promise<void>");

        let stream = ResponseKind::EventStream {
            events: Default::default(),
            element: TypeName::primitive("string"),
        };
        let streamed = driver.return_type(&target, GenerationMode::Client, &stream, &[]);
        assert_eq!(streamed.to_string(), "rxjs.Observable<string>");

        let source = driver.return_type(&target, GenerationMode::Client, &ResponseKind::EventSource, &[]);
        assert_eq!(source.to_string(), "EventSource");
    }
}
