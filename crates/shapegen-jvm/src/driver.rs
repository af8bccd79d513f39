//! Service drivers for the JVM target.

use log::debug;
use shapegen_core::driver::{ServiceDriver, library_type, logical_return_type, wrapped};
use shapegen_core::ir::{
    MethodDescriptor, MethodModifier, ParameterBinding, ParameterLocation, ResponseKind, TypeKind,
    TypeName,
};
use shapegen_core::media_type::EVENT_STREAM;
use shapegen_core::schema::{AnnotationName, Operation};
use shapegen_core::target::{GenerationMode, TargetProfile};

use crate::profile::JvmTarget;

const RESPONSE: &str = "jakarta.ws.rs.core.Response";
const INVOCATION: &str = "jakarta.ws.rs.client.Invocation";
const SSE_EVENT_SOURCE: &str = "jakarta.ws.rs.sse.SseEventSource";
const MULTI: &str = "io.smallrye.mutiny.Multi";
const UNI: &str = "io.smallrye.mutiny.Uni";
const COMPLETION_STAGE: &str = "java.util.concurrent.CompletionStage";
const FLOW: &str = "kotlinx.coroutines.flow.Flow";
const ASYNC_RESPONSE: &str = "jakarta.ws.rs.container.AsyncResponse";
const SSE: &str = "jakarta.ws.rs.sse.Sse";
const SSE_EVENT_SINK: &str = "jakarta.ws.rs.sse.SseEventSink";
const JSON_NODE: &str = "com.fasterxml.jackson.databind.JsonNode";

/// JAX-RS resources. Servers implement abstract stubs returning a response
/// wrapper; clients get a proxy interface.
#[derive(Debug, Clone, Copy, Default)]
pub struct JaxRsDriver;

impl ServiceDriver<JvmTarget> for JaxRsDriver {
    fn name(&self) -> &'static str {
        "jaxrs"
    }

    fn request_executor(&self) -> &'static str {
        "jakarta.ws.rs.client.WebTarget"
    }

    fn service_kind(&self, _mode: GenerationMode) -> TypeKind {
        TypeKind::Interface
    }

    fn modifiers(
        &self,
        mode: GenerationMode,
        operation: &Operation,
        response: &ResponseKind,
    ) -> Vec<MethodModifier> {
        let streaming = matches!(
            response,
            ResponseKind::EventSource | ResponseKind::EventStream { .. }
        );
        if streaming || operation.annotations.flag(AnnotationName::Reactive, Some(mode)) {
            vec![MethodModifier::Reactive]
        } else {
            Vec::new()
        }
    }

    fn return_type(
        &self,
        profile: &JvmTarget,
        mode: GenerationMode,
        response: &ResponseKind,
        modifiers: &[MethodModifier],
    ) -> TypeName {
        if modifiers.contains(&MethodModifier::RequestOnly) {
            return library_type(INVOCATION);
        }
        if modifiers.contains(&MethodModifier::ResponseOnly) {
            return library_type(RESPONSE);
        }

        let base = match (response, mode) {
            (ResponseKind::EventSource, GenerationMode::Client) => {
                return library_type(SSE_EVENT_SOURCE);
            }
            (ResponseKind::EventSource, GenerationMode::Server) => {
                return wrapped(MULTI, profile.any());
            }
            (ResponseKind::EventStream { element, .. }, _) => return wrapped(MULTI, element.clone()),
            (_, GenerationMode::Server) => library_type(RESPONSE),
            (_, GenerationMode::Client) => logical_return_type(response, profile.any()),
        };
        if modifiers.contains(&MethodModifier::Reactive) {
            debug!("jaxrs: wrapping {base} in {COMPLETION_STAGE}");
            wrapped(COMPLETION_STAGE, base)
        } else {
            base
        }
    }

    /// Applies `jsonBody`, `sse` and `asynchronous`. `sse` hands the events
    /// to the framework's sink; `asynchronous` resumes through an injected
    /// response unless the method is already reactive.
    fn finish_method(&self, mode: GenerationMode, operation: &Operation, method: &mut MethodDescriptor) {
        let flag = |name| operation.annotations.flag(name, Some(mode));

        if flag(AnnotationName::JsonBody) {
            if let Some(body) = &mut method.body {
                body.type_name = library_type(JSON_NODE);
            }
        }

        if flag(AnnotationName::Sse) {
            method.accept_types = vec![EVENT_STREAM.to_string()];
            method.modifiers.retain(|m| *m != MethodModifier::Reactive);
            method.nullify = None;
            match mode {
                GenerationMode::Client => method.return_type = library_type(SSE_EVENT_SOURCE),
                GenerationMode::Server => {
                    method.return_type = TypeName::Unit;
                    inject(method, "sse", SSE);
                    inject(method, "sseEvents", SSE_EVENT_SINK);
                }
            }
        } else if flag(AnnotationName::Asynchronous)
            && !method.modifiers.contains(&MethodModifier::Reactive)
        {
            method.modifiers.push(MethodModifier::Asynchronous);
            method.return_type = TypeName::Unit;
            if mode == GenerationMode::Server {
                inject(method, "asyncResponse", ASYNC_RESPONSE);
            }
        }
    }
}

fn inject(method: &mut MethodDescriptor, identifier: &str, qualified: &str) {
    method.parameters.push(ParameterBinding {
        name: identifier.to_string(),
        identifier: identifier.to_string(),
        location: ParameterLocation::Context,
        type_name: library_type(qualified),
        required: true,
        default: None,
    });
}

/// Reactive client: single results are publishers, event streams are flows.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReactiveDriver;

impl ServiceDriver<JvmTarget> for ReactiveDriver {
    fn name(&self) -> &'static str {
        "reactive"
    }

    fn request_executor(&self) -> &'static str {
        "io.outfoxx.sunday.RequestFactory"
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
        profile: &JvmTarget,
        _mode: GenerationMode,
        response: &ResponseKind,
        modifiers: &[MethodModifier],
    ) -> TypeName {
        if modifiers.contains(&MethodModifier::RequestOnly) {
            return wrapped(UNI, library_type("io.outfoxx.sunday.http.Request"));
        }
        if modifiers.contains(&MethodModifier::ResponseOnly) {
            return wrapped(UNI, library_type("io.outfoxx.sunday.http.Response"));
        }
        match response {
            ResponseKind::EventSource => library_type("io.outfoxx.sunday.EventSource"),
            ResponseKind::EventStream { element, .. } => wrapped(FLOW, element.clone()),
            ResponseKind::NoContent | ResponseKind::Body { .. } => {
                wrapped(UNI, logical_return_type(response, profile.any()))
            }
        }
    }
}
