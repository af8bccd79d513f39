use indexmap::{IndexMap, IndexSet};
use log::{debug, info};
use serde_json::Value;

use super::{DriverContext, Role, ServiceDriver};
use crate::error::{Location, ResolveError};
use crate::ir::{
    BodyBinding, DeclaredName, Implementation, MethodDescriptor, MethodModifier, NullifyVariant,
    ParameterBinding, ParameterLocation, ProblemBinding, ResponseKind, TypeCategory,
    TypeDefinition, TypeName,
};
use crate::media_type::{self, EVENT_STREAM, JSON};
use crate::naming;
use crate::registry::TypeRegistry;
use crate::resolve::{RecursionGuard, ResolutionContext, ShapeResolver};
use crate::schema::{
    AnnotationName, Document, Endpoint, Operation, Parameter, Payload, Response, SchemaNode,
};
use crate::target::{GenerationMode, TargetProfile};

/// Event name used by streams that carry a single event type.
const DEFAULT_EVENT: &str = "message";

/// Operations grouped into one service, in declaration order.
type Members<'d> = Vec<(&'d Endpoint, &'d Operation)>;

/// Everything resolved for one operation before the driver shapes it.
struct MethodScope {
    document: crate::schema::DocumentId,
    service: DeclaredName,
    prefix: String,
}

impl MethodScope {
    fn context(&self, role: Role) -> ResolutionContext {
        let name = naming::synthesized_name(&[self.prefix.as_str(), role.suffix()]);
        ResolutionContext::scoped(self.document, self.service.nested(name))
    }

    /// `{Operation}{Parameter}{Role}`, e.g. `FetchTestCategoryUriParam`.
    fn parameter_context(&self, role: Role, parameter: &str) -> ResolutionContext {
        let name = naming::synthesized_name(&[self.prefix.as_str(), parameter, role.suffix()]);
        ResolutionContext::scoped(self.document, self.service.nested(name))
    }
}

/// Walks the operations of a document and registers its service types.
pub struct ServiceAssembler<'a, 'd, D> {
    resolver: ShapeResolver<'d>,
    driver: &'a D,
    context: &'a DriverContext,
}

impl<'a, 'd, D> ServiceAssembler<'a, 'd, D> {
    pub fn new(resolver: ShapeResolver<'d>, driver: &'a D, context: &'a DriverContext) -> Self {
        Self {
            resolver,
            driver,
            context,
        }
    }

    /// Registers one service type per operation group of `document` and
    /// returns their names.
    pub fn assemble<T>(
        &self,
        registry: &mut TypeRegistry<T>,
        guard: &mut RecursionGuard,
        document: &'d Document,
    ) -> Result<Vec<DeclaredName>, ResolveError>
    where
        T: TargetProfile,
        D: ServiceDriver<T>,
    {
        let mode = registry.mode();
        let package = self.service_package(mode, document);
        let defaults = self.default_media_types(document);

        let mut services: IndexMap<String, Members<'d>> = IndexMap::new();
        for (endpoint, operation) in document.operations() {
            services
                .entry(self.service_name(mode, document, endpoint, operation))
                .or_default()
                .push((endpoint, operation));
        }

        let mut names = Vec::with_capacity(services.len());
        for (simple_name, members) in services {
            let name = DeclaredName::new(package.clone(), simple_name);
            info!(
                "{}: assembling {name} with {} operation(s)",
                self.driver.name(),
                members.len()
            );

            let mut definition =
                TypeDefinition::new(name.clone(), self.driver.service_kind(mode), TypeCategory::Service);
            definition.is_abstract = mode == GenerationMode::Server;
            definition.documentation = document.title.clone();
            definition.source = members.first().map(|(endpoint, _)| endpoint.location.clone());

            for (endpoint, operation) in members {
                let taken: Vec<&str> = definition.methods.iter().map(|m| m.name.as_str()).collect();
                let method_name = naming::unique_name(
                    &registry
                        .profile()
                        .property_identifier(&naming_source(&operation_name(endpoint, operation))),
                    |candidate| taken.contains(&candidate),
                );
                let method =
                    self.method(registry, guard, document, &name, endpoint, operation, method_name, &defaults)?;
                definition.methods.push(method);
            }

            let location = definition.source.clone().unwrap_or_else(|| document.location.clone());
            registry.add_service_type(definition, &location)?;
            names.push(name);
        }
        Ok(names)
    }

    fn service_package(&self, mode: GenerationMode, document: &Document) -> String {
        document
            .annotations
            .string(AnnotationName::ServicePackage, Some(mode))
            .map(str::to_string)
            .unwrap_or_else(|| self.context.service_package.clone())
    }

    /// `{Group}{suffix}`; ungrouped operations use the document's service
    /// name, if any.
    fn service_name(
        &self,
        mode: GenerationMode,
        document: &Document,
        endpoint: &Endpoint,
        operation: &Operation,
    ) -> String {
        let prefix = operation
            .annotations
            .string(AnnotationName::Group, Some(mode))
            .or_else(|| endpoint.annotations.string(AnnotationName::Group, Some(mode)))
            .or_else(|| document.annotations.string(AnnotationName::ServiceName, Some(mode)))
            .unwrap_or_default();
        format!(
            "{}{}",
            naming::to_upper_camel_case(&naming_source(prefix)),
            self.context.service_suffix
        )
    }

    fn default_media_types(&self, document: &Document) -> Vec<String> {
        let defaults = media_type::default_media_types(
            &document.media_types,
            &document.accepts,
            &self.context.media_types,
        );
        if defaults.is_empty() {
            vec![JSON.to_string()]
        } else {
            defaults
        }
    }

    fn negotiate(&self, payloads: &[Payload]) -> Vec<String> {
        let declared: IndexSet<String> = payloads.iter().map(|p| p.media_type.clone()).collect();
        media_type::negotiate(&declared, &self.context.media_types)
            .into_iter()
            .collect()
    }

    #[allow(clippy::too_many_arguments)]
    fn method<T>(
        &self,
        registry: &mut TypeRegistry<T>,
        guard: &mut RecursionGuard,
        document: &'d Document,
        service: &DeclaredName,
        endpoint: &'d Endpoint,
        operation: &'d Operation,
        name: String,
        defaults: &[String],
    ) -> Result<MethodDescriptor, ResolveError>
    where
        T: TargetProfile,
        D: ServiceDriver<T>,
    {
        let mode = registry.mode();
        let scope = MethodScope {
            document: document.id,
            service: service.clone(),
            prefix: naming::to_upper_camel_case(&naming_source(&operation_name(endpoint, operation))),
        };
        debug!("{service}.{name}: {} {}", operation.method, endpoint.path);

        let mut identifiers = Vec::new();
        let mut parameters = Vec::new();
        let groups: [(&'d [Parameter], ParameterLocation, Role); 4] = [
            (&endpoint.uri_parameters, ParameterLocation::Uri, Role::UriParam),
            (&operation.query_parameters, ParameterLocation::Query, Role::QueryParam),
            (&operation.headers, ParameterLocation::Header, Role::HeaderParam),
            (&operation.cookies, ParameterLocation::Cookie, Role::CookieParam),
        ];
        for (declared, location, role) in groups {
            for parameter in declared {
                let binding = self.parameter(
                    registry,
                    guard,
                    parameter,
                    location,
                    &scope.parameter_context(role, &parameter.name),
                    &identifiers,
                )?;
                identifiers.push(binding.identifier.clone());
                parameters.push(binding);
            }
        }

        if let Some(query_string) = operation.query_string {
            let type_name = self.resolver.resolve_type_name(
                registry,
                guard,
                query_string,
                &scope.context(Role::QueryString),
            )?;
            let identifier = unique_identifier("queryString", &identifiers);
            identifiers.push(identifier.clone());
            parameters.push(ParameterBinding {
                name: "queryString".into(),
                identifier,
                location: ParameterLocation::QueryString,
                type_name,
                required: true,
                default: None,
            });
        }

        let body = match operation.body.first() {
            Some(payload) => {
                let type_name = self.resolver.resolve_type_name(
                    registry,
                    guard,
                    payload.shape,
                    &scope.context(Role::RequestBody),
                )?;
                let identifier = unique_identifier("body", &identifiers);
                identifiers.push(identifier.clone());
                Some(BodyBinding {
                    identifier,
                    type_name,
                    media_types: self.negotiate(&operation.body),
                })
            }
            None => None,
        };

        let selected = operation
            .responses
            .iter()
            .filter(|response| response.is_success())
            .min_by_key(|response| response.status);
        let response_ctx = scope.context(Role::ResponseBody);
        let response = self.response_kind(registry, guard, operation, selected, &response_ctx)?;

        // Bodies of the other responses still belong in the model.
        for other in &operation.responses {
            if Some(other.status) == selected.map(|s| s.status) {
                continue;
            }
            if let Some(payload) = other.body.first() {
                self.resolver
                    .resolve_type_name(registry, guard, payload.shape, &response_ctx)?;
            }
        }

        let accept_types = match &response {
            ResponseKind::EventSource | ResponseKind::EventStream { .. } => {
                vec![EVENT_STREAM.to_string()]
            }
            ResponseKind::NoContent | ResponseKind::Body { .. } => {
                let declared = selected.map(|r| self.negotiate(&r.body)).unwrap_or_default();
                if declared.is_empty() {
                    defaults.to_vec()
                } else {
                    declared
                }
            }
        };

        let mut problems = IndexMap::new();
        for code in operation.annotations.strings(AnnotationName::Problems, Some(mode)) {
            let binding = problem_binding(registry, &code, &operation.location)?;
            problems.insert(code, binding);
        }

        let mut modifiers = self.driver.modifiers(mode, operation, &response);
        if mode == GenerationMode::Client {
            if operation.annotations.flag(AnnotationName::RequestOnly, Some(mode)) {
                modifiers.push(MethodModifier::RequestOnly);
            }
            if operation.annotations.flag(AnnotationName::ResponseOnly, Some(mode)) {
                modifiers.push(MethodModifier::ResponseOnly);
            }
        }
        let return_type = self
            .driver
            .return_type(registry.profile(), mode, &response, &modifiers);

        let nullify = match mode {
            GenerationMode::Client => self.nullify(registry, operation, &name, &response, &modifiers)?,
            GenerationMode::Server => None,
        };

        let implementation = match mode {
            GenerationMode::Client => Implementation::RequestExecution {
                collaborator: self.driver.request_executor().to_string(),
            },
            GenerationMode::Server => Implementation::Abstract,
        };

        let mut method = MethodDescriptor {
            name,
            http_method: operation.method,
            path: endpoint.path.clone(),
            parameters,
            content_types: body
                .as_ref()
                .map(|body| body.media_types.clone())
                .unwrap_or_default(),
            body,
            accept_types,
            problems,
            response,
            return_type,
            implementation,
            modifiers,
            nullify,
            documentation: operation.description.clone(),
        };
        self.driver.finish_method(mode, operation, &mut method);
        Ok(method)
    }

    fn parameter<T: TargetProfile>(
        &self,
        registry: &mut TypeRegistry<T>,
        guard: &mut RecursionGuard,
        parameter: &'d Parameter,
        location: ParameterLocation,
        ctx: &ResolutionContext,
        identifiers: &[String],
    ) -> Result<ParameterBinding, ResolveError> {
        let mut type_name = self
            .resolver
            .resolve_type_name(registry, guard, parameter.shape, ctx)?;
        if !parameter.required {
            type_name = type_name.optional();
        }

        let documents = self.resolver.documents();
        let schema_default = documents
            .expect_shape(parameter.shape)?
            .default
            .clone()
            .or_else(|| {
                documents
                    .dereference(parameter.shape)
                    .ok()
                    .and_then(|shape| shape.default.clone())
            });
        let default = match registry.mode() {
            GenerationMode::Server => None,
            GenerationMode::Client if parameter.required => schema_default,
            GenerationMode::Client => Some(schema_default.unwrap_or(Value::Null)),
        };

        let identifier = unique_identifier(
            &registry.profile().property_identifier(&parameter.name),
            identifiers,
        );
        Ok(ParameterBinding {
            name: parameter.name.clone(),
            identifier,
            location,
            type_name,
            required: parameter.required,
            default,
        })
    }

    /// Logical response of an operation given its selected success response.
    fn response_kind<T: TargetProfile>(
        &self,
        registry: &mut TypeRegistry<T>,
        guard: &mut RecursionGuard,
        operation: &'d Operation,
        selected: Option<&'d Response>,
        ctx: &ResolutionContext,
    ) -> Result<ResponseKind, ResolveError> {
        let mode = registry.mode();
        if operation.annotations.flag(AnnotationName::EventSource, Some(mode)) {
            return Ok(ResponseKind::EventSource);
        }

        let payload = selected
            .filter(|response| response.status != 204)
            .and_then(|response| response.body.first());

        let stream = match operation.annotations.get(AnnotationName::EventStream, Some(mode)) {
            Some(Value::String(kind)) => Some(kind.as_str()),
            Some(other) => {
                return Err(ResolveError::InvalidAnnotation {
                    annotation: AnnotationName::EventStream.id(),
                    reason: format!("expected 'simple' or 'discriminated', found {other}"),
                    location: operation.location.clone(),
                });
            }
            None if payload.is_some_and(|p| p.media_type == EVENT_STREAM) => Some("simple"),
            None => None,
        };

        match stream {
            None => match payload {
                Some(payload) => Ok(ResponseKind::Body {
                    type_name: self
                        .resolver
                        .resolve_type_name(registry, guard, payload.shape, ctx)?,
                }),
                None => Ok(ResponseKind::NoContent),
            },
            Some("simple") => {
                let element = match payload {
                    Some(payload) => self
                        .resolver
                        .resolve_type_name(registry, guard, payload.shape, ctx)?,
                    None => registry.profile().any(),
                };
                let mut events = IndexMap::new();
                events.insert(DEFAULT_EVENT.to_string(), element.clone());
                Ok(ResponseKind::EventStream { events, element })
            }
            Some("discriminated") => {
                let payload = payload.ok_or_else(|| ResolveError::EventStreamNotUnion {
                    location: operation.location.clone(),
                })?;
                self.discriminated_events(registry, guard, operation, payload, ctx)
            }
            Some(other) => Err(ResolveError::InvalidAnnotation {
                annotation: AnnotationName::EventStream.id(),
                reason: format!("unknown event stream kind '{other}'"),
                location: operation.location.clone(),
            }),
        }
    }

    /// One event per union member, keyed by its discriminator value or name.
    fn discriminated_events<T: TargetProfile>(
        &self,
        registry: &mut TypeRegistry<T>,
        guard: &mut RecursionGuard,
        operation: &'d Operation,
        payload: &'d Payload,
        ctx: &ResolutionContext,
    ) -> Result<ResponseKind, ResolveError> {
        let documents = self.resolver.documents();
        let body = documents.dereference(payload.shape)?;
        let SchemaNode::Union(union) = &body.node else {
            return Err(ResolveError::EventStreamNotUnion {
                location: operation.location.clone(),
            });
        };

        let element = self
            .resolver
            .resolve_type_name(registry, guard, payload.shape, ctx)?;
        let discriminated = union.discriminator.is_some() || union.externally_discriminated;

        let mut events = IndexMap::new();
        let mut index = 0;
        for member in &union.members {
            let target = documents.dereference(*member)?;
            if matches!(target.node, SchemaNode::Nil) {
                continue;
            }
            index += 1;
            let suffix = format!("Member{index}");
            let (shape, member_ctx) = match element.as_declared() {
                Some(base) if discriminated => (
                    target.id,
                    ResolutionContext::scoped(target.id.document, base.with_suffix(&suffix)),
                ),
                _ => (*member, ctx.suffixed(&suffix)),
            };
            let type_name = self
                .resolver
                .resolve_type_name(registry, guard, shape, &member_ctx)?;
            let event = target
                .as_object()
                .and_then(|object| object.discriminator_value.clone())
                .or_else(|| target.name.clone())
                .or_else(|| type_name.as_declared().map(|n| n.simple_name().to_string()))
                .unwrap_or_else(|| type_name.to_string());
            events.insert(event, type_name);
        }
        Ok(ResponseKind::EventStream { events, element })
    }

    /// The `{name}OrNull` companion declared by the `nullify` annotation.
    fn nullify<T>(
        &self,
        registry: &TypeRegistry<T>,
        operation: &Operation,
        name: &str,
        response: &ResponseKind,
        modifiers: &[MethodModifier],
    ) -> Result<Option<NullifyVariant>, ResolveError>
    where
        T: TargetProfile,
        D: ServiceDriver<T>,
    {
        let entries = operation
            .annotations
            .strings(AnnotationName::Nullify, Some(registry.mode()));
        if entries.is_empty() {
            return Ok(None);
        }

        let mut statuses = Vec::new();
        let mut problems = Vec::new();
        for entry in entries {
            match entry.parse::<u16>() {
                Ok(status) => statuses.push(status),
                Err(_) if registry.problem_type(&entry).is_some() => problems.push(entry),
                Err(_) => {
                    return Err(ResolveError::UnknownProblemCode {
                        code: entry,
                        location: operation.location.clone(),
                    });
                }
            }
        }

        let nullable = match response {
            ResponseKind::Body { type_name } => ResponseKind::Body {
                type_name: type_name.clone().optional(),
            },
            other => other.clone(),
        };
        Ok(Some(NullifyVariant {
            name: format!("{name}OrNull"),
            statuses,
            problems,
            return_type: self.driver.return_type(
                registry.profile(),
                registry.mode(),
                &nullable,
                modifiers,
            ),
        }))
    }
}

/// `operationId`, else `displayName`, else a name derived from the route.
fn operation_name(endpoint: &Endpoint, operation: &Operation) -> String {
    operation
        .operation_id
        .clone()
        .or_else(|| operation.display_name.clone())
        .unwrap_or_else(|| naming::route_to_name(operation.method.as_str(), &endpoint.path))
}

/// Free text such as a display name, reduced to identifier characters.
fn naming_source(text: &str) -> String {
    if text.is_empty() {
        String::new()
    } else {
        naming::sanitize_identifier(text)
    }
}

fn unique_identifier(base: &str, taken: &[String]) -> String {
    naming::unique_name(base, |candidate| taken.iter().any(|t| t == candidate))
}

fn problem_binding<T: TargetProfile>(
    registry: &TypeRegistry<T>,
    code: &str,
    location: &Location,
) -> Result<ProblemBinding, ResolveError> {
    let unknown = || ResolveError::UnknownProblemCode {
        code: code.to_string(),
        location: location.clone(),
    };
    let name = registry.problem_type(code).ok_or_else(unknown)?;
    let problem = registry
        .definition(name)
        .and_then(|definition| definition.problem.as_ref())
        .ok_or_else(unknown)?;
    Ok(ProblemBinding {
        type_uri: problem.type_uri.clone(),
        status: problem.status,
        type_name: TypeName::Declared(name.clone()),
    })
}
