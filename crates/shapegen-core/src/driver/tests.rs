use serde_json::json;
use url::Url;

use super::*;
use crate::error::ResolveError;
use crate::ir::{Implementation, MethodDescriptor, ParameterLocation, TypeCategory, TypeDefinition};
use crate::media_type::{CBOR, EVENT_STREAM, JSON};
use crate::parse::Loader;
use crate::problem::{DEFAULT_PROBLEM_BASE, find_problem_types};
use crate::registry::{GeneratedTypes, TypeRegistry};
use crate::resolve::{RecursionGuard, ShapeResolver};
use crate::schema::{DocumentId, DocumentSet};
use crate::target::FeatureSet;
use crate::target::testing::TestTarget;

/// Wraps streams and honours the request/response-only markers.
struct TestDriver;

impl ServiceDriver<TestTarget> for TestDriver {
    fn name(&self) -> &'static str {
        "test"
    }

    fn request_executor(&self) -> &'static str {
        "test.runtime.RequestExecutor"
    }

    fn modifiers(
        &self,
        _mode: GenerationMode,
        _operation: &Operation,
        response: &ResponseKind,
    ) -> Vec<MethodModifier> {
        match response {
            ResponseKind::EventSource | ResponseKind::EventStream { .. } => {
                vec![MethodModifier::Reactive]
            }
            ResponseKind::NoContent | ResponseKind::Body { .. } => Vec::new(),
        }
    }

    fn return_type(
        &self,
        profile: &TestTarget,
        _mode: GenerationMode,
        response: &ResponseKind,
        modifiers: &[MethodModifier],
    ) -> TypeName {
        if modifiers.contains(&MethodModifier::RequestOnly) {
            return library_type("test.runtime.Request");
        }
        if modifiers.contains(&MethodModifier::ResponseOnly) {
            return library_type("test.runtime.Response");
        }
        let logical = logical_return_type(response, profile.any());
        if modifiers.contains(&MethodModifier::Reactive) {
            wrapped("test.runtime.Stream", logical)
        } else {
            logical
        }
    }
}

fn load(source: &str) -> DocumentSet {
    let mut loader = Loader::new();
    loader.add_source("api.yaml", source).expect("should parse");
    loader.finish().expect("should lower")
}

fn context() -> DriverContext {
    DriverContext {
        service_package: "io.test.api".into(),
        service_suffix: "API".into(),
        media_types: vec![JSON.into(), CBOR.into()],
    }
}

fn assemble(mode: GenerationMode, source: &str) -> Result<GeneratedTypes, ResolveError> {
    let documents = load(source);
    let context = context();
    let mut registry = TypeRegistry::new(TestTarget::default(), FeatureSet::defaults(), mode, "io.test");
    let mut guard = RecursionGuard::new();
    let document = documents.document(DocumentId(0)).expect("document");

    let resolver = ShapeResolver::new(&documents);
    let base = Url::parse(DEFAULT_PROBLEM_BASE).expect("default base");
    for problem in find_problem_types(&documents, document, &base)?.values() {
        resolver.define_problem_type(&mut registry, &mut guard, problem)?;
    }

    ServiceAssembler::new(resolver, &TestDriver, &context).assemble(&mut registry, &mut guard, document)?;
    registry.build_types()
}

fn client(source: &str) -> GeneratedTypes {
    assemble(GenerationMode::Client, source).expect("should assemble")
}

fn service<'t>(types: &'t GeneratedTypes, name: &str) -> &'t TypeDefinition {
    let definition = types.find(name).expect("service registered");
    assert_eq!(definition.category, TypeCategory::Service);
    definition
}

fn method<'t>(service: &'t TypeDefinition, name: &str) -> &'t MethodDescriptor {
    service
        .methods
        .iter()
        .find(|method| method.name == name)
        .unwrap_or_else(|| panic!("expected method {name}"))
}

fn declared(package: &str, names: &[&str]) -> TypeName {
    TypeName::Declared(DeclaredName {
        package: package.to_string(),
        names: names.iter().map(|name| name.to_string()).collect(),
    })
}

#[test]
fn operations_are_grouped_into_services() {
    let types = client(
        r#"
title: Pet Store
annotations:
  serviceName: core
endpoints:
  /pets:
    annotations:
      group: pets
    operations:
      get:
        responses:
          "200":
            body:
              application/json:
                type: array
                items: string
      post:
        annotations:
          group: admin
  /status:
    operations:
      get: {}
"#,
    );

    let services: Vec<String> = types
        .filter_categories(&[TypeCategory::Service])
        .iter()
        .map(|(name, _)| name.qualified())
        .collect();
    assert_eq!(
        services,
        vec!["io.test.api.PetsAPI", "io.test.api.AdminAPI", "io.test.api.CoreAPI"]
    );

    let pets = service(&types, "PetsAPI");
    assert_eq!(pets.kind, TypeKind::Class);
    assert!(!pets.is_abstract);
    assert_eq!(pets.documentation.as_deref(), Some("Pet Store"));

    let list = method(pets, "listPets");
    assert_eq!(list.path, "/pets");
    assert_eq!(list.return_type.to_string(), "List<String>");
    assert_eq!(
        list.implementation,
        Implementation::RequestExecution {
            collaborator: "test.runtime.RequestExecutor".into()
        }
    );

    let status = method(service(&types, "CoreAPI"), "listStatus");
    assert_eq!(status.response, ResponseKind::NoContent);
    assert_eq!(status.return_type, TypeName::Unit);
}

#[test]
fn ungrouped_operations_use_the_bare_suffix() {
    let types = client(
        r#"
annotations:
  servicePackage: io.test.remote
endpoints:
  /ping:
    operations:
      get: {}
"#,
    );
    assert!(types.get(&DeclaredName::new("io.test.remote", "API")).is_some());
}

#[test]
fn method_names_come_from_operation_id_then_display_name() {
    let types = client(
        r#"
endpoints:
  /pets:
    operations:
      get:
        displayName: Fetch All Pets
      post:
        operationId: fetchAllPets
      put: {}
"#,
    );
    let names: Vec<&str> = service(&types, "API")
        .methods
        .iter()
        .map(|method| method.name.as_str())
        .collect();
    assert_eq!(names, vec!["fetchAllPets", "fetchAllPets2", "updatePets"]);
}

#[test]
fn inline_shapes_are_scoped_by_operation_role() {
    let types = client(
        r#"
endpoints:
  /pets:
    operations:
      post:
        operationId: createPet
        queryParameters:
          filter:
            properties:
              tag: string
        body:
          application/json:
            properties:
              name: string
        responses:
          "201":
            body:
              application/json:
                properties:
                  id: string
"#,
    );

    let create = method(service(&types, "API"), "createPet");
    assert_eq!(
        create.parameter("filter").map(|p| p.type_name.clone()),
        Some(declared("io.test.api", &["API", "CreatePetFilterQueryParam"]))
    );
    let body = create.body.as_ref().expect("request body");
    assert_eq!(body.identifier, "body");
    assert_eq!(body.type_name, declared("io.test.api", &["API", "CreatePetRequestBody"]));
    assert_eq!(create.content_types, vec![JSON.to_string()]);
    assert_eq!(create.return_type, declared("io.test.api", &["API", "CreatePetResponseBody"]));

    let api = service(&types, "API");
    assert_eq!(api.nested.len(), 3);
}

#[test]
fn inline_parameters_are_scoped_by_name() {
    let types = client(
        r#"
endpoints:
  /tests/{category}/{type}:
    uriParameters:
      category:
        enum: [politics, science]
      type:
        enum: [all, limited]
    operations:
      get:
        operationId: fetchTest
"#,
    );
    let fetch = method(service(&types, "API"), "fetchTest");
    let names: Vec<TypeName> = fetch.parameters.iter().map(|p| p.type_name.clone()).collect();
    assert_eq!(
        names,
        vec![
            declared("io.test.api", &["API", "FetchTestCategoryUriParam"]),
            declared("io.test.api", &["API", "FetchTestTypeUriParam"]),
        ]
    );
}

const PARAMETERS: &str = r#"
endpoints:
  /pets/{petId}:
    operations:
      get:
        operationId: fetchPet
        queryParameters:
          limit?:
            type: integer
            default: 10
          verbose?: boolean
          class: string
        headers:
          X-Trace?: string
"#;

#[test]
fn client_parameters_carry_defaults() {
    let types = client(PARAMETERS);
    let fetch = method(service(&types, "API"), "fetchPet");

    let bindings: Vec<(&str, ParameterLocation)> = fetch
        .parameters
        .iter()
        .map(|p| (p.name.as_str(), p.location))
        .collect();
    assert_eq!(
        bindings,
        vec![
            ("petId", ParameterLocation::Uri),
            ("limit", ParameterLocation::Query),
            ("verbose", ParameterLocation::Query),
            ("class", ParameterLocation::Query),
            ("X-Trace", ParameterLocation::Header),
        ]
    );

    let pet_id = fetch.parameter("petId").expect("petId");
    assert!(pet_id.required);
    assert_eq!(pet_id.type_name, TypeName::primitive("String"));
    assert_eq!(pet_id.default, None);

    let limit = fetch.parameter("limit").expect("limit");
    assert!(limit.type_name.is_optional());
    assert_eq!(limit.default, Some(json!(10)));

    let verbose = fetch.parameter("verbose").expect("verbose");
    assert_eq!(verbose.default, Some(serde_json::Value::Null));

    assert_eq!(fetch.parameter("class").map(|p| p.identifier.as_str()), Some("class_"));
}

#[test]
fn server_parameters_have_no_defaults() {
    let types = assemble(GenerationMode::Server, PARAMETERS).expect("should assemble");
    let api = service(&types, "API");
    assert_eq!(api.kind, TypeKind::Interface);
    assert!(api.is_abstract);

    let fetch = method(api, "fetchPet");
    assert_eq!(fetch.implementation, Implementation::Abstract);
    assert!(fetch.parameters.iter().all(|p| p.default.is_none()));
}

const PROBLEMS: &str = r#"
annotations:
  problemTypes:
    invalid_id:
      status: 400
      title: Invalid Id
      detail: The id contains invalid characters.
types:
  Pet:
    properties:
      name: string
endpoints:
  /pets/{petId}:
    operations:
      get:
        annotations:
          problems: [invalid_id]
          nullify: [404, invalid_id]
        responses:
          "200":
            body:
              application/json: Pet
"#;

#[test]
fn problems_and_nullify_bind_declared_problem_types() {
    let types = client(PROBLEMS);
    let get = method(service(&types, "API"), "getPet");

    let problem = get.problems.get("invalid_id").expect("problem binding");
    assert_eq!(problem.type_uri, "http://example.com/invalid_id");
    assert_eq!(problem.status, 400);
    assert_eq!(problem.type_name, declared("io.test", &["InvalidIdProblem"]));

    let nullify = get.nullify.as_ref().expect("nullify variant");
    assert_eq!(nullify.name, "getPetOrNull");
    assert_eq!(nullify.statuses, vec![404]);
    assert_eq!(nullify.problems, vec!["invalid_id".to_string()]);
    assert_eq!(nullify.return_type.to_string(), "io.test.Pet?");
    assert_eq!(get.return_type, declared("io.test", &["Pet"]));
}

#[test]
fn servers_ignore_nullify() {
    let types = assemble(GenerationMode::Server, PROBLEMS).expect("should assemble");
    let get = method(service(&types, "API"), "getPet");
    assert!(get.nullify.is_none());
    assert_eq!(get.problems.len(), 1);
}

#[test]
fn unknown_problem_codes_are_rejected() {
    let err = assemble(
        GenerationMode::Client,
        r#"
endpoints:
  /pets:
    operations:
      get:
        annotations:
          problems: [missing]
"#,
    )
    .expect_err("undeclared problem");
    assert!(matches!(err, ResolveError::UnknownProblemCode { ref code, .. } if code == "missing"));

    let err = assemble(
        GenerationMode::Client,
        r#"
endpoints:
  /pets:
    operations:
      get:
        annotations:
          nullify: [gone]
"#,
    )
    .expect_err("undeclared nullify code");
    assert!(matches!(err, ResolveError::UnknownProblemCode { ref code, .. } if code == "gone"));
}

const EVENTS: &str = r#"
types:
  Event:
    anyOf: [Created, Deleted]
    discriminator: type
  Created:
    discriminatorValue: created
    properties:
      type: string
      id: string
  Deleted:
    properties:
      type: string
      id: string
  Pet:
    properties:
      name: string
endpoints:
  /events:
    operations:
      get:
        operationId: watch
        annotations:
          eventStream: discriminated
        responses:
          "200":
            body:
              text/event-stream: Event
  /ticks:
    operations:
      get:
        operationId: ticks
        responses:
          "200":
            body:
              text/event-stream: string
  /raw:
    operations:
      get:
        operationId: raw
        annotations:
          eventSource: true
"#;

#[test]
fn event_streams_map_events_to_types() {
    let types = client(EVENTS);
    let api = service(&types, "API");

    let watch = method(api, "watch");
    let ResponseKind::EventStream { events, element } = &watch.response else {
        panic!("expected an event stream");
    };
    assert_eq!(element, &declared("io.test", &["Event"]));
    let events: Vec<(&str, String)> = events
        .iter()
        .map(|(name, type_name)| (name.as_str(), type_name.to_string()))
        .collect();
    assert_eq!(
        events,
        vec![
            ("created", "io.test.Created".to_string()),
            ("Deleted", "io.test.Deleted".to_string()),
        ]
    );
    assert_eq!(watch.accept_types, vec![EVENT_STREAM.to_string()]);
    assert_eq!(watch.modifiers, vec![MethodModifier::Reactive]);
    assert_eq!(watch.return_type.to_string(), "test.runtime.Stream<io.test.Event>");

    let ticks = method(api, "ticks");
    let ResponseKind::EventStream { events, .. } = &ticks.response else {
        panic!("expected a simple event stream");
    };
    assert_eq!(events.get("message"), Some(&TypeName::primitive("String")));

    let raw = method(api, "raw");
    assert_eq!(raw.response, ResponseKind::EventSource);
    assert_eq!(raw.return_type.to_string(), "test.runtime.Stream<Any>");
}

#[test]
fn discriminated_streams_require_a_union() {
    let err = assemble(
        GenerationMode::Client,
        r#"
types:
  Pet:
    properties:
      name: string
endpoints:
  /events:
    operations:
      get:
        annotations:
          eventStream: discriminated
        responses:
          "200":
            body:
              text/event-stream: Pet
"#,
    )
    .expect_err("payload is not a union");
    assert!(matches!(err, ResolveError::EventStreamNotUnion { .. }));
}

#[test]
fn unknown_event_stream_kinds_are_rejected() {
    let err = assemble(
        GenerationMode::Client,
        r#"
endpoints:
  /events:
    operations:
      get:
        annotations:
          eventStream: chunked
"#,
    )
    .expect_err("unknown kind");
    assert!(matches!(
        err,
        ResolveError::InvalidAnnotation { annotation: "eventStream", .. }
    ));
}

#[test]
fn request_only_applies_to_clients() {
    let source = r#"
endpoints:
  /pets:
    operations:
      post:
        operationId: upload
        annotations:
          requestOnly: true
"#;
    let types = client(source);
    let upload = method(service(&types, "API"), "upload");
    assert_eq!(upload.modifiers, vec![MethodModifier::RequestOnly]);
    assert_eq!(upload.return_type.to_string(), "test.runtime.Request");

    let types = assemble(GenerationMode::Server, source).expect("should assemble");
    let upload = method(service(&types, "API"), "upload");
    assert!(upload.modifiers.is_empty());
    assert_eq!(upload.return_type, TypeName::Unit);
}

#[test]
fn media_types_follow_caller_priority() {
    let types = client(
        r#"
mediaType: [application/cbor, application/json]
endpoints:
  /pets:
    operations:
      put:
        operationId: replace
        body:
          application/cbor: string
          application/json: string
        responses:
          "204": {}
"#,
    );
    let replace = method(service(&types, "API"), "replace");
    assert_eq!(replace.content_types, vec![JSON.to_string(), CBOR.to_string()]);
    assert_eq!(replace.accept_types, vec![JSON.to_string(), CBOR.to_string()]);
    assert_eq!(replace.response, ResponseKind::NoContent);
}

#[test]
fn services_are_defined_once() {
    let documents = load(
        r#"
endpoints:
  /ping:
    operations:
      get: {}
"#,
    );
    let context = context();
    let mut registry = TypeRegistry::new(
        TestTarget::default(),
        FeatureSet::defaults(),
        GenerationMode::Client,
        "io.test",
    );
    let mut guard = RecursionGuard::new();
    let document = documents.document(DocumentId(0)).expect("document");
    let assembler = ServiceAssembler::new(ShapeResolver::new(&documents), &TestDriver, &context);

    let names = assembler
        .assemble(&mut registry, &mut guard, document)
        .expect("first assembly");
    assert_eq!(names, vec![DeclaredName::new("io.test.api", "API")]);

    let err = assembler
        .assemble(&mut registry, &mut guard, document)
        .expect_err("second assembly");
    assert!(matches!(err, ResolveError::DuplicateService { ref name, .. } if name == "io.test.api.API"));
}
