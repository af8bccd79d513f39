use serde_json::json;
use url::Url;

use super::*;
use crate::parse::Loader;
use crate::problem::{DEFAULT_PROBLEM_BASE, ProblemTypeDefinition};
use crate::target::testing::{TestFeature, TestTarget};
use crate::target::{FeatureSet, GenerationMode};

fn load(source: &str) -> DocumentSet {
    let mut loader = Loader::new();
    loader.add_source("api.yaml", source).expect("should parse");
    loader.finish().expect("should lower")
}

fn registry_with(target: TestTarget, features: FeatureSet<TestFeature>) -> TypeRegistry<TestTarget> {
    TypeRegistry::new(target, features, GenerationMode::Client, "io.test")
}

fn registry() -> TypeRegistry<TestTarget> {
    registry_with(TestTarget::default(), FeatureSet::defaults())
}

fn resolve(
    documents: &DocumentSet,
    registry: &mut TypeRegistry<TestTarget>,
    name: &str,
) -> Result<TypeName, ResolveError> {
    let resolver = ShapeResolver::new(documents);
    let shape = documents
        .lookup_type(DocumentId(0), name)
        .expect("declared type");
    let mut guard = RecursionGuard::new();
    resolver.resolve_type_name(registry, &mut guard, shape, &ResolutionContext::new(DocumentId(0)))
}

fn declared(package: &str, names: &[&str]) -> TypeName {
    TypeName::Declared(DeclaredName {
        package: package.to_string(),
        names: names.iter().map(|name| name.to_string()).collect(),
    })
}

#[test]
fn enum_cases_keep_declaration_order() {
    let documents = load(
        r#"
types:
  Category:
    enum: [politics, science]
"#,
    );
    let mut registry = registry();
    let name = resolve(&documents, &mut registry, "Category").expect("should resolve");
    assert_eq!(name, declared("io.test", &["Category"]));

    let types = registry.build_types().expect("should build");
    let category = types.find("Category").expect("enum registered");
    assert_eq!(category.kind, TypeKind::Enum);
    let cases: Vec<(&str, &serde_json::Value)> = category
        .enum_cases
        .iter()
        .map(|case| (case.identifier.as_str(), &case.value))
        .collect();
    assert_eq!(
        cases,
        vec![("Politics", &json!("politics")), ("Science", &json!("science"))]
    );
    assert_eq!(category.raw_value_type, Some(TypeName::primitive("String")));
}

#[test]
fn resolution_is_idempotent() {
    let documents = load(
        r#"
types:
  Pet:
    properties:
      name: string
      tags:
        type: array
        items:
          properties:
            label: string
"#,
    );
    let mut registry = registry();
    let first = resolve(&documents, &mut registry, "Pet").expect("should resolve");
    let registered = registry.len();
    let second = resolve(&documents, &mut registry, "Pet").expect("should resolve");
    assert_eq!(first, second);
    assert_eq!(registry.len(), registered);

    let types = registry.build_types().expect("should build");
    let pet = types.find("Pet").expect("pet");
    assert_eq!(
        pet.property("tags").map(|p| p.type_name.to_string()),
        Some("List<io.test.Pet.TagsItem>".to_string())
    );
    assert_eq!(pet.nested.len(), 1);
}

#[test]
fn synthesized_collisions_are_numbered() {
    let documents = load(
        r#"
endpoints:
  /tests:
    operations:
      get:
        queryParameters:
          filter:
            properties:
              a: string
          sort:
            properties:
              b: string
"#,
    );
    let resolver = ShapeResolver::new(&documents);
    let mut registry = registry();
    let mut guard = RecursionGuard::new();
    let (_, operation) = documents
        .document(DocumentId(0))
        .and_then(|doc| doc.operations().next())
        .expect("operation");
    let scope = DeclaredName::new("io.test.api", "API").nested("FetchTestsFilter");
    let ctx = ResolutionContext::scoped(DocumentId(0), scope);

    let names: Vec<String> = operation
        .query_parameters
        .iter()
        .map(|parameter| {
            resolver
                .resolve_type_name(&mut registry, &mut guard, parameter.shape, &ctx)
                .expect("should resolve")
                .to_string()
        })
        .collect();
    assert_eq!(
        names,
        vec!["io.test.api.API.FetchTestsFilter", "io.test.api.API.FetchTestsFilter2"]
    );
}

#[test]
fn recursive_objects_terminate() {
    let documents = load(
        r#"
types:
  Node:
    properties:
      value: string
      next?: Node
      children:
        type: array
        items: Node
"#,
    );
    let mut registry = registry();
    let name = resolve(&documents, &mut registry, "Node").expect("should resolve");
    let types = registry.build_types().expect("should build");
    let node = types.find("Node").expect("node");
    assert_eq!(node.property("next").map(|p| &p.type_name), Some(&name.clone().optional()));
    assert_eq!(
        node.property("children").map(|p| &p.type_name),
        Some(&TypeName::sequence(name, false))
    );
}

#[test]
fn alias_cycles_are_reported() {
    let documents = load(
        r#"
types:
  A: B
  B: A
"#,
    );
    let err = resolve(&documents, &mut registry(), "A").expect_err("cycle");
    assert!(matches!(err, ResolveError::RecursiveAlias { .. }));
}

#[test]
fn depth_limit_is_a_resolution_error() {
    let documents = load(
        r#"
types:
  Deep:
    properties:
      a:
        properties:
          b:
            properties:
              c: string
"#,
    );
    let resolver = ShapeResolver::new(&documents);
    let mut registry = registry();
    let mut guard = RecursionGuard::with_limit(2);
    let shape = documents.lookup_type(DocumentId(0), "Deep").expect("declared");
    let err = resolver
        .resolve_type_name(&mut registry, &mut guard, shape, &ResolutionContext::new(DocumentId(0)))
        .expect_err("too deep");
    assert!(matches!(err, ResolveError::RecursionLimit { limit: 2, .. }));
}

#[test]
fn inheritance_builds_discriminated_hierarchy() {
    let documents = load(
        r#"
types:
  Animal:
    discriminator: kind
    properties:
      kind: string
      name: string
  Dog:
    type: Animal
    properties:
      bark: boolean
  Cat:
    type: Animal
    discriminatorValue: kitty
    properties: {}
"#,
    );
    let mut registry = registry();
    resolve(&documents, &mut registry, "Animal").expect("should resolve");
    let types = registry.build_types().expect("should build");

    let animal = types.find("Animal").expect("animal");
    assert_eq!(animal.kind, TypeKind::Sealed);
    assert!(animal.is_abstract);
    assert!(animal.property("kind").is_some());
    let variants: Vec<(&str, String)> = animal
        .variants
        .iter()
        .map(|v| (v.value.as_str(), v.type_name.to_string()))
        .collect();
    assert_eq!(
        variants,
        vec![
            ("Dog", "io.test.Dog".to_string()),
            ("kitty", "io.test.Cat".to_string())
        ]
    );

    let dog = types.find("Dog").expect("dog");
    assert_eq!(dog.supertypes, vec![declared("io.test", &["Animal"])]);
    assert_eq!(dog.discriminator_value.as_deref(), Some("Dog"));
    assert!(dog.property("kind").is_none());
    assert!(
        animal
            .annotations
            .iter()
            .any(|a| matches!(a, FeatureAnnotation::Codec(CodecAnnotation::TypeInfo { property, .. }) if property == "kind"))
    );
}

#[test]
fn missing_discriminator_property_fails() {
    let documents = load(
        r#"
types:
  Base:
    discriminator: type
    properties:
      name: string
"#,
    );
    let err = resolve(&documents, &mut registry(), "Base").expect_err("missing property");
    assert!(matches!(
        err,
        ResolveError::DiscriminatorNotFound { ref property, .. } if property == "type"
    ));
}

#[test]
fn external_discrimination_requires_discriminator() {
    let documents = load(
        r#"
types:
  Payload:
    properties:
      data: string
    annotations:
      externallyDiscriminated: true
"#,
    );
    let err = resolve(&documents, &mut registry(), "Payload").expect_err("no discriminator");
    assert!(matches!(err, ResolveError::MissingExternalDiscriminator { .. }));
}

#[test]
fn external_discriminator_checks_range_and_sibling() {
    let documents = load(
        r#"
types:
  Payload:
    discriminator: kind
    properties:
      data: string
    annotations:
      externallyDiscriminated: true
  Envelope:
    properties:
      kind: string
      value:
        type: Payload
        annotations:
          externalDiscriminator: kind
  Missing:
    properties:
      value:
        type: Payload
        annotations:
          externalDiscriminator: kind
  Scalar:
    properties:
      kind: string
      value:
        type: string
        annotations:
          externalDiscriminator: kind
"#,
    );

    let mut registry = registry();
    resolve(&documents, &mut registry, "Envelope").expect("should resolve");
    let types = registry.build_types().expect("should build");
    let value = types
        .find("Envelope")
        .and_then(|e| e.property("value"))
        .expect("value property");
    assert!(value.annotations.contains(&FeatureAnnotation::Codec(
        CodecAnnotation::ExternalTypeId {
            property: "kind".into()
        }
    )));
    let payload = types.find("Payload").expect("payload");
    assert_eq!(
        payload.discriminator,
        Some(DiscriminatorDefinition {
            property: "kind".into(),
            external: true
        })
    );

    let err = resolve(&documents, &mut self::registry(), "Missing").expect_err("no sibling");
    assert_eq!(
        err.to_string().rsplit_once(": ").map(|(_, m)| m),
        Some("External discriminator 'kind' not found in object")
    );

    let err = resolve(&documents, &mut self::registry(), "Scalar").expect_err("scalar range");
    assert!(matches!(err, ResolveError::ExternalDiscriminatorRange { .. }));
}

#[test]
fn discriminated_unions_register_sealed_base() {
    let documents = load(
        r#"
types:
  Event:
    anyOf: [Created, Deleted]
    discriminator: type
  Created:
    properties:
      type: string
      id: string
  Deleted:
    discriminatorValue: removed
    properties:
      type: string
      id: string
"#,
    );
    let mut registry = registry();
    let event = resolve(&documents, &mut registry, "Event").expect("should resolve");
    assert_eq!(event, declared("io.test", &["Event"]));

    let types = registry.build_types().expect("should build");
    let base = types.find("Event").expect("base");
    assert_eq!(base.kind, TypeKind::Sealed);
    assert!(base.property("type").is_some());
    let values: Vec<&str> = base.variants.iter().map(|v| v.value.as_str()).collect();
    assert_eq!(values, vec!["Created", "removed"]);

    let created = types.find("Created").expect("created");
    assert!(created.property("type").is_none());
    assert!(created.property("id").is_some());
    assert!(created.supertypes.contains(&event));
    assert_eq!(
        types.find("Deleted").and_then(|d| d.discriminator_value.as_deref()),
        Some("removed")
    );
}

#[test]
fn members_resolved_before_the_union_are_patched() {
    let documents = load(
        r#"
types:
  Event:
    anyOf: [Created]
    discriminator: type
  Created:
    properties:
      type: string
      id: string
"#,
    );
    let mut registry = registry();
    resolve(&documents, &mut registry, "Created").expect("member first");
    resolve(&documents, &mut registry, "Event").expect("then union");
    let types = registry.build_types().expect("should build");
    let created = types.find("Created").expect("created");
    assert!(created.property("type").is_none());
    assert_eq!(created.supertypes, vec![declared("io.test", &["Event"])]);
}

#[test]
fn discriminated_union_members_must_be_objects() {
    let documents = load(
        r#"
types:
  Event:
    anyOf: [Created, string]
    discriminator: type
  Created:
    properties:
      type: string
"#,
    );
    let err = resolve(&documents, &mut registry(), "Event").expect_err("scalar member");
    assert!(matches!(err, ResolveError::UnionMemberNotObject { .. }));
}

const PETS: &str = r#"
types:
  Animal:
    properties:
      name: string
  Dog:
    type: Animal
    properties:
      bark: boolean
  Cat:
    type: Animal
    properties:
      purr: boolean
  Owner:
    properties:
      pet:
        anyOf: [Dog, Cat]
      either?:
        anyOf: [string, integer]
"#;

#[test]
fn unions_fall_back_to_common_ancestor() {
    let documents = load(PETS);
    let mut registry = registry();
    resolve(&documents, &mut registry, "Owner").expect("should resolve");
    let types = registry.build_types().expect("should build");
    let owner = types.find("Owner").expect("owner");

    let pet = owner.property("pet").expect("pet");
    assert_eq!(pet.type_name, declared("io.test", &["Animal"]));
    insta::assert_snapshot!(
        pet.documentation.as_deref().unwrap_or_default(),
        @"Union of Dog | Cat is represented as io.test.Animal; member types are not checked."
    );

    let either = owner.property("either").expect("either");
    assert_eq!(either.type_name, TypeName::Any.optional());
}

#[test]
fn structural_unions_are_kept_when_supported() {
    let documents = load(PETS);
    let mut registry = registry_with(
        TestTarget {
            structural_unions: true,
        },
        FeatureSet::defaults(),
    );
    resolve(&documents, &mut registry, "Owner").expect("should resolve");
    let types = registry.build_types().expect("should build");
    let pet = types
        .find("Owner")
        .and_then(|o| o.property("pet"))
        .expect("pet");
    assert_eq!(pet.type_name.to_string(), "io.test.Dog | io.test.Cat");
    assert!(pet.documentation.is_none());
}

#[test]
fn declared_unions_may_refer_to_themselves() {
    let documents = load(
        r#"
types:
  Json:
    anyOf: [string, JsonObject]
  JsonObject:
    properties:
      value: Json
"#,
    );
    let mut registry = registry_with(
        TestTarget {
            structural_unions: true,
        },
        FeatureSet::defaults(),
    );
    let name = resolve(&documents, &mut registry, "Json").expect("should resolve");
    assert_eq!(name, declared("io.test", &["Json"]));

    let types = registry.build_types().expect("should build");
    let json = types.find("Json").expect("alias registered");
    assert_eq!(json.kind, TypeKind::Alias);
    assert_eq!(
        json.aliased.as_ref().map(ToString::to_string).as_deref(),
        Some("String | io.test.JsonObject")
    );
    let value = types
        .find("JsonObject")
        .and_then(|object| object.property("value"))
        .expect("value");
    assert_eq!(value.type_name, name);
}

#[test]
fn enum_raw_values_follow_the_format() {
    let documents = load(
        r#"
types:
  Priority:
    type: integer
    format: int64
    enum: [1, 2, 3]
"#,
    );
    let mut registry = registry();
    resolve(&documents, &mut registry, "Priority").expect("should resolve");
    let types = registry.build_types().expect("should build");
    let priority = types.find("Priority").expect("enum");
    assert_eq!(priority.raw_value_type, Some(TypeName::primitive("Int64")));
    assert_eq!(priority.enum_cases[0].value, json!(1));
}

#[test]
fn nested_declarations_live_in_their_enclosing_type() {
    let documents = load(
        r#"
types:
  Order:
    properties:
      status: OrderStatus
  OrderStatus:
    enum: [open, closed]
    annotations:
      nested:
        enclosedIn: Order
        name: status
  Line:
    properties:
      sku: string
    annotations:
      nested:
        enclosedIn: Order
        name: Line
"#,
    );

    let mut registry = registry();
    let line = resolve(&documents, &mut registry, "Line").expect("should resolve");
    assert_eq!(line, declared("io.test", &["Order", "Line"]));
    let order = resolve(&documents, &mut registry, "Order").expect("should resolve");
    assert_eq!(order, declared("io.test", &["Order"]));

    let types = registry.build_types().expect("should build");
    let order = types.find("Order").expect("enclosing type generated");
    assert_eq!(
        order.property("status").map(|p| p.type_name.clone()),
        Some(declared("io.test", &["Order", "Status"]))
    );
    let nested: Vec<&str> = order.nested.iter().map(DeclaredName::simple_name).collect();
    assert_eq!(nested, vec!["Line", "Status"]);
}

#[test]
fn nesting_requires_a_generated_enclosing_type() {
    let documents = load(
        r#"
types:
  Code: string
  Orphan:
    properties:
      value: string
    annotations:
      nested:
        enclosedIn: Missing
        name: Orphan
  Scalar:
    properties:
      value: string
    annotations:
      nested:
        enclosedIn: Code
        name: Scalar
  Unnamed:
    properties:
      value: string
    annotations:
      nested:
        enclosedIn: Code
"#,
    );

    for name in ["Orphan", "Scalar", "Unnamed"] {
        let err = resolve(&documents, &mut registry(), name).expect_err("invalid nesting");
        assert!(
            matches!(err, ResolveError::InvalidAnnotation { annotation: "nested", .. }),
            "{name}: {err}"
        );
    }
}

#[test]
fn patchable_models_get_a_patch_form() {
    let documents = load(
        r#"
types:
  Profile:
    properties:
      name: string
      age?: integer
    annotations:
      patchable: true
"#,
    );
    let mut registry = registry();
    resolve(&documents, &mut registry, "Profile").expect("should resolve");
    let types = registry.build_types().expect("should build");

    let profile = types.find("Profile").expect("model");
    assert_eq!(profile.nested, vec![DeclaredName::new("io.test", "Profile").nested("Patch")]);

    let patch = types.find("Patch").expect("patch form");
    assert_eq!(patch.kind, TypeKind::Class);
    let fields: Vec<(&str, String, bool)> = patch
        .properties
        .iter()
        .map(|p| (p.name.as_str(), p.type_name.to_string(), p.required))
        .collect();
    assert_eq!(
        fields,
        vec![
            ("name", "String??".to_string(), false),
            ("age", "Int32??".to_string(), false),
        ]
    );
}

#[test]
fn computed_properties_carry_their_code() {
    let documents = load(
        r#"
types:
  Window:
    properties:
      width: number
      height: number
      area:
        type: number
        annotations:
          jvmImplementation:
            code: "return %T.area(width, height, %L)"
            parameters:
              - type: Type
                value: io.test.Geometry
              - type: Literal
                value: 2
      label:
        type: string
        annotations:
          swiftImplementation:
            code: ignored here
    annotations:
      patchable: true
"#,
    );
    let mut registry = registry();
    resolve(&documents, &mut registry, "Window").expect("should resolve");
    let types = registry.build_types().expect("should build");

    let window = types.find("Window").expect("model");
    assert_eq!(
        window.property("area").and_then(|p| p.implementation.clone()),
        Some(PropertyImplementation {
            code: "return %T.area(width, height, %L)".into(),
            parameters: vec![
                CodeParameter::Type(declared("io.test", &["Geometry"])),
                CodeParameter::Literal("2".into()),
            ],
        })
    );
    assert_eq!(window.property("label").and_then(|p| p.implementation.clone()), None);

    let patch = types.find("Patch").expect("patch form");
    let names: Vec<&str> = patch.properties.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["width", "height", "label"]);
}

#[test]
fn implementations_must_be_objects() {
    let documents = load(
        r#"
types:
  Window:
    properties:
      area:
        type: number
        annotations:
          jvmImplementation: width * height
"#,
    );
    let err = resolve(&documents, &mut registry(), "Window").expect_err("bad annotation");
    assert!(matches!(
        err,
        ResolveError::InvalidAnnotation { annotation: "jvmImplementation", .. }
    ));
}

#[test]
fn shapes_without_registration() {
    let documents = load(
        r#"
types:
  Pet:
    properties:
      name: string
  Holder:
    properties:
      maybe:
        anyOf: [string, nil]
      meta:
        type: object
        additionalProperties: string
      anything:
        type: object
        additionalProperties: true
      same:
        type: Pet
        properties: {}
      tags:
        type: array
        uniqueItems: true
        items: string
      when: datetime
      blob: file
"#,
    );
    let mut registry = registry();
    resolve(&documents, &mut registry, "Holder").expect("should resolve");
    let types = registry.build_types().expect("should build");
    assert_eq!(types.len(), 2);

    let holder = types.find("Holder").expect("holder");
    let type_of = |name: &str| {
        holder
            .property(name)
            .map(|p| p.type_name.to_string())
            .unwrap_or_default()
    };
    assert_eq!(type_of("maybe"), "String?");
    assert_eq!(type_of("meta"), "Map<String, String>");
    assert_eq!(type_of("anything"), "Map<String, Any>");
    assert_eq!(type_of("same"), "io.test.Pet");
    assert_eq!(type_of("tags"), "Set<String>");
    assert_eq!(type_of("when"), "DateTime");
    assert_eq!(type_of("blob"), "Bytes");
}

#[test]
fn unsupported_scalar_formats_fail() {
    let documents = load(
        r#"
types:
  Counter:
    properties:
      count:
        type: integer
        format: int128
"#,
    );
    let err = resolve(&documents, &mut registry(), "Counter").expect_err("bad format");
    assert!(err.to_string().ends_with("Integer format 'int128' is unsupported"));
}

#[test]
fn type_overrides_replace_resolution() {
    let documents = load(
        r#"
types:
  Instant:
    type: string
    annotations:
      jvmType: java.time.Instant
"#,
    );
    let mut registry = registry();
    let name = resolve(&documents, &mut registry, "Instant").expect("should resolve");
    assert_eq!(name, declared("java.time", &["Instant"]));
    assert!(registry.is_empty());
}

#[test]
fn inline_properties_nest_in_their_owner() {
    let documents = load(
        r#"
types:
  Person:
    properties:
      home_address:
        properties:
          street: string
"#,
    );
    let mut registry = registry();
    resolve(&documents, &mut registry, "Person").expect("should resolve");
    let types = registry.build_types().expect("should build");
    let person = types.find("Person").expect("person");
    let address = person.property("home_address").expect("address");
    assert_eq!(address.identifier, "homeAddress");
    assert_eq!(address.type_name, declared("io.test", &["Person", "HomeAddress"]));
    assert_eq!(person.nested.len(), 1);
    assert_eq!(types.top_level().count(), 1);
}

#[test]
fn constraints_follow_enabled_features() {
    let documents = load(
        r#"
types:
  Limits:
    properties:
      name:
        type: string
        minLength: 1
        maxLength: 10
        pattern: ".*"
      count:
        type: integer
        minimum: 0
      ratio:
        type: number
        maximum: 1.5
"#,
    );
    let mut registry = registry_with(
        TestTarget::default(),
        FeatureSet::with([TestFeature::Model, TestFeature::Validation]),
    );
    resolve(&documents, &mut registry, "Limits").expect("should resolve");
    let types = registry.build_types().expect("should build");
    let limits = types.find("Limits").expect("limits");
    let constraints = |name: &str| limits.property(name).map(|p| p.annotations.clone()).unwrap_or_default();

    assert_eq!(
        constraints("name"),
        vec![FeatureAnnotation::Constraint(Constraint::Size {
            min: Some(1),
            max: Some(10)
        })]
    );
    assert_eq!(
        constraints("count"),
        vec![FeatureAnnotation::Constraint(Constraint::Min { value: 0 })]
    );
    assert_eq!(
        constraints("ratio"),
        vec![FeatureAnnotation::Constraint(Constraint::DecimalMax {
            value: "1.5".into()
        })]
    );
}

#[test]
fn library_types_resolve_across_documents() {
    let mut loader = Loader::new();
    loader
        .add_source(
            "api.yaml",
            r#"
uses:
  common: common.yaml
types:
  Failure:
    properties:
      error: common.Error
"#,
        )
        .expect("primary");
    loader
        .add_library(
            "common.yaml",
            r#"
annotations:
  modelPackage: io.common
types:
  Error:
    properties:
      message: string
"#,
        )
        .expect("library");
    let documents = loader.finish().expect("should lower");

    let mut registry = registry();
    resolve(&documents, &mut registry, "Failure").expect("should resolve");
    let types = registry.build_types().expect("should build");
    assert_eq!(
        types
            .find("Failure")
            .and_then(|f| f.property("error"))
            .map(|p| p.type_name.clone()),
        Some(declared("io.common", &["Error"]))
    );
}

#[test]
fn problem_types_carry_constants_and_custom_fields() {
    let documents = load(
        r#"
types:
  Pet:
    properties:
      name: string
"#,
    );
    let resolver = ShapeResolver::new(&documents);
    let mut registry = registry();
    let mut guard = RecursionGuard::new();
    let base = Url::parse(DEFAULT_PROBLEM_BASE).expect("base");
    let problem = ProblemTypeDefinition::from_annotation(
        "invalid_id",
        &json!({
            "status": 400,
            "title": "Invalid Id",
            "detail": "The id contains one or more invalid characters.",
            "custom": { "offendingId": "string", "count": "integer?", "pet": "Pet" },
        }),
        &base,
        DocumentId(0),
        Location::new("api.yaml", "/annotations/problemTypes/invalid_id"),
    )
    .expect("problem");

    let name = resolver
        .define_problem_type(&mut registry, &mut guard, &problem)
        .expect("should define");
    assert_eq!(name.qualified(), "io.test.InvalidIdProblem");

    let types = registry.build_types().expect("should build");
    let definition = types.get(&name).expect("problem type");
    assert_eq!(definition.kind, TypeKind::Problem);
    assert_eq!(definition.supertypes, vec![declared("test.runtime", &["Problem"])]);
    assert_eq!(definition.constants[0].value, json!("http://example.com/invalid_id"));
    let fields: Vec<String> = definition
        .properties
        .iter()
        .map(|p| format!("{}: {}", p.name, p.type_name))
        .collect();
    assert_eq!(
        fields,
        vec!["offendingId: String", "count: Int32?", "pet: io.test.Pet"]
    );

    let err = resolver
        .resolve_type_reference(
            &mut self::registry(),
            &mut guard,
            DocumentId(0),
            "Nope",
            &Location::default(),
        )
        .expect_err("unknown type");
    assert!(matches!(err, ResolveError::InvalidTypeReference { .. }));
}
