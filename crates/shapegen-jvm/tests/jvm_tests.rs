use shapegen_core::ir::{
    CodecAnnotation, Constraint, FeatureAnnotation, Implementation, MethodModifier,
    ParameterLocation, TypeKind, TypeName,
};
use shapegen_core::parse::Loader;
use shapegen_core::schema::DocumentSet;
use shapegen_core::target::{FeatureSet, GenerationMode};
use shapegen_core::{GeneratedTypes, GenerationOptions, generate};
use shapegen_jvm::{JaxRsDriver, JvmOption, JvmProblemLibrary, JvmTarget, ReactiveDriver};

const ZOO: &str = include_str!("fixtures/zoo.yaml");
const FEEDS: &str = include_str!("fixtures/feeds.yaml");

fn load(file: &str, text: &str) -> DocumentSet {
    let mut loader = Loader::new();
    loader.add_source(file, text).unwrap();
    loader.finish().unwrap()
}

fn zoo() -> DocumentSet {
    load("zoo.yaml", ZOO)
}

fn feeds(mode: GenerationMode) -> GeneratedTypes {
    let documents = load("feeds.yaml", FEEDS);
    generate(&documents, &options(mode), JvmTarget::default(), FeatureSet::defaults(), &JaxRsDriver)
        .unwrap()
        .types
}

fn options(mode: GenerationMode) -> GenerationOptions {
    let mut options = GenerationOptions::new("io.zoo").unwrap();
    options.mode = mode;
    options
}

fn jaxrs(mode: GenerationMode, features: FeatureSet<JvmOption>) -> GeneratedTypes {
    generate(&zoo(), &options(mode), JvmTarget::default(), features, &JaxRsDriver)
        .unwrap()
        .types
}

fn codecs(annotations: &[FeatureAnnotation]) -> Vec<&CodecAnnotation> {
    annotations
        .iter()
        .filter_map(|annotation| match annotation {
            FeatureAnnotation::Codec(codec) => Some(codec),
            _ => None,
        })
        .collect()
}

#[test]
fn jackson_metadata_describes_the_hierarchy() {
    let types = jaxrs(GenerationMode::Server, FeatureSet::defaults());

    let animal = types.find("Animal").unwrap();
    assert_eq!(animal.kind, TypeKind::Sealed);
    let animal_codecs = codecs(&animal.annotations);
    assert!(matches!(
        animal_codecs.as_slice(),
        [CodecAnnotation::TypeInfo { property, external: false }, CodecAnnotation::SubTypes { variants }]
            if property == "kind" && variants.len() == 1
    ));

    let lion = types.find("Lion").unwrap();
    assert_eq!(
        codecs(&lion.annotations),
        vec![&CodecAnnotation::TypeId { value: "lion".into() }]
    );
    let pride = lion.property("pride_size").unwrap();
    assert_eq!(pride.identifier, "prideSize");
    assert_eq!(
        codecs(&pride.annotations),
        vec![&CodecAnnotation::WireName { name: "pride_size".into() }]
    );
    assert_eq!(pride.type_name.to_string(), "kotlin.Int");
}

#[test]
fn validation_constraints_are_opt_in() {
    let types = jaxrs(GenerationMode::Server, FeatureSet::defaults());
    let keeper = types.find("Keeper").unwrap();
    assert!(
        keeper
            .properties
            .iter()
            .all(|p| !p.annotations.iter().any(|a| matches!(a, FeatureAnnotation::Constraint(_))))
    );

    let features = FeatureSet::from_cli_names(&["validation-constraints"], &[]).unwrap();
    let types = jaxrs(GenerationMode::Server, features);
    let keeper = types.find("Keeper").unwrap();
    let constraints = |name: &str| -> Vec<FeatureAnnotation> {
        keeper.property(name).map(|p| p.annotations.clone()).unwrap_or_default()
    };
    assert_eq!(
        constraints("name"),
        vec![FeatureAnnotation::Constraint(Constraint::Pattern { regex: "^[A-Z]".into() })]
    );
    assert_eq!(
        constraints("favorite"),
        vec![FeatureAnnotation::Constraint(Constraint::Valid)]
    );
}

#[test]
fn jaxrs_server_stubs_are_abstract() {
    let types = jaxrs(GenerationMode::Server, FeatureSet::defaults());

    let api = types.find("API").unwrap();
    assert_eq!(api.kind, TypeKind::Interface);
    assert!(api.is_abstract);

    let fetch = api.methods.iter().find(|m| m.name == "fetchAnimal").unwrap();
    assert_eq!(fetch.implementation, Implementation::Abstract);
    assert_eq!(fetch.return_type.to_string(), "jakarta.ws.rs.core.Response");
    assert_eq!(
        fetch.problems.get("closed").map(|p| p.type_name.to_string()),
        Some("io.zoo.ClosedProblem".to_string())
    );

    let remove = api.methods.iter().find(|m| m.name == "removeAnimal").unwrap();
    assert_eq!(remove.modifiers, vec![MethodModifier::Reactive]);
    assert_eq!(
        remove.return_type.to_string(),
        "java.util.concurrent.CompletionStage<jakarta.ws.rs.core.Response>"
    );

    assert!(types.find("StaffAPI").is_some());
    let closed = types.find("ClosedProblem").unwrap();
    assert_eq!(
        closed.supertypes.first().map(ToString::to_string).as_deref(),
        Some("io.quarkiverse.resteasy.problem.HttpProblem")
    );
}

#[test]
fn reactive_clients_wrap_results() {
    let types = generate(
        &zoo(),
        &options(GenerationMode::Client),
        JvmTarget::new(JvmProblemLibrary::Sunday),
        FeatureSet::defaults(),
        &ReactiveDriver,
    )
    .unwrap()
    .types;

    let api = types.find("API").unwrap();
    assert_eq!(api.kind, TypeKind::Class);
    let fetch = api.methods.iter().find(|m| m.name == "fetchAnimal").unwrap();
    assert_eq!(fetch.return_type.to_string(), "io.smallrye.mutiny.Uni<io.zoo.Animal>");
    assert_eq!(
        fetch.implementation,
        Implementation::RequestExecution {
            collaborator: "io.outfoxx.sunday.RequestFactory".into()
        }
    );

    let keepers = types
        .find("StaffAPI")
        .and_then(|staff| staff.methods.first())
        .unwrap();
    insta::assert_snapshot!(
        keepers.return_type.to_string(),
        @"io.smallrye.mutiny.Uni<List<io.zoo.Keeper>>"
    );

    let closed = types.find("ClosedProblem").unwrap();
    assert_eq!(
        closed.supertypes.first().map(ToString::to_string).as_deref(),
        Some("io.outfoxx.sunday.problems.SundayHttpProblem")
    );
}

#[test]
fn asynchronous_servers_resume_through_the_injected_response() {
    let types = feeds(GenerationMode::Server);
    let api = types.find("API").unwrap();
    let import = api.methods.iter().find(|m| m.name == "importEntries").unwrap();

    assert_eq!(import.modifiers, vec![MethodModifier::Asynchronous]);
    assert_eq!(import.return_type, TypeName::Unit);
    assert_eq!(
        import.body.as_ref().map(|b| b.type_name.to_string()).as_deref(),
        Some("com.fasterxml.jackson.databind.JsonNode")
    );
    let injected = import.parameter("asyncResponse").unwrap();
    assert_eq!(injected.location, ParameterLocation::Context);
    assert_eq!(injected.type_name.to_string(), "jakarta.ws.rs.container.AsyncResponse");
}

#[test]
fn sse_methods_stream_through_the_framework() {
    let server = feeds(GenerationMode::Server);
    let watch = server
        .find("API")
        .and_then(|api| api.methods.iter().find(|m| m.name == "watchEntries"))
        .unwrap();
    assert_eq!(watch.return_type, TypeName::Unit);
    assert_eq!(watch.accept_types, vec!["text/event-stream".to_string()]);
    let injected: Vec<(&str, String)> = watch
        .parameters
        .iter()
        .filter(|p| p.location == ParameterLocation::Context)
        .map(|p| (p.identifier.as_str(), p.type_name.to_string()))
        .collect();
    assert_eq!(
        injected,
        vec![
            ("sse", "jakarta.ws.rs.sse.Sse".to_string()),
            ("sseEvents", "jakarta.ws.rs.sse.SseEventSink".to_string()),
        ]
    );

    let client = feeds(GenerationMode::Client);
    let api = client.find("API").unwrap();
    let watch = api.methods.iter().find(|m| m.name == "watchEntries").unwrap();
    assert_eq!(watch.return_type.to_string(), "jakarta.ws.rs.sse.SseEventSource");
    let import = api.methods.iter().find(|m| m.name == "importEntries").unwrap();
    assert!(import.parameter("asyncResponse").is_none());
}

#[test]
fn patch_forms_wrap_fields_in_optionals() {
    let types = feeds(GenerationMode::Server);

    let entry = types.find("Entry").unwrap();
    let headline = entry.property("headline").unwrap();
    assert!(headline.implementation.is_some());
    assert_eq!(
        codecs(&headline.annotations),
        vec![&CodecAnnotation::Ignored]
    );

    let patch = types.find("Patch").unwrap();
    assert_eq!(patch.name.qualified(), "io.zoo.Entry.Patch");
    let fields: Vec<(&str, String)> = patch
        .properties
        .iter()
        .map(|p| (p.name.as_str(), p.type_name.to_string()))
        .collect();
    assert_eq!(
        fields,
        vec![
            ("title", "java.util.Optional<kotlin.String>?".to_string()),
            ("summary", "java.util.Optional<kotlin.String>?".to_string()),
        ]
    );
}
