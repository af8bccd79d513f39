//! One generation invocation from loaded documents to the finished model.

use log::{debug, info};
use url::Url;

use crate::driver::{DriverContext, ServiceAssembler, ServiceDriver};
use crate::error::{ConfigError, GenerationError};
use crate::parse::{ValidationEntry, has_errors, validate};
use crate::problem::{DEFAULT_PROBLEM_BASE, ProblemRfc, find_problem_types};
use crate::registry::{GeneratedTypes, TypeRegistry};
use crate::resolve::{RecursionGuard, ResolutionContext, ShapeResolver};
use crate::schema::DocumentSet;
use crate::target::{FeatureSet, GenerationMode, TargetProfile};

/// Caller settings for one invocation.
#[derive(Debug, Clone)]
pub struct GenerationOptions {
    pub package: String,
    pub model_package: Option<String>,
    pub service_package: Option<String>,
    pub problem_base: Url,
    pub mode: GenerationMode,
    /// Media type priority, most preferred first.
    pub media_types: Vec<String>,
    pub service_suffix: String,
    pub problem_rfc: ProblemRfc,
}

impl GenerationOptions {
    pub fn new(package: impl Into<String>) -> Result<Self, ConfigError> {
        Ok(Self {
            package: package.into(),
            model_package: None,
            service_package: None,
            problem_base: parse_problem_base(DEFAULT_PROBLEM_BASE)?,
            mode: GenerationMode::Client,
            media_types: Vec::new(),
            service_suffix: "API".to_string(),
            problem_rfc: ProblemRfc::default(),
        })
    }

    pub fn model_package(&self) -> &str {
        self.model_package.as_deref().unwrap_or(&self.package)
    }

    pub fn service_package(&self) -> &str {
        self.service_package.as_deref().unwrap_or(&self.package)
    }
}

/// Parses an absolute problem base URI.
pub fn parse_problem_base(uri: &str) -> Result<Url, ConfigError> {
    Url::parse(uri).map_err(|err| ConfigError::InvalidUri {
        uri: uri.to_string(),
        reason: err.to_string(),
    })
}

/// Result of a successful invocation.
#[derive(Debug)]
pub struct Generation {
    pub types: GeneratedTypes,
    /// Non-error findings of the validation pass.
    pub diagnostics: Vec<ValidationEntry>,
}

/// Validates `documents`, then resolves every primary document in order into
/// one registry and builds it.
///
/// The first failure aborts the whole invocation; nothing is returned for
/// documents processed before it.
pub fn generate<T, D>(
    documents: &DocumentSet,
    options: &GenerationOptions,
    profile: T,
    features: FeatureSet<T::Feature>,
    driver: &D,
) -> Result<Generation, GenerationError>
where
    T: TargetProfile,
    D: ServiceDriver<T>,
{
    features.validate()?;
    profile.problem_library().validate_compliance(options.problem_rfc)?;

    let diagnostics = validate(documents);
    if has_errors(&diagnostics) {
        return Err(GenerationError::Validation(diagnostics));
    }

    info!(
        "{}/{}: generating {} mode into {}",
        profile.name(),
        driver.name(),
        options.mode.id(),
        options.package
    );

    let context = DriverContext {
        service_package: options.service_package().to_string(),
        service_suffix: options.service_suffix.clone(),
        media_types: options.media_types.clone(),
    };
    let mut registry = TypeRegistry::new(profile, features, options.mode, options.model_package());
    let mut guard = RecursionGuard::new();

    for document in documents.primaries() {
        info!("processing {}", document.file);
        let resolver = ShapeResolver::new(documents);

        for problem in find_problem_types(documents, document, &options.problem_base)?.values() {
            resolver.define_problem_type(&mut registry, &mut guard, problem)?;
        }

        let services = ServiceAssembler::new(resolver, driver, &context)
            .assemble(&mut registry, &mut guard, document)?;
        debug!("{}: {} service type(s)", document.file, services.len());

        let resolver = ShapeResolver::new(documents);
        let ctx = ResolutionContext::new(document.id);
        for shape in document.types.values() {
            resolver.resolve_type_name(&mut registry, &mut guard, *shape, &ctx)?;
        }
    }

    let types = registry.build_types()?;
    info!("generated {} type(s)", types.len());
    Ok(Generation { types, diagnostics })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::logical_return_type;
    use crate::ir::{MethodModifier, ResponseKind, TypeName};
    use crate::parse::Loader;
    use crate::target::testing::{TestFeature, TestTarget};

    struct PlainDriver;

    impl ServiceDriver<TestTarget> for PlainDriver {
        fn name(&self) -> &'static str {
            "plain"
        }

        fn request_executor(&self) -> &'static str {
            "test.runtime.RequestExecutor"
        }

        fn return_type(
            &self,
            profile: &TestTarget,
            _mode: GenerationMode,
            response: &ResponseKind,
            _modifiers: &[MethodModifier],
        ) -> TypeName {
            logical_return_type(response, profile.any())
        }
    }

    fn load(sources: &[(&str, &str)]) -> DocumentSet {
        let mut loader = Loader::new();
        for (file, text) in sources {
            loader.add_source(file, text).expect("should parse");
        }
        loader.finish().expect("should lower")
    }

    fn run(documents: &DocumentSet, options: &GenerationOptions) -> Result<Generation, GenerationError> {
        generate(documents, options, TestTarget::default(), FeatureSet::defaults(), &PlainDriver)
    }

    #[test]
    fn packages_default_to_the_base_package() {
        let mut options = GenerationOptions::new("io.test").expect("options");
        assert_eq!(options.model_package(), "io.test");
        assert_eq!(options.service_package(), "io.test");

        options.model_package = Some("io.test.model".into());
        assert_eq!(options.model_package(), "io.test.model");
        assert_eq!(options.problem_base.as_str(), "http://example.com/");
    }

    #[test]
    fn model_only_documents_produce_types() {
        let documents = load(&[(
            "api.yaml",
            r#"
types:
  Pet:
    properties:
      name: string
"#,
        )]);
        let generation = run(&documents, &GenerationOptions::new("io.test").expect("options"))
            .expect("should generate");
        assert!(generation.types.find("Pet").is_some());
    }

    #[test]
    fn validation_errors_abort_before_resolution() {
        let documents = load(&[(
            "api.yaml",
            r#"
types:
  Empty:
    enum: []
"#,
        )]);
        let err = run(&documents, &GenerationOptions::new("io.test").expect("options"))
            .expect_err("empty enum");
        let GenerationError::Validation(entries) = err else {
            panic!("expected validation failure");
        };
        assert!(has_errors(&entries));
    }

    #[test]
    fn invalid_feature_combinations_fail_first() {
        let documents = load(&[("api.yaml", "types: {}")]);
        let features = FeatureSet::with([TestFeature::Validation]);
        let err = generate(
            &documents,
            &GenerationOptions::new("io.test").expect("options"),
            TestTarget::default(),
            features,
            &PlainDriver,
        )
        .expect_err("validation requires model");
        assert!(matches!(err, GenerationError::Config(ConfigError::InvalidOptions { .. })));
    }

    #[test]
    fn a_failing_document_aborts_the_whole_invocation() {
        let documents = load(&[
            (
                "a.yaml",
                r#"
types:
  Good:
    properties:
      name: string
"#,
            ),
            (
                "b.yaml",
                r#"
types:
  Bad:
    type: integer
    format: int128
"#,
            ),
        ]);
        let err = run(&documents, &GenerationOptions::new("io.test").expect("options"))
            .expect_err("int128 is unsupported");
        assert!(matches!(
            err,
            GenerationError::Resolve(crate::error::ResolveError::UnsupportedIntegerFormat { .. })
        ));
    }

    #[test]
    fn problem_types_do_not_replace_declared_models() {
        let documents = load(&[
            (
                "a.yaml",
                r#"
types:
  InvalidIdProblem:
    properties:
      reason: string
  Holder:
    properties:
      p: InvalidIdProblem
"#,
            ),
            (
                "b.yaml",
                r#"
annotations:
  problemTypes:
    invalid_id:
      status: 400
      title: Invalid Id
      detail: The id is not valid.
"#,
            ),
        ]);
        let err = run(&documents, &GenerationOptions::new("io.test").expect("options"))
            .expect_err("name already taken");
        assert!(matches!(
            err,
            GenerationError::Resolve(crate::error::ResolveError::DuplicateTypeName { ref name, .. })
                if name == "InvalidIdProblem"
        ));
    }

    #[test]
    fn problem_base_must_be_absolute() {
        let err = parse_problem_base("relative/path").expect_err("not absolute");
        assert!(matches!(err, ConfigError::InvalidUri { .. }));
    }
}
