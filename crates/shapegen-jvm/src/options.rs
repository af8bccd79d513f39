use shapegen_core::target::{Feature, FeatureSpec};

/// Code generation options of the JVM target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum JvmOption {
    ImplementModel,
    JacksonAnnotations,
    ValidationConstraints,
    AddGeneratedAnnotation,
    SuppressPublicApiWarnings,
}

impl Feature for JvmOption {
    const TABLE: &'static [FeatureSpec<Self>] = &[
        FeatureSpec {
            feature: Self::ImplementModel,
            cli_name: "implement-model",
            description: "Generate concrete model classes instead of interfaces",
            enabled_by_default: true,
            requires: &[],
        },
        FeatureSpec {
            feature: Self::JacksonAnnotations,
            cli_name: "jackson-annotations",
            description: "Attach Jackson wire-name and polymorphism metadata",
            enabled_by_default: true,
            requires: &[],
        },
        FeatureSpec {
            feature: Self::ValidationConstraints,
            cli_name: "validation-constraints",
            description: "Attach bean validation constraints derived from schema facets",
            enabled_by_default: false,
            requires: &[Self::ImplementModel],
        },
        FeatureSpec {
            feature: Self::AddGeneratedAnnotation,
            cli_name: "add-generated-annotation",
            description: "Mark top-level types as generated",
            enabled_by_default: false,
            requires: &[],
        },
        FeatureSpec {
            feature: Self::SuppressPublicApiWarnings,
            cli_name: "suppress-public-api-warnings",
            description: "Suppress explicit-API warnings on top-level types",
            enabled_by_default: false,
            requires: &[],
        },
    ];
}
