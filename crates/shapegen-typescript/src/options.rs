use shapegen_core::target::{Feature, FeatureSpec};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TypeScriptOption {
    JacksonDecorators,
    AddGenerationHeader,
}

impl Feature for TypeScriptOption {
    const TABLE: &'static [FeatureSpec<Self>] = &[
        FeatureSpec {
            feature: Self::JacksonDecorators,
            cli_name: "jackson-decorators",
            description: "Generate decorated model classes for jackson-js",
            enabled_by_default: true,
            requires: &[],
        },
        FeatureSpec {
            feature: Self::AddGenerationHeader,
            cli_name: "add-generation-header",
            description: "Prefix top-level types with a generation header",
            enabled_by_default: true,
            requires: &[],
        },
    ];
}
