use shapegen_core::target::{Feature, FeatureSpec};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SwiftOption {
    AddGeneratedHeader,
}

impl Feature for SwiftOption {
    const TABLE: &'static [FeatureSpec<Self>] = &[FeatureSpec {
        feature: Self::AddGeneratedHeader,
        cli_name: "add-generated-header",
        description: "Prefix top-level types with a generation header",
        enabled_by_default: true,
        requires: &[],
    }];
}
