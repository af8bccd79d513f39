//! What differs between targets: builtin types, identifier rules, option
//! flags and the metadata those options attach.

use std::collections::BTreeSet;
use std::fmt::Debug;
use std::hash::Hash;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::ir::{Constraint, PropertyDefinition, TypeDefinition, TypeKind, TypeName};
use crate::naming;
use crate::problem::rfc::ProblemLibrary;
use crate::schema::AnnotationName;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenerationMode {
    #[default]
    Client,
    Server,
}

impl GenerationMode {
    pub fn id(self) -> &'static str {
        match self {
            Self::Client => "client",
            Self::Server => "server",
        }
    }
}

/// One row of a target's option table.
#[derive(Debug)]
pub struct FeatureSpec<F: 'static> {
    pub feature: F,
    pub cli_name: &'static str,
    pub description: &'static str,
    pub enabled_by_default: bool,
    /// Options that must also be enabled.
    pub requires: &'static [F],
}

/// A target's closed set of option flags.
pub trait Feature: Copy + Ord + Hash + Debug + 'static {
    const TABLE: &'static [FeatureSpec<Self>];

    fn spec(self) -> Option<&'static FeatureSpec<Self>> {
        Self::TABLE.iter().find(|spec| spec.feature == self)
    }

    fn cli_name(self) -> &'static str {
        self.spec().map(|spec| spec.cli_name).unwrap_or_default()
    }

    fn from_cli_name(name: &str) -> Option<Self> {
        Self::TABLE
            .iter()
            .find(|spec| spec.cli_name == name)
            .map(|spec| spec.feature)
    }
}

/// Enabled options; fixed for the lifetime of a registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureSet<F: Feature> {
    enabled: BTreeSet<F>,
}

impl<F: Feature> Default for FeatureSet<F> {
    fn default() -> Self {
        Self::defaults()
    }
}

impl<F: Feature> FeatureSet<F> {
    pub fn empty() -> Self {
        Self {
            enabled: BTreeSet::new(),
        }
    }

    pub fn defaults() -> Self {
        Self {
            enabled: F::TABLE
                .iter()
                .filter(|spec| spec.enabled_by_default)
                .map(|spec| spec.feature)
                .collect(),
        }
    }

    pub fn with(features: impl IntoIterator<Item = F>) -> Self {
        Self {
            enabled: features.into_iter().collect(),
        }
    }

    /// Defaults plus `enable`, minus `disable`; disabling wins. Unknown names
    /// and unmet requirements are configuration errors.
    pub fn from_cli_names<S: AsRef<str>>(enable: &[S], disable: &[S]) -> Result<Self, ConfigError> {
        let mut set = Self::defaults();
        for name in enable {
            set.enabled.insert(lookup::<F>(name.as_ref())?);
        }
        for name in disable {
            set.enabled.remove(&lookup::<F>(name.as_ref())?);
        }
        set.validate()?;
        Ok(set)
    }

    pub fn contains(&self, feature: F) -> bool {
        self.enabled.contains(&feature)
    }

    pub fn iter(&self) -> impl Iterator<Item = F> + '_ {
        self.enabled.iter().copied()
    }

    /// Reports every enabled option whose requirements are disabled.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let problems: Vec<String> = self
            .enabled
            .iter()
            .filter_map(|feature| feature.spec())
            .flat_map(|spec| {
                spec.requires
                    .iter()
                    .filter(|required| !self.enabled.contains(required))
                    .map(move |required| {
                        format!("{} requires {}", spec.cli_name, required.cli_name())
                    })
            })
            .collect();
        if problems.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::InvalidOptions { problems })
        }
    }
}

fn lookup<F: Feature>(name: &str) -> Result<F, ConfigError> {
    F::from_cli_name(name).ok_or_else(|| ConfigError::UnknownOption {
        name: name.to_string(),
        known: F::TABLE.iter().map(|spec| spec.cli_name.to_string()).collect(),
    })
}

/// Scalar categories after format checks; targets map each to a builtin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Primitive {
    Boolean,
    Int8,
    Int16,
    Int32,
    Int64,
    Float,
    Double,
    Decimal,
    String,
    Date,
    Time,
    DateTimeOnly,
    DateTime,
    Duration,
    Uuid,
    Uri,
    Bytes,
}

/// Target-specific policy consulted by the resolver and the drivers.
pub trait TargetProfile {
    type Feature: Feature;

    fn name(&self) -> &'static str;

    /// Annotation that replaces resolution with a target type name.
    fn type_override(&self) -> AnnotationName;

    /// Annotation carrying the code of a computed property.
    fn implementation_override(&self) -> AnnotationName;

    fn primitive(&self, primitive: Primitive) -> TypeName;

    fn supports_structural_unions(&self) -> bool;

    fn reserved_words(&self) -> &'static [&'static str];

    fn problem_library(&self) -> &ProblemLibrary;

    fn any(&self) -> TypeName {
        TypeName::Any
    }

    fn enum_case_name(&self, literal: &str) -> String {
        naming::legal_identifier(&naming::enum_case_name(literal), self.reserved_words())
    }

    fn property_identifier(&self, name: &str) -> String {
        naming::legal_identifier(&naming::to_lower_camel_case(name), self.reserved_words())
    }

    fn model_kind(&self, _features: &FeatureSet<Self::Feature>) -> TypeKind {
        TypeKind::Class
    }

    /// Field type of a patch: absent leaves the value alone, an empty
    /// optional clears it.
    fn patch_value(&self, value: TypeName) -> TypeName {
        TypeName::Optional {
            wrapped: Box::new(value.optional()),
        }
    }

    /// Attaches type-level metadata once the definition is final.
    fn decorate_type(&self, _features: &FeatureSet<Self::Feature>, _definition: &mut TypeDefinition) {}

    /// Attaches property-level metadata; `constraints` are the candidates
    /// derived from the schema facets.
    fn decorate_property(
        &self,
        _features: &FeatureSet<Self::Feature>,
        _property: &mut PropertyDefinition,
        _constraints: &[Constraint],
    ) {
    }
}
