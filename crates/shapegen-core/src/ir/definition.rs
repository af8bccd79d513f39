use serde::Serialize;
use serde_json::Value;

use super::method::MethodDescriptor;
use super::types::{DeclaredName, TypeName};
use crate::error::Location;
use crate::problem::ProblemTypeDefinition;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum TypeKind {
    Class,
    Interface,
    Enum,
    /// Base of a discriminated hierarchy.
    Sealed,
    Service,
    Problem,
    /// Named stand-in for another type, such as a declared structural union.
    Alias,
}

/// Partition a consumer can emit on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum TypeCategory {
    Model,
    Service,
}

/// Target-agnostic description of one generated type.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeDefinition {
    pub name: DeclaredName,
    pub kind: TypeKind,
    pub category: TypeCategory,
    pub is_abstract: bool,
    pub supertypes: Vec<TypeName>,
    pub properties: Vec<PropertyDefinition>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub enum_cases: Vec<EnumCase>,
    /// Type of the raw enum values.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_value_type: Option<TypeName>,
    /// Type an alias stands for.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aliased: Option<TypeName>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discriminator: Option<DiscriminatorDefinition>,
    /// Value selecting this type within its discriminated hierarchy.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discriminator_value: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub variants: Vec<VariantDefinition>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub methods: Vec<MethodDescriptor>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub constants: Vec<ConstantDefinition>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub problem: Option<ProblemTypeDefinition>,
    /// Filled by the registry when types are built.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub nested: Vec<DeclaredName>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub annotations: Vec<FeatureAnnotation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub documentation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<Location>,
}

impl TypeDefinition {
    pub fn new(name: DeclaredName, kind: TypeKind, category: TypeCategory) -> Self {
        Self {
            name,
            kind,
            category,
            is_abstract: false,
            supertypes: Vec::new(),
            properties: Vec::new(),
            enum_cases: Vec::new(),
            raw_value_type: None,
            aliased: None,
            discriminator: None,
            discriminator_value: None,
            variants: Vec::new(),
            methods: Vec::new(),
            constants: Vec::new(),
            problem: None,
            nested: Vec::new(),
            annotations: Vec::new(),
            documentation: None,
            source: None,
        }
    }

    pub fn property(&self, name: &str) -> Option<&PropertyDefinition> {
        self.properties.iter().find(|p| p.name == name)
    }

    pub fn type_name(&self) -> TypeName {
        TypeName::Declared(self.name.clone())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyDefinition {
    /// Name on the wire.
    pub name: String,
    /// Name in generated code.
    pub identifier: String,
    pub type_name: TypeName,
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub documentation: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub annotations: Vec<FeatureAnnotation>,
    /// Computed from hand-written code instead of being stored.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub implementation: Option<PropertyImplementation>,
}

/// Code body of a computed property.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PropertyImplementation {
    /// Statement template; placeholders take `parameters` in order.
    pub code: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<CodeParameter>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "camelCase")]
pub enum CodeParameter {
    Type(TypeName),
    Literal(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnumCase {
    pub identifier: String,
    pub value: Value,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiscriminatorDefinition {
    pub property: String,
    /// The discriminator travels outside the payload, on the containing object.
    pub external: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VariantDefinition {
    pub value: String,
    pub type_name: TypeName,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConstantDefinition {
    pub name: String,
    pub type_name: TypeName,
    pub value: Value,
}

/// Metadata a target attaches when the matching option is enabled.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "annotation", rename_all = "camelCase")]
pub enum FeatureAnnotation {
    Generated { generator: String },
    SuppressWarnings { warnings: Vec<String> },
    Codec(CodecAnnotation),
    Constraint(Constraint),
}

/// Serialization metadata.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "codec", rename_all = "camelCase")]
pub enum CodecAnnotation {
    /// Wire name differs from the identifier.
    WireName { name: String },
    /// Polymorphic type info on a discriminated base.
    TypeInfo { property: String, external: bool },
    SubTypes { variants: Vec<VariantDefinition> },
    /// Discriminator value of a concrete variant.
    TypeId { value: String },
    /// Property whose concrete type is selected by a sibling property.
    ExternalTypeId { property: String },
    /// Enum case raw value.
    RawValue { value: Value },
    /// Left out of the wire form.
    Ignored,
}

/// Validation metadata derived from schema facets.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "constraint", rename_all = "camelCase")]
pub enum Constraint {
    Size { min: Option<u64>, max: Option<u64> },
    Pattern { regex: String },
    Min { value: i64 },
    Max { value: i64 },
    DecimalMin { value: String },
    DecimalMax { value: String },
    /// Cascade validation into a nested model.
    Valid,
}
