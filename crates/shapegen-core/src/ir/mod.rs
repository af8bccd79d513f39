//! The produced type model handed to renderers.

pub mod definition;
pub mod method;
pub mod types;

pub use definition::{
    CodeParameter, CodecAnnotation, ConstantDefinition, Constraint, DiscriminatorDefinition,
    EnumCase, FeatureAnnotation, PropertyDefinition, PropertyImplementation, TypeCategory,
    TypeDefinition, TypeKind, VariantDefinition,
};
pub use method::{
    BodyBinding, Implementation, MethodDescriptor, MethodModifier, NullifyVariant,
    ParameterBinding, ParameterLocation, ProblemBinding, ResponseKind,
};
pub use types::{DeclaredName, TypeName};
