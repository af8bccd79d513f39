use shapegen_core::ir::{
    CodecAnnotation, Constraint, DeclaredName, FeatureAnnotation, PropertyDefinition,
    TypeDefinition, TypeKind, TypeName,
};
use shapegen_core::problem::ProblemLibrary;
use shapegen_core::schema::AnnotationName;
use shapegen_core::target::{FeatureSet, Primitive, TargetProfile};

use crate::options::JvmOption;
use crate::problem::JvmProblemLibrary;

/// Marker recorded by `add-generated-annotation`.
pub const GENERATOR: &str = "shapegen";

/// Warnings silenced by `suppress-public-api-warnings`.
const PUBLIC_API_WARNINGS: [&str; 2] = ["RedundantVisibilityModifier", "RedundantUnitReturnType"];

const RESERVED: &[&str] = &[
    "as", "break", "class", "continue", "do", "else", "false", "for", "fun", "if", "in",
    "interface", "is", "null", "object", "package", "return", "super", "this", "throw", "true",
    "try", "typealias", "typeof", "val", "var", "when", "while",
];

/// Kotlin on the JVM.
#[derive(Debug, Clone, Copy, Default)]
pub struct JvmTarget {
    pub problem_library: JvmProblemLibrary,
}

impl JvmTarget {
    pub fn new(problem_library: JvmProblemLibrary) -> Self {
        Self { problem_library }
    }
}

impl TargetProfile for JvmTarget {
    type Feature = JvmOption;

    fn name(&self) -> &'static str {
        "jvm"
    }

    fn type_override(&self) -> AnnotationName {
        AnnotationName::JvmType
    }

    fn implementation_override(&self) -> AnnotationName {
        AnnotationName::JvmImplementation
    }

    fn primitive(&self, primitive: Primitive) -> TypeName {
        let name = match primitive {
            Primitive::Boolean => "kotlin.Boolean",
            Primitive::Int8 => "kotlin.Byte",
            Primitive::Int16 => "kotlin.Short",
            Primitive::Int32 => "kotlin.Int",
            Primitive::Int64 => "kotlin.Long",
            Primitive::Float => "kotlin.Float",
            Primitive::Double => "kotlin.Double",
            Primitive::Decimal => "java.math.BigDecimal",
            Primitive::String => "kotlin.String",
            Primitive::Date => "java.time.LocalDate",
            Primitive::Time => "java.time.LocalTime",
            Primitive::DateTimeOnly => "java.time.LocalDateTime",
            Primitive::DateTime => "java.time.OffsetDateTime",
            Primitive::Duration => "java.time.Duration",
            Primitive::Uuid => "java.util.UUID",
            Primitive::Uri => "java.net.URI",
            Primitive::Bytes => "kotlin.ByteArray",
        };
        TypeName::primitive(name)
    }

    fn supports_structural_unions(&self) -> bool {
        false
    }

    fn reserved_words(&self) -> &'static [&'static str] {
        RESERVED
    }

    fn problem_library(&self) -> &ProblemLibrary {
        self.problem_library.library()
    }

    fn model_kind(&self, features: &FeatureSet<JvmOption>) -> TypeKind {
        if features.contains(JvmOption::ImplementModel) {
            TypeKind::Class
        } else {
            TypeKind::Interface
        }
    }

    fn patch_value(&self, value: TypeName) -> TypeName {
        let value = value.non_optional().clone();
        TypeName::generic(DeclaredName::new("java.util", "Optional"), vec![value]).optional()
    }

    fn decorate_type(&self, features: &FeatureSet<JvmOption>, definition: &mut TypeDefinition) {
        if features.contains(JvmOption::JacksonAnnotations) {
            jackson_type_metadata(definition);
        }
        if definition.name.is_nested() {
            return;
        }
        if features.contains(JvmOption::AddGeneratedAnnotation) {
            definition.annotations.push(FeatureAnnotation::Generated {
                generator: GENERATOR.to_string(),
            });
        }
        if features.contains(JvmOption::SuppressPublicApiWarnings) {
            definition.annotations.push(FeatureAnnotation::SuppressWarnings {
                warnings: PUBLIC_API_WARNINGS.iter().map(|w| w.to_string()).collect(),
            });
        }
    }

    fn decorate_property(
        &self,
        features: &FeatureSet<JvmOption>,
        property: &mut PropertyDefinition,
        constraints: &[Constraint],
    ) {
        if features.contains(JvmOption::JacksonAnnotations) && property.implementation.is_some() {
            property
                .annotations
                .push(FeatureAnnotation::Codec(CodecAnnotation::Ignored));
        } else if features.contains(JvmOption::JacksonAnnotations)
            && property.name != property.identifier
        {
            property
                .annotations
                .push(FeatureAnnotation::Codec(CodecAnnotation::WireName {
                    name: property.name.clone(),
                }));
        }
        if features.contains(JvmOption::ValidationConstraints) {
            property
                .annotations
                .extend(constraints.iter().cloned().map(FeatureAnnotation::Constraint));
        }
    }
}

fn jackson_type_metadata(definition: &mut TypeDefinition) {
    if let Some(discriminator) = &definition.discriminator {
        definition
            .annotations
            .push(FeatureAnnotation::Codec(CodecAnnotation::TypeInfo {
                property: discriminator.property.clone(),
                external: discriminator.external,
            }));
    }
    if !definition.variants.is_empty() {
        definition
            .annotations
            .push(FeatureAnnotation::Codec(CodecAnnotation::SubTypes {
                variants: definition.variants.clone(),
            }));
    }
    if let Some(value) = &definition.discriminator_value {
        definition
            .annotations
            .push(FeatureAnnotation::Codec(CodecAnnotation::TypeId { value: value.clone() }));
    }
}
