use shapegen_core::ir::{
    CodecAnnotation, Constraint, FeatureAnnotation, PropertyDefinition, TypeDefinition, TypeKind,
    TypeName,
};
use shapegen_core::problem::{ProblemField, ProblemLibrary};
use shapegen_core::schema::AnnotationName;
use shapegen_core::target::{FeatureSet, Primitive, TargetProfile};

use crate::options::TypeScriptOption;

pub const GENERATOR: &str = "shapegen";

const SUNDAY: &str = "@outfoxx/sunday";

const RESERVED: &[&str] = &[
    "break", "case", "catch", "class", "const", "continue", "debugger", "default", "delete", "do",
    "else", "enum", "export", "extends", "false", "finally", "for", "function", "if", "import",
    "in", "instanceof", "new", "null", "return", "super", "switch", "this", "throw", "true", "try",
    "typeof", "var", "void", "while", "with",
];

static PROBLEM: ProblemLibrary = ProblemLibrary {
    name: "sunday",
    supertype: "@outfoxx/sunday.Problem",
    mapping: &[
        (ProblemField::Type, "type"),
        (ProblemField::Title, "title"),
        (ProblemField::Status, "status"),
        (ProblemField::Detail, "detail"),
        (ProblemField::Instance, "instance"),
    ],
};

/// TypeScript models with structural unions and runtime date types.
#[derive(Debug, Clone, Copy, Default)]
pub struct TypeScriptTarget;

impl TargetProfile for TypeScriptTarget {
    type Feature = TypeScriptOption;

    fn name(&self) -> &'static str {
        "typescript"
    }

    fn type_override(&self) -> AnnotationName {
        AnnotationName::TypeScriptType
    }

    fn implementation_override(&self) -> AnnotationName {
        AnnotationName::TypeScriptImplementation
    }

    fn patch_value(&self, value: TypeName) -> TypeName {
        value.optional()
    }

    fn primitive(&self, primitive: Primitive) -> TypeName {
        let runtime = |name: &str| TypeName::primitive(format!("{SUNDAY}.{name}"));
        match primitive {
            Primitive::Boolean => TypeName::primitive("boolean"),
            Primitive::Int8
            | Primitive::Int16
            | Primitive::Int32
            | Primitive::Int64
            | Primitive::Float
            | Primitive::Double
            | Primitive::Decimal => TypeName::primitive("number"),
            Primitive::String | Primitive::Uuid | Primitive::Uri => TypeName::primitive("string"),
            Primitive::Date => runtime("LocalDate"),
            Primitive::Time => runtime("LocalTime"),
            Primitive::DateTimeOnly => runtime("LocalDateTime"),
            Primitive::DateTime => runtime("OffsetDateTime"),
            Primitive::Duration => runtime("Duration"),
            Primitive::Bytes => TypeName::primitive("ArrayBuffer"),
        }
    }

    fn supports_structural_unions(&self) -> bool {
        true
    }

    fn reserved_words(&self) -> &'static [&'static str] {
        RESERVED
    }

    fn problem_library(&self) -> &ProblemLibrary {
        &PROBLEM
    }

    fn model_kind(&self, features: &FeatureSet<TypeScriptOption>) -> TypeKind {
        if features.contains(TypeScriptOption::JacksonDecorators) {
            TypeKind::Class
        } else {
            TypeKind::Interface
        }
    }

    fn decorate_type(&self, features: &FeatureSet<TypeScriptOption>, definition: &mut TypeDefinition) {
        if features.contains(TypeScriptOption::JacksonDecorators) {
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
        if features.contains(TypeScriptOption::AddGenerationHeader) && !definition.name.is_nested() {
            definition.annotations.push(FeatureAnnotation::Generated {
                generator: GENERATOR.to_string(),
            });
        }
    }

    fn decorate_property(
        &self,
        features: &FeatureSet<TypeScriptOption>,
        property: &mut PropertyDefinition,
        _constraints: &[Constraint],
    ) {
        if features.contains(TypeScriptOption::JacksonDecorators) && property.name != property.identifier {
            property
                .annotations
                .push(FeatureAnnotation::Codec(CodecAnnotation::WireName {
                    name: property.name.clone(),
                }));
        }
    }
}
