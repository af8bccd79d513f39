use shapegen_core::ir::{
    CodecAnnotation, Constraint, FeatureAnnotation, PropertyDefinition, TypeDefinition, TypeName,
};
use shapegen_core::naming;
use shapegen_core::problem::{ProblemField, ProblemLibrary};
use shapegen_core::schema::AnnotationName;
use shapegen_core::target::{FeatureSet, Primitive, TargetProfile};

use crate::options::SwiftOption;

/// Marker recorded by `add-generated-header`.
pub const GENERATOR: &str = "shapegen";

const RESERVED: &[&str] = &[
    "associatedtype", "case", "class", "default", "defer", "deinit", "do", "else", "enum",
    "extension", "fallthrough", "false", "for", "func", "guard", "if", "import", "in", "init",
    "inout", "internal", "is", "let", "nil", "operator", "private", "protocol", "public",
    "repeat", "return", "self", "Self", "static", "struct", "subscript", "super", "switch",
    "throw", "throws", "true", "try", "typealias", "var", "where", "while",
];

static SUNDAY: ProblemLibrary = ProblemLibrary {
    name: "sunday",
    supertype: "Sunday.Problem",
    mapping: &[
        (ProblemField::Type, "type"),
        (ProblemField::Title, "title"),
        (ProblemField::Status, "status"),
        (ProblemField::Detail, "detail"),
        (ProblemField::Instance, "instance"),
    ],
};

/// Swift with Foundation types and Codable models.
#[derive(Debug, Clone, Copy, Default)]
pub struct SwiftTarget;

impl TargetProfile for SwiftTarget {
    type Feature = SwiftOption;

    fn name(&self) -> &'static str {
        "swift"
    }

    fn type_override(&self) -> AnnotationName {
        AnnotationName::SwiftType
    }

    fn implementation_override(&self) -> AnnotationName {
        AnnotationName::SwiftImplementation
    }

    fn primitive(&self, primitive: Primitive) -> TypeName {
        let name = match primitive {
            Primitive::Boolean => "Swift.Bool",
            Primitive::Int8 => "Swift.Int8",
            Primitive::Int16 => "Swift.Int16",
            Primitive::Int32 => "Swift.Int32",
            Primitive::Int64 | Primitive::Duration => "Swift.Int64",
            Primitive::Float => "Swift.Float",
            Primitive::Double => "Swift.Double",
            Primitive::Decimal => "Foundation.Decimal",
            Primitive::String => "Swift.String",
            Primitive::Date | Primitive::Time | Primitive::DateTimeOnly | Primitive::DateTime => {
                "Foundation.Date"
            }
            Primitive::Uuid => "Foundation.UUID",
            Primitive::Uri => "Foundation.URL",
            Primitive::Bytes => "Foundation.Data",
        };
        TypeName::primitive(name)
    }

    fn any(&self) -> TypeName {
        TypeName::primitive("PotentCodables.AnyValue")
    }

    fn supports_structural_unions(&self) -> bool {
        false
    }

    fn reserved_words(&self) -> &'static [&'static str] {
        RESERVED
    }

    fn problem_library(&self) -> &ProblemLibrary {
        &SUNDAY
    }

    fn enum_case_name(&self, literal: &str) -> String {
        let case = naming::lowercase_initial_word_or_abbreviation(&naming::enum_case_name(literal));
        naming::legal_identifier(&case, RESERVED)
    }

    fn decorate_type(&self, features: &FeatureSet<SwiftOption>, definition: &mut TypeDefinition) {
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
        if features.contains(SwiftOption::AddGeneratedHeader) && !definition.name.is_nested() {
            definition.annotations.push(FeatureAnnotation::Generated {
                generator: GENERATOR.to_string(),
            });
        }
    }

    // Coding keys are emitted regardless of options.
    fn decorate_property(
        &self,
        _features: &FeatureSet<SwiftOption>,
        property: &mut PropertyDefinition,
        _constraints: &[Constraint],
    ) {
        if property.name != property.identifier {
            property
                .annotations
                .push(FeatureAnnotation::Codec(CodecAnnotation::WireName {
                    name: property.name.clone(),
                }));
        }
    }
}
