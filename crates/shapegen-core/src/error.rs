use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::parse::validate::{ValidationEntry, ValidationLevel};

/// Where a node came from: file, JSON-pointer path and 1-based line/column.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
pub struct Location {
    pub file: String,
    pub pointer: String,
    pub line: usize,
    pub column: usize,
}

impl Location {
    pub fn new(file: impl Into<String>, pointer: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            pointer: pointer.into(),
            line: 0,
            column: 0,
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.line == 0 {
            write!(f, "{}#{}", self.file, self.pointer)
        } else {
            write!(f, "{}:{}:{}", self.file, self.line, self.column)
        }
    }
}

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("failed to parse YAML in {file}: {source}")]
    Yaml {
        file: String,
        #[source]
        source: serde_yaml_ng::Error,
    },

    #[error("failed to parse JSON in {file}: {source}")]
    Json {
        file: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{location}: {message}")]
    Invalid { location: Location, message: String },

    #[error("{file}: unknown library '{library}'")]
    UnknownLibrary { file: String, library: String },
}

/// Failures raised while turning shapes into type names.
///
/// Every variant that stems from user input carries the location of the
/// offending node.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("{location}: unresolved reference '{name}'")]
    UnresolvedRef { name: String, location: Location },

    #[error("{location}: Discriminator property '{property}' not found")]
    DiscriminatorNotFound { property: String, location: Location },

    #[error("{location}: Externally discriminated types must declare a discriminator property")]
    MissingExternalDiscriminator { location: Location },

    #[error("{location}: Externally discriminated types must be 'object'")]
    ExternalDiscriminatorRange { location: Location },

    #[error("{location}: External discriminator '{property}' not found in object")]
    ExternalDiscriminatorNotFound { property: String, location: Location },

    #[error("{location}: Discriminated union members must be objects")]
    UnionMemberNotObject { location: Location },

    #[error("{location}: Discriminated (eventStream) requires a union of event types")]
    EventStreamNotUnion { location: Location },

    #[error("{location}: Integer format '{format}' is unsupported")]
    UnsupportedIntegerFormat { format: String, location: Location },

    #[error("{location}: Number format '{format}' is unsupported")]
    UnsupportedNumberFormat { format: String, location: Location },

    #[error("{location}: Multiple types with name '{name}' defined in package '{package}'")]
    DuplicateTypeName {
        name: String,
        package: String,
        location: Location,
    },

    #[error("{location}: Service type '{name}' is already defined")]
    DuplicateService { name: String, location: Location },

    #[error("{location}: Problem type '{code}' missing {field}")]
    ProblemMissingField {
        code: String,
        field: &'static str,
        location: Location,
    },

    #[error("{location}: Problem type '{code}' has invalid {field}: {reason}")]
    ProblemInvalidField {
        code: String,
        field: &'static str,
        reason: String,
        location: Location,
    },

    #[error("{location}: Invalid problem URI '{uri}': {reason}")]
    InvalidProblemUri {
        uri: String,
        reason: String,
        location: Location,
    },

    #[error("{location}: Unknown problem code referenced: {code}")]
    UnknownProblemCode { code: String, location: Location },

    #[error("{location}: Invalid type reference '{name}'")]
    InvalidTypeReference { name: String, location: Location },

    #[error("{location}: Invalid '{annotation}' annotation: {reason}")]
    InvalidAnnotation {
        annotation: &'static str,
        reason: String,
        location: Location,
    },

    #[error("{location}: recursion depth limit of {limit} exceeded")]
    RecursionLimit { limit: usize, location: Location },

    #[error("{location}: Type '{name}' refers to itself without an object in between")]
    RecursiveAlias { name: String, location: Location },

    #[error("forward reference '{name}' was never completed")]
    IncompleteForwardReference { name: String },
}

impl ResolveError {
    /// Source location of the failing node, when the failure has one.
    pub fn location(&self) -> Option<&Location> {
        match self {
            Self::UnresolvedRef { location, .. }
            | Self::DiscriminatorNotFound { location, .. }
            | Self::MissingExternalDiscriminator { location }
            | Self::ExternalDiscriminatorRange { location }
            | Self::ExternalDiscriminatorNotFound { location, .. }
            | Self::UnionMemberNotObject { location }
            | Self::EventStreamNotUnion { location }
            | Self::UnsupportedIntegerFormat { location, .. }
            | Self::UnsupportedNumberFormat { location, .. }
            | Self::DuplicateTypeName { location, .. }
            | Self::DuplicateService { location, .. }
            | Self::ProblemMissingField { location, .. }
            | Self::ProblemInvalidField { location, .. }
            | Self::InvalidProblemUri { location, .. }
            | Self::UnknownProblemCode { location, .. }
            | Self::InvalidTypeReference { location, .. }
            | Self::InvalidAnnotation { location, .. }
            | Self::RecursionLimit { location, .. }
            | Self::RecursiveAlias { location, .. } => Some(location),
            Self::IncompleteForwardReference { .. } => None,
        }
    }
}

/// Problems with the generator configuration itself. Each variant lists every
/// gap found rather than stopping at the first.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("problem library '{library}' is not {rfc} compliant: {}", .problems.join("; "))]
    RfcCompliance {
        library: String,
        rfc: String,
        problems: Vec<String>,
    },

    #[error("invalid option combination: {}", .problems.join("; "))]
    InvalidOptions { problems: Vec<String> },

    #[error("unknown option '{name}', expected one of: {}", .known.join(", "))]
    UnknownOption { name: String, known: Vec<String> },

    #[error("invalid URI '{uri}': {reason}")]
    InvalidUri { uri: String, reason: String },
}

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("validation failed with {} error(s)", error_count(.0))]
    Validation(Vec<ValidationEntry>),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

fn error_count(entries: &[ValidationEntry]) -> usize {
    entries
        .iter()
        .filter(|entry| entry.level == ValidationLevel::Error)
        .count()
}
