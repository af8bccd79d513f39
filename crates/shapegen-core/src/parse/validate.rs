use std::collections::HashSet;
use std::fmt;

use serde::Serialize;

use crate::error::Location;
use crate::schema::{Document, DocumentSet, SchemaNode};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationLevel {
    Error,
    Warning,
    Info,
}

impl fmt::Display for ValidationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Error => "ERROR",
            Self::Warning => "WARNING",
            Self::Info => "INFO",
        })
    }
}

/// One finding of the validation pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationEntry {
    pub level: ValidationLevel,
    pub file: String,
    pub line: usize,
    pub message: String,
}

impl ValidationEntry {
    fn at(level: ValidationLevel, location: &Location, message: impl Into<String>) -> Self {
        Self {
            level,
            file: location.file.clone(),
            line: location.line,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}| {}:{}: {}", self.level, self.file, self.line, self.message)
    }
}

pub fn has_errors(entries: &[ValidationEntry]) -> bool {
    entries
        .iter()
        .any(|entry| entry.level == ValidationLevel::Error)
}

/// Structural checks over every loaded document.
pub fn validate(documents: &DocumentSet) -> Vec<ValidationEntry> {
    let mut entries = Vec::new();
    for document in documents.documents() {
        validate_shapes(document, &mut entries);
        validate_operations(document, &mut entries);

        let operations = document.operations().count();
        entries.push(ValidationEntry::at(
            ValidationLevel::Info,
            &document.location,
            format!(
                "{} type(s), {} operation(s)",
                document.types.len(),
                operations
            ),
        ));
    }
    entries
}

fn validate_shapes(document: &Document, entries: &mut Vec<ValidationEntry>) {
    for shape in &document.shapes {
        match &shape.node {
            SchemaNode::Enum(enumeration) if enumeration.values.is_empty() => {
                entries.push(ValidationEntry::at(
                    ValidationLevel::Error,
                    &shape.location,
                    "enum declares no values",
                ));
            }
            SchemaNode::Array(array) if array.items.is_none() => {
                if array.unique {
                    entries.push(ValidationEntry::at(
                        ValidationLevel::Error,
                        &shape.location,
                        "uniqueItems requires an items shape",
                    ));
                } else {
                    entries.push(ValidationEntry::at(
                        ValidationLevel::Warning,
                        &shape.location,
                        "array without items is treated as an array of any",
                    ));
                }
            }
            SchemaNode::Reference(reference) => {
                if let (Some(alias), _) = reference.split() {
                    if !document.types.contains_key(&reference.name)
                        && !document.uses.contains_key(alias)
                    {
                        entries.push(ValidationEntry::at(
                            ValidationLevel::Error,
                            &shape.location,
                            format!("unknown library alias '{alias}' in '{}'", reference.name),
                        ));
                    }
                }
            }
            _ => {}
        }
    }
}

fn validate_operations(document: &Document, entries: &mut Vec<ValidationEntry>) {
    let mut seen = HashSet::new();
    for (endpoint, operation) in document.operations() {
        if let Some(id) = &operation.operation_id {
            if !seen.insert(id.as_str()) {
                entries.push(ValidationEntry::at(
                    ValidationLevel::Error,
                    &operation.location,
                    format!("duplicate operationId '{id}'"),
                ));
            }
        }
        if operation.responses.is_empty() {
            entries.push(ValidationEntry::at(
                ValidationLevel::Warning,
                &operation.location,
                format!("{} {} declares no responses", operation.method, endpoint.path),
            ));
        }
    }
}
