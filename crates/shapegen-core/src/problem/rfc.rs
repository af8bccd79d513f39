//! Problem-details revisions and the libraries that construct them.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProblemField {
    Type,
    Title,
    Status,
    Detail,
    Instance,
}

impl ProblemField {
    pub const ALL: [ProblemField; 5] = [
        Self::Type,
        Self::Title,
        Self::Status,
        Self::Detail,
        Self::Instance,
    ];

    pub fn json_name(self) -> &'static str {
        match self {
            Self::Type => "type",
            Self::Title => "title",
            Self::Status => "status",
            Self::Detail => "detail",
            Self::Instance => "instance",
        }
    }
}

impl fmt::Display for ProblemField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.json_name())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProblemRfc {
    Rfc7807,
    #[default]
    Rfc9457,
}

impl ProblemRfc {
    pub fn id(self) -> &'static str {
        match self {
            Self::Rfc7807 => "rfc7807",
            Self::Rfc9457 => "rfc9457",
        }
    }

    /// Fields every problem must carry.
    pub fn required_fields(self) -> &'static [ProblemField] {
        &[]
    }

    pub fn allowed_fields(self) -> &'static [ProblemField] {
        &ProblemField::ALL
    }

    /// Fields a generated problem type populates.
    pub fn default_fields(self) -> &'static [ProblemField] {
        &ProblemField::ALL
    }
}

/// A runtime problem library: the supertype generated problems extend and
/// the construction hook used for each field.
#[derive(Debug)]
pub struct ProblemLibrary {
    pub name: &'static str,
    /// Fully qualified supertype.
    pub supertype: &'static str,
    pub mapping: &'static [(ProblemField, &'static str)],
}

impl ProblemLibrary {
    pub fn hook(&self, field: ProblemField) -> Option<&'static str> {
        self.mapping
            .iter()
            .find(|(mapped, _)| *mapped == field)
            .map(|(_, hook)| *hook)
    }

    /// Checks the library against `rfc`, listing every gap at once.
    pub fn validate_compliance(&self, rfc: ProblemRfc) -> Result<(), ConfigError> {
        let allowed = rfc.allowed_fields();
        let mut problems = Vec::new();

        for field in rfc.required_fields() {
            if !allowed.contains(field) {
                problems.push(format!("required field '{field}' is not allowed"));
            }
            if !rfc.default_fields().contains(field) {
                problems.push(format!("required field '{field}' is not in the default set"));
            }
        }
        for field in rfc.default_fields() {
            if !allowed.contains(field) {
                problems.push(format!("default field '{field}' is not allowed"));
            }
        }
        for (field, _) in self.mapping {
            if !allowed.contains(field) {
                problems.push(format!("maps field '{field}' which is not allowed"));
            }
        }
        for field in rfc.default_fields() {
            if self.hook(*field).is_none() {
                problems.push(format!("missing mapping for field '{field}'"));
            }
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::RfcCompliance {
                library: self.name.to_string(),
                rfc: rfc.id().to_string(),
                problems,
            })
        }
    }
}
