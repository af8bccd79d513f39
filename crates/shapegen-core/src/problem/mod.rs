//! Problem types declared through the `problemTypes` annotation.

pub mod rfc;

use std::sync::LazyLock;

use indexmap::IndexMap;
use log::debug;
use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use url::Url;

use crate::error::{Location, ResolveError};
use crate::schema::{AnnotationName, Document, DocumentId, DocumentSet};

pub use rfc::{ProblemField, ProblemLibrary, ProblemRfc};

/// Base used when neither the annotations nor the document supply one.
pub const DEFAULT_PROBLEM_BASE: &str = "http://example.com/";

static TEMPLATE_VARIABLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{([^}]+)\}").expect("template pattern is valid"));

/// One error payload type, fully resolved.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProblemTypeDefinition {
    pub code: String,
    #[serde(rename = "type")]
    pub type_uri: String,
    pub status: u16,
    pub title: String,
    pub detail: String,
    /// Custom field name → declared type name.
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub custom: IndexMap<String, String>,
    #[serde(skip)]
    pub defined_in: DocumentId,
    #[serde(skip)]
    pub source: Location,
}

impl ProblemTypeDefinition {
    /// Builds a definition from the annotation object declared for `code`.
    ///
    /// `status`, `title` and `detail` are mandatory. `type` is resolved against
    /// `base`; without one the code itself is.
    pub fn from_annotation(
        code: &str,
        fields: &Value,
        base: &Url,
        defined_in: DocumentId,
        source: Location,
    ) -> Result<Self, ResolveError> {
        let missing = |field: &'static str| ResolveError::ProblemMissingField {
            code: code.to_string(),
            field,
            location: source.clone(),
        };

        let status_value = fields.get("status").ok_or_else(|| missing("status"))?;
        let status = parse_status(status_value).ok_or_else(|| ResolveError::ProblemInvalidField {
            code: code.to_string(),
            field: "status",
            reason: format!("{status_value} is not an HTTP status code"),
            location: source.clone(),
        })?;
        let title = scalar_string(fields.get("title")).ok_or_else(|| missing("title"))?;
        let detail = scalar_string(fields.get("detail")).ok_or_else(|| missing("detail"))?;

        let reference = match fields.get("type").and_then(Value::as_str) {
            Some(type_ref) => type_ref.to_string(),
            None => format!("./{code}"),
        };
        let type_uri = base
            .join(&reference)
            .map_err(|err| ResolveError::InvalidProblemUri {
                uri: reference.clone(),
                reason: err.to_string(),
                location: source.clone(),
            })?;

        let custom = fields
            .get("custom")
            .and_then(Value::as_object)
            .map(|custom| {
                custom
                    .iter()
                    .map(|(name, type_ref)| {
                        let type_ref = type_ref.as_str().unwrap_or("string");
                        (name.clone(), type_ref.to_string())
                    })
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            code: code.to_string(),
            type_uri: type_uri.to_string(),
            status,
            title,
            detail,
            custom,
            defined_in,
            source,
        })
    }
}

fn parse_status(value: &Value) -> Option<u16> {
    let status = match value {
        Value::Number(n) => n.as_u64()?,
        Value::String(s) => s.trim().parse().ok()?,
        _ => return None,
    };
    u16::try_from(status)
        .ok()
        .filter(|status| (100..=599).contains(status))
}

fn scalar_string(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Replaces `{name}` with the matching parameter; unknown names stay as is.
pub fn expand_template(template: &str, params: &IndexMap<String, String>) -> String {
    TEMPLATE_VARIABLE
        .replace_all(template, |caps: &regex::Captures<'_>| {
            params
                .get(&caps[1])
                .cloned()
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

fn parse_uri(uri: &str, location: &Location) -> Result<Url, ResolveError> {
    Url::parse(uri).map_err(|err| ResolveError::InvalidProblemUri {
        uri: uri.to_string(),
        reason: err.to_string(),
        location: location.clone(),
    })
}

/// Base URI that problem type references of `document` resolve against.
///
/// The `problemBaseUri` annotation wins and may be relative to the document
/// base. Otherwise the document `baseUri` is used, else `default_base`.
pub fn problem_base(document: &Document, default_base: &Url) -> Result<Url, ResolveError> {
    let location = document.location.clone();
    let document_base = match &document.base_uri {
        Some(base_uri) => parse_uri(
            &expand_template(base_uri, &document.base_uri_parameters),
            &location,
        )?,
        None => default_base.clone(),
    };

    let Some(problem_base) = document
        .annotations
        .string(AnnotationName::ProblemBaseUri, None)
    else {
        return Ok(document_base);
    };

    let params: IndexMap<String, String> = document
        .annotations
        .get(AnnotationName::ProblemUriParams, None)
        .or_else(|| document.annotations.get(AnnotationName::ProblemBaseUriParams, None))
        .and_then(Value::as_object)
        .map(|params| {
            params
                .iter()
                .filter_map(|(name, value)| scalar_string(Some(value)).map(|v| (name.clone(), v)))
                .collect()
        })
        .unwrap_or_default();
    let expanded = expand_template(problem_base, &params);

    document_base
        .join(&expanded)
        .map_err(|err| ResolveError::InvalidProblemUri {
            uri: expanded,
            reason: err.to_string(),
            location,
        })
}

/// Problem types visible from `document`: those of the libraries it uses,
/// then its own. A code declared again replaces the earlier declaration.
pub fn find_problem_types(
    documents: &DocumentSet,
    document: &Document,
    default_base: &Url,
) -> Result<IndexMap<String, ProblemTypeDefinition>, ResolveError> {
    let mut found = IndexMap::new();
    for library in document.uses.values() {
        if let Some(library) = documents.document(*library) {
            declared_problem_types(library, default_base, &mut found)?;
        }
    }
    declared_problem_types(document, default_base, &mut found)?;
    Ok(found)
}

fn declared_problem_types(
    document: &Document,
    default_base: &Url,
    found: &mut IndexMap<String, ProblemTypeDefinition>,
) -> Result<(), ResolveError> {
    let Some(declared) = document
        .annotations
        .get(AnnotationName::ProblemTypes, None)
        .and_then(Value::as_object)
    else {
        return Ok(());
    };

    let base = problem_base(document, default_base)?;
    for (code, fields) in declared {
        let source = Location::new(
            document.file.clone(),
            format!("/annotations/problemTypes/{code}"),
        );
        let definition =
            ProblemTypeDefinition::from_annotation(code, fields, &base, document.id, source)?;
        debug!("problem type '{code}' -> {}", definition.type_uri);
        found.insert(code.clone(), definition);
    }
    Ok(())
}
