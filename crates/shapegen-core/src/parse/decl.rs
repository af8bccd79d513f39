use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Top-level source document as written on disk.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DocumentDecl {
    pub title: Option<String>,
    pub version: Option<String>,
    pub base_uri: Option<String>,
    pub base_uri_parameters: IndexMap<String, Value>,
    pub media_type: MediaTypes,
    pub accepts: MediaTypes,
    /// Library alias → path relative to this document.
    pub uses: IndexMap<String, String>,
    pub annotations: IndexMap<String, Value>,
    pub types: IndexMap<String, ShapeOrName>,
    pub endpoints: IndexMap<String, EndpointDecl>,
}

/// A single media type or a list of them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MediaTypes {
    One(String),
    Many(Vec<String>),
}

impl Default for MediaTypes {
    fn default() -> Self {
        Self::Many(Vec::new())
    }
}

impl MediaTypes {
    pub fn to_vec(&self) -> Vec<String> {
        match self {
            Self::One(media_type) => vec![media_type.clone()],
            Self::Many(media_types) => media_types.clone(),
        }
    }
}

/// Either a bare name (scalar keyword or declared type) or a full shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ShapeOrName {
    Name(String),
    Shape(Box<ShapeDecl>),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ShapeDecl {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub type_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,

    #[serde(rename = "enum", skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<Value>>,

    /// A trailing `?` on a key marks the property optional.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<IndexMap<String, ShapeOrName>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub additional_properties: Option<AdditionalProperties>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub discriminator: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub discriminator_value: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<ShapeOrName>,

    pub unique_items: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub any_of: Option<Vec<ShapeOrName>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_length: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maximum: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_items: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_items: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub annotations: IndexMap<String, Value>,
}

/// `additionalProperties: true` or a value shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AdditionalProperties {
    Allowed(bool),
    Shape(ShapeOrName),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EndpointDecl {
    pub uri_parameters: IndexMap<String, ShapeOrName>,
    pub operations: IndexMap<String, OperationDecl>,
    pub annotations: IndexMap<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct OperationDecl {
    pub operation_id: Option<String>,
    pub display_name: Option<String>,
    pub description: Option<String>,
    pub query_parameters: IndexMap<String, ShapeOrName>,
    pub headers: IndexMap<String, ShapeOrName>,
    pub cookies: IndexMap<String, ShapeOrName>,
    pub query_string: Option<ShapeOrName>,
    /// Media type → payload shape.
    pub body: IndexMap<String, ShapeOrName>,
    /// Status code (as a string key) → response.
    pub responses: IndexMap<String, ResponseDecl>,
    pub annotations: IndexMap<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ResponseDecl {
    pub description: Option<String>,
    pub headers: IndexMap<String, ShapeOrName>,
    pub body: IndexMap<String, ShapeOrName>,
}

/// Strips the optional marker from a property or parameter key.
pub fn split_optional(key: &str) -> (&str, bool) {
    match key.strip_suffix('?') {
        Some(name) => (name, true),
        None => (key, false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_names_and_shapes_deserialize() {
        let yaml = r#"
types:
  Id: string
  Pet:
    type: object
    properties:
      id: Id
      nickname?: string
"#;
        let decl: DocumentDecl = serde_yaml_ng::from_str(yaml).expect("should parse");
        assert!(matches!(decl.types["Id"], ShapeOrName::Name(ref n) if n == "string"));
        let ShapeOrName::Shape(pet) = &decl.types["Pet"] else {
            panic!("expected Pet to be a shape");
        };
        let properties = pet.properties.as_ref().expect("should have properties");
        assert_eq!(properties.len(), 2);
        assert!(properties.contains_key("nickname?"));
    }

    #[test]
    fn media_type_accepts_single_or_list() {
        let one: DocumentDecl =
            serde_yaml_ng::from_str("mediaType: application/json").expect("should parse");
        assert_eq!(one.media_type.to_vec(), vec!["application/json"]);

        let many: DocumentDecl =
            serde_yaml_ng::from_str("mediaType: [application/json, application/cbor]")
                .expect("should parse");
        assert_eq!(many.media_type.to_vec().len(), 2);
    }

    #[test]
    fn additional_properties_flag_or_shape() {
        let flag: ShapeDecl =
            serde_yaml_ng::from_str("additionalProperties: true").expect("should parse");
        assert_eq!(
            flag.additional_properties,
            Some(AdditionalProperties::Allowed(true))
        );

        let shape: ShapeDecl =
            serde_yaml_ng::from_str("additionalProperties: integer").expect("should parse");
        assert!(matches!(
            shape.additional_properties,
            Some(AdditionalProperties::Shape(ShapeOrName::Name(_)))
        ));
    }

    #[test]
    fn optional_marker() {
        assert_eq!(split_optional("limit?"), ("limit", true));
        assert_eq!(split_optional("id"), ("id", false));
    }
}
