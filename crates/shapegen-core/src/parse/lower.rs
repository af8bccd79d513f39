use indexmap::IndexMap;
use serde_json::Value;

use super::decl::{
    AdditionalProperties, DocumentDecl, EndpointDecl, OperationDecl, ResponseDecl, ShapeDecl,
    ShapeOrName, split_optional,
};
use super::source_map::{SourceMap, escape_segment};
use crate::error::{Location, ParseError};
use crate::schema::{
    AnnotationName, Annotations, ArrayShape, Document, DocumentId, Endpoint, EnumShape, Facets,
    HttpMethod, ObjectShape, Operation, Parameter, Payload, PropertyShape, Reference, Response,
    ScalarKind, ScalarShape, SchemaNode, Shape, ShapeId, UnionShape,
};

/// Turns a parsed declaration into a document with an id-addressed shape arena.
pub(crate) struct Lowerer<'a> {
    document: DocumentId,
    file: &'a str,
    source_map: &'a SourceMap,
    shapes: Vec<Shape>,
}

impl<'a> Lowerer<'a> {
    pub(crate) fn new(document: DocumentId, file: &'a str, source_map: &'a SourceMap) -> Self {
        Self {
            document,
            file,
            source_map,
            shapes: Vec::new(),
        }
    }

    pub(crate) fn lower_document(
        mut self,
        decl: &DocumentDecl,
        uses: IndexMap<String, DocumentId>,
        is_library: bool,
    ) -> Result<Document, ParseError> {
        let mut types = IndexMap::new();
        for (name, shape) in &decl.types {
            let pointer = format!("/types/{}", escape_segment(name));
            let id = self.lower_shape(shape, &pointer, Some(name))?;
            types.insert(name.clone(), id);
        }

        let mut endpoints = Vec::new();
        if !is_library {
            for (path, endpoint) in &decl.endpoints {
                endpoints.push(self.lower_endpoint(path, endpoint)?);
            }
        }

        let base_uri_parameters = decl
            .base_uri_parameters
            .iter()
            .map(|(name, value)| (name.clone(), value_to_string(value)))
            .collect();

        Ok(Document {
            id: self.document,
            file: self.file.to_string(),
            title: decl.title.clone(),
            version: decl.version.clone(),
            base_uri: decl.base_uri.clone(),
            base_uri_parameters,
            media_types: decl.media_type.to_vec(),
            accepts: decl.accepts.to_vec(),
            uses,
            annotations: Annotations::new(decl.annotations.clone()),
            types,
            endpoints,
            location: self.location(""),
            shapes: self.shapes,
            is_library,
        })
    }

    fn location(&self, pointer: &str) -> Location {
        let mut location = Location::new(self.file, pointer);
        if let Some((line, column)) = self.source_map.locate(pointer) {
            location.line = line;
            location.column = column;
        }
        location
    }

    fn invalid(&self, pointer: &str, message: impl Into<String>) -> ParseError {
        ParseError::Invalid {
            location: self.location(pointer),
            message: message.into(),
        }
    }

    /// Reserves an arena slot so containers get lower ids than their children.
    fn reserve(&mut self, name: Option<&str>, pointer: &str) -> ShapeId {
        let id = ShapeId {
            document: self.document,
            index: self.shapes.len() as u32,
        };
        self.shapes.push(Shape {
            id,
            name: name.map(str::to_string),
            node: SchemaNode::Any,
            description: None,
            default: None,
            annotations: Annotations::default(),
            location: self.location(pointer),
        });
        id
    }

    fn slot(&mut self, id: ShapeId) -> &mut Shape {
        &mut self.shapes[id.index as usize]
    }

    fn lower_shape(
        &mut self,
        decl: &ShapeOrName,
        pointer: &str,
        name: Option<&str>,
    ) -> Result<ShapeId, ParseError> {
        let id = self.reserve(name, pointer);
        let node = match decl {
            ShapeOrName::Name(keyword) => keyword_node(keyword),
            ShapeOrName::Shape(shape) => {
                let node = self.lower_shape_decl(shape, pointer)?;
                let slot = self.slot(id);
                slot.description = shape.description.clone();
                slot.default = shape.default.clone();
                slot.annotations = Annotations::new(shape.annotations.clone());
                node
            }
        };
        self.slot(id).node = node;
        Ok(id)
    }

    fn lower_shape_decl(
        &mut self,
        decl: &ShapeDecl,
        pointer: &str,
    ) -> Result<SchemaNode, ParseError> {
        if let Some(values) = &decl.enum_values {
            let scalar = match decl.type_name.as_deref() {
                None => ScalarKind::String,
                Some(keyword) => ScalarKind::from_keyword(keyword).ok_or_else(|| {
                    self.invalid(pointer, format!("enum type '{keyword}' is not a scalar"))
                })?,
            };
            return Ok(SchemaNode::Enum(EnumShape {
                scalar,
                format: decl.format.clone(),
                values: values.clone(),
            }));
        }

        let declares_object = decl.properties.is_some()
            || decl.additional_properties.is_some()
            || decl.discriminator.is_some()
            || decl.discriminator_value.is_some();

        let node = match decl.type_name.as_deref() {
            Some("object") => SchemaNode::Object(self.lower_object(decl, pointer, None)?),
            Some("array") => SchemaNode::Array(self.lower_array(decl, pointer)?),
            Some("union") => SchemaNode::Union(self.lower_union(decl, pointer)?),
            Some("nil") => SchemaNode::Nil,
            Some("any") => SchemaNode::Any,
            Some(keyword) => match ScalarKind::from_keyword(keyword) {
                Some(kind) => SchemaNode::Scalar(scalar_shape(kind, decl)),
                None if declares_object => {
                    let parent_pointer = format!("{pointer}/type");
                    let parent = self.reserve(None, &parent_pointer);
                    self.slot(parent).node = SchemaNode::Reference(Reference {
                        name: keyword.to_string(),
                    });
                    SchemaNode::Object(self.lower_object(decl, pointer, Some(parent))?)
                }
                None => SchemaNode::Reference(Reference {
                    name: keyword.to_string(),
                }),
            },
            None if decl.any_of.is_some() => SchemaNode::Union(self.lower_union(decl, pointer)?),
            None if declares_object => {
                SchemaNode::Object(self.lower_object(decl, pointer, None)?)
            }
            None if decl.items.is_some() => SchemaNode::Array(self.lower_array(decl, pointer)?),
            None => SchemaNode::Any,
        };
        Ok(node)
    }

    fn lower_object(
        &mut self,
        decl: &ShapeDecl,
        pointer: &str,
        parent: Option<ShapeId>,
    ) -> Result<ObjectShape, ParseError> {
        let mut properties = Vec::new();
        if let Some(declared) = &decl.properties {
            for (key, shape) in declared {
                let (name, optional) = split_optional(key);
                let property_pointer = format!("{pointer}/properties/{}", escape_segment(key));
                let shape = self.lower_shape(shape, &property_pointer, None)?;
                properties.push(PropertyShape {
                    name: name.to_string(),
                    shape,
                    required: !optional,
                    location: self.location(&property_pointer),
                });
            }
        }

        let additional_pointer = format!("{pointer}/additionalProperties");
        let additional_properties = match &decl.additional_properties {
            None | Some(AdditionalProperties::Allowed(false)) => None,
            Some(AdditionalProperties::Allowed(true)) => {
                let id = self.reserve(None, &additional_pointer);
                Some(id)
            }
            Some(AdditionalProperties::Shape(shape)) => {
                Some(self.lower_shape(shape, &additional_pointer, None)?)
            }
        };

        let annotations = Annotations::new(decl.annotations.clone());
        Ok(ObjectShape {
            parent,
            properties,
            additional_properties,
            discriminator: decl.discriminator.clone(),
            discriminator_value: decl.discriminator_value.clone(),
            externally_discriminated: annotations
                .flag(AnnotationName::ExternallyDiscriminated, None),
        })
    }

    fn lower_array(&mut self, decl: &ShapeDecl, pointer: &str) -> Result<ArrayShape, ParseError> {
        let items = match &decl.items {
            Some(items) => Some(self.lower_shape(items, &format!("{pointer}/items"), None)?),
            None => None,
        };
        Ok(ArrayShape {
            items,
            unique: decl.unique_items,
            min_items: decl.min_items,
            max_items: decl.max_items,
        })
    }

    fn lower_union(&mut self, decl: &ShapeDecl, pointer: &str) -> Result<UnionShape, ParseError> {
        let mut members = Vec::new();
        for (index, member) in decl.any_of.iter().flatten().enumerate() {
            members.push(self.lower_shape(member, &format!("{pointer}/anyOf/{index}"), None)?);
        }
        let annotations = Annotations::new(decl.annotations.clone());
        Ok(UnionShape {
            members,
            discriminator: decl.discriminator.clone(),
            externally_discriminated: annotations
                .flag(AnnotationName::ExternallyDiscriminated, None),
        })
    }

    fn lower_parameters(
        &mut self,
        declared: &IndexMap<String, ShapeOrName>,
        pointer: &str,
        default_required: bool,
    ) -> Result<Vec<Parameter>, ParseError> {
        let mut parameters = Vec::with_capacity(declared.len());
        for (key, shape) in declared {
            let (name, optional) = split_optional(key);
            let parameter_pointer = format!("{pointer}/{}", escape_segment(key));
            let shape = self.lower_shape(shape, &parameter_pointer, None)?;
            parameters.push(Parameter {
                name: name.to_string(),
                shape,
                required: default_required && !optional,
                location: self.location(&parameter_pointer),
            });
        }
        Ok(parameters)
    }

    fn lower_payloads(
        &mut self,
        declared: &IndexMap<String, ShapeOrName>,
        pointer: &str,
    ) -> Result<Vec<Payload>, ParseError> {
        let mut payloads = Vec::with_capacity(declared.len());
        for (media_type, shape) in declared {
            let payload_pointer = format!("{pointer}/{}", escape_segment(media_type));
            payloads.push(Payload {
                media_type: media_type.clone(),
                shape: self.lower_shape(shape, &payload_pointer, None)?,
            });
        }
        Ok(payloads)
    }

    fn lower_endpoint(&mut self, path: &str, decl: &EndpointDecl) -> Result<Endpoint, ParseError> {
        let pointer = format!("/endpoints/{}", escape_segment(path));
        let mut uri_parameters =
            self.lower_parameters(&decl.uri_parameters, &format!("{pointer}/uriParameters"), true)?;

        // Template variables without a declaration are plain strings.
        for variable in template_variables(path) {
            if uri_parameters.iter().any(|p| p.name == variable) {
                continue;
            }
            let shape = self.reserve(None, &pointer);
            self.slot(shape).node = SchemaNode::Scalar(ScalarShape {
                kind: ScalarKind::String,
                format: None,
                facets: Facets::default(),
            });
            uri_parameters.push(Parameter {
                name: variable,
                shape,
                required: true,
                location: self.location(&pointer),
            });
        }

        let mut operations = Vec::with_capacity(decl.operations.len());
        for (method, operation) in &decl.operations {
            let operation_pointer = format!("{pointer}/operations/{}", escape_segment(method));
            let method = HttpMethod::parse(method).ok_or_else(|| {
                self.invalid(&operation_pointer, format!("unknown HTTP method '{method}'"))
            })?;
            operations.push(self.lower_operation(method, operation, &operation_pointer)?);
        }

        Ok(Endpoint {
            path: path.to_string(),
            uri_parameters,
            operations,
            annotations: Annotations::new(decl.annotations.clone()),
            location: self.location(&pointer),
        })
    }

    fn lower_operation(
        &mut self,
        method: HttpMethod,
        decl: &OperationDecl,
        pointer: &str,
    ) -> Result<Operation, ParseError> {
        let query_parameters = self.lower_parameters(
            &decl.query_parameters,
            &format!("{pointer}/queryParameters"),
            true,
        )?;
        let headers = self.lower_parameters(&decl.headers, &format!("{pointer}/headers"), true)?;
        let cookies = self.lower_parameters(&decl.cookies, &format!("{pointer}/cookies"), true)?;
        let query_string = match &decl.query_string {
            Some(shape) => {
                Some(self.lower_shape(shape, &format!("{pointer}/queryString"), None)?)
            }
            None => None,
        };
        let body = self.lower_payloads(&decl.body, &format!("{pointer}/body"))?;

        let mut responses = Vec::with_capacity(decl.responses.len());
        for (status, response) in &decl.responses {
            let response_pointer = format!("{pointer}/responses/{}", escape_segment(status));
            responses.push(self.lower_response(status, response, &response_pointer)?);
        }

        Ok(Operation {
            method,
            operation_id: decl.operation_id.clone(),
            display_name: decl.display_name.clone(),
            description: decl.description.clone(),
            query_parameters,
            headers,
            cookies,
            query_string,
            body,
            responses,
            annotations: Annotations::new(decl.annotations.clone()),
            location: self.location(pointer),
        })
    }

    fn lower_response(
        &mut self,
        status: &str,
        decl: &ResponseDecl,
        pointer: &str,
    ) -> Result<Response, ParseError> {
        let status = status
            .parse::<u16>()
            .ok()
            .filter(|code| (100..600).contains(code))
            .ok_or_else(|| self.invalid(pointer, format!("invalid status code '{status}'")))?;
        Ok(Response {
            status,
            headers: self.lower_parameters(&decl.headers, &format!("{pointer}/headers"), true)?,
            body: self.lower_payloads(&decl.body, &format!("{pointer}/body"))?,
            location: self.location(pointer),
        })
    }
}

fn keyword_node(keyword: &str) -> SchemaNode {
    match keyword {
        "object" => SchemaNode::Object(ObjectShape::default()),
        "array" => SchemaNode::Array(ArrayShape::default()),
        "union" => SchemaNode::Union(UnionShape::default()),
        "nil" => SchemaNode::Nil,
        "any" => SchemaNode::Any,
        other => match ScalarKind::from_keyword(other) {
            Some(kind) => SchemaNode::Scalar(ScalarShape {
                kind,
                format: None,
                facets: Facets::default(),
            }),
            None => SchemaNode::Reference(Reference {
                name: other.to_string(),
            }),
        },
    }
}

fn scalar_shape(kind: ScalarKind, decl: &ShapeDecl) -> ScalarShape {
    ScalarShape {
        kind,
        format: decl.format.clone(),
        facets: Facets {
            min_length: decl.min_length,
            max_length: decl.max_length,
            pattern: decl.pattern.clone(),
            minimum: decl.minimum,
            maximum: decl.maximum,
        },
    }
}

fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// `{name}` variables of a path or URI template, in order.
pub fn template_variables(template: &str) -> Vec<String> {
    let mut variables = Vec::new();
    let mut rest = template;
    while let Some(start) = rest.find('{') {
        let Some(len) = rest[start + 1..].find('}') else {
            break;
        };
        variables.push(rest[start + 1..start + 1 + len].to_string());
        rest = &rest[start + len + 2..];
    }
    variables
}
