//! Maps schema shapes to type names, registering definitions on first visit.

mod context;
mod guard;

use std::collections::HashSet;

use log::{debug, warn};

pub use context::ResolutionContext;
pub use guard::{DEFAULT_DEPTH_LIMIT, RecursionGuard};

use crate::error::{Location, ResolveError};
use crate::ir::{
    CodeParameter, CodecAnnotation, ConstantDefinition, Constraint, DeclaredName,
    DiscriminatorDefinition, EnumCase, FeatureAnnotation, PropertyDefinition,
    PropertyImplementation, TypeCategory, TypeDefinition, TypeKind, TypeName, VariantDefinition,
};
use crate::naming;
use crate::problem::ProblemTypeDefinition;
use crate::registry::{NamePolicy, ResolutionKey, TypeRegistry, VariantAssignment};
use crate::schema::{
    AnnotationName, ArrayShape, DocumentId, DocumentSet, EnumShape, ObjectShape, PropertyShape,
    ScalarKind, ScalarShape, SchemaNode, Shape, ShapeId, UnionShape,
};
use crate::target::{Primitive, TargetProfile};

/// Simple name given to an inline shape resolved without a scope.
const UNSCOPED_NAME: &str = "InlineType";

/// Simple name of the patch form nested in a `patchable` model.
const PATCH_NAME: &str = "Patch";

/// Maps a scalar keyword and format to a primitive category.
pub fn scalar_primitive(
    kind: ScalarKind,
    format: Option<&str>,
    location: &Location,
) -> Result<Primitive, ResolveError> {
    let primitive = match kind {
        ScalarKind::String => Primitive::String,
        ScalarKind::Boolean => Primitive::Boolean,
        ScalarKind::Integer => match format {
            None | Some("int32") | Some("int") => Primitive::Int32,
            Some("int8") => Primitive::Int8,
            Some("int16") => Primitive::Int16,
            Some("int64") | Some("long") => Primitive::Int64,
            Some(other) => {
                return Err(ResolveError::UnsupportedIntegerFormat {
                    format: other.to_string(),
                    location: location.clone(),
                });
            }
        },
        ScalarKind::Number => match format {
            None | Some("double") => Primitive::Double,
            Some("float") => Primitive::Float,
            Some("decimal") => Primitive::Decimal,
            Some(other) => {
                return Err(ResolveError::UnsupportedNumberFormat {
                    format: other.to_string(),
                    location: location.clone(),
                });
            }
        },
        ScalarKind::Date => Primitive::Date,
        ScalarKind::Time => Primitive::Time,
        ScalarKind::DateTimeOnly => Primitive::DateTimeOnly,
        ScalarKind::DateTime => Primitive::DateTime,
        ScalarKind::Duration => Primitive::Duration,
        ScalarKind::Uuid => Primitive::Uuid,
        ScalarKind::Uri => Primitive::Uri,
        ScalarKind::Binary => Primitive::Bytes,
    };
    Ok(primitive)
}

/// The discriminated hierarchy an object belongs to through inheritance.
struct Inherited<'d> {
    root: &'d Shape,
    property: String,
    external: bool,
}

/// Walks shapes of one document set. All mutable state lives in the registry
/// and guard passed to each call.
#[derive(Debug, Clone, Copy)]
pub struct ShapeResolver<'d> {
    documents: &'d DocumentSet,
}

impl<'d> ShapeResolver<'d> {
    pub fn new(documents: &'d DocumentSet) -> Self {
        Self { documents }
    }

    pub fn documents(&self) -> &'d DocumentSet {
        self.documents
    }

    /// Package declared types of `document` are placed in.
    pub fn model_package<T: TargetProfile>(
        &self,
        registry: &TypeRegistry<T>,
        document: DocumentId,
    ) -> String {
        self.documents
            .document(document)
            .and_then(|doc| {
                doc.annotations
                    .string(AnnotationName::ModelPackage, Some(registry.mode()))
            })
            .map(str::to_string)
            .unwrap_or_else(|| registry.model_package().to_string())
    }

    /// Type name of `shape` in `ctx`.
    ///
    /// The same shape in the same scope always yields the same name and its
    /// definition is registered once. A shape reached again while still being
    /// resolved yields its claimed name.
    pub fn resolve_type_name<T: TargetProfile>(
        &self,
        registry: &mut TypeRegistry<T>,
        guard: &mut RecursionGuard,
        shape: ShapeId,
        ctx: &ResolutionContext,
    ) -> Result<TypeName, ResolveError> {
        let shape = self.documents.expect_shape(shape)?;
        let key = self.key(shape, ctx);

        if let Some(known) = registry.recall(&key) {
            return Ok(known.clone());
        }
        if guard.is_in_progress(&key) {
            return match registry.owner(&key) {
                Some(owner) => {
                    debug!("forward reference to {owner}");
                    Ok(TypeName::Declared(owner.clone()))
                }
                None => Err(ResolveError::RecursiveAlias {
                    name: describe(shape),
                    location: shape.location.clone(),
                }),
            };
        }

        guard.enter(key.clone(), &shape.location)?;
        let result = self.resolve_shape(registry, guard, shape, &key, ctx);
        guard.exit(&key);

        let type_name = result?;
        debug!("{} resolved to {type_name}", shape.id);
        registry.remember(key, type_name.clone());
        Ok(type_name)
    }

    fn key(&self, shape: &Shape, ctx: &ResolutionContext) -> ResolutionKey {
        let scoped = !shape.is_declared()
            && matches!(
                shape.node,
                SchemaNode::Object(_)
                    | SchemaNode::Union(_)
                    | SchemaNode::Enum(_)
                    | SchemaNode::Array(_)
            );
        match (&ctx.scope, scoped) {
            (Some(scope), true) => ResolutionKey::scoped(shape.id, scope.clone()),
            _ => ResolutionKey::declared(shape.id),
        }
    }

    fn resolve_shape<T: TargetProfile>(
        &self,
        registry: &mut TypeRegistry<T>,
        guard: &mut RecursionGuard,
        shape: &'d Shape,
        key: &ResolutionKey,
        ctx: &ResolutionContext,
    ) -> Result<TypeName, ResolveError> {
        if shape.is_declared() {
            let override_name = registry.profile().type_override();
            if let Some(name) = shape.annotations.string(override_name, Some(registry.mode())) {
                return Ok(TypeName::Declared(DeclaredName::from_qualified(name)));
            }
        }

        let type_name = match &shape.node {
            SchemaNode::Reference(reference) => {
                let target = self
                    .documents
                    .lookup_type(shape.id.document, &reference.name)
                    .ok_or_else(|| ResolveError::UnresolvedRef {
                        name: reference.name.clone(),
                        location: shape.location.clone(),
                    })?;
                self.resolve_type_name(registry, guard, target, &ctx.in_document(target.document))
            }
            SchemaNode::Scalar(scalar) => self.scalar_type(registry, scalar, &shape.location),
            SchemaNode::Nil => Ok(TypeName::Unit),
            SchemaNode::Any => Ok(registry.profile().any()),
            SchemaNode::Enum(enumeration) => {
                self.resolve_enum(registry, shape, enumeration, key, ctx)
            }
            SchemaNode::Array(array) => self.resolve_array(registry, guard, shape, array, ctx),
            SchemaNode::Object(object) => {
                self.resolve_object(registry, guard, shape, object, key, ctx)
            }
            SchemaNode::Union(union) => {
                self.resolve_union(registry, guard, shape, union, key, ctx)
            }
        }?;

        if type_name.as_declared().is_some_and(DeclaredName::is_nested) && shape.is_declared() {
            self.resolve_enclosing(registry, guard, shape, &type_name)?;
        }
        Ok(type_name)
    }

    /// Enclosing declaration and simple name a `nested` annotation places
    /// `shape` at.
    fn nesting<T: TargetProfile>(
        &self,
        registry: &TypeRegistry<T>,
        shape: &Shape,
    ) -> Result<Option<(&'d Shape, String)>, ResolveError> {
        let Some(nesting) = shape
            .annotations
            .get(AnnotationName::Nested, Some(registry.mode()))
        else {
            return Ok(None);
        };
        let invalid = |reason: String| ResolveError::InvalidAnnotation {
            annotation: AnnotationName::Nested.id(),
            reason,
            location: shape.location.clone(),
        };
        let field = |name: &str| {
            nesting
                .get(name)
                .and_then(serde_json::Value::as_str)
                .ok_or_else(|| invalid(format!("missing '{name}'")))
        };
        let enclosed_in = field("enclosedIn")?;
        let name = field("name")?;

        let enclosing = self
            .documents
            .lookup_type(shape.id.document, enclosed_in)
            .ok_or_else(|| invalid(format!("unknown enclosing type '{enclosed_in}'")))?;
        let enclosing = self.documents.dereference(enclosing)?;
        let defines_type = enclosing.is_declared()
            && matches!(
                enclosing.node,
                SchemaNode::Object(_) | SchemaNode::Enum(_) | SchemaNode::Union(_)
            );
        if !defines_type || enclosing.id == shape.id {
            return Err(invalid(format!(
                "'{enclosed_in}' does not define a type to nest in"
            )));
        }
        Ok(Some((enclosing, naming::to_upper_camel_case(name))))
    }

    /// Name of a declared shape, following `nested` annotations outward.
    fn declared_name<T: TargetProfile>(
        &self,
        registry: &TypeRegistry<T>,
        shape: &Shape,
        name: &str,
    ) -> Result<DeclaredName, ResolveError> {
        let mut path = Vec::new();
        let mut visited = vec![shape.id];
        let mut current = shape;
        let mut simple = naming::to_upper_camel_case(name);
        while let Some((enclosing, nested)) = self.nesting(registry, current)? {
            if visited.contains(&enclosing.id) {
                return Err(ResolveError::InvalidAnnotation {
                    annotation: AnnotationName::Nested.id(),
                    reason: "enclosing types form a cycle".to_string(),
                    location: shape.location.clone(),
                });
            }
            visited.push(enclosing.id);
            path.push(nested);
            current = enclosing;
            simple = enclosing
                .name
                .as_deref()
                .map(naming::to_upper_camel_case)
                .unwrap_or_default();
        }

        let package = self.model_package(registry, current.id.document);
        let mut declared = DeclaredName::new(package, simple);
        for nested in path.into_iter().rev() {
            declared = declared.nested(nested);
        }
        Ok(declared)
    }

    /// Makes sure the type a nested declaration sits in is generated too.
    fn resolve_enclosing<T: TargetProfile>(
        &self,
        registry: &mut TypeRegistry<T>,
        guard: &mut RecursionGuard,
        shape: &'d Shape,
        type_name: &TypeName,
    ) -> Result<(), ResolveError> {
        let Some((enclosing, _)) = self.nesting(registry, shape)? else {
            return Ok(());
        };
        let ctx = ResolutionContext::new(enclosing.id.document);
        let resolved = self.resolve_type_name(registry, guard, enclosing.id, &ctx)?;
        let expected = type_name.as_declared().and_then(DeclaredName::enclosing);
        if resolved.as_declared() != expected.as_ref() {
            return Err(ResolveError::InvalidAnnotation {
                annotation: AnnotationName::Nested.id(),
                reason: format!("enclosing type resolved to '{resolved}', not a generated type"),
                location: shape.location.clone(),
            });
        }
        Ok(())
    }

    fn scalar_type<T: TargetProfile>(
        &self,
        registry: &TypeRegistry<T>,
        scalar: &ScalarShape,
        location: &Location,
    ) -> Result<TypeName, ResolveError> {
        let primitive = scalar_primitive(scalar.kind, scalar.format.as_deref(), location)?;
        Ok(registry.profile().primitive(primitive))
    }

    /// Name an object, enum or union registers under, and how collisions on
    /// it are treated.
    fn definition_name<T: TargetProfile>(
        &self,
        registry: &TypeRegistry<T>,
        shape: &Shape,
        ctx: &ResolutionContext,
    ) -> Result<(DeclaredName, NamePolicy), ResolveError> {
        let named = match (&shape.name, &ctx.scope) {
            (Some(name), _) => (self.declared_name(registry, shape, name)?, NamePolicy::Explicit),
            (None, Some(scope)) => (scope.clone(), NamePolicy::Synthesized),
            (None, None) => {
                let package = self.model_package(registry, shape.id.document);
                (DeclaredName::new(package, UNSCOPED_NAME), NamePolicy::Synthesized)
            }
        };
        Ok(named)
    }

    fn resolve_enum<T: TargetProfile>(
        &self,
        registry: &mut TypeRegistry<T>,
        shape: &'d Shape,
        enumeration: &'d EnumShape,
        key: &ResolutionKey,
        ctx: &ResolutionContext,
    ) -> Result<TypeName, ResolveError> {
        let raw_value_type = registry.profile().primitive(scalar_primitive(
            enumeration.scalar,
            enumeration.format.as_deref(),
            &shape.location,
        )?);
        let (name, policy) = self.definition_name(registry, shape, ctx)?;

        let name = registry.register(key.clone(), name, policy, &shape.location, |registry, name| {
            let mut definition = TypeDefinition::new(name.clone(), TypeKind::Enum, TypeCategory::Model);
            let mut identifiers: Vec<String> = Vec::with_capacity(enumeration.values.len());
            for value in &enumeration.values {
                let literal = match value {
                    serde_json::Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                let base = registry.profile().enum_case_name(&literal);
                let identifier = naming::unique_name(&base, |candidate| {
                    identifiers.iter().any(|taken| taken == candidate)
                });
                identifiers.push(identifier.clone());
                definition.enum_cases.push(EnumCase {
                    identifier,
                    value: value.clone(),
                });
            }
            definition.raw_value_type = Some(raw_value_type);
            definition.documentation = shape.description.clone();
            definition.source = Some(shape.location.clone());
            Ok(definition)
        })?;
        Ok(TypeName::Declared(name))
    }

    fn resolve_array<T: TargetProfile>(
        &self,
        registry: &mut TypeRegistry<T>,
        guard: &mut RecursionGuard,
        shape: &'d Shape,
        array: &ArrayShape,
        ctx: &ResolutionContext,
    ) -> Result<TypeName, ResolveError> {
        let element = match array.items {
            Some(items) => {
                let item_ctx = match &shape.name {
                    Some(_) => {
                        let (name, _) = self.definition_name(registry, shape, ctx)?;
                        ctx.nested(name.with_suffix("Item"))
                    }
                    None => ctx.suffixed("Item"),
                };
                self.resolve_type_name(registry, guard, items, &item_ctx)?
            }
            None => registry.profile().any(),
        };
        Ok(TypeName::sequence(element, array.unique))
    }

    fn resolve_object<T: TargetProfile>(
        &self,
        registry: &mut TypeRegistry<T>,
        guard: &mut RecursionGuard,
        shape: &'d Shape,
        object: &'d ObjectShape,
        key: &ResolutionKey,
        ctx: &ResolutionContext,
    ) -> Result<TypeName, ResolveError> {
        if object.externally_discriminated && object.discriminator.is_none() {
            return Err(ResolveError::MissingExternalDiscriminator {
                location: shape.location.clone(),
            });
        }

        let assigned = registry.variant_assignment(shape.id).is_some();
        let inherited = self.inherited_discriminator(object)?;

        if object.properties.is_empty()
            && object.parent.is_none()
            && object.discriminator.is_none()
            && object.discriminator_value.is_none()
            && !assigned
        {
            let value = match object.additional_properties {
                Some(additional) => self.resolve_type_name(
                    registry,
                    guard,
                    additional,
                    &ctx.suffixed("Value"),
                )?,
                None => registry.profile().any(),
            };
            return Ok(TypeName::map(value));
        }

        if let Some(parent) = object.parent {
            if object.properties.is_empty()
                && object.additional_properties.is_none()
                && object.discriminator.is_none()
                && object.discriminator_value.is_none()
                && inherited.is_none()
                && !assigned
            {
                return self.resolve_type_name(registry, guard, parent, ctx);
            }
        }

        let fresh = registry.owner(key).is_none();
        let (name, policy) = self.definition_name(registry, shape, ctx)?;
        let name = registry.register(key.clone(), name, policy, &shape.location, |registry, name| {
            self.build_object(registry, guard, shape, object, inherited, name, ctx)
        })?;

        if fresh && object.discriminator.is_some() {
            self.resolve_inheritors(registry, guard, shape)?;
        }
        Ok(TypeName::Declared(name))
    }

    #[allow(clippy::too_many_arguments)]
    fn build_object<T: TargetProfile>(
        &self,
        registry: &mut TypeRegistry<T>,
        guard: &mut RecursionGuard,
        shape: &'d Shape,
        object: &'d ObjectShape,
        inherited: Option<Inherited<'d>>,
        name: &DeclaredName,
        ctx: &ResolutionContext,
    ) -> Result<TypeDefinition, ResolveError> {
        let is_root = object.discriminator.is_some();
        let kind = if is_root {
            TypeKind::Sealed
        } else {
            registry.profile().model_kind(registry.features())
        };
        let mut definition = TypeDefinition::new(name.clone(), kind, TypeCategory::Model);
        definition.is_abstract = is_root;
        definition.documentation = shape.description.clone();
        definition.source = Some(shape.location.clone());

        if let Some(parent) = object.parent {
            let parent_ctx = ctx.nested(name.with_suffix("Parent"));
            let parent_type = self.resolve_type_name(registry, guard, parent, &parent_ctx)?;
            definition.supertypes.push(parent_type);
        }

        if let Some(property) = &object.discriminator {
            let external = object.externally_discriminated;
            if !external && !self.declares_property(shape, property)? {
                return Err(ResolveError::DiscriminatorNotFound {
                    property: property.clone(),
                    location: shape.location.clone(),
                });
            }
            definition.discriminator = Some(DiscriminatorDefinition {
                property: property.clone(),
                external,
            });
        }

        let mut properties = Vec::with_capacity(object.properties.len());
        for property in &object.properties {
            properties.push(self.build_property(registry, guard, shape, object, property, name)?);
        }
        definition.properties = properties;

        // Union membership may be assigned while the properties resolve.
        if let Some(assignment) = registry.variant_assignment(shape.id).cloned() {
            let base = TypeName::Declared(assignment.base.clone());
            if !definition.supertypes.contains(&base) {
                definition.supertypes.push(base);
            }
            let value = object
                .discriminator_value
                .clone()
                .unwrap_or_else(|| assignment.value.clone());
            definition
                .properties
                .retain(|property| property.name != assignment.property);
            definition.discriminator_value = Some(value.clone());
            registry.add_variant(
                &assignment.base,
                VariantDefinition {
                    value,
                    type_name: TypeName::Declared(name.clone()),
                },
            );
        } else if let Some(inherited) = inherited {
            let root_ctx = ResolutionContext::new(inherited.root.id.document);
            let root = self.resolve_type_name(registry, guard, inherited.root.id, &root_ctx)?;
            let value = object
                .discriminator_value
                .clone()
                .or_else(|| shape.name.clone())
                .unwrap_or_else(|| name.simple_name().to_string());
            definition
                .properties
                .retain(|property| property.name != inherited.property);
            definition.discriminator_value = Some(value.clone());
            if let Some(root) = root.as_declared() {
                registry.add_variant(
                    root,
                    VariantDefinition {
                        value,
                        type_name: TypeName::Declared(name.clone()),
                    },
                );
            }
            debug!(
                "{name} joins hierarchy discriminated by '{}'{}",
                inherited.property,
                if inherited.external { " (external)" } else { "" }
            );
        }

        if shape
            .annotations
            .flag(AnnotationName::Patchable, Some(registry.mode()))
        {
            let patch = patch_definition(registry, &definition);
            registry.define_companion(patch, &shape.location)?;
        }

        Ok(definition)
    }

    fn build_property<T: TargetProfile>(
        &self,
        registry: &mut TypeRegistry<T>,
        guard: &mut RecursionGuard,
        owner_shape: &'d Shape,
        owner: &'d ObjectShape,
        property: &'d PropertyShape,
        owner_name: &DeclaredName,
    ) -> Result<PropertyDefinition, ResolveError> {
        let scope = owner_name.nested(naming::to_upper_camel_case(&property.name));
        let ctx = ResolutionContext::scoped(owner_shape.id.document, scope);
        let mut type_name = self.resolve_type_name(registry, guard, property.shape, &ctx)?;
        if !property.required {
            type_name = type_name.optional();
        }

        let declared = self.documents.expect_shape(property.shape)?;
        let target = self.documents.dereference(property.shape)?;

        let mut annotations = Vec::new();
        if let Some(sibling) = declared
            .annotations
            .string(AnnotationName::ExternalDiscriminator, Some(registry.mode()))
        {
            if target.as_object().is_none() {
                return Err(ResolveError::ExternalDiscriminatorRange {
                    location: property.location.clone(),
                });
            }
            if !owner.properties.iter().any(|p| p.name == sibling) {
                return Err(ResolveError::ExternalDiscriminatorNotFound {
                    property: sibling.to_string(),
                    location: property.location.clone(),
                });
            }
            annotations.push(FeatureAnnotation::Codec(CodecAnnotation::ExternalTypeId {
                property: sibling.to_string(),
            }));
        }

        let note = registry
            .fallback_note(property.shape)
            .or_else(|| registry.fallback_note(target.id))
            .map(str::to_string);
        let documentation = match (declared.description.clone(), note) {
            (Some(description), Some(note)) => Some(format!("{description}\n\n{note}")),
            (description, note) => description.or(note),
        };

        let implementation_annotation = registry.profile().implementation_override();
        let implementation = declared
            .annotations
            .get(implementation_annotation, Some(registry.mode()))
            .map(|value| {
                property_implementation(value, implementation_annotation, &property.location)
            })
            .transpose()?;

        let mut definition = PropertyDefinition {
            name: property.name.clone(),
            identifier: registry.profile().property_identifier(&property.name),
            type_name,
            required: property.required,
            default: declared.default.clone().or_else(|| target.default.clone()),
            documentation,
            annotations,
            implementation,
        };
        let constraints = constraints(target, &definition.type_name);
        registry
            .profile()
            .decorate_property(registry.features(), &mut definition, &constraints);
        Ok(definition)
    }

    /// Ancestors of `object` nearest first, following parent references.
    fn ancestors(&self, object: &'d ObjectShape) -> Result<Vec<&'d Shape>, ResolveError> {
        let mut ancestors = Vec::new();
        let mut seen = HashSet::new();
        let mut next = object.parent;
        while let Some(parent) = next {
            let shape = self.documents.dereference(parent)?;
            if !seen.insert(shape.id) {
                break;
            }
            ancestors.push(shape);
            next = shape.as_object().and_then(|object| object.parent);
        }
        Ok(ancestors)
    }

    fn inherited_discriminator(
        &self,
        object: &'d ObjectShape,
    ) -> Result<Option<Inherited<'d>>, ResolveError> {
        for ancestor in self.ancestors(object)? {
            if let Some(parent) = ancestor.as_object() {
                if let Some(property) = &parent.discriminator {
                    return Ok(Some(Inherited {
                        root: ancestor,
                        property: property.clone(),
                        external: parent.externally_discriminated,
                    }));
                }
            }
        }
        Ok(None)
    }

    /// Whether `shape` or one of its ancestors declares `property`.
    fn declares_property(&self, shape: &'d Shape, property: &str) -> Result<bool, ResolveError> {
        let Some(object) = shape.as_object() else {
            return Ok(false);
        };
        if object.properties.iter().any(|p| p.name == property) {
            return Ok(true);
        }
        Ok(self.ancestors(object)?.iter().any(|ancestor| {
            ancestor
                .as_object()
                .is_some_and(|o| o.properties.iter().any(|p| p.name == property))
        }))
    }

    /// Resolves every declared type that inherits from `root`, wherever it
    /// is declared, so the hierarchy is complete even if a variant is never
    /// referenced directly.
    fn resolve_inheritors<T: TargetProfile>(
        &self,
        registry: &mut TypeRegistry<T>,
        guard: &mut RecursionGuard,
        root: &'d Shape,
    ) -> Result<(), ResolveError> {
        for document in self.documents.documents() {
            for id in document.types.values() {
                let Some(candidate) = document.shape(*id) else {
                    continue;
                };
                let Some(object) = candidate.as_object() else {
                    continue;
                };
                if self
                    .ancestors(object)?
                    .iter()
                    .any(|ancestor| ancestor.id == root.id)
                {
                    let ctx = ResolutionContext::new(document.id);
                    self.resolve_type_name(registry, guard, *id, &ctx)?;
                }
            }
        }
        Ok(())
    }

    fn resolve_union<T: TargetProfile>(
        &self,
        registry: &mut TypeRegistry<T>,
        guard: &mut RecursionGuard,
        shape: &'d Shape,
        union: &'d UnionShape,
        key: &ResolutionKey,
        ctx: &ResolutionContext,
    ) -> Result<TypeName, ResolveError> {
        let mut optional = false;
        let mut members = Vec::with_capacity(union.members.len());
        for member in &union.members {
            if matches!(self.documents.dereference(*member)?.node, SchemaNode::Nil) {
                optional = true;
            } else {
                members.push(*member);
            }
        }

        let discriminated = union.discriminator.is_some() || union.externally_discriminated;
        let type_name = if discriminated {
            self.resolve_discriminated_union(registry, guard, shape, union, &members, key, ctx)?
        } else if members.is_empty() {
            TypeName::Unit
        } else if members.len() == 1 {
            self.resolve_type_name(registry, guard, members[0], &ctx.suffixed("Member1"))?
        } else if registry.profile().supports_structural_unions() {
            if shape.is_declared() {
                self.resolve_union_alias(registry, guard, shape, &members, key, ctx)?
            } else {
                self.union_members(registry, guard, &members, ctx)?
            }
        } else {
            self.common_ancestor(registry, guard, shape, &members)?
        };

        Ok(if optional { type_name.optional() } else { type_name })
    }

    fn union_members<T: TargetProfile>(
        &self,
        registry: &mut TypeRegistry<T>,
        guard: &mut RecursionGuard,
        members: &[ShapeId],
        ctx: &ResolutionContext,
    ) -> Result<TypeName, ResolveError> {
        let mut resolved = Vec::with_capacity(members.len());
        for (index, member) in members.iter().enumerate() {
            let member_ctx = ctx.suffixed(&format!("Member{}", index + 1));
            resolved.push(self.resolve_type_name(registry, guard, *member, &member_ctx)?);
        }
        Ok(TypeName::union(resolved))
    }

    /// A declared structural union is registered under its own name before
    /// its members resolve, so members may refer back to it.
    fn resolve_union_alias<T: TargetProfile>(
        &self,
        registry: &mut TypeRegistry<T>,
        guard: &mut RecursionGuard,
        shape: &'d Shape,
        members: &[ShapeId],
        key: &ResolutionKey,
        ctx: &ResolutionContext,
    ) -> Result<TypeName, ResolveError> {
        let (name, policy) = self.definition_name(registry, shape, ctx)?;
        let name = registry.register(key.clone(), name, policy, &shape.location, |registry, name| {
            let member_ctx = ctx.nested(name.clone());
            let aliased = self.union_members(registry, guard, members, &member_ctx)?;
            let mut definition = TypeDefinition::new(name.clone(), TypeKind::Alias, TypeCategory::Model);
            definition.aliased = Some(aliased);
            definition.documentation = shape.description.clone();
            definition.source = Some(shape.location.clone());
            Ok(definition)
        })?;
        Ok(TypeName::Declared(name))
    }

    #[allow(clippy::too_many_arguments)]
    fn resolve_discriminated_union<T: TargetProfile>(
        &self,
        registry: &mut TypeRegistry<T>,
        guard: &mut RecursionGuard,
        shape: &'d Shape,
        union: &'d UnionShape,
        members: &[ShapeId],
        key: &ResolutionKey,
        ctx: &ResolutionContext,
    ) -> Result<TypeName, ResolveError> {
        let property = union.discriminator.clone().ok_or_else(|| {
            ResolveError::MissingExternalDiscriminator {
                location: shape.location.clone(),
            }
        })?;
        let external = union.externally_discriminated;

        let (name, policy) = self.definition_name(registry, shape, ctx)?;
        let name = registry.register(key.clone(), name, policy, &shape.location, |registry, name| {
            let mut definition = TypeDefinition::new(name.clone(), TypeKind::Sealed, TypeCategory::Model);
            definition.is_abstract = true;
            definition.documentation = shape.description.clone();
            definition.source = Some(shape.location.clone());
            definition.discriminator = Some(DiscriminatorDefinition {
                property: property.clone(),
                external,
            });
            if !external {
                let profile = registry.profile();
                definition.properties.push(PropertyDefinition {
                    name: property.clone(),
                    identifier: profile.property_identifier(&property),
                    type_name: profile.primitive(Primitive::String),
                    required: true,
                    default: None,
                    documentation: None,
                    annotations: Vec::new(),
                    implementation: None,
                });
            }

            for (index, member) in members.iter().enumerate() {
                let target = self.documents.dereference(*member)?;
                let Some(object) = target.as_object() else {
                    return Err(ResolveError::UnionMemberNotObject {
                        location: target.location.clone(),
                    });
                };
                let member_ctx = ResolutionContext::scoped(
                    target.id.document,
                    name.with_suffix(&format!("Member{}", index + 1)),
                );
                let value = object
                    .discriminator_value
                    .clone()
                    .or_else(|| target.name.clone())
                    .or_else(|| member_ctx.scope.as_ref().map(|s| s.simple_name().to_string()))
                    .unwrap_or_default();
                let assignment = VariantAssignment {
                    base: name.clone(),
                    property: property.clone(),
                    value,
                    external,
                };
                registry.assign_variant(target.id, assignment.clone());

                let member_type = self.resolve_type_name(registry, guard, target.id, &member_ctx)?;
                if let Some(member_name) = member_type.as_declared() {
                    registry.apply_variant(member_name, &assignment);
                }
            }
            Ok(definition)
        })?;
        Ok(TypeName::Declared(name))
    }

    /// Lossy stand-in for a union on targets without structural unions: the
    /// nearest declared ancestor shared by every member, else Any.
    fn common_ancestor<T: TargetProfile>(
        &self,
        registry: &mut TypeRegistry<T>,
        guard: &mut RecursionGuard,
        shape: &'d Shape,
        members: &[ShapeId],
    ) -> Result<TypeName, ResolveError> {
        let mut chains: Vec<Vec<ShapeId>> = Vec::with_capacity(members.len());
        let mut described = Vec::with_capacity(members.len());
        for member in members {
            let target = self.documents.dereference(*member)?;
            described.push(describe(target));
            let mut chain = Vec::new();
            if let Some(object) = target.as_object() {
                if target.is_declared() {
                    chain.push(target.id);
                }
                chain.extend(self.ancestors(object)?.iter().map(|ancestor| ancestor.id));
            }
            chains.push(chain);
        }

        let shared = chains.first().and_then(|first| {
            first
                .iter()
                .find(|candidate| chains[1..].iter().all(|chain| chain.contains(*candidate)))
                .copied()
        });
        let fallback = match shared {
            Some(ancestor) => {
                let ctx = ResolutionContext::new(ancestor.document);
                self.resolve_type_name(registry, guard, ancestor, &ctx)?
            }
            None => registry.profile().any(),
        };

        let note = format!(
            "Union of {} is represented as {fallback}; member types are not checked.",
            described.join(" | ")
        );
        warn!("{}: {note}", shape.location);
        registry.note_fallback(shape.id, note);
        Ok(fallback)
    }

    /// Type name for a type reference written as text, such as a problem
    /// custom field. A trailing `?` makes it optional.
    pub fn resolve_type_reference<T: TargetProfile>(
        &self,
        registry: &mut TypeRegistry<T>,
        guard: &mut RecursionGuard,
        document: DocumentId,
        reference: &str,
        location: &Location,
    ) -> Result<TypeName, ResolveError> {
        let (name, optional) = match reference.strip_suffix('?') {
            Some(name) => (name, true),
            None => (reference, false),
        };
        let type_name = match name {
            "object" => TypeName::map(registry.profile().any()),
            "any" => registry.profile().any(),
            "nil" => TypeName::Unit,
            keyword => match ScalarKind::from_keyword(keyword) {
                Some(kind) => registry
                    .profile()
                    .primitive(scalar_primitive(kind, None, location)?),
                None => {
                    let shape = self.documents.lookup_type(document, keyword).ok_or_else(|| {
                        ResolveError::InvalidTypeReference {
                            name: reference.to_string(),
                            location: location.clone(),
                        }
                    })?;
                    self.resolve_type_name(registry, guard, shape, &ResolutionContext::new(shape.document))?
                }
            },
        };
        Ok(if optional { type_name.optional() } else { type_name })
    }

    /// Registers the type modeling `problem` and returns its name.
    pub fn define_problem_type<T: TargetProfile>(
        &self,
        registry: &mut TypeRegistry<T>,
        guard: &mut RecursionGuard,
        problem: &ProblemTypeDefinition,
    ) -> Result<DeclaredName, ResolveError> {
        let package = self.model_package(registry, problem.defined_in);
        let name = DeclaredName::new(
            package,
            format!("{}Problem", naming::to_upper_camel_case(&problem.code)),
        );

        let mut definition = TypeDefinition::new(name.clone(), TypeKind::Problem, TypeCategory::Model);
        definition.supertypes.push(TypeName::Declared(DeclaredName::from_qualified(
            registry.profile().problem_library().supertype,
        )));

        let profile = registry.profile();
        definition.constants = vec![
            ConstantDefinition {
                name: "TYPE".into(),
                type_name: profile.primitive(Primitive::Uri),
                value: problem.type_uri.clone().into(),
            },
            ConstantDefinition {
                name: "STATUS".into(),
                type_name: profile.primitive(Primitive::Int32),
                value: problem.status.into(),
            },
            ConstantDefinition {
                name: "TITLE".into(),
                type_name: profile.primitive(Primitive::String),
                value: problem.title.clone().into(),
            },
            ConstantDefinition {
                name: "DETAIL".into(),
                type_name: profile.primitive(Primitive::String),
                value: problem.detail.clone().into(),
            },
        ];

        for (field, reference) in &problem.custom {
            let type_name = self.resolve_type_reference(
                registry,
                guard,
                problem.defined_in,
                reference,
                &problem.source,
            )?;
            definition.properties.push(PropertyDefinition {
                name: field.clone(),
                identifier: registry.profile().property_identifier(field),
                required: !type_name.is_optional(),
                type_name,
                default: None,
                documentation: None,
                annotations: Vec::new(),
                implementation: None,
            });
        }

        definition.documentation = Some(problem.title.clone());
        definition.source = Some(problem.source.clone());
        definition.problem = Some(problem.clone());
        registry.define_problem_type(&problem.code, definition, &problem.source)
    }
}

/// Validation constraints implied by the facets of `shape`.
fn constraints(shape: &Shape, type_name: &TypeName) -> Vec<Constraint> {
    let mut constraints = Vec::new();
    match &shape.node {
        SchemaNode::Scalar(scalar) => {
            let facets = &scalar.facets;
            match scalar.kind {
                ScalarKind::String => {
                    if facets.min_length.is_some() || facets.max_length.is_some() {
                        constraints.push(Constraint::Size {
                            min: facets.min_length,
                            max: facets.max_length,
                        });
                    }
                    if let Some(pattern) = facets.pattern.as_ref().filter(|p| *p != ".*") {
                        constraints.push(Constraint::Pattern {
                            regex: pattern.clone(),
                        });
                    }
                }
                ScalarKind::Integer => {
                    if let Some(min) = facets.minimum {
                        constraints.push(Constraint::Min { value: min as i64 });
                    }
                    if let Some(max) = facets.maximum {
                        constraints.push(Constraint::Max { value: max as i64 });
                    }
                }
                ScalarKind::Number => {
                    if let Some(min) = facets.minimum {
                        constraints.push(Constraint::DecimalMin {
                            value: min.to_string(),
                        });
                    }
                    if let Some(max) = facets.maximum {
                        constraints.push(Constraint::DecimalMax {
                            value: max.to_string(),
                        });
                    }
                }
                _ => {}
            }
        }
        SchemaNode::Array(array) => {
            if array.min_items.is_some() || array.max_items.is_some() {
                constraints.push(Constraint::Size {
                    min: array.min_items,
                    max: array.max_items,
                });
            }
        }
        SchemaNode::Object(_) | SchemaNode::Union(_) => {
            if type_name.as_declared().is_some() {
                constraints.push(Constraint::Valid);
            }
        }
        _ => {}
    }
    constraints
}

/// Patch form of `owner`: every stored property, optional and able to
/// carry an explicit null.
fn patch_definition<T: TargetProfile>(
    registry: &TypeRegistry<T>,
    owner: &TypeDefinition,
) -> TypeDefinition {
    let profile = registry.profile();
    let mut patch = TypeDefinition::new(
        owner.name.nested(PATCH_NAME),
        TypeKind::Class,
        TypeCategory::Model,
    );
    patch.source = owner.source.clone();
    for property in owner.properties.iter().filter(|p| p.implementation.is_none()) {
        let mut field = PropertyDefinition {
            name: property.name.clone(),
            identifier: property.identifier.clone(),
            type_name: profile.patch_value(property.type_name.clone()),
            required: false,
            default: None,
            documentation: None,
            annotations: Vec::new(),
            implementation: None,
        };
        profile.decorate_property(registry.features(), &mut field, &[]);
        patch.properties.push(field);
    }
    patch
}

/// Reads a `{code, parameters}` annotation describing a computed property.
fn property_implementation(
    value: &serde_json::Value,
    annotation: AnnotationName,
    location: &Location,
) -> Result<PropertyImplementation, ResolveError> {
    let invalid = |reason: &str| ResolveError::InvalidAnnotation {
        annotation: annotation.id(),
        reason: reason.to_string(),
        location: location.clone(),
    };
    let fields = value
        .as_object()
        .ok_or_else(|| invalid("expected an object with 'code'"))?;
    let code = fields
        .get("code")
        .and_then(serde_json::Value::as_str)
        .unwrap_or_default()
        .to_string();

    let mut parameters = Vec::new();
    let declared = fields.get("parameters").and_then(serde_json::Value::as_array);
    for parameter in declared.into_iter().flatten() {
        let kind = parameter.get("type").and_then(serde_json::Value::as_str);
        let value = parameter.get("value").map(|value| match value {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        });
        let parameter = match (kind, value) {
            (Some("Type"), Some(value)) => {
                CodeParameter::Type(TypeName::Declared(DeclaredName::from_qualified(&value)))
            }
            (Some(_), Some(value)) => CodeParameter::Literal(value),
            _ => return Err(invalid("each parameter needs a 'type' and a 'value'")),
        };
        parameters.push(parameter);
    }
    Ok(PropertyImplementation { code, parameters })
}

fn describe(shape: &Shape) -> String {
    shape
        .name
        .clone()
        .unwrap_or_else(|| format!("{} {}", shape.node.kind_name(), shape.id))
}

#[cfg(test)]
mod tests;
