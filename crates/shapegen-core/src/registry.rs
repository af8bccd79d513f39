//! Per-target store of every type definition produced in one invocation.

use std::collections::HashMap;

use indexmap::IndexMap;
use log::debug;

use crate::error::{Location, ResolveError};
use crate::ir::{DeclaredName, TypeCategory, TypeDefinition, TypeName, VariantDefinition};
use crate::naming;
use crate::schema::ShapeId;
use crate::target::{FeatureSet, GenerationMode, TargetProfile};

/// Memoization key: a shape plus the scope it was resolved in.
///
/// Declared shapes resolve identically everywhere and carry no scope.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResolutionKey {
    pub shape: ShapeId,
    pub scope: Option<DeclaredName>,
}

impl ResolutionKey {
    pub fn declared(shape: ShapeId) -> Self {
        Self { shape, scope: None }
    }

    pub fn scoped(shape: ShapeId, scope: DeclaredName) -> Self {
        Self {
            shape,
            scope: Some(scope),
        }
    }
}

/// How a collision on a claimed name is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NamePolicy {
    /// Declared in the source; a collision is an error.
    Explicit,
    /// Built from a scope; a collision gets a counter suffix.
    Synthesized,
}

/// Membership of an object in a discriminated union.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantAssignment {
    pub base: DeclaredName,
    pub property: String,
    pub value: String,
    pub external: bool,
}

#[derive(Debug)]
enum Entry {
    /// Name claimed, definition still being built.
    Pending,
    Complete(TypeDefinition),
}

/// Registrations for one target and mode.
///
/// Every identity is registered at most once. A name is claimed before its
/// definition is built so recursive references resolve to it.
#[derive(Debug)]
pub struct TypeRegistry<T: TargetProfile> {
    profile: T,
    features: FeatureSet<T::Feature>,
    mode: GenerationMode,
    model_package: String,
    resolved: HashMap<ResolutionKey, TypeName>,
    owners: HashMap<ResolutionKey, DeclaredName>,
    definitions: IndexMap<DeclaredName, Entry>,
    problems: IndexMap<String, DeclaredName>,
    variants: IndexMap<DeclaredName, Vec<VariantDefinition>>,
    assignments: HashMap<ShapeId, VariantAssignment>,
    fallback_notes: HashMap<ShapeId, String>,
}

impl<T: TargetProfile> TypeRegistry<T> {
    pub fn new(
        profile: T,
        features: FeatureSet<T::Feature>,
        mode: GenerationMode,
        model_package: impl Into<String>,
    ) -> Self {
        Self {
            profile,
            features,
            mode,
            model_package: model_package.into(),
            resolved: HashMap::new(),
            owners: HashMap::new(),
            definitions: IndexMap::new(),
            problems: IndexMap::new(),
            variants: IndexMap::new(),
            assignments: HashMap::new(),
            fallback_notes: HashMap::new(),
        }
    }

    pub fn profile(&self) -> &T {
        &self.profile
    }

    pub fn features(&self) -> &FeatureSet<T::Feature> {
        &self.features
    }

    pub fn mode(&self) -> GenerationMode {
        self.mode
    }

    pub fn model_package(&self) -> &str {
        &self.model_package
    }

    pub fn recall(&self, key: &ResolutionKey) -> Option<&TypeName> {
        self.resolved.get(key)
    }

    pub fn remember(&mut self, key: ResolutionKey, type_name: TypeName) {
        self.resolved.insert(key, type_name);
    }

    /// Name registered for `key`, complete or not.
    pub fn owner(&self, key: &ResolutionKey) -> Option<&DeclaredName> {
        self.owners.get(key)
    }

    pub fn contains(&self, name: &DeclaredName) -> bool {
        self.definitions.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Registers the definition for `key` once.
    ///
    /// A known key returns its name without calling `build`. Otherwise the
    /// name is claimed, `build` runs with the claimed name, and the result
    /// completes the entry.
    pub fn register<F>(
        &mut self,
        key: ResolutionKey,
        name: DeclaredName,
        policy: NamePolicy,
        location: &Location,
        build: F,
    ) -> Result<DeclaredName, ResolveError>
    where
        F: FnOnce(&mut Self, &DeclaredName) -> Result<TypeDefinition, ResolveError>,
    {
        if let Some(owner) = self.owners.get(&key) {
            return Ok(owner.clone());
        }

        let name = self.claim(name, policy, location)?;
        debug!("registering {name} for {}", key.shape);
        self.definitions.insert(name.clone(), Entry::Pending);
        self.owners.insert(key, name.clone());

        let definition = build(self, &name)?;
        self.definitions
            .insert(name.clone(), Entry::Complete(definition));
        Ok(name)
    }

    fn claim(
        &self,
        name: DeclaredName,
        policy: NamePolicy,
        location: &Location,
    ) -> Result<DeclaredName, ResolveError> {
        if !self.definitions.contains_key(&name) {
            return Ok(name);
        }
        match policy {
            NamePolicy::Explicit => Err(ResolveError::DuplicateTypeName {
                name: name.simple_name().to_string(),
                package: name.package.clone(),
                location: location.clone(),
            }),
            NamePolicy::Synthesized => {
                let simple = naming::unique_name(name.simple_name(), |candidate| {
                    self.definitions.contains_key(&renamed(&name, candidate))
                });
                Ok(renamed(&name, &simple))
            }
        }
    }

    pub fn definition(&self, name: &DeclaredName) -> Option<&TypeDefinition> {
        match self.definitions.get(name)? {
            Entry::Complete(definition) => Some(definition),
            Entry::Pending => None,
        }
    }

    pub fn definition_mut(&mut self, name: &DeclaredName) -> Option<&mut TypeDefinition> {
        match self.definitions.get_mut(name)? {
            Entry::Complete(definition) => Some(definition),
            Entry::Pending => None,
        }
    }

    pub fn assign_variant(&mut self, shape: ShapeId, assignment: VariantAssignment) {
        self.assignments.entry(shape).or_insert(assignment);
    }

    pub fn variant_assignment(&self, shape: ShapeId) -> Option<&VariantAssignment> {
        self.assignments.get(&shape)
    }

    /// Records `variant` under the discriminated `base`; repeats are ignored.
    pub fn add_variant(&mut self, base: &DeclaredName, variant: VariantDefinition) {
        let variants = self.variants.entry(base.clone()).or_default();
        if !variants.iter().any(|v| v.type_name == variant.type_name) {
            variants.push(variant);
        }
    }

    /// Makes an already built `member` a variant of `assignment.base`.
    pub fn apply_variant(&mut self, member: &DeclaredName, assignment: &VariantAssignment) {
        let base = TypeName::Declared(assignment.base.clone());
        if let Some(definition) = self.definition_mut(member) {
            if !definition.supertypes.contains(&base) {
                definition.supertypes.push(base);
            }
            definition
                .properties
                .retain(|property| property.name != assignment.property);
            definition.discriminator_value = Some(assignment.value.clone());
        }
        self.add_variant(
            &assignment.base,
            VariantDefinition {
                value: assignment.value.clone(),
                type_name: TypeName::Declared(member.clone()),
            },
        );
    }

    pub fn note_fallback(&mut self, shape: ShapeId, note: String) {
        self.fallback_notes.insert(shape, note);
    }

    pub fn fallback_note(&self, shape: ShapeId) -> Option<&str> {
        self.fallback_notes.get(&shape).map(String::as_str)
    }

    /// Stores the type of problem `code`.
    ///
    /// A later definition of the same code replaces the earlier one. Any
    /// other type already holding the name is a collision.
    pub fn define_problem_type(
        &mut self,
        code: &str,
        definition: TypeDefinition,
        location: &Location,
    ) -> Result<DeclaredName, ResolveError> {
        let name = definition.name.clone();
        if let Some(previous) = self.problems.get(code).cloned() {
            self.definitions.shift_remove(&previous);
        }
        let name = self.claim(name, NamePolicy::Explicit, location)?;
        debug!("problem type {code} -> {name}");
        self.problems.insert(code.to_string(), name.clone());
        self.definitions
            .insert(name.clone(), Entry::Complete(definition));
        Ok(name)
    }

    /// Stores a type derived from another one, such as its patch form.
    /// The name must still be free.
    pub fn define_companion(
        &mut self,
        definition: TypeDefinition,
        location: &Location,
    ) -> Result<DeclaredName, ResolveError> {
        let name = self.claim(definition.name.clone(), NamePolicy::Explicit, location)?;
        debug!("companion type {name}");
        self.definitions
            .insert(name.clone(), Entry::Complete(definition));
        Ok(name)
    }

    pub fn problem_type(&self, code: &str) -> Option<&DeclaredName> {
        self.problems.get(code)
    }

    pub fn add_service_type(
        &mut self,
        definition: TypeDefinition,
        location: &Location,
    ) -> Result<(), ResolveError> {
        if self.definitions.contains_key(&definition.name) {
            return Err(ResolveError::DuplicateService {
                name: definition.name.to_string(),
                location: location.clone(),
            });
        }
        debug!("service type {}", definition.name);
        self.definitions
            .insert(definition.name.clone(), Entry::Complete(definition));
        Ok(())
    }

    /// Finalizes the registry.
    ///
    /// Fails if a claimed name never received its definition.
    pub fn build_types(self) -> Result<GeneratedTypes, ResolveError> {
        let mut types = IndexMap::with_capacity(self.definitions.len());
        for (name, entry) in self.definitions {
            match entry {
                Entry::Complete(definition) => {
                    types.insert(name, definition);
                }
                Entry::Pending => {
                    return Err(ResolveError::IncompleteForwardReference {
                        name: name.to_string(),
                    });
                }
            }
        }

        for (base, variants) in self.variants {
            if let Some(definition) = types.get_mut(&base) {
                definition.variants = variants;
            }
        }

        let nested: Vec<(DeclaredName, DeclaredName)> = types
            .keys()
            .filter_map(|name| name.enclosing().map(|outer| (outer, name.clone())))
            .collect();
        for (outer, inner) in nested {
            if let Some(definition) = types.get_mut(&outer) {
                definition.nested.push(inner);
            }
        }

        for definition in types.values_mut() {
            self.profile.decorate_type(&self.features, definition);
        }

        Ok(GeneratedTypes { types })
    }
}

fn renamed(name: &DeclaredName, simple: &str) -> DeclaredName {
    let mut renamed = name.clone();
    if let Some(last) = renamed.names.last_mut() {
        *last = simple.to_string();
    }
    renamed
}

/// The finished, immutable type model of one target.
#[derive(Debug, Clone, Default)]
pub struct GeneratedTypes {
    types: IndexMap<DeclaredName, TypeDefinition>,
}

impl GeneratedTypes {
    pub fn get(&self, name: &DeclaredName) -> Option<&TypeDefinition> {
        self.types.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&DeclaredName, &TypeDefinition)> {
        self.types.iter()
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// First definition with the given simple name.
    pub fn find(&self, simple_name: &str) -> Option<&TypeDefinition> {
        self.types
            .values()
            .find(|definition| definition.name.simple_name() == simple_name)
    }

    /// Definitions not nested inside another generated definition.
    pub fn top_level(&self) -> impl Iterator<Item = &TypeDefinition> {
        self.types.values().filter(|definition| {
            definition
                .name
                .enclosing()
                .is_none_or(|outer| !self.types.contains_key(&outer))
        })
    }

    /// Keeps only definitions in `categories`, along with the types nested
    /// inside them.
    pub fn filter_categories(&self, categories: &[TypeCategory]) -> GeneratedTypes {
        let types = self
            .types
            .iter()
            .filter(|(name, _)| {
                let outermost = name.top_level();
                let category = self
                    .types
                    .get(&outermost)
                    .or_else(|| self.types.get(*name))
                    .map(|definition| definition.category);
                category.is_some_and(|category| categories.contains(&category))
            })
            .map(|(name, definition)| (name.clone(), definition.clone()))
            .collect();
        GeneratedTypes { types }
    }
}
