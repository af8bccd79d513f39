use std::fmt;

use serde::Serialize;

/// Fully qualified name of a declared type: package plus a nesting path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct DeclaredName {
    pub package: String,
    /// Outermost first; never empty.
    pub names: Vec<String>,
}

impl DeclaredName {
    pub fn new(package: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            names: vec![name.into()],
        }
    }

    /// Splits `a.b.Outer` into package `a.b` and name `Outer`.
    ///
    /// Only for top-level names: a nested `a.b.Outer.Inner` cannot be told
    /// apart from a package and comes back as package `a.b.Outer`. Build
    /// nested names with [`DeclaredName::nested`].
    pub fn from_qualified(qualified: &str) -> Self {
        match qualified.rsplit_once('.') {
            Some((package, name)) => Self::new(package, name),
            None => Self::new("", qualified),
        }
    }

    pub fn simple_name(&self) -> &str {
        self.names.last().map(String::as_str).unwrap_or_default()
    }

    pub fn nested(&self, name: impl Into<String>) -> Self {
        let mut names = self.names.clone();
        names.push(name.into());
        Self {
            package: self.package.clone(),
            names,
        }
    }

    /// Same nesting position with `suffix` appended to the simple name.
    pub fn with_suffix(&self, suffix: &str) -> Self {
        let mut names = self.names.clone();
        if let Some(last) = names.last_mut() {
            last.push_str(suffix);
        }
        Self {
            package: self.package.clone(),
            names,
        }
    }

    pub fn is_nested(&self) -> bool {
        self.names.len() > 1
    }

    pub fn enclosing(&self) -> Option<Self> {
        if !self.is_nested() {
            return None;
        }
        Some(Self {
            package: self.package.clone(),
            names: self.names[..self.names.len() - 1].to_vec(),
        })
    }

    pub fn top_level(&self) -> Self {
        Self {
            package: self.package.clone(),
            names: self.names.iter().take(1).cloned().collect(),
        }
    }

    pub fn qualified(&self) -> String {
        let path = self.names.join(".");
        if self.package.is_empty() {
            path
        } else {
            format!("{}.{path}", self.package)
        }
    }
}

impl fmt::Display for DeclaredName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.qualified())
    }
}

/// Canonical identity of a type as seen by one target.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum TypeName {
    /// A target builtin such as `kotlin.Int` or `number`.
    Primitive { name: String },
    Declared(DeclaredName),
    Sequence { element: Box<TypeName>, unique: bool },
    /// String-keyed map.
    Map { value: Box<TypeName> },
    Optional { wrapped: Box<TypeName> },
    /// Structural union; only produced for targets that support one.
    Union { members: Vec<TypeName> },
    /// A library type applied to arguments, e.g. a reactive publisher.
    Generic { base: DeclaredName, arguments: Vec<TypeName> },
    Any,
    Unit,
}

impl TypeName {
    pub fn primitive(name: impl Into<String>) -> Self {
        Self::Primitive { name: name.into() }
    }

    pub fn declared(name: DeclaredName) -> Self {
        Self::Declared(name)
    }

    pub fn sequence(element: TypeName, unique: bool) -> Self {
        Self::Sequence {
            element: Box::new(element),
            unique,
        }
    }

    pub fn map(value: TypeName) -> Self {
        Self::Map {
            value: Box::new(value),
        }
    }

    pub fn generic(base: DeclaredName, arguments: Vec<TypeName>) -> Self {
        Self::Generic { base, arguments }
    }

    /// Optional form of this type; already-optional types are returned as is.
    pub fn optional(self) -> Self {
        match self {
            Self::Optional { .. } => self,
            other => Self::Optional {
                wrapped: Box::new(other),
            },
        }
    }

    pub fn is_optional(&self) -> bool {
        matches!(self, Self::Optional { .. })
    }

    /// The wrapped type of an optional, or `self`.
    pub fn non_optional(&self) -> &TypeName {
        match self {
            Self::Optional { wrapped } => wrapped,
            other => other,
        }
    }

    pub fn as_declared(&self) -> Option<&DeclaredName> {
        match self.non_optional() {
            Self::Declared(name) => Some(name),
            _ => None,
        }
    }

    /// Builds a structural union, flattening nested unions and dropping
    /// duplicates while keeping first occurrence order.
    pub fn union(members: impl IntoIterator<Item = TypeName>) -> Self {
        let mut flat: Vec<TypeName> = Vec::new();
        for member in members {
            let nested = match member {
                Self::Union { members } => members,
                other => vec![other],
            };
            for m in nested {
                if !flat.contains(&m) {
                    flat.push(m);
                }
            }
        }
        if flat.len() == 1 {
            return flat.remove(0);
        }
        Self::Union { members: flat }
    }
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Primitive { name } => f.write_str(name),
            Self::Declared(name) => write!(f, "{name}"),
            Self::Sequence { element, unique } => {
                let container = if *unique { "Set" } else { "List" };
                write!(f, "{container}<{element}>")
            }
            Self::Map { value } => write!(f, "Map<String, {value}>"),
            Self::Optional { wrapped } => write!(f, "{wrapped}?"),
            Self::Union { members } => {
                let members: Vec<String> = members.iter().map(ToString::to_string).collect();
                f.write_str(&members.join(" | "))
            }
            Self::Generic { base, arguments } => {
                let arguments: Vec<String> = arguments.iter().map(ToString::to_string).collect();
                write!(f, "{base}<{}>", arguments.join(", "))
            }
            Self::Any => f.write_str("Any"),
            Self::Unit => f.write_str("Unit"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn declared_name_nesting() {
        let service = DeclaredName::new("io.test.api", "API");
        let nested = service.nested("FetchTestUriParams");
        assert_eq!(nested.qualified(), "io.test.api.API.FetchTestUriParams");
        assert_eq!(nested.simple_name(), "FetchTestUriParams");
        assert_eq!(nested.enclosing(), Some(service.clone()));
        assert_eq!(nested.top_level(), service);
        assert_eq!(service.enclosing(), None);
        assert_eq!(nested.with_suffix("2").simple_name(), "FetchTestUriParams2");
    }

    #[test]
    fn qualified_names_split_on_last_dot() {
        let name = DeclaredName::from_qualified("org.zalando.problem.AbstractThrowableProblem");
        assert_eq!(name.package, "org.zalando.problem");
        assert_eq!(name.simple_name(), "AbstractThrowableProblem");
        assert_eq!(DeclaredName::from_qualified("Problem").package, "");
    }

    #[test]
    fn optional_is_idempotent() {
        let name = TypeName::primitive("String").optional().optional();
        assert_eq!(name.to_string(), "String?");
        assert_eq!(name.non_optional(), &TypeName::primitive("String"));
    }

    #[test]
    fn unions_flatten_and_dedupe() {
        let a = TypeName::primitive("string");
        let b = TypeName::primitive("number");
        let union = TypeName::union([
            a.clone(),
            TypeName::union([b.clone(), a.clone()]),
        ]);
        assert_eq!(union, TypeName::Union { members: vec![a.clone(), b] });
        assert_eq!(TypeName::union([a.clone(), a.clone()]), a);
    }
}
