use crate::ir::DeclaredName;
use crate::schema::DocumentId;

/// Where a resolution happens: the document a shape is read from and the
/// name an inline shape would be given.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionContext {
    pub document: DocumentId,
    pub scope: Option<DeclaredName>,
}

impl ResolutionContext {
    pub fn new(document: DocumentId) -> Self {
        Self {
            document,
            scope: None,
        }
    }

    pub fn scoped(document: DocumentId, scope: DeclaredName) -> Self {
        Self {
            document,
            scope: Some(scope),
        }
    }

    /// Same document, inner scope.
    pub fn nested(&self, scope: DeclaredName) -> Self {
        Self::scoped(self.document, scope)
    }

    /// Scope with `suffix` appended to its simple name, if there is one.
    pub fn suffixed(&self, suffix: &str) -> Self {
        Self {
            document: self.document,
            scope: self.scope.as_ref().map(|scope| scope.with_suffix(suffix)),
        }
    }

    pub fn in_document(&self, document: DocumentId) -> Self {
        Self {
            document,
            scope: self.scope.clone(),
        }
    }
}
