//! Loading source documents into the schema graph.

pub mod decl;
pub(crate) mod lower;
pub mod source_map;
pub mod validate;

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;

use crate::error::ParseError;
use crate::schema::{DocumentId, DocumentSet};
use decl::DocumentDecl;
use lower::Lowerer;
use source_map::SourceMap;

pub use lower::template_variables;
pub use validate::{ValidationEntry, ValidationLevel, has_errors, validate};

/// Parse a document declaration from YAML.
pub fn from_yaml(file: &str, input: &str) -> Result<DocumentDecl, ParseError> {
    serde_yaml_ng::from_str(input).map_err(|source| ParseError::Yaml {
        file: file.to_string(),
        source,
    })
}

/// Parse a document declaration from JSON.
pub fn from_json(file: &str, input: &str) -> Result<DocumentDecl, ParseError> {
    serde_json::from_str(input).map_err(|source| ParseError::Json {
        file: file.to_string(),
        source,
    })
}

#[derive(Debug)]
struct Pending {
    file: String,
    decl: DocumentDecl,
    source_map: SourceMap,
    /// Library alias → loader key of the used document.
    uses: IndexMap<String, String>,
    is_library: bool,
}

/// Collects documents and their libraries, then lowers them together so
/// cross-document references share one [`DocumentSet`].
#[derive(Debug, Default)]
pub struct Loader {
    pending: Vec<Pending>,
    by_key: HashMap<String, usize>,
}

impl Loader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an in-memory primary document. Its `uses` entries name other
    /// sources by the `file` they were added under.
    pub fn add_source(&mut self, file: &str, text: &str) -> Result<DocumentId, ParseError> {
        self.add_in_memory(file, text, false)
    }

    /// Adds an in-memory library: its types are visible, its endpoints are not.
    pub fn add_library(&mut self, file: &str, text: &str) -> Result<DocumentId, ParseError> {
        self.add_in_memory(file, text, true)
    }

    fn add_in_memory(
        &mut self,
        file: &str,
        text: &str,
        is_library: bool,
    ) -> Result<DocumentId, ParseError> {
        let decl = decode(file, text)?;
        let uses = decl
            .uses
            .iter()
            .map(|(alias, target)| (alias.clone(), target.clone()))
            .collect();
        Ok(self.push(file.to_string(), file, text, decl, uses, is_library))
    }

    /// Reads a primary document and, transitively, the libraries it uses.
    pub fn load_file(&mut self, path: &Path) -> Result<DocumentId, ParseError> {
        self.load_path(path, false)
    }

    fn load_path(&mut self, path: &Path, is_library: bool) -> Result<DocumentId, ParseError> {
        let key = canonical_key(path);
        if let Some(&index) = self.by_key.get(&key) {
            if !is_library {
                self.pending[index].is_library = false;
            }
            return Ok(DocumentId(index as u32));
        }

        let file = path.display().to_string();
        let text = fs::read_to_string(path).map_err(|source| ParseError::Io {
            path: file.clone(),
            source,
        })?;
        let decl = decode(&file, &text)?;

        let base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        let libraries: Vec<(String, PathBuf)> = decl
            .uses
            .iter()
            .map(|(alias, target)| (alias.clone(), base_dir.join(target)))
            .collect();
        let uses = libraries
            .iter()
            .map(|(alias, library)| (alias.clone(), canonical_key(library)))
            .collect();

        let id = self.push(key, &file, &text, decl, uses, is_library);
        for (_, library) in libraries {
            self.load_path(&library, true)?;
        }
        Ok(id)
    }

    fn push(
        &mut self,
        key: String,
        file: &str,
        text: &str,
        decl: DocumentDecl,
        uses: IndexMap<String, String>,
        is_library: bool,
    ) -> DocumentId {
        let index = self.pending.len();
        let source_map = if file.ends_with(".json") {
            SourceMap::default()
        } else {
            SourceMap::from_yaml(text)
        };
        self.pending.push(Pending {
            file: file.to_string(),
            decl,
            source_map,
            uses,
            is_library,
        });
        self.by_key.insert(key, index);
        DocumentId(index as u32)
    }

    /// Lowers every collected document into one [`DocumentSet`].
    pub fn finish(self) -> Result<DocumentSet, ParseError> {
        let mut documents = Vec::with_capacity(self.pending.len());
        for (index, pending) in self.pending.iter().enumerate() {
            let mut uses = IndexMap::new();
            for (alias, key) in &pending.uses {
                let target = self.by_key.get(key).ok_or_else(|| ParseError::UnknownLibrary {
                    file: pending.file.clone(),
                    library: key.clone(),
                })?;
                uses.insert(alias.clone(), DocumentId(*target as u32));
            }
            let lowerer = Lowerer::new(DocumentId(index as u32), &pending.file, &pending.source_map);
            documents.push(lowerer.lower_document(&pending.decl, uses, pending.is_library)?);
        }
        log::debug!("loaded {} document(s)", documents.len());
        Ok(DocumentSet::new(documents))
    }
}

/// Loads primary documents in the order given.
pub fn load_files(paths: &[PathBuf]) -> Result<DocumentSet, ParseError> {
    let mut loader = Loader::new();
    for path in paths {
        loader.load_file(path)?;
    }
    loader.finish()
}

fn decode(file: &str, text: &str) -> Result<DocumentDecl, ParseError> {
    if file.ends_with(".json") {
        from_json(file, text)
    } else {
        from_yaml(file, text)
    }
}

fn canonical_key(path: &Path) -> String {
    fs::canonicalize(path)
        .unwrap_or_else(|_| path.to_path_buf())
        .display()
        .to_string()
}
