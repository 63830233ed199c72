//! Transform snippets: single-argument M functions applied to a table

use regex::Regex;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::info;
use super::error::RegistryError;
use super::load_with_precedence;

/// `(t as table) as table =>` or `(t as table) as table` + newline + `let`
fn table_signature() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\(\s*(?P<param>\w+)\s+as\s+table\s*\)\s+as\s+table\s*(?:(?P<arrow>=>)|\r?\n\s*(?P<let>let\b))")
            .expect("Invalid table signature regex")
    })
}

/// `(x as <type>) as function`
fn higher_order_signature() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\(\s*(?P<param>\w+)\s+as\s+\w+\s*\)\s+as\s+function\b")
            .expect("Invalid higher-order signature regex")
    })
}

/// Calling convention of a snippet
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnippetKind {
    /// `table -> table`; `body` is the text after the signature
    Table { param: String, body: String },
    /// Returns a `table -> table` function once applied to its arguments
    HigherOrder { param: String },
}

/// A validated transform snippet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snippet {
    /// Canonical name
    pub name: String,
    /// Full snippet text, BOM and surrounding whitespace removed
    pub text: String,
    pub kind: SnippetKind,
}

impl Snippet {
    /// Check the signature and split off the parameter declaration.
    ///
    /// Returns `None` when the text does not start with an accepted signature.
    pub fn parse(name: impl Into<String>, text: impl Into<String>) -> Option<Snippet> {
        let text = text.into();
        let kind = if let Some(caps) = table_signature().captures(&text) {
            let body_start = match (caps.name("arrow"), caps.name("let")) {
                (Some(arrow), _) => arrow.end(),
                (None, Some(let_kw)) => let_kw.start(),
                (None, None) => return None,
            };
            SnippetKind::Table {
                param: caps["param"].to_string(),
                body: text[body_start..].trim().to_string(),
            }
        } else if let Some(caps) = higher_order_signature().captures(&text) {
            SnippetKind::HigherOrder {
                param: caps["param"].to_string(),
            }
        } else {
            return None;
        };

        Some(Snippet {
            name: name.into(),
            text,
            kind,
        })
    }

    pub fn is_higher_order(&self) -> bool {
        matches!(self.kind, SnippetKind::HigherOrder { .. })
    }
}

/// Name → snippet mapping for one compilation run
#[derive(Debug, Clone, Default)]
pub struct TransformRegistry {
    snippets: BTreeMap<String, Snippet>,
    origins: BTreeMap<String, PathBuf>,
}

impl TransformRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from in-memory `(name, text)` pairs; later pairs
    /// override earlier ones.
    pub fn from_texts<I, N, T>(items: I) -> Result<Self, RegistryError>
    where
        I: IntoIterator<Item = (N, T)>,
        N: Into<String>,
        T: Into<String>,
    {
        let mut registry = TransformRegistry::new();
        for (name, text) in items {
            let name = name.into();
            let snippet = Snippet::parse(name.clone(), text)
                .ok_or(RegistryError::InvalidSignature { path: name })?;
            registry.insert(snippet, None);
        }
        Ok(registry)
    }

    /// Insert a snippet, replacing any snippet with the same name
    pub fn insert(&mut self, snippet: Snippet, origin: Option<PathBuf>) {
        match origin {
            Some(path) => {
                self.origins.insert(snippet.name.clone(), path);
            }
            None => {
                self.origins.remove(&snippet.name);
            }
        }
        self.snippets.insert(snippet.name.clone(), snippet);
    }

    pub fn get(&self, name: &str) -> Option<&Snippet> {
        self.snippets.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.snippets.contains_key(name)
    }

    /// File a snippet was loaded from
    pub fn origin(&self, name: &str) -> Option<&Path> {
        self.origins.get(name).map(PathBuf::as_path)
    }

    /// Snippet names in sorted order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.snippets.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.snippets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snippets.is_empty()
    }
}

/// Load `.m` / `.pq` snippets from `dirs`, later directories winning
pub fn load_transforms(dirs: &[PathBuf]) -> Result<TransformRegistry, RegistryError> {
    let loaded = load_with_precedence(dirs, &["m", "pq"], "transform", |name, path, text| {
        let snippet = Snippet::parse(name, text).ok_or_else(|| RegistryError::InvalidSignature {
            path: path.display().to_string(),
        })?;
        Ok((snippet, path.to_path_buf()))
    })?;

    let mut registry = TransformRegistry::new();
    for (snippet, path) in loaded.into_values() {
        registry.insert(snippet, Some(path));
    }
    info!("Loaded {} transform(s) from {} director(ies)", registry.len(), dirs.len());
    Ok(registry)
}
