use serde::de::{Deserializer, MapAccess, Visitor};
use serde::Deserialize;
use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

use super::matcher::{normalize, split_words};

const BUILTIN_KEYWORDS: &str = include_str!("../../keywords.json");

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("keyword file not found: {}", .path.display())]
    NotFound { path: PathBuf },

    #[error("failed to read keyword file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("malformed keyword file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("category name must not be blank")]
    EmptyCategoryName,

    #[error("duplicate category: {name}")]
    DuplicateCategory { name: String },

    #[error("category '{name}' has no trigger phrases")]
    EmptyCategory { name: String },

    #[error("category '{name}' contains a blank trigger phrase")]
    BlankPhrase { name: String },
}

/// A trigger phrase as stored in the table, with its folded forms cached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Phrase {
    text: String,
    folded: String,
    words: Vec<String>,
}

impl Phrase {
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let folded = normalize(&text);
        let words = split_words(&folded);
        Self {
            text,
            folded,
            words,
        }
    }

    /// Original casing, as written in the keyword file.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn folded(&self) -> &str {
        &self.folded
    }

    pub fn words(&self) -> &[String] {
        &self.words
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    name: String,
    phrases: Vec<Phrase>,
}

impl Category {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn phrases(&self) -> &[Phrase] {
        &self.phrases
    }
}

/// Immutable mapping from category name to trigger phrases.
///
/// Categories are kept sorted by name so that analysis output does not depend
/// on the order of the source file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryTable {
    categories: Vec<Category>,
}

impl CategoryTable {
    pub fn empty() -> Self {
        Self::default()
    }

    /// The curated table shipped with the crate.
    pub fn builtin() -> Result<Self, LoadError> {
        Self::from_json_str(BUILTIN_KEYWORDS)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| {
            if source.kind() == io::ErrorKind::NotFound {
                LoadError::NotFound {
                    path: path.to_path_buf(),
                }
            } else {
                LoadError::Read {
                    path: path.to_path_buf(),
                    source,
                }
            }
        })?;

        let table = Self::from_json_str(&content)?;
        tracing::debug!(
            path = %path.display(),
            categories = table.len(),
            phrases = table.phrase_count(),
            "loaded keyword file"
        );
        Ok(table)
    }

    pub fn from_json_str(content: &str) -> Result<Self, LoadError> {
        let RawEntries(entries) = serde_json::from_str(content)?;
        Self::from_entries(entries)
    }

    pub fn from_entries<I, N, P, S>(entries: I) -> Result<Self, LoadError>
    where
        I: IntoIterator<Item = (N, P)>,
        N: Into<String>,
        P: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut names = HashSet::new();
        let mut categories = Vec::new();

        for (name, phrases) in entries {
            let name: String = name.into();
            if name.trim().is_empty() {
                return Err(LoadError::EmptyCategoryName);
            }
            if !names.insert(name.clone()) {
                return Err(LoadError::DuplicateCategory { name });
            }

            let mut seen = HashSet::new();
            let mut collected = Vec::new();
            for phrase in phrases {
                let phrase = Phrase::new(phrase);
                if phrase.folded().is_empty() {
                    return Err(LoadError::BlankPhrase { name });
                }
                if seen.insert(phrase.text().to_string()) {
                    collected.push(phrase);
                }
            }

            if collected.is_empty() {
                return Err(LoadError::EmptyCategory { name });
            }

            categories.push(Category {
                name,
                phrases: collected,
            });
        }

        categories.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(Self { categories })
    }

    /// Union of `self` and `overlay`. A category present in both keeps the
    /// phrases of each; both inputs are already validated, so the result is.
    pub fn merged(&self, overlay: &CategoryTable) -> CategoryTable {
        let mut categories = self.categories.clone();

        for extra in &overlay.categories {
            match categories.binary_search_by(|c| c.name.cmp(&extra.name)) {
                Ok(i) => {
                    let existing = &mut categories[i];
                    for phrase in &extra.phrases {
                        if !existing.phrases.iter().any(|p| p.text == phrase.text) {
                            existing.phrases.push(phrase.clone());
                        }
                    }
                }
                Err(i) => categories.insert(i, extra.clone()),
            }
        }

        CategoryTable { categories }
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn get(&self, name: &str) -> Option<&Category> {
        self.categories
            .binary_search_by(|c| c.name.as_str().cmp(name))
            .ok()
            .map(|i| &self.categories[i])
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    pub fn phrase_count(&self) -> usize {
        self.categories.iter().map(|c| c.phrases.len()).sum()
    }
}

/// Object entries in file order, duplicates included.
///
/// Deserializing straight into a map would let a repeated category key
/// silently replace the earlier one.
struct RawEntries(Vec<(String, Vec<String>)>);

impl<'de> Deserialize<'de> for RawEntries {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct EntriesVisitor;

        impl<'de> Visitor<'de> for EntriesVisitor {
            type Value = RawEntries;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("an object mapping category names to arrays of phrases")
            }

            fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some((name, phrases)) = map.next_entry::<String, Vec<String>>()? {
                    entries.push((name, phrases));
                }
                Ok(RawEntries(entries))
            }
        }

        deserializer.deserialize_map(EntriesVisitor)
    }
}
