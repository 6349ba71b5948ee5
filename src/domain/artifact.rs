//! Artifact sets produced by generation.
//!
//! An ArtifactSet maps filenames to full text content. The generator always
//! produces the two required files; the publisher adds the license before
//! persisting.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Entry document every artifact set must contain
pub const INDEX_HTML: &str = "index.html";

/// Description document every artifact set must contain
pub const README_MD: &str = "README.md";

/// License file added by the publisher, never by the generator
pub const LICENSE_FILE: &str = "LICENSE";

/// Named text files destined for one repository
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArtifactSet {
    files: BTreeMap<String, String>,
}

impl ArtifactSet {
    /// Create an empty artifact set
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a set from a parsed JSON object, keeping string-valued entries.
    ///
    /// Returns `None` unless both required files are present as strings;
    /// entries with non-string values are dropped.
    pub fn from_json_object(value: &serde_json::Value) -> Option<Self> {
        let object = value.as_object()?;

        let mut set = Self::new();
        for (name, content) in object {
            if let Some(text) = content.as_str() {
                set.insert(name, text);
            }
        }

        if set.has_required_files() {
            Some(set)
        } else {
            None
        }
    }

    /// Insert or replace a file
    pub fn insert(&mut self, name: impl Into<String>, content: impl Into<String>) {
        self.files.insert(name.into(), content.into());
    }

    /// Look up a file's content
    pub fn get(&self, name: &str) -> Option<&str> {
        self.files.get(name).map(String::as_str)
    }

    /// Check whether a file is present
    pub fn contains(&self, name: &str) -> bool {
        self.files.contains_key(name)
    }

    /// Both required files are present
    pub fn has_required_files(&self) -> bool {
        self.contains(INDEX_HTML) && self.contains(README_MD)
    }

    /// Iterate files in deterministic (lexicographic) order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.files.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of files in the set
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// True when the set holds no files
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}
