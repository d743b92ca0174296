//! Text/binary classification
//!
//! Files with a well-known text extension are trusted outright. Anything else
//! is sniffed: a null byte within the first few KB marks the file as binary.
//! Unreadable files classify as binary, which routes them to the plain
//! newer-wins copy path.

use std::collections::HashSet;

use crate::{NormalizedPath, io};

/// Bytes inspected when the extension is not conclusive.
pub const DEFAULT_SNIFF_BYTES: usize = 8192;

/// Extensions (lowercase, without dot) that are always treated as text.
pub const TEXT_EXTENSIONS: &[&str] = &[
    "txt", "md", "json", "yaml", "yml", "xml", "html", "css", "js", "py", "sh", "bash", "zsh",
    "conf", "cfg", "ini", "toml", "csv", "tsv", "log", "env", "rs",
];

/// Dotfile names that are always treated as text.
pub const TEXT_FILE_NAMES: &[&str] = &[".gitignore", ".dockerignore", ".env"];

/// Decides whether a file takes part in three-way merging.
#[derive(Debug, Clone)]
pub struct TextClassifier {
    extensions: HashSet<String>,
    sniff_bytes: usize,
}

impl Default for TextClassifier {
    fn default() -> Self {
        Self::new(DEFAULT_SNIFF_BYTES)
    }
}

impl TextClassifier {
    /// Classifier with the built-in extension list.
    pub fn new(sniff_bytes: usize) -> Self {
        Self {
            extensions: TEXT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            sniff_bytes,
        }
    }

    /// Trust additional extensions. Leading dots and case are ignored.
    pub fn with_extensions<I, S>(mut self, extra: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for ext in extra {
            let ext = ext.as_ref().trim_start_matches('.').to_lowercase();
            if !ext.is_empty() {
                self.extensions.insert(ext);
            }
        }
        self
    }

    /// Whether the extension (or dotfile name) alone marks `path` as text.
    pub fn has_text_extension(&self, path: &NormalizedPath) -> bool {
        if let Some(name) = path.file_name()
            && TEXT_FILE_NAMES.contains(&name.to_lowercase().as_str())
        {
            return true;
        }
        path.extension()
            .map(|ext| self.extensions.contains(&ext.to_lowercase()))
            .unwrap_or(false)
    }

    /// Classify the file at `path`.
    pub fn is_text(&self, path: &NormalizedPath) -> bool {
        if self.has_text_extension(path) {
            return true;
        }

        match io::read_prefix(path, self.sniff_bytes) {
            Ok(prefix) => !prefix.contains(&0),
            Err(e) => {
                tracing::debug!(path = %path, error = %e, "Unreadable file classified as binary");
                false
            }
        }
    }
}
