use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// One `[[config.folder]]` entry as written in the plugin configuration.
#[derive(Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct FolderSpec {
    #[serde(default)]
    pub label: String,
    /// Path template, may contain `{variable}` tokens.
    pub path: String,
    /// Regular expression matched against the full file name. Blank matches all.
    #[serde(default)]
    pub filter: String,
}

impl FolderSpec {
    #[cfg(test)]
    pub fn new(label: &str, path: &str, filter: &str) -> Self {
        Self {
            label: label.to_string(),
            path: path.to_string(),
            filter: filter.to_string(),
        }
    }
}

/// A configured folder after variable substitution, together with the files found in it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderConfiguration {
    label: String,
    path: PathBuf,
    filter: String,
    files: Vec<PathBuf>,
}

impl FolderConfiguration {
    pub fn new(label: String, path: PathBuf, filter: String) -> Self {
        Self {
            label,
            path,
            filter,
            files: Vec::new(),
        }
    }

    // Only the resolver appends, and only while building the configuration.
    pub(crate) fn add_file(&mut self, file: PathBuf) {
        self.files.push(file);
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn filter(&self) -> &str {
        &self.filter
    }

    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    pub fn contains(&self, file: &Path) -> bool {
        self.files.iter().any(|f| f == file)
    }
}

/// The process and step a plugin instance is running for.
#[derive(Debug, Clone, Default)]
pub struct ProcessContext {
    pub project: String,
    pub step: String,
    pub process_title: String,
    pub process_id: Option<u64>,
    pub step_id: Option<u64>,
    /// Extra variables available to path templates, keyed by lowercase name.
    pub variables: HashMap<String, String>,
}
