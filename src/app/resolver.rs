use crate::app::error::{FolderError, Result};
use crate::app::models::{FolderConfiguration, FolderSpec};
use crate::app::storage::Storage;
use crate::app::substitution::Substitute;
use regex::Regex;
use std::path::{Path, PathBuf};

/// Resolves every folder spec, in order, into a populated `FolderConfiguration`.
///
/// A folder that is missing, is not a directory or cannot be listed still produces
/// a configuration with an empty file list. Bad path templates and bad filters are
/// returned as errors.
pub fn resolve(
    specs: &[FolderSpec],
    substitute: &dyn Substitute,
    storage: &dyn Storage,
) -> Result<Vec<FolderConfiguration>> {
    let mut configured = Vec::with_capacity(specs.len());

    for spec in specs {
        let path = PathBuf::from(substitute.substitute(&spec.path)?);
        let matcher = FilenameFilter::new(&spec.label, &spec.filter)?;

        let mut folder = FolderConfiguration::new(spec.label.clone(), path, spec.filter.clone());
        discover(&mut folder, &matcher, storage);

        log::debug!(
            "Folder '{}' at {} holds {} matching file(s)",
            folder.label(),
            folder.path().display(),
            folder.files().len()
        );
        configured.push(folder);
    }

    Ok(configured)
}

fn discover(folder: &mut FolderConfiguration, matcher: &FilenameFilter, storage: &dyn Storage) {
    if !storage.is_directory(folder.path()) {
        log::debug!(
            "Folder '{}' at {} is not a directory, nothing to list",
            folder.label(),
            folder.path().display()
        );
        return;
    }

    let content = match storage.list_files(folder.path()) {
        Ok(content) => content,
        Err(err) => {
            log::warn!(
                "Failed to list folder '{}' at {}: {}",
                folder.label(),
                folder.path().display(),
                err
            );
            return;
        }
    };

    for file in content {
        if matcher.matches(&file) {
            folder.add_file(file);
        }
    }
}

/// Regular expression that must match a whole file name.
#[derive(Debug)]
struct FilenameFilter {
    regex: Option<Regex>,
}

impl FilenameFilter {
    fn new(label: &str, filter: &str) -> Result<Self> {
        if filter.trim().is_empty() {
            return Ok(Self { regex: None });
        }

        let regex = Regex::new(&format!("^(?:{filter})$")).map_err(|source| {
            FolderError::InvalidFilter {
                label: label.to_string(),
                filter: filter.to_string(),
                source,
            }
        })?;
        Ok(Self { regex: Some(regex) })
    }

    fn matches(&self, file: &Path) -> bool {
        let Some(regex) = &self.regex else {
            return true;
        };
        file.file_name()
            .map(|name| regex.is_match(&name.to_string_lossy()))
            .unwrap_or(false)
    }
}
