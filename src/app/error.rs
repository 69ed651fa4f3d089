use std::path::PathBuf;

/// Errors raised while reading the plugin configuration or setting up folders.
///
/// Only configuration problems surface to the caller. I/O failures during
/// discovery, size queries and downloads are logged and recovered where they happen.
#[derive(Debug, thiserror::Error)]
pub enum FolderError {
    #[error("Unresolved variable {{{variable}}} in path template '{template}'")]
    UnresolvedVariable { template: String, variable: String },

    #[error("Invalid filter '{filter}' for folder '{label}': {source}")]
    InvalidFilter {
        label: String,
        filter: String,
        #[source]
        source: regex::Error,
    },

    #[error("No configuration block matches project '{project}' and step '{step}'")]
    NoMatchingConfig { project: String, step: String },

    #[error("Failed to read config at {0:?}: {1}")]
    ConfigRead(PathBuf, #[source] std::io::Error),

    #[error("Failed to parse config at {0:?}: {1}")]
    ConfigParse(PathBuf, #[source] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, FolderError>;
