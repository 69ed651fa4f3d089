use crate::app::models::FolderConfiguration;
use crate::app::storage::Storage;
use std::path::Path;

/// Shown instead of a size when the file cannot be inspected.
pub const SIZE_PLACEHOLDER: &str = "-";

const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];

/// Human readable size of `path`, or [`SIZE_PLACEHOLDER`] if the storage cannot tell.
pub fn file_size_display(storage: &dyn Storage, path: &Path) -> String {
    match storage.file_size(path) {
        Ok(size) => format_size(size),
        Err(err) => {
            log::error!("Failed to read size of {}: {}", path.display(), err);
            SIZE_PLACEHOLDER.to_string()
        }
    }
}

/// Formats a byte count with binary units and at most one decimal, e.g. `1.5 KB`.
pub fn format_size(bytes: u64) -> String {
    let mut group = 0;
    let mut threshold = 1024u64;
    while group < UNITS.len() - 1 && bytes >= threshold {
        group += 1;
        threshold = threshold.saturating_mul(1024);
    }

    let value = bytes as f64 / 1024f64.powi(group as i32);
    let rounded = format!("{value:.1}");
    let (int_part, frac_part) = rounded.split_once('.').unwrap_or((rounded.as_str(), "0"));

    let mut out = group_thousands(int_part);
    if frac_part != "0" {
        out.push('.');
        out.push_str(frac_part);
    }
    out.push(' ');
    out.push_str(UNITS[group]);
    out
}

fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

pub struct OutputGenerator;

impl OutputGenerator {
    /// Renders every folder with its files and their sizes, one file per indented line.
    pub fn generate_listing(folders: &[FolderConfiguration], storage: &dyn Storage) -> String {
        let mut blocks = Vec::new();

        for folder in folders {
            let mut block = format!("{} ({})", display_label(folder), folder.path().display());
            if !folder.filter().trim().is_empty() {
                block.push_str(&format!(" [filter: {}]", folder.filter()));
            }

            if folder.files().is_empty() {
                block.push_str("\n    (no files)");
            }
            for file in folder.files() {
                let name = file.file_name().unwrap_or_default().to_string_lossy();
                block.push_str(&format!(
                    "\n    {}  {}",
                    name,
                    file_size_display(storage, file)
                ));
            }
            blocks.push(block);
        }

        blocks.join("\n\n")
    }
}

fn display_label(folder: &FolderConfiguration) -> &str {
    if folder.label().is_empty() {
        "<unnamed>"
    } else {
        folder.label()
    }
}
