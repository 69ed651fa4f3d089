use ignore::WalkBuilder;
use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Path, PathBuf};

/// Filesystem operations the plugin needs from its host.
pub trait Storage {
    fn is_directory(&self, path: &Path) -> bool;

    /// Regular files directly inside `dir`, in the storage's own order.
    fn list_files(&self, dir: &Path) -> io::Result<Vec<PathBuf>>;

    fn file_size(&self, path: &Path) -> io::Result<u64>;

    fn open_read(&self, path: &Path) -> io::Result<Box<dyn Read>>;
}

/// Storage backed by the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalStorage;

impl Storage for LocalStorage {
    fn is_directory(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn list_files(&self, dir: &Path) -> io::Result<Vec<PathBuf>> {
        // Surface unreadable directories as errors; the walker would only report them per entry.
        fs::read_dir(dir)?;

        let walker = WalkBuilder::new(dir)
            .standard_filters(false)
            .follow_links(true)
            .max_depth(Some(1))
            .sort_by_file_name(|a, b| a.cmp(b))
            .build();

        let mut files = Vec::new();
        for result in walker {
            match result {
                Ok(entry) => {
                    if entry.depth() == 0 {
                        continue;
                    }
                    if entry.file_type().is_some_and(|t| t.is_file()) {
                        files.push(entry.into_path());
                    }
                }
                Err(err) => log::warn!("Error listing entry in {}: {}", dir.display(), err),
            }
        }
        Ok(files)
    }

    fn file_size(&self, path: &Path) -> io::Result<u64> {
        let metadata = fs::metadata(path)?;
        if !metadata.is_file() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{} is not a regular file", path.display()),
            ));
        }
        Ok(metadata.len())
    }

    fn open_read(&self, path: &Path) -> io::Result<Box<dyn Read>> {
        Ok(Box::new(File::open(path)?))
    }
}
