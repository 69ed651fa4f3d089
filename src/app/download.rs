use crate::app::storage::Storage;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

/// Destination of a download: a byte sink that also carries response metadata.
///
/// Metadata is always set before the first byte is written.
pub trait DownloadSink: Write {
    /// Drops metadata and anything buffered from a previous response.
    fn reset(&mut self);

    fn set_content_type(&mut self, content_type: &str);

    fn set_content_length(&mut self, length: u64);

    fn set_attachment_filename(&mut self, filename: &str);

    /// Called once all bytes have been copied.
    fn complete(&mut self) -> io::Result<()> {
        self.flush()
    }
}

/// Content type of `path` guessed from its extension.
pub fn content_type_for(path: &Path) -> String {
    mime_guess::from_path(path)
        .first_raw()
        .unwrap_or(FALLBACK_CONTENT_TYPE)
        .to_string()
}

/// Value of the `Content-Disposition` header for an attachment.
pub fn content_disposition(filename: &str) -> String {
    format!("attachment; filename={filename}")
}

/// Streams the file at `path` into `sink`.
///
/// Returns the number of bytes copied, or `None` if the transfer failed. Failures
/// are logged and never retried; the sink keeps whatever was written before the error.
pub fn stream_download(storage: &dyn Storage, path: &Path, sink: &mut dyn DownloadSink) -> Option<u64> {
    match try_stream(storage, path, sink) {
        Ok(copied) => {
            log::info!("Downloaded {} ({} bytes)", path.display(), copied);
            Some(copied)
        }
        Err(err) => {
            log::error!("Download of {} failed: {}", path.display(), err);
            None
        }
    }
}

fn try_stream(storage: &dyn Storage, path: &Path, sink: &mut dyn DownloadSink) -> io::Result<u64> {
    let mut input = storage.open_read(path)?;
    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "path has no file name"))?;
    let length = storage.file_size(path)?;

    sink.reset();
    sink.set_content_type(&content_type_for(path));
    sink.set_attachment_filename(&filename);
    sink.set_content_length(length);

    let copied = io::copy(&mut input, &mut *sink)?;
    sink.complete()?;
    Ok(copied)
}

/// Saves downloads into a directory under their attachment filename.
///
/// Bytes go to `<name>.part` first; the finished file is renamed into place
/// in `complete`, so the target name is never opened for writing.
#[derive(Debug)]
pub struct FileSink {
    dir: PathBuf,
    filename: Option<String>,
    writer: Option<BufWriter<File>>,
}

impl FileSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            filename: None,
            writer: None,
        }
    }

    /// Where the current download is written, once a filename is known.
    pub fn target(&self) -> Option<PathBuf> {
        self.filename.as_ref().map(|name| self.dir.join(name))
    }

    fn partial(&self) -> Option<PathBuf> {
        self.filename
            .as_ref()
            .map(|name| self.dir.join(format!("{name}.part")))
    }

    fn writer(&mut self) -> io::Result<&mut BufWriter<File>> {
        if self.writer.is_none() {
            let partial = self.partial().ok_or_else(|| {
                io::Error::new(io::ErrorKind::Other, "attachment filename not set")
            })?;
            self.writer = Some(BufWriter::new(File::create(partial)?));
        }
        self.writer
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "output not open"))
    }
}

impl Write for FileSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.writer()?.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.writer.as_mut() {
            Some(writer) => writer.flush(),
            None => Ok(()),
        }
    }
}

impl DownloadSink for FileSink {
    fn reset(&mut self) {
        self.filename = None;
        self.writer = None;
    }

    fn set_content_type(&mut self, content_type: &str) {
        log::debug!("Content-Type: {}", content_type);
    }

    fn set_content_length(&mut self, length: u64) {
        log::debug!("Content-Length: {}", length);
    }

    fn set_attachment_filename(&mut self, filename: &str) {
        log::debug!("Content-Disposition: {}", content_disposition(filename));
        self.filename = Some(filename.to_string());
    }

    fn complete(&mut self) -> io::Result<()> {
        // Empty files never see a write, so open here as well.
        self.writer()?.flush()?;
        self.writer = None;

        let (Some(partial), Some(target)) = (self.partial(), self.target()) else {
            return Err(io::Error::new(io::ErrorKind::Other, "attachment filename not set"));
        };
        fs::rename(partial, target)
    }
}

/// True if saving `source` into `dir` would land on `source` itself.
pub fn overwrites_source(dir: &Path, source: &Path) -> bool {
    let Some(name) = source.file_name() else {
        return false;
    };
    match (fs::canonicalize(dir.join(name)), fs::canonicalize(source)) {
        (Ok(target), Ok(source)) => target == source,
        _ => false,
    }
}

/// Writes downloads to standard output; metadata goes to the log.
#[derive(Debug, Default)]
pub struct StdoutSink;

impl Write for StdoutSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        io::stdout().lock().write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        io::stdout().lock().flush()
    }
}

impl DownloadSink for StdoutSink {
    fn reset(&mut self) {}

    fn set_content_type(&mut self, content_type: &str) {
        log::info!("Content-Type: {}", content_type);
    }

    fn set_content_length(&mut self, length: u64) {
        log::info!("Content-Length: {}", length);
    }

    fn set_attachment_filename(&mut self, filename: &str) {
        log::info!("Content-Disposition: {}", content_disposition(filename));
    }
}
