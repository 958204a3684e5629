use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::config::OutputTarget;

/// Errors that can occur while serializing or persisting the feed.
#[derive(Debug, Error)]
pub enum WriteError {
    /// The XML writer failed to produce the document.
    #[error("Failed to serialize feed: {0}")]
    Serialize(String),

    /// The document could not be written to its destination.
    #[error("Failed to write feed to '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl WriteError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        WriteError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Writes the serialized feed to its destination, replacing prior content.
///
/// For a file target the document goes to a temporary sibling first, is
/// synced to disk, then renamed over the destination. The destination
/// therefore holds either the previous feed or the complete new one, never
/// a truncated mix.
pub fn write_feed(document: &str, target: &OutputTarget) -> Result<(), WriteError> {
    match target {
        OutputTarget::File(path) => write_file_atomically(document, path),
        OutputTarget::Stdout => {
            let stdout = Path::new("<stdout>");
            let mut out = std::io::stdout().lock();
            out.write_all(document.as_bytes())
                .and_then(|()| out.write_all(b"\n"))
                .and_then(|()| out.flush())
                .map_err(|e| WriteError::io(stdout, e))
        }
    }
}

fn write_file_atomically(document: &str, path: &Path) -> Result<(), WriteError> {
    use std::time::{SystemTime, UNIX_EPOCH};

    // Randomized temp filename to prevent TOCTOU race conditions
    let random_suffix = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    let temp_path = path.with_extension(format!("tmp.{:016x}", random_suffix));

    let mut file = std::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&temp_path)
        .map_err(|e| WriteError::io(&temp_path, e))?;

    if let Err(e) = file.write_all(document.as_bytes()).and_then(|()| file.sync_all()) {
        let _ = std::fs::remove_file(&temp_path);
        return Err(WriteError::io(&temp_path, e));
    }

    drop(file);

    // On Windows, rename fails if destination exists, so remove it first
    #[cfg(windows)]
    if path.exists() {
        if let Err(e) = std::fs::remove_file(path) {
            let _ = std::fs::remove_file(&temp_path);
            return Err(WriteError::io(path, e));
        }
    }

    if let Err(e) = std::fs::rename(&temp_path, path) {
        let _ = std::fs::remove_file(&temp_path);
        return Err(WriteError::io(path, e));
    }

    tracing::debug!(path = %path.display(), bytes = document.len(), "Feed written");
    Ok(())
}
