//! All-or-nothing output writing.
//!
//! Changed files are first written to temporary files in their destination
//! directory; only when every one of them is staged are they renamed into
//! place. Files whose content is already up to date are left untouched.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::{Builder, NamedTempFile};
use tracing::debug;

/// Failure to stage or persist one output.
#[derive(Debug, thiserror::Error)]
#[error("cannot write {}: {source}", .path.display())]
pub struct OutputError {
    pub path: PathBuf,
    #[source]
    pub source: io::Error,
}

impl OutputError {
    fn new(path: &Path, source: io::Error) -> Self {
        Self {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// What happened to each output.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteReport {
    pub written: Vec<PathBuf>,
    pub unchanged: Vec<PathBuf>,
}

struct Staged<'a> {
    path: &'a Path,
    file: NamedTempFile,
}

fn is_current(path: &Path, content: &str) -> bool {
    fs::read(path).is_ok_and(|existing| existing == content.as_bytes())
}

fn stage<'a>(path: &'a Path, content: &str) -> Result<Staged<'a>, OutputError> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut file = staging_builder()
        .tempfile_in(dir)
        .map_err(|e| OutputError::new(path, e))?;
    if let Ok(existing) = fs::metadata(path) {
        file.as_file()
            .set_permissions(existing.permissions())
            .map_err(|e| OutputError::new(path, e))?;
    }
    file.write_all(content.as_bytes())
        .and_then(|()| file.flush())
        .map_err(|e| OutputError::new(path, e))?;
    Ok(Staged { path, file })
}

/// New outputs get the mode `fs::write` would give them (`0o666` less the
/// umask), not the owner-only mode of a temporary file.
fn staging_builder() -> Builder<'static, 'static> {
    let mut builder = Builder::new();
    builder.prefix(".propmap");
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        builder.permissions(fs::Permissions::from_mode(0o666));
    }
    builder
}

/// Write every `(path, content)` pair, or none if staging fails.
///
/// Staged files that are never persisted are removed when dropped.
pub fn write_all(outputs: &[(&Path, &str)]) -> Result<WriteReport, OutputError> {
    let mut report = WriteReport::default();
    let mut staged = Vec::with_capacity(outputs.len());

    for &(path, content) in outputs {
        if is_current(path, content) {
            debug!("Unchanged: {}", path.display());
            report.unchanged.push(path.to_path_buf());
        } else {
            staged.push(stage(path, content)?);
        }
    }

    for Staged { path, file } in staged {
        file.persist(path).map_err(|e| OutputError::new(path, e.error))?;
        report.written.push(path.to_path_buf());
    }

    Ok(report)
}
