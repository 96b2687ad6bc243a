use crate::error::{InclineError, Result};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::Builder;

/// Opens a source file for line-by-line reading
///
/// # Errors
///
/// Returns `InclineError::CannotOpen` if the path is missing, isn't a regular file,
/// or can't be opened.
pub fn open_source(path: &Path) -> Result<BufReader<File>> {
    if !path.is_file() {
        return Err(InclineError::CannotOpen {
            path: path.to_path_buf(),
        });
    }

    File::open(path)
        .map(BufReader::new)
        .map_err(|_| InclineError::CannotOpen {
            path: path.to_path_buf(),
        })
}

/// Candidate for a quoted include: the literal joined onto the including file's directory
#[must_use]
pub fn relative_candidate(including_file: &Path, literal: &Path) -> PathBuf {
    including_file
        .parent()
        .map_or_else(|| literal.to_path_buf(), |dir| dir.join(literal))
}

/// Identity used to detect a file being entered twice on the same include chain.
///
/// Falls back to the path as given when it can't be canonicalized.
#[must_use]
pub fn canonical_identity(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}

/// Runs `write` against `out_path` so the file only appears once `write` succeeds.
///
/// Output goes to a temporary file in the same directory which is renamed over
/// `out_path` on success and removed on failure. The result keeps the
/// permissions of an existing `out_path`, or gets the same umask-filtered
/// permissions as a newly created file.
///
/// # Errors
///
/// Returns the error from `write`, or `InclineError::Io` if the temporary file
/// can't be created, flushed or persisted.
pub fn write_atomically<T, F>(out_path: &Path, write: F) -> Result<T>
where
    F: FnOnce(&mut dyn Write) -> Result<T>,
{
    let dir = match out_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut builder = Builder::new();
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        builder.permissions(fs::Permissions::from_mode(0o666));
    }
    let temp = builder.tempfile_in(dir)?;
    if let Ok(metadata) = fs::metadata(out_path)
        && metadata.is_file()
    {
        temp.as_file().set_permissions(metadata.permissions())?;
    }

    let mut writer = BufWriter::new(temp);
    let value = write(&mut writer)?;
    let temp = writer.into_inner().map_err(|e| e.into_error())?;
    temp.persist(out_path).map_err(|e| e.error)?;

    Ok(value)
}

/// Runs `write` against `out_path`, truncating it first.
///
/// Whatever was written before a failure stays on disk.
///
/// # Errors
///
/// Returns the error from `write`, or `InclineError::Io` if the file can't be
/// created or flushed.
pub fn write_in_place<T, F>(out_path: &Path, write: F) -> Result<T>
where
    F: FnOnce(&mut dyn Write) -> Result<T>,
{
    let mut writer = BufWriter::new(File::create(out_path)?);
    let result = write(&mut writer);
    flush_after(&mut writer, result)
}

/// Flushes `writer` after `result` was produced.
///
/// An error in `result` wins over a flush failure.
fn flush_after<T>(writer: &mut impl Write, result: Result<T>) -> Result<T> {
    let flushed = writer.flush();
    let value = result?;
    flushed?;
    Ok(value)
}
