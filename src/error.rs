use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for incline operations
#[derive(Error, Debug)]
pub enum InclineError {
    /// IO error when writing output or creating temporary files
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// A file could not be opened for reading.
    ///
    /// During resolution this only means "try the next candidate"; callers see it
    /// when the root file itself is missing.
    #[error("Cannot open file: {path}")]
    CannotOpen { path: PathBuf },

    /// A file was opened but reading it failed part way
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// No candidate for an include directive could be expanded
    #[error("unknown include file {include} at file {} at line {line}", .file.display())]
    UnresolvedInclude {
        include: String,
        file: PathBuf,
        line: usize,
    },

    /// An include re-entered a file that is still being expanded
    #[error("cyclic include {include} at file {} at line {line} ({})", .file.display(), format_chain(.chain))]
    CyclicInclude {
        include: String,
        file: PathBuf,
        line: usize,
        chain: Vec<PathBuf>,
    },

    /// Include nesting went deeper than the configured limit
    #[error("include {include} at file {} at line {line} exceeds maximum nesting depth of {max_depth}", .file.display())]
    DepthExceeded {
        include: String,
        file: PathBuf,
        line: usize,
        max_depth: usize,
    },

    /// Regex compilation error
    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl InclineError {
    /// Whether resolution may move on to the next candidate after this error.
    #[must_use]
    pub fn is_open_failure(&self) -> bool {
        matches!(self, Self::CannotOpen { .. })
    }
}

fn format_chain(chain: &[PathBuf]) -> String {
    chain
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(" -> ")
}

pub type Result<T> = std::result::Result<T, InclineError>;
