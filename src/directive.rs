use crate::error::Result;
use regex::bytes::Regex;
use std::borrow::Cow;
use std::path::PathBuf;

/// Whole-line include pattern: `# include "path"` or `# include <name>`,
/// with optional whitespace around the marker, keyword and literal.
///
/// Matched on raw bytes so lines that aren't valid UTF-8 still classify.
const INCLUDE_PATTERN: &str = r#"(?-u)^\s*#\s*include\s*(?:"([^"]*)"|<([^>]*)>)\s*$"#;

/// Delimiter style of an include directive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IncludeKind {
    /// `#include "path"`, tried relative to the including file first
    Quoted,
    /// `#include <name>`, resolved through the search paths only
    Angle,
}

impl IncludeKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Quoted => "quoted",
            Self::Angle => "angle",
        }
    }
}

/// An include directive extracted from a single line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IncludeDirective<'a> {
    pub kind: IncludeKind,
    /// Bytes between the delimiters, exactly as written
    pub path: &'a [u8],
}

impl IncludeDirective<'_> {
    /// The literal for diagnostics
    #[must_use]
    pub fn literal(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(self.path)
    }

    /// The literal as a filesystem path
    #[cfg(unix)]
    #[must_use]
    pub fn to_path(&self) -> PathBuf {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        PathBuf::from(OsStr::from_bytes(self.path))
    }

    /// The literal as a filesystem path
    #[cfg(not(unix))]
    #[must_use]
    pub fn to_path(&self) -> PathBuf {
        PathBuf::from(self.literal().into_owned())
    }
}

/// Classification of one line of input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Line<'a> {
    Include(IncludeDirective<'a>),
    Plain(&'a [u8]),
}

/// Recognizes include directives occupying an entire line.
///
/// A directive sharing its line with other code is a plain line.
#[derive(Debug, Clone)]
pub struct LineClassifier {
    pattern: Regex,
}

impl LineClassifier {
    /// Compiles the directive pattern
    ///
    /// # Errors
    ///
    /// Returns `InclineError::Regex` if the pattern fails to compile.
    pub fn new() -> Result<Self> {
        Ok(Self {
            pattern: Regex::new(INCLUDE_PATTERN)?,
        })
    }

    /// Classifies a line (without its trailing `\n`)
    #[must_use]
    pub fn classify<'a>(&self, line: &'a [u8]) -> Line<'a> {
        let Some(captures) = self.pattern.captures(line) else {
            return Line::Plain(line);
        };

        if let Some(quoted) = captures.get(1) {
            Line::Include(IncludeDirective {
                kind: IncludeKind::Quoted,
                path: quoted.as_bytes(),
            })
        } else if let Some(angle) = captures.get(2) {
            Line::Include(IncludeDirective {
                kind: IncludeKind::Angle,
                path: angle.as_bytes(),
            })
        } else {
            Line::Plain(line)
        }
    }
}
