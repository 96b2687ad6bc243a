use crate::directive::{IncludeDirective, IncludeKind, Line, LineClassifier};
use crate::error::{InclineError, Result};
use crate::fs_utils::{
    canonical_identity, open_source, relative_candidate, write_atomically, write_in_place,
};
use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

/// Configuration for include expansion
#[derive(Debug, Clone)]
pub struct ExpandConfig {
    /// Directories consulted in order for `<name>` includes and as fallback for `"path"` includes
    pub search_paths: Vec<PathBuf>,
    /// Maximum include nesting depth (the root file is depth 0)
    pub max_depth: Option<usize>,
    /// Only materialize the output file once the whole expansion succeeded
    pub atomic_output: bool,
}

impl Default for ExpandConfig {
    fn default() -> Self {
        Self {
            search_paths: Vec::new(),
            max_depth: None,
            atomic_output: true,
        }
    }
}

/// How an include directive was resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// Relative to the directory of the including file
    Relative,
    /// Through the search path at this index
    SearchPath(usize),
}

/// An include directive that was found and expanded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedInclude {
    /// The literal between the delimiters (lossily decoded)
    pub include: String,
    pub kind: IncludeKind,
    /// File containing the directive
    pub file: PathBuf,
    /// 1-based line of the directive within `file`
    pub line: usize,
    /// Path the directive expanded from
    pub resolved: PathBuf,
    pub resolution: Resolution,
    /// Nesting depth of `resolved` (direct includes of the root are depth 1)
    pub depth: usize,
}

/// Summary of a successful expansion
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpandReport {
    /// Every include expanded, in output order
    pub includes: Vec<ResolvedInclude>,
    /// Plain lines written to the output
    pub lines_written: usize,
}

/// Location of a directive being resolved
struct IncludeSite<'a> {
    file: &'a Path,
    line: usize,
    directive: IncludeDirective<'a>,
}

/// Depth-first inliner sharing one output sink across every nested file
struct Expander<'a> {
    config: &'a ExpandConfig,
    classifier: LineClassifier,
    out: &'a mut dyn Write,
    /// Canonical identities of the files currently being expanded, root first
    active: Vec<PathBuf>,
    report: ExpandReport,
}

impl<'a> Expander<'a> {
    fn new(config: &'a ExpandConfig, out: &'a mut dyn Write) -> Result<Self> {
        Ok(Self {
            config,
            classifier: LineClassifier::new()?,
            out,
            active: Vec::new(),
            report: ExpandReport::default(),
        })
    }

    fn expand_root(mut self, root: &Path) -> Result<ExpandReport> {
        let reader = open_source(root)?;
        self.expand_opened(root, canonical_identity(root), reader)?;
        Ok(self.report)
    }

    fn expand_opened(
        &mut self,
        path: &Path,
        identity: PathBuf,
        mut reader: BufReader<File>,
    ) -> Result<()> {
        self.active.push(identity);
        let result = self.expand_lines(path, &mut reader);
        self.active.pop();
        result
    }

    fn expand_lines(&mut self, path: &Path, reader: &mut impl BufRead) -> Result<()> {
        let mut buf = Vec::new();
        let mut line = 0;

        loop {
            buf.clear();
            let read = reader
                .read_until(b'\n', &mut buf)
                .map_err(|source| InclineError::Read {
                    path: path.to_path_buf(),
                    source,
                })?;
            if read == 0 {
                return Ok(());
            }
            line += 1;

            let text = buf.strip_suffix(b"\n").unwrap_or(buf.as_slice());
            match self.classifier.classify(text) {
                Line::Plain(content) => {
                    self.out.write_all(content)?;
                    self.out.write_all(b"\n")?;
                    self.report.lines_written += 1;
                }
                Line::Include(directive) => {
                    let site = IncludeSite {
                        file: path,
                        line,
                        directive,
                    };
                    self.expand_include(&site)?;
                }
            }
        }
    }

    fn expand_include(&mut self, site: &IncludeSite<'_>) -> Result<()> {
        let literal = site.directive.to_path();

        if site.directive.kind == IncludeKind::Quoted {
            let candidate = relative_candidate(site.file, &literal);
            if self.try_candidate(&candidate, site, Resolution::Relative)? {
                return Ok(());
            }
        }

        let config = self.config;
        for (index, dir) in config.search_paths.iter().enumerate() {
            let candidate = dir.join(&literal);
            if self.try_candidate(&candidate, site, Resolution::SearchPath(index))? {
                return Ok(());
            }
        }

        debug!(
            include = %site.directive.literal(),
            file = %site.file.display(),
            line = site.line,
            "unresolved include"
        );
        Err(InclineError::UnresolvedInclude {
            include: site.directive.literal().into_owned(),
            file: site.file.to_path_buf(),
            line: site.line,
        })
    }

    /// Expands `candidate` in place of the directive at `site`.
    ///
    /// Returns `Ok(false)` when the candidate can't be opened so the caller moves
    /// on; any failure after it opened is fatal for the whole run.
    fn try_candidate(
        &mut self,
        candidate: &Path,
        site: &IncludeSite<'_>,
        resolution: Resolution,
    ) -> Result<bool> {
        let reader = match open_source(candidate) {
            Ok(reader) => reader,
            Err(e) if e.is_open_failure() => {
                trace!(candidate = %candidate.display(), "include candidate rejected");
                return Ok(false);
            }
            Err(e) => return Err(e),
        };

        let identity = canonical_identity(candidate);
        if self.active.contains(&identity) {
            let mut chain = self.active.clone();
            chain.push(identity);
            debug!(include = %site.directive.literal(), "cyclic include");
            return Err(InclineError::CyclicInclude {
                include: site.directive.literal().into_owned(),
                file: site.file.to_path_buf(),
                line: site.line,
                chain,
            });
        }

        let depth = self.active.len();
        if let Some(max_depth) = self.config.max_depth
            && depth > max_depth
        {
            return Err(InclineError::DepthExceeded {
                include: site.directive.literal().into_owned(),
                file: site.file.to_path_buf(),
                line: site.line,
                max_depth,
            });
        }

        debug!(
            include = %site.directive.literal(),
            resolved = %candidate.display(),
            depth,
            "expanding include"
        );
        self.report.includes.push(ResolvedInclude {
            include: site.directive.literal().into_owned(),
            kind: site.directive.kind,
            file: site.file.to_path_buf(),
            line: site.line,
            resolved: candidate.to_path_buf(),
            resolution,
            depth,
        });

        self.expand_opened(candidate, identity, reader)?;
        Ok(true)
    }
}

/// Expands `root` into `out`, recursively inlining every include directive.
///
/// Output is streamed; if expansion fails, whatever was written before the
/// failing directive stays in `out`.
///
/// # Errors
///
/// - `InclineError::CannotOpen` if `root` can't be opened.
/// - `InclineError::UnresolvedInclude` if a directive matches no candidate.
/// - `InclineError::CyclicInclude` if a file includes itself through any chain.
/// - `InclineError::DepthExceeded` if nesting goes past `config.max_depth`.
/// - `InclineError::Read` or `InclineError::Io` on read or write failures.
pub fn expand(root: &Path, config: &ExpandConfig, out: &mut dyn Write) -> Result<ExpandReport> {
    Expander::new(config, out)?.expand_root(root)
}

/// Expands `root` into a string
///
/// # Errors
///
/// Same as [`expand`], plus `InclineError::Io` if the expanded text isn't valid UTF-8.
pub fn expand_to_string(root: &Path, config: &ExpandConfig) -> Result<String> {
    let mut buf = Vec::new();
    expand(root, config, &mut buf)?;
    String::from_utf8(buf).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e).into())
}

/// Resolves every include of `root` without producing output
///
/// # Errors
///
/// Same as [`expand`].
pub fn scan_includes(root: &Path, config: &ExpandConfig) -> Result<ExpandReport> {
    expand(root, config, &mut io::sink())
}

/// Expands `root` into the file at `out_path`.
///
/// Nothing is written when `root` can't be opened. With `config.atomic_output`
/// the output file is replaced only on success; otherwise it is truncated up
/// front and keeps the partial expansion when a directive fails.
///
/// # Errors
///
/// Same as [`expand`], plus `InclineError::Io` if the output can't be written.
pub fn preprocess(root: &Path, out_path: &Path, config: &ExpandConfig) -> Result<ExpandReport> {
    drop(open_source(root)?);

    if config.atomic_output {
        write_atomically(out_path, |out| expand(root, config, out))
    } else {
        write_in_place(out_path, |out| expand(root, config, out))
    }
}
