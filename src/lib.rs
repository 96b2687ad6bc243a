//! # incline
//!
//! A library and CLI tool that flattens `#include` directives, producing a
//! single output file with every included file expanded in place, recursively.
//!
//! ## Features
//!
//! - Recognizes whole-line `# include "path"` and `# include <name>` directives
//! - Quoted includes resolve relative to the including file first, then through the search paths
//! - Angle-bracket includes resolve through the search paths, first match wins
//! - Reports the include, the including file and the line of any unresolved directive
//! - Detects cyclic includes instead of recursing forever
//! - Output file only replaced when the whole expansion succeeds
//!
//! This is not a macro preprocessor: there is no conditional compilation or
//! macro expansion, and a directive must occupy its entire line.
//!
//! ## Usage
//!
//! ### As a Library
//!
//! ```no_run
//! use std::path::{Path, PathBuf};
//! use incline::{ExpandConfig, preprocess};
//!
//! let config = ExpandConfig {
//!     search_paths: vec![PathBuf::from("include1"), PathBuf::from("include2")],
//!     ..ExpandConfig::default()
//! };
//!
//! match preprocess(Path::new("src/a.cpp"), Path::new("a.in"), &config) {
//!     Ok(report) => println!("{} includes expanded", report.includes.len()),
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```
//!
//! ### As a CLI Tool
//!
//! ```bash
//! # Flatten to stdout
//! incline src/a.cpp -I include1 -I include2
//!
//! # Write to a file
//! incline src/a.cpp -I include -o a.in
//!
//! # Show which file each include resolves to
//! incline src/a.cpp -I include --list=detailed
//! ```

pub mod directive;
pub mod error;
pub mod expand;
pub mod fs_utils;

// Re-export main types and functions for convenience
pub use directive::{IncludeDirective, IncludeKind, Line, LineClassifier};
pub use error::{InclineError, Result};
pub use expand::{
    ExpandConfig, ExpandReport, Resolution, ResolvedInclude, expand, expand_to_string,
    preprocess, scan_includes,
};
