use clap::{Parser, ValueEnum};
use incline::{ExpandConfig, ExpandReport, Resolution, Result, expand};
use serde::{Deserialize, Serialize};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::Level;

const LONG_HELP: &str = r#"
Directives (must occupy the whole line):
  #include "path/file.h"  - Relative to the including file, then the search paths
  #include <name.h>       - Search paths only, first directory listed wins

Examples:
  # Flatten to stdout
  incline src/a.cpp -I include1 -I include2
  # Save output to file (written only if every include resolves)
  incline src/a.cpp -I include -o a.in
  # Keep the partial output when an include fails
  incline src/a.cpp -I include -o a.in --keep-partial
  # Check that every include resolves
  incline src/a.cpp -I include --dry-run
  # List resolved includes
  incline src/a.cpp -I include --list
  # List with details
  incline src/a.cpp -I include --list=detailed
  # Output as JSON for scripting
  incline src/a.cpp -I include --list=json
  # Search paths from the environment
  INCLINE_INCLUDE_PATH=include1:include2 incline src/a.cpp
"#;

/// Flatten #include directives into a single expanded file.
#[derive(Parser, Debug)]
#[command(
    name = "incline",
    version,
    about = "Flatten #include directives into a single expanded file.",
    after_long_help = LONG_HELP
)]
struct Cli {
    /// Root source file to expand
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Output file (defaults to stdout)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Search directory for includes (repeatable, searched in order)
    #[arg(
        short = 'I',
        long = "include-dir",
        value_name = "DIR",
        env = "INCLINE_INCLUDE_PATH",
        value_delimiter = ':',
        action = clap::ArgAction::Append
    )]
    include_dirs: Vec<PathBuf>,

    /// Maximum include nesting depth
    #[arg(short = 'd', long, value_name = "DEPTH")]
    max_depth: Option<usize>,

    /// Keep the partially expanded output when an include fails
    #[arg(long)]
    keep_partial: bool,

    /// Resolve every include without writing output
    #[arg(long, conflicts_with = "list")]
    dry_run: bool,

    /// List resolved includes (optionally with format: plain, detailed, json)
    #[arg(long, value_name = "FORMAT", num_args = 0..=1, default_missing_value = "plain", conflicts_with = "dry_run")]
    list: Option<ListFormat>,

    /// Increase verbosity (can be used multiple times)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum, PartialEq)]
enum ListFormat {
    /// Include literals, indented by nesting depth
    Plain,
    /// Detailed information about each include
    Detailed,
    /// JSON output for scripting
    Json,
}

#[derive(Serialize, Deserialize)]
struct IncludeInfo {
    include: String,
    kind: String,
    file: String,
    line: usize,
    resolved: String,
    depth: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    search_path: Option<String>,
}

fn main() {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let log_level = match (cli.quiet, cli.verbose) {
        (true, _) => LogLevel::Error,
        (false, 0) => LogLevel::Warn,
        (false, 1) => LogLevel::Info,
        (false, 2) => LogLevel::Debug,
        (false, _) => LogLevel::Trace,
    };
    init_logging(log_level);

    let config = ExpandConfig {
        search_paths: cli.include_dirs.clone(),
        max_depth: cli.max_depth,
        atomic_output: !cli.keep_partial,
    };
    for (index, dir) in config.search_paths.iter().enumerate() {
        log(
            LogLevel::Debug,
            &format!("Search path {index}: {}", dir.display()),
        );
        if !dir.is_dir() {
            log(
                LogLevel::Warn,
                &format!("Search path {} is not a directory", dir.display()),
            );
        }
    }

    let result = if cli.dry_run {
        dry_run(&cli.input, &config)
    } else if let Some(list_format) = cli.list {
        list_includes(&cli.input, &config, list_format)
    } else {
        process_input(&cli.input, cli.output.as_deref(), &config)
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn process_input(
    input: &Path,
    output: Option<&Path>,
    config: &ExpandConfig,
) -> Result<()> {
    log(
        LogLevel::Info,
        &format!("Expanding {}", input.display()),
    );

    let report = if let Some(output_path) = output {
        log(
            LogLevel::Info,
            &format!("Writing output to {}", output_path.display()),
        );
        incline::preprocess(input, output_path, config)?
    } else if config.atomic_output {
        let mut buf = Vec::new();
        let report = expand(input, config, &mut buf)?;
        let mut stdout = io::stdout().lock();
        stdout.write_all(&buf)?;
        stdout.flush()?;
        report
    } else {
        let mut stdout = io::stdout().lock();
        let result = expand(input, config, &mut stdout);
        let flushed = stdout.flush();
        let report = result?;
        flushed?;
        report
    };

    log_report(&report);
    log(LogLevel::Info, "Processing complete!");
    Ok(())
}

fn dry_run(input: &Path, config: &ExpandConfig) -> Result<()> {
    log(
        LogLevel::Info,
        "Performing dry run - resolving includes...",
    );

    match incline::scan_includes(input, config) {
        Ok(report) => {
            for include in &report.includes {
                log(
                    LogLevel::Info,
                    &format!("✓ {} -> {}", include.include, include.resolved.display()),
                );
            }
            println!("\nSummary: {} includes resolved", report.includes.len());
            println!("  {} lines would be written", report.lines_written);
            Ok(())
        }
        Err(e) => {
            log(LogLevel::Error, &format!("✗ {e}"));
            println!("\nSummary: expansion failed");
            std::process::exit(1);
        }
    }
}

fn list_includes(
    input: &Path,
    config: &ExpandConfig,
    format: ListFormat,
) -> Result<()> {
    log(LogLevel::Debug, "Listing resolved includes...");

    let report = incline::scan_includes(input, config)?;

    match format {
        ListFormat::Plain => {
            for include in &report.includes {
                println!(
                    "{}{}",
                    "  ".repeat(include.depth.saturating_sub(1)),
                    include.include
                );
            }
        }
        ListFormat::Detailed => {
            for include in &report.includes {
                println!("Include: {}", include.include);
                println!("  Kind: {}", include.kind.as_str());
                println!("  From: {}:{}", include.file.display(), include.line);
                println!("  Resolved: {}", include.resolved.display());
                match include.resolution {
                    Resolution::Relative => println!("  Via: including file's directory"),
                    Resolution::SearchPath(index) => println!(
                        "  Via: search path {}",
                        config.search_paths[index].display()
                    ),
                }
                println!("  Depth: {}", include.depth);
                println!();
            }
        }
        ListFormat::Json => {
            let infos: Vec<IncludeInfo> = report
                .includes
                .iter()
                .map(|include| IncludeInfo {
                    include: include.include.clone(),
                    kind: include.kind.as_str().to_string(),
                    file: include.file.display().to_string(),
                    line: include.line,
                    resolved: include.resolved.display().to_string(),
                    depth: include.depth,
                    search_path: match include.resolution {
                        Resolution::Relative => None,
                        Resolution::SearchPath(index) => {
                            Some(config.search_paths[index].display().to_string())
                        }
                    },
                })
                .collect();

            let json = serde_json::to_string_pretty(&infos)?;
            println!("{json}");
        }
    }

    Ok(())
}

fn log_report(report: &ExpandReport) {
    for include in &report.includes {
        log(
            LogLevel::Trace,
            &format!(
                "{}:{} {} -> {}",
                include.file.display(),
                include.line,
                include.include,
                include.resolved.display()
            ),
        );
    }
    log(
        LogLevel::Debug,
        &format!(
            "{} includes expanded, {} lines written",
            report.includes.len(),
            report.lines_written
        ),
    );
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    fn as_tracing(self) -> Level {
        match self {
            LogLevel::Trace => Level::TRACE,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Info => Level::INFO,
            LogLevel::Warn => Level::WARN,
            LogLevel::Error => Level::ERROR,
        }
    }
}

/// Sends CLI messages and the library's events to stderr at the chosen level
fn init_logging(level: LogLevel) {
    tracing_subscriber::fmt()
        .with_max_level(level.as_tracing())
        .with_writer(io::stderr)
        .with_target(false)
        .without_time()
        .init();
}

fn log(message_level: LogLevel, message: &str) {
    match message_level {
        LogLevel::Trace => tracing::trace!("{message}"),
        LogLevel::Debug => tracing::debug!("{message}"),
        LogLevel::Info => tracing::info!("{message}"),
        LogLevel::Warn => tracing::warn!("{message}"),
        LogLevel::Error => tracing::error!("{message}"),
    }
}
