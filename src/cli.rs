use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use log::LevelFilter;

use crate::scanner::{ErrorScope, ScanConfig};

#[derive(Parser, Debug)]
#[command(name = "zipscan")]
#[command(version)]
#[command(
    about = "Find ZIP archives whose definition.json entries contain a text fragment",
    long_about = None
)]
#[command(after_help = "Examples:\n  \
  zipscan ./exports '\"status\":\"draft\"'     list archives with a draft definition\n  \
  zipscan -o hits.txt ./exports widget      write matches to hits.txt")]
pub struct Cli {
    /// Folder containing the ZIP files (not searched recursively)
    #[arg(value_name = "FOLDER")]
    pub folder: PathBuf,

    /// Text to look for, matched literally and case-sensitively
    #[arg(value_name = "FILTER", value_parser = clap::builder::NonEmptyStringValueParser::new())]
    pub filter: String,

    /// File the matches are written to
    #[arg(short = 'o', long, value_name = "FILE", default_value = "found.txt")]
    pub output: PathBuf,

    /// Entry names must end with this suffix to be searched
    #[arg(long, value_name = "SUFFIX", default_value = "definition.json")]
    pub entry_suffix: String,

    /// Files in FOLDER must end with this extension to be opened
    #[arg(long, value_name = "EXT", default_value = ".zip")]
    pub extension: String,

    /// Whether a bad entry skips the rest of its archive or only itself
    #[arg(long, value_enum, default_value_t = ScopeArg::Archive)]
    pub error_scope: ScopeArg,

    /// Show debug output
    #[arg(short = 'v')]
    pub verbose: bool,

    /// Quiet mode (-qq => quieter)
    #[arg(short = 'q', action = clap::ArgAction::Count)]
    pub quiet: u8,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ScopeArg {
    Archive,
    Entry,
}

impl From<ScopeArg> for ErrorScope {
    fn from(arg: ScopeArg) -> Self {
        match arg {
            ScopeArg::Archive => ErrorScope::Archive,
            ScopeArg::Entry => ErrorScope::Entry,
        }
    }
}

impl Cli {
    /// Log level implied by `-q`/`-v`; `RUST_LOG` still overrides it.
    pub fn log_level(&self) -> LevelFilter {
        match self.quiet {
            0 if self.verbose => LevelFilter::Debug,
            0 => LevelFilter::Info,
            1 => LevelFilter::Warn,
            _ => LevelFilter::Error,
        }
    }

    /// Resolve paths against the working directory and build the run config.
    pub fn to_config(&self) -> std::io::Result<ScanConfig> {
        Ok(ScanConfig {
            folder: std::path::absolute(&self.folder)?,
            filter: self.filter.clone(),
            output: std::path::absolute(&self.output)?,
            entry_suffix: self.entry_suffix.clone(),
            extension: self.extension.clone(),
            error_scope: self.error_scope.into(),
        })
    }
}
