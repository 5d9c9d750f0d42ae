//! # zipscan
//!
//! Scan a folder of ZIP archives for `definition.json` entries that contain a
//! piece of text.
//!
//! Every regular `.zip` file directly inside the folder is loaded into memory,
//! its central directory is decoded, and each entry whose name ends with
//! `definition.json` (at any depth) is decompressed and searched for the filter
//! as a literal, case-sensitive substring. Matches are logged as they are found
//! and written to `found.txt` at the end.
//!
//! A corrupt archive never stops the run: it is logged and contributes no
//! matches. Only an unreadable folder or an unwritable output file are fatal.
//!
//! ## Example
//!
//! ```no_run
//! use std::path::PathBuf;
//! use zipscan::{ErrorScope, ScanConfig};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ScanConfig {
//!         folder: PathBuf::from("/srv/exports"),
//!         filter: "\"status\":\"draft\"".to_string(),
//!         output: PathBuf::from("/srv/found.txt"),
//!         entry_suffix: "definition.json".to_string(),
//!         extension: ".zip".to_string(),
//!         error_scope: ErrorScope::Archive,
//!     };
//!
//!     let summary = zipscan::run(&config).await?;
//!     for record in &summary.matches {
//!         println!("{record}");
//!     }
//!     Ok(())
//! }
//! ```

pub mod archive;
pub mod cli;
pub mod error;
pub mod io;
pub mod output;
pub mod scanner;

pub use archive::{ZipExtractor, ZipFileEntry};
pub use cli::Cli;
pub use error::{ArchiveError, ScanError};
pub use io::{MemoryReader, ReadAt};
pub use scanner::{
    ArchiveOutcome, ArchiveScanner, ErrorScope, MatchRecord, ScanConfig, ScanSummary,
    list_archives, run,
};
