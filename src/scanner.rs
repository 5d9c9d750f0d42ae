//! The scan pipeline: list archives, search each one, collect the matches.
//!
//! Archives are processed one at a time in file name order. Each archive's
//! bytes are loaded, searched and dropped before the next one is opened.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::{debug, error, info, warn};

use crate::archive::{ZipExtractor, ZipFileEntry};
use crate::error::{ArchiveResult, ScanError};
use crate::io::{MemoryReader, ReadAt};
use crate::output;

/// Everything a run needs, with paths already made absolute.
#[derive(Debug, Clone)]
pub struct ScanConfig {
    pub folder: PathBuf,
    pub filter: String,
    pub output: PathBuf,
    pub entry_suffix: String,
    pub extension: String,
    pub error_scope: ErrorScope,
}

/// How far a failing entry reaches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ErrorScope {
    /// The first bad entry discards the whole archive's matches.
    #[default]
    Archive,
    /// A bad entry is logged and skipped; its siblings are still searched.
    Entry,
}

/// One entry whose text contains the filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchRecord {
    pub entry_name: String,
    pub archive_path: PathBuf,
}

impl fmt::Display for MatchRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Found matching file: {} in ZIP: {}",
            self.entry_name,
            self.archive_path.display()
        )
    }
}

/// Result of searching one readable archive.
#[derive(Debug, PartialEq, Eq)]
pub enum ArchiveOutcome {
    NoQualifyingEntries,
    Scanned {
        qualifying: usize,
        matches: Vec<MatchRecord>,
    },
}

/// Totals for a whole run.
#[derive(Debug, Default)]
pub struct ScanSummary {
    pub archives: usize,
    pub failed: usize,
    pub without_entries: usize,
    pub matches: Vec<MatchRecord>,
    pub written_to: Option<PathBuf>,
}

impl fmt::Display for ScanSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} archives scanned, {} matches, {} without qualifying entries, {} failed",
            self.archives,
            self.matches.len(),
            self.without_entries,
            self.failed
        )
    }
}

/// List the regular files directly inside `dir` whose name ends with
/// `extension`, sorted by name.
///
/// Subdirectories and symlinks are skipped even when their names match.
pub async fn list_archives(dir: &Path, extension: &str) -> Result<Vec<PathBuf>, ScanError> {
    let fs_error = |source| ScanError::Filesystem {
        path: dir.to_path_buf(),
        source,
    };

    let mut entries = tokio::fs::read_dir(dir).await.map_err(fs_error)?;
    let mut archives = Vec::new();
    while let Some(entry) = entries.next_entry().await.map_err(fs_error)? {
        let file_type = entry.file_type().await.map_err(fs_error)?;
        if !file_type.is_file() {
            continue;
        }
        if entry.file_name().to_string_lossy().ends_with(extension) {
            archives.push(entry.path());
        }
    }

    archives.sort();
    debug!("Found {} candidate archives in {}", archives.len(), dir.display());
    Ok(archives)
}

/// Searches archives for qualifying entries that contain the filter text.
pub struct ArchiveScanner {
    filter: String,
    entry_suffix: String,
    error_scope: ErrorScope,
}

impl ArchiveScanner {
    pub fn new(filter: impl Into<String>, entry_suffix: impl Into<String>) -> Self {
        Self {
            filter: filter.into(),
            entry_suffix: entry_suffix.into(),
            error_scope: ErrorScope::default(),
        }
    }

    pub fn with_error_scope(mut self, error_scope: ErrorScope) -> Self {
        self.error_scope = error_scope;
        self
    }

    pub fn from_config(config: &ScanConfig) -> Self {
        Self::new(config.filter.clone(), config.entry_suffix.clone())
            .with_error_scope(config.error_scope)
    }

    /// Load the archive at `path` and search it.
    pub async fn scan_archive(&self, path: &Path) -> ArchiveResult<ArchiveOutcome> {
        info!("Processing ZIP file: {}", path.display());
        let reader = Arc::new(MemoryReader::load(path).await?);
        self.scan(path, &ZipExtractor::new(reader)).await
    }

    /// Search an already opened archive; `path` is only used for reporting.
    pub async fn scan<R: ReadAt>(
        &self,
        path: &Path,
        extractor: &ZipExtractor<R>,
    ) -> ArchiveResult<ArchiveOutcome> {
        let qualifying: Vec<ZipFileEntry> = extractor
            .list_files()
            .await?
            .into_iter()
            .filter(|e| e.name_ends_with(&self.entry_suffix))
            .collect();

        if qualifying.is_empty() {
            warn!(
                "No \"{}\" files found in {}.",
                self.entry_suffix,
                path.display()
            );
            return Ok(ArchiveOutcome::NoQualifyingEntries);
        }

        let mut matches = Vec::new();
        for entry in &qualifying {
            let text = match extractor.extract_text(entry).await {
                Ok(text) => text,
                Err(e) if self.error_scope == ErrorScope::Entry => {
                    warn!("Skipping {} in {}: {}", entry.file_name, path.display(), e);
                    continue;
                }
                Err(e) => return Err(e),
            };

            if text.contains(&self.filter) {
                let record = MatchRecord {
                    entry_name: entry.file_name.clone(),
                    archive_path: path.to_path_buf(),
                };
                info!("{record}");
                matches.push(record);
            }
        }

        Ok(ArchiveOutcome::Scanned {
            qualifying: qualifying.len(),
            matches,
        })
    }
}

/// Run the whole pipeline and write the output file if anything matched.
///
/// Only an unreadable folder or an unwritable output file fail the run;
/// a broken archive is logged and contributes nothing.
pub async fn run(config: &ScanConfig) -> Result<ScanSummary, ScanError> {
    let archives = list_archives(&config.folder, &config.extension).await?;
    let scanner = ArchiveScanner::from_config(config);

    let mut summary = ScanSummary::default();
    for path in &archives {
        summary.archives += 1;
        match scanner.scan_archive(path).await {
            Ok(ArchiveOutcome::Scanned { matches, .. }) => summary.matches.extend(matches),
            Ok(ArchiveOutcome::NoQualifyingEntries) => summary.without_entries += 1,
            Err(e) => {
                error!("Error processing {}: {}", path.display(), e);
                summary.failed += 1;
            }
        }
    }

    if summary.matches.is_empty() {
        info!("No matching files found.");
    } else {
        output::write_results(&config.output, &summary.matches).await?;
        info!("Results saved to: {}", config.output.display());
        summary.written_to = Some(config.output.clone());
    }

    info!("All ZIP files processed.");
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn match_record_display() {
        let record = MatchRecord {
            entry_name: "sub/definition.json".to_string(),
            archive_path: PathBuf::from("/data/a.zip"),
        };
        assert_eq!(
            record.to_string(),
            "Found matching file: sub/definition.json in ZIP: /data/a.zip"
        );
    }

    #[test]
    fn summary_display_reports_every_count() {
        let summary = ScanSummary {
            archives: 4,
            failed: 1,
            without_entries: 2,
            matches: vec![MatchRecord {
                entry_name: "definition.json".to_string(),
                archive_path: PathBuf::from("/data/a.zip"),
            }],
            written_to: None,
        };
        assert_eq!(
            summary.to_string(),
            "4 archives scanned, 1 matches, 2 without qualifying entries, 1 failed"
        );
    }

    #[tokio::test]
    async fn lists_only_top_level_files_with_the_extension() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("b.zip"), b"").unwrap();
        fs::write(dir.path().join("a.zip"), b"").unwrap();
        fs::write(dir.path().join("notes.txt"), b"").unwrap();
        fs::write(dir.path().join("upper.ZIP"), b"").unwrap();
        fs::create_dir(dir.path().join("folder.zip")).unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();
        fs::write(dir.path().join("nested").join("c.zip"), b"").unwrap();

        let archives = list_archives(dir.path(), ".zip").await.unwrap();
        assert_eq!(
            archives,
            vec![dir.path().join("a.zip"), dir.path().join("b.zip")]
        );
    }

    #[tokio::test]
    async fn missing_folder_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing");
        let err = list_archives(&missing, ".zip").await.unwrap_err();
        match err {
            ScanError::Filesystem { path, .. } => assert_eq!(path, missing),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn scanner_defaults_to_archive_scope() {
        let scanner = ArchiveScanner::new("bar", "definition.json");
        assert_eq!(scanner.error_scope, ErrorScope::Archive);
        let scanner = scanner.with_error_scope(ErrorScope::Entry);
        assert_eq!(scanner.error_scope, ErrorScope::Entry);
    }
}
