use std::path::Path;

use crate::error::ScanError;
use crate::scanner::MatchRecord;

/// One record per line, joined by `\n` without a trailing newline.
pub fn render(matches: &[MatchRecord]) -> String {
    matches
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Write the rendered matches to `path`, replacing whatever was there.
pub async fn write_results(path: &Path, matches: &[MatchRecord]) -> Result<(), ScanError> {
    tokio::fs::write(path, render(matches))
        .await
        .map_err(|source| ScanError::OutputWrite {
            path: path.to_path_buf(),
            source,
        })
}
