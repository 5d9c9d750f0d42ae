//! Error types.
//!
//! Two families exist because they are handled differently:
//!
//! - [`ScanError`] aborts the whole run (unreadable folder, unwritable output).
//! - [`ArchiveError`] is confined to one archive (or one entry) and only logged.

use std::path::PathBuf;
use std::str::Utf8Error;

use thiserror::Error;

/// Fatal failures that stop the run.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("cannot read folder {}: {source}", path.display())]
    Filesystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot write results to {}: {source}", path.display())]
    OutputWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Failures while reading or decoding a single archive.
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("not a valid ZIP file")]
    NotAZip,
    #[error("malformed archive: {0}")]
    Malformed(&'static str),
    #[error("read of {len} bytes at offset {offset} is past the end of the archive")]
    OutOfBounds { offset: u64, len: u64 },
    #[error("{entry}: unsupported compression method {method}")]
    UnsupportedCompression { entry: String, method: u16 },
    #[error("{entry}: encrypted entries are not supported")]
    Encrypted { entry: String },
    #[error("{entry}: decompression failed: {source}")]
    Decompress {
        entry: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{entry}: expected {expected} bytes, got {actual}")]
    SizeMismatch {
        entry: String,
        expected: u64,
        actual: u64,
    },
    #[error("{entry}: CRC-32 mismatch (expected {expected:08x}, got {actual:08x})")]
    CrcMismatch {
        entry: String,
        expected: u32,
        actual: u32,
    },
    #[error("{entry}: not valid UTF-8 text: {source}")]
    InvalidText {
        entry: String,
        #[source]
        source: Utf8Error,
    },
}

pub type ArchiveResult<T> = Result<T, ArchiveError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_failing_entry() {
        let err = ArchiveError::CrcMismatch {
            entry: "a/definition.json".to_string(),
            expected: 0xdeadbeef,
            actual: 0x1,
        };
        assert_eq!(
            err.to_string(),
            "a/definition.json: CRC-32 mismatch (expected deadbeef, got 00000001)"
        );
    }

    #[test]
    fn filesystem_error_mentions_the_folder() {
        let err = ScanError::Filesystem {
            path: PathBuf::from("/nope"),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        };
        assert!(err.to_string().starts_with("cannot read folder /nope"));
    }
}
