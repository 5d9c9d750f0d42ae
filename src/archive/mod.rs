//! ZIP archive reading.
//!
//! - [`structures`]: fixed records of the format (EOCD, ZIP64 records, entries)
//! - [`parser`]: locating and decoding the central directory
//! - [`extractor`]: decompressing, verifying and decoding single entries
//!
//! Supported: STORED and DEFLATE entries, ZIP64 directories, trailing archive
//! comments. Not supported: encryption, split archives, other compression
//! methods. Unsupported entries fail with an
//! [`ArchiveError`](crate::error::ArchiveError) rather than being skipped.

mod extractor;
mod parser;
mod structures;

pub use extractor::ZipExtractor;
pub use parser::ZipParser;
pub use structures::*;
