use std::io::Read;
use std::sync::Arc;

use flate2::Crc;
use flate2::read::DeflateDecoder;

use crate::error::{ArchiveError, ArchiveResult};
use crate::io::ReadAt;

use super::parser::ZipParser;
use super::structures::{CompressionMethod, ZipFileEntry};

/// Reads entries out of one archive
pub struct ZipExtractor<R: ReadAt> {
    parser: ZipParser<R>,
}

impl<R: ReadAt> ZipExtractor<R> {
    pub fn new(reader: Arc<R>) -> Self {
        Self {
            parser: ZipParser::new(reader),
        }
    }

    /// List all entries in the archive
    pub async fn list_files(&self) -> ArchiveResult<Vec<ZipFileEntry>> {
        self.parser.list_files().await
    }

    /// Decompress an entry into memory and verify its size and CRC-32
    pub async fn extract_to_memory(&self, entry: &ZipFileEntry) -> ArchiveResult<Vec<u8>> {
        if entry.is_encrypted() {
            return Err(ArchiveError::Encrypted {
                entry: entry.file_name.clone(),
            });
        }

        let data_offset = self.parser.data_offset(entry).await?;
        let compressed_len = usize::try_from(entry.compressed_size).map_err(|_| {
            ArchiveError::OutOfBounds {
                offset: data_offset,
                len: entry.compressed_size,
            }
        })?;
        if data_offset
            .checked_add(entry.compressed_size)
            .is_none_or(|end| end > self.parser.reader().size())
        {
            return Err(ArchiveError::OutOfBounds {
                offset: data_offset,
                len: entry.compressed_size,
            });
        }

        let mut raw = vec![0u8; compressed_len];
        self.parser
            .reader()
            .read_exact_at(data_offset, &mut raw)
            .await?;

        let data = match entry.compression_method {
            CompressionMethod::Stored => raw,
            CompressionMethod::Deflate => inflate(entry, &raw)?,
            CompressionMethod::Unknown(_) => {
                return Err(ArchiveError::UnsupportedCompression {
                    entry: entry.file_name.clone(),
                    method: entry.compression_method.as_u16(),
                });
            }
        };

        verify(entry, &data)?;
        Ok(data)
    }

    /// Extract an entry and decode it as UTF-8 text
    pub async fn extract_text(&self, entry: &ZipFileEntry) -> ArchiveResult<String> {
        let data = self.extract_to_memory(entry).await?;
        String::from_utf8(data).map_err(|e| ArchiveError::InvalidText {
            entry: entry.file_name.clone(),
            source: e.utf8_error(),
        })
    }
}

/// Inflate a raw DEFLATE stream, never producing more than the declared size
fn inflate(entry: &ZipFileEntry, raw: &[u8]) -> ArchiveResult<Vec<u8>> {
    // One extra byte lets an oversized stream show up as a size mismatch.
    let limit = entry.uncompressed_size.saturating_add(1);
    let mut data = Vec::with_capacity(entry.uncompressed_size.min(raw.len() as u64 * 4) as usize);
    DeflateDecoder::new(raw)
        .take(limit)
        .read_to_end(&mut data)
        .map_err(|source| ArchiveError::Decompress {
            entry: entry.file_name.clone(),
            source,
        })?;
    Ok(data)
}

fn verify(entry: &ZipFileEntry, data: &[u8]) -> ArchiveResult<()> {
    if data.len() as u64 != entry.uncompressed_size {
        return Err(ArchiveError::SizeMismatch {
            entry: entry.file_name.clone(),
            expected: entry.uncompressed_size,
            actual: data.len() as u64,
        });
    }

    let mut crc = Crc::new();
    crc.update(data);
    if crc.sum() != entry.crc32 {
        return Err(ArchiveError::CrcMismatch {
            entry: entry.file_name.clone(),
            expected: entry.crc32,
            actual: crc.sum(),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::MemoryReader;
    use std::io::{Cursor, Write};

    fn build_zip(entries: &[(&str, &[u8], ::zip::CompressionMethod)]) -> Vec<u8> {
        let mut writer = ::zip::ZipWriter::new(Cursor::new(Vec::new()));
        for (name, data, method) in entries {
            let options = ::zip::write::SimpleFileOptions::default().compression_method(*method);
            writer.start_file(*name, options).unwrap();
            writer.write_all(data).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    fn extractor(bytes: Vec<u8>) -> ZipExtractor<MemoryReader> {
        ZipExtractor::new(Arc::new(MemoryReader::from_bytes(bytes)))
    }

    #[tokio::test]
    async fn extracts_stored_and_deflated_entries() {
        let body = "{\"foo\":\"bar\"}".repeat(50);
        let bytes = build_zip(&[
            ("stored/definition.json", body.as_bytes(), ::zip::CompressionMethod::Stored),
            ("deflated/definition.json", body.as_bytes(), ::zip::CompressionMethod::Deflated),
        ]);
        let extractor = extractor(bytes);
        let entries = extractor.list_files().await.unwrap();
        assert_eq!(entries[0].compression_method, CompressionMethod::Stored);
        assert_eq!(entries[1].compression_method, CompressionMethod::Deflate);

        for entry in &entries {
            assert_eq!(extractor.extract_text(entry).await.unwrap(), body);
        }
    }

    #[tokio::test]
    async fn detects_crc_mismatch() {
        let bytes = build_zip(&[(
            "definition.json",
            b"{\"foo\":\"bar\"}",
            ::zip::CompressionMethod::Stored,
        )]);
        let extractor = extractor(bytes);
        let mut entry = extractor.list_files().await.unwrap().remove(0);
        entry.crc32 ^= 0xFFFF;
        let err = extractor.extract_to_memory(&entry).await.unwrap_err();
        assert!(matches!(err, ArchiveError::CrcMismatch { .. }));
    }

    #[tokio::test]
    async fn detects_declared_size_mismatch() {
        let bytes = build_zip(&[(
            "definition.json",
            b"{\"foo\":\"bar\"}",
            ::zip::CompressionMethod::Deflated,
        )]);
        let extractor = extractor(bytes);
        let mut entry = extractor.list_files().await.unwrap().remove(0);
        entry.uncompressed_size = 4;
        let err = extractor.extract_to_memory(&entry).await.unwrap_err();
        assert!(matches!(
            err,
            ArchiveError::SizeMismatch { expected: 4, actual: 5, .. }
        ));
    }

    #[tokio::test]
    async fn rejects_invalid_utf8() {
        let bytes = build_zip(&[(
            "definition.json",
            &[0x7B, 0xFF, 0xFE, 0x7D],
            ::zip::CompressionMethod::Deflated,
        )]);
        let extractor = extractor(bytes);
        let entry = extractor.list_files().await.unwrap().remove(0);
        let err = extractor.extract_text(&entry).await.unwrap_err();
        assert!(matches!(err, ArchiveError::InvalidText { .. }));
    }

    #[tokio::test]
    async fn rejects_unknown_compression_and_encryption() {
        let bytes = build_zip(&[("definition.json", b"{}", ::zip::CompressionMethod::Stored)]);
        let extractor = extractor(bytes);
        let entry = extractor.list_files().await.unwrap().remove(0);

        let mut unknown = entry.clone();
        unknown.compression_method = CompressionMethod::Unknown(14);
        assert!(matches!(
            extractor.extract_to_memory(&unknown).await.unwrap_err(),
            ArchiveError::UnsupportedCompression { method: 14, .. }
        ));

        let mut encrypted = entry;
        encrypted.flags |= 0x0001;
        assert!(matches!(
            extractor.extract_to_memory(&encrypted).await.unwrap_err(),
            ArchiveError::Encrypted { .. }
        ));
    }
}
