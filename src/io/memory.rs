use std::path::Path;

use async_trait::async_trait;

use super::ReadAt;
use crate::error::{ArchiveError, ArchiveResult};

/// An archive held entirely in memory.
///
/// The whole file is read once up front; every later access is a slice copy.
pub struct MemoryReader {
    data: Vec<u8>,
}

impl MemoryReader {
    /// Read the file at `path` into memory
    pub async fn load(path: &Path) -> ArchiveResult<Self> {
        let data = tokio::fs::read(path).await?;
        log::debug!("Loaded {} bytes from {}", data.len(), path.display());
        Ok(Self { data })
    }

    pub fn from_bytes(data: Vec<u8>) -> Self {
        Self { data }
    }
}

#[async_trait]
impl ReadAt for MemoryReader {
    async fn read_at(&self, offset: u64, buf: &mut [u8]) -> ArchiveResult<usize> {
        let start = usize::try_from(offset)
            .ok()
            .filter(|&start| start <= self.data.len())
            .ok_or(ArchiveError::OutOfBounds {
                offset,
                len: buf.len() as u64,
            })?;

        let n = buf.len().min(self.data.len() - start);
        buf[..n].copy_from_slice(&self.data[start..start + n]);
        Ok(n)
    }

    fn size(&self) -> u64 {
        self.data.len() as u64
    }
}
