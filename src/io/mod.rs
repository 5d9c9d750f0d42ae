mod memory;

pub use memory::MemoryReader;

use async_trait::async_trait;

use crate::error::{ArchiveError, ArchiveResult};

/// Random access reads from an archive source
#[async_trait]
pub trait ReadAt: Send + Sync {
    /// Read up to `buf.len()` bytes at `offset`, returning how many were read
    async fn read_at(&self, offset: u64, buf: &mut [u8]) -> ArchiveResult<usize>;

    /// Total size of the source in bytes
    fn size(&self) -> u64;

    /// Fill `buf` completely from `offset` or fail
    async fn read_exact_at(&self, offset: u64, buf: &mut [u8]) -> ArchiveResult<()> {
        let len = buf.len() as u64;
        if offset.checked_add(len).is_none_or(|end| end > self.size()) {
            return Err(ArchiveError::OutOfBounds { offset, len });
        }

        let mut filled = 0;
        while filled < buf.len() {
            let n = self.read_at(offset + filled as u64, &mut buf[filled..]).await?;
            if n == 0 {
                return Err(ArchiveError::OutOfBounds { offset, len });
            }
            filled += n;
        }
        Ok(())
    }
}
