//! Low-level ZIP directory parser.
//!
//! ZIP files are read from the end:
//! 1. Find the End of Central Directory (EOCD) at the file's tail
//! 2. If any EOCD field is saturated, follow the ZIP64 locator
//! 3. Read the Central Directory to get metadata for all entries
//! 4. For extraction, read each entry's Local File Header to find its data
//!
//! Every offset taken from the archive is checked against the source size
//! before it is used, so a corrupt file fails with an [`ArchiveError`]
//! instead of a huge allocation or a panic.

use byteorder::{LittleEndian, ReadBytesExt};
use std::io::{Cursor, Read};
use std::sync::Arc;

use crate::error::{ArchiveError, ArchiveResult};
use crate::io::ReadAt;

use super::structures::*;

/// Maximum ZIP comment size allowed by the format.
const MAX_COMMENT_SIZE: u64 = 65535;

const ZIP64_EXTRA_ID: u16 = 0x0001;

/// Parser for the central directory of one archive.
pub struct ZipParser<R: ReadAt> {
    reader: Arc<R>,
    size: u64,
}

impl<R: ReadAt> ZipParser<R> {
    pub fn new(reader: Arc<R>) -> Self {
        let size = reader.size();
        Self { reader, size }
    }

    /// Locate and parse the EOCD record, returning it with its offset.
    ///
    /// Tries the comment-less layout first, then scans backwards through the
    /// largest possible comment for a signature whose comment length lines up
    /// with the end of the file.
    pub async fn find_eocd(&self) -> ArchiveResult<(EndOfCentralDirectory, u64)> {
        let eocd_size = EndOfCentralDirectory::SIZE as u64;
        if self.size < eocd_size {
            return Err(ArchiveError::NotAZip);
        }

        let offset = self.size - eocd_size;
        let mut buf = vec![0u8; EndOfCentralDirectory::SIZE];
        self.reader.read_exact_at(offset, &mut buf).await?;
        if &buf[0..4] == EndOfCentralDirectory::SIGNATURE && buf[20..22] == [0, 0] {
            return Ok((EndOfCentralDirectory::from_bytes(&buf)?, offset));
        }

        let search_size = (MAX_COMMENT_SIZE + eocd_size).min(self.size);
        let search_start = self.size - search_size;
        let mut buf = vec![0u8; search_size as usize];
        self.reader.read_exact_at(search_start, &mut buf).await?;

        for i in (0..=buf.len() - EndOfCentralDirectory::SIZE).rev() {
            if &buf[i..i + 4] != EndOfCentralDirectory::SIGNATURE {
                continue;
            }
            let comment_len = u16::from_le_bytes([buf[i + 20], buf[i + 21]]) as usize;
            if comment_len == buf.len() - i - EndOfCentralDirectory::SIZE {
                let eocd =
                    EndOfCentralDirectory::from_bytes(&buf[i..i + EndOfCentralDirectory::SIZE])?;
                return Ok((eocd, search_start + i as u64));
            }
        }

        Err(ArchiveError::NotAZip)
    }

    /// Read the ZIP64 EOCD through the locator that precedes the regular EOCD.
    pub async fn read_zip64_eocd(&self, eocd_offset: u64) -> ArchiveResult<Zip64Eocd> {
        let locator_offset = eocd_offset
            .checked_sub(Zip64EocdLocator::SIZE as u64)
            .ok_or(ArchiveError::Malformed("missing ZIP64 locator"))?;
        let mut locator_buf = vec![0u8; Zip64EocdLocator::SIZE];
        self.reader
            .read_exact_at(locator_offset, &mut locator_buf)
            .await?;
        let locator = Zip64EocdLocator::from_bytes(&locator_buf)?;

        let mut eocd64_buf = vec![0u8; Zip64Eocd::MIN_SIZE];
        self.reader
            .read_exact_at(locator.eocd64_offset, &mut eocd64_buf)
            .await?;
        Zip64Eocd::from_bytes(&eocd64_buf)
    }

    /// List every entry of the central directory, in directory order.
    pub async fn list_files(&self) -> ArchiveResult<Vec<ZipFileEntry>> {
        let (eocd, eocd_offset) = self.find_eocd().await?;

        let (cd_offset, cd_size, total_entries) = if eocd.is_zip64() {
            let eocd64 = self.read_zip64_eocd(eocd_offset).await?;
            (eocd64.cd_offset, eocd64.cd_size, eocd64.total_entries)
        } else {
            (
                eocd.cd_offset as u64,
                eocd.cd_size as u64,
                eocd.total_entries as u64,
            )
        };

        if cd_offset.checked_add(cd_size).is_none_or(|end| end > self.size) {
            return Err(ArchiveError::Malformed(
                "central directory extends past end of file",
            ));
        }
        if total_entries.saturating_mul(CDFH_MIN_SIZE as u64) > cd_size {
            return Err(ArchiveError::Malformed(
                "entry count does not fit in central directory",
            ));
        }

        let mut cd_data = vec![0u8; cd_size as usize];
        self.reader.read_exact_at(cd_offset, &mut cd_data).await?;

        let mut entries = Vec::with_capacity(total_entries as usize);
        let mut cursor = Cursor::new(cd_data.as_slice());
        for _ in 0..total_entries {
            entries.push(parse_cdfh(&mut cursor)?);
        }

        log::debug!("Central directory lists {} entries", entries.len());
        Ok(entries)
    }

    /// Offset of the first data byte of `entry`.
    ///
    /// The local header's name and extra lengths can differ from the central
    /// directory copy, so they are read from the local header itself.
    pub async fn data_offset(&self, entry: &ZipFileEntry) -> ArchiveResult<u64> {
        let mut lfh_buf = [0u8; LFH_SIZE];
        self.reader.read_exact_at(entry.lfh_offset, &mut lfh_buf).await?;
        if &lfh_buf[0..4] != LFH_SIGNATURE {
            return Err(ArchiveError::Malformed("invalid local file header"));
        }

        let file_name_length = u16::from_le_bytes([lfh_buf[26], lfh_buf[27]]) as u64;
        let extra_field_length = u16::from_le_bytes([lfh_buf[28], lfh_buf[29]]) as u64;

        Ok(entry.lfh_offset + LFH_SIZE as u64 + file_name_length + extra_field_length)
    }

    pub fn reader(&self) -> &Arc<R> {
        &self.reader
    }
}

/// Parse one Central Directory File Header at the cursor.
fn parse_cdfh(cursor: &mut Cursor<&[u8]>) -> ArchiveResult<ZipFileEntry> {
    let truncated = |_: std::io::Error| ArchiveError::Malformed("truncated central directory");

    let mut sig = [0u8; 4];
    cursor.read_exact(&mut sig).map_err(truncated)?;
    if sig != CDFH_SIGNATURE {
        return Err(ArchiveError::Malformed("invalid central directory file header"));
    }

    let mut header = [0u8; CDFH_MIN_SIZE - 4];
    cursor.read_exact(&mut header).map_err(truncated)?;
    let mut fields = Cursor::new(&header[..]);

    // version made by, version needed
    fields.set_position(4);
    let flags = fields.read_u16::<LittleEndian>()?;
    let compression_method = fields.read_u16::<LittleEndian>()?;
    // last modified time and date
    fields.set_position(fields.position() + 4);
    let crc32 = fields.read_u32::<LittleEndian>()?;
    let mut compressed_size = fields.read_u32::<LittleEndian>()? as u64;
    let mut uncompressed_size = fields.read_u32::<LittleEndian>()? as u64;
    let file_name_length = fields.read_u16::<LittleEndian>()? as usize;
    let extra_field_length = fields.read_u16::<LittleEndian>()? as usize;
    let file_comment_length = fields.read_u16::<LittleEndian>()? as usize;
    // disk number start, internal and external attributes
    fields.set_position(fields.position() + 8);
    let mut lfh_offset = fields.read_u32::<LittleEndian>()? as u64;

    let mut file_name_bytes = vec![0u8; file_name_length];
    cursor.read_exact(&mut file_name_bytes).map_err(truncated)?;
    let file_name = String::from_utf8_lossy(&file_name_bytes).into_owned();
    let is_directory = file_name.ends_with('/');

    let mut extra = vec![0u8; extra_field_length];
    cursor.read_exact(&mut extra).map_err(truncated)?;
    let mut extra = Cursor::new(extra.as_slice());
    while extra.position() + 4 <= extra_field_length as u64 {
        let header_id = extra.read_u16::<LittleEndian>()?;
        let field_size = extra.read_u16::<LittleEndian>()? as u64;
        let field_end = extra.position() + field_size;

        if header_id == ZIP64_EXTRA_ID {
            // Values appear only for header fields saturated at 0xFFFFFFFF, in this order.
            for value in [&mut uncompressed_size, &mut compressed_size, &mut lfh_offset] {
                if *value == 0xFFFFFFFF && extra.position() + 8 <= field_end {
                    *value = extra.read_u64::<LittleEndian>()?;
                }
            }
        }
        extra.set_position(field_end);
    }

    let comment_end = cursor.position() + file_comment_length as u64;
    if comment_end > cursor.get_ref().len() as u64 {
        return Err(ArchiveError::Malformed("truncated central directory"));
    }
    cursor.set_position(comment_end);

    Ok(ZipFileEntry {
        file_name,
        compression_method: CompressionMethod::from_u16(compression_method),
        compressed_size,
        uncompressed_size,
        crc32,
        lfh_offset,
        flags,
        is_directory,
    })
}
