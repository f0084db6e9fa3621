//! Fixed layout records of the index and stream block formats.

use std::io::{Read, Seek, SeekFrom, Write};

use binrw::{BinRead, BinWrite};

use crate::crc::CrcId;
use crate::error::{Error, Result};

/// Length of the stream, leaving the position where it was
pub(crate) fn stream_len<R: Seek>(reader: &mut R) -> Result<u64> {
    let position = reader.stream_position()?;
    let end = reader.seek(SeekFrom::End(0))?;
    reader.seek(SeekFrom::Start(position))?;
    Ok(end)
}

/// Read a 4-byte magic stored in reversed byte order
///
/// `expected` is given in its readable form, so `b"MP00"` matches the bytes `00PM`.
pub(crate) fn read_magic<R: Read>(reader: &mut R, expected: &[u8; 4], offset: u64) -> Result<()> {
    let mut found = [0u8; 4];
    reader.read_exact(&mut found)?;
    found.reverse();

    if &found != expected {
        return Err(Error::BadMagic {
            expected: String::from_utf8_lossy(expected).into_owned(),
            found: String::from_utf8_lossy(&found).into_owned(),
            offset,
        });
    }

    Ok(())
}

/// Write a 4-byte magic in reversed byte order
pub(crate) fn write_magic<W: Write>(writer: &mut W, magic: &[u8; 4]) -> Result<()> {
    let mut reversed = *magic;
    reversed.reverse();
    writer.write_all(&reversed)?;
    Ok(())
}

/// Index record locating one stream block inside a megapack
#[derive(BinRead, BinWrite, Debug, Default, Copy, Clone, PartialEq, Eq)]
#[brw(little)]
pub struct FileEntry {
    /// Content id of the stream block
    pub id: CrcId,

    /// Second content id of the stream block
    pub secondary_id: CrcId,

    /// Size in bytes of the stream block in the archive
    pub size: u32,

    /// Absolute offset of the stream block from the start of the archive
    pub offset: i64,
}

impl FileEntry {
    /// Size of the record on disk
    pub const SIZE: u64 = 20;
}

/// Pair of the cross check table at the end of the index
#[derive(BinRead, BinWrite, Debug, Default, Copy, Clone, PartialEq, Eq)]
#[brw(little)]
pub struct CrossCheck {
    #[allow(missing_docs)]
    pub id: CrcId,
    #[allow(missing_docs)]
    pub secondary_id: CrcId,
}

impl CrossCheck {
    /// Size of the pair on disk
    pub const SIZE: u64 = 8;
}

impl From<&FileEntry> for CrossCheck {
    fn from(value: &FileEntry) -> Self {
        Self {
            id: value.id,
            secondary_id: value.secondary_id,
        }
    }
}

/// Uncompressed size announcement for one texture of a stream block
#[derive(BinRead, BinWrite, Debug, Default, Copy, Clone, PartialEq, Eq)]
#[brw(little)]
pub struct TextureDescriptor {
    /// Content id of the texture
    pub id: CrcId,

    /// Size of the texture once decompressed
    pub uncompressed_size: u32,
}

/// The `HEI1` section of an extended stream block header, without its magic
#[derive(BinRead, BinWrite, Debug, Default, Copy, Clone, PartialEq)]
#[brw(little)]
pub struct HeightMapHeader {
    /// Number of samples along X
    pub count_x: u32,

    /// Number of samples along Z
    pub count_z: u32,

    /// Upper bound of the height range
    pub float_a: f32,

    /// Lower bound of the height range
    pub float_fc: f32,
}

/// Entry record as stored on disk
#[derive(BinRead, BinWrite, Debug, Default, Copy, Clone, PartialEq, Eq)]
#[brw(little)]
pub struct EntryHeader {
    /// Content id of the entry
    pub id: CrcId,

    /// Offset of the payload from the payload base of the block
    pub relative_offset: i32,

    /// Size of the payload in the block
    pub compressed_size: i32,

    /// Size of the payload once decompressed
    pub uncompressed_size: i32,

    /// Unused by the game
    pub reserved: i32,

    /// Second content id of the entry
    pub secondary_id: CrcId,
}

impl EntryHeader {
    /// Size of the record on disk
    pub const SIZE: u32 = 24;
}

/// A stream block entry and, once loaded, its payload
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Entry {
    /// Content id of the entry
    pub id: CrcId,

    /// Offset of the payload from the payload base of the block
    pub relative_offset: i32,

    /// Size of the payload in the block
    pub compressed_size: i32,

    /// Size of the payload once decompressed
    pub uncompressed_size: i32,

    /// Unused by the game
    pub reserved: i32,

    /// Second content id of the entry
    pub secondary_id: CrcId,

    /// Payload bytes, empty until the payload pass of the block parse
    pub payload: Vec<u8>,
}

impl Entry {
    /// Header record of this entry
    pub fn header(&self) -> EntryHeader {
        EntryHeader {
            id: self.id,
            relative_offset: self.relative_offset,
            compressed_size: self.compressed_size,
            uncompressed_size: self.uncompressed_size,
            reserved: self.reserved,
            secondary_id: self.secondary_id,
        }
    }
}

impl From<EntryHeader> for Entry {
    fn from(value: EntryHeader) -> Self {
        Self {
            id: value.id,
            relative_offset: value.relative_offset,
            compressed_size: value.compressed_size,
            uncompressed_size: value.uncompressed_size,
            reserved: value.reserved,
            secondary_id: value.secondary_id,
            payload: Vec::new(),
        }
    }
}
