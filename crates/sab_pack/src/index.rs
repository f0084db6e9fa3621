//! Types for reading megapack indices
//!

use binrw::BinRead;
use byteorder::{LittleEndian, ReadBytesExt};
use indexmap::IndexMap;
use std::io::{Cursor, Read, Seek, SeekFrom};
use tracing::{debug, instrument, warn};

use crate::{
    block::ContainerBlock,
    crc::CrcId,
    error::{Error, Result, ValidationWarning},
    types::{read_magic, stream_len, CrossCheck, FileEntry},
};

/// Megapack index reader
///
/// ```no_run
/// use std::fs::File;
///
/// fn list_blocks(mut reader: File) -> sab_pack::error::Result<()> {
///     let (index, warnings) = sab_pack::ArchiveIndex::read(&mut reader)?;
///     for warning in warnings {
///         eprintln!("warning: {warning}");
///     }
///
///     for entry in index.iter() {
///         let block = index.read_block(&mut reader, entry.id, 0)?;
///         println!("{}: {} entries", entry.id, block.entry_count());
///     }
///
///     Ok(())
/// }
/// ```
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ArchiveIndex {
    file_count: u32,
    entries: IndexMap<CrcId, FileEntry>,
    cross_check: Vec<CrossCheck>,
}

impl ArchiveIndex {
    /// Read an index, collecting any anomalies of the cross check table.
    #[instrument(skip(reader), err)]
    pub fn read<R: Read + Seek>(mut reader: R) -> Result<(ArchiveIndex, Vec<ValidationWarning>)> {
        let start = reader.stream_position()?;
        read_magic(&mut reader, b"MP00", start)?;

        let file_count = reader.read_u32::<LittleEndian>()?;
        debug!("index holds {} records", file_count);

        let position = reader.stream_position()?;
        let available = stream_len(&mut reader)?;
        let wanted = file_count as u64 * (FileEntry::SIZE + CrossCheck::SIZE);
        if position + wanted > available {
            return Err(Error::Truncated {
                offset: position as i64,
                wanted,
                available,
            });
        }

        let mut warnings = Vec::new();

        let mut entries = IndexMap::with_capacity(file_count as usize);
        for _ in 0..file_count {
            let entry = FileEntry::read(&mut reader)?;
            if entries.insert(entry.id, entry).is_some() {
                warn!("index holds more than one record for {}", entry.id);
                warnings.push(ValidationWarning::DuplicateEntry(entry.id));
            }
        }

        let mut cross_check = Vec::with_capacity(file_count as usize);
        for _ in 0..file_count {
            let pair = CrossCheck::read(&mut reader)?;
            cross_check.push(pair);

            let Some(entry) = entries.get(&pair.id) else {
                let warning = ValidationWarning::UnknownCrossCheckEntry {
                    id: pair.id,
                    secondary_id: pair.secondary_id,
                };
                warn!("{}", warning);
                warnings.push(warning);
                continue;
            };

            if entry.secondary_id != pair.secondary_id {
                let warning = ValidationWarning::CrossCheckMismatch {
                    id: pair.id,
                    expected: entry.secondary_id,
                    found: pair.secondary_id,
                };
                warn!("{}", warning);
                warnings.push(warning);
            }
        }

        Ok((
            ArchiveIndex {
                file_count,
                entries,
                cross_check,
            },
            warnings,
        ))
    }

    /// Record count stored in the index header
    pub fn file_count(&self) -> u32 {
        self.file_count
    }

    /// Number of distinct records in the index
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether this index holds no records
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Look up the record for a stream block
    pub fn get(&self, id: CrcId) -> Option<&FileEntry> {
        self.entries.get(&id)
    }

    /// Whether the index holds a record for `id`
    pub fn contains(&self, id: CrcId) -> bool {
        self.entries.contains_key(&id)
    }

    /// Records in the order they appear in the file
    pub fn iter(&self) -> impl Iterator<Item = &FileEntry> {
        self.entries.values()
    }

    /// Ids of the records in the order they appear in the file
    pub fn ids(&self) -> impl Iterator<Item = CrcId> + '_ {
        self.entries.keys().copied()
    }

    /// The cross check pairs as stored
    pub fn cross_check(&self) -> impl Iterator<Item = (CrcId, CrcId)> + '_ {
        self.cross_check.iter().map(|c| (c.id, c.secondary_id))
    }

    /// Total size of the stream blocks referenced by the index
    pub fn total_size(&self) -> u64 {
        self.entries.values().map(|e| e.size as u64).sum()
    }

    /// Read the raw bytes of a stream block from the archive
    #[instrument(skip(self, reader), err)]
    pub fn read_raw<R: Read + Seek>(&self, mut reader: R, id: CrcId) -> Result<Vec<u8>> {
        let entry = self.get(id).ok_or(Error::EntryNotFound(id))?;

        let available = reader.seek(SeekFrom::End(0))?;
        let end = entry.offset.checked_add(entry.size as i64);
        if entry.offset < 0 || end.map_or(true, |end| end as u64 > available) {
            return Err(Error::Truncated {
                offset: entry.offset,
                wanted: entry.size as u64,
                available,
            });
        }

        reader.seek(SeekFrom::Start(entry.offset as u64))?;
        let mut buffer = vec![0u8; entry.size as usize];
        reader.read_exact(&mut buffer)?;

        Ok(buffer)
    }

    /// Read and parse a stream block from the archive
    ///
    /// `flags` are the stream block flags recorded by the map that references the block.
    pub fn read_block<R: Read + Seek>(
        &self,
        reader: R,
        id: CrcId,
        flags: u32,
    ) -> Result<ContainerBlock> {
        let data = self.read_raw(reader, id)?;
        ContainerBlock::read_with_flags(Cursor::new(data), flags)
    }
}
