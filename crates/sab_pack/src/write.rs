//! Types for writing megapack indices and stream blocks
//!

use binrw::BinWrite;
use bon::Builder;
use byteorder::{LittleEndian, WriteBytesExt};
use indexmap::IndexMap;
use std::io::{Cursor, Seek, Write};
use tracing::{debug, instrument};

use crate::{
    block::has_height_map,
    category::{Category, CATEGORY_COUNT, PROCESSING_ORDER},
    crc::CrcId,
    error::{Error, Result},
    types::{write_magic, CrossCheck, EntryHeader, FileEntry, HeightMapHeader, TextureDescriptor},
};

/// Megapack index generator
///
/// Blocks added with [`IndexWriter::add_block`] are stored right after the index and their
/// offsets are assigned when the index is finished.
///
/// ```
/// # fn doit() -> sab_pack::error::Result<()>
/// # {
/// use sab_pack::{ArchiveIndex, CrcId, IndexWriter};
///
/// let mut index = IndexWriter::new(std::io::Cursor::new(Vec::new()));
/// index.add_block(CrcId(1), CrcId(2), b"ALBS\0\0\0\0".to_vec());
///
/// let mut archive = index.finish()?;
/// archive.set_position(0);
///
/// let (index, warnings) = ArchiveIndex::read(&mut archive)?;
/// assert!(warnings.is_empty());
/// assert_eq!(index.read_block(&mut archive, CrcId(1), 0)?.entry_count(), 0);
/// # Ok(())
/// # }
/// # doit().unwrap();
/// ```
pub struct IndexWriter<W: Write + Seek> {
    inner: W,
    entries: Vec<FileEntry>,
    blocks: Vec<(usize, Vec<u8>)>,
}

impl<W: Write + Seek> IndexWriter<W> {
    /// Initializes the index.
    pub fn new(inner: W) -> IndexWriter<W> {
        IndexWriter {
            inner,
            entries: Vec::new(),
            blocks: Vec::new(),
        }
    }

    /// Add a record pointing at data stored elsewhere.
    pub fn add(&mut self, entry: FileEntry) {
        self.entries.push(entry);
    }

    /// Add a stream block stored after the index.
    pub fn add_block(&mut self, id: CrcId, secondary_id: CrcId, data: Vec<u8>) {
        self.blocks.push((self.entries.len(), data));
        self.entries.push(FileEntry {
            id,
            secondary_id,
            ..Default::default()
        });
    }

    /// Size of the index once written
    pub fn index_size(&self) -> u64 {
        8 + self.entries.len() as u64 * (FileEntry::SIZE + 8)
    }

    /// Write the index followed by the added blocks.
    #[instrument(skip(self), fields(records = self.entries.len()), err)]
    pub fn finish(mut self) -> Result<W> {
        let mut offset = self.inner.stream_position()? + self.index_size();
        for (slot, data) in &self.blocks {
            let entry = &mut self.entries[*slot];
            let id = entry.id;
            entry.offset = offset as i64;
            entry.size = u32::try_from(data.len())
                .map_err(|_| Error::CustomError(format!("block {} is too large", id)))?;
            offset += data.len() as u64;
        }

        write_magic(&mut self.inner, b"MP00")?;
        self.inner.write_u32::<LittleEndian>(self.entries.len() as u32)?;
        for entry in &self.entries {
            entry.write(&mut self.inner)?;
        }
        for entry in &self.entries {
            CrossCheck::from(entry).write(&mut self.inner)?;
        }

        for (_, data) in &self.blocks {
            self.inner.write_all(data)?;
        }

        Ok(self.inner)
    }
}

/// Options for how the stream block should be written
#[derive(Debug, Clone, Copy, Default, Builder)]
pub struct BlockWriterOptions {
    /// Flags the block will be read with
    #[builder(default)]
    pub flags: u32,

    /// Contents of the `HEI1` section, requires height map flags
    pub height_map: Option<HeightMapHeader>,
}

/// Stream block generator
///
/// Entry headers and payloads are laid out in [`PROCESSING_ORDER`], payloads back to back.
///
/// ```
/// # fn doit() -> sab_pack::error::Result<()>
/// # {
/// use sab_pack::{write::BlockWriterOptions, BlockWriter, Category, ContainerBlock, CrcId};
///
/// let mut block = BlockWriter::new(std::io::Cursor::new(Vec::new()), BlockWriterOptions::default());
/// block.add_entry(Category::Mesh, CrcId(1), CrcId(0), b"mesh data".to_vec())?;
///
/// let mut data = block.finish()?;
/// data.set_position(0);
///
/// let block = ContainerBlock::read(data)?;
/// assert_eq!(block.entries(Category::Mesh)[0].payload, b"mesh data");
/// # Ok(())
/// # }
/// # doit().unwrap();
/// ```
pub struct BlockWriter<W: Write + Seek> {
    inner: W,
    options: BlockWriterOptions,
    texture_descriptors: Vec<TextureDescriptor>,
    alt_texture_descriptors: Vec<TextureDescriptor>,
    palette_refs: Vec<CrcId>,
    stream_block_refs: Vec<CrcId>,
    fence_tree: IndexMap<CrcId, Vec<u32>>,
    entries: [Vec<(EntryHeader, Vec<u8>)>; CATEGORY_COUNT],
}

impl<W: Write + Seek> BlockWriter<W> {
    /// Initializes the block.
    pub fn new(inner: W, options: BlockWriterOptions) -> BlockWriter<W> {
        BlockWriter {
            inner,
            options,
            texture_descriptors: Vec::new(),
            alt_texture_descriptors: Vec::new(),
            palette_refs: Vec::new(),
            stream_block_refs: Vec::new(),
            fence_tree: IndexMap::new(),
            entries: Default::default(),
        }
    }

    /// Add an entry whose payload is stored uncompressed.
    pub fn add_entry(
        &mut self,
        category: Category,
        id: CrcId,
        secondary_id: CrcId,
        payload: Vec<u8>,
    ) -> Result<()> {
        let size = payload_size(id, payload.len())?;
        self.add_entry_with_size(category, id, secondary_id, payload, size)
    }

    /// Add an entry, announcing the size of its payload once decompressed.
    pub fn add_entry_with_size(
        &mut self,
        category: Category,
        id: CrcId,
        secondary_id: CrcId,
        payload: Vec<u8>,
        uncompressed_size: i32,
    ) -> Result<()> {
        let header = EntryHeader {
            id,
            compressed_size: payload_size(id, payload.len())?,
            uncompressed_size,
            secondary_id,
            ..Default::default()
        };
        self.entries[category.index()].push((header, payload));

        Ok(())
    }

    /// Add a primary texture descriptor.
    pub fn add_texture(&mut self, descriptor: TextureDescriptor) {
        self.texture_descriptors.push(descriptor);
    }

    /// Add a secondary texture descriptor.
    pub fn add_alt_texture(&mut self, descriptor: TextureDescriptor) {
        self.alt_texture_descriptors.push(descriptor);
    }

    /// Reference a palette.
    pub fn add_palette_ref(&mut self, id: CrcId) {
        self.palette_refs.push(id);
    }

    /// Reference another stream block.
    pub fn add_stream_block_ref(&mut self, id: CrcId) {
        self.stream_block_refs.push(id);
    }

    /// Add or replace the neighbours of a fence region.
    pub fn add_fence(&mut self, id: CrcId, children: Vec<u32>) {
        self.fence_tree.insert(id, children);
    }

    fn has_extended_header(&self) -> bool {
        self.options.height_map.is_some()
            || !self.texture_descriptors.is_empty()
            || !self.alt_texture_descriptors.is_empty()
            || !self.palette_refs.is_empty()
            || !self.stream_block_refs.is_empty()
            || !self.fence_tree.is_empty()
            || self.entries.iter().any(|e| !e.is_empty())
    }

    fn write_extended_header(&self, out: &mut Cursor<Vec<u8>>) -> Result<()> {
        if let Some(height_map) = &self.options.height_map {
            if !has_height_map(self.options.flags) {
                return Err(Error::CustomError(format!(
                    "flags {:#x} do not allow a height map",
                    self.options.flags
                )));
            }
            write_magic(out, b"HEI1")?;
            height_map.write(out)?;
        } else if has_height_map(self.options.flags) {
            return Err(Error::CustomError(format!(
                "flags {:#x} require a height map",
                self.options.flags
            )));
        }

        for descriptors in [&self.texture_descriptors, &self.alt_texture_descriptors] {
            out.write_u32::<LittleEndian>(descriptors.len() as u32)?;
            for descriptor in descriptors {
                descriptor.write(out)?;
            }
        }

        out.write_i32::<LittleEndian>(0)?;
        for entries in &self.entries {
            out.write_u32::<LittleEndian>(entries.len() as u32)?;
        }

        out.write_u32::<LittleEndian>(self.palette_refs.len() as u32)?;
        for id in &self.palette_refs {
            id.write(out)?;
        }

        if self.stream_block_refs.len() > u16::MAX as usize {
            return Err(Error::CustomError(format!(
                "{} stream block references do not fit in a block",
                self.stream_block_refs.len()
            )));
        }
        out.write_i32::<LittleEndian>(self.stream_block_refs.len() as i32)?;
        for id in &self.stream_block_refs {
            id.write(out)?;
        }

        out.write_i32::<LittleEndian>(self.fence_tree.len() as i32)?;
        for (id, children) in &self.fence_tree {
            id.write(out)?;
            out.write_u32::<LittleEndian>(children.len() as u32)?;
            for child in children {
                out.write_u32::<LittleEndian>(*child)?;
            }
        }

        Ok(())
    }

    /// Write the block, returning the writer.
    #[instrument(skip(self), err)]
    pub fn finish(mut self) -> Result<W> {
        let mut header = Cursor::new(Vec::new());
        if self.has_extended_header() {
            self.write_extended_header(&mut header)?;
        }
        let header = header.into_inner();

        let mut relative_offset = 0i32;
        for category in PROCESSING_ORDER {
            for (entry, payload) in self.entries[category.index()].iter_mut() {
                entry.relative_offset = relative_offset;
                relative_offset = relative_offset
                    .checked_add(payload.len() as i32)
                    .ok_or_else(|| Error::CustomError("payloads do not fit in a block".into()))?;
            }
        }
        debug!(
            "writing {} header bytes and {} payload bytes",
            header.len(),
            relative_offset
        );

        write_magic(&mut self.inner, b"SBLA")?;
        self.inner.write_u32::<LittleEndian>(header.len() as u32)?;
        self.inner.write_all(&header)?;

        for category in PROCESSING_ORDER {
            for (entry, _) in &self.entries[category.index()] {
                entry.write(&mut self.inner)?;
            }
        }

        for category in PROCESSING_ORDER {
            for (_, payload) in &self.entries[category.index()] {
                self.inner.write_all(payload)?;
            }
        }

        Ok(self.inner)
    }
}

fn payload_size(id: CrcId, len: usize) -> Result<i32> {
    i32::try_from(len)
        .map_err(|_| Error::CustomError(format!("payload of {} is too large for a block", id)))
}
