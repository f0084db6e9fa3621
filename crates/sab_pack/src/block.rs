//! Types for reading stream blocks
//!

use binrw::BinRead;
use byteorder::{LittleEndian, ReadBytesExt};
use indexmap::IndexMap;
use std::io::{Read, Seek, SeekFrom};
use tracing::{debug, instrument, trace, warn};

use crate::{
    category::{Category, CATEGORY_COUNT, PROCESSING_ORDER},
    crc::CrcId,
    error::{Error, Result, ValidationWarning},
    types::{read_magic, stream_len, Entry, EntryHeader, HeightMapHeader, TextureDescriptor},
};

/// Mask of the flag bits selecting the height map layout
pub const HEIGHT_MAP_FLAG_MASK: u32 = 0x1C00;

/// Flag value for which the extended header starts with a `HEI1` section
pub const HEIGHT_MAP_FLAG: u32 = 0x400;

/// Whether blocks with these flags carry a `HEI1` section
pub const fn has_height_map(flags: u32) -> bool {
    flags & HEIGHT_MAP_FLAG_MASK == HEIGHT_MAP_FLAG
}

/// Height map settings of a stream block
#[derive(Debug, Clone, PartialEq)]
pub struct HeightMap {
    /// Number of samples along X
    pub count_x: u32,
    /// Number of samples along Z
    pub count_z: u32,
    /// Upper bound of the height range
    pub float_a: f32,
    /// Lower bound of the height range
    pub float_fc: f32,
    /// Height covered by one step of a sample
    pub scale: f32,
    /// One byte per sample, zeroed until the height data is streamed in
    pub samples: Vec<u8>,
}

/// Largest height map accepted, in samples
pub const MAX_HEIGHT_MAP_SAMPLES: usize = 4096 * 4096;

impl TryFrom<HeightMapHeader> for HeightMap {
    type Error = Error;

    fn try_from(value: HeightMapHeader) -> Result<Self> {
        let samples = (value.count_x as usize)
            .checked_mul(value.count_z as usize)
            .filter(|samples| *samples <= MAX_HEIGHT_MAP_SAMPLES)
            .ok_or(Error::InvalidHeightMap {
                count_x: value.count_x,
                count_z: value.count_z,
            })?;

        Ok(Self {
            count_x: value.count_x,
            count_z: value.count_z,
            float_a: value.float_a,
            float_fc: value.float_fc,
            scale: (value.float_a - value.float_fc) / 255.0,
            samples: vec![0u8; samples],
        })
    }
}

/// World space placement of a stream block
///
/// Not part of the block stream, it is recorded by the map that references the block.
#[derive(Debug, Default, Copy, Clone, PartialEq)]
pub struct Bounds {
    #[allow(missing_docs)]
    pub midpoint: [f32; 3],
    #[allow(missing_docs)]
    pub extents: [[f32; 3]; 2],
}

/// Contents of an extended stream block header
#[derive(Debug, Default, Clone, PartialEq)]
pub struct BlockHeader {
    /// The `HEI1` section, present only for height map flags
    pub height_map: Option<HeightMap>,
    /// Primary texture descriptors
    pub texture_descriptors: Vec<TextureDescriptor>,
    /// Secondary texture descriptors
    pub alt_texture_descriptors: Vec<TextureDescriptor>,
    /// Sum of the uncompressed sizes of both descriptor lists
    pub total_texture_size: u64,
    /// Palettes referenced by the block
    pub palette_refs: Vec<CrcId>,
    /// One flag byte per palette reference, always zero when read
    pub palette_flags: Vec<u8>,
    /// Other stream blocks referenced by the block
    pub stream_block_refs: Vec<CrcId>,
    /// Adjacency lists of the AI fence regions keyed by region id
    pub fence_tree: IndexMap<CrcId, Vec<u32>>,
    /// World space placement
    pub bounds: Bounds,
}

/// Optional extended header of a stream block
#[derive(Debug, Default, Clone, PartialEq)]
pub enum ExtendedHeader {
    /// The length prefix was zero, the block holds no entries
    #[default]
    Absent,
    /// The block carries descriptor tables and entries
    Present(Box<BlockHeader>),
}

impl ExtendedHeader {
    /// The header contents, if present
    pub fn as_present(&self) -> Option<&BlockHeader> {
        match self {
            ExtendedHeader::Absent => None,
            ExtendedHeader::Present(header) => Some(header),
        }
    }

    /// Height step of a sample, `1.0` without a height map
    pub fn height_scale(&self) -> f32 {
        self.as_present()
            .and_then(|h| h.height_map.as_ref())
            .map_or(1.0, |m| m.scale)
    }
}

/// A parsed stream block
///
/// ```no_run
/// fn list_entries(reader: impl std::io::Read + std::io::Seek) -> sab_pack::error::Result<()> {
///     let block = sab_pack::ContainerBlock::read(reader)?;
///
///     for (category, entry) in block.entries_in_order() {
///         println!("{category}: {} ({} bytes)", entry.id, entry.payload.len());
///     }
///
///     Ok(())
/// }
/// ```
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ContainerBlock {
    flags: u32,
    start: u64,
    header_end: u32,
    header: ExtendedHeader,
    entry_counts: [u32; CATEGORY_COUNT],
    entries: [Vec<Entry>; CATEGORY_COUNT],
    warnings: Vec<ValidationWarning>,
}

impl ContainerBlock {
    /// Read a stream block with no flags set, including every payload.
    pub fn read<R: Read + Seek>(reader: R) -> Result<ContainerBlock> {
        Self::read_with_flags(reader, 0)
    }

    /// Read a stream block, including every payload.
    pub fn read_with_flags<R: Read + Seek>(mut reader: R, flags: u32) -> Result<ContainerBlock> {
        let mut block = Self::read_header(&mut reader, flags)?;
        block.read_payloads(&mut reader)?;
        Ok(block)
    }

    /// Read the header and every entry record, leaving the payloads empty.
    ///
    /// When this returns, [`ContainerBlock::header_end`] holds the final payload base.
    #[instrument(skip(reader), err)]
    pub fn read_header<R: Read + Seek>(mut reader: R, flags: u32) -> Result<ContainerBlock> {
        let start = reader.stream_position()?;
        read_magic(&mut reader, b"SBLA", start)?;

        let seed = reader.read_u32::<LittleEndian>()?;

        let available = stream_len(&mut reader)?;
        if start + 8 + seed as u64 > available {
            return Err(Error::Truncated {
                offset: (start + 8) as i64,
                wanted: seed as u64,
                available,
            });
        }

        let mut block = ContainerBlock {
            flags,
            start,
            ..Default::default()
        };

        if seed > 0 {
            let header = block.read_extended_header(&mut reader)?;
            block.header = ExtendedHeader::Present(Box::new(header));

            let expected = start + 8 + seed as u64;
            let actual = reader.stream_position()?;
            if expected != actual {
                let warning = ValidationWarning::HeaderLengthMismatch { expected, actual };
                warn!("{}", warning);
                block.warnings.push(warning);
            }
        }

        let position = reader.stream_position()?;
        let wanted = block
            .entry_counts
            .iter()
            .map(|count| *count as u64 * EntryHeader::SIZE as u64)
            .sum::<u64>();
        if position + wanted > available {
            return Err(Error::Truncated {
                offset: position as i64,
                wanted,
                available,
            });
        }

        for category in PROCESSING_ORDER {
            let count = block.entry_counts[category.index()];
            if count == 0 {
                continue;
            }

            let entries = (0..count)
                .map(|_| EntryHeader::read(&mut reader).map(Entry::from))
                .collect::<core::result::Result<Vec<_>, _>>()?;
            trace!("read {} {} entry headers", count, category);

            block.entries[category.index()] = entries;
        }

        let header_end = seed as u64 + 4 + wanted + 4;
        block.header_end = u32::try_from(header_end).map_err(|_| {
            Error::CustomError(format!("block header of {} bytes is too large", header_end))
        })?;
        debug!("payload base at {}", block.header_end);

        Ok(block)
    }

    fn read_extended_header<R: Read + Seek>(&mut self, reader: &mut R) -> Result<BlockHeader> {
        let mut header = BlockHeader::default();

        if has_height_map(self.flags) {
            let offset = reader.stream_position()?;
            read_magic(reader, b"HEI1", offset)?;
            header.height_map = Some(HeightMap::try_from(HeightMapHeader::read(reader)?)?);
        }

        header.texture_descriptors = read_descriptors(reader)?;
        header.alt_texture_descriptors = read_descriptors(reader)?;
        header.total_texture_size = header
            .texture_descriptors
            .iter()
            .chain(header.alt_texture_descriptors.iter())
            .map(|d| d.uncompressed_size as u64)
            .sum();

        let _unknown = reader.read_i32::<LittleEndian>()?;
        for count in self.entry_counts.iter_mut() {
            *count = reader.read_u32::<LittleEndian>()?;
        }

        let palette_count = reader.read_u32::<LittleEndian>()?;
        header.palette_refs = read_ids(reader, palette_count)?;
        header.palette_flags = vec![0u8; palette_count as usize];

        // only the low half of the count is used by the game
        let block_ref_count = reader.read_i32::<LittleEndian>()? as u16;
        header.stream_block_refs = read_ids(reader, block_ref_count as u32)?;

        let fence_count = reader.read_i32::<LittleEndian>()?;
        for _ in 0..fence_count.max(0) {
            let id = CrcId::read(reader)?;
            let children = reader.read_u32::<LittleEndian>()?;
            let adjacent = (0..children)
                .map(|_| reader.read_u32::<LittleEndian>())
                .collect::<std::io::Result<Vec<_>>>()?;
            if header.fence_tree.insert(id, adjacent).is_some() {
                let warning = ValidationWarning::DuplicateFence(id);
                warn!("{}", warning);
                self.warnings.push(warning);
            }
        }

        debug!(
            "extended header: {} + {} textures ({} bytes), {} palettes, {} block refs, {} fences",
            header.texture_descriptors.len(),
            header.alt_texture_descriptors.len(),
            header.total_texture_size,
            header.palette_refs.len(),
            header.stream_block_refs.len(),
            header.fence_tree.len()
        );

        Ok(header)
    }

    /// Load the payload of every entry.
    ///
    /// Must be called with the reader that produced this block through [`ContainerBlock::read_header`].
    #[instrument(skip(self, reader), fields(base = self.header_end), err)]
    pub fn read_payloads<R: Read + Seek>(&mut self, mut reader: R) -> Result<()> {
        let available = reader.seek(SeekFrom::End(0))?;
        let base = (self.start + self.header_end as u64) as i64;

        for category in PROCESSING_ORDER {
            for entry in self.entries[category.index()].iter_mut() {
                let offset = base + entry.relative_offset as i64;
                let wanted = entry.compressed_size.max(0) as u64;

                if offset < 0 || entry.compressed_size < 0 || offset as u64 + wanted > available {
                    return Err(Error::Truncated {
                        offset,
                        wanted,
                        available,
                    });
                }

                reader.seek(SeekFrom::Start(offset as u64))?;
                let mut payload = vec![0u8; wanted as usize];
                reader.read_exact(&mut payload)?;
                entry.payload = payload;
            }
        }

        Ok(())
    }

    /// Flags the block was read with
    pub fn flags(&self) -> u32 {
        self.flags
    }

    /// Offset of the payload region, relative to the start of the block
    pub fn header_end(&self) -> u32 {
        self.header_end
    }

    /// The extended header
    pub fn header(&self) -> &ExtendedHeader {
        &self.header
    }

    /// Number of entries of a category
    pub fn entry_counts(&self) -> &[u32; CATEGORY_COUNT] {
        &self.entry_counts
    }

    /// Total number of entries
    pub fn entry_count(&self) -> usize {
        self.entries.iter().map(Vec::len).sum()
    }

    /// Whether the block holds no entries
    pub fn is_empty(&self) -> bool {
        self.entry_count() == 0
    }

    /// Entries of a category
    pub fn entries(&self, category: Category) -> &[Entry] {
        &self.entries[category.index()]
    }

    /// Every entry, walked in [`PROCESSING_ORDER`]
    pub fn entries_in_order(&self) -> impl Iterator<Item = (Category, &Entry)> {
        PROCESSING_ORDER.into_iter().flat_map(move |category| {
            self.entries[category.index()]
                .iter()
                .map(move |entry| (category, entry))
        })
    }

    /// Anomalies found while parsing
    pub fn warnings(&self) -> &[ValidationWarning] {
        &self.warnings
    }

    /// Set the placement recorded for this block by its map
    pub fn set_bounds(&mut self, bounds: Bounds) {
        if let ExtendedHeader::Present(header) = &mut self.header {
            header.bounds = bounds;
        }
    }
}

fn read_descriptors<R: Read + Seek>(reader: &mut R) -> Result<Vec<TextureDescriptor>> {
    let count = reader.read_u32::<LittleEndian>()?;
    (0..count)
        .map(|_| TextureDescriptor::read(reader).map_err(Error::from))
        .collect()
}

fn read_ids<R: Read + Seek>(reader: &mut R, count: u32) -> Result<Vec<CrcId>> {
    (0..count)
        .map(|_| CrcId::read(reader).map_err(Error::from))
        .collect()
}

#[cfg(test)]
mod test {
    use std::io::Cursor;

    use pretty_assertions::assert_eq;

    use crate::{
        block::{has_height_map, ContainerBlock, ExtendedHeader},
        category::Category,
        crc::CrcId,
        error::{Error, Result, ValidationWarning},
    };

    #[rustfmt::skip]
    fn extended_header_without_entries() -> Vec<u8> {
        vec![
            0x00, 0x00, 0x00, 0x00, // Textures
            0x00, 0x00, 0x00, 0x00, // Alt textures
            0x00, 0x00, 0x00, 0x00, // Unknown
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, // Entry counts
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
            0x00, 0x00, 0x00, 0x00,
            0x00, 0x00, 0x00, 0x00, // Palettes
            0x00, 0x00, 0x00, 0x00, // Block refs
            0x00, 0x00, 0x00, 0x00, // Fences
        ]
    }

    #[test]
    fn height_map_flags() {
        assert!(has_height_map(0x400));
        assert!(has_height_map(0x401));
        assert!(!has_height_map(0x800));
        assert!(!has_height_map(0xC00));
        assert!(!has_height_map(0));
    }

    #[test]
    fn read_invalid_magic() {
        let input = [b'S', b'B', b'L', b'A', 0x00, 0x00, 0x00, 0x00];
        let block = ContainerBlock::read(Cursor::new(input));
        assert!(matches!(block, Err(Error::BadMagic { .. })));
    }

    #[test]
    fn read_block_without_header() -> Result<()> {
        let input = [b'A', b'L', b'B', b'S', 0x00, 0x00, 0x00, 0x00];

        let block = ContainerBlock::read(Cursor::new(input))?;
        assert_eq!(block.header(), &ExtendedHeader::Absent);
        assert_eq!(block.header_end(), 8);
        assert!(block.is_empty());
        assert!(block.warnings().is_empty());
        assert_eq!(block.header().height_scale(), 1.0);

        Ok(())
    }

    #[test]
    fn read_block_with_empty_header() -> Result<()> {
        let header = extended_header_without_entries();
        let mut input = vec![b'A', b'L', b'B', b'S'];
        input.extend((header.len() as u32).to_le_bytes());
        input.extend(header);

        let block = ContainerBlock::read(Cursor::new(&input))?;
        assert_eq!(block.header_end() as usize, input.len());
        assert!(block.is_empty());
        assert!(block.warnings().is_empty());

        let header = block.header().as_present().expect("extended header");
        assert_eq!(header.height_map, None);
        assert!(header.fence_tree.is_empty());

        Ok(())
    }

    #[test]
    fn read_block_with_single_entry() -> Result<()> {
        #[rustfmt::skip]
        let input = vec![
            b'A', b'L', b'B', b'S',
            0x44, 0x00, 0x00, 0x00, // Header length (68)
            // Textures: one descriptor
            0x01, 0x00, 0x00, 0x00, 0xAA, 0x00, 0x00, 0x00, 0x00, 0x10, 0x00, 0x00,
            0x00, 0x00, 0x00, 0x00, // Alt textures
            0x00, 0x00, 0x00, 0x00, // Unknown
            0x00, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, // Entry counts: one texture
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
            0x00, 0x00, 0x00, 0x00,
            0x00, 0x00, 0x00, 0x00, // Palettes
            0x00, 0x00, 0x00, 0x00, // Block refs
            0x00, 0x00, 0x00, 0x00, // Fences
            // Entry header (24)
            0xAA, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x03, 0x00, 0x00, 0x00,
            0x00, 0x10, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0xBB, 0x00, 0x00, 0x00,
            // Payload
            0x01, 0x02, 0x03,
        ];

        let block = ContainerBlock::read(Cursor::new(&input))?;
        assert_eq!(block.header_end(), 8 + 68 + 24);
        assert!(block.warnings().is_empty());

        let textures = block.entries(Category::Texture);
        assert_eq!(textures.len(), 1);
        assert_eq!(textures[0].id, CrcId(0xAA));
        assert_eq!(textures[0].secondary_id, CrcId(0xBB));
        assert_eq!(textures[0].uncompressed_size, 0x1000);
        assert_eq!(textures[0].payload, vec![0x01, 0x02, 0x03]);

        let header = block.header().as_present().expect("extended header");
        assert_eq!(header.total_texture_size, 0x1000);

        Ok(())
    }

    #[test]
    fn read_header_leaves_payloads_empty() -> Result<()> {
        #[rustfmt::skip]
        let input = vec![
            b'A', b'L', b'B', b'S',
            0x3C, 0x00, 0x00, 0x00,
            0x00, 0x00, 0x00, 0x00,
            0x00, 0x00, 0x00, 0x00,
            0x00, 0x00, 0x00, 0x00,
            0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, // One mesh
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
            0x00, 0x00, 0x00, 0x00,
            0x00, 0x00, 0x00, 0x00,
            0x00, 0x00, 0x00, 0x00,
            0x00, 0x00, 0x00, 0x00,
            0x07, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x02, 0x00, 0x00, 0x00,
            0x02, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
            0xCA, 0xFE,
        ];

        let mut cursor = Cursor::new(&input);
        let mut block = ContainerBlock::read_header(&mut cursor, 0)?;
        assert_eq!(block.header_end(), 8 + 60 + 24);
        assert!(block.entries(Category::Mesh)[0].payload.is_empty());

        block.read_payloads(&mut cursor)?;
        assert_eq!(block.entries(Category::Mesh)[0].payload, vec![0xCA, 0xFE]);

        Ok(())
    }

    #[test]
    fn read_payload_out_of_bounds() {
        #[rustfmt::skip]
        let input = vec![
            b'A', b'L', b'B', b'S',
            0x3C, 0x00, 0x00, 0x00,
            0x00, 0x00, 0x00, 0x00,
            0x00, 0x00, 0x00, 0x00,
            0x00, 0x00, 0x00, 0x00,
            0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
            0x00, 0x00, 0x00, 0x00,
            0x00, 0x00, 0x00, 0x00,
            0x00, 0x00, 0x00, 0x00,
            0x00, 0x00, 0x00, 0x00,
            // Payload claims 16 bytes at offset 1
            0x07, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x10, 0x00, 0x00, 0x00,
            0x10, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
            0xCA, 0xFE,
        ];

        let block = ContainerBlock::read(Cursor::new(&input));
        assert!(matches!(
            block,
            Err(Error::Truncated {
                offset: 93,
                wanted: 16,
                available: 94
            })
        ));
    }

    #[test]
    fn read_height_map_with_bad_magic() {
        let mut input = vec![b'A', b'L', b'B', b'S', 0x50, 0x00, 0x00, 0x00];
        input.extend(b"HEI1");
        input.extend([0u8; 16]);
        input.extend(extended_header_without_entries());

        let block = ContainerBlock::read_with_flags(Cursor::new(&input), 0x400);
        assert!(matches!(block, Err(Error::BadMagic { ref expected, offset: 8, .. }) if expected == "HEI1"));
    }

    #[test]
    fn read_height_map() -> Result<()> {
        let mut input = vec![b'A', b'L', b'B', b'S', 0x50, 0x00, 0x00, 0x00];
        input.extend(b"1IEH");
        input.extend(4u32.to_le_bytes());
        input.extend(2u32.to_le_bytes());
        input.extend(265.0f32.to_le_bytes());
        input.extend(10.0f32.to_le_bytes());
        input.extend(extended_header_without_entries());

        let block = ContainerBlock::read_with_flags(Cursor::new(&input), 0x400)?;
        assert!(block.warnings().is_empty());

        let height_map = block
            .header()
            .as_present()
            .and_then(|h| h.height_map.as_ref())
            .expect("height map");
        assert_eq!(height_map.count_x, 4);
        assert_eq!(height_map.count_z, 2);
        assert_eq!(height_map.scale, 1.0);
        assert_eq!(height_map.samples, vec![0u8; 8]);

        Ok(())
    }

    #[test]
    fn height_map_ignored_without_flags() -> Result<()> {
        let header = extended_header_without_entries();
        let mut input = vec![b'A', b'L', b'B', b'S'];
        input.extend((header.len() as u32).to_le_bytes());
        input.extend(header);

        let block = ContainerBlock::read_with_flags(Cursor::new(&input), 0x800)?;
        assert_eq!(block.header().as_present().and_then(|h| h.height_map.as_ref()), None);

        Ok(())
    }

    #[test]
    fn read_auxiliary_tables() -> Result<()> {
        #[rustfmt::skip]
        let input = vec![
            b'A', b'L', b'B', b'S',
            0x64, 0x00, 0x00, 0x00, // Header length (100)
            0x00, 0x00, 0x00, 0x00, // Textures
            // Alt textures: two descriptors
            0x02, 0x00, 0x00, 0x00,
            0x01, 0x00, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00,
            0x02, 0x00, 0x00, 0x00, 0x00, 0x02, 0x00, 0x00,
            0x00, 0x00, 0x00, 0x00, // Unknown
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
            0x00, 0x00, 0x00, 0x00,
            // Palettes: one
            0x01, 0x00, 0x00, 0x00, 0x50, 0x00, 0x00, 0x00,
            // Block refs: count with high bits set, one ref
            0x01, 0x00, 0x01, 0x00, 0x60, 0x00, 0x00, 0x00,
            // Fences: one region with two neighbours
            0x01, 0x00, 0x00, 0x00,
            0x70, 0x00, 0x00, 0x00, 0x02, 0x00, 0x00, 0x00,
            0x03, 0x00, 0x00, 0x00, 0x04, 0x00, 0x00, 0x00,
        ];

        let block = ContainerBlock::read(Cursor::new(&input))?;
        assert!(block.warnings().is_empty());
        assert_eq!(block.header_end() as usize, input.len());

        let header = block.header().as_present().expect("extended header");
        assert!(header.texture_descriptors.is_empty());
        assert_eq!(header.alt_texture_descriptors.len(), 2);
        assert_eq!(header.total_texture_size, 0x300);
        assert_eq!(header.palette_refs, vec![CrcId(0x50)]);
        assert_eq!(header.palette_flags, vec![0]);
        assert_eq!(header.stream_block_refs, vec![CrcId(0x60)]);
        assert_eq!(header.fence_tree.get(&CrcId(0x70)), Some(&vec![3, 4]));

        Ok(())
    }

    #[test]
    fn header_length_mismatch_is_reported() -> Result<()> {
        let header = extended_header_without_entries();
        let mut input = vec![b'A', b'L', b'B', b'S'];
        input.extend((header.len() as u32 + 4).to_le_bytes());
        input.extend(header);
        input.extend([0u8; 4]);

        let block = ContainerBlock::read(Cursor::new(&input))?;
        assert_eq!(
            block.warnings(),
            &[ValidationWarning::HeaderLengthMismatch {
                expected: 72,
                actual: 68
            }]
        );

        Ok(())
    }

    fn block_with_header(header: Vec<u8>) -> Vec<u8> {
        let mut input = vec![b'A', b'L', b'B', b'S'];
        input.extend((header.len() as u32).to_le_bytes());
        input.extend(header);
        input
    }

    fn height_map_block(count_x: u32, count_z: u32) -> Vec<u8> {
        let mut header = b"1IEH".to_vec();
        header.extend(count_x.to_le_bytes());
        header.extend(count_z.to_le_bytes());
        header.extend(265.0f32.to_le_bytes());
        header.extend(10.0f32.to_le_bytes());
        header.extend(extended_header_without_entries());
        block_with_header(header)
    }

    #[test]
    fn height_map_too_large() {
        let input = height_map_block(0xFFFF_FFFF, 0xFFFF_FFFF);
        let block = ContainerBlock::read_with_flags(Cursor::new(&input), 0x400);
        assert!(matches!(
            block,
            Err(Error::InvalidHeightMap {
                count_x: 0xFFFF_FFFF,
                count_z: 0xFFFF_FFFF
            })
        ));

        let input = height_map_block(0x1_0000, 0x1_0000);
        let block = ContainerBlock::read_with_flags(Cursor::new(&input), 0x400);
        assert!(matches!(block, Err(Error::InvalidHeightMap { .. })));
    }

    #[test]
    fn header_length_beyond_stream() {
        let input = [b'A', b'L', b'B', b'S', 0xFF, 0xFF, 0xFF, 0xFF];
        let block = ContainerBlock::read(Cursor::new(input));
        assert!(matches!(
            block,
            Err(Error::Truncated {
                offset: 8,
                wanted: 0xFFFF_FFFF,
                available: 8
            })
        ));
    }

    #[test]
    fn entry_count_beyond_stream() {
        let mut header = extended_header_without_entries();
        header[12..16].copy_from_slice(&[0xFF; 4]);

        let block = ContainerBlock::read(Cursor::new(block_with_header(header)));
        assert!(matches!(
            block,
            Err(Error::Truncated {
                offset: 68,
                wanted: 0x17_FFFF_FFE8,
                available: 68
            })
        ));
    }

    #[test]
    fn table_counts_beyond_stream() {
        // Textures, alt textures, palettes
        for start in [0, 4, 48] {
            let mut header = extended_header_without_entries();
            header[start..start + 4].copy_from_slice(&[0xFF; 4]);

            let block = ContainerBlock::read(Cursor::new(block_with_header(header)));
            assert!(block.is_err(), "count at {start} was accepted");
        }
    }

    #[test]
    fn fence_children_beyond_stream() {
        let mut header = extended_header_without_entries();
        header.truncate(56);
        header.extend(1u32.to_le_bytes());
        header.extend(0x70u32.to_le_bytes());
        header.extend(0xFFFF_FFFFu32.to_le_bytes());

        let block = ContainerBlock::read(Cursor::new(block_with_header(header)));
        assert!(block.is_err());
    }

    #[test]
    fn duplicate_fence_is_reported() -> Result<()> {
        let mut header = extended_header_without_entries();
        header.truncate(56);
        header.extend(2u32.to_le_bytes());
        header.extend(0x70u32.to_le_bytes());
        header.extend(1u32.to_le_bytes());
        header.extend(3u32.to_le_bytes());
        header.extend(0x70u32.to_le_bytes());
        header.extend(1u32.to_le_bytes());
        header.extend(4u32.to_le_bytes());

        let block = ContainerBlock::read(Cursor::new(block_with_header(header)))?;
        assert_eq!(block.warnings(), &[ValidationWarning::DuplicateFence(CrcId(0x70))]);

        let header = block.header().as_present().expect("extended header");
        assert_eq!(header.fence_tree.get(&CrcId(0x70)), Some(&vec![4]));

        Ok(())
    }
}
