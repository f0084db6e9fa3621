//! This library handles reading megapack indices and stream blocks used by *The Saboteur*.
//!
//! # Megapack Format Documentation
//!
//! Game assets are stored in two levels of containers. A **megapack** starts with an index
//! (`MP00`) that maps content ids to byte ranges of the archive, and every range holds one
//! **stream block** (`SBLA`) which in turn carries the typed payload entries.
//!
//! ## Index Structure
//!
//! | Offset (bytes) | Field                  | Description                                                |
//! |----------------|------------------------|------------------------------------------------------------|
//! | 0x0000         | Magic number           | 4 bytes: "00PM" ("MP00" reversed)                          |
//! | 0x0004         | File Count             | 4 bytes: Number of file records in the index               |
//! | 0x0008         | File Records           | File Count * 20 bytes                                      |
//! | ...            | Cross Check            | File Count * 8 bytes                                       |
//!
//! Each file record has the following structure:
//!
//! | Offset (bytes) | Field                  | Description                                             |
//! |----------------|------------------------|---------------------------------------------------------|
//! | 0x0000         | Id                     | 4 bytes: Content id of the stream block                 |
//! | 0x0004         | Secondary Id           | 4 bytes: Second content id of the stream block          |
//! | 0x0008         | Size                   | 4 bytes: Size of the stream block in the archive        |
//! | 0x000C         | Offset                 | 8 bytes: Absolute offset of the stream block            |
//!
//! The cross check table repeats the `(Id, Secondary Id)` pair of every record. It carries no
//! new information and is only used to detect a corrupted index.
//!
//! ## Stream Block Structure
//!
//! | Offset (bytes) | Field                  | Description                                                |
//! |----------------|------------------------|------------------------------------------------------------|
//! | 0x0000         | Magic number           | 4 bytes: "ALBS" ("SBLA" reversed)                          |
//! | 0x0004         | Header Length          | 4 bytes: Length of the extended header, 0 when absent      |
//! | 0x0008         | Extended Header        | Header Length bytes                                        |
//! | ...            | Entry Headers          | 24 bytes per entry, grouped by category                    |
//! | ...            | Payloads               | Addressed relative to the end of the entry headers         |
//!
//! ### Extended Header
//!
//! - **Height Map**: Only present when the block flags satisfy `flags & 0x1C00 == 0x400`. Starts with
//!   the magic "1IEH" ("HEI1" reversed), then two counts and two floats.
//! - **Texture Descriptors**: Two lists, each a 4-byte count followed by `(id, uncompressed size)` pairs.
//! - **Entry Counts**: A discarded 4-byte value then 9 4-byte counts, one per [`Category`].
//! - **Palette References**: A 4-byte count followed by that many content ids.
//! - **Stream Block References**: A 4-byte count (only the low 16 bits are meaningful) followed by
//!   that many content ids.
//! - **Fence Tree**: A 4-byte count followed by `(id, child count, children...)` adjacency lists.
//!
//! ### Entry Headers and Payloads
//!
//! Entry headers and payloads are not laid out in category order. Both are grouped following
//! [`PROCESSING_ORDER`], which is why the payload base offset can only be known once every entry
//! header has been read.
//!
//! | Offset (bytes) | Field                  | Description                                             |
//! |----------------|------------------------|---------------------------------------------------------|
//! | 0x0000         | Id                     | 4 bytes: Content id of the entry                        |
//! | 0x0004         | Relative Offset        | 4 bytes: Offset from the payload base                   |
//! | 0x0008         | Compressed Size        | 4 bytes: Size of the payload in the block               |
//! | 0x000C         | Uncompressed Size      | 4 bytes: Size of the payload once decompressed          |
//! | 0x0010         | Reserved               | 4 bytes: Unused                                         |
//! | 0x0014         | Secondary Id           | 4 bytes: Second content id of the entry                 |
//!
//! ## Additional Information
//!
//! - **Endianness**: Little-endian for all multi-byte integers
//!

pub mod block;
pub mod category;
pub mod crc;
pub mod error;
pub mod export;
pub mod index;
pub mod types;
pub mod write;

use std::io::{Read, Seek};

pub use block::ContainerBlock;
pub use category::{Category, PROCESSING_ORDER};
pub use crc::{CrcId, NameLookup, NameTable, NoNames};
pub use error::{Error, Result, ValidationWarning};
pub use export::{ExportDispatcher, ExportOptions, ExportReport, TextureExporter};
pub use index::ArchiveIndex;
pub use write::{BlockWriter, IndexWriter};

/// Parse a megapack index, returning it together with any cross check anomalies.
pub fn parse_index<R: Read + Seek>(reader: R) -> Result<(ArchiveIndex, Vec<ValidationWarning>)> {
    ArchiveIndex::read(reader)
}

/// Parse a stream block and load the payload of every entry.
pub fn parse_block<R: Read + Seek>(reader: R) -> Result<ContainerBlock> {
    ContainerBlock::read(reader)
}

/// Export every entry of a block into `output_dir` with the default exporters.
pub fn export_block(
    block: &ContainerBlock,
    output_dir: impl AsRef<std::path::Path>,
) -> Result<ExportReport> {
    ExportDispatcher::new(NoNames).export(block, output_dir)
}
