//! Error types that can be emitted from this library

use miette::Diagnostic;
use thiserror::Error;

use crate::crc::CrcId;

/// Error type for library
#[derive(Error, Diagnostic, Debug)]
pub enum Error {
    /// Transparent warpper for [`std::io::Error`]
    #[error(transparent)]
    IOError(#[from] std::io::Error),

    /// Transparent warpper for [`binrw::Error`]
    #[error(transparent)]
    BinRWError(#[from] binrw::Error),

    /// the stream is not the expected format or is misaligned
    #[error("expected magic {expected:?} at offset {offset:#x}, found {found:?}")]
    #[diagnostic(help("the stream is not the expected format or is misaligned"))]
    BadMagic {
        /// The magic in its readable (not reversed) form
        expected: String,
        /// The bytes found in the stream, reversed back into readable order
        found: String,
        /// Stream position of the magic
        offset: u64,
    },

    /// a read would exceed the bounds of the stream
    #[error("reading {wanted} bytes at offset {offset} exceeds the {available} bytes available")]
    #[diagnostic(help("the archive is corrupt or incompletely downloaded"))]
    Truncated {
        /// Requested start of the read
        offset: i64,
        /// Number of bytes requested
        wanted: u64,
        /// Length of the stream
        available: u64,
    },

    /// height map dimensions beyond any stream block
    #[error("height map of {count_x}x{count_z} samples is out of range")]
    #[diagnostic(help("the block flags do not match the block or the block is corrupt"))]
    InvalidHeightMap {
        #[allow(missing_docs)]
        count_x: u32,
        #[allow(missing_docs)]
        count_z: u32,
    },

    /// unable to find requested entry
    #[error("unable to find entry {0}")]
    EntryNotFound(CrcId),

    /// {0}
    #[error("{0}")]
    CustomError(String),
}

/// Anomalies which do not prevent parsing but indicate a damaged or unusual file.
#[derive(Error, Diagnostic, Debug, Clone, PartialEq, Eq)]
pub enum ValidationWarning {
    /// An index record reused an id, the later record replaced the earlier one
    #[error("index holds more than one record for {0}")]
    DuplicateEntry(CrcId),

    /// The cross check table names an id with no index record
    #[error("{id} => {secondary_id} is not a valid file entry")]
    UnknownCrossCheckEntry {
        /// Id named by the cross check pair
        id: CrcId,
        /// Secondary id named by the cross check pair
        secondary_id: CrcId,
    },

    /// The cross check table disagrees with the index record
    #[error("{id} has secondary id {expected} in the index but {found} in the cross check table")]
    CrossCheckMismatch {
        /// Id of the index record
        id: CrcId,
        /// Secondary id stored in the index record
        expected: CrcId,
        /// Secondary id stored in the cross check table
        found: CrcId,
    },

    /// A fence region was listed twice, the later neighbour list replaced the earlier one
    #[error("fence tree holds more than one region {0}")]
    DuplicateFence(CrcId),

    /// The extended header of a block did not end where its length prefix said
    #[error("extended header should end at offset {expected} but ended at {actual}")]
    HeaderLengthMismatch {
        /// Offset derived from the length prefix
        expected: u64,
        /// Offset the reader reached
        actual: u64,
    },
}

/// Generic result type with crate's Error as its error variant
pub type Result<T> = core::result::Result<T, Error>;
