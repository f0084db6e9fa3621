//! Entry categories of a stream block and the order they are stored in.

use derive_more::derive::Display;

/// The kind of asset stored by a stream block entry
///
/// The discriminant is the slot of the category in [`crate::ContainerBlock`]'s entry tables.
#[derive(Debug, Display, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u32)]
pub enum Category {
    /// Mesh geometry
    Mesh = 0,
    /// Texture data, exported through a [`crate::TextureExporter`]
    Texture = 1,
    /// Physics shapes
    Physics = 2,
    /// Navigation path graph
    PathGraph = 3,
    /// AI fence regions
    AiFence = 4,
    /// Entries of unknown purpose
    Unknown = 5,
    /// Sound banks
    SoundBank = 6,
    /// Flash movies used by the interface
    FlashMovie = 7,
    /// WSD scripts
    Wsd = 8,
}

/// Number of entry categories in a stream block
pub const CATEGORY_COUNT: usize = 9;

/// The order in which entry headers and payloads are laid out in a stream block
///
/// This is not the numeric order of the categories. Anything that walks the entries of a block
/// must go through this table.
pub const PROCESSING_ORDER: [Category; CATEGORY_COUNT] = [
    Category::SoundBank,
    Category::FlashMovie,
    Category::Mesh,
    Category::Physics,
    Category::Wsd,
    Category::AiFence,
    Category::PathGraph,
    Category::Texture,
    Category::Unknown,
];

impl Category {
    /// All categories in numeric order
    pub const ALL: [Category; CATEGORY_COUNT] = [
        Category::Mesh,
        Category::Texture,
        Category::Physics,
        Category::PathGraph,
        Category::AiFence,
        Category::Unknown,
        Category::SoundBank,
        Category::FlashMovie,
        Category::Wsd,
    ];

    /// Slot of this category in the entry tables
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Category stored in slot `index`
    pub fn from_index(index: usize) -> Option<Category> {
        Self::ALL.get(index).copied()
    }

    /// File extension used when the entry is written out as is
    pub const fn extension(self) -> &'static str {
        match self {
            Category::Mesh => "mesh",
            Category::Texture => "texture",
            Category::Physics => "physics",
            Category::PathGraph => "pathgraph",
            Category::AiFence => "aifence",
            Category::Unknown => "unknown",
            Category::SoundBank => "soundbank",
            Category::FlashMovie => "flashmovie",
            Category::Wsd => "wsd",
        }
    }

    /// Label used in the export notice
    pub const fn label(self) -> &'static str {
        match self {
            Category::Mesh => "MESH",
            Category::Texture => "TEXTURE",
            Category::Physics => "PHYSICS",
            Category::PathGraph => "PATHGRAPH",
            Category::AiFence => "AIFENCE",
            Category::Unknown => "UNK",
            Category::SoundBank => "SOUNDBANK",
            Category::FlashMovie => "FLASHMOVIE",
            Category::Wsd => "WSD",
        }
    }

    /// Whether exporting an entry of this category is announced
    pub const fn emits_notice(self) -> bool {
        !matches!(self, Category::Mesh | Category::Texture | Category::Physics)
    }

    /// Hash of the loader the game uses for this category
    pub const fn read_method(self) -> ReadMethod {
        match self {
            Category::Mesh => ReadMethod::Mesh,
            Category::Texture => ReadMethod::Texture,
            Category::Physics => ReadMethod::Physics,
            Category::PathGraph => ReadMethod::PathGraph,
            Category::AiFence => ReadMethod::AiFence,
            Category::Unknown => ReadMethod::Unknown,
            Category::SoundBank => ReadMethod::SoundBank,
            Category::FlashMovie => ReadMethod::FlashMovie,
            Category::Wsd => ReadMethod::Wsd,
        }
    }
}

/// Loader ids the game keys its streaming callbacks by
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum ReadMethod {
    #[allow(missing_docs)]
    Mesh = 0xFE5E3A56,
    #[allow(missing_docs)]
    Texture = 0xA40D777D,
    #[allow(missing_docs)]
    Physics = 0x4445EA18,
    #[allow(missing_docs)]
    PathGraph = 0xE1087B27,
    #[allow(missing_docs)]
    AiFence = 0xD3098461,
    #[allow(missing_docs)]
    SoundBank = 0xDD62BA1A,
    #[allow(missing_docs)]
    FlashMovie = 0xB5D2FE96,
    #[allow(missing_docs)]
    Wsd = 0x9AB5A351,
    #[allow(missing_docs)]
    Unknown = 0x00000001,
    /// Stream block still being loaded
    BlockPending = 0x00000002,
    /// Stream block fully loaded
    BlockFinished = 0x00000003,
}

impl ReadMethod {
    /// Look up a loader by its hash
    pub fn from_u32(value: u32) -> Option<ReadMethod> {
        Some(match value {
            0xFE5E3A56 => ReadMethod::Mesh,
            0xA40D777D => ReadMethod::Texture,
            0x4445EA18 => ReadMethod::Physics,
            0xE1087B27 => ReadMethod::PathGraph,
            0xD3098461 => ReadMethod::AiFence,
            0xDD62BA1A => ReadMethod::SoundBank,
            0xB5D2FE96 => ReadMethod::FlashMovie,
            0x9AB5A351 => ReadMethod::Wsd,
            0x00000001 => ReadMethod::Unknown,
            0x00000002 => ReadMethod::BlockPending,
            0x00000003 => ReadMethod::BlockFinished,
            _ => return None,
        })
    }
}
