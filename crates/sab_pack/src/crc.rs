//! Content ids and the reverse lookup of their names.

use std::{
    collections::HashMap,
    io::BufRead,
};

use binrw::{BinRead, BinWrite};
use derive_more::derive::{Deref, Display, From, Into};
use tracing::warn;

use crate::error::Result;

/// An opaque 32-bit content id
///
/// The game only stores the hashes of asset names. A name can be recovered on a best effort basis
/// through a [`NameLookup`].
#[derive(
    BinRead, BinWrite, Debug, Display, From, Into, Default, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash,
)]
#[brw(little)]
#[display("0x{_0:08X}")]
pub struct CrcId(pub u32);

impl CrcId {
    /// Raw value of the id
    pub const fn value(self) -> u32 {
        self.0
    }

    /// Resolve the name of this id, or an empty string if it is unknown
    pub fn to_display_name(self, names: &dyn NameLookup) -> String {
        names.lookup(self).map(str::to_owned).unwrap_or_default()
    }
}

/// Read-only reverse lookup from content ids to names
pub trait NameLookup {
    /// Name for `id`, if it is known
    fn lookup(&self, id: CrcId) -> Option<&str>;
}

impl<T: NameLookup + ?Sized> NameLookup for &T {
    fn lookup(&self, id: CrcId) -> Option<&str> {
        (**self).lookup(id)
    }
}

/// A lookup that knows no names
#[derive(Debug, Default, Copy, Clone)]
pub struct NoNames;

impl NameLookup for NoNames {
    fn lookup(&self, _id: CrcId) -> Option<&str> {
        None
    }
}

/// In-memory table of known names
///
/// ```
/// use sab_pack::{CrcId, NameLookup, NameTable};
///
/// let listing = "# known textures\n0x0000BEEF dirt_road\n";
/// let names = NameTable::from_reader(listing.as_bytes()).unwrap();
///
/// assert_eq!(names.lookup(CrcId(0xBEEF)), Some("dirt_road"));
/// ```
#[derive(Debug, Default, Clone, PartialEq, Eq, Deref)]
pub struct NameTable(HashMap<CrcId, String>);

impl NameTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace the name of an id
    pub fn insert(&mut self, id: CrcId, name: impl Into<String>) -> Option<String> {
        self.0.insert(id, name.into())
    }

    /// Load a listing with one `<hex id> <name>` pair per line
    ///
    /// Blank lines and lines starting with `#` are ignored, malformed lines are skipped.
    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self> {
        let mut table = Self::new();

        for (number, line) in reader.lines().enumerate() {
            let line = line?;
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let Some((id, name)) = line.split_once(char::is_whitespace) else {
                warn!("skipping line {}: missing name", number + 1);
                continue;
            };

            let digits = id
                .strip_prefix("0x")
                .or_else(|| id.strip_prefix("0X"))
                .unwrap_or(id);
            match u32::from_str_radix(digits, 16) {
                Ok(value) => {
                    table.insert(CrcId(value), name.trim());
                }
                Err(e) => warn!("skipping line {}: {}", number + 1, e),
            }
        }

        Ok(table)
    }
}

impl NameLookup for NameTable {
    fn lookup(&self, id: CrcId) -> Option<&str> {
        self.0.get(&id).map(String::as_str)
    }
}

impl FromIterator<(CrcId, String)> for NameTable {
    fn from_iter<T: IntoIterator<Item = (CrcId, String)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}
