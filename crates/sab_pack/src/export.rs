//! Writing stream block entries to disk.

use bon::Builder;
use std::{
    fs::{self, File},
    io::Write,
    path::{Component, Path, PathBuf},
};
use tracing::{info, instrument, warn};

use crate::{
    block::ContainerBlock,
    category::Category,
    crc::{CrcId, NameLookup},
    error::{Error, Result},
    types::Entry,
};

/// A texture decoded from an entry payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedTexture {
    /// Content id of the texture entry
    pub id: CrcId,
    /// Extension of the file the texture is written to
    pub extension: String,
    /// Bytes of the file the texture is written to
    pub data: Vec<u8>,
}

/// The decode step for texture entries
///
/// Textures are the only category that goes through a decoder before being written.
pub trait TextureExporter {
    /// Decode the payload of a texture entry
    fn decode(&self, entry: &Entry) -> Result<DecodedTexture>;

    /// Write a decoded texture into `output_dir`, returning the written path
    ///
    /// With `options.overwrite` unset an existing file must be reported as an error.
    fn write(
        &self,
        texture: &DecodedTexture,
        output_dir: &Path,
        names: &dyn NameLookup,
        options: &ExportOptions,
    ) -> Result<PathBuf>;
}

impl<T: TextureExporter + ?Sized> TextureExporter for &T {
    fn decode(&self, entry: &Entry) -> Result<DecodedTexture> {
        (**self).decode(entry)
    }

    fn write(
        &self,
        texture: &DecodedTexture,
        output_dir: &Path,
        names: &dyn NameLookup,
        options: &ExportOptions,
    ) -> Result<PathBuf> {
        (**self).write(texture, output_dir, names, options)
    }
}

/// Writes texture payloads as they are stored
#[derive(Debug, Default, Copy, Clone)]
pub struct RawTextureExporter;

impl TextureExporter for RawTextureExporter {
    fn decode(&self, entry: &Entry) -> Result<DecodedTexture> {
        Ok(DecodedTexture {
            id: entry.id,
            extension: Category::Texture.extension().to_owned(),
            data: entry.payload.clone(),
        })
    }

    fn write(
        &self,
        texture: &DecodedTexture,
        output_dir: &Path,
        names: &dyn NameLookup,
        options: &ExportOptions,
    ) -> Result<PathBuf> {
        let path = output_dir.join(file_name(texture.id, &texture.extension, names));
        write_file(&path, &texture.data, options.overwrite)?;
        Ok(path)
    }
}

/// Options for how entries should be exported
#[derive(Debug, Clone, Builder)]
pub struct ExportOptions {
    /// Replace files that already exist
    #[builder(default = true)]
    pub overwrite: bool,

    /// Only export these categories, every category when empty
    #[builder(default)]
    pub categories: Vec<Category>,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl ExportOptions {
    fn includes(&self, category: Category) -> bool {
        self.categories.is_empty() || self.categories.contains(&category)
    }
}

/// An entry that could not be exported
#[derive(Debug)]
pub struct ExportFailure {
    #[allow(missing_docs)]
    pub id: CrcId,
    #[allow(missing_docs)]
    pub category: Category,
    #[allow(missing_docs)]
    pub error: Error,
}

/// Outcome of exporting a block
#[derive(Debug, Default)]
pub struct ExportReport {
    /// Files written, in export order
    pub written: Vec<PathBuf>,
    /// Entries that failed, in export order
    pub failures: Vec<ExportFailure>,
}

impl ExportReport {
    /// Whether every entry was exported
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Routes stream block entries to the exporter of their category
///
/// ```no_run
/// use sab_pack::{ContainerBlock, ExportDispatcher, NameTable};
///
/// fn unpack(block: &ContainerBlock, names: &NameTable) -> sab_pack::error::Result<()> {
///     let report = ExportDispatcher::new(names).export(block, "out")?;
///     for failure in report.failures {
///         eprintln!("{}: {}", failure.id, failure.error);
///     }
///     Ok(())
/// }
/// ```
pub struct ExportDispatcher<'a> {
    names: Box<dyn NameLookup + 'a>,
    textures: Box<dyn TextureExporter + 'a>,
    options: ExportOptions,
}

impl<'a> ExportDispatcher<'a> {
    /// Create a dispatcher writing textures with [`RawTextureExporter`]
    pub fn new(names: impl NameLookup + 'a) -> Self {
        Self {
            names: Box::new(names),
            textures: Box::new(RawTextureExporter),
            options: ExportOptions::default(),
        }
    }

    /// Use `exporter` for texture entries
    pub fn with_texture_exporter(mut self, exporter: impl TextureExporter + 'a) -> Self {
        self.textures = Box::new(exporter);
        self
    }

    /// Use `options` for this dispatcher
    pub fn with_options(mut self, options: ExportOptions) -> Self {
        self.options = options;
        self
    }

    /// Export every entry of `block` into `output_dir`
    ///
    /// A failing entry does not stop the export, it is logged and recorded in the report.
    #[instrument(skip_all, fields(dir = %output_dir.as_ref().display(), entries = block.entry_count()), err)]
    pub fn export(&self, block: &ContainerBlock, output_dir: impl AsRef<Path>) -> Result<ExportReport> {
        let output_dir = output_dir.as_ref();
        fs::create_dir_all(output_dir)?;

        let mut report = ExportReport::default();
        for (category, entry) in block.entries_in_order() {
            if !self.options.includes(category) {
                continue;
            }

            match self.export_entry(category, entry, output_dir) {
                Ok(path) => report.written.push(path),
                Err(error) => {
                    warn!("unable to export {} {}: {}", category, entry.id, error);
                    report.failures.push(ExportFailure {
                        id: entry.id,
                        category,
                        error,
                    });
                }
            }
        }

        Ok(report)
    }

    /// Export a single entry of `category`
    pub fn export_entry(
        &self,
        category: Category,
        entry: &Entry,
        output_dir: &Path,
    ) -> Result<PathBuf> {
        if category == Category::Texture {
            let texture = self.textures.decode(entry)?;
            return self
                .textures
                .write(&texture, output_dir, self.names.as_ref(), &self.options);
        }

        let name = file_name(entry.id, category.extension(), self.names.as_ref());
        if category.emits_notice() {
            info!("{}! {}", category.label(), name);
        }

        let path = output_dir.join(name);
        write_file(&path, &entry.payload, self.options.overwrite)?;
        Ok(path)
    }
}

/// Name of the file an entry is written to
///
/// Uses the resolved name of the id when one is known, `0x{id:08X}` otherwise. Parentheses are
/// removed from the result and backslashes in resolved names become directory separators.
/// Only plain components are kept, so the name never leaves the directory it is joined to.
pub fn file_name(id: CrcId, extension: &str, names: &dyn NameLookup) -> String {
    let name = id.to_display_name(names);
    let name = if name.trim().is_empty() {
        format!("{}.{}", id, extension)
    } else {
        format!("{}.{}", name, extension)
    };
    let name = name.replace(['(', ')'], "").replace('\\', "/");

    Path::new(&name)
        .components()
        .filter_map(|component| match component {
            Component::Normal(part) => part.to_str(),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Write `data` to `path`, creating missing parent directories
pub fn write_file(path: &Path, data: &[u8], overwrite: bool) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let mut out = if overwrite {
        File::create(path)?
    } else {
        File::create_new(path)?
    };
    out.write_all(data)?;

    Ok(())
}
