//! Explicit loader registry mapping file extensions to scan parsers.
//!
//! The registry is built once at startup and injected where files are
//! opened; an unregistered extension is reported as a capability
//! absence, never a crash. Optional formats are added by registering
//! another loader function.

use std::collections::HashMap;
use std::path::Path;

use crate::api::scan::ScanFile;
use crate::error::ScanError;
use crate::parsing::dat_file::DatFile;
use crate::parsing::ras_file::RasFile;

/// Opens one scan format: `(path, channel_definition_path)`.
pub type LoaderFn = fn(&str, Option<&str>) -> Result<ScanFile, ScanError>;

pub struct LoaderRegistry {
    loaders: HashMap<String, LoaderFn>,
}

impl LoaderRegistry {
    /// An empty registry with no formats registered.
    pub fn new() -> Self {
        Self {
            loaders: HashMap::new(),
        }
    }

    /// The builtin registry: `ras` and `dat`.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register("ras", load_ras);
        registry.register("dat", load_dat);
        registry
    }

    /// Registers `loader` for `extension`, matched case-insensitively.
    /// A later registration for the same extension replaces the earlier
    /// one.
    pub fn register(&mut self, extension: &str, loader: LoaderFn) {
        self.loaders.insert(extension.to_ascii_lowercase(), loader);
    }

    /// Extensions with a registered loader, sorted.
    pub fn known_extensions(&self) -> Vec<&str> {
        let mut extensions: Vec<&str> = self.loaders.keys().map(String::as_str).collect();
        extensions.sort_unstable();
        extensions
    }

    /// Opens `path` with the loader registered for its extension.
    pub fn open(&self, path: &str, channel_file: Option<&str>) -> Result<ScanFile, ScanError> {
        let extension = Path::new(path)
            .extension()
            .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
            .unwrap_or_default();
        let Some(loader) = self.loaders.get(&extension) else {
            return Err(ScanError::UnknownExtension {
                extension,
                known: self.known_extensions().join(", "),
            });
        };
        loader(path, channel_file)
    }
}

impl Default for LoaderRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn load_ras(path: &str, channel_file: Option<&str>) -> Result<ScanFile, ScanError> {
    let mut scan = ScanFile::from_ras(RasFile::parse_from_file(path)?);
    if let Some(channel_path) = channel_file {
        scan.apply_channel_file(channel_path)?;
    }
    Ok(scan)
}

fn load_dat(path: &str, channel_file: Option<&str>) -> Result<ScanFile, ScanError> {
    let mut scan = ScanFile::from_dat(DatFile::parse_from_file(path)?);
    if let Some(channel_path) = channel_file {
        scan.apply_channel_file(channel_path)?;
    }
    Ok(scan)
}
