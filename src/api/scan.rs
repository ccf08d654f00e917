use std::collections::BTreeMap;
use std::fs;

use chrono::NaiveDateTime;

use crate::api::channel::Channel;
use crate::channels::ChannelSelection;
use crate::error::ScanError;
use crate::parsing::dat_file::DatFile;
use crate::parsing::ras_file::{RasFile, TIMESTAMP_FORMAT};
use crate::progress::DecodeProgress;
use crate::registry::LoaderRegistry;

/// Format of an opened scan file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanKind {
    Ras,
    Dat,
}

#[derive(Debug)]
enum Source {
    Ras(RasFile),
    Dat(DatFile),
}

/// High level representation of a scan file of either format.
///
/// The struct owns the parsed file internally and exposes [`Channel`]
/// handles; sample grids stay undecoded until a channel is first
/// accessed, then all channels are decoded in one pass.
#[derive(Debug)]
pub struct ScanFile {
    raw: Source,
}

impl ScanFile {
    /// Open a scan file from disk, picking the parser by file extension
    /// via the builtin [`LoaderRegistry`].
    pub fn from_file(path: &str) -> Result<Self, ScanError> {
        LoaderRegistry::builtin().open(path, None)
    }

    /// Open a scan file and apply a channel-definition file.
    pub fn from_file_with_channels(path: &str, channel_file: &str) -> Result<Self, ScanError> {
        LoaderRegistry::builtin().open(path, Some(channel_file))
    }

    /// Wrap an already-parsed RAS file.
    pub fn from_ras(ras: RasFile) -> Self {
        ScanFile {
            raw: Source::Ras(ras),
        }
    }

    /// Wrap an already-parsed DAT file.
    pub fn from_dat(dat: DatFile) -> Self {
        ScanFile {
            raw: Source::Dat(dat),
        }
    }

    pub fn kind(&self) -> ScanKind {
        match &self.raw {
            Source::Ras(_) => ScanKind::Ras,
            Source::Dat(_) => ScanKind::Dat,
        }
    }

    /// Points per raster (x size).
    pub fn x_size(&self) -> usize {
        match &self.raw {
            Source::Ras(ras) => ras.x_size(),
            Source::Dat(dat) => dat.x_size,
        }
    }

    /// Raster count (y size).
    pub fn y_size(&self) -> usize {
        match &self.raw {
            Source::Ras(ras) => ras.y_size(),
            Source::Dat(dat) => dat.y_size,
        }
    }

    pub fn channel_count(&self) -> usize {
        self.channels().len()
    }

    /// Free-text comments carried by the file header.
    pub fn comments(&self) -> &str {
        match &self.raw {
            Source::Ras(ras) => &ras.comments,
            Source::Dat(dat) => &dat.comments,
        }
    }

    /// Scan start time; only RAS files record one.
    pub fn start_time(&self) -> Option<NaiveDateTime> {
        match &self.raw {
            Source::Ras(ras) => Some(ras.start_time),
            Source::Dat(_) => None,
        }
    }

    /// Scan stop time; only RAS files record one.
    pub fn stop_time(&self) -> Option<NaiveDateTime> {
        match &self.raw {
            Source::Ras(ras) => Some(ras.stop_time),
            Source::Dat(_) => None,
        }
    }

    /// Requested beam energy; only DAT files record one.
    pub fn energy(&self) -> Option<f64> {
        match &self.raw {
            Source::Ras(_) => None,
            Source::Dat(dat) => Some(dat.energy),
        }
    }

    /// Format version string from the RAS header.
    pub fn version(&self) -> Option<&str> {
        self.ras().map(|ras| ras.header.version.as_str())
    }

    /// Motor names driving the two scan axes (RAS only).
    pub fn motor_names(&self) -> Option<&[String; 2]> {
        self.ras().map(|ras| &ras.header.motor_names)
    }

    /// Dwell time per point in seconds (RAS only).
    pub fn count_time(&self) -> Option<f64> {
        self.ras().map(|ras| ras.header.count_time)
    }

    pub fn sweep_count(&self) -> Option<i32> {
        self.ras().map(|ras| ras.header.sweep_count)
    }

    pub fn pixel_per_point(&self) -> Option<i32> {
        self.ras().map(|ras| ras.header.pixel_per_point)
    }

    pub fn scan_direction(&self) -> Option<i32> {
        self.ras().map(|ras| ras.header.scan_direction)
    }

    pub fn scan_type(&self) -> Option<i32> {
        self.ras().map(|ras| ras.header.scan_type)
    }

    fn ras(&self) -> Option<&RasFile> {
        match &self.raw {
            Source::Ras(ras) => Some(ras),
            Source::Dat(_) => None,
        }
    }

    /// File stem of the opened path, if the file came from disk.
    pub fn source_name(&self) -> Option<&str> {
        match &self.raw {
            Source::Ras(ras) => ras.source_name(),
            Source::Dat(dat) => dat.source_name(),
        }
    }

    pub fn channels(&self) -> &ChannelSelection {
        match &self.raw {
            Source::Ras(ras) => &ras.channels,
            Source::Dat(dat) => &dat.channels,
        }
    }

    pub fn channels_mut(&mut self) -> &mut ChannelSelection {
        match &mut self.raw {
            Source::Ras(ras) => &mut ras.channels,
            Source::Dat(dat) => &mut dat.channels,
        }
    }

    /// Apply a channel-definition file read from `path`.
    pub fn apply_channel_file(&mut self, path: &str) -> Result<(), ScanError> {
        let source = fs::read_to_string(path)?;
        self.apply_channel_definition(&source)
    }

    /// Apply channel-definition content already held in memory.
    pub fn apply_channel_definition(&mut self, source: &str) -> Result<(), ScanError> {
        self.channels_mut().apply_definition(source)
    }

    /// True once the sample data has been decoded.
    pub fn is_loaded(&self) -> bool {
        match &self.raw {
            Source::Ras(ras) => ras.is_loaded(),
            Source::Dat(dat) => dat.is_loaded(),
        }
    }

    /// Decode all channel grids now.
    ///
    /// Runs at most once; see the format parsers for the abort and
    /// poisoning rules.
    pub fn load(&mut self, progress: Option<&mut dyn DecodeProgress>) -> Result<(), ScanError> {
        match &mut self.raw {
            Source::Ras(ras) => ras.load(progress),
            Source::Dat(dat) => dat.load(progress),
        }
    }

    /// Handle to one channel, decoding the sample data on first use.
    pub fn channel(&mut self, index: usize) -> Result<Channel<'_>, ScanError> {
        self.channel_with_progress(index, None)
    }

    /// Like [`ScanFile::channel`] with a progress observer for the decode.
    pub fn channel_with_progress(
        &mut self,
        index: usize,
        progress: Option<&mut dyn DecodeProgress>,
    ) -> Result<Channel<'_>, ScanError> {
        let count = self.channel_count();
        if index >= count {
            return Err(ScanError::ChannelIndex { index, count });
        }
        self.load(progress)?;

        let (info, data) = match &self.raw {
            Source::Ras(ras) => (ras.channels.get(index), ras.loaded_channel_data(index)),
            Source::Dat(dat) => (dat.channels.get(index), dat.loaded_channel_data(index)),
        };
        match (info, data) {
            (Some(info), Some(data)) => Ok(Channel::new(info, data)),
            _ => Err(ScanError::DecodePoisoned),
        }
    }

    /// Name/value pairs for templated output filenames.
    ///
    /// The key set is a stable contract consumers rely on: `channel`,
    /// `channel_name`, `filename_root`, `start_time`, `stop_time`,
    /// `x_size`, `y_size`. Keys without a source value (a DAT timestamp,
    /// an in-memory file's root) map to the empty string.
    pub fn substitutions(
        &self,
        channel_index: usize,
    ) -> Result<BTreeMap<String, String>, ScanError> {
        let channel = self
            .channels()
            .get(channel_index)
            .ok_or(ScanError::ChannelIndex {
                index: channel_index,
                count: self.channel_count(),
            })?;

        let mut map = BTreeMap::new();
        map.insert("channel".to_string(), channel.index.to_string());
        map.insert("channel_name".to_string(), channel.name.clone());
        map.insert(
            "filename_root".to_string(),
            self.source_name().unwrap_or_default().to_string(),
        );
        map.insert(
            "start_time".to_string(),
            self.start_time()
                .map(|time| time.format(TIMESTAMP_FORMAT).to_string())
                .unwrap_or_default(),
        );
        map.insert(
            "stop_time".to_string(),
            self.stop_time()
                .map(|time| time.format(TIMESTAMP_FORMAT).to_string())
                .unwrap_or_default(),
        );
        map.insert("x_size".to_string(), self.x_size().to_string());
        map.insert("y_size".to_string(), self.y_size().to_string());
        Ok(map)
    }
}
