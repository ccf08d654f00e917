//! Channel descriptors, selection state and decoded sample grids.

use std::collections::HashSet;

use ndarray::Array2;

use crate::error::ScanError;

/// One measurement stream within a scan file.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelInfo {
    /// Zero-based position within the scan file.
    pub index: usize,
    /// Display name: a DAT label, a RAS `"I{index}"` default, or the name
    /// assigned by a channel-definition file.
    pub name: String,
    /// Disabled channels keep their data but are skipped by exporters.
    pub enabled: bool,
}

/// The ordered channel set of one scan file.
#[derive(Debug, Clone)]
pub struct ChannelSelection {
    channels: Vec<ChannelInfo>,
}

impl ChannelSelection {
    /// All channels enabled, names empty until the parser assigns them.
    pub fn all_enabled(count: usize) -> Self {
        let channels = (0..count)
            .map(|index| ChannelInfo {
                index,
                name: String::new(),
                enabled: true,
            })
            .collect();
        Self { channels }
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&ChannelInfo> {
        self.channels.get(index)
    }

    /// Channels in index order.
    pub fn iter(&self) -> impl Iterator<Item = &ChannelInfo> {
        self.channels.iter()
    }

    /// Enabled channels only, in index order.
    pub fn enabled(&self) -> impl Iterator<Item = &ChannelInfo> {
        self.channels.iter().filter(|c| c.enabled)
    }

    pub(crate) fn set_name(&mut self, index: usize, name: &str) {
        if let Some(channel) = self.channels.get_mut(index) {
            channel.name = name.to_string();
        }
    }

    /// Applies a channel-definition file.
    ///
    /// Every channel starts disabled; each `"<index> <name>"` line enables
    /// and renames exactly one channel. Blank lines and lines starting
    /// with `#` are skipped. Line numbers in errors are 1-based.
    pub fn apply_definition(&mut self, source: &str) -> Result<(), ScanError> {
        for channel in &mut self.channels {
            channel.enabled = false;
        }

        let mut seen = HashSet::new();
        for (i, raw) in source.lines().enumerate() {
            let line = i + 1;
            let trimmed = raw.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }

            let mut tokens = trimmed.split_whitespace();
            let Some(index_token) = tokens.next() else {
                continue;
            };
            let name: Vec<&str> = tokens.collect();
            if name.is_empty() {
                return Err(ScanError::ChannelFileSyntax { line });
            }

            let index: i64 = index_token
                .parse()
                .map_err(|_| ScanError::ChannelFileSyntax { line })?;
            if index < 0 || index as usize >= self.channels.len() {
                return Err(ScanError::ChannelFileIndex {
                    line,
                    index,
                    count: self.channels.len(),
                });
            }
            let index = index as usize;
            if !seen.insert(index) {
                return Err(ScanError::ChannelFileDuplicate { line, index });
            }

            let channel = &mut self.channels[index];
            channel.enabled = true;
            channel.name = name.join(" ");
        }
        Ok(())
    }
}

/// Decoded sample grid of one channel, shape `(y_size, x_size)`.
///
/// RAS files store raw 32-bit counter values; DAT files store floats.
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelData {
    Counts(Array2<u32>),
    Values(Array2<f64>),
}

impl ChannelData {
    /// Grid shape as `(y_size, x_size)`.
    pub fn shape(&self) -> (usize, usize) {
        match self {
            ChannelData::Counts(grid) => grid.dim(),
            ChannelData::Values(grid) => grid.dim(),
        }
    }

    /// Smallest sample in the grid.
    pub fn min(&self) -> f64 {
        match self {
            ChannelData::Counts(grid) => grid.iter().copied().min().unwrap_or(0) as f64,
            ChannelData::Values(grid) => grid.iter().copied().fold(f64::INFINITY, f64::min),
        }
    }

    /// Largest sample in the grid.
    pub fn max(&self) -> f64 {
        match self {
            ChannelData::Counts(grid) => grid.iter().copied().max().unwrap_or(0) as f64,
            ChannelData::Values(grid) => grid.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        }
    }

    /// True when every sample holds the same value. Viewers use this to
    /// skip channels that recorded no signal.
    pub fn is_empty(&self) -> bool {
        self.min() == self.max()
    }

    /// Copy of the grid as floats, for consumers that do not care about
    /// the storage type.
    pub fn to_f64(&self) -> Array2<f64> {
        match self {
            ChannelData::Counts(grid) => grid.mapv(|v| v as f64),
            ChannelData::Values(grid) => grid.clone(),
        }
    }

    pub fn as_counts(&self) -> Option<&Array2<u32>> {
        match self {
            ChannelData::Counts(grid) => Some(grid),
            ChannelData::Values(_) => None,
        }
    }

    pub fn as_values(&self) -> Option<&Array2<f64>> {
        match self {
            ChannelData::Counts(_) => None,
            ChannelData::Values(grid) => Some(grid),
        }
    }
}

/// Decode lifecycle of a scan file's sample block.
///
/// The memoized result is only committed on full success. `Poisoned`
/// records an aborted or failed decode; a poisoned file must be reopened
/// to retry.
#[derive(Debug)]
pub(crate) enum DecodeState {
    Pending,
    Ready(Vec<ChannelData>),
    Poisoned,
}
