//! RAS File Indexing System
//!
//! This module provides functionality to create lightweight indexes of RAS
//! files that can be serialized to JSON and used later to read specific
//! channels or rasters without parsing the file again, including over
//! transports that only support ranged reads.

use byteorder::{ByteOrder, LittleEndian};
use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::error::ScanError;
use crate::parsing::ras_file::{RasFile, legacy_channel_slot};

/// Channel metadata carried by the index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexedChannel {
    /// Zero-based channel position
    pub index: usize,
    /// Channel name
    pub name: String,
    /// Enabled state at the time the index was built
    pub enabled: bool,
}

/// Complete RAS file index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanIndex {
    /// File size for validation
    pub file_size: u64,
    /// Points per raster (x size)
    pub x_size: usize,
    /// Raster count (y size)
    pub y_size: usize,
    /// Channels interleaved per point
    pub channel_count: usize,
    /// Byte offset of the first sample
    pub data_offset: u64,
    /// Channels in index order
    pub channels: Vec<IndexedChannel>,
}

/// Trait for reading byte ranges from different sources (files, HTTP, etc.)
pub trait ByteRangeReader {
    type Error;

    /// Read bytes from the specified range
    /// Returns the requested bytes or an error
    fn read_range(&mut self, offset: u64, length: u64) -> Result<Vec<u8>, Self::Error>;
}

/// Local file reader implementation
pub struct FileRangeReader {
    file: std::fs::File,
}

impl FileRangeReader {
    pub fn new(file_path: &str) -> Result<Self, ScanError> {
        let file = std::fs::File::open(file_path)?;
        Ok(Self { file })
    }
}

impl ByteRangeReader for FileRangeReader {
    type Error = ScanError;

    fn read_range(&mut self, offset: u64, length: u64) -> Result<Vec<u8>, Self::Error> {
        use std::io::{Read, Seek, SeekFrom};

        self.file.seek(SeekFrom::Start(offset))?;

        let mut buffer = vec![0u8; length as usize];
        self.file.read_exact(&mut buffer)?;

        Ok(buffer)
    }
}

/// Example HTTP range reader (would be implemented in production)
/// ```rust,ignore
/// use qscan_rs::index::ByteRangeReader;
/// use qscan_rs::error::ScanError;
///
/// pub struct HttpRangeReader {
///     client: reqwest::blocking::Client,
///     url: String,
/// }
///
/// impl ByteRangeReader for HttpRangeReader {
///     type Error = ScanError;
///
///     fn read_range(&mut self, offset: u64, length: u64) -> Result<Vec<u8>, Self::Error> {
///         let range_header = format!("bytes={}-{}", offset, offset + length - 1);
///
///         let response = self.client
///             .get(&self.url)
///             .header("Range", range_header)
///             .send()
///             .map_err(|e| ScanError::SerializationError(format!("HTTP error: {e}")))?;
///
///         if !response.status().is_success() {
///             return Err(ScanError::SerializationError(
///                 format!("HTTP error: {}", response.status())
///             ));
///         }
///
///         let bytes = response.bytes()
///             .map_err(|e| ScanError::SerializationError(format!("Response error: {e}")))?;
///
///         Ok(bytes.to_vec())
///     }
/// }
/// ```
pub struct _HttpRangeReaderExample;

impl ScanIndex {
    /// Create an index from a RAS file
    pub fn from_file(file_path: &str) -> Result<Self, ScanError> {
        let scan = RasFile::parse_from_file(file_path)?;
        let file_size = std::fs::metadata(file_path)?.len();
        Ok(Self::from_scan(&scan, file_size))
    }

    /// Build an index from an already-parsed scan
    pub fn from_scan(scan: &RasFile, file_size: u64) -> Self {
        let channels = scan
            .channels
            .iter()
            .map(|channel| IndexedChannel {
                index: channel.index,
                name: channel.name.clone(),
                enabled: channel.enabled,
            })
            .collect();

        ScanIndex {
            file_size,
            x_size: scan.x_size(),
            y_size: scan.y_size(),
            channel_count: scan.channel_count(),
            data_offset: scan.data_offset as u64,
            channels,
        }
    }

    /// Save the index to a JSON file
    pub fn save_to_file(&self, index_path: &str) -> Result<(), ScanError> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| ScanError::SerializationError(format!("JSON serialization failed: {}", e)))?;

        std::fs::write(index_path, json)?;

        Ok(())
    }

    /// Load an index from a JSON file
    pub fn load_from_file(index_path: &str) -> Result<Self, ScanError> {
        let json = std::fs::read_to_string(index_path)?;

        let index: ScanIndex = serde_json::from_str(&json)
            .map_err(|e| ScanError::SerializationError(format!("JSON deserialization failed: {}", e)))?;

        Ok(index)
    }

    /// List all channels with their enabled state
    pub fn list_channels(&self) -> Vec<(usize, &str, bool)> {
        self.channels
            .iter()
            .map(|channel| (channel.index, channel.name.as_str(), channel.enabled))
            .collect()
    }

    /// Get channel information for a specific channel
    pub fn get_channel_info(&self, channel_index: usize) -> Option<&IndexedChannel> {
        self.channels.get(channel_index)
    }

    /// Get the exact byte range holding one raster of interleaved samples
    ///
    /// Returns a (file_offset, length) pair covering the
    /// `x_size * channel_count` words of the requested raster.
    pub fn raster_byte_range(&self, raster: usize) -> Result<(u64, u64), ScanError> {
        if raster >= self.y_size {
            return Err(ScanError::SerializationError(format!(
                "Invalid raster index {}, file has {} rasters",
                raster, self.y_size
            )));
        }
        let bytes_per_raster = (self.x_size * self.channel_count * 4) as u64;
        Ok((
            self.data_offset + raster as u64 * bytes_per_raster,
            bytes_per_raster,
        ))
    }

    /// Read one raster of one channel using the index and a byte range reader
    ///
    /// Samples are picked from the same interleave slots the full decoder
    /// uses (see [`legacy_channel_slot`]), so ranged reads agree with
    /// whole-file decodes.
    pub fn read_channel_raster<R: ByteRangeReader<Error = ScanError>>(
        &self,
        channel_index: usize,
        raster: usize,
        reader: &mut R,
    ) -> Result<Vec<u32>, ScanError> {
        if channel_index >= self.channel_count {
            return Err(ScanError::ChannelIndex {
                index: channel_index,
                count: self.channel_count,
            });
        }

        let (offset, length) = self.raster_byte_range(raster)?;
        let bytes = reader.read_range(offset, length)?;
        if bytes.len() != length as usize {
            return Err(ScanError::SerializationError(format!(
                "range reader returned {} bytes, expected {}",
                bytes.len(),
                length
            )));
        }

        let mut words = vec![0u32; self.x_size * self.channel_count];
        LittleEndian::read_u32_into(&bytes, &mut words);

        let slot = legacy_channel_slot(channel_index, self.channel_count);
        Ok((0..self.x_size)
            .map(|point| words[slot + point * self.channel_count])
            .collect())
    }

    /// Read a whole channel grid using the index and a byte range reader
    ///
    /// Rasters are fetched one range at a time, so a remote reader never
    /// transfers more than one raster per request.
    pub fn read_channel<R: ByteRangeReader<Error = ScanError>>(
        &self,
        channel_index: usize,
        reader: &mut R,
    ) -> Result<Array2<u32>, ScanError> {
        let mut grid = Array2::zeros((self.y_size, self.x_size));
        for raster in 0..self.y_size {
            let values = self.read_channel_raster(channel_index, raster, reader)?;
            let mut row = grid.row_mut(raster);
            for (point, value) in values.into_iter().enumerate() {
                row[point] = value;
            }
        }
        Ok(grid)
    }
}
