use memmap2::Mmap;
use std::fs::File;
use std::path::Path;

use byteorder::{ByteOrder, LittleEndian};
use chrono::NaiveDateTime;
use ndarray::Array2;

use crate::blocks::ras_header::{HEADER_LEN, MAGIC_PREFIX, RasHeaderBlock, SUPPORTED_VERSION};
use crate::channels::{ChannelData, ChannelSelection, DecodeState};
use crate::error::ScanError;
use crate::progress::DecodeProgress;

/// Timestamp layout of the two header stamps, e.g. `"Mon Jul 7 10:21:32 2014"`.
pub const TIMESTAMP_FORMAT: &str = "%a %b %d %H:%M:%S %Y";

/// Maps a channel index to the interleave slot its samples occupy.
///
/// The header layout under-reads the true on-disk header by one 32-bit
/// word (see [`HEADER_LEN`]), so the sample block appears shifted by one
/// sample: channel `c` reads the slot nominally belonging to channel
/// `c - 1`, and channel 0 wraps around to the last slot. Every historic
/// reader and writer of the format shares this shift; the writer in this
/// library places samples at the same slots so that files round-trip
/// byte-exactly. Do not "fix" this mapping, stored files depend on it.
///
/// `channel_count` must be non-zero.
pub const fn legacy_channel_slot(channel: usize, channel_count: usize) -> usize {
    (channel + channel_count - 1) % channel_count
}

/// Backing bytes of an open RAS file.
#[derive(Debug)]
enum SampleSource {
    Mapped(Mmap),
    Owned(Vec<u8>),
}

impl SampleSource {
    fn bytes(&self) -> &[u8] {
        match self {
            SampleSource::Mapped(mmap) => &mmap[..],
            SampleSource::Owned(buffer) => &buffer[..],
        }
    }
}

#[derive(Debug)]
pub struct RasFile {
    pub header: RasHeaderBlock,
    /// The six header comment fields, stripped, empties dropped, joined
    /// with newlines.
    pub comments: String,
    pub start_time: NaiveDateTime,
    pub stop_time: NaiveDateTime,
    pub channels: ChannelSelection,
    /// Byte offset of the first sample, immediately after the fixed header.
    pub data_offset: usize,
    // Bytes stay owned here so the decode pass can slice them lazily.
    source: SampleSource,
    source_name: Option<String>,
    data: DecodeState,
}

impl RasFile {
    /// Parse a RAS file from a given file path.
    ///
    /// The file is mapped read-only; the sample block is not decoded until
    /// [`RasFile::load`] or [`RasFile::channel_data`] is called.
    pub fn parse_from_file(path: &str) -> Result<Self, ScanError> {
        let file = File::open(path)?;
        let mmap = unsafe { Mmap::map(&file)? };
        let source_name = Path::new(path)
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned());
        Self::parse(SampleSource::Mapped(mmap), source_name)
    }

    /// Parse a RAS file already held in memory.
    pub fn parse_from_bytes(bytes: Vec<u8>) -> Result<Self, ScanError> {
        Self::parse(SampleSource::Owned(bytes), None)
    }

    fn parse(source: SampleSource, source_name: Option<String>) -> Result<Self, ScanError> {
        let bytes = source.bytes();
        let header = RasHeaderBlock::from_bytes(bytes)?;

        if !header.version.starts_with(MAGIC_PREFIX) {
            let found: String = header.version.chars().take(MAGIC_PREFIX.len()).collect();
            return Err(ScanError::RasBadMagic(found));
        }
        if header.version_number != SUPPORTED_VERSION {
            return Err(ScanError::RasUnsupportedVersion(header.version_number));
        }
        if header.num_points < 1 || header.num_rasters < 1 || header.channel_count < 0 {
            return Err(ScanError::RasGeometry {
                x: header.num_points,
                y: header.num_rasters,
                channels: header.channel_count,
            });
        }

        let x = header.num_points as usize;
        let y = header.num_rasters as usize;
        let channel_count = header.channel_count as usize;

        // The block must hold y full rasters of x * channel_count words,
        // plus at most the one zero word historic writers append (never
        // read). A sample count too large to compute is a header defect,
        // not a shorter file.
        let available = bytes.len() - HEADER_LEN;
        let needed = x
            .checked_mul(y)
            .and_then(|cells| cells.checked_mul(channel_count))
            .and_then(|samples| samples.checked_mul(4));
        let Some(needed) = needed else {
            return Err(ScanError::RasGeometry {
                x: header.num_points,
                y: header.num_rasters,
                channels: header.channel_count,
            });
        };
        if available < needed {
            let bytes_per_raster = x * channel_count * 4;
            let raster = available / bytes_per_raster;
            return Err(ScanError::RasTruncatedSamples {
                raster,
                expected: bytes_per_raster,
                actual: available - raster * bytes_per_raster,
            });
        }
        if available > needed + 4 {
            return Err(ScanError::RasExcessSamples {
                expected: needed,
                actual: available,
            });
        }

        let start_time = parse_timestamp("start timestamp", &header.start_stamp)?;
        let stop_time = parse_timestamp("stop timestamp", &header.stop_stamp)?;

        let comments = header
            .comments
            .iter()
            .filter(|comment| !comment.is_empty())
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join("\n");

        let mut channels = ChannelSelection::all_enabled(channel_count);
        for index in 0..channel_count {
            channels.set_name(index, &format!("I{index}"));
        }

        Ok(Self {
            header,
            comments,
            start_time,
            stop_time,
            channels,
            data_offset: HEADER_LEN,
            source,
            source_name,
            data: DecodeState::Pending,
        })
    }

    /// Points per raster (x size).
    pub fn x_size(&self) -> usize {
        self.header.num_points as usize
    }

    /// Raster count (y size).
    pub fn y_size(&self) -> usize {
        self.header.num_rasters as usize
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// File stem of the parsed path, if the file came from disk.
    pub fn source_name(&self) -> Option<&str> {
        self.source_name.as_deref()
    }

    /// True once the sample block has been decoded.
    pub fn is_loaded(&self) -> bool {
        matches!(self.data, DecodeState::Ready(_))
    }

    /// Decoded grid of one channel, without triggering a decode.
    /// Returns `None` until [`RasFile::load`] has succeeded.
    pub fn loaded_channel_data(&self, index: usize) -> Option<&ChannelData> {
        match &self.data {
            DecodeState::Ready(buffers) => buffers.get(index),
            _ => None,
        }
    }

    /// Decoded grid of one channel, decoding the whole sample block on
    /// first use.
    pub fn channel_data(
        &mut self,
        index: usize,
        progress: Option<&mut dyn DecodeProgress>,
    ) -> Result<&ChannelData, ScanError> {
        if index >= self.channels.len() {
            return Err(ScanError::ChannelIndex {
                index,
                count: self.channels.len(),
            });
        }
        self.load(progress)?;
        match &self.data {
            DecodeState::Ready(buffers) => Ok(&buffers[index]),
            _ => Err(ScanError::DecodePoisoned),
        }
    }

    /// Decodes the interleaved sample block into one grid per channel.
    ///
    /// Runs at most once; later calls return immediately. The result is
    /// only committed when the full pass finishes, so an abort from the
    /// progress observer or a decode error leaves the file poisoned and
    /// every later call fails with [`ScanError::DecodePoisoned`]. Reopen
    /// the file to retry.
    pub fn load(&mut self, mut progress: Option<&mut dyn DecodeProgress>) -> Result<(), ScanError> {
        match self.data {
            DecodeState::Ready(_) => return Ok(()),
            DecodeState::Poisoned => return Err(ScanError::DecodePoisoned),
            DecodeState::Pending => {}
        }
        self.data = DecodeState::Poisoned;

        let x = self.x_size();
        let y = self.y_size();
        let channel_count = self.channels.len();

        if let Some(observer) = progress.as_deref_mut() {
            observer.on_start();
        }

        let bytes = self.source.bytes();
        let words_per_raster = x * channel_count;
        let bytes_per_raster = words_per_raster * 4;
        let mut buffers: Vec<Array2<u32>> =
            (0..channel_count).map(|_| Array2::zeros((y, x))).collect();
        // One raster of interleaved words is the only decode temporary.
        let mut raster_words = vec![0u32; words_per_raster];
        let mut offset = self.data_offset;
        let mut last_reported: Option<u8> = None;

        for raster in 0..y {
            let end = offset + bytes_per_raster;
            if end > bytes.len() {
                return Err(ScanError::RasTruncatedSamples {
                    raster,
                    expected: bytes_per_raster,
                    actual: bytes.len().saturating_sub(offset),
                });
            }
            LittleEndian::read_u32_into(&bytes[offset..end], &mut raster_words);

            for (channel, buffer) in buffers.iter_mut().enumerate() {
                let first = legacy_channel_slot(channel, channel_count);
                let mut row = buffer.row_mut(raster);
                for point in 0..x {
                    row[point] = raster_words[first + point * channel_count];
                }
            }
            offset = end;

            if let Some(observer) = progress.as_deref_mut() {
                let percent = ((raster + 1) * 100 / y) as u8;
                if last_reported != Some(percent) {
                    last_reported = Some(percent);
                    if !observer.on_update(percent) {
                        return Err(ScanError::DecodeAborted);
                    }
                }
            }
        }

        if let Some(observer) = progress.as_deref_mut() {
            observer.on_finish();
        }
        self.data = DecodeState::Ready(buffers.into_iter().map(ChannelData::Counts).collect());
        Ok(())
    }
}

fn parse_timestamp(field: &'static str, raw: &str) -> Result<NaiveDateTime, ScanError> {
    // Stamps pad the day with a double space ("Jul  7"); collapse runs
    // before handing the text to chrono.
    let normalized = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    NaiveDateTime::parse_from_str(&normalized, TIMESTAMP_FORMAT).map_err(|_| {
        ScanError::RasTimestamp {
            field,
            value: raw.to_string(),
        }
    })
}
