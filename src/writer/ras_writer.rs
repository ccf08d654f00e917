// Writer for the binary RAS scan format
use std::fs::File;
use std::io::Write;

use byteorder::{ByteOrder, LittleEndian};
use ndarray::Array2;

use crate::blocks::ras_header::RasHeaderBlock;
use crate::error::ScanError;
use crate::parsing::ras_file::legacy_channel_slot;

/// Writes RAS scan files byte-compatible with the historic tooling.
///
/// Samples are placed at the interleave slots [`legacy_channel_slot`]
/// reads them from, and the historic trailing zero word is appended, so
/// a file written from decoded grids reads back to the same grids and
/// round-trips byte-exactly.
pub struct RasWriter {
    file: File,
    offset: u64,
}

impl RasWriter {
    /// Creates a new RasWriter for the given file path (overwrites existing).
    pub fn new(path: &str) -> Result<Self, ScanError> {
        let file = File::create(path)?;
        Ok(RasWriter { file, offset: 0 })
    }

    /// Writes one complete scan: header, interleaved sample block and the
    /// trailing pad word.
    ///
    /// `channels` holds one `(y, x)` grid per channel, in channel order;
    /// the count and shapes must match the header geometry.
    pub fn write_scan(
        &mut self,
        header: &RasHeaderBlock,
        channels: &[Array2<u32>],
    ) -> Result<(), ScanError> {
        let bytes = encode_scan(header, channels)?;
        self.file.write_all(&bytes)?;
        self.offset += bytes.len() as u64;
        Ok(())
    }

    /// Returns the current file offset.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Finalizes the file (flushes all data to disk).
    pub fn finalize(mut self) -> Result<(), ScanError> {
        self.file.flush()?;
        Ok(())
    }
}

/// One-call convenience: create, write and flush a scan file.
pub fn write_scan_file(
    path: &str,
    header: &RasHeaderBlock,
    channels: &[Array2<u32>],
) -> Result<(), ScanError> {
    let mut writer = RasWriter::new(path)?;
    writer.write_scan(header, channels)?;
    writer.finalize()
}

/// Encodes a complete RAS file in memory.
pub fn encode_scan(
    header: &RasHeaderBlock,
    channels: &[Array2<u32>],
) -> Result<Vec<u8>, ScanError> {
    let (x, y, channel_count) = validate_geometry(header, channels)?;

    let mut bytes = header.to_bytes()?;
    bytes.reserve((x * y * channel_count + 1) * 4);

    let words_per_raster = x * channel_count;
    let mut raster_words = vec![0u32; words_per_raster];
    let mut raster_bytes = vec![0u8; words_per_raster * 4];

    for raster in 0..y {
        for (channel, grid) in channels.iter().enumerate() {
            let slot = legacy_channel_slot(channel, channel_count);
            let row = grid.row(raster);
            for point in 0..x {
                raster_words[slot + point * channel_count] = row[point];
            }
        }
        LittleEndian::write_u32_into(&raster_words, &mut raster_bytes);
        bytes.extend_from_slice(&raster_bytes);
    }

    // Historic writers close the sample block with one zero word; readers
    // following the short header layout depend on it.
    bytes.extend_from_slice(&0u32.to_le_bytes());
    Ok(bytes)
}

fn validate_geometry(
    header: &RasHeaderBlock,
    channels: &[Array2<u32>],
) -> Result<(usize, usize, usize), ScanError> {
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

    if channels.len() != channel_count {
        return Err(ScanError::SerializationError(format!(
            "got {} channel grids, header declares {}",
            channels.len(),
            channel_count
        )));
    }
    for (index, grid) in channels.iter().enumerate() {
        if grid.dim() != (y, x) {
            return Err(ScanError::SerializationError(format!(
                "channel {} grid is {:?}, header geometry needs ({}, {})",
                index,
                grid.dim(),
                y,
                x
            )));
        }
    }

    Ok((x, y, channel_count))
}
