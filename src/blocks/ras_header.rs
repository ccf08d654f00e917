use byteorder::{ByteOrder, LittleEndian};

use crate::blocks::common::{read_padded_str, write_padded_str};
use crate::error::ScanError;

/// Size of the fixed RAS header record in bytes.
///
/// The true on-disk header carries one more 32-bit word after `run_number`
/// (always observed zero). This layout deliberately does not consume it;
/// every reader and writer of the format shares that quirk, and channel
/// decoding depends on it. See `legacy_channel_slot`.
pub const HEADER_LEN: usize = 1084;

/// Every RAS version string starts with this prefix.
pub const MAGIC_PREFIX: &str = "Raster Scan";

/// The only `version_number` this library understands.
pub const SUPPORTED_VERSION: i32 = 1;

#[derive(Debug, Clone, PartialEq)]
pub struct RasHeaderBlock {
    pub version: String,          // 80 bytes, starts with "Raster Scan"
    pub version_number: i32,      // 4 bytes
    pub pid: u32,                 // 4 bytes
    pub comments: [String; 6],    // 6 x 80 bytes
    pub motor_names: [String; 2], // 2 x 40 bytes
    pub region_filename: String,  // 80 bytes
    pub file_head: String,        // 80 bytes
    pub file_name: String,        // 80 bytes
    pub start_stamp: String,      // 40 bytes
    pub stop_stamp: String,       // 40 bytes
    pub channel_count: i32,       // 4 bytes
    pub reserved0: i32,           // 4 bytes, always zero on disk
    pub count_time: f64,          // 8 bytes
    pub sweep_count: i32,         // 4 bytes
    pub ascii_flag: i32,          // 4 bytes
    pub num_points: i32,          // 4 bytes, points per raster (x size)
    pub num_rasters: i32,         // 4 bytes, raster count (y size)
    pub pixel_per_point: i32,     // 4 bytes
    pub scan_direction: i32,      // 4 bytes
    pub scan_type: i32,           // 4 bytes
    pub current_x_direction: i32, // 4 bytes
    pub commands: [i32; 4],       // 4 x 4 bytes
    pub offsets: [f64; 6],        // 6 x 8 bytes
    pub run_number: i32,          // 4 bytes
}

impl RasHeaderBlock {
    /// Creates a RasHeaderBlock from a 1084-byte slice.
    /// This version does NOT validate the magic prefix or version number;
    /// that is the parser's job.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ScanError> {
        if bytes.len() < HEADER_LEN {
            return Err(ScanError::RasHeaderTooShort {
                actual:   bytes.len(),
                expected: HEADER_LEN,
                file:     file!(),
                line:     line!(),
            });
        }

        let mut comments: [String; 6] = Default::default();
        for (i, slot) in comments.iter_mut().enumerate() {
            let start = 88 + i * 80;
            *slot = read_padded_str(&bytes[start..start + 80], "comment", start)?;
        }

        let mut motor_names: [String; 2] = Default::default();
        for (i, slot) in motor_names.iter_mut().enumerate() {
            let start = 568 + i * 40;
            *slot = read_padded_str(&bytes[start..start + 40], "motor name", start)?;
        }

        let mut commands = [0i32; 4];
        for (i, slot) in commands.iter_mut().enumerate() {
            let start = 1016 + i * 4;
            *slot = LittleEndian::read_i32(&bytes[start..start + 4]);
        }

        let mut offsets = [0f64; 6];
        for (i, slot) in offsets.iter_mut().enumerate() {
            let start = 1032 + i * 8;
            *slot = LittleEndian::read_f64(&bytes[start..start + 8]);
        }

        Ok(Self {
            version: read_padded_str(&bytes[0..80], "version", 0)?,
            version_number: LittleEndian::read_i32(&bytes[80..84]),
            pid: LittleEndian::read_u32(&bytes[84..88]),
            comments,
            motor_names,
            region_filename: read_padded_str(&bytes[648..728], "region filename", 648)?,
            file_head: read_padded_str(&bytes[728..808], "file head", 728)?,
            file_name: read_padded_str(&bytes[808..888], "file name", 808)?,
            start_stamp: read_padded_str(&bytes[888..928], "start timestamp", 888)?,
            stop_stamp: read_padded_str(&bytes[928..968], "stop timestamp", 928)?,
            channel_count: LittleEndian::read_i32(&bytes[968..972]),
            reserved0: LittleEndian::read_i32(&bytes[972..976]),
            count_time: LittleEndian::read_f64(&bytes[976..984]),
            sweep_count: LittleEndian::read_i32(&bytes[984..988]),
            ascii_flag: LittleEndian::read_i32(&bytes[988..992]),
            num_points: LittleEndian::read_i32(&bytes[992..996]),
            num_rasters: LittleEndian::read_i32(&bytes[996..1000]),
            pixel_per_point: LittleEndian::read_i32(&bytes[1000..1004]),
            scan_direction: LittleEndian::read_i32(&bytes[1004..1008]),
            scan_type: LittleEndian::read_i32(&bytes[1008..1012]),
            current_x_direction: LittleEndian::read_i32(&bytes[1012..1016]),
            commands,
            offsets,
            run_number: LittleEndian::read_i32(&bytes[1080..1084]),
        })
    }

    /// Returns a RasHeaderBlock with default values: a supported version
    /// string, zero geometry and empty text fields.
    pub fn default() -> Self {
        RasHeaderBlock {
            version: format!("{} 1.0", MAGIC_PREFIX),
            version_number: SUPPORTED_VERSION,
            pid: 0,
            comments: Default::default(),
            motor_names: Default::default(),
            region_filename: String::new(),
            file_head: String::new(),
            file_name: String::new(),
            start_stamp: String::new(),
            stop_stamp: String::new(),
            channel_count: 0,
            reserved0: 0,
            count_time: 0.0,
            sweep_count: 0,
            ascii_flag: 0,
            num_points: 0,
            num_rasters: 0,
            pixel_per_point: 0,
            scan_direction: 0,
            scan_type: 0,
            current_x_direction: 0,
            commands: [0; 4],
            offsets: [0.0; 6],
            run_number: 0,
        }
    }

    /// Serializes the RasHeaderBlock to bytes.
    ///
    /// # Structure (1084 bytes total, little-endian, no alignment padding):
    /// - Identification (88 bytes): version string (80), version number (i32), pid (u32)
    /// - Free text (420 bytes): six 80-byte comments, two 40-byte motor names
    /// - File names (240 bytes): region filename, file head, file name (80 each)
    /// - Timestamps (80 bytes): start and stop stamp (40 each)
    /// - Geometry and acquisition (52 bytes): channel count, reserved word,
    ///   count time (f64), sweep count, ascii flag, num points, num rasters,
    ///   pixel per point, scan direction, scan type, current x direction
    /// - Commands and offsets (68 bytes): four i32 commands, six f64 offsets,
    ///   run number (i32)
    ///
    /// String fields are NUL-padded to their fixed width; a value that does
    /// not fit its field is an error, never a silent truncation.
    pub fn to_bytes(&self) -> Result<Vec<u8>, ScanError> {
        let mut buffer = Vec::with_capacity(HEADER_LEN);

        // 1. Identification section
        write_padded_str(&mut buffer, &self.version, 80, "version")?;
        buffer.extend_from_slice(&self.version_number.to_le_bytes());
        buffer.extend_from_slice(&self.pid.to_le_bytes());

        // 2. Free-text section
        for comment in &self.comments {
            write_padded_str(&mut buffer, comment, 80, "comment")?;
        }
        for motor_name in &self.motor_names {
            write_padded_str(&mut buffer, motor_name, 40, "motor name")?;
        }
        write_padded_str(&mut buffer, &self.region_filename, 80, "region filename")?;
        write_padded_str(&mut buffer, &self.file_head, 80, "file head")?;
        write_padded_str(&mut buffer, &self.file_name, 80, "file name")?;
        write_padded_str(&mut buffer, &self.start_stamp, 40, "start timestamp")?;
        write_padded_str(&mut buffer, &self.stop_stamp, 40, "stop timestamp")?;

        // 3. Geometry and acquisition section
        buffer.extend_from_slice(&self.channel_count.to_le_bytes());
        buffer.extend_from_slice(&self.reserved0.to_le_bytes());
        buffer.extend_from_slice(&self.count_time.to_le_bytes());
        buffer.extend_from_slice(&self.sweep_count.to_le_bytes());
        buffer.extend_from_slice(&self.ascii_flag.to_le_bytes());
        buffer.extend_from_slice(&self.num_points.to_le_bytes());
        buffer.extend_from_slice(&self.num_rasters.to_le_bytes());
        buffer.extend_from_slice(&self.pixel_per_point.to_le_bytes());
        buffer.extend_from_slice(&self.scan_direction.to_le_bytes());
        buffer.extend_from_slice(&self.scan_type.to_le_bytes());
        buffer.extend_from_slice(&self.current_x_direction.to_le_bytes());

        // 4. Command and offset section
        for command in &self.commands {
            buffer.extend_from_slice(&command.to_le_bytes());
        }
        for offset in &self.offsets {
            buffer.extend_from_slice(&offset.to_le_bytes());
        }
        buffer.extend_from_slice(&self.run_number.to_le_bytes());

        // Verify the buffer is exactly one header record
        if buffer.len() != HEADER_LEN {
            return Err(ScanError::SerializationError(format!(
                "RAS header must be exactly {} bytes, got {}",
                HEADER_LEN,
                buffer.len()
            )));
        }

        Ok(buffer)
    }
}
