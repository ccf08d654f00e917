use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("RAS header too short at {file}:{line}: need at least {expected} bytes, got {actual}")]
    RasHeaderTooShort {
        actual:   usize,
        expected: usize,
        file:     &'static str,
        line:     u32,
    },

    #[error(r#"Not a RAS scan file: version string starts with {0:?}, expected "Raster Scan""#)]
    RasBadMagic(String),

    #[error("Unsupported RAS version number {0}, expected 1")]
    RasUnsupportedVersion(i32),

    #[error("RAS header field {field:?} holds a non-ASCII byte at file offset {offset}")]
    RasFieldEncoding {
        field:  &'static str,
        offset: usize,
    },

    #[error("RAS header field {field:?} must be ASCII and at most {width} bytes")]
    RasStringTooWide {
        field: &'static str,
        width: usize,
    },

    #[error("RAS header field {field:?} holds unparseable timestamp {value:?}")]
    RasTimestamp {
        field: &'static str,
        value: String,
    },

    #[error("Invalid RAS scan geometry: {x} x {y} points, {channels} channels")]
    RasGeometry { x: i32, y: i32, channels: i32 },

    #[error("RAS sample block truncated in raster {raster}: need {expected} more bytes, got {actual}")]
    RasTruncatedSamples {
        raster:   usize,
        expected: usize,
        actual:   usize,
    },

    #[error("RAS sample block holds {actual} bytes, expected {expected} plus at most one pad word")]
    RasExcessSamples { expected: usize, actual: usize },

    #[error("DAT header line {line} does not match the expected {expected} pattern")]
    DatHeader { line: usize, expected: String },

    #[error("DAT header ended before the expected {expected} pattern")]
    DatTruncatedHeader { expected: String },

    #[error("DAT line {line}: {token:?} is not a number")]
    DatNumber { line: usize, token: String },

    #[error("DAT line {line}: count {value} is out of range")]
    DatDimension { line: usize, value: i64 },

    #[error("DAT line {line}: {section} holds {actual} values, expected {expected}")]
    DatCountMismatch {
        line:     usize,
        section:  &'static str,
        expected: usize,
        actual:   usize,
    },

    #[error("DAT line {line}: {axis} coordinate {value} does not match any requested point")]
    DatCoordinate {
        line:  usize,
        axis:  &'static str,
        value: f64,
    },

    #[error("DAT data block holds {actual} grid rows, expected {expected}")]
    DatRowCount { expected: usize, actual: usize },

    #[error(r#"Channel definition line {line} is not "<index> <name>""#)]
    ChannelFileSyntax { line: usize },

    #[error("Channel definition line {line}: index {index} is outside 0..{count}")]
    ChannelFileIndex {
        line:  usize,
        index: i64,
        count: usize,
    },

    #[error("Channel definition line {line}: index {index} already defined")]
    ChannelFileDuplicate { line: usize, index: usize },

    #[error("Channel index {index} is outside 0..{count}")]
    ChannelIndex { index: usize, count: usize },

    #[error("Decode aborted by progress observer")]
    DecodeAborted,

    #[error("Decode previously failed for this file; reopen it to retry")]
    DecodePoisoned,

    #[error("No loader registered for extension {extension:?}, known: {known}")]
    UnknownExtension { extension: String, known: String },

    #[error("File access error")]
    IOError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}
