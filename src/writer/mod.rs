//! Byte-exact writer module for the binary RAS scan format
//!
//! This module provides a safe API for writing scan files to disk,
//! guaranteeing little-endian encoding, the fixed header layout and the
//! historic trailing pad word.

pub mod ras_writer;
pub use ras_writer::{RasWriter, encode_scan, write_scan_file};
