// src/blocks/mod.rs
pub mod common;
pub mod ras_header;
