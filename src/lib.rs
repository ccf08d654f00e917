pub mod blocks;
pub mod channels;
pub mod error;
pub mod progress;
pub mod writer;

pub mod index;
pub mod registry;

pub mod parsing {
    pub mod dat_file;
    pub mod ras_file;
}

pub mod api {
    pub mod channel;
    pub mod scan;
}
