use crate::channels::{ChannelData, ChannelInfo};

/// High level handle for a single channel of a loaded scan.
///
/// It borrows the descriptor and the decoded grid from the owning
/// [`ScanFile`](crate::api::scan::ScanFile); no samples are copied.
#[derive(Debug)]
pub struct Channel<'a> {
    info: &'a ChannelInfo,
    data: &'a ChannelData,
}

impl<'a> Channel<'a> {
    pub(crate) fn new(info: &'a ChannelInfo, data: &'a ChannelData) -> Self {
        Channel { info, data }
    }

    /// Zero-based position within the scan file.
    pub fn index(&self) -> usize {
        self.info.index
    }

    /// Display name, as labelled by the file or a channel-definition file.
    pub fn name(&self) -> &str {
        &self.info.name
    }

    pub fn enabled(&self) -> bool {
        self.info.enabled
    }

    /// The decoded sample grid.
    pub fn data(&self) -> &'a ChannelData {
        self.data
    }

    /// Grid shape as `(y_size, x_size)`.
    pub fn shape(&self) -> (usize, usize) {
        self.data.shape()
    }

    pub fn min(&self) -> f64 {
        self.data.min()
    }

    pub fn max(&self) -> f64 {
        self.data.max()
    }

    /// True when the channel recorded no signal (every sample equal).
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
