//! Progress reporting for channel decodes.
//!
//! Decoding a large scan walks every raster of the sample block. Callers
//! that want feedback (a progress bar, a cancel button) pass an observer
//! implementing [`DecodeProgress`]; callers that do not pass `None`.

/// Observer for a running channel decode.
///
/// `on_update` is called each time the integer percentage of decoded
/// rasters advances. Returning `false` aborts the decode; the file then
/// reports the abort as an error and stays unloaded.
///
/// ```rust,ignore
/// use qscan_rs::progress::DecodeProgress;
///
/// struct PrintProgress;
///
/// impl DecodeProgress for PrintProgress {
///     fn on_update(&mut self, percent: u8) -> bool {
///         println!("decoding: {percent}%");
///         true
///     }
/// }
/// ```
pub trait DecodeProgress {
    /// Called once before the first raster is decoded.
    fn on_start(&mut self) {}

    /// Called whenever the decoded percentage advances.
    /// Return `false` to abort the decode.
    fn on_update(&mut self, _percent: u8) -> bool {
        true
    }

    /// Called once after the last raster, before the decode returns.
    fn on_finish(&mut self) {}
}
