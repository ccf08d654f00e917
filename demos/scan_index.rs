//! Builds a small RAS file, indexes it and reads one channel back
//! through ranged reads only.

use ndarray::Array2;
use qscan_rs::blocks::ras_header::RasHeaderBlock;
use qscan_rs::error::ScanError;
use qscan_rs::index::{FileRangeReader, ScanIndex};
use qscan_rs::writer::write_scan_file;

fn main() -> Result<(), ScanError> {
    // Step 1: Create a sample RAS file
    let scan_path = "sample_for_indexing.ras";
    let index_path = "sample_index.json";

    println!("Creating sample RAS file: {}", scan_path);
    create_sample_scan(scan_path)?;

    // Step 2: Create an index from the scan file
    println!("Creating index from scan file...");
    let index = ScanIndex::from_file(scan_path)?;

    // Step 3: Save the index to a JSON file
    println!("Saving index to: {}", index_path);
    index.save_to_file(index_path)?;

    // Step 4: Load the index back (simulating a fresh start)
    println!("Loading index from JSON file...");
    let loaded_index = ScanIndex::load_from_file(index_path)?;

    // Step 5: Explore the index structure
    println!("\n=== Index Structure ===");
    println!("File size: {} bytes", loaded_index.file_size);
    println!(
        "Geometry: {} x {} points, {} channels interleaved",
        loaded_index.x_size, loaded_index.y_size, loaded_index.channel_count
    );
    println!("Channels:");
    for (index, name, enabled) in loaded_index.list_channels() {
        println!("  Channel {}: {} (enabled: {})", index, name, enabled);
    }

    // Step 6: Read one raster, then a whole channel, via ranged reads
    println!("\n=== Ranged Reads ===");
    let mut reader = FileRangeReader::new(scan_path)?;

    let (offset, length) = loaded_index.raster_byte_range(1)?;
    println!("Raster 1 occupies {} bytes at offset {}", length, offset);

    let raster = loaded_index.read_channel_raster(0, 1, &mut reader)?;
    println!("Channel 0, raster 1: {:?}", raster);

    let grid: Array2<u32> = loaded_index.read_channel(0, &mut reader)?;
    println!(
        "Channel 0 grid: {:?}, total counts {}",
        grid.dim(),
        grid.iter().map(|&v| v as u64).sum::<u64>()
    );

    println!("\nExample completed successfully!");
    println!("Check the generated files:");
    println!("  - {}", scan_path);
    println!("  - {}", index_path);

    Ok(())
}

fn create_sample_scan(path: &str) -> Result<(), ScanError> {
    let mut header = RasHeaderBlock::default();
    header.comments[0] = "index demo".to_string();
    header.file_name = "sample_for_indexing.ras".to_string();
    header.start_stamp = "Wed Jan 15 12:00:00 2020".to_string();
    header.stop_stamp = "Wed Jan 15 12:30:00 2020".to_string();
    header.channel_count = 2;
    header.num_points = 8;
    header.num_rasters = 4;

    // channel 0 ramps along the raster, channel 1 is a constant baseline
    let ramp = Array2::from_shape_fn((4, 8), |(raster, point)| (raster * 8 + point) as u32);
    let baseline = Array2::from_elem((4, 8), 100);

    write_scan_file(path, &header, &[ramp, baseline])
}
