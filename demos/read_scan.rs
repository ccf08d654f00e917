//! Opens a scan file given on the command line, decodes it with a
//! progress printer and reports per-channel statistics.

use qscan_rs::api::scan::ScanFile;
use qscan_rs::error::ScanError;
use qscan_rs::progress::DecodeProgress;

struct PrintProgress;

impl DecodeProgress for PrintProgress {
    fn on_start(&mut self) {
        println!("Decoding sample block...");
    }

    fn on_update(&mut self, percent: u8) -> bool {
        if percent % 20 == 0 {
            println!("  {}%", percent);
        }
        true
    }

    fn on_finish(&mut self) {
        println!("  done");
    }
}

fn main() -> Result<(), ScanError> {
    let mut args = std::env::args().skip(1);
    let Some(path) = args.next() else {
        eprintln!("usage: read_scan <file.ras|file.dat> [channels.txt]");
        std::process::exit(2);
    };
    let channel_file = args.next();

    let mut scan = match channel_file {
        Some(ref channels) => ScanFile::from_file_with_channels(&path, channels)?,
        None => ScanFile::from_file(&path)?,
    };

    println!("File: {}", path);
    println!("Kind: {:?}", scan.kind());
    println!(
        "Size: {} x {} points, {} channels",
        scan.x_size(),
        scan.y_size(),
        scan.channel_count()
    );
    if let Some(start) = scan.start_time() {
        println!("Start: {}", start);
    }
    if let Some(energy) = scan.energy() {
        println!("Energy: {}", energy);
    }
    if !scan.comments().is_empty() {
        println!("Comments:\n{}", scan.comments());
    }

    let mut progress = PrintProgress;
    scan.load(Some(&mut progress))?;

    println!("\nChannels:");
    for index in 0..scan.channel_count() {
        let channel = scan.channel(index)?;
        let marker = if channel.enabled() { " " } else { "-" };
        let note = if channel.is_empty() { " (empty)" } else { "" };
        println!(
            "{} {:2} {:<16} min {:>12} max {:>12}{}",
            marker,
            channel.index(),
            channel.name(),
            channel.min(),
            channel.max(),
            note
        );
    }

    Ok(())
}
