use ndarray::Array2;
use qscan_rs::blocks::ras_header::{HEADER_LEN, RasHeaderBlock};
use qscan_rs::channels::ChannelData;
use qscan_rs::error::ScanError;
use qscan_rs::index::{ByteRangeReader, FileRangeReader, ScanIndex};
use qscan_rs::parsing::ras_file::RasFile;
use qscan_rs::writer::write_scan_file;

const X: usize = 4;
const Y: usize = 3;
const CHANNELS: usize = 3;

fn scan_header() -> RasHeaderBlock {
    let mut header = RasHeaderBlock::default();
    header.file_name = "indexed.ras".to_string();
    header.start_stamp = "Tue Mar 03 08:00:00 2015".to_string();
    header.stop_stamp = "Tue Mar 03 08:05:00 2015".to_string();
    header.channel_count = CHANNELS as i32;
    header.num_points = X as i32;
    header.num_rasters = Y as i32;
    header
}

fn sample_grids() -> Vec<Array2<u32>> {
    (0..CHANNELS)
        .map(|channel| {
            Array2::from_shape_fn((Y, X), |(raster, point)| {
                (channel * 100 + raster * 10 + point) as u32
            })
        })
        .collect()
}

/// Range reader that always comes back one word short.
struct ShortReader;

impl ByteRangeReader for ShortReader {
    type Error = ScanError;

    fn read_range(&mut self, _offset: u64, length: u64) -> Result<Vec<u8>, ScanError> {
        Ok(vec![0u8; (length as usize).saturating_sub(4)])
    }
}

#[test]
fn index_matches_parsed_scan() -> Result<(), ScanError> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("indexed.ras");
    let path = path.to_str().unwrap();
    write_scan_file(path, &scan_header(), &sample_grids())?;

    let index = ScanIndex::from_file(path)?;
    assert_eq!(index.x_size, X);
    assert_eq!(index.y_size, Y);
    assert_eq!(index.channel_count, CHANNELS);
    assert_eq!(index.data_offset, HEADER_LEN as u64);
    assert_eq!(
        index.file_size,
        (HEADER_LEN + 4 * (X * Y * CHANNELS + 1)) as u64
    );

    let channels = index.list_channels();
    assert_eq!(
        channels,
        vec![(0, "I0", true), (1, "I1", true), (2, "I2", true)]
    );
    assert_eq!(index.get_channel_info(1).unwrap().name, "I1");
    assert!(index.get_channel_info(CHANNELS).is_none());
    Ok(())
}

#[test]
fn index_roundtrips_through_json() -> Result<(), ScanError> {
    let dir = tempfile::tempdir()?;
    let scan_path = dir.path().join("indexed.ras");
    let scan_path = scan_path.to_str().unwrap();
    let json_path = dir.path().join("indexed.json");
    let json_path = json_path.to_str().unwrap();

    write_scan_file(scan_path, &scan_header(), &sample_grids())?;
    let index = ScanIndex::from_file(scan_path)?;
    index.save_to_file(json_path)?;

    let loaded = ScanIndex::load_from_file(json_path)?;
    assert_eq!(loaded.file_size, index.file_size);
    assert_eq!(loaded.x_size, index.x_size);
    assert_eq!(loaded.y_size, index.y_size);
    assert_eq!(loaded.channel_count, index.channel_count);
    assert_eq!(loaded.data_offset, index.data_offset);
    assert_eq!(loaded.list_channels(), index.list_channels());
    Ok(())
}

#[test]
fn ranged_reads_match_full_decode() -> Result<(), ScanError> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("indexed.ras");
    let path = path.to_str().unwrap();
    write_scan_file(path, &scan_header(), &sample_grids())?;

    let index = ScanIndex::from_file(path)?;
    let mut scan = RasFile::parse_from_file(path)?;
    scan.load(None)?;

    let mut reader = FileRangeReader::new(path)?;
    for channel in 0..CHANNELS {
        let ranged = index.read_channel(channel, &mut reader)?;
        match scan.loaded_channel_data(channel) {
            Some(ChannelData::Counts(full)) => assert_eq!(&ranged, full),
            other => panic!("unexpected {:?}", other),
        }
    }
    Ok(())
}

#[test]
fn writer_reads_back_to_the_same_grids() -> Result<(), ScanError> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("indexed.ras");
    let path = path.to_str().unwrap();
    let grids = sample_grids();
    write_scan_file(path, &scan_header(), &grids)?;

    let mut scan = RasFile::parse_from_file(path)?;
    scan.load(None)?;
    for (channel, grid) in grids.iter().enumerate() {
        match scan.loaded_channel_data(channel) {
            Some(ChannelData::Counts(decoded)) => assert_eq!(decoded, grid),
            other => panic!("unexpected {:?}", other),
        }
    }
    Ok(())
}

#[test]
fn raster_byte_range_bounds() -> Result<(), ScanError> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("indexed.ras");
    let path = path.to_str().unwrap();
    write_scan_file(path, &scan_header(), &sample_grids())?;
    let index = ScanIndex::from_file(path)?;

    let bytes_per_raster = (X * CHANNELS * 4) as u64;
    assert_eq!(
        index.raster_byte_range(0)?,
        (HEADER_LEN as u64, bytes_per_raster)
    );
    assert_eq!(
        index.raster_byte_range(2)?,
        (HEADER_LEN as u64 + 2 * bytes_per_raster, bytes_per_raster)
    );

    match index.raster_byte_range(Y) {
        Err(ScanError::SerializationError(message)) => {
            assert!(message.contains("Invalid raster index"));
        }
        other => panic!("unexpected {:?}", other),
    }
    Ok(())
}

#[test]
fn ranged_read_validates_channel_and_length() -> Result<(), ScanError> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("indexed.ras");
    let path = path.to_str().unwrap();
    write_scan_file(path, &scan_header(), &sample_grids())?;
    let index = ScanIndex::from_file(path)?;

    let mut reader = FileRangeReader::new(path)?;
    match index.read_channel_raster(CHANNELS, 0, &mut reader) {
        Err(ScanError::ChannelIndex { index: 3, count: 3 }) => {}
        other => panic!("unexpected {:?}", other),
    }

    let mut short = ShortReader;
    match index.read_channel_raster(0, 0, &mut short) {
        Err(ScanError::SerializationError(message)) => {
            assert!(message.contains("expected"));
        }
        other => panic!("unexpected {:?}", other),
    }
    Ok(())
}
