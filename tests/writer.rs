use byteorder::{ByteOrder, LittleEndian};
use ndarray::{Array2, array};
use qscan_rs::blocks::ras_header::{HEADER_LEN, RasHeaderBlock};
use qscan_rs::channels::ChannelData;
use qscan_rs::error::ScanError;
use qscan_rs::parsing::ras_file::RasFile;
use qscan_rs::writer::{RasWriter, encode_scan};

fn header(x: i32, y: i32, channels: i32) -> RasHeaderBlock {
    let mut header = RasHeaderBlock::default();
    header.start_stamp = "Wed Jan 15 12:00:00 2020".to_string();
    header.stop_stamp = "Wed Jan 15 12:30:00 2020".to_string();
    header.channel_count = channels;
    header.num_points = x;
    header.num_rasters = y;
    header
}

#[test]
fn single_channel_layout_is_sequential() -> Result<(), ScanError> {
    let grid = array![[11u32, 12, 13], [21, 22, 23]];
    let bytes = encode_scan(&header(3, 2, 1), &[grid.clone()])?;

    // one channel means an identity slot mapping plus the pad word
    assert_eq!(bytes.len(), HEADER_LEN + 4 * (3 * 2 + 1));
    let mut words = vec![0u32; 7];
    LittleEndian::read_u32_into(&bytes[HEADER_LEN..], &mut words);
    assert_eq!(words, vec![11, 12, 13, 21, 22, 23, 0]);

    let mut scan = RasFile::parse_from_bytes(bytes)?;
    match scan.channel_data(0, None)? {
        ChannelData::Counts(decoded) => assert_eq!(decoded, &grid),
        other => panic!("unexpected {:?}", other),
    }
    Ok(())
}

#[test]
fn two_channel_layout_swaps_slots() -> Result<(), ScanError> {
    let first = array![[1u32, 2]];
    let second = array![[7u32, 8]];
    let bytes = encode_scan(&header(2, 1, 2), &[first, second])?;

    let mut words = vec![0u32; 5];
    LittleEndian::read_u32_into(&bytes[HEADER_LEN..], &mut words);
    // channel 0 lands in slot 1 and channel 1 in slot 0 of each point
    assert_eq!(words, vec![7, 1, 8, 2, 0]);
    Ok(())
}

#[test]
fn rejects_grid_count_mismatch() {
    let grid = Array2::<u32>::zeros((2, 3));
    match encode_scan(&header(3, 2, 2), &[grid]) {
        Err(ScanError::SerializationError(message)) => {
            assert!(message.contains("channel grids"));
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn rejects_grid_shape_mismatch() {
    let grid = Array2::<u32>::zeros((3, 2));
    match encode_scan(&header(3, 2, 1), &[grid]) {
        Err(ScanError::SerializationError(message)) => {
            assert!(message.contains("header geometry"));
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn rejects_bad_header_geometry() {
    match encode_scan(&header(3, 0, 1), &[]) {
        Err(ScanError::RasGeometry { y: 0, .. }) => {}
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn writer_tracks_bytes_written() -> Result<(), ScanError> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("tracked.ras");
    let grids = vec![Array2::<u32>::zeros((2, 3)), Array2::<u32>::zeros((2, 3))];

    let mut writer = RasWriter::new(path.to_str().unwrap())?;
    assert_eq!(writer.offset(), 0);
    writer.write_scan(&header(3, 2, 2), &grids)?;
    let expected = (HEADER_LEN + 4 * (3 * 2 * 2 + 1)) as u64;
    assert_eq!(writer.offset(), expected);
    writer.finalize()?;

    assert_eq!(std::fs::metadata(&path)?.len(), expected);
    Ok(())
}
