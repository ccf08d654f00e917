use qscan_rs::blocks::ras_header::{HEADER_LEN, MAGIC_PREFIX, RasHeaderBlock, SUPPORTED_VERSION};
use qscan_rs::error::ScanError;

fn sample_header() -> RasHeaderBlock {
    let mut header = RasHeaderBlock::default();
    header.pid = 4242;
    header.comments[0] = "beamline 7 fluorescence map".to_string();
    header.comments[2] = "sample 12b".to_string();
    header.motor_names = ["SampleX".to_string(), "SampleZ".to_string()];
    header.region_filename = "regions/r0042.reg".to_string();
    header.file_head = "/data/2014/run0042".to_string();
    header.file_name = "run0042.ras".to_string();
    header.start_stamp = "Mon Jul  7 10:21:32 2014".to_string();
    header.stop_stamp = "Mon Jul  7 10:43:17 2014".to_string();
    header.channel_count = 4;
    header.count_time = 0.5;
    header.sweep_count = 1;
    header.num_points = 64;
    header.num_rasters = 32;
    header.pixel_per_point = 1;
    header.scan_direction = 1;
    header.scan_type = 2;
    header.commands = [3, 1, 0, 7];
    header.offsets = [0.0, 1.5, -2.25, 0.0, 0.0, 100.0];
    header.run_number = 42;
    header
}

#[test]
fn header_roundtrip() -> Result<(), ScanError> {
    let header = sample_header();
    let bytes = header.to_bytes()?;
    assert_eq!(bytes.len(), HEADER_LEN);

    let parsed = RasHeaderBlock::from_bytes(&bytes)?;
    assert_eq!(parsed, header);
    Ok(())
}

#[test]
fn header_field_offsets() -> Result<(), ScanError> {
    let bytes = sample_header().to_bytes()?;

    // version string sits at the front, NUL padded to 80 bytes
    assert_eq!(&bytes[0..15], b"Raster Scan 1.0");
    assert_eq!(bytes[15], 0);

    // version number and pid follow the version string
    assert_eq!(&bytes[80..84], &SUPPORTED_VERSION.to_le_bytes());
    assert_eq!(&bytes[84..88], &4242u32.to_le_bytes());

    // fixed slots for geometry and the run number
    assert_eq!(&bytes[968..972], &4i32.to_le_bytes());
    assert_eq!(&bytes[976..984], &0.5f64.to_le_bytes());
    assert_eq!(&bytes[992..996], &64i32.to_le_bytes());
    assert_eq!(&bytes[996..1000], &32i32.to_le_bytes());
    assert_eq!(&bytes[1080..1084], &42i32.to_le_bytes());
    Ok(())
}

#[test]
fn header_too_short() {
    let err = RasHeaderBlock::from_bytes(&[0u8; 100]);
    match err {
        Err(ScanError::RasHeaderTooShort {
            actual, expected, ..
        }) => {
            assert_eq!(actual, 100);
            assert_eq!(expected, HEADER_LEN);
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn header_strips_trailing_padding() -> Result<(), ScanError> {
    let mut header = sample_header();
    header.comments[1] = "padded value \t\r\n".to_string();
    let bytes = header.to_bytes()?;
    let parsed = RasHeaderBlock::from_bytes(&bytes)?;
    // trailing whitespace merges with the NUL fill and is stripped
    assert_eq!(parsed.comments[1], "padded value");
    // interior whitespace survives
    assert_eq!(parsed.start_stamp, "Mon Jul  7 10:21:32 2014");
    Ok(())
}

#[test]
fn header_rejects_oversize_string() {
    let mut header = sample_header();
    header.motor_names[0] = "m".repeat(41);
    match header.to_bytes() {
        Err(ScanError::RasStringTooWide { field, width }) => {
            assert_eq!(field, "motor name");
            assert_eq!(width, 40);
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn header_rejects_non_ascii_string() {
    let mut header = sample_header();
    header.file_name = "führung.ras".to_string();
    assert!(matches!(
        header.to_bytes(),
        Err(ScanError::RasStringTooWide { .. })
    ));
}

#[test]
fn header_rejects_non_ascii_bytes_on_decode() -> Result<(), ScanError> {
    let mut bytes = sample_header().to_bytes()?;
    bytes[90] = 0xFF; // inside the first comment field
    match RasHeaderBlock::from_bytes(&bytes) {
        Err(ScanError::RasFieldEncoding { field, offset }) => {
            assert_eq!(field, "comment");
            assert_eq!(offset, 90);
        }
        other => panic!("unexpected {:?}", other),
    }
    Ok(())
}

#[test]
fn default_header_is_supported() {
    let header = RasHeaderBlock::default();
    assert!(header.version.starts_with(MAGIC_PREFIX));
    assert_eq!(header.version_number, SUPPORTED_VERSION);
}
