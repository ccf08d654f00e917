use ndarray::array;
use qscan_rs::channels::{ChannelData, ChannelSelection};
use qscan_rs::error::ScanError;

#[test]
fn definition_enables_and_renames() -> Result<(), ScanError> {
    let mut selection = ChannelSelection::all_enabled(4);
    selection.apply_definition("0 flux monitor\n2 pin-diode\n")?;

    let ch0 = selection.get(0).unwrap();
    assert!(ch0.enabled);
    assert_eq!(ch0.name, "flux monitor");

    // channels the file does not mention stay disabled
    assert!(!selection.get(1).unwrap().enabled);
    assert!(!selection.get(3).unwrap().enabled);

    let ch2 = selection.get(2).unwrap();
    assert!(ch2.enabled);
    assert_eq!(ch2.name, "pin-diode");

    let enabled: Vec<usize> = selection.enabled().map(|c| c.index).collect();
    assert_eq!(enabled, vec![0, 2]);
    Ok(())
}

#[test]
fn definition_skips_comments_and_blank_lines() -> Result<(), ScanError> {
    let mut selection = ChannelSelection::all_enabled(4);
    selection.apply_definition("# detector wiring as of autumn\n\n   \n1 detector\n")?;

    let enabled: Vec<usize> = selection.enabled().map(|c| c.index).collect();
    assert_eq!(enabled, vec![1]);
    assert_eq!(selection.get(1).unwrap().name, "detector");
    Ok(())
}

#[test]
fn definition_collapses_name_whitespace() -> Result<(), ScanError> {
    let mut selection = ChannelSelection::all_enabled(2);
    selection.apply_definition("1    pin   diode B\n")?;
    assert_eq!(selection.get(1).unwrap().name, "pin diode B");
    Ok(())
}

#[test]
fn definition_rejects_out_of_range_index() {
    let mut selection = ChannelSelection::all_enabled(4);
    match selection.apply_definition("0 ok\n7 beyond\n") {
        Err(ScanError::ChannelFileIndex { line, index, count }) => {
            assert_eq!(line, 2);
            assert_eq!(index, 7);
            assert_eq!(count, 4);
        }
        other => panic!("unexpected {:?}", other),
    }

    let mut selection = ChannelSelection::all_enabled(4);
    match selection.apply_definition("-1 negative\n") {
        Err(ScanError::ChannelFileIndex { index: -1, .. }) => {}
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn definition_rejects_duplicate_index() {
    let mut selection = ChannelSelection::all_enabled(4);
    match selection.apply_definition("0 first\n0 second\n") {
        Err(ScanError::ChannelFileDuplicate { line: 2, index: 0 }) => {}
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn definition_rejects_malformed_lines() {
    let mut selection = ChannelSelection::all_enabled(4);
    // an index without a name
    match selection.apply_definition("2\n") {
        Err(ScanError::ChannelFileSyntax { line: 1 }) => {}
        other => panic!("unexpected {:?}", other),
    }

    // a non-numeric index
    let mut selection = ChannelSelection::all_enabled(4);
    match selection.apply_definition("# ok\nx0 name\n") {
        Err(ScanError::ChannelFileSyntax { line: 2 }) => {}
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn counts_grid_statistics() {
    let data = ChannelData::Counts(array![[3u32, 9, 4], [1, 5, 8]]);
    assert_eq!(data.shape(), (2, 3));
    assert_eq!(data.min(), 1.0);
    assert_eq!(data.max(), 9.0);
    assert!(!data.is_empty());
    assert!(data.as_counts().is_some());
    assert!(data.as_values().is_none());

    let floats = data.to_f64();
    assert_eq!(floats[[0, 1]], 9.0);
}

#[test]
fn values_grid_statistics() {
    let data = ChannelData::Values(array![[-2.5, 0.0], [4.25, 1.0]]);
    assert_eq!(data.shape(), (2, 2));
    assert_eq!(data.min(), -2.5);
    assert_eq!(data.max(), 4.25);
    assert!(!data.is_empty());
    assert!(data.as_values().is_some());
    assert!(data.as_counts().is_none());
}

#[test]
fn constant_grid_counts_as_empty() {
    let flat = ChannelData::Counts(array![[7u32, 7], [7, 7]]);
    assert!(flat.is_empty());

    let zeros = ChannelData::Values(ndarray::Array2::zeros((3, 3)));
    assert!(zeros.is_empty());
}
