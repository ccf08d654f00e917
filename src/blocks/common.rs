use crate::error::ScanError;

/// Characters the RAS format treats as padding at the tail of a
/// fixed-width text field.
pub const FIELD_PADDING: &[char] = &['\t', '\r', '\n', ' ', '\0'];

/// Decodes one fixed-width ASCII text field.
///
/// `offset` is the absolute file offset of the field and is only used for
/// error reporting. Trailing padding characters are stripped; interior
/// whitespace is kept verbatim.
pub fn read_padded_str(
    bytes: &[u8],
    field: &'static str,
    offset: usize,
) -> Result<String, ScanError> {
    for (i, &b) in bytes.iter().enumerate() {
        if !b.is_ascii() {
            return Err(ScanError::RasFieldEncoding {
                field,
                offset: offset + i,
            });
        }
    }
    let text = String::from_utf8_lossy(bytes);
    Ok(text.trim_end_matches(FIELD_PADDING).to_string())
}

/// Encodes `value` into a fixed-width ASCII text field, padded with NUL
/// bytes. Values that do not fit the field, or that hold non-ASCII text,
/// are rejected rather than silently truncated.
pub fn write_padded_str(
    buffer: &mut Vec<u8>,
    value: &str,
    width: usize,
    field: &'static str,
) -> Result<(), ScanError> {
    if !value.is_ascii() || value.len() > width {
        return Err(ScanError::RasStringTooWide { field, width });
    }
    let start = buffer.len();
    buffer.extend_from_slice(value.as_bytes());
    buffer.resize(start + width, 0);
    Ok(())
}
