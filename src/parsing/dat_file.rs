//! Parser for the text-based DAT scan format: a fixed sequence of header
//! sections followed by a whitespace-delimited numeric data block, one
//! grid cell per line.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use ndarray::Array2;

use crate::channels::{ChannelData, ChannelSelection, DecodeState};
use crate::error::ScanError;
use crate::progress::DecodeProgress;

/// Header sections of a DAT file, in the order the acquisition tool
/// writes them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    AbscissaCount,
    OrdinateCount,
    ChannelCount,
    ChannelLabels,
    Comments,
    CommentContent,
    AbscissaPointsHeader,
    AbscissaPoints,
    OrdinatePointsHeader,
    OrdinatePoints,
    EnergyPointsHeader,
    EnergyPoints,
    DataMarker,
}

impl Section {
    /// Sections allowed to follow this one, tried in order.
    fn successors(self) -> &'static [Section] {
        use Section::*;
        match self {
            AbscissaCount => &[OrdinateCount],
            OrdinateCount => &[ChannelCount],
            ChannelCount => &[ChannelLabels],
            ChannelLabels => &[Comments],
            Comments => &[CommentContent, AbscissaPointsHeader],
            CommentContent => &[CommentContent, AbscissaPointsHeader],
            AbscissaPointsHeader => &[AbscissaPoints],
            AbscissaPoints => &[OrdinatePointsHeader],
            OrdinatePointsHeader => &[OrdinatePoints],
            OrdinatePoints => &[EnergyPointsHeader],
            EnergyPointsHeader => &[EnergyPoints],
            EnergyPoints => &[DataMarker],
            DataMarker => &[],
        }
    }

    /// Tries this section's pattern against a trimmed header line,
    /// returning the captured text on a match.
    fn capture(self, line: &str) -> Option<&str> {
        use Section::*;
        match self {
            AbscissaCount => line.strip_prefix("Abscissa points:").map(str::trim),
            OrdinateCount => line.strip_prefix("Ordinate points:").map(str::trim),
            ChannelCount => line.strip_prefix("Channels:").map(str::trim),
            ChannelLabels => line.strip_prefix("Labels:").map(str::trim),
            Comments => (line == "Comments:").then_some(""),
            CommentContent => line
                .strip_prefix('*')
                .map(|rest| rest.strip_prefix(' ').unwrap_or(rest)),
            AbscissaPointsHeader => (line == "Abscissa points requested:").then_some(""),
            OrdinatePointsHeader => (line == "Ordinate points requested:").then_some(""),
            EnergyPointsHeader => (line == "Energy points requested:").then_some(""),
            AbscissaPoints | OrdinatePoints | EnergyPoints => Some(line),
            DataMarker => (line == "DATA").then_some(""),
        }
    }

    /// Human name of this section's pattern, used in parse errors.
    fn expected(self) -> &'static str {
        use Section::*;
        match self {
            AbscissaCount => r#""Abscissa points: <count>""#,
            OrdinateCount => r#""Ordinate points: <count>""#,
            ChannelCount => r#""Channels: <count>""#,
            ChannelLabels => r#""Labels: <names>""#,
            Comments => r#""Comments:""#,
            CommentContent => r#""* <comment>""#,
            AbscissaPointsHeader => r#""Abscissa points requested:""#,
            AbscissaPoints => "abscissa point list",
            OrdinatePointsHeader => r#""Ordinate points requested:""#,
            OrdinatePoints => "ordinate point list",
            EnergyPointsHeader => r#""Energy points requested:""#,
            EnergyPoints => "energy point value",
            DataMarker => r#""DATA""#,
        }
    }
}

fn expected_list(sections: &[Section]) -> String {
    sections
        .iter()
        .map(|section| section.expected())
        .collect::<Vec<_>>()
        .join(" or ")
}

struct HeaderDraft {
    x_size: usize,
    y_size: usize,
    channel_count: usize,
    labels: Vec<String>,
    comment_lines: Vec<String>,
    comments: String,
    abscissa: Vec<f64>,
    ordinate: Vec<f64>,
    energy: f64,
    /// 0-based index of the first line after the DATA marker.
    data_start: usize,
}

fn parse_header(text: &str) -> Result<HeaderDraft, ScanError> {
    let mut draft = HeaderDraft {
        x_size: 0,
        y_size: 0,
        channel_count: 0,
        labels: Vec::new(),
        comment_lines: Vec::new(),
        comments: String::new(),
        abscissa: Vec::new(),
        ordinate: Vec::new(),
        energy: 0.0,
        data_start: 0,
    };
    let mut successors: &'static [Section] = &[Section::AbscissaCount];

    for (i, raw) in text.lines().enumerate() {
        let line_no = i + 1;
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }

        let matched = successors
            .iter()
            .find_map(|&section| section.capture(line).map(|captured| (section, captured)));
        let Some((section, captured)) = matched else {
            return Err(ScanError::DatHeader {
                line: line_no,
                expected: expected_list(successors),
            });
        };

        match section {
            Section::AbscissaCount => draft.x_size = parse_count(captured, line_no)?,
            Section::OrdinateCount => draft.y_size = parse_count(captured, line_no)?,
            Section::ChannelCount => {
                draft.channel_count = parse_channel_count(captured, line_no)?;
            }
            Section::ChannelLabels => {
                draft.labels = captured.split_whitespace().map(str::to_string).collect();
                if draft.labels.len() != draft.channel_count {
                    return Err(ScanError::DatCountMismatch {
                        line: line_no,
                        section: "channel labels",
                        expected: draft.channel_count,
                        actual: draft.labels.len(),
                    });
                }
            }
            Section::Comments => draft.comment_lines.clear(),
            Section::CommentContent => draft.comment_lines.push(captured.to_string()),
            Section::AbscissaPointsHeader => draft.comments = draft.comment_lines.join("\n"),
            Section::AbscissaPoints => {
                draft.abscissa = parse_floats(captured, line_no)?;
                if draft.abscissa.len() != draft.x_size {
                    return Err(ScanError::DatCountMismatch {
                        line: line_no,
                        section: "abscissa points",
                        expected: draft.x_size,
                        actual: draft.abscissa.len(),
                    });
                }
            }
            Section::OrdinatePointsHeader => {}
            Section::OrdinatePoints => {
                draft.ordinate = parse_floats(captured, line_no)?;
                if draft.ordinate.len() != draft.y_size {
                    return Err(ScanError::DatCountMismatch {
                        line: line_no,
                        section: "ordinate points",
                        expected: draft.y_size,
                        actual: draft.ordinate.len(),
                    });
                }
            }
            Section::EnergyPointsHeader => {}
            Section::EnergyPoints => draft.energy = parse_float(captured, line_no)?,
            Section::DataMarker => {
                // Every grid cell needs its own data line holding one
                // token per channel, so a grid larger than the remaining
                // text is a header defect; the decode pass sizes its
                // buffers from these counts.
                let representable = draft
                    .x_size
                    .checked_mul(draft.y_size)
                    .and_then(|cells| cells.checked_mul(draft.channel_count.max(1)))
                    .is_some_and(|samples| samples <= text.len());
                if !representable {
                    let cells = draft.x_size.saturating_mul(draft.y_size);
                    return Err(ScanError::DatDimension {
                        line: line_no,
                        value: i64::try_from(cells).unwrap_or(i64::MAX),
                    });
                }
                draft.data_start = i + 1;
                return Ok(draft);
            }
        }
        successors = section.successors();
    }

    Err(ScanError::DatTruncatedHeader {
        expected: expected_list(successors),
    })
}

fn parse_count(token: &str, line: usize) -> Result<usize, ScanError> {
    let value: i64 = token.trim().parse().map_err(|_| ScanError::DatNumber {
        line,
        token: token.to_string(),
    })?;
    if value < 1 {
        return Err(ScanError::DatDimension { line, value });
    }
    Ok(value as usize)
}

fn parse_channel_count(token: &str, line: usize) -> Result<usize, ScanError> {
    let value: i64 = token.trim().parse().map_err(|_| ScanError::DatNumber {
        line,
        token: token.to_string(),
    })?;
    if value < 0 {
        return Err(ScanError::DatDimension { line, value });
    }
    Ok(value as usize)
}

fn parse_float(token: &str, line: usize) -> Result<f64, ScanError> {
    token.trim().parse().map_err(|_| ScanError::DatNumber {
        line,
        token: token.trim().to_string(),
    })
}

fn parse_floats(text: &str, line: usize) -> Result<Vec<f64>, ScanError> {
    text.split_whitespace()
        .map(|token| parse_float(token, line))
        .collect()
}

/// Cell addressing uses the exact bit pattern of each coordinate, with
/// negative zero folded onto zero. NaN coordinates never match.
fn coordinate_key(value: f64) -> Option<u64> {
    if value.is_nan() {
        return None;
    }
    let folded = if value == 0.0 { 0.0 } else { value };
    Some(folded.to_bits())
}

/// First occurrence wins when a coordinate value repeats.
fn coordinate_index(coordinates: &[f64]) -> HashMap<u64, usize> {
    let mut index = HashMap::with_capacity(coordinates.len());
    for (position, &value) in coordinates.iter().enumerate() {
        if let Some(key) = coordinate_key(value) {
            index.entry(key).or_insert(position);
        }
    }
    index
}

fn lookup(index: &HashMap<u64, usize>, value: f64) -> Option<usize> {
    coordinate_key(value).and_then(|key| index.get(&key).copied())
}

#[derive(Debug)]
pub struct DatFile {
    pub x_size: usize,
    pub y_size: usize,
    /// Channel labels from the header, in channel order.
    pub labels: Vec<String>,
    /// `*`-prefixed comment lines, joined with newlines.
    pub comments: String,
    /// Requested coordinate values per axis, in file order. Sortedness is
    /// not enforced; data rows address their cell by exact value match.
    pub abscissa: Vec<f64>,
    pub ordinate: Vec<f64>,
    pub energy: f64,
    pub channels: ChannelSelection,
    text: String,
    data_start: usize,
    source_name: Option<String>,
    data: DecodeState,
}

impl DatFile {
    /// Parse a DAT file from a given file path.
    ///
    /// Only the header is parsed here; the data block is decoded on first
    /// call to [`DatFile::load`] or [`DatFile::channel_data`].
    pub fn parse_from_file(path: &str) -> Result<Self, ScanError> {
        let text = fs::read_to_string(path)?;
        let source_name = Path::new(path)
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned());
        Self::parse(text, source_name)
    }

    /// Parse DAT content already held in memory.
    pub fn parse_from_text(text: String) -> Result<Self, ScanError> {
        Self::parse(text, None)
    }

    fn parse(text: String, source_name: Option<String>) -> Result<Self, ScanError> {
        let draft = parse_header(&text)?;

        let mut channels = ChannelSelection::all_enabled(draft.channel_count);
        for (index, label) in draft.labels.iter().enumerate() {
            channels.set_name(index, label);
        }

        Ok(Self {
            x_size: draft.x_size,
            y_size: draft.y_size,
            labels: draft.labels,
            comments: draft.comments,
            abscissa: draft.abscissa,
            ordinate: draft.ordinate,
            energy: draft.energy,
            channels,
            text,
            data_start: draft.data_start,
            source_name,
            data: DecodeState::Pending,
        })
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// File stem of the parsed path, if the file came from disk.
    pub fn source_name(&self) -> Option<&str> {
        self.source_name.as_deref()
    }

    /// True once the data block has been decoded.
    pub fn is_loaded(&self) -> bool {
        matches!(self.data, DecodeState::Ready(_))
    }

    /// Decoded grid of one channel, without triggering a decode.
    /// Returns `None` until [`DatFile::load`] has succeeded.
    pub fn loaded_channel_data(&self, index: usize) -> Option<&ChannelData> {
        match &self.data {
            DecodeState::Ready(buffers) => buffers.get(index),
            _ => None,
        }
    }

    /// Decoded grid of one channel, decoding the whole data block on
    /// first use.
    pub fn channel_data(
        &mut self,
        index: usize,
        progress: Option<&mut dyn DecodeProgress>,
    ) -> Result<&ChannelData, ScanError> {
        if index >= self.channels.len() {
            return Err(ScanError::ChannelIndex {
                index,
                count: self.channels.len(),
            });
        }
        self.load(progress)?;
        match &self.data {
            DecodeState::Ready(buffers) => Ok(&buffers[index]),
            _ => Err(ScanError::DecodePoisoned),
        }
    }

    /// Decodes the data block into one grid per channel.
    ///
    /// Each non-blank line holds one grid cell: ordinate coordinate,
    /// abscissa coordinate, then one sample per channel. Cells may appear
    /// in any order; a repeated cell overwrites the earlier value but
    /// still counts toward the expected total.
    ///
    /// Runs at most once; the result is only committed when the full pass
    /// finishes. An abort or error poisons the file, see
    /// [`ScanError::DecodePoisoned`].
    pub fn load(&mut self, mut progress: Option<&mut dyn DecodeProgress>) -> Result<(), ScanError> {
        match self.data {
            DecodeState::Ready(_) => return Ok(()),
            DecodeState::Poisoned => return Err(ScanError::DecodePoisoned),
            DecodeState::Pending => {}
        }
        self.data = DecodeState::Poisoned;

        let x = self.x_size;
        let y = self.y_size;
        let channel_count = self.channels.len();
        let total = x * y;

        if let Some(observer) = progress.as_deref_mut() {
            observer.on_start();
        }

        let abscissa_index = coordinate_index(&self.abscissa);
        let ordinate_index = coordinate_index(&self.ordinate);

        let mut buffers: Vec<Array2<f64>> =
            (0..channel_count).map(|_| Array2::zeros((y, x))).collect();
        let mut cells = 0usize;
        let mut last_reported: Option<u8> = None;

        for (i, raw) in self.text.lines().enumerate().skip(self.data_start) {
            let line_no = i + 1;
            let line = raw.trim();
            if line.is_empty() {
                continue;
            }

            let values = parse_floats(line, line_no)?;
            if values.len() < 2 || values.len() - 2 != channel_count {
                return Err(ScanError::DatCountMismatch {
                    line: line_no,
                    section: "data row samples",
                    expected: channel_count,
                    actual: values.len().saturating_sub(2),
                });
            }

            let row = lookup(&ordinate_index, values[0]).ok_or_else(|| {
                ScanError::DatCoordinate {
                    line: line_no,
                    axis: "ordinate",
                    value: values[0],
                }
            })?;
            let column = lookup(&abscissa_index, values[1]).ok_or_else(|| {
                ScanError::DatCoordinate {
                    line: line_no,
                    axis: "abscissa",
                    value: values[1],
                }
            })?;

            for (channel, buffer) in buffers.iter_mut().enumerate() {
                buffer[[row, column]] = values[channel + 2];
            }
            cells += 1;

            if let Some(observer) = progress.as_deref_mut() {
                let percent = (cells * 100 / total).min(100) as u8;
                if last_reported != Some(percent) {
                    last_reported = Some(percent);
                    if !observer.on_update(percent) {
                        return Err(ScanError::DecodeAborted);
                    }
                }
            }
        }

        if cells != total {
            return Err(ScanError::DatRowCount {
                expected: total,
                actual: cells,
            });
        }

        if let Some(observer) = progress.as_deref_mut() {
            observer.on_finish();
        }
        self.data = DecodeState::Ready(buffers.into_iter().map(ChannelData::Values).collect());
        Ok(())
    }
}
