use std::collections::HashSet;
use std::fmt;

use indexmap::IndexSet;
use serde::Serialize;

use crate::aideon::consolidator::error::{ConsolidateError, Result};
use crate::aideon::consolidator::model::{CellValue, Record, SOURCE_FILE_FIELD, SheetGrid};

/// Label of the reserved trailing column of fixed-column extraction.
pub const COMMENTS_LABEL: &str = "Comments";
/// Column positions kept by default: C, D and H through O.
pub const DEFAULT_POSITIONS: [usize; 10] = [2, 3, 7, 8, 9, 10, 11, 12, 13, 14];
/// Label given to blank header cells.
pub const EMPTY_HEADER: &str = "__EMPTY";

/// Discriminant of [`Strategy`], carried by the result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum StrategyKind {
    FixedColumns,
    Positional,
    HeaderUnion,
}

impl StrategyKind {
    /// Tag embedded in the download file name.
    pub fn file_tag(&self) -> &'static str {
        match self {
            StrategyKind::FixedColumns => "columns",
            StrategyKind::Positional => "sheets",
            StrategyKind::HeaderUnion => "records",
        }
    }

    /// Name of the single sheet of the output workbook.
    pub fn sheet_name(&self) -> &'static str {
        match self {
            StrategyKind::FixedColumns | StrategyKind::Positional => "Consolidated",
            StrategyKind::HeaderUnion => "Consolidated Data",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            StrategyKind::FixedColumns => "fixed-columns",
            StrategyKind::Positional => "positional",
            StrategyKind::HeaderUnion => "header-union",
        };
        f.write_str(label)
    }
}

/// Row transform policy selected once per run.
#[derive(Debug, Clone, PartialEq)]
pub enum Strategy {
    /// Keep only the selected columns, plus an empty "Comments" column.
    FixedColumns(ColumnSelection),
    /// Keep every column and append the file and sheet names.
    Positional,
    /// Key every row by its sheet's header row.
    HeaderUnion,
}

impl Strategy {
    pub fn kind(&self) -> StrategyKind {
        match self {
            Strategy::FixedColumns(_) => StrategyKind::FixedColumns,
            Strategy::Positional => StrategyKind::Positional,
            Strategy::HeaderUnion => StrategyKind::HeaderUnion,
        }
    }
}

/// Ordered column positions to extract together with their output labels.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnSelection {
    positions: Vec<usize>,
    labels: Vec<String>,
}

impl ColumnSelection {
    /// Builds a selection; there must be one label per position.
    pub fn new(positions: Vec<usize>, labels: Vec<String>) -> Result<Self> {
        if positions.is_empty() {
            return Err(ConsolidateError::InvalidColumns(
                "at least one column is required".into(),
            ));
        }
        if positions.len() != labels.len() {
            return Err(ConsolidateError::InvalidColumns(format!(
                "{} columns but {} labels",
                positions.len(),
                labels.len()
            )));
        }
        Ok(Self { positions, labels })
    }

    /// Builds a selection labelled with the spreadsheet letters of each column.
    pub fn from_positions(positions: Vec<usize>) -> Result<Self> {
        let labels = positions.iter().map(|&index| column_letter(index)).collect();
        Self::new(positions, labels)
    }

    /// Parses a comma separated list of column letters and letter ranges,
    /// e.g. `C,D,H:O`.
    pub fn parse(spec: &str, labels: Option<Vec<String>>) -> Result<Self> {
        let positions = parse_column_spec(spec)?;
        match labels {
            Some(labels) => Self::new(positions, labels),
            None => Self::from_positions(positions),
        }
    }

    pub fn positions(&self) -> &[usize] {
        &self.positions
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Output header: the labels followed by the reserved comments column.
    pub fn header(&self) -> Vec<String> {
        let mut header = self.labels.clone();
        header.push(COMMENTS_LABEL.to_string());
        header
    }

    /// Picks the selected cells out of `row`; absent cells become empty.
    pub fn extract(&self, row: &[CellValue]) -> Vec<CellValue> {
        let mut output: Vec<CellValue> = self
            .positions
            .iter()
            .map(|&index| row.get(index).cloned().unwrap_or_default())
            .collect();
        output.push(CellValue::Empty);
        output
    }
}

impl Default for ColumnSelection {
    fn default() -> Self {
        let positions = DEFAULT_POSITIONS.to_vec();
        let labels = positions.iter().map(|&index| column_letter(index)).collect();
        Self { positions, labels }
    }
}

/// Appends the origin file and sheet names to a row.
pub fn tag_row(row: &[CellValue], file_name: &str, sheet_name: &str) -> Vec<CellValue> {
    let mut output = Vec::with_capacity(row.len() + 2);
    output.extend_from_slice(row);
    output.push(CellValue::Text(file_name.to_string()));
    output.push(CellValue::Text(sheet_name.to_string()));
    output
}

/// Converts a sheet into records keyed by its first row.
///
/// Empty and missing cells are left out of the record. Every record carries
/// the origin file name under [`SOURCE_FILE_FIELD`].
pub fn sheet_records(sheet: &SheetGrid, file_name: &str) -> Vec<Record> {
    let Some((header_row, data_rows)) = sheet.rows.split_first() else {
        return Vec::new();
    };

    let width = sheet.rows.iter().map(Vec::len).max().unwrap_or(0);
    let labels = header_labels(header_row, width);

    data_rows
        .iter()
        .map(|row| {
            let mut record = Record::new();
            for (label, cell) in labels.iter().zip(row) {
                if !cell.is_empty() {
                    record.insert(label.clone(), cell.clone());
                }
            }
            record.insert(
                SOURCE_FILE_FIELD.to_string(),
                CellValue::Text(file_name.to_string()),
            );
            record
        })
        .collect()
}

/// Turns a header row into distinct labels, padded out to `width`.
///
/// Blank headers become `__EMPTY`, repeats get a numeric suffix
/// (`Name`, `Name_1`, `Name_2`).
pub fn header_labels(header_row: &[CellValue], width: usize) -> Vec<String> {
    let width = width.max(header_row.len());
    let mut seen: HashSet<String> = HashSet::with_capacity(width);
    let mut labels = Vec::with_capacity(width);

    for index in 0..width {
        let raw = match header_row.get(index) {
            Some(cell) if !cell.is_empty() => cell.to_string(),
            _ => EMPTY_HEADER.to_string(),
        };

        let mut label = raw.clone();
        let mut suffix = 0;
        while seen.contains(&label) {
            suffix += 1;
            label = format!("{raw}_{suffix}");
        }
        seen.insert(label.clone());
        labels.push(label);
    }

    labels
}

/// Output columns for a set of records.
///
/// The first record fixes the initial order; keys first seen later are
/// appended in the order they appear.
pub fn record_columns(records: &[Record]) -> Vec<String> {
    let mut columns: IndexSet<&str> = IndexSet::new();
    for record in records {
        for key in record.keys() {
            columns.insert(key.as_str());
        }
    }
    columns.into_iter().map(str::to_string).collect()
}

/// Zero-based column index to spreadsheet letters (`0` → `A`, `26` → `AA`).
pub fn column_letter(index: usize) -> String {
    let mut letters = Vec::new();
    let mut remaining = index + 1;
    while remaining > 0 {
        let rem = (remaining - 1) % 26;
        letters.push(b'A' + rem as u8);
        remaining = (remaining - 1) / 26;
    }
    letters.reverse();
    String::from_utf8_lossy(&letters).into_owned()
}

/// Spreadsheet letters to a zero-based column index, case-insensitive.
pub fn column_index(letters: &str) -> Option<usize> {
    if letters.is_empty() {
        return None;
    }
    let mut index: usize = 0;
    for ch in letters.chars() {
        if !ch.is_ascii_alphabetic() {
            return None;
        }
        let digit = (ch.to_ascii_uppercase() as u8 - b'A') as usize + 1;
        index = index.checked_mul(26)?.checked_add(digit)?;
    }
    Some(index - 1)
}

fn parse_column_spec(spec: &str) -> Result<Vec<usize>> {
    let mut positions = Vec::new();

    for part in spec.split(',').map(str::trim).filter(|part| !part.is_empty()) {
        match part.split_once(':') {
            Some((start, end)) => {
                let start = parse_letter(start)?;
                let end = parse_letter(end)?;
                if start > end {
                    return Err(ConsolidateError::InvalidColumns(format!(
                        "range '{part}' runs backwards"
                    )));
                }
                positions.extend(start..=end);
            }
            None => positions.push(parse_letter(part)?),
        }
    }

    if positions.is_empty() {
        return Err(ConsolidateError::InvalidColumns(
            "at least one column is required".into(),
        ));
    }
    Ok(positions)
}

fn parse_letter(letters: &str) -> Result<usize> {
    column_index(letters.trim())
        .ok_or_else(|| ConsolidateError::InvalidColumns(format!("'{letters}' is not a column")))
}
