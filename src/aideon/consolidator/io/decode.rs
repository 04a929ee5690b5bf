use std::io::Cursor;

use calamine::{Data, DataType, Range, Reader, open_workbook_auto_from_rs};
use chrono::{NaiveDate, NaiveDateTime};
use tracing::{debug, instrument};

use crate::aideon::consolidator::error::{ConsolidateError, DecodeError, Result};
use crate::aideon::consolidator::model::{CellValue, InputFile, SheetGrid, Workbook};

/// Sheet name given to the single table of a delimited text file.
pub const DELIMITED_SHEET: &str = "Sheet1";

const DELIMITED_EXTENSIONS: [&str; 3] = ["csv", "tsv", "txt"];
const SPREADSHEET_EXTENSIONS: [&str; 5] = ["xlsx", "xlsm", "xlsb", "xls", "ods"];
const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// Decodes an input file into its sheets.
///
/// Delimited text is recognised by extension; everything else goes through
/// spreadsheet format detection on the raw bytes. Files with an unknown
/// extension that are not a spreadsheet container are retried as comma
/// separated text when they are valid UTF-8.
#[instrument(level = "debug", skip_all, fields(file = %file.name, size = file.size))]
pub fn decode_workbook(file: &InputFile) -> Result<Workbook> {
    let extension = file.extension();
    let workbook = match extension.as_deref() {
        Some(ext) if DELIMITED_EXTENSIONS.contains(&ext) => {
            let delimiter = if ext == "tsv" { b'\t' } else { b',' };
            read_delimited(file, delimiter)?
        }
        Some(ext) if SPREADSHEET_EXTENSIONS.contains(&ext) => {
            read_spreadsheet(&file.bytes).map_err(|err| ConsolidateError::decode(&file.name, err))?
        }
        _ => match read_spreadsheet(&file.bytes) {
            Ok(workbook) => workbook,
            Err(err) if std::str::from_utf8(&file.bytes).is_ok() => {
                debug!(error = %err, "not a spreadsheet container, reading as delimited text");
                read_delimited(file, b',')?
            }
            Err(err) => {
                debug!(error = %err, "unrecognised file contents");
                return Err(ConsolidateError::decode(
                    &file.name,
                    DecodeError::UnsupportedFormat,
                ));
            }
        },
    };

    debug!(sheet_count = workbook.sheets.len(), "workbook decoded");
    Ok(workbook)
}

fn read_spreadsheet(bytes: &[u8]) -> std::result::Result<Workbook, calamine::Error> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))?;

    let mut sheets = Vec::new();
    for name in workbook.sheet_names() {
        let range = workbook.worksheet_range(&name)?;
        let rows = range_to_rows(&range);
        sheets.push(SheetGrid::new(name, rows));
    }

    Ok(Workbook { sheets })
}

/// Copies a used range into a grid anchored at column `A`.
fn range_to_rows(range: &Range<Data>) -> Vec<Vec<CellValue>> {
    let Some((_, start_col)) = range.start() else {
        return Vec::new();
    };
    let col_offset = start_col as usize;

    range
        .rows()
        .map(|row| {
            let mut cells = vec![CellValue::Empty; col_offset];
            cells.extend(row.iter().map(cell_value));
            cells
        })
        .collect()
}

fn cell_value(cell: &Data) -> CellValue {
    match cell {
        Data::Empty => CellValue::Empty,
        Data::String(value) => CellValue::Text(value.clone()),
        Data::Float(value) => CellValue::Number(*value),
        Data::Int(value) => CellValue::Number(*value as f64),
        Data::Bool(value) => CellValue::Bool(*value),
        Data::DateTime(_) | Data::DateTimeIso(_) => cell
            .as_datetime()
            .map(CellValue::DateTime)
            .unwrap_or_else(|| CellValue::Text(cell.to_string())),
        Data::DurationIso(value) => CellValue::Text(value.clone()),
        Data::Error(err) => CellValue::Text(err.to_string()),
    }
}

fn read_delimited(file: &InputFile, delimiter: u8) -> Result<Workbook> {
    let bytes: &[u8] = &file.bytes;
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(bytes);

    // Non UTF-8 bytes (legacy code page exports) are replaced, not rejected.
    let mut rows: Vec<Vec<CellValue>> = Vec::new();
    for record in reader.byte_records() {
        let record = record.map_err(|err| ConsolidateError::decode(&file.name, err))?;
        rows.push(
            record
                .iter()
                .map(|field| parse_field(&String::from_utf8_lossy(field)))
                .collect(),
        );
    }

    // Short lines are padded so the grid is rectangular.
    let width = rows.iter().map(Vec::len).max().unwrap_or(0);
    for row in &mut rows {
        row.resize(width, CellValue::Empty);
    }
    debug!(rows = rows.len(), width, "delimited text read");

    Ok(Workbook {
        sheets: vec![SheetGrid::new(DELIMITED_SHEET, rows)],
    })
}

/// Types a delimited text field the way a spreadsheet would on import.
fn parse_field(field: &str) -> CellValue {
    let trimmed = field.trim();
    if trimmed.is_empty() {
        return CellValue::Empty;
    }
    if trimmed.eq_ignore_ascii_case("true") {
        return CellValue::Bool(true);
    }
    if trimmed.eq_ignore_ascii_case("false") {
        return CellValue::Bool(false);
    }
    if let Some(number) = trimmed.parse::<f64>().ok().filter(|value| value.is_finite()) {
        return CellValue::Number(number);
    }
    if let Some(datetime) = parse_datetime(trimmed) {
        return CellValue::DateTime(datetime);
    }
    CellValue::Text(field.to_string())
}

fn parse_datetime(value: &str) -> Option<NaiveDateTime> {
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0);
    }
    ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
}
