use std::fs;
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDateTime};
use rust_xlsxwriter::{Color, Format, FormatAlign, FormatBorder, Workbook, Worksheet, XlsxError};
use tracing::{info, instrument};

use crate::aideon::consolidator::error::Result;
use crate::aideon::consolidator::model::{CellValue, ConsolidatedResult, OutputRows};
use crate::aideon::consolidator::strategy::{StrategyKind, record_columns};

/// MIME type of the generated download.
pub const XLSX_MIME_TYPE: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

const HEADER_FILL: u32 = 0xD9E1F2;
const DATE_FORMAT: &str = "yyyy-mm-dd hh:mm:ss";

/// Serialises a consolidated result into a single-sheet xlsx buffer.
///
/// An explicit header row is styled; record results get a plain header row
/// built from the union of their keys.
#[instrument(
    level = "info",
    skip_all,
    fields(kind = %result.kind, rows = result.summary.total_rows)
)]
pub fn serialize(result: &ConsolidatedResult) -> Result<Vec<u8>> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(result.kind.sheet_name())?;

    let date_format = Format::new().set_num_format(DATE_FORMAT);
    let mut first_data_row: u32 = 0;

    if let Some(header) = &result.header {
        let header_format = header_format();
        for (col_idx, label) in header.iter().enumerate() {
            worksheet.write_string_with_format(0, column(col_idx)?, label, &header_format)?;
        }
        first_data_row = 1;
    }

    match &result.rows {
        OutputRows::Sequences(rows) => {
            for (row_idx, row) in rows.iter().enumerate() {
                let row_num = data_row(first_data_row, row_idx)?;
                for (col_idx, cell) in row.iter().enumerate() {
                    write_cell(worksheet, row_num, column(col_idx)?, cell, &date_format)?;
                }
            }
        }
        OutputRows::Records(records) => {
            let columns = record_columns(records);
            for (col_idx, name) in columns.iter().enumerate() {
                worksheet.write_string(first_data_row, column(col_idx)?, name)?;
            }
            first_data_row += 1;

            for (row_idx, record) in records.iter().enumerate() {
                let row_num = data_row(first_data_row, row_idx)?;
                for (col_idx, name) in columns.iter().enumerate() {
                    if let Some(cell) = record.get(name) {
                        write_cell(worksheet, row_num, column(col_idx)?, cell, &date_format)?;
                    }
                }
            }
        }
    }

    worksheet.autofit();

    let buffer = workbook.save_to_buffer()?;
    info!(bytes = buffer.len(), "workbook serialised");
    Ok(buffer)
}

/// Serialises the result and writes it to the given path.
pub fn write_result(path: &Path, result: &ConsolidatedResult) -> Result<()> {
    let buffer = serialize(result)?;
    fs::write(path, buffer)?;
    Ok(())
}

/// File name offered for a download, e.g.
/// `consolidated_columns_20240301_093000_125.xlsx`.
pub fn download_file_name(kind: StrategyKind, timestamp: NaiveDateTime) -> String {
    format!(
        "consolidated_{}_{}.xlsx",
        kind.file_tag(),
        timestamp.format("%Y%m%d_%H%M%S_%3f")
    )
}

/// Saves a serialised buffer into `dir` under a timestamped download name.
#[instrument(level = "info", skip(dir, buffer), fields(dir = %dir.display(), bytes = buffer.len()))]
pub fn write_download(dir: &Path, buffer: &[u8], kind: StrategyKind) -> Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let path = dir.join(download_file_name(kind, Local::now().naive_local()));
    fs::write(&path, buffer)?;
    info!(path = %path.display(), mime = XLSX_MIME_TYPE, "download written");
    Ok(path)
}

fn header_format() -> Format {
    Format::new()
        .set_bold()
        .set_background_color(Color::RGB(HEADER_FILL))
        .set_border(FormatBorder::Thin)
        .set_align(FormatAlign::Center)
}

fn write_cell(
    worksheet: &mut Worksheet,
    row: u32,
    col: u16,
    cell: &CellValue,
    date_format: &Format,
) -> Result<()> {
    match cell {
        CellValue::Empty => {}
        CellValue::Text(value) => {
            worksheet.write_string(row, col, value)?;
        }
        CellValue::Number(value) => {
            worksheet.write_number(row, col, *value)?;
        }
        CellValue::Bool(value) => {
            worksheet.write_boolean(row, col, *value)?;
        }
        CellValue::DateTime(value) => {
            worksheet.write_datetime_with_format(row, col, value, date_format)?;
        }
    }
    Ok(())
}

fn data_row(first: u32, offset: usize) -> Result<u32> {
    u32::try_from(offset)
        .ok()
        .and_then(|offset| first.checked_add(offset))
        .ok_or_else(|| XlsxError::RowColumnLimitError.into())
}

fn column(index: usize) -> Result<u16> {
    u16::try_from(index).map_err(|_| XlsxError::RowColumnLimitError.into())
}
