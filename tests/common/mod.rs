#![allow(dead_code)]

use aideon_consolidator::model::{CellValue, InputFile};
use chrono::{NaiveDate, NaiveDateTime};
use rust_xlsxwriter::{Format, Workbook};

pub fn text(value: &str) -> CellValue {
    CellValue::Text(value.to_string())
}

pub fn number(value: f64) -> CellValue {
    CellValue::Number(value)
}

pub fn texts(values: &[&str]) -> Vec<CellValue> {
    values.iter().map(|value| text(value)).collect()
}

pub fn date(year: i32, month: u32, day: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .expect("valid date")
}

/// `count` two-column rows tagged with the sheet name.
pub fn numbered_rows(sheet: &str, count: usize) -> Vec<Vec<CellValue>> {
    (0..count)
        .map(|idx| vec![text(&format!("{sheet}-{idx}")), number(idx as f64)])
        .collect()
}

/// Builds an in-memory xlsx file with the given sheets, written from `A1`.
pub fn xlsx_file(name: &str, sheets: &[(&str, Vec<Vec<CellValue>>)]) -> InputFile {
    xlsx_file_at(name, sheets, 0, 0)
}

/// Like [`xlsx_file`], but every sheet starts at the given row and column.
pub fn xlsx_file_at(
    name: &str,
    sheets: &[(&str, Vec<Vec<CellValue>>)],
    first_row: u32,
    first_col: u16,
) -> InputFile {
    let mut workbook = Workbook::new();
    let date_format = Format::new().set_num_format("yyyy-mm-dd");

    for (sheet_name, rows) in sheets {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(*sheet_name).expect("sheet name accepted");

        for (row_idx, row) in rows.iter().enumerate() {
            let row_num = first_row + row_idx as u32;
            for (col_idx, cell) in row.iter().enumerate() {
                let col_num = first_col + col_idx as u16;
                match cell {
                    CellValue::Empty => {}
                    CellValue::Text(value) => {
                        worksheet
                            .write_string(row_num, col_num, value)
                            .expect("string written");
                    }
                    CellValue::Number(value) => {
                        worksheet
                            .write_number(row_num, col_num, *value)
                            .expect("number written");
                    }
                    CellValue::Bool(value) => {
                        worksheet
                            .write_boolean(row_num, col_num, *value)
                            .expect("boolean written");
                    }
                    CellValue::DateTime(value) => {
                        worksheet
                            .write_datetime_with_format(row_num, col_num, value, &date_format)
                            .expect("date written");
                    }
                }
            }
        }
    }

    let bytes = workbook.save_to_buffer().expect("workbook saved");
    InputFile::new(name, bytes)
}

pub fn csv_file(name: &str, content: &str) -> InputFile {
    InputFile::new(name, content.as_bytes().to_vec())
}
