use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, error, info, instrument, warn};

use crate::aideon::consolidator::error::{ConsolidateError, Result};
use crate::aideon::consolidator::io::decode::decode_workbook;
use crate::aideon::consolidator::model::{
    CellValue, ConsolidatedResult, FileEntry, FileState, OutputRows, Record, SheetGrid,
    StatusUpdate, Summary,
};
use crate::aideon::consolidator::strategy::{Strategy, sheet_records, tag_row};

/// Runs consolidations, one at a time.
///
/// A second call made while a run is in flight, whether from another thread
/// or from inside a status callback, fails with
/// [`ConsolidateError::AlreadyRunning`].
#[derive(Debug, Default)]
pub struct Consolidator {
    running: AtomicBool,
}

impl Consolidator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Consolidates every sheet of every file, in queue order.
    ///
    /// `on_status` receives `processing` before a file is decoded and
    /// `completed` with the file's row count once its sheets are consumed. A
    /// file that fails to decode is reported as `error` and aborts the run.
    #[instrument(
        level = "info",
        skip_all,
        fields(strategy = %strategy.kind(), file_count = files.len())
    )]
    pub fn consolidate<F>(
        &self,
        files: &[FileEntry],
        strategy: &Strategy,
        mut on_status: F,
    ) -> Result<ConsolidatedResult>
    where
        F: FnMut(StatusUpdate),
    {
        let _guard = RunGuard::acquire(&self.running)?;

        let (rows, header, summary) = match strategy {
            Strategy::FixedColumns(selection) => {
                let (rows, summary) = collect_rows(
                    files,
                    &mut on_status,
                    |sheet: &SheetGrid, _file: &str, out: &mut Vec<Vec<CellValue>>| {
                        out.extend(sheet.rows.iter().map(|row| selection.extract(row)));
                    },
                )?;
                (OutputRows::Sequences(rows), Some(selection.header()), summary)
            }
            Strategy::Positional => {
                let (rows, summary) = collect_rows(
                    files,
                    &mut on_status,
                    |sheet: &SheetGrid, file: &str, out: &mut Vec<Vec<CellValue>>| {
                        out.extend(sheet.rows.iter().map(|row| tag_row(row, file, &sheet.name)));
                    },
                )?;
                (OutputRows::Sequences(rows), None, summary)
            }
            Strategy::HeaderUnion => {
                let (records, summary) = collect_rows(
                    files,
                    &mut on_status,
                    |sheet: &SheetGrid, file: &str, out: &mut Vec<Record>| {
                        out.extend(sheet_records(sheet, file));
                    },
                )?;
                (OutputRows::Records(records), None, summary)
            }
        };

        if summary.total_rows == 0 {
            warn!(file_count = summary.total_files, "no data rows produced");
            return Err(ConsolidateError::NoData);
        }

        info!(
            total_rows = summary.total_rows,
            total_files = summary.total_files,
            "consolidation finished"
        );

        Ok(ConsolidatedResult {
            kind: strategy.kind(),
            header,
            rows,
            summary,
        })
    }
}

/// Shared file and sheet iteration; `transform` appends the output rows of
/// one sheet.
fn collect_rows<T, F, S>(
    files: &[FileEntry],
    on_status: &mut F,
    mut transform: S,
) -> Result<(Vec<T>, Summary)>
where
    F: FnMut(StatusUpdate),
    S: FnMut(&SheetGrid, &str, &mut Vec<T>),
{
    let mut rows: Vec<T> = Vec::new();

    for entry in files {
        on_status(StatusUpdate {
            id: entry.id,
            state: FileState::Processing,
            row_count: None,
        });

        let workbook = match decode_workbook(&entry.file) {
            Ok(workbook) => workbook,
            Err(err) => {
                error!(file = entry.name(), error = %err, "failed to decode file");
                on_status(StatusUpdate {
                    id: entry.id,
                    state: FileState::Error,
                    row_count: None,
                });
                return Err(err);
            }
        };

        let file_start = rows.len();
        for sheet in &workbook.sheets {
            let sheet_start = rows.len();
            transform(sheet, entry.name(), &mut rows);
            debug!(
                file = entry.name(),
                sheet = %sheet.name,
                rows = rows.len() - sheet_start,
                "sheet consumed"
            );
        }

        let row_count = rows.len() - file_start;
        info!(file = entry.name(), row_count, "file processed");
        on_status(StatusUpdate {
            id: entry.id,
            state: FileState::Completed,
            row_count: Some(row_count),
        });
    }

    let summary = Summary {
        total_rows: rows.len(),
        total_files: files.len(),
    };
    Ok((rows, summary))
}

/// Holds the running flag for the duration of one run.
struct RunGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> RunGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Result<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| ConsolidateError::AlreadyRunning)?;
        Ok(Self { flag })
    }
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}
