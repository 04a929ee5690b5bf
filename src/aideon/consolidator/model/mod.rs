use std::fmt;
use std::sync::Arc;

use chrono::NaiveDateTime;
use indexmap::IndexMap;
use serde::Serialize;
use uuid::Uuid;

use crate::aideon::consolidator::strategy::StrategyKind;

/// Identifier assigned to a queued file.
pub type FileId = Uuid;

/// Field added to every header-union record holding the origin file name.
pub const SOURCE_FILE_FIELD: &str = "source_file";

/// A single decoded cell value.
///
/// `Empty` stands in for the empty string: missing cells are always read as
/// `Empty` so grids keep a uniform shape.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CellValue {
    #[default]
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
    DateTime(NaiveDateTime),
}

impl CellValue {
    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Empty => Ok(()),
            CellValue::Text(value) => f.write_str(value),
            CellValue::Number(value) => write!(f, "{value}"),
            CellValue::Bool(value) => write!(f, "{value}"),
            CellValue::DateTime(value) => write!(f, "{}", value.format("%Y-%m-%d %H:%M:%S")),
        }
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::Text(value)
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Number(value)
    }
}

impl From<bool> for CellValue {
    fn from(value: bool) -> Self {
        CellValue::Bool(value)
    }
}

impl From<NaiveDateTime> for CellValue {
    fn from(value: NaiveDateTime) -> Self {
        CellValue::DateTime(value)
    }
}

/// A file selected by the user: display name plus its raw bytes.
///
/// The buffer is shared so snapshots of the queue stay cheap.
#[derive(Clone, Serialize)]
pub struct InputFile {
    pub name: String,
    pub size: u64,
    #[serde(skip)]
    pub bytes: Arc<[u8]>,
}

impl InputFile {
    pub fn new(name: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Self {
        let bytes = bytes.into();
        Self {
            name: name.into(),
            size: bytes.len() as u64,
            bytes,
        }
    }

    /// Lower-cased extension of the display name, if any.
    pub fn extension(&self) -> Option<String> {
        std::path::Path::new(&self.name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
    }
}

impl fmt::Debug for InputFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InputFile")
            .field("name", &self.name)
            .field("size", &self.size)
            .finish_non_exhaustive()
    }
}

/// Processing state of a queued file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileState {
    Pending,
    Processing,
    Completed,
    Error,
}

impl fmt::Display for FileState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            FileState::Pending => "pending",
            FileState::Processing => "processing",
            FileState::Completed => "completed",
            FileState::Error => "error",
        };
        f.pad(label)
    }
}

/// Status entry tracking one queued file.
#[derive(Debug, Clone, Serialize)]
pub struct FileEntry {
    pub id: FileId,
    #[serde(flatten)]
    pub file: InputFile,
    pub state: FileState,
    pub row_count: Option<usize>,
}

impl FileEntry {
    pub fn new(file: InputFile) -> Self {
        Self {
            id: Uuid::new_v4(),
            file,
            state: FileState::Pending,
            row_count: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.file.name
    }

    /// Resets the entry so it can take part in a new run.
    pub fn reset(&mut self) {
        self.state = FileState::Pending;
        self.row_count = None;
    }

    pub fn apply(&mut self, update: &StatusUpdate) {
        self.state = update.state;
        if update.row_count.is_some() {
            self.row_count = update.row_count;
        }
    }
}

/// Status change emitted by the engine while a run progresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusUpdate {
    pub id: FileId,
    pub state: FileState,
    pub row_count: Option<usize>,
}

/// One sheet of a decoded workbook.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SheetGrid {
    pub name: String,
    pub rows: Vec<Vec<CellValue>>,
}

impl SheetGrid {
    pub fn new(name: impl Into<String>, rows: Vec<Vec<CellValue>>) -> Self {
        Self {
            name: name.into(),
            rows,
        }
    }
}

/// Decoded form of one input file, sheets kept in declaration order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Workbook {
    pub sheets: Vec<SheetGrid>,
}

/// A header-union output row: column name to value, in insertion order.
pub type Record = IndexMap<String, CellValue>;

/// Rows produced by one run. The shape is fixed per run.
#[derive(Debug, Clone, PartialEq)]
pub enum OutputRows {
    Sequences(Vec<Vec<CellValue>>),
    Records(Vec<Record>),
}

impl OutputRows {
    pub fn len(&self) -> usize {
        match self {
            OutputRows::Sequences(rows) => rows.len(),
            OutputRows::Records(records) => records.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Counters describing a successful run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Summary {
    pub total_rows: usize,
    pub total_files: usize,
}

/// The complete dataset produced by one successful run.
#[derive(Debug, Clone, PartialEq)]
pub struct ConsolidatedResult {
    pub kind: StrategyKind,
    /// Explicit header row, only present for fixed-column extraction.
    pub header: Option<Vec<String>>,
    pub rows: OutputRows,
    pub summary: Summary,
}
