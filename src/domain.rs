use std::cmp::Ordering;
use std::fmt;
use std::io::Error;

use derive_setters::Setters;
use polars::error::PolarsError;

pub const WILDCARD: &str = "All";
pub const DEFAULT_FILTERABLE_COLUMNS: [usize; 2] = [1, 2];

pub const HELP_TEXT: &str = "q quit | ←/→ column | ↑/↓ row | s sort | f/F next/prev filter value | r reset filters | ? help";

#[derive(Debug)]
pub enum TableError {
    IoError(Error),
    PolarsError(PolarsError),
    LoadingFailed(String),
    FileNotFound,
    PermissionDenied,
    UnknownFileType,
    InvalidArgument(String),
    ColumnOutOfRange { column: usize, columns: usize },
    NotFilterable(usize),
    NotSortable(usize),
    UnknownFilterValue { column: usize, value: String },
}

impl fmt::Display for TableError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TableError::IoError(e) => write!(f, "io error: {e}"),
            TableError::PolarsError(e) => write!(f, "polars error: {e}"),
            TableError::LoadingFailed(msg) => write!(f, "loading failed: {msg}"),
            TableError::FileNotFound => write!(f, "file not found"),
            TableError::PermissionDenied => write!(f, "permission denied"),
            TableError::UnknownFileType => write!(f, "unknown file type"),
            TableError::InvalidArgument(msg) => write!(f, "invalid argument: {msg}"),
            TableError::ColumnOutOfRange { column, columns } => {
                write!(f, "column {column} out of range, table has {columns} columns")
            }
            TableError::NotFilterable(column) => write!(f, "column {column} has no filter"),
            TableError::NotSortable(column) => write!(f, "column {column} is not sortable"),
            TableError::UnknownFilterValue { column, value } => {
                write!(f, "\"{value}\" is not an option of the filter on column {column}")
            }
        }
    }
}

impl std::error::Error for TableError {}

impl From<Error> for TableError {
    fn from(err: Error) -> Self {
        TableError::IoError(err)
    }
}

impl From<PolarsError> for TableError {
    fn from(err: PolarsError) -> Self {
        TableError::PolarsError(err)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    /// Direction for the next click on a column, given what it remembered.
    pub fn next(previous: Option<SortDirection>) -> SortDirection {
        match previous {
            Some(SortDirection::Ascending) => SortDirection::Descending,
            _ => SortDirection::Ascending,
        }
    }

    pub fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        }
    }

    pub fn arrow(self) -> &'static str {
        match self {
            SortDirection::Ascending => "▲",
            SortDirection::Descending => "▼",
        }
    }
}

/// How many columns keep a remembered sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum SortMemory {
    /// Sorting a column forgets every other column's direction.
    #[default]
    SingleColumn,
    /// Every column toggles independently.
    PerColumn,
}

#[derive(Debug, Clone, Setters)]
#[setters(prefix = "with_")]
pub struct TableConfig {
    pub filterable_columns: Vec<usize>,
    /// `None` makes every column sortable.
    pub sortable_columns: Option<Vec<usize>>,
    pub wildcard: String,
    pub sort_memory: SortMemory,
    pub event_poll_time: u64,
}

impl Default for TableConfig {
    fn default() -> Self {
        TableConfig {
            filterable_columns: DEFAULT_FILTERABLE_COLUMNS.to_vec(),
            sortable_columns: None,
            wildcard: WILDCARD.to_string(),
            sort_memory: SortMemory::SingleColumn,
            event_poll_time: 100,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    Quit,
    MoveLeft,
    MoveRight,
    MoveUp,
    MoveDown,
    Sort,
    SortColumn(usize),
    NextFilterValue,
    PrevFilterValue,
    SelectFilter(usize, String),
    ResetFilters,
    Help,
    Resize(usize, usize),
}
