use crate::domain::TableError;

/// Dropdown injected into a header cell.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterSelect {
    pub options: Vec<String>,
    pub selected: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HeaderCell {
    pub text: String,
    pub select: Option<FilterSelect>,
}

impl HeaderCell {
    pub fn new(text: impl Into<String>) -> Self {
        HeaderCell {
            text: text.into(),
            select: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub cells: Vec<String>,
    pub visible: bool,
}

impl Row {
    pub fn new(cells: Vec<String>) -> Self {
        Row {
            cells,
            visible: true,
        }
    }

    // Missing cells read as empty text.
    pub fn cell(&self, column: usize) -> &str {
        self.cells.get(column).map(|c| c.trim()).unwrap_or("")
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub caption: Option<String>,
    pub headers: Vec<HeaderCell>,
    pub rows: Vec<Row>,
}

impl Table {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Table {
            caption: None,
            headers: headers.into_iter().map(HeaderCell::new).collect(),
            rows: rows.into_iter().map(Row::new).collect(),
        }
    }

    pub fn ncolumns(&self) -> usize {
        self.headers.len()
    }

    pub fn check_column(&self, column: usize) -> Result<(), TableError> {
        if column < self.ncolumns() {
            Ok(())
        } else {
            Err(TableError::ColumnOutOfRange {
                column,
                columns: self.ncolumns(),
            })
        }
    }

    /// Trimmed texts of one column, in row order.
    pub fn column_values(&self, column: usize) -> Vec<&str> {
        self.rows.iter().map(|r| r.cell(column)).collect()
    }

    pub fn visible_rows(&self) -> impl Iterator<Item = &Row> {
        self.rows.iter().filter(|r| r.visible)
    }
}

/// In-memory mirror of a page holding at most one results table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    pub title: Option<String>,
    pub table: Option<Table>,
}

impl Document {
    pub fn with_table(table: Table) -> Self {
        Document {
            title: None,
            table: Some(table),
        }
    }
}
