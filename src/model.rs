use std::time::Instant;

use tracing::{debug, info, trace, warn};

use crate::domain::{HELP_TEXT, Message, SortDirection, TableConfig, TableError};
use crate::filter::FilterController;
use crate::sort::SortController;
use crate::table::{Document, Table};

const NO_TABLE: &str = "No table in document";

#[derive(Debug, PartialEq)]
pub enum Status {
    READY,
    QUITTING,
}

/// Owns the document and the controllers attached to its table.
///
/// Both controllers live exactly as long as the model: created in [`Model::init`],
/// mutated by every message and dropped with it.
pub struct Model {
    pub status: Status,
    doc: Document,
    filters: Option<FilterController>,
    sorter: SortController,
    selected_column: usize,
    selected_row: usize,
    width: usize,
    height: usize,
    status_message: String,
    last_status_message_update: Instant,
}

impl Model {
    pub fn init(mut doc: Document, config: &TableConfig) -> Result<Self, TableError> {
        let filters = FilterController::setup(&mut doc, config)?;
        let status_message = match &doc.table {
            Some(t) => format!("{} rows, {} columns", t.rows.len(), t.ncolumns()),
            None => NO_TABLE.to_string(),
        };
        info!("{}", status_message);
        if let Some(f) = &filters {
            debug!("Filters on columns {:?}", f.columns().collect::<Vec<_>>());
        }
        Ok(Self {
            status: Status::READY,
            doc,
            filters,
            sorter: SortController::new(config),
            selected_column: 0,
            selected_row: 0,
            width: 0,
            height: 0,
            status_message,
            last_status_message_update: Instant::now(),
        })
    }

    pub fn document(&self) -> &Document {
        &self.doc
    }

    pub fn table(&self) -> Option<&Table> {
        self.doc.table.as_ref()
    }

    pub fn filters(&self) -> Option<&FilterController> {
        self.filters.as_ref()
    }

    pub fn sort_direction(&self, column: usize) -> Option<SortDirection> {
        self.sorter.direction(column)
    }

    pub fn selected_column(&self) -> usize {
        self.selected_column
    }

    pub fn selected_row(&self) -> usize {
        self.selected_row
    }

    pub fn status_message(&self) -> &str {
        &self.status_message
    }

    pub fn last_status_message_update(&self) -> Instant {
        self.last_status_message_update
    }

    fn set_status_message(&mut self, message: impl Into<String>) {
        self.status_message = message.into();
        self.last_status_message_update = Instant::now();
    }

    fn table_and_filters(&mut self) -> Option<(&mut Table, &mut FilterController)> {
        match (self.doc.table.as_mut(), self.filters.as_mut()) {
            (Some(table), Some(filters)) => Some((table, filters)),
            _ => None,
        }
    }

    // A page without a table loaded fine, so table operations on it do nothing.
    fn no_table(&mut self) {
        debug!("Document has no table, ignoring table operation");
        self.set_status_message(NO_TABLE);
    }

    fn nvisible(&self) -> usize {
        self.table().map(|t| t.visible_rows().count()).unwrap_or(0)
    }

    /// Returns `None` when the document has no table.
    pub fn sort_column(&mut self, column: usize) -> Result<Option<SortDirection>, TableError> {
        let Some(table) = self.doc.table.as_mut() else {
            self.no_table();
            return Ok(None);
        };
        let direction = self.sorter.sort(table, column)?;
        let name = table.headers[column].text.clone();
        self.set_status_message(format!("Sorted by {} {}", name, direction.arrow()));
        Ok(Some(direction))
    }

    pub fn select_filter(&mut self, column: usize, value: &str) -> Result<(), TableError> {
        let Some((table, filters)) = self.table_and_filters() else {
            self.no_table();
            return Ok(());
        };
        filters.select(table, column, value)?;
        self.clamp_selected_row();
        self.set_status_message(format!("{} rows match", self.nvisible()));
        Ok(())
    }

    fn cycle_filter(&mut self, step: isize) -> Result<(), TableError> {
        let column = self.selected_column;
        let Some((table, filters)) = self.table_and_filters() else {
            self.no_table();
            return Ok(());
        };
        let value = filters.cycle(table, column, step)?;
        self.clamp_selected_row();
        self.set_status_message(format!("Filter \"{}\": {} rows match", value, self.nvisible()));
        Ok(())
    }

    fn reset_filters(&mut self) {
        let Some((table, filters)) = self.table_and_filters() else {
            self.no_table();
            return;
        };
        filters.reset(table);
        self.set_status_message(format!("Filters cleared, {} rows", self.nvisible()));
    }

    fn clamp_selected_row(&mut self) {
        self.selected_row = self.selected_row.min(self.nvisible().saturating_sub(1));
    }

    fn move_column(&mut self, step: isize) {
        let ncolumns = self.table().map(|t| t.ncolumns()).unwrap_or(0);
        if ncolumns > 0 {
            let next = (self.selected_column as isize + step).clamp(0, ncolumns as isize - 1);
            self.selected_column = next as usize;
        }
    }

    fn move_row(&mut self, step: isize) {
        let nvisible = self.nvisible();
        if nvisible > 0 {
            let next = (self.selected_row as isize + step).clamp(0, nvisible as isize - 1);
            self.selected_row = next as usize;
        }
    }

    pub fn quit(&mut self) {
        self.status = Status::QUITTING;
    }

    /// Apply one event. Controller errors end up in the status line, not in the caller.
    pub fn update(&mut self, message: Option<Message>) -> Result<(), TableError> {
        let Some(msg) = message else {
            return Ok(());
        };
        trace!("Update: {:?}", msg);
        let result = match msg {
            Message::Quit => {
                self.quit();
                Ok(())
            }
            Message::MoveLeft => {
                self.move_column(-1);
                Ok(())
            }
            Message::MoveRight => {
                self.move_column(1);
                Ok(())
            }
            Message::MoveUp => {
                self.move_row(-1);
                Ok(())
            }
            Message::MoveDown => {
                self.move_row(1);
                Ok(())
            }
            Message::Sort => self.sort_column(self.selected_column).map(|_| ()),
            Message::SortColumn(column) => self.sort_column(column).map(|_| ()),
            Message::NextFilterValue => self.cycle_filter(1),
            Message::PrevFilterValue => self.cycle_filter(-1),
            Message::SelectFilter(column, value) => self.select_filter(column, &value),
            Message::ResetFilters => {
                self.reset_filters();
                Ok(())
            }
            Message::Help => {
                self.set_status_message(HELP_TEXT);
                Ok(())
            }
            Message::Resize(width, height) => {
                trace!("UI was resized! w:{}->{}, h:{}->{}", self.width, width, self.height, height);
                self.width = width;
                self.height = height;
                Ok(())
            }
        };
        if let Err(e) = result {
            warn!("{}", e);
            self.set_status_message(e.to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model() -> Model {
        let table = Table::new(
            vec!["Name".into(), "Club".into(), "Category".into(), "Points".into()],
            vec![
                vec!["Alice".into(), "Zurich".into(), "M40".into(), "12".into()],
                vec!["Bob".into(), "Bern".into(), "M40".into(), "7".into()],
                vec!["Carla".into(), "Zurich".into(), "W30".into(), "30".into()],
            ],
        );
        Model::init(Document::with_table(table), &TableConfig::default()).unwrap()
    }

    fn names(model: &Model) -> Vec<String> {
        model
            .table()
            .unwrap()
            .visible_rows()
            .map(|r| r.cell(0).to_string())
            .collect()
    }

    #[test]
    fn messages_drive_sort_and_filter() {
        let mut m = model();
        m.update(Some(Message::SortColumn(3))).unwrap();
        assert_eq!(names(&m), vec!["Bob", "Alice", "Carla"]);
        assert_eq!(m.sort_direction(3), Some(SortDirection::Ascending));

        m.update(Some(Message::SelectFilter(1, "Zurich".into()))).unwrap();
        assert_eq!(names(&m), vec!["Alice", "Carla"]);

        m.update(Some(Message::SortColumn(3))).unwrap();
        assert_eq!(names(&m), vec!["Carla", "Alice"]);

        m.update(Some(Message::ResetFilters)).unwrap();
        assert_eq!(names(&m).len(), 3);
    }

    #[test]
    fn keyboard_cycles_filter_of_selected_column() {
        let mut m = model();
        m.update(Some(Message::MoveRight)).unwrap();
        m.update(Some(Message::MoveRight)).unwrap();
        assert_eq!(m.selected_column(), 2);
        m.update(Some(Message::NextFilterValue)).unwrap();
        assert_eq!(m.filters().unwrap().active(2), Some("M40"));
        assert_eq!(names(&m), vec!["Alice", "Bob"]);
        m.update(Some(Message::PrevFilterValue)).unwrap();
        assert_eq!(names(&m).len(), 3);
    }

    #[test]
    fn controller_errors_go_to_status_line() {
        let mut m = model();
        m.update(Some(Message::NextFilterValue)).unwrap();
        assert_eq!(m.status_message(), "column 0 has no filter");
        m.update(Some(Message::SortColumn(9))).unwrap();
        assert!(m.status_message().contains("out of range"));
        assert_eq!(m.status, Status::READY);
    }

    #[test]
    fn selection_stays_inside_visible_rows() {
        let mut m = model();
        m.update(Some(Message::MoveDown)).unwrap();
        m.update(Some(Message::MoveDown)).unwrap();
        m.update(Some(Message::MoveDown)).unwrap();
        assert_eq!(m.selected_row(), 2);
        m.update(Some(Message::SelectFilter(1, "Bern".into()))).unwrap();
        assert_eq!(m.selected_row(), 0);
        m.update(Some(Message::MoveLeft)).unwrap();
        assert_eq!(m.selected_column(), 0);
    }

    #[test]
    fn document_without_table_is_usable() {
        let mut m = Model::init(Document::default(), &TableConfig::default()).unwrap();
        assert!(m.filters().is_none());
        m.update(Some(Message::Sort)).unwrap();
        assert_eq!(m.status_message(), "No table in document");
        assert_eq!(m.sort_column(1).unwrap(), None);
        m.select_filter(1, "Zurich").unwrap();
        m.update(Some(Message::NextFilterValue)).unwrap();
        m.update(Some(Message::ResetFilters)).unwrap();
        assert_eq!(m.status_message(), "No table in document");
        assert_eq!(m.document(), &Document::default());
        m.update(Some(Message::MoveRight)).unwrap();
        m.update(Some(Message::Quit)).unwrap();
        assert_eq!(m.status, Status::QUITTING);
    }
}
