use std::time::Duration;

use ratatui::{
    Frame,
    layout::{Constraint, Layout},
    style::{Modifier, Style, Stylize},
    text::Line,
    widgets::{Block, Cell, Paragraph, Row, Table, TableState},
};

use crate::model::Model;

pub const STATUSLINE_HEIGHT: u16 = 1;
pub const COLUMN_WIDTH_MARGIN: usize = 2;
pub const MAX_COLUMN_WIDTH: usize = 40;
const STATUS_MESSAGE_FADE: Duration = Duration::from_secs(3);

#[derive(Debug)]
pub struct TableUI {
    max_column_width: usize,
}

impl TableUI {
    pub fn new() -> Self {
        Self {
            max_column_width: MAX_COLUMN_WIDTH,
        }
    }

    fn header_label(model: &Model, column: usize, text: &str) -> String {
        let mut label = text.to_string();
        if let Some(direction) = model.sort_direction(column) {
            label.push(' ');
            label.push_str(direction.arrow());
        }
        if let Some(filters) = model.filters() {
            match filters.active(column) {
                Some(value) if filters.is_wildcard(value) => label.push_str(" [▾]"),
                Some(value) => label.push_str(&format!(" [{value}]")),
                None => {}
            }
        }
        label
    }

    pub fn draw(&self, model: &Model, frame: &mut Frame) {
        let [table_area, status_area] =
            Layout::vertical([Constraint::Min(1), Constraint::Length(STATUSLINE_HEIGHT)])
                .areas(frame.area());

        let title = model
            .document()
            .title
            .clone()
            .or_else(|| model.table().and_then(|t| t.caption.clone()))
            .unwrap_or_else(|| "tabctl".to_string());
        let block = Block::bordered().title(Line::from(format!(" {title} ").bold()).centered());

        match model.table() {
            None => {
                frame.render_widget(Paragraph::new("No table in document").centered().block(block), table_area);
            }
            Some(table) => {
                let labels: Vec<String> = table
                    .headers
                    .iter()
                    .enumerate()
                    .map(|(idx, h)| Self::header_label(model, idx, &h.text))
                    .collect();

                let mut widths: Vec<usize> = labels.iter().map(|l| l.chars().count()).collect();
                for row in table.visible_rows() {
                    for (idx, width) in widths.iter_mut().enumerate() {
                        *width = (*width).max(row.cell(idx).chars().count());
                    }
                }
                let constraints = widths
                    .iter()
                    .map(|w| Constraint::Length(((*w + COLUMN_WIDTH_MARGIN).min(self.max_column_width)) as u16));

                let header = Row::new(labels.into_iter().enumerate().map(|(idx, label)| {
                    let cell = Cell::from(label).bold();
                    if idx == model.selected_column() {
                        cell.reversed()
                    } else {
                        cell
                    }
                }));
                let rows = table
                    .visible_rows()
                    .map(|r| Row::new((0..table.ncolumns()).map(|idx| Cell::from(r.cell(idx).to_string()))));

                let widget = Table::new(rows, constraints)
                    .header(header)
                    .block(block)
                    .row_highlight_style(Style::default().add_modifier(Modifier::REVERSED));
                let mut state = TableState::default().with_selected(Some(model.selected_row()));
                frame.render_stateful_widget(widget, table_area, &mut state);
            }
        }

        let mut status = Paragraph::new(model.status_message().to_string());
        if model.last_status_message_update().elapsed() > STATUS_MESSAGE_FADE {
            status = status.dim();
        }
        frame.render_widget(status, status_area);
    }
}
