use std::time::Duration;
use tracing::trace;

use ratatui::crossterm::event::{self, Event, KeyCode, KeyModifiers};
use crate::domain::{Message, TableConfig, TableError};

pub struct Controller {
    event_poll_time: u64,
}

impl Controller {
    pub fn new(cfg: &TableConfig) -> Self {
        Self {
            event_poll_time: cfg.event_poll_time,
        }
    }

    pub fn handle_event(&self) -> Result<Option<Message>, TableError> {
        if !event::poll(Duration::from_millis(self.event_poll_time))? {
            return Ok(None);
        }
        match event::read()? {
            Event::Key(key) if key.kind == event::KeyEventKind::Press => Ok(self.handle_key(key)),
            Event::Resize(width, height) => Ok(Some(Message::Resize(width as usize, height as usize))),
            _ => Ok(None),
        }
    }

    fn handle_key(&self, key: event::KeyEvent) -> Option<Message> {
        let message = match (key.code, key.modifiers) {
            (KeyCode::Char('q'), _) | (KeyCode::Esc, _) => Some(Message::Quit),
            (KeyCode::Char('c'), KeyModifiers::CONTROL) => Some(Message::Quit),
            (KeyCode::Left, _) | (KeyCode::Char('h'), _) => Some(Message::MoveLeft),
            (KeyCode::Right, _) | (KeyCode::Char('l'), _) => Some(Message::MoveRight),
            (KeyCode::Up, _) | (KeyCode::Char('k'), _) => Some(Message::MoveUp),
            (KeyCode::Down, _) | (KeyCode::Char('j'), _) => Some(Message::MoveDown),
            (KeyCode::Char('s'), _) | (KeyCode::Enter, _) => Some(Message::Sort),
            (KeyCode::Char('f'), _) => Some(Message::NextFilterValue),
            (KeyCode::Char('F'), _) => Some(Message::PrevFilterValue),
            (KeyCode::Char('r'), _) => Some(Message::ResetFilters),
            (KeyCode::Char('?'), _) => Some(Message::Help),
            (KeyCode::Char(c), _) if c.is_ascii_digit() => {
                c.to_digit(10).map(|d| Message::SortColumn(d as usize))
            }
            _ => None,
        };
        trace!("Mapped: {key:?} => {message:?}");
        message
    }
}
