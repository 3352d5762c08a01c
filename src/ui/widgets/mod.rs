pub mod alerts;
pub mod dashboard;
pub mod keywords;
pub mod login;
pub mod services;
pub mod tweets;

use crate::api::ApiClient;
use crate::feeds::commands::Command;
use crate::feeds::{FeedData, FeedFetcher, NoticeKind};
use crate::router::Page;
use crossterm::event::KeyEvent;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    text::Line,
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};

/// What a key press on a page asks the app to do
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    None,
    Quit,
    Navigate(Page),
    /// Re-run the visible page's loader
    Reload,
    Run(Command),
    Login { username: String, password: String },
    Logout,
    OpenUrl(String),
    Toast(String, NoticeKind),
}

pub trait PageWidget: Send {
    fn id(&self) -> &str;
    fn render(&self, frame: &mut Frame, area: Rect);
    fn update_data(&mut self, data: FeedData);
    fn create_fetcher(&self, client: ApiClient) -> Box<dyn FeedFetcher>;
    fn scroll_up(&mut self);
    fn scroll_down(&mut self);

    /// Page-specific keys. Outside of forms, global bindings and list
    /// scrolling are handled before this is called.
    fn handle_key(&mut self, _key: KeyEvent) -> Action {
        Action::None
    }

    /// True while a form or modal owns the keyboard
    fn is_editing(&self) -> bool {
        false
    }

    /// One-line key reference for the footer
    fn key_hints(&self) -> &'static str {
        ""
    }
}

pub(crate) fn center_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

/// Clear a centered area and draw `lines` in a bordered box over it.
pub(crate) fn render_modal(
    frame: &mut Frame,
    area: Rect,
    size: (u16, u16),
    title: &str,
    color: Color,
    lines: Vec<Line>,
) {
    let modal_area = center_rect(size.0, size.1, area);
    frame.render_widget(Clear, modal_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(color))
        .title(format!(" {} ", title));

    let paragraph = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, modal_area);
}

/// Loading, error and empty placeholders share one look across pages.
/// Returns true when a placeholder was drawn.
pub(crate) fn render_placeholder(
    frame: &mut Frame,
    area: Rect,
    block: Block,
    loading: bool,
    error: Option<&str>,
    empty: Option<&str>,
) -> bool {
    let text = if loading {
        "در حال بارگذاری...".to_string()
    } else if let Some(error) = error {
        format!("خطا: {}", error)
    } else if let Some(empty) = empty {
        empty.to_string()
    } else {
        return false;
    };

    let style = if error.is_some() && !loading {
        Style::default().fg(Color::Red)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    let list = List::new(vec![ListItem::new(text).style(style)]).block(block);
    frame.render_widget(list, area);
    true
}

pub(crate) fn select_prev(state: &mut ListState) {
    if let Some(selected) = state.selected() {
        if selected > 0 {
            state.select(Some(selected - 1));
        }
    }
}

pub(crate) fn select_next(state: &mut ListState, len: usize) {
    match state.selected() {
        Some(selected) if selected < len.saturating_sub(1) => state.select(Some(selected + 1)),
        None if len > 0 => state.select(Some(0)),
        _ => {}
    }
}

/// Keep the selection inside a list that may have shrunk after a reload.
pub(crate) fn clamp_selection(state: &mut ListState, len: usize) {
    if len == 0 {
        state.select(None);
    } else {
        let selected = state.selected().unwrap_or(0).min(len - 1);
        state.select(Some(selected));
    }
}

#[cfg(test)]
pub(crate) fn key(code: crossterm::event::KeyCode) -> KeyEvent {
    KeyEvent::new(code, crossterm::event::KeyModifiers::NONE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selection_helpers() {
        let mut state = ListState::default();
        select_next(&mut state, 3);
        assert_eq!(state.selected(), Some(0));
        select_next(&mut state, 3);
        select_next(&mut state, 3);
        select_next(&mut state, 3);
        assert_eq!(state.selected(), Some(2));
        select_prev(&mut state);
        assert_eq!(state.selected(), Some(1));

        clamp_selection(&mut state, 1);
        assert_eq!(state.selected(), Some(0));
        clamp_selection(&mut state, 0);
        assert_eq!(state.selected(), None);
    }
}
