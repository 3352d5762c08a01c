use super::{center_rect, Action};
use crate::feeds::FeedData;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

#[derive(Debug, Clone, Copy, PartialEq)]
enum Field {
    Username,
    Password,
}

#[derive(Debug, Clone)]
pub struct LoginWidget {
    username: String,
    password: String,
    focus: Field,
    error: Option<String>,
    busy: bool,
}

impl Default for LoginWidget {
    fn default() -> Self {
        Self::new()
    }
}

impl LoginWidget {
    pub fn new() -> Self {
        Self {
            username: String::new(),
            password: String::new(),
            focus: Field::Username,
            error: None,
            busy: false,
        }
    }

    /// Forget the typed password, keep the username for the next login.
    pub fn reset(&mut self) {
        self.password.clear();
        self.focus = Field::Username;
        self.busy = false;
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub fn update_data(&mut self, data: FeedData) {
        match data {
            FeedData::Error(e) => {
                self.error = Some(e);
                self.busy = false;
                self.password.clear();
                self.focus = Field::Password;
            }
            FeedData::Loading => {
                self.busy = true;
            }
            FeedData::LoggedIn(_) => {
                self.error = None;
                self.reset();
            }
            _ => {
                self.busy = false;
            }
        }
    }

    pub fn set_error(&mut self, message: impl Into<String>) {
        self.error = Some(message.into());
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Action {
        if self.busy {
            return Action::None;
        }

        match key.code {
            KeyCode::Tab | KeyCode::Down | KeyCode::Up | KeyCode::BackTab => {
                self.focus = match self.focus {
                    Field::Username => Field::Password,
                    Field::Password => Field::Username,
                };
                Action::None
            }
            KeyCode::Backspace => {
                self.field_mut().pop();
                Action::None
            }
            KeyCode::Char(c) => {
                self.field_mut().push(c);
                Action::None
            }
            KeyCode::Enter => self.submit(),
            KeyCode::Esc => Action::Quit,
            _ => Action::None,
        }
    }

    fn field_mut(&mut self) -> &mut String {
        match self.focus {
            Field::Username => &mut self.username,
            Field::Password => &mut self.password,
        }
    }

    fn submit(&mut self) -> Action {
        if self.focus == Field::Username && self.password.is_empty() {
            self.focus = Field::Password;
            return Action::None;
        }

        let username = self.username.trim();
        if username.is_empty() || self.password.is_empty() {
            self.error = Some("لطفاً نام کاربری و رمز عبور را وارد کنید".to_string());
            return Action::None;
        }

        self.error = None;
        self.busy = true;
        Action::Login {
            username: username.to_string(),
            password: self.password.clone(),
        }
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let modal_area = center_rect(50, 50, area);
        frame.render_widget(Clear, modal_area);

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .title(" رصد | ورود به سیستم ");

        let field_style = |field: Field| {
            if self.focus == field {
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::White)
            }
        };
        let cursor = |field: Field| if self.focus == field { "_" } else { "" };

        let mut lines = vec![
            Line::from(""),
            Line::from(vec![
                Span::styled("نام کاربری: ", field_style(Field::Username)),
                Span::raw(&self.username),
                Span::raw(cursor(Field::Username)),
            ]),
            Line::from(""),
            Line::from(vec![
                Span::styled("رمز عبور:   ", field_style(Field::Password)),
                Span::raw("*".repeat(self.password.chars().count())),
                Span::raw(cursor(Field::Password)),
            ]),
            Line::from(""),
        ];

        if self.busy {
            lines.push(Line::from(Span::styled(
                "در حال ورود...",
                Style::default().fg(Color::Cyan),
            )));
        } else if let Some(error) = &self.error {
            lines.push(Line::from(Span::styled(
                error.as_str(),
                Style::default().fg(Color::Red),
            )));
        } else {
            lines.push(Line::from(""));
        }

        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            "Enter ورود | Tab جابجایی | Esc خروج",
            Style::default().fg(Color::DarkGray),
        )));

        let paragraph = Paragraph::new(lines)
            .block(block)
            .alignment(Alignment::Center);
        frame.render_widget(paragraph, modal_area);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::widgets::key;

    fn type_into(widget: &mut LoginWidget, text: &str) {
        for c in text.chars() {
            widget.handle_key(key(KeyCode::Char(c)));
        }
    }

    #[test]
    fn test_enter_moves_to_password_then_submits() {
        let mut widget = LoginWidget::new();
        type_into(&mut widget, "admin@rasad.ir");
        assert_eq!(widget.handle_key(key(KeyCode::Enter)), Action::None);

        type_into(&mut widget, "s3cret");
        let action = widget.handle_key(key(KeyCode::Enter));
        assert_eq!(
            action,
            Action::Login {
                username: "admin@rasad.ir".to_string(),
                password: "s3cret".to_string(),
            }
        );
        assert!(widget.is_busy());
        // keys are ignored while the request is out
        assert_eq!(widget.handle_key(key(KeyCode::Esc)), Action::None);
    }

    #[test]
    fn test_blank_username_is_refused() {
        let mut widget = LoginWidget::new();
        widget.handle_key(key(KeyCode::Tab));
        type_into(&mut widget, "pw");
        assert_eq!(widget.handle_key(key(KeyCode::Enter)), Action::None);
        assert!(widget.error.is_some());
        assert!(!widget.is_busy());
    }

    #[test]
    fn test_error_clears_password() {
        let mut widget = LoginWidget::new();
        type_into(&mut widget, "admin");
        widget.handle_key(key(KeyCode::Tab));
        type_into(&mut widget, "wrong");
        widget.handle_key(key(KeyCode::Enter));

        widget.update_data(FeedData::Error("Invalid username or password".to_string()));
        assert!(!widget.is_busy());
        assert!(widget.password.is_empty());
        assert_eq!(widget.username, "admin");
    }
}
