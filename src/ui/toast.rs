use crate::feeds::NoticeKind;
use ratatui::{
    layout::Rect,
    style::{Color, Style},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};
use std::time::{Duration, Instant};

/// Transient message drawn over the bottom of the screen
#[derive(Debug, Clone)]
pub struct Toast {
    pub message: String,
    pub kind: NoticeKind,
    expires_at: Instant,
}

impl Toast {
    pub fn new(message: impl Into<String>, kind: NoticeKind, ttl: Duration) -> Self {
        Self {
            message: message.into(),
            kind,
            expires_at: Instant::now() + ttl,
        }
    }

    pub fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let color = match self.kind {
            NoticeKind::Success => Color::Green,
            NoticeKind::Info => Color::Cyan,
            NoticeKind::Error => Color::Red,
        };

        let width = area.width.saturating_sub(4).min(80);
        let toast_area = Rect::new(
            area.x + area.width.saturating_sub(width) / 2,
            area.y + area.height.saturating_sub(4),
            width,
            3,
        );

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(color));
        let paragraph = Paragraph::new(self.message.as_str())
            .style(Style::default().fg(color))
            .wrap(Wrap { trim: true })
            .block(block);
        frame.render_widget(Clear, toast_area);
        frame.render_widget(paragraph, toast_area);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toast_expiry() {
        let toast = Toast::new("ذخیره شد", NoticeKind::Success, Duration::from_secs(4));
        assert!(!toast.is_expired(Instant::now()));
        assert!(toast.is_expired(Instant::now() + Duration::from_secs(5)));
    }
}
