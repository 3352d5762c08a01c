pub mod toast;
pub mod widgets;

use crate::app::App;
use crate::router::Page;
use ratatui::{
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Tabs},
    Frame,
};

const GLOBAL_HINTS: &str = "Tab صفحه بعد | 1-5 انتخاب صفحه | r بروزرسانی | L خروج | q بستن";

pub fn render(frame: &mut Frame, app: &App) {
    let area = frame.area();

    if app.current_page() == Page::Login {
        frame.render_widget(
            Block::default()
                .title(" رصد | سامانه پایش شبکه‌های اجتماعی ")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::DarkGray)),
            area,
        );
        app.login_widget().render(frame, area);
    } else {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(5),
                Constraint::Length(1),
            ])
            .split(area);

        render_header(frame, app, chunks[0]);

        if let Some(widget) = app.page_widget(app.current_page()) {
            widget.render(frame, chunks[1]);

            let hints = widget.key_hints();
            let footer = if hints.is_empty() {
                GLOBAL_HINTS.to_string()
            } else {
                format!("{} | {}", hints, GLOBAL_HINTS)
            };
            frame.render_widget(
                Paragraph::new(footer).style(Style::default().fg(Color::DarkGray)),
                chunks[2],
            );
        }
    }

    if let Some(toast) = app.toast() {
        toast.render(frame, area);
    }
}

fn render_header(frame: &mut Frame, app: &App, area: ratatui::layout::Rect) {
    let titles: Vec<Line> = Page::TABS
        .iter()
        .enumerate()
        .map(|(i, page)| Line::from(format!("{} {}", i + 1, page.title())))
        .collect();
    let selected = Page::TABS
        .iter()
        .position(|p| *p == app.current_page())
        .unwrap_or(0);

    let user = app
        .user()
        .map(crate::auth::display_name)
        .unwrap_or_default();

    let tabs = Tabs::new(titles)
        .select(selected)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" رصد ")
                .title(
                    Line::from(Span::styled(
                        format!(" {} ", user),
                        Style::default().fg(Color::Cyan),
                    ))
                    .right_aligned(),
                ),
        )
        .highlight_style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        );
    frame.render_widget(tabs, area);
}
