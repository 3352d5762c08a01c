use super::{render_placeholder, Action, PageWidget};
use crate::api::models::{ServiceLogs, ServiceState, ServicesOverview};
use crate::api::ApiClient;
use crate::feeds::commands::Command;
use crate::feeds::services::ServicesFetcher;
use crate::feeds::{FeedData, FeedFetcher};
use crate::format::{overall_status, service_display_name, service_uptime, OverallStatus};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Row, Table, TableState},
    Frame,
};

/// Pseudo-service the backend accepts for start/stop of everything
pub const ALL_SERVICES: &str = "all";
const LOG_LINES: u32 = 100;

pub struct ServicesWidget {
    overview: Option<ServicesOverview>,
    loading: bool,
    error: Option<String>,
    table_state: TableState,
    logs: Option<ServiceLogs>,
    log_scroll: u16,
}

impl Default for ServicesWidget {
    fn default() -> Self {
        Self::new()
    }
}

fn state_style(state: ServiceState) -> (&'static str, Color) {
    match state {
        ServiceState::Running => ("در حال اجرا", Color::Green),
        ServiceState::Stopped => ("متوقف", Color::Red),
        ServiceState::Starting => ("در حال شروع", Color::Yellow),
        ServiceState::Error => ("خطا", Color::Red),
        ServiceState::Unknown => ("نامشخص", Color::DarkGray),
    }
}

impl ServicesWidget {
    pub fn new() -> Self {
        Self {
            overview: None,
            loading: false,
            error: None,
            table_state: TableState::default(),
            logs: None,
            log_scroll: 0,
        }
    }

    fn service_names(&self) -> Vec<&str> {
        self.overview
            .as_ref()
            .map(|o| o.services.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }

    fn selected_service(&self) -> Option<String> {
        let names = self.service_names();
        self.table_state
            .selected()
            .and_then(|i| names.get(i).map(|n| n.to_string()))
    }

    fn render_logs(&self, frame: &mut Frame, area: Rect, logs: &ServiceLogs) {
        let mut lines = Vec::new();
        for (stream, text) in &logs.logs {
            lines.push(Line::from(Span::styled(
                format!("── {} ──", stream),
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            )));
            if text.trim().is_empty() {
                lines.push(Line::from(Span::styled(
                    "(خالی)",
                    Style::default().fg(Color::DarkGray),
                )));
            }
            for line in text.lines() {
                let color = if line.contains("ERROR") {
                    Color::Red
                } else if line.contains("WARNING") {
                    Color::Yellow
                } else {
                    Color::Gray
                };
                lines.push(Line::from(Span::styled(
                    line.to_string(),
                    Style::default().fg(color),
                )));
            }
        }

        let modal_area = super::center_rect(90, 85, area);
        frame.render_widget(ratatui::widgets::Clear, modal_area);
        let paragraph = Paragraph::new(lines)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::Cyan))
                    .title(format!(
                        " لاگ {} (↑/↓ پیمایش، Esc بستن) ",
                        service_display_name(&logs.service)
                    )),
            )
            .scroll((self.log_scroll, 0));
        frame.render_widget(paragraph, modal_area);
    }
}

impl PageWidget for ServicesWidget {
    fn id(&self) -> &str {
        "services"
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Min(5), Constraint::Length(4)])
            .split(area);

        let overview = match &self.overview {
            Some(overview) if !overview.services.is_empty() => overview,
            _ => {
                let block = Block::default()
                    .title(" سرویس‌ها ")
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::Cyan));
                render_placeholder(
                    frame,
                    area,
                    block,
                    self.loading,
                    self.error.as_deref(),
                    Some("سرویسی یافت نشد"),
                );
                return;
            }
        };

        let overall = overall_status(&overview.services);
        let color = match overall {
            OverallStatus::Running => Color::Green,
            OverallStatus::Stopped => Color::Red,
            OverallStatus::Partial => Color::Yellow,
        };
        let refreshing = if self.loading { "  ⟳" } else { "" };
        frame.render_widget(
            Paragraph::new(Line::from(vec![
                Span::raw("وضعیت کلی: "),
                Span::styled(
                    overall.label(),
                    Style::default().fg(color).add_modifier(Modifier::BOLD),
                ),
                Span::raw(refreshing),
            ]))
            .block(Block::default().borders(Borders::ALL)),
            chunks[0],
        );

        let header = Row::new(vec!["سرویس", "وضعیت", "PID", "CPU", "حافظه", "زمان اجرا"])
            .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD));
        let rows: Vec<Row> = overview
            .services
            .iter()
            .map(|(name, status)| {
                let (label, color) = state_style(status.status);
                Row::new(vec![
                    Span::raw(service_display_name(name).to_string()),
                    Span::styled(label, Style::default().fg(color)),
                    Span::raw(status.pid.map(|p| p.to_string()).unwrap_or_else(|| "-".into())),
                    Span::raw(
                        status
                            .cpu_percent
                            .map(|c| format!("{:.1}%", c))
                            .unwrap_or_else(|| "-".into()),
                    ),
                    Span::raw(
                        status
                            .memory_usage
                            .map(|m| format!("{:.1} MB", m.rss))
                            .unwrap_or_else(|| "-".into()),
                    ),
                    Span::raw(service_uptime(status)),
                ])
            })
            .collect();

        let table = Table::new(
            rows,
            [
                Constraint::Percentage(22),
                Constraint::Percentage(16),
                Constraint::Percentage(10),
                Constraint::Percentage(10),
                Constraint::Percentage(14),
                Constraint::Percentage(28),
            ],
        )
        .header(header)
        .block(
            Block::default()
                .title(" سرویس‌ها ")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan)),
        )
        .row_highlight_style(Style::default().bg(Color::DarkGray));
        let mut state = self.table_state.clone();
        frame.render_stateful_widget(table, chunks[1], &mut state);

        let info = overview
            .system_info
            .as_ref()
            .map(|info| {
                format!(
                    "میزبان: {}  سیستم: {}  CPU: {}  حافظه: {:.0}%",
                    info.hostname.as_deref().unwrap_or("-"),
                    info.platform.as_deref().unwrap_or("-"),
                    info.cpu_count.map(|c| c.to_string()).unwrap_or_else(|| "-".into()),
                    info.memory_percent.unwrap_or(0.0)
                )
            })
            .unwrap_or_default();
        frame.render_widget(
            Paragraph::new(vec![
                Line::from(info),
                Line::from(Span::styled(
                    overview.timestamp.clone().unwrap_or_default(),
                    Style::default().fg(Color::DarkGray),
                )),
            ])
            .block(Block::default().borders(Borders::ALL).title(" سیستم ")),
            chunks[2],
        );

        if let Some(logs) = &self.logs {
            self.render_logs(frame, area, logs);
        }
    }

    fn update_data(&mut self, data: FeedData) {
        match data {
            FeedData::Services(overview) => {
                self.loading = false;
                self.error = None;
                let len = overview.services.len();
                if len == 0 {
                    self.table_state.select(None);
                } else {
                    let selected = self.table_state.selected().unwrap_or(0).min(len - 1);
                    self.table_state.select(Some(selected));
                }
                self.overview = Some(overview);
            }
            FeedData::ServiceLogs(logs) => {
                self.log_scroll = 0;
                self.logs = Some(logs);
            }
            FeedData::Error(e) => {
                self.loading = false;
                self.error = Some(e);
            }
            FeedData::Loading => {
                self.loading = true;
            }
            _ => {}
        }
    }

    fn create_fetcher(&self, client: ApiClient) -> Box<dyn FeedFetcher> {
        Box::new(ServicesFetcher::new(client))
    }

    fn scroll_up(&mut self) {
        if self.logs.is_some() {
            self.log_scroll = self.log_scroll.saturating_sub(1);
            return;
        }
        if let Some(selected) = self.table_state.selected() {
            if selected > 0 {
                self.table_state.select(Some(selected - 1));
            }
        }
    }

    fn scroll_down(&mut self) {
        if self.logs.is_some() {
            self.log_scroll = self.log_scroll.saturating_add(1);
            return;
        }
        let len = self.service_names().len();
        match self.table_state.selected() {
            Some(selected) if selected < len.saturating_sub(1) => {
                self.table_state.select(Some(selected + 1))
            }
            None if len > 0 => self.table_state.select(Some(0)),
            _ => {}
        }
    }

    fn handle_key(&mut self, key: KeyEvent) -> Action {
        if self.logs.is_some() {
            match key.code {
                KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('l') => self.logs = None,
                KeyCode::Up | KeyCode::Char('k') => self.scroll_up(),
                KeyCode::Down | KeyCode::Char('j') => self.scroll_down(),
                _ => {}
            }
            return Action::None;
        }

        match key.code {
            KeyCode::Char('s') => self
                .selected_service()
                .map(|name| Action::Run(Command::StartService(name)))
                .unwrap_or(Action::None),
            KeyCode::Char('x') => self
                .selected_service()
                .map(|name| Action::Run(Command::StopService(name)))
                .unwrap_or(Action::None),
            KeyCode::Char('S') => Action::Run(Command::StartService(ALL_SERVICES.to_string())),
            KeyCode::Char('X') => Action::Run(Command::StopService(ALL_SERVICES.to_string())),
            KeyCode::Char('l') | KeyCode::Enter => self
                .selected_service()
                .map(|service| {
                    Action::Run(Command::FetchLogs {
                        service,
                        lines: LOG_LINES,
                    })
                })
                .unwrap_or(Action::None),
            _ => Action::None,
        }
    }

    fn is_editing(&self) -> bool {
        self.logs.is_some()
    }

    fn key_hints(&self) -> &'static str {
        "s شروع | x توقف | S شروع همه | X توقف همه | l لاگ"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::widgets::key;
    use std::collections::BTreeMap;

    fn overview() -> ServicesOverview {
        serde_json::from_str(
            r#"{"services": {
                "analyzer": {"status": "stopped", "running": false},
                "collector": {"status": "running", "running": true, "pid": 10, "uptime": 3661}
            }}"#,
        )
        .unwrap()
    }

    #[test]
    fn test_actions_target_selected_service() {
        let mut widget = ServicesWidget::new();
        widget.update_data(FeedData::Services(overview()));

        // BTreeMap order: analyzer, collector
        assert_eq!(
            widget.handle_key(key(KeyCode::Char('s'))),
            Action::Run(Command::StartService("analyzer".to_string()))
        );
        widget.scroll_down();
        assert_eq!(
            widget.handle_key(key(KeyCode::Char('x'))),
            Action::Run(Command::StopService("collector".to_string()))
        );
        assert_eq!(
            widget.handle_key(key(KeyCode::Char('X'))),
            Action::Run(Command::StopService("all".to_string()))
        );
    }

    #[test]
    fn test_log_viewer_owns_keys_until_closed() {
        let mut widget = ServicesWidget::new();
        widget.update_data(FeedData::Services(overview()));
        assert_eq!(
            widget.handle_key(key(KeyCode::Char('l'))),
            Action::Run(Command::FetchLogs {
                service: "analyzer".to_string(),
                lines: 100,
            })
        );

        let mut logs = BTreeMap::new();
        logs.insert("stdout".to_string(), "INFO started\nERROR boom".to_string());
        widget.update_data(FeedData::ServiceLogs(ServiceLogs {
            service: "analyzer".to_string(),
            logs,
            timestamp: None,
        }));
        assert!(widget.is_editing());
        assert_eq!(widget.handle_key(key(KeyCode::Char('s'))), Action::None);

        widget.handle_key(key(KeyCode::Esc));
        assert!(!widget.is_editing());
    }

    #[test]
    fn test_no_actions_without_services() {
        let mut widget = ServicesWidget::new();
        assert_eq!(widget.handle_key(key(KeyCode::Char('s'))), Action::None);
        assert_eq!(
            widget.handle_key(key(KeyCode::Char('S'))),
            Action::Run(Command::StartService("all".to_string()))
        );
    }
}
