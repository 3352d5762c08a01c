use super::dashboard::severity_color;
use super::{
    clamp_selection, render_modal, render_placeholder, select_next, select_prev, Action,
    PageWidget,
};
use crate::api::models::Alert;
use crate::api::{AlertFilter, ApiClient};
use crate::feeds::alerts::AlertsFetcher;
use crate::feeds::commands::Command;
use crate::feeds::{FeedData, FeedFetcher};
use crate::format::{format_date, severity_label};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
    Frame,
};

const ALERT_TYPES: [Option<&str>; 3] = [None, Some("volume_wave"), Some("sentiment_shift")];
const SEVERITIES: [Option<&str>; 4] = [None, Some("high"), Some("medium"), Some("low")];
const READ_STATES: [Option<bool>; 3] = [None, Some(false), Some(true)];

fn cycle<T: PartialEq + Copy>(options: &[T], current: T) -> T {
    let idx = options.iter().position(|o| *o == current).unwrap_or(0);
    options[(idx + 1) % options.len()]
}

fn alert_type_label(alert_type: &str) -> &str {
    match alert_type {
        "volume_wave" => "موج حجمی",
        "sentiment_shift" => "تغییر احساسات",
        other => other,
    }
}

pub struct AlertsWidget {
    alerts: Vec<Alert>,
    loading: bool,
    error: Option<String>,
    list_state: ListState,
    filter: AlertFilter,
    detail: bool,
}

impl AlertsWidget {
    pub fn new(page_size: u32) -> Self {
        Self {
            alerts: Vec::new(),
            loading: false,
            error: None,
            list_state: ListState::default(),
            filter: AlertFilter {
                limit: Some(page_size),
                ..AlertFilter::default()
            },
            detail: false,
        }
    }

    pub fn filter(&self) -> &AlertFilter {
        &self.filter
    }

    fn selected_alert(&self) -> Option<&Alert> {
        self.list_state.selected().and_then(|i| self.alerts.get(i))
    }

    fn filter_summary(&self) -> String {
        let alert_type = self
            .filter
            .alert_type
            .as_deref()
            .map(alert_type_label)
            .unwrap_or("همه");
        let severity = self.filter.severity.as_deref().unwrap_or("همه");
        let read = match self.filter.is_read {
            None => "همه",
            Some(false) => "خوانده نشده",
            Some(true) => "خوانده شده",
        };
        format!(
            "نوع: {} (t)   شدت: {} (s)   وضعیت: {} (u)",
            alert_type, severity, read
        )
    }

    fn render_detail(&self, frame: &mut Frame, area: Rect, alert: &Alert) {
        let color = severity_color(alert.severity);
        let mut lines = vec![
            Line::from(Span::styled(
                alert.title.as_str(),
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            )),
            Line::from(format!(
                "{} | شدت {} | {}",
                alert_type_label(&alert.alert_type),
                severity_label(alert.severity),
                format_date(alert.created_at.as_ref())
            )),
            Line::from(""),
            Line::from(alert.message.as_str()),
        ];

        if let Some(tweet_id) = alert.related_tweet_id {
            lines.push(Line::from(""));
            lines.push(Line::from(format!("توییت مرتبط: {}", tweet_id)));
        }

        if let Some(data) = &alert.data {
            lines.push(Line::from(""));
            let pretty = serde_json::to_string_pretty(data).unwrap_or_else(|_| data.to_string());
            for line in pretty.lines() {
                lines.push(Line::from(Span::styled(
                    line.to_string(),
                    Style::default().fg(Color::Gray),
                )));
            }
        }

        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            "m علامت خوانده شده | Esc بستن",
            Style::default().fg(Color::DarkGray),
        )));
        render_modal(frame, area, (75, 70), "جزئیات هشدار", color, lines);
    }
}

impl PageWidget for AlertsWidget {
    fn id(&self) -> &str {
        "alerts"
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Min(3)])
            .split(area);

        frame.render_widget(
            Paragraph::new(self.filter_summary())
                .block(Block::default().borders(Borders::ALL).title(" فیلتر ")),
            chunks[0],
        );

        let unread = self.alerts.iter().filter(|a| !a.is_read).count();
        let block = Block::default()
            .title(format!(" هشدارها ({} جدید) ", unread))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan));

        if self.alerts.is_empty() {
            render_placeholder(
                frame,
                chunks[1],
                block,
                self.loading,
                self.error.as_deref(),
                Some("هشداری یافت نشد"),
            );
        } else {
            let items: Vec<ListItem> = self
                .alerts
                .iter()
                .map(|alert| {
                    let color = severity_color(alert.severity);
                    let badge = if alert.is_read {
                        Span::styled(" خوانده شده", Style::default().fg(Color::DarkGray))
                    } else {
                        Span::styled(
                            " جدید",
                            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
                        )
                    };
                    ListItem::new(vec![
                        Line::from(vec![
                            Span::styled(
                                format!("[{}] ", severity_label(alert.severity)),
                                Style::default().fg(color),
                            ),
                            Span::styled(
                                alert.title.as_str(),
                                Style::default().fg(color).add_modifier(Modifier::BOLD),
                            ),
                            badge,
                        ]),
                        Line::from(format!("  {}", alert.message)),
                        Line::from(Span::styled(
                            format!(
                                "  {} | {}",
                                alert_type_label(&alert.alert_type),
                                format_date(alert.created_at.as_ref())
                            ),
                            Style::default().fg(Color::DarkGray),
                        )),
                    ])
                })
                .collect();

            let list = List::new(items)
                .block(block)
                .highlight_style(Style::default().bg(Color::DarkGray));
            let mut state = self.list_state.clone();
            frame.render_stateful_widget(list, chunks[1], &mut state);
        }

        if self.detail {
            if let Some(alert) = self.selected_alert() {
                self.render_detail(frame, area, alert);
            }
        }
    }

    fn update_data(&mut self, data: FeedData) {
        match data {
            FeedData::Alerts(alerts) => {
                self.loading = false;
                self.error = None;
                self.alerts = alerts;
                clamp_selection(&mut self.list_state, self.alerts.len());
                if self.alerts.is_empty() {
                    self.detail = false;
                }
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
        Box::new(AlertsFetcher::new(client, self.filter.clone()))
    }

    fn scroll_up(&mut self) {
        select_prev(&mut self.list_state);
    }

    fn scroll_down(&mut self) {
        select_next(&mut self.list_state, self.alerts.len());
    }

    fn handle_key(&mut self, key: KeyEvent) -> Action {
        match key.code {
            KeyCode::Char('t') => {
                let next = cycle(&ALERT_TYPES, self.filter.alert_type.as_deref());
                self.filter.alert_type = next.map(str::to_string);
                Action::Reload
            }
            KeyCode::Char('s') => {
                let next = cycle(&SEVERITIES, self.filter.severity.as_deref());
                self.filter.severity = next.map(str::to_string);
                Action::Reload
            }
            KeyCode::Char('u') => {
                self.filter.is_read = cycle(&READ_STATES, self.filter.is_read);
                Action::Reload
            }
            KeyCode::Char('m') => match self.selected_alert() {
                Some(alert) if !alert.is_read => Action::Run(Command::MarkAlertRead(alert.id)),
                _ => Action::None,
            },
            KeyCode::Enter => {
                self.detail = self.selected_alert().is_some();
                Action::None
            }
            KeyCode::Esc => {
                self.detail = false;
                Action::None
            }
            _ => Action::None,
        }
    }

    fn key_hints(&self) -> &'static str {
        "t نوع | s شدت | u وضعیت | m خوانده شد | Enter جزئیات"
    }
}
