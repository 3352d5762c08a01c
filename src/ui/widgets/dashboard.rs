use super::{render_placeholder, select_next, select_prev, PageWidget};
use crate::api::models::Severity;
use crate::api::ApiClient;
use crate::feeds::dashboard::DashboardFetcher;
use crate::feeds::{DashboardSnapshot, FeedData, FeedFetcher};
use crate::format::{
    format_date, overall_status, percent, running_label, service_display_name, service_uptime,
    severity_label, truncate_message, OverallStatus,
};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
    Frame,
};

const ALERT_PREVIEW_CHARS: usize = 100;

pub struct DashboardWidget {
    snapshot: Option<DashboardSnapshot>,
    loading: bool,
    error: Option<String>,
    alert_state: ListState,
}

impl Default for DashboardWidget {
    fn default() -> Self {
        Self::new()
    }
}

impl DashboardWidget {
    pub fn new() -> Self {
        Self {
            snapshot: None,
            loading: false,
            error: None,
            alert_state: ListState::default(),
        }
    }

    pub fn snapshot(&self) -> Option<&DashboardSnapshot> {
        self.snapshot.as_ref()
    }
}

pub(crate) fn severity_color(severity: Severity) -> Color {
    match severity {
        Severity::High => Color::Red,
        Severity::Low => Color::Blue,
        _ => Color::Yellow,
    }
}

fn stat_card<'a>(title: &'a str, value: String, color: Color) -> Paragraph<'a> {
    Paragraph::new(vec![
        Line::from(""),
        Line::from(Span::styled(
            value,
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        )),
    ])
    .alignment(Alignment::Center)
    .block(Block::default().borders(Borders::ALL).title(format!(" {} ", title)))
}

impl PageWidget for DashboardWidget {
    fn id(&self) -> &str {
        "dashboard"
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        let outer = Block::default()
            .title(" داشبورد ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan));

        let snapshot = match &self.snapshot {
            Some(snapshot) => snapshot,
            None => {
                render_placeholder(
                    frame,
                    area,
                    outer,
                    self.loading,
                    self.error.as_deref(),
                    Some("داده‌ای وجود ندارد"),
                );
                return;
            }
        };

        let inner = outer.inner(area);
        frame.render_widget(outer, area);

        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(4),
                Constraint::Min(6),
                Constraint::Length(7),
            ])
            .split(inner);

        // Stat cards
        let cards = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Ratio(1, 4); 4])
            .split(rows[0]);

        let count = &snapshot.count;
        let total = count.total;
        frame.render_widget(
            stat_card("کل توییت‌ها", total.to_string(), Color::White),
            cards[0],
        );
        frame.render_widget(
            stat_card(
                "احساس مثبت",
                format!("{}%", percent(count.sentiment_counts.positive, total)),
                Color::Green,
            ),
            cards[1],
        );
        frame.render_widget(
            stat_card(
                "احساس منفی",
                format!("{}%", percent(count.sentiment_counts.negative, total)),
                Color::Red,
            ),
            cards[2],
        );
        frame.render_widget(
            stat_card("هشدارهای فعال", snapshot.alerts.len().to_string(), Color::Yellow),
            cards[3],
        );

        // Latest alerts | top topics
        let middle = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(65), Constraint::Percentage(35)])
            .split(rows[1]);

        let alerts_block = Block::default().title(" آخرین هشدارها ").borders(Borders::ALL);
        if snapshot.alerts.is_empty() {
            render_placeholder(frame, middle[0], alerts_block, false, None, Some("هشداری یافت نشد"));
        } else {
            let items: Vec<ListItem> = snapshot
                .alerts
                .iter()
                .map(|alert| {
                    let color = severity_color(alert.severity);
                    ListItem::new(vec![
                        Line::from(vec![
                            Span::styled(
                                format!("[{}] ", severity_label(alert.severity)),
                                Style::default().fg(color),
                            ),
                            Span::styled(
                                alert.title.as_str(),
                                Style::default().add_modifier(Modifier::BOLD),
                            ),
                        ]),
                        Line::from(format!(
                            "  {}",
                            truncate_message(&alert.message, ALERT_PREVIEW_CHARS)
                        )),
                        Line::from(Span::styled(
                            format!("  {}", format_date(alert.created_at.as_ref())),
                            Style::default().fg(Color::DarkGray),
                        )),
                    ])
                })
                .collect();
            let list = List::new(items)
                .block(alerts_block)
                .highlight_style(Style::default().bg(Color::DarkGray));
            let mut state = self.alert_state.clone();
            frame.render_stateful_widget(list, middle[0], &mut state);
        }

        let topics_block = Block::default().title(" موضوعات برتر ").borders(Borders::ALL);
        if snapshot.topics.is_empty() {
            render_placeholder(frame, middle[1], topics_block, false, None, Some("موضوعی یافت نشد"));
        } else {
            let items: Vec<ListItem> = snapshot
                .topics
                .iter()
                .map(|topic| {
                    ListItem::new(Line::from(vec![
                        Span::raw(topic.name.as_str()),
                        Span::styled(
                            format!(" ({})", topic.tweet_count),
                            Style::default().fg(Color::Cyan),
                        ),
                    ]))
                })
                .collect();
            frame.render_widget(List::new(items).block(topics_block), middle[1]);
        }

        // Active keywords | services
        let bottom = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(rows[2]);

        let keywords_text = if snapshot.keywords.is_empty() {
            "کلیدواژه فعالی وجود ندارد".to_string()
        } else {
            snapshot
                .keywords
                .iter()
                .map(|k| k.text.as_str())
                .collect::<Vec<_>>()
                .join(" • ")
        };
        frame.render_widget(
            Paragraph::new(keywords_text)
                .wrap(ratatui::widgets::Wrap { trim: true })
                .block(
                    Block::default()
                        .title(" کلیدواژه‌های فعال ")
                        .borders(Borders::ALL),
                ),
            bottom[0],
        );

        let services_block = Block::default().title(" سرویس‌ها ").borders(Borders::ALL);
        match &snapshot.services {
            Some(overview) => {
                let overall = overall_status(&overview.services);
                let overall_color = match overall {
                    OverallStatus::Running => Color::Green,
                    OverallStatus::Stopped => Color::Red,
                    OverallStatus::Partial => Color::Yellow,
                };
                let mut lines = vec![Line::from(Span::styled(
                    overall.label(),
                    Style::default().fg(overall_color).add_modifier(Modifier::BOLD),
                ))];
                for (name, status) in &overview.services {
                    let running = status.is_running();
                    lines.push(Line::from(vec![
                        Span::styled(
                            if running { "● " } else { "○ " },
                            Style::default().fg(if running { Color::Green } else { Color::Red }),
                        ),
                        Span::raw(format!(
                            "{}: {} {}",
                            service_display_name(name),
                            running_label(running),
                            service_uptime(status)
                        )),
                    ]));
                }
                frame.render_widget(Paragraph::new(lines).block(services_block), bottom[1]);
            }
            None => {
                render_placeholder(
                    frame,
                    bottom[1],
                    services_block,
                    false,
                    None,
                    Some("وضعیت سرویس‌ها در دسترس نیست"),
                );
            }
        }
    }

    fn update_data(&mut self, data: FeedData) {
        match data {
            FeedData::Dashboard(snapshot) => {
                self.loading = false;
                self.error = None;
                super::clamp_selection(&mut self.alert_state, snapshot.alerts.len());
                self.snapshot = Some(snapshot);
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
        Box::new(DashboardFetcher::new(client))
    }

    fn scroll_up(&mut self) {
        select_prev(&mut self.alert_state);
    }

    fn scroll_down(&mut self) {
        let len = self.snapshot.as_ref().map(|s| s.alerts.len()).unwrap_or(0);
        select_next(&mut self.alert_state, len);
    }

    fn key_hints(&self) -> &'static str {
        "r بروزرسانی"
    }
}
