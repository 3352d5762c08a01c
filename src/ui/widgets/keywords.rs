use super::{
    clamp_selection, render_modal, render_placeholder, select_next, select_prev, Action,
    PageWidget,
};
use crate::api::models::{BudgetStatus, Keyword, KeywordInput, SystemSettings};
use crate::api::ApiClient;
use crate::feeds::commands::Command;
use crate::feeds::keywords::KeywordsFetcher;
use crate::feeds::{FeedData, FeedFetcher, KeywordsPanel, NoticeKind};
use crate::format::format_date;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, List, ListItem, ListState, Paragraph},
    Frame,
};

const MIN_PRIORITY: i32 = 1;
const MAX_PRIORITY: i32 = 10;

#[derive(Debug, Clone, Copy, PartialEq)]
enum FormField {
    Text,
    Priority,
    Description,
}

#[derive(Debug, Clone, PartialEq)]
enum KeywordsMode {
    Normal,
    Add(FormField),
    /// Waiting for y/n before deleting the keyword with this id
    ConfirmDelete(i64),
    Budget,
}

#[derive(Debug, Clone)]
struct KeywordForm {
    text: String,
    priority: i32,
    description: String,
}

impl Default for KeywordForm {
    fn default() -> Self {
        Self {
            text: String::new(),
            priority: MIN_PRIORITY,
            description: String::new(),
        }
    }
}

impl KeywordForm {
    fn to_input(&self) -> KeywordInput {
        let description = self.description.trim();
        KeywordInput {
            text: self.text.trim().to_string(),
            priority: self.priority,
            description: (!description.is_empty()).then(|| description.to_string()),
            ..KeywordInput::new("")
        }
    }
}

pub struct KeywordsWidget {
    keywords: Vec<Keyword>,
    settings: Option<SystemSettings>,
    budget: Option<BudgetStatus>,
    loading: bool,
    error: Option<String>,
    list_state: ListState,
    mode: KeywordsMode,
    form: KeywordForm,
    budget_input: String,
}

impl Default for KeywordsWidget {
    fn default() -> Self {
        Self::new()
    }
}

impl KeywordsWidget {
    pub fn new() -> Self {
        Self {
            keywords: Vec::new(),
            settings: None,
            budget: None,
            loading: false,
            error: None,
            list_state: ListState::default(),
            mode: KeywordsMode::Normal,
            form: KeywordForm::default(),
            budget_input: String::new(),
        }
    }

    fn selected_keyword(&self) -> Option<&Keyword> {
        self.list_state.selected().and_then(|i| self.keywords.get(i))
    }

    fn submit_form(&mut self) -> Action {
        let input = self.form.to_input();
        if input.text.is_empty() {
            return Action::Toast(
                "لطفاً متن کلیدواژه را وارد کنید".to_string(),
                NoticeKind::Error,
            );
        }
        self.form = KeywordForm::default();
        self.mode = KeywordsMode::Normal;
        Action::Run(Command::CreateKeyword(input))
    }

    fn submit_budget(&mut self) -> Action {
        match self.budget_input.trim().parse::<f64>() {
            Ok(amount) if amount.is_finite() && amount > 0.0 => {
                self.mode = KeywordsMode::Normal;
                self.budget_input.clear();
                Action::Run(Command::UpdateBudget(amount))
            }
            _ => Action::Toast(
                "بودجه روزانه باید عددی بزرگتر از صفر باشد".to_string(),
                NoticeKind::Error,
            ),
        }
    }

    fn handle_form_key(&mut self, field: FormField, key: KeyEvent) -> Action {
        match key.code {
            KeyCode::Esc => {
                self.form = KeywordForm::default();
                self.mode = KeywordsMode::Normal;
                Action::None
            }
            KeyCode::Enter => self.submit_form(),
            KeyCode::Tab | KeyCode::Down => {
                self.mode = KeywordsMode::Add(match field {
                    FormField::Text => FormField::Priority,
                    FormField::Priority => FormField::Description,
                    FormField::Description => FormField::Text,
                });
                Action::None
            }
            KeyCode::Left | KeyCode::Char('-') if field == FormField::Priority => {
                self.form.priority = (self.form.priority - 1).max(MIN_PRIORITY);
                Action::None
            }
            KeyCode::Right | KeyCode::Char('+') if field == FormField::Priority => {
                self.form.priority = (self.form.priority + 1).min(MAX_PRIORITY);
                Action::None
            }
            KeyCode::Backspace => {
                match field {
                    FormField::Text => {
                        self.form.text.pop();
                    }
                    FormField::Description => {
                        self.form.description.pop();
                    }
                    FormField::Priority => {}
                }
                Action::None
            }
            KeyCode::Char(c) => {
                match field {
                    FormField::Text => self.form.text.push(c),
                    FormField::Description => self.form.description.push(c),
                    FormField::Priority => {
                        if let Some(digit) = c.to_digit(10) {
                            self.form.priority = (digit as i32).clamp(MIN_PRIORITY, MAX_PRIORITY);
                        }
                    }
                }
                Action::None
            }
            _ => Action::None,
        }
    }

    fn render_settings(&self, frame: &mut Frame, area: Rect) {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(6), Constraint::Length(3)])
            .split(area);

        let block = Block::default()
            .title(" تنظیمات سیستم ")
            .borders(Borders::ALL);
        let lines = match &self.settings {
            Some(settings) => vec![
                Line::from(format!("پروژه: {}", settings.project_name)),
                Line::from(format!("بودجه روزانه: {:.2} $", settings.daily_budget)),
                Line::from(format!("اندازه دسته تحلیل: {}", settings.analyzer_batch_size)),
                Line::from(format!("مدل: {}", settings.claude_model)),
                Line::from(format!("API توییتر: {}", settings.twitter_api_base_url)),
                Line::from(format!(
                    "حالت اشکال‌زدایی: {}",
                    if settings.debug { "فعال" } else { "غیرفعال" }
                )),
            ],
            None => vec![Line::from(Span::styled(
                "تنظیمات در دسترس نیست",
                Style::default().fg(Color::DarkGray),
            ))],
        };
        frame.render_widget(Paragraph::new(lines).block(block), rows[0]);

        let gauge_block = Block::default().title(" مصرف بودجه ").borders(Borders::ALL);
        match &self.budget {
            Some(budget) => {
                let ratio = (budget.percentage_used / 100.0).clamp(0.0, 1.0);
                let color = if budget.is_exhausted {
                    Color::Red
                } else if ratio > 0.8 {
                    Color::Yellow
                } else {
                    Color::Green
                };
                let gauge = Gauge::default()
                    .block(gauge_block)
                    .gauge_style(Style::default().fg(color))
                    .ratio(ratio)
                    .label(format!(
                        "{:.2} / {:.2} $ (باقیمانده {:.2})",
                        budget.total_usage, budget.total_budget, budget.remaining
                    ));
                frame.render_widget(gauge, rows[1]);
            }
            None => {
                frame.render_widget(Paragraph::new("-").block(gauge_block), rows[1]);
            }
        }
    }

    fn render_form(&self, frame: &mut Frame, area: Rect, active: FormField) {
        let label = |field: FormField| {
            if field == active {
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::Gray)
            }
        };
        let lines = vec![
            Line::from(""),
            Line::from(vec![
                Span::styled("متن:      ", label(FormField::Text)),
                Span::raw(self.form.text.as_str()),
            ]),
            Line::from(vec![
                Span::styled("اولویت:   ", label(FormField::Priority)),
                Span::raw(format!("< {} >", self.form.priority)),
            ]),
            Line::from(vec![
                Span::styled("توضیحات:  ", label(FormField::Description)),
                Span::raw(self.form.description.as_str()),
            ]),
            Line::from(""),
            Line::from(Span::styled(
                "Enter افزودن | Tab فیلد بعدی | ←/→ اولویت | Esc انصراف",
                Style::default().fg(Color::DarkGray),
            )),
        ];
        render_modal(frame, area, (60, 40), "افزودن کلیدواژه", Color::Cyan, lines);
    }
}

impl PageWidget for KeywordsWidget {
    fn id(&self) -> &str {
        "keywords"
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
            .split(area);

        let block = Block::default()
            .title(format!(" کلیدواژه‌ها ({}) ", self.keywords.len()))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan));

        if self.keywords.is_empty() {
            render_placeholder(
                frame,
                columns[0],
                block,
                self.loading,
                self.error.as_deref(),
                Some("کلیدواژه‌ای یافت نشد"),
            );
        } else {
            let items: Vec<ListItem> = self
                .keywords
                .iter()
                .map(|keyword| {
                    let (marker, color) = if keyword.is_active {
                        ("● ", Color::Green)
                    } else {
                        ("○ ", Color::DarkGray)
                    };
                    let mut spans = vec![
                        Span::styled(marker, Style::default().fg(color)),
                        Span::styled(
                            keyword.text.as_str(),
                            Style::default().add_modifier(Modifier::BOLD),
                        ),
                        Span::styled(
                            format!("  اولویت {}", keyword.priority),
                            Style::default().fg(Color::Cyan),
                        ),
                        Span::styled(
                            format!("  {}", format_date(keyword.created_at.as_ref())),
                            Style::default().fg(Color::DarkGray),
                        ),
                    ];
                    if let Some(description) = &keyword.description {
                        spans.push(Span::raw(format!("  {}", description)));
                    }
                    ListItem::new(Line::from(spans))
                })
                .collect();
            let list = List::new(items)
                .block(block)
                .highlight_style(Style::default().bg(Color::DarkGray));
            let mut state = self.list_state.clone();
            frame.render_stateful_widget(list, columns[0], &mut state);
        }

        self.render_settings(frame, columns[1]);

        match &self.mode {
            KeywordsMode::Add(field) => self.render_form(frame, area, *field),
            KeywordsMode::ConfirmDelete(id) => {
                let text = self
                    .keywords
                    .iter()
                    .find(|k| k.id == *id)
                    .map(|k| k.text.as_str())
                    .unwrap_or("");
                render_modal(
                    frame,
                    area,
                    (50, 25),
                    "حذف کلیدواژه",
                    Color::Red,
                    vec![
                        Line::from(""),
                        Line::from("آیا از حذف این کلیدواژه اطمینان دارید؟"),
                        Line::from(Span::styled(
                            text,
                            Style::default().add_modifier(Modifier::BOLD),
                        )),
                        Line::from(""),
                        Line::from(Span::styled(
                            "y بله | n خیر",
                            Style::default().fg(Color::DarkGray),
                        )),
                    ],
                );
            }
            KeywordsMode::Budget => {
                render_modal(
                    frame,
                    area,
                    (50, 25),
                    "بودجه روزانه (دلار)",
                    Color::Cyan,
                    vec![
                        Line::from(""),
                        Line::from(format!("مقدار جدید: {}_", self.budget_input)),
                        Line::from(""),
                        Line::from(Span::styled(
                            "Enter ذخیره | Esc انصراف",
                            Style::default().fg(Color::DarkGray),
                        )),
                    ],
                );
            }
            KeywordsMode::Normal => {}
        }
    }

    fn update_data(&mut self, data: FeedData) {
        match data {
            FeedData::Keywords(KeywordsPanel {
                keywords,
                settings,
                budget,
            }) => {
                self.loading = false;
                self.error = None;
                self.keywords = keywords;
                self.settings = settings;
                self.budget = budget;
                clamp_selection(&mut self.list_state, self.keywords.len());
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
        Box::new(KeywordsFetcher::new(client))
    }

    fn scroll_up(&mut self) {
        select_prev(&mut self.list_state);
    }

    fn scroll_down(&mut self) {
        select_next(&mut self.list_state, self.keywords.len());
    }

    fn handle_key(&mut self, key: KeyEvent) -> Action {
        match self.mode.clone() {
            KeywordsMode::Add(field) => self.handle_form_key(field, key),
            KeywordsMode::ConfirmDelete(id) => {
                self.mode = KeywordsMode::Normal;
                match key.code {
                    KeyCode::Char('y') | KeyCode::Char('Y') => {
                        Action::Run(Command::DeleteKeyword(id))
                    }
                    _ => Action::None,
                }
            }
            KeywordsMode::Budget => match key.code {
                KeyCode::Esc => {
                    self.mode = KeywordsMode::Normal;
                    self.budget_input.clear();
                    Action::None
                }
                KeyCode::Enter => self.submit_budget(),
                KeyCode::Backspace => {
                    self.budget_input.pop();
                    Action::None
                }
                KeyCode::Char(c) if c.is_ascii_digit() || c == '.' => {
                    self.budget_input.push(c);
                    Action::None
                }
                _ => Action::None,
            },
            KeywordsMode::Normal => match key.code {
                KeyCode::Char('a') => {
                    self.form = KeywordForm::default();
                    self.mode = KeywordsMode::Add(FormField::Text);
                    Action::None
                }
                KeyCode::Char('d') | KeyCode::Delete => {
                    if let Some(id) = self.selected_keyword().map(|k| k.id) {
                        self.mode = KeywordsMode::ConfirmDelete(id);
                    }
                    Action::None
                }
                KeyCode::Char(' ') | KeyCode::Char('t') => match self.selected_keyword() {
                    Some(keyword) => {
                        let mut input = KeywordInput::from(keyword);
                        input.is_active = !keyword.is_active;
                        Action::Run(Command::UpdateKeyword {
                            id: keyword.id,
                            input,
                        })
                    }
                    None => Action::None,
                },
                KeyCode::Char('b') => {
                    self.budget_input = self
                        .settings
                        .as_ref()
                        .map(|s| s.daily_budget.to_string())
                        .unwrap_or_default();
                    self.mode = KeywordsMode::Budget;
                    Action::None
                }
                _ => Action::None,
            },
        }
    }

    fn is_editing(&self) -> bool {
        self.mode != KeywordsMode::Normal
    }

    fn key_hints(&self) -> &'static str {
        "a افزودن | d حذف | t فعال/غیرفعال | b بودجه"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::widgets::key;

    fn keyword(id: i64, text: &str, is_active: bool) -> Keyword {
        Keyword {
            id,
            text: text.to_string(),
            is_active,
            priority: 2,
            description: None,
            created_at: None,
        }
    }

    fn loaded() -> KeywordsWidget {
        let mut widget = KeywordsWidget::new();
        widget.update_data(FeedData::Keywords(KeywordsPanel {
            keywords: vec![keyword(1, "بورس", true), keyword(2, "مسکن", false)],
            settings: None,
            budget: None,
        }));
        widget
    }

    fn type_into(widget: &mut KeywordsWidget, text: &str) {
        for c in text.chars() {
            widget.handle_key(key(KeyCode::Char(c)));
        }
    }

    #[test]
    fn test_empty_text_never_creates() {
        let mut widget = loaded();
        widget.handle_key(key(KeyCode::Char('a')));
        type_into(&mut widget, "   ");

        let action = widget.handle_key(key(KeyCode::Enter));
        assert!(matches!(action, Action::Toast(_, NoticeKind::Error)));
        assert!(widget.is_editing());
    }

    #[test]
    fn test_submit_resets_form_priority() {
        let mut widget = loaded();
        widget.handle_key(key(KeyCode::Char('a')));
        type_into(&mut widget, "طلا");
        widget.handle_key(key(KeyCode::Tab));
        widget.handle_key(key(KeyCode::Right));
        widget.handle_key(key(KeyCode::Right));

        let action = widget.handle_key(key(KeyCode::Enter));
        let Action::Run(Command::CreateKeyword(input)) = action else {
            panic!("expected create, got {:?}", action);
        };
        assert_eq!(input.text, "طلا");
        assert_eq!(input.priority, 3);
        assert!(input.is_active);
        assert_eq!(input.description, None);

        assert!(!widget.is_editing());
        assert_eq!(widget.form.priority, 1);
        assert!(widget.form.text.is_empty());
    }

    #[test]
    fn test_delete_requires_confirmation() {
        let mut widget = loaded();
        assert_eq!(widget.handle_key(key(KeyCode::Char('d'))), Action::None);
        assert_eq!(widget.mode, KeywordsMode::ConfirmDelete(1));

        // anything but "y" cancels
        assert_eq!(widget.handle_key(key(KeyCode::Char('n'))), Action::None);
        assert_eq!(widget.mode, KeywordsMode::Normal);

        widget.handle_key(key(KeyCode::Char('d')));
        assert_eq!(widget.handle_key(key(KeyCode::Esc)), Action::None);

        widget.handle_key(key(KeyCode::Char('d')));
        assert_eq!(
            widget.handle_key(key(KeyCode::Char('y'))),
            Action::Run(Command::DeleteKeyword(1))
        );
    }

    #[test]
    fn test_toggle_sends_full_keyword() {
        let mut widget = loaded();
        widget.scroll_down();
        let action = widget.handle_key(key(KeyCode::Char('t')));
        assert_eq!(
            action,
            Action::Run(Command::UpdateKeyword {
                id: 2,
                input: KeywordInput {
                    text: "مسکن".to_string(),
                    is_active: true,
                    priority: 2,
                    description: None,
                },
            })
        );
    }

    #[test]
    fn test_budget_must_be_positive() {
        let mut widget = loaded();
        widget.handle_key(key(KeyCode::Char('b')));
        type_into(&mut widget, "0");
        assert!(matches!(
            widget.handle_key(key(KeyCode::Enter)),
            Action::Toast(_, NoticeKind::Error)
        ));

        widget.handle_key(key(KeyCode::Backspace));
        type_into(&mut widget, "12.5");
        assert_eq!(
            widget.handle_key(key(KeyCode::Enter)),
            Action::Run(Command::UpdateBudget(12.5))
        );
        assert!(!widget.is_editing());
    }
}
