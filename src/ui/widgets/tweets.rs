use super::{
    clamp_selection, render_modal, render_placeholder, select_next, select_prev, Action,
    PageWidget,
};
use crate::api::models::{AnalysisResult, Sentiment, Tweet};
use crate::api::{ApiClient, TweetFilter};
use crate::feeds::commands::Command;
use crate::feeds::tweets::TweetsFetcher;
use crate::feeds::{FeedData, FeedFetcher, NoticeKind};
use crate::format::{format_date, sentiment_label, sentiment_of};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
    Frame,
};

#[derive(Debug, Clone, Copy, PartialEq)]
enum FilterField {
    Query,
    Sentiment,
    Keyword,
    MinImportance,
}

impl FilterField {
    fn next(self) -> Self {
        match self {
            FilterField::Query => FilterField::Sentiment,
            FilterField::Sentiment => FilterField::Keyword,
            FilterField::Keyword => FilterField::MinImportance,
            FilterField::MinImportance => FilterField::Query,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum TweetsMode {
    Normal,
    Filter(FilterField),
    Detail,
}

/// Raw text of the filter form, turned into a [`TweetFilter`] on submit
#[derive(Debug, Clone, Default)]
struct FilterForm {
    query: String,
    sentiment: Option<Sentiment>,
    keyword: String,
    min_importance: String,
}

impl FilterForm {
    fn from_filter(filter: &TweetFilter) -> Self {
        Self {
            query: filter.query.clone().unwrap_or_default(),
            sentiment: filter.sentiment,
            keyword: filter.keywords.first().cloned().unwrap_or_default(),
            min_importance: filter
                .min_importance
                .map(|m| m.to_string())
                .unwrap_or_default(),
        }
    }

    fn cycle_sentiment(&mut self, forward: bool) {
        // None stands for "all"
        let mut options: Vec<Option<Sentiment>> = vec![None];
        options.extend(Sentiment::ALL.iter().copied().map(Some));
        let idx = options
            .iter()
            .position(|o| *o == self.sentiment)
            .unwrap_or(0);
        let len = options.len();
        let next = if forward { (idx + 1) % len } else { (idx + len - 1) % len };
        self.sentiment = options[next];
    }

    fn text_mut(&mut self, field: FilterField) -> Option<&mut String> {
        match field {
            FilterField::Query => Some(&mut self.query),
            FilterField::Keyword => Some(&mut self.keyword),
            FilterField::MinImportance => Some(&mut self.min_importance),
            FilterField::Sentiment => None,
        }
    }

    fn to_filter(&self, limit: u32) -> Result<TweetFilter, String> {
        let min_importance = match self.min_importance.trim() {
            "" => None,
            raw => match raw.parse::<f64>() {
                Ok(value) if value.is_finite() => Some(value),
                _ => return Err("حداقل اهمیت باید یک عدد باشد".to_string()),
            },
        };
        let query = Some(self.query.trim().to_string()).filter(|q| !q.is_empty());
        let keywords = Some(self.keyword.trim().to_string())
            .filter(|k| !k.is_empty())
            .into_iter()
            .collect();

        Ok(TweetFilter {
            query,
            sentiment: self.sentiment,
            keywords,
            min_importance,
            limit: Some(limit),
            ..TweetFilter::default()
        })
    }
}

pub struct TweetsWidget {
    tweets: Vec<Tweet>,
    loading: bool,
    error: Option<String>,
    list_state: ListState,
    mode: TweetsMode,
    filter: TweetFilter,
    form: FilterForm,
    page_size: u32,
    analysis: Option<AnalysisResult>,
}

impl TweetsWidget {
    pub fn new(page_size: u32) -> Self {
        Self {
            tweets: Vec::new(),
            loading: false,
            error: None,
            list_state: ListState::default(),
            mode: TweetsMode::Normal,
            filter: TweetFilter {
                limit: Some(page_size),
                ..TweetFilter::default()
            },
            form: FilterForm::default(),
            page_size,
            analysis: None,
        }
    }

    pub fn filter(&self) -> &TweetFilter {
        &self.filter
    }

    fn selected_tweet(&self) -> Option<&Tweet> {
        self.list_state.selected().and_then(|i| self.tweets.get(i))
    }

    fn apply_filter(&mut self) -> Action {
        match self.form.to_filter(self.page_size) {
            Ok(filter) => {
                self.filter = filter;
                self.mode = TweetsMode::Normal;
                Action::Reload
            }
            Err(message) => Action::Toast(message, NoticeKind::Error),
        }
    }

    fn reset_filter(&mut self) -> Action {
        self.form = FilterForm::default();
        self.filter = TweetFilter {
            limit: Some(self.page_size),
            ..TweetFilter::default()
        };
        self.mode = TweetsMode::Normal;
        Action::Reload
    }

    fn handle_filter_key(&mut self, field: FilterField, key: KeyEvent) -> Action {
        match key.code {
            KeyCode::Esc => {
                self.mode = TweetsMode::Normal;
                Action::None
            }
            KeyCode::Enter => self.apply_filter(),
            KeyCode::Tab | KeyCode::Down => {
                self.mode = TweetsMode::Filter(field.next());
                Action::None
            }
            KeyCode::Left if field == FilterField::Sentiment => {
                self.form.cycle_sentiment(false);
                Action::None
            }
            KeyCode::Right | KeyCode::Char(' ') if field == FilterField::Sentiment => {
                self.form.cycle_sentiment(true);
                Action::None
            }
            KeyCode::Backspace => {
                if let Some(text) = self.form.text_mut(field) {
                    text.pop();
                }
                Action::None
            }
            KeyCode::Char(c) => {
                if let Some(text) = self.form.text_mut(field) {
                    text.push(c);
                }
                Action::None
            }
            _ => Action::None,
        }
    }

    fn render_filter_form(&self, frame: &mut Frame, area: Rect, active: FilterField) {
        let label_style = |field: FilterField| {
            if field == active {
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::Gray)
            }
        };
        let sentiment = self
            .form
            .sentiment
            .map(|s| sentiment_label(s.as_str()))
            .unwrap_or("همه");

        let lines = vec![
            Line::from(""),
            Line::from(vec![
                Span::styled("جستجو:        ", label_style(FilterField::Query)),
                Span::raw(self.form.query.as_str()),
            ]),
            Line::from(vec![
                Span::styled("احساس:        ", label_style(FilterField::Sentiment)),
                Span::raw(format!("< {} >", sentiment)),
            ]),
            Line::from(vec![
                Span::styled("کلیدواژه:     ", label_style(FilterField::Keyword)),
                Span::raw(self.form.keyword.as_str()),
            ]),
            Line::from(vec![
                Span::styled("حداقل اهمیت:  ", label_style(FilterField::MinImportance)),
                Span::raw(self.form.min_importance.as_str()),
            ]),
            Line::from(""),
            Line::from(Span::styled(
                "Enter اعمال | Tab فیلد بعدی | ←/→ تغییر احساس | Esc انصراف",
                Style::default().fg(Color::DarkGray),
            )),
        ];
        render_modal(frame, area, (60, 45), "فیلتر توییت‌ها", Color::Cyan, lines);
    }

    fn render_detail(&self, frame: &mut Frame, area: Rect, tweet: &Tweet) {
        let mut lines = vec![
            Line::from(Span::styled(
                tweet.author().to_string(),
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(
                format_date(tweet.created_at.as_ref()),
                Style::default().fg(Color::DarkGray),
            )),
            Line::from(""),
            Line::from(tweet.content.as_str()),
            Line::from(""),
            Line::from(format!(
                "احساس: {}  امتیاز: {}  اهمیت: {}",
                sentiment_of(tweet.sentiment_label),
                tweet
                    .sentiment_score
                    .map(|s| format!("{:.2}", s))
                    .unwrap_or_else(|| "-".to_string()),
                tweet
                    .importance_score
                    .map(|s| format!("{:.2}", s))
                    .unwrap_or_else(|| "-".to_string()),
            )),
        ];

        if let Some(url) = tweet.url() {
            lines.push(Line::from(Span::styled(url, Style::default().fg(Color::Blue))));
        }

        if let Some(analysis) = self.analysis.as_ref().filter(|a| a.tweet_id == tweet.id) {
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(
                "نتیجه تحلیل",
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            )));
            lines.push(Line::from(format!(
                "احساس: {} ({:.2})",
                sentiment_of(Some(analysis.sentiment.label)),
                analysis.sentiment.score
            )));
            if let Some(explanation) = &analysis.sentiment.explanation {
                lines.push(Line::from(explanation.as_str()));
            }
            if let Some(main_topic) = &analysis.main_topic {
                lines.push(Line::from(format!("موضوع اصلی: {}", main_topic)));
            }
            if !analysis.keywords.is_empty() {
                lines.push(Line::from(format!(
                    "کلیدواژه‌ها: {}",
                    analysis.keywords.join("، ")
                )));
            }
        }

        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            "a تحلیل | o باز کردن در مرورگر | Esc بستن",
            Style::default().fg(Color::DarkGray),
        )));
        render_modal(frame, area, (80, 70), "جزئیات توییت", Color::Cyan, lines);
    }
}

impl PageWidget for TweetsWidget {
    fn id(&self) -> &str {
        "tweets"
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Min(3)])
            .split(area);

        // Active filter summary
        let pairs = self.filter.to_pairs();
        let summary: Vec<String> = pairs
            .iter()
            .filter(|(k, _)| *k != "limit")
            .map(|(k, v)| format!("{}={}", k, v))
            .collect();
        let summary = if summary.is_empty() {
            "بدون فیلتر".to_string()
        } else {
            summary.join("  ")
        };
        frame.render_widget(
            Paragraph::new(summary).block(Block::default().borders(Borders::ALL).title(" فیلتر ")),
            chunks[0],
        );

        let block = Block::default()
            .title(format!(" توییت‌ها ({}) ", self.tweets.len()))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan));

        if self.tweets.is_empty() {
            render_placeholder(
                frame,
                chunks[1],
                block,
                self.loading,
                self.error.as_deref(),
                Some("توییتی یافت نشد"),
            );
        } else {
            let items: Vec<ListItem> = self
                .tweets
                .iter()
                .map(|tweet| {
                    let sentiment_color = match tweet.sentiment_label {
                        Some(Sentiment::Positive) => Color::Green,
                        Some(Sentiment::Negative) => Color::Red,
                        Some(Sentiment::Mixed) => Color::Magenta,
                        _ => Color::Gray,
                    };
                    let header = Line::from(vec![
                        Span::styled(
                            tweet.author().to_string(),
                            Style::default().add_modifier(Modifier::BOLD),
                        ),
                        Span::styled(
                            format!("  [{}]", sentiment_of(tweet.sentiment_label)),
                            Style::default().fg(sentiment_color),
                        ),
                        Span::styled(
                            format!("  {}", format_date(tweet.created_at.as_ref())),
                            Style::default().fg(Color::DarkGray),
                        ),
                    ]);
                    let body = Line::from(format!(
                        "  {}",
                        crate::format::truncate_message(&tweet.content, 140)
                    ));
                    ListItem::new(vec![header, body])
                })
                .collect();

            let list = List::new(items).block(block).highlight_style(
                Style::default()
                    .bg(Color::DarkGray)
                    .add_modifier(Modifier::BOLD),
            );
            let mut state = self.list_state.clone();
            frame.render_stateful_widget(list, chunks[1], &mut state);
        }

        match &self.mode {
            TweetsMode::Filter(field) => self.render_filter_form(frame, area, *field),
            TweetsMode::Detail => {
                if let Some(tweet) = self.selected_tweet() {
                    self.render_detail(frame, area, tweet);
                }
            }
            TweetsMode::Normal => {}
        }
    }

    fn update_data(&mut self, data: FeedData) {
        match data {
            FeedData::Tweets(tweets) => {
                self.loading = false;
                self.error = None;
                self.tweets = tweets;
                clamp_selection(&mut self.list_state, self.tweets.len());
            }
            FeedData::Analysis(result) => {
                self.analysis = Some(result);
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
        Box::new(TweetsFetcher::new(client, self.filter.clone()))
    }

    fn scroll_up(&mut self) {
        select_prev(&mut self.list_state);
    }

    fn scroll_down(&mut self) {
        select_next(&mut self.list_state, self.tweets.len());
    }

    fn handle_key(&mut self, key: KeyEvent) -> Action {
        if let TweetsMode::Filter(field) = self.mode {
            return self.handle_filter_key(field, key);
        }

        match key.code {
            KeyCode::Char('/') | KeyCode::Char('f') => {
                self.form = FilterForm::from_filter(&self.filter);
                self.mode = TweetsMode::Filter(FilterField::Query);
                Action::None
            }
            KeyCode::Char('x') => self.reset_filter(),
            KeyCode::Enter => {
                if self.selected_tweet().is_some() {
                    self.mode = TweetsMode::Detail;
                }
                Action::None
            }
            KeyCode::Esc => {
                self.mode = TweetsMode::Normal;
                Action::None
            }
            KeyCode::Char('a') => match self.selected_tweet() {
                Some(tweet) => Action::Run(Command::AnalyzeTweet(tweet.id)),
                None => Action::None,
            },
            KeyCode::Char('o') => match self.selected_tweet().and_then(Tweet::url) {
                Some(url) => Action::OpenUrl(url),
                None => Action::Toast("آدرسی برای این توییت وجود ندارد".to_string(), NoticeKind::Info),
            },
            _ => Action::None,
        }
    }

    fn is_editing(&self) -> bool {
        matches!(self.mode, TweetsMode::Filter(_))
    }

    fn key_hints(&self) -> &'static str {
        "/ فیلتر | x حذف فیلتر | Enter جزئیات | a تحلیل | o مرورگر"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::widgets::key;

    fn tweet(id: i64, username: Option<&str>) -> Tweet {
        let user = username.map(|u| {
            serde_json::from_value(serde_json::json!({"user_id": "1", "username": u})).unwrap()
        });
        Tweet {
            id,
            tweet_id: format!("17{}", id),
            content: "متن توییت".to_string(),
            created_at: None,
            language: Some("fa".to_string()),
            user,
            sentiment_label: Some(Sentiment::Neutral),
            sentiment_score: None,
            importance_score: Some(0.4),
            is_processed: true,
            is_analyzed: false,
            entities: None,
        }
    }

    fn loaded() -> TweetsWidget {
        let mut widget = TweetsWidget::new(100);
        widget.update_data(FeedData::Tweets(vec![tweet(1, Some("rasad_ir")), tweet(2, None)]));
        widget
    }

    fn type_into(widget: &mut TweetsWidget, text: &str) {
        for c in text.chars() {
            widget.handle_key(key(KeyCode::Char(c)));
        }
    }

    #[test]
    fn test_filter_form_builds_filter() {
        let mut widget = loaded();
        widget.handle_key(key(KeyCode::Char('/')));
        assert!(widget.is_editing());

        type_into(&mut widget, "دلار");
        widget.handle_key(key(KeyCode::Tab));
        widget.handle_key(key(KeyCode::Right));
        widget.handle_key(key(KeyCode::Right));
        widget.handle_key(key(KeyCode::Tab));
        type_into(&mut widget, "ارز");
        widget.handle_key(key(KeyCode::Tab));
        type_into(&mut widget, "0.5");

        assert_eq!(widget.handle_key(key(KeyCode::Enter)), Action::Reload);
        assert!(!widget.is_editing());

        let filter = widget.filter();
        assert_eq!(filter.query.as_deref(), Some("دلار"));
        assert_eq!(filter.sentiment, Some(Sentiment::Negative));
        assert_eq!(filter.keywords, vec!["ارز".to_string()]);
        assert_eq!(filter.min_importance, Some(0.5));
        assert_eq!(filter.limit, Some(100));
    }

    #[test]
    fn test_invalid_importance_keeps_form_open() {
        let mut widget = loaded();
        widget.handle_key(key(KeyCode::Char('f')));
        for _ in 0..3 {
            widget.handle_key(key(KeyCode::Tab));
        }
        type_into(&mut widget, "زیاد");

        match widget.handle_key(key(KeyCode::Enter)) {
            Action::Toast(_, NoticeKind::Error) => {}
            other => panic!("unexpected {:?}", other),
        }
        assert!(widget.is_editing());
    }

    #[test]
    fn test_reset_clears_filter() {
        let mut widget = loaded();
        widget.handle_key(key(KeyCode::Char('/')));
        type_into(&mut widget, "q");
        widget.handle_key(key(KeyCode::Enter));
        assert!(!widget.filter().is_empty());

        assert_eq!(widget.handle_key(key(KeyCode::Char('x'))), Action::Reload);
        assert_eq!(widget.filter().to_pairs(), vec![("limit", "100".to_string())]);
    }

    #[test]
    fn test_analyze_and_open_selected() {
        let mut widget = loaded();
        assert_eq!(
            widget.handle_key(key(KeyCode::Char('a'))),
            Action::Run(Command::AnalyzeTweet(1))
        );
        assert_eq!(
            widget.handle_key(key(KeyCode::Char('o'))),
            Action::OpenUrl("https://twitter.com/rasad_ir/status/171".to_string())
        );

        widget.scroll_down();
        assert!(matches!(
            widget.handle_key(key(KeyCode::Char('o'))),
            Action::Toast(_, NoticeKind::Info)
        ));
    }

    #[test]
    fn test_detail_view_toggles() {
        let mut widget = loaded();
        widget.handle_key(key(KeyCode::Enter));
        assert_eq!(widget.mode, TweetsMode::Detail);
        widget.handle_key(key(KeyCode::Esc));
        assert_eq!(widget.mode, TweetsMode::Normal);
    }
}
