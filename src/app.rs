//! The interactive dashboard: owns UI state and turns key presses and fetch
//! results into navigation, loads and toasts.

use crate::api::models::User;
use crate::auth::Session;
use crate::config::Config;
use crate::error::is_session_error;
use crate::feeds::commands::{Command, CommandFetcher};
use crate::feeds::login::{LoginFetcher, LoginRequest};
use crate::feeds::{FeedData, FeedFetcher, FeedMessage, NoticeKind};
use crate::format::sentiment_of;
use crate::router::{Loader, Page, Router};
use crate::ui;
use crate::ui::toast::Toast;
use crate::ui::widgets::{
    alerts::AlertsWidget, dashboard::DashboardWidget, keywords::KeywordsWidget,
    login::LoginWidget, services::ServicesWidget, tweets::TweetsWidget, Action, PageWidget,
};
use anyhow::Result;
use crossterm::{
    event::{Event, EventStream, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use futures::StreamExt;
use ratatui::{backend::CrosstermBackend, Terminal};
use std::collections::HashSet;
use std::io;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio::time::interval_at;

const LOGIN_WIDGET_ID: &str = "login";

pub struct App {
    config: Config,
    session: Session,
    router: Router,
    user: Option<User>,
    login: LoginWidget,
    pages: Vec<Box<dyn PageWidget>>,
    loading: HashSet<Loader>,
    /// Explicit reloads requested while the same load was in flight
    pending: HashSet<Loader>,
    toast: Option<Toast>,
    tx: mpsc::Sender<FeedMessage>,
    should_quit: bool,
}

impl App {
    pub fn new(config: Config, session: Session, tx: mpsc::Sender<FeedMessage>) -> Self {
        let pages: Vec<Box<dyn PageWidget>> = vec![
            Box::new(DashboardWidget::new()),
            Box::new(TweetsWidget::new(config.tweets.page_size)),
            Box::new(AlertsWidget::new(config.alerts.page_size)),
            Box::new(KeywordsWidget::new()),
            Box::new(ServicesWidget::new()),
        ];

        Self {
            config,
            session,
            router: Router::new(),
            user: None,
            login: LoginWidget::new(),
            pages,
            loading: HashSet::new(),
            pending: HashSet::new(),
            toast: None,
            tx,
            should_quit: false,
        }
    }

    pub fn current_page(&self) -> Page {
        self.router.current()
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn toast(&self) -> Option<&Toast> {
        self.toast.as_ref()
    }

    pub fn login_widget(&self) -> &LoginWidget {
        &self.login
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    pub fn page_widget(&self, page: Page) -> Option<&dyn PageWidget> {
        let id = page.loader()?.widget_id();
        self.pages.iter().find(|w| w.id() == id).map(|w| w.as_ref())
    }

    fn widget_mut(&mut self, id: &str) -> Option<&mut Box<dyn PageWidget>> {
        self.pages.iter_mut().find(|w| w.id() == id)
    }

    /// Validate a token left over from a previous run, if any.
    pub fn start(&mut self) {
        if self.session.is_logged_in() {
            self.login.update_data(FeedData::Loading);
            let fetcher = LoginFetcher::new(self.session.clone(), LoginRequest::Restore);
            self.spawn(LOGIN_WIDGET_ID, Box::new(fetcher));
        }
    }

    fn notify(&mut self, message: impl Into<String>, kind: NoticeKind) {
        let ttl = Duration::from_secs(self.config.refresh.toast_secs);
        self.toast = Some(Toast::new(message, kind, ttl));
    }

    pub fn expire_toast(&mut self, now: Instant) {
        if self.toast.as_ref().is_some_and(|t| t.is_expired(now)) {
            self.toast = None;
        }
    }

    fn spawn(&self, widget_id: &str, fetcher: Box<dyn FeedFetcher>) {
        let tx = self.tx.clone();
        let widget_id = widget_id.to_string();
        tokio::spawn(async move {
            let data = match fetcher.fetch().await {
                Ok(data) => data,
                Err(e) if is_session_error(&e) => FeedData::SessionExpired,
                Err(e) => FeedData::Error(e.to_string()),
            };
            if tx.send(FeedMessage::new(widget_id, data)).await.is_err() {
                tracing::debug!("UI gone, dropping fetch result");
            }
        });
    }

    /// Start `loader`. If the same load is still in flight the request is
    /// queued and fires once that load finishes, so the page always ends up
    /// reflecting the latest filter or mutation.
    /// Returns whether a fetch was started now.
    pub fn dispatch(&mut self, loader: Loader) -> bool {
        if !self.router.is_authenticated() {
            return false;
        }
        if self.loading.contains(&loader) {
            tracing::debug!("{:?} still loading, reload queued", loader);
            self.pending.insert(loader);
            return false;
        }
        self.start_load(loader)
    }

    fn start_load(&mut self, loader: Loader) -> bool {
        let client = self.session.client().clone();
        let Some(widget) = self.widget_mut(loader.widget_id()) else {
            return false;
        };
        widget.update_data(FeedData::Loading);
        let fetcher = widget.create_fetcher(client);

        self.loading.insert(loader);
        self.spawn(loader.widget_id(), fetcher);
        true
    }

    pub fn navigate(&mut self, page: Page) {
        if let Some(loader) = self.router.show(page) {
            self.dispatch(loader);
        }
    }

    /// Interval refresh; only the visible page reloads, and a tick that
    /// lands while the previous load is running is skipped.
    pub fn on_refresh_tick(&mut self, loader: Loader) {
        if self.router.refresh() != Some(loader) || !self.router.is_authenticated() {
            return;
        }
        if self.loading.contains(&loader) {
            tracing::debug!("{:?} already loading, skipping tick", loader);
            return;
        }
        self.start_load(loader);
    }

    fn expire_session(&mut self) {
        tracing::warn!("Session expired, returning to login");
        self.session.expire();
        self.router.session_expired();
        self.user = None;
        self.loading.clear();
        self.pending.clear();
        self.login.reset();
        self.login
            .set_error("نشست شما منقضی شده است. لطفاً دوباره وارد شوید");
        self.notify("نشست شما منقضی شده است", NoticeKind::Error);
    }

    fn logout(&mut self) {
        self.session.logout();
        self.router.session_expired();
        self.user = None;
        self.loading.clear();
        self.pending.clear();
        self.login = LoginWidget::new();
        self.notify("با موفقیت از سیستم خارج شدید", NoticeKind::Success);
    }

    pub fn handle_message(&mut self, msg: FeedMessage) {
        let FeedMessage { widget_id, data } = msg;
        let loader = Loader::from_widget_id(&widget_id);

        match data {
            FeedData::SessionExpired => self.expire_session(),
            FeedData::LoggedIn(user) => {
                tracing::info!("Session active for {}", user.email);
                self.login.update_data(FeedData::LoggedIn(user.clone()));
                self.user = Some(user);
                self.router.set_authenticated(true);
                self.notify("به سیستم رصد خوش آمدید", NoticeKind::Success);
                self.navigate(Page::Dashboard);
            }
            FeedData::LoggedOut => {
                self.login.update_data(FeedData::LoggedOut);
            }
            FeedData::Notice {
                message,
                kind,
                reload,
            } => {
                self.notify(message, kind);
                if reload {
                    if let Some(loader) = loader {
                        self.dispatch(loader);
                    }
                }
            }
            FeedData::Analysis(result) => {
                self.notify(
                    format!(
                        "تحلیل توییت با موفقیت انجام شد. احساس: {}",
                        sentiment_of(Some(result.sentiment.label))
                    ),
                    NoticeKind::Success,
                );
                if let Some(widget) = self.widget_mut(&widget_id) {
                    widget.update_data(FeedData::Analysis(result));
                }
                if let Some(loader) = loader {
                    self.dispatch(loader);
                }
            }
            data if widget_id == LOGIN_WIDGET_ID => {
                if let FeedData::Error(e) = &data {
                    tracing::warn!("Login failed: {}", e);
                }
                self.login.update_data(data);
            }
            data => {
                let finished = loader.filter(|_| data.ends_page_load());
                if let FeedData::Error(e) = &data {
                    tracing::error!("Loading {} failed: {}", widget_id, e);
                    self.notify(format!("خطا در بارگذاری: {}", e), NoticeKind::Error);
                }
                if let Some(widget) = self.widget_mut(&widget_id) {
                    widget.update_data(data);
                }
                if let Some(loader) = finished {
                    self.loading.remove(&loader);
                    if self.pending.remove(&loader) {
                        self.start_load(loader);
                    }
                }
            }
        }
    }

    pub fn handle_action(&mut self, action: Action) {
        match action {
            Action::None => {}
            Action::Quit => self.should_quit = true,
            Action::Navigate(page) => self.navigate(page),
            Action::Reload => {
                if let Some(loader) = self.router.refresh() {
                    self.dispatch(loader);
                }
            }
            Action::Run(command) => self.run_command(command),
            Action::Login { username, password } => {
                let fetcher = LoginFetcher::new(
                    self.session.clone(),
                    LoginRequest::Credentials { username, password },
                );
                self.spawn(LOGIN_WIDGET_ID, Box::new(fetcher));
            }
            Action::Logout => self.logout(),
            Action::OpenUrl(url) => {
                if let Err(e) = open::that(&url) {
                    tracing::warn!("Failed to open {}: {}", url, e);
                    self.notify(format!("باز کردن مرورگر ناموفق بود: {}", e), NoticeKind::Error);
                }
            }
            Action::Toast(message, kind) => self.notify(message, kind),
        }
    }

    fn run_command(&mut self, command: Command) {
        let Some(loader) = self.router.refresh() else {
            return;
        };
        tracing::debug!("Running {:?}", command);
        let fetcher = CommandFetcher::new(self.session.client().clone(), command);
        self.spawn(loader.widget_id(), Box::new(fetcher));
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return;
        }

        if self.router.current() == Page::Login {
            let action = self.login.handle_key(key);
            self.handle_action(action);
            return;
        }

        let Some(widget_id) = self.router.refresh().map(|l| l.widget_id()) else {
            return;
        };
        let editing = self
            .widget_mut(widget_id)
            .is_some_and(|w| w.is_editing());

        // Global keys only apply while no form or modal has focus
        if !editing {
            let action = match key.code {
                KeyCode::Char('q') => Some(Action::Quit),
                KeyCode::Tab => {
                    if let Some(loader) = self.router.next() {
                        self.dispatch(loader);
                    }
                    Some(Action::None)
                }
                KeyCode::BackTab => {
                    if let Some(loader) = self.router.previous() {
                        self.dispatch(loader);
                    }
                    Some(Action::None)
                }
                KeyCode::Char(c @ '1'..='5') => {
                    let idx = c as usize - '1' as usize;
                    Some(Action::Navigate(Page::TABS[idx]))
                }
                KeyCode::Char('r') => Some(Action::Reload),
                KeyCode::Char('L') => Some(Action::Logout),
                _ => None,
            };
            if let Some(action) = action {
                self.handle_action(action);
                return;
            }
        }

        let Some(widget) = self.widget_mut(widget_id) else {
            return;
        };
        let action = match key.code {
            KeyCode::Up | KeyCode::Char('k') if !editing => {
                widget.scroll_up();
                Action::None
            }
            KeyCode::Down | KeyCode::Char('j') if !editing => {
                widget.scroll_down();
                Action::None
            }
            _ => widget.handle_key(key),
        };
        self.handle_action(action);
    }
}

/// Take over the terminal and run the dashboard until the user quits.
pub async fn run(config: Config, session: Session) -> Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = event_loop(&mut terminal, config, session).await;

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

async fn event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    config: Config,
    session: Session,
) -> Result<()> {
    let (tx, mut rx) = mpsc::channel::<FeedMessage>(100);

    let services_every = Duration::from_secs(config.refresh.services_secs);
    let dashboard_every = Duration::from_secs(config.refresh.dashboard_secs);
    let mut services_tick = interval_at(tokio::time::Instant::now() + services_every, services_every);
    let mut dashboard_tick =
        interval_at(tokio::time::Instant::now() + dashboard_every, dashboard_every);
    let mut frame_tick = tokio::time::interval(Duration::from_millis(250));

    let mut app = App::new(config, session, tx);
    app.start();

    let mut events = EventStream::new();

    loop {
        terminal.draw(|frame| ui::render(frame, &app))?;

        if app.should_quit() {
            break;
        }

        tokio::select! {
            Some(msg) = rx.recv() => app.handle_message(msg),
            event = events.next() => match event {
                Some(Ok(Event::Key(key))) if key.kind == KeyEventKind::Press => app.handle_key(key),
                Some(Ok(_)) => {}
                Some(Err(e)) => return Err(e.into()),
                None => break,
            },
            _ = services_tick.tick() => app.on_refresh_tick(Loader::Services),
            _ = dashboard_tick.tick() => app.on_refresh_tick(Loader::Dashboard),
            _ = frame_tick.tick() => app.expire_toast(Instant::now()),
        }
    }

    Ok(())
}
