//! Page routing: which page is visible and which loader a navigation triggers.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Page {
    Login,
    Dashboard,
    Tweets,
    Alerts,
    Keywords,
    Services,
}

impl Page {
    /// Pages reachable from the tab bar, in display order
    pub const TABS: [Page; 5] = [
        Page::Dashboard,
        Page::Tweets,
        Page::Alerts,
        Page::Keywords,
        Page::Services,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            Page::Login => "ورود",
            Page::Dashboard => "داشبورد",
            Page::Tweets => "توییت‌ها",
            Page::Alerts => "هشدارها",
            Page::Keywords => "تنظیمات",
            Page::Services => "سرویس‌ها",
        }
    }

    pub fn loader(&self) -> Option<Loader> {
        match self {
            Page::Login => None,
            Page::Dashboard => Some(Loader::Dashboard),
            Page::Tweets => Some(Loader::Tweets),
            Page::Alerts => Some(Loader::Alerts),
            Page::Keywords => Some(Loader::Keywords),
            Page::Services => Some(Loader::Services),
        }
    }

    pub fn from_name(name: &str) -> Option<Page> {
        match name {
            "login" => Some(Page::Login),
            "dashboard" => Some(Page::Dashboard),
            "tweets" => Some(Page::Tweets),
            "alerts" => Some(Page::Alerts),
            "keywords" | "settings" => Some(Page::Keywords),
            "services" => Some(Page::Services),
            _ => None,
        }
    }
}

/// The fetch a page needs when it becomes visible
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Loader {
    Dashboard,
    Tweets,
    Alerts,
    Keywords,
    Services,
}

#[derive(Debug, Clone)]
pub struct Router {
    current: Page,
    authenticated: bool,
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

impl Router {
    pub fn new() -> Self {
        Self {
            current: Page::Login,
            authenticated: false,
        }
    }

    pub fn current(&self) -> Page {
        self.current
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    pub fn set_authenticated(&mut self, authenticated: bool) {
        self.authenticated = authenticated;
    }

    /// Make `page` visible and return the loader it needs.
    ///
    /// Without a session every page resolves to the login page.
    pub fn show(&mut self, page: Page) -> Option<Loader> {
        let target = if self.authenticated { page } else { Page::Login };
        if target != page {
            tracing::debug!("Redirecting {:?} to login, no session", page);
        }
        self.current = target;
        target.loader()
    }

    /// Reload whatever page is visible.
    pub fn refresh(&self) -> Option<Loader> {
        self.current.loader()
    }

    /// The server rejected our token: drop the session and show login.
    pub fn session_expired(&mut self) {
        self.authenticated = false;
        self.current = Page::Login;
    }

    pub fn next(&mut self) -> Option<Loader> {
        self.cycle(1)
    }

    pub fn previous(&mut self) -> Option<Loader> {
        self.cycle(Page::TABS.len() - 1)
    }

    fn cycle(&mut self, step: usize) -> Option<Loader> {
        let idx = Page::TABS
            .iter()
            .position(|p| *p == self.current)
            .unwrap_or(0);
        let next = Page::TABS[(idx + step) % Page::TABS.len()];
        self.show(next)
    }
}
