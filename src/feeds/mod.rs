pub mod alerts;
pub mod commands;
pub mod dashboard;
pub mod keywords;
pub mod login;
pub mod services;
pub mod tweets;

use crate::api::models::{
    Alert, AnalysisResult, BudgetStatus, Keyword, ServiceLogs, ServicesOverview, SystemSettings,
    Topic, Tweet, TweetCount, User,
};
use crate::router::Loader;
use anyhow::Result;
use async_trait::async_trait;

#[derive(Debug, Clone)]
pub struct FeedMessage {
    pub widget_id: String,
    pub data: FeedData,
}

impl FeedMessage {
    pub fn new(widget_id: impl Into<String>, data: FeedData) -> Self {
        Self {
            widget_id: widget_id.into(),
            data,
        }
    }
}

#[derive(Debug, Clone)]
pub enum FeedData {
    Dashboard(DashboardSnapshot),
    Tweets(Vec<Tweet>),
    Alerts(Vec<Alert>),
    Keywords(KeywordsPanel),
    Services(ServicesOverview),
    ServiceLogs(ServiceLogs),
    Analysis(AnalysisResult),
    LoggedIn(User),
    LoggedOut,
    /// Outcome of a mutation; `reload` asks for the page to be fetched again
    Notice {
        message: String,
        kind: NoticeKind,
        reload: bool,
    },
    SessionExpired,
    Loading,
    Error(String),
}

impl FeedData {
    /// True for the payloads a page loader produces, including its failure.
    pub fn ends_page_load(&self) -> bool {
        matches!(
            self,
            FeedData::Dashboard(_)
                | FeedData::Tweets(_)
                | FeedData::Alerts(_)
                | FeedData::Keywords(_)
                | FeedData::Services(_)
                | FeedData::Error(_)
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Info,
    Error,
}

/// Everything the home page shows, fetched together
#[derive(Debug, Clone, Default)]
pub struct DashboardSnapshot {
    pub count: TweetCount,
    pub alerts: Vec<Alert>,
    pub topics: Vec<Topic>,
    pub keywords: Vec<Keyword>,
    pub services: Option<ServicesOverview>,
}

/// Keyword list plus the system settings and budget shown beside it
#[derive(Debug, Clone, Default)]
pub struct KeywordsPanel {
    pub keywords: Vec<Keyword>,
    pub settings: Option<SystemSettings>,
    pub budget: Option<BudgetStatus>,
}

impl Loader {
    pub fn widget_id(&self) -> &'static str {
        match self {
            Loader::Dashboard => "dashboard",
            Loader::Tweets => "tweets",
            Loader::Alerts => "alerts",
            Loader::Keywords => "keywords",
            Loader::Services => "services",
        }
    }

    pub fn from_widget_id(id: &str) -> Option<Loader> {
        match id {
            "dashboard" => Some(Loader::Dashboard),
            "tweets" => Some(Loader::Tweets),
            "alerts" => Some(Loader::Alerts),
            "keywords" => Some(Loader::Keywords),
            "services" => Some(Loader::Services),
            _ => None,
        }
    }
}

#[async_trait]
pub trait FeedFetcher: Send + Sync {
    async fn fetch(&self) -> Result<FeedData>;
}
