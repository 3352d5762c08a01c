//! Wire types exchanged with the Rasad backend.
//!
//! These mirror the backend's response schemas. The client never enforces
//! invariants on them beyond display defaults; the server owns their lifecycle.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// The backend emits both RFC 3339 stamps and naive ISO stamps (no offset).
/// Naive stamps are taken as UTC; anything unparseable becomes `None`.
fn lenient_datetime<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(parse_timestamp))
}

pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

#[derive(Debug, Clone, Deserialize)]
pub struct Token {
    pub access_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
}

fn default_token_type() -> String {
    "bearer".to_string()
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct User {
    #[serde(default)]
    pub id: i64,
    pub email: String,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub is_superuser: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Negative,
    Neutral,
    Mixed,
    #[serde(other)]
    Unknown,
}

impl Sentiment {
    pub const ALL: [Sentiment; 4] = [
        Sentiment::Positive,
        Sentiment::Negative,
        Sentiment::Neutral,
        Sentiment::Mixed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Sentiment::Positive => "positive",
            Sentiment::Negative => "negative",
            Sentiment::Neutral => "neutral",
            Sentiment::Mixed => "mixed",
            Sentiment::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct TwitterUser {
    pub user_id: String,
    pub username: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub followers_count: Option<u64>,
    #[serde(default)]
    pub following_count: Option<u64>,
    #[serde(default)]
    pub verified: Option<bool>,
    #[serde(default)]
    pub profile_image_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct Tweet {
    pub id: i64,
    pub tweet_id: String,
    pub content: String,
    #[serde(default, deserialize_with = "lenient_datetime")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub user: Option<TwitterUser>,
    #[serde(default)]
    pub sentiment_label: Option<Sentiment>,
    #[serde(default)]
    pub sentiment_score: Option<f64>,
    #[serde(default)]
    pub importance_score: Option<f64>,
    #[serde(default)]
    pub is_processed: bool,
    #[serde(default)]
    pub is_analyzed: bool,
    #[serde(default)]
    pub entities: Option<serde_json::Value>,
}

impl Tweet {
    pub fn author(&self) -> &str {
        self.user
            .as_ref()
            .map(|u| u.username.as_str())
            .unwrap_or("ناشناس")
    }

    /// Public URL of the tweet, when the author is known.
    pub fn url(&self) -> Option<String> {
        self.user
            .as_ref()
            .map(|u| format!("https://twitter.com/{}/status/{}", u.username, self.tweet_id))
    }
}

#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct SentimentCounts {
    #[serde(default)]
    pub positive: u64,
    #[serde(default)]
    pub negative: u64,
    #[serde(default)]
    pub neutral: u64,
    #[serde(default)]
    pub mixed: u64,
}

#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct TweetCount {
    pub total: u64,
    #[serde(default)]
    pub sentiment_counts: SentimentCounts,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct Keyword {
    pub id: i64,
    pub text: String,
    pub is_active: bool,
    pub priority: i32,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "lenient_datetime")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Body of keyword create and update calls
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct KeywordInput {
    pub text: String,
    pub is_active: bool,
    pub priority: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl KeywordInput {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_active: true,
            priority: 1,
            description: None,
        }
    }
}

impl From<&Keyword> for KeywordInput {
    fn from(keyword: &Keyword) -> Self {
        Self {
            text: keyword.text.clone(),
            is_active: keyword.is_active,
            priority: keyword.priority,
            description: keyword.description.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    High,
    Medium,
    Low,
    #[serde(other)]
    Unknown,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::High => "high",
            Severity::Medium => "medium",
            Severity::Low => "low",
            Severity::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct Alert {
    pub id: i64,
    pub title: String,
    pub message: String,
    pub severity: Severity,
    pub alert_type: String,
    #[serde(default)]
    pub related_tweet_id: Option<i64>,
    #[serde(default)]
    pub data: Option<serde_json::Value>,
    pub is_read: bool,
    #[serde(default, deserialize_with = "lenient_datetime")]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct Topic {
    #[serde(default)]
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub tweet_count: u64,
    #[serde(default)]
    pub avg_relevance: Option<f64>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct SentimentData {
    pub label: Sentiment,
    pub score: f64,
    #[serde(default)]
    pub confidence: Option<f64>,
    #[serde(default)]
    pub explanation: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct TopicData {
    pub title: String,
    pub relevance: f64,
    #[serde(default)]
    pub keywords: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct AnalysisResult {
    pub tweet_id: i64,
    pub content: String,
    pub sentiment: SentimentData,
    #[serde(default)]
    pub topics: Vec<TopicData>,
    #[serde(default)]
    pub main_topic: Option<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
    pub is_analyzed: bool,
    #[serde(default, deserialize_with = "lenient_datetime")]
    pub analysis_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceState {
    Running,
    Stopped,
    Starting,
    Error,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq)]
pub struct MemoryUsage {
    pub rss: f64,
    pub vms: f64,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct ServiceStatus {
    pub status: ServiceState,
    #[serde(default)]
    pub pid: Option<u32>,
    #[serde(default)]
    pub running: bool,
    #[serde(default)]
    pub memory_usage: Option<MemoryUsage>,
    #[serde(default)]
    pub cpu_percent: Option<f64>,
    /// Seconds since the process started
    #[serde(default)]
    pub uptime: Option<f64>,
    #[serde(default)]
    pub uptime_human: Option<String>,
}

impl ServiceStatus {
    pub fn is_running(&self) -> bool {
        self.status == ServiceState::Running
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct SystemInfo {
    #[serde(default)]
    pub hostname: Option<String>,
    #[serde(default)]
    pub platform: Option<String>,
    #[serde(default)]
    pub cpu_count: Option<u32>,
    /// GiB
    #[serde(default)]
    pub memory_total: Option<f64>,
    #[serde(default)]
    pub memory_available: Option<f64>,
    #[serde(default)]
    pub memory_percent: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct ServicesOverview {
    #[serde(default)]
    pub services: BTreeMap<String, ServiceStatus>,
    #[serde(default)]
    pub system_info: Option<SystemInfo>,
    #[serde(default)]
    pub timestamp: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct ServiceAction {
    pub status: String,
    pub service: String,
    #[serde(default)]
    pub timestamp: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct ServiceLogs {
    pub service: String,
    #[serde(default)]
    pub logs: BTreeMap<String, String>,
    #[serde(default)]
    pub timestamp: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct SystemSettings {
    pub project_name: String,
    pub debug: bool,
    pub daily_budget: f64,
    pub analyzer_batch_size: u32,
    pub twitter_api_base_url: String,
    pub claude_model: String,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct BudgetStatus {
    #[serde(default)]
    pub total_budget: f64,
    #[serde(default)]
    pub total_usage: f64,
    #[serde(default)]
    pub claude_usage: f64,
    #[serde(default)]
    pub twitter_usage: f64,
    #[serde(default)]
    pub remaining: f64,
    #[serde(default)]
    pub percentage_used: f64,
    #[serde(default)]
    pub is_exhausted: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tweet_decodes_backend_payload() {
        let json = r#"{
            "id": 7,
            "tweet_id": "1790000000000000000",
            "content": "سلام دنیا",
            "created_at": "2025-03-01T10:15:00Z",
            "user": {"user_id": "42", "username": "rasad_bot"},
            "sentiment_label": "positive",
            "sentiment_score": 0.8,
            "importance_score": 4.5,
            "is_processed": true,
            "is_analyzed": true
        }"#;

        let tweet: Tweet = serde_json::from_str(json).unwrap();
        assert_eq!(tweet.author(), "rasad_bot");
        assert_eq!(tweet.sentiment_label, Some(Sentiment::Positive));
        assert_eq!(
            tweet.url().as_deref(),
            Some("https://twitter.com/rasad_bot/status/1790000000000000000")
        );
    }

    #[test]
    fn test_tweet_without_user_is_anonymous() {
        let json = r#"{"id": 1, "tweet_id": "1", "content": "x", "is_processed": false, "is_analyzed": false}"#;
        let tweet: Tweet = serde_json::from_str(json).unwrap();
        assert_eq!(tweet.author(), "ناشناس");
        assert!(tweet.url().is_none());
    }

    #[test]
    fn test_unknown_enum_values_do_not_fail() {
        let alert: Alert = serde_json::from_str(
            r#"{"id": 3, "title": "t", "message": "m", "severity": "critical",
                "alert_type": "volume_wave", "is_read": false,
                "created_at": "2025-03-01T10:15:00Z"}"#,
        )
        .unwrap();
        assert_eq!(alert.severity, Severity::Unknown);

        let status: ServiceStatus = serde_json::from_str(r#"{"status": "zombie"}"#).unwrap();
        assert_eq!(status.status, ServiceState::Unknown);
    }

    #[test]
    fn test_services_overview_decodes() {
        let json = r#"{
            "services": {
                "collector": {"status": "running", "pid": 100, "running": true, "uptime": 3661.4, "uptime_human": "1:01:01"},
                "analyzer": {"status": "stopped", "pid": null, "running": false, "uptime": null}
            },
            "system_info": {"hostname": "rasad-01", "cpu_count": 8},
            "timestamp": "2025-03-01T10:15:00"
        }"#;

        let overview: ServicesOverview = serde_json::from_str(json).unwrap();
        assert_eq!(overview.services.len(), 2);
        assert!(overview.services["collector"].is_running());
        assert!(!overview.services["analyzer"].is_running());
        assert_eq!(
            overview.system_info.unwrap().hostname.as_deref(),
            Some("rasad-01")
        );
    }

    #[test]
    fn test_naive_timestamps_are_utc() {
        let keyword: Keyword = serde_json::from_str(
            r#"{"id": 1, "text": "نفت", "is_active": true, "priority": 2,
                "created_at": "2025-03-01T10:15:00.123456"}"#,
        )
        .unwrap();
        let created = keyword.created_at.unwrap();
        assert_eq!(created.to_rfc3339(), "2025-03-01T10:15:00.123456+00:00");

        assert!(parse_timestamp("yesterday").is_none());
    }

    #[test]
    fn test_keyword_input_defaults() {
        let input = KeywordInput::new("انتخابات");
        assert!(input.is_active);
        assert_eq!(input.priority, 1);

        let body = serde_json::to_value(&input).unwrap();
        assert!(body.get("description").is_none());
    }
}
