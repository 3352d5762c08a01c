//! Display helpers shared by the page widgets and the CLI.

use chrono::{DateTime, Local, Utc};

use crate::api::models::{Sentiment, ServiceStatus, Severity};
use std::collections::BTreeMap;

/// `H:MM:SS`, hours unpadded. Zero or missing uptime renders as nothing.
pub fn format_uptime(seconds: u64) -> String {
    if seconds == 0 {
        return String::new();
    }
    clock(seconds)
}

fn clock(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;

    format!("{}:{:02}:{:02}", hours, minutes, secs)
}

/// Uptime as reported by the backend, preferring its own human string.
pub fn service_uptime(status: &ServiceStatus) -> String {
    if let Some(human) = status.uptime_human.as_deref().filter(|h| !h.is_empty()) {
        return human.to_string();
    }
    status
        .uptime
        .filter(|secs| *secs > 0.0)
        .map(|secs| clock(secs as u64))
        .unwrap_or_default()
}

pub fn sentiment_label(sentiment: &str) -> &'static str {
    match sentiment {
        "positive" => "مثبت",
        "negative" => "منفی",
        "neutral" => "خنثی",
        "mixed" => "ترکیبی",
        _ => "نامشخص",
    }
}

pub fn sentiment_of(sentiment: Option<Sentiment>) -> &'static str {
    sentiment_label(sentiment.map(|s| s.as_str()).unwrap_or_default())
}

pub fn severity_label(severity: Severity) -> &'static str {
    match severity {
        Severity::High => "بالا",
        Severity::Medium => "متوسط",
        Severity::Low => "پایین",
        Severity::Unknown => "نامشخص",
    }
}

pub fn format_date(date: Option<&DateTime<Utc>>) -> String {
    match date {
        Some(date) => date
            .with_timezone(&Local)
            .format("%Y-%m-%d %H:%M")
            .to_string(),
        None => "تاریخ نامشخص".to_string(),
    }
}

/// Cut `message` to `max` characters, marking the cut with `...`.
pub fn truncate_message(message: &str, max: usize) -> String {
    if message.chars().count() <= max {
        return message.to_string();
    }
    let mut cut: String = message.chars().take(max).collect();
    cut.push_str("...");
    cut
}

/// Rounded share of `part` in `total`, guarding against an empty total.
pub fn percent(part: u64, total: u64) -> u64 {
    let total = total.max(1);
    ((part as f64 / total as f64) * 100.0).round() as u64
}

pub fn service_display_name(name: &str) -> &str {
    match name {
        "collector" => "جمع‌آوری‌کننده",
        "processor" => "پردازشگر",
        "analyzer" => "تحلیلگر",
        "all" => "همه سرویس‌ها",
        other => other,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverallStatus {
    Running,
    Stopped,
    Partial,
}

impl OverallStatus {
    pub fn label(&self) -> &'static str {
        match self {
            OverallStatus::Running => "در حال اجرا",
            OverallStatus::Stopped => "متوقف",
            OverallStatus::Partial => "اجرای بخشی",
        }
    }
}

/// Running when every service runs, stopped when none does, partial otherwise.
pub fn overall_status(services: &BTreeMap<String, ServiceStatus>) -> OverallStatus {
    let running = services.values().filter(|s| s.is_running()).count();
    if running == services.len() && !services.is_empty() {
        OverallStatus::Running
    } else if running == 0 {
        OverallStatus::Stopped
    } else {
        OverallStatus::Partial
    }
}

pub fn running_label(running: bool) -> &'static str {
    if running {
        OverallStatus::Running.label()
    } else {
        OverallStatus::Stopped.label()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::ServiceState;

    fn status(state: ServiceState) -> ServiceStatus {
        ServiceStatus {
            status: state,
            pid: None,
            running: state == ServiceState::Running,
            memory_usage: None,
            cpu_percent: None,
            uptime: None,
            uptime_human: None,
        }
    }

    #[test]
    fn test_format_uptime() {
        assert_eq!(format_uptime(0), "");
        assert_eq!(format_uptime(3661), "1:01:01");
        assert_eq!(format_uptime(59), "0:00:59");
        assert_eq!(format_uptime(90061), "25:01:01");
    }

    #[test]
    fn test_service_uptime_prefers_backend_string() {
        let mut s = status(ServiceState::Running);
        s.uptime = Some(3661.9);
        assert_eq!(service_uptime(&s), "1:01:01");
        s.uptime_human = Some("2 days, 0:00:01".to_string());
        assert_eq!(service_uptime(&s), "2 days, 0:00:01");
        assert_eq!(service_uptime(&status(ServiceState::Stopped)), "");
    }

    #[test]
    fn test_service_uptime_under_a_second() {
        let mut s = status(ServiceState::Running);
        s.uptime = Some(0.5);
        assert_eq!(service_uptime(&s), "0:00:00");
        s.uptime = Some(0.0);
        assert_eq!(service_uptime(&s), "");
        s.uptime = Some(-3.0);
        assert_eq!(service_uptime(&s), "");
    }

    #[test]
    fn test_sentiment_label() {
        assert_eq!(sentiment_label("positive"), "مثبت");
        assert_eq!(sentiment_label("negative"), "منفی");
        assert_eq!(sentiment_label("neutral"), "خنثی");
        assert_eq!(sentiment_label("mixed"), "ترکیبی");
        assert_eq!(sentiment_label("sarcastic"), "نامشخص");
        assert_eq!(sentiment_label(""), "نامشخص");
        assert_eq!(sentiment_of(None), "نامشخص");
        assert_eq!(sentiment_of(Some(Sentiment::Positive)), "مثبت");
    }

    #[test]
    fn test_format_date_missing() {
        assert_eq!(format_date(None), "تاریخ نامشخص");
    }

    #[test]
    fn test_truncate_message() {
        assert_eq!(truncate_message("short", 100), "short");
        let long = "ی".repeat(120);
        let cut = truncate_message(&long, 100);
        assert_eq!(cut.chars().count(), 103);
        assert!(cut.ends_with("..."));
    }

    #[test]
    fn test_percent_guards_zero_total() {
        assert_eq!(percent(0, 0), 0);
        assert_eq!(percent(50, 123), 41);
        assert_eq!(percent(1, 3), 33);
        assert_eq!(percent(2, 3), 67);
    }

    #[test]
    fn test_overall_status() {
        let mut services = BTreeMap::new();
        services.insert("collector".to_string(), status(ServiceState::Running));
        services.insert("processor".to_string(), status(ServiceState::Running));
        assert_eq!(overall_status(&services), OverallStatus::Running);

        services.insert("analyzer".to_string(), status(ServiceState::Stopped));
        assert_eq!(overall_status(&services), OverallStatus::Partial);

        let mut stopped = BTreeMap::new();
        stopped.insert("collector".to_string(), status(ServiceState::Error));
        assert_eq!(overall_status(&stopped), OverallStatus::Stopped);
        assert_eq!(overall_status(&BTreeMap::new()), OverallStatus::Stopped);
    }

    #[test]
    fn test_service_display_name() {
        assert_eq!(service_display_name("collector"), "جمع‌آوری‌کننده");
        assert_eq!(service_display_name("custom"), "custom");
    }
}
