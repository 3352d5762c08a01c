//! Mutations issued from the pages. Each runs once and reports back as a
//! notice, so the app can toast the outcome and reload the page.

use super::{FeedData, FeedFetcher, NoticeKind};
use crate::api::models::KeywordInput;
use crate::api::ApiClient;
use crate::error::{RasadError, Result as RasadResult};
use anyhow::Result;
use async_trait::async_trait;

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    CreateKeyword(KeywordInput),
    UpdateKeyword { id: i64, input: KeywordInput },
    DeleteKeyword(i64),
    MarkAlertRead(i64),
    AnalyzeTweet(i64),
    StartService(String),
    StopService(String),
    FetchLogs { service: String, lines: u32 },
    UpdateBudget(f64),
}

impl Command {
    /// Service controls reload the status table whether or not they worked.
    pub fn reloads_on_failure(&self) -> bool {
        matches!(self, Command::StartService(_) | Command::StopService(_))
    }

    fn failure_message(&self) -> String {
        match self {
            Command::CreateKeyword(_) => "خطا در افزودن کلیدواژه".to_string(),
            Command::UpdateKeyword { .. } => "خطا در بروزرسانی کلیدواژه".to_string(),
            Command::DeleteKeyword(_) => "خطا در حذف کلیدواژه".to_string(),
            Command::MarkAlertRead(_) => "خطا در علامت‌گذاری هشدار".to_string(),
            Command::AnalyzeTweet(_) => "خطا در تحلیل توییت".to_string(),
            Command::StartService(name) => format!("خطا در شروع سرویس {}", name),
            Command::StopService(name) => format!("خطا در توقف سرویس {}", name),
            Command::FetchLogs { service, .. } => format!("خطا در دریافت لاگ سرویس {}", service),
            Command::UpdateBudget(_) => "خطا در ذخیره بودجه".to_string(),
        }
    }
}

pub struct CommandFetcher {
    client: ApiClient,
    command: Command,
}

impl CommandFetcher {
    pub fn new(client: ApiClient, command: Command) -> Self {
        Self { client, command }
    }

    async fn run(&self) -> RasadResult<FeedData> {
        let done = |message: String| FeedData::Notice {
            message,
            kind: NoticeKind::Success,
            reload: true,
        };

        match &self.command {
            Command::CreateKeyword(input) => {
                if input.text.trim().is_empty() {
                    return Err(RasadError::Validation(
                        "لطفاً متن کلیدواژه را وارد کنید".to_string(),
                    ));
                }
                let keyword = self.client.create_keyword(input).await?;
                tracing::info!("Created keyword {} ({})", keyword.id, keyword.text);
                Ok(done("کلیدواژه با موفقیت افزوده شد".to_string()))
            }
            Command::UpdateKeyword { id, input } => {
                let keyword = self.client.update_keyword(*id, input).await?;
                let state = if keyword.is_active { "فعال" } else { "غیرفعال" };
                Ok(done(format!("کلیدواژه «{}» {} شد", keyword.text, state)))
            }
            Command::DeleteKeyword(id) => {
                self.client.delete_keyword(*id).await?;
                tracing::info!("Deleted keyword {}", id);
                Ok(done("کلیدواژه با موفقیت حذف شد".to_string()))
            }
            Command::MarkAlertRead(id) => {
                self.client.mark_alert_read(*id).await?;
                Ok(done("هشدار خوانده شد".to_string()))
            }
            Command::AnalyzeTweet(id) => {
                let result = self.client.analyze_tweet(*id).await?;
                Ok(FeedData::Analysis(result))
            }
            Command::StartService(name) => {
                let action = self.client.start_service(name).await?;
                tracing::info!("Service {} -> {}", action.service, action.status);
                Ok(done(format!("سرویس {} شروع شد", name)))
            }
            Command::StopService(name) => {
                let action = self.client.stop_service(name).await?;
                tracing::info!("Service {} -> {}", action.service, action.status);
                Ok(done(format!("سرویس {} متوقف شد", name)))
            }
            Command::FetchLogs { service, lines } => {
                let logs = self.client.service_logs(service, *lines).await?;
                Ok(FeedData::ServiceLogs(logs))
            }
            Command::UpdateBudget(amount) => {
                let budget = self.client.update_budget(*amount).await?;
                Ok(done(format!(
                    "بودجه روزانه به {:.2} دلار تغییر کرد",
                    budget.total_budget
                )))
            }
        }
    }
}

#[async_trait]
impl FeedFetcher for CommandFetcher {
    async fn fetch(&self) -> Result<FeedData> {
        match self.run().await {
            Ok(data) => Ok(data),
            Err(e) if e.is_unauthorized() => Err(e.into()),
            Err(RasadError::Validation(message)) => Ok(FeedData::Notice {
                message,
                kind: NoticeKind::Error,
                reload: false,
            }),
            Err(e) => {
                tracing::error!("{:?} failed: {}", self.command, e);
                Ok(FeedData::Notice {
                    message: format!("{}: {}", self.command.failure_message(), e),
                    kind: NoticeKind::Error,
                    reload: self.command.reloads_on_failure(),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::io::{Method, MockHttpTransport, RequestBody};
    use crate::error::is_session_error;
    use crate::feeds::testing::{client, ok, status};

    fn notice(data: FeedData) -> (String, NoticeKind, bool) {
        match data {
            FeedData::Notice {
                message,
                kind,
                reload,
            } => (message, kind, reload),
            other => panic!("expected notice, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_blank_keyword_never_posts() {
        let mut mock = MockHttpTransport::new();
        mock.expect_send().times(0);

        let fetcher = CommandFetcher::new(
            client(mock),
            Command::CreateKeyword(KeywordInput::new("   ")),
        );
        let (message, kind, reload) = notice(fetcher.fetch().await.unwrap());
        assert_eq!(kind, NoticeKind::Error);
        assert!(!reload);
        assert_eq!(message, "لطفاً متن کلیدواژه را وارد کنید");
    }

    #[tokio::test]
    async fn test_create_keyword_posts_defaults() {
        let mut mock = MockHttpTransport::new();
        mock.expect_send()
            .withf(|req| {
                req.method == Method::Post
                    && req.url.ends_with("/api/v1/tweets/keywords")
                    && req.body
                        == RequestBody::Json(serde_json::json!({
                            "text": "انتخابات",
                            "is_active": true,
                            "priority": 1
                        }))
            })
            .times(1)
            .returning(|_| {
                Box::pin(async {
                    Ok(ok(r#"{"id": 5, "text": "انتخابات", "is_active": true, "priority": 1, "created_at": "2024-01-01T00:00:00"}"#))
                })
            });

        let fetcher = CommandFetcher::new(
            client(mock),
            Command::CreateKeyword(KeywordInput::new("انتخابات")),
        );
        let (_, kind, reload) = notice(fetcher.fetch().await.unwrap());
        assert_eq!(kind, NoticeKind::Success);
        assert!(reload);
    }

    #[tokio::test]
    async fn test_failed_service_start_still_reloads() {
        let mut mock = MockHttpTransport::new();
        mock.expect_send()
            .withf(|req| req.url.ends_with("/services/collector/start"))
            .returning(|_| Box::pin(async { Ok(status(500, r#"{"detail": "spawn failed"}"#)) }));

        let fetcher = CommandFetcher::new(client(mock), Command::StartService("collector".into()));
        let (message, kind, reload) = notice(fetcher.fetch().await.unwrap());
        assert_eq!(kind, NoticeKind::Error);
        assert!(reload);
        assert!(message.contains("collector"));
        assert!(message.contains("spawn failed"));
    }

    #[tokio::test]
    async fn test_failed_delete_does_not_reload() {
        let mut mock = MockHttpTransport::new();
        mock.expect_send()
            .returning(|_| Box::pin(async { Ok(status(404, r#"{"detail": "Keyword not found"}"#)) }));

        let fetcher = CommandFetcher::new(client(mock), Command::DeleteKeyword(77));
        let (_, kind, reload) = notice(fetcher.fetch().await.unwrap());
        assert_eq!(kind, NoticeKind::Error);
        assert!(!reload);
    }

    #[tokio::test]
    async fn test_unauthorized_surfaces_as_session_error() {
        let mut mock = MockHttpTransport::new();
        mock.expect_send()
            .returning(|_| Box::pin(async { Ok(status(401, "")) }));

        let api = client(mock);
        let fetcher = CommandFetcher::new(api.clone(), Command::MarkAlertRead(3));
        let err = fetcher.fetch().await.unwrap_err();
        assert!(is_session_error(&err));
        assert!(!api.has_token());
    }

    #[tokio::test]
    async fn test_non_positive_budget_is_rejected_locally() {
        let mut mock = MockHttpTransport::new();
        mock.expect_send().times(0);

        let fetcher = CommandFetcher::new(client(mock), Command::UpdateBudget(0.0));
        let (_, kind, reload) = notice(fetcher.fetch().await.unwrap());
        assert_eq!(kind, NoticeKind::Error);
        assert!(!reload);
    }

    #[tokio::test]
    async fn test_analyze_returns_result() {
        let mut mock = MockHttpTransport::new();
        mock.expect_send()
            .withf(|req| req.method == Method::Post && req.url.ends_with("/analysis/tweet/12"))
            .returning(|_| {
                Box::pin(async {
                    Ok(ok(r#"{"tweet_id": 12, "content": "متن", "sentiment": {"label": "negative", "score": -0.6}, "topics": [], "keywords": ["اقتصاد"], "is_analyzed": true, "analysis_date": "2024-03-01T10:00:00"}"#))
                })
            });

        let fetcher = CommandFetcher::new(client(mock), Command::AnalyzeTweet(12));
        match fetcher.fetch().await.unwrap() {
            FeedData::Analysis(result) => assert_eq!(result.keywords, vec!["اقتصاد"]),
            other => panic!("unexpected {:?}", other),
        }
    }
}
