use super::{DashboardSnapshot, FeedData, FeedFetcher};
use crate::api::{AlertFilter, ApiClient, TweetFilter};
use anyhow::Result;
use async_trait::async_trait;

const LATEST_ALERTS: u32 = 5;
const TOP_TOPICS: u32 = 5;

pub struct DashboardFetcher {
    client: ApiClient,
}

impl DashboardFetcher {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl FeedFetcher for DashboardFetcher {
    async fn fetch(&self) -> Result<FeedData> {
        let no_filter = TweetFilter::default();
        let unread = AlertFilter::latest_unread(LATEST_ALERTS);

        let (count, alerts, topics, keywords) = futures::try_join!(
            self.client.tweet_count(&no_filter),
            self.client.alerts(&unread),
            self.client.topics(TOP_TOPICS),
            self.client.keywords(true),
        )?;

        // The services panel is a summary; its absence should not blank the page
        let services = match self.client.services().await {
            Ok(overview) => Some(overview),
            Err(e) if e.is_unauthorized() => return Err(e.into()),
            Err(e) => {
                tracing::warn!("Service summary unavailable: {}", e);
                None
            }
        };

        Ok(FeedData::Dashboard(DashboardSnapshot {
            count,
            alerts,
            topics,
            keywords,
            services,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::is_session_error;
    use crate::feeds::testing::{client, ok, routed, status};

    fn backend(services_status: u16) -> crate::api::io::MockHttpTransport {
        routed(move |req| {
            let url = req.url.as_str();
            if url.contains("/tweets/count") {
                ok(r#"{"total": 200, "sentiment_counts": {"positive": 50, "negative": 30, "neutral": 100, "mixed": 20}}"#)
            } else if url.contains("/waves/alerts") {
                assert!(url.contains("limit=5"));
                assert!(url.contains("is_read=false"));
                ok(r#"[{"id": 1, "title": "موج منفی", "message": "افزایش ناگهانی", "severity": "high", "alert_type": "sentiment_shift", "is_read": false, "created_at": "2024-03-01T10:00:00"}]"#)
            } else if url.contains("/analysis/topics") {
                ok(r#"[{"id": 3, "name": "اقتصاد", "tweet_count": 42}]"#)
            } else if url.contains("/tweets/keywords") {
                assert!(url.contains("active_only=true"));
                ok(r#"[{"id": 9, "text": "تورم", "is_active": true, "priority": 2, "created_at": "2024-01-01T00:00:00"}]"#)
            } else if url.contains("/services") {
                if services_status == 200 {
                    ok(r#"{"services": {"collector": {"status": "running", "running": true}}}"#)
                } else {
                    status(services_status, r#"{"detail": "boom"}"#)
                }
            } else {
                status(404, "")
            }
        })
    }

    #[tokio::test]
    async fn test_dashboard_snapshot() {
        let fetcher = DashboardFetcher::new(client(backend(200)));
        let FeedData::Dashboard(snapshot) = fetcher.fetch().await.unwrap() else {
            panic!("expected dashboard data");
        };
        assert_eq!(snapshot.count.total, 200);
        assert_eq!(snapshot.alerts.len(), 1);
        assert_eq!(snapshot.topics[0].name, "اقتصاد");
        assert_eq!(snapshot.keywords[0].text, "تورم");
        assert!(snapshot.services.is_some());
    }

    #[tokio::test]
    async fn test_services_failure_is_tolerated() {
        let fetcher = DashboardFetcher::new(client(backend(500)));
        let FeedData::Dashboard(snapshot) = fetcher.fetch().await.unwrap() else {
            panic!("expected dashboard data");
        };
        assert!(snapshot.services.is_none());
    }

    #[tokio::test]
    async fn test_services_401_still_expires_session() {
        let fetcher = DashboardFetcher::new(client(backend(401)));
        let err = fetcher.fetch().await.unwrap_err();
        assert!(is_session_error(&err));
    }
}
