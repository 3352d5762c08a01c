use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::{Arc, RwLock};

use super::io::{HttpRequest, HttpResponse, HttpTransport, Method, RequestBody};
use super::models::*;
use super::query::{encode_query, AlertFilter, TweetFilter};
use crate::error::{RasadError, Result};

pub const API_PREFIX: &str = "/api/v1";

/// Typed client for the Rasad REST API.
///
/// Cloning is cheap: clones share the transport and the bearer token, so a
/// 401 seen by any clone logs every clone out.
#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
    transport: Arc<dyn HttpTransport>,
    token: Arc<RwLock<Option<String>>>,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, transport: Arc<dyn HttpTransport>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            base_url,
            transport,
            token: Arc::new(RwLock::new(None)),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn token(&self) -> Option<String> {
        self.token
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn has_token(&self) -> bool {
        self.token().is_some()
    }

    pub fn set_token(&self, token: impl Into<String>) {
        *self
            .token
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(token.into());
    }

    pub fn clear_token(&self) {
        *self
            .token
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = None;
        tracing::debug!("Bearer token cleared");
    }

    /// Absolute URLs pass through, `/api/v1/...` is anchored at the base URL,
    /// anything else gets the API prefix.
    pub fn resolve_url(&self, endpoint: &str) -> String {
        if endpoint.starts_with("http") {
            endpoint.to_string()
        } else if endpoint.starts_with(API_PREFIX) {
            format!("{}{}", self.base_url, endpoint)
        } else if endpoint.starts_with('/') {
            format!("{}{}{}", self.base_url, API_PREFIX, endpoint)
        } else {
            format!("{}{}/{}", self.base_url, API_PREFIX, endpoint)
        }
    }

    /// Send one request and decode the JSON reply.
    ///
    /// A 401 clears the held token and yields [`RasadError::Unauthorized`].
    /// Other failures carry the backend's `detail` message.
    pub async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        endpoint: &str,
        body: RequestBody,
    ) -> Result<T> {
        let request = HttpRequest {
            method,
            url: self.resolve_url(endpoint),
            bearer: self.token(),
            body,
        };
        let url = request.url.clone();

        let response = self.transport.send(request).await.map_err(|e| {
            tracing::error!("API error ({} {}): {}", method.as_str(), url, e);
            e
        })?;

        if response.status == 401 {
            tracing::warn!("{} {} -> 401, dropping session", method.as_str(), url);
            self.clear_token();
            return Err(RasadError::Unauthorized);
        }

        if !response.is_success() {
            let detail = error_detail(&response);
            tracing::error!("API error ({}): {}", response.status, detail);
            return Err(RasadError::Api {
                status: response.status,
                detail,
            });
        }

        decode_body(&response)
    }

    pub async fn get<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T> {
        self.request(Method::Get, endpoint, RequestBody::Empty).await
    }

    pub async fn post<T: DeserializeOwned, B: Serialize>(&self, endpoint: &str, body: &B) -> Result<T> {
        let body = RequestBody::Json(serde_json::to_value(body)?);
        self.request(Method::Post, endpoint, body).await
    }

    pub async fn put<T: DeserializeOwned, B: Serialize>(&self, endpoint: &str, body: &B) -> Result<T> {
        let body = RequestBody::Json(serde_json::to_value(body)?);
        self.request(Method::Put, endpoint, body).await
    }

    pub async fn delete<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T> {
        self.request(Method::Delete, endpoint, RequestBody::Empty).await
    }

    // ----- auth -----

    /// Exchange credentials for a token. Does not store the token; see
    /// [`crate::auth::Session::login`].
    pub async fn login(&self, username: &str, password: &str) -> Result<Token> {
        let body = RequestBody::Form(vec![
            ("username".to_string(), username.to_string()),
            ("password".to_string(), password.to_string()),
        ]);
        let request = HttpRequest {
            method: Method::Post,
            url: self.resolve_url("/auth/login"),
            bearer: None,
            body,
        };

        let response = self.transport.send(request).await?;
        if !response.is_success() {
            tracing::warn!("Login rejected with status {}", response.status);
            return Err(RasadError::InvalidCredentials);
        }
        decode_body(&response)
    }

    pub async fn me(&self) -> Result<User> {
        self.get("/auth/me").await
    }

    // ----- tweets -----

    pub async fn tweets(&self, filter: &TweetFilter) -> Result<Vec<Tweet>> {
        let endpoint = format!("/tweets/{}", encode_query(&filter.to_pairs()));
        self.get(&endpoint).await
    }

    pub async fn tweet(&self, id: i64) -> Result<Tweet> {
        self.get(&format!("/tweets/{}", id)).await
    }

    pub async fn tweet_count(&self, filter: &TweetFilter) -> Result<TweetCount> {
        let endpoint = format!("/tweets/count{}", encode_query(&filter.to_pairs()));
        self.get(&endpoint).await
    }

    // ----- keywords -----

    pub async fn keywords(&self, active_only: bool) -> Result<Vec<Keyword>> {
        if active_only {
            self.get("/tweets/keywords?active_only=true").await
        } else {
            self.get("/tweets/keywords").await
        }
    }

    pub async fn create_keyword(&self, keyword: &KeywordInput) -> Result<Keyword> {
        self.post("/tweets/keywords", keyword).await
    }

    pub async fn update_keyword(&self, id: i64, keyword: &KeywordInput) -> Result<Keyword> {
        self.put(&format!("/tweets/keywords/{}", id), keyword).await
    }

    /// The backend deactivates rather than erases; the reply is a message object.
    pub async fn delete_keyword(&self, id: i64) -> Result<serde_json::Value> {
        self.delete(&format!("/tweets/keywords/{}", id)).await
    }

    // ----- alerts -----

    pub async fn alerts(&self, filter: &AlertFilter) -> Result<Vec<Alert>> {
        let endpoint = format!("/waves/alerts{}", encode_query(&filter.to_pairs()));
        self.get(&endpoint).await
    }

    pub async fn alert(&self, id: i64) -> Result<Alert> {
        self.get(&format!("/waves/alerts/{}", id)).await
    }

    pub async fn mark_alert_read(&self, id: i64) -> Result<Alert> {
        self.request(
            Method::Put,
            &format!("/waves/alerts/{}/read", id),
            RequestBody::Empty,
        )
        .await
    }

    // ----- analysis -----

    pub async fn analyze_tweet(&self, id: i64) -> Result<AnalysisResult> {
        self.request(
            Method::Post,
            &format!("/analysis/tweet/{}", id),
            RequestBody::Empty,
        )
        .await
    }

    pub async fn topics(&self, limit: u32) -> Result<Vec<Topic>> {
        self.get(&format!("/analysis/topics?limit={}", limit)).await
    }

    // ----- settings -----

    pub async fn settings(&self) -> Result<SystemSettings> {
        self.get("/settings/").await
    }

    pub async fn update_settings(&self, settings: &SystemSettings) -> Result<SystemSettings> {
        self.put("/settings/", settings).await
    }

    pub async fn budget(&self) -> Result<BudgetStatus> {
        self.get("/settings/budget").await
    }

    pub async fn update_budget(&self, daily_budget: f64) -> Result<BudgetStatus> {
        if daily_budget.is_nan() || daily_budget <= 0.0 {
            return Err(RasadError::Validation(
                "Daily budget must be a positive amount".to_string(),
            ));
        }
        let endpoint = format!(
            "/settings/budget{}",
            encode_query(&[("daily_budget", daily_budget.to_string())])
        );
        self.request(Method::Put, &endpoint, RequestBody::Empty).await
    }

    // ----- services -----

    pub async fn services(&self) -> Result<ServicesOverview> {
        self.get("/services/").await
    }

    pub async fn start_service(&self, name: &str) -> Result<ServiceAction> {
        let endpoint = format!("/services/{}/start", urlencoding::encode(name));
        self.post(&endpoint, &serde_json::json!({})).await
    }

    pub async fn stop_service(&self, name: &str) -> Result<ServiceAction> {
        let endpoint = format!("/services/{}/stop", urlencoding::encode(name));
        self.post(&endpoint, &serde_json::json!({})).await
    }

    pub async fn service_logs(&self, name: &str, lines: u32) -> Result<ServiceLogs> {
        let endpoint = format!(
            "/services/logs/{}?lines={}",
            urlencoding::encode(name),
            lines
        );
        self.get(&endpoint).await
    }
}

/// 204 and empty bodies decode as JSON `null`.
fn decode_body<T: DeserializeOwned>(response: &HttpResponse) -> Result<T> {
    let body = response.body.trim();
    if response.status == 204 || body.is_empty() {
        return Ok(serde_json::from_str("null")?);
    }
    Ok(serde_json::from_str(body)?)
}

fn error_detail(response: &HttpResponse) -> String {
    let from_json = serde_json::from_str::<serde_json::Value>(&response.body)
        .ok()
        .and_then(|v| match v.get("detail") {
            Some(serde_json::Value::String(s)) => Some(s.clone()),
            Some(serde_json::Value::Null) | None => None,
            Some(other) => Some(other.to_string()),
        });

    from_json
        .or_else(|| {
            reqwest::StatusCode::from_u16(response.status)
                .ok()
                .and_then(|s| s.canonical_reason())
                .map(str::to_string)
        })
        .unwrap_or_else(|| "unknown error".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::io::MockHttpTransport;

    fn ok(body: &str) -> HttpResponse {
        HttpResponse {
            status: 200,
            body: body.to_string(),
        }
    }

    fn client_with(mock: MockHttpTransport) -> ApiClient {
        ApiClient::new("http://rasad.local:8000/", Arc::new(mock))
    }

    #[test]
    fn test_resolve_url() {
        let client = client_with(MockHttpTransport::new());
        assert_eq!(
            client.resolve_url("/tweets/count"),
            "http://rasad.local:8000/api/v1/tweets/count"
        );
        assert_eq!(
            client.resolve_url("tweets/count"),
            "http://rasad.local:8000/api/v1/tweets/count"
        );
        assert_eq!(
            client.resolve_url("/api/v1/auth/me"),
            "http://rasad.local:8000/api/v1/auth/me"
        );
        assert_eq!(
            client.resolve_url("https://other.host/x"),
            "https://other.host/x"
        );
    }

    #[tokio::test]
    async fn test_bearer_token_is_injected() {
        let mut mock = MockHttpTransport::new();
        mock.expect_send()
            .withf(|req| {
                req.method == Method::Get
                    && req.url.ends_with("/api/v1/auth/me")
                    && req.bearer.as_deref() == Some("abc")
            })
            .times(1)
            .returning(|_| {
                Box::pin(async { Ok(ok(r#"{"id": 1, "email": "ops@rasad.ir"}"#)) })
            });

        let client = client_with(mock);
        client.set_token("abc");
        let user = client.me().await.unwrap();
        assert_eq!(user.email, "ops@rasad.ir");
    }

    #[tokio::test]
    async fn test_unauthorized_clears_token() {
        let mut mock = MockHttpTransport::new();
        mock.expect_send().times(1).returning(|_| {
            Box::pin(async {
                Ok(HttpResponse {
                    status: 401,
                    body: r#"{"detail": "Could not validate credentials"}"#.to_string(),
                })
            })
        });

        let client = client_with(mock);
        client.set_token("stale");
        let err = client.tweets(&TweetFilter::default()).await.unwrap_err();
        assert!(matches!(err, RasadError::Unauthorized));
        assert!(!client.has_token());
    }

    #[tokio::test]
    async fn test_unauthorized_is_shared_between_clones() {
        let mut mock = MockHttpTransport::new();
        mock.expect_send().returning(|_| {
            Box::pin(async {
                Ok(HttpResponse {
                    status: 401,
                    body: String::new(),
                })
            })
        });

        let client = client_with(mock);
        let clone = client.clone();
        client.set_token("stale");
        let _ = clone.services().await;
        assert!(!client.has_token());
    }

    #[tokio::test]
    async fn test_error_detail_is_surfaced() {
        let mut mock = MockHttpTransport::new();
        mock.expect_send().returning(|_| {
            Box::pin(async {
                Ok(HttpResponse {
                    status: 404,
                    body: r#"{"detail": "کلیدواژه یافت نشد"}"#.to_string(),
                })
            })
        });

        let client = client_with(mock);
        client.set_token("t");
        match client.delete_keyword(99).await.unwrap_err() {
            RasadError::Api { status, detail } => {
                assert_eq!(status, 404);
                assert_eq!(detail, "کلیدواژه یافت نشد");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        // a 404 does not end the session
        assert!(client.has_token());
    }

    #[tokio::test]
    async fn test_error_without_json_uses_reason_phrase() {
        let mut mock = MockHttpTransport::new();
        mock.expect_send().returning(|_| {
            Box::pin(async {
                Ok(HttpResponse {
                    status: 502,
                    body: "<html>bad gateway</html>".to_string(),
                })
            })
        });

        let client = client_with(mock);
        match client.settings().await.unwrap_err() {
            RasadError::Api { detail, .. } => assert_eq!(detail, "Bad Gateway"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_no_content_decodes_as_null() {
        let mut mock = MockHttpTransport::new();
        mock.expect_send().returning(|_| {
            Box::pin(async {
                Ok(HttpResponse {
                    status: 204,
                    body: String::new(),
                })
            })
        });

        let client = client_with(mock);
        let value = client.delete_keyword(1).await.unwrap();
        assert!(value.is_null());
    }

    #[tokio::test]
    async fn test_login_posts_form_without_bearer() {
        let mut mock = MockHttpTransport::new();
        mock.expect_send()
            .withf(|req| {
                req.method == Method::Post
                    && req.url.ends_with("/api/v1/auth/login")
                    && req.bearer.is_none()
                    && req.body
                        == RequestBody::Form(vec![
                            ("username".to_string(), "admin@rasad.ir".to_string()),
                            ("password".to_string(), "s3cret".to_string()),
                        ])
            })
            .times(1)
            .returning(|_| {
                Box::pin(async {
                    Ok(ok(r#"{"access_token": "jwt-token", "token_type": "bearer"}"#))
                })
            });

        let client = client_with(mock);
        client.set_token("old");
        let token = client.login("admin@rasad.ir", "s3cret").await.unwrap();
        assert_eq!(token.access_token, "jwt-token");
    }

    #[tokio::test]
    async fn test_login_rejected() {
        let mut mock = MockHttpTransport::new();
        mock.expect_send().returning(|_| {
            Box::pin(async {
                Ok(HttpResponse {
                    status: 401,
                    body: r#"{"detail": "Incorrect email or password"}"#.to_string(),
                })
            })
        });

        let client = client_with(mock);
        let err = client.login("a", "b").await.unwrap_err();
        assert!(matches!(err, RasadError::InvalidCredentials));
    }

    #[tokio::test]
    async fn test_keyword_create_sends_json() {
        let mut mock = MockHttpTransport::new();
        mock.expect_send()
            .withf(|req| {
                req.method == Method::Post
                    && req.url.ends_with("/api/v1/tweets/keywords")
                    && matches!(&req.body, RequestBody::Json(v) if v["text"] == "تورم" && v["priority"] == 3)
            })
            .times(1)
            .returning(|_| {
                Box::pin(async {
                    Ok(ok(
                        r#"{"id": 5, "text": "تورم", "is_active": true, "priority": 3, "created_at": "2025-03-01T10:00:00"}"#,
                    ))
                })
            });

        let client = client_with(mock);
        let mut input = KeywordInput::new("تورم");
        input.priority = 3;
        let keyword = client.create_keyword(&input).await.unwrap();
        assert_eq!(keyword.id, 5);
    }

    #[tokio::test]
    async fn test_update_budget_rejects_non_positive_without_request() {
        let mut mock = MockHttpTransport::new();
        mock.expect_send().times(0);

        let client = client_with(mock);
        assert!(matches!(
            client.update_budget(0.0).await,
            Err(RasadError::Validation(_))
        ));
        assert!(matches!(
            client.update_budget(f64::NAN).await,
            Err(RasadError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_update_budget_uses_query_param() {
        let mut mock = MockHttpTransport::new();
        mock.expect_send()
            .withf(|req| {
                req.method == Method::Put
                    && req.url.ends_with("/api/v1/settings/budget?daily_budget=12.5")
                    && req.body == RequestBody::Empty
            })
            .times(1)
            .returning(|_| {
                Box::pin(async {
                    Ok(ok(
                        r#"{"total_budget": 12.5, "total_usage": 2.5, "remaining": 10.0, "percentage_used": 20.0, "is_exhausted": false}"#,
                    ))
                })
            });

        let client = client_with(mock);
        let budget = client.update_budget(12.5).await.unwrap();
        assert_eq!(budget.remaining, 10.0);
    }

    #[tokio::test]
    async fn test_single_item_endpoints() {
        let mut mock = MockHttpTransport::new();
        mock.expect_send()
            .withf(|req| {
                req.method == Method::Get && req.url == "http://rasad.local:8000/api/v1/tweets/7"
            })
            .times(1)
            .returning(|_| {
                Box::pin(async {
                    Ok(ok(r#"{"id": 7, "tweet_id": "177", "content": "سلام"}"#))
                })
            });
        mock.expect_send()
            .withf(|req| {
                req.method == Method::Get
                    && req.url == "http://rasad.local:8000/api/v1/waves/alerts/3"
            })
            .times(1)
            .returning(|_| {
                Box::pin(async {
                    Ok(ok(
                        r#"{"id": 3, "title": "موج", "message": "m", "severity": "high", "alert_type": "volume_wave", "is_read": false}"#,
                    ))
                })
            });

        let client = client_with(mock);
        let tweet = client.tweet(7).await.unwrap();
        assert_eq!(tweet.tweet_id, "177");
        let alert = client.alert(3).await.unwrap();
        assert_eq!(alert.severity, crate::api::models::Severity::High);
    }

    #[tokio::test]
    async fn test_update_settings_puts_json() {
        let settings = SystemSettings {
            project_name: "Rasad".to_string(),
            debug: false,
            daily_budget: 8.0,
            analyzer_batch_size: 20,
            twitter_api_base_url: "https://api.twitterapi.io".to_string(),
            claude_model: "claude-3-haiku".to_string(),
        };
        let expected = serde_json::to_value(&settings).unwrap();

        let mut mock = MockHttpTransport::new();
        mock.expect_send()
            .withf(move |req| {
                req.method == Method::Put
                    && req.url == "http://rasad.local:8000/api/v1/settings/"
                    && req.body == RequestBody::Json(expected.clone())
            })
            .times(1)
            .returning(|req| {
                let body = match req.body {
                    RequestBody::Json(value) => value.to_string(),
                    _ => String::new(),
                };
                Box::pin(async move { Ok(ok(&body)) })
            });

        let client = client_with(mock);
        let saved = client.update_settings(&settings).await.unwrap();
        assert_eq!(saved, settings);
    }

    #[tokio::test]
    async fn test_transport_failure_propagates() {
        let mut mock = MockHttpTransport::new();
        mock.expect_send().returning(|_| {
            Box::pin(async { Err(RasadError::Http("connection refused".to_string())) })
        });

        let client = client_with(mock);
        client.set_token("t");
        assert!(matches!(
            client.services().await,
            Err(RasadError::Http(_))
        ));
        assert!(client.has_token());
    }
}
