use super::{FeedData, FeedFetcher, KeywordsPanel};
use crate::api::ApiClient;
use crate::error::RasadError;
use anyhow::Result;
use async_trait::async_trait;

pub struct KeywordsFetcher {
    client: ApiClient,
}

impl KeywordsFetcher {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }
}

/// Settings endpoints are admin-only; a non-admin still gets the keyword list.
fn optional<T>(result: crate::error::Result<T>, what: &str) -> Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(e) if e.is_unauthorized() => Err(e.into()),
        Err(RasadError::Api { status, detail }) => {
            tracing::warn!("{} unavailable ({}): {}", what, status, detail);
            Ok(None)
        }
        Err(e) => Err(e.into()),
    }
}

#[async_trait]
impl FeedFetcher for KeywordsFetcher {
    async fn fetch(&self) -> Result<FeedData> {
        let (keywords, settings, budget) = futures::join!(
            self.client.keywords(false),
            self.client.settings(),
            self.client.budget(),
        );

        Ok(FeedData::Keywords(KeywordsPanel {
            keywords: keywords?,
            settings: optional(settings, "Settings")?,
            budget: optional(budget, "Budget")?,
        }))
    }
}
