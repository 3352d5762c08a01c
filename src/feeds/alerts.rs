use super::{FeedData, FeedFetcher};
use crate::api::{AlertFilter, ApiClient};
use anyhow::Result;
use async_trait::async_trait;

pub struct AlertsFetcher {
    client: ApiClient,
    filter: AlertFilter,
}

impl AlertsFetcher {
    pub fn new(client: ApiClient, filter: AlertFilter) -> Self {
        Self { client, filter }
    }
}

#[async_trait]
impl FeedFetcher for AlertsFetcher {
    async fn fetch(&self) -> Result<FeedData> {
        let alerts = self.client.alerts(&self.filter).await?;
        Ok(FeedData::Alerts(alerts))
    }
}
