use super::{FeedData, FeedFetcher};
use crate::api::ApiClient;
use anyhow::Result;
use async_trait::async_trait;

pub struct ServicesFetcher {
    client: ApiClient,
}

impl ServicesFetcher {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl FeedFetcher for ServicesFetcher {
    async fn fetch(&self) -> Result<FeedData> {
        let overview = self.client.services().await?;
        Ok(FeedData::Services(overview))
    }
}
