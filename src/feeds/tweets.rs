use super::{FeedData, FeedFetcher};
use crate::api::{ApiClient, TweetFilter};
use anyhow::Result;
use async_trait::async_trait;

pub struct TweetsFetcher {
    client: ApiClient,
    filter: TweetFilter,
}

impl TweetsFetcher {
    pub fn new(client: ApiClient, filter: TweetFilter) -> Self {
        Self { client, filter }
    }
}

#[async_trait]
impl FeedFetcher for TweetsFetcher {
    async fn fetch(&self) -> Result<FeedData> {
        let tweets = self.client.tweets(&self.filter).await?;
        tracing::debug!("Fetched {} tweets", tweets.len());
        Ok(FeedData::Tweets(tweets))
    }
}
