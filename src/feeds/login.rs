use super::{FeedData, FeedFetcher};
use crate::auth::Session;
use anyhow::Result;
use async_trait::async_trait;

pub enum LoginRequest {
    Credentials { username: String, password: String },
    /// Validate a token restored from the store
    Restore,
}

pub struct LoginFetcher {
    session: Session,
    request: LoginRequest,
}

impl LoginFetcher {
    pub fn new(session: Session, request: LoginRequest) -> Self {
        Self { session, request }
    }
}

#[async_trait]
impl FeedFetcher for LoginFetcher {
    async fn fetch(&self) -> Result<FeedData> {
        if let LoginRequest::Credentials { username, password } = &self.request {
            self.session.login(username, password).await?;
        }

        match self.session.check_session().await {
            Some(user) => Ok(FeedData::LoggedIn(user)),
            None => Ok(FeedData::LoggedOut),
        }
    }
}
