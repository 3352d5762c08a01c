//! Client for the Rasad REST API (`/api/v1`).

pub mod client;
pub mod io;
pub mod models;
pub mod query;

pub use client::{ApiClient, API_PREFIX};
pub use io::{HttpRequest, HttpResponse, HttpTransport, Method, ReqwestTransport, RequestBody};
pub use query::{AlertFilter, TweetFilter};
