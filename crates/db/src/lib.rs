use std::time::Duration;

use reqwest::{Client, Method, RequestBuilder, Response};
use thiserror::Error;

pub mod models;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("network error: {0}")]
    Transport(String),
    #[error("timeout")]
    Timeout,
    #[error("http {status}: {body}")]
    Http { status: u16, body: String },
    #[error("json error: {0}")]
    Serde(String),
}

impl From<reqwest::Error> for DbError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else if e.is_decode() {
            Self::Serde(e.to_string())
        } else {
            Self::Transport(e.to_string())
        }
    }
}

/// Handle on the hosted Postgres database, reached through its PostgREST
/// endpoint with the service-role key.
#[derive(Debug, Clone)]
pub struct DBService {
    http: Client,
    rest_url: String,
    service_key: String,
}

impl DBService {
    const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

    pub fn new(supabase_url: &str, service_key: impl Into<String>) -> Result<Self, DbError> {
        let http = Client::builder()
            .timeout(Self::REQUEST_TIMEOUT)
            .user_agent(concat!("backlink-themes/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| DbError::Transport(e.to_string()))?;

        Ok(Self {
            http,
            rest_url: rest_url(supabase_url),
            service_key: service_key.into(),
        })
    }

    pub fn table_url(&self, table: &str) -> String {
        format!("{}/{}", self.rest_url, table)
    }

    pub(crate) fn request(&self, method: Method, table: &str) -> RequestBuilder {
        self.http
            .request(method, self.table_url(table))
            .header("apikey", &self.service_key)
            .bearer_auth(&self.service_key)
    }
}

/// Turns an error status into `DbError::Http`, passing successes through.
pub(crate) async fn check_status(res: Response) -> Result<Response, DbError> {
    let status = res.status();
    if status.is_success() {
        return Ok(res);
    }
    let body = res.text().await.unwrap_or_default();
    Err(DbError::Http {
        status: status.as_u16(),
        body,
    })
}

fn rest_url(supabase_url: &str) -> String {
    format!("{}/rest/v1", supabase_url.trim_end_matches('/'))
}
