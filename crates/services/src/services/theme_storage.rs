//! Blob storage for base templates and published themes.

use std::{collections::HashMap, time::Duration};

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::debug;

#[derive(Debug, Clone, Error)]
pub enum ThemeStorageError {
    #[error("network error: {0}")]
    Transport(String),
    #[error("timeout")]
    Timeout,
    #[error("http {status}: {body}")]
    Http { status: u16, body: String },
    #[error("missing service key: SUPABASE_SERVICE_ROLE_KEY environment variable not set")]
    MissingServiceKey,
}

/// Read/write access to objects under the theme bucket.
#[async_trait]
pub trait ThemeStore: Send + Sync {
    /// `Ok(None)` when the object does not exist.
    async fn fetch_text(&self, path: &str) -> Result<Option<String>, ThemeStorageError>;

    /// Creates or overwrites the object at `path`.
    async fn upload_text(
        &self,
        path: &str,
        body: &str,
        content_type: &str,
    ) -> Result<(), ThemeStorageError>;
}

/// Supabase Storage over its REST API. Reads go through the public object
/// endpoint; writes need the service-role key.
#[derive(Debug, Clone)]
pub struct SupabaseThemeStore {
    http: Client,
    base_url: String,
    bucket: String,
    service_key: Option<String>,
}

impl SupabaseThemeStore {
    pub fn new(
        supabase_url: &str,
        bucket: &str,
        service_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, ThemeStorageError> {
        let http = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("backlink-themes/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ThemeStorageError::Transport(e.to_string()))?;

        Ok(Self {
            http,
            base_url: supabase_url.trim_end_matches('/').to_string(),
            bucket: bucket.to_string(),
            service_key,
        })
    }

    pub fn public_url(&self, path: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{}/{}",
            self.base_url,
            self.bucket,
            path.trim_start_matches('/')
        )
    }

    fn object_url(&self, path: &str) -> String {
        format!(
            "{}/storage/v1/object/{}/{}",
            self.base_url,
            self.bucket,
            path.trim_start_matches('/')
        )
    }
}

#[async_trait]
impl ThemeStore for SupabaseThemeStore {
    async fn fetch_text(&self, path: &str) -> Result<Option<String>, ThemeStorageError> {
        let url = self.public_url(path);
        debug!(url = %url, "Fetching theme object");

        let res = self.http.get(&url).send().await.map_err(map_reqwest_error)?;
        match res.status() {
            s if s.is_success() => res.text().await.map(Some).map_err(map_reqwest_error),
            // Supabase Storage reports missing public objects as 400
            StatusCode::NOT_FOUND | StatusCode::BAD_REQUEST => Ok(None),
            s => {
                let body = res.text().await.unwrap_or_default();
                Err(ThemeStorageError::Http {
                    status: s.as_u16(),
                    body,
                })
            }
        }
    }

    async fn upload_text(
        &self,
        path: &str,
        body: &str,
        content_type: &str,
    ) -> Result<(), ThemeStorageError> {
        let key = self
            .service_key
            .as_deref()
            .ok_or(ThemeStorageError::MissingServiceKey)?;

        let res = self
            .http
            .post(self.object_url(path))
            .header("apikey", key)
            .bearer_auth(key)
            .header("x-upsert", "true")
            .header("content-type", content_type)
            .header("cache-control", "max-age=60")
            .body(body.to_string())
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = res.status();
        if status.is_success() {
            debug!(path = %path, "Uploaded theme object");
            return Ok(());
        }
        let body = res.text().await.unwrap_or_default();
        Err(ThemeStorageError::Http {
            status: status.as_u16(),
            body,
        })
    }
}

fn map_reqwest_error(e: reqwest::Error) -> ThemeStorageError {
    if e.is_timeout() {
        ThemeStorageError::Timeout
    } else {
        ThemeStorageError::Transport(e.to_string())
    }
}

/// Stored object with its content type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub body: String,
    pub content_type: String,
}

/// In-process store, used by tests and local runs without storage.
#[derive(Debug, Default)]
pub struct MemoryThemeStore {
    objects: RwLock<HashMap<String, StoredObject>>,
}

impl MemoryThemeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, path: &str, body: &str) {
        self.objects.write().await.insert(
            path.to_string(),
            StoredObject {
                body: body.to_string(),
                content_type: "text/html; charset=utf-8".to_string(),
            },
        );
    }

    pub async fn get(&self, path: &str) -> Option<StoredObject> {
        self.objects.read().await.get(path).cloned()
    }
}

#[async_trait]
impl ThemeStore for MemoryThemeStore {
    async fn fetch_text(&self, path: &str) -> Result<Option<String>, ThemeStorageError> {
        Ok(self.get(path).await.map(|o| o.body))
    }

    async fn upload_text(
        &self,
        path: &str,
        body: &str,
        content_type: &str,
    ) -> Result<(), ThemeStorageError> {
        self.objects.write().await.insert(
            path.to_string(),
            StoredObject {
                body: body.to_string(),
                content_type: content_type.to_string(),
            },
        );
        Ok(())
    }
}
