//! End-to-end theme preview: seed → theme → base template → HTML, with
//! best-effort publishing to storage.

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use super::{
    config::ThemeServiceConfig,
    theme_catalog::{CatalogError, ThemeCatalog},
    theme_document::{FALLBACK_BASE_HTML, build_html_document},
    theme_generator::{GeneratedTheme, ThemeGenerator},
    theme_storage::{SupabaseThemeStore, ThemeStorageError, ThemeStore},
};

pub const DEFAULT_DOMAIN: &str = "example.com";
pub const MINIMAL_TEMPLATE: &str = "minimal/index.html";
pub const PUBLISHED_HTML_PATH: &str = "random/index.html";

#[derive(Debug, Error)]
pub enum ThemePreviewError {
    #[error("catalog error: {0}")]
    Catalog(#[from] CatalogError),
    #[error("storage error: {0}")]
    Storage(#[from] ThemeStorageError),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreviewRequest {
    pub domain: String,
    pub seed: String,
    pub post_id: String,
}

impl PreviewRequest {
    /// Fills in defaults: domain `example.com`, seed `{domain}-{unix millis}`,
    /// post id = domain.
    pub fn from_parts(
        domain: Option<String>,
        seed: Option<String>,
        post_id: Option<String>,
    ) -> Self {
        let domain = non_blank(domain).unwrap_or_else(|| DEFAULT_DOMAIN.to_string());
        let seed = non_blank(seed)
            .unwrap_or_else(|| format!("{}-{}", domain, Utc::now().timestamp_millis()));
        let post_id = non_blank(post_id).unwrap_or_else(|| domain.clone());
        Self {
            domain,
            seed,
            post_id,
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Where the base document came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateSource {
    Stored(String),
    Fallback,
}

#[derive(Debug, Clone)]
pub struct PreviewOutcome {
    pub html: String,
    pub theme: GeneratedTheme,
    pub template_source: TemplateSource,
    /// Storage paths written during this call.
    pub published: Vec<String>,
}

pub struct ThemePreviewService {
    generator: ThemeGenerator,
    store: Option<Arc<dyn ThemeStore>>,
    publish: bool,
}

impl ThemePreviewService {
    pub fn new(
        generator: ThemeGenerator,
        store: Option<Arc<dyn ThemeStore>>,
        publish: bool,
    ) -> Self {
        Self {
            generator,
            store,
            publish,
        }
    }

    pub fn from_config(config: &ThemeServiceConfig) -> Result<Self, ThemePreviewError> {
        let generator = match &config.catalog_path {
            Some(path) => ThemeGenerator::new(ThemeCatalog::from_json_file(path)?)?,
            None => ThemeGenerator::default(),
        };

        let store: Option<Arc<dyn ThemeStore>> = match &config.supabase_url {
            Some(url) => Some(Arc::new(SupabaseThemeStore::new(
                url,
                &config.bucket,
                config.service_role_key.clone(),
                config.fetch_timeout,
            )?)),
            None => None,
        };

        Ok(Self::new(generator, store, config.can_publish()))
    }

    pub fn generator(&self) -> &ThemeGenerator {
        &self.generator
    }

    pub async fn render(&self, req: &PreviewRequest) -> Result<PreviewOutcome, ThemePreviewError> {
        let theme = self.generator.generate(&req.post_id, &req.seed)?;
        let (base_html, template_source) = self.load_base_template(&req.domain).await;
        let html = build_html_document(&base_html, &theme.css, &theme.fonts_href, &req.domain);
        let published = self.publish_outputs(&theme, &html).await;

        info!(
            domain = %req.domain,
            seed = %req.seed,
            template = ?template_source,
            published = published.len(),
            "Rendered random theme preview"
        );

        Ok(PreviewOutcome {
            html,
            theme,
            template_source,
            published,
        })
    }

    /// Per-domain template, then `minimal`, then the built-in skeleton.
    async fn load_base_template(&self, domain: &str) -> (String, TemplateSource) {
        let Some(store) = &self.store else {
            return (FALLBACK_BASE_HTML.to_string(), TemplateSource::Fallback);
        };

        for path in template_candidates(domain) {
            match store.fetch_text(&path).await {
                Ok(Some(body)) if !body.trim().is_empty() => {
                    return (body, TemplateSource::Stored(path));
                }
                Ok(_) => {
                    warn!(path = %path, "Base template missing or empty, trying next candidate");
                }
                Err(e) => {
                    warn!(path = %path, error = %e, "Failed to fetch base template, trying next candidate");
                }
            }
        }

        (FALLBACK_BASE_HTML.to_string(), TemplateSource::Fallback)
    }

    async fn publish_outputs(&self, theme: &GeneratedTheme, html: &str) -> Vec<String> {
        let Some(store) = self.store.as_ref().filter(|_| self.publish) else {
            return Vec::new();
        };

        let uploads = [
            (
                PUBLISHED_HTML_PATH.to_string(),
                html,
                "text/html; charset=utf-8",
            ),
            (
                stylesheet_path(&theme.post_id),
                theme.css.as_str(),
                "text/css; charset=utf-8",
            ),
        ];

        let mut published = Vec::with_capacity(uploads.len());
        for (path, body, content_type) in uploads {
            match store.upload_text(&path, body, content_type).await {
                Ok(()) => published.push(path),
                Err(e) => warn!(path = %path, error = %e, "Failed to upload generated theme"),
            }
        }
        published
    }
}

/// `random/{post_id}/style.css`, with the id reduced to a safe path segment.
pub fn stylesheet_path(post_id: &str) -> String {
    format!("random/{}/style.css", path_segment(post_id))
}

fn template_candidates(domain: &str) -> Vec<String> {
    let mut candidates = Vec::with_capacity(2);
    let segment = path_segment(domain);
    if segment == domain && segment != "minimal" {
        candidates.push(format!("{segment}/index.html"));
    }
    candidates.push(MINIMAL_TEMPLATE.to_string());
    candidates
}

fn path_segment(raw: &str) -> String {
    let cleaned: String = raw
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '-'
            }
        })
        .collect();
    if cleaned.chars().all(|c| c == '.') {
        "-".to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::services::theme_storage::MemoryThemeStore;

    struct FailingStore;

    #[async_trait]
    impl ThemeStore for FailingStore {
        async fn fetch_text(&self, _path: &str) -> Result<Option<String>, ThemeStorageError> {
            Err(ThemeStorageError::Timeout)
        }

        async fn upload_text(
            &self,
            _path: &str,
            _body: &str,
            _content_type: &str,
        ) -> Result<(), ThemeStorageError> {
            Err(ThemeStorageError::Http {
                status: 403,
                body: "denied".to_string(),
            })
        }
    }

    fn request() -> PreviewRequest {
        PreviewRequest::from_parts(
            Some("example.com".to_string()),
            Some("example.com-1700000000000".to_string()),
            None,
        )
    }

    #[test]
    fn test_request_defaults() {
        let req = PreviewRequest::from_parts(None, Some("  ".to_string()), None);
        assert_eq!(req.domain, "example.com");
        assert_eq!(req.post_id, "example.com");
        assert!(req.seed.starts_with("example.com-"));
        assert!(req.seed["example.com-".len()..].parse::<i64>().is_ok());
    }

    #[test]
    fn test_template_candidates() {
        assert_eq!(
            template_candidates("example.com"),
            vec!["example.com/index.html", "minimal/index.html"]
        );
        assert_eq!(template_candidates("../etc"), vec!["minimal/index.html"]);
        assert_eq!(template_candidates("minimal"), vec!["minimal/index.html"]);
    }

    #[test]
    fn test_stylesheet_path_sanitizes() {
        assert_eq!(stylesheet_path("post-42"), "random/post-42/style.css");
        assert_eq!(stylesheet_path("a/b c"), "random/a-b-c/style.css");
        assert_eq!(stylesheet_path(".."), "random/-/style.css");
    }

    #[tokio::test]
    async fn test_render_without_store_uses_fallback() {
        let service = ThemePreviewService::new(ThemeGenerator::default(), None, true);
        let outcome = service.render(&request()).await.unwrap();

        assert_eq!(outcome.template_source, TemplateSource::Fallback);
        assert!(outcome.published.is_empty());
        assert_eq!(
            outcome
                .html
                .matches("<style id=\"rtheme-example.com\">")
                .count(),
            1
        );
        assert!(
            outcome
                .html
                .matches(r#"<link rel="stylesheet" href="https://fonts.googleapis.com/"#)
                .count()
                <= 1
        );
        assert!(outcome.html.contains("<title>example.com</title>"));
    }

    #[tokio::test]
    async fn test_render_prefers_domain_template_then_minimal() {
        let store = Arc::new(MemoryThemeStore::new());
        store
            .insert("minimal/index.html", "<html><head></head><body>minimal</body></html>")
            .await;
        let service = ThemePreviewService::new(ThemeGenerator::default(), Some(store.clone()), false);

        let outcome = service.render(&request()).await.unwrap();
        assert_eq!(
            outcome.template_source,
            TemplateSource::Stored("minimal/index.html".to_string())
        );
        assert!(outcome.html.contains("<body>minimal</body>"));

        store
            .insert(
                "example.com/index.html",
                "<html><head></head><body>{{host}} custom</body></html>",
            )
            .await;
        let outcome = service.render(&request()).await.unwrap();
        assert_eq!(
            outcome.template_source,
            TemplateSource::Stored("example.com/index.html".to_string())
        );
        assert!(outcome.html.contains("<body>example.com custom</body>"));
        assert!(outcome.published.is_empty());
    }

    #[tokio::test]
    async fn test_render_publishes_html_and_css() {
        let store = Arc::new(MemoryThemeStore::new());
        let service = ThemePreviewService::new(ThemeGenerator::default(), Some(store.clone()), true);

        let mut req = request();
        req.post_id = "post-7".to_string();
        let outcome = service.render(&req).await.unwrap();

        assert_eq!(
            outcome.published,
            vec!["random/index.html", "random/post-7/style.css"]
        );
        let html = store.get("random/index.html").await.unwrap();
        assert_eq!(html.body, outcome.html);
        assert_eq!(html.content_type, "text/html; charset=utf-8");
        let css = store.get("random/post-7/style.css").await.unwrap();
        assert_eq!(css.body, outcome.theme.css);
        assert_eq!(css.content_type, "text/css; charset=utf-8");
    }

    #[tokio::test]
    async fn test_storage_failures_degrade_gracefully() {
        let service =
            ThemePreviewService::new(ThemeGenerator::default(), Some(Arc::new(FailingStore)), true);
        let outcome = service.render(&request()).await.unwrap();

        assert_eq!(outcome.template_source, TemplateSource::Fallback);
        assert!(outcome.published.is_empty());
        assert!(outcome.html.contains("<style id=\"rtheme-example.com\">"));
    }

    #[tokio::test]
    async fn test_same_seed_renders_identical_html() {
        let service = ThemePreviewService::new(ThemeGenerator::default(), None, false);
        let a = service.render(&request()).await.unwrap();
        let b = service.render(&request()).await.unwrap();
        assert_eq!(a.html, b.html);
    }
}
