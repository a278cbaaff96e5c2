//! Re-theme the most recent tagged blog post.
//!
//! The theme is rendered by the preview function when it is reachable and
//! the stylesheet it published can be read back; otherwise it is generated
//! here and uploaded straight to storage. The post's `theme_css_url` is only
//! updated once the stylesheet exists.

use std::time::Duration;

use db::{DBService, DbError, models::blog_post::BlogPost};
use reqwest::Client;
use serde::Serialize;
use services::services::{
    config::ThemeServiceConfig,
    theme_preview::{
        DEFAULT_DOMAIN, PreviewRequest, ThemePreviewError, ThemePreviewService, stylesheet_path,
    },
    theme_storage::{SupabaseThemeStore, ThemeStorageError, ThemeStore},
};
use thiserror::Error;
use tracing::{info, warn};

pub const DEFAULT_TAG: &str = "random-theme";
const FUNCTION_PATH: &str = "/.netlify/functions/randomthemePreview";
const FUNCTION_TIMEOUT: Duration = Duration::from_secs(20);

#[derive(Debug, Error)]
pub enum PatchError {
    #[error("missing environment variable: {0}")]
    MissingEnv(&'static str),
    #[error("database error: {0}")]
    Database(#[from] DbError),
    #[error("theme error: {0}")]
    Preview(#[from] ThemePreviewError),
    #[error("storage error: {0}")]
    Storage(#[from] ThemeStorageError),
    #[error("function call failed: {0}")]
    Function(String),
    #[error("stylesheet was not uploaded")]
    NotPublished,
}

#[derive(Debug, Clone)]
pub struct PatchOptions {
    pub tag: String,
    pub function_url: String,
    pub domain: Option<String>,
    pub dry_run: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishRoute {
    Function,
    DirectUpload,
    Skipped,
}

#[derive(Debug, Clone)]
pub struct PatchSummary {
    pub post_slug: String,
    pub request: PreviewRequest,
    pub route: PublishRoute,
    pub css_url: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FunctionBody<'a> {
    domain: &'a str,
    seed: &'a str,
    post_id: &'a str,
}

/// Explicit URL wins; otherwise the function path under `site_url`.
pub fn resolve_function_url(explicit: Option<&str>, site_url: &str) -> String {
    match explicit.map(str::trim).filter(|u| !u.is_empty()) {
        Some(url) => url.to_string(),
        None => format!("{}{}", site_url.trim_end_matches('/'), FUNCTION_PATH),
    }
}

pub fn request_for_post(post: &BlogPost, domain_override: Option<&str>) -> PreviewRequest {
    let domain = domain_override
        .map(str::to_string)
        .or_else(|| post.published_host())
        .unwrap_or_else(|| DEFAULT_DOMAIN.to_string());
    PreviewRequest::from_parts(
        Some(domain),
        Some(post.theme_seed()),
        Some(post.id.to_string()),
    )
}

pub async fn run(
    options: &PatchOptions,
    config: &ThemeServiceConfig,
) -> Result<Option<PatchSummary>, PatchError> {
    let supabase_url = config
        .supabase_url
        .as_deref()
        .ok_or(PatchError::MissingEnv("SUPABASE_URL"))?;
    let service_key = config
        .service_role_key
        .clone()
        .ok_or(PatchError::MissingEnv("SUPABASE_SERVICE_ROLE_KEY"))?;

    let db = DBService::new(supabase_url, service_key.clone())?;
    let Some(post) = BlogPost::find_latest_with_tag(&db, &options.tag).await? else {
        warn!(tag = %options.tag, "No blog post carries the theme tag; nothing to patch");
        return Ok(None);
    };

    let request = request_for_post(&post, options.domain.as_deref());
    let store = SupabaseThemeStore::new(
        supabase_url,
        &config.bucket,
        Some(service_key),
        config.fetch_timeout,
    )?;
    let css_url = store.public_url(&stylesheet_path(&request.post_id));

    info!(
        post = %post.slug,
        domain = %request.domain,
        seed = %request.seed,
        "Patching latest random-theme post"
    );

    if options.dry_run {
        return Ok(Some(PatchSummary {
            post_slug: post.slug,
            request,
            route: PublishRoute::Skipped,
            css_url,
        }));
    }

    let css_path = stylesheet_path(&request.post_id);
    let published_by_function = match call_function(&options.function_url, &request).await {
        Ok(()) => match store.fetch_text(&css_path).await {
            Ok(Some(_)) => true,
            Ok(None) => {
                warn!(path = %css_path, "Preview function did not publish the stylesheet, uploading directly");
                false
            }
            Err(e) => {
                warn!(path = %css_path, error = %e, "Could not confirm published stylesheet, uploading directly");
                false
            }
        },
        Err(e) => {
            warn!(url = %options.function_url, error = %e, "Preview function unreachable, uploading directly");
            false
        }
    };

    let route = if published_by_function {
        PublishRoute::Function
    } else {
        upload_directly(config, &request).await?;
        PublishRoute::DirectUpload
    };

    BlogPost::update_theme_css_url(&db, post.id, &css_url).await?;
    info!(post = %post.slug, css_url = %css_url, route = ?route, "Post theme updated");

    Ok(Some(PatchSummary {
        post_slug: post.slug,
        request,
        route,
        css_url,
    }))
}

async fn call_function(url: &str, request: &PreviewRequest) -> Result<(), PatchError> {
    let http = Client::builder()
        .timeout(FUNCTION_TIMEOUT)
        .build()
        .map_err(|e| PatchError::Function(e.to_string()))?;

    let res = http
        .post(url)
        .json(&FunctionBody {
            domain: &request.domain,
            seed: &request.seed,
            post_id: &request.post_id,
        })
        .send()
        .await
        .map_err(|e| PatchError::Function(e.to_string()))?;

    let status = res.status();
    if status.is_success() {
        Ok(())
    } else {
        Err(PatchError::Function(format!("http {}", status.as_u16())))
    }
}

async fn upload_directly(
    config: &ThemeServiceConfig,
    request: &PreviewRequest,
) -> Result<(), PatchError> {
    let mut config = config.clone();
    config.publish = true;
    let service = ThemePreviewService::from_config(&config)?;
    let outcome = service.render(request).await?;

    let css_path = stylesheet_path(&request.post_id);
    if outcome.published.iter().any(|p| *p == css_path) {
        Ok(())
    } else {
        Err(PatchError::NotPublished)
    }
}
