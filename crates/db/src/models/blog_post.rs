use chrono::{DateTime, Utc};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::{DBService, DbError, check_status};

const TABLE: &str = "blog_posts";

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct BlogPost {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub published_url: Option<String>,
    pub theme_css_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
struct UpdateThemeCssUrl<'a> {
    theme_css_url: &'a str,
}

impl BlogPost {
    /// Stable seed for this post's theme: `{slug}-{created_at millis}`.
    pub fn theme_seed(&self) -> String {
        format!("{}-{}", self.slug, self.created_at.timestamp_millis())
    }

    /// Host part of `published_url`, if the post has been published.
    pub fn published_host(&self) -> Option<String> {
        let url = self.published_url.as_deref()?;
        let rest = url.split_once("://").map(|(_, r)| r).unwrap_or(url);
        let host = rest.split(['/', '?', '#']).next().unwrap_or_default();
        (!host.is_empty()).then(|| host.to_string())
    }

    /// Most recent post whose `tags` array contains `tag`.
    pub async fn find_latest_with_tag(db: &DBService, tag: &str) -> Result<Option<Self>, DbError> {
        let res = db
            .request(Method::GET, TABLE)
            .query(&[
                ("select", "*".to_string()),
                ("tags", contains_filter(tag)),
                ("order", "created_at.desc".to_string()),
                ("limit", "1".to_string()),
            ])
            .send()
            .await?;

        let mut rows: Vec<BlogPost> = check_status(res).await?.json().await?;
        Ok(rows.pop())
    }

    pub async fn update_theme_css_url(
        db: &DBService,
        id: Uuid,
        theme_css_url: &str,
    ) -> Result<(), DbError> {
        let res = db
            .request(Method::PATCH, TABLE)
            .query(&[("id", format!("eq.{id}"))])
            .header("Prefer", "return=minimal")
            .json(&UpdateThemeCssUrl { theme_css_url })
            .send()
            .await?;
        check_status(res).await?;
        Ok(())
    }
}

/// PostgREST array-containment filter, e.g. `cs.{"random-theme"}`.
fn contains_filter(tag: &str) -> String {
    format!("cs.{{\"{}\"}}", tag.replace('"', "\\\""))
}
