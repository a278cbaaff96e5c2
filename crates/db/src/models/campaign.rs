use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use ts_rs::TS;
use uuid::Uuid;

use crate::{DBService, DbError, check_status};

const TABLE: &str = "campaigns";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, EnumString, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum CampaignStatus {
    Pending,
    Active,
    Paused,
    Completed,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct Campaign {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub name: Option<String>,
    pub status: CampaignStatus,
    #[serde(default)]
    pub credits_reserved: i32,
    pub created_at: DateTime<Utc>,
}

impl Campaign {
    pub fn is_expired(&self, cutoff: DateTime<Utc>) -> bool {
        self.status == CampaignStatus::Pending && self.created_at < cutoff
    }

    /// Pending campaigns created before `cutoff`, oldest first.
    pub async fn find_expired_pending(
        db: &DBService,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<Self>, DbError> {
        let res = db
            .request(Method::GET, TABLE)
            .query(&[
                ("select", "*".to_string()),
                ("status", format!("eq.{}", CampaignStatus::Pending)),
                ("created_at", format!("lt.{}", timestamp_filter(cutoff))),
                ("order", "created_at.asc".to_string()),
            ])
            .send()
            .await?;

        Ok(check_status(res).await?.json().await?)
    }

    pub async fn delete(db: &DBService, id: Uuid) -> Result<(), DbError> {
        let res = db
            .request(Method::DELETE, TABLE)
            .query(&[("id", format!("eq.{id}"))])
            .header("Prefer", "return=minimal")
            .send()
            .await?;
        check_status(res).await?;
        Ok(())
    }
}

fn timestamp_filter(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, true)
}
