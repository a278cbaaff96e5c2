//! Background service that deletes pending campaigns older than a TTL.

use std::time::Duration;

use chrono::{DateTime, Utc};
use db::{DBService, DbError, models::campaign::Campaign};
use thiserror::Error;
use tokio::time::interval;
use tracing::{debug, error, info, warn};

#[derive(Debug, Error)]
pub enum CampaignCleanupError {
    #[error("database error: {0}")]
    Database(#[from] DbError),
}

pub struct CampaignCleanupService {
    db: DBService,
    ttl: chrono::Duration,
    poll_interval: Duration,
}

impl CampaignCleanupService {
    pub fn new(db: DBService, ttl_hours: i64, poll_interval: Duration) -> Self {
        Self {
            db,
            ttl: chrono::Duration::hours(ttl_hours),
            poll_interval,
        }
    }

    /// Spawn the cleanup loop; runs until the runtime shuts down.
    pub fn spawn(self) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            self.start().await;
        })
    }

    async fn start(&self) {
        info!(
            "Starting campaign cleanup service with interval {:?}, ttl: {} h",
            self.poll_interval,
            self.ttl.num_hours()
        );

        let mut interval = interval(self.poll_interval);
        loop {
            interval.tick().await;
            if let Err(e) = self.run_once(Utc::now()).await {
                error!("Error cleaning up expired campaigns: {}", e);
            }
        }
    }

    pub fn cutoff(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now - self.ttl
    }

    /// Delete every expired pending campaign; returns how many were removed.
    pub async fn run_once(&self, now: DateTime<Utc>) -> Result<usize, CampaignCleanupError> {
        let cutoff = self.cutoff(now);
        let expired = Campaign::find_expired_pending(&self.db, cutoff).await?;

        if expired.is_empty() {
            debug!("Campaign cleanup: nothing expired");
            return Ok(0);
        }

        let mut deleted = 0;
        for campaign in expired.iter().filter(|c| c.is_expired(cutoff)) {
            match Campaign::delete(&self.db, campaign.id).await {
                Ok(()) => {
                    deleted += 1;
                    info!(
                        campaign_id = %campaign.id,
                        created_at = %campaign.created_at,
                        credits_reserved = campaign.credits_reserved,
                        "Campaign cleanup: deleted expired pending campaign"
                    );
                }
                Err(e) => {
                    warn!(
                        campaign_id = %campaign.id,
                        error = %e,
                        "Campaign cleanup: failed to delete campaign"
                    );
                }
            }
        }

        Ok(deleted)
    }
}
