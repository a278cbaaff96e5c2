//! Environment-driven configuration for the theme services.

use std::{path::PathBuf, time::Duration};

use tracing::warn;
use utils::env::{env_flag, env_or, first_env};

pub const DEFAULT_BUCKET: &str = "themes";
const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 8;
const DEFAULT_CAMPAIGN_TTL_HOURS: i64 = 24;
const DEFAULT_CLEANUP_INTERVAL_SECS: u64 = 3600;

#[derive(Debug, Clone)]
pub struct ThemeServiceConfig {
    pub supabase_url: Option<String>,
    pub service_role_key: Option<String>,
    pub bucket: String,
    pub fetch_timeout: Duration,
    pub publish: bool,
    pub catalog_path: Option<PathBuf>,
    pub campaign_ttl_hours: i64,
    pub campaign_cleanup_interval: Duration,
}

impl Default for ThemeServiceConfig {
    fn default() -> Self {
        Self {
            supabase_url: None,
            service_role_key: None,
            bucket: DEFAULT_BUCKET.to_string(),
            fetch_timeout: Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECS),
            publish: true,
            catalog_path: None,
            campaign_ttl_hours: DEFAULT_CAMPAIGN_TTL_HOURS,
            campaign_cleanup_interval: Duration::from_secs(DEFAULT_CLEANUP_INTERVAL_SECS),
        }
    }
}

impl ThemeServiceConfig {
    pub fn from_env() -> Self {
        let supabase_url = first_env(&["SUPABASE_URL", "VITE_SUPABASE_URL"]);
        let service_role_key =
            first_env(&["SUPABASE_SERVICE_ROLE_KEY", "VITE_SUPABASE_SERVICE_ROLE_KEY"]);

        let fetch_timeout = env_or(
            "THEME_FETCH_TIMEOUT_SECS",
            &DEFAULT_FETCH_TIMEOUT_SECS.to_string(),
        )
        .parse::<u64>()
        .unwrap_or_else(|_| {
            warn!("THEME_FETCH_TIMEOUT_SECS is not a number, using default");
            DEFAULT_FETCH_TIMEOUT_SECS
        });

        let campaign_ttl_hours = env_or(
            "CAMPAIGN_TTL_HOURS",
            &DEFAULT_CAMPAIGN_TTL_HOURS.to_string(),
        )
        .parse::<i64>()
        .ok()
        .filter(|h| *h > 0)
        .unwrap_or_else(|| {
            warn!("CAMPAIGN_TTL_HOURS must be a positive integer, using default");
            DEFAULT_CAMPAIGN_TTL_HOURS
        });

        let cleanup_interval = env_or(
            "CAMPAIGN_CLEANUP_INTERVAL_SECS",
            &DEFAULT_CLEANUP_INTERVAL_SECS.to_string(),
        )
        .parse::<u64>()
        .ok()
        .filter(|s| *s > 0)
        .unwrap_or(DEFAULT_CLEANUP_INTERVAL_SECS);

        let config = Self {
            supabase_url,
            service_role_key,
            bucket: env_or("THEME_BUCKET", DEFAULT_BUCKET),
            fetch_timeout: Duration::from_secs(fetch_timeout),
            publish: env_flag("THEME_PUBLISH", true),
            catalog_path: first_env(&["THEME_CATALOG_PATH"]).map(PathBuf::from),
            campaign_ttl_hours,
            campaign_cleanup_interval: Duration::from_secs(cleanup_interval),
        };

        if config.supabase_url.is_none() {
            warn!("SUPABASE_URL not set; base templates will not be fetched and themes will not be published");
        } else if config.service_role_key.is_none() {
            warn!("SUPABASE_SERVICE_ROLE_KEY not set; generated themes will not be published");
        }

        config
    }

    /// Uploads need both the project URL and the service-role key.
    pub fn can_publish(&self) -> bool {
        self.publish && self.supabase_url.is_some() && self.service_role_key.is_some()
    }

    /// Project URL and service-role key, when both are configured.
    pub fn database_credentials(&self) -> Option<(&str, &str)> {
        Some((
            self.supabase_url.as_deref()?,
            self.service_role_key.as_deref()?,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_publish_needs_key_and_url() {
        let mut config = ThemeServiceConfig::default();
        assert!(!config.can_publish());
        assert_eq!(config.database_credentials(), None);

        config.supabase_url = Some("https://abc.supabase.co".to_string());
        assert!(!config.can_publish());

        config.service_role_key = Some("service-key".to_string());
        assert!(config.can_publish());

        config.publish = false;
        assert!(!config.can_publish());
        assert_eq!(
            config.database_credentials(),
            Some(("https://abc.supabase.co", "service-key"))
        );
    }

    #[test]
    fn test_defaults() {
        let config = ThemeServiceConfig::default();
        assert_eq!(config.bucket, "themes");
        assert_eq!(config.fetch_timeout, Duration::from_secs(8));
        assert_eq!(config.campaign_ttl_hours, 24);
        assert_eq!(config.campaign_cleanup_interval, Duration::from_secs(3600));
    }
}
