use serde::Deserialize;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://business-api.tiktok.com";

/// Ad groups that exist only for exercising the pipeline. Skipped on live runs.
pub const DEFAULT_RESERVED_TEST_GROUP_IDS: [&str; 4] = [
    "1830096301782322",
    "1829719684525074",
    "1830897501983745",
    "1830897358117905",
];

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub access_token: String,
    pub advertiser_id: String,
    pub base_url: String,
    pub dry_run: bool,
    pub test_groups_only: bool,
    pub csv_file: Option<String>,
    pub report_dir: String,
    pub ad_create_rate_per_sec: u32,
    pub default_rate_per_sec: u32,
    pub request_timeout: Duration,
    pub cover_initial_delay: Duration,
    pub cover_poll_interval: Duration,
    pub cover_poll_timeout: Duration,
    pub reserved_test_group_ids: Vec<String>,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let config = Self {
            access_token: std::env::var("ACCESS_TOKEN")
                .map_err(|_| {
                    anyhow::anyhow!("TikTok Access Token not found in environment variables.")
                })
                .and_then(|token| {
                    if token.trim().is_empty() {
                        anyhow::bail!("ACCESS_TOKEN cannot be empty");
                    }
                    Ok(token)
                })?,
            advertiser_id: std::env::var("ADVERTISER_ID").unwrap_or_default(),
            base_url: std::env::var("TIKTOK_BASE_URL")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .map(|url| {
                    if !url.starts_with("http://") && !url.starts_with("https://") {
                        anyhow::bail!("TIKTOK_BASE_URL must start with http:// or https://");
                    }
                    Ok(url.trim_end_matches('/').to_string())
                })
                .transpose()?
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            dry_run: parse_toggle(std::env::var("DRYRUN").ok().as_deref()),
            test_groups_only: parse_toggle(std::env::var("GROUP_TEST_ONLY").ok().as_deref()),
            csv_file: std::env::var("CSV_FILE")
                .ok()
                .filter(|s| !s.trim().is_empty()),
            report_dir: std::env::var("REPORT_DIR")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| "reports".to_string()),
            ad_create_rate_per_sec: env_number("AD_CREATE_RATE_PER_SEC", 5)?,
            default_rate_per_sec: env_number("DEFAULT_RATE_PER_SEC", 10)?,
            request_timeout: Duration::from_secs(env_number("REQUEST_TIMEOUT_SECS", 30)?),
            cover_initial_delay: Duration::from_secs(env_number("COVER_INITIAL_DELAY_SECS", 5)?),
            cover_poll_interval: Duration::from_secs(env_number("COVER_POLL_INTERVAL_SECS", 3)?),
            cover_poll_timeout: Duration::from_secs(env_number("COVER_POLL_TIMEOUT_SECS", 60)?),
            reserved_test_group_ids: std::env::var("RESERVED_TEST_GROUP_IDS")
                .ok()
                .map(|raw| parse_id_list(&raw))
                .unwrap_or_else(|| {
                    DEFAULT_RESERVED_TEST_GROUP_IDS
                        .iter()
                        .map(|id| id.to_string())
                        .collect()
                }),
        };

        if config.ad_create_rate_per_sec == 0 || config.default_rate_per_sec == 0 {
            anyhow::bail!("Rate limits must be at least 1 request per second");
        }

        // Log successful configuration load (without sensitive values)
        tracing::info!("Configuration loaded successfully");
        tracing::info!("DRY RUN: {}", config.dry_run);
        tracing::info!("GROUP TEST ONLY: {}", config.test_groups_only);
        if config.advertiser_id.is_empty() {
            tracing::warn!("ADVERTISER_ID is not set; platform calls will be rejected");
        }
        tracing::debug!("TikTok Base URL: {}", config.base_url);

        Ok(config)
    }

    /// Config for exercising the pipeline without network access.
    pub fn dry_run(advertiser_id: impl Into<String>) -> Self {
        Self {
            access_token: "dry-run".to_string(),
            advertiser_id: advertiser_id.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            dry_run: true,
            test_groups_only: true,
            csv_file: None,
            report_dir: "reports".to_string(),
            ad_create_rate_per_sec: 5,
            default_rate_per_sec: 10,
            request_timeout: Duration::from_secs(30),
            cover_initial_delay: Duration::ZERO,
            cover_poll_interval: Duration::from_secs(3),
            cover_poll_timeout: Duration::from_secs(60),
            reserved_test_group_ids: DEFAULT_RESERVED_TEST_GROUP_IDS
                .iter()
                .map(|id| id.to_string())
                .collect(),
        }
    }

    /// Live means ad groups come from the platform rather than the fixtures.
    pub fn is_live(&self) -> bool {
        !self.dry_run && !self.test_groups_only
    }

    pub fn is_reserved_test_group(&self, adgroup_id: &str) -> bool {
        self.reserved_test_group_ids.iter().any(|id| id == adgroup_id)
    }
}

/// Toggles are on unless explicitly set to `NO`.
fn parse_toggle(raw: Option<&str>) -> bool {
    !matches!(raw.map(str::trim), Some(v) if v.eq_ignore_ascii_case("no"))
}

fn parse_id_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn env_number<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: std::str::FromStr,
{
    match std::env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map_err(|_| anyhow::anyhow!("{} must be a valid non-negative number", key)),
        _ => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggles_default_to_on() {
        assert!(parse_toggle(None));
        assert!(parse_toggle(Some("YES")));
        assert!(parse_toggle(Some("anything")));
        assert!(!parse_toggle(Some("NO")));
        assert!(!parse_toggle(Some(" no ")));
    }

    #[test]
    fn test_id_list_parsing() {
        assert_eq!(parse_id_list("1, 2,,3 "), vec!["1", "2", "3"]);
        assert!(parse_id_list("").is_empty());
    }

    #[test]
    fn test_dry_run_config_is_not_live() {
        let config = Config::dry_run("7000000000000000000");
        assert!(!config.is_live());
        assert!(config.is_reserved_test_group("1830096301782322"));
        assert!(!config.is_reserved_test_group("1"));
    }
}
