use reqwest::Method;
use serde_json::json;

use crate::ad_group_name::AdGroupTags;
use crate::config::Config;
use crate::errors::AppError;
use crate::gateway_client::TikTokClient;
use crate::models::{AdGroup, CreativeMode, MediaKind, SiblingAdInfo};
use crate::tiktok_models::{AdGroupRecord, AdRecord, PagedList};

const ADGROUP_GET_PATH: &str = "/open_api/v1.3/adgroup/get/";
const AD_GET_PATH: &str = "/open_api/v1.3/ad/get/";
const ADGROUP_FIELDS: [&str; 3] = ["adgroup_id", "adgroup_name", "creative_material_mode"];

/// Keyword used to find the ad groups for an asset: the first two
/// underscore-delimited tokens of its name, joined by a space.
pub fn group_keyword(display_name: &str) -> String {
    display_name
        .split('_')
        .take(2)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Ad groups returned instead of platform data on dry or test-only runs.
pub fn fixture_ad_groups() -> Vec<AdGroup> {
    vec![
        AdGroup::new(
            "1830096301782322",
            "C. Philippines L. English || General Dating || App || Purchase || Android || Test Manual Ad Group || Manual Creative",
            CreativeMode::Standard,
        ),
        AdGroup::new(
            "1829719684525074",
            "Philippines L. English || General Dating || App || Purchase || Android || Test Ad Group || Smart Creative",
            CreativeMode::Adaptive,
        ),
    ]
}

/// Why an ad group must not receive an asset, if it must not.
///
/// Test groups are only skipped on live runs; static-image groups accept
/// images only and every other group accepts videos only.
pub fn skip_reason(config: &Config, group: &AdGroup, kind: MediaKind) -> Option<&'static str> {
    let tags = AdGroupTags::parse(&group.name);

    if config.is_live() && (tags.is_test_group || config.is_reserved_test_group(&group.id)) {
        return Some("skip test group");
    }

    match (kind, tags.is_static_image) {
        (MediaKind::Video, true) => Some("NOT_APPLICABLE for Static Image adGroup"),
        (MediaKind::Image, false) => Some("NOT_APPLICABLE for Non Static Image adGroup"),
        _ => None,
    }
}

/// Looks up ad groups and the existing ads inside them.
#[derive(Clone)]
pub struct AdGroupResolver {
    client: TikTokClient,
    config: Config,
}

impl AdGroupResolver {
    pub fn new(client: TikTokClient, config: &Config) -> Self {
        Self {
            client,
            config: config.clone(),
        }
    }

    /// Ad groups whose name matches `keyword`. Empty when nothing matches.
    pub async fn find_by_keyword(&self, keyword: &str) -> Result<Vec<AdGroup>, AppError> {
        if !self.config.is_live() {
            tracing::info!("Using fixture ad groups for keyword '{}'", keyword);
            return Ok(fixture_ad_groups());
        }

        let groups = self
            .query(json!({ "adgroup_name": keyword }).to_string())
            .await?;
        tracing::info!(
            "Found {} ad groups for keyword '{}'",
            groups.len(),
            keyword
        );
        Ok(groups)
    }

    /// The ad group with `adgroup_id`.
    pub async fn find_by_id(&self, adgroup_id: &str) -> Result<AdGroup, AppError> {
        if !self.config.is_live() {
            tracing::info!("Using fixture ad group for id {}", adgroup_id);
            return fixture_ad_groups()
                .into_iter()
                .next()
                .ok_or_else(|| AppError::NotFound("fixture ad group".to_string()));
        }

        self.query(json!({ "adgroup_ids": [adgroup_id] }).to_string())
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| AppError::NotFound(format!("ad group {}", adgroup_id)))
    }

    async fn query(&self, filtering: String) -> Result<Vec<AdGroup>, AppError> {
        let payload = json!({
            "advertiser_id": self.config.advertiser_id,
            "page_size": 1000,
            "page": 1,
            "filtering": filtering,
            "fields": json!(ADGROUP_FIELDS).to_string(),
        });

        let page: PagedList<AdGroupRecord> = self
            .client
            .call_checked(ADGROUP_GET_PATH, Method::GET, &payload)
            .await?
            .into_data()?;

        Ok(page.list.into_iter().map(AdGroup::from).collect())
    }

    /// Template attributes from the first ad of the group, with defaults.
    pub async fn sibling_ad_info(&self, adgroup_id: &str) -> Result<SiblingAdInfo, AppError> {
        if self.config.dry_run {
            return Ok(SiblingAdInfo::default());
        }

        let payload = json!({
            "advertiser_id": self.config.advertiser_id,
            "page_size": 1,
            "page": 1,
            "filtering": json!({ "adgroup_ids": [adgroup_id] }).to_string(),
        });

        let page: PagedList<AdRecord> = self
            .client
            .call_checked(AD_GET_PATH, Method::GET, &payload)
            .await?
            .into_data()?;

        if page.list.is_empty() {
            tracing::warn!("No sibling ads in group {}; using defaults", adgroup_id);
        }
        Ok(SiblingAdInfo::from_sibling(page.list.into_iter().next()))
    }
}
