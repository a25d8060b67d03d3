//! Media-list updates for smart-creative ad groups.
//!
//! An ad group's current media list is fetched, the new video is appended
//! after every existing entry, and the whole list is sent back as a patch
//! update. Existing entries are never dropped or reordered.

use reqwest::Method;
use serde_json::{json, Value};

use crate::config::Config;
use crate::errors::AppError;
use crate::gateway_client::TikTokClient;
use crate::models::MediaInfoEntry;
use crate::tiktok_models::{AcoAdGroup, AcoUpdatePayload, PagedList};

const ACO_GET_PATH: &str = "/open_api/v1.3/ad/aco/get/";
const ACO_UPDATE_PATH: &str = "/open_api/v1.3/ad/aco/update/";

/// Video to append to a smart-creative media list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewVideoMedia {
    pub video_id: String,
    pub file_name: String,
    pub image_uris: Vec<String>,
}

/// Media list as read from the platform.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchedMedia {
    pub adgroup_id: String,
    pub entries: Vec<MediaInfoEntry>,
}

/// Media list with the new entry appended, ready to send.
#[derive(Debug, Clone, PartialEq)]
pub struct MergedMedia {
    pub payload: AcoUpdatePayload,
}

impl MergedMedia {
    pub fn entries(&self) -> &[MediaInfoEntry] {
        &self.payload.media_info_list
    }
}

fn require<'a>(value: Option<&'a str>, name: &str) -> Result<&'a str, AppError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(AppError::InvalidArgument(format!("{} is required", name))),
    }
}

/// Build the update payload: flattened prior entries followed by the new one.
///
/// Validates every required input before anything else happens.
pub fn prepare_update_payload(
    advertiser_id: Option<&str>,
    adgroup_id: Option<&str>,
    prior_media: Option<&[MediaInfoEntry]>,
    new_video_id: Option<&str>,
    new_video_name: Option<&str>,
    new_image_uris: Option<&[String]>,
) -> Result<MergedMedia, AppError> {
    let advertiser_id = require(advertiser_id, "advertiser_id")?;
    let adgroup_id = require(adgroup_id, "adgroup_id")?;
    let prior_media = match prior_media {
        Some(list) if !list.is_empty() => list,
        Some(_) => {
            return Err(AppError::InvalidArgument(
                "prior media list must not be empty".to_string(),
            ))
        }
        None => {
            return Err(AppError::InvalidArgument(
                "prior media list is required".to_string(),
            ))
        }
    };
    let new_video_id = require(new_video_id, "new video id")?;
    let new_video_name = require(new_video_name, "new video name")?;
    let new_image_uris = match new_image_uris {
        Some(uris) if !uris.is_empty() && uris.iter().all(|u| !u.trim().is_empty()) => uris,
        _ => {
            return Err(AppError::InvalidArgument(
                "new image uris are required".to_string(),
            ))
        }
    };

    let media_info_list = prior_media
        .iter()
        .map(MediaInfoEntry::flattened)
        .chain(std::iter::once(MediaInfoEntry::new(
            new_video_id,
            new_video_name,
            new_image_uris,
        )))
        .collect();

    Ok(MergedMedia {
        payload: AcoUpdatePayload {
            advertiser_id: advertiser_id.to_string(),
            adgroup_id: adgroup_id.to_string(),
            patch_update: true,
            media_info_list,
        },
    })
}

/// Two entries standing in for a smart-creative ad group on dry runs.
pub fn fixture_media() -> Vec<MediaInfoEntry> {
    vec![
        MediaInfoEntry::new(
            "DRYRUN_EXISTING_VIDEO_1",
            "existing-1.mp4",
            &["DRYRUN_EXISTING_IMAGE_1".to_string()],
        ),
        MediaInfoEntry::new(
            "DRYRUN_EXISTING_VIDEO_2",
            "existing-2.mp4",
            &["DRYRUN_EXISTING_IMAGE_2".to_string()],
        ),
    ]
}

#[derive(Clone)]
pub struct SmartCreativeService {
    client: TikTokClient,
    config: Config,
}

impl SmartCreativeService {
    pub fn new(client: TikTokClient, config: &Config) -> Self {
        Self {
            client,
            config: config.clone(),
        }
    }

    /// Current media list of a smart-creative ad group.
    ///
    /// Fails with `NotFound` when the platform reports a non-success code or
    /// has no smart creative for the group.
    pub async fn fetch_current_media(
        &self,
        advertiser_id: &str,
        adgroup_id: &str,
    ) -> Result<FetchedMedia, AppError> {
        require(Some(advertiser_id), "advertiser_id")?;
        require(Some(adgroup_id), "adgroup_id")?;

        if self.config.dry_run {
            return Ok(FetchedMedia {
                adgroup_id: adgroup_id.to_string(),
                entries: fixture_media(),
            });
        }

        let payload = json!({
            "advertiser_id": advertiser_id,
            "adgroup_ids": json!([adgroup_id]).to_string(),
        });

        let response = self
            .client
            .call(ACO_GET_PATH, Method::GET, &payload)
            .await?;

        if !response.envelope.is_success() {
            return Err(AppError::NotFound(format!(
                "smart creative for ad group {}: {}",
                adgroup_id, response.envelope.message
            )));
        }

        let page: PagedList<AcoAdGroup> = response.into_data()?;
        let entries = page
            .list
            .into_iter()
            .next()
            .and_then(|group| group.media_info_list)
            .ok_or_else(|| {
                AppError::NotFound(format!("smart creative media for ad group {}", adgroup_id))
            })?;

        tracing::info!(
            "Fetched {} media entries from smart creative group {}",
            entries.len(),
            adgroup_id
        );

        Ok(FetchedMedia {
            adgroup_id: adgroup_id.to_string(),
            entries,
        })
    }

    /// Append `new_media` to `current` and send the full list as a patch.
    ///
    /// On dry runs the payload is built and validated, then `DryRun` is
    /// returned instead of calling the platform.
    pub async fn merge_and_submit(
        &self,
        advertiser_id: &str,
        current: &FetchedMedia,
        new_media: &NewVideoMedia,
    ) -> Result<Value, AppError> {
        tracing::info!("Preparing smart creative update for {}", current.adgroup_id);
        let merged = prepare_update_payload(
            Some(advertiser_id),
            Some(current.adgroup_id.as_str()),
            Some(current.entries.as_slice()),
            Some(new_media.video_id.as_str()),
            Some(new_media.file_name.as_str()),
            Some(new_media.image_uris.as_slice()),
        )?;

        tracing::debug!(
            "Smart creative payload: {}",
            serde_json::to_string(&merged.payload).unwrap_or_default()
        );

        if self.config.dry_run {
            return Err(AppError::DryRun);
        }

        let payload = serde_json::to_value(&merged.payload)
            .map_err(|e| AppError::Schema(format!("Failed to encode update payload: {}", e)))?;

        self.client
            .call_checked(ACO_UPDATE_PATH, Method::POST, &payload)
            .await?
            .into_data()
    }
}
