use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

use crate::errors::AppError;
use crate::tiktok_models::{ids, AdGroupRecord, AdRecord};

// ============ Media ============

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Video,
    Image,
}

/// An uploaded video or image. Immutable once the platform has assigned an id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaAsset {
    pub kind: MediaKind,
    pub id: String,
    pub display_name: String,
    pub source_uri: String,
}

// ============ Ad groups ============

/// How an ad group consumes creatives. Drives every downstream branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreativeMode {
    /// One fixed creative per ad (`CUSTOM`).
    Standard,
    /// Pooled media list chosen automatically (`SMART_CREATIVE`).
    Adaptive,
}

impl CreativeMode {
    pub fn from_platform(raw: Option<&str>) -> Self {
        match raw {
            Some(mode) if mode.eq_ignore_ascii_case("SMART_CREATIVE") => CreativeMode::Adaptive,
            _ => CreativeMode::Standard,
        }
    }

    pub fn as_platform_str(&self) -> &'static str {
        match self {
            CreativeMode::Standard => "CUSTOM",
            CreativeMode::Adaptive => "SMART_CREATIVE",
        }
    }
}

impl fmt::Display for CreativeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_platform_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdGroup {
    pub id: String,
    pub name: String,
    pub creative_mode: CreativeMode,
}

impl AdGroup {
    pub fn new(id: impl Into<String>, name: impl Into<String>, creative_mode: CreativeMode) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            creative_mode,
        }
    }
}

impl From<AdGroupRecord> for AdGroup {
    fn from(record: AdGroupRecord) -> Self {
        Self {
            creative_mode: CreativeMode::from_platform(record.creative_material_mode.as_deref()),
            id: record.adgroup_id,
            name: record.adgroup_name,
        }
    }
}

// ============ Sibling ad ============

pub const DEFAULT_AD_TEXT: &str = "Try Boo Now!";
pub const DEFAULT_IDENTITY_TYPE: &str = "CUSTOMIZED_USER";
pub const DEFAULT_IDENTITY_ID: &str = "7465983795406553096";

/// Attributes borrowed from an existing ad in the same ad group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiblingAdInfo {
    pub ad_text: String,
    pub identity_type: String,
    pub identity_id: String,
    pub tracking_app_id: Option<String>,
    pub call_to_action_id: Option<String>,
    pub app_name: Option<String>,
    pub card_id: Option<String>,
    pub page_id: Option<String>,
}

impl Default for SiblingAdInfo {
    fn default() -> Self {
        Self::from_sibling(None)
    }
}

impl SiblingAdInfo {
    /// Snapshot of the first sibling ad, falling back to defaults per field.
    pub fn from_sibling(ad: Option<AdRecord>) -> Self {
        let ad = ad.unwrap_or_default();
        Self {
            ad_text: non_empty(ad.ad_text).unwrap_or_else(|| DEFAULT_AD_TEXT.to_string()),
            identity_type: non_empty(ad.identity_type)
                .unwrap_or_else(|| DEFAULT_IDENTITY_TYPE.to_string()),
            identity_id: non_empty(ad.identity_id)
                .unwrap_or_else(|| DEFAULT_IDENTITY_ID.to_string()),
            tracking_app_id: non_empty(ad.tracking_app_id),
            call_to_action_id: non_empty(ad.call_to_action_id),
            app_name: non_empty(ad.app_name),
            card_id: non_empty(ad.card_id),
            page_id: non_empty(ad.page_id),
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

// ============ Creative payload ============

/// Media references carried by a creative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreativeMedia {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_id: Option<String>,
    pub image_ids: Vec<String>,
}

impl CreativeMedia {
    pub fn video(video_id: impl Into<String>, cover_image_id: impl Into<String>) -> Self {
        Self {
            video_id: Some(video_id.into()),
            image_ids: vec![cover_image_id.into()],
        }
    }

    pub fn images(image_ids: Vec<String>) -> Self {
        Self {
            video_id: None,
            image_ids,
        }
    }
}

/// Where a click lands. A creative carries at most one of these.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LandingTarget {
    LandingPageUrl(String),
    CppUrl(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreativePayload {
    pub ad_name: String,
    pub identity_type: String,
    pub identity_id: String,
    pub ad_format: String,
    pub ad_text: String,
    pub call_to_action: String,
    #[serde(flatten)]
    pub media: CreativeMedia,
    #[serde(flatten, skip_serializing_if = "Option::is_none")]
    pub landing: Option<LandingTarget>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tracking_app_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub call_to_action_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub card_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_id: Option<String>,
}

impl CreativePayload {
    pub fn landing_page_url(&self) -> Option<&str> {
        match &self.landing {
            Some(LandingTarget::LandingPageUrl(url)) => Some(url),
            _ => None,
        }
    }

    pub fn cpp_url(&self) -> Option<&str> {
        match &self.landing {
            Some(LandingTarget::CppUrl(url)) => Some(url),
            _ => None,
        }
    }
}

// ============ Smart creative media list ============

/// One entry of a smart-creative ad group's media list.
///
/// Entries read from the platform keep every field they arrived with in
/// `extra`; `flattened` keeps only the video id/name and image uris.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MediaInfoEntry {
    pub media_info: MediaInfo,
    #[serde(flatten, skip_serializing_if = "Map::is_empty")]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MediaInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_info: Option<VideoRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_info: Option<Vec<ImageRef>>,
    #[serde(flatten, skip_serializing_if = "Map::is_empty")]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct VideoRef {
    #[serde(
        default,
        deserialize_with = "ids::exact_opt",
        skip_serializing_if = "Option::is_none"
    )]
    pub video_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    #[serde(flatten, skip_serializing_if = "Map::is_empty")]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ImageRef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub web_uri: Option<String>,
    #[serde(flatten, skip_serializing_if = "Map::is_empty")]
    pub extra: Map<String, Value>,
}

impl MediaInfoEntry {
    pub fn new(video_id: &str, file_name: &str, image_uris: &[String]) -> Self {
        Self {
            media_info: MediaInfo {
                video_info: Some(VideoRef {
                    video_id: Some(video_id.to_string()),
                    file_name: Some(file_name.to_string()),
                    extra: Map::new(),
                }),
                image_info: Some(
                    image_uris
                        .iter()
                        .map(|uri| ImageRef {
                            web_uri: Some(uri.clone()),
                            extra: Map::new(),
                        })
                        .collect(),
                ),
                extra: Map::new(),
            },
            extra: Map::new(),
        }
    }

    /// Copy keeping only `video_id`, `file_name` and each image's `web_uri`.
    pub fn flattened(&self) -> Self {
        let info = &self.media_info;
        Self {
            media_info: MediaInfo {
                video_info: Some(VideoRef {
                    video_id: info.video_info.as_ref().and_then(|v| v.video_id.clone()),
                    file_name: info.video_info.as_ref().and_then(|v| v.file_name.clone()),
                    extra: Map::new(),
                }),
                image_info: info.image_info.as_ref().map(|images| {
                    images
                        .iter()
                        .map(|img| ImageRef {
                            web_uri: img.web_uri.clone(),
                            extra: Map::new(),
                        })
                        .collect()
                }),
                extra: Map::new(),
            },
            extra: Map::new(),
        }
    }

    pub fn video_id(&self) -> Option<&str> {
        self.media_info
            .video_info
            .as_ref()
            .and_then(|v| v.video_id.as_deref())
    }

    pub fn file_name(&self) -> Option<&str> {
        self.media_info
            .video_info
            .as_ref()
            .and_then(|v| v.file_name.as_deref())
    }

    pub fn image_uris(&self) -> Vec<&str> {
        self.media_info
            .image_info
            .iter()
            .flatten()
            .filter_map(|img| img.web_uri.as_deref())
            .collect()
    }
}

// ============ Submission results ============

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdCreateStatus {
    Success,
    Failed,
    NotApplicable,
}

impl AdCreateStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AdCreateStatus::Success => "SUCCESS",
            AdCreateStatus::Failed => "FAILED",
            AdCreateStatus::NotApplicable => "NOT_APPLICABLE",
        }
    }
}

impl fmt::Display for AdCreateStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Terminal outcome of one (asset, ad group) pairing attempt.
///
/// Records for asset-level failures (before any ad group is known) leave the
/// group fields and usually the status empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionResult {
    pub processed_ok: bool,
    pub ad_create_status: Option<AdCreateStatus>,
    pub creative_mode: Option<CreativeMode>,
    pub ad_group_name: Option<String>,
    pub ad_group_id: Option<String>,
    pub ad_id: Option<String>,
    pub media_id: Option<String>,
    pub error: Option<String>,
}

impl SubmissionResult {
    fn for_group(group: &AdGroup, status: AdCreateStatus) -> Self {
        Self {
            processed_ok: true,
            ad_create_status: Some(status),
            creative_mode: Some(group.creative_mode),
            ad_group_name: Some(group.name.clone()),
            ad_group_id: Some(group.id.clone()),
            ad_id: None,
            media_id: None,
            error: None,
        }
    }

    pub fn success(group: &AdGroup) -> Self {
        Self::for_group(group, AdCreateStatus::Success)
    }

    pub fn created(group: &AdGroup, ad_id: impl Into<String>) -> Self {
        Self {
            ad_id: Some(ad_id.into()),
            ..Self::for_group(group, AdCreateStatus::Success)
        }
    }

    pub fn failed(group: &AdGroup, error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::for_group(group, AdCreateStatus::Failed)
        }
    }

    pub fn not_applicable(group: &AdGroup, reason: impl Into<String>) -> Self {
        Self {
            error: Some(reason.into()),
            ..Self::for_group(group, AdCreateStatus::NotApplicable)
        }
    }

    /// The asset itself could not be processed; no ad group was reached.
    pub fn asset_failed(processed_ok: bool, error: &AppError) -> Self {
        Self {
            processed_ok,
            ad_create_status: None,
            creative_mode: None,
            ad_group_name: None,
            ad_group_id: None,
            ad_id: None,
            media_id: None,
            error: Some(error.to_string()),
        }
    }

    /// The asset was processed but no ad group matched.
    pub fn no_ad_groups(keyword: &str) -> Self {
        Self {
            processed_ok: true,
            ad_create_status: Some(AdCreateStatus::Failed),
            creative_mode: None,
            ad_group_name: None,
            ad_group_id: None,
            ad_id: None,
            media_id: None,
            error: Some(format!(
                "can not find any ad groups with keyword: {}",
                keyword
            )),
        }
    }

    pub fn with_media_id(mut self, media_id: impl Into<String>) -> Self {
        self.media_id = Some(media_id.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_creative_mode_from_platform() {
        assert_eq!(
            CreativeMode::from_platform(Some("SMART_CREATIVE")),
            CreativeMode::Adaptive
        );
        assert_eq!(
            CreativeMode::from_platform(Some("CUSTOM")),
            CreativeMode::Standard
        );
        assert_eq!(CreativeMode::from_platform(None), CreativeMode::Standard);
    }

    #[test]
    fn test_sibling_defaults_when_absent() {
        let info = SiblingAdInfo::from_sibling(None);
        assert_eq!(info.ad_text, DEFAULT_AD_TEXT);
        assert_eq!(info.identity_type, DEFAULT_IDENTITY_TYPE);
        assert_eq!(info.identity_id, DEFAULT_IDENTITY_ID);
        assert!(info.tracking_app_id.is_none());
        assert!(info.page_id.is_none());
    }

    #[test]
    fn test_sibling_keeps_present_fields() {
        let ad: AdRecord = serde_json::from_value(json!({
            "ad_text": "Meet people like you",
            "identity_id": "111",
            "tracking_app_id": 9876543210123456789u64,
            "card_id": "",
            "page_id": 7300000000000000001u64,
            "landing_page_urls": ["https://a.example"]
        }))
        .unwrap();

        let info = SiblingAdInfo::from_sibling(Some(ad));
        assert_eq!(info.ad_text, "Meet people like you");
        assert_eq!(info.identity_type, DEFAULT_IDENTITY_TYPE);
        assert_eq!(info.identity_id, "111");
        assert_eq!(info.tracking_app_id.as_deref(), Some("9876543210123456789"));
        assert_eq!(info.card_id, None);
        assert_eq!(info.page_id.as_deref(), Some("7300000000000000001"));
    }

    #[test]
    fn test_media_entry_flattening_drops_extra_fields() {
        let entry: MediaInfoEntry = serde_json::from_value(json!({
            "media_info": {
                "video_info": {"video_id": "v1", "file_name": "a.mp4", "width": 720},
                "image_info": [{"web_uri": "img-1", "image_mode": "x"}],
                "is_deleted": false
            },
            "material_id": "m-1"
        }))
        .unwrap();

        assert!(!entry.extra.is_empty());

        let flat = serde_json::to_value(entry.flattened()).unwrap();
        assert_eq!(
            flat,
            json!({
                "media_info": {
                    "video_info": {"video_id": "v1", "file_name": "a.mp4"},
                    "image_info": [{"web_uri": "img-1"}]
                }
            })
        );
    }

    #[test]
    fn test_asset_failure_record_has_no_group() {
        let record = SubmissionResult::asset_failed(false, &AppError::Transport("timeout".into()));
        assert!(!record.processed_ok);
        assert!(record.ad_group_id.is_none());
        assert_eq!(record.error.as_deref(), Some("Transport error: timeout"));
    }
}
