//! Builds `ad/create` creatives from an ad group, uploaded media and the
//! attributes of a sibling ad. No I/O.

use crate::ad_group_name::{AdGroupTags, Platform, Vertical};
use crate::models::{AdGroup, CreativeMedia, CreativePayload, LandingTarget, SiblingAdInfo};

pub const CALL_TO_ACTION: &str = "DOWNLOAD_NOW";

pub const ANDROID_STORE_URL: &str =
    "https://play.google.com/store/apps/details?id=enterprises.dating.boo";
pub const IOS_STORE_URL: &str = "https://apps.apple.com/us/app/boo-personality-dating-app/id1498407272";
pub const IOS_GAMING_CPP_URL: &str = "https://apps.apple.com/us/app/boo-dating-friends-chat/id1498407272?ppid=54875da2-aa8c-4453-b8ae-7c77bc313c0e";
pub const IOS_ANIME_CPP_URL: &str = "https://apps.apple.com/us/app/boo-dating-friends-chat/id1498407272?ppid=47b17bcd-18a8-4061-8cc1-f516a37ee245";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdFormat {
    SingleVideo,
    /// Used for every image batch; single-image ads reject many sizes.
    CarouselAds,
}

impl AdFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            AdFormat::SingleVideo => "SINGLE_VIDEO",
            AdFormat::CarouselAds => "CAROUSEL_ADS",
        }
    }
}

/// Store or custom-product-page link for an ad group, if its name has one.
pub fn landing_target(tags: &AdGroupTags) -> Option<LandingTarget> {
    match (tags.platform, tags.vertical) {
        (Platform::Android, _) => Some(LandingTarget::LandingPageUrl(ANDROID_STORE_URL.to_string())),
        (Platform::Ios, Vertical::GeneralDating) => {
            Some(LandingTarget::LandingPageUrl(IOS_STORE_URL.to_string()))
        }
        (Platform::Ios, Vertical::Gaming) => Some(LandingTarget::CppUrl(IOS_GAMING_CPP_URL.to_string())),
        (Platform::Ios, Vertical::Anime) => Some(LandingTarget::CppUrl(IOS_ANIME_CPP_URL.to_string())),
        _ => None,
    }
}

pub fn build(
    ad_group: &AdGroup,
    media: CreativeMedia,
    sibling: &SiblingAdInfo,
    ad_name: &str,
    format: AdFormat,
) -> CreativePayload {
    let tags = AdGroupTags::parse(&ad_group.name);

    CreativePayload {
        ad_name: ad_name.to_string(),
        identity_type: sibling.identity_type.clone(),
        identity_id: sibling.identity_id.clone(),
        ad_format: format.as_str().to_string(),
        ad_text: sibling.ad_text.clone(),
        call_to_action: CALL_TO_ACTION.to_string(),
        media,
        landing: landing_target(&tags),
        tracking_app_id: sibling.tracking_app_id.clone(),
        call_to_action_id: sibling.call_to_action_id.clone(),
        app_name: sibling.app_name.clone(),
        card_id: sibling.card_id.clone(),
        page_id: sibling.page_id.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CreativeMode, DEFAULT_AD_TEXT, DEFAULT_IDENTITY_ID};
    use serde_json::json;

    fn group(name: &str) -> AdGroup {
        AdGroup::new("1", name, CreativeMode::Standard)
    }

    fn video() -> CreativeMedia {
        CreativeMedia::video("v-1", "cover-1")
    }

    #[test]
    fn test_android_uses_play_store() {
        let creative = build(
            &group("PH || General Dating || App || Android || Manual"),
            video(),
            &SiblingAdInfo::default(),
            "ad",
            AdFormat::SingleVideo,
        );
        assert_eq!(creative.landing_page_url(), Some(ANDROID_STORE_URL));
        assert_eq!(creative.cpp_url(), None);
    }

    #[test]
    fn test_ios_verticals() {
        let dating = build(
            &group("US || General Dating || iOS"),
            video(),
            &SiblingAdInfo::default(),
            "ad",
            AdFormat::SingleVideo,
        );
        assert_eq!(dating.landing_page_url(), Some(IOS_STORE_URL));

        let gaming = build(
            &group("US || Gaming || IOS"),
            video(),
            &SiblingAdInfo::default(),
            "ad",
            AdFormat::SingleVideo,
        );
        assert_eq!(gaming.cpp_url(), Some(IOS_GAMING_CPP_URL));
        assert_eq!(gaming.landing_page_url(), None);

        let anime = build(
            &group("US || Anime || ios"),
            video(),
            &SiblingAdInfo::default(),
            "ad",
            AdFormat::SingleVideo,
        );
        assert_eq!(anime.cpp_url(), Some(IOS_ANIME_CPP_URL));
    }

    #[test]
    fn test_unmatched_name_omits_landing_fields() {
        let creative = build(
            &group("US || Friends || Web"),
            video(),
            &SiblingAdInfo::default(),
            "ad",
            AdFormat::SingleVideo,
        );
        let value = serde_json::to_value(&creative).unwrap();

        assert!(value.get("landing_page_url").is_none());
        assert!(value.get("cpp_url").is_none());
    }

    #[test]
    fn test_serialized_payload_shape() {
        let sibling = SiblingAdInfo {
            tracking_app_id: Some("7001".to_string()),
            card_id: Some("card-9".to_string()),
            ..SiblingAdInfo::default()
        };
        let creative = build(
            &group("PH || General Dating || Android"),
            video(),
            &sibling,
            "General_Dating_v1-API_Upload-1700000000.mp4",
            AdFormat::SingleVideo,
        );

        assert_eq!(
            serde_json::to_value(&creative).unwrap(),
            json!({
                "ad_name": "General_Dating_v1-API_Upload-1700000000.mp4",
                "identity_type": "CUSTOMIZED_USER",
                "identity_id": DEFAULT_IDENTITY_ID,
                "ad_format": "SINGLE_VIDEO",
                "ad_text": DEFAULT_AD_TEXT,
                "call_to_action": "DOWNLOAD_NOW",
                "video_id": "v-1",
                "image_ids": ["cover-1"],
                "landing_page_url": ANDROID_STORE_URL,
                "tracking_app_id": "7001",
                "card_id": "card-9"
            })
        );
    }

    #[test]
    fn test_image_creative_has_no_video_id() {
        let creative = build(
            &group("PH || Static Image || Android"),
            CreativeMedia::images(vec!["i-1".to_string(), "i-2".to_string()]),
            &SiblingAdInfo::default(),
            "carousel",
            AdFormat::CarouselAds,
        );
        let value = serde_json::to_value(&creative).unwrap();

        assert!(value.get("video_id").is_none());
        assert_eq!(value["image_ids"], json!(["i-1", "i-2"]));
        assert_eq!(value["ad_format"], "CAROUSEL_ADS");
    }
}
