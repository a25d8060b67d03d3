/// Property-based tests using proptest
/// Invariants of the smart-creative merge, naming conventions and routing
use proptest::prelude::*;
use rust_tiktok_creatives::core::ad_group_name::{AdGroupTags, Platform};
use rust_tiktok_creatives::core::creative_builder::{
    build, AdFormat, ANDROID_STORE_URL, IOS_ANIME_CPP_URL, IOS_GAMING_CPP_URL,
};
use rust_tiktok_creatives::core::models::{
    AdGroup, CreativeMedia, CreativeMode, MediaInfoEntry, SiblingAdInfo,
};
use rust_tiktok_creatives::core::smart_creative::prepare_update_payload;
use rust_tiktok_creatives::ad_group_resolver::group_keyword;

fn entry_strategy() -> impl Strategy<Value = MediaInfoEntry> {
    (
        "[0-9]{6,19}",
        "[a-z_]{1,12}\\.mp4",
        prop::collection::vec("[a-z0-9]{4,10}", 0..3),
    )
        .prop_map(|(id, name, uris)| MediaInfoEntry::new(&id, &name, &uris))
}

proptest! {
    #[test]
    fn merge_keeps_prior_entries_in_order_and_appends_one(
        prior in prop::collection::vec(entry_strategy(), 1..20),
        new_id in "[0-9]{6,19}",
        new_uri in "[a-z0-9]{4,10}",
    ) {
        let uris = vec![new_uri.clone()];
        let merged = prepare_update_payload(
            Some("7000"),
            Some("1829719684525074"),
            Some(prior.as_slice()),
            Some(new_id.as_str()),
            Some("new.mp4"),
            Some(uris.as_slice()),
        ).unwrap();

        let entries = merged.entries();
        prop_assert_eq!(entries.len(), prior.len() + 1);
        for (before, after) in prior.iter().zip(entries) {
            prop_assert_eq!(before.video_id(), after.video_id());
            prop_assert_eq!(before.file_name(), after.file_name());
            prop_assert_eq!(before.image_uris(), after.image_uris());
        }

        let last = &entries[prior.len()];
        prop_assert_eq!(last.video_id(), Some(new_id.as_str()));
        prop_assert_eq!(last.image_uris(), vec![new_uri.as_str()]);
        prop_assert!(merged.payload.patch_update);
    }
}

proptest! {
    #[test]
    fn android_groups_always_land_on_play_store(
        prefix in "[A-Za-z. ]{0,20}",
        suffix in "[A-Za-z ]{0,20}",
        vertical in prop::sample::select(vec!["General Dating", "Gaming", "Anime", "Friends"]),
    ) {
        let name = format!("{} || {} || App || Android || {}", prefix, vertical, suffix);
        let creative = build(
            &AdGroup::new("1", name, CreativeMode::Standard),
            CreativeMedia::video("v", "c"),
            &SiblingAdInfo::default(),
            "ad",
            AdFormat::SingleVideo,
        );

        prop_assert_eq!(creative.landing_page_url(), Some(ANDROID_STORE_URL));
        prop_assert_eq!(creative.cpp_url(), None);
    }

    #[test]
    fn ios_niche_verticals_use_custom_product_pages(
        gaming in proptest::bool::ANY,
        upper in proptest::bool::ANY,
    ) {
        let vertical = if gaming { "Gaming" } else { "Anime" };
        let platform = if upper { "IOS" } else { "iOS" };
        let name = format!("US || {} || App || {} || Manual", vertical, platform);
        let creative = build(
            &AdGroup::new("1", name, CreativeMode::Standard),
            CreativeMedia::video("v", "c"),
            &SiblingAdInfo::default(),
            "ad",
            AdFormat::SingleVideo,
        );

        let expected = if gaming { IOS_GAMING_CPP_URL } else { IOS_ANIME_CPP_URL };
        prop_assert_eq!(creative.cpp_url(), Some(expected));
        prop_assert_eq!(creative.landing_page_url(), None);
    }
}

proptest! {
    #[test]
    fn tag_parsing_never_panics(name in "\\PC*") {
        let tags = AdGroupTags::parse(&name);
        if !name.to_lowercase().contains("android") && !name.to_lowercase().contains("ios") {
            prop_assert_eq!(tags.platform, Platform::Unknown);
        }
    }

    #[test]
    fn keyword_has_at_most_two_tokens(name in "[A-Za-z0-9_]{0,40}") {
        let keyword = group_keyword(&name);
        prop_assert!(keyword.split(' ').count() <= 2);
        prop_assert!(!keyword.contains('_'));
    }
}
