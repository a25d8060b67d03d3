//! Routing hints encoded in ad-group names.
//!
//! Names are pipe-delimited segments, e.g.
//! `Philippines L. English || General Dating || App || Purchase || Android || Test Ad Group || Smart Creative`.

use regex::Regex;
use std::sync::OnceLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Android,
    Ios,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Vertical {
    GeneralDating,
    Gaming,
    Anime,
    Other,
}

/// Structured view of an ad-group name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdGroupTags {
    pub platform: Platform,
    pub vertical: Vertical,
    pub is_test_group: bool,
    pub is_static_image: bool,
}

fn static_image_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)static\s+image").expect("valid regex"))
}

impl AdGroupTags {
    pub fn parse(name: &str) -> Self {
        let segments: Vec<String> = name
            .split("||")
            .map(|s| s.trim().to_lowercase())
            .collect();
        let has = |wanted: &str| segments.iter().any(|s| s == wanted);

        let platform = if has("android") {
            Platform::Android
        } else if has("ios") {
            Platform::Ios
        } else {
            Platform::Unknown
        };

        let vertical = if has("general dating") {
            Vertical::GeneralDating
        } else if has("gaming") {
            Vertical::Gaming
        } else if has("anime") {
            Vertical::Anime
        } else {
            Vertical::Other
        };

        let is_test_group = segments
            .iter()
            .any(|s| s.starts_with("test") && s.ends_with("ad group"));

        Self {
            platform,
            vertical,
            is_test_group,
            is_static_image: static_image_re().is_match(name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_android_general_dating_test_group() {
        let tags = AdGroupTags::parse(
            "C. Philippines L. English || General Dating || App || Purchase || Android || Test Manual Ad Group || Manual Creative",
        );
        assert_eq!(tags.platform, Platform::Android);
        assert_eq!(tags.vertical, Vertical::GeneralDating);
        assert!(tags.is_test_group);
        assert!(!tags.is_static_image);
    }

    #[test]
    fn test_segments_are_case_insensitive() {
        let tags = AdGroupTags::parse("US L. English || GAMING || App || iOS || Static  Image");
        assert_eq!(tags.platform, Platform::Ios);
        assert_eq!(tags.vertical, Vertical::Gaming);
        assert!(tags.is_static_image);
        assert!(!tags.is_test_group);
    }

    #[test]
    fn test_substrings_do_not_count_as_segments() {
        let tags = AdGroupTags::parse("Androids Fans || iOS devices || Anime lovers");
        assert_eq!(tags.platform, Platform::Unknown);
        assert_eq!(tags.vertical, Vertical::Other);
    }
}
