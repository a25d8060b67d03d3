//! Wire schemas for the TikTok Business API.
//!
//! Every response is parsed into one of these types at the gateway boundary.
//! Identifiers can arrive as JSON strings or as large JSON numbers; both are
//! carried as exact decimal strings.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::AppError;
use crate::models::{CreativePayload, MediaInfoEntry};

/// Response envelope shared by every endpoint.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiEnvelope {
    /// `0` on success
    pub code: i64,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub request_id: Option<String>,
    #[serde(default)]
    pub data: Value,
}

impl ApiEnvelope {
    pub fn is_success(&self) -> bool {
        self.code == 0
    }

    /// Fail with `Api` on a non-zero code, otherwise parse `data` into `T`.
    pub fn into_data<T: DeserializeOwned>(self, raw_body: &str) -> Result<T, AppError> {
        if !self.is_success() {
            return Err(AppError::Api {
                status_code: None,
                platform_code: Some(self.code),
                message: self.message,
                raw_body: raw_body.to_string(),
            });
        }
        serde_json::from_value(self.data)
            .map_err(|e| AppError::Schema(format!("unexpected response data: {}", e)))
    }
}

/// Paged `list` payload.
#[derive(Debug, Clone, Deserialize)]
pub struct PagedList<T> {
    #[serde(default = "Vec::new")]
    pub list: Vec<T>,
    #[serde(default)]
    pub page_info: Option<PageInfo>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PageInfo {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
    pub total_number: Option<u64>,
    pub total_page: Option<u32>,
}

/// `adgroup/get` item, restricted to the requested fields.
#[derive(Debug, Clone, Deserialize)]
pub struct AdGroupRecord {
    #[serde(deserialize_with = "ids::exact")]
    pub adgroup_id: String,
    pub adgroup_name: String,
    #[serde(default)]
    pub creative_material_mode: Option<String>,
}

/// `ad/get` item used as a template for new creatives.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AdRecord {
    pub ad_text: Option<String>,
    pub identity_type: Option<String>,
    #[serde(default, deserialize_with = "ids::exact_opt")]
    pub identity_id: Option<String>,
    #[serde(default, deserialize_with = "ids::exact_opt")]
    pub tracking_app_id: Option<String>,
    #[serde(default, deserialize_with = "ids::exact_opt")]
    pub call_to_action_id: Option<String>,
    pub app_name: Option<String>,
    #[serde(default, deserialize_with = "ids::exact_opt")]
    pub card_id: Option<String>,
    #[serde(default, deserialize_with = "ids::exact_opt")]
    pub page_id: Option<String>,
}

/// `file/video/ad/upload` returns an array of these.
#[derive(Debug, Clone, Deserialize)]
pub struct VideoUploadItem {
    pub video_id: String,
    #[serde(default)]
    pub file_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ImageUploadData {
    pub image_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CoverSuggestion {
    pub id: String,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
}

/// Video library entry (`file/video/ad/info`, `file/video/ad/search`).
#[derive(Debug, Clone, Deserialize)]
pub struct VideoInfo {
    pub video_id: String,
    #[serde(default)]
    pub file_name: Option<String>,
    #[serde(default)]
    pub material_id: Option<String>,
}

/// `ad/aco/get` item.
#[derive(Debug, Clone, Deserialize)]
pub struct AcoAdGroup {
    #[serde(default, deserialize_with = "ids::exact_opt")]
    pub adgroup_id: Option<String>,
    #[serde(default)]
    pub media_info_list: Option<Vec<MediaInfoEntry>>,
}

/// `ad/aco/update` request body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AcoUpdatePayload {
    pub advertiser_id: String,
    pub adgroup_id: String,
    pub patch_update: bool,
    pub media_info_list: Vec<MediaInfoEntry>,
}

/// `ad/create` request body.
#[derive(Debug, Clone, Serialize)]
pub struct AdCreatePayload<'a> {
    pub advertiser_id: &'a str,
    pub adgroup_id: &'a str,
    pub creatives: Vec<&'a CreativePayload>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AdCreateData {
    #[serde(default, deserialize_with = "ids::exact_vec")]
    pub ad_ids: Vec<String>,
}

pub(crate) mod ids {
    use serde::de::{self, Deserializer, SeqAccess, Visitor};
    use std::fmt;

    struct ExactId;

    impl<'de> Visitor<'de> for ExactId {
        type Value = String;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("an identifier as string or integer")
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<String, E> {
            Ok(v.to_string())
        }

        fn visit_string<E: de::Error>(self, v: String) -> Result<String, E> {
            Ok(v)
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<String, E> {
            Ok(v.to_string())
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<String, E> {
            Ok(v.to_string())
        }

        fn visit_u128<E: de::Error>(self, v: u128) -> Result<String, E> {
            Ok(v.to_string())
        }

        // Floats cannot carry an exact identifier
        fn visit_f64<E: de::Error>(self, v: f64) -> Result<String, E> {
            Err(E::custom(format!(
                "identifier {} lost precision as a float",
                v
            )))
        }
    }

    pub fn exact<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
        d.deserialize_any(ExactId)
    }

    pub fn exact_opt<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
        struct OptId;

        impl<'de> Visitor<'de> for OptId {
            type Value = Option<String>;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("an optional identifier")
            }

            fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
                Ok(None)
            }

            fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
                Ok(None)
            }

            fn visit_some<D: Deserializer<'de>>(self, d: D) -> Result<Self::Value, D::Error> {
                exact(d).map(Some)
            }
        }

        d.deserialize_option(OptId)
    }

    pub fn exact_vec<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<String>, D::Error> {
        struct IdSeq;

        impl<'de> Visitor<'de> for IdSeq {
            type Value = Vec<String>;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a list of identifiers")
            }

            fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
                Ok(Vec::new())
            }

            fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
                let mut out = Vec::new();
                while let Some(id) = seq.next_element::<IdWrapper>()? {
                    out.push(id.0);
                }
                Ok(out)
            }
        }

        struct IdWrapper(String);

        impl<'de> serde::Deserialize<'de> for IdWrapper {
            fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
                exact(d).map(IdWrapper)
            }
        }

        d.deserialize_any(IdSeq)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_large_numeric_ids_stay_exact() {
        let record: AdRecord = serde_json::from_str(
            r#"{"identity_id": 7465983795406553096, "card_id": "123", "page_id": null}"#,
        )
        .unwrap();

        assert_eq!(record.identity_id.as_deref(), Some("7465983795406553096"));
        assert_eq!(record.card_id.as_deref(), Some("123"));
        assert_eq!(record.page_id, None);
        assert_eq!(record.tracking_app_id, None);
    }

    #[test]
    fn test_ad_ids_accept_numbers_and_strings() {
        let data: AdCreateData =
            serde_json::from_value(json!({"ad_ids": [1830000000000000001u64, "42"]})).unwrap();
        assert_eq!(data.ad_ids, vec!["1830000000000000001", "42"]);
    }

    #[test]
    fn test_into_data_rejects_non_zero_code() {
        let envelope: ApiEnvelope =
            serde_json::from_value(json!({"code": 40001, "message": "No permission", "data": {}}))
                .unwrap();

        match envelope.into_data::<Value>("raw") {
            Err(AppError::Api {
                platform_code,
                message,
                raw_body,
                ..
            }) => {
                assert_eq!(platform_code, Some(40001));
                assert_eq!(message, "No permission");
                assert_eq!(raw_body, "raw");
            }
            other => panic!("expected Api error, got {:?}", other),
        }
    }

    #[test]
    fn test_into_data_reports_schema_mismatch() {
        let envelope: ApiEnvelope =
            serde_json::from_value(json!({"code": 0, "message": "OK", "data": {"list": 5}}))
                .unwrap();

        let result = envelope.into_data::<PagedList<AdGroupRecord>>("raw");
        assert!(matches!(result, Err(AppError::Schema(_))));
    }
}
