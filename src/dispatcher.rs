use reqwest::Method;

use crate::config::Config;
use crate::errors::AppError;
use crate::gateway_client::TikTokClient;
use crate::models::{AdGroup, CreativePayload, SubmissionResult};
use crate::rate_limiter::AD_CREATE_PATH;
use crate::tiktok_models::{AdCreateData, AdCreatePayload, ApiEnvelope};

/// Sends prepared creatives to standard ad groups.
#[derive(Clone)]
pub struct SubmissionDispatcher {
    client: TikTokClient,
    config: Config,
}

/// Normalize an `ad/create` answer into a result record.
///
/// Success requires a non-empty `ad_ids` list; anything else is a failure
/// carrying the platform message verbatim.
pub fn interpret_create_response(group: &AdGroup, envelope: &ApiEnvelope) -> SubmissionResult {
    let created = serde_json::from_value::<AdCreateData>(envelope.data.clone())
        .ok()
        .and_then(|data| data.ad_ids.into_iter().next());

    match created {
        Some(ad_id) => {
            tracing::info!(
                "✅ Created ad on ad group {} - {}: {}",
                group.name,
                group.id,
                ad_id
            );
            SubmissionResult::created(group, ad_id)
        }
        None => {
            tracing::warn!(
                "❌ Failed to create ad on group {} - {}: {}",
                group.name,
                group.id,
                envelope.message
            );
            SubmissionResult::failed(group, envelope.message.clone())
        }
    }
}

impl SubmissionDispatcher {
    pub fn new(client: TikTokClient, config: &Config) -> Self {
        Self {
            client,
            config: config.clone(),
        }
    }

    /// Create one ad in `group` from `creative`.
    ///
    /// Dry runs return a `FAILED` record marked `DRY RUN`. Transport and HTTP
    /// failures propagate to the caller.
    pub async fn submit(
        &self,
        group: &AdGroup,
        creative: &CreativePayload,
    ) -> Result<SubmissionResult, AppError> {
        let media_id = creative
            .media
            .video_id
            .clone()
            .unwrap_or_else(|| creative.media.image_ids.join("|"));

        let payload = AdCreatePayload {
            advertiser_id: &self.config.advertiser_id,
            adgroup_id: &group.id,
            creatives: vec![creative],
        };
        let payload = serde_json::to_value(&payload)
            .map_err(|e| AppError::Schema(format!("Failed to encode creative: {}", e)))?;
        tracing::debug!("Ad create payload: {}", payload);

        if self.config.dry_run {
            return Ok(SubmissionResult::failed(group, AppError::DryRun.to_string())
                .with_media_id(media_id));
        }

        let response = self
            .client
            .call(AD_CREATE_PATH, Method::POST, &payload)
            .await?;

        let result = interpret_create_response(group, &response.envelope);
        Ok(match result.ad_id {
            Some(_) => result,
            None => result.with_media_id(media_id),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::creative_builder::{build, AdFormat};
    use crate::models::{AdCreateStatus, CreativeMedia, CreativeMode, SiblingAdInfo};
    use serde_json::json;

    fn group() -> AdGroup {
        AdGroup::new("1830", "PH || Android", CreativeMode::Standard)
    }

    fn envelope(value: serde_json::Value) -> ApiEnvelope {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_created_ids_mean_success() {
        let result = interpret_create_response(
            &group(),
            &envelope(json!({"code": 0, "message": "OK", "data": {"ad_ids": ["111", "222"]}})),
        );
        assert_eq!(result.ad_create_status, Some(AdCreateStatus::Success));
        assert_eq!(result.ad_id.as_deref(), Some("111"));
        assert!(result.error.is_none());
    }

    #[test]
    fn test_other_shapes_mean_failure_with_message() {
        let shapes = [
            json!({"code": 40002, "message": "Invalid video", "data": {}}),
            json!({"code": 0, "message": "OK but odd", "data": {"ad_ids": []}}),
            json!({"code": 0, "message": "no data"}),
            json!({"code": 0, "message": "wrong type", "data": {"ad_ids": "1"}}),
        ];

        for shape in shapes {
            let message = shape["message"].as_str().unwrap().to_string();
            let result = interpret_create_response(&group(), &envelope(shape));
            assert_eq!(result.ad_create_status, Some(AdCreateStatus::Failed));
            assert_eq!(result.error, Some(message));
            assert!(result.ad_id.is_none());
        }
    }

    #[tokio::test]
    async fn test_dry_run_returns_failed_marker_without_network() {
        let config = Config::dry_run("adv");
        let dispatcher = SubmissionDispatcher::new(TikTokClient::new(&config).unwrap(), &config);
        let creative = build(
            &group(),
            CreativeMedia::video("v-1", "c-1"),
            &SiblingAdInfo::default(),
            "ad",
            AdFormat::SingleVideo,
        );

        let result = dispatcher.submit(&group(), &creative).await.unwrap();
        assert_eq!(result.ad_create_status, Some(AdCreateStatus::Failed));
        assert_eq!(result.error.as_deref(), Some("DRY RUN"));
        assert_eq!(result.media_id.as_deref(), Some("v-1"));
        assert!(result.processed_ok);
    }
}
