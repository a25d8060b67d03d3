//! Run modes: take input rows through upload, ad-group resolution and
//! delivery, recording one result per terminal outcome.

use chrono::Utc;

use crate::ad_group_resolver::{group_keyword, skip_reason, AdGroupResolver};
use crate::config::Config;
use crate::creative_builder::{self, AdFormat};
use crate::dispatcher::SubmissionDispatcher;
use crate::errors::AppError;
use crate::gateway_client::TikTokClient;
use crate::input::InputRow;
use crate::media::{file_stem, timestamped_file_name, MediaService};
use crate::models::{AdGroup, CreativeMedia, CreativeMode, MediaKind, SubmissionResult};
use crate::report::ReportSink;
use crate::smart_creative::{NewVideoMedia, SmartCreativeService};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// One ad per distinct `video_url`.
    Video,
    /// Carousel ads from pipe-delimited `image_url` lists.
    Image,
    /// Ads from TikTok One materials, matched by category and language.
    TiktokOne,
    /// Re-delivery of an uploaded video to one known ad group.
    Retry,
}

impl RunMode {
    /// Input columns echoed at the start of every report row.
    pub fn source_columns(&self) -> &'static [&'static str] {
        match self {
            RunMode::Video => &["video_url"],
            RunMode::Image => &["image_url"],
            RunMode::TiktokOne => &["category", "language", "material_id"],
            RunMode::Retry => &["ad_group_id", "video_id"],
        }
    }

    pub fn default_csv(&self) -> &'static str {
        match self {
            RunMode::Video => "test_data.csv",
            RunMode::Image => "test_image_data.csv",
            RunMode::TiktokOne => "test_tiktok_one_data.csv",
            RunMode::Retry => "test_retry_data.csv",
        }
    }

    pub fn report_prefix(&self) -> &'static str {
        match self {
            RunMode::Video => "ad_processing_report",
            RunMode::Image => "image_ad_processing_report",
            RunMode::TiktokOne => "tiktok_one_video_ad_processing_report",
            RunMode::Retry => "retry_video_ad_processing_report",
        }
    }

    pub fn report_subdir(&self) -> &'static str {
        match self {
            RunMode::Video => "video",
            RunMode::Image => "image",
            RunMode::TiktokOne => "tiktok-one",
            RunMode::Retry => "retry-video",
        }
    }
}

/// Everything needed to put one uploaded asset into an ad group.
#[derive(Debug, Clone)]
struct Delivery {
    kind: MediaKind,
    media: CreativeMedia,
    media_id: String,
    ad_name: String,
    format: AdFormat,
    /// Entry for smart-creative groups. Image assets have none and go
    /// through ad creation in every group.
    smart_entry: Option<NewVideoMedia>,
    /// Apply the test-group and static-image eligibility checks.
    filter_groups: bool,
}

impl Delivery {
    fn video(video_id: &str, cover_id: &str, ad_name: &str, entry_name: &str) -> Self {
        Self {
            kind: MediaKind::Video,
            media: CreativeMedia::video(video_id, cover_id),
            media_id: video_id.to_string(),
            ad_name: ad_name.to_string(),
            format: AdFormat::SingleVideo,
            smart_entry: Some(NewVideoMedia {
                video_id: video_id.to_string(),
                file_name: entry_name.to_string(),
                image_uris: vec![cover_id.to_string()],
            }),
            filter_groups: true,
        }
    }
}

/// Counts records passing through to the real sink.
struct Tally<'a, S: ReportSink> {
    sink: &'a mut S,
    written: usize,
}

impl<S: ReportSink> Tally<'_, S> {
    fn record(&mut self, sources: &[&str], result: SubmissionResult) -> Result<(), AppError> {
        self.sink.record(sources, &result)?;
        self.written += 1;
        Ok(())
    }
}

#[derive(Clone)]
pub struct Pipeline {
    config: Config,
    resolver: AdGroupResolver,
    media: MediaService,
    smart_creative: SmartCreativeService,
    dispatcher: SubmissionDispatcher,
}

impl Pipeline {
    pub fn new(config: &Config) -> Result<Self, AppError> {
        let client = TikTokClient::new(config)?;
        Ok(Self {
            config: config.clone(),
            resolver: AdGroupResolver::new(client.clone(), config),
            media: MediaService::new(client.clone(), config)?,
            smart_creative: SmartCreativeService::new(client.clone(), config),
            dispatcher: SubmissionDispatcher::new(client, config),
        })
    }

    /// Process `rows` in `mode`. Returns the number of records written.
    ///
    /// Per-asset and per-group failures become records; only a failing sink
    /// stops the run.
    pub async fn run<S: ReportSink>(
        &self,
        mode: RunMode,
        rows: &[InputRow],
        sink: &mut S,
    ) -> Result<usize, AppError> {
        if rows.is_empty() {
            tracing::info!("No rows to process");
            return Ok(0);
        }

        let mut tally = Tally { sink, written: 0 };
        match mode {
            RunMode::Video => {
                for url in distinct_video_urls(rows) {
                    let sources = [url.as_str()];
                    self.process_video(&url, &sources, &mut tally).await?;
                }
                for row in rows.iter().filter(|r| r.field("video_url").is_none()) {
                    let err = AppError::InvalidArgument("video_url is required".to_string());
                    tally.record(&[row.raw("video_url")], SubmissionResult::asset_failed(false, &err))?;
                }
            }
            RunMode::Image => {
                for row in rows {
                    self.process_images(row, &mut tally).await?;
                }
            }
            RunMode::TiktokOne => {
                for row in rows {
                    self.process_tiktok_one(row, &mut tally).await?;
                }
            }
            RunMode::Retry => {
                for row in rows {
                    self.process_retry(row, &mut tally).await?;
                }
            }
        }

        tracing::info!("Processed {} rows, wrote {} records", rows.len(), tally.written);
        Ok(tally.written)
    }

    async fn process_video<S: ReportSink>(
        &self,
        url: &str,
        sources: &[&str],
        tally: &mut Tally<'_, S>,
    ) -> Result<(), AppError> {
        let mut processed = false;
        let outcome: Result<(), AppError> = async {
            let file = self.media.download(url).await?;
            let upload_name = timestamped_file_name(&file.file_name, Utc::now().timestamp());
            let keyword = group_keyword(file_stem(&file.file_name));
            tracing::info!("Upload name: {}, ad group keyword: {}", upload_name, keyword);

            let video = self.media.upload_video(&file, &upload_name).await?;
            let cover = self.media.suggest_cover(&video.id).await?;
            processed = true;

            let delivery = Delivery::video(&video.id, &cover, &upload_name, &upload_name);
            self.deliver_by_keyword(&keyword, &delivery, sources, tally)
                .await
        }
        .await;

        self.record_asset_failure(outcome, processed, sources, tally, url)
    }

    async fn process_images<S: ReportSink>(
        &self,
        row: &InputRow,
        tally: &mut Tally<'_, S>,
    ) -> Result<(), AppError> {
        let raw = row.raw("image_url");
        let sources = [raw];
        let mut processed = false;

        let outcome: Result<(), AppError> = async {
            let urls = parse_image_urls(raw);
            if urls.is_empty() {
                return Err(AppError::InvalidArgument("image_url is required".to_string()));
            }

            let mut image_ids = Vec::with_capacity(urls.len());
            let mut first_name = None;
            for url in &urls {
                let file = self.media.download(url).await?;
                let upload_name = timestamped_file_name(&file.file_name, Utc::now().timestamp());
                let image = self.media.upload_image(&file, &upload_name).await?;
                first_name.get_or_insert(file.file_name);
                image_ids.push(image.id);
            }
            processed = true;

            let first_name = first_name.unwrap_or_default();
            let ad_name = file_stem(&first_name).to_string();
            let keyword = group_keyword(&ad_name);
            tracing::info!("Image ids: {:?}, ad group keyword: {}", image_ids, keyword);

            let delivery = Delivery {
                kind: MediaKind::Image,
                media_id: image_ids.join("|"),
                media: CreativeMedia::images(image_ids),
                ad_name,
                format: AdFormat::CarouselAds,
                smart_entry: None,
                filter_groups: true,
            };
            self.deliver_by_keyword(&keyword, &delivery, &sources, tally)
                .await
        }
        .await;

        self.record_asset_failure(outcome, processed, &sources, tally, raw)
    }

    async fn process_tiktok_one<S: ReportSink>(
        &self,
        row: &InputRow,
        tally: &mut Tally<'_, S>,
    ) -> Result<(), AppError> {
        let sources = [row.raw("category"), row.raw("language"), row.raw("material_id")];
        let mut processed = false;

        let outcome: Result<(), AppError> = async {
            let material_id = required(row, "material_id")?;
            let category = required(row, "category")?;
            let language = required(row, "language")?;

            let info = self.media.tiktok_one_video_info(material_id).await?;
            let cover = self.media.suggest_cover(&info.video_id).await?;
            processed = true;

            let ad_name = info.file_name.clone().unwrap_or_default();
            let delivery = Delivery::video(
                &info.video_id,
                &cover,
                &ad_name,
                &format!("{}.mp4", ad_name),
            );
            let keyword = format!("{} {}", category, language);
            self.deliver_by_keyword(&keyword, &delivery, &sources, tally)
                .await
        }
        .await;

        self.record_asset_failure(outcome, processed, &sources, tally, row.raw("material_id"))
    }

    async fn process_retry<S: ReportSink>(
        &self,
        row: &InputRow,
        tally: &mut Tally<'_, S>,
    ) -> Result<(), AppError> {
        let sources = [row.raw("ad_group_id"), row.raw("video_id")];
        let mut processed = false;

        let outcome: Result<(), AppError> = async {
            let adgroup_id = required(row, "ad_group_id")?;
            let video_id = required(row, "video_id")?;

            let info = self.media.video_info(video_id).await?;
            let cover = self.media.suggest_cover(video_id).await?;
            processed = true;

            let group = self.resolver.find_by_id(adgroup_id).await?;
            tracing::info!("Processing group {} - video {}", group.id, video_id);

            let ad_name = info.file_name.clone().unwrap_or_default();
            let delivery = Delivery {
                filter_groups: false,
                ..Delivery::video(video_id, &cover, &ad_name, &format!("{}.mp4", ad_name))
            };
            let result = self.deliver(&group, &delivery).await;
            tally.record(&sources, result)
        }
        .await;

        self.record_asset_failure(outcome, processed, &sources, tally, row.raw("video_id"))
    }

    /// Report an asset-level failure; sink failures still abort the run.
    fn record_asset_failure<S: ReportSink>(
        &self,
        outcome: Result<(), AppError>,
        processed: bool,
        sources: &[&str],
        tally: &mut Tally<'_, S>,
        asset: &str,
    ) -> Result<(), AppError> {
        match outcome {
            Ok(()) => Ok(()),
            Err(err @ (AppError::Io(_) | AppError::Csv(_))) => Err(err),
            Err(err) => {
                tracing::error!("❌ Failed processing {}: {}", asset, err);
                tally.record(sources, SubmissionResult::asset_failed(processed, &err))
            }
        }
    }

    async fn deliver_by_keyword<S: ReportSink>(
        &self,
        keyword: &str,
        delivery: &Delivery,
        sources: &[&str],
        tally: &mut Tally<'_, S>,
    ) -> Result<(), AppError> {
        let groups = self.resolver.find_by_keyword(keyword).await?;
        if groups.is_empty() {
            let result = SubmissionResult::no_ad_groups(keyword);
            tracing::warn!("{}", result.error.as_deref().unwrap_or_default());
            return tally.record(sources, result);
        }

        for group in &groups {
            let result = self.deliver(group, delivery).await;
            tally.record(sources, result)?;
        }
        Ok(())
    }

    /// Put one asset into one ad group. Never fails; errors become records.
    async fn deliver(&self, group: &AdGroup, delivery: &Delivery) -> SubmissionResult {
        if delivery.filter_groups {
            if let Some(reason) = skip_reason(&self.config, group, delivery.kind) {
                tracing::info!("Skip ad group {}: {}", group.name, reason);
                return SubmissionResult::not_applicable(group, reason);
            }
        }

        tracing::info!("Processing group {} - {}", group.name, group.id);
        match (group.creative_mode, &delivery.smart_entry) {
            (CreativeMode::Adaptive, Some(entry)) => {
                self.deliver_adaptive(group, delivery, entry).await
            }
            _ => match self.deliver_standard(group, delivery).await {
                Ok(result) => result,
                Err(err) => {
                    tracing::error!("❌ Failed to create ad in group {}: {}", group.id, err);
                    SubmissionResult::failed(group, err.to_string())
                        .with_media_id(delivery.media_id.clone())
                }
            },
        }
    }

    async fn deliver_standard(
        &self,
        group: &AdGroup,
        delivery: &Delivery,
    ) -> Result<SubmissionResult, AppError> {
        let sibling = self.resolver.sibling_ad_info(&group.id).await?;
        let creative = creative_builder::build(
            group,
            delivery.media.clone(),
            &sibling,
            &delivery.ad_name,
            delivery.format,
        );
        self.dispatcher.submit(group, &creative).await
    }

    async fn deliver_adaptive(
        &self,
        group: &AdGroup,
        delivery: &Delivery,
        entry: &NewVideoMedia,
    ) -> SubmissionResult {
        let advertiser_id = &self.config.advertiser_id;
        let current = match self
            .smart_creative
            .fetch_current_media(advertiser_id, &group.id)
            .await
        {
            Ok(current) => current,
            Err(err) => {
                tracing::error!(
                    "❌ Failed to get smart creative detail from group {}: {}",
                    group.id,
                    err
                );
                return SubmissionResult::failed(group, err.to_string());
            }
        };

        match self
            .smart_creative
            .merge_and_submit(advertiser_id, &current, entry)
            .await
        {
            Ok(_) => {
                tracing::info!(
                    "✅ Updated smart creative on ad group {} - {}",
                    group.name,
                    group.id
                );
                SubmissionResult::success(group)
            }
            Err(err) => {
                if !err.is_dry_run() {
                    tracing::error!(
                        "❌ Failed to update smart creative for group {}: {}",
                        group.id,
                        err
                    );
                }
                SubmissionResult::failed(group, err.to_string())
                    .with_media_id(delivery.media_id.clone())
            }
        }
    }
}

/// Distinct non-empty `video_url` values in first-seen order.
pub fn distinct_video_urls(rows: &[InputRow]) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    rows.iter()
        .filter_map(|row| row.field("video_url"))
        .filter(|url| seen.insert(url.to_string()))
        .map(str::to_string)
        .collect()
}

pub fn parse_image_urls(raw: &str) -> Vec<&str> {
    raw.split('|')
        .map(str::trim)
        .filter(|url| !url.is_empty())
        .collect()
}

fn required<'a>(row: &'a InputRow, column: &str) -> Result<&'a str, AppError> {
    row.field(column)
        .ok_or_else(|| AppError::InvalidArgument(format!("{} is required", column)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(column: &str, value: &str) -> InputRow {
        InputRow::from_pairs([(column, value)])
    }

    #[test]
    fn test_distinct_urls_keep_first_seen_order() {
        let rows = vec![
            row("video_url", "https://a/2.mp4"),
            row("video_url", "https://a/1.mp4"),
            row("video_url", " https://a/2.mp4 "),
            row("video_url", ""),
        ];
        assert_eq!(
            distinct_video_urls(&rows),
            vec!["https://a/2.mp4", "https://a/1.mp4"]
        );
    }

    #[test]
    fn test_image_urls_split_on_pipe() {
        assert_eq!(
            parse_image_urls(" https://a/1.png | |https://a/2.png|"),
            vec!["https://a/1.png", "https://a/2.png"]
        );
        assert!(parse_image_urls("  ").is_empty());
    }

    #[test]
    fn test_report_layout_per_mode() {
        assert_eq!(RunMode::Retry.source_columns(), &["ad_group_id", "video_id"]);
        assert_eq!(RunMode::TiktokOne.report_subdir(), "tiktok-one");
        assert_eq!(RunMode::Image.default_csv(), "test_image_data.csv");
    }
}
