//! Media download and upload against the TikTok file library.

use percent_encoding::percent_decode_str;
use regex::Regex;
use reqwest::{header::CONTENT_DISPOSITION, multipart, Method};
use serde_json::json;
use std::sync::OnceLock;
use std::time::Instant;

use crate::config::Config;
use crate::errors::{AppError, ResultExt};
use crate::gateway_client::TikTokClient;
use crate::models::{MediaAsset, MediaKind};
use crate::tiktok_models::{CoverSuggestion, ImageUploadData, PagedList, VideoInfo, VideoUploadItem};

const VIDEO_UPLOAD_PATH: &str = "/open_api/v1.3/file/video/ad/upload/";
const IMAGE_UPLOAD_PATH: &str = "/open_api/v1.3/file/image/ad/upload/";
const SUGGEST_COVER_PATH: &str = "/open_api/v1.3/file/video/suggestcover/";
const VIDEO_INFO_PATH: &str = "/open_api/v1.3/file/video/ad/info/";
const VIDEO_SEARCH_PATH: &str = "/open_api/v1.3/file/video/ad/search/";

pub const DRYRUN_VIDEO_ID: &str = "DRYRUN_VIDEO_ID";
pub const DRYRUN_IMAGE_ID: &str = "DRYRUN_IMAGE_ID";
pub const DRYRUN_COVER_IMAGE_ID: &str = "DRYRUN_COVER_IMAGE_ID";
pub const DRYRUN_FILENAME: &str = "DRYRUN_FILENAME";

/// Bytes fetched from a source URL, with the name the source gave them.
#[derive(Debug, Clone)]
pub struct DownloadedFile {
    pub source_url: String,
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Rewrite Google Drive share links to their direct-download form.
pub fn direct_download_url(url: &str) -> String {
    static DRIVE: OnceLock<Regex> = OnceLock::new();
    let drive = DRIVE.get_or_init(|| Regex::new(r"/file/d/([^/]+)/").expect("valid regex"));

    match drive.captures(url).and_then(|c| c.get(1)) {
        Some(id) => format!("https://drive.google.com/uc?export=download&id={}", id.as_str()),
        None => url.to_string(),
    }
}

/// File name from a `Content-Disposition` header value.
pub fn filename_from_disposition(header: &str) -> Option<String> {
    static FILENAME: OnceLock<Regex> = OnceLock::new();
    let filename = FILENAME.get_or_init(|| {
        Regex::new(r#"(?i)filename\*?=(?:UTF-8'')?\s*(?:"([^"]*)"|'([^']*)'|([^;\n]*))"#)
            .expect("valid regex")
    });

    let caps = filename.captures(header)?;
    let raw = caps
        .get(1)
        .or_else(|| caps.get(2))
        .or_else(|| caps.get(3))?
        .as_str()
        .trim();
    let name = percent_decode_str(raw).decode_utf8_lossy().to_string();
    (!name.is_empty()).then_some(name)
}

/// Last path segment of `url`, percent-decoded, without the query string.
pub fn filename_from_url(url: &str) -> Option<String> {
    let parsed = url::Url::parse(url).ok()?;
    let last = parsed.path_segments()?.next_back()?;
    let name = percent_decode_str(last).decode_utf8().ok()?.to_string();
    (!name.is_empty()).then_some(name)
}

/// File name without its final extension.
pub fn file_stem(name: &str) -> &str {
    match name.rfind('.') {
        Some(i) if i > 0 => &name[..i],
        _ => name,
    }
}

/// `<stem>-API_Upload-<timestamp><ext>`.
pub fn timestamped_file_name(name: &str, timestamp: i64) -> String {
    let stem = file_stem(name);
    let ext = &name[stem.len()..];
    format!("{}-API_Upload-{}{}", stem, timestamp, ext)
}

fn md5_hex(bytes: &[u8]) -> String {
    use md5::{Digest, Md5};
    hex::encode(Md5::digest(bytes))
}

/// Moves media between source URLs and the advertiser's file library.
///
/// On dry runs nothing is downloaded or uploaded and fixed placeholder ids
/// are returned.
#[derive(Clone)]
pub struct MediaService {
    client: TikTokClient,
    http: reqwest::Client,
    config: Config,
}

impl MediaService {
    pub fn new(client: TikTokClient, config: &Config) -> Result<Self, AppError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| AppError::Transport(format!("Failed to create download client: {}", e)))?;

        Ok(Self {
            client,
            http,
            config: config.clone(),
        })
    }

    pub async fn download(&self, source_url: &str) -> Result<DownloadedFile, AppError> {
        if self.config.dry_run {
            return Ok(DownloadedFile {
                source_url: source_url.to_string(),
                file_name: DRYRUN_FILENAME.to_string(),
                bytes: Vec::new(),
            });
        }

        let url = direct_download_url(source_url);
        tracing::info!("Downloading {}", url);

        let response = self.http.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(AppError::Api {
                status_code: Some(status.as_u16()),
                platform_code: None,
                message: format!("download of {} failed", source_url),
                raw_body: String::new(),
            });
        }

        let from_header = response
            .headers()
            .get(CONTENT_DISPOSITION)
            .and_then(|v| v.to_str().ok())
            .and_then(filename_from_disposition);
        let file_name = from_header
            .or_else(|| filename_from_url(source_url))
            .ok_or_else(|| AppError::NotFound(format!("can't get file name for {}", source_url)))?;

        let bytes = response.bytes().await?.to_vec();
        tracing::debug!("Downloaded {} ({} bytes)", file_name, bytes.len());

        Ok(DownloadedFile {
            source_url: source_url.to_string(),
            file_name,
            bytes,
        })
    }

    pub async fn upload_video(
        &self,
        file: &DownloadedFile,
        upload_name: &str,
    ) -> Result<MediaAsset, AppError> {
        let id = if self.config.dry_run {
            DRYRUN_VIDEO_ID.to_string()
        } else {
            let form = self.upload_form(file, upload_name, "video_file", "video_signature")?;
            let items: Vec<VideoUploadItem> = self
                .client
                .call_multipart(VIDEO_UPLOAD_PATH, form)
                .await?
                .into_data()
                .with_context(|| format!("video upload of {}", upload_name))?;
            items
                .into_iter()
                .next()
                .map(|item| item.video_id)
                .ok_or_else(|| AppError::Schema("video upload returned no video_id".to_string()))?
        };

        tracing::info!("✓ Uploaded video {} as {}", upload_name, id);
        Ok(MediaAsset {
            kind: MediaKind::Video,
            id,
            display_name: upload_name.to_string(),
            source_uri: file.source_url.clone(),
        })
    }

    pub async fn upload_image(
        &self,
        file: &DownloadedFile,
        upload_name: &str,
    ) -> Result<MediaAsset, AppError> {
        let id = if self.config.dry_run {
            DRYRUN_IMAGE_ID.to_string()
        } else {
            let form = self.upload_form(file, upload_name, "image_file", "image_signature")?;
            let data: ImageUploadData = self
                .client
                .call_multipart(IMAGE_UPLOAD_PATH, form)
                .await?
                .into_data()
                .with_context(|| format!("image upload of {}", upload_name))?;
            data.image_id
        };

        tracing::info!("✓ Uploaded image {} as {}", upload_name, id);
        Ok(MediaAsset {
            kind: MediaKind::Image,
            id,
            display_name: upload_name.to_string(),
            source_uri: file.source_url.clone(),
        })
    }

    fn upload_form(
        &self,
        file: &DownloadedFile,
        upload_name: &str,
        file_field: &'static str,
        signature_field: &'static str,
    ) -> Result<multipart::Form, AppError> {
        let part = multipart::Part::bytes(file.bytes.clone())
            .file_name(upload_name.to_string())
            .mime_str("application/octet-stream")?;

        Ok(multipart::Form::new()
            .text("advertiser_id", self.config.advertiser_id.clone())
            .text("file_name", upload_name.to_string())
            .part(file_field, part)
            .text(signature_field, md5_hex(&file.bytes)))
    }

    /// First suggested cover image for a freshly uploaded video.
    ///
    /// Waits the configured initial delay, then polls until suggestions
    /// appear or the poll timeout elapses. A non-zero platform code counts
    /// as not ready; the last one is returned on timeout.
    pub async fn suggest_cover(&self, video_id: &str) -> Result<String, AppError> {
        if self.config.dry_run {
            return Ok(DRYRUN_COVER_IMAGE_ID.to_string());
        }

        tracing::info!("Getting suggested cover image for video {}", video_id);
        tokio::time::sleep(self.config.cover_initial_delay).await;

        let payload = json!({
            "advertiser_id": self.config.advertiser_id,
            "video_id": video_id,
        });
        let deadline = Instant::now() + self.config.cover_poll_timeout;

        loop {
            let response = self
                .client
                .call(SUGGEST_COVER_PATH, Method::GET, &payload)
                .await?;

            let pending = match response.into_data::<PagedList<CoverSuggestion>>() {
                Ok(page) => match page.list.into_iter().next() {
                    Some(cover) => {
                        tracing::info!("Suggested cover: {}", cover.id);
                        return Ok(cover.id);
                    }
                    None => AppError::NotFound("No cover image suggestions returned".to_string()),
                },
                Err(err @ AppError::Api { .. }) => err,
                Err(err) => return Err(err),
            };

            if Instant::now() + self.config.cover_poll_interval > deadline {
                tracing::error!("❌ No cover image for video {}: {}", video_id, pending);
                return Err(pending);
            }
            tracing::debug!("Cover not ready for {} ({}); polling again", video_id, pending);
            tokio::time::sleep(self.config.cover_poll_interval).await;
        }
    }

    /// Library entry of an uploaded video.
    pub async fn video_info(&self, video_id: &str) -> Result<VideoInfo, AppError> {
        if self.config.dry_run {
            return Ok(VideoInfo {
                video_id: video_id.to_string(),
                file_name: Some(DRYRUN_FILENAME.to_string()),
                material_id: None,
            });
        }

        let payload = json!({
            "advertiser_id": self.config.advertiser_id,
            "video_ids": json!([video_id]).to_string(),
        });
        self.first_video(VIDEO_INFO_PATH, &payload)
            .await
            .with_context(|| format!("video info for {}", video_id))
    }

    /// Video behind a TikTok One material id.
    pub async fn tiktok_one_video_info(&self, material_id: &str) -> Result<VideoInfo, AppError> {
        if self.config.dry_run {
            return Ok(VideoInfo {
                video_id: DRYRUN_VIDEO_ID.to_string(),
                file_name: Some(DRYRUN_FILENAME.to_string()),
                material_id: Some(material_id.to_string()),
            });
        }

        let payload = json!({
            "advertiser_id": self.config.advertiser_id,
            "filtering": json!({ "material_ids": [material_id] }).to_string(),
            "page": 1,
            "page_size": 1,
        });
        self.first_video(VIDEO_SEARCH_PATH, &payload)
            .await
            .with_context(|| format!("TikTok One material {}", material_id))
    }

    async fn first_video(
        &self,
        path: &str,
        payload: &serde_json::Value,
    ) -> Result<VideoInfo, AppError> {
        let page: PagedList<VideoInfo> = self
            .client
            .call_checked(path, Method::GET, payload)
            .await?
            .into_data()?;

        page.list
            .into_iter()
            .next()
            .ok_or_else(|| AppError::NotFound("video".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drive_links_are_rewritten() {
        assert_eq!(
            direct_download_url("https://drive.google.com/file/d/1AbC-xyz/view?usp=sharing"),
            "https://drive.google.com/uc?export=download&id=1AbC-xyz"
        );
        assert_eq!(
            direct_download_url("https://cdn.example.com/a.mp4"),
            "https://cdn.example.com/a.mp4"
        );
    }

    #[test]
    fn test_filename_from_disposition() {
        assert_eq!(
            filename_from_disposition(r#"attachment; filename="General_Dating_v1.mp4""#).as_deref(),
            Some("General_Dating_v1.mp4")
        );
        assert_eq!(
            filename_from_disposition("attachment; filename=clip.mov; size=10").as_deref(),
            Some("clip.mov")
        );
        assert_eq!(
            filename_from_disposition("attachment; filename*=UTF-8''My%20Clip.mp4").as_deref(),
            Some("My Clip.mp4")
        );
        assert_eq!(filename_from_disposition("inline"), None);
    }

    #[test]
    fn test_filename_from_url() {
        assert_eq!(
            filename_from_url("https://cdn.example.com/media/Gaming_Anime%20Cut.mp4?sig=1").as_deref(),
            Some("Gaming_Anime Cut.mp4")
        );
        assert_eq!(filename_from_url("https://cdn.example.com/"), None);
        assert_eq!(filename_from_url("not a url"), None);
    }

    #[test]
    fn test_timestamped_file_name() {
        assert_eq!(
            timestamped_file_name("General_Dating_v1.mp4", 1700000000),
            "General_Dating_v1-API_Upload-1700000000.mp4"
        );
        assert_eq!(
            timestamped_file_name("no_extension", 5),
            "no_extension-API_Upload-5"
        );
        assert_eq!(file_stem("archive.tar.gz"), "archive.tar");
        assert_eq!(file_stem(".hidden"), ".hidden");
    }

    #[test]
    fn test_md5_signature_is_lowercase_hex() {
        assert_eq!(md5_hex(b""), "d41d8cd98f00b204e9800998ecf8427e");
    }

    #[tokio::test]
    async fn test_dry_run_uses_placeholder_ids() {
        let config = Config::dry_run("adv");
        let media = MediaService::new(TikTokClient::new(&config).unwrap(), &config).unwrap();

        let file = media.download("https://cdn.example.com/x.mp4").await.unwrap();
        assert_eq!(file.file_name, DRYRUN_FILENAME);

        let video = media.upload_video(&file, "x.mp4").await.unwrap();
        assert_eq!(video.id, DRYRUN_VIDEO_ID);
        assert_eq!(media.suggest_cover(&video.id).await.unwrap(), DRYRUN_COVER_IMAGE_ID);

        let image = media.upload_image(&file, "x.png").await.unwrap();
        assert_eq!(image.id, DRYRUN_IMAGE_ID);
        assert_eq!(image.kind, MediaKind::Image);
    }
}
