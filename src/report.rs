//! Per-run processing reports.
//!
//! Every terminal outcome is appended as one row and flushed immediately so
//! a crashed run still leaves a usable report behind.

use chrono::{Local, SecondsFormat, Utc};
use std::fs::{self, File};
use std::path::{Path, PathBuf};

use crate::errors::{AppError, ResultExt};
use crate::models::SubmissionResult;

pub const RESULT_COLUMNS: [&str; 9] = [
    "File Processed",
    "Create Ad Status",
    "Creative Mode",
    "Ad Group Name",
    "Ad Group ID",
    "Ad ID",
    "Media ID",
    "Error",
    "Timestamp",
];

/// Destination for result records.
pub trait ReportSink {
    /// Append one record. `sources` are the input values the record belongs
    /// to, in the mode's column order.
    fn record(&mut self, sources: &[&str], result: &SubmissionResult) -> Result<(), AppError>;
}

fn result_fields(result: &SubmissionResult, timestamp: String) -> [String; 9] {
    [
        if result.processed_ok { "SUCCESS" } else { "FAILED" }.to_string(),
        result
            .ad_create_status
            .map(|s| s.as_str().to_string())
            .unwrap_or_default(),
        result
            .creative_mode
            .map(|m| m.as_platform_str().to_string())
            .unwrap_or_default(),
        result.ad_group_name.clone().unwrap_or_default(),
        result.ad_group_id.clone().unwrap_or_default(),
        result.ad_id.clone().unwrap_or_default(),
        result.media_id.clone().unwrap_or_default(),
        result.error.clone().unwrap_or_default(),
        timestamp,
    ]
}

/// CSV report at `<dir>/<subdir>/<prefix>_<YYYY-MM-DD>_<HH-MM-SS>.csv`.
pub struct CsvReport {
    writer: csv::Writer<File>,
    path: PathBuf,
    source_columns: usize,
}

impl CsvReport {
    pub fn create(
        report_dir: impl AsRef<Path>,
        subdir: &str,
        prefix: &str,
        source_columns: &[&str],
    ) -> Result<Self, AppError> {
        let dir = report_dir.as_ref().join(subdir);
        fs::create_dir_all(&dir)
            .map_err(AppError::from)
            .with_context(|| format!("creating report directory {}", dir.display()))?;

        let file_name = format!("{}_{}.csv", prefix, Local::now().format("%Y-%m-%d_%H-%M-%S"));
        let path = dir.join(file_name);

        let mut writer = csv::WriterBuilder::new()
            .quote_style(csv::QuoteStyle::Always)
            .from_path(&path)?;
        writer.write_record(source_columns.iter().chain(RESULT_COLUMNS.iter()))?;
        writer.flush()?;

        tracing::info!("Logging to: {}", path.display());
        Ok(Self {
            writer,
            path,
            source_columns: source_columns.len(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ReportSink for CsvReport {
    fn record(&mut self, sources: &[&str], result: &SubmissionResult) -> Result<(), AppError> {
        let sources = (0..self.source_columns).map(|i| sources.get(i).copied().unwrap_or(""));
        let timestamp = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
        let fields = result_fields(result, timestamp);

        self.writer
            .write_record(sources.chain(fields.iter().map(String::as_str)))?;
        self.writer.flush()?;
        Ok(())
    }
}

/// Keeps records in memory.
#[derive(Debug, Default)]
pub struct MemoryReport {
    pub records: Vec<(Vec<String>, SubmissionResult)>,
}

impl MemoryReport {
    pub fn results(&self) -> impl Iterator<Item = &SubmissionResult> {
        self.records.iter().map(|(_, r)| r)
    }
}

impl ReportSink for MemoryReport {
    fn record(&mut self, sources: &[&str], result: &SubmissionResult) -> Result<(), AppError> {
        self.records.push((
            sources.iter().map(|s| s.to_string()).collect(),
            result.clone(),
        ));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AdGroup, CreativeMode};

    #[test]
    fn test_csv_report_writes_quoted_rows() {
        let dir = tempfile::tempdir().unwrap();
        let mut report =
            CsvReport::create(dir.path(), "video", "ad_processing_report", &["video_url"]).unwrap();

        let group = AdGroup::new("18300", "PH || \"Android\"", CreativeMode::Standard);
        report
            .record(&["https://a/x.mp4"], &SubmissionResult::created(&group, "777"))
            .unwrap();

        let path = report.path().to_path_buf();
        assert!(path.starts_with(dir.path().join("video")));
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("ad_processing_report_"));
        assert!(name.ends_with(".csv"));

        let contents = std::fs::read_to_string(&path).unwrap();
        let mut lines = contents.lines();
        assert_eq!(
            lines.next().unwrap(),
            "\"video_url\",\"File Processed\",\"Create Ad Status\",\"Creative Mode\",\"Ad Group Name\",\"Ad Group ID\",\"Ad ID\",\"Media ID\",\"Error\",\"Timestamp\""
        );
        let row = lines.next().unwrap();
        assert!(row.starts_with(
            "\"https://a/x.mp4\",\"SUCCESS\",\"SUCCESS\",\"CUSTOM\",\"PH || \"\"Android\"\"\",\"18300\",\"777\",\"\",\"\","
        ));
    }

    #[test]
    fn test_csv_report_pads_missing_sources() {
        let dir = tempfile::tempdir().unwrap();
        let mut report = CsvReport::create(
            dir.path(),
            "tiktok-one",
            "tiktok_one_video_ad_processing_report",
            &["category", "language", "material_id"],
        )
        .unwrap();

        let failure = SubmissionResult::asset_failed(false, &AppError::NotFound("video".into()));
        report.record(&["Gaming"], &failure).unwrap();

        let mut reader = csv::Reader::from_path(report.path()).unwrap();
        let record = reader.records().next().unwrap().unwrap();
        assert_eq!(record.len(), 12);
        assert_eq!(&record[0], "Gaming");
        assert_eq!(&record[1], "");
        assert_eq!(&record[3], "FAILED");
        assert_eq!(&record[10], "Not found: video");
    }
}
