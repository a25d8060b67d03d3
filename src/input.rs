use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use crate::errors::{AppError, ResultExt};

/// One CSV row keyed by header name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputRow {
    values: HashMap<String, String>,
}

impl InputRow {
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            values: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Trimmed value of `column`; `None` when missing or blank.
    pub fn field(&self, column: &str) -> Option<&str> {
        self.values
            .get(column)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    /// Value of `column` for the report, empty when missing.
    pub fn raw(&self, column: &str) -> &str {
        self.values.get(column).map(String::as_str).unwrap_or("")
    }
}

pub fn read_rows_from<R: Read>(reader: R) -> Result<Vec<InputRow>, AppError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::Headers)
        .flexible(true)
        .from_reader(reader);

    let headers = reader.headers()?.clone();
    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(InputRow::from_pairs(
            headers.iter().zip(record.iter()),
        ));
    }
    Ok(rows)
}

pub fn read_rows(path: impl AsRef<Path>) -> Result<Vec<InputRow>, AppError> {
    let path = path.as_ref();
    let file = std::fs::File::open(path)
        .map_err(AppError::from)
        .with_context(|| format!("opening {}", path.display()))?;
    let rows = read_rows_from(file)?;
    tracing::info!("📋 Loaded {} rows from {}", rows.len(), path.display());
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rows_keyed_by_header() {
        let data = "video_url, note\nhttps://a/x.mp4,first\n  ,blank\n";
        let rows = read_rows_from(data.as_bytes()).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].field("video_url"), Some("https://a/x.mp4"));
        assert_eq!(rows[0].field("note"), Some("first"));
        assert_eq!(rows[1].field("video_url"), None);
        assert_eq!(rows[1].raw("video_url"), "  ");
        assert_eq!(rows[1].field("missing"), None);
    }

    #[test]
    fn test_short_rows_are_accepted() {
        let rows = read_rows_from("material_id,category,language\n123,Gaming\n".as_bytes()).unwrap();
        assert_eq!(rows[0].field("category"), Some("Gaming"));
        assert_eq!(rows[0].field("language"), None);
    }

    #[test]
    fn test_missing_file_is_io_error_with_context() {
        let err = read_rows("/nonexistent/input.csv").unwrap_err();
        assert!(matches!(err.root(), AppError::Io(_)));
        assert!(err.to_string().starts_with("opening /nonexistent/input.csv"));
    }
}
