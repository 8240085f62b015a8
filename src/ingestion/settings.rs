//! Serializable parse configuration.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::SheetResult;

use super::source::GridSource;
use super::unified::{ParseOptions, DEFAULT_TAG};

/// The part of [`ParseOptions`] that can live in a config file.
///
/// ```rust
/// use sheetbind::ingestion::ParseSettings;
///
/// let settings = ParseSettings::from_json_str(
///     r#"{ "source_id": "book-1", "datetime_formats": ["%d.%m.%Y"], "allow_skip_columns": true }"#,
/// )
/// .unwrap();
/// assert_eq!(settings.source_id, "book-1");
/// assert!(settings.allow_skip_columns);
/// assert!(!settings.allow_skip_fields);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ParseSettings {
    pub source_id: String,
    pub sheet_name: Option<String>,
    pub tag_name: String,
    pub datetime_formats: Vec<String>,
    pub extra_datetime_formats: Vec<String>,
    pub allow_skip_fields: bool,
    pub allow_skip_columns: bool,
    pub timeout_ms: Option<u64>,
}

impl Default for ParseSettings {
    fn default() -> Self {
        Self {
            source_id: String::new(),
            sheet_name: None,
            tag_name: DEFAULT_TAG.to_string(),
            datetime_formats: Vec::new(),
            extra_datetime_formats: Vec::new(),
            allow_skip_fields: false,
            allow_skip_columns: false,
            timeout_ms: None,
        }
    }
}

impl ParseSettings {
    pub fn from_json_str(json: &str) -> SheetResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_path(path: impl AsRef<Path>) -> SheetResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn to_json_string(&self) -> SheetResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Full options reading from `source`, with no observer and a fresh cancel token.
    pub fn into_options(self, source: Arc<dyn GridSource>) -> ParseOptions {
        ParseOptions {
            source: Some(source),
            source_id: self.source_id,
            sheet_name: self.sheet_name,
            tag_name: self.tag_name,
            datetime_formats: self.datetime_formats,
            extra_datetime_formats: self.extra_datetime_formats,
            allow_skip_fields: self.allow_skip_fields,
            allow_skip_columns: self.allow_skip_columns,
            timeout: self.timeout_ms.map(Duration::from_millis),
            ..ParseOptions::default()
        }
    }
}

impl From<&ParseOptions> for ParseSettings {
    fn from(options: &ParseOptions) -> Self {
        Self {
            source_id: options.source_id.clone(),
            sheet_name: options.sheet_name.clone(),
            tag_name: options.tag_name.clone(),
            datetime_formats: options.datetime_formats.clone(),
            extra_datetime_formats: options.extra_datetime_formats.clone(),
            allow_skip_fields: options.allow_skip_fields,
            allow_skip_columns: options.allow_skip_columns,
            timeout_ms: options.timeout.map(|t| u64::try_from(t.as_millis()).unwrap_or(u64::MAX)),
        }
    }
}
