use crate::{LiveOpsError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Keys under which exported review dumps carry their review array.
const BATCH_KEYS: [&str; 4] = ["reviews", "data", "results", "entries"];

/// A single store review as delivered by the review source.
///
/// The record is kept opaque: only the free-text fields are interpreted, everything
/// else (rating, date, reply text, ...) is carried through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReviewRecord(Value);

impl ReviewRecord {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    /// Record with only a `text` field.
    pub fn from_text(text: impl Into<String>) -> Self {
        let text: String = text.into();
        Self(serde_json::json!({ "text": text }))
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    fn non_empty_field(&self, key: &str) -> Option<&str> {
        self.0
            .get(key)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }

    pub fn text(&self) -> Option<&str> {
        self.non_empty_field("text")
    }

    pub fn comment(&self) -> Option<&str> {
        self.non_empty_field("comment")
    }

    /// Star rating, read from `rating` or the scraper's `score`.
    pub fn rating(&self) -> Option<f64> {
        self.0
            .get("rating")
            .or_else(|| self.0.get("score"))
            .and_then(Value::as_f64)
    }

    pub fn date(&self) -> Option<DateTime<Utc>> {
        let raw = self.0.get("date")?.as_str()?;
        DateTime::parse_from_rfc3339(raw)
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
    }

    /// Text used when keying a batch: `text`, then `comment`, else empty.
    pub fn key_text(&self) -> &str {
        if let Some(s) = self.0.as_str() {
            return s;
        }
        self.text().or_else(|| self.comment()).unwrap_or_default()
    }

    /// Plain-string rendering for prompt samples: `comment`, then `text`, else compact JSON.
    pub fn render(&self) -> String {
        if let Some(s) = self.0.as_str() {
            return s.to_string();
        }
        match self.comment().or_else(|| self.text()) {
            Some(s) => s.to_string(),
            None => self.0.to_string(),
        }
    }
}

impl From<Value> for ReviewRecord {
    fn from(value: Value) -> Self {
        Self::new(value)
    }
}

/// Ordered, non-empty sequence of reviews submitted in one request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ReviewBatch(Vec<ReviewRecord>);

impl ReviewBatch {
    pub fn new(records: Vec<ReviewRecord>) -> Result<Self> {
        if records.is_empty() {
            return Err(LiveOpsError::Input("No reviews provided".to_string()));
        }
        Ok(Self(records))
    }

    /// Accepts a bare array, or an object carrying the array under
    /// `reviews`, `data`, `results` or `entries`. Anything else is an empty batch.
    pub fn from_json(value: Value) -> Result<Self> {
        let records = match value {
            Value::Array(items) => items,
            Value::Object(mut map) => BATCH_KEYS
                .iter()
                .find_map(|key| match map.remove(*key) {
                    Some(Value::Array(items)) => Some(items),
                    _ => None,
                })
                .unwrap_or_default(),
            _ => Vec::new(),
        };
        Self::new(records.into_iter().map(ReviewRecord::new).collect())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn records(&self) -> &[ReviewRecord] {
        &self.0
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ReviewRecord> {
        self.0.iter()
    }

    /// Up to `n` records from the front.
    pub fn head(&self, n: usize) -> &[ReviewRecord] {
        &self.0[..n.min(self.0.len())]
    }

    /// Up to `n` records from the back.
    pub fn tail(&self, n: usize) -> &[ReviewRecord] {
        &self.0[self.0.len().saturating_sub(n)..]
    }

    pub fn into_records(self) -> Vec<ReviewRecord> {
        self.0
    }
}

impl<'a> IntoIterator for &'a ReviewBatch {
    type Item = &'a ReviewRecord;
    type IntoIter = std::slice::Iter<'a, ReviewRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// One LiveOps pain point extracted from reviews.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Problem {
    pub title: String,
    pub description: String,
    /// 1..=5, 5 = most harmful to retention/revenue
    pub severity: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryResult {
    pub problems: Vec<Problem>,
    pub summary_line: String,
    /// Always the number of reviews submitted, never the model's own count.
    pub total_analyzed: usize,
}

/// Store listing metadata for an app.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppMetadata {
    pub title: String,
    #[serde(default, alias = "description")]
    pub summary: Option<String>,
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub installs: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub developer: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn render_prefers_comment_over_text() {
        let record = ReviewRecord::new(json!({"text": "t", "comment": "c"}));
        assert_eq!(record.render(), "c");
        assert_eq!(record.key_text(), "t");
    }

    #[test]
    fn render_falls_back_to_json_for_textless_records() {
        let record = ReviewRecord::new(json!({"rating": 2}));
        assert_eq!(record.render(), r#"{"rating":2}"#);
        assert_eq!(record.key_text(), "");
    }

    #[test]
    fn empty_text_fields_are_skipped() {
        let record = ReviewRecord::new(json!({"text": "", "comment": "only comment"}));
        assert_eq!(record.render(), "only comment");
        assert_eq!(record.key_text(), "only comment");
    }

    #[test]
    fn bare_strings_are_their_own_text() {
        let record = ReviewRecord::new(json!("events are too short"));
        assert_eq!(record.render(), "events are too short");
        assert_eq!(record.key_text(), "events are too short");
    }

    #[test]
    fn rating_reads_scraper_score() {
        let record = ReviewRecord::new(json!({"text": "x", "score": 4}));
        assert_eq!(record.rating(), Some(4.0));
    }

    #[test]
    fn empty_batch_is_rejected() {
        let err = ReviewBatch::new(Vec::new()).unwrap_err();
        assert!(matches!(err, LiveOpsError::Input(_)));
    }

    #[test]
    fn batch_from_json_accepts_wrapped_arrays() {
        let batch = ReviewBatch::from_json(json!({"data": [{"text": "a"}, {"text": "b"}]})).unwrap();
        assert_eq!(batch.len(), 2);

        let batch = ReviewBatch::from_json(json!(["a", "b", "c"])).unwrap();
        assert_eq!(batch.len(), 3);
    }

    #[test]
    fn batch_from_json_rejects_non_arrays() {
        assert!(ReviewBatch::from_json(json!({"reviews": "nope"})).is_err());
        assert!(ReviewBatch::from_json(json!(42)).is_err());
    }

    #[test]
    fn head_and_tail_clamp_to_length() {
        let batch = ReviewBatch::new(vec![
            ReviewRecord::from_text("1"),
            ReviewRecord::from_text("2"),
            ReviewRecord::from_text("3"),
        ])
        .unwrap();
        assert_eq!(batch.head(5).len(), 3);
        assert_eq!(batch.tail(2)[0].key_text(), "2");
    }

    #[test]
    fn summary_result_uses_camel_case() {
        let result = SummaryResult {
            problems: vec![],
            summary_line: "s".into(),
            total_analyzed: 3,
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["summaryLine"], "s");
        assert_eq!(json["totalAnalyzed"], 3);
    }

    #[test]
    fn app_metadata_accepts_description_alias() {
        let meta: AppMetadata =
            serde_json::from_value(json!({"title": "Game", "description": "Fun"})).unwrap();
        assert_eq!(meta.summary.as_deref(), Some("Fun"));
        assert!(meta.icon.is_none());
    }
}
