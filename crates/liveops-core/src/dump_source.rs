use crate::{
    AppMetadata, LiveOpsError, Result, ReviewBatch, ReviewQuery, ReviewRecord, ReviewSort,
    ReviewSource,
};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::cmp::Ordering;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Review source backed by a JSON dump exported from the store scraper.
///
/// Accepted layouts:
/// - `{ "appId": "...", "app": { "title": ... }, "reviews": [ ... ] }`
/// - a bare array of reviews (no app metadata available)
pub struct DumpReviewSource {
    path: PathBuf,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum DumpFile {
    Bare(Vec<Value>),
    Wrapped(ReviewDump),
}

#[derive(Debug, Default, Deserialize)]
struct ReviewDump {
    #[serde(default, rename = "appId")]
    app_id: Option<String>,
    #[serde(default)]
    app: Option<AppMetadata>,
    #[serde(default)]
    reviews: Vec<Value>,
}

impl DumpReviewSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self, app_id: &str) -> Result<ReviewDump> {
        let raw = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| fetch_error(&self.path, e))?;
        let dump = match serde_json::from_str::<DumpFile>(&raw).map_err(|e| fetch_error(&self.path, e))? {
            DumpFile::Bare(reviews) => ReviewDump {
                reviews,
                ..Default::default()
            },
            DumpFile::Wrapped(dump) => dump,
        };

        // An empty identifier accepts whatever app the dump was taken from.
        if let Some(dumped) = dump.app_id.as_deref() {
            if !app_id.is_empty() && dumped != app_id {
                return Err(LiveOpsError::SourceFetch(format!(
                    "{} holds reviews for {}, not {}",
                    self.path.display(),
                    dumped,
                    app_id
                )));
            }
        }

        debug!(
            path = %self.path.display(),
            reviews = dump.reviews.len(),
            "Loaded review dump"
        );
        Ok(dump)
    }
}

fn fetch_error(path: &Path, err: impl std::fmt::Display) -> LiveOpsError {
    LiveOpsError::SourceFetch(format!("{}: {}", path.display(), err))
}

/// Newest first; undated reviews keep their relative order after dated ones.
fn newest_first(a: &ReviewRecord, b: &ReviewRecord) -> Ordering {
    match (a.date(), b.date()) {
        (Some(x), Some(y)) => y.cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

#[async_trait]
impl ReviewSource for DumpReviewSource {
    async fn fetch_reviews(&self, app_id: &str, query: &ReviewQuery) -> Result<ReviewBatch> {
        let dump = self.load(app_id).await?;
        let mut records: Vec<ReviewRecord> = dump.reviews.into_iter().map(ReviewRecord::new).collect();

        if query.sort == ReviewSort::Newest {
            records.sort_by(newest_first);
        }
        records.truncate(query.max);

        ReviewBatch::new(records)
    }

    async fn fetch_app(&self, app_id: &str) -> Result<AppMetadata> {
        self.load(app_id).await?.app.ok_or_else(|| {
            LiveOpsError::SourceFetch(format!("{}: no app metadata in dump", self.path.display()))
        })
    }
}
