use crate::{AppMetadata, Result, ReviewBatch};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Upper bound on reviews fetched for a single summarization request.
pub const MAX_REVIEWS_PER_REQUEST: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewSort {
    #[default]
    Newest,
    MostRelevant,
}

impl FromStr for ReviewSort {
    type Err = std::convert::Infallible;

    /// Unknown values fall back to `Newest`.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_lowercase().as_str() {
            "most_relevant" => ReviewSort::MostRelevant,
            _ => ReviewSort::Newest,
        })
    }
}

impl fmt::Display for ReviewSort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReviewSort::Newest => write!(f, "newest"),
            ReviewSort::MostRelevant => write!(f, "most_relevant"),
        }
    }
}

/// Pagination and ordering for a review fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewQuery {
    pub max: usize,
    pub sort: ReviewSort,
}

impl ReviewQuery {
    /// `max` is capped at [`MAX_REVIEWS_PER_REQUEST`].
    pub fn new(max: usize, sort: ReviewSort) -> Self {
        Self {
            max: max.min(MAX_REVIEWS_PER_REQUEST),
            sort,
        }
    }
}

impl Default for ReviewQuery {
    fn default() -> Self {
        Self::new(MAX_REVIEWS_PER_REQUEST, ReviewSort::Newest)
    }
}

/// Supplier of store reviews and listing metadata for an app identifier.
///
/// Failures are reported as [`crate::LiveOpsError::SourceFetch`] carrying the
/// collaborator's own message.
#[async_trait]
pub trait ReviewSource: Send + Sync {
    async fn fetch_reviews(&self, app_id: &str, query: &ReviewQuery) -> Result<ReviewBatch>;

    async fn fetch_app(&self, app_id: &str) -> Result<AppMetadata>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_caps_max() {
        assert_eq!(ReviewQuery::new(500, ReviewSort::Newest).max, 100);
        assert_eq!(ReviewQuery::new(20, ReviewSort::Newest).max, 20);
    }

    #[test]
    fn sort_parsing_defaults_to_newest() {
        assert_eq!("most_relevant".parse::<ReviewSort>().unwrap(), ReviewSort::MostRelevant);
        assert_eq!("rating".parse::<ReviewSort>().unwrap(), ReviewSort::Newest);
        assert_eq!(ReviewSort::MostRelevant.to_string(), "most_relevant");
    }
}
