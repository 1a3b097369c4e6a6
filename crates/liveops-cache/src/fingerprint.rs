use base64::{engine::general_purpose, Engine as _};
use liveops_core::{ReviewBatch, ReviewRecord};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Reviews taken from each end of a batch.
const BOUNDARY_REVIEWS: usize = 5;
const ENCODED_LEN: usize = 64;
const KEY_PREFIX: &str = "sum:";

/// Cache key for a review batch.
///
/// Derived only from the first and last five review texts, so two batches that
/// share those boundaries but differ in the middle map to the same key. The
/// encoding is cut to 64 characters, which covers only the first 48 bytes of
/// the joined texts: once the head texts reach that length, the tail no longer
/// contributes at all. This is a lookup key, not a content hash.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn from_batch(batch: &ReviewBatch) -> Self {
        let source = format!(
            "{}::{}",
            join_texts(batch.head(BOUNDARY_REVIEWS)),
            join_texts(batch.tail(BOUNDARY_REVIEWS))
        );
        let mut encoded = general_purpose::STANDARD.encode(source.as_bytes());
        encoded.truncate(ENCODED_LEN);
        Self(format!("{KEY_PREFIX}{encoded}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn join_texts(records: &[ReviewRecord]) -> String {
    records
        .iter()
        .map(ReviewRecord::key_text)
        .collect::<Vec<_>>()
        .join("|")
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
