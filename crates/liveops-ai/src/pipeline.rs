use crate::fallback::FallbackInvoker;
use crate::prompt::build_prompt;
use crate::validator::validate_response;
use liveops_cache::{Fingerprint, SummaryCache};
use liveops_core::{
    Result, ReviewBatch, ReviewQuery, ReviewRecord, ReviewSource, SummaryResult,
};
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, instrument};

/// Cache-fronted review summarization: fingerprint, cache lookup, prompt,
/// model call with fallback, validation, cache store.
///
/// Safe to share behind an `Arc`. Concurrent requests for the same fingerprint
/// may both reach the model; the later store wins.
pub struct SummarizationPipeline {
    invoker: FallbackInvoker,
    cache: Arc<SummaryCache>,
}

impl SummarizationPipeline {
    pub fn new(invoker: FallbackInvoker, cache: Arc<SummaryCache>) -> Self {
        Self { invoker, cache }
    }

    pub fn cache(&self) -> &Arc<SummaryCache> {
        &self.cache
    }

    pub fn invoker(&self) -> &FallbackInvoker {
        &self.invoker
    }

    /// Summarize an ordered list of reviews. An empty list is an input error.
    pub async fn summarize(&self, records: Vec<ReviewRecord>) -> Result<SummaryResult> {
        let batch = ReviewBatch::new(records)?;
        self.summarize_batch(&batch).await
    }

    /// Summarize reviews supplied as raw JSON (array, or object with a
    /// `reviews`/`data`/`results`/`entries` array).
    pub async fn summarize_json(&self, value: Value) -> Result<SummaryResult> {
        let batch = ReviewBatch::from_json(value)?;
        self.summarize_batch(&batch).await
    }

    /// Fetch reviews from `source` and summarize them.
    pub async fn summarize_from_source(
        &self,
        source: &dyn ReviewSource,
        app_id: &str,
        query: &ReviewQuery,
    ) -> Result<SummaryResult> {
        let batch = source.fetch_reviews(app_id, query).await?;
        info!(app_id, reviews = batch.len(), sort = %query.sort, "Fetched reviews");
        self.summarize_batch(&batch).await
    }

    #[instrument(skip_all, fields(reviews = batch.len()))]
    pub async fn summarize_batch(&self, batch: &ReviewBatch) -> Result<SummaryResult> {
        let key = Fingerprint::from_batch(batch);
        let now = self.cache.now();

        if let Some(entry) = self.cache.get(&key) {
            if entry.is_fresh(now, self.cache.ttl()) {
                debug!(key = %key, age_secs = entry.age(now).as_secs(), "Summary cache hit");
                let mut result = entry.value;
                // Boundary-only keys can collide across batches of different size.
                result.total_analyzed = batch.len();
                return Ok(result);
            }
            debug!(key = %key, "Summary cache entry expired");
        } else {
            debug!(key = %key, "Summary cache miss");
        }

        let prompt = build_prompt(batch);
        let start = Instant::now();
        let invocation = self.invoker.invoke(&prompt).await?;
        let result = validate_response(&invocation.response.content, batch.len());

        info!(
            model = %invocation.response.model,
            used_fallback = invocation.used_fallback,
            problems = result.problems.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Summarized reviews"
        );

        self.cache.put(key, result.clone(), now);
        Ok(result)
    }
}

impl std::fmt::Debug for SummarizationPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SummarizationPipeline")
            .field("primary_model", &self.invoker.primary_model())
            .field("fallback_model", &self.invoker.fallback_model())
            .field("cache", &self.cache)
            .finish()
    }
}
