use liveops_core::{ReviewBatch, ReviewRecord};

/// Most reviews rendered into a single prompt.
pub const SAMPLE_LIMIT: usize = 400;

const SAMPLE_SEPARATOR: &str = "\n\n";

const INSTRUCTIONS: &str = "\
ROLE: You are a senior LiveOps strategist for mobile F2P games. \
STRICT SCOPE: Consider ONLY LiveOps levers: events (cadence/design/variety), \
offers/pricing/discounts, bundles, time-limited shops, A/B tests and experiments, \
login streaks, rewards/loot fairness, currencies and sinks, progression/XP pacing, \
difficulty spikes tied to monetization, engagement loops (dailies, weeklies, missions), \
returner flows, pass/battle pass tuning, server stability of live features, \
live updates cadence/communication. \
DO NOT include crashes, bugs, camera, hardware, or non-LiveOps tech issues.

TASK: From the reviews, extract LiveOps problems. If a review is non-LiveOps, ignore it.

OUTPUT JSON ONLY (no prose): {
  \"problems\": [ { \"title\": string, \"description\": string, \"severity\": 1|2|3|4|5 } ],
  \"summaryLine\": string,
  \"totalAnalyzed\": number
}

RULES:
- Map sentiment and frequency to severity (5 = pervasive/harmful to retention/revenue).
- Titles <= 6 words; descriptions <= 220 chars.
- summaryLine: ONE sentence summarizing the LiveOps migraine themes.
- totalAnalyzed = count of reviews received.

REVIEWS:
";

/// First [`SAMPLE_LIMIT`] reviews rendered to plain text, blank-line separated.
pub fn render_sample(batch: &ReviewBatch) -> String {
    batch
        .head(SAMPLE_LIMIT)
        .iter()
        .map(ReviewRecord::render)
        .collect::<Vec<_>>()
        .join(SAMPLE_SEPARATOR)
}

/// Full instruction prompt for a batch. Deterministic for a given batch.
pub fn build_prompt(batch: &ReviewBatch) -> String {
    let sample = render_sample(batch);
    let mut prompt = String::with_capacity(INSTRUCTIONS.len() + sample.len());
    prompt.push_str(INSTRUCTIONS);
    prompt.push_str(&sample);
    prompt
}
