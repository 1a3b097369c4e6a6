//! Turns raw model output into a [`SummaryResult`] that always satisfies the
//! result invariants, whatever the model actually returned.

use liveops_core::{Problem, SummaryResult};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};
use tracing::warn;

pub const DEFAULT_SUMMARY_LINE: &str = "LiveOps issues detected based on user feedback.";

/// Severity used when the model gives none or an unreadable one.
const DEFAULT_SEVERITY: u8 = 3;
const MIN_SEVERITY: i64 = 1;
const MAX_SEVERITY: i64 = 5;

/// Titles used to synthesize a missing summary line.
const SUMMARY_TITLE_COUNT: usize = 3;

/// Plain substring match, so "ui" also hits "build" or "guild".
static NON_LIVEOPS_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)(crash|bug|camera|device|hardware|ui|interface|performance|white screen|recognize|sensor|bluetooth)",
    )
    .expect("non-LiveOps pattern is valid")
});

/// First `{` through last `}`.
static OBJECT_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)\{.*\}").expect("object pattern is valid"));

/// Result of reading the model's text as a JSON object.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedResponse {
    Structured(Map<String, Value>),
    Unparseable,
}

impl ParsedResponse {
    pub fn parse(content: &str) -> Self {
        if let Some(object) = parse_object(content) {
            return ParsedResponse::Structured(object);
        }

        OBJECT_PATTERN
            .find(content)
            .and_then(|m| parse_object(m.as_str()))
            .map(ParsedResponse::Structured)
            .unwrap_or(ParsedResponse::Unparseable)
    }
}

fn parse_object(text: &str) -> Option<Map<String, Value>> {
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(map)) => Some(map),
        _ => None,
    }
}

/// True if the problem text mentions technical (non-LiveOps) issues.
pub fn is_out_of_domain(title: &str, description: &str) -> bool {
    NON_LIVEOPS_PATTERN.is_match(&format!("{} {}", title, description))
}

/// Validate and sanitize model output for a batch of `batch_len` reviews.
pub fn validate_response(content: &str, batch_len: usize) -> SummaryResult {
    let object = match ParsedResponse::parse(content) {
        ParsedResponse::Structured(object) => object,
        ParsedResponse::Unparseable => {
            warn!(
                content_len = content.len(),
                "Model output is not a JSON object; using empty summary"
            );
            Map::new()
        }
    };

    let problems: Vec<Problem> = match object.get("problems") {
        Some(Value::Array(items)) => items.iter().filter_map(problem_from_value).collect(),
        _ => Vec::new(),
    };

    let summary_line = match object.get("summaryLine").and_then(Value::as_str) {
        Some(line) if !line.trim().is_empty() => line.to_string(),
        _ => synthesize_summary_line(&problems),
    };

    SummaryResult {
        problems,
        summary_line,
        total_analyzed: batch_len,
    }
}

fn problem_from_value(value: &Value) -> Option<Problem> {
    let title = non_empty_str(value.get("title"))?;
    let description = non_empty_str(value.get("description"))?;
    if is_out_of_domain(title, description) {
        return None;
    }

    Some(Problem {
        title: title.to_string(),
        description: description.to_string(),
        severity: normalize_severity(value.get("severity")),
    })
}

fn non_empty_str(value: Option<&Value>) -> Option<&str> {
    value.and_then(Value::as_str).filter(|s| !s.is_empty())
}

fn normalize_severity(value: Option<&Value>) -> u8 {
    let raw = match value {
        Some(Value::Number(n)) => n.as_i64().or_else(|| n.as_f64().map(|f| f.round() as i64)),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok().map(|f| f.round() as i64),
        _ => None,
    };

    raw.map(|s| s.clamp(MIN_SEVERITY, MAX_SEVERITY) as u8)
        .unwrap_or(DEFAULT_SEVERITY)
}

fn synthesize_summary_line(problems: &[Problem]) -> String {
    let top = problems
        .iter()
        .take(SUMMARY_TITLE_COUNT)
        .map(|p| p.title.as_str())
        .collect::<Vec<_>>()
        .join(", ");

    if top.is_empty() {
        DEFAULT_SUMMARY_LINE.to_string()
    } else {
        top
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_clean_json() {
        let content = json!({
            "problems": [{"title": "Event fatigue", "description": "Events overlap with no rest.", "severity": 4}],
            "summaryLine": "Players are tired of back-to-back events.",
            "totalAnalyzed": 999
        })
        .to_string();

        let result = validate_response(&content, 12);
        assert_eq!(result.problems.len(), 1);
        assert_eq!(result.problems[0].severity, 4);
        assert_eq!(result.summary_line, "Players are tired of back-to-back events.");
        assert_eq!(result.total_analyzed, 12);
    }

    #[test]
    fn rescues_object_wrapped_in_prose() {
        let content = "Sure! Here you go:\n```json\n{\"problems\": [], \"summaryLine\": \"Offers feel unfair.\"}\n```";
        assert!(matches!(ParsedResponse::parse(content), ParsedResponse::Structured(_)));
        let result = validate_response(content, 2);
        assert_eq!(result.summary_line, "Offers feel unfair.");
    }

    #[test]
    fn garbage_resolves_to_default_result() {
        for content in ["not json at all", "{ broken", "[1, 2, 3]", "42", "{\"a\": } trailing }"] {
            assert_eq!(ParsedResponse::parse(content), ParsedResponse::Unparseable, "{content}");
            let result = validate_response(content, 7);
            assert!(result.problems.is_empty());
            assert_eq!(result.summary_line, DEFAULT_SUMMARY_LINE);
            assert_eq!(result.total_analyzed, 7);
        }
    }

    #[test]
    fn non_array_problems_become_empty() {
        let result = validate_response(r#"{"problems": "none", "summaryLine": "ok"}"#, 1);
        assert!(result.problems.is_empty());
        assert_eq!(result.summary_line, "ok");
    }

    #[test]
    fn drops_incomplete_problems() {
        let content = json!({"problems": [
            {"title": "Pricing", "severity": 3},
            {"description": "No title here"},
            {"title": "", "description": "Empty title"},
            {"title": 7, "description": "Numeric title"},
            "just a string",
            {"title": "Shop rotation", "description": "Same items every week."}
        ]})
        .to_string();

        let result = validate_response(&content, 3);
        assert_eq!(result.problems.len(), 1);
        assert_eq!(result.problems[0].title, "Shop rotation");
    }

    #[test]
    fn filters_every_out_of_domain_term_case_insensitively() {
        let terms = [
            "crash", "bug", "camera", "device", "hardware", "ui", "interface", "performance",
            "white screen", "recognize", "sensor", "bluetooth",
        ];
        for term in terms {
            assert!(is_out_of_domain(&term.to_uppercase(), "x"), "{term}");
            assert!(is_out_of_domain("x", &format!("mentions {term} here")), "{term}");
        }
        assert!(!is_out_of_domain("Offer pricing", "Starter pack is too expensive."));
    }

    #[test]
    fn substring_matches_are_preserved() {
        // "guild" contains "ui"
        assert!(is_out_of_domain("Guild wars rewards", "Top guilds take everything."));
    }

    #[test]
    fn crash_and_bug_problems_are_all_filtered() {
        let content = json!({
            "problems": [
                {"title": "Event crash", "description": "Game crashes during events.", "severity": 5},
                {"title": "Reward bug", "description": "Daily rewards bugged.", "severity": 4}
            ],
            "totalAnalyzed": 1
        })
        .to_string();

        let result = validate_response(&content, 3);
        assert!(result.problems.is_empty());
        assert_eq!(result.summary_line, DEFAULT_SUMMARY_LINE);
        assert_eq!(result.total_analyzed, 3);
    }

    #[test]
    fn blank_summary_line_is_synthesized_from_top_titles() {
        let content = json!({
            "problems": [
                {"title": "A", "description": "a"},
                {"title": "B", "description": "b"},
                {"title": "C", "description": "c"},
                {"title": "D", "description": "d"}
            ],
            "summaryLine": "   "
        })
        .to_string();

        assert_eq!(validate_response(&content, 4).summary_line, "A, B, C");

        let content = json!({"problems": [{"title": "A", "description": "a"}], "summaryLine": 5}).to_string();
        assert_eq!(validate_response(&content, 1).summary_line, "A");
    }

    #[test]
    fn severity_is_normalized() {
        assert_eq!(normalize_severity(Some(&json!(4))), 4);
        assert_eq!(normalize_severity(Some(&json!(9))), 5);
        assert_eq!(normalize_severity(Some(&json!(0))), 1);
        assert_eq!(normalize_severity(Some(&json!(2.6))), 3);
        assert_eq!(normalize_severity(Some(&json!("5"))), 5);
        assert_eq!(normalize_severity(Some(&json!("high"))), DEFAULT_SEVERITY);
        assert_eq!(normalize_severity(None), DEFAULT_SEVERITY);
    }

    #[test]
    fn empty_object_content_gets_default_summary() {
        let result = validate_response("{}", 5);
        assert!(result.problems.is_empty());
        assert_eq!(result.summary_line, DEFAULT_SUMMARY_LINE);
    }
}
