//! Model response validation and the heuristic fallback.

use serde_json::Value as JsonValue;

use talenta_core::{defaults, CreateEvaluationRequest};

/// A validated evaluation record, either model-derived or produced by the
/// heuristic fallback.
#[derive(Debug, Clone, PartialEq)]
pub struct Verdict {
    pub cv_match_rate: f64,
    pub cv_feedback: String,
    pub project_score: f64,
    pub project_feedback: String,
    pub overall_summary: String,
    pub raw_cv_scores: Option<JsonValue>,
    pub raw_project_scores: Option<JsonValue>,
    /// Whether this verdict came from the heuristic fallback rather than
    /// the model. Logged for operational visibility, not persisted.
    pub used_fallback: bool,
}

impl Verdict {
    /// Convert into a persistence request.
    pub fn into_request(self) -> CreateEvaluationRequest {
        CreateEvaluationRequest {
            cv_match_rate: self.cv_match_rate,
            cv_feedback: self.cv_feedback,
            project_score: self.project_score,
            project_feedback: self.project_feedback,
            overall_summary: self.overall_summary,
            raw_cv_scores: self.raw_cv_scores,
            raw_project_scores: self.raw_project_scores,
        }
    }
}

/// A verdict recovered from model output, with a flag recording whether
/// every expected field was present and well-typed.
#[derive(Debug, Clone)]
pub struct ParsedVerdict {
    pub verdict: Verdict,
    /// False when any of the five fields was absent or wrong-typed and had
    /// to be defaulted.
    pub complete: bool,
}

/// Strip surrounding Markdown code fences and isolate the JSON object
/// between the first `{` and the last `}`.
fn extract_json_str(raw: &str) -> &str {
    let mut txt = raw.trim();

    if let Some(rest) = txt.strip_prefix("```") {
        // Drop the fence line (```json, ```JSON, bare ```), then the
        // closing fence if present.
        txt = match rest.split_once('\n') {
            Some((_, body)) => body,
            None => rest,
        };
        txt = txt.trim();
        if let Some(body) = txt.strip_suffix("```") {
            txt = body.trim();
        }
    }

    match (txt.find('{'), txt.rfind('}')) {
        (Some(first), Some(last)) if last > first => &txt[first..=last],
        _ => txt,
    }
}

/// Coerce a JSON value to a number, accepting numeric strings.
fn coerce_number(value: Option<&JsonValue>) -> Option<f64> {
    let value = value?;
    value
        .as_f64()
        .or_else(|| value.as_str().and_then(|s| s.trim().parse::<f64>().ok()))
}

fn coerce_text(value: Option<&JsonValue>) -> Option<String> {
    value?.as_str().map(|s| s.to_string())
}

/// Attempt to recover a structured verdict from raw model text.
///
/// Recovery steps: strip code fences, isolate the outermost JSON object,
/// parse, then validate field by field. Absent or wrong-typed fields map to
/// explicit defaults (0.0 / empty string) and clear the completeness flag;
/// score values are stored as returned, without clamping to their
/// documented ranges. Returns `None` only when no JSON object can be
/// parsed at all — the caller then falls back.
pub fn parse_verdict(raw: &str) -> Option<ParsedVerdict> {
    let json_str = extract_json_str(raw);
    let parsed: JsonValue = serde_json::from_str(json_str).ok()?;
    let obj = parsed.as_object()?;

    let mut complete = true;

    let cv_match_rate = coerce_number(obj.get("cvMatchRate")).unwrap_or_else(|| {
        complete = false;
        0.0
    });
    let cv_feedback = coerce_text(obj.get("cvFeedback")).unwrap_or_else(|| {
        complete = false;
        String::new()
    });
    let project_score = coerce_number(obj.get("projectScore")).unwrap_or_else(|| {
        complete = false;
        0.0
    });
    let project_feedback = coerce_text(obj.get("projectFeedback")).unwrap_or_else(|| {
        complete = false;
        String::new()
    });
    let overall_summary = coerce_text(obj.get("overallSummary")).unwrap_or_else(|| {
        complete = false;
        String::new()
    });

    Some(ParsedVerdict {
        verdict: Verdict {
            cv_match_rate,
            cv_feedback,
            project_score,
            project_feedback,
            overall_summary,
            raw_cv_scores: obj.get("rawCvScores").cloned(),
            raw_project_scores: obj.get("rawProjectScores").cloned(),
            used_fallback: false,
        },
        complete,
    })
}

/// Deterministic, provider-independent evaluation derived purely from the
/// document text lengths. Monotonic in both inputs and bounded to the
/// documented score ranges.
pub fn heuristic_fallback(cv_len: usize, report_len: usize) -> Verdict {
    let cv_match_rate = (cv_len as f64 / defaults::FALLBACK_CV_LEN_DIVISOR).clamp(0.2, 0.9);
    let project_score =
        (report_len as f64 / defaults::FALLBACK_REPORT_LEN_DIVISOR).clamp(1.0, 5.0);

    Verdict {
        cv_match_rate,
        cv_feedback: defaults::FALLBACK_CV_FEEDBACK.to_string(),
        project_score,
        project_feedback: defaults::FALLBACK_PROJECT_FEEDBACK.to_string(),
        overall_summary: defaults::FALLBACK_SUMMARY.to_string(),
        raw_cv_scores: None,
        raw_project_scores: None,
        used_fallback: true,
    }
}
