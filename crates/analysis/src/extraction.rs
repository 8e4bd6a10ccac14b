//! Diagnosis Extractor
//!
//! Recovers a JSON object from free-form model output and maps it into the
//! diagnosis models. Extraction runs three tiers, first match wins:
//!
//! 1. a fenced block tagged `json`
//! 2. any fenced block whose trimmed content starts with `{`
//! 3. a balanced-brace scan from the first `{`, skipping string literals
//!
//! A candidate that does not parse as a JSON object does not end the search;
//! the next tier is tried.

use serde_json::{Map, Value};
use thiserror::Error;
use tracing::debug;

use crate::models::{
    CodeLocation, Confidence, Diagnosis, Evidence, EvidenceType, RootCauseAnalysis, Sensitivity,
};

/// Extraction errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractionError {
    #[error("no JSON object found in model response")]
    NoJsonFound,

    #[error("JSON object does not match the diagnosis schema: {0}")]
    InvalidSchema(String),
}

const FENCE: &str = "```";

// ============================================================================
// JSON Object Extraction
// ============================================================================

fn parse_object(candidate: &str) -> Option<Value> {
    match serde_json::from_str::<Value>(candidate.trim()) {
        Ok(value @ Value::Object(_)) => Some(value),
        _ => None,
    }
}

/// Split `text` into the bodies of its fenced blocks, paired with the
/// language tag on the opening fence line.
fn fenced_blocks(text: &str) -> Vec<(&str, &str)> {
    let mut blocks = Vec::new();
    let mut rest = text;

    while let Some(open) = rest.find(FENCE) {
        let after_open = &rest[open + FENCE.len()..];
        let (tag, body_start) = match after_open.find('\n') {
            Some(nl) => (after_open[..nl].trim(), &after_open[nl + 1..]),
            None => break,
        };
        let Some(close) = body_start.find(FENCE) else {
            // Unterminated fence: the body runs to the end of the text
            blocks.push((tag, body_start));
            break;
        };
        blocks.push((tag, &body_start[..close]));
        rest = &body_start[close + FENCE.len()..];
    }

    blocks
}

/// Balanced `{...}` spans, ordered by start, from one string-aware pass.
///
/// Braces with no partner are dropped, so a stray `{` in prose does not hide
/// an object that follows it.
fn balanced_spans(text: &str) -> Vec<(usize, usize)> {
    let mut spans = Vec::new();
    let mut open = Vec::new();
    let mut in_string = false;
    let mut escaped = false;

    let Some(first) = text.find('{') else {
        return spans;
    };

    for (offset, ch) in text[first..].char_indices() {
        let idx = first + offset;
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => open.push(idx),
            '}' => {
                if let Some(start) = open.pop() {
                    spans.push((start, idx + 1));
                }
            }
            _ => {}
        }
    }

    spans.sort_unstable_by_key(|(start, _)| *start);
    spans
}

/// Extract the first embedded JSON object from model output.
pub fn extract_json_object(text: &str) -> Option<Value> {
    let blocks = fenced_blocks(text);

    // Tier 1: ```json
    if let Some(value) = blocks
        .iter()
        .filter(|(tag, _)| tag.eq_ignore_ascii_case("json"))
        .find_map(|(_, body)| parse_object(body))
    {
        return Some(value);
    }

    // Tier 2: any fence holding an object
    if let Some(value) = blocks
        .iter()
        .filter(|(_, body)| body.trim_start().starts_with('{'))
        .find_map(|(_, body)| parse_object(body))
    {
        return Some(value);
    }

    // Tier 3: bare braces
    balanced_spans(text)
        .into_iter()
        .find_map(|(start, end)| parse_object(&text[start..end]))
}

/// Parse model output into a legacy [`Diagnosis`].
///
/// The caller decides how to degrade on error; see [`Diagnosis::fallback`].
pub fn parse_diagnosis(text: &str) -> Result<Diagnosis, ExtractionError> {
    let value = extract_json_object(text).ok_or(ExtractionError::NoJsonFound)?;
    let diagnosis: Diagnosis = serde_json::from_value(value)
        .map_err(|e| ExtractionError::InvalidSchema(e.to_string()))?;

    if diagnosis.root_cause.trim().is_empty() {
        return Err(ExtractionError::InvalidSchema(
            "missing root_cause".to_string(),
        ));
    }

    debug!(
        confidence = %diagnosis.confidence,
        evidence = diagnosis.evidence.len(),
        "extraction: parsed diagnosis"
    );
    Ok(diagnosis)
}

// ============================================================================
// Argument Bag Mapping
// ============================================================================

/// Root cause analysis recovered from a tool-call argument bag
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RcaExtraction {
    pub rca: RootCauseAnalysis,
    /// 0-100
    pub confidence: u8,
    pub sensitivity: Sensitivity,
}

fn str_field(map: &Map<String, Value>, keys: &[&str]) -> String {
    keys.iter()
        .find_map(|k| map.get(*k).and_then(Value::as_str))
        .unwrap_or_default()
        .to_string()
}

fn u32_field(map: &Map<String, Value>, keys: &[&str]) -> u32 {
    keys.iter()
        .find_map(|k| match map.get(*k)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        })
        .map(|n| n.clamp(0.0, u32::MAX as f64) as u32)
        .unwrap_or(0)
}

fn location_from(value: Option<&Value>) -> Option<CodeLocation> {
    let map = value?.as_object()?;
    Some(CodeLocation {
        file_path: str_field(map, &["file_path", "file"]),
        line_number: u32_field(map, &["line_number", "line"]),
        function_name: str_field(map, &["function_name", "function"]),
    })
}

fn evidence_from(value: Option<&Value>) -> Vec<Evidence> {
    let Some(items) = value.and_then(Value::as_array) else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|item| match item {
            Value::String(s) => Some(Evidence {
                evidence_type: EvidenceType::Log,
                content: s.clone(),
            }),
            Value::Object(map) => Some(Evidence {
                evidence_type: EvidenceType::parse_lenient(&str_field(map, &["type"])),
                content: str_field(map, &["content"]),
            }),
            _ => None,
        })
        .collect()
}

fn clamp_percent(value: f64) -> u8 {
    value.round().clamp(0.0, 100.0) as u8
}

fn confidence_from(value: Option<&Value>) -> u8 {
    match value {
        Some(Value::Number(n)) => n.as_f64().map(clamp_percent).unwrap_or(0),
        Some(Value::String(s)) => match s.trim().parse::<f64>() {
            Ok(f) => clamp_percent(f),
            Err(_) => Confidence::parse_lenient(s).score(),
        },
        _ => 0,
    }
}

/// Map a tool-call argument bag into a [`RootCauseAnalysis`].
///
/// Missing fields become zero-valued and `failure_type` is passed through
/// unchecked. Arguments delivered as a JSON string are unwrapped first.
/// Returns `None` when no object can be recovered from the arguments.
pub fn rca_from_arguments(args: &Value) -> Option<RcaExtraction> {
    let unwrapped;
    let map = match args {
        Value::Object(map) => map,
        Value::String(raw) => {
            unwrapped = extract_json_object(raw)?;
            unwrapped.as_object()?
        }
        _ => return None,
    };

    let rca = RootCauseAnalysis {
        title: str_field(map, &["title"]),
        failure_type: str_field(map, &["failure_type"]),
        location: location_from(map.get("location")),
        symptom: str_field(map, &["symptom"]),
        root_cause: str_field(map, &["root_cause"]),
        evidence: evidence_from(map.get("evidence")),
        remediation: str_field(map, &["remediation", "suggested_fix"]),
    };

    Some(RcaExtraction {
        rca,
        confidence: confidence_from(map.get("confidence")),
        sensitivity: map
            .get("sensitivity")
            .and_then(Value::as_str)
            .map(Sensitivity::parse_lenient)
            .unwrap_or_default(),
    })
}
