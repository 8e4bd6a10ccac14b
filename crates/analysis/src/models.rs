//! Diagnosis Models
//!
//! The two result shapes the analyzer can produce: the legacy enum-confidence
//! [`Diagnosis`] and the richer [`RootCauseAnalysis`] with a 0-100 confidence.
//! Both are kept as variants of [`AnalysisResult`].

use serde::{Deserialize, Deserializer, Serialize};

/// Qualitative confidence of a legacy diagnosis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Confidence {
    High,
    #[default]
    Medium,
    Low,
}

impl Confidence {
    /// Case-insensitive parse; anything unrecognized is `Medium`.
    pub fn parse_lenient(value: &str) -> Self {
        match value.trim().to_ascii_uppercase().as_str() {
            "HIGH" => Confidence::High,
            "LOW" => Confidence::Low,
            _ => Confidence::Medium,
        }
    }

    /// Numeric equivalent on the 0-100 scale
    pub fn score(&self) -> u8 {
        match self {
            Confidence::High => 90,
            Confidence::Medium => 60,
            Confidence::Low => 30,
        }
    }
}

impl<'de> Deserialize<'de> for Confidence {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = serde_json::Value::deserialize(deserializer)?;
        Ok(match value {
            serde_json::Value::String(s) => Confidence::parse_lenient(&s),
            _ => Confidence::Medium,
        })
    }
}

impl std::fmt::Display for Confidence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Confidence::High => write!(f, "HIGH"),
            Confidence::Medium => write!(f, "MEDIUM"),
            Confidence::Low => write!(f, "LOW"),
        }
    }
}

/// Suggested fix carried by fallback diagnoses.
pub const FALLBACK_SUGGESTED_FIX: &str =
    "Review the raw analysis in root_cause; it could not be parsed into a structured diagnosis.";

/// Explanation carried by fallback diagnoses.
pub const FALLBACK_EXPLANATION: &str =
    "The model response was not in the expected JSON format, so it is shown verbatim.";

/// Legacy diagnosis shape
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnosis {
    #[serde(default)]
    pub root_cause: String,
    #[serde(default)]
    pub evidence: Vec<String>,
    #[serde(default)]
    pub suggested_fix: String,
    #[serde(default)]
    pub confidence: Confidence,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence_explanation: Option<String>,
}

impl Diagnosis {
    /// Low-confidence diagnosis that keeps the raw model output verbatim.
    pub fn fallback(raw: impl Into<String>) -> Self {
        Self {
            root_cause: raw.into(),
            evidence: Vec::new(),
            suggested_fix: FALLBACK_SUGGESTED_FIX.to_string(),
            confidence: Confidence::Low,
            confidence_explanation: Some(FALLBACK_EXPLANATION.to_string()),
        }
    }
}

/// Where in the code the failure originates
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeLocation {
    #[serde(default)]
    pub file_path: String,
    #[serde(default)]
    pub line_number: u32,
    #[serde(default)]
    pub function_name: String,
}

/// Kind of evidence backing a root cause
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EvidenceType {
    Screenshot,
    Trace,
    #[default]
    Log,
    Network,
    Code,
}

impl EvidenceType {
    /// Case-insensitive parse; anything unrecognized is `Log`.
    pub fn parse_lenient(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "screenshot" => EvidenceType::Screenshot,
            "trace" => EvidenceType::Trace,
            "network" => EvidenceType::Network,
            "code" => EvidenceType::Code,
            _ => EvidenceType::Log,
        }
    }
}

/// One typed piece of evidence
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Evidence {
    #[serde(rename = "type")]
    pub evidence_type: EvidenceType,
    pub content: String,
}

/// Structured root cause analysis
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RootCauseAnalysis {
    #[serde(default)]
    pub title: String,
    /// Open tag, commonly timeout/assertion/network/infra/flake
    #[serde(default)]
    pub failure_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<CodeLocation>,
    #[serde(default)]
    pub symptom: String,
    #[serde(default)]
    pub root_cause: String,
    #[serde(default)]
    pub evidence: Vec<Evidence>,
    #[serde(default)]
    pub remediation: String,
}

/// Result category of a structured analysis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    /// A root cause analysis is attached
    Diagnosis,
    /// The report had no failures
    NoFailures,
    /// The model answered but no structure could be recovered
    Unstructured,
}

/// How much additional data could change the verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sensitivity {
    Low,
    #[default]
    Medium,
    High,
}

impl Sensitivity {
    /// Case-insensitive parse; anything unrecognized is `Medium`.
    pub fn parse_lenient(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "low" => Sensitivity::Low,
            "high" => Sensitivity::High,
            _ => Sensitivity::Medium,
        }
    }
}

/// Legacy output: `{diagnosis, input_tokens, output_tokens, provider, model}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosisReport {
    pub diagnosis: Diagnosis,
    pub input_tokens: u32,
    pub output_tokens: u32,
    pub provider: String,
    pub model: String,
}

/// Structured output with a numeric confidence
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuredAnalysis {
    pub category: Category,
    /// 0-100
    pub confidence: u8,
    #[serde(default)]
    pub sensitivity: Sensitivity,
    /// Present only for the diagnosis category
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rca: Option<RootCauseAnalysis>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default)]
    pub provider: String,
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub input_tokens: u32,
    #[serde(default)]
    pub output_tokens: u32,
}

/// Final analysis result, one of the two output shapes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnalysisResult {
    Legacy(DiagnosisReport),
    Structured(StructuredAnalysis),
}

impl AnalysisResult {
    /// Provider that produced the result
    pub fn provider(&self) -> &str {
        match self {
            AnalysisResult::Legacy(r) => &r.provider,
            AnalysisResult::Structured(s) => &s.provider,
        }
    }

    /// Model that produced the result
    pub fn model(&self) -> &str {
        match self {
            AnalysisResult::Legacy(r) => &r.model,
            AnalysisResult::Structured(s) => &s.model,
        }
    }

    /// Result category; legacy results always carry a diagnosis
    pub fn category(&self) -> Category {
        match self {
            AnalysisResult::Legacy(_) => Category::Diagnosis,
            AnalysisResult::Structured(s) => s.category,
        }
    }

    /// Confidence on the 0-100 scale
    pub fn confidence_score(&self) -> u8 {
        match self {
            AnalysisResult::Legacy(r) => r.diagnosis.confidence.score(),
            AnalysisResult::Structured(s) => s.confidence,
        }
    }

    /// `(input, output)` token counts
    pub fn token_usage(&self) -> (u32, u32) {
        match self {
            AnalysisResult::Legacy(r) => (r.input_tokens, r.output_tokens),
            AnalysisResult::Structured(s) => (s.input_tokens, s.output_tokens),
        }
    }
}

/// Text carried by the no-failures result.
pub const NO_FAILURES_TEXT: &str = "No failed tests found in this report; nothing to analyze.";

/// Outcome of one analyzer invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AnalysisOutcome {
    /// The report had no failures; the model was not called
    NothingToAnalyze { provider: String, model: String },
    /// The model produced a result
    Analyzed { result: AnalysisResult },
}

impl AnalysisOutcome {
    /// Whether the model was consulted
    pub fn is_analyzed(&self) -> bool {
        matches!(self, AnalysisOutcome::Analyzed { .. })
    }

    /// The analysis result, if the model was consulted
    pub fn result(&self) -> Option<&AnalysisResult> {
        match self {
            AnalysisOutcome::Analyzed { result } => Some(result),
            AnalysisOutcome::NothingToAnalyze { .. } => None,
        }
    }

    /// Always produce a result; nothing-to-analyze becomes the `no-failures`
    /// category.
    pub fn into_structured(self) -> AnalysisResult {
        match self {
            AnalysisOutcome::Analyzed { result } => result,
            AnalysisOutcome::NothingToAnalyze { provider, model } => {
                AnalysisResult::Structured(StructuredAnalysis {
                    category: Category::NoFailures,
                    confidence: 100,
                    sensitivity: Sensitivity::Low,
                    rca: None,
                    text: Some(NO_FAILURES_TEXT.to_string()),
                    provider,
                    model,
                    input_tokens: 0,
                    output_tokens: 0,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confidence_lenient_parse() {
        assert_eq!(Confidence::parse_lenient("high"), Confidence::High);
        assert_eq!(Confidence::parse_lenient(" Low "), Confidence::Low);
        assert_eq!(Confidence::parse_lenient("very sure"), Confidence::Medium);

        let d: Diagnosis =
            serde_json::from_str(r#"{"root_cause": "x", "confidence": "high"}"#).unwrap();
        assert_eq!(d.confidence, Confidence::High);
        let d: Diagnosis = serde_json::from_str(r#"{"root_cause": "x", "confidence": 7}"#).unwrap();
        assert_eq!(d.confidence, Confidence::Medium);
    }

    #[test]
    fn test_confidence_score() {
        assert_eq!(Confidence::High.score(), 90);
        assert_eq!(Confidence::Medium.score(), 60);
        assert_eq!(Confidence::Low.score(), 30);
    }

    #[test]
    fn test_diagnosis_optional_explanation_absent() {
        let diagnosis = Diagnosis {
            root_cause: "Selector changed".to_string(),
            evidence: vec!["locator('#submit') not found".to_string()],
            suggested_fix: "Update the selector".to_string(),
            confidence: Confidence::High,
            confidence_explanation: None,
        };
        let json = serde_json::to_string(&diagnosis).unwrap();
        assert!(!json.contains("confidence_explanation"));
        assert!(json.contains("\"confidence\":\"HIGH\""));
        let parsed: Diagnosis = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, diagnosis);
    }

    #[test]
    fn test_rca_serialization_shape() {
        let rca = RootCauseAnalysis {
            title: "Checkout times out".to_string(),
            failure_type: "timeout".to_string(),
            location: Some(CodeLocation {
                file_path: "checkout.spec.ts".to_string(),
                line_number: 42,
                function_name: "payWithCard".to_string(),
            }),
            symptom: "Test exceeded 30s".to_string(),
            root_cause: "Payment mock not started".to_string(),
            evidence: vec![Evidence {
                evidence_type: EvidenceType::Network,
                content: "POST /pay pending".to_string(),
            }],
            remediation: "Start the mock in globalSetup".to_string(),
        };
        let value = serde_json::to_value(&rca).unwrap();
        assert_eq!(value["evidence"][0]["type"], "network");
        assert_eq!(value["location"]["line_number"], 42);
        let parsed: RootCauseAnalysis = serde_json::from_value(value).unwrap();
        assert_eq!(parsed, rca);

        let no_location = RootCauseAnalysis::default();
        let json = serde_json::to_string(&no_location).unwrap();
        assert!(!json.contains("location"));
    }

    #[test]
    fn test_fallback_diagnosis() {
        let d = Diagnosis::fallback("the raw text");
        assert_eq!(d.root_cause, "the raw text");
        assert!(d.evidence.is_empty());
        assert_eq!(d.confidence, Confidence::Low);
        assert!(d.confidence_explanation.is_some());
    }

    #[test]
    fn test_analysis_result_untagged_shapes() {
        let legacy = AnalysisResult::Legacy(DiagnosisReport {
            diagnosis: Diagnosis::fallback("raw"),
            input_tokens: 10,
            output_tokens: 5,
            provider: "anthropic".to_string(),
            model: "claude".to_string(),
        });
        let json = serde_json::to_value(&legacy).unwrap();
        assert!(json.get("diagnosis").is_some());
        assert!(json.get("category").is_none());
        let parsed: AnalysisResult = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, legacy);
        assert_eq!(parsed.confidence_score(), 30);

        let structured = AnalysisOutcome::NothingToAnalyze {
            provider: "openai".to_string(),
            model: "gpt-4o".to_string(),
        }
        .into_structured();
        let json = serde_json::to_value(&structured).unwrap();
        assert_eq!(json["category"], "no-failures");
        assert!(json.get("rca").is_none());
        let parsed: AnalysisResult = serde_json::from_value(json).unwrap();
        assert_eq!(parsed.category(), Category::NoFailures);
        assert_eq!(parsed.provider(), "openai");
    }
}
