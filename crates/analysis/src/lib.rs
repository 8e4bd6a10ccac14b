//! Failscope Analysis
//!
//! The model-facing half of the diagnosis pipeline:
//!
//! - `models` - Diagnosis, RootCauseAnalysis and the `AnalysisResult` union
//! - `prompt` - Bounded failure prompt, system instructions, root-cause tool
//! - `extraction` - JSON recovery from model output and argument-bag mapping

pub mod extraction;
pub mod models;
pub mod prompt;

pub use extraction::{
    extract_json_object, parse_diagnosis, rca_from_arguments, ExtractionError, RcaExtraction,
};
pub use models::{
    AnalysisOutcome, AnalysisResult, Category, CodeLocation, Confidence, Diagnosis,
    DiagnosisReport, Evidence, EvidenceType, RootCauseAnalysis, Sensitivity, StructuredAnalysis,
};
pub use prompt::{
    build_prompt, root_cause_tool, DIAGNOSIS_SYSTEM_PROMPT, MAX_FAILURES_IN_PROMPT,
    ROOT_CAUSE_SYSTEM_PROMPT, ROOT_CAUSE_TOOL_NAME,
};
