//! Report Parsers
//!
//! Turn one artifact file into a normalized [`Report`]. The content detector
//! picks the JSON parser; XML is always treated as JUnit.

mod jest;
mod junit;
mod playwright;

use failscope_core::{CoreError, CoreResult};
use serde_json::Value;
use tracing::debug;

use crate::detector::detect_document;
use crate::models::{Report, ReportType};

pub use jest::parse_jest;
pub use junit::parse_junit_xml;
pub use playwright::parse_playwright;

/// Parse a report file into the normalized model.
///
/// `file_name` is only used for diagnostics.
pub fn parse_report(file_name: &str, bytes: &[u8]) -> CoreResult<Report> {
    if looks_like_xml(bytes) {
        debug!(file = file_name, "parsing report as JUnit XML");
        return parse_junit_xml(bytes);
    }

    let doc = match serde_json::from_slice::<Value>(bytes) {
        Ok(Value::Object(doc)) => doc,
        _ => {
            return Err(CoreError::parse(format!(
                "unrecognized report format in {}",
                file_name
            )))
        }
    };

    let detection = detect_document(&doc);
    debug!(file = file_name, report_type = %detection.report_type, "detected report type");

    match detection.report_type {
        ReportType::Playwright => parse_playwright(Value::Object(doc), detection.counts),
        ReportType::Jest => parse_jest(Value::Object(doc)),
        ReportType::JUnit => Err(CoreError::parse(format!(
            "JUnit reports must be XML, {} is JSON",
            file_name
        ))),
        ReportType::Unknown => Err(CoreError::parse(format!(
            "unrecognized report format in {}",
            file_name
        ))),
    }
}

/// First non-whitespace byte (after an optional UTF-8 BOM) is `<`.
fn looks_like_xml(bytes: &[u8]) -> bool {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    bytes
        .iter()
        .find(|b| !b.is_ascii_whitespace())
        .is_some_and(|b| *b == b'<')
}

/// Milliseconds from a possibly fractional JSON number.
pub(crate) fn millis(value: f64) -> u64 {
    if value.is_finite() && value > 0.0 {
        value.round() as u64
    } else {
        0
    }
}
