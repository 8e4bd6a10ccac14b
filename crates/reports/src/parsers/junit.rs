//! JUnit XML reports.
//!
//! Accepts a `<testsuites>` root or a bare `<testsuite>`, with nested suites.

use failscope_core::{CoreError, CoreResult};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use super::millis;
use crate::models::{Report, TestCase, TestStatus, TestSuite};

#[derive(Default)]
struct Builder {
    roots: Vec<TestSuite>,
    open_suites: Vec<TestSuite>,
    current_case: Option<TestCase>,
    in_failure: bool,
    text: String,
    root_time: Option<f64>,
    suite_times: f64,
}

impl Builder {
    fn open_suite(&mut self, e: &BytesStart<'_>) {
        if self.open_suites.is_empty() {
            self.suite_times += attr(e, "time").and_then(|t| t.parse().ok()).unwrap_or(0.0);
        }
        let mut suite = TestSuite::new(attr(e, "name").unwrap_or_default());
        suite.file_path = attr(e, "file");
        self.open_suites.push(suite);
    }

    fn close_suite(&mut self) {
        if let Some(suite) = self.open_suites.pop() {
            match self.open_suites.last_mut() {
                Some(parent) => parent.suites.push(suite),
                None => self.roots.push(suite),
            }
        }
    }

    fn open_case(&mut self, e: &BytesStart<'_>) {
        let mut case = TestCase::new(attr(e, "name").unwrap_or_default(), TestStatus::Passed);
        case.duration_ms = attr(e, "time")
            .and_then(|t| t.parse::<f64>().ok())
            .map(|secs| millis(secs * 1000.0))
            .unwrap_or(0);
        case.file_path = attr(e, "file").or_else(|| {
            self.open_suites
                .last()
                .and_then(|s| s.file_path.clone())
        });
        case.line = attr(e, "line").and_then(|l| l.parse().ok());
        self.current_case = Some(case);
    }

    fn close_case(&mut self) {
        let Some(case) = self.current_case.take() else {
            return;
        };
        if self.open_suites.is_empty() {
            // Test cases outside any suite get an implicit one.
            self.open_suites.push(TestSuite::new("junit"));
        }
        if let Some(suite) = self.open_suites.last_mut() {
            suite.tests.push(case);
        }
    }

    fn mark_failed(&mut self, e: &BytesStart<'_>) {
        if let Some(case) = self.current_case.as_mut() {
            case.status = TestStatus::Failed;
            case.error_message = attr(e, "message").or_else(|| attr(e, "type"));
        }
    }

    fn mark_skipped(&mut self) {
        if let Some(case) = self.current_case.as_mut() {
            if case.status != TestStatus::Failed {
                case.status = TestStatus::Skipped;
            }
        }
    }

    fn finish_failure(&mut self) {
        let body = std::mem::take(&mut self.text);
        let body = body.trim();
        if let Some(case) = self.current_case.as_mut() {
            if !body.is_empty() {
                if case.error_message.is_none() {
                    case.error_message = body.lines().next().map(|l| l.trim().to_string());
                }
                case.stack_trace = Some(body.to_string());
            }
        }
    }

    fn finish(mut self) -> Report {
        while !self.open_suites.is_empty() {
            self.close_suite();
        }
        let seconds = self.root_time.unwrap_or(self.suite_times);
        let mut report = Report::from_suites("junit", self.roots);
        report.duration_ms = millis(seconds * 1000.0);
        report
    }
}

fn attr(e: &BytesStart<'_>, key: &str) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.local_name().as_ref() == key.as_bytes())
        .and_then(|a| a.unescape_value().ok().map(|v| v.into_owned()))
}

/// Parse a JUnit XML document.
pub fn parse_junit_xml(bytes: &[u8]) -> CoreResult<Report> {
    let mut reader = Reader::from_reader(bytes);
    let mut builder = Builder::default();
    let mut saw_root = false;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                match e.local_name().as_ref() {
                    b"testsuites" => {
                        saw_root = true;
                        builder.root_time = attr(e, "time").and_then(|t| t.parse().ok());
                    }
                    b"testsuite" => {
                        saw_root = true;
                        builder.open_suite(e);
                    }
                    b"testcase" => builder.open_case(e),
                    b"failure" | b"error" => {
                        builder.mark_failed(e);
                        builder.in_failure = true;
                        builder.text.clear();
                    }
                    b"skipped" => builder.mark_skipped(),
                    _ => {}
                }
            }
            Ok(Event::Empty(ref e)) => match e.local_name().as_ref() {
                b"testsuites" => saw_root = true,
                b"testsuite" => {
                    saw_root = true;
                    builder.open_suite(e);
                    builder.close_suite();
                }
                b"testcase" => {
                    builder.open_case(e);
                    builder.close_case();
                }
                b"failure" | b"error" => builder.mark_failed(e),
                b"skipped" => builder.mark_skipped(),
                _ => {}
            },
            Ok(Event::End(ref e)) => match e.local_name().as_ref() {
                b"testsuite" => builder.close_suite(),
                b"testcase" => builder.close_case(),
                b"failure" | b"error" => {
                    builder.finish_failure();
                    builder.in_failure = false;
                }
                _ => {}
            },
            Ok(Event::Text(ref e)) => {
                if builder.in_failure {
                    if let Ok(text) = e.unescape() {
                        builder.text.push_str(&text);
                    }
                }
            }
            Ok(Event::CData(ref e)) => {
                if builder.in_failure {
                    builder.text.push_str(&String::from_utf8_lossy(e));
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(CoreError::parse(format!(
                    "invalid JUnit XML at byte {}: {}",
                    reader.buffer_position(),
                    e
                )))
            }
            _ => {}
        }
        buf.clear();
    }

    if !saw_root {
        return Err(CoreError::parse(
            "JUnit XML must contain <testsuites> or <testsuite>",
        ));
    }
    Ok(builder.finish())
}
