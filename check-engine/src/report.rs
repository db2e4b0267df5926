use crate::{Observation, Outcome, RunResult};
use serde::Serialize;
use serde_json::Value;
use std::io::{self, Write};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Format {
    #[default]
    Text,
    Json,
}

#[derive(Serialize)]
struct Summary<'a> {
    passed: bool,
    total: usize,
    failed: usize,
    outcomes: Vec<OutcomeView<'a>>,
}

#[derive(Serialize)]
struct OutcomeView<'a> {
    label: &'a str,
    passed: bool,
    #[serde(flatten)]
    observation: ObservationView<'a>,
}

#[derive(Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum ObservationView<'a> {
    Count {
        expected: u64,
        observed: u64,
    },
    Value {
        expected: &'a Value,
        observed: Option<&'a Value>,
    },
}

#[derive(Serialize)]
struct FatalView<'a> {
    passed: bool,
    error: ErrorView<'a>,
}

#[derive(Serialize)]
struct ErrorView<'a> {
    category: &'a str,
    message: &'a str,
}

impl<'a> From<&'a Outcome> for OutcomeView<'a> {
    fn from(outcome: &'a Outcome) -> Self {
        let observation = match &outcome.observation {
            Observation::Count { expected, observed } => ObservationView::Count {
                expected: *expected,
                observed: *observed,
            },
            Observation::Value { expected, observed } => ObservationView::Value {
                expected,
                observed: observed.as_ref(),
            },
        };

        Self {
            label: &outcome.label,
            passed: outcome.passed(),
            observation,
        }
    }
}

/// Writes the pass/fail summary of a run: one line per outcome with expected
/// and observed values for failures, then totals.
pub fn report<W: Write>(result: &RunResult, format: Format, out: &mut W) -> io::Result<()> {
    match format {
        Format::Text => report_text(result, out),
        Format::Json => {
            let outcomes: Vec<OutcomeView> = result.outcomes().iter().map(Into::into).collect();
            let failed = outcomes.iter().filter(|o| !o.passed).count();
            let summary = Summary {
                passed: failed == 0,
                total: outcomes.len(),
                failed,
                outcomes,
            };
            serde_json::to_writer_pretty(&mut *out, &summary)?;
            writeln!(out)
        }
    }
}

fn report_text<W: Write>(result: &RunResult, out: &mut W) -> io::Result<()> {
    let mut passed = 0;
    let mut failed = 0;
    for outcome in result.outcomes() {
        if outcome.passed() {
            passed += 1;
            writeln!(out, "PASS: {}", outcome.label)?;
            continue;
        }

        failed += 1;
        match &outcome.observation {
            Observation::Count { expected, observed } => writeln!(
                out,
                "FAIL: {}: expected {}, got {}",
                outcome.label, expected, observed
            )?,
            Observation::Value {
                expected,
                observed: Some(observed),
            } => writeln!(
                out,
                "FAIL: {}: expected {}, got {}",
                outcome.label, expected, observed
            )?,
            Observation::Value {
                expected,
                observed: None,
            } => writeln!(
                out,
                "FAIL: {}: expected {}, got nothing",
                outcome.label, expected
            )?,
        }
    }

    writeln!(out)?;
    writeln!(out, "PASSED:  {}", passed)?;
    writeln!(out, "FAILED:  {}", failed)?;
    writeln!(out, "RESULT:  {}", if failed == 0 { "PASS" } else { "FAIL" })
}

/// Writes a fatal error that aborted the run before any check was evaluated.
pub fn report_fatal<W: Write>(
    category: &str,
    message: &str,
    format: Format,
    out: &mut W,
) -> io::Result<()> {
    match format {
        Format::Text => writeln!(out, "ERROR: {}: {}", category, message),
        Format::Json => {
            let view = FatalView {
                passed: false,
                error: ErrorView { category, message },
            };
            serde_json::to_writer_pretty(&mut *out, &view)?;
            writeln!(out)
        }
    }
}
