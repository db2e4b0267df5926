use crate::predicate::values_equal;
use crate::{Log, Predicate};
use log::debug;
use serde_json::Value;

#[derive(Debug, Clone, PartialEq)]
pub struct Assertion {
    pub label: String,
    pub predicate: Predicate,
    pub expected_count: u64,
}

impl Assertion {
    /// Creates an assertion labelled after its predicate.
    pub fn new(predicate: Predicate, expected_count: u64) -> Self {
        Self {
            label: predicate.to_string(),
            predicate,
            expected_count,
        }
    }

    #[inline]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();

        self
    }

    pub fn evaluate(&self, log: &Log) -> Outcome {
        let observed = count(log, &self.predicate);
        debug!(
            "{}: observed {} (expected {})",
            self.label, observed, self.expected_count
        );

        Outcome {
            label: self.label.clone(),
            observation: Observation::Count {
                expected: self.expected_count,
                observed,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Observation {
    Count { expected: u64, observed: u64 },
    Value { expected: Value, observed: Option<Value> },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    pub label: String,
    pub observation: Observation,
}

impl Outcome {
    pub fn passed(&self) -> bool {
        match &self.observation {
            Observation::Count { expected, observed } => expected == observed,
            Observation::Value { expected, observed } => observed
                .as_ref()
                .is_some_and(|observed| values_equal(observed, expected)),
        }
    }
}

/// Outcomes of every check of one run, in evaluation order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunResult {
    outcomes: Vec<Outcome>,
}

impl RunResult {
    pub fn outcomes(&self) -> &[Outcome] {
        &self.outcomes
    }

    pub fn passed(&self) -> bool {
        self.outcomes.iter().all(Outcome::passed)
    }

    pub fn failures(&self) -> impl Iterator<Item = &Outcome> {
        self.outcomes.iter().filter(|o| !o.passed())
    }

    pub fn push(&mut self, outcome: Outcome) {
        self.outcomes.push(outcome);
    }

    pub fn merge(&mut self, other: RunResult) {
        self.outcomes.extend(other.outcomes);
    }
}

impl FromIterator<Outcome> for RunResult {
    fn from_iter<T: IntoIterator<Item = Outcome>>(iter: T) -> Self {
        Self {
            outcomes: iter.into_iter().collect(),
        }
    }
}

impl Extend<Outcome> for RunResult {
    fn extend<T: IntoIterator<Item = Outcome>>(&mut self, iter: T) {
        self.outcomes.extend(iter);
    }
}

/// Number of records in `log` matching `predicate`.
pub fn count(log: &Log, predicate: &Predicate) -> u64 {
    log.records()
        .iter()
        .filter(|record| predicate.matches(record))
        .count() as u64
}

/// Evaluates every assertion against `log`. Mismatches are collected, never
/// short-circuited.
pub fn evaluate(log: &Log, assertions: &[Assertion]) -> RunResult {
    assertions.iter().map(|a| a.evaluate(log)).collect()
}
