use crate::{FieldPath, Log, Observation, Outcome};
use serde_json::Value;

const STATS_EVENT_TYPE: &str = "stats";

/// Expected counter values read from the `stats` object of the last stats
/// record in a log.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatsCheck {
    expected: Vec<(FieldPath, Value)>,
}

impl StatsCheck {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn expect(mut self, path: impl Into<FieldPath>, value: impl Into<Value>) -> Self {
        self.expected.push((path.into(), value.into()));

        self
    }

    pub fn is_empty(&self) -> bool {
        self.expected.is_empty()
    }

    /// One outcome per expected counter. Without a stats record every
    /// counter is reported as missing.
    pub fn evaluate(&self, log: &Log) -> Vec<Outcome> {
        let event_type = FieldPath::parse("event_type");
        let stats_path = FieldPath::parse(STATS_EVENT_TYPE);
        let stats = log
            .records()
            .iter()
            .rev()
            .find(|r| r.get(&event_type).and_then(Value::as_str) == Some(STATS_EVENT_TYPE))
            .and_then(|r| r.get(&stats_path));

        self.expected
            .iter()
            .map(|(path, expected)| Outcome {
                label: format!("stats.{}", path),
                observation: Observation::Value {
                    expected: expected.clone(),
                    observed: stats.and_then(|s| path.resolve(s)).cloned(),
                },
            })
            .collect()
    }
}
