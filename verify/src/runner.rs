use crate::config::{self, Config};
use check_engine::{Assertion, Log, Outcome, RunResult, StatsCheck};
use log::{debug, info};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq)]
pub enum Check {
    Filter { log: PathBuf, assertion: Assertion },
    Stats { log: PathBuf, check: StatsCheck },
}

impl Check {
    fn log(&self) -> &Path {
        match self {
            Check::Filter { log, .. } | Check::Stats { log, .. } => log,
        }
    }

    fn evaluate(&self, log: &Log) -> Vec<Outcome> {
        match self {
            Check::Filter { assertion, .. } => vec![assertion.evaluate(log)],
            Check::Stats { check, .. } => check.evaluate(log),
        }
    }
}

/// Checks of one invocation, each bound to the log file it reads.
#[derive(Debug, Default)]
pub struct Plan {
    checks: Vec<Check>,
}

impl Plan {
    /// Builds the plan from the check file entries followed by inline
    /// `eve-ql` checks. Relative log names resolve against `dir`.
    pub fn new(
        config: Config,
        inline: &[String],
        dir: &Path,
        default_log: &Path,
    ) -> Result<Self, config::Error> {
        let mut checks = Vec::new();
        for (i, entry) in config.checks.into_iter().enumerate() {
            if entry.filter.is_none() && entry.stats.is_none() {
                return Err(config::Error::EmptyCheck(i + 1));
            }

            if let Some(filter) = entry.filter {
                let log = dir.join(filter.filename.as_deref().unwrap_or(default_log));
                let mut assertion = Assertion::new(filter.predicate, filter.count);
                if let Some(comment) = filter.comment {
                    assertion = assertion.with_label(comment);
                }
                checks.push(Check::Filter { log, assertion });
            }

            if let Some(check) = entry.stats {
                checks.push(Check::Stats {
                    log: dir.join(default_log),
                    check,
                });
            }
        }

        for check in inline {
            match check_engine::parse_assertion(check).map_err(config::Error::Check)? {
                Some(assertion) => checks.push(Check::Filter {
                    log: dir.join(default_log),
                    assertion,
                }),
                None => return Err(config::Error::MissingCount(check.clone())),
            }
        }

        Ok(Self { checks })
    }

    pub fn checks(&self) -> &[Check] {
        &self.checks
    }

    /// Loads every referenced log once, then evaluates all checks. A load
    /// failure aborts before any check is evaluated.
    pub fn run(&self) -> Result<RunResult, check_engine::Error> {
        let mut paths: Vec<&Path> = Vec::new();
        let mut logs: Vec<Log> = Vec::new();
        let mut slots = Vec::with_capacity(self.checks.len());
        for check in &self.checks {
            let path = check.log();
            let slot = match paths.iter().position(|p| *p == path) {
                Some(slot) => slot,
                None => {
                    logs.push(check_engine::load(path)?);
                    paths.push(path);
                    paths.len() - 1
                }
            };
            slots.push(slot);
        }

        info!(
            "Evaluating {} checks against {} log(s)",
            self.checks.len(),
            logs.len()
        );
        let result: RunResult = self
            .checks
            .iter()
            .zip(slots)
            .flat_map(|(check, slot)| check.evaluate(&logs[slot]))
            .collect();
        debug!(
            "{} of {} outcomes failed",
            result.failures().count(),
            result.outcomes().len()
        );

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use check_engine::{Observation, Predicate};
    use std::fs;
    use tempfile::TempDir;

    fn dns_dir(answers: usize) -> TempDir {
        let dir = tempfile::tempdir().unwrap();
        let mut eve = String::new();
        for id in 0..2 {
            eve.push_str(&format!(
                "{{\"event_type\":\"dns\",\"dns\":{{\"type\":\"query\",\"id\":{}}}}}\n",
                id
            ));
        }
        for id in 0..answers {
            eve.push_str(&format!(
                "{{\"event_type\":\"dns\",\"dns\":{{\"type\":\"answer\",\"id\":{}}}}}\n",
                id % 2
            ));
        }
        eve.push_str("{\"event_type\":\"stats\",\"stats\":{\"decoder\":{\"pkts\":40}}}\n");
        fs::write(dir.path().join("eve.json"), eve).unwrap();
        dir
    }

    fn config(yaml: &str) -> Config {
        serde_yml::from_str(yaml).unwrap()
    }

    const DNS_CHECKS: &str = r#"
checks:
  - filter:
      count: 2
      match:
        event_type: dns
        dns.type: query
  - filter:
      count: 36
      comment: dns answers
      match:
        event_type: dns
        dns.type: answer
  - stats:
      decoder.pkts: 40
"#;

    #[test]
    fn test_all_checks_pass() {
        let dir = dns_dir(36);
        let plan = Plan::new(
            config(DNS_CHECKS),
            &[],
            dir.path(),
            Path::new(config::DEFAULT_LOG_NAME),
        )
        .unwrap();

        assert_eq!(plan.checks().len(), 3);
        let result = plan.run().unwrap();
        assert!(result.passed());
        assert_eq!(result.outcomes().len(), 3);
    }

    #[test]
    fn test_answer_count_mismatch() {
        let dir = dns_dir(36);
        let yaml = DNS_CHECKS.replace("count: 36", "count: 26");
        let plan = Plan::new(
            config(&yaml),
            &[],
            dir.path(),
            Path::new(config::DEFAULT_LOG_NAME),
        )
        .unwrap();

        let result = plan.run().unwrap();
        assert!(!result.passed());
        let failures: Vec<&Outcome> = result.failures().collect();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].label, "dns answers");
        assert_eq!(
            failures[0].observation,
            Observation::Count {
                expected: 26,
                observed: 36
            }
        );
    }

    #[test]
    fn test_inline_checks() {
        let dir = dns_dir(36);
        let inline = vec![
            r#"{event_type="dns", dns.type="query"} | count == 2"#.to_string(),
            r#"{event_type="dns", dns.type="answer"} | count == 36"#.to_string(),
        ];
        let plan = Plan::new(
            Config::default(),
            &inline,
            dir.path(),
            Path::new(config::DEFAULT_LOG_NAME),
        )
        .unwrap();

        assert!(plan.run().unwrap().passed());

        let err = Plan::new(
            Config::default(),
            &[r#"{event_type="dns"} | count"#.to_string()],
            dir.path(),
            Path::new(config::DEFAULT_LOG_NAME),
        )
        .unwrap_err();
        assert!(matches!(err, config::Error::MissingCount(_)));
    }

    #[test]
    fn test_missing_log_aborts() {
        let dir = tempfile::tempdir().unwrap();
        let plan = Plan::new(
            config(DNS_CHECKS),
            &[],
            dir.path(),
            Path::new(config::DEFAULT_LOG_NAME),
        )
        .unwrap();

        let err = plan.run().unwrap_err();
        assert_eq!(err.category(), "load error");
    }

    #[test]
    fn test_malformed_log_aborts() {
        let dir = dns_dir(4);
        let path = dir.path().join("eve.json");
        let mut contents = fs::read_to_string(&path).unwrap();
        contents.insert_str(0, "{\"event_type\":\n");
        fs::write(&path, contents).unwrap();

        let plan = Plan::new(
            config(DNS_CHECKS),
            &[],
            dir.path(),
            Path::new(config::DEFAULT_LOG_NAME),
        )
        .unwrap();

        match plan.run() {
            Err(check_engine::Error::MalformedLog { lines, .. }) => {
                assert_eq!(lines.0, vec![1]);
            }
            other => panic!("expected malformed log, got {:?}", other),
        }
    }

    #[test]
    fn test_filename_per_check() {
        let dir = dns_dir(2);
        fs::write(
            dir.path().join("alerts.json"),
            "{\"event_type\":\"alert\",\"alert\":{\"signature_id\":1}}\n",
        )
        .unwrap();

        let yaml = r#"
checks:
  - filter:
      filename: alerts.json
      count: 1
      match:
        has-key: alert.signature_id
  - filter:
      count: 0
      match:
        event_type: alert
"#;
        let plan = Plan::new(
            config(yaml),
            &[],
            dir.path(),
            Path::new(config::DEFAULT_LOG_NAME),
        )
        .unwrap();

        assert_eq!(
            plan.checks()[0],
            Check::Filter {
                log: dir.path().join("alerts.json"),
                assertion: Assertion::new(Predicate::new().has_key("alert.signature_id"), 1),
            }
        );
        assert!(plan.run().unwrap().passed());
    }

    #[test]
    fn test_empty_check_entry() {
        let err = Plan::new(
            config("checks:\n  - {}\n"),
            &[],
            Path::new("."),
            Path::new(config::DEFAULT_LOG_NAME),
        )
        .unwrap_err();
        assert!(matches!(err, config::Error::EmptyCheck(1)));
    }
}
