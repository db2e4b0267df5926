mod assertion;
mod error;
mod path;
mod predicate;
mod record;
pub mod report;
mod stats;

pub use assertion::{count, evaluate, Assertion, Observation, Outcome, RunResult};
pub use error::{Error, LineNumbers};
pub use path::{FieldPath, Segment};
pub use predicate::{matches, values_equal, Constraint, Predicate};
pub use record::{load, Log, Record};
pub use report::{report, Format};
pub use stats::StatsCheck;

/// Parses an `eve-ql` check such as `{event_type="dns"} | count == 2` into
/// an assertion. Returns `Ok(None)` when the check carries no expected count.
pub fn parse_assertion(check: &str) -> Result<Option<Assertion>, ParseError> {
    let query = eve_ql::parse(check)?;
    let predicate = Predicate::try_from(query.selector)?;

    Ok(match query.function {
        Some(eve_ql::Function::Count {
            expected: Some(expected),
        }) => Some(Assertion::new(predicate, expected)),
        _ => None,
    })
}

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("failed to parse check: {0}")]
    Query(eve_ql::Error),

    #[error("{0}")]
    Predicate(Error),
}

impl From<eve_ql::Error> for ParseError {
    fn from(error: eve_ql::Error) -> Self {
        Self::Query(error)
    }
}

impl From<Error> for ParseError {
    fn from(error: Error) -> Self {
        Self::Predicate(error)
    }
}
