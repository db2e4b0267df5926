use crate::{Error, FieldPath, Record};
use serde_json::{Number, Value};
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum Constraint {
    Equals { path: FieldPath, value: Value },
    HasKey(FieldPath),
    NotHasKey(FieldPath),
}

impl Constraint {
    pub fn test(&self, record: &Record) -> bool {
        match self {
            Constraint::Equals { path, value } => record
                .get(path)
                .is_some_and(|found| values_equal(found, value)),
            Constraint::HasKey(path) => record.get(path).is_some_and(|v| !v.is_null()),
            Constraint::NotHasKey(path) => record.get(path).is_none_or(Value::is_null),
        }
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constraint::Equals { path, value } => write!(f, "{}={}", path, value),
            Constraint::HasKey(path) => write!(f, "has({})", path),
            Constraint::NotHasKey(path) => write!(f, "!has({})", path),
        }
    }
}

/// Conjunction of field constraints, checked in order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Predicate {
    constraints: Vec<Constraint>,
}

impl Predicate {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn field_eq(mut self, path: impl Into<FieldPath>, value: impl Into<Value>) -> Self {
        self.push(Constraint::Equals {
            path: path.into(),
            value: value.into(),
        });

        self
    }

    #[inline]
    pub fn has_key(mut self, path: impl Into<FieldPath>) -> Self {
        self.push(Constraint::HasKey(path.into()));

        self
    }

    #[inline]
    pub fn not_has_key(mut self, path: impl Into<FieldPath>) -> Self {
        self.push(Constraint::NotHasKey(path.into()));

        self
    }

    pub fn push(&mut self, constraint: Constraint) {
        self.constraints.push(constraint);
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    pub fn matches(&self, record: &Record) -> bool {
        self.constraints.iter().all(|c| c.test(record))
    }
}

/// True iff every constraint of `predicate` holds for `record`.
pub fn matches(record: &Record, predicate: &Predicate) -> bool {
    predicate.matches(record)
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.constraints.is_empty() {
            return f.write_str("{}");
        }
        for (i, constraint) in self.constraints.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", constraint)?;
        }
        Ok(())
    }
}

impl TryFrom<eve_ql::Selector> for Predicate {
    type Error = Error;

    fn try_from(selector: eve_ql::Selector) -> Result<Self, Self::Error> {
        let mut predicate = Predicate::new();
        for filter in selector.filters {
            let constraint = match filter {
                eve_ql::Filter::Eq { key, value } => Constraint::Equals {
                    path: FieldPath::parse(&key),
                    value: literal_value(value)?,
                },
                eve_ql::Filter::HasKey(key) => Constraint::HasKey(FieldPath::parse(&key)),
                eve_ql::Filter::NotHasKey(key) => Constraint::NotHasKey(FieldPath::parse(&key)),
            };
            predicate.push(constraint);
        }

        Ok(predicate)
    }
}

fn literal_value(literal: eve_ql::Literal) -> Result<Value, Error> {
    let value = match literal {
        eve_ql::Literal::String(s) => Value::String(s),
        eve_ql::Literal::Integer(i) => Value::from(i),
        eve_ql::Literal::Unsigned(u) => Value::from(u),
        eve_ql::Literal::Float(f) => Number::from_f64(f)
            .map(Value::Number)
            .ok_or_else(|| Error::InvalidLiteral(f.to_string()))?,
        eve_ql::Literal::Bool(b) => Value::Bool(b),
        eve_ql::Literal::Null => Value::Null,
    };

    Ok(value)
}

/// Type-aware equality. Numbers compare by value so `53` equals `53.0`;
/// values of different JSON types are never equal.
pub fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => numbers_equal(x, y),
        (Value::Array(xs), Value::Array(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| values_equal(x, y))
        }
        (Value::Object(xs), Value::Object(ys)) => {
            xs.len() == ys.len()
                && xs
                    .iter()
                    .all(|(k, x)| ys.get(k).is_some_and(|y| values_equal(x, y)))
        }
        _ => a == b,
    }
}

fn numbers_equal(x: &Number, y: &Number) -> bool {
    if let (Some(a), Some(b)) = (x.as_i64(), y.as_i64()) {
        return a == b;
    }
    if let (Some(a), Some(b)) = (x.as_u64(), y.as_u64()) {
        return a == b;
    }
    // Two integers that differ in sign range are never equal; f64 would
    // round large values together.
    if !x.is_f64() && !y.is_f64() {
        return false;
    }
    match (x.as_f64(), y.as_f64()) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}
