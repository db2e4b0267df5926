use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub selector: Selector,
    pub function: Option<Function>,
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct Selector {
    pub filters: Vec<Filter>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    Eq { key: String, value: Literal },
    HasKey(String),
    NotHasKey(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    String(String),
    Integer(i64),
    Unsigned(u64),
    Float(f64),
    Bool(bool),
    Null,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Function {
    Count { expected: Option<u64> },
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Filter::Eq { key, value } => write!(f, "{}={}", key, value),
            Filter::HasKey(key) => write!(f, "has({})", key),
            Filter::NotHasKey(key) => write!(f, "!has({})", key),
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::String(s) => write!(f, "{:?}", s),
            Literal::Integer(i) => write!(f, "{}", i),
            Literal::Unsigned(u) => write!(f, "{}", u),
            Literal::Float(v) => write!(f, "{}", v),
            Literal::Bool(b) => write!(f, "{}", b),
            Literal::Null => f.write_str("null"),
        }
    }
}
