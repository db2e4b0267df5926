use serde_json::Value;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    Key(String),
    Index(usize),
}

/// Location of a possibly nested value inside a record, written as
/// `dns.type` or `smtp.rcpt_to[0]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldPath {
    raw: String,
    segments: Vec<Segment>,
}

impl FieldPath {
    pub fn parse(raw: &str) -> Self {
        let mut segments = Vec::new();
        for part in raw.split('.') {
            let (name, indices) = split_indices(part);
            if !name.is_empty() || indices.is_empty() {
                segments.push(Segment::Key(name.to_string()));
            }
            segments.extend(indices.into_iter().map(Segment::Index));
        }

        Self {
            raw: raw.to_string(),
            segments,
        }
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Walks `value` along the path. Any absent key, out of range index or
    /// container of the wrong kind ends the walk with `None`.
    pub fn resolve<'a>(&self, value: &'a Value) -> Option<&'a Value> {
        self.segments.iter().try_fold(value, |current, segment| match segment {
            Segment::Key(key) => current.as_object()?.get(key),
            Segment::Index(index) => current.as_array()?.get(*index),
        })
    }
}

// Peels trailing `[n]` suffixes off a path part. Brackets that do not hold
// a plain decimal index stay part of the key.
fn split_indices(part: &str) -> (&str, Vec<usize>) {
    let mut name = part;
    let mut indices = Vec::new();
    while let Some(stripped) = name.strip_suffix(']') {
        let Some(open) = stripped.rfind('[') else {
            break;
        };
        let digits = &stripped[open + 1..];
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            break;
        }
        let Ok(index) = digits.parse::<usize>() else {
            break;
        };
        indices.push(index);
        name = &stripped[..open];
    }
    indices.reverse();

    (name, indices)
}

impl From<&str> for FieldPath {
    fn from(raw: &str) -> Self {
        Self::parse(raw)
    }
}

impl From<String> for FieldPath {
    fn from(raw: String) -> Self {
        Self::parse(&raw)
    }
}

impl From<&String> for FieldPath {
    fn from(raw: &String) -> Self {
        Self::parse(raw)
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}
