use crate::error::LineNumbers;
use crate::{Error, FieldPath};
use log::debug;
use serde_json::Value;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

/// One decoded line of an event log. Always wraps a JSON object.
#[derive(Debug, Clone, PartialEq)]
pub struct Record(Value);

impl Record {
    #[inline]
    pub fn get(&self, path: &FieldPath) -> Option<&Value> {
        path.resolve(&self.0)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }
}

impl TryFrom<Value> for Record {
    type Error = Value;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        if value.is_object() {
            Ok(Self(value))
        } else {
            Err(value)
        }
    }
}

/// Records of one event log in file order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Log {
    path: Option<PathBuf>,
    records: Vec<Record>,
}

impl Log {
    pub fn from_records(records: Vec<Record>) -> Self {
        Self {
            path: None,
            records,
        }
    }

    pub fn from_reader(mut reader: impl Read) -> Result<Self, Error> {
        let stream = PathBuf::from("-");
        let mut buf = Vec::new();
        if let Err(e) = reader.read_to_end(&mut buf) {
            return Err(Error::Load {
                path: stream,
                source: e,
            });
        }
        let records = decode(&buf, &stream)?;

        Ok(Self::from_records(records))
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Reads a newline delimited JSON event log. Every line, blank ones
/// included, must decode to a JSON object.
pub fn load(path: impl AsRef<Path>) -> Result<Log, Error> {
    let path = path.as_ref();
    let buf = fs::read(path).map_err(|source| Error::Load {
        path: path.to_path_buf(),
        source,
    })?;

    let records = decode(&buf, path)?;
    debug!("Loaded {} records from {}", records.len(), path.display());

    Ok(Log {
        path: Some(path.to_path_buf()),
        records,
    })
}

fn decode(buf: &[u8], path: &Path) -> Result<Vec<Record>, Error> {
    let mut records = Vec::new();
    let mut bad_lines = Vec::new();
    let mut reason = None;
    if buf.is_empty() {
        return Ok(records);
    }

    // Only the empty piece after the final newline carries no line.
    let body = buf.strip_suffix(b"\n").unwrap_or(buf);
    for (i, line) in body.split(|b| *b == b'\n').enumerate() {
        let line_number = i + 1;
        let failure = match serde_json::from_slice::<Value>(line) {
            Ok(value) => match Record::try_from(value) {
                Ok(record) => {
                    records.push(record);
                    continue;
                }
                Err(value) => format!("expected a JSON object, found {}", kind(&value)),
            },
            Err(e) => e.to_string(),
        };

        bad_lines.push(line_number);
        reason.get_or_insert_with(|| format!("line {}: {}", line_number, failure));
    }

    match reason {
        None => Ok(records),
        Some(reason) => Err(Error::MalformedLog {
            path: path.to_path_buf(),
            lines: LineNumbers(bad_lines),
            reason,
        }),
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
