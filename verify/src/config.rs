use check_engine::{Constraint, FieldPath, Predicate, StatsCheck};
use serde::de::{self, MapAccess, Visitor};
use serde::{Deserialize, Deserializer};
use serde_json::Value as Json;
use std::fmt;
use std::fs::File;
use std::path::{Path, PathBuf};

pub const DEFAULT_LOG_NAME: &str = "eve.json";
const HAS_KEY: &str = "has-key";
const NOT_HAS_KEY: &str = "not-has-key";

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub checks: Vec<CheckConfig>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CheckConfig {
    pub filter: Option<FilterConfig>,

    #[serde(default, deserialize_with = "deserialize_stats")]
    pub stats: Option<StatsCheck>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FilterConfig {
    pub count: u64,
    pub comment: Option<String>,
    pub filename: Option<PathBuf>,

    #[serde(rename = "match", default, deserialize_with = "deserialize_predicate")]
    pub predicate: Predicate,
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to read config file: {0}")]
    IO(std::io::Error),

    #[error("failed to parse config file: {0}")]
    Parse(serde_yml::Error),

    #[error("{0}")]
    Check(check_engine::ParseError),

    #[error("check {0:?} has no expected count, append `| count == N`")]
    MissingCount(String),

    #[error("check #{0} is empty, expected `filter` or `stats`")]
    EmptyCheck(usize),
}

pub fn load(filename: &Path) -> Result<Config, Error> {
    let file = File::open(filename).map_err(Error::IO)?;
    serde_yml::from_reader(file).map_err(Error::Parse)
}

// Field path/value pairs in document order.
struct Pairs(Vec<(String, Json)>);

impl<'de> Deserialize<'de> for Pairs {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct PairsVisitor;

        impl<'de> Visitor<'de> for PairsVisitor {
            type Value = Pairs;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a mapping of field paths to values")
            }

            fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut pairs = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some(entry) = map.next_entry::<String, Json>()? {
                    pairs.push(entry);
                }
                Ok(Pairs(pairs))
            }

            fn visit_unit<E>(self) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(Pairs(Vec::new()))
            }
        }

        deserializer.deserialize_any(PairsVisitor)
    }
}

fn deserialize_predicate<'de, D>(deserializer: D) -> Result<Predicate, D::Error>
where
    D: Deserializer<'de>,
{
    let Pairs(pairs) = Pairs::deserialize(deserializer)?;
    let mut predicate = Predicate::new();
    for (key, value) in pairs {
        match key.as_str() {
            HAS_KEY => {
                for path in key_paths(&key, value).map_err(de::Error::custom)? {
                    predicate.push(Constraint::HasKey(path));
                }
            }
            NOT_HAS_KEY => {
                for path in key_paths(&key, value).map_err(de::Error::custom)? {
                    predicate.push(Constraint::NotHasKey(path));
                }
            }
            _ => predicate.push(Constraint::Equals {
                path: FieldPath::parse(&key),
                value,
            }),
        }
    }

    Ok(predicate)
}

fn deserialize_stats<'de, D>(deserializer: D) -> Result<Option<StatsCheck>, D::Error>
where
    D: Deserializer<'de>,
{
    let Pairs(pairs) = Pairs::deserialize(deserializer)?;
    if pairs.is_empty() {
        return Err(de::Error::custom(
            "stats check lists no counters, expected `path: value` entries",
        ));
    }
    let check = pairs
        .into_iter()
        .fold(StatsCheck::new(), |check, (path, value)| {
            check.expect(path, value)
        });

    Ok(Some(check))
}

fn key_paths(key: &str, value: Json) -> Result<Vec<FieldPath>, String> {
    match value {
        Json::String(path) => Ok(vec![FieldPath::parse(&path)]),
        Json::Array(paths) => paths
            .into_iter()
            .map(|p| match p {
                Json::String(path) => Ok(FieldPath::parse(&path)),
                other => Err(format!("{}: expected a field path, found {}", key, other)),
            })
            .collect(),
        other => Err(format!(
            "{}: expected a field path or a list of field paths, found {}",
            key, other
        )),
    }
}
