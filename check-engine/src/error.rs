use std::fmt;
use std::io;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to read log {path:?}: {source}")]
    Load { path: PathBuf, source: io::Error },

    #[error("malformed log {path:?}: bad record on line(s) {lines}: {reason}")]
    MalformedLog {
        path: PathBuf,
        lines: LineNumbers,
        reason: String,
    },

    #[error("value cannot be used in a predicate: {0}")]
    InvalidLiteral(String),
}

impl Error {
    /// Short category name used to tell fatal errors apart in reports.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Load { .. } => "load error",
            Self::MalformedLog { .. } => "malformed log",
            Self::InvalidLiteral(_) => "invalid predicate",
        }
    }
}

/// 1-based line numbers of undecodable log lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineNumbers(pub Vec<usize>);

impl fmt::Display for LineNumbers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, line) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", line)?;
        }
        Ok(())
    }
}
