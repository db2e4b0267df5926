#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("unexpected input at offset {offset}: {remaining:?}")]
    Syntax { offset: usize, remaining: String },

    #[error("incomplete query")]
    Incomplete,
}

const CONTEXT_CHARS: usize = 24;

impl Error {
    pub(crate) fn from_nom(query: &str, error: nom::Err<nom::error::Error<&str>>) -> Self {
        match error {
            nom::Err::Error(e) | nom::Err::Failure(e) => Self::Syntax {
                offset: query.len() - e.input.len(),
                remaining: e.input.chars().take(CONTEXT_CHARS).collect(),
            },
            nom::Err::Incomplete(_) => Self::Incomplete,
        }
    }
}
