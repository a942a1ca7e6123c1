use thiserror::Error;

#[derive(Error, Debug)]
pub enum QueryError {
    #[error("Invalid field name: {0}")]
    InvalidField(String),

    #[error("Unsupported comparator: {0}")]
    UnsupportedComparator(String),

    #[error("Malformed query parameter: {0}")]
    MalformedParameter(String),
}
