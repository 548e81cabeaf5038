use thiserror::Error;

/// Failures raised by the numeric coercion engine.
///
/// Decimal overflow is not represented here: the engine recovers it
/// transparently by re-running the operation in double precision.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum NumericError {
    #[error("integer arithmetic overflow")]
    Overflow,
    #[error("integer division by zero")]
    DivisionByZero,
    #[error("not a number: {0}")]
    NonNumeric(String),
}

/// Failures raised by an individual filter call.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FilterError {
    /// A required, non-defaultable argument is missing or empty.
    #[error("argument error: {0}")]
    Argument(String),
    #[error("numeric error: {0}")]
    Numeric(#[from] NumericError),
    /// Invalid encoded input, named after the offending filter.
    #[error("invalid base64 provided to {filter}")]
    MalformedEncoding { filter: String },
    /// No filter registered under this name at the active compatibility level.
    #[error("unknown filter: {name}")]
    UnknownFilter { name: String },
}

/// Crate-wide error type.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("filter error: {0}")]
    Filter(#[from] FilterError),
    /// The render deadline elapsed; evaluation must stop.
    #[error("render timeout exceeded")]
    Timeout,
    #[error("internal error: {0}")]
    Internal(String),
}

pub type FilterResult<T> = Result<T, FilterError>;
pub type RenderResult<T> = Result<T, Error>;

impl Error {
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Error::Internal(message.into())
    }
}
