use derive_more::Display;

pub type Result<T> = core::result::Result<T, GraphError>;

/// Configuration errors. Once a configuration is accepted, ticking a grid cannot fail.
#[derive(Debug, Display, Clone, PartialEq, Eq)]
pub enum GraphError {
    /// Resolution outside `MIN_RESOLUTION..=MAX_RESOLUTION`.
    #[display("invalid resolution {_0}")]
    InvalidResolution(u32),
    /// Resolution text that is not a non-negative integer.
    #[display("resolution {_0:?} is not a number")]
    MalformedResolution(String),
    /// Text that does not name a catalog function.
    #[display("unknown graph function {_0:?}")]
    UnknownFunction(String),
    /// Text that does not name a dimension.
    #[display("unknown dimension {_0:?}")]
    UnknownDimension(String),
}

impl std::error::Error for GraphError {}
