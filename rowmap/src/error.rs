use rowmap_driver::DriverError;

use crate::convert::CoerceError;

/// Failure to turn an args value into command parameters.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BindError {
    #[error("parameter `{0}` is bound more than once")]
    Duplicate(String),

    #[error("field `{0}` does not name a parameter")]
    EmptyName(String),

    #[error("output parameter `{0}` has no declared type")]
    UntypedOutput(String),

    #[error("output parameter `{0}` is variable-length and has no size")]
    MissingSize(String),
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("binding: {0}")]
    Binding(#[from] BindError),

    #[error("column `{column}`: {source}")]
    Materialization {
        column: String,
        #[source]
        source: CoerceError,
    },

    #[error("output parameter `{parameter}`: {source}")]
    OutputParameter {
        parameter: String,
        #[source]
        source: CoerceError,
    },

    #[error("execution: {0}")]
    Execution(#[from] DriverError),

    /// Raised by an event subscriber; passed through untouched.
    #[error(transparent)]
    Subscriber(anyhow::Error),

    #[error("event handlers nested deeper than {0} levels")]
    EventRecursion(usize),
}

pub type Result<T> = std::result::Result<T, Error>;
