/// Error type representing failures while rewriting SQL text.
///
/// # Example
///
/// ```rust
/// use rowmap_query::{positional, QueryError};
///
/// let err = positional("select @missing", &["name"]).unwrap_err();
/// assert!(matches!(err, QueryError::UnknownParameter(name) if name == "missing"));
/// ```
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    /// A placeholder references a parameter that was never bound.
    #[error("placeholder `@{0}` has no bound parameter")]
    UnknownParameter(String),
}
