//! Configuration constants and defaults for the mapper.

/// Suffix marking an args field as an output parameter.
///
/// `value2__out` binds as the output parameter `@value2`.
pub const OUTPUT_SUFFIX: &str = "__out";

/// Suffix marking an args field as an input/output parameter.
pub const INPUT_OUTPUT_SUFFIX: &str = "__inout";

/// Size given to variable-length output parameters inferred from a suffix.
///
/// Matches the largest non-max `nvarchar` length of SQL Server.
pub const CONVENTION_OUTPUT_SIZE: usize = 4000;

/// Deepest nesting of event firing allowed on one thread.
///
/// A handler that runs a command without `no_event` fires events again;
/// past this depth the command fails with [`Error::EventRecursion`](crate::Error::EventRecursion).
pub const MAX_EVENT_DEPTH: usize = 16;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapperConfig {
    pub output_suffix: String,

    pub input_output_suffix: String,

    /// Size of unannotated variable-length outputs; `None` makes them a
    /// binding error.
    pub convention_output_size: Option<usize>,

    /// Treat errors raised after a fully consumed result set as
    /// informational and keep the rows.
    pub tolerate_trailing_errors: bool,

    pub max_event_depth: usize,
}

impl Default for MapperConfig {
    fn default() -> Self {
        Self {
            output_suffix: OUTPUT_SUFFIX.to_owned(),
            input_output_suffix: INPUT_OUTPUT_SUFFIX.to_owned(),
            convention_output_size: Some(CONVENTION_OUTPUT_SIZE),
            tolerate_trailing_errors: true,
            max_event_depth: MAX_EVENT_DEPTH,
        }
    }
}

/// Builds a [`MapperConfig`], starting from the defaults.
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    config: MapperConfig,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn output_suffix<S: Into<String>>(mut self, suffix: S) -> Self {
        self.config.output_suffix = suffix.into();
        self
    }

    pub fn input_output_suffix<S: Into<String>>(mut self, suffix: S) -> Self {
        self.config.input_output_suffix = suffix.into();
        self
    }

    pub fn convention_output_size(mut self, size: Option<usize>) -> Self {
        self.config.convention_output_size = size;
        self
    }

    pub fn tolerate_trailing_errors(mut self, tolerate: bool) -> Self {
        self.config.tolerate_trailing_errors = tolerate;
        self
    }

    pub fn max_event_depth(mut self, depth: usize) -> Self {
        self.config.max_event_depth = depth;
        self
    }

    pub fn build(self) -> MapperConfig {
        self.config
    }
}
