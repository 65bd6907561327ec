use rowmap_driver::{Row, Value};
use std::collections::HashMap;

use crate::convert::CoerceError;
use crate::error::{Error, Result};

/// A type rows are materialized into.
///
/// Usually derived with `#[derive(Record)]`. Materialization starts from
/// `Default` and assigns each column to the field it names; columns with no
/// matching field are ignored and fields with no matching column keep their
/// default.
pub trait Record: Default {
    /// Assigns `value` to the field named `column`, ignoring ASCII case.
    ///
    /// Returns `Ok(false)` when no field matches.
    fn set_column(&mut self, column: &str, value: Value) -> std::result::Result<bool, CoerceError>;
}

impl Record for HashMap<String, Value> {
    fn set_column(&mut self, column: &str, value: Value) -> std::result::Result<bool, CoerceError> {
        self.insert(column.to_owned(), value);

        Ok(true)
    }
}

/// Builds one record from a row.
pub fn materialize<T: Record>(row: Row) -> Result<T> {
    let (columns, values) = row.into_parts();
    let mut record = T::default();

    for (column, value) in columns.iter().zip(values) {
        record
            .set_column(column, value)
            .map_err(|source| Error::Materialization {
                column: column.to_owned(),
                source,
            })?;
    }

    Ok(record)
}
