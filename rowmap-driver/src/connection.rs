use rowmap_query::Dialect;
use std::collections::VecDeque;

use crate::{
    command::{Command, Executed, Outputs},
    error::{DriverError, Result},
    row::Row,
};

/// Forward-only cursor over the result sets of one command.
///
/// Dropping a reader releases it; [`Reader::close`] additionally hands back
/// the final values of output parameters, which drivers only know once every
/// result set has been consumed.
pub trait Reader {
    /// Next row of the current result set, `None` once it is exhausted.
    fn next_row(&mut self) -> Result<Option<Row>>;

    /// Moves past the current result set. Returns `true` when another result
    /// set follows. Errors the server raised after the current result set are
    /// reported here.
    fn next_result(&mut self) -> Result<bool>;

    fn close(self: Box<Self>) -> Result<Outputs>;
}

/// An open connection able to run commands one at a time.
pub trait Connection {
    fn dialect(&self) -> Dialect;

    /// Runs a command that returns no rows.
    fn execute(&mut self, command: &Command) -> Result<Executed>;

    /// Runs a command and opens a reader over its result sets.
    fn query(&mut self, command: &Command) -> Result<Box<dyn Reader + '_>>;
}

impl<C: Connection + ?Sized> Connection for &mut C {
    fn dialect(&self) -> Dialect {
        (**self).dialect()
    }

    fn execute(&mut self, command: &Command) -> Result<Executed> {
        (**self).execute(command)
    }

    fn query(&mut self, command: &Command) -> Result<Box<dyn Reader + '_>> {
        (**self).query(command)
    }
}

impl<C: Connection + ?Sized> Connection for Box<C> {
    fn dialect(&self) -> Dialect {
        (**self).dialect()
    }

    fn execute(&mut self, command: &Command) -> Result<Executed> {
        (**self).execute(command)
    }

    fn query(&mut self, command: &Command) -> Result<Box<dyn Reader + '_>> {
        (**self).query(command)
    }
}

/// Factory of connections for one database.
pub trait Provider {
    type Connection: Connection;

    fn connect(&self) -> Result<Self::Connection>;
}

/// One event of a buffered result stream.
#[derive(Debug)]
pub enum Step {
    Row(Row),
    /// The current result set is complete.
    EndOfResult,
    Error(DriverError),
}

/// Reader over result sets a driver has already received in full.
#[derive(Debug, Default)]
pub struct BufferedReader {
    steps: VecDeque<Step>,
    outputs: Outputs,
}

impl BufferedReader {
    pub fn new<I: IntoIterator<Item = Step>>(steps: I, outputs: Outputs) -> Self {
        Self {
            steps: steps.into_iter().collect(),
            outputs,
        }
    }
}

impl Reader for BufferedReader {
    fn next_row(&mut self) -> Result<Option<Row>> {
        match self.steps.pop_front() {
            Some(Step::Row(row)) => Ok(Some(row)),
            Some(Step::Error(err)) => Err(err),
            Some(Step::EndOfResult) => {
                self.steps.push_front(Step::EndOfResult);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    fn next_result(&mut self) -> Result<bool> {
        loop {
            match self.steps.pop_front() {
                Some(Step::Row(_)) => continue,
                Some(Step::EndOfResult) => break,
                Some(Step::Error(err)) => return Err(err),
                None => return Ok(false),
            }
        }

        match self.steps.front() {
            None => Ok(false),
            Some(Step::Error(_)) => match self.steps.pop_front() {
                Some(Step::Error(err)) => Err(err),
                _ => Ok(false),
            },
            Some(_) => Ok(true),
        }
    }

    fn close(self: Box<Self>) -> Result<Outputs> {
        Ok(self.outputs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;
    use std::sync::Arc;

    fn row(v: i64) -> Step {
        Step::Row(Row::new(Arc::from(vec!["v".to_owned()]), vec![Value::Int(v)]))
    }

    #[test]
    fn walks_result_sets() {
        let mut reader = BufferedReader::new(
            vec![row(1), row(2), Step::EndOfResult, row(3), Step::EndOfResult],
            Outputs::default(),
        );

        assert!(reader.next_row().unwrap().is_some());
        assert!(reader.next_row().unwrap().is_some());
        assert!(reader.next_row().unwrap().is_none());
        assert!(reader.next_row().unwrap().is_none());
        assert!(reader.next_result().unwrap());
        assert_eq!(
            reader.next_row().unwrap().map(Row::into_values),
            Some(vec![Value::Int(3)])
        );
        assert!(!reader.next_result().unwrap());
    }

    #[test]
    fn next_result_skips_unread_rows() {
        let mut reader = BufferedReader::new(
            vec![row(1), row(2), Step::EndOfResult, row(3), Step::EndOfResult],
            Outputs::default(),
        );

        assert!(reader.next_result().unwrap());
        assert_eq!(
            reader.next_row().unwrap().map(Row::into_values),
            Some(vec![Value::Int(3)])
        );
    }

    #[test]
    fn trailing_error_surfaces_on_next_result() {
        let mut reader = BufferedReader::new(
            vec![
                row(1),
                Step::EndOfResult,
                Step::Error(DriverError::Database("after select".to_owned())),
            ],
            Outputs::default(),
        );

        assert!(reader.next_row().unwrap().is_some());
        assert!(reader.next_row().unwrap().is_none());
        assert!(matches!(reader.next_result(), Err(DriverError::Database(_))));
    }

    #[test]
    fn leading_error_surfaces_on_next_row() {
        let mut reader = BufferedReader::new(
            vec![Step::Error(DriverError::Database("before select".to_owned()))],
            Outputs::default(),
        );

        assert!(reader.next_row().is_err());
    }
}
