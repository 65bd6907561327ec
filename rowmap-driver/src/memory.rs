use parking_lot::RwLock;
use rowmap_query::Dialect;
use std::{collections::HashMap, fmt, sync::Arc};

use crate::{
    command::{Command, Executed, Outputs},
    connection::{BufferedReader, Connection, Provider, Reader, Step},
    error::{DriverError, Result},
    row::Row,
    value::Value,
};

/// Produces the scripted response of one statement.
pub type Handler = Arc<dyn Fn(&Command) -> Script + Send + Sync>;

/// Rows of one scripted result set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultSet {
    columns: Arc<[String]>,
    rows: Vec<Vec<Value>>,
}

impl ResultSet {
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::<String>::into).collect(),
            rows: Vec::new(),
        }
    }

    pub fn row<I, V>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.rows
            .push(values.into_iter().map(Into::<Value>::into).collect());
        self
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn steps(&self) -> impl Iterator<Item = Step> + '_ {
        self.rows
            .iter()
            .map(|values| Step::Row(Row::new(self.columns.clone(), values.clone())))
    }
}

/// Scripted response of the memory driver to one command.
///
/// Errors can be raised at three points: before any result set, during the
/// last result set (after its rows, before it completes) and after the last
/// result set has completed.
#[derive(Debug, Clone, Default)]
pub struct Script {
    result_sets: Vec<ResultSet>,
    affected_rows: Option<u64>,
    outputs: Outputs,
    fail_before: Option<String>,
    fail_during: Option<String>,
    fail_after: Option<String>,
}

impl Script {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn result_set(mut self, result_set: ResultSet) -> Self {
        self.result_sets.push(result_set);
        self
    }

    /// Rows reported by a non-query; defaults to the number of scripted rows.
    pub fn affected_rows(mut self, rows: u64) -> Self {
        self.affected_rows = Some(rows);
        self
    }

    pub fn output<N: Into<String>, V: Into<Value>>(mut self, name: N, value: V) -> Self {
        self.outputs.insert(name, value);
        self
    }

    pub fn fail_before<M: Into<String>>(mut self, message: M) -> Self {
        self.fail_before = Some(message.into());
        self
    }

    pub fn fail_during<M: Into<String>>(mut self, message: M) -> Self {
        self.fail_during = Some(message.into());
        self
    }

    pub fn fail_after<M: Into<String>>(mut self, message: M) -> Self {
        self.fail_after = Some(message.into());
        self
    }

    fn steps(&self) -> Vec<Step> {
        let mut steps = Vec::new();
        let last = self.result_sets.len().saturating_sub(1);

        for (index, result_set) in self.result_sets.iter().enumerate() {
            steps.extend(result_set.steps());

            if index == last {
                if let Some(message) = &self.fail_during {
                    steps.push(Step::Error(DriverError::Database(message.to_owned())));
                    return steps;
                }
            }

            steps.push(Step::EndOfResult);
        }

        if let Some(message) = &self.fail_during {
            if self.result_sets.is_empty() {
                steps.push(Step::Error(DriverError::Database(message.to_owned())));
                return steps;
            }
        }

        if let Some(message) = &self.fail_after {
            steps.push(Step::Error(DriverError::Database(message.to_owned())));
        }

        steps
    }
}

#[derive(Default)]
struct State {
    scripts: HashMap<String, Handler>,
    fallback: Option<Handler>,
    history: Vec<Command>,
}

/// In-memory driver answering commands from scripts registered by SQL text.
///
/// Clones share scripts and history, so a test can keep one handle for
/// assertions while connections run commands.
#[derive(Clone, Default)]
pub struct MemoryDriver {
    state: Arc<RwLock<State>>,
    dialect: Dialect,
}

impl fmt::Debug for MemoryDriver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.read();

        f.debug_struct("MemoryDriver")
            .field("dialect", &self.dialect)
            .field("scripts", &state.scripts.keys().collect::<Vec<_>>())
            .field("history", &state.history.len())
            .finish()
    }
}

impl MemoryDriver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_dialect(dialect: Dialect) -> Self {
        Self {
            dialect,
            ..Self::default()
        }
    }

    /// Answers commands whose SQL text is exactly `sql`.
    pub fn script<S, F>(&self, sql: S, handler: F) -> &Self
    where
        S: Into<String>,
        F: Fn(&Command) -> Script + Send + Sync + 'static,
    {
        self.state
            .write()
            .scripts
            .insert(sql.into(), Arc::new(handler));

        self
    }

    /// Answers every command without a script of its own.
    pub fn fallback<F>(&self, handler: F) -> &Self
    where
        F: Fn(&Command) -> Script + Send + Sync + 'static,
    {
        self.state.write().fallback = Some(Arc::new(handler));
        self
    }

    /// Commands received so far, oldest first.
    pub fn history(&self) -> Vec<Command> {
        self.state.read().history.clone()
    }

    pub fn connection(&self) -> MemoryConnection {
        MemoryConnection {
            driver: self.clone(),
        }
    }

    fn run(&self, command: &Command) -> Result<Script> {
        let handler = {
            let mut state = self.state.write();
            state.history.push(command.clone());

            state
                .scripts
                .get(&command.sql)
                .or(state.fallback.as_ref())
                .cloned()
        };

        // Handlers run without the lock so they may inspect the driver.
        let handler = handler.ok_or_else(|| {
            DriverError::Database(format!("no script for statement `{}`", command.sql))
        })?;

        let script = handler(command);

        if let Some(message) = &script.fail_before {
            return Err(DriverError::Database(message.to_owned()));
        }

        Ok(script)
    }
}

impl Provider for MemoryDriver {
    type Connection = MemoryConnection;

    fn connect(&self) -> Result<MemoryConnection> {
        Ok(self.connection())
    }
}

#[derive(Debug, Clone)]
pub struct MemoryConnection {
    driver: MemoryDriver,
}

impl Connection for MemoryConnection {
    fn dialect(&self) -> Dialect {
        self.driver.dialect
    }

    fn execute(&mut self, command: &Command) -> Result<Executed> {
        let script = self.driver.run(command)?;

        if let Some(message) = script.fail_during.as_ref().or(script.fail_after.as_ref()) {
            return Err(DriverError::Database(message.to_owned()));
        }

        let affected_rows = script.affected_rows.unwrap_or_else(|| {
            script
                .result_sets
                .iter()
                .map(|result_set| result_set.len() as u64)
                .sum()
        });

        Ok(Executed {
            affected_rows,
            outputs: script.outputs,
        })
    }

    fn query(&mut self, command: &Command) -> Result<Box<dyn Reader + '_>> {
        let script = self.driver.run(command)?;
        let steps = script.steps();

        Ok(Box::new(BufferedReader::new(steps, script.outputs)))
    }
}
