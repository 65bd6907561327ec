use futures_util::StreamExt;
use rowmap_query::{positional, Dialect};
use sqlx::{
    sqlite::{Sqlite, SqliteArguments, SqliteRow},
    Column, Connection as _, Either, Row as _, TypeInfo, ValueRef,
};
use std::sync::Arc;
use tokio::runtime::{Builder, Runtime};

use crate::{
    command::{Command, CommandKind, Executed, Outputs},
    connection::{BufferedReader, Connection, Provider, Reader, Step},
    error::{DriverError, Result},
    row::Row,
    value::Value,
};

type Query<'q> = sqlx::query::Query<'q, Sqlite, SqliteArguments<'q>>;

/// Opens [`SqliteConnection`]s for one database url.
#[derive(Debug, Clone)]
pub struct SqliteProvider {
    url: String,
}

impl SqliteProvider {
    pub fn new<U: Into<String>>(url: U) -> Self {
        Self { url: url.into() }
    }

    /// Private in-memory database per connection.
    pub fn memory() -> Self {
        Self::new("sqlite::memory:")
    }
}

impl Provider for SqliteProvider {
    type Connection = SqliteConnection;

    fn connect(&self) -> Result<SqliteConnection> {
        SqliteConnection::connect(&self.url)
    }
}

/// Blocking SQLite connection backed by sqlx.
///
/// Each connection owns a current-thread runtime and blocks on it for every
/// command. `@name` placeholders are rewritten to positional `?N` before the
/// statement reaches SQLite. SQLite has neither stored procedures nor output
/// parameters; commands using them fail with [`DriverError::Unsupported`].
pub struct SqliteConnection {
    runtime: Runtime,
    conn: sqlx::SqliteConnection,
}

impl SqliteConnection {
    pub fn connect(url: &str) -> Result<Self> {
        let runtime = Builder::new_current_thread().enable_all().build()?;
        let conn = runtime.block_on(sqlx::SqliteConnection::connect(url))?;

        tracing::debug!(url, "sqlite connection opened");

        Ok(Self { runtime, conn })
    }

    fn prepare(command: &Command) -> Result<String> {
        if command.kind == CommandKind::StoredProcedure {
            return Err(DriverError::Unsupported("stored procedures".to_owned()));
        }

        if let Some(parameter) = command.outputs().next() {
            return Err(DriverError::Unsupported(format!(
                "output parameter `{}`",
                parameter.name
            )));
        }

        let names = command
            .parameters
            .iter()
            .map(|parameter| parameter.name.as_str())
            .collect::<Vec<_>>();

        Ok(positional(&command.sql, &names)?)
    }
}

impl Connection for SqliteConnection {
    fn dialect(&self) -> Dialect {
        Dialect::Sqlite
    }

    fn execute(&mut self, command: &Command) -> Result<Executed> {
        let sql = Self::prepare(command)?;
        let query = bind_all(sqlx::query(&sql), command);

        let Self { runtime, conn } = self;
        let result = runtime.block_on(query.execute(&mut *conn))?;

        Ok(Executed {
            affected_rows: result.rows_affected(),
            outputs: Outputs::new(),
        })
    }

    fn query(&mut self, command: &Command) -> Result<Box<dyn Reader + '_>> {
        let sql = Self::prepare(command)?;
        let query = bind_all(sqlx::query(&sql), command);

        let Self { runtime, conn } = self;
        let steps = runtime.block_on(async move {
            let mut steps = Vec::new();
            let mut columns = None;

            #[allow(deprecated)]
            let mut stream = query.fetch_many(&mut *conn);

            while let Some(item) = stream.next().await {
                match item {
                    // Statements that returned no rows never opened a result set.
                    Ok(Either::Left(_)) => {
                        if columns.take().is_some() {
                            steps.push(Step::EndOfResult);
                        }
                    }
                    Ok(Either::Right(row)) => match decode_row(&row, &mut columns) {
                        Ok(row) => steps.push(Step::Row(row)),
                        Err(err) => {
                            steps.push(Step::Error(err));
                            break;
                        }
                    },
                    Err(err) => {
                        steps.push(Step::Error(err.into()));
                        break;
                    }
                }
            }

            steps
        });

        Ok(Box::new(BufferedReader::new(steps, Outputs::new())))
    }
}

fn bind_all<'q>(query: Query<'q>, command: &Command) -> Query<'q> {
    command
        .parameters
        .iter()
        .fold(query, |query, parameter| bind(query, &parameter.value))
}

fn bind<'q>(query: Query<'q>, value: &Value) -> Query<'q> {
    match value.clone() {
        Value::Null => query.bind(None::<String>),
        Value::Bool(v) => query.bind(v),
        Value::Int(v) => query.bind(v),
        Value::Float(v) => query.bind(v),
        // SQLite has no decimal storage class; text keeps every digit.
        Value::Decimal(v) => query.bind(v.to_string()),
        Value::Text(v) => query.bind(v),
        Value::Bytes(v) => query.bind(v),
        Value::Date(v) => query.bind(v),
        Value::Time(v) => query.bind(v),
        Value::DateTime(v) => query.bind(v),
        Value::Uuid(v) => query.bind(v),
    }
}

fn decode_row(row: &SqliteRow, columns: &mut Option<Arc<[String]>>) -> Result<Row> {
    let columns = columns
        .get_or_insert_with(|| {
            row.columns()
                .iter()
                .map(|column| column.name().to_owned())
                .collect()
        })
        .clone();

    let values = (0..row.len())
        .map(|index| decode_value(row, index))
        .collect::<Result<Vec<_>>>()?;

    Ok(Row::new(columns, values))
}

// Values are decoded by their storage class, not the declared column type:
// expression columns such as `select 'a' name` have no declared type.
fn decode_value(row: &SqliteRow, index: usize) -> Result<Value> {
    let raw = row.try_get_raw(index)?;

    if raw.is_null() {
        return Ok(Value::Null);
    }

    let type_info = raw.type_info();

    let value = match type_info.name() {
        "INTEGER" => Value::Int(row.try_get(index)?),
        "REAL" => Value::Float(row.try_get(index)?),
        "BLOB" => Value::Bytes(row.try_get(index)?),
        _ => Value::Text(row.try_get(index)?),
    };

    Ok(value)
}
