use serde::{Deserialize, Serialize};
use std::fmt;

/// SQL flavour spoken by a connection.
///
/// The dialect only drives the row-limiting syntax produced by
/// [`apply_paging`](crate::apply_paging); everything else is passed to the
/// driver untouched.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dialect {
    /// SQL:2008 `OFFSET … ROWS FETCH NEXT … ROWS ONLY`.
    #[default]
    Ansi,
    SqlServer,
    Postgres,
    Sqlite,
    MySql,
}

impl Dialect {
    /// Row-limiting clause appended to an ordered statement.
    pub fn limit_clause(&self, offset: u64, limit: Option<u64>) -> String {
        match self {
            Dialect::Ansi | Dialect::SqlServer => match limit {
                Some(limit) => format!("OFFSET {offset} ROWS FETCH NEXT {limit} ROWS ONLY"),
                None => format!("OFFSET {offset} ROWS"),
            },
            Dialect::Postgres => match limit {
                Some(limit) => format!("LIMIT {limit} OFFSET {offset}"),
                None => format!("LIMIT ALL OFFSET {offset}"),
            },
            Dialect::Sqlite => format!(
                "LIMIT {} OFFSET {}",
                limit.map_or(-1, clamp),
                clamp(offset)
            ),
            Dialect::MySql => format!("LIMIT {offset}, {}", limit.unwrap_or(u64::MAX)),
        }
    }

    /// Wraps an unordered statement in a derived table before limiting it.
    pub fn wrap(&self, sql: &str, offset: u64, limit: Option<u64>) -> String {
        let clause = self.limit_clause(offset, limit);

        match self {
            // OFFSET requires ORDER BY; ordering by a constant keeps the
            // order the engine produces for the inner statement.
            Dialect::SqlServer => {
                format!("SELECT * FROM ({sql}) AS rowmap_page ORDER BY (SELECT NULL) {clause}")
            }
            _ => format!("SELECT * FROM ({sql}) AS rowmap_page {clause}"),
        }
    }
}

/// SQLite reads row counts as signed 64-bit integers.
fn clamp(count: u64) -> i64 {
    i64::try_from(count).unwrap_or(i64::MAX)
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Dialect::Ansi => "ansi",
            Dialect::SqlServer => "sqlserver",
            Dialect::Postgres => "postgres",
            Dialect::Sqlite => "sqlite",
            Dialect::MySql => "mysql",
        };

        f.write_str(name)
    }
}
