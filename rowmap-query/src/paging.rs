use serde::{Deserialize, Serialize};

use crate::{
    dialect::Dialect,
    scan::{Scanner, TokenKind},
};

/// Offset/limit window over a result set.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub offset: Option<u64>,
    pub limit: Option<u64>,
}

impl Page {
    pub fn new(offset: Option<u64>, limit: Option<u64>) -> Self {
        Self { offset, limit }
    }

    /// `true` when the window selects every row; `offset = 0` with no limit
    /// counts as unpaged.
    pub fn is_none(&self) -> bool {
        self.offset.unwrap_or(0) == 0 && self.limit.is_none()
    }

    /// Whether the row at `index` (zero based) falls inside the window.
    pub fn contains(&self, index: u64) -> bool {
        let offset = self.offset.unwrap_or(0);

        index >= offset
            && self
                .limit
                .map_or(true, |limit| index - offset < limit)
    }
}

/// Rewrites `sql` so it only returns rows `[offset, offset + limit)`.
///
/// A statement that carries its own top-level `ORDER BY` and no row-limiting
/// clause gets the dialect's clause appended, keeping its ordering. Any other
/// statement is wrapped in a derived table.
///
/// ```rust
/// use rowmap_query::{apply_paging, Dialect};
///
/// assert_eq!(
///     apply_paging("select name from users order by name;", Dialect::Postgres, Some(20), Some(10)),
///     "select name from users order by name LIMIT 10 OFFSET 20"
/// );
/// assert_eq!(apply_paging("select 1", Dialect::Sqlite, None, None), "select 1");
/// ```
pub fn apply_paging(sql: &str, dialect: Dialect, offset: Option<u64>, limit: Option<u64>) -> String {
    let page = Page::new(offset, limit);

    if page.is_none() {
        return sql.to_owned();
    }

    let statement = trim_statement(sql);
    let offset = offset.unwrap_or(0);
    let shape = Shape::of(statement);

    if shape.ordered && !shape.limited {
        format!("{statement} {}", dialect.limit_clause(offset, limit))
    } else {
        dialect.wrap(statement, offset, limit)
    }
}

fn trim_statement(sql: &str) -> &str {
    let mut statement = sql.trim_end();

    while let Some(rest) = statement.strip_suffix(';') {
        statement = rest.trim_end();
    }

    // A trailing line comment would swallow anything appended after it.
    match Scanner::new(statement).last() {
        Some(token) if token.kind == TokenKind::Comment && token.text.starts_with("--") => {
            trim_statement(&statement[..token.start])
        }
        _ => statement,
    }
}

#[derive(Debug, Default)]
struct Shape {
    ordered: bool,
    limited: bool,
}

impl Shape {
    fn of(sql: &str) -> Self {
        let mut shape = Shape::default();
        let mut previous_order = false;

        for token in Scanner::new(sql).filter(|t| t.depth == 0 && t.kind != TokenKind::Comment) {
            if previous_order && token.is_keyword("by") {
                shape.ordered = true;
            }

            previous_order = token.is_keyword("order");

            if ["limit", "offset", "fetch", "top"]
                .iter()
                .any(|keyword| token.is_keyword(keyword))
            {
                shape.limited = true;
            }
        }

        shape
    }
}
