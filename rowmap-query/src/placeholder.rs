use crate::{
    error::QueryError,
    scan::{Scanner, TokenKind},
};

/// Rewrites `@name` placeholders into `?N`, where `N` is the one-based
/// position of `name` in `names` (compared case-insensitively).
///
/// ```rust
/// use rowmap_query::positional;
///
/// let sql = positional("select @b, @a, @B", &["a", "b"]).unwrap();
/// assert_eq!(sql, "select ?2, ?1, ?2");
/// ```
pub fn positional(sql: &str, names: &[&str]) -> Result<String, QueryError> {
    let mut rewritten = String::with_capacity(sql.len());
    let mut copied = 0;

    for token in Scanner::new(sql).filter(|token| token.kind == TokenKind::Placeholder) {
        let index = names
            .iter()
            .position(|name| name.eq_ignore_ascii_case(token.text))
            .ok_or_else(|| QueryError::UnknownParameter(token.text.to_owned()))?;

        rewritten.push_str(&sql[copied..token.start]);
        rewritten.push_str(&format!("?{}", index + 1));
        copied = token.end;
    }

    rewritten.push_str(&sql[copied..]);

    Ok(rewritten)
}
