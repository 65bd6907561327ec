use rowmap_query::{positional, QueryError};

#[test]
fn commented_placeholders_are_left_alone() {
    let sql = positional(
        "insert into ##DBLog (Sql, Rows) values (@Sql, @Rows) -- @Skip",
        &["Rows", "Sql"],
    )
    .unwrap();

    assert_eq!(sql, "insert into ##DBLog (Sql, Rows) values (?2, ?1) -- @Skip");
}

#[test]
fn rewrites_named_to_positional() {
    let sql = positional("select @value1 where '@value1' <> @Value2", &["value2", "value1"]).unwrap();

    assert_eq!(sql, "select ?2 where '@value1' <> ?1");
}

#[test]
fn keeps_globals() {
    let sql = positional("select @@version, @a", &["a"]).unwrap();

    assert_eq!(sql, "select @@version, ?1");
}

#[test]
fn unknown_placeholder_fails() {
    assert_eq!(
        positional("select @nope", &[]),
        Err(QueryError::UnknownParameter("nope".to_owned()))
    );
}
