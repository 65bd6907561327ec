use rowmap_query::{apply_paging, Dialect, Page};

const VALUES: &str = "select Age from ( values (1),(2),(3),(4),(5),(6),(7) ) as tmp (Age)";

#[test]
fn unpaged_statement_is_untouched() {
    for dialect in [Dialect::Ansi, Dialect::SqlServer, Dialect::Postgres, Dialect::Sqlite, Dialect::MySql] {
        assert_eq!(apply_paging(VALUES, dialect, None, None), VALUES);
        assert_eq!(apply_paging(VALUES, dialect, Some(0), None), VALUES);
    }
}

#[test]
fn sqlserver_wraps_unordered_statement() {
    assert_eq!(
        apply_paging(VALUES, Dialect::SqlServer, Some(2), Some(2)),
        format!("SELECT * FROM ({VALUES}) AS rowmap_page ORDER BY (SELECT NULL) OFFSET 2 ROWS FETCH NEXT 2 ROWS ONLY")
    );
}

#[test]
fn sqlserver_appends_to_ordered_statement() {
    assert_eq!(
        apply_paging("select Name from People order by Name desc;", Dialect::SqlServer, Some(10), Some(5)),
        "select Name from People order by Name desc OFFSET 10 ROWS FETCH NEXT 5 ROWS ONLY"
    );
}

#[test]
fn limit_without_offset() {
    assert_eq!(
        apply_paging("select 1", Dialect::Sqlite, None, Some(0)),
        "SELECT * FROM (select 1) AS rowmap_page LIMIT 0 OFFSET 0"
    );
    assert_eq!(
        apply_paging("select a from t order by a", Dialect::Ansi, None, Some(3)),
        "select a from t order by a OFFSET 0 ROWS FETCH NEXT 3 ROWS ONLY"
    );
}

#[test]
fn offset_without_limit() {
    assert_eq!(
        apply_paging("select a from t order by a", Dialect::Postgres, Some(4), None),
        "select a from t order by a LIMIT ALL OFFSET 4"
    );
    assert_eq!(
        apply_paging("select a from t", Dialect::MySql, Some(4), None),
        format!("SELECT * FROM (select a from t) AS rowmap_page LIMIT 4, {}", u64::MAX)
    );
}

#[test]
fn already_limited_statement_is_wrapped() {
    assert_eq!(
        apply_paging("select a from t order by a limit 100", Dialect::Sqlite, Some(1), Some(1)),
        "SELECT * FROM (select a from t order by a limit 100) AS rowmap_page LIMIT 1 OFFSET 1"
    );
}

#[test]
fn keywords_in_literals_and_subqueries_do_not_count() {
    assert_eq!(
        apply_paging("select 'order by' x from (select x from t order by x) s", Dialect::Postgres, Some(1), Some(1)),
        "SELECT * FROM (select 'order by' x from (select x from t order by x) s) AS rowmap_page LIMIT 1 OFFSET 1"
    );
}

#[test]
fn trailing_comment_is_dropped() {
    assert_eq!(
        apply_paging("select a from t order by a -- newest first", Dialect::Sqlite, Some(1), Some(2)),
        "select a from t order by a LIMIT 2 OFFSET 1"
    );
}

#[test]
fn page_serializes() {
    let page = Page::new(Some(2), None);
    let json = serde_json::to_string(&page).unwrap();

    assert_eq!(json, r#"{"offset":2,"limit":null}"#);
    assert_eq!(serde_json::from_str::<Page>(&json).unwrap(), page);
}
