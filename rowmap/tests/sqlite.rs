mod common;

use chrono::{DateTime, NaiveDateTime, Utc};
use common::{datetime, Person};
use rowmap::{params, Args, CommandKind, DriverError, Error, Mapper, Record};
use rowmap_driver::{Provider, SqliteConnection, SqliteProvider};
use rust_decimal::Decimal;
use std::str::FromStr;
use uuid::Uuid;

const SEVEN_VALUES: &str =
    "select column1 as Age from (values (1), (2), (3), (4), (5), (6), (7))";

fn connect() -> SqliteConnection {
    SqliteProvider::memory().connect().unwrap()
}

#[derive(Debug, Default, PartialEq, Record)]
#[record(rename_all = "PascalCase")]
struct ValueTestResult {
    string: String,
    integer: i32,
    date_time: NaiveDateTime,
    decimal: Decimal,
    double: f64,
    guid: Uuid,
    missing: Option<String>,
}

#[derive(Debug, Args)]
struct ValueTestArgs {
    string: String,
    integer: i32,
    date_time: NaiveDateTime,
    decimal: Decimal,
    double: f64,
    guid: Uuid,
    missing: Option<String>,
}

#[test]
fn offset_and_limit_window_the_rows() {
    let rows = Mapper::new()
        .query::<Person>(CommandKind::Text, SEVEN_VALUES)
        .offset(2)
        .limit(2)
        .fetch_all(&mut connect())
        .unwrap();

    let ages: Vec<_> = rows.iter().map(|p| p.age).collect();
    assert_eq!(ages, [3, 4]);
}

#[test]
fn ordered_statement_keeps_its_order_when_paged() {
    let sql = format!("{SEVEN_VALUES} order by column1 desc");
    let rows = Mapper::new()
        .query::<Person>(CommandKind::Text, sql)
        .offset(1)
        .limit(3)
        .fetch_all(&mut connect())
        .unwrap();

    let ages: Vec<_> = rows.iter().map(|p| p.age).collect();
    assert_eq!(ages, [6, 5, 4]);
}

#[test]
fn offset_without_limit_and_zero_limit() {
    let mapper = Mapper::new();
    let mut conn = connect();

    let rows = mapper
        .query::<Person>(CommandKind::Text, SEVEN_VALUES)
        .offset(5)
        .fetch_all(&mut conn)
        .unwrap();
    assert_eq!(rows.len(), 2);

    let rows = mapper
        .query::<Person>(CommandKind::Text, SEVEN_VALUES)
        .limit(0)
        .fetch_all(&mut conn)
        .unwrap();
    assert!(rows.is_empty());
}

#[test]
fn values_round_trip() {
    let mut args = ValueTestArgs {
        string: "hello".to_owned(),
        integer: 42,
        date_time: datetime("2014-03-04 10:20:30"),
        decimal: Decimal::from_str("987654321.12345").unwrap(),
        double: 1.5,
        guid: Uuid::new_v4(),
        missing: None,
    };

    let rows = Mapper::new()
        .query::<ValueTestResult>(
            CommandKind::Text,
            "select @string as String, @integer as Integer, @date_time as DateTime, \
             @decimal as Decimal, @double as Double, @guid as Guid, @missing as Missing",
        )
        .args(&mut args)
        .fetch_all(&mut connect())
        .unwrap();

    assert_eq!(
        rows,
        vec![ValueTestResult {
            string: args.string.clone(),
            integer: args.integer,
            date_time: args.date_time,
            decimal: args.decimal,
            double: args.double,
            guid: args.guid,
            missing: None,
        }]
    );
}

#[test]
fn utc_timestamps_round_trip() {
    #[derive(Debug, Default, Record)]
    struct Stamp {
        at: Option<DateTime<Utc>>,
    }

    let at = DateTime::<Utc>::from_timestamp(1_393_928_430, 0).unwrap();
    let rows = Mapper::new()
        .query::<Stamp>(CommandKind::Text, "select @at as at")
        .args(&mut params! { "at" => at })
        .fetch_all(&mut connect())
        .unwrap();

    assert_eq!(rows[0].at, Some(at));
}

#[test]
fn non_query_then_query() {
    let mapper = Mapper::new();
    let mut conn = connect();

    mapper
        .non_query(
            CommandKind::Text,
            "create table People (Name text not null, Age integer not null, Dob text, Money text)",
        )
        .execute(&mut conn)
        .unwrap();

    for (name, age) in [("John", 25), ("Bob", 40), ("Alice", 31)] {
        let affected = mapper
            .non_query(
                CommandKind::Text,
                "insert into People (Name, Age, Dob, Money) values (@Name, @Age, @Dob, @Money)",
            )
            .args(&mut params! {
                "Name" => name,
                "Age" => age,
                "Dob" => datetime("1999-01-02 03:04:05"),
                "Money" => Decimal::new(12345, 2),
            })
            .execute(&mut conn)
            .unwrap();

        assert_eq!(affected, 1);
    }

    let affected = mapper
        .non_query(CommandKind::Text, "update People set Age = Age + 1 where Age > @Age")
        .args(&mut params! { "Age" => 30 })
        .execute(&mut conn)
        .unwrap();
    assert_eq!(affected, 2);

    let people = mapper
        .query::<Person>(
            CommandKind::Text,
            "select Name, Age, Dob, Money from People where Age > @Age order by Name",
        )
        .args(&mut params! { "Age" => 30 })
        .fetch_all(&mut conn)
        .unwrap();

    assert_eq!(
        people,
        vec![
            Person {
                name: "Alice".to_owned(),
                age: 32,
                dob: Some(datetime("1999-01-02 03:04:05")),
                money: Some(Decimal::new(12345, 2)),
            },
            Person {
                name: "Bob".to_owned(),
                age: 41,
                dob: Some(datetime("1999-01-02 03:04:05")),
                money: Some(Decimal::new(12345, 2)),
            },
        ]
    );
}

#[test]
fn stored_procedures_are_reported_as_unsupported() {
    let err = Mapper::new()
        .non_query(CommandKind::StoredProcedure, "ListPeople")
        .execute(&mut connect())
        .unwrap_err();

    assert!(matches!(err, Error::Execution(DriverError::Unsupported(_))));
}

#[test]
fn syntax_errors_are_fatal() {
    let err = Mapper::new()
        .query::<Person>(CommandKind::Text, "select from where")
        .fetch_all(&mut connect())
        .unwrap_err();

    assert!(matches!(err, Error::Execution(DriverError::Sqlx(_))));
}

#[test]
fn error_after_statement_without_rows_is_fatal() {
    let err = Mapper::new()
        .query::<Person>(
            CommandKind::Text,
            "create table Scratch (Age integer); select Name from MissingTable",
        )
        .fetch_all(&mut connect())
        .unwrap_err();

    assert!(matches!(err, Error::Execution(DriverError::Sqlx(_))));
}

#[test]
fn statements_without_rows_open_no_result_set() {
    let rows = Mapper::new()
        .query::<Person>(
            CommandKind::Text,
            "create table Scratch (Age integer); insert into Scratch values (7), (8); \
             select Age from Scratch order by Age",
        )
        .fetch_all(&mut connect())
        .unwrap();

    let ages: Vec<_> = rows.iter().map(|p| p.age).collect();
    assert_eq!(ages, [7, 8]);
}

#[test]
fn huge_offset_returns_no_rows() {
    let rows = Mapper::new()
        .query::<Person>(CommandKind::Text, SEVEN_VALUES)
        .offset(u64::MAX)
        .fetch_all(&mut connect())
        .unwrap();

    assert!(rows.is_empty());
}
