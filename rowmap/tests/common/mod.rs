#![allow(dead_code)]

use chrono::NaiveDateTime;
use rowmap::{Record, ResultSet, Script, Value};
use rust_decimal::Decimal;

#[derive(Debug, Default, Clone, PartialEq, Record)]
#[record(rename_all = "PascalCase")]
pub struct Person {
    pub name: String,
    pub age: i32,
    pub dob: Option<NaiveDateTime>,
    pub money: Option<Decimal>,
}

pub fn datetime(value: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S").unwrap()
}

pub fn people() -> Script {
    Script::new().result_set(
        ResultSet::new(["Name", "Age", "Dob", "Money"])
            .row([
                Value::from("John"),
                Value::from(25),
                Value::from(datetime("1999-01-02 03:04:05")),
                Value::from(Decimal::new(12345, 2)),
            ])
            .row([
                Value::from("Bob"),
                Value::from(40),
                Value::Null,
                Value::Null,
            ]),
    )
}
