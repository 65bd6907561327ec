use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use rowmap_driver::{Kind, Value};
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use std::str::FromStr;
use uuid::Uuid;

const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

/// A value could not be converted to the requested Rust type.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CoerceError {
    #[error("cannot convert {found} to {target}")]
    Mismatch {
        found: &'static str,
        target: &'static str,
    },

    #[error("{found} value `{value}` is not a valid {target}")]
    Invalid {
        found: &'static str,
        target: &'static str,
        value: String,
    },
}

impl CoerceError {
    pub fn mismatch(value: &Value, target: &'static str) -> Self {
        Self::Mismatch {
            found: value.type_name(),
            target,
        }
    }

    pub fn invalid(value: &Value, target: &'static str) -> Self {
        Self::Invalid {
            found: value.type_name(),
            target,
            value: value.to_string(),
        }
    }

    pub fn target(&self) -> &'static str {
        match self {
            Self::Mismatch { target, .. } | Self::Invalid { target, .. } => target,
        }
    }
}

/// Converts a Rust value into a parameter [`Value`].
pub trait ToValue {
    /// Declared type of the parameter, known even when the value is null.
    const KIND: Option<Kind>;

    fn to_value(&self) -> Value;

    fn kind(&self) -> Option<Kind> {
        Self::KIND
    }
}

/// Converts a column or output [`Value`] into a Rust value.
///
/// Besides exact matches this accepts the widenings drivers commonly need:
/// integers into floats and decimals, text into dates, decimals and uuids,
/// 16 bytes into a uuid. `Null` only converts into `Option`.
pub trait FromValue: Sized {
    const TARGET: &'static str;

    fn from_value(value: Value) -> Result<Self, CoerceError>;
}

impl<T: ToValue + ?Sized> ToValue for &T {
    const KIND: Option<Kind> = T::KIND;

    fn to_value(&self) -> Value {
        T::to_value(self)
    }

    fn kind(&self) -> Option<Kind> {
        T::kind(self)
    }
}

impl<T: ToValue> ToValue for Option<T> {
    const KIND: Option<Kind> = T::KIND;

    fn to_value(&self) -> Value {
        self.as_ref().map_or(Value::Null, ToValue::to_value)
    }
}

impl<T: FromValue> FromValue for Option<T> {
    const TARGET: &'static str = T::TARGET;

    fn from_value(value: Value) -> Result<Self, CoerceError> {
        match value {
            Value::Null => Ok(None),
            value => T::from_value(value).map(Some),
        }
    }
}

impl ToValue for Value {
    const KIND: Option<Kind> = None;

    fn to_value(&self) -> Value {
        self.clone()
    }

    fn kind(&self) -> Option<Kind> {
        Value::kind(self)
    }
}

impl FromValue for Value {
    const TARGET: &'static str = "value";

    fn from_value(value: Value) -> Result<Self, CoerceError> {
        Ok(value)
    }
}

macro_rules! impl_int {
    ($($ty:ty),*) => {$(
        impl ToValue for $ty {
            const KIND: Option<Kind> = Some(Kind::Int);

            fn to_value(&self) -> Value {
                Value::Int(i64::from(*self))
            }
        }
    )*
        impl_from_int!($($ty),*);
    };
}

// `u64` and `usize` only read; their upper half has no `Value::Int` form.
macro_rules! impl_from_int {
    ($($ty:ty),*) => {$(
        impl FromValue for $ty {
            const TARGET: &'static str = stringify!($ty);

            fn from_value(value: Value) -> Result<Self, CoerceError> {
                let number = match &value {
                    Value::Int(v) => Some(*v),
                    Value::Bool(v) => Some(i64::from(*v)),
                    Value::Decimal(v) if v.fract().is_zero() => v.to_i64(),
                    _ => return Err(CoerceError::mismatch(&value, Self::TARGET)),
                };

                number
                    .and_then(|n| <$ty>::try_from(n).ok())
                    .ok_or_else(|| CoerceError::invalid(&value, Self::TARGET))
            }
        }
    )*};
}

impl_int!(i8, i16, i32, i64, u8, u16, u32);
impl_from_int!(u64, usize);

impl ToValue for bool {
    const KIND: Option<Kind> = Some(Kind::Bool);

    fn to_value(&self) -> Value {
        Value::Bool(*self)
    }
}

impl FromValue for bool {
    const TARGET: &'static str = "bool";

    fn from_value(value: Value) -> Result<Self, CoerceError> {
        match value {
            Value::Bool(v) => Ok(v),
            Value::Int(0) => Ok(false),
            Value::Int(1) => Ok(true),
            Value::Int(_) => Err(CoerceError::invalid(&value, Self::TARGET)),
            value => Err(CoerceError::mismatch(&value, Self::TARGET)),
        }
    }
}

impl ToValue for f64 {
    const KIND: Option<Kind> = Some(Kind::Float);

    fn to_value(&self) -> Value {
        Value::Float(*self)
    }
}

impl FromValue for f64 {
    const TARGET: &'static str = "f64";

    fn from_value(value: Value) -> Result<Self, CoerceError> {
        match value {
            Value::Float(v) => Ok(v),
            Value::Int(v) => Ok(v as f64),
            Value::Decimal(v) => v
                .to_f64()
                .ok_or_else(|| CoerceError::invalid(&value, Self::TARGET)),
            value => Err(CoerceError::mismatch(&value, Self::TARGET)),
        }
    }
}

impl ToValue for f32 {
    const KIND: Option<Kind> = Some(Kind::Float);

    fn to_value(&self) -> Value {
        Value::Float(f64::from(*self))
    }
}

impl FromValue for f32 {
    const TARGET: &'static str = "f32";

    fn from_value(value: Value) -> Result<Self, CoerceError> {
        let found = value.clone();
        let v = f64::from_value(value)?;

        if v.is_finite() && v.abs() > f64::from(f32::MAX) {
            return Err(CoerceError::invalid(&found, Self::TARGET));
        }

        Ok(v as f32)
    }
}

impl ToValue for Decimal {
    const KIND: Option<Kind> = Some(Kind::Decimal);

    fn to_value(&self) -> Value {
        Value::Decimal(*self)
    }
}

impl FromValue for Decimal {
    const TARGET: &'static str = "decimal";

    fn from_value(value: Value) -> Result<Self, CoerceError> {
        let decimal = match &value {
            Value::Decimal(v) => Some(*v),
            Value::Int(v) => Some(Decimal::from(*v)),
            Value::Float(v) => Decimal::from_f64(*v),
            Value::Text(v) => Decimal::from_str(v.trim())
                .or_else(|_| Decimal::from_scientific(v.trim()))
                .ok(),
            _ => return Err(CoerceError::mismatch(&value, Self::TARGET)),
        };

        decimal.ok_or_else(|| CoerceError::invalid(&value, Self::TARGET))
    }
}

impl ToValue for str {
    const KIND: Option<Kind> = Some(Kind::Text);

    fn to_value(&self) -> Value {
        Value::Text(self.to_owned())
    }
}

impl ToValue for String {
    const KIND: Option<Kind> = Some(Kind::Text);

    fn to_value(&self) -> Value {
        Value::Text(self.clone())
    }
}

impl FromValue for String {
    const TARGET: &'static str = "string";

    fn from_value(value: Value) -> Result<Self, CoerceError> {
        match value {
            Value::Text(v) => Ok(v),
            value => Err(CoerceError::mismatch(&value, Self::TARGET)),
        }
    }
}

impl ToValue for [u8] {
    const KIND: Option<Kind> = Some(Kind::Bytes);

    fn to_value(&self) -> Value {
        Value::Bytes(self.to_vec())
    }
}

impl ToValue for Vec<u8> {
    const KIND: Option<Kind> = Some(Kind::Bytes);

    fn to_value(&self) -> Value {
        Value::Bytes(self.clone())
    }
}

impl FromValue for Vec<u8> {
    const TARGET: &'static str = "bytes";

    fn from_value(value: Value) -> Result<Self, CoerceError> {
        match value {
            Value::Bytes(v) => Ok(v),
            value => Err(CoerceError::mismatch(&value, Self::TARGET)),
        }
    }
}

impl ToValue for Uuid {
    const KIND: Option<Kind> = Some(Kind::Uuid);

    fn to_value(&self) -> Value {
        Value::Uuid(*self)
    }
}

impl FromValue for Uuid {
    const TARGET: &'static str = "uuid";

    fn from_value(value: Value) -> Result<Self, CoerceError> {
        let uuid = match &value {
            Value::Uuid(v) => Some(*v),
            Value::Bytes(v) => Uuid::from_slice(v).ok(),
            Value::Text(v) => Uuid::parse_str(v.trim()).ok(),
            _ => return Err(CoerceError::mismatch(&value, Self::TARGET)),
        };

        uuid.ok_or_else(|| CoerceError::invalid(&value, Self::TARGET))
    }
}

impl ToValue for NaiveDate {
    const KIND: Option<Kind> = Some(Kind::Date);

    fn to_value(&self) -> Value {
        Value::Date(*self)
    }
}

impl FromValue for NaiveDate {
    const TARGET: &'static str = "date";

    fn from_value(value: Value) -> Result<Self, CoerceError> {
        let date = match &value {
            Value::Date(v) => Some(*v),
            Value::DateTime(v) if v.time() == NaiveTime::MIN => Some(v.date()),
            Value::Text(v) => NaiveDate::parse_from_str(v.trim(), "%Y-%m-%d").ok(),
            Value::DateTime(_) => None,
            _ => return Err(CoerceError::mismatch(&value, Self::TARGET)),
        };

        date.ok_or_else(|| CoerceError::invalid(&value, Self::TARGET))
    }
}

impl ToValue for NaiveTime {
    const KIND: Option<Kind> = Some(Kind::Time);

    fn to_value(&self) -> Value {
        Value::Time(*self)
    }
}

impl FromValue for NaiveTime {
    const TARGET: &'static str = "time";

    fn from_value(value: Value) -> Result<Self, CoerceError> {
        let time = match &value {
            Value::Time(v) => Some(*v),
            Value::Text(v) => NaiveTime::parse_from_str(v.trim(), "%H:%M:%S%.f").ok(),
            _ => return Err(CoerceError::mismatch(&value, Self::TARGET)),
        };

        time.ok_or_else(|| CoerceError::invalid(&value, Self::TARGET))
    }
}

impl ToValue for NaiveDateTime {
    const KIND: Option<Kind> = Some(Kind::DateTime);

    fn to_value(&self) -> Value {
        Value::DateTime(*self)
    }
}

impl FromValue for NaiveDateTime {
    const TARGET: &'static str = "datetime";

    fn from_value(value: Value) -> Result<Self, CoerceError> {
        let datetime = match &value {
            Value::DateTime(v) => Some(*v),
            Value::Date(v) => Some(v.and_time(NaiveTime::MIN)),
            Value::Text(v) => parse_datetime(v.trim()),
            _ => return Err(CoerceError::mismatch(&value, Self::TARGET)),
        };

        datetime.ok_or_else(|| CoerceError::invalid(&value, Self::TARGET))
    }
}

impl ToValue for DateTime<Utc> {
    const KIND: Option<Kind> = Some(Kind::DateTime);

    fn to_value(&self) -> Value {
        Value::DateTime(self.naive_utc())
    }
}

impl FromValue for DateTime<Utc> {
    const TARGET: &'static str = "datetime";

    fn from_value(value: Value) -> Result<Self, CoerceError> {
        NaiveDateTime::from_value(value).map(|v| Utc.from_utc_datetime(&v))
    }
}

fn parse_datetime(text: &str) -> Option<NaiveDateTime> {
    if let Ok(v) = DateTime::parse_from_rfc3339(text) {
        return Some(v.naive_utc());
    }

    DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(text, "%Y-%m-%d")
                .ok()
                .map(|v| v.and_time(NaiveTime::MIN))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_only_fits_option() {
        assert_eq!(Option::<i32>::from_value(Value::Null), Ok(None));
        assert_eq!(
            i32::from_value(Value::Null),
            Err(CoerceError::Mismatch {
                found: "null",
                target: "i32"
            })
        );
    }

    #[test]
    fn integers_are_range_checked() {
        assert_eq!(u8::from_value(Value::Int(255)), Ok(255));
        assert!(matches!(
            u8::from_value(Value::Int(256)),
            Err(CoerceError::Invalid { target: "u8", .. })
        ));
        assert_eq!(
            i64::from_value(Value::Decimal(Decimal::new(4200, 2))),
            Ok(42)
        );
        assert!(i64::from_value(Value::Decimal(Decimal::new(4201, 2))).is_err());
    }

    #[test]
    fn unsigned_wide_integers_read_non_negative_values() {
        assert_eq!(u64::from_value(Value::Int(i64::MAX)), Ok(i64::MAX as u64));
        assert_eq!(usize::from_value(Value::Bool(true)), Ok(1));
        assert_eq!(u64::from_value(Value::Decimal(Decimal::new(700, 2))), Ok(7));
        assert!(matches!(
            u64::from_value(Value::Int(-1)),
            Err(CoerceError::Invalid { target: "u64", .. })
        ));
        assert!(matches!(
            usize::from_value(Value::from("1")),
            Err(CoerceError::Mismatch { target: "usize", .. })
        ));
    }

    #[test]
    fn f32_rejects_values_out_of_range() {
        assert_eq!(f32::from_value(Value::Float(1.5)), Ok(1.5));
        assert_eq!(f32::from_value(Value::Int(-3)), Ok(-3.0));
        assert!(matches!(
            f32::from_value(Value::Float(1e39)),
            Err(CoerceError::Invalid { target: "f32", .. })
        ));
        assert!(f32::from_value(Value::Float(-1e300)).is_err());
        assert!(f32::from_value(Value::Float(f64::INFINITY))
            .unwrap()
            .is_infinite());
    }

    #[test]
    fn text_parses_into_structured_types() {
        let dt = NaiveDateTime::from_value(Value::from("2014-03-04 10:20:30.123")).unwrap();
        assert_eq!(dt.to_string(), "2014-03-04 10:20:30.123");

        let dt = DateTime::<Utc>::from_value(Value::from("2014-03-04T10:20:30Z")).unwrap();
        assert_eq!(dt.timestamp(), 1393928430);

        let money = Decimal::from_value(Value::from("987654321.12345")).unwrap();
        assert_eq!(money, Decimal::from_str("987654321.12345").unwrap());

        let id = Uuid::new_v4();
        assert_eq!(Uuid::from_value(Value::Text(id.to_string())), Ok(id));
        assert_eq!(Uuid::from_value(Value::Bytes(id.as_bytes().to_vec())), Ok(id));
    }

    #[test]
    fn widenings() {
        assert_eq!(f64::from_value(Value::Int(3)), Ok(3.0));
        assert_eq!(Decimal::from_value(Value::Int(3)), Ok(Decimal::from(3)));
        assert_eq!(bool::from_value(Value::Int(1)), Ok(true));
        assert!(String::from_value(Value::Int(1)).is_err());
    }

    #[test]
    fn to_value_keeps_kind_for_null() {
        let name: Option<String> = None;
        assert_eq!(name.to_value(), Value::Null);
        assert_eq!(name.kind(), Some(Kind::Text));
        assert_eq!(Value::Null.kind(), None);
        assert_eq!((&"x").to_value(), Value::Text("x".to_owned()));
    }
}
