use rowmap_driver::{Direction, Kind, Value};

use crate::convert::{CoerceError, FromValue, ToValue};

/// Explicit binding of one args field, overriding the naming convention.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Bind {
    pub direction: Direction,
    pub size: Option<usize>,
}

impl Bind {
    pub fn new(direction: Direction) -> Self {
        Self {
            direction,
            size: None,
        }
    }

    pub fn input() -> Self {
        Self::new(Direction::In)
    }

    pub fn output() -> Self {
        Self::new(Direction::Out)
    }

    pub fn input_output() -> Self {
        Self::new(Direction::InOut)
    }

    pub fn size(mut self, size: usize) -> Self {
        self.size = Some(size);
        self
    }
}

/// One field of an args value as seen by the binder.
#[derive(Debug, Clone, PartialEq)]
pub struct ArgField {
    /// Name the parameter is derived from, before suffix stripping.
    pub name: String,
    /// Field written back by output scatter.
    pub field: String,
    pub value: Value,
    pub kind: Option<Kind>,
    pub bind: Option<Bind>,
}

impl ArgField {
    pub fn new<N: Into<String>, T: ToValue + ?Sized>(name: N, value: &T) -> Self {
        let name = name.into();

        Self {
            field: name.clone(),
            name,
            kind: value.kind(),
            value: value.to_value(),
            bind: None,
        }
    }

    pub fn field<F: Into<String>>(mut self, field: F) -> Self {
        self.field = field.into();
        self
    }

    pub fn bind(mut self, bind: Bind) -> Self {
        self.bind = Some(bind);
        self
    }
}

/// A value whose fields become command parameters.
///
/// Usually derived with `#[derive(Args)]`; [`Params`] covers ad hoc
/// parameter sets.
pub trait Args {
    /// Fields in declaration order.
    fn fields(&self) -> Vec<ArgField>;

    /// Writes an output parameter value back onto `field`.
    ///
    /// Returns `Ok(false)` when no writable field has that name.
    fn set_field(&mut self, field: &str, value: Value) -> Result<bool, CoerceError>;
}

/// Ordered name/value parameters built at the call site.
///
/// ```
/// use rowmap::{params, Params, Value};
///
/// let params = params! { "Name" => "John", "Age" => 25 };
/// assert_eq!(params.value("Age"), Some(&Value::Int(25)));
/// ```
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Params {
    fields: Vec<ArgField>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `name`, replacing an earlier value with the same name.
    pub fn set<N: Into<String>, T: ToValue>(self, name: N, value: T) -> Self {
        self.push(ArgField::new(name, &value))
    }

    pub fn bind<N: Into<String>, T: ToValue>(self, name: N, value: T, bind: Bind) -> Self {
        self.push(ArgField::new(name, &value).bind(bind))
    }

    /// Current value of `name`; outputs land here after execution.
    pub fn value(&self, name: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|field| field.field == name)
            .map(|field| &field.value)
    }

    pub fn get<T: FromValue>(&self, name: &str) -> Option<Result<T, CoerceError>> {
        self.value(name).cloned().map(T::from_value)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    fn push(mut self, field: ArgField) -> Self {
        match self.fields.iter_mut().find(|f| f.field == field.field) {
            Some(existing) => *existing = field,
            None => self.fields.push(field),
        }

        self
    }
}

impl Args for Params {
    fn fields(&self) -> Vec<ArgField> {
        self.fields.clone()
    }

    fn set_field(&mut self, field: &str, value: Value) -> Result<bool, CoerceError> {
        let Some(existing) = self.fields.iter_mut().find(|f| f.field == field) else {
            return Ok(false);
        };

        existing.value = value;

        Ok(true)
    }
}

/// Builds [`Params`] from `name => value` pairs.
#[macro_export]
macro_rules! params {
    () => {
        $crate::Params::new()
    };
    ($($name:expr => $value:expr),+ $(,)?) => {
        $crate::Params::new()$(.set($name, $value))+
    };
}
