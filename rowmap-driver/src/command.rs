use serde::{Deserialize, Serialize};

use crate::value::{Kind, Value};

/// How a driver interprets [`Command::sql`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CommandKind {
    #[default]
    Text,
    StoredProcedure,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    #[default]
    In,
    Out,
    InOut,
}

impl Direction {
    pub fn is_input(&self) -> bool {
        matches!(self, Direction::In | Direction::InOut)
    }

    pub fn is_output(&self) -> bool {
        matches!(self, Direction::Out | Direction::InOut)
    }
}

/// A named, typed, directional parameter bound to a command.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub name: String,
    pub value: Value,
    /// Declared type; lets drivers type a `Null` value.
    pub kind: Option<Kind>,
    pub direction: Direction,
    /// Storage size for variable-length output parameters.
    pub size: Option<usize>,
    /// Field of the args value this parameter was read from and is
    /// written back to.
    pub source: String,
}

impl Parameter {
    pub fn new<N: Into<String>, V: Into<Value>>(name: N, value: V) -> Self {
        let name = name.into();
        let value = value.into();

        Self {
            kind: value.kind(),
            source: name.to_owned(),
            name,
            value,
            direction: Direction::In,
            size: None,
        }
    }

    pub fn direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }

    pub fn size(mut self, size: usize) -> Self {
        self.size = Some(size);
        self
    }

    pub fn kind(mut self, kind: Kind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn source<S: Into<String>>(mut self, source: S) -> Self {
        self.source = source.into();
        self
    }
}

/// One fully bound unit of work.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Command {
    pub kind: CommandKind,
    pub sql: String,
    pub parameters: Vec<Parameter>,
}

impl Command {
    pub fn new<S: Into<String>>(kind: CommandKind, sql: S) -> Self {
        Self {
            kind,
            sql: sql.into(),
            parameters: Vec::new(),
        }
    }

    pub fn parameter(mut self, parameter: Parameter) -> Self {
        self.parameters.push(parameter);
        self
    }

    /// Parameter named `name`, ignoring ASCII case.
    pub fn get(&self, name: &str) -> Option<&Parameter> {
        self.parameters
            .iter()
            .find(|parameter| parameter.name.eq_ignore_ascii_case(name))
    }

    pub fn outputs(&self) -> impl Iterator<Item = &Parameter> {
        self.parameters
            .iter()
            .filter(|parameter| parameter.direction.is_output())
    }
}

/// Final values of output parameters, keyed by parameter name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Outputs(Vec<(String, Value)>);

impl Outputs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `name`, replacing a previous value under the same name.
    pub fn insert<N: Into<String>, V: Into<Value>>(&mut self, name: N, value: V) {
        let name = name.into();
        let value = value.into();

        match self.0.iter_mut().find(|(n, _)| n.eq_ignore_ascii_case(&name)) {
            Some(entry) => entry.1 = value,
            None => self.0.push((name, value)),
        }
    }

    /// Value of `name`, ignoring ASCII case.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, value)| value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<N: Into<String>, V: Into<Value>> FromIterator<(N, V)> for Outputs {
    fn from_iter<I: IntoIterator<Item = (N, V)>>(iter: I) -> Self {
        let mut outputs = Outputs::new();

        for (name, value) in iter {
            outputs.insert(name, value);
        }

        outputs
    }
}

/// Outcome of a non-query command.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Executed {
    pub affected_rows: u64,
    pub outputs: Outputs,
}
