use rowmap_driver::{Direction, Parameter};

use crate::args::{ArgField, Args};
use crate::config::MapperConfig;
use crate::error::BindError;

/// Turns the fields of an args value into command parameters.
///
/// An explicit [`Bind`](crate::Bind) wins. Otherwise a field ending in the
/// output suffix binds as an output parameter and one ending in the
/// input/output suffix as an input/output parameter, both named without the
/// suffix. Every other field binds as an input under its own name.
pub struct Binder<'a> {
    config: &'a MapperConfig,
}

impl<'a> Binder<'a> {
    pub fn new(config: &'a MapperConfig) -> Self {
        Self { config }
    }

    pub fn bind(&self, args: Option<&dyn Args>) -> Result<Vec<Parameter>, BindError> {
        let Some(args) = args else {
            return Ok(Vec::new());
        };

        let mut parameters: Vec<Parameter> = Vec::new();

        for field in args.fields() {
            let parameter = self.parameter(field)?;

            if parameters
                .iter()
                .any(|p| p.name.eq_ignore_ascii_case(&parameter.name))
            {
                return Err(BindError::Duplicate(parameter.name));
            }

            parameters.push(parameter);
        }

        Ok(parameters)
    }

    fn parameter(&self, field: ArgField) -> Result<Parameter, BindError> {
        let (name, direction, size) = match field.bind {
            Some(bind) => (field.name.as_str(), bind.direction, bind.size),
            None => self.convention(&field.name),
        };

        if name.is_empty() {
            return Err(BindError::EmptyName(field.field));
        }

        let name = name.to_owned();
        let kind = field.kind.or_else(|| field.value.kind());

        if direction.is_output() {
            let Some(kind) = kind else {
                return Err(BindError::UntypedOutput(name));
            };

            if kind.is_variable_length() && size.is_none() {
                return Err(BindError::MissingSize(name));
            }
        }

        Ok(Parameter {
            name,
            value: field.value,
            kind,
            direction,
            size,
            source: field.field,
        })
    }

    fn convention<'n>(&self, name: &'n str) -> (&'n str, Direction, Option<usize>) {
        // Longest suffix first so `__inout` is not read as `__out` when one ends the other.
        let mut suffixes = [
            (self.config.output_suffix.as_str(), Direction::Out),
            (self.config.input_output_suffix.as_str(), Direction::InOut),
        ];
        suffixes.sort_by_key(|(suffix, _)| std::cmp::Reverse(suffix.len()));

        for (suffix, direction) in suffixes {
            if suffix.is_empty() {
                continue;
            }

            if let Some(stripped) = strip_suffix_ignore_case(name, suffix) {
                return (stripped, direction, self.config.convention_output_size);
            }
        }

        (name, Direction::In, None)
    }
}

fn strip_suffix_ignore_case<'n>(name: &'n str, suffix: &str) -> Option<&'n str> {
    let split = name.len().checked_sub(suffix.len())?;

    if !name.is_char_boundary(split) || !name[split..].eq_ignore_ascii_case(suffix) {
        return None;
    }

    Some(&name[..split])
}

#[cfg(test)]
mod tests {
    use rowmap_driver::{Kind, Value};

    use super::*;
    use crate::args::{Bind, Params};
    use crate::config::ConfigBuilder;

    fn bind(config: &MapperConfig, params: &Params) -> Result<Vec<Parameter>, BindError> {
        Binder::new(config).bind(Some(params as &dyn Args))
    }

    #[test]
    fn none_binds_nothing() {
        let config = MapperConfig::default();

        assert_eq!(Binder::new(&config).bind(None), Ok(Vec::new()));
    }

    #[test]
    fn suffixes_pick_direction() {
        let config = MapperConfig::default();
        let params = Params::new()
            .set("value1", 1)
            .set("value2__out", None::<String>)
            .set("counter__INOUT", 5);

        let parameters = bind(&config, &params).unwrap();

        assert_eq!(parameters[0].name, "value1");
        assert_eq!(parameters[0].direction, Direction::In);
        assert_eq!(parameters[0].size, None);

        assert_eq!(parameters[1].name, "value2");
        assert_eq!(parameters[1].source, "value2__out");
        assert_eq!(parameters[1].direction, Direction::Out);
        assert_eq!(parameters[1].size, Some(4000));
        assert_eq!(parameters[1].kind, Some(Kind::Text));
        assert_eq!(parameters[1].value, Value::Null);

        assert_eq!(parameters[2].name, "counter");
        assert_eq!(parameters[2].direction, Direction::InOut);
    }

    #[test]
    fn explicit_bind_overrides_convention() {
        let config = MapperConfig::default();
        let params = Params::new()
            .bind("name__out", None::<String>, Bind::input())
            .bind("result", None::<String>, Bind::output().size(200));

        let parameters = bind(&config, &params).unwrap();

        assert_eq!(parameters[0].name, "name__out");
        assert_eq!(parameters[0].direction, Direction::In);
        assert_eq!(parameters[1].direction, Direction::Out);
        assert_eq!(parameters[1].size, Some(200));
    }

    #[test]
    fn unsized_outputs_fail() {
        let config = MapperConfig::default();
        let params = Params::new().bind("result", None::<String>, Bind::output());
        assert_eq!(
            bind(&config, &params),
            Err(BindError::MissingSize("result".to_owned()))
        );

        let params = Params::new().bind("count", None::<i32>, Bind::output());
        assert!(bind(&config, &params).is_ok());

        let config = ConfigBuilder::new().convention_output_size(None).build();
        let params = Params::new().set("value2__out", None::<String>);
        assert_eq!(
            bind(&config, &params),
            Err(BindError::MissingSize("value2".to_owned()))
        );
    }

    #[test]
    fn untyped_outputs_fail() {
        let config = MapperConfig::default();
        let params = Params::new().set("value__out", Value::Null);

        assert_eq!(
            bind(&config, &params),
            Err(BindError::UntypedOutput("value".to_owned()))
        );
    }

    #[test]
    fn duplicates_and_empty_names_fail() {
        let config = MapperConfig::default();

        let params = Params::new().set("name", "a").set("NAME__out", "b");
        assert_eq!(
            bind(&config, &params),
            Err(BindError::Duplicate("NAME".to_owned()))
        );

        let params = Params::new().set("__out", 1);
        assert_eq!(
            bind(&config, &params),
            Err(BindError::EmptyName("__out".to_owned()))
        );
    }

    #[test]
    fn custom_suffixes() {
        let config = ConfigBuilder::new()
            .output_suffix("_o")
            .input_output_suffix("_io")
            .build();
        let params = Params::new().set("a_o", 1).set("b_io", 2).set("c__out", 3);

        let parameters = bind(&config, &params).unwrap();

        assert_eq!(parameters[0].direction, Direction::Out);
        assert_eq!(parameters[1].name, "b");
        assert_eq!(parameters[1].direction, Direction::InOut);
        assert_eq!(parameters[2].name, "c__out");
        assert_eq!(parameters[2].direction, Direction::In);
    }
}
