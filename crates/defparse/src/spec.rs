//! Argument specifications and their clap rendering.

use crate::types::Arity;
use crate::value::{Primitive, Value};
use clap::builder::{PossibleValue, TypedValueParser};
use clap::error::ErrorKind;
use clap::{Arg, ArgAction, Command};
use std::ffi::OsStr;

/// The resolved description of one command line flag.
///
/// `required` is `false` exactly when `default` is present: optional
/// parameters without a default carry `Value::None`, toggles carry their
/// boolean default.
#[derive(Debug, Clone, PartialEq)]
pub struct ArgSpec {
    /// Parameter that first registered the flag.
    pub param: String,
    /// Flag name without the leading `--`.
    pub flag: String,
    /// Registration group (help heading).
    pub group: String,
    pub terminal: Primitive,
    pub required: bool,
    pub default: Option<Value>,
    pub arity: Arity,
    pub choices: Option<Vec<Value>>,
    pub help: Option<String>,
    /// A zero-argument flag that sets the negation of its default.
    pub toggle: bool,
}

impl ArgSpec {
    /// The value a toggle produces when it is given.
    pub fn toggled_value(&self) -> Value {
        let current = self.default.as_ref().is_some_and(Value::is_truthy);
        Value::Bool(!current)
    }

    /// Renders the clap argument for this flag.
    pub fn to_arg(&self) -> Arg {
        let mut arg = Arg::new(self.flag.clone())
            .long(self.flag.clone())
            .help_heading(self.group.clone());

        if self.toggle {
            arg = arg.action(ArgAction::SetTrue);
        } else {
            arg = arg
                .action(ArgAction::Set)
                .required(self.required)
                .value_name(self.terminal.name().to_uppercase())
                .value_parser(TerminalParser {
                    flag: self.flag.clone(),
                    primitive: self.terminal,
                    choices: self.choices.clone(),
                });
            if matches!(self.terminal, Primitive::Int | Primitive::Float) {
                arg = arg.allow_negative_numbers(true);
            }
            arg = match self.arity {
                Arity::Single => arg.num_args(1),
                Arity::Fixed(n) => arg.num_args(n),
                Arity::Variable => arg.num_args(1..),
            };
        }

        let help = match (&self.help, &self.default) {
            (Some(help), Some(default)) if !self.toggle && !default.is_none() => {
                Some(format!("{} [default: {}]", help, default))
            }
            (None, Some(default)) if !self.toggle && !default.is_none() => {
                Some(format!("[default: {}]", default))
            }
            (help, _) => help.clone(),
        };
        if let Some(help) = help {
            arg = arg.help(help);
        }

        arg
    }
}

/// Builds values of one primitive type from raw flag text.
#[derive(Debug, Clone)]
struct TerminalParser {
    flag: String,
    primitive: Primitive,
    choices: Option<Vec<Value>>,
}

impl TypedValueParser for TerminalParser {
    type Value = Value;

    fn parse_ref(
        &self,
        cmd: &Command,
        _arg: Option<&Arg>,
        value: &OsStr,
    ) -> Result<Self::Value, clap::Error> {
        let raw = value.to_str().ok_or_else(|| {
            clap::Error::raw(
                ErrorKind::InvalidUtf8,
                format!("invalid UTF-8 in value for '--{}'\n", self.flag),
            )
            .with_cmd(cmd)
        })?;

        let parsed = self.primitive.parse(raw).map_err(|reason| {
            clap::Error::raw(
                ErrorKind::ValueValidation,
                format!("invalid value '{}' for '--{}': {}\n", raw, self.flag, reason),
            )
            .with_cmd(cmd)
        })?;

        if let Some(choices) = &self.choices {
            if !choices.contains(&parsed) {
                let allowed: Vec<String> = choices.iter().map(Value::to_string).collect();
                return Err(clap::Error::raw(
                    ErrorKind::InvalidValue,
                    format!(
                        "invalid value '{}' for '--{}' (choose from {})\n",
                        raw,
                        self.flag,
                        allowed.join(", ")
                    ),
                )
                .with_cmd(cmd));
            }
        }

        Ok(parsed)
    }

    fn possible_values(&self) -> Option<Box<dyn Iterator<Item = PossibleValue> + '_>> {
        let choices = self.choices.as_ref()?;
        Some(Box::new(
            choices.iter().map(|v| PossibleValue::new(v.to_string())),
        ))
    }
}
