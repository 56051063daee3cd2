//! Error types for registration, parsing and dispatch.

use crate::value::{Primitive, ValueError};

/// Errors raised while building the argument surface or dispatching into it.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Two registrations of the same flag disagree on the terminal type.
    #[error(
        "type conflict between registered argument `--{flag}` ({existing}) and parameter `{param}` of callable `{callable}` ({found})"
    )]
    TypeConflict {
        flag: String,
        existing: Primitive,
        found: Primitive,
        param: String,
        callable: String,
    },

    /// A parameter's declared or documented type cannot be resolved.
    #[error("invalid type for parameter `{param}` of callable `{callable}`: {source}")]
    Type {
        param: String,
        callable: String,
        #[source]
        source: TypeError,
    },

    /// A parameter maps to a flag the command line engine already defines.
    #[error(
        "parameter `{param}` of callable `{callable}` maps to the reserved flag `--{flag}`"
    )]
    ReservedFlag {
        flag: String,
        param: String,
        callable: String,
    },

    /// No declared type, documented type or default value.
    #[error("cannot find argument type for parameter `{param}` in callable `{callable}`")]
    MissingType { param: String, callable: String },

    /// A dispatch wrapper was called before any arguments were parsed.
    #[error("no parsed arguments found for `{callable}`; call `parse_from` before dispatching")]
    NotParsed { callable: String },

    /// The flag engine rejected the command line (also covers `--help`).
    #[error(transparent)]
    Cli(#[from] clap::Error),

    /// The wrapped callable rejected its arguments.
    #[error(transparent)]
    Call(#[from] CallError),
}

/// Errors produced while resolving a type expression.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TypeError {
    /// A union other than `T | None`.
    #[error("argument type cannot be a union of multiple types: `{0}`")]
    UnionShape(String),

    /// A fixed tuple whose element types differ.
    #[error("all types must match in `{0}`")]
    TupleHeterogeneous(String),

    /// A fixed tuple without elements.
    #[error("tuple type `{0}` has no elements")]
    EmptyTuple(String),

    /// A choice marker without values.
    #[error("choice set must not be empty")]
    EmptyChoices,

    /// A choice value whose type differs from the first choice.
    #[error("choice `{found}` does not share the type of the first choice ({expected})")]
    HeterogeneousChoices { expected: Primitive, found: String },

    /// The innermost type is not a primitive.
    #[error("unsupported argument type `{0}`")]
    Unsupported(String),

    /// Type text outside the accepted grammar.
    #[error("cannot parse type `{input}`: {message}")]
    Syntax { input: String, message: String },
}

impl TypeError {
    pub fn syntax(input: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Syntax {
            input: input.into(),
            message: message.into(),
        }
    }
}

/// Errors raised when binding arguments to a callable.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CallError {
    /// A required argument was neither parsed nor supplied.
    #[error("missing required argument `{0}`")]
    MissingArgument(String),

    /// An argument was supplied that the callable does not accept.
    #[error("unexpected argument `{0}`")]
    UnexpectedArgument(String),

    /// An argument value has the wrong type.
    #[error("invalid value for argument `{name}`: {source}")]
    InvalidValue {
        name: String,
        #[source]
        source: ValueError,
    },
}
