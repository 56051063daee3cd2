//! Type expressions and their resolution into flag shapes.
//!
//! A [`TypeExpr`] is the declarative description of a parameter's type: a
//! primitive wrapped in any number of structural markers. [`resolve`] peels
//! the markers off one layer at a time, outside-in, and accumulates what each
//! layer says about the flag:
//!
//! | Marker | Effect |
//! |--------|--------|
//! | `Ignore` | stop, the parameter is not exposed |
//! | `T \| None` | not required |
//! | `Literal[v1, ..]` | terminal is the type of `v1`, choices recorded |
//! | `List[T]` | variable arity |
//! | `Tuple[T, .., T]` | fixed arity of N |
//!
//! Each marker touches a different axis, so `Optional[List[Literal[1, 2]]]`
//! resolves to a non-required, variable arity int flag with choices `1, 2`.

use crate::error::TypeError;
use crate::value::{Primitive, Value};
use std::fmt;

/// A parameter type built from primitives and structural markers.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeExpr {
    Primitive(Primitive),
    /// The null type. Only meaningful as the second member of a union.
    NoneType,
    Union(Vec<TypeExpr>),
    Choice(Vec<Value>),
    List(Box<TypeExpr>),
    Tuple(Vec<TypeExpr>),
    Ignore,
}

impl TypeExpr {
    /// `inner | None`.
    pub fn optional(inner: impl Into<TypeExpr>) -> Self {
        TypeExpr::Union(vec![inner.into(), TypeExpr::NoneType])
    }

    pub fn list(inner: impl Into<TypeExpr>) -> Self {
        TypeExpr::List(Box::new(inner.into()))
    }

    /// A fixed tuple of `len` copies of `inner`.
    pub fn tuple_of(inner: impl Into<TypeExpr>, len: usize) -> Self {
        let inner = inner.into();
        TypeExpr::Tuple(vec![inner; len])
    }

    pub fn choice<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        TypeExpr::Choice(values.into_iter().map(Into::into).collect())
    }
}

impl From<Primitive> for TypeExpr {
    fn from(p: Primitive) -> Self {
        TypeExpr::Primitive(p)
    }
}

impl fmt::Display for TypeExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn join(f: &mut fmt::Formatter<'_>, items: &[TypeExpr]) -> fmt::Result {
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}", item)?;
            }
            Ok(())
        }

        match self {
            TypeExpr::Primitive(p) => write!(f, "{}", p),
            TypeExpr::NoneType => write!(f, "None"),
            TypeExpr::Union(members) => match members.as_slice() {
                [inner, TypeExpr::NoneType] => write!(f, "Optional[{}]", inner),
                _ => {
                    write!(f, "Union[")?;
                    join(f, members)?;
                    write!(f, "]")
                }
            },
            TypeExpr::Choice(values) => {
                let literals: Vec<String> = values.iter().map(Value::to_literal).collect();
                write!(f, "Literal[{}]", literals.join(", "))
            }
            TypeExpr::List(inner) => write!(f, "List[{}]", inner),
            TypeExpr::Tuple(items) => {
                write!(f, "Tuple[")?;
                join(f, items)?;
                write!(f, "]")
            }
            TypeExpr::Ignore => write!(f, "Ignore"),
        }
    }
}

/// How many values a flag consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Single,
    Fixed(usize),
    Variable,
}

impl Arity {
    pub fn is_single(&self) -> bool {
        matches!(self, Arity::Single)
    }
}

/// The flag shape a type expression resolves to.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved {
    pub terminal: Primitive,
    /// Set when an optional marker forced the flag to be non-required.
    pub optional: bool,
    pub arity: Arity,
    pub choices: Option<Vec<Value>>,
}

/// Outcome of [`resolve`].
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// The parameter is kept off the command line.
    Ignore,
    Expose(Resolved),
}

/// Peels structural markers off `expr` until a primitive remains.
pub fn resolve(expr: &TypeExpr) -> Result<Resolution, TypeError> {
    let mut current = expr;
    let mut optional = false;
    let mut arity = Arity::Single;

    loop {
        match current {
            TypeExpr::Ignore => return Ok(Resolution::Ignore),
            TypeExpr::Union(members) => match members.as_slice() {
                [inner, TypeExpr::NoneType] => {
                    optional = true;
                    current = inner;
                }
                _ => return Err(TypeError::UnionShape(current.to_string())),
            },
            TypeExpr::Choice(values) => {
                let first = values.first().ok_or(TypeError::EmptyChoices)?;
                let terminal = Primitive::of(first)
                    .ok_or_else(|| TypeError::Unsupported(current.to_string()))?;
                if let Some(odd) = values.iter().find(|v| Primitive::of(v) != Some(terminal)) {
                    return Err(TypeError::HeterogeneousChoices {
                        expected: terminal,
                        found: odd.to_literal(),
                    });
                }
                return Ok(Resolution::Expose(Resolved {
                    terminal,
                    optional,
                    arity,
                    choices: Some(values.clone()),
                }));
            }
            TypeExpr::List(inner) => {
                arity = Arity::Variable;
                current = inner.as_ref();
            }
            TypeExpr::Tuple(items) => {
                let first = items
                    .first()
                    .ok_or_else(|| TypeError::EmptyTuple(current.to_string()))?;
                if items.iter().skip(1).any(|item| item != first) {
                    return Err(TypeError::TupleHeterogeneous(current.to_string()));
                }
                arity = Arity::Fixed(items.len());
                current = first;
            }
            TypeExpr::Primitive(terminal) => {
                return Ok(Resolution::Expose(Resolved {
                    terminal: *terminal,
                    optional,
                    arity,
                    choices: None,
                }));
            }
            TypeExpr::NoneType => return Err(TypeError::Unsupported(current.to_string())),
        }
    }
}
