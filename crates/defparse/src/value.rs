//! Runtime values and the primitive types they belong to.
//!
//! Every value that crosses the command line boundary is a [`Value`]: defaults
//! declared on parameters, choice sets, values produced by the flag engine and
//! overrides supplied at call time. Callable bodies convert them back into
//! Rust types through [`FromValue`].
//!
//! # Primitive Types
//!
//! | Primitive | Value variant | Rust names | Doc names |
//! |-----------|---------------|------------|-----------|
//! | `Int` | `Value::Int` | `i8`..`i128`, `u8`..`u64`, `isize`, `usize` | `int` |
//! | `Float` | `Value::Float` | `f32`, `f64` | `float` |
//! | `Str` | `Value::Str` | `String`, `str` | `str` |
//! | `Bool` | `Value::Bool` | `bool` | `bool` |
//! | `Path` | `Value::Path` | `PathBuf`, `Path` | `path` |
//! | `Char` | `Value::Char` | `char` | `char` |

use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

/// A dynamically typed argument value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    /// Absent value (the default of an optional parameter).
    None,
    /// Boolean value.
    Bool(bool),
    /// Integer value.
    Int(i128),
    /// Floating point value.
    Float(f64),
    /// String value.
    Str(String),
    /// Filesystem path.
    Path(PathBuf),
    /// Single character.
    Char(char),
    /// Sequence of values, produced by fixed and variable arity flags.
    List(Vec<Value>),
}

impl Value {
    /// Returns `true` if this is `Value::None`.
    pub fn is_none(&self) -> bool {
        matches!(self, Value::None)
    }

    /// The primitive type of this value, if it has one.
    pub fn primitive(&self) -> Option<Primitive> {
        Primitive::of(self)
    }

    /// Truthiness used to derive toggle behaviour from a default.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::None => false,
            Value::Bool(b) => *b,
            Value::Int(i) => *i != 0,
            Value::Float(f) => *f != 0.0,
            Value::Str(s) => !s.is_empty(),
            Value::Path(p) => !p.as_os_str().is_empty(),
            Value::Char(_) => true,
            Value::List(items) => !items.is_empty(),
        }
    }

    /// Short name of the value's type, used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::None => "None",
            Value::List(_) => "list",
            other => Primitive::of(other).map_or("unknown", |p| p.name()),
        }
    }

    /// Renders the value as a literal in the type grammar (`'adam'`, `3`).
    pub fn to_literal(&self) -> String {
        match self {
            Value::Str(s) => format!("'{}'", s),
            Value::Path(p) => format!("'{}'", p.display()),
            Value::Char(c) => format!("'{}'", c),
            Value::Bool(true) => "True".to_string(),
            Value::Bool(false) => "False".to_string(),
            other => other.to_string(),
        }
    }

    fn describe(&self) -> String {
        format!("{} `{}`", self.type_name(), self)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::None => write!(f, "None"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", x),
            Value::Str(s) => write!(f, "{}", s),
            Value::Path(p) => write!(f, "{}", p.display()),
            Value::Char(c) => write!(f, "{}", c),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
        }
    }
}

/// Terminal types a flag can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Primitive {
    Int,
    Float,
    Str,
    Bool,
    Path,
    Char,
}

impl Primitive {
    /// The runtime type of a value. Lists and `None` have no primitive type.
    pub fn of(value: &Value) -> Option<Primitive> {
        match value {
            Value::Bool(_) => Some(Primitive::Bool),
            Value::Int(_) => Some(Primitive::Int),
            Value::Float(_) => Some(Primitive::Float),
            Value::Str(_) => Some(Primitive::Str),
            Value::Path(_) => Some(Primitive::Path),
            Value::Char(_) => Some(Primitive::Char),
            Value::None | Value::List(_) => None,
        }
    }

    /// Looks up a primitive by its documentation or Rust type name.
    pub fn from_name(name: &str) -> Option<Primitive> {
        let primitive = match name {
            "int" | "i8" | "i16" | "i32" | "i64" | "i128" | "isize" | "u8" | "u16" | "u32"
            | "u64" | "usize" => Primitive::Int,
            "float" | "f32" | "f64" => Primitive::Float,
            "str" | "String" => Primitive::Str,
            "bool" => Primitive::Bool,
            "path" | "Path" | "PathBuf" => Primitive::Path,
            "char" => Primitive::Char,
            _ => return None,
        };
        Some(primitive)
    }

    /// Canonical documentation name.
    pub fn name(&self) -> &'static str {
        match self {
            Primitive::Int => "int",
            Primitive::Float => "float",
            Primitive::Str => "str",
            Primitive::Bool => "bool",
            Primitive::Path => "path",
            Primitive::Char => "char",
        }
    }

    /// Constructs a value of this type from command line text.
    pub fn parse(&self, raw: &str) -> Result<Value, String> {
        match self {
            Primitive::Int => raw
                .trim()
                .parse::<i128>()
                .map(Value::Int)
                .map_err(|e| format!("invalid int value: {}", e)),
            Primitive::Float => raw
                .trim()
                .parse::<f64>()
                .map(Value::Float)
                .map_err(|e| format!("invalid float value: {}", e)),
            Primitive::Str => Ok(Value::Str(raw.to_string())),
            Primitive::Bool => match raw.trim().to_ascii_lowercase().as_str() {
                "true" | "1" | "yes" | "on" => Ok(Value::Bool(true)),
                "false" | "0" | "no" | "off" => Ok(Value::Bool(false)),
                _ => Err(format!("invalid bool value: `{}`", raw)),
            },
            Primitive::Path => Ok(Value::Path(PathBuf::from(raw))),
            Primitive::Char => {
                let mut chars = raw.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Ok(Value::Char(c)),
                    _ => Err(format!("expected a single character, got `{}`", raw)),
                }
            }
        }
    }
}

impl fmt::Display for Primitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A value could not be converted into the requested Rust type.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("expected {expected}, found {found}")]
pub struct ValueError {
    pub expected: String,
    pub found: String,
}

impl ValueError {
    pub fn new(expected: impl Into<String>, found: &Value) -> Self {
        Self {
            expected: expected.into(),
            found: found.describe(),
        }
    }
}

/// Conversion from a [`Value`] into a Rust parameter type.
pub trait FromValue: Sized {
    /// Converts a present value.
    fn from_value(value: Value) -> Result<Self, ValueError>;

    /// The value used when the argument is absent entirely.
    ///
    /// `None` means the argument is required.
    fn missing() -> Option<Self> {
        None
    }
}

impl FromValue for Value {
    fn from_value(value: Value) -> Result<Self, ValueError> {
        Ok(value)
    }
}

macro_rules! int_from_value {
    ($($t:ty),*) => {
        $(
            impl FromValue for $t {
                fn from_value(value: Value) -> Result<Self, ValueError> {
                    match value {
                        Value::Int(i) => <$t>::try_from(i)
                            .map_err(|_| ValueError::new(stringify!($t), &Value::Int(i))),
                        other => Err(ValueError::new(stringify!($t), &other)),
                    }
                }
            }

            impl From<$t> for Value {
                fn from(v: $t) -> Self {
                    // Every supported width fits in i128 without wrapping.
                    Value::Int(v as i128)
                }
            }
        )*
    };
}

int_from_value!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, usize);

impl FromValue for f64 {
    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Float(x) => Ok(x),
            Value::Int(i) => Ok(i as f64),
            other => Err(ValueError::new("f64", &other)),
        }
    }
}

impl FromValue for f32 {
    fn from_value(value: Value) -> Result<Self, ValueError> {
        f64::from_value(value).map(|x| x as f32)
    }
}

impl FromValue for String {
    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Str(s) => Ok(s),
            Value::Char(c) => Ok(c.to_string()),
            other => Err(ValueError::new("String", &other)),
        }
    }
}

impl FromValue for bool {
    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Bool(b) => Ok(b),
            other => Err(ValueError::new("bool", &other)),
        }
    }
}

impl FromValue for PathBuf {
    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Path(p) => Ok(p),
            Value::Str(s) => Ok(PathBuf::from(s)),
            other => Err(ValueError::new("PathBuf", &other)),
        }
    }
}

impl FromValue for char {
    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Char(c) => Ok(c),
            other => Err(ValueError::new("char", &other)),
        }
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::None => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }

    fn missing() -> Option<Self> {
        Some(None)
    }
}

impl<T: FromValue> FromValue for Vec<T> {
    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::List(items) => items.into_iter().map(T::from_value).collect(),
            other => Err(ValueError::new("list", &other)),
        }
    }
}

impl<T: FromValue, const N: usize> FromValue for [T; N] {
    fn from_value(value: Value) -> Result<Self, ValueError> {
        let items = match value {
            Value::List(items) if items.len() == N => items,
            other => return Err(ValueError::new(format!("list of {} values", N), &other)),
        };
        let converted = items
            .into_iter()
            .map(T::from_value)
            .collect::<Result<Vec<T>, _>>()?;
        converted
            .try_into()
            .map_err(|_| ValueError::new(format!("list of {} values", N), &Value::None))
    }
}

macro_rules! tuple_value {
    ($len:expr => $($name:ident),+) => {
        impl<$($name: FromValue),+> FromValue for ($($name,)+) {
            fn from_value(value: Value) -> Result<Self, ValueError> {
                match value {
                    Value::List(items) if items.len() == $len => {
                        let mut items = items.into_iter();
                        Ok(($(
                            match items.next() {
                                Some(item) => $name::from_value(item)?,
                                None => return Err(ValueError::new(
                                    concat!("tuple of ", stringify!($len)),
                                    &Value::None,
                                )),
                            },
                        )+))
                    }
                    other => Err(ValueError::new(concat!("tuple of ", stringify!($len)), &other)),
                }
            }
        }

        #[allow(non_snake_case)]
        impl<$($name: Into<Value>),+> From<($($name,)+)> for Value {
            fn from(tuple: ($($name,)+)) -> Self {
                let ($($name,)+) = tuple;
                Value::List(vec![$($name.into()),+])
            }
        }
    };
}

tuple_value!(2 => A, B);
tuple_value!(3 => A, B, C);
tuple_value!(4 => A, B, C, D);

/// Structural marker that keeps a parameter off the command line.
///
/// The parameter is still part of the callable; it is supplied through call
/// time overrides or its own default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Ignore<T>(pub T);

impl<T> Ignore<T> {
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> std::ops::Deref for Ignore<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.0
    }
}

impl<T: FromValue> FromValue for Ignore<T> {
    fn from_value(value: Value) -> Result<Self, ValueError> {
        T::from_value(value).map(Ignore)
    }

    fn missing() -> Option<Self> {
        T::missing().map(Ignore)
    }
}

impl<T: Into<Value>> From<Ignore<T>> for Value {
    fn from(v: Ignore<T>) -> Self {
        v.0.into()
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float(v as f64)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

impl From<char> for Value {
    fn from(v: char) -> Self {
        Value::Char(v)
    }
}

impl From<PathBuf> for Value {
    fn from(v: PathBuf) -> Self {
        Value::Path(v)
    }
}

impl From<&std::path::Path> for Value {
    fn from(v: &std::path::Path) -> Self {
        Value::Path(v.to_path_buf())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::None, Into::into)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::List(v.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>, const N: usize> From<[T; N]> for Value {
    fn from(v: [T; N]) -> Self {
        Value::List(v.into_iter().map(Into::into).collect())
    }
}
