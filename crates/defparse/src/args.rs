//! Argument maps: the parsed value bag and call-time arguments.

use crate::error::CallError;
use crate::value::{FromValue, Value};
use serde::ser::{Serialize, SerializeMap, Serializer};

/// Ordered `name -> value` storage shared by both maps.
#[derive(Debug, Clone, Default, PartialEq)]
struct Entries(Vec<(String, Value)>);

impl Entries {
    fn insert(&mut self, name: String, value: Value) -> Option<Value> {
        match self.0.iter_mut().find(|(k, _)| *k == name) {
            Some((_, slot)) => Some(std::mem::replace(slot, value)),
            None => {
                self.0.push((name, value));
                None
            }
        }
    }

    fn get(&self, name: &str) -> Option<&Value> {
        self.0.iter().find(|(k, _)| k == name).map(|(_, v)| v)
    }

    fn remove(&mut self, name: &str) -> Option<Value> {
        let index = self.0.iter().position(|(k, _)| k == name)?;
        Some(self.0.remove(index).1)
    }

    fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// Values produced by one parse, keyed by flag name in registration order.
///
/// A new bag replaces the previous one on every parse; dispatch only reads it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedArgs {
    entries: Entries,
}

impl ParsedArgs {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert(&mut self, flag: impl Into<String>, value: Value) {
        self.entries.insert(flag.into(), value);
    }

    /// The value parsed (or defaulted) for `flag`.
    pub fn get(&self, flag: &str) -> Option<&Value> {
        self.entries.get(flag)
    }

    pub fn contains(&self, flag: &str) -> bool {
        self.entries.get(flag).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.0.is_empty()
    }
}

impl Serialize for ParsedArgs {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (flag, value) in self.iter() {
            map.serialize_entry(flag, value)?;
        }
        map.end()
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for ParsedArgs {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        let mut parsed = ParsedArgs::new();
        for (flag, value) in iter {
            parsed.insert(flag, value);
        }
        parsed
    }
}

/// Arguments bound to a callable's parameters by name.
///
/// Inserting a name twice keeps the position of the first insert and the
/// value of the last, which is how overrides take precedence over parsed
/// values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CallArgs {
    entries: Entries,
}

impl CallArgs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an argument, builder style.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    /// Adds an argument, returning the value it replaced.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.entries.insert(name.into(), value.into())
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.get(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.0.is_empty()
    }

    /// Removes and converts a required argument.
    ///
    /// An absent argument falls back to [`FromValue::missing`], so `Option`
    /// parameters are optional without a default.
    pub fn take<T: FromValue>(&mut self, name: &str) -> Result<T, CallError> {
        match self.entries.remove(name) {
            Some(value) => convert(name, value),
            None => T::missing().ok_or_else(|| CallError::MissingArgument(name.to_string())),
        }
    }

    /// Removes and converts an argument, using `default` when it is absent.
    pub fn take_or_else<T, F>(&mut self, name: &str, default: F) -> Result<T, CallError>
    where
        T: FromValue,
        F: FnOnce() -> T,
    {
        match self.entries.remove(name) {
            Some(value) => convert(name, value),
            None => Ok(default()),
        }
    }

    /// Fails if any argument was not taken.
    pub fn finish(self) -> Result<(), CallError> {
        match self.entries.0.into_iter().next() {
            Some((name, _)) => Err(CallError::UnexpectedArgument(name)),
            None => Ok(()),
        }
    }
}

fn convert<T: FromValue>(name: &str, value: Value) -> Result<T, CallError> {
    T::from_value(value).map_err(|source| CallError::InvalidValue {
        name: name.to_string(),
        source,
    })
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for CallArgs {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut args = CallArgs::new();
        for (name, value) in iter {
            args.insert(name, value);
        }
        args
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn later_insert_wins_and_keeps_position() {
        let mut args = CallArgs::new().with("a", 1i64).with("b", 2i64);
        assert_eq!(args.insert("a", 10i64), Some(Value::Int(1)));
        let entries: Vec<(&str, &Value)> = args.iter().collect();
        assert_eq!(entries, [("a", &Value::Int(10)), ("b", &Value::Int(2))]);
    }

    #[test]
    fn take_converts_and_removes() {
        let mut args = CallArgs::new().with("a", 3i64);
        let a: i64 = args.take("a").unwrap();
        assert_eq!(a, 3);
        assert!(args.is_empty());
        assert!(args.finish().is_ok());
    }

    #[test]
    fn take_reports_missing_and_invalid() {
        let mut args = CallArgs::new().with("a", "three");
        assert_eq!(
            args.take::<i64>("b"),
            Err(CallError::MissingArgument("b".into()))
        );
        assert!(matches!(
            args.take::<i64>("a"),
            Err(CallError::InvalidValue { ref name, .. }) if name == "a"
        ));
    }

    #[test]
    fn option_parameters_default_to_none() {
        let mut args = CallArgs::new();
        let limit: Option<u32> = args.take("limit").unwrap();
        assert_eq!(limit, None);
    }

    #[test]
    fn take_or_else_only_runs_default_when_absent() {
        let mut args = CallArgs::new().with("b", 1.2);
        let b: f64 = args.take_or_else("b", || 0.3).unwrap();
        let c: f64 = args.take_or_else("c", || 0.3).unwrap();
        assert_eq!((b, c), (1.2, 0.3));
    }

    #[test]
    fn finish_rejects_leftovers() {
        let args = CallArgs::new().with("extra", true);
        assert_eq!(
            args.finish(),
            Err(CallError::UnexpectedArgument("extra".into()))
        );
    }

    #[test]
    fn parsed_args_serialize_as_map() {
        let parsed: ParsedArgs = [("A", Value::Int(4)), ("B", Value::Float(0.3))]
            .into_iter()
            .collect();
        assert_eq!(
            serde_json::to_string(&parsed).unwrap(),
            r#"{"A":4,"B":0.3}"#
        );
        assert_eq!(parsed.get("A"), Some(&Value::Int(4)));
        assert!(!parsed.contains("C"));
    }
}
