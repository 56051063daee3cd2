//! Dispatch wrappers: calling a registered callable with parsed values.

use crate::args::{CallArgs, ParsedArgs};
use crate::error::Error;
use crate::parser::ArgumentParser;
use crate::signature::{Callable, Signature};
use std::collections::HashSet;
use std::fmt;

/// How a callable's parameters map onto the parsed bag.
#[derive(Debug, Clone, Default)]
pub(crate) struct Binding {
    /// `(parameter, flag)` in signature order.
    flags: Vec<(String, String)>,
    /// Parameters never filled from the bag.
    excluded: HashSet<String>,
}

impl Binding {
    pub(crate) fn new(flags: Vec<(String, String)>, excluded: HashSet<String>) -> Self {
        Self { flags, excluded }
    }

    fn collect(&self, parsed: &ParsedArgs) -> CallArgs {
        let mut args = CallArgs::new();
        for (param, flag) in &self.flags {
            if self.excluded.contains(param) {
                continue;
            }
            if let Some(value) = parsed.get(flag) {
                args.insert(param.clone(), value.clone());
            }
        }
        args
    }
}

/// A registered callable that fills its arguments from the parse result.
///
/// Values come from the parser's most recent parse; explicit overrides given
/// to [`call_with`](Self::call_with) replace them. Ignored parameters must be
/// supplied as overrides or have a default in the callable body.
pub struct Bound<R> {
    callable: Callable<R>,
    binding: Binding,
}

impl<R> Bound<R> {
    pub(crate) fn new(callable: Callable<R>, binding: Binding) -> Self {
        Self { callable, binding }
    }

    pub fn name(&self) -> &str {
        self.callable.name()
    }

    pub fn signature(&self) -> &Signature {
        self.callable.signature()
    }

    /// Calls with the values of `parser`'s last parse.
    pub fn call(&self, parser: &ArgumentParser) -> Result<R, Error> {
        self.call_with(parser, CallArgs::new())
    }

    /// Calls with the values of `parser`'s last parse, replaced by `overrides`.
    pub fn call_with(&self, parser: &ArgumentParser, overrides: CallArgs) -> Result<R, Error> {
        let parsed = parser.parsed().ok_or_else(|| Error::NotParsed {
            callable: self.name().to_string(),
        })?;
        self.invoke(parsed, overrides)
    }

    /// Calls with an explicit parse result.
    pub fn invoke(&self, parsed: &ParsedArgs, overrides: CallArgs) -> Result<R, Error> {
        let mut args = self.binding.collect(parsed);
        for (name, value) in overrides.iter() {
            args.insert(name, value.clone());
        }
        tracing::debug!(callable = self.name(), args = args.len(), "dispatching");
        Ok(self.callable.call(args)?)
    }
}

impl<R> fmt::Debug for Bound<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bound")
            .field("callable", &self.callable)
            .field("binding", &self.binding)
            .finish()
    }
}
