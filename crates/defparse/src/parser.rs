//! The argument parser: registration of callables and parsing.
//!
//! [`ArgumentParser`] owns the registration table. Every callable added to it
//! contributes one flag per exposed parameter; the parser renders those flags
//! as a clap [`Command`], parses tokens with it and keeps the resulting
//! [`ParsedArgs`] for the dispatch wrappers.
//!
//! # Resolving a parameter
//!
//! 1. The declared type wins; otherwise the documented type name is parsed.
//! 2. A type runs through [`resolve`]; `Ignore` drops the parameter.
//! 3. Without a type, the default's runtime type is the terminal.
//! 4. Without either, registration fails with [`Error::MissingType`].
//! 5. A flag that already exists is reused when the terminal types agree and
//!    rejected with [`Error::TypeConflict`] when they differ.
//! 6. A single `bool` becomes a toggle that sets the negation of its default.
//! 7. The documented description becomes the help text.
//!
//! A callable's flags are committed only when every parameter resolves.
//!
//! # Example
//!
//! ```rust
//! use defparse::{ArgumentParser, Callable, CallArgs, Param, Signature};
//!
//! let mut parser = ArgumentParser::builder().name("demo").build();
//! let add = parser.add_callable(Callable::new(
//!     Signature::new("add")
//!         .param(Param::new("a").ty("int"))
//!         .param(Param::new("b").default(10i64)),
//!     |mut args: CallArgs| {
//!         let a: i64 = args.take("a")?;
//!         let b: i64 = args.take("b")?;
//!         args.finish()?;
//!         Ok(a + b)
//!     },
//! ))?;
//!
//! parser.parse_from(["--a", "5"])?;
//! assert_eq!(add.call(&parser)?, 15);
//! # Ok::<(), defparse::Error>(())
//! ```

use crate::args::ParsedArgs;
use crate::dispatch::{Binding, Bound};
use crate::docstring::{parse_doc, DocComment};
use crate::error::{Error, TypeError};
use crate::signature::{Callable, Param};
use crate::spec::ArgSpec;
use crate::types::{resolve, Arity, Resolution, Resolved, TypeExpr};
use crate::value::{Primitive, Value};
use clap::Command;
use std::collections::HashSet;
use std::ffi::OsString;
use std::fmt;

type Formatter = Box<dyn Fn(&str) -> String>;

/// Builder for [`ArgumentParser`].
pub struct ArgumentParserBuilder {
    name: String,
    about: Option<String>,
    version: Option<String>,
    formatter: Formatter,
}

impl Default for ArgumentParserBuilder {
    fn default() -> Self {
        Self {
            name: env!("CARGO_PKG_NAME").to_string(),
            about: None,
            version: None,
            formatter: Box::new(|name| name.to_string()),
        }
    }
}

impl ArgumentParserBuilder {
    /// Program name shown in usage and help.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn about(mut self, about: impl Into<String>) -> Self {
        self.about = Some(about.into());
        self
    }

    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Naming transform from parameter name to flag name. Defaults to identity.
    pub fn formatter<F>(mut self, formatter: F) -> Self
    where
        F: Fn(&str) -> String + 'static,
    {
        self.formatter = Box::new(formatter);
        self
    }

    /// Shortcut for a formatter turning `batch_size` into `batch-size`.
    pub fn kebab_case(self) -> Self {
        self.formatter(|name| name.replace('_', "-"))
    }

    pub fn build(self) -> ArgumentParser {
        ArgumentParser {
            name: self.name,
            about: self.about,
            version: self.version,
            formatter: self.formatter,
            specs: Vec::new(),
            parsed: None,
        }
    }
}

/// Options for one registration.
#[derive(Debug, Clone, Default)]
pub struct CallableOptions {
    group: Option<String>,
    ignore: Vec<String>,
}

impl CallableOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Help heading for the callable's flags. Defaults to the callable's name.
    pub fn group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    /// Parameters to keep off the command line.
    pub fn ignore<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ignore.extend(names.into_iter().map(Into::into));
        self
    }
}

/// Registers callables as command line flags and parses them.
pub struct ArgumentParser {
    name: String,
    about: Option<String>,
    version: Option<String>,
    formatter: Formatter,
    specs: Vec<ArgSpec>,
    parsed: Option<ParsedArgs>,
}

impl fmt::Debug for ArgumentParser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArgumentParser")
            .field("name", &self.name)
            .field("specs", &self.specs)
            .field("parsed", &self.parsed)
            .finish_non_exhaustive()
    }
}

impl Default for ArgumentParser {
    fn default() -> Self {
        ArgumentParserBuilder::default().build()
    }
}

impl ArgumentParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builder() -> ArgumentParserBuilder {
        ArgumentParserBuilder::default()
    }

    /// The flag name a parameter maps to.
    pub fn flag_name(&self, param: &str) -> String {
        (self.formatter)(param)
    }

    /// Registers every parameter of `callable` and returns its dispatch wrapper.
    pub fn add_callable<R>(&mut self, callable: Callable<R>) -> Result<Bound<R>, Error> {
        self.add_callable_with(callable, CallableOptions::default())
    }

    /// Like [`add_callable`](Self::add_callable), with a group and ignore set.
    pub fn add_callable_with<R>(
        &mut self,
        callable: Callable<R>,
        options: CallableOptions,
    ) -> Result<Bound<R>, Error> {
        let signature = callable.signature();
        let callable_name = signature.name().to_string();
        let group = options.group.unwrap_or_else(|| callable_name.clone());
        let mut excluded: HashSet<String> = options.ignore.into_iter().collect();
        let doc = signature
            .doc_comment()
            .map(parse_doc)
            .unwrap_or_default();

        let mut staged: Vec<ArgSpec> = Vec::new();
        let mut flags = Vec::with_capacity(signature.params().len());

        for param in signature.params() {
            let flag = self.flag_name(param.name());
            flags.push((param.name().to_string(), flag.clone()));

            if excluded.contains(param.name()) {
                tracing::debug!(callable = %callable_name, param = param.name(), "parameter ignored");
                continue;
            }

            let resolved = match self.resolve_param(param, &doc, &callable_name)? {
                Some(resolved) => resolved,
                None => {
                    tracing::debug!(
                        callable = %callable_name,
                        param = param.name(),
                        "parameter typed as ignored"
                    );
                    excluded.insert(param.name().to_string());
                    continue;
                }
            };

            if self.is_reserved(&flag) {
                return Err(Error::ReservedFlag {
                    flag,
                    param: param.name().to_string(),
                    callable: callable_name,
                });
            }

            let existing = self
                .specs
                .iter()
                .chain(staged.iter())
                .find(|spec| spec.flag == flag);
            if let Some(existing) = existing {
                if existing.terminal != resolved.terminal {
                    return Err(Error::TypeConflict {
                        flag,
                        existing: existing.terminal,
                        found: resolved.terminal,
                        param: param.name().to_string(),
                        callable: callable_name,
                    });
                }
                if existing.arity != resolved.arity || existing.choices != resolved.choices {
                    tracing::warn!(
                        flag = %flag,
                        callable = %callable_name,
                        "reusing flag with a different arity or choice set"
                    );
                }
                tracing::debug!(flag = %flag, callable = %callable_name, "reusing registered flag");
                continue;
            }

            let spec = self.build_spec(param, resolved, flag, &group, &doc);
            tracing::debug!(
                flag = %spec.flag,
                terminal = %spec.terminal,
                required = spec.required,
                toggle = spec.toggle,
                "registering flag"
            );
            staged.push(spec);
        }

        self.specs.extend(staged);
        Ok(Bound::new(callable, Binding::new(flags, excluded)))
    }

    /// Flags clap adds to every command built by this parser.
    fn is_reserved(&self, flag: &str) -> bool {
        flag == "help" || (flag == "version" && self.version.is_some())
    }

    /// Determines the flag shape of one parameter. `None` means ignored.
    fn resolve_param(
        &self,
        param: &Param,
        doc: &DocComment,
        callable: &str,
    ) -> Result<Option<Resolved>, Error> {
        let type_error = |source: TypeError| Error::Type {
            param: param.name().to_string(),
            callable: callable.to_string(),
            source,
        };

        let declared = match param.declared_type() {
            Some(source) => Some(source.to_expr().map_err(type_error)?),
            None => match doc.param(param.name()).and_then(|p| p.type_name.as_deref()) {
                Some(text) => Some(text.parse::<TypeExpr>().map_err(type_error)?),
                None => None,
            },
        };

        if let Some(expr) = declared {
            return match resolve(&expr).map_err(type_error)? {
                Resolution::Ignore => Ok(None),
                Resolution::Expose(resolved) => Ok(Some(resolved)),
            };
        }

        match param.default_value() {
            Some(default) => match default {
                Value::List(items) => {
                    // a list default implies a variable-length sequence of its items' type
                    let terminal = items.first().and_then(Primitive::of).ok_or_else(|| {
                        type_error(TypeError::Unsupported(default.to_string()))
                    })?;
                    Ok(Some(Resolved {
                        terminal,
                        optional: true,
                        arity: Arity::Variable,
                        choices: None,
                    }))
                }
                other => {
                    let terminal = Primitive::of(other)
                        .ok_or_else(|| type_error(TypeError::Unsupported(other.to_string())))?;
                    Ok(Some(Resolved {
                        terminal,
                        optional: true,
                        arity: Arity::Single,
                        choices: None,
                    }))
                }
            },
            None => Err(Error::MissingType {
                param: param.name().to_string(),
                callable: callable.to_string(),
            }),
        }
    }

    fn build_spec(
        &self,
        param: &Param,
        resolved: Resolved,
        flag: String,
        group: &str,
        doc: &DocComment,
    ) -> ArgSpec {
        let toggle = resolved.terminal == Primitive::Bool && resolved.arity.is_single();

        let default = match param.default_value() {
            Some(default) => Some(default.clone()),
            None if toggle => Some(Value::Bool(false)),
            None if resolved.optional => Some(Value::None),
            None => None,
        };

        let help = doc
            .param(param.name())
            .map(|p| p.description.replace('\n', " "))
            .filter(|h| !h.is_empty());

        ArgSpec {
            param: param.name().to_string(),
            flag,
            group: group.to_string(),
            terminal: resolved.terminal,
            required: default.is_none(),
            default,
            arity: resolved.arity,
            choices: if toggle { None } else { resolved.choices },
            help,
            toggle,
        }
    }

    /// All registered flags, in registration order.
    pub fn specs(&self) -> &[ArgSpec] {
        &self.specs
    }

    /// Looks up a registered flag by name (without `--`).
    pub fn spec(&self, flag: &str) -> Option<&ArgSpec> {
        self.specs.iter().find(|spec| spec.flag == flag)
    }

    /// Renders the clap command for the current registration table.
    pub fn command(&self) -> Command {
        let mut command = Command::new(self.name.clone()).args_override_self(true);
        if let Some(about) = &self.about {
            command = command.about(about.clone());
        }
        if let Some(version) = &self.version {
            command = command.version(version.clone());
        }
        command.args(self.specs.iter().map(ArgSpec::to_arg))
    }

    pub fn render_help(&self) -> String {
        self.command().render_help().to_string()
    }

    /// Parses `tokens` (without the program name) and stores the result.
    ///
    /// The previous result is replaced wholesale; on failure it is kept.
    pub fn parse_from<I, T>(&mut self, tokens: I) -> Result<&ParsedArgs, Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let argv = std::iter::once(OsString::from(self.name.clone()))
            .chain(tokens.into_iter().map(Into::into));
        let matches = self.command().try_get_matches_from(argv)?;

        let mut parsed = ParsedArgs::new();
        for spec in &self.specs {
            let value = if spec.toggle {
                if matches.get_flag(&spec.flag) {
                    Some(spec.toggled_value())
                } else {
                    spec.default.clone()
                }
            } else if spec.arity.is_single() {
                matches
                    .get_one::<Value>(&spec.flag)
                    .cloned()
                    .or_else(|| spec.default.clone())
            } else {
                matches
                    .get_many::<Value>(&spec.flag)
                    .map(|values| Value::List(values.cloned().collect()))
                    .or_else(|| spec.default.clone())
            };
            if let Some(value) = value {
                parsed.insert(spec.flag.clone(), value);
            }
        }

        tracing::debug!(values = parsed.len(), "parsed arguments");
        Ok(&*self.parsed.insert(parsed))
    }

    /// Parses the process arguments.
    pub fn parse_env(&mut self) -> Result<&ParsedArgs, Error> {
        self.parse_from(std::env::args_os().skip(1))
    }

    /// The most recent parse result, if any.
    pub fn parsed(&self) -> Option<&ParsedArgs> {
        self.parsed.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args::CallArgs;
    use crate::signature::Signature;

    fn noop(signature: Signature) -> Callable<()> {
        Callable::new(signature, |_args: CallArgs| Ok(()))
    }

    #[test]
    fn declared_type_wins_over_documentation() {
        let mut parser = ArgumentParser::new();
        parser
            .add_callable(noop(
                Signature::new("f")
                    .doc("Args:\n    a (float): the a")
                    .param(Param::new("a").ty("int")),
            ))
            .unwrap();
        let spec = parser.spec("a").unwrap();
        assert_eq!(spec.terminal, Primitive::Int);
        assert_eq!(spec.help.as_deref(), Some("the a"));
    }

    #[test]
    fn documented_type_is_used_without_declaration() {
        let mut parser = ArgumentParser::new();
        parser
            .add_callable(noop(
                Signature::new("f")
                    .doc("Args:\n    a (Optional[List[int]]): values")
                    .param(Param::new("a")),
            ))
            .unwrap();
        let spec = parser.spec("a").unwrap();
        assert_eq!(spec.terminal, Primitive::Int);
        assert_eq!(spec.arity, Arity::Variable);
        assert!(!spec.required);
        assert_eq!(spec.default, Some(Value::None));
    }

    #[test]
    fn default_infers_type() {
        let mut parser = ArgumentParser::new();
        parser
            .add_callable(noop(
                Signature::new("f").param(Param::new("b").default(0.3)),
            ))
            .unwrap();
        let spec = parser.spec("b").unwrap();
        assert_eq!(spec.terminal, Primitive::Float);
        assert_eq!(spec.default, Some(Value::Float(0.3)));
        assert!(!spec.required);
    }

    #[test]
    fn list_default_infers_sequence() {
        let mut parser = ArgumentParser::new();
        parser
            .add_callable(noop(
                Signature::new("f").param(Param::new("sizes").default(vec![1i64, 2])),
            ))
            .unwrap();
        let spec = parser.spec("sizes").unwrap();
        assert_eq!(spec.terminal, Primitive::Int);
        assert_eq!(spec.arity, Arity::Variable);
    }

    #[test]
    fn missing_type_names_param_and_callable() {
        let mut parser = ArgumentParser::new();
        let err = parser
            .add_callable(noop(Signature::new("f").param(Param::new("a"))))
            .unwrap_err();
        match err {
            Error::MissingType { param, callable } => {
                assert_eq!(param, "a");
                assert_eq!(callable, "f");
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn failed_registration_commits_nothing() {
        let mut parser = ArgumentParser::new();
        let result = parser.add_callable(noop(
            Signature::new("f")
                .param(Param::new("ok").ty("int"))
                .param(Param::new("bad")),
        ));
        assert!(result.is_err());
        assert!(parser.specs().is_empty());
    }

    #[test]
    fn invalid_documented_type_is_a_type_error() {
        let mut parser = ArgumentParser::new();
        let err = parser
            .add_callable(noop(
                Signature::new("f")
                    .doc("Args:\n    a (Union[int, str]): either")
                    .param(Param::new("a")),
            ))
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Type {
                source: TypeError::UnionShape(_),
                ..
            }
        ));
    }

    #[test]
    fn formatter_transforms_flag_names() {
        let mut parser = ArgumentParser::builder().kebab_case().build();
        parser
            .add_callable(noop(
                Signature::new("f").param(Param::new("batch_size").default(32i64)),
            ))
            .unwrap();
        assert!(parser.spec("batch-size").is_some());
        assert_eq!(parser.spec("batch-size").unwrap().param, "batch_size");
    }

    #[test]
    fn formatted_flag_dispatches_to_parameter() {
        let mut parser = ArgumentParser::builder().kebab_case().build();
        let train = parser
            .add_callable(Callable::new(
                Signature::new("train").param(Param::new("batch_size").ty("int")),
                |mut args: CallArgs| {
                    let batch_size: i64 = args.take("batch_size")?;
                    args.finish()?;
                    Ok(batch_size)
                },
            ))
            .unwrap();
        parser.parse_from(["--batch-size", "7"]).unwrap();
        assert_eq!(train.call(&parser).unwrap(), 7);
        assert!(parser.parse_from(["--batch_size", "7"]).is_err());
    }

    #[test]
    fn reserved_flags_are_rejected() {
        let mut parser = ArgumentParser::new();
        let err = parser
            .add_callable(noop(
                Signature::new("f")
                    .param(Param::new("a").ty("int"))
                    .param(Param::new("help").default(1i64)),
            ))
            .unwrap_err();
        match err {
            Error::ReservedFlag { flag, param, callable } => {
                assert_eq!(flag, "help");
                assert_eq!(param, "help");
                assert_eq!(callable, "f");
            }
            other => panic!("unexpected error: {}", other),
        }
        assert!(parser.specs().is_empty());

        // `version` is only taken once the command carries a version
        parser
            .add_callable(noop(Signature::new("g").param(Param::new("version").default(1i64))))
            .unwrap();
        assert!(parser.parse_from(["--version", "2"]).is_ok());

        let mut versioned = ArgumentParser::builder().version("1.0").build();
        let err = versioned
            .add_callable(noop(Signature::new("g").param(Param::new("version").default(1i64))))
            .unwrap_err();
        assert!(matches!(err, Error::ReservedFlag { .. }));
    }

    #[test]
    fn oversized_documented_array_is_a_type_error() {
        let mut parser = ArgumentParser::new();
        let err = parser
            .add_callable(noop(
                Signature::new("f")
                    .doc("Args:\n    a ([int; 9223372036854775807]): too many")
                    .param(Param::new("a")),
            ))
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Type {
                source: TypeError::Syntax { .. },
                ..
            }
        ));
    }

    #[test]
    fn group_defaults_to_callable_name() {
        let mut parser = ArgumentParser::new();
        parser
            .add_callable(noop(Signature::new("train").param(Param::new("a").default(1i64))))
            .unwrap();
        parser
            .add_callable_with(
                noop(Signature::new("eval").param(Param::new("b").default(1i64))),
                CallableOptions::new().group("Evaluation"),
            )
            .unwrap();
        assert_eq!(parser.spec("a").unwrap().group, "train");
        assert_eq!(parser.spec("b").unwrap().group, "Evaluation");
    }

    #[test]
    fn parse_replaces_previous_bag() {
        let mut parser = ArgumentParser::new();
        parser
            .add_callable(noop(Signature::new("f").param(Param::new("a").default(1i64))))
            .unwrap();
        assert!(parser.parsed().is_none());
        parser.parse_from(["--a", "5"]).unwrap();
        assert_eq!(parser.parsed().unwrap().get("a"), Some(&Value::Int(5)));
        parser.parse_from(Vec::<String>::new()).unwrap();
        assert_eq!(parser.parsed().unwrap().get("a"), Some(&Value::Int(1)));
    }

    #[test]
    fn failed_parse_keeps_previous_bag() {
        let mut parser = ArgumentParser::new();
        parser
            .add_callable(noop(Signature::new("f").param(Param::new("a").default(1i64))))
            .unwrap();
        parser.parse_from(["--a", "2"]).unwrap();
        assert!(parser.parse_from(["--a", "x"]).is_err());
        assert_eq!(parser.parsed().unwrap().get("a"), Some(&Value::Int(2)));
    }

    #[test]
    fn repeated_flag_keeps_last_value() {
        let mut parser = ArgumentParser::new();
        parser
            .add_callable(noop(Signature::new("f").param(Param::new("a").default(1i64))))
            .unwrap();
        let parsed = parser.parse_from(["--a", "2", "--a", "3"]).unwrap();
        assert_eq!(parsed.get("a"), Some(&Value::Int(3)));
    }

    #[test]
    fn help_lists_flags_under_group() {
        let mut parser = ArgumentParser::builder().name("demo").about("Demo tool").build();
        parser
            .add_callable(noop(
                Signature::new("train")
                    .doc("Args:\n    lr (float): learning rate")
                    .param(Param::new("lr").default(0.1)),
            ))
            .unwrap();
        let help = parser.render_help();
        assert!(help.contains("Demo tool"));
        assert!(help.contains("train:"));
        assert!(help.contains("--lr <FLOAT>"));
        assert!(help.contains("learning rate [default: 0.1]"));
    }
}
