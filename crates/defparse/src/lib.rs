//! Command line arguments derived from function signatures.
//!
//! `defparse` turns the parameters of ordinary functions into `--flags` of a
//! clap command. Each parameter's flag shape comes from its declared type, the
//! type named in its doc comment or its default value; the doc comment also
//! provides help text. Registering a function returns a wrapper that calls it
//! with the parsed values.
//!
//! # Features
//!
//! - **Typed flags**: integers, floats, strings, booleans, paths and chars
//! - **Shapes**: optional values, fixed and variable length sequences, choice sets
//! - **Toggles**: `bool` parameters become value-less flags
//! - **Sharing**: functions with a parameter of the same name share one flag
//! - **Doc comments**: Google style `Args:` and rustdoc `# Arguments` sections
//!
//! # Usage
//!
//! ```rust
//! use defparse::{callable, ArgumentParser};
//!
//! /// Train the model.
//! ///
//! /// # Arguments
//! ///
//! /// * `epochs` - number of passes over the data
//! /// * `lr` - learning rate
//! #[callable]
//! fn train(epochs: u32, lr: f64, verbose: bool) -> String {
//!     format!("{} epochs at {} (verbose: {})", epochs, lr, verbose)
//! }
//!
//! let mut parser = ArgumentParser::builder().name("trainer").build();
//! let bound = parser.add_callable(train__callable())?;
//! parser.parse_from(["--epochs", "3", "--lr", "0.1", "--verbose"])?;
//! assert_eq!(bound.call(&parser)?, "3 epochs at 0.1 (verbose: true)");
//! # Ok::<(), defparse::Error>(())
//! ```
//!
//! Without the macro, a [`Callable`] is a [`Signature`] plus a closure over
//! [`CallArgs`]; see the [`signature`] module.

mod args;
mod dispatch;
mod docstring;
mod error;
mod grammar;
mod parser;
mod spec;
mod types;
mod value;

pub mod signature;

pub use args::{CallArgs, ParsedArgs};
pub use dispatch::Bound;
pub use docstring::{parse_doc, DocComment, DocParam};
pub use error::{CallError, Error, TypeError};
pub use parser::{ArgumentParser, ArgumentParserBuilder, CallableOptions};
pub use signature::{Callable, Param, Signature, TypeSource};
pub use spec::ArgSpec;
pub use types::{resolve, Arity, Resolution, Resolved, TypeExpr};
pub use value::{FromValue, Ignore, Primitive, Value, ValueError};

pub use defparse_macros::callable;
