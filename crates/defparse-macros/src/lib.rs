//! Proc macros for defparse.
//!
//! - [`callable`] - Describe a free function as a `defparse::Callable`
//!
//! Use the re-export from the `defparse` crate rather than depending on this
//! crate directly; the generated code refers to `::defparse`.

use proc_macro::TokenStream;

mod callable;

/// Generates a `<name>__callable()` descriptor for a free function.
///
/// The descriptor carries the function's name, its `///` doc comment and one
/// parameter entry per argument, with the Rust type as declared type. Calling
/// the descriptor's body converts each named argument to the parameter type
/// and calls the function.
///
/// # Attributes
///
/// | Attribute | Description |
/// |-----------|-------------|
/// | `#[callable(name = "x")]` | Callable name (default: the function name) |
/// | `#[arg(ty = "...")]` | Declared type as grammar text |
/// | `#[arg(default = expr)]` | Default value |
///
/// # Example
///
/// ```rust,ignore
/// use defparse::{callable, ArgumentParser};
///
/// /// Args:
/// ///     optimizer: which optimizer to use
/// #[callable]
/// fn train(
///     #[arg(ty = "Literal['sgd', 'adam']", default = "sgd".to_string())] optimizer: String,
///     epochs: Option<u32>,
/// ) -> String {
///     format!("{} for {:?} epochs", optimizer, epochs)
/// }
///
/// let mut parser = ArgumentParser::new();
/// let train = parser.add_callable(train__callable())?;
/// ```
///
/// # Errors
///
/// Compile errors for `self` receivers, reference parameters, non-identifier
/// patterns, generic or async functions and unknown attribute keys.
#[proc_macro_attribute]
pub fn callable(attr: TokenStream, item: TokenStream) -> TokenStream {
    let attr = proc_macro2::TokenStream::from(attr);
    let item = proc_macro2::TokenStream::from(item);
    callable::callable_impl(attr, item)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}
