//! Parameter descriptors and callables.
//!
//! Rust has no runtime signature reflection, so a callable carries an explicit
//! [`Signature`]: its name, its doc comment and one [`Param`] per formal
//! parameter. The `#[callable]` macro writes these from the function item; they
//! can also be built by hand:
//!
//! ```rust
//! use defparse::{Callable, CallArgs, Param, Signature};
//!
//! let scale = Callable::new(
//!     Signature::new("scale")
//!         .doc("Args:\n    factor (float): multiplier")
//!         .param(Param::new("value").ty("i64"))
//!         .param(Param::new("factor")),
//!     |mut args: CallArgs| {
//!         let value: i64 = args.take("value")?;
//!         let factor: f64 = args.take("factor")?;
//!         args.finish()?;
//!         Ok(value as f64 * factor)
//!     },
//! );
//! assert_eq!(scale.name(), "scale");
//! ```

use crate::args::CallArgs;
use crate::error::{CallError, TypeError};
use crate::types::TypeExpr;
use crate::value::{Primitive, Value};
use std::fmt;

/// Where a parameter's type comes from: a built expression or grammar text.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeSource {
    Expr(TypeExpr),
    Text(String),
}

impl TypeSource {
    /// Produces the type expression, parsing text through the type grammar.
    pub fn to_expr(&self) -> Result<TypeExpr, TypeError> {
        match self {
            TypeSource::Expr(expr) => Ok(expr.clone()),
            TypeSource::Text(text) => text.parse(),
        }
    }
}

impl From<TypeExpr> for TypeSource {
    fn from(expr: TypeExpr) -> Self {
        TypeSource::Expr(expr)
    }
}

impl From<Primitive> for TypeSource {
    fn from(p: Primitive) -> Self {
        TypeSource::Expr(TypeExpr::Primitive(p))
    }
}

impl From<&str> for TypeSource {
    fn from(text: &str) -> Self {
        TypeSource::Text(text.to_string())
    }
}

impl From<String> for TypeSource {
    fn from(text: String) -> Self {
        TypeSource::Text(text)
    }
}

/// One formal parameter of a callable.
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    name: String,
    ty: Option<TypeSource>,
    default: Option<Value>,
}

impl Param {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ty: None,
            default: None,
        }
    }

    /// Declares the parameter's type.
    pub fn ty(mut self, ty: impl Into<TypeSource>) -> Self {
        self.ty = Some(ty.into());
        self
    }

    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn declared_type(&self) -> Option<&TypeSource> {
        self.ty.as_ref()
    }

    pub fn default_value(&self) -> Option<&Value> {
        self.default.as_ref()
    }
}

/// Name, documentation and parameters of a callable.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Signature {
    name: String,
    doc: Option<String>,
    params: Vec<Param>,
}

impl Signature {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            doc: None,
            params: Vec::new(),
        }
    }

    pub fn doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = Some(doc.into());
        self
    }

    pub fn param(mut self, param: Param) -> Self {
        self.params.push(param);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn doc_comment(&self) -> Option<&str> {
        self.doc.as_deref()
    }

    pub fn params(&self) -> &[Param] {
        &self.params
    }

    /// Returns `true` if the callable declares a parameter called `name`.
    pub fn has_param(&self, name: &str) -> bool {
        self.params.iter().any(|p| p.name == name)
    }
}

type Body<R> = Box<dyn Fn(CallArgs) -> Result<R, CallError>>;

/// A function paired with the signature that describes it.
///
/// The body receives every argument by name and converts it to the types the
/// function needs; it should reject names it does not know with
/// [`CallArgs::finish`].
pub struct Callable<R> {
    signature: Signature,
    body: Body<R>,
}

impl<R> Callable<R> {
    pub fn new<F>(signature: Signature, body: F) -> Self
    where
        F: Fn(CallArgs) -> Result<R, CallError> + 'static,
    {
        Self {
            signature,
            body: Box::new(body),
        }
    }

    pub fn name(&self) -> &str {
        self.signature.name()
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    /// Invokes the function with exactly `args`.
    pub fn call(&self, args: CallArgs) -> Result<R, CallError> {
        (self.body)(args)
    }
}

impl<R> fmt::Debug for Callable<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callable")
            .field("signature", &self.signature)
            .finish_non_exhaustive()
    }
}
