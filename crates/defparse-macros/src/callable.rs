//! `#[callable]` attribute macro.
//!
//! Keeps the annotated function and generates a descriptor function next to it:
//!
//! ```rust,ignore
//! /// Scale a value.
//! ///
//! /// Args:
//! ///     factor: multiplier
//! #[callable]
//! fn scale(value: i64, #[arg(default = 2.0)] factor: f64) -> f64 {
//!     value as f64 * factor
//! }
//!
//! // Generates:
//! // fn scale__callable() -> ::defparse::Callable<f64> {
//! //     ::defparse::Callable::new(
//! //         ::defparse::Signature::new("scale")
//! //             .doc(" Scale a value.\n\n Args:\n     factor: multiplier")
//! //             .param(::defparse::Param::new("value").ty("i64"))
//! //             .param(::defparse::Param::new("factor").ty("f64").default(...)),
//! //         |mut __args| {
//! //             let value: i64 = __args.take("value")?;
//! //             let factor: f64 = __args.take_or_else("factor", || 2.0)?;
//! //             __args.finish()?;
//! //             Ok(scale(value, factor))
//! //         },
//! //     )
//! // }
//! ```
//!
//! # Parameter Annotations
//!
//! | Annotation | Effect |
//! |------------|--------|
//! | `#[arg(ty = "Literal['a', 'b']")]` | Declares the type with grammar text |
//! | `#[arg(default = expr)]` | Default value, typed as the parameter |
//!
//! Parameters typed `Value` declare no type, so their flag shape comes from
//! the doc comment or the default.

use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use syn::{
    parse::{Parse, ParseStream},
    punctuated::Punctuated,
    spanned::Spanned,
    Attribute, Error, Expr, FnArg, ItemFn, Lit, Meta, Pat, PatType, Result, ReturnType, Token,
    Type,
};

/// Options on `#[callable(...)]`.
struct CallableArgs {
    name: Option<String>,
}

impl Parse for CallableArgs {
    fn parse(input: ParseStream) -> Result<Self> {
        let mut args = CallableArgs { name: None };
        let content: Punctuated<Meta, Token![,]> = Punctuated::parse_terminated(input)?;
        for meta in content {
            match meta {
                Meta::NameValue(nv) if nv.path.is_ident("name") => {
                    args.name = Some(string_literal(&nv.value)?);
                }
                other => {
                    return Err(Error::new(
                        other.span(),
                        "unknown attribute, expected `name`",
                    ))
                }
            }
        }
        Ok(args)
    }
}

/// Options on `#[arg(...)]`.
#[derive(Default)]
struct ArgOptions {
    ty: Option<String>,
    default: Option<Expr>,
}

impl Parse for ArgOptions {
    fn parse(input: ParseStream) -> Result<Self> {
        let mut options = ArgOptions::default();
        let content: Punctuated<Meta, Token![,]> = Punctuated::parse_terminated(input)?;
        for meta in content {
            match meta {
                Meta::NameValue(nv) if nv.path.is_ident("ty") => {
                    options.ty = Some(string_literal(&nv.value)?);
                }
                Meta::NameValue(nv) if nv.path.is_ident("default") => {
                    options.default = Some(nv.value);
                }
                other => {
                    return Err(Error::new(
                        other.span(),
                        "unknown attribute, expected `ty` or `default`",
                    ))
                }
            }
        }
        Ok(options)
    }
}

fn string_literal(expr: &Expr) -> Result<String> {
    if let Expr::Lit(expr_lit) = expr {
        if let Lit::Str(lit_str) = &expr_lit.lit {
            return Ok(lit_str.value());
        }
    }
    Err(Error::new(expr.span(), "expected string literal"))
}

/// One parameter of the annotated function.
struct ParamInfo {
    name: String,
    ty: Type,
    options: ArgOptions,
}

fn parse_param(pat_type: &PatType) -> Result<ParamInfo> {
    let name = match pat_type.pat.as_ref() {
        Pat::Ident(ident) => ident.ident.to_string(),
        other => {
            return Err(Error::new(
                other.span(),
                "expected identifier pattern for parameter",
            ))
        }
    };

    if matches!(pat_type.ty.as_ref(), Type::Reference(_)) {
        return Err(Error::new(
            pat_type.ty.span(),
            "#[callable] parameters must be owned values",
        ));
    }

    let mut options = ArgOptions::default();
    for attr in pat_type.attrs.iter().filter(|a| a.path().is_ident("arg")) {
        let parsed: ArgOptions = attr.parse_args()?;
        if parsed.ty.is_some() {
            options.ty = parsed.ty;
        }
        if parsed.default.is_some() {
            options.default = parsed.default;
        }
    }

    Ok(ParamInfo {
        name,
        ty: (*pat_type.ty).clone(),
        options,
    })
}

/// Check if a type is the dynamic `Value`
fn is_value_type(ty: &Type) -> bool {
    if let Type::Path(type_path) = ty {
        if let Some(segment) = type_path.path.segments.last() {
            return segment.ident == "Value" && segment.arguments.is_empty();
        }
    }
    false
}

/// Joins the `///` lines of the function.
fn doc_comment(attrs: &[Attribute]) -> Option<String> {
    let lines: Vec<String> = attrs
        .iter()
        .filter(|attr| attr.path().is_ident("doc"))
        .filter_map(|attr| match &attr.meta {
            Meta::NameValue(nv) => string_literal(&nv.value).ok(),
            _ => None,
        })
        .collect();
    if lines.is_empty() {
        None
    } else {
        Some(lines.join("\n"))
    }
}

fn generate_param(param: &ParamInfo) -> TokenStream {
    let name = &param.name;
    let ty = &param.ty;

    let declared = match &param.options.ty {
        Some(text) => Some(text.clone()),
        None if is_value_type(ty) => None,
        None => Some(quote!(#ty).to_string()),
    };
    let declared = declared.map(|text| quote! { .ty(#text) });

    let default = param.options.default.as_ref().map(|expr| {
        quote! {
            .default(::defparse::Value::from({
                let __default: #ty = #expr;
                __default
            }))
        }
    });

    quote! {
        .param(::defparse::Param::new(#name) #declared #default)
    }
}

fn generate_extraction(param: &ParamInfo) -> TokenStream {
    let ident = format_ident!("{}", param.name);
    let name = &param.name;
    let ty = &param.ty;

    match &param.options.default {
        Some(expr) => quote! {
            let #ident: #ty = __args.take_or_else(#name, || #expr)?;
        },
        None => quote! {
            let #ident: #ty = __args.take(#name)?;
        },
    }
}

/// Main implementation of the #[callable] macro
pub fn callable_impl(attr: TokenStream, item: TokenStream) -> Result<TokenStream> {
    let fn_item: ItemFn = syn::parse2(item)?;
    let attr_args: CallableArgs = syn::parse2(attr)?;

    if !fn_item.sig.generics.params.is_empty() {
        return Err(Error::new(
            fn_item.sig.generics.span(),
            "#[callable] functions cannot be generic",
        ));
    }
    if let Some(asyncness) = &fn_item.sig.asyncness {
        return Err(Error::new(
            asyncness.span(),
            "#[callable] functions cannot be async",
        ));
    }

    let fn_name = &fn_item.sig.ident;
    let fn_vis = &fn_item.vis;
    let descriptor_name = format_ident!("{}__callable", fn_name);
    let callable_name = attr_args.name.unwrap_or_else(|| fn_name.to_string());

    let mut params = Vec::new();
    for fn_arg in &fn_item.sig.inputs {
        match fn_arg {
            FnArg::Typed(pat_type) => params.push(parse_param(pat_type)?),
            FnArg::Receiver(_) => {
                return Err(Error::new(
                    fn_arg.span(),
                    "#[callable] functions cannot have self parameter",
                ));
            }
        }
    }

    let return_type = match &fn_item.sig.output {
        ReturnType::Default => quote! { () },
        ReturnType::Type(_, ty) => quote! { #ty },
    };

    let doc = doc_comment(&fn_item.attrs).map(|doc| quote! { .doc(#doc) });
    let param_descriptors: Vec<TokenStream> = params.iter().map(generate_param).collect();
    let extractions: Vec<TokenStream> = params.iter().map(generate_extraction).collect();
    let call_args: Vec<_> = params
        .iter()
        .map(|p| format_ident!("{}", p.name))
        .collect();

    let mut clean_fn = fn_item.clone();
    for fn_arg in &mut clean_fn.sig.inputs {
        if let FnArg::Typed(pat_type) = fn_arg {
            pat_type.attrs.retain(|attr| !attr.path().is_ident("arg"));
        }
    }

    Ok(quote! {
        #clean_fn

        #[allow(non_snake_case)]
        #fn_vis fn #descriptor_name() -> ::defparse::Callable<#return_type> {
            ::defparse::Callable::new(
                ::defparse::Signature::new(#callable_name)
                    #doc
                    #(#param_descriptors)*,
                |mut __args: ::defparse::CallArgs| {
                    #(#extractions)*
                    __args.finish()?;
                    ::core::result::Result::Ok(#fn_name(#(#call_args),*))
                },
            )
        }
    })
}
