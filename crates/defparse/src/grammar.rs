//! Closed grammar for type text.
//!
//! Type names written in doc comments (and the stringified Rust types the
//! `#[callable]` macro records) are parsed into a [`TypeExpr`] here. Nothing is
//! evaluated: only the spellings below are understood.
//!
//! ```text
//! type    := '&' lifetime? type
//!          | '(' ')'                          -- None
//!          | '(' type (',' type)* ','? ')'    -- tuple, or a parenthesized type
//!          | '[' type ';' INT ']'             -- fixed tuple of INT
//!          | '[' type ']'                     -- list
//!          | path args?
//! path    := IDENT (('::' | '.') IDENT)*      -- only the last segment counts
//! args    := ('[' | '<') arg (',' arg)* ','? (']' | '>')
//! arg     := type | literal | '...'
//! literal := INT | FLOAT | STRING | true | false | True | False
//! ```
//!
//! | Name | Arguments | Meaning |
//! |------|-----------|---------|
//! | `Optional`, `Option` | `T` | `T \| None` |
//! | `Union` | `A, B, ..` | union |
//! | `List`, `list`, `Vec`, `Sequence` | `T` | variable-length sequence |
//! | `Tuple`, `tuple` | `T, T, ..` | fixed tuple (`T, ...` is a sequence) |
//! | `Literal` | `v1, v2, ..` | choice set |
//! | `Ignore` | any | keep off the command line |
//! | `None`, `NoneType` | | the null type |
//! | primitive names | | see [`Primitive::from_name`] |

use crate::error::TypeError;
use crate::types::TypeExpr;
use crate::value::{Primitive, Value};
use std::str::FromStr;

/// Largest `[T; N]` a flag may declare; each element is one command line value.
const MAX_ARRAY_LEN: usize = 1024;

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Ident(String),
    Int(i128),
    Float(f64),
    Str(String),
    Open(char),
    Close(char),
    Comma,
    Semi,
    Amp,
    Lifetime,
    PathSep,
    Ellipsis,
}

fn tokenize(input: &str) -> Result<Vec<Token>, TypeError> {
    let chars: Vec<char> = input.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            c if c.is_whitespace() => i += 1,
            '[' | '<' | '(' => {
                tokens.push(Token::Open(c));
                i += 1;
            }
            ']' | '>' | ')' => {
                tokens.push(Token::Close(c));
                i += 1;
            }
            ',' => {
                tokens.push(Token::Comma);
                i += 1;
            }
            ';' => {
                tokens.push(Token::Semi);
                i += 1;
            }
            '&' => {
                tokens.push(Token::Amp);
                i += 1;
            }
            ':' if chars.get(i + 1) == Some(&':') => {
                tokens.push(Token::PathSep);
                i += 2;
            }
            '.' if chars.get(i + 1) == Some(&'.') && chars.get(i + 2) == Some(&'.') => {
                tokens.push(Token::Ellipsis);
                i += 3;
            }
            '.' => {
                tokens.push(Token::PathSep);
                i += 1;
            }
            '\'' if tokens.last() == Some(&Token::Amp) => {
                // `&'a str`: lifetimes carry no type information
                i += 1;
                while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_') {
                    i += 1;
                }
                tokens.push(Token::Lifetime);
            }
            '\'' | '"' => {
                let quote = c;
                let mut text = String::new();
                i += 1;
                loop {
                    match chars.get(i) {
                        None => return Err(TypeError::syntax(input, "unterminated string")),
                        Some('\\') => {
                            if let Some(next) = chars.get(i + 1) {
                                text.push(*next);
                            }
                            i += 2;
                        }
                        Some(ch) if *ch == quote => {
                            i += 1;
                            break;
                        }
                        Some(ch) => {
                            text.push(*ch);
                            i += 1;
                        }
                    }
                }
                tokens.push(Token::Str(text));
            }
            c if c.is_ascii_digit()
                || (c == '-' && chars.get(i + 1).is_some_and(|n| n.is_ascii_digit())) =>
            {
                let start = i;
                i += 1;
                while i < chars.len() {
                    let ch = chars[i];
                    let exponent_sign =
                        (ch == '-' || ch == '+') && matches!(chars[i - 1], 'e' | 'E');
                    if ch.is_ascii_digit() || ch == '_' || ch == 'e' || ch == 'E' || exponent_sign
                    {
                        i += 1;
                    } else if ch == '.' && chars.get(i + 1).is_some_and(|n| n.is_ascii_digit()) {
                        i += 1;
                    } else {
                        break;
                    }
                }
                let text: String = chars[start..i].iter().filter(|ch| **ch != '_').collect();
                let token = if text.contains(['.', 'e', 'E']) {
                    text.parse::<f64>().map(Token::Float).ok()
                } else {
                    text.parse::<i128>().map(Token::Int).ok()
                };
                let token = token.ok_or_else(|| {
                    TypeError::syntax(input, format!("invalid number `{}`", text))
                })?;
                tokens.push(token);
            }
            c if c.is_alphabetic() || c == '_' => {
                let start = i;
                while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_') {
                    i += 1;
                }
                tokens.push(Token::Ident(chars[start..i].iter().collect()));
            }
            other => {
                return Err(TypeError::syntax(
                    input,
                    format!("unexpected character `{}`", other),
                ))
            }
        }
    }

    Ok(tokens)
}

/// A type argument: most markers take types, `Literal` takes values.
enum Arg {
    Type(TypeExpr),
    Literal(Value),
    Ellipsis,
}

struct Parser<'a> {
    input: &'a str,
    tokens: Vec<Token>,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Result<Self, TypeError> {
        Ok(Self {
            input,
            tokens: tokenize(input)?,
            pos: 0,
        })
    }

    fn error(&self, message: impl Into<String>) -> TypeError {
        TypeError::syntax(self.input, message)
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        token
    }

    fn eat(&mut self, token: &Token) -> bool {
        if self.peek() == Some(token) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, token: Token, what: &str) -> Result<(), TypeError> {
        if self.eat(&token) {
            Ok(())
        } else {
            Err(self.error(format!("expected {}", what)))
        }
    }

    fn parse(mut self) -> Result<TypeExpr, TypeError> {
        if self.tokens.is_empty() {
            return Err(self.error("empty type"));
        }
        let expr = self.parse_type()?;
        match self.peek() {
            None => Ok(expr),
            Some(token) => Err(self.error(format!("unexpected trailing {:?}", token))),
        }
    }

    fn parse_type(&mut self) -> Result<TypeExpr, TypeError> {
        match self.next() {
            Some(Token::Amp) => {
                self.eat(&Token::Lifetime);
                self.parse_type()
            }
            Some(Token::Open('(')) => self.parse_paren(),
            Some(Token::Open('[')) => self.parse_array(),
            Some(Token::Ident(first)) => {
                let mut name = first;
                while self.eat(&Token::PathSep) {
                    match self.next() {
                        Some(Token::Ident(segment)) => name = segment,
                        _ => return Err(self.error("expected identifier after path separator")),
                    }
                }
                let args = match self.peek() {
                    Some(Token::Open('[')) | Some(Token::Open('<')) => Some(self.parse_args()?),
                    _ => None,
                };
                self.build(&name, args)
            }
            Some(token) => Err(self.error(format!("unexpected {:?}", token))),
            None => Err(self.error("unexpected end of type")),
        }
    }

    fn parse_paren(&mut self) -> Result<TypeExpr, TypeError> {
        if self.eat(&Token::Close(')')) {
            return Ok(TypeExpr::NoneType);
        }
        let mut items = vec![self.parse_type()?];
        let mut trailing_comma = false;
        while self.eat(&Token::Comma) {
            trailing_comma = true;
            if self.peek() == Some(&Token::Close(')')) {
                break;
            }
            trailing_comma = false;
            items.push(self.parse_type()?);
        }
        self.expect(Token::Close(')'), "`)`")?;
        if items.len() == 1 && !trailing_comma {
            Ok(items.remove(0))
        } else {
            Ok(TypeExpr::Tuple(items))
        }
    }

    fn parse_array(&mut self) -> Result<TypeExpr, TypeError> {
        let elem = self.parse_type()?;
        if self.eat(&Token::Close(']')) {
            return Ok(TypeExpr::list(elem));
        }
        self.expect(Token::Semi, "`;` or `]`")?;
        let len = match self.next() {
            Some(Token::Int(n)) => match usize::try_from(n) {
                Ok(len) if len <= MAX_ARRAY_LEN => len,
                _ => {
                    return Err(self.error(format!(
                        "array length {} is outside 0..={}",
                        n, MAX_ARRAY_LEN
                    )))
                }
            },
            _ => return Err(self.error("expected array length")),
        };
        self.expect(Token::Close(']'), "`]`")?;
        Ok(TypeExpr::tuple_of(elem, len))
    }

    fn parse_args(&mut self) -> Result<Vec<Arg>, TypeError> {
        let close = match self.next() {
            Some(Token::Open('[')) => ']',
            Some(Token::Open('<')) => '>',
            _ => return Err(self.error("expected `[` or `<`")),
        };
        let mut args = Vec::new();
        loop {
            if self.eat(&Token::Close(close)) {
                break;
            }
            args.push(self.parse_arg()?);
            if !self.eat(&Token::Comma) {
                self.expect(Token::Close(close), &format!("`{}`", close))?;
                break;
            }
        }
        Ok(args)
    }

    fn parse_arg(&mut self) -> Result<Arg, TypeError> {
        if self.eat(&Token::Ellipsis) {
            return Ok(Arg::Ellipsis);
        }
        let literal = match self.peek() {
            Some(Token::Int(i)) => Some(Value::Int(*i)),
            Some(Token::Float(x)) => Some(Value::Float(*x)),
            Some(Token::Str(s)) => Some(Value::Str(s.clone())),
            Some(Token::Ident(id)) if id == "true" || id == "True" => Some(Value::Bool(true)),
            Some(Token::Ident(id)) if id == "false" || id == "False" => Some(Value::Bool(false)),
            _ => None,
        };
        match literal {
            Some(value) => {
                self.pos += 1;
                Ok(Arg::Literal(value))
            }
            None => self.parse_type().map(Arg::Type),
        }
    }

    fn build(&self, name: &str, args: Option<Vec<Arg>>) -> Result<TypeExpr, TypeError> {
        let Some(args) = args else {
            return match name {
                "None" | "NoneType" => Ok(TypeExpr::NoneType),
                "Ignore" => Ok(TypeExpr::Ignore),
                _ => Primitive::from_name(name)
                    .map(TypeExpr::Primitive)
                    .ok_or_else(|| self.error(format!("unknown type name `{}`", name))),
            };
        };

        match name {
            "Ignore" => Ok(TypeExpr::Ignore),
            "Literal" => {
                let values = args
                    .into_iter()
                    .map(|arg| match arg {
                        Arg::Literal(value) => Ok(value),
                        _ => Err(self.error("`Literal` accepts only literal values")),
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(TypeExpr::Choice(values))
            }
            "Optional" | "Option" => match self.types(name, args)?.as_slice() {
                [inner] => Ok(TypeExpr::optional(inner.clone())),
                _ => Err(self.error(format!("`{}` takes exactly one type", name))),
            },
            "Union" => Ok(TypeExpr::Union(self.types(name, args)?)),
            "List" | "list" | "Vec" | "Sequence" => match self.types(name, args)?.as_slice() {
                [inner] => Ok(TypeExpr::list(inner.clone())),
                _ => Err(self.error(format!("`{}` takes exactly one type", name))),
            },
            "Tuple" | "tuple" => {
                if let [Arg::Type(inner), Arg::Ellipsis] = args.as_slice() {
                    return Ok(TypeExpr::list(inner.clone()));
                }
                Ok(TypeExpr::Tuple(self.types(name, args)?))
            }
            _ => Err(self.error(format!("`{}` does not take type arguments", name))),
        }
    }

    fn types(&self, name: &str, args: Vec<Arg>) -> Result<Vec<TypeExpr>, TypeError> {
        args.into_iter()
            .map(|arg| match arg {
                Arg::Type(ty) => Ok(ty),
                _ => Err(self.error(format!("`{}` accepts only types", name))),
            })
            .collect()
    }
}

impl FromStr for TypeExpr {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Parser::new(s)?.parse()
    }
}
