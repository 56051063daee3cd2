//! Property-based tests for registration and parsing using proptest.

use defparse::{
    resolve, Arity, ArgumentParser, CallArgs, Callable, Error, Param, Primitive, Resolution,
    Signature, TypeExpr, Value,
};
use proptest::prelude::*;

// ============================================================================
// Test helpers
// ============================================================================

fn noop(signature: Signature) -> Callable<()> {
    Callable::new(signature, |_args: CallArgs| Ok(()))
}

fn echo(name: &str, param: Param) -> Callable<Value> {
    let param_name = param.name().to_string();
    Callable::new(Signature::new(name).param(param), move |mut args: CallArgs| {
        let value = args.take(&param_name)?;
        args.finish()?;
        Ok(value)
    })
}

fn primitive_strategy() -> impl Strategy<Value = Primitive> {
    prop_oneof![
        Just(Primitive::Int),
        Just(Primitive::Float),
        Just(Primitive::Str),
        Just(Primitive::Bool),
        Just(Primitive::Path),
        Just(Primitive::Char),
    ]
}

fn default_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        any::<i64>().prop_map(Value::from),
        (-1.0e6f64..1.0e6).prop_map(Value::Float),
        "[a-z]{1,8}".prop_map(Value::Str),
        any::<bool>().prop_map(Value::Bool),
        any::<char>().prop_map(Value::Char),
    ]
}

fn name_strategy() -> impl Strategy<Value = String> {
    "[a-z][a-z_]{0,10}"
}

// ============================================================================
// Property tests
// ============================================================================

proptest! {
    /// A declared primitive without default is a required flag of that type.
    #[test]
    fn declared_primitive_is_required(name in name_strategy(), primitive in primitive_strategy()) {
        prop_assume!(primitive != Primitive::Bool);
        let mut parser = ArgumentParser::new();
        parser
            .add_callable(noop(Signature::new("f").param(Param::new(name.clone()).ty(primitive))))
            .unwrap();
        let spec = parser.spec(&name).unwrap();
        prop_assert!(spec.required);
        prop_assert_eq!(spec.terminal, primitive);
        prop_assert_eq!(&spec.default, &None);
    }

    /// An untyped parameter takes its type and default from the default value.
    #[test]
    fn default_determines_type(name in name_strategy(), default in default_strategy()) {
        let mut parser = ArgumentParser::new();
        parser
            .add_callable(noop(
                Signature::new("f").param(Param::new(name.clone()).default(default.clone())),
            ))
            .unwrap();
        let spec = parser.spec(&name).unwrap();
        prop_assert!(!spec.required);
        prop_assert_eq!(Some(spec.terminal), default.primitive());
        prop_assert_eq!(spec.default.as_ref(), Some(&default));
    }

    /// Optional parameters are never required, with or without a default.
    #[test]
    fn optional_is_never_required(primitive in primitive_strategy(), with_default in any::<bool>()) {
        let mut param = Param::new("x").ty(TypeExpr::optional(primitive));
        if with_default {
            param = param.default(Value::None);
        }
        let mut parser = ArgumentParser::new();
        parser.add_callable(noop(Signature::new("f").param(param))).unwrap();
        let spec = parser.spec("x").unwrap();
        prop_assert!(!spec.required);
        prop_assert_eq!(spec.terminal, primitive);
    }

    /// A choice set keeps every literal in declaration order.
    #[test]
    fn choices_keep_order(values in prop::collection::btree_set(any::<i64>(), 1..8)) {
        let values: Vec<Value> = values.into_iter().rev().map(Value::from).collect();
        let mut parser = ArgumentParser::new();
        parser
            .add_callable(noop(
                Signature::new("f").param(Param::new("x").ty(TypeExpr::choice(values.clone()))),
            ))
            .unwrap();
        let spec = parser.spec("x").unwrap();
        prop_assert_eq!(spec.terminal, Primitive::Int);
        prop_assert_eq!(spec.choices.as_ref(), Some(&values));
    }

    /// Variable-length flags collect every value given.
    #[test]
    fn list_collects_all_values(values in prop::collection::vec(any::<i64>(), 1..10)) {
        let mut parser = ArgumentParser::new();
        let f = parser
            .add_callable(echo("f", Param::new("x").ty(TypeExpr::list(Primitive::Int))))
            .unwrap();
        prop_assert_eq!(parser.spec("x").unwrap().arity, Arity::Variable);

        let mut tokens = vec!["--x".to_string()];
        tokens.extend(values.iter().map(|v| v.to_string()));
        parser.parse_from(&tokens).unwrap();
        let expected = Value::List(values.into_iter().map(Value::from).collect());
        prop_assert_eq!(f.call(&parser).unwrap(), expected);
    }

    /// Fixed-length flags accept exactly their element count.
    #[test]
    fn tuple_requires_exact_count(len in 1usize..6, given in 1usize..8) {
        let mut parser = ArgumentParser::new();
        parser
            .add_callable(noop(
                Signature::new("f").param(Param::new("x").ty(TypeExpr::tuple_of(Primitive::Int, len))),
            ))
            .unwrap();
        prop_assert_eq!(parser.spec("x").unwrap().arity, Arity::Fixed(len));

        let mut tokens = vec!["--x".to_string()];
        tokens.extend((0..given).map(|i| i.to_string()));
        prop_assert_eq!(parser.parse_from(&tokens).is_ok(), given == len);
    }

    /// Registering the same flag twice with equal types is a no-op.
    #[test]
    fn same_type_registration_is_idempotent(primitive in primitive_strategy(), times in 2usize..5) {
        let mut parser = ArgumentParser::new();
        for i in 0..times {
            parser
                .add_callable(noop(
                    Signature::new(format!("f{}", i)).param(Param::new("x").ty(TypeExpr::optional(primitive))),
                ))
                .unwrap();
        }
        prop_assert_eq!(parser.specs().len(), 1);
        prop_assert_eq!(parser.spec("x").unwrap().group.as_str(), "f0");
    }

    /// Registering the same flag with different types fails in either order.
    #[test]
    fn differing_types_always_conflict(
        first in primitive_strategy(),
        second in primitive_strategy(),
    ) {
        prop_assume!(first != second);
        let mut parser = ArgumentParser::new();
        parser
            .add_callable(noop(Signature::new("f1").param(Param::new("x").ty(first))))
            .unwrap();
        let err = parser
            .add_callable(noop(Signature::new("f2").param(Param::new("x").ty(second))))
            .unwrap_err();
        let is_conflict = matches!(err, Error::TypeConflict { .. });
        prop_assert!(is_conflict);
    }

    /// An ignore-typed parameter never reaches the command line.
    #[test]
    fn ignored_never_registered(name in name_strategy(), doc_type in "(int|float|str|List\\[int\\])") {
        let doc = format!("Args:\n    {} ({}): documented anyway", name, doc_type);
        let mut parser = ArgumentParser::new();
        parser
            .add_callable(noop(
                Signature::new("f")
                    .doc(doc)
                    .param(Param::new(name.clone()).ty(TypeExpr::Ignore)),
            ))
            .unwrap();
        prop_assert!(parser.spec(&name).is_none());
        prop_assert!(parser.specs().is_empty());
    }

    /// Integers survive the trip from the command line to the callable.
    #[test]
    fn parsed_integer_reaches_callable(value in any::<i64>()) {
        let mut parser = ArgumentParser::new();
        let f = parser.add_callable(echo("f", Param::new("n").ty("int"))).unwrap();
        parser.parse_from(["--n".to_string(), value.to_string()]).unwrap();
        prop_assert_eq!(f.call(&parser).unwrap(), Value::from(value));
    }

    /// Outside-in resolution accumulates every layer.
    #[test]
    fn nested_layers_accumulate(primitive in primitive_strategy(), optional in any::<bool>()) {
        let mut expr = TypeExpr::list(primitive);
        if optional {
            expr = TypeExpr::optional(expr);
        }
        match resolve(&expr).unwrap() {
            Resolution::Expose(resolved) => {
                prop_assert_eq!(resolved.terminal, primitive);
                prop_assert_eq!(resolved.arity, Arity::Variable);
                prop_assert_eq!(resolved.optional, optional);
            }
            Resolution::Ignore => prop_assert!(false, "list resolved as ignore"),
        }
    }
}
