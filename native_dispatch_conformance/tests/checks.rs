// Copyright 2026 the Native Dispatch Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Checked failures: every one is reported before the cache or the callee is reached.

#![allow(unsafe_code, reason = "dispatch is an unsafe fn even when it fails early")]

use native_dispatch::{
    ArgumentMismatch, DispatchError, Dispatcher, Limits, Signature, SignatureError, Type, Value,
};
use native_dispatch_conformance::{ALL, NOOP, SUM_INTS_10};

fn sample(ty: Type) -> Value {
    match ty {
        Type::Void => Value::Unit,
        Type::U8 => Value::U8(1),
        Type::U16 => Value::U16(2),
        Type::U32 => Value::U32(3),
        Type::U64 => Value::U64(4),
        Type::I8 => Value::I8(-1),
        Type::I16 => Value::I16(-2),
        Type::I32 => Value::I32(-3),
        Type::I64 => Value::I64(-4),
        Type::F32 => Value::F32(0.5),
        Type::F64 => Value::F64(0.25),
    }
}

/// A value of a different type with the same width.
fn impostor(ty: Type) -> Value {
    match ty {
        Type::Void => Value::Unit,
        Type::U8 => Value::I8(1),
        Type::I8 => Value::U8(1),
        Type::U16 => Value::I16(1),
        Type::I16 => Value::U16(1),
        Type::U32 => Value::F32(1.0),
        Type::I32 | Type::F32 => Value::U32(1),
        Type::U64 => Value::F64(1.0),
        Type::I64 | Type::F64 => Value::U64(1),
    }
}

#[test]
fn same_width_impostors_are_caught_at_their_index() {
    let d = Dispatcher::new(Limits::default()).unwrap();
    for fixture in ALL {
        let sig = fixture.signature();
        let good: Vec<_> = fixture.args.iter().map(|&ty| sample(ty)).collect();
        for (index, &expected) in fixture.args.iter().enumerate() {
            let mut args = good.clone();
            args[index] = impostor(expected);
            assert_eq!(args[index].type_tag().size(), expected.size());

            // SAFETY: rejected before any native call.
            let err = unsafe { d.dispatch(fixture.native(), &sig, &args) };
            assert_eq!(
                err,
                Err(DispatchError::Argument(ArgumentMismatch::Type {
                    index,
                    expected,
                    actual: args[index].type_tag(),
                })),
                "fixture {} argument {index}",
                fixture.name
            );
        }
    }
    assert!(d.cache().is_empty());
}

#[test]
fn wrong_argument_count_is_reported() {
    let d = Dispatcher::new(Limits::default()).unwrap();
    // SAFETY: rejected before any native call.
    let err = unsafe { d.dispatch(NOOP.native(), &NOOP.signature(), &[Value::U8(0)]) };
    assert_eq!(
        err,
        Err(DispatchError::Argument(ArgumentMismatch::Arity {
            expected: 0,
            actual: 1,
        }))
    );
}

#[test]
fn arity_one_above_the_maximum_fails_before_the_cache() {
    let d = Dispatcher::new(Limits::new(9)).unwrap();
    let args = vec![Value::U64(0); 10];
    // SAFETY: rejected before any native call.
    let err = unsafe { d.dispatch(SUM_INTS_10.native(), &SUM_INTS_10.signature(), &args) };
    assert_eq!(
        err,
        Err(DispatchError::Signature(SignatureError::TooManyArguments {
            arity: 10,
            max: 9,
        }))
    );
    assert_eq!(d.stats().shapes, 0);
    assert_eq!(d.stats().builds, 0);

    let max = Limits::DEFAULT_MAX_ARITY;
    let d = Dispatcher::new(Limits::default()).unwrap();
    let wide = Signature::new(&vec![Type::U64; max + 1], Type::Void).unwrap();
    assert_eq!(
        d.prewarm(&wide),
        Err(DispatchError::Signature(SignatureError::TooManyArguments {
            arity: max + 1,
            max,
        }))
    );
    assert!(d.cache().is_empty());
}

#[test]
fn errors_render_and_chain() {
    use std::error::Error;

    let err = DispatchError::from(SignatureError::VoidArgument { index: 2 });
    assert_eq!(
        err.to_string(),
        "invalid signature: argument 2 is void; void is only valid as a return type"
    );
    assert!(err.source().is_some());
}
