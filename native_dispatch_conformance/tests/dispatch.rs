// Copyright 2026 the Native Dispatch Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! End-to-end calls into real `extern "C"` fixtures.

#![allow(unsafe_code, reason = "every test calls a native fixture")]

use native_dispatch::{Dispatcher, Limits, Value};
use native_dispatch_conformance::{
    ADD_U64_U8, Fixture, HALF_F32, INTERLEAVE, LOW_BYTE, NEGATE_I16, NOOP, RECORD,
    SCALE_F64_BY_F32, SUM_INTS_10, WEIGH_FLOATS_10, WIDEN_I8, last_recorded,
};

fn call(d: &Dispatcher, fixture: &Fixture, args: &[Value]) -> Value {
    // SAFETY: fixtures carry their real signatures.
    unsafe { d.dispatch(fixture.native(), &fixture.signature(), args) }.unwrap()
}

fn dispatcher() -> Dispatcher {
    Dispatcher::new(Limits::default()).unwrap()
}

#[test]
fn add_u64_u8_returns_u32() {
    let d = dispatcher();
    assert_eq!(
        call(&d, &ADD_U64_U8, &[Value::U64(7), Value::U8(3)]),
        Value::U32(10)
    );
    // The sum wraps at 32 bits in the callee; the decoder must not widen it back.
    assert_eq!(
        call(&d, &ADD_U64_U8, &[Value::U64(u64::from(u32::MAX)), Value::U8(2)]),
        Value::U32(1)
    );
}

#[test]
fn noop_returns_unit() {
    assert_eq!(call(&dispatcher(), &NOOP, &[]), Value::Unit);
}

#[test]
fn narrow_signed_arguments_and_returns() {
    let d = dispatcher();
    assert_eq!(call(&d, &WIDEN_I8, &[Value::I8(-5)]), Value::I64(-5));
    assert_eq!(call(&d, &WIDEN_I8, &[Value::I8(i8::MIN)]), Value::I64(-128));
    assert_eq!(call(&d, &NEGATE_I16, &[Value::I16(300)]), Value::I16(-300));
    assert_eq!(
        call(&d, &NEGATE_I16, &[Value::I16(i16::MIN)]),
        Value::I16(i16::MIN)
    );
    assert_eq!(
        call(&d, &LOW_BYTE, &[Value::U32(0x1234_56ab)]),
        Value::U8(0xab)
    );
}

#[test]
fn float_widths_are_preserved() {
    let d = dispatcher();
    assert_eq!(
        call(&d, &SCALE_F64_BY_F32, &[Value::F64(1.5), Value::F32(2.0)]),
        Value::F64(3.0)
    );
    assert_eq!(call(&d, &HALF_F32, &[Value::F32(3.0)]), Value::F32(1.5));
}

#[test]
fn ten_integer_arguments_spill_in_order() {
    let d = dispatcher();
    let args: Vec<_> = (1..=10).map(Value::U64).collect();
    assert_eq!(call(&d, &SUM_INTS_10, &args), Value::U64(55));

    let mut wrapping = vec![Value::U64(0); 10];
    wrapping[0] = Value::U64(u64::MAX);
    wrapping[9] = Value::U64(2);
    assert_eq!(call(&d, &SUM_INTS_10, &wrapping), Value::U64(1));
}

#[test]
fn ten_float_arguments_spill_in_order() {
    let d = dispatcher();
    let args: Vec<_> = (1..=10_u8).map(|i| Value::F64(f64::from(i))).collect();
    // sum of i * i for i in 1..=10
    assert_eq!(call(&d, &WEIGH_FLOATS_10, &args), Value::F64(385.0));

    let mut swapped = args;
    swapped.swap(3, 4);
    assert_eq!(call(&d, &WEIGH_FLOATS_10, &swapped), Value::F64(384.0));
}

#[test]
fn interleaved_classes_land_in_their_slots() {
    let d = dispatcher();
    let args = [
        Value::U64(1),
        Value::F64(2.0),
        Value::I32(-3),
        Value::F32(4.0),
        Value::U16(5),
        Value::F64(6.0),
    ];
    assert_eq!(call(&d, &INTERLEAVE, &args), Value::F64(53_715.0));
}

#[test]
fn void_callee_side_effects_are_visible() {
    let d = dispatcher();
    assert_eq!(call(&d, &RECORD, &[Value::U64(0xfeed)]), Value::Unit);
    assert_eq!(last_recorded(), 0xfeed);
}
