// Copyright 2026 the Native Dispatch Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Native fixture callees for `native_dispatch` conformance tests and benches.
//!
//! Every fixture is an `extern "C"` function paired with a [`Fixture`] that records the
//! signature it really has, so tests never have to restate it. The signatures cover each slot
//! class, both return widths of float, and sign-sensitive narrow integers.
//!
//! Fixtures with many arguments use only full-width types. Narrow integers passed on the stack
//! are packed differently by some targets' C conventions, and a trampoline only describes
//! register-width slots.

use core::sync::atomic::{AtomicU64, Ordering};

use native_dispatch::{NativeFn, Signature, Type};

/// A fixture callee and the signature it was compiled with.
#[derive(Copy, Clone, Debug)]
pub struct Fixture {
    /// Short identifier used in test and bench names.
    pub name: &'static str,
    /// Argument types in call order.
    pub args: &'static [Type],
    /// Return type.
    pub ret: Type,
    addr: fn() -> *const (),
}

impl Fixture {
    /// The callee address.
    #[must_use]
    pub fn native(&self) -> NativeFn {
        match NativeFn::new((self.addr)()) {
            Some(f) => f,
            None => unreachable!("function addresses are never null"),
        }
    }

    /// The callee's signature.
    #[must_use]
    pub fn signature(&self) -> Signature {
        match Signature::new(self.args, self.ret) {
            Ok(sig) => sig,
            Err(err) => unreachable!("fixture `{}` has an invalid signature: {err}", self.name),
        }
    }
}

/// `(u64, u8) -> u32`: wrapping sum.
#[allow(
    clippy::cast_possible_truncation,
    reason = "the declared return is 32 bits wide"
)]
pub extern "C" fn add_u64_u8(a: u64, b: u8) -> u32 {
    a.wrapping_add(u64::from(b)) as u32
}

/// `() -> void`.
pub extern "C" fn noop() {}

/// `(i8) -> i64`: sign extension.
pub extern "C" fn widen_i8(x: i8) -> i64 {
    i64::from(x)
}

/// `(i16) -> i16`: wrapping negation.
pub extern "C" fn negate_i16(x: i16) -> i16 {
    x.wrapping_neg()
}

/// `(u32) -> u8`: low byte.
#[allow(
    clippy::cast_possible_truncation,
    reason = "truncation is what this fixture checks"
)]
pub extern "C" fn low_byte(x: u32) -> u8 {
    x as u8
}

/// `(f64, f32) -> f64`.
pub extern "C" fn scale_f64_by_f32(x: f64, k: f32) -> f64 {
    x * f64::from(k)
}

/// `(f32) -> f32`.
pub extern "C" fn half_f32(x: f32) -> f32 {
    x / 2.0
}

/// Ten `u64` arguments, returning their wrapping sum.
pub extern "C" fn sum_ints_10(
    a0: u64,
    a1: u64,
    a2: u64,
    a3: u64,
    a4: u64,
    a5: u64,
    a6: u64,
    a7: u64,
    a8: u64,
    a9: u64,
) -> u64 {
    [a0, a1, a2, a3, a4, a5, a6, a7, a8, a9]
        .into_iter()
        .fold(0, u64::wrapping_add)
}

/// Ten `f64` arguments, returning `sum(i * a_i)` so argument order is observable.
pub extern "C" fn weigh_floats_10(
    a0: f64,
    a1: f64,
    a2: f64,
    a3: f64,
    a4: f64,
    a5: f64,
    a6: f64,
    a7: f64,
    a8: f64,
    a9: f64,
) -> f64 {
    [a0, a1, a2, a3, a4, a5, a6, a7, a8, a9]
        .into_iter()
        .zip(1_u8..)
        .map(|(a, i)| a * f64::from(i))
        .sum()
}

/// `(u64, f64, i32, f32, u16, f64) -> f64`: interleaved classes, each argument weighted so a
/// swapped pair changes the result.
#[allow(clippy::cast_precision_loss, reason = "fixture inputs are small")]
pub extern "C" fn interleave(a: u64, b: f64, c: i32, d: f32, e: u16, f: f64) -> f64 {
    a as f64 + 10.0 * b + 100.0 * f64::from(c) + 1000.0 * f64::from(d) + 10_000.0 * f64::from(e)
        - f
}

/// `(u64, f64) -> u32`: `a` scaled by `k`, truncated toward zero.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::cast_sign_loss,
    reason = "fixture inputs are small and non-negative"
)]
pub extern "C" fn scale_u64(a: u64, k: f64) -> u32 {
    (a as f64 * k) as u32
}

/// `(f64, i32) -> i8`: [`scale_u64`]'s counterpart with the float first and a signed result.
#[allow(
    clippy::cast_possible_truncation,
    reason = "fixture inputs are small"
)]
pub extern "C" fn scale_i32(k: f64, a: i32) -> i8 {
    (k * f64::from(a)) as i8
}

static LAST_RECORDED: AtomicU64 = AtomicU64::new(0);

/// `(u64) -> void`: stores its argument, readable through [`last_recorded`].
pub extern "C" fn record(x: u64) {
    LAST_RECORDED.store(x, Ordering::SeqCst);
}

/// The most recent argument passed to [`record`].
#[must_use]
pub fn last_recorded() -> u64 {
    LAST_RECORDED.load(Ordering::SeqCst)
}

/// `add_u64_u8`.
pub const ADD_U64_U8: Fixture = Fixture {
    name: "add_u64_u8",
    args: &[Type::U64, Type::U8],
    ret: Type::U32,
    addr: || add_u64_u8 as *const (),
};

/// `noop`.
pub const NOOP: Fixture = Fixture {
    name: "noop",
    args: &[],
    ret: Type::Void,
    addr: || noop as *const (),
};

/// `widen_i8`.
pub const WIDEN_I8: Fixture = Fixture {
    name: "widen_i8",
    args: &[Type::I8],
    ret: Type::I64,
    addr: || widen_i8 as *const (),
};

/// `negate_i16`.
pub const NEGATE_I16: Fixture = Fixture {
    name: "negate_i16",
    args: &[Type::I16],
    ret: Type::I16,
    addr: || negate_i16 as *const (),
};

/// `low_byte`.
pub const LOW_BYTE: Fixture = Fixture {
    name: "low_byte",
    args: &[Type::U32],
    ret: Type::U8,
    addr: || low_byte as *const (),
};

/// `scale_f64_by_f32`.
pub const SCALE_F64_BY_F32: Fixture = Fixture {
    name: "scale_f64_by_f32",
    args: &[Type::F64, Type::F32],
    ret: Type::F64,
    addr: || scale_f64_by_f32 as *const (),
};

/// `half_f32`.
pub const HALF_F32: Fixture = Fixture {
    name: "half_f32",
    args: &[Type::F32],
    ret: Type::F32,
    addr: || half_f32 as *const (),
};

/// `sum_ints_10`.
pub const SUM_INTS_10: Fixture = Fixture {
    name: "sum_ints_10",
    args: &[Type::U64; 10],
    ret: Type::U64,
    addr: || sum_ints_10 as *const (),
};

/// `weigh_floats_10`.
pub const WEIGH_FLOATS_10: Fixture = Fixture {
    name: "weigh_floats_10",
    args: &[Type::F64; 10],
    ret: Type::F64,
    addr: || weigh_floats_10 as *const (),
};

/// `interleave`.
pub const INTERLEAVE: Fixture = Fixture {
    name: "interleave",
    args: &[Type::U64, Type::F64, Type::I32, Type::F32, Type::U16, Type::F64],
    ret: Type::F64,
    addr: || interleave as *const (),
};

/// `scale_u64`.
pub const SCALE_U64: Fixture = Fixture {
    name: "scale_u64",
    args: &[Type::U64, Type::F64],
    ret: Type::U32,
    addr: || scale_u64 as *const (),
};

/// `scale_i32`.
pub const SCALE_I32: Fixture = Fixture {
    name: "scale_i32",
    args: &[Type::F64, Type::I32],
    ret: Type::I8,
    addr: || scale_i32 as *const (),
};

/// `record`.
pub const RECORD: Fixture = Fixture {
    name: "record",
    args: &[Type::U64],
    ret: Type::Void,
    addr: || record as *const (),
};

/// Every fixture.
pub const ALL: &[Fixture] = &[
    ADD_U64_U8,
    NOOP,
    WIDEN_I8,
    NEGATE_I16,
    LOW_BYTE,
    SCALE_F64_BY_F32,
    HALF_F32,
    SUM_INTS_10,
    WEIGH_FLOATS_10,
    INTERLEAVE,
    SCALE_U64,
    SCALE_I32,
    RECORD,
];
