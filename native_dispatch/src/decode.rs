// Copyright 2026 the Native Dispatch Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Return-value decoding.

use crate::types::Type;
use crate::value::Value;

/// The raw 64-bit word a trampoline captured from the callee's return register.
///
/// For float returns, the word holds the IEEE bit pattern (an `f32` in the low 32 bits). For
/// integer returns, only the low `size_of(ret)` bytes are meaningful; the callee may leave
/// anything in the upper bits.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct RawReturn(pub u64);

/// Reinterprets `raw` as a value of the declared return type.
///
/// Integers are truncated to their width and read with their signedness; floats are
/// reinterpreted bit-for-bit; `void` always yields [`Value::Unit`]. Total.
#[must_use]
#[allow(
    clippy::cast_possible_truncation,
    reason = "truncating the return word to the declared width is the point"
)]
pub fn decode_return(raw: RawReturn, ty: Type) -> Value {
    let word = raw.0;
    match ty {
        Type::Void => Value::Unit,
        Type::U8 => Value::U8(word as u8),
        Type::U16 => Value::U16(word as u16),
        Type::U32 => Value::U32(word as u32),
        Type::U64 => Value::U64(word),
        Type::I8 => Value::I8(word as i8),
        Type::I16 => Value::I16(word as i16),
        Type::I32 => Value::I32(word as i32),
        Type::I64 => Value::I64(word.cast_signed()),
        Type::F32 => Value::F32(f32::from_bits(word as u32)),
        Type::F64 => Value::F64(f64::from_bits(word)),
    }
}
