// Copyright 2026 the Native Dispatch Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Call-frame marshalling.
//!
//! A [`CallFrame`] is what a trampoline reads: one dense sequence of general-purpose words and
//! one of float words, each in argument order. Integers are widened to a full word according to
//! their declared signedness; floats keep their IEEE bit pattern (an `f32` occupies the low 32
//! bits of its word).

use core::fmt;

use crate::shape::{Layout, SlotClass};
use crate::types::Type;
use crate::value::Value;

/// Arguments did not match the signature they were dispatched against.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ArgumentMismatch {
    /// The number of arguments differs from the signature's arity.
    Arity {
        /// Declared arity.
        expected: usize,
        /// Number of values supplied.
        actual: usize,
    },
    /// A value's tag differs from the declared argument type.
    Type {
        /// Argument position.
        index: usize,
        /// Declared type.
        expected: Type,
        /// Tag of the supplied value.
        actual: Type,
    },
}

impl fmt::Display for ArgumentMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Arity { expected, actual } => {
                write!(f, "expected {expected} arguments, got {actual}")
            }
            Self::Type {
                index,
                expected,
                actual,
            } => write!(f, "argument {index}: expected {expected}, got {actual}"),
        }
    }
}

impl core::error::Error for ArgumentMismatch {}

/// Marshalled arguments, ready for a trampoline.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CallFrame {
    ints: Vec<u64>,
    floats: Vec<u64>,
}

impl CallFrame {
    /// Builds a frame for `layout` from `args`.
    ///
    /// Every tag is checked before anything is written, so a mismatch never leaves a partially
    /// built frame behind.
    pub fn build(layout: &Layout, args: &[Value]) -> Result<Self, ArgumentMismatch> {
        if args.len() != layout.arity() {
            return Err(ArgumentMismatch::Arity {
                expected: layout.arity(),
                actual: args.len(),
            });
        }
        for (index, (slot, value)) in layout.slots().iter().zip(args).enumerate() {
            let actual = value.type_tag();
            if actual != slot.ty {
                return Err(ArgumentMismatch::Type {
                    index,
                    expected: slot.ty,
                    actual,
                });
            }
        }

        let mut frame = Self {
            ints: Vec::with_capacity(layout.int_count()),
            floats: Vec::with_capacity(layout.float_count()),
        };
        for (slot, value) in layout.slots().iter().zip(args) {
            let words = match slot.class {
                SlotClass::Int => &mut frame.ints,
                SlotClass::F32 | SlotClass::F64 => &mut frame.floats,
            };
            debug_assert_eq!(words.len(), slot.index, "layout indices must be dense");
            words.push(slot_word(value));
        }
        Ok(frame)
    }

    /// General-purpose words in slot order.
    #[must_use]
    pub fn ints(&self) -> &[u64] {
        &self.ints
    }

    /// Float words in slot order.
    #[must_use]
    pub fn floats(&self) -> &[u64] {
        &self.floats
    }
}

/// Encodes a value into the word it occupies in a frame.
///
/// Signed integers are sign-extended and unsigned integers zero-extended to 64 bits. Floats
/// keep their bit pattern. [`Value::Unit`] encodes as zero.
#[must_use]
pub fn slot_word(value: &Value) -> u64 {
    match *value {
        Value::Unit => 0,
        Value::U8(v) => u64::from(v),
        Value::U16(v) => u64::from(v),
        Value::U32(v) => u64::from(v),
        Value::U64(v) => v,
        Value::I8(v) => i64::from(v).cast_unsigned(),
        Value::I16(v) => i64::from(v).cast_unsigned(),
        Value::I32(v) => i64::from(v).cast_unsigned(),
        Value::I64(v) => v.cast_unsigned(),
        Value::F32(v) => u64::from(v.to_bits()),
        Value::F64(v) => v.to_bits(),
    }
}
