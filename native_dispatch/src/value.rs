// Copyright 2026 the Native Dispatch Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tagged runtime values exchanged with native callees.
//!
//! A [`Value`] carries exactly one typed payload. Its tag is authoritative at the call boundary:
//! a `U8` is never accepted where an `I32` is declared, even though both travel in the same
//! integer slot.

use core::fmt;

use crate::types::Type;

/// A runtime value.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Value {
    /// `()`, the result of a `void` call.
    Unit,
    /// Unsigned 8-bit integer.
    U8(u8),
    /// Unsigned 16-bit integer.
    U16(u16),
    /// Unsigned 32-bit integer.
    U32(u32),
    /// Unsigned 64-bit integer.
    U64(u64),
    /// Signed 8-bit integer.
    I8(i8),
    /// Signed 16-bit integer.
    I16(i16),
    /// Signed 32-bit integer.
    I32(i32),
    /// Signed 64-bit integer.
    I64(i64),
    /// 32-bit float.
    F32(f32),
    /// 64-bit float.
    F64(f64),
}

impl Value {
    /// Returns the [`Type`] this value's tag denotes.
    #[must_use]
    #[inline]
    pub const fn type_tag(&self) -> Type {
        match self {
            Self::Unit => Type::Void,
            Self::U8(_) => Type::U8,
            Self::U16(_) => Type::U16,
            Self::U32(_) => Type::U32,
            Self::U64(_) => Type::U64,
            Self::I8(_) => Type::I8,
            Self::I16(_) => Type::I16,
            Self::I32(_) => Type::I32,
            Self::I64(_) => Type::I64,
            Self::F32(_) => Type::F32,
            Self::F64(_) => Type::F64,
        }
    }

    /// Reinterprets a native-endian byte buffer as a value of type `ty`.
    ///
    /// `bytes` must be exactly `ty.size()` long; `void` decodes from an empty buffer to
    /// [`Value::Unit`]. Floats are reinterpreted bit-for-bit.
    pub fn decode(ty: Type, bytes: &[u8]) -> Result<Self, DecodeError> {
        Ok(match ty {
            Type::Void => {
                if !bytes.is_empty() {
                    return Err(DecodeError::BadWidth {
                        ty,
                        expected: 0,
                        actual: bytes.len(),
                    });
                }
                Self::Unit
            }
            Type::U8 => Self::U8(u8::from_ne_bytes(take(ty, bytes)?)),
            Type::U16 => Self::U16(u16::from_ne_bytes(take(ty, bytes)?)),
            Type::U32 => Self::U32(u32::from_ne_bytes(take(ty, bytes)?)),
            Type::U64 => Self::U64(u64::from_ne_bytes(take(ty, bytes)?)),
            Type::I8 => Self::I8(i8::from_ne_bytes(take(ty, bytes)?)),
            Type::I16 => Self::I16(i16::from_ne_bytes(take(ty, bytes)?)),
            Type::I32 => Self::I32(i32::from_ne_bytes(take(ty, bytes)?)),
            Type::I64 => Self::I64(i64::from_ne_bytes(take(ty, bytes)?)),
            Type::F32 => Self::F32(f32::from_ne_bytes(take(ty, bytes)?)),
            Type::F64 => Self::F64(f64::from_ne_bytes(take(ty, bytes)?)),
        })
    }

    /// Returns the native-endian bytes of the payload (empty for [`Value::Unit`]).
    #[must_use]
    pub fn to_ne_bytes(&self) -> Vec<u8> {
        match *self {
            Self::Unit => Vec::new(),
            Self::U8(v) => v.to_ne_bytes().to_vec(),
            Self::U16(v) => v.to_ne_bytes().to_vec(),
            Self::U32(v) => v.to_ne_bytes().to_vec(),
            Self::U64(v) => v.to_ne_bytes().to_vec(),
            Self::I8(v) => v.to_ne_bytes().to_vec(),
            Self::I16(v) => v.to_ne_bytes().to_vec(),
            Self::I32(v) => v.to_ne_bytes().to_vec(),
            Self::I64(v) => v.to_ne_bytes().to_vec(),
            Self::F32(v) => v.to_ne_bytes().to_vec(),
            Self::F64(v) => v.to_ne_bytes().to_vec(),
        }
    }
}

fn take<const N: usize>(ty: Type, bytes: &[u8]) -> Result<[u8; N], DecodeError> {
    bytes.try_into().map_err(|_| DecodeError::BadWidth {
        ty,
        expected: N,
        actual: bytes.len(),
    })
}

/// A byte buffer could not be decoded as the requested type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DecodeError {
    /// The buffer length does not match the type's size.
    BadWidth {
        /// Requested type.
        ty: Type,
        /// Size of `ty` in bytes.
        expected: usize,
        /// Length of the buffer.
        actual: usize,
    },
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BadWidth {
                ty,
                expected,
                actual,
            } => write!(
                f,
                "cannot decode {ty} from {actual} bytes (expected {expected})"
            ),
        }
    }
}

impl core::error::Error for DecodeError {}

#[cfg(test)]
mod tests {
    use super::{DecodeError, Value};
    use crate::types::Type;

    #[test]
    fn integers_decode_with_their_signedness() {
        let bytes = 0xff_u8.to_ne_bytes();
        assert_eq!(Value::decode(Type::U8, &bytes), Ok(Value::U8(255)));
        assert_eq!(Value::decode(Type::I8, &bytes), Ok(Value::I8(-1)));

        let bytes = (-2_i32).to_ne_bytes();
        assert_eq!(Value::decode(Type::I32, &bytes), Ok(Value::I32(-2)));
        assert_eq!(Value::decode(Type::U32, &bytes), Ok(Value::U32(u32::MAX - 1)));
    }

    #[test]
    fn floats_decode_bit_for_bit() {
        let nan = f64::from_bits(0x7ff8_0000_dead_beef);
        let Ok(Value::F64(back)) = Value::decode(Type::F64, &nan.to_ne_bytes()) else {
            panic!("expected an f64");
        };
        assert_eq!(back.to_bits(), nan.to_bits());

        let v = Value::F32(-0.0);
        let Ok(Value::F32(back)) = Value::decode(Type::F32, &v.to_ne_bytes()) else {
            panic!("expected an f32");
        };
        assert_eq!(back.to_bits(), (-0.0_f32).to_bits());
    }

    #[test]
    fn wrong_width_is_rejected() {
        assert_eq!(
            Value::decode(Type::U16, &[1, 2, 3]),
            Err(DecodeError::BadWidth {
                ty: Type::U16,
                expected: 2,
                actual: 3,
            })
        );
        assert_eq!(Value::decode(Type::Void, &[]), Ok(Value::Unit));
        assert!(Value::decode(Type::Void, &[0]).is_err());
    }

    #[test]
    fn type_tag_matches_decoded_type() {
        for ty in Type::ALL {
            let bytes = vec![0_u8; ty.size()];
            let value = Value::decode(ty, &bytes).unwrap();
            assert_eq!(value.type_tag(), ty);
            assert_eq!(value.to_ne_bytes(), bytes);
        }
    }
}
