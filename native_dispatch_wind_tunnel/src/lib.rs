// Copyright 2026 the Native Dispatch Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Shared inputs for the `native_dispatch` wind-tunnel benches.

use native_dispatch::{Signature, SignatureError, Type, Value};
use native_dispatch_conformance::Fixture;

/// Arguments matching `fixture`'s signature, with small distinct payloads.
#[must_use]
pub fn args_for(fixture: &Fixture) -> Vec<Value> {
    fixture
        .args
        .iter()
        .zip(1_u8..)
        .map(|(&ty, n)| match ty {
            Type::Void => Value::Unit,
            Type::U8 => Value::U8(n),
            Type::U16 => Value::U16(u16::from(n)),
            Type::U32 => Value::U32(u32::from(n)),
            Type::U64 => Value::U64(u64::from(n)),
            Type::I8 => Value::I8(i8::try_from(n).unwrap_or(i8::MAX)),
            Type::I16 => Value::I16(i16::from(n)),
            Type::I32 => Value::I32(i32::from(n)),
            Type::I64 => Value::I64(i64::from(n)),
            Type::F32 => Value::F32(f32::from(n)),
            Type::F64 => Value::F64(f64::from(n)),
        })
        .collect()
}

/// A family of signatures that all classify to distinct shapes: `n` integer arguments followed by
/// one `f64`, for `n` in `0..count`.
pub fn distinct_shapes(count: usize) -> Result<Vec<Signature>, SignatureError> {
    (0..count)
        .map(|n| {
            let mut args = vec![Type::U64; n];
            args.push(Type::F64);
            Signature::new(&args, Type::F64)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{args_for, distinct_shapes};
    use native_dispatch::{Dispatcher, Limits};
    use native_dispatch_conformance::ALL;

    #[test]
    fn generated_args_match_every_fixture() {
        for fixture in ALL {
            let args = args_for(fixture);
            let tags: Vec<_> = args.iter().map(|v| v.type_tag()).collect();
            assert_eq!(tags, fixture.args, "{}", fixture.name);
        }
    }

    #[test]
    fn shape_family_is_distinct() {
        let d = Dispatcher::new(Limits::default()).unwrap();
        for sig in distinct_shapes(5).unwrap() {
            d.prewarm(&sig).unwrap();
        }
        assert_eq!(d.stats().builds, 5);
    }
}
