// Copyright 2026 the Native Dispatch Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Dynamic foreign-call dispatch.
//!
//! `native_dispatch` calls native functions whose signatures are only known at runtime. A caller
//! supplies a code address, a [`Signature`] built from a closed set of scalar [`Type`]s, and
//! tagged [`Value`]s; the dispatcher checks them, marshals the values into a [`CallFrame`],
//! invokes the callee and decodes its return word back into a [`Value`].
//!
//! Signatures that the calling convention cannot tell apart share a [`ShapeKey`], and each shape
//! is compiled into a [`Trampoline`] exactly once (with Cranelift, for the host ISA). When every
//! argument fits in the host's integer and float argument registers, a shape is just the number
//! of integer slots, the number of float slots and the return class. Signatures that spill to the
//! stack, and every signature on hosts that assign registers by position, keep their argument
//! order and float widths in the key.
//!
//! ## Example
//! ```ignore
//! use native_dispatch::{Dispatcher, Limits, NativeFn, Signature, Value};
//!
//! extern "C" fn add(a: u64, b: u8) -> u32 {
//!     (a + u64::from(b)) as u32
//! }
//!
//! let dispatcher = Dispatcher::new(Limits::default())?;
//! let sig: Signature = "(u64, u8) -> u32".parse()?;
//! let add = NativeFn::new(add as *const ()).unwrap();
//! // SAFETY: `add` has exactly this signature.
//! let sum = unsafe { dispatcher.dispatch(add, &sig, &[Value::U64(7), Value::U8(3)])? };
//! assert_eq!(sum, Value::U32(10));
//! ```
//!
//! ## Observability
//! Pass a [`DispatchSink`] to [`Dispatcher::dispatch_traced`] to observe cache resolution and
//! native call boundaries. `native_dispatch_profiling` provides a Tracy-backed sink.

pub mod cache;
pub mod config;
pub mod decode;
pub mod dispatch;
pub mod frame;
pub mod shape;
pub mod signature;
pub mod trace;
pub mod trampoline;
pub mod types;
pub mod value;

pub use cache::{CacheStats, TrampolineCache};
pub use config::{JitOptions, Limits, OptLevel};
pub use decode::{RawReturn, decode_return};
pub use dispatch::{DispatchError, Dispatcher};
pub use frame::{ArgumentMismatch, CallFrame};
pub use shape::{
    ArgSlot, Layout, RegisterFile, ReturnClass, Shape, ShapeKey, SlotClass, classify, classify_for,
};
pub use signature::{Signature, SignatureError};
pub use trace::{CacheOutcome, DispatchSink, TraceMask};
pub use trampoline::{BackendError, NativeFn, Trampoline};
pub use types::{ParseTypeError, Type};
pub use value::{DecodeError, Value};
