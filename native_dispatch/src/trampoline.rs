// Copyright 2026 the Native Dispatch Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Shape-specific trampolines and the native invocation primitive.
//!
//! A trampoline is a small JIT-compiled function with the fixed Rust-side signature
//!
//! ```text
//! extern "C" fn(callee: *const u8, ints: *const u64, floats: *const u64, ret: *mut u64)
//! ```
//!
//! Its body loads the integer words and float words from the frame, calls `callee` with the
//! host's C calling convention, and stores the return bits into `*ret`. For register-only shapes
//! the callee is declared with all integer slots followed by all float slots; for ordered shapes
//! it is declared with the slot classes in argument order. Cranelift decides register and stack
//! placement from that declaration, so nothing here encodes an ABI.
//!
//! This is the only module that executes foreign code. Everything that feeds it (classification,
//! tag checks, frame layout) has already been validated; [`Trampoline::invoke`] cannot check the
//! callee, only that the frame has the shape it was compiled for.

#![allow(unsafe_code, reason = "JIT code pointers and the native call itself")]

use core::fmt;
use core::mem::ManuallyDrop;
use core::ptr::NonNull;
use std::sync::Arc;

use cranelift_codegen::Context;
use cranelift_codegen::ir::{AbiParam, InstBuilder, MemFlags, Type as ClifType, types};
use cranelift_codegen::settings::{self, Configurable};
use cranelift_frontend::{FunctionBuilder, FunctionBuilderContext};
use cranelift_jit::{JITBuilder, JITModule};
use cranelift_module::{Module, default_libcall_names};
use parking_lot::Mutex;

use crate::config::JitOptions;
use crate::decode::RawReturn;
use crate::frame::CallFrame;
use crate::shape::{ReturnClass, ShapeKey, SlotClass};

/// An opaque, non-owned, non-null native code address.
///
/// The dispatcher never manages the callee's lifetime. Whether the address is executable, and
/// whether it really has the signature it is dispatched with, is the caller's responsibility.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct NativeFn(NonNull<u8>);

// SAFETY: a code address is plain data; calling it is what requires `unsafe`.
unsafe impl Send for NativeFn {}
// SAFETY: as above.
unsafe impl Sync for NativeFn {}

impl NativeFn {
    /// Wraps a function address. Returns `None` for null.
    ///
    /// Typical use: `NativeFn::new(my_extern_c_fn as *const ())`.
    #[must_use]
    pub fn new(ptr: *const ()) -> Option<Self> {
        NonNull::new(ptr.cast::<u8>().cast_mut()).map(Self)
    }

    /// The address as a raw pointer.
    #[must_use]
    #[inline]
    pub fn as_ptr(self) -> *const u8 {
        self.0.as_ptr()
    }

    /// The numeric address, for labels and diagnostics.
    #[must_use]
    #[inline]
    pub fn addr(self) -> usize {
        self.0.as_ptr().addr()
    }
}

/// Failure inside the code generator.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BackendError {
    /// The host ISA is not supported by the code generator.
    UnsupportedHost(Box<str>),
    /// A code generator setting was rejected.
    Settings(Box<str>),
    /// ISA construction or code generation failed.
    Codegen(Box<str>),
    /// Declaring, defining or finalizing a trampoline failed.
    Module(Box<str>),
    /// The frame is too large to address with 32-bit load offsets.
    FrameTooLarge {
        /// Number of words in the larger of the two word sequences.
        words: usize,
    },
}

impl BackendError {
    fn settings(err: impl fmt::Display) -> Self {
        Self::Settings(err.to_string().into_boxed_str())
    }

    fn codegen(err: impl fmt::Display) -> Self {
        Self::Codegen(err.to_string().into_boxed_str())
    }

    fn module(err: impl fmt::Display) -> Self {
        Self::Module(err.to_string().into_boxed_str())
    }
}

impl fmt::Display for BackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedHost(msg) => write!(f, "host is not supported: {msg}"),
            Self::Settings(msg) => write!(f, "invalid code generator setting: {msg}"),
            Self::Codegen(msg) => write!(f, "code generation failed: {msg}"),
            Self::Module(msg) => write!(f, "trampoline definition failed: {msg}"),
            Self::FrameTooLarge { words } => {
                write!(f, "frame of {words} words exceeds the addressable range")
            }
        }
    }
}

impl core::error::Error for BackendError {}

type TrampolineFn = unsafe extern "C" fn(*const u8, *const u64, *const u64, *mut u64);

/// A reusable invocation path for one [`ShapeKey`].
///
/// Immutable once built. Holding a trampoline keeps the code it points into mapped, even after
/// the dispatcher that built it is dropped.
pub struct Trampoline {
    key: ShapeKey,
    entry: TrampolineFn,
    _code: Arc<Mutex<JitBackend>>,
}

impl Trampoline {
    /// The shape this trampoline was compiled for.
    #[must_use]
    pub fn key(&self) -> &ShapeKey {
        &self.key
    }

    /// Calls `callee` with the words in `frame` and returns the raw return bits.
    ///
    /// # Panics
    ///
    /// Panics if the frame's integer or float word count differs from this trampoline's shape.
    ///
    /// # Safety
    ///
    /// `callee` must point to a function whose native signature, under the host's C calling
    /// convention, places its arguments and return value as this trampoline's [`ShapeKey`]
    /// describes, and calling it with these argument values must be sound. Nothing about the
    /// callee can be checked; a wrong claim is undefined behavior. Integer slots are passed as
    /// 64-bit words, which excludes narrow integers passed on the stack on Apple arm64 (see
    /// [`Dispatcher::dispatch`](crate::Dispatcher::dispatch)).
    pub unsafe fn invoke(&self, callee: NativeFn, frame: &CallFrame) -> RawReturn {
        assert_eq!(
            frame.ints().len(),
            self.key.int_slots(),
            "frame integer words do not match the trampoline shape"
        );
        assert_eq!(
            frame.floats().len(),
            self.key.float_slots(),
            "frame float words do not match the trampoline shape"
        );
        let mut ret = 0_u64;
        // SAFETY: `entry` was compiled for exactly this parameter list, reads only
        // `int_slots` and `float_slots` words from the two frame buffers (checked above), and
        // writes at most one word to `ret`. The callee contract is forwarded to our caller.
        unsafe {
            (self.entry)(
                callee.as_ptr(),
                frame.ints().as_ptr(),
                frame.floats().as_ptr(),
                &raw mut ret,
            );
        }
        RawReturn(ret)
    }
}

impl fmt::Debug for Trampoline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Trampoline")
            .field("key", &self.key)
            .field("entry", &(self.entry as *const u8))
            .finish_non_exhaustive()
    }
}

/// Cranelift JIT module that compiles trampolines for the host ISA.
///
/// Its code pages are released when the last [`Trampoline`] (and the cache) let go of it.
pub(crate) struct JitBackend {
    module: ManuallyDrop<JITModule>,
    ctx: Context,
    builder_ctx: FunctionBuilderContext,
}

// SAFETY: the module owns its code and data allocations and is only touched through the
// `Mutex` that wraps it; nothing in it is tied to the creating thread.
unsafe impl Send for JitBackend {}

impl JitBackend {
    pub(crate) fn new(options: &JitOptions) -> Result<Self, BackendError> {
        let mut flags = settings::builder();
        flags
            .set("use_colocated_libcalls", "false")
            .map_err(BackendError::settings)?;
        flags.set("is_pic", "false").map_err(BackendError::settings)?;
        flags
            .set("opt_level", options.opt_level.as_flag())
            .map_err(BackendError::settings)?;
        flags
            .set("enable_verifier", if options.verify { "true" } else { "false" })
            .map_err(BackendError::settings)?;

        let isa = cranelift_native::builder()
            .map_err(|msg| BackendError::UnsupportedHost(msg.into()))?
            .finish(settings::Flags::new(flags))
            .map_err(BackendError::codegen)?;
        let module = JITModule::new(JITBuilder::with_isa(isa, default_libcall_names()));
        let ctx = module.make_context();

        Ok(Self {
            module: ManuallyDrop::new(module),
            ctx,
            builder_ctx: FunctionBuilderContext::new(),
        })
    }

    /// Compiles the trampoline body for `key` and returns its entry point.
    fn compile(&mut self, key: &ShapeKey) -> Result<TrampolineFn, BackendError> {
        let words = key.int_slots().max(key.float_slots());
        if i32::try_from(words.saturating_mul(8)).is_err() {
            return Err(BackendError::FrameTooLarge { words });
        }

        let ptr = self.module.target_config().pointer_type();

        let classes = param_classes(key);
        let mut callee_sig = self.module.make_signature();
        for &class in &classes {
            callee_sig.params.push(AbiParam::new(slot_type(class)));
        }
        if let Some(ty) = return_type(key.ret()) {
            callee_sig.returns.push(AbiParam::new(ty));
        }

        let mut sig = self.module.make_signature();
        for _ in 0..4 {
            sig.params.push(AbiParam::new(ptr));
        }
        let id = self
            .module
            .declare_anonymous_function(&sig)
            .map_err(BackendError::module)?;

        self.ctx.func.signature = sig;
        {
            let mut b = FunctionBuilder::new(&mut self.ctx.func, &mut self.builder_ctx);
            let entry = b.create_block();
            b.append_block_params_for_function_params(entry);
            b.switch_to_block(entry);
            b.seal_block(entry);
            let params = b.block_params(entry).to_vec();
            let (callee, ints, floats, ret) = (params[0], params[1], params[2], params[3]);

            let mem = MemFlags::trusted();
            let mut args = Vec::with_capacity(classes.len());
            let mut int_offset = 0_i32;
            let mut float_offset = 0_i32;
            for &class in &classes {
                let arg = match class {
                    SlotClass::Int => {
                        let v = b.ins().load(types::I64, mem, ints, int_offset);
                        int_offset += 8;
                        v
                    }
                    SlotClass::F32 => {
                        let word = b.ins().load(types::I64, mem, floats, float_offset);
                        let bits = b.ins().ireduce(types::I32, word);
                        float_offset += 8;
                        b.ins().bitcast(types::F32, MemFlags::new(), bits)
                    }
                    SlotClass::F64 => {
                        let v = b.ins().load(types::F64, mem, floats, float_offset);
                        float_offset += 8;
                        v
                    }
                };
                args.push(arg);
            }

            let callee_sig = b.import_signature(callee_sig);
            let call = b.ins().call_indirect(callee_sig, callee, &args);
            match key.ret() {
                ReturnClass::Void => {}
                ReturnClass::Int | ReturnClass::Float => {
                    let v = b.inst_results(call)[0];
                    b.ins().store(mem, v, ret, 0);
                }
            }
            b.ins().return_(&[]);
            b.finalize();
        }

        let defined = self.module.define_function(id, &mut self.ctx);
        self.module.clear_context(&mut self.ctx);
        defined.map_err(BackendError::module)?;
        self.module
            .finalize_definitions()
            .map_err(BackendError::module)?;

        let code = self.module.get_finalized_function(id);
        // SAFETY: `code` is the finalized body declared above with four pointer parameters, no
        // returns and the host's default calling convention, which is `TrampolineFn`'s ABI.
        Ok(unsafe { core::mem::transmute::<*const u8, TrampolineFn>(code) })
    }
}

impl Drop for JitBackend {
    fn drop(&mut self) {
        // SAFETY: `module` is not touched again after this take.
        let module = unsafe { ManuallyDrop::take(&mut self.module) };
        // SAFETY: every entry point into this module is owned by a `Trampoline`, and each
        // trampoline holds an `Arc` of this backend. Dropping the backend means none remain, so
        // no code in these pages can be called again.
        unsafe { module.free_memory() };
    }
}

impl fmt::Debug for JitBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JitBackend")
            .field("isa", &self.module.isa().name())
            .finish_non_exhaustive()
    }
}

/// Compiles the trampoline for `key` on `backend`.
pub(crate) fn build(
    backend: &Arc<Mutex<JitBackend>>,
    key: &ShapeKey,
) -> Result<Trampoline, BackendError> {
    let entry = backend.lock().compile(key)?;
    Ok(Trampoline {
        key: key.clone(),
        entry,
        _code: Arc::clone(backend),
    })
}

fn slot_type(class: SlotClass) -> ClifType {
    match class {
        SlotClass::Int => types::I64,
        SlotClass::F32 => types::F32,
        SlotClass::F64 => types::F64,
    }
}

// Register-only shapes pass every float slot as a full float register; an `f32` word already
// holds its bits in the low half.
fn param_classes(key: &ShapeKey) -> Vec<SlotClass> {
    match key.ordered() {
        Some(classes) => classes.to_vec(),
        None => core::iter::repeat_n(SlotClass::Int, key.int_slots())
            .chain(core::iter::repeat_n(SlotClass::F64, key.float_slots()))
            .collect(),
    }
}

// An `f32` result is read from the low half of the float return register.
fn return_type(class: ReturnClass) -> Option<ClifType> {
    match class {
        ReturnClass::Void => None,
        ReturnClass::Int => Some(types::I64),
        ReturnClass::Float => Some(types::F64),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use parking_lot::Mutex;

    use super::{JitBackend, NativeFn, build};
    use crate::config::{JitOptions, Limits};
    use crate::decode::decode_return;
    use crate::frame::CallFrame;
    use crate::shape::{classify, classify_for};
    use crate::signature::Signature;
    use crate::types::Type;
    use crate::value::Value;

    extern "C" fn mul_add(a: i64, x: f64, b: i64) -> f64 {
        a as f64 * x + b as f64
    }

    extern "C" fn half(x: f32) -> f32 {
        x / 2.0
    }

    fn backend() -> Arc<Mutex<JitBackend>> {
        let options = JitOptions {
            verify: true,
            ..JitOptions::default()
        };
        Arc::new(Mutex::new(JitBackend::new(&options).unwrap()))
    }

    #[test]
    fn null_is_not_a_native_fn() {
        assert_eq!(NativeFn::new(core::ptr::null()), None);
        let f = NativeFn::new(half as *const ()).unwrap();
        assert_eq!(f.addr(), (half as *const ()).addr());
    }

    #[test]
    fn trampoline_places_interleaved_int_and_float_slots() {
        let sig = Signature::new(&[Type::I64, Type::F64, Type::I64], Type::F64).unwrap();
        let shape = classify(&sig, &Limits::default()).unwrap();
        let t = build(&backend(), shape.key()).unwrap();
        let frame = CallFrame::build(
            shape.layout(),
            &[Value::I64(3), Value::F64(0.5), Value::I64(-4)],
        )
        .unwrap();

        let f = NativeFn::new(mul_add as *const ()).unwrap();
        // SAFETY: `mul_add` has exactly the declared signature.
        let raw = unsafe { t.invoke(f, &frame) };
        assert_eq!(decode_return(raw, Type::F64), Value::F64(-2.5));
    }

    #[test]
    fn ordered_declaration_matches_the_real_signature() {
        let sig = Signature::new(&[Type::I64, Type::F64, Type::I64], Type::F64).unwrap();
        let shape = classify_for(&sig, &Limits::default(), None).unwrap();
        assert!(shape.key().ordered().is_some());
        let t = build(&backend(), shape.key()).unwrap();
        let frame = CallFrame::build(
            shape.layout(),
            &[Value::I64(2), Value::F64(1.5), Value::I64(1)],
        )
        .unwrap();

        let f = NativeFn::new(mul_add as *const ()).unwrap();
        // SAFETY: `mul_add` has exactly the declared signature.
        let raw = unsafe { t.invoke(f, &frame) };
        assert_eq!(decode_return(raw, Type::F64), Value::F64(4.0));
    }

    #[test]
    fn f32_results_are_read_from_the_low_half() {
        let sig = Signature::new(&[Type::F32], Type::F32).unwrap();
        let shape = classify(&sig, &Limits::default()).unwrap();
        let t = build(&backend(), shape.key()).unwrap();
        let frame = CallFrame::build(shape.layout(), &[Value::F32(3.0)]).unwrap();

        let f = NativeFn::new(half as *const ()).unwrap();
        // SAFETY: `half` has exactly the declared signature.
        let raw = unsafe { t.invoke(f, &frame) };
        assert_eq!(raw.0 & 0xffff_ffff, u64::from(1.5_f32.to_bits()));
        assert_eq!(decode_return(raw, Type::F32), Value::F32(1.5));
    }

    #[test]
    #[should_panic(expected = "frame integer words do not match the trampoline shape")]
    fn mismatched_frame_is_refused_before_the_call() {
        let sig = Signature::new(&[Type::U64], Type::Void).unwrap();
        let shape = classify(&sig, &Limits::default()).unwrap();
        let t = build(&backend(), shape.key()).unwrap();
        let f = NativeFn::new(half as *const ()).unwrap();
        // SAFETY: the shape check panics before `half` could be called.
        unsafe {
            t.invoke(f, &CallFrame::default());
        }
    }
}
