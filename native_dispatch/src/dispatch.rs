// Copyright 2026 the Native Dispatch Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The dispatch entry point.
//!
//! [`Dispatcher::dispatch`] runs the whole pipeline for one call: classify the signature, build
//! and validate the frame, look up (or compile) the trampoline for the shape, invoke it, and
//! decode the return word. Every checked failure is reported before the native call happens.

use core::fmt;
use std::sync::Arc;

use crate::cache::{CacheStats, TrampolineCache};
use crate::config::{JitOptions, Limits};
use crate::decode::decode_return;
use crate::frame::{ArgumentMismatch, CallFrame};
use crate::shape::classify;
use crate::signature::{Signature, SignatureError};
use crate::trace::{CacheOutcome, DispatchSink, TraceMask};
use crate::trampoline::{BackendError, NativeFn, Trampoline};
use crate::value::Value;

/// Errors reported by [`Dispatcher`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DispatchError {
    /// The signature is invalid or exceeds the configured limits.
    Signature(SignatureError),
    /// The argument values do not match the signature.
    Argument(ArgumentMismatch),
    /// The trampoline for the signature's shape could not be built.
    Backend(BackendError),
}

impl fmt::Display for DispatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Signature(err) => write!(f, "invalid signature: {err}"),
            Self::Argument(err) => write!(f, "argument mismatch: {err}"),
            Self::Backend(err) => write!(f, "trampoline unavailable: {err}"),
        }
    }
}

impl core::error::Error for DispatchError {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        match self {
            Self::Signature(err) => Some(err),
            Self::Argument(err) => Some(err),
            Self::Backend(err) => Some(err),
        }
    }
}

impl From<SignatureError> for DispatchError {
    fn from(err: SignatureError) -> Self {
        Self::Signature(err)
    }
}

impl From<ArgumentMismatch> for DispatchError {
    fn from(err: ArgumentMismatch) -> Self {
        Self::Argument(err)
    }
}

impl From<BackendError> for DispatchError {
    fn from(err: BackendError) -> Self {
        Self::Backend(err)
    }
}

/// Calls native functions through shape-shared trampolines.
///
/// One dispatcher is meant to be shared by every caller in a process; it is `Send + Sync` and
/// all of its operations take `&self`.
#[derive(Debug)]
pub struct Dispatcher {
    limits: Limits,
    cache: TrampolineCache,
}

impl Dispatcher {
    /// Creates a dispatcher with default JIT options.
    pub fn new(limits: Limits) -> Result<Self, BackendError> {
        Self::with_options(limits, JitOptions::default())
    }

    /// Creates a dispatcher with explicit JIT options.
    pub fn with_options(limits: Limits, options: JitOptions) -> Result<Self, BackendError> {
        Ok(Self {
            limits,
            cache: TrampolineCache::new(&options)?,
        })
    }

    /// The limits signatures are checked against.
    #[must_use]
    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    /// The trampoline cache.
    #[must_use]
    pub fn cache(&self) -> &TrampolineCache {
        &self.cache
    }

    /// Cache counters.
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Returns the trampoline `sig` dispatches through, building it if needed.
    pub fn trampoline_for(&self, sig: &Signature) -> Result<Arc<Trampoline>, DispatchError> {
        let shape = classify(sig, &self.limits)?;
        let (trampoline, _) = self.cache.get_or_build(shape.key())?;
        Ok(trampoline)
    }

    /// Builds the trampoline for `sig` ahead of its first call.
    pub fn prewarm(&self, sig: &Signature) -> Result<CacheOutcome, DispatchError> {
        let shape = classify(sig, &self.limits)?;
        let (_, outcome) = self.cache.get_or_build(shape.key())?;
        Ok(outcome)
    }

    /// Calls `callee` with `args` as described by `sig`.
    ///
    /// Signature and argument errors are reported before the trampoline cache is consulted or
    /// any native code runs.
    ///
    /// # Safety
    ///
    /// `callee` must be a function using the host's C calling convention whose real signature is
    /// `sig`, and calling it with `args` must be sound. None of this can be checked.
    ///
    /// Every integer slot is passed as a full 64-bit word. On Apple arm64, integer arguments
    /// beyond the eighth integer slot are passed on the stack at their natural width, so a
    /// signature whose stack-passed integers are narrower than 64 bits does not describe such a
    /// callee and must not be dispatched there. Float arguments and register-passed integers of
    /// any width are unaffected.
    #[allow(unsafe_code, reason = "forwards the callee contract to the caller")]
    pub unsafe fn dispatch(
        &self,
        callee: NativeFn,
        sig: &Signature,
        args: &[Value],
    ) -> Result<Value, DispatchError> {
        // SAFETY: same contract as this function.
        unsafe { self.dispatch_traced(callee, sig, args, None) }
    }

    /// Like [`Dispatcher::dispatch`], reporting events to `sink`.
    ///
    /// # Safety
    ///
    /// Same as [`Dispatcher::dispatch`].
    #[allow(unsafe_code, reason = "forwards the callee contract to the caller")]
    pub unsafe fn dispatch_traced(
        &self,
        callee: NativeFn,
        sig: &Signature,
        args: &[Value],
        mut sink: Option<&mut dyn DispatchSink>,
    ) -> Result<Value, DispatchError> {
        let mask = sink.as_ref().map_or(TraceMask::NONE, |s| s.mask());

        let shape = classify(sig, &self.limits)?;
        let frame = CallFrame::build(shape.layout(), args)?;
        let (trampoline, outcome) = self.cache.get_or_build(shape.key())?;
        if mask.contains(TraceMask::SHAPE)
            && let Some(s) = sink.as_deref_mut()
        {
            s.shape_resolved(shape.key(), outcome);
        }

        let traced_call = mask.contains(TraceMask::CALL);
        if traced_call && let Some(s) = sink.as_deref_mut() {
            s.call_enter(callee, sig);
        }
        // SAFETY: the frame matches the trampoline's shape by construction, and the callee
        // contract is our caller's.
        let raw = unsafe { trampoline.invoke(callee, &frame) };
        if traced_call && let Some(s) = sink.as_deref_mut() {
            s.call_exit(callee, sig);
        }

        Ok(decode_return(raw, sig.ret()))
    }
}
