// Copyright 2026 the Native Dispatch Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Observation hooks for dispatch.
//!
//! A [`DispatchSink`] is handed to [`Dispatcher::dispatch_traced`](crate::Dispatcher::dispatch_traced)
//! and receives callbacks for the event classes its [`TraceMask`] selects. Sinks never influence
//! the call; they exist so embedders can attach profilers and counters without the core crate
//! depending on them.

use core::ops::BitOr;

use crate::shape::ShapeKey;
use crate::signature::Signature;
use crate::trampoline::NativeFn;

/// Bitmask selecting which [`DispatchSink`] callbacks fire.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct TraceMask(u8);

impl TraceMask {
    /// No callbacks.
    pub const NONE: Self = Self(0);
    /// [`DispatchSink::shape_resolved`] after the trampoline lookup.
    pub const SHAPE: Self = Self(1 << 0);
    /// [`DispatchSink::call_enter`] and [`DispatchSink::call_exit`] around the native call.
    pub const CALL: Self = Self(1 << 1);
    /// Every callback.
    pub const ALL: Self = Self(Self::SHAPE.0 | Self::CALL.0);

    /// Returns `true` if this mask contains every bit in `other`.
    #[must_use]
    #[inline]
    pub const fn contains(self, other: Self) -> bool {
        (self.0 & other.0) == other.0
    }
}

impl BitOr for TraceMask {
    type Output = Self;

    #[inline]
    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// Whether a trampoline lookup found an existing entry or built a new one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CacheOutcome {
    /// The trampoline was already cached.
    Hit,
    /// This lookup compiled the trampoline.
    Built,
}

/// Receiver for dispatch events.
///
/// All callbacks default to no-ops. They are only invoked for event classes in [`Self::mask`].
pub trait DispatchSink {
    /// Event classes this sink wants.
    fn mask(&self) -> TraceMask;

    /// A signature was classified and its trampoline looked up.
    fn shape_resolved(&mut self, _key: &ShapeKey, _outcome: CacheOutcome) {}

    /// The native call is about to happen. The frame has been fully validated.
    fn call_enter(&mut self, _callee: NativeFn, _sig: &Signature) {}

    /// The native call returned. Paired with the preceding [`Self::call_enter`].
    fn call_exit(&mut self, _callee: NativeFn, _sig: &Signature) {}
}
