// Copyright 2026 the Native Dispatch Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use crate::resolver::{
    DefaultLabelResolver, LabelResolver, default_call_label, default_shape_label,
};
use native_dispatch::{CacheOutcome, DispatchSink, NativeFn, ShapeKey, Signature, TraceMask};
use std::string::String;
use std::vec::Vec;

type BackendGuard = tracy_client::Span;

struct ScopeEntry {
    callee: NativeFn,
    // Keep the label alive for backends that may borrow it.
    label: String,
    guard: Option<BackendGuard>,
}

/// A `DispatchSink` that emits Tracy scopes via `tracy-client`.
///
/// Each native call becomes one scope. Trampoline builds are reported as Tracy messages.
pub struct ProfilingDispatchSink<R = DefaultLabelResolver> {
    resolver: R,
    stack: Vec<ScopeEntry>,
}

impl ProfilingDispatchSink<DefaultLabelResolver> {
    /// Create a new sink with address-based labels.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl<R: LabelResolver> ProfilingDispatchSink<R> {
    /// Create a new sink with a custom label resolver.
    #[must_use]
    pub fn with_resolver(resolver: R) -> Self {
        Self {
            resolver,
            stack: Vec::new(),
        }
    }

    /// The label resolver.
    pub fn resolver_mut(&mut self) -> &mut R {
        &mut self.resolver
    }

    /// Number of native call scopes currently open.
    #[must_use]
    pub fn open_scopes(&self) -> usize {
        self.stack.len()
    }

    fn on_call_enter(&mut self, callee: NativeFn, sig: &Signature) {
        let label = self
            .resolver
            .call_label(callee, sig)
            .unwrap_or_else(|| default_call_label(callee, sig));
        let guard = start_scope(&label);
        self.stack.push(ScopeEntry {
            callee,
            label,
            guard,
        });
    }

    fn on_call_exit(&mut self, callee: NativeFn) {
        if let Some(top) = self.stack.last()
            && top.callee == callee
        {
            if let Some(entry) = self.stack.pop() {
                let ScopeEntry {
                    label: _label,
                    guard: _guard,
                    ..
                } = entry;
            }
            return;
        }
        // If the stack got out of sync, drop any active scopes to avoid leaking.
        self.drop_active_scopes();
    }

    // Drop in LIFO order so nested spans close inner-to-outer.
    fn drop_active_scopes(&mut self) {
        while let Some(entry) = self.stack.pop() {
            let ScopeEntry {
                label: _label,
                guard: _guard,
                ..
            } = entry;
        }
    }
}

fn start_scope(label: &str) -> Option<BackendGuard> {
    let client = tracy_client::Client::running()?;
    Some(client.span_alloc(Some(label), "native_dispatch.call", "native_dispatch", 0, 0))
}

impl<R: LabelResolver> DispatchSink for ProfilingDispatchSink<R> {
    fn mask(&self) -> TraceMask {
        TraceMask::SHAPE | TraceMask::CALL
    }

    fn shape_resolved(&mut self, key: &ShapeKey, outcome: CacheOutcome) {
        if outcome != CacheOutcome::Built {
            return;
        }
        if let Some(client) = tracy_client::Client::running() {
            let label = self
                .resolver
                .shape_label(key)
                .unwrap_or_else(|| default_shape_label(key));
            client.message(&label, 0);
        }
    }

    fn call_enter(&mut self, callee: NativeFn, sig: &Signature) {
        self.on_call_enter(callee, sig);
    }

    fn call_exit(&mut self, callee: NativeFn, _sig: &Signature) {
        self.on_call_exit(callee);
    }
}

impl<R> Default for ProfilingDispatchSink<R>
where
    R: LabelResolver + Default,
{
    fn default() -> Self {
        Self::with_resolver(R::default())
    }
}

impl<R> std::fmt::Debug for ProfilingDispatchSink<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProfilingDispatchSink")
            .field("stack_depth", &self.stack.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::{ProfilingDispatchSink, start_scope};
    use native_dispatch::{DispatchSink, NativeFn, Signature, Type};

    extern "C" fn outer() -> u8 {
        1
    }

    extern "C" fn inner() -> u8 {
        2
    }

    #[test]
    fn start_scope_without_tracy_client_does_not_panic() {
        let _guard = start_scope("test");
    }

    #[test]
    fn scopes_stay_balanced() {
        let sig = Signature::new(&[], Type::U8).unwrap();
        let a = NativeFn::new(outer as *const ()).unwrap();
        let b = NativeFn::new(inner as *const ()).unwrap();
        let mut sink = ProfilingDispatchSink::new();

        sink.call_enter(a, &sig);
        sink.call_enter(b, &sig);
        assert_eq!(sink.open_scopes(), 2);
        sink.call_exit(b, &sig);
        assert_eq!(sink.open_scopes(), 1);

        // An exit that does not match the innermost scope drops everything.
        sink.call_enter(b, &sig);
        sink.call_exit(a, &sig);
        assert_eq!(sink.open_scopes(), 0);
    }
}
