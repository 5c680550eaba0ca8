// Copyright 2026 the Native Dispatch Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use native_dispatch::{NativeFn, ShapeKey, Signature};
use std::collections::HashMap;
use std::string::String;

/// Optional label resolver for profiling scopes.
///
/// Return `None` to fall back to the default address-based labels.
pub trait LabelResolver {
    /// Resolve a label for a native call scope.
    fn call_label(&mut self, _callee: NativeFn, _sig: &Signature) -> Option<String> {
        None
    }

    /// Resolve a label for a trampoline build message.
    fn shape_label(&mut self, _key: &ShapeKey) -> Option<String> {
        None
    }
}

/// Default resolver that keeps stable address-based labels.
#[derive(Default, Debug)]
pub struct DefaultLabelResolver;

impl LabelResolver for DefaultLabelResolver {}

/// Resolver that uses registered symbol names when available.
///
/// Each registered callee remembers the label of its most recent signature, so memory grows
/// with the number of registered names and never with the signatures seen.
#[derive(Default, Debug)]
pub struct SymbolTableResolver {
    symbols: HashMap<NativeFn, Symbol>,
}

#[derive(Debug)]
struct Symbol {
    name: String,
    last: Option<(Signature, String)>,
}

impl SymbolTableResolver {
    /// Names `callee` in call labels. Re-registering an address replaces its name.
    pub fn register(&mut self, callee: NativeFn, name: impl Into<String>) {
        self.symbols.insert(
            callee,
            Symbol {
                name: name.into(),
                last: None,
            },
        );
    }
}

impl LabelResolver for SymbolTableResolver {
    fn call_label(&mut self, callee: NativeFn, sig: &Signature) -> Option<String> {
        let symbol = self.symbols.get_mut(&callee)?;
        if let Some((last_sig, label)) = &symbol.last
            && last_sig == sig
        {
            return Some(label.clone());
        }
        let label = format!("native:{} {sig}", symbol.name);
        symbol.last = Some((sig.clone(), label.clone()));
        Some(label)
    }
}

pub(crate) fn default_call_label(callee: NativeFn, sig: &Signature) -> String {
    format!("native:{:#x} {sig}", callee.addr())
}

pub(crate) fn default_shape_label(key: &ShapeKey) -> String {
    format!("trampoline built: {key}")
}

#[cfg(test)]
mod tests {
    use super::{LabelResolver, SymbolTableResolver, default_call_label};
    use native_dispatch::{NativeFn, Signature, Type};

    extern "C" fn callee() {}

    extern "C" fn other() -> u64 {
        1
    }

    #[test]
    fn registered_names_replace_addresses() {
        let f = NativeFn::new(callee as *const ()).unwrap();
        let sig = Signature::new(&[], Type::Void).unwrap();
        let mut resolver = SymbolTableResolver::default();
        assert_eq!(resolver.call_label(f, &sig), None);
        assert!(default_call_label(f, &sig).starts_with("native:0x"));

        resolver.register(f, "callee");
        assert_eq!(
            resolver.call_label(f, &sig).as_deref(),
            Some("native:callee () -> void")
        );
        resolver.register(f, "renamed");
        assert_eq!(
            resolver.call_label(f, &sig).as_deref(),
            Some("native:renamed () -> void")
        );
    }

    #[test]
    fn label_memory_is_one_entry_per_registered_callee() {
        let f = NativeFn::new(callee as *const ()).unwrap();
        let mut resolver = SymbolTableResolver::default();
        resolver.register(f, "callee");

        for arity in 0..32 {
            let sig = Signature::new(&vec![Type::U64; arity], Type::Void).unwrap();
            let label = resolver.call_label(f, &sig).unwrap();
            assert_eq!(label, format!("native:callee {sig}"));
        }
        assert_eq!(resolver.symbols.len(), 1);

        let unregistered = NativeFn::new(other as *const ()).unwrap();
        let sig = Signature::new(&[], Type::Void).unwrap();
        assert_eq!(resolver.call_label(unregistered, &sig), None);
        assert_eq!(resolver.symbols.len(), 1);

        // Switching back re-formats rather than returning the previous signature's label.
        assert_eq!(
            resolver.call_label(f, &sig).as_deref(),
            Some("native:callee () -> void")
        );
    }
}
