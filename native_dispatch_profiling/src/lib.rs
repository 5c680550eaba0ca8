// Copyright 2026 the Native Dispatch Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Profiling adapters for `native_dispatch` (currently Tracy).
//!
//! This crate keeps `native_dispatch` itself free of profiling dependencies. It listens for
//! native call enter/exit callbacks and emits matching profiling scopes, plus a message each time
//! a new trampoline is compiled.
//!
//! ## Backend
//! This crate currently supports the Tracy backend via `tracy-client`.
//!
//! ## Example
//! ```ignore
//! use native_dispatch::DispatchSink;
//! use native_dispatch_profiling::{ProfilingDispatchSink, SymbolTableResolver};
//!
//! let mut symbols = SymbolTableResolver::default();
//! symbols.register(add, "add");
//! let mut sink = ProfilingDispatchSink::with_resolver(symbols);
//! let sum = unsafe { dispatcher.dispatch_traced(add, &sig, &args, Some(&mut sink))? };
//! # Ok::<(), native_dispatch::DispatchError>(())
//! ```

mod resolver;
mod sink;

pub use resolver::{DefaultLabelResolver, LabelResolver, SymbolTableResolver};
pub use sink::ProfilingDispatchSink;
