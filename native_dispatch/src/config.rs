// Copyright 2026 the Native Dispatch Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Dispatcher configuration.

/// Bounds enforced before any trampoline is built.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Limits {
    /// Maximum number of arguments a signature may declare.
    ///
    /// This also bounds the number of distinct shapes the trampoline cache can ever hold.
    pub max_arity: usize,
}

impl Limits {
    /// Default value of [`Limits::max_arity`].
    pub const DEFAULT_MAX_ARITY: usize = 32;

    /// Creates limits with the given maximum arity.
    #[must_use]
    #[inline]
    pub const fn new(max_arity: usize) -> Self {
        Self { max_arity }
    }
}

impl Default for Limits {
    fn default() -> Self {
        Self::new(Self::DEFAULT_MAX_ARITY)
    }
}

/// Optimization level for generated trampolines.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum OptLevel {
    /// No optimization.
    None,
    /// Optimize for speed.
    #[default]
    Speed,
    /// Optimize for speed and code size.
    SpeedAndSize,
}

impl OptLevel {
    pub(crate) const fn as_flag(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Speed => "speed",
            Self::SpeedAndSize => "speed_and_size",
        }
    }
}

/// Code generator options for the trampoline backend.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct JitOptions {
    /// Optimization level.
    pub opt_level: OptLevel,
    /// Run the IR verifier on every trampoline before emitting code.
    pub verify: bool,
}

impl Default for JitOptions {
    fn default() -> Self {
        Self {
            opt_level: OptLevel::Speed,
            verify: cfg!(debug_assertions),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{JitOptions, Limits, OptLevel};

    #[test]
    fn defaults() {
        assert_eq!(Limits::default().max_arity, 32);
        assert_eq!(JitOptions::default().opt_level, OptLevel::Speed);
        assert_eq!(OptLevel::SpeedAndSize.as_flag(), "speed_and_size");
    }
}
