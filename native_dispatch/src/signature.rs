// Copyright 2026 the Native Dispatch Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Native function signatures.
//!
//! A [`Signature`] is the caller's claim about a callee: the ordered argument types and the
//! return type. It is validated at construction (no `void` arguments) and again when it is
//! classified against the dispatcher's [`Limits`].
//!
//! Signatures also have a text form, `(u64, u8) -> u32`, so native binding tables can be
//! written down as data.

use core::fmt;
use core::str::FromStr;

use crate::config::Limits;
use crate::types::Type;

/// Errors in the shape of a signature. These are always reported before any native call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SignatureError {
    /// An argument was declared `void`.
    VoidArgument {
        /// Position of the offending argument.
        index: usize,
    },
    /// The signature declares more arguments than the configured maximum.
    TooManyArguments {
        /// Declared argument count.
        arity: usize,
        /// Configured maximum ([`Limits::max_arity`]).
        max: usize,
    },
    /// A type name in signature text was not recognized.
    UnknownType {
        /// The unrecognized name.
        name: Box<str>,
    },
    /// Signature text did not have the form `(arg, ...) -> ret`.
    Malformed {
        /// What was wrong.
        reason: &'static str,
    },
}

impl fmt::Display for SignatureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::VoidArgument { index } => write!(
                f,
                "argument {index} is void; void is only valid as a return type"
            ),
            Self::TooManyArguments { arity, max } => write!(
                f,
                "signature has {arity} arguments but at most {max} are allowed"
            ),
            Self::UnknownType { name } => write!(f, "unknown type name `{name}`"),
            Self::Malformed { reason } => write!(f, "malformed signature: {reason}"),
        }
    }
}

impl core::error::Error for SignatureError {}

/// Argument and return types of a native function.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Signature {
    args: Box<[Type]>,
    ret: Type,
}

impl Signature {
    /// Creates a signature. Fails if any argument is `void`.
    ///
    /// Arity is not bounded here; it is checked against the dispatcher's [`Limits`] when the
    /// signature is classified. Use [`Signature::with_limits`] to check it up front.
    pub fn new(args: &[Type], ret: Type) -> Result<Self, SignatureError> {
        check_args(args)?;
        Ok(Self {
            args: args.into(),
            ret,
        })
    }

    /// Creates a signature and checks its arity against `limits`.
    pub fn with_limits(args: &[Type], ret: Type, limits: &Limits) -> Result<Self, SignatureError> {
        let sig = Self::new(args, ret)?;
        sig.check(limits)?;
        Ok(sig)
    }

    /// Argument types in call order.
    #[must_use]
    #[inline]
    pub fn args(&self) -> &[Type] {
        &self.args
    }

    /// Return type.
    #[must_use]
    #[inline]
    pub fn ret(&self) -> Type {
        self.ret
    }

    /// Number of arguments.
    #[must_use]
    #[inline]
    pub fn arity(&self) -> usize {
        self.args.len()
    }

    /// Re-validates the signature against `limits`.
    pub fn check(&self, limits: &Limits) -> Result<(), SignatureError> {
        if self.args.len() > limits.max_arity {
            return Err(SignatureError::TooManyArguments {
                arity: self.args.len(),
                max: limits.max_arity,
            });
        }
        check_args(&self.args)
    }
}

fn check_args(args: &[Type]) -> Result<(), SignatureError> {
    match args.iter().position(|ty| *ty == Type::Void) {
        Some(index) => Err(SignatureError::VoidArgument { index }),
        None => Ok(()),
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(")?;
        for (i, ty) in self.args.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{ty}")?;
        }
        write!(f, ") -> {}", self.ret)
    }
}

impl FromStr for Signature {
    type Err = SignatureError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let (params, ret) = text.split_once("->").ok_or(SignatureError::Malformed {
            reason: "missing `->`",
        })?;
        let params = params
            .trim()
            .strip_prefix('(')
            .and_then(|p| p.strip_suffix(')'))
            .ok_or(SignatureError::Malformed {
                reason: "argument list must be parenthesized",
            })?;
        let args = if params.trim().is_empty() {
            Vec::new()
        } else {
            params
                .split(',')
                .map(parse_type)
                .collect::<Result<Vec<_>, _>>()?
        };
        Self::new(&args, parse_type(ret)?)
    }
}

fn parse_type(name: &str) -> Result<Type, SignatureError> {
    name.trim()
        .parse::<Type>()
        .map_err(|err| SignatureError::UnknownType {
            name: err.name().into(),
        })
}
