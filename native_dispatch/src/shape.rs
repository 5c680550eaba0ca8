// Copyright 2026 the Native Dispatch Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Signature classification.
//!
//! The calling convention only cares about two things per argument: whether it travels in a
//! general-purpose register or in a float register. Signedness and integer width do not change
//! placement, so they are dropped from the [`ShapeKey`]. They survive in the [`Layout`] because
//! the frame builder still needs them to extend narrow integers into a full slot.
//!
//! Each argument is assigned a [`SlotClass`] and a class-local index, so the frame is two dense
//! word sequences rather than one tagged sequence.
//!
//! On hosts whose integer and float argument registers fill independently (SysV x86-64, AAPCS64,
//! RISC-V LP64D), a signature whose slots all fit in registers is keyed only by its integer slot
//! count, float slot count and return class: argument order across the two classes and float
//! width are invisible to the callee there. A float slot is passed as a 64-bit float register
//! value whose low 32 bits carry an `f32`, which is where the callee reads it.
//!
//! Once either class spills to the stack, or on hosts that assign registers by argument position
//! (Windows x64), placement depends on the interleaving and on float width. Such signatures keep
//! their ordered slot classes in the key.

use core::fmt;

use crate::config::Limits;
use crate::signature::{Signature, SignatureError};
use crate::types::Type;

/// Physical class of one argument slot.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum SlotClass {
    /// One general-purpose register word. Every integer type uses this class.
    Int,
    /// One 32-bit float slot.
    F32,
    /// One 64-bit float slot.
    F64,
}

impl SlotClass {
    /// Returns the slot class for an argument type, or `None` for `void`.
    #[must_use]
    pub const fn of(ty: Type) -> Option<Self> {
        match ty {
            Type::Void => None,
            Type::F32 => Some(Self::F32),
            Type::F64 => Some(Self::F64),
            Type::U8
            | Type::U16
            | Type::U32
            | Type::U64
            | Type::I8
            | Type::I16
            | Type::I32
            | Type::I64 => Some(Self::Int),
        }
    }

    /// Returns `true` for float-class slots.
    #[must_use]
    pub const fn is_float(self) -> bool {
        matches!(self, Self::F32 | Self::F64)
    }
}

/// Physical class of the return value.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ReturnClass {
    /// Nothing is returned.
    Void,
    /// One general-purpose register word.
    Int,
    /// One float register. An `f32` result occupies its low 32 bits.
    Float,
}

impl ReturnClass {
    /// Returns the class a return type travels in.
    #[must_use]
    pub const fn of(ty: Type) -> Self {
        match SlotClass::of(ty) {
            None => Self::Void,
            Some(SlotClass::Int) => Self::Int,
            Some(SlotClass::F32 | SlotClass::F64) => Self::Float,
        }
    }
}

/// Argument registers per class on a host whose integer and float registers fill independently.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct RegisterFile {
    /// General-purpose argument registers.
    pub int: usize,
    /// Float argument registers.
    pub float: usize,
}

impl RegisterFile {
    /// The host's register file, or `None` when placement depends on argument position.
    pub const HOST: Option<Self> = if cfg!(all(target_arch = "x86_64", not(windows))) {
        Some(Self { int: 6, float: 8 })
    } else if cfg!(any(target_arch = "aarch64", target_arch = "riscv64")) {
        Some(Self { int: 8, float: 8 })
    } else {
        None
    };

    /// Returns `true` if `ints` integer slots and `floats` float slots all land in registers.
    #[must_use]
    pub const fn holds(self, ints: usize, floats: usize) -> bool {
        ints <= self.int && floats <= self.float
    }
}

/// ABI-relevant classification of a signature.
///
/// Two signatures with the same key are called through the same trampoline. Register-only shapes
/// are identified by `(int_slots, float_slots, ret)`; see the module docs for the ordered case.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ShapeKey {
    int_slots: usize,
    float_slots: usize,
    ret: ReturnClass,
    ordered: Option<Box<[SlotClass]>>,
}

impl ShapeKey {
    /// Number of integer-class slots.
    #[must_use]
    pub fn int_slots(&self) -> usize {
        self.int_slots
    }

    /// Number of float-class slots.
    #[must_use]
    pub fn float_slots(&self) -> usize {
        self.float_slots
    }

    /// Return class.
    #[must_use]
    pub fn ret(&self) -> ReturnClass {
        self.ret
    }

    /// Slot classes in argument order, for shapes whose placement depends on it.
    ///
    /// `None` means every integer slot and every float slot travels in a register, and the
    /// trampoline passes integer words then float words, each in slot order.
    #[must_use]
    pub fn ordered(&self) -> Option<&[SlotClass]> {
        self.ordered.as_deref()
    }
}

impl fmt::Display for ShapeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.ordered {
            None => write!(f, "({} int, {} float)", self.int_slots, self.float_slots)?,
            Some(classes) => {
                f.write_str("[")?;
                for (i, class) in classes.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    f.write_str(match class {
                        SlotClass::Int => "int",
                        SlotClass::F32 => "f32",
                        SlotClass::F64 => "f64",
                    })?;
                }
                f.write_str("]")?;
            }
        }
        f.write_str(" -> ")?;
        f.write_str(match self.ret {
            ReturnClass::Void => "void",
            ReturnClass::Int => "int",
            ReturnClass::Float => "float",
        })
    }
}

/// Placement of one argument.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ArgSlot {
    /// Slot class.
    pub class: SlotClass,
    /// Index within the integer or float word sequence.
    pub index: usize,
    /// Declared type, used for tag checks and integer extension.
    pub ty: Type,
}

/// Per-argument placement table produced by [`classify`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Layout {
    slots: Box<[ArgSlot]>,
    int_count: usize,
    float_count: usize,
}

impl Layout {
    /// Placement of each argument, in argument order.
    #[must_use]
    pub fn slots(&self) -> &[ArgSlot] {
        &self.slots
    }

    /// Number of arguments.
    #[must_use]
    pub fn arity(&self) -> usize {
        self.slots.len()
    }

    /// Number of integer-class words in a frame for this layout.
    #[must_use]
    pub fn int_count(&self) -> usize {
        self.int_count
    }

    /// Number of float-class words in a frame for this layout.
    #[must_use]
    pub fn float_count(&self) -> usize {
        self.float_count
    }
}

/// A classified signature: the cache key plus the argument placement table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Shape {
    key: ShapeKey,
    layout: Layout,
}

impl Shape {
    /// The trampoline cache key.
    #[must_use]
    pub fn key(&self) -> &ShapeKey {
        &self.key
    }

    /// The argument placement table.
    #[must_use]
    pub fn layout(&self) -> &Layout {
        &self.layout
    }
}

/// Classifies `sig` into its shape for the host.
///
/// Fails if the signature declares more than `limits.max_arity` arguments or a `void`
/// argument. Pure: the same signature always yields the same shape.
pub fn classify(sig: &Signature, limits: &Limits) -> Result<Shape, SignatureError> {
    classify_for(sig, limits, RegisterFile::HOST)
}

/// Classifies `sig` for an explicit register file (`None` keeps every key ordered).
pub fn classify_for(
    sig: &Signature,
    limits: &Limits,
    registers: Option<RegisterFile>,
) -> Result<Shape, SignatureError> {
    sig.check(limits)?;

    let mut params = Vec::with_capacity(sig.arity());
    let mut slots = Vec::with_capacity(sig.arity());
    let mut int_count = 0;
    let mut float_count = 0;
    for (index, &ty) in sig.args().iter().enumerate() {
        let class = SlotClass::of(ty).ok_or(SignatureError::VoidArgument { index })?;
        let counter = if class.is_float() {
            &mut float_count
        } else {
            &mut int_count
        };
        slots.push(ArgSlot {
            class,
            index: *counter,
            ty,
        });
        *counter += 1;
        params.push(class);
    }

    let in_registers = registers.is_some_and(|r| r.holds(int_count, float_count));
    Ok(Shape {
        key: ShapeKey {
            int_slots: int_count,
            float_slots: float_count,
            ret: ReturnClass::of(sig.ret()),
            ordered: (!in_registers).then(|| params.into_boxed_slice()),
        },
        layout: Layout {
            slots: slots.into_boxed_slice(),
            int_count,
            float_count,
        },
    })
}
