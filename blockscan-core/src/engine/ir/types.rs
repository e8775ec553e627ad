//! IR Value Types
//!
//! Scalar building blocks shared by statements and expressions: value types,
//! constants, endianness, and jump kinds.
//!
//! # Memory Optimizations
//! - All enums use `#[repr(u8)]` where they carry no payload
//! - `Const` stores floating-point constants as raw bits so it stays `Eq` and `Hash`

use serde::{Deserialize, Serialize};

/// Temporary identifier (index into the block's type environment).
pub type Temp = u32;

/// Type of an IR value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum IrType {
    I1 = 0,
    I8 = 1,
    I16 = 2,
    I32 = 3,
    I64 = 4,
    I128 = 5,
    F16 = 6,
    F32 = 7,
    F64 = 8,
    D32 = 9,
    D64 = 10,
    D128 = 11,
    F128 = 12,
    V128 = 13,
    V256 = 14,
}

impl IrType {
    /// Size of a value of this type in bytes.
    ///
    /// `I1` occupies a full byte, matching how guest state stores flags.
    #[inline(always)] // Hot path - called for every typed access
    pub fn size(self) -> u32 {
        match self {
            IrType::I1 | IrType::I8 => 1u32,
            IrType::I16 | IrType::F16 => 2u32,
            IrType::I32 | IrType::F32 | IrType::D32 => 4u32,
            IrType::I64 | IrType::F64 | IrType::D64 => 8u32,
            IrType::I128 | IrType::D128 | IrType::F128 | IrType::V128 => 16u32,
            IrType::V256 => 32u32,
        }
    }

    /// Integer type of the given byte size, if one exists.
    ///
    /// Used to type seeded register values (sizes 1, 2, 4, 8, 16).
    pub fn integer_of_size(size: u32) -> Option<IrType> {
        match size {
            1 => Some(IrType::I8),
            2 => Some(IrType::I16),
            4 => Some(IrType::I32),
            8 => Some(IrType::I64),
            16 => Some(IrType::I128),
            _ => None,
        }
    }
}

/// Byte order of a memory access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Endianness {
    Little = 0,
    Big = 1,
}

impl Endianness {
    /// Byte order of the machine running the analysis.
    #[inline(always)]
    pub fn host() -> Self {
        if cfg!(target_endian = "little") {
            Endianness::Little
        } else {
            Endianness::Big
        }
    }
}

/// Constant literal appearing in an expression or as an exit target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Const {
    U1(bool),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    /// IEEE single, stored as raw bits
    F32(u32),
    /// IEEE double, stored as raw bits
    F64(u64),
    /// 128-bit vector, one bit per byte lane
    V128(u16),
    /// 256-bit vector, one bit per byte lane
    V256(u32),
}

impl Const {
    /// Type of the constant.
    pub fn ty(&self) -> IrType {
        match self {
            Const::U1(_) => IrType::I1,
            Const::U8(_) => IrType::I8,
            Const::U16(_) => IrType::I16,
            Const::U32(_) => IrType::I32,
            Const::U64(_) => IrType::I64,
            Const::F32(_) => IrType::F32,
            Const::F64(_) => IrType::F64,
            Const::V128(_) => IrType::V128,
            Const::V256(_) => IrType::V256,
        }
    }

    /// Integer value used when the constant is treated as an address.
    ///
    /// Only the integer widths 8 through 64 carry a value; every other
    /// constant reads as 0.
    #[inline]
    pub fn value(&self) -> u64 {
        match *self {
            Const::U8(v) => v as u64,
            Const::U16(v) => v as u64,
            Const::U32(v) => v as u64,
            Const::U64(v) => v,
            _ => 0u64,
        }
    }

    /// Value of the constant when it is usable as a jump target.
    ///
    /// Only 16-, 32- and 64-bit integer constants qualify.
    #[inline]
    pub fn as_target(&self) -> Option<u64> {
        match *self {
            Const::U16(v) => Some(v as u64),
            Const::U32(v) => Some(v as u64),
            Const::U64(v) => Some(v),
            _ => None,
        }
    }
}

/// How control leaves a block (or a conditional exit).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum JumpKind {
    /// Ordinary fallthrough or jump
    Boring = 0,
    Call = 1,
    Ret = 2,
    /// Invalidate the instruction cache, then continue
    InvalICache = 3,
    FlushDCache = 4,
    Yield = 5,
    NoDecode = 6,
    Syscall = 7,
    SigTrap = 8,
    SigSegv = 9,
    SigIll = 10,
    Privileged = 11,
}

impl JumpKind {
    /// Whether the default exit of a block with this kind may be resolved
    /// to a constant successor.
    #[inline]
    pub fn has_resolvable_target(self) -> bool {
        matches!(self, JumpKind::Boring | JumpKind::Call | JumpKind::InvalICache)
    }
}
