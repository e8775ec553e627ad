//! Intermediate Representation (IR) Statements and Expressions
//!
//! This module defines the lifted, architecture-neutral IR consumed by the
//! analysis passes. A block is an ordered list of statements built from
//! expression trees, plus a type environment for its temporaries and a
//! terminal "next" expression.
//!
//! # IR Design
//! - **Closed**: statements and expressions are plain enums; every pass matches
//!   them exhaustively so a new IR shape shows up as a compile error
//! - **Typed**: every expression has a type derivable from the block
//!   (see [`IrBlock::type_of`])
//! - **Immutable during analysis**: only no-op compaction rewrites a block

use crate::engine::ir::types::{Const, Endianness, IrType, JumpKind, Temp};
use serde::{Deserialize, Serialize};

/// Binary operator.
///
/// Only the operators the analyses need to tell apart are named; everything
/// else the lifter produces maps onto one of these for typing purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum BinOp {
    Add8 = 0,
    Add16 = 1,
    Add32 = 2,
    Add64 = 3,
    Sub8 = 4,
    Sub16 = 5,
    Sub32 = 6,
    Sub64 = 7,
    Mul32 = 8,
    Mul64 = 9,
    And8 = 10,
    And16 = 11,
    And32 = 12,
    And64 = 13,
    Or8 = 14,
    Or16 = 15,
    Or32 = 16,
    Or64 = 17,
    Xor8 = 18,
    Xor16 = 19,
    Xor32 = 20,
    Xor64 = 21,
    Shl32 = 22,
    Shl64 = 23,
    Shr32 = 24,
    Shr64 = 25,
    Sar32 = 26,
    Sar64 = 27,
    CmpEQ32 = 28,
    CmpEQ64 = 29,
    CmpNE32 = 30,
    CmpNE64 = 31,
    CmpLT32S = 32,
    CmpLT32U = 33,
    CmpLT64S = 34,
    CmpLT64U = 35,
    CmpLE32S = 36,
    CmpLE32U = 37,
    CmpLE64S = 38,
    CmpLE64U = 39,
    /// Concatenate two 32-bit halves into a 64-bit value
    HLto64 = 40,
}

impl BinOp {
    /// Result type of the operator.
    pub fn result_type(self) -> IrType {
        use BinOp::*;
        match self {
            Add8 | Sub8 | And8 | Or8 | Xor8 => IrType::I8,
            Add16 | Sub16 | And16 | Or16 | Xor16 => IrType::I16,
            Add32 | Sub32 | Mul32 | And32 | Or32 | Xor32 | Shl32 | Shr32 | Sar32 => IrType::I32,
            Add64 | Sub64 | Mul64 | And64 | Or64 | Xor64 | Shl64 | Shr64 | Sar64 | HLto64 => {
                IrType::I64
            }
            CmpEQ32 | CmpEQ64 | CmpNE32 | CmpNE64 | CmpLT32S | CmpLT32U | CmpLT64S | CmpLT64U
            | CmpLE32S | CmpLE32U | CmpLE64S | CmpLE64U => IrType::I1,
        }
    }

    /// Whether this is a 32- or 64-bit addition.
    ///
    /// These are the only operators the interpreter folds.
    #[inline]
    pub fn is_address_add(self) -> bool {
        matches!(self, BinOp::Add32 | BinOp::Add64)
    }
}

/// Unary operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum UnOp {
    Not32 = 0,
    Not64 = 1,
    /// Zero-extend 8 to 32 bits
    U8to32 = 2,
    /// Zero-extend 32 to 64 bits
    U32to64 = 3,
    /// Sign-extend 32 to 64 bits
    S32to64 = 4,
    /// Truncate 64 to 32 bits
    Trunc64to32 = 5,
    /// Low bit of a 32-bit value
    Trunc32to1 = 6,
    /// Widen a 1-bit value to 32 bits
    U1to32 = 7,
}

impl UnOp {
    /// Result type of the operator.
    pub fn result_type(self) -> IrType {
        match self {
            UnOp::Not32 | UnOp::U8to32 | UnOp::Trunc64to32 | UnOp::U1to32 => IrType::I32,
            UnOp::Not64 | UnOp::U32to64 | UnOp::S32to64 => IrType::I64,
            UnOp::Trunc32to1 => IrType::I1,
        }
    }
}

/// IR expression tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Expression {
    /// Constant literal
    Const(Const),
    /// Read of a temporary
    ReadTemp(Temp),
    /// Read of guest register state at a fixed offset
    ReadRegister { offset: u32, ty: IrType },
    /// Binary operation
    BinaryOp {
        op: BinOp,
        lhs: Box<Expression>,
        rhs: Box<Expression>,
    },
    /// Unary operation
    UnaryOp { op: UnOp, arg: Box<Expression> },
    /// Strict if-then-else (both arms are evaluated)
    IfThenElse {
        cond: Box<Expression>,
        if_true: Box<Expression>,
        if_false: Box<Expression>,
    },
    /// Memory load
    Load {
        endianness: Endianness,
        ty: IrType,
        address: Box<Expression>,
    },
}

impl Expression {
    /// Constant payload, if this expression is a literal.
    #[inline]
    pub fn as_const(&self) -> Option<&Const> {
        match self {
            Expression::Const(con) => Some(con),
            _ => None,
        }
    }

    /// Temporary read by this expression, if it is a bare temporary read.
    #[inline]
    pub fn as_temp(&self) -> Option<Temp> {
        match self {
            Expression::ReadTemp(tmp) => Some(*tmp),
            _ => None,
        }
    }
}

/// IR statement.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Statement {
    /// Start of a guest instruction.
    ///
    /// The instruction address is `address + delta` (the delta carries
    /// encoding bits such as the ARM Thumb bit).
    InstructionMark { address: u64, length: u32, delta: u8 },
    /// Assignment to a temporary
    TempWrite { temp: Temp, data: Expression },
    /// Write to guest register state at a fixed offset
    RegisterWrite { offset: u32, data: Expression },
    /// Memory store
    MemoryWrite {
        endianness: Endianness,
        address: Expression,
        data: Expression,
    },
    /// Side exit taken when `guard` holds
    ConditionalExit {
        guard: Expression,
        target: Const,
        jump_kind: JumpKind,
        ip_offset: u32,
    },
    /// Call to a helper with side effects, optionally touching memory
    HelperCall {
        name: String,
        mem_address: Option<Expression>,
        mem_size: u32,
    },
    /// `dst = guard ? load(address) : alt`
    GuardedLoad {
        dst: Temp,
        endianness: Endianness,
        address: Expression,
        alt: Expression,
        guard: Expression,
    },
    /// Placeholder with no effect
    NoOp,
}

impl Statement {
    /// Whether this statement needs a preceding instruction mark to be
    /// attributed to an instruction.
    #[inline]
    pub fn needs_instruction_context(&self) -> bool {
        !matches!(
            self,
            Statement::InstructionMark { .. } | Statement::NoOp | Statement::ConditionalExit { .. }
        )
    }
}

/// One lifted basic block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IrBlock {
    /// Statements in execution order
    pub statements: Vec<Statement>,
    /// Type of each temporary, indexed by temporary id
    pub temp_types: Vec<IrType>,
    /// Default successor expression
    pub next: Expression,
    /// How the default exit leaves the block
    pub jump_kind: JumpKind,
    /// Offset of the program-counter register in guest state
    pub ip_offset: u32,
}

impl IrBlock {
    /// Type of a temporary, or `None` if it is outside the type environment.
    #[inline]
    pub fn temp_type(&self, temp: Temp) -> Option<IrType> {
        self.temp_types.get(temp as usize).copied()
    }

    /// Type of an expression in the context of this block.
    ///
    /// Returns `None` when the type cannot be determined, which only happens
    /// for reads of temporaries the type environment does not know about.
    pub fn type_of(&self, expr: &Expression) -> Option<IrType> {
        match expr {
            Expression::Const(con) => Some(con.ty()),
            Expression::ReadTemp(tmp) => self.temp_type(*tmp),
            Expression::ReadRegister { ty, .. } => Some(*ty),
            Expression::BinaryOp { op, .. } => Some(op.result_type()),
            Expression::UnaryOp { op, .. } => Some(op.result_type()),
            Expression::IfThenElse { if_true, .. } => self.type_of(if_true),
            Expression::Load { ty, .. } => Some(*ty),
        }
    }

    /// Number of statements in the block.
    #[inline]
    pub fn len(&self) -> usize {
        self.statements.len()
    }

    /// Whether the block has no statements.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }
}
