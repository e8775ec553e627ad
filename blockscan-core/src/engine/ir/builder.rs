//! IR Builder - Assembles Lifted Blocks
//!
//! This module provides a small builder for `IrBlock`s. Lifter glue uses it to
//! append statements in execution order while it allocates typed temporaries;
//! tests use it to write fixtures without spelling out boxed expression trees.
//!
//! # Construction Strategy
//! - **Temporaries**: allocated sequentially, each with its type recorded in the
//!   block's type environment
//! - **Statements**: appended in order; the builder performs no validation, the
//!   analysis passes report malformed blocks themselves
//! - **Termination**: `finish` attaches the default exit and yields the block

use crate::engine::ir::instruction::{BinOp, Expression, IrBlock, Statement, UnOp};
use crate::engine::ir::types::{Const, Endianness, IrType, JumpKind, Temp};

/// Builder for a single `IrBlock`.
#[derive(Debug, Clone)]
pub struct BlockBuilder {
    statements: Vec<Statement>,
    temp_types: Vec<IrType>,
    ip_offset: u32,
}

impl BlockBuilder {
    /// Start a block for a guest whose program counter lives at `ip_offset`.
    pub fn new(ip_offset: u32) -> Self {
        Self {
            statements: Vec::new(),
            temp_types: Vec::new(),
            ip_offset,
        }
    }

    /// Allocate a new temporary of type `ty`.
    #[inline]
    pub fn new_temp(&mut self, ty: IrType) -> Temp {
        self.temp_types.push(ty);
        (self.temp_types.len() - 1usize) as Temp
    }

    /// Append an arbitrary statement.
    #[inline]
    pub fn push(&mut self, stmt: Statement) -> &mut Self {
        self.statements.push(stmt);
        self
    }

    /// Append an instruction mark with no address delta.
    pub fn mark(&mut self, address: u64, length: u32) -> &mut Self {
        self.push(Statement::InstructionMark { address, length, delta: 0u8 })
    }

    /// Append `temp = data`.
    pub fn wr_tmp(&mut self, temp: Temp, data: Expression) -> &mut Self {
        self.push(Statement::TempWrite { temp, data })
    }

    /// Allocate a temporary typed after `data` and assign it.
    ///
    /// Falls back to `I64` if the type of `data` is unknown to this builder.
    pub fn assign(&mut self, data: Expression) -> Temp {
        let ty: IrType = self.type_hint(&data).unwrap_or(IrType::I64);
        let temp: Temp = self.new_temp(ty);
        self.wr_tmp(temp, data);
        temp
    }

    /// Append a register write.
    pub fn put(&mut self, offset: u32, data: Expression) -> &mut Self {
        self.push(Statement::RegisterWrite { offset, data })
    }

    /// Append a memory store.
    pub fn store(&mut self, endianness: Endianness, address: Expression, data: Expression) -> &mut Self {
        self.push(Statement::MemoryWrite { endianness, address, data })
    }

    /// Append a conditional exit.
    pub fn exit(&mut self, guard: Expression, target: Const, jump_kind: JumpKind) -> &mut Self {
        let ip_offset: u32 = self.ip_offset;
        self.push(Statement::ConditionalExit { guard, target, jump_kind, ip_offset })
    }

    /// Append a helper call with an optional memory effect.
    pub fn dirty(&mut self, name: &str, mem_address: Option<Expression>, mem_size: u32) -> &mut Self {
        self.push(Statement::HelperCall {
            name: name.to_string(),
            mem_address,
            mem_size,
        })
    }

    /// Append a guarded load into `dst`.
    pub fn load_g(
        &mut self,
        dst: Temp,
        endianness: Endianness,
        address: Expression,
        alt: Expression,
        guard: Expression,
    ) -> &mut Self {
        self.push(Statement::GuardedLoad { dst, endianness, address, alt, guard })
    }

    /// Append a no-op placeholder.
    pub fn noop(&mut self) -> &mut Self {
        self.push(Statement::NoOp)
    }

    /// Finish the block with its default exit.
    pub fn finish(self, next: Expression, jump_kind: JumpKind) -> IrBlock {
        IrBlock {
            statements: self.statements,
            temp_types: self.temp_types,
            next,
            jump_kind,
            ip_offset: self.ip_offset,
        }
    }

    fn type_hint(&self, expr: &Expression) -> Option<IrType> {
        match expr {
            Expression::ReadTemp(tmp) => self.temp_types.get(*tmp as usize).copied(),
            Expression::IfThenElse { if_true, .. } => self.type_hint(if_true),
            Expression::Const(con) => Some(con.ty()),
            Expression::ReadRegister { ty, .. } | Expression::Load { ty, .. } => Some(*ty),
            Expression::BinaryOp { op, .. } => Some(op.result_type()),
            Expression::UnaryOp { op, .. } => Some(op.result_type()),
        }
    }
}

/// 32-bit constant expression.
#[inline]
pub fn const_u32(value: u32) -> Expression {
    Expression::Const(Const::U32(value))
}

/// 64-bit constant expression.
#[inline]
pub fn const_u64(value: u64) -> Expression {
    Expression::Const(Const::U64(value))
}

/// Temporary read expression.
#[inline]
pub fn rd_tmp(temp: Temp) -> Expression {
    Expression::ReadTemp(temp)
}

/// Register read expression.
#[inline]
pub fn get(offset: u32, ty: IrType) -> Expression {
    Expression::ReadRegister { offset, ty }
}

/// Binary operation expression.
#[inline]
pub fn binop(op: BinOp, lhs: Expression, rhs: Expression) -> Expression {
    Expression::BinaryOp {
        op,
        lhs: Box::new(lhs),
        rhs: Box::new(rhs),
    }
}

/// Unary operation expression.
#[inline]
pub fn unop(op: UnOp, arg: Expression) -> Expression {
    Expression::UnaryOp { op, arg: Box::new(arg) }
}

/// Memory load expression.
#[inline]
pub fn load(endianness: Endianness, ty: IrType, address: Expression) -> Expression {
    Expression::Load {
        endianness,
        ty,
        address: Box::new(address),
    }
}

/// If-then-else expression.
#[inline]
pub fn ite(cond: Expression, if_true: Expression, if_false: Expression) -> Expression {
    Expression::IfThenElse {
        cond: Box::new(cond),
        if_true: Box::new(if_true),
        if_false: Box::new(if_false),
    }
}
