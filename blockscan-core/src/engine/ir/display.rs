//! IR Pretty Printing
//!
//! `Display` implementations producing the conventional textual form of
//! lifted IR, e.g. `t3 = LDle:I32(0x1000)` or `PUT(68) = 0x400004`.

use crate::engine::ir::instruction::{BinOp, Expression, IrBlock, Statement, UnOp};
use crate::engine::ir::types::{Const, Endianness, IrType, JumpKind};
use std::fmt;

impl fmt::Display for IrType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name: &str = match self {
            IrType::I1 => "I1",
            IrType::I8 => "I8",
            IrType::I16 => "I16",
            IrType::I32 => "I32",
            IrType::I64 => "I64",
            IrType::I128 => "I128",
            IrType::F16 => "F16",
            IrType::F32 => "F32",
            IrType::F64 => "F64",
            IrType::D32 => "D32",
            IrType::D64 => "D64",
            IrType::D128 => "D128",
            IrType::F128 => "F128",
            IrType::V128 => "V128",
            IrType::V256 => "V256",
        };
        f.write_str(name)
    }
}

impl fmt::Display for Endianness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Endianness::Little => f.write_str("le"),
            Endianness::Big => f.write_str("be"),
        }
    }
}

impl fmt::Display for Const {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Const::U1(v) => write!(f, "{}:I1", if v { 1 } else { 0 }),
            Const::U8(v) => write!(f, "0x{:02x}", v),
            Const::U16(v) => write!(f, "0x{:04x}", v),
            Const::U32(v) => write!(f, "0x{:08x}", v),
            Const::U64(v) => write!(f, "0x{:016x}", v),
            Const::F32(bits) => write!(f, "F32{{0x{:08x}}}", bits),
            Const::F64(bits) => write!(f, "F64{{0x{:016x}}}", bits),
            Const::V128(mask) => write!(f, "V128{{0x{:04x}}}", mask),
            Const::V256(mask) => write!(f, "V256{{0x{:08x}}}", mask),
        }
    }
}

impl fmt::Display for JumpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name: &str = match self {
            JumpKind::Boring => "Ijk_Boring",
            JumpKind::Call => "Ijk_Call",
            JumpKind::Ret => "Ijk_Ret",
            JumpKind::InvalICache => "Ijk_InvalICache",
            JumpKind::FlushDCache => "Ijk_FlushDCache",
            JumpKind::Yield => "Ijk_Yield",
            JumpKind::NoDecode => "Ijk_NoDecode",
            JumpKind::Syscall => "Ijk_Sys_syscall",
            JumpKind::SigTrap => "Ijk_SigTRAP",
            JumpKind::SigSegv => "Ijk_SigSEGV",
            JumpKind::SigIll => "Ijk_SigILL",
            JumpKind::Privileged => "Ijk_Privileged",
        };
        f.write_str(name)
    }
}

impl fmt::Display for BinOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Variant names already follow the usual operator spelling.
        write!(f, "Iop_{:?}", self)
    }
}

impl fmt::Display for UnOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnOp::Trunc64to32 => f.write_str("Iop_64to32"),
            UnOp::Trunc32to1 => f.write_str("Iop_32to1"),
            UnOp::U8to32 => f.write_str("Iop_8Uto32"),
            UnOp::U32to64 => f.write_str("Iop_32Uto64"),
            UnOp::S32to64 => f.write_str("Iop_32Sto64"),
            UnOp::U1to32 => f.write_str("Iop_1Uto32"),
            other => write!(f, "Iop_{:?}", other),
        }
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Const(con) => write!(f, "{}", con),
            Expression::ReadTemp(tmp) => write!(f, "t{}", tmp),
            Expression::ReadRegister { offset, ty } => write!(f, "GET:{}({})", ty, offset),
            Expression::BinaryOp { op, lhs, rhs } => write!(f, "{}({},{})", op, lhs, rhs),
            Expression::UnaryOp { op, arg } => write!(f, "{}({})", op, arg),
            Expression::IfThenElse { cond, if_true, if_false } => {
                write!(f, "ITE({},{},{})", cond, if_true, if_false)
            }
            Expression::Load { endianness, ty, address } => {
                write!(f, "LD{}:{}({})", endianness, ty, address)
            }
        }
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Statement::InstructionMark { address, length, delta } => {
                write!(f, "------ IMark(0x{:x}, {}, {}) ------", address, length, delta)
            }
            Statement::TempWrite { temp, data } => write!(f, "t{} = {}", temp, data),
            Statement::RegisterWrite { offset, data } => write!(f, "PUT({}) = {}", offset, data),
            Statement::MemoryWrite { endianness, address, data } => {
                write!(f, "ST{}({}) = {}", endianness, address, data)
            }
            Statement::ConditionalExit { guard, target, jump_kind, ip_offset } => write!(
                f,
                "if ({}) {{ PUT({}) = {}; {} }}",
                guard, ip_offset, target, jump_kind
            ),
            Statement::HelperCall { name, mem_address, mem_size } => match mem_address {
                Some(addr) => write!(f, "DIRTY {}() ::: mem({}, {})", name, addr, mem_size),
                None => write!(f, "DIRTY {}()", name),
            },
            Statement::GuardedLoad { dst, endianness, address, alt, guard } => write!(
                f,
                "t{} = if ({}) LD{}({}) else {}",
                dst, guard, endianness, address, alt
            ),
            Statement::NoOp => f.write_str("IR-NoOp"),
        }
    }
}

impl fmt::Display for IrBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "IRSB {{")?;
        for (idx, ty) in self.temp_types.iter().enumerate() {
            writeln!(f, "   t{}:{}", idx, ty)?;
        }
        writeln!(f)?;
        for (idx, stmt) in self.statements.iter().enumerate() {
            writeln!(f, "   {:02} | {}", idx, stmt)?;
        }
        writeln!(f, "   NEXT: PUT({}) = {}; {}", self.ip_offset, self.next, self.jump_kind)?;
        write!(f, "}}")
    }
}
