//! Abstract Interpreter
//!
//! This module performs one forward pass of abstract execution over a lifted
//! block. It collects the data references the block makes and the constant
//! values it can prove for temporaries.
//!
//! # Abstract State
//! - **Instruction context**: address of the current instruction and of the
//!   one after it, taken from the latest `InstructionMark`
//! - **Temporaries**: a `used` bit per temporary plus its constant value
//!   (`BitVec` for the bits, one `u64` slot per temporary)
//! - **Registers**: a [`RegisterBindings`] map seeded from the context's
//!   initial register values
//! - **Last constant**: the last literal recorded as a reference. Values
//!   derived from temporaries that equal it are not recorded again, since they
//!   are almost always the same immediate seen through a temporary.
//!
//! # Recording Rules
//! A literal equal to the address of the next instruction is never recorded:
//! it is a fallthrough or return address, not data.
//!
//! Additions (`Add32`/`Add64`) are folded when both sides are known. A sum of
//! two literals is recorded as a constant but does not make the temporary
//! known. A right-hand literal is also recorded as a reference of its own.
//! Other operators are not evaluated; their literal operands are recorded as
//! references of unknown size.
//!
//! # Failure
//! A block with a statement that needs an instruction address before its first
//! `InstructionMark` is rejected up front with
//! [`AnalysisError::MissingInstructionMark`]; nothing is written to the result.

use crate::engine::analysis::bindings::{binding_key, RegisterBindings};
use crate::engine::analysis::{
    check_instruction_context, AnalysisResult, ConstValue, DataRefType, DataReference,
};
use crate::engine::config::InterpreterOptions;
use crate::engine::error::AnalysisError;
use crate::engine::ir::instruction::{BinOp, Expression, IrBlock, Statement};
use crate::engine::ir::types::{Const, Endianness, IrType, Temp};
use crate::runtime::context::AnalysisContext;
use crate::target::GuestArch;
use bitvec::{bitvec, order::Lsb0, vec::BitVec};

/// Abstract interpreter entry points.
pub struct Interpreter;

impl Interpreter {
    /// Interpret `block` into a fresh result with default capacities.
    ///
    /// # Arguments
    /// * `ctx` - Read-only regions and initial register values
    /// * `block` - Lifted block to interpret
    /// * `arch` - Guest architecture of the block
    /// * `options` - Interpreter feature switches
    ///
    /// # Errors
    /// Returns [`AnalysisError::MissingInstructionMark`] for malformed blocks
    ///
    /// # Examples
    /// ```rust,ignore
    /// let result = Interpreter::run(&ctx, &block, GuestArch::Amd64, InterpreterOptions::default())?;
    /// for data_ref in result.data_refs.iter() {
    ///     println!("0x{:x} ({} bytes)", data_ref.data_address, data_ref.size);
    /// }
    /// ```
    pub fn run(
        ctx: &AnalysisContext,
        block: &IrBlock,
        arch: GuestArch,
        options: InterpreterOptions,
    ) -> Result<AnalysisResult, AnalysisError> {
        let mut result: AnalysisResult = AnalysisResult::default();
        Self::run_into(ctx, block, arch, options, &mut result)?;
        Ok(result)
    }

    /// Interpret `block`, appending data references and constants to `result`
    /// and setting its block size.
    pub fn run_into(
        ctx: &AnalysisContext,
        block: &IrBlock,
        arch: GuestArch,
        options: InterpreterOptions,
        result: &mut AnalysisResult,
    ) -> Result<(), AnalysisError> {
        check_instruction_context(block, Statement::needs_instruction_context)?;

        let mut state: InterpreterState<'_, '_> = InterpreterState::new(ctx, block, arch, options, result);
        state.execute();

        log::debug!(
            "Interpreted {} statements: {} data refs ({} offered), {} constants",
            block.len(),
            result.data_refs.len(),
            result.data_refs.total(),
            result.const_vals.total()
        );
        Ok(())
    }
}

/// Constant values known for temporaries.
///
/// Temporaries outside the block's type environment are never known.
struct TempTable {
    used: BitVec<usize, Lsb0>,
    values: Vec<u64>,
}

impl TempTable {
    fn new(count: usize) -> Self {
        Self {
            used: bitvec![usize, Lsb0; 0; count],
            values: vec![0u64; count],
        }
    }

    #[inline]
    fn get(&self, temp: Temp) -> Option<u64> {
        let idx: usize = temp as usize;
        let used: bool = self.used.get(idx).map(|bit| *bit).unwrap_or(false);
        if used {
            Some(self.values[idx])
        } else {
            None
        }
    }

    #[inline]
    fn set(&mut self, temp: Temp, value: u64) -> bool {
        let idx: usize = temp as usize;
        if idx >= self.values.len() {
            return false;
        }
        self.used.set(idx, true);
        self.values[idx] = value;
        true
    }
}

/// Abstract value of an addition operand.
#[derive(Debug, Clone, Copy)]
enum Operand {
    /// Literal constant
    Literal(u64),
    /// Temporary with a known value
    Known(u64),
    Unknown,
}

struct InterpreterState<'a, 'r> {
    ctx: &'a AnalysisContext,
    block: &'a IrBlock,
    arch: GuestArch,
    options: InterpreterOptions,
    result: &'r mut AnalysisResult,
    env: RegisterBindings,
    temps: TempTable,
    inst_addr: u64,
    next_inst_addr: u64,
    last_const_value: u64,
    size: u32,
}

impl<'a, 'r> InterpreterState<'a, 'r> {
    fn new(
        ctx: &'a AnalysisContext,
        block: &'a IrBlock,
        arch: GuestArch,
        options: InterpreterOptions,
        result: &'r mut AnalysisResult,
    ) -> Self {
        let mut env: RegisterBindings = RegisterBindings::new();
        for seed in ctx.initial_registers() {
            if let Some(ty) = IrType::integer_of_size(seed.size) {
                env.bind(binding_key(seed.offset, ty), seed.value);
            }
        }

        Self {
            ctx,
            block,
            arch,
            options,
            result,
            env,
            temps: TempTable::new(block.temp_types.len()),
            // Only read after the first mark; checked before execution.
            inst_addr: u64::MAX,
            next_inst_addr: u64::MAX,
            last_const_value: 0u64,
            size: 0u32,
        }
    }

    fn execute(&mut self) {
        let block: &'a IrBlock = self.block;
        for (idx, stmt) in block.statements.iter().enumerate() {
            self.exec_statement(idx, stmt);
        }
        self.result.size = self.size;
    }

    #[inline] // Hot path - called for every statement
    fn exec_statement(&mut self, idx: usize, stmt: &'a Statement) {
        match stmt {
            Statement::InstructionMark { address, length, delta } => {
                self.inst_addr = address.wrapping_add(*delta as u64);
                self.next_inst_addr = self.inst_addr.wrapping_add(*length as u64);
                self.size = self.size.wrapping_add(*length);
            }
            Statement::TempWrite { temp, data } => self.exec_temp_write(idx, *temp, data),
            Statement::RegisterWrite { offset, data } => self.exec_register_write(idx, *offset, data),
            Statement::MemoryWrite { address, data, .. } => {
                if let Expression::Const(con) = address {
                    // Size the store by what is written.
                    let (size, data_type) = match self.block.type_of(data) {
                        Some(ty) => (ty.size(), DataRefType::StoreInteger),
                        None => (0u32, DataRefType::Unknown),
                    };
                    self.record_constant(idx, con, size, data_type);
                }
                if let Expression::Const(con) = data {
                    self.record_constant(idx, con, 0u32, DataRefType::Unknown);
                }
            }
            Statement::HelperCall { mem_address: Some(Expression::Const(con)), mem_size, .. } => {
                self.record_constant(idx, con, *mem_size, DataRefType::FloatingPoint);
            }
            Statement::GuardedLoad { address: Expression::Const(con), .. } => {
                self.record_constant(idx, con, con.ty().size(), DataRefType::Unknown);
            }
            Statement::HelperCall { .. }
            | Statement::GuardedLoad { .. }
            | Statement::ConditionalExit { .. }
            | Statement::NoOp => {}
        }
    }

    fn exec_temp_write(&mut self, idx: usize, temp: Temp, data: &'a Expression) {
        match data {
            Expression::Load { endianness, address, .. } => {
                self.exec_load(idx, temp, *endianness, address);
            }
            Expression::BinaryOp { op, lhs, rhs } if op.is_address_add() => {
                self.exec_add(idx, temp, *op, lhs, rhs);
            }
            Expression::BinaryOp { lhs, rhs, .. } => {
                for operand in [lhs.as_ref(), rhs.as_ref()] {
                    if let Expression::Const(con) = operand {
                        if let Some(value) = self.record_constant(idx, con, 0u32, DataRefType::Unknown) {
                            self.last_const_value = value;
                        }
                    }
                }
            }
            Expression::Const(con) => {
                if let Some(value) = self.record_constant(idx, con, 0u32, DataRefType::Unknown) {
                    self.last_const_value = value;
                }
                self.set_temp(idx, temp, con.value());
            }
            Expression::IfThenElse { if_true, if_false, .. } => {
                // The condition is not evaluated, so the temporary stays unknown.
                for arm in [if_true.as_ref(), if_false.as_ref()] {
                    if let Expression::Const(con) = arm {
                        self.record_constant(idx, con, 0u32, DataRefType::Unknown);
                    }
                }
            }
            Expression::ReadRegister { offset, ty } => {
                if let Some(value) = self.env.lookup(binding_key(*offset, *ty)) {
                    self.set_temp(idx, temp, value);
                }
            }
            Expression::ReadTemp(_) | Expression::UnaryOp { .. } => {}
        }
    }

    /// `temp = LD(address)`
    fn exec_load(&mut self, idx: usize, temp: Temp, endianness: Endianness, address: &'a Expression) {
        let size: u32 = self.block.temp_type(temp).map(IrType::size).unwrap_or(0u32);
        match address {
            Expression::Const(con) => {
                if let Some(value) = self.record_constant(idx, con, size, DataRefType::Integer) {
                    self.last_const_value = value;
                }
                if self.options.load_from_ro_regions {
                    if let Some(value) = self.ctx.load_value(con.value(), size, endianness) {
                        self.set_temp(idx, temp, value);
                    }
                }
            }
            Expression::ReadTemp(src) => {
                let pointer: u64 = match self.temps.get(*src) {
                    Some(pointer) => pointer,
                    None => return,
                };
                if pointer != self.last_const_value {
                    self.record_data_ref(idx, pointer, size, DataRefType::Integer);
                }
                // Keep following pointer chains through literal pools and GOT slots.
                if self.options.load_from_ro_regions && self.arch.follows_pointer_loads(size) {
                    if let Some(value) = self.ctx.load_value(pointer, size, endianness) {
                        self.set_temp(idx, temp, value);
                    }
                }
            }
            _ => {}
        }
    }

    /// `temp = Add32/Add64(lhs, rhs)`
    fn exec_add(&mut self, idx: usize, temp: Temp, op: BinOp, lhs: &'a Expression, rhs: &'a Expression) {
        let fold = |a: u64, b: u64| -> u64 {
            let sum: u64 = a.wrapping_add(b);
            if op == BinOp::Add32 {
                sum & 0xFFFF_FFFFu64
            } else {
                sum
            }
        };

        let (lhs, rhs) = (self.operand(lhs), self.operand(rhs));
        match (lhs, rhs) {
            (Operand::Literal(a), Operand::Literal(b)) => {
                // pc-relative addressing folded by the lifter; the temporary
                // itself stays unknown.
                let value: u64 = fold(a, b);
                if value != self.next_inst_addr && value != self.last_const_value {
                    self.record_data_ref(idx, value, 0u32, DataRefType::Unknown);
                }
                self.record_temp_value(idx, temp, value);
                return;
            }
            (Operand::Known(base), Operand::Literal(offset))
            | (Operand::Literal(offset), Operand::Known(base)) => {
                let value: u64 = fold(base, offset);
                if value != self.last_const_value {
                    self.record_data_ref(idx, value, 0u32, DataRefType::Unknown);
                }
                self.set_temp(idx, temp, value);
            }
            (Operand::Known(a), Operand::Known(b)) => {
                self.set_temp(idx, temp, fold(a, b));
            }
            _ => {}
        }

        // A literal offset is recorded on its own as well; a literal base is not.
        if let Operand::Literal(offset) = rhs {
            if offset != self.last_const_value {
                self.record_data_ref(idx, offset, 0u32, DataRefType::Unknown);
            }
        }
    }

    fn exec_register_write(&mut self, idx: usize, offset: u32, data: &'a Expression) {
        if self.arch.ignored_register() == Some(offset) {
            return;
        }

        match data {
            Expression::Const(con) => {
                if let Some(value) = self.record_constant(idx, con, 0u32, DataRefType::Unknown) {
                    self.last_const_value = value;
                }
                self.env.bind(binding_key(offset, con.ty()), con.value());
            }
            Expression::ReadTemp(src) => {
                let ty: Option<IrType> = self.block.temp_type(*src);
                match self.temps.get(*src) {
                    Some(value) => {
                        if let Some(ty) = ty {
                            self.env.bind(binding_key(offset, ty), value);
                        }
                        if value != self.last_const_value {
                            self.record_data_ref(idx, value, 0u32, DataRefType::Integer);
                        }
                    }
                    None => {
                        if self.arch.sticky_register() == Some(offset) {
                            return;
                        }
                        if let Some(ty) = ty {
                            self.env.unbind(binding_key(offset, ty));
                        }
                    }
                }
            }
            _ => {}
        }
    }

    #[inline]
    fn operand(&self, expr: &Expression) -> Operand {
        match expr {
            Expression::Const(con) => Operand::Literal(con.value()),
            Expression::ReadTemp(tmp) => match self.temps.get(*tmp) {
                Some(value) => Operand::Known(value),
                None => Operand::Unknown,
            },
            _ => Operand::Unknown,
        }
    }

    /// Record a literal as a data reference unless it is the next
    /// instruction's address.
    ///
    /// # Returns
    /// `Option<u64>` - the literal's value, or `None` if it was the next
    /// instruction's address
    #[inline]
    fn record_constant(&mut self, idx: usize, con: &Const, size: u32, data_type: DataRefType) -> Option<u64> {
        let value: u64 = con.value();
        if value == self.next_inst_addr {
            return None;
        }
        self.record_data_ref(idx, value, size, data_type);
        Some(value)
    }

    #[inline]
    fn record_data_ref(&mut self, idx: usize, data_address: u64, size: u32, data_type: DataRefType) {
        if !self.options.collect_data_refs {
            return;
        }
        self.result.data_refs.push(DataReference {
            data_address,
            size,
            data_type,
            statement_index: idx,
            instruction_address: self.inst_addr,
        });
    }

    #[inline]
    fn set_temp(&mut self, idx: usize, temp: Temp, value: u64) {
        if !self.temps.set(temp, value) {
            log::trace!("Statement {}: t{} outside the type environment", idx, temp);
            return;
        }
        self.record_temp_value(idx, temp, value);
    }

    #[inline]
    fn record_temp_value(&mut self, idx: usize, temp: Temp, value: u64) {
        if !self.options.const_prop {
            return;
        }
        self.result.const_vals.push(ConstValue {
            temp,
            value,
            statement_index: idx,
        });
    }
}
