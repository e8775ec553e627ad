//! Analysis Module
//!
//! This module provides the single-block analyses over lifted IR:
//! abstract interpretation (data references and constant propagation),
//! default-exit resolution, and block summaries (instruction addresses,
//! conditional exits, no-op detection).

pub mod bindings;
pub mod bounded;
pub mod exit_resolver;
pub mod interpreter;
pub mod summary;

// Re-export commonly used types
pub use bindings::{binding_key, RegisterBindings};
pub use bounded::BoundedBuffer;
pub use exit_resolver::ExitResolver;
pub use interpreter::Interpreter;
pub use summary::BlockSummarizer;

use crate::engine::config::AnalysisConfig;
use crate::engine::error::AnalysisError;
use crate::engine::ir::instruction::{IrBlock, Statement};
use crate::engine::ir::types::Temp;
use serde::{Deserialize, Serialize};

/// How a data reference uses its address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum DataRefType {
    /// Integer load
    Integer = 0,
    /// Integer store
    StoreInteger = 1,
    /// Floating-point or vector state transfer performed by a helper
    FloatingPoint = 2,
    Unknown = 3,
}

/// Address touched by the block as data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DataReference {
    pub data_address: u64,
    /// Access size in bytes, 0 if unknown
    pub size: u32,
    pub data_type: DataRefType,
    pub statement_index: usize,
    pub instruction_address: u64,
}

/// Constant value recorded for a temporary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConstValue {
    pub temp: Temp,
    pub value: u64,
    pub statement_index: usize,
}

/// Conditional exit found in the block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExitInfo {
    /// Address of the instruction the exit belongs to
    pub instruction_address: u64,
    pub statement_index: usize,
    /// The `ConditionalExit` statement itself
    pub statement: Statement,
}

/// Everything the analyses learn about one block.
///
/// Bounded lists keep an exact `total()` even when entries were dropped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub exits: BoundedBuffer<ExitInfo>,
    pub instruction_addresses: BoundedBuffer<u64>,
    pub data_refs: BoundedBuffer<DataReference>,
    pub const_vals: BoundedBuffer<ConstValue>,
    /// Default exit target, when it resolves to a constant
    pub default_exit: Option<u64>,
    pub is_noop_block: bool,
    /// Sum of instruction lengths in bytes
    pub size: u32,
}

impl AnalysisResult {
    /// Empty result with the capacities from `config`.
    pub fn with_config(config: &AnalysisConfig) -> Self {
        Self {
            exits: BoundedBuffer::with_capacity(config.max_exits),
            instruction_addresses: BoundedBuffer::with_capacity(config.max_inst_addrs),
            data_refs: BoundedBuffer::with_capacity(config.max_data_refs),
            const_vals: BoundedBuffer::with_capacity(config.max_const_vals),
            default_exit: None,
            is_noop_block: false,
            size: 0u32,
        }
    }

    /// Number of instructions in the block (exact, even past capacity).
    #[inline]
    pub fn instruction_count(&self) -> usize {
        self.instruction_addresses.total()
    }

    /// Number of conditional exits in the block (exact, even past capacity).
    #[inline]
    pub fn exit_count(&self) -> usize {
        self.exits.total()
    }
}

impl Default for AnalysisResult {
    fn default() -> Self {
        Self::with_config(&AnalysisConfig::default())
    }
}

/// Ensure no statement matching `needs_mark` precedes the first instruction mark.
///
/// Run before a pass writes anything, so a malformed block aborts the pass
/// without leaving a partial result behind.
pub(crate) fn check_instruction_context(
    block: &IrBlock,
    needs_mark: impl Fn(&Statement) -> bool,
) -> Result<(), AnalysisError> {
    for (idx, stmt) in block.statements.iter().enumerate() {
        match stmt {
            Statement::InstructionMark { .. } => return Ok(()),
            other if needs_mark(other) => return Err(AnalysisError::missing_mark(idx, other)),
            _ => {}
        }
    }
    Ok(())
}
