//! Block Summaries
//!
//! Cheap structural passes over a lifted block: conditional exits and
//! instruction addresses, no-op compaction, and no-op block detection.

use crate::engine::analysis::{check_instruction_context, AnalysisResult, ExitInfo};
use crate::engine::error::AnalysisError;
use crate::engine::ir::instruction::{Expression, IrBlock, Statement};
use crate::engine::ir::types::{Const, JumpKind};

/// Largest 32-bit fallthrough accepted by no-op detection (exclusive).
const MAX_32BIT_FALLTHROUGH: u64 = 0xFFFF_FFFF;

/// Structural block passes.
pub struct BlockSummarizer;

impl BlockSummarizer {
    /// Record conditional exits and instruction addresses into `result`.
    ///
    /// Sets `result.size` to the sum of all instruction lengths. Counts stay
    /// exact when the lists are full.
    ///
    /// # Errors
    /// Returns [`AnalysisError::MissingInstructionMark`] if a conditional exit
    /// precedes the first instruction mark
    pub fn extract_exits_and_instructions(block: &IrBlock, result: &mut AnalysisResult) -> Result<(), AnalysisError> {
        check_instruction_context(block, |stmt| matches!(stmt, Statement::ConditionalExit { .. }))?;

        let mut inst_addr: u64 = 0u64;
        let mut size: u32 = 0u32;
        for (idx, stmt) in block.statements.iter().enumerate() {
            match stmt {
                Statement::InstructionMark { address, length, delta } => {
                    inst_addr = address.wrapping_add(*delta as u64);
                    size = size.wrapping_add(*length);
                    result.instruction_addresses.push(inst_addr);
                }
                Statement::ConditionalExit { .. } => {
                    result.exits.push(ExitInfo {
                        instruction_address: inst_addr,
                        statement_index: idx,
                        statement: stmt.clone(),
                    });
                }
                _ => {}
            }
        }
        result.size = size;

        log::debug!(
            "Block summary: {} instructions, {} exits, {} bytes",
            result.instruction_count(),
            result.exit_count(),
            size
        );
        Ok(())
    }

    /// Drop every `NoOp` statement, keeping the order of the rest.
    ///
    /// # Returns
    /// `usize` - Number of statements removed
    pub fn remove_noops(block: &mut IrBlock) -> usize {
        let before: usize = block.statements.len();
        block.statements.retain(|stmt| !matches!(stmt, Statement::NoOp));
        before - block.statements.len()
    }

    /// Whether the block does nothing but fall through to the next instruction.
    ///
    /// Only instruction marks, no-ops and program-counter writes of the current
    /// fallthrough address may appear, and the default exit must be a boring
    /// jump to that same address.
    pub fn is_noop_block(block: &IrBlock) -> bool {
        let mut fallthrough: Option<u64> = None;

        for stmt in &block.statements {
            match stmt {
                Statement::InstructionMark { address, length, delta } => {
                    fallthrough = Some(address.wrapping_add(*delta as u64).wrapping_add(*length as u64));
                }
                Statement::NoOp => {}
                Statement::RegisterWrite { offset, data: Expression::Const(con) } if *offset == block.ip_offset => {
                    if fallthrough.is_none() || fallthrough != con.as_target() {
                        return false;
                    }
                }
                _ => return false,
            }
        }

        let fallthrough: u64 = match fallthrough {
            Some(addr) => addr,
            None => return false,
        };
        if block.jump_kind != JumpKind::Boring {
            return false;
        }

        match &block.next {
            Expression::Const(Const::U16(target)) => {
                fallthrough < MAX_32BIT_FALLTHROUGH && fallthrough == *target as u64
            }
            Expression::Const(Const::U32(target)) => {
                fallthrough < MAX_32BIT_FALLTHROUGH && fallthrough == *target as u64
            }
            Expression::Const(Const::U64(target)) => fallthrough == *target,
            _ => false,
        }
    }
}
