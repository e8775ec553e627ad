//! Test Utilities
//!
//! This module provides helpers for the integration tests: guest-state offsets
//! used by the fixtures, prepared analysis contexts, and shorthands over
//! analysis results.

#![allow(dead_code)]

use blockscan_core::engine::analysis::{AnalysisResult, DataRefType, DataReference, Interpreter};
use blockscan_core::engine::config::InterpreterOptions;
use blockscan_core::engine::ir::IrBlock;
use blockscan_core::runtime::context::AnalysisContext;
use blockscan_core::target::GuestArch;

/// AMD64 `rip`
pub const AMD64_RIP: u32 = 184;
/// AMD64 `rax`
pub const AMD64_RAX: u32 = 16;
/// AMD64 `rsp`
pub const AMD64_RSP: u32 = 48;
/// ARM `r15t`
pub const ARM_PC: u32 = 68;
/// ARM `r0`
pub const ARM_R0: u32 = 8;
/// MIPS32 `sp`
pub const MIPS32_SP: u32 = 116;

/// Create a context with one read-only region.
pub fn context_with_region(start: u64, bytes: &[u8]) -> AnalysisContext {
    let mut ctx = AnalysisContext::new();
    assert!(ctx.register_readonly_region(start, bytes.len() as u64, bytes.to_vec()));
    ctx
}

/// Interpret `block` with every interpreter feature enabled.
pub fn interpret(ctx: &AnalysisContext, block: &IrBlock, arch: GuestArch) -> AnalysisResult {
    Interpreter::run(ctx, block, arch, InterpreterOptions::default()).unwrap()
}

/// Addresses of all recorded data references, in recording order.
pub fn ref_addresses(result: &AnalysisResult) -> Vec<u64> {
    result.data_refs.iter().map(|r| r.data_address).collect()
}

/// First data reference to `address`, if any.
pub fn find_ref(result: &AnalysisResult, address: u64) -> Option<DataReference> {
    result.data_refs.iter().find(|r| r.data_address == address).copied()
}

/// Last constant recorded for `temp`, if any.
pub fn const_of(result: &AnalysisResult, temp: u32) -> Option<u64> {
    result
        .const_vals
        .iter()
        .rev()
        .find(|c| c.temp == temp)
        .map(|c| c.value)
}

/// Assert a data reference's size and type.
pub fn assert_ref(result: &AnalysisResult, address: u64, size: u32, data_type: DataRefType) {
    let data_ref = find_ref(result, address)
        .unwrap_or_else(|| panic!("No data reference to 0x{:x} in {:?}", address, ref_addresses(result)));
    assert_eq!(data_ref.size, size, "size of reference to 0x{:x}", address);
    assert_eq!(data_ref.data_type, data_type, "type of reference to 0x{:x}", address);
}
