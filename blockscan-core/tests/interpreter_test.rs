// Integration tests for the abstract interpreter
mod utils;

use blockscan_core::engine::analysis::{AnalysisResult, DataRefType, Interpreter};
use blockscan_core::engine::config::{AnalysisConfig, InterpreterOptions};
use blockscan_core::engine::error::AnalysisError;
use blockscan_core::engine::ir::builder::{binop, const_u32, const_u64, get, ite, load, rd_tmp};
use blockscan_core::engine::ir::{BinOp, BlockBuilder, Const, Endianness, Expression, IrType, JumpKind};
use blockscan_core::runtime::context::AnalysisContext;
use blockscan_core::target::{GuestArch, ARM_ITSTATE_OFFSET, MIPS32_GP_OFFSET};
use utils::*;

#[test]
fn test_load_from_next_instruction_is_not_a_reference() {
    let mut b = BlockBuilder::new(AMD64_RIP);
    b.mark(0x400000, 4);
    b.assign(load(Endianness::Little, IrType::I32, const_u64(0x400004)));
    let block = b.finish(const_u64(0x400004), JumpKind::Boring);

    let result = interpret(&AnalysisContext::new(), &block, GuestArch::Amd64);
    assert!(result.data_refs.is_empty());
    assert_eq!(result.data_refs.total(), 0);
}

#[test]
fn test_load_from_constant_address() {
    let ctx = context_with_region(0x601000, &[0x01, 0x02, 0x03, 0x04]);
    let mut b = BlockBuilder::new(AMD64_RIP);
    b.mark(0x400000, 6);
    let t0 = b.assign(load(Endianness::Little, IrType::I32, const_u64(0x601000)));
    let block = b.finish(const_u64(0x400006), JumpKind::Boring);

    let result = interpret(&ctx, &block, GuestArch::Amd64);
    let data_ref = find_ref(&result, 0x601000).unwrap();
    assert_eq!(data_ref.size, 4);
    assert_eq!(data_ref.data_type, DataRefType::Integer);
    assert_eq!(data_ref.statement_index, 1);
    assert_eq!(data_ref.instruction_address, 0x400000);
    assert_eq!(const_of(&result, t0), Some(0x04030201));
    assert_eq!(result.size, 6);
}

#[test]
fn test_load_without_region_folding() {
    let ctx = context_with_region(0x601000, &[0x01, 0x02, 0x03, 0x04]);
    let mut b = BlockBuilder::new(AMD64_RIP);
    b.mark(0x400000, 6);
    let t0 = b.assign(load(Endianness::Big, IrType::I32, const_u64(0x601000)));
    let block = b.finish(const_u64(0x400006), JumpKind::Boring);

    let options = InterpreterOptions {
        load_from_ro_regions: false,
        ..InterpreterOptions::default()
    };
    let result = Interpreter::run(&ctx, &block, GuestArch::Amd64, options).unwrap();
    assert_eq!(ref_addresses(&result), vec![0x601000]);
    assert_eq!(const_of(&result, t0), None);
}

#[test]
fn test_data_ref_capacity_keeps_exact_count() {
    let config = AnalysisConfig {
        max_data_refs: 4,
        ..AnalysisConfig::default()
    };
    let mut b = BlockBuilder::new(AMD64_RIP);
    b.mark(0x400000, 64);
    for i in 0..10u64 {
        b.assign(load(Endianness::Little, IrType::I32, const_u64(0x600000 + i * 8)));
    }
    let block = b.finish(const_u64(0x400040), JumpKind::Boring);

    let mut result = AnalysisResult::with_config(&config);
    Interpreter::run_into(&AnalysisContext::new(), &block, GuestArch::Amd64, config.interpreter, &mut result)
        .unwrap();
    assert_eq!(result.data_refs.len(), 4);
    assert_eq!(result.data_refs.total(), 10);
    assert!(result.data_refs.is_truncated());
    assert_eq!(ref_addresses(&result), vec![0x600000, 0x600008, 0x600010, 0x600018]);
}

#[test]
fn test_add_of_two_constants_is_folded() {
    let mut b = BlockBuilder::new(AMD64_RIP);
    b.mark(0x400000, 7);
    let t0 = b.assign(binop(BinOp::Add64, const_u64(0x400007), const_u64(0x200ff9)));
    let t1 = b.assign(load(Endianness::Little, IrType::I32, rd_tmp(t0)));
    let block = b.finish(const_u64(0x400007), JumpKind::Boring);

    let result = interpret(&AnalysisContext::new(), &block, GuestArch::Amd64);
    assert_ref(&result, 0x601000, 0, DataRefType::Unknown);
    assert_eq!(const_of(&result, t0), Some(0x601000));
    // The folded sum is not propagated, so the load adds no second reference.
    assert_eq!(ref_addresses(&result), vec![0x601000]);
    assert_eq!(const_of(&result, t1), None);
}

#[test]
fn test_add_of_two_constants_to_next_instruction_is_not_a_reference() {
    let mut b = BlockBuilder::new(AMD64_RIP);
    b.mark(0x400000, 5);
    let t0 = b.assign(binop(BinOp::Add64, const_u64(0x400000), const_u64(0x5)));
    let block = b.finish(const_u64(0x400005), JumpKind::Boring);

    let result = interpret(&AnalysisContext::new(), &block, GuestArch::Amd64);
    assert!(result.data_refs.is_empty());
    assert_eq!(const_of(&result, t0), Some(0x400005));
}

#[test]
fn test_add32_wraps() {
    let mut b = BlockBuilder::new(ARM_PC);
    b.mark(0x1000, 4);
    let t0 = b.assign(binop(BinOp::Add32, const_u32(0xFFFF_FFF0), const_u32(0x20)));
    let block = b.finish(const_u32(0x1004), JumpKind::Boring);

    let result = interpret(&AnalysisContext::new(), &block, GuestArch::Arm);
    assert_eq!(const_of(&result, t0), Some(0x10));
    assert_eq!(ref_addresses(&result), vec![0x10]);
}

#[test]
fn test_add_base_plus_offset_records_right_offset() {
    let mut b = BlockBuilder::new(AMD64_RIP);
    b.mark(0x400000, 10);
    let base = b.assign(const_u64(0x600000));
    let lhs = b.assign(binop(BinOp::Add64, rd_tmp(base), const_u64(0x20)));
    let rhs = b.assign(binop(BinOp::Add64, const_u64(0x40), rd_tmp(base)));
    let block = b.finish(const_u64(0x40000a), JumpKind::Boring);

    let result = interpret(&AnalysisContext::new(), &block, GuestArch::Amd64);
    assert_eq!(const_of(&result, lhs), Some(0x600020));
    assert_eq!(const_of(&result, rhs), Some(0x600040));
    assert_eq!(ref_addresses(&result), vec![0x600000, 0x600020, 0x20, 0x600040]);
}

#[test]
fn test_add_constant_to_unknown_records_constant_only() {
    let mut b = BlockBuilder::new(AMD64_RIP);
    b.mark(0x400000, 4);
    let sp = b.assign(get(AMD64_RSP, IrType::I64));
    let t1 = b.assign(binop(BinOp::Add64, rd_tmp(sp), const_u64(0x602000)));
    let t2 = b.assign(binop(BinOp::Add64, const_u64(0x603000), rd_tmp(sp)));
    let block = b.finish(const_u64(0x400004), JumpKind::Boring);

    let result = interpret(&AnalysisContext::new(), &block, GuestArch::Amd64);
    assert_eq!(ref_addresses(&result), vec![0x602000]);
    assert_eq!(const_of(&result, t1), None);
    assert_eq!(const_of(&result, t2), None);
}

#[test]
fn test_add_of_two_known_temps_is_not_a_reference() {
    let mut b = BlockBuilder::new(AMD64_RIP);
    b.mark(0x400000, 4);
    let a = b.assign(get(AMD64_RAX, IrType::I64));
    let c = b.assign(get(AMD64_RSP, IrType::I64));
    let sum = b.assign(binop(BinOp::Add64, rd_tmp(a), rd_tmp(c)));
    let block = b.finish(const_u64(0x400004), JumpKind::Boring);

    let mut ctx = AnalysisContext::new();
    ctx.register_initial_register_value(AMD64_RAX, 8, 0x1000);
    ctx.register_initial_register_value(AMD64_RSP, 8, 0x7fff0000);
    let result = interpret(&ctx, &block, GuestArch::Amd64);
    assert_eq!(const_of(&result, sum), Some(0x7fff1000));
    assert!(result.data_refs.is_empty());
}

#[test]
fn test_other_binop_records_literal_operands() {
    let mut b = BlockBuilder::new(AMD64_RIP);
    b.mark(0x400000, 4);
    let x = b.assign(get(AMD64_RAX, IrType::I64));
    let masked = b.assign(binop(BinOp::And64, rd_tmp(x), const_u64(0xfff0)));
    let block = b.finish(const_u64(0x400004), JumpKind::Boring);

    let mut ctx = AnalysisContext::new();
    ctx.register_initial_register_value(AMD64_RAX, 8, 0x1234);
    let result = interpret(&ctx, &block, GuestArch::Amd64);
    assert_ref(&result, 0xfff0, 0, DataRefType::Unknown);
    assert_eq!(const_of(&result, masked), None);
}

#[test]
fn test_ite_records_both_arms() {
    let mut b = BlockBuilder::new(AMD64_RIP);
    b.mark(0x400000, 4);
    let cond = b.assign(Expression::Const(Const::U1(true)));
    let t1 = b.assign(ite(rd_tmp(cond), const_u64(0x601000), const_u64(0x602000)));
    let block = b.finish(const_u64(0x400004), JumpKind::Boring);

    let result = interpret(&AnalysisContext::new(), &block, GuestArch::Amd64);
    assert!(find_ref(&result, 0x601000).is_some());
    assert!(find_ref(&result, 0x602000).is_some());
    assert_eq!(const_of(&result, t1), None);
}

#[test]
fn test_initial_register_seeds_lookup() {
    let mut ctx = AnalysisContext::new();
    ctx.register_initial_register_value(AMD64_RAX, 8, 0x601000);

    let mut b = BlockBuilder::new(AMD64_RIP);
    b.mark(0x400000, 3);
    let ptr = b.assign(get(AMD64_RAX, IrType::I64));
    b.assign(load(Endianness::Little, IrType::I64, rd_tmp(ptr)));
    let block = b.finish(const_u64(0x400003), JumpKind::Boring);

    let result = interpret(&ctx, &block, GuestArch::Amd64);
    assert_eq!(const_of(&result, ptr), Some(0x601000));
    assert_ref(&result, 0x601000, 8, DataRefType::Integer);
}

#[test]
fn test_register_binding_is_width_sensitive() {
    let mut b = BlockBuilder::new(AMD64_RIP);
    b.mark(0x400000, 10);
    b.put(AMD64_RAX, const_u64(0x601000));
    let wide = b.assign(get(AMD64_RAX, IrType::I64));
    let narrow = b.assign(get(AMD64_RAX, IrType::I32));
    let block = b.finish(const_u64(0x40000a), JumpKind::Boring);

    let result = interpret(&AnalysisContext::new(), &block, GuestArch::Amd64);
    assert_eq!(const_of(&result, wide), Some(0x601000));
    assert_eq!(const_of(&result, narrow), None);
}

#[test]
fn test_unknown_register_write_clears_binding() {
    let mut ctx = AnalysisContext::new();
    ctx.register_initial_register_value(AMD64_RAX, 8, 0x601000);

    let mut b = BlockBuilder::new(AMD64_RIP);
    b.mark(0x400000, 3);
    let unknown = b.assign(get(AMD64_RSP, IrType::I64));
    b.put(AMD64_RAX, rd_tmp(unknown));
    let after = b.assign(get(AMD64_RAX, IrType::I64));
    let block = b.finish(const_u64(0x400003), JumpKind::Boring);

    let result = interpret(&ctx, &block, GuestArch::Amd64);
    assert_eq!(const_of(&result, after), None);
}

#[test]
fn test_known_register_write_records_reference() {
    let mut b = BlockBuilder::new(AMD64_RIP);
    b.mark(0x400000, 7);
    let t0 = b.assign(const_u64(0x401007));
    let t1 = b.assign(binop(BinOp::Add64, rd_tmp(t0), const_u64(0x9)));
    b.put(AMD64_RAX, rd_tmp(t1));
    let block = b.finish(const_u64(0x400007), JumpKind::Boring);

    let result = interpret(&AnalysisContext::new(), &block, GuestArch::Amd64);
    let puts: Vec<_> = result.data_refs.iter().filter(|r| r.statement_index == 3).collect();
    assert_eq!(puts.len(), 1);
    assert_eq!(puts[0].data_address, 0x401010);
    assert_eq!(puts[0].data_type, DataRefType::Integer);
}

#[test]
fn test_load_through_last_constant_is_recorded_once() {
    let mut b = BlockBuilder::new(AMD64_RIP);
    b.mark(0x400000, 7);
    let t0 = b.assign(const_u64(0x601000));
    b.assign(load(Endianness::Little, IrType::I32, rd_tmp(t0)));
    let block = b.finish(const_u64(0x400007), JumpKind::Boring);

    let result = interpret(&AnalysisContext::new(), &block, GuestArch::Amd64);
    assert_eq!(ref_addresses(&result), vec![0x601000]);
    assert_ref(&result, 0x601000, 0, DataRefType::Unknown);
}

#[test]
fn test_folded_add_equal_to_last_constant_is_not_recorded() {
    let mut ctx = AnalysisContext::new();
    ctx.register_initial_register_value(AMD64_RAX, 8, 0x600000);

    let mut b = BlockBuilder::new(AMD64_RIP);
    b.mark(0x400000, 10);
    b.assign(const_u64(0x600ff0));
    let base = b.assign(get(AMD64_RAX, IrType::I64));
    let sum = b.assign(binop(BinOp::Add64, rd_tmp(base), const_u64(0xff0)));
    let block = b.finish(const_u64(0x40000a), JumpKind::Boring);

    let result = interpret(&ctx, &block, GuestArch::Amd64);
    assert_eq!(const_of(&result, sum), Some(0x600ff0));
    assert_eq!(ref_addresses(&result), vec![0x600ff0, 0xff0]);
    assert_eq!(find_ref(&result, 0x600ff0).unwrap().statement_index, 1);
}

#[test]
fn test_register_write_of_last_constant_is_not_recorded() {
    let mut b = BlockBuilder::new(AMD64_RIP);
    b.mark(0x400000, 7);
    let t0 = b.assign(const_u64(0x601000));
    b.put(AMD64_RAX, rd_tmp(t0));
    let reread = b.assign(get(AMD64_RAX, IrType::I64));
    let block = b.finish(const_u64(0x400007), JumpKind::Boring);

    let result = interpret(&AnalysisContext::new(), &block, GuestArch::Amd64);
    assert_eq!(ref_addresses(&result), vec![0x601000]);
    assert_eq!(const_of(&result, reread), Some(0x601000));
}

#[test]
fn test_mips32_gp_survives_unknown_write() {
    let mut ctx = AnalysisContext::new();
    ctx.register_initial_register_value(MIPS32_GP_OFFSET, 4, 0x4a8000);

    let mut b = BlockBuilder::new(136);
    b.mark(0x400100, 4);
    let sp = b.assign(get(MIPS32_SP, IrType::I32));
    let slot = b.assign(binop(BinOp::Add32, rd_tmp(sp), const_u32(0x10)));
    let reloaded = b.assign(load(Endianness::Big, IrType::I32, rd_tmp(slot)));
    b.put(MIPS32_GP_OFFSET, rd_tmp(reloaded));
    let gp = b.assign(get(MIPS32_GP_OFFSET, IrType::I32));
    let block = b.finish(const_u32(0x400104), JumpKind::Boring);

    let result = interpret(&ctx, &block, GuestArch::Mips32);
    assert_eq!(const_of(&result, gp), Some(0x4a8000));

    let cleared = interpret(&ctx, &block, GuestArch::Mips64);
    assert_eq!(const_of(&cleared, gp), None);
}

#[test]
fn test_arm_itstate_write_is_ignored() {
    let mut b = BlockBuilder::new(ARM_PC);
    b.mark(0x8000, 2);
    b.put(ARM_ITSTATE_OFFSET, const_u32(0x12345));
    let block = b.finish(const_u32(0x8002), JumpKind::Boring);

    let arm = interpret(&AnalysisContext::new(), &block, GuestArch::Arm);
    assert!(arm.data_refs.is_empty());

    let x86 = interpret(&AnalysisContext::new(), &block, GuestArch::X86);
    assert_eq!(ref_addresses(&x86), vec![0x12345]);
}

#[test]
fn test_arm_literal_pool_is_followed() {
    let ctx = context_with_region(0x9000, &[0x00, 0xa0, 0x00, 0x00]);

    let mut b = BlockBuilder::new(ARM_PC);
    b.mark(0x8000, 4);
    let pool = b.assign(const_u32(0x9000));
    let value = b.assign(load(Endianness::Little, IrType::I32, rd_tmp(pool)));
    b.put(ARM_R0, rd_tmp(value));
    let block = b.finish(const_u32(0x8004), JumpKind::Boring);

    let result = interpret(&ctx, &block, GuestArch::Arm);
    assert_eq!(const_of(&result, pool), Some(0x9000));
    assert_eq!(const_of(&result, value), Some(0xa000));
    assert_ref(&result, 0x9000, 0, DataRefType::Unknown);
    assert_ref(&result, 0xa000, 0, DataRefType::Integer);
    assert_eq!(ref_addresses(&result), vec![0x9000, 0xa000]);

    // Pointer loads are only followed on literal-pool architectures.
    let x86 = interpret(&ctx, &block, GuestArch::X86);
    assert_eq!(const_of(&x86, value), None);
}

#[test]
fn test_store_references() {
    let mut b = BlockBuilder::new(AMD64_RIP);
    b.mark(0x400000, 10);
    let val = b.assign(get(AMD64_RAX, IrType::I32));
    b.store(Endianness::Little, const_u64(0x603000), rd_tmp(val));
    b.store(Endianness::Little, rd_tmp(val), const_u64(0x604000));
    let block = b.finish(const_u64(0x40000a), JumpKind::Boring);

    let result = interpret(&AnalysisContext::new(), &block, GuestArch::Amd64);
    assert_ref(&result, 0x603000, 4, DataRefType::StoreInteger);
    assert_ref(&result, 0x604000, 0, DataRefType::Unknown);
}

#[test]
fn test_store_of_untyped_data_has_unknown_size() {
    let mut b = BlockBuilder::new(AMD64_RIP);
    b.mark(0x400000, 10);
    b.store(Endianness::Little, const_u64(0x603000), rd_tmp(99));
    let block = b.finish(const_u64(0x40000a), JumpKind::Boring);

    let result = interpret(&AnalysisContext::new(), &block, GuestArch::Amd64);
    assert_ref(&result, 0x603000, 0, DataRefType::Unknown);
}

#[test]
fn test_helper_call_reference() {
    let mut b = BlockBuilder::new(AMD64_RIP);
    b.mark(0x400000, 5);
    b.dirty("amd64g_dirtyhelper_FXRSTOR", Some(const_u64(0x605000)), 512);
    b.dirty("amd64g_dirtyhelper_RDTSC", None, 0);
    let block = b.finish(const_u64(0x400005), JumpKind::Boring);

    let result = interpret(&AnalysisContext::new(), &block, GuestArch::Amd64);
    assert_eq!(result.data_refs.len(), 1);
    assert_ref(&result, 0x605000, 512, DataRefType::FloatingPoint);
}

#[test]
fn test_guarded_load_reference() {
    let mut b = BlockBuilder::new(ARM_PC);
    b.mark(0x8000, 4);
    let guard = b.assign(get(ARM_R0, IrType::I32));
    let dst = b.new_temp(IrType::I32);
    b.load_g(dst, Endianness::Little, const_u32(0x32f50), const_u32(0), rd_tmp(guard));
    let block = b.finish(const_u32(0x8004), JumpKind::Boring);

    let result = interpret(&AnalysisContext::new(), &block, GuestArch::Arm);
    assert_ref(&result, 0x32f50, 4, DataRefType::Unknown);
}

#[test]
fn test_feature_switches() {
    let mut b = BlockBuilder::new(AMD64_RIP);
    b.mark(0x400000, 5);
    let t0 = b.assign(const_u64(0x601000));
    let block = b.finish(const_u64(0x400005), JumpKind::Boring);
    let ctx = AnalysisContext::new();

    let no_refs = InterpreterOptions {
        collect_data_refs: false,
        ..InterpreterOptions::default()
    };
    let result = Interpreter::run(&ctx, &block, GuestArch::Amd64, no_refs).unwrap();
    assert!(result.data_refs.is_empty());
    assert_eq!(const_of(&result, t0), Some(0x601000));

    let no_consts = InterpreterOptions {
        const_prop: false,
        ..InterpreterOptions::default()
    };
    let result = Interpreter::run(&ctx, &block, GuestArch::Amd64, no_consts).unwrap();
    assert_eq!(ref_addresses(&result), vec![0x601000]);
    assert!(result.const_vals.is_empty());
}

#[test]
fn test_statement_before_mark_is_rejected() {
    let mut b = BlockBuilder::new(AMD64_RIP);
    b.noop();
    b.put(AMD64_RAX, const_u64(0x601000));
    b.mark(0x400000, 4);
    let block = b.finish(const_u64(0x400004), JumpKind::Boring);

    let err = Interpreter::run(&AnalysisContext::new(), &block, GuestArch::Amd64, InterpreterOptions::default())
        .unwrap_err();
    assert!(matches!(err, AnalysisError::MissingInstructionMark { statement_index: 1, .. }));
}

#[test]
fn test_runs_are_independent() {
    let mut ctx = AnalysisContext::new();
    ctx.register_initial_register_value(AMD64_RAX, 8, 0x601000);

    let mut b = BlockBuilder::new(AMD64_RIP);
    b.mark(0x400000, 3);
    let t0 = b.assign(get(AMD64_RAX, IrType::I64));
    let block = b.finish(const_u64(0x400003), JumpKind::Boring);

    let first = interpret(&ctx, &block, GuestArch::Amd64);
    ctx.reset_initial_register_values();
    let second = interpret(&ctx, &block, GuestArch::Amd64);
    assert_eq!(const_of(&first, t0), Some(0x601000));
    assert_eq!(const_of(&second, t0), None);
}
