//! Lifted IR model consumed by the analyses.

pub mod builder;
pub mod display;
pub mod instruction;
pub mod types;

pub use builder::BlockBuilder;
pub use instruction::{BinOp, Expression, IrBlock, Statement, UnOp};
pub use types::{Const, Endianness, IrType, JumpKind, Temp};
