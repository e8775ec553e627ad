//! Default Exit Resolution
//!
//! Resolves a block's terminal `next` expression to a constant address.
//!
//! # Algorithm
//! Only fallthrough, call and icache-invalidation exits are considered. A
//! constant `next` is returned directly. A temporary `next` is chased backward
//! through the statements, one definition at a time:
//!
//! ```text
//! t5 = 0x00401000        <- Const: resolved
//! PUT(16) = t5
//! t7 = GET:I64(16)       <- Register{16, I64}: keep scanning backward
//! t9 = t7                <- Temp(7)
//! next = t9              <- start tracking Temp(9)
//! ```
//!
//! The scan visits every statement at most once, so it ends after at most
//! `block.len()` steps.

use crate::engine::ir::instruction::{Expression, IrBlock, Statement};
use crate::engine::ir::types::{IrType, Temp};

/// Definition the backward scan is looking for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tracked {
    Temp(Temp),
    Register { offset: u32, ty: IrType },
}

/// Outcome of following one definition.
enum Step {
    Resolved(Option<u64>),
    Track(Tracked),
}

/// Default exit resolver.
pub struct ExitResolver;

impl ExitResolver {
    /// Resolve the default exit target of `block`.
    ///
    /// # Returns
    /// `Option<u64>` - Target address, or `None` if the exit kind has no
    /// static target or the target cannot be proven constant
    pub fn resolve(block: &IrBlock) -> Option<u64> {
        if !block.jump_kind.has_resolvable_target() {
            return None;
        }

        let mut tracked: Tracked = match &block.next {
            Expression::Const(con) => return con.as_target(),
            Expression::ReadTemp(tmp) => Tracked::Temp(*tmp),
            other => {
                log::trace!("Default exit: unsupported next expression {}", other);
                return None;
            }
        };

        for stmt in block.statements.iter().rev() {
            let data: &Expression = match (stmt, tracked) {
                (Statement::TempWrite { temp, data }, Tracked::Temp(wanted)) if *temp == wanted => data,
                (Statement::RegisterWrite { offset, data }, Tracked::Register { offset: wanted, ty })
                    if *offset == wanted =>
                {
                    if block.type_of(data) != Some(ty) {
                        log::trace!("Default exit: PUT({}) width differs from tracked {}", offset, ty);
                        return None;
                    }
                    data
                }
                (Statement::GuardedLoad { .. }, _) => {
                    log::trace!("Default exit: guarded load in chain, giving up");
                    return None;
                }
                _ => continue,
            };

            match Self::follow(data) {
                Step::Resolved(target) => {
                    if let Some(target) = target {
                        log::debug!("Default exit resolved to 0x{:x}", target);
                    }
                    return target;
                }
                Step::Track(next) => tracked = next,
            }
        }

        None
    }

    fn follow(data: &Expression) -> Step {
        match data {
            Expression::Const(con) => Step::Resolved(con.as_target()),
            Expression::ReadTemp(tmp) => Step::Track(Tracked::Temp(*tmp)),
            // PUTs of a different width than this read end the chase.
            Expression::ReadRegister { offset, ty } => Step::Track(Tracked::Register {
                offset: *offset,
                ty: *ty,
            }),
            other => {
                log::trace!("Default exit: unsupported definition {}", other);
                Step::Resolved(None)
            }
        }
    }
}
