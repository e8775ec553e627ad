//! Register Binding Map
//!
//! The interpreter's belief about constant register contents. Keys encode the
//! byte range a register access covers, so accesses of different widths at the
//! same base offset are tracked separately.
//!
//! # Limitations
//! There is no overlap handling: writing 4 bytes at offset 16 does not
//! invalidate an existing 8-byte binding at offset 16. Reads only hit a binding
//! made with exactly the same offset and width.

use crate::engine::ir::types::IrType;
use std::collections::HashMap;

/// Key for a register access of type `ty` at guest-state `offset`.
///
/// The key is `(min_offset << 16) | max_offset`; offsets are expected to fit
/// in 16 bits.
#[inline(always)] // Hot path - every register access
pub fn binding_key(offset: u32, ty: IrType) -> u32 {
    let min_offset: u32 = offset;
    let max_offset: u32 = min_offset.wrapping_add(ty.size()).wrapping_sub(1u32);
    (min_offset << 16) | max_offset
}

/// Map from binding key to last constant written.
#[derive(Debug, Clone, Default)]
pub struct RegisterBindings {
    values: HashMap<u32, u64>,
}

impl RegisterBindings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the binding for `key`.
    #[inline]
    pub fn bind(&mut self, key: u32, value: u64) {
        self.values.insert(key, value);
    }

    /// Last value bound to `key`.
    #[inline]
    pub fn lookup(&self, key: u32) -> Option<u64> {
        self.values.get(&key).copied()
    }

    /// Forget the binding for `key`, if any.
    #[inline]
    pub fn unbind(&mut self, key: u32) {
        self.values.remove(&key);
    }

    /// Number of live bindings.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
