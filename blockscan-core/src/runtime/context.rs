//! Analysis Context
//!
//! Session-wide configuration shared by every analysis call: the read-only
//! region store and the list of initial register values seeded into the
//! interpreter. The caller registers both before a session and resets them
//! afterwards. Analyses borrow the context immutably, so registration can never
//! interleave with a running analysis.

use crate::engine::config::AnalysisConfig;
use crate::engine::ir::types::Endianness;
use crate::runtime::regions::RegionStore;
use std::sync::Arc;

/// Default number of initial register values a context can hold.
pub const MAX_INITIAL_REGISTERS: usize = 1024;

/// Known register value at block entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InitialRegisterValue {
    /// Guest-state offset
    pub offset: u32,
    /// Width in bytes (1, 2, 4, 8 or 16)
    pub size: u32,
    pub value: u64,
}

/// Owner of the region store and initial register seeds.
#[derive(Debug, Clone)]
pub struct AnalysisContext {
    regions: RegionStore,
    initial_registers: Vec<InitialRegisterValue>,
    max_initial_registers: usize,
}

impl AnalysisContext {
    /// Create an empty context with default capacities.
    pub fn new() -> Self {
        Self {
            regions: RegionStore::new(),
            initial_registers: Vec::new(),
            max_initial_registers: MAX_INITIAL_REGISTERS,
        }
    }

    /// Create an empty context with the capacities from `config`.
    pub fn with_config(config: &AnalysisConfig) -> Self {
        Self {
            regions: RegionStore::with_capacity(config.max_regions),
            initial_registers: Vec::new(),
            max_initial_registers: config.max_initial_registers,
        }
    }

    /// Register a region of known read-only content.
    ///
    /// # Returns
    /// `bool` - `false` if the region store is full
    pub fn register_readonly_region(&mut self, start: u64, size: u64, content: impl Into<Arc<[u8]>>) -> bool {
        self.regions.register(start, size, content)
    }

    /// Forget every read-only region.
    pub fn clear_readonly_regions(&mut self) {
        self.regions.clear();
    }

    /// Read-only region store.
    pub fn regions(&self) -> &RegionStore {
        &self.regions
    }

    /// Convenience wrapper over [`RegionStore::load_value`].
    #[inline]
    pub fn load_value(&self, address: u64, size: u32, endianness: Endianness) -> Option<u64> {
        self.regions.load_value(address, size, endianness)
    }

    /// Seed a register value for subsequent interpreter runs.
    ///
    /// # Returns
    /// `bool` - `false` if the seed list is full or `size` is not one of
    /// 1, 2, 4, 8, 16
    pub fn register_initial_register_value(&mut self, offset: u32, size: u32, value: u64) -> bool {
        if self.initial_registers.len() >= self.max_initial_registers {
            log::warn!(
                "Initial register list full ({} entries), dropping offset {}",
                self.max_initial_registers,
                offset
            );
            return false;
        }
        if !matches!(size, 1 | 2 | 4 | 8 | 16) {
            return false;
        }
        self.initial_registers.push(InitialRegisterValue { offset, size, value });
        true
    }

    /// Forget every seeded register value.
    pub fn reset_initial_register_values(&mut self) {
        self.initial_registers.clear();
    }

    /// Seeded register values, in registration order.
    pub fn initial_registers(&self) -> &[InitialRegisterValue] {
        &self.initial_registers
    }

    /// Reset the whole context at the end of a session.
    pub fn reset(&mut self) {
        self.clear_readonly_regions();
        self.reset_initial_register_values();
    }
}

impl Default for AnalysisContext {
    fn default() -> Self {
        Self::new()
    }
}
