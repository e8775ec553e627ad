//! Read-Only Region Store
//!
//! This module models memory whose content is known ahead of analysis, such as
//! the read-only sections of the binary being analyzed. The interpreter reads
//! it to fold loads from constant addresses into constants.
//!
//! # Layout
//! Regions are kept in a `Vec` sorted ascending by start address. Regions are
//! registered in increasing order in practice, so the common insertion is an
//! append; out-of-order insertion shifts later regions right by one slot.
//! Registering a region at an existing start replaces it in place.
//!
//! # Memory Optimizations
//! - Region content is shared through `Arc<[u8]>`; registering a section does not copy it
//! - Loads return a `SmallVec<[u8; 16]>`, so no allocation for scalar and 128-bit loads
//! - `clear()` keeps the backing storage for the next session
//!
//! # API Reference
//!
//! ```rust,no_run
//! use blockscan_core::engine::ir::Endianness;
//! use blockscan_core::runtime::regions::RegionStore;
//!
//! let mut store = RegionStore::new();
//! store.register(0x1000, 4, vec![0x01, 0x02, 0x03, 0x04]);
//! assert_eq!(store.load_value(0x1000, 4, Endianness::Big), Some(0x01020304));
//! ```

use crate::engine::ir::types::Endianness;
use smallvec::SmallVec;
use std::sync::Arc;

/// Default number of regions a store can hold.
pub const MAX_REGION_COUNT: usize = 1024;

/// One region of known memory content.
#[derive(Debug, Clone)]
pub struct MemoryRegion {
    /// First address covered
    pub start: u64,
    /// Number of bytes covered
    pub size: u64,
    content: Arc<[u8]>,
}

impl MemoryRegion {
    /// Raw content of the region.
    pub fn content(&self) -> &[u8] {
        &self.content
    }

    /// Whether a `size`-byte access at `address` falls inside this region.
    ///
    /// Mirrors the long-standing containment test, which checks the access end
    /// against both the region start and the region end.
    #[inline]
    fn covers(&self, address: u64, size: u64) -> bool {
        let end: u64 = match address.checked_add(size) {
            Some(end) => end,
            None => return false,
        };
        let region_end: u64 = self.start.saturating_add(self.size);
        self.start <= address && self.start <= end && region_end >= end
    }
}

/// Sorted, bounded collection of read-only regions.
#[derive(Debug, Clone)]
pub struct RegionStore {
    regions: Vec<MemoryRegion>,
    capacity: usize,
}

impl RegionStore {
    /// Create an empty store with the default capacity.
    pub fn new() -> Self {
        Self::with_capacity(MAX_REGION_COUNT)
    }

    /// Create an empty store holding at most `capacity` regions.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            regions: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Slot where a region starting at `start` belongs.
    ///
    /// # Algorithm
    /// Appends are checked first (the last region starts below `start`); all
    /// other cases use a binary search for the first region whose start is
    /// `>= start`.
    #[inline]
    fn find_region(&self, start: u64) -> usize {
        match self.regions.last() {
            Some(last) if last.start < start => self.regions.len(),
            _ => self.regions.partition_point(|region| region.start < start),
        }
    }

    /// Register a region of known content.
    ///
    /// # Arguments
    /// * `start` - First address of the region
    /// * `size` - Number of bytes the region covers
    /// * `content` - Region bytes (at least `size` bytes for loads to succeed)
    ///
    /// # Returns
    /// `bool` - `false` if the store is full, `true` otherwise
    pub fn register(&mut self, start: u64, size: u64, content: impl Into<Arc<[u8]>>) -> bool {
        if self.regions.len() >= self.capacity {
            log::warn!(
                "Read-only region store full ({} regions), dropping region at 0x{:x}",
                self.capacity,
                start
            );
            return false;
        }

        let region = MemoryRegion {
            start,
            size,
            content: content.into(),
        };
        let pos: usize = self.find_region(start);
        if pos == self.regions.len() {
            self.regions.push(region);
        } else if self.regions[pos].start == start {
            self.regions[pos] = region;
        } else {
            self.regions.insert(pos, region);
        }
        true
    }

    /// Forget every region.
    #[inline]
    pub fn clear(&mut self) {
        self.regions.clear();
    }

    /// Registered regions, sorted by start.
    pub fn regions(&self) -> &[MemoryRegion] {
        &self.regions
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Load `size` bytes at `address`, converted to host byte order.
    ///
    /// # Algorithm
    /// 1. Locate the candidate slot for `address` with the insertion search
    /// 2. Use that region if it covers the access, else the preceding one
    /// 3. Copy the bytes; when `endianness` differs from the host, reverse them
    ///
    /// # Returns
    /// `Option<SmallVec<[u8; 16]>>` - Bytes in host order, or `None` if no
    /// region covers the access
    pub fn load_bytes(&self, address: u64, size: u32, endianness: Endianness) -> Option<SmallVec<[u8; 16]>> {
        let size64: u64 = size as u64;
        let pos: usize = self.regions.partition_point(|region| region.start < address);

        let region: &MemoryRegion = match self.regions.get(pos) {
            Some(region) if region.covers(address, size64) => region,
            _ => {
                let prev: usize = pos.checked_sub(1usize)?;
                let region: &MemoryRegion = &self.regions[prev];
                if !region.covers(address, size64) {
                    return None;
                }
                region
            }
        };

        let offset: usize = usize::try_from(address - region.start).ok()?;
        let end: usize = offset.checked_add(size as usize)?;
        let bytes: &[u8] = region.content.get(offset..end)?;

        let mut out: SmallVec<[u8; 16]> = SmallVec::from_slice(bytes);
        if endianness != Endianness::host() {
            out.reverse();
        }
        Some(out)
    }

    /// Load a scalar of `size` bytes (1 to 8) at `address`.
    ///
    /// # Returns
    /// `Option<u64>` - Zero-extended value, or `None` if no region covers the
    /// access or `size` is not between 1 and 8
    pub fn load_value(&self, address: u64, size: u32, endianness: Endianness) -> Option<u64> {
        if size == 0u32 || size > 8u32 {
            return None;
        }
        let bytes: SmallVec<[u8; 16]> = self.load_bytes(address, size, endianness)?;
        let n: usize = bytes.len();
        let mut buf: [u8; 8] = [0u8; 8];
        if cfg!(target_endian = "little") {
            buf[..n].copy_from_slice(&bytes);
        } else {
            buf[8usize - n..].copy_from_slice(&bytes);
        }
        Some(u64::from_ne_bytes(buf))
    }
}

impl Default for RegionStore {
    fn default() -> Self {
        Self::new()
    }
}
