//! # Instruction Cache Model
//!
//! A direct-mapped cache of word-sized lines that watches every fetch
//! address. It never changes what the program computes; it only counts.
//!
//! ```text
//! 31                        2+n  2+n-1        2  1  0
//! ┌────────────────────────────┬────────────────┬─────┐
//! │ tag                        │ slot (n bits)  │ 0 0 │
//! └────────────────────────────┴────────────────┴─────┘
//!                                n = log2(size)
//! ```

use serde::{Deserialize, Serialize};

use crate::error::EmuError;

/// A validated number of cache slots: a power of two in `1..=MAX`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct CacheSize(u32);

impl CacheSize {
    pub const MAX: u32 = 1024;
    pub const DEFAULT: Self = Self(8);

    /// # Errors
    /// [`EmuError::InvalidCacheSize`] if `size` is not a power of two or is
    /// larger than [`CacheSize::MAX`].
    pub const fn new(size: u32) -> Result<Self, EmuError> {
        if size.is_power_of_two() && size <= Self::MAX {
            Ok(Self(size))
        } else {
            Err(EmuError::InvalidCacheSize {
                size,
                max: Self::MAX,
            })
        }
    }

    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }

    /// Number of address bits used for the slot index, counted by shifting
    /// the size right until only the lowest bit is left.
    #[must_use]
    pub const fn index_bits(self) -> u32 {
        let mut size = self.0;
        let mut bits = 0;
        while size > 1 {
            size >>= 1;
            bits += 1;
        }
        bits
    }
}

impl Default for CacheSize {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl TryFrom<u32> for CacheSize {
    type Error = EmuError;

    fn try_from(size: u32) -> Result<Self, Self::Error> {
        Self::new(size)
    }
}

impl From<CacheSize> for u32 {
    fn from(size: CacheSize) -> Self {
        size.0
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheSlot {
    pub valid: bool,
    pub tag: u32,
}

/// Outcome of a single lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Hit,
    Miss,
}

/// Counters exported to the reporting side.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    pub size: u32,
    pub requests: u64,
    pub hits: u64,
    pub misses: u64,
}

impl CacheStats {
    /// `hits / requests`, `None` before the first request.
    #[must_use]
    pub fn hit_ratio(&self) -> Option<f64> {
        ratio(self.hits, self.requests)
    }

    /// `misses / requests`, `None` before the first request.
    #[must_use]
    pub fn miss_ratio(&self) -> Option<f64> {
        ratio(self.misses, self.requests)
    }
}

#[allow(clippy::cast_precision_loss)]
pub(crate) fn ratio(part: u64, whole: u64) -> Option<f64> {
    (whole != 0).then(|| part as f64 / whole as f64)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectMappedCache {
    size: CacheSize,
    slots: Vec<CacheSlot>,
    stats: CacheStats,
}

impl DirectMappedCache {
    #[must_use]
    pub fn new(size: CacheSize) -> Self {
        Self {
            size,
            slots: vec![CacheSlot::default(); size.get() as usize],
            stats: CacheStats {
                size: size.get(),
                ..CacheStats::default()
            },
        }
    }

    #[must_use]
    pub const fn size(&self) -> CacheSize {
        self.size
    }

    #[must_use]
    pub const fn slot_of(&self, address: u32) -> usize {
        ((address >> 2) & (self.size.get() - 1)) as usize
    }

    #[must_use]
    pub const fn tag_of(&self, address: u32) -> u32 {
        // A 32-bit shift is out of range for u32, `checked_shr` yields 0 instead.
        match address.checked_shr(2 + self.size.index_bits()) {
            Some(tag) => tag,
            None => 0,
        }
    }

    /// Records one instruction fetch at `address`. The slot is valid and
    /// holds the address's tag afterwards, whether it hit or missed.
    pub fn access(&mut self, address: u32) -> Access {
        let slot = self.slot_of(address);
        let tag = self.tag_of(address);
        self.stats.requests += 1;

        let line = &mut self.slots[slot];
        if line.valid && line.tag == tag {
            self.stats.hits += 1;
            Access::Hit
        } else {
            self.stats.misses += 1;
            line.valid = true;
            line.tag = tag;
            Access::Miss
        }
    }

    #[must_use]
    pub fn slot(&self, index: usize) -> Option<&CacheSlot> {
        self.slots.get(index)
    }

    #[must_use]
    pub const fn stats(&self) -> CacheStats {
        self.stats
    }

    /// Invalidates every slot and zeroes the counters.
    pub fn reset(&mut self) {
        self.slots.fill(CacheSlot::default());
        self.stats = CacheStats {
            size: self.size.get(),
            ..CacheStats::default()
        };
    }
}
