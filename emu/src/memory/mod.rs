//! # Memory Image
//!
//! One contiguous little-endian byte region laid out as:
//!
//! ```text
//! code_base                data_base               stack_bottom        stack_top
//! ┌────────────────────────┬───────────────────────┬───────────────────┐
//! │ code (fetch/load/store)│ data (load/store)     │ stack (load/store)│
//! └────────────────────────┴───────────────────────┴───────────────────┘
//! ```
//!
//! Every region starts on a word boundary. Instruction fetches must land in
//! the code region, loads and stores anywhere in the image. The stack grows
//! down from `stack_top`, which is one past the last byte of the image.

use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::error::EmuError;

/// Kind of memory access, carried by [`EmuError::OutOfBounds`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccessKind {
    Fetch,
    Load,
    Store,
}

impl std::fmt::Display for AccessKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Fetch => f.write_str("instruction fetch"),
            Self::Load => f.write_str("load"),
            Self::Store => f.write_str("store"),
        }
    }
}

const fn align_word(len: u64) -> u64 {
    (len + 3) & !3
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryImage {
    base: u32,
    bytes: Vec<u8>,
    code_len: u32,
    data_base: u32,
    stack_bottom: u32,
}

impl MemoryImage {
    /// Lays out `code`, `data` and a zeroed stack of `stack_size` bytes
    /// starting at `base`.
    ///
    /// # Errors
    /// [`EmuError::InvalidLayout`] when `base` is zero (the halt sentinel)
    /// or unaligned, when `code` is empty or not a whole number of words,
    /// or when the image would run past the end of the address space.
    pub fn new(base: u32, code: &[u8], data: &[u8], stack_size: u32) -> Result<Self, EmuError> {
        if base == 0 || base % 4 != 0 {
            return Err(EmuError::InvalidLayout {
                reason: format!("code base 0x{base:08X} must be non-zero and word aligned"),
            });
        }
        if code.is_empty() || code.len() % 4 != 0 {
            return Err(EmuError::InvalidLayout {
                reason: format!("code is {} bytes, expected whole words", code.len()),
            });
        }

        let code_len = code.len() as u64;
        let data_offset = code_len;
        let stack_offset = align_word(data_offset + data.len() as u64);
        let total = stack_offset + u64::from(stack_size);

        // stack_top (= base + total) must itself be addressable.
        if u64::from(base) + total > u64::from(u32::MAX) {
            return Err(EmuError::InvalidLayout {
                reason: format!(
                    "{total} bytes starting at 0x{base:08X} overflow the address space"
                ),
            });
        }

        let mut bytes = vec![0; total as usize];
        bytes[..code.len()].copy_from_slice(code);
        bytes[code.len()..code.len() + data.len()].copy_from_slice(data);

        Ok(Self {
            base,
            bytes,
            code_len: code_len as u32,
            data_base: base + data_offset as u32,
            stack_bottom: base + stack_offset as u32,
        })
    }

    #[must_use]
    pub const fn base(&self) -> u32 {
        self.base
    }

    #[must_use]
    pub const fn code_range(&self) -> Range<u32> {
        self.base..self.base + self.code_len
    }

    /// Address of the first byte of the data region.
    #[must_use]
    pub const fn data_base(&self) -> u32 {
        self.data_base
    }

    #[must_use]
    pub const fn stack_bottom(&self) -> u32 {
        self.stack_bottom
    }

    /// One past the highest stack byte; the initial stack pointer.
    #[must_use]
    pub fn stack_top(&self) -> u32 {
        self.base + self.bytes.len() as u32
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    fn offset(&self, address: u32, width: u32, kind: AccessKind) -> Result<usize, EmuError> {
        let limit = match kind {
            AccessKind::Fetch => u64::from(self.code_len),
            AccessKind::Load | AccessKind::Store => self.bytes.len() as u64,
        };

        match address.checked_sub(self.base) {
            Some(offset) if u64::from(offset) + u64::from(width) <= limit => Ok(offset as usize),
            _ => Err(EmuError::OutOfBounds {
                address,
                width,
                kind,
            }),
        }
    }

    /// Reads the instruction word at `address`.
    ///
    /// # Errors
    /// [`EmuError::OutOfBounds`] unless all four bytes are in the code region.
    pub fn fetch(&self, address: u32) -> Result<u32, EmuError> {
        let offset = self.offset(address, 4, AccessKind::Fetch)?;
        Ok(self.word_at(offset))
    }

    /// # Errors
    /// [`EmuError::OutOfBounds`] unless all four bytes are in the image.
    pub fn read_word(&self, address: u32) -> Result<u32, EmuError> {
        let offset = self.offset(address, 4, AccessKind::Load)?;
        Ok(self.word_at(offset))
    }

    /// # Errors
    /// [`EmuError::OutOfBounds`] if `address` is outside the image.
    pub fn read_byte(&self, address: u32) -> Result<u8, EmuError> {
        let offset = self.offset(address, 1, AccessKind::Load)?;
        Ok(self.bytes[offset])
    }

    /// # Errors
    /// [`EmuError::OutOfBounds`] unless all four bytes are in the image.
    pub fn write_word(&mut self, address: u32, value: u32) -> Result<(), EmuError> {
        let offset = self.offset(address, 4, AccessKind::Store)?;
        self.bytes[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
        Ok(())
    }

    /// # Errors
    /// [`EmuError::OutOfBounds`] if `address` is outside the image.
    pub fn write_byte(&mut self, address: u32, value: u8) -> Result<(), EmuError> {
        let offset = self.offset(address, 1, AccessKind::Store)?;
        self.bytes[offset] = value;
        Ok(())
    }

    /// Borrows `len` bytes starting at `address`, e.g. to inspect data a
    /// program wrote back.
    ///
    /// # Errors
    /// [`EmuError::OutOfBounds`] unless the whole range is in the image.
    pub fn slice(&self, address: u32, len: u32) -> Result<&[u8], EmuError> {
        let offset = self.offset(address, len, AccessKind::Load)?;
        Ok(&self.bytes[offset..offset + len as usize])
    }

    fn word_at(&self, offset: usize) -> u32 {
        let mut word = [0; 4];
        word.copy_from_slice(&self.bytes[offset..offset + 4]);
        u32::from_le_bytes(word)
    }
}
