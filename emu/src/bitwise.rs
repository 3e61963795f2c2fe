use std::fmt::Debug;
use std::mem::size_of;
use std::ops::RangeInclusive;

/// Helpers to pull fields out of instruction words and status registers.
/// Bit indexes go from lsb to msb (right to left).
pub trait Bits
where
    Self: Copy + Sized + Into<u64> + TryFrom<u64>,
    <Self as TryFrom<u64>>::Error: Debug,
{
    fn width() -> u8 {
        (size_of::<Self>() * 8) as u8
    }

    fn is_bit_on(&self, bit_idx: u8) -> bool {
        debug_assert!(bit_idx < Self::width());
        let value: u64 = (*self).into();
        (value >> bit_idx) & 1 == 1
    }

    fn is_bit_off(&self, bit_idx: u8) -> bool {
        !self.is_bit_on(bit_idx)
    }

    fn set_bit_on(&mut self, bit_idx: u8) {
        debug_assert!(bit_idx < Self::width());
        let value: u64 = (*self).into();
        *self = Self::try_from(value | (1 << bit_idx)).unwrap();
    }

    fn set_bit_off(&mut self, bit_idx: u8) {
        debug_assert!(bit_idx < Self::width());
        let value: u64 = (*self).into();
        *self = Self::try_from(value & !(1 << bit_idx)).unwrap();
    }

    fn set_bit(&mut self, bit_idx: u8, value: bool) {
        if value {
            self.set_bit_on(bit_idx);
        } else {
            self.set_bit_off(bit_idx);
        }
    }

    fn get_bit(&self, bit_idx: u8) -> bool {
        self.is_bit_on(bit_idx)
    }

    /// Extracts the inclusive field `bits_range` and moves it down to bit 0.
    /// `get_bits(21..=24)` on a data processing word yields its opcode.
    fn get_bits(&self, bits_range: RangeInclusive<u8>) -> Self {
        let start = *bits_range.start();
        let end = *bits_range.end();
        debug_assert!(start <= end && end < Self::width());

        let length = u32::from(end - start + 1);
        let mask = (1_u64 << length) - 1;
        let value: u64 = (*self).into();

        Self::try_from((value >> start) & mask).unwrap()
    }

    /// Checks that every bit in `bits_range` is set.
    fn are_bits_on(&self, bits_range: RangeInclusive<u8>) -> bool {
        bits_range.into_iter().all(|idx| self.is_bit_on(idx))
    }

    /// Treats the lowest `number_of_bits` as a two's complement number and
    /// widens it to the full width of `Self`.
    ///
    /// Flipping the sign bit and subtracting it back borrows through every
    /// upper bit when the sign bit was set, and cancels out when it was not:
    ///
    /// ```text
    /// 0b1001 (i4 = -7): 0b1001 ^ 0b1000 = 0b0001, 0b0001 - 0b1000 = ..1111_1001
    /// 0b0111 (i4 = +7): 0b0111 ^ 0b1000 = 0b1111, 0b1111 - 0b1000 = ..0000_0111
    /// ```
    fn sign_extended(&self, number_of_bits: u8) -> Self {
        debug_assert!(number_of_bits > 0 && number_of_bits <= Self::width());
        let raw: u64 = (*self).into();
        let field = raw & ((1_u64 << number_of_bits) - 1);
        let sign = 1_i64 << (number_of_bits - 1);

        let extended = ((field as i64) ^ sign) - sign;

        let full_mask = if Self::width() == 64 {
            u64::MAX
        } else {
            (1_u64 << Self::width()) - 1
        };

        Self::try_from(extended as u64 & full_mask).unwrap()
    }
}

impl Bits for u32 {}
impl Bits for u8 {}
