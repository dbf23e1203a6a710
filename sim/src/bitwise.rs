use std::fmt::Debug;
use std::mem::size_of;
use std::ops::RangeInclusive;

/// Helper methods to manipulate bits, the index (`bit_idx`) is counted
/// from lsb to msb (right to left).
pub trait Bits
where
    Self: Clone + Sized + Into<u64> + TryFrom<u64> + From<bool> + TryInto<u8> + From<u8>,
    <Self as TryFrom<u64>>::Error: Debug,
    <Self as TryInto<u8>>::Error: Debug,
{
    fn is_bit_on(&self, bit_idx: u8) -> bool {
        debug_assert!(bit_idx < (size_of::<Self>() * 8) as u8);
        let bitwise: u64 = <Self as Into<u64>>::into(self.clone());
        let mask: u64 = 0b1 << bit_idx;
        (bitwise & mask) != 0
    }

    fn is_bit_off(&self, bit_idx: u8) -> bool {
        !self.is_bit_on(bit_idx)
    }

    fn set_bit_on(&mut self, bit_idx: u8) {
        debug_assert!(bit_idx < (size_of::<Self>() * 8) as u8);
        let mut bitwise: u64 = <Self as Into<u64>>::into(self.clone());
        let mask = 0b1 << bit_idx;
        bitwise |= mask;
        *self = <Self as TryFrom<u64>>::try_from(bitwise).unwrap();
    }

    fn set_bit_off(&mut self, bit_idx: u8) {
        let mut bitwise: u64 = <Self as Into<u64>>::into(self.clone());
        let mask = !(0b1 << bit_idx);
        bitwise &= mask;
        *self = <Self as TryFrom<u64>>::try_from(bitwise).unwrap();
    }

    fn set_bit(&mut self, bit_idx: u8, value: bool) {
        match value {
            false => self.set_bit_off(bit_idx),
            true => self.set_bit_on(bit_idx),
        }
    }

    fn get_bit(&self, bit_idx: u8) -> bool {
        self.is_bit_on(bit_idx)
    }

    fn get_bits(&self, bits_range: RangeInclusive<u8>) -> Self {
        let start = bits_range.start();
        let length = bits_range.len() as u32;

        // A mask with `length` ones, moved into place. If `bits_range`
        // is 1..=10 the mask covers bits 1 through 10 inclusive.
        let mut mask = if length >= 64 {
            u64::MAX
        } else {
            (1_u64 << length) - 1
        };
        mask <<= start;

        let value: u64 = <Self as Into<u64>>::into(self.clone());

        // Apply the mask, then move the field back down to position 0.
        <Self as TryFrom<u64>>::try_from((value & mask) >> start).unwrap()
    }

    fn get_byte(&self, byte_nth: u8) -> u8 {
        debug_assert!(byte_nth < size_of::<Self>() as u8);

        // The byte_nth octet spans bits byte_nth*8 ..= byte_nth*8+7.
        self.get_bits(byte_nth * 8..=byte_nth * 8 + 7)
            .try_into()
            .unwrap()
    }

    fn set_byte(&mut self, byte_nth: u8, value: u8) {
        debug_assert!(byte_nth < size_of::<Self>() as u8);

        let mut bitwise: u64 = <Self as Into<u64>>::into(self.clone());
        let mask: u64 = !(0xFF << (8 * byte_nth));
        let shifted_value: u64 = u64::from(value) << (8 * byte_nth);

        bitwise = (bitwise & mask) | shifted_value;
        *self = <Self as TryFrom<u64>>::try_from(bitwise).unwrap();
    }

    /// Returns a sign-extended copy of the value, treating it as a
    /// two's-complement number `number_of_bits` long.
    fn sign_extended(&self, number_of_bits: u8) -> Self {
        let value: u64 = <Self as Into<u64>>::into(self.clone());

        // XOR with a mask holding only the "sign bit" clears that bit;
        // subtracting the mask then borrows through the upper bits, which
        // reproduces the sign extension. A positive value round-trips
        // unchanged because the XOR sets the bit the subtraction removes.
        let mask = 1_i64 << (number_of_bits - 1);
        let value = ((value as i64 ^ mask) - mask) as u64;

        // Drop the excess leading ones so `try_from` succeeds for types
        // narrower than 64 bits.
        let size_bits = (size_of::<Self>() * 8) as u32;
        let value = if size_bits >= 64 {
            value
        } else {
            value & ((1 << size_bits) - 1)
        };

        <Self as TryFrom<u64>>::try_from(value).unwrap()
    }
}

impl Bits for u64 {}
impl Bits for u32 {}
impl Bits for u16 {}
impl Bits for u8 {}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    #[test]
    fn test_is_on() {
        let b = 0b110011101_u32;
        assert!(b.is_bit_on(0));
        assert!(!b.is_bit_on(1));
        assert!(b.is_bit_on(2));
        assert!(b.is_bit_on(8));
        assert!(!b.is_bit_on(31));
    }

    #[test]
    fn test_is_off() {
        let b = 0b110011101_u32;
        assert!(!b.is_bit_off(0));
        assert!(b.is_bit_off(1));
        assert!(b.is_bit_off(31));
    }

    #[test]
    fn test_set_on() {
        let mut b = 0b110011101_u32;
        b.set_bit_on(1);
        b.set_bit_on(0);
        b.set_bit_on(11);
        assert_eq!(b, 0b100110011111);
    }

    #[test]
    fn test_set_off() {
        let mut b = 0b1101001101_u32;
        b.set_bit_off(0);
        b.set_bit_off(4);
        b.set_bit_off(5);
        b.set_bit_off(6);
        b.set_bit_off(20);
        assert_eq!(b, 0b1100001100);
    }

    #[test]
    fn set_bit() {
        let mut b = 0b1100110_u32;
        b.set_bit(0, true);
        b.set_bit(1, true);
        b.set_bit(2, false);
        b.set_bit(3, false);
        assert_eq!(b, 0b1100011)
    }

    #[test]
    fn toggle_every_bit() {
        let original = rand::rng().random_range(1..=u32::MAX - 1);
        let mut flipped = original;
        for i in 0..32 {
            flipped.set_bit(i, original.is_bit_off(i));
        }

        assert_eq!(!original, flipped);
    }

    #[test]
    fn get_bits() {
        let b = 0b1011001110_u32;
        assert_eq!(b.get_bits(0..=3), 0b1110);
        assert_eq!(b.get_bits(1..=1), 0b1);
        assert_eq!(b.get_bits(4..=7), 0b1100);
        assert_eq!(b.get_bits(8..=9), 0b10);
        assert_eq!(b.get_bits(0..=31), 0b10_1100_1110);
        assert_eq!(b.get_bits(28..=31), 0b0);
    }

    #[test]
    fn get_byte() {
        let b: u32 = 0b00000001_00100010_00000100_01001000;

        assert_eq!(b.get_byte(0), 0b01001000_u8);
        assert_eq!(b.get_byte(1), 0b00000100_u8);
        assert_eq!(b.get_byte(2), 0b00100010_u8);
        assert_eq!(b.get_byte(3), 0b00000001_u8);
    }

    #[test]
    fn set_byte() {
        let mut b: u32 = 0;

        b.set_byte(2, 0b1010_1010);

        assert_eq!(b >> 16, 0b1010_1010);
    }

    #[test]
    #[should_panic]
    fn get_byte_panic() {
        let b: u32 = 0b00000001_00000010_00000100_00001000;

        b.get_byte(4);
    }

    #[test]
    fn check_sign_extended() {
        let a: u32 = 0b1001; // -7 in i4

        assert_eq!(a.sign_extended(4) as i32, -7);

        let positive: u32 = 0b0111;
        assert_eq!(positive.sign_extended(4), 7);
    }

    #[test]
    fn sign_extend_branch_offset() {
        // A 26-bit field holding -8 in two's complement.
        let offset: u32 = 0x03FF_FFF8;
        assert_eq!(offset.sign_extended(26) as i32, -8);
    }
}
