//! Byte-lane helpers for wide bus words.

use num::{BigUint, One, Zero};
use rand::Rng;

/// All-ones mask covering `bytes` bytes.
pub fn byte_mask(bytes: usize) -> BigUint {
    (BigUint::one() << (bytes * 8)) - 1u32
}

/// All-ones strobe covering `bytes` lanes.
pub fn lane_strobe(bytes: usize) -> BigUint {
    (BigUint::one() << bytes) - 1u32
}

/// Expand a byte strobe into a bit mask, one 0xff byte per set strobe bit.
pub fn strobe_to_bit_mask(strb: &BigUint) -> BigUint {
    let mut mask = BigUint::zero();
    for lane in 0..strb.bits() {
        if strb.bit(lane) {
            mask |= BigUint::from(0xffu32) << (lane * 8) as usize;
        }
    }
    mask
}

pub fn apply_strobe(data: &BigUint, strb: &BigUint) -> BigUint {
    data & strobe_to_bit_mask(strb)
}

/// Uniformly random value of `bytes` bytes.
pub fn random_bytes<R: Rng + ?Sized>(rng: &mut R, bytes: usize) -> BigUint {
    let mut buf = vec![0u8; bytes];
    rng.fill_bytes(&mut buf);
    BigUint::from_bytes_le(&buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strobe_expands_per_lane() {
        assert_eq!(strobe_to_bit_mask(&BigUint::from(0b101u32)), BigUint::from(0xff00ffu32));
        assert_eq!(strobe_to_bit_mask(&BigUint::zero()), BigUint::zero());
        assert_eq!(strobe_to_bit_mask(&lane_strobe(16)), byte_mask(16));
    }

    #[test]
    fn apply_strobe_keeps_enabled_lanes() {
        let data = BigUint::from(0x1122_3344u32);
        assert_eq!(apply_strobe(&data, &BigUint::from(0b0110u32)), BigUint::from(0x0022_3300u32));
    }
}
