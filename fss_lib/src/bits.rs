/// Width in bits of the platform's native unsigned integer (32 or 64).
pub fn native_width() -> u32 {
    usize::BITS
}

/// Domain bit examined at tree `level`. Level 0 is the most significant of
/// the `num_bits` active bits. Positions past the native width read as 0.
pub fn bit_at(x: u64, level: u32, native_width: u32, num_bits: u32) -> u8 {
    // 1-based position counted from the native MSB
    let pos = match (native_width + level + 1).checked_sub(num_bits) {
        Some(pos) if pos >= 1 && pos <= native_width => pos,
        _ => return 0,
    };
    ((x >> (native_width - pos)) & 1) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn msb_first_within_active_bits() {
        // 0b1011 over a 4-bit domain
        let x = 0b1011u64;
        let bits: Vec<u8> = (0..4).map(|i| bit_at(x, i, 64, 4)).collect();
        assert_eq!(bits, vec![1, 0, 1, 1]);

        let bits32: Vec<u8> = (0..4).map(|i| bit_at(x, i, 32, 4)).collect();
        assert_eq!(bits32, vec![1, 0, 1, 1]);
    }

    #[test]
    fn full_width_domain() {
        let x = 1u64 << 63 | 1;
        assert_eq!(bit_at(x, 0, 64, 64), 1);
        assert_eq!(bit_at(x, 1, 64, 64), 0);
        assert_eq!(bit_at(x, 63, 64, 64), 1);
    }

    #[test]
    fn level_past_native_width_reads_zero() {
        assert_eq!(bit_at(u64::MAX, 64, 64, 64), 0);
        assert_eq!(bit_at(u64::MAX, 8, 64, 8), 0);
        assert_eq!(bit_at(u64::MAX, 40, 32, 8), 0);
    }

    #[test]
    fn native_width_is_32_or_64() {
        assert!(matches!(native_width(), 32 | 64));
    }
}
