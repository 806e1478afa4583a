//! Bit-accurate formatting of integer values for emitted VHDL literals.

/// Formats `value` as a two's-complement binary string of exactly `width`
/// characters, most significant bit first.
///
/// Negative values rely on the arithmetic right shift of `i64`, so the
/// string is the low `width` bits of the two's-complement representation.
/// Used for sized binary string literals (`"0101"`) in ROM case alternatives
/// and constant vector operands.
pub fn bin_str(value: i64, width: u32) -> String {
    let mut s = String::with_capacity(width as usize);
    for i in (0..width).rev() {
        if (value >> i) & 1 == 1 {
            s.push('1');
        } else {
            s.push('0');
        }
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero() {
        assert_eq!(bin_str(0, 4), "0000");
    }

    #[test]
    fn positive() {
        assert_eq!(bin_str(5, 4), "0101");
        assert_eq!(bin_str(255, 8), "11111111");
    }

    #[test]
    fn truncates_to_width() {
        assert_eq!(bin_str(0b10110, 3), "110");
    }

    #[test]
    fn negative_twos_complement() {
        assert_eq!(bin_str(-1, 4), "1111");
        assert_eq!(bin_str(-2, 4), "1110");
        assert_eq!(bin_str(-8, 4), "1000");
    }

    #[test]
    fn width_one() {
        assert_eq!(bin_str(1, 1), "1");
        assert_eq!(bin_str(0, 1), "0");
    }
}
