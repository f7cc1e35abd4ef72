//! Target immediate-encoding capabilities.
//!
//! Lowering never hardcodes instruction encodings; it asks this oracle whether a
//! constant fits the immediate field of the rewritten form. The rules model a
//! 64-bit RISC target with aarch64-shaped immediate classes: 12-bit (optionally
//! shifted) arithmetic immediates, bitmask logical immediates, and shift amounts
//! bounded by the operand width.

/// Immediate-encoding oracle of the compilation target.
///
/// Queried by the lowering pass; all methods are pure. `width` is the operand width
/// in bits and must be 32 or 64 (narrower operations are never rewritten to
/// immediate forms).
#[derive(Debug, Clone, Copy, Default)]
pub struct Target;

impl Target {
    /// Whether `value` fits the immediate field of an add/sub-style instruction:
    /// a non-negative 12-bit value, optionally shifted left by 12.
    #[must_use]
    pub fn can_encode_imm_add_sub(self, value: i64, width: u8) -> bool {
        debug_assert!(width == 32 || width == 64);
        if value < 0 {
            return false;
        }
        let v = value as u64;
        v <= 0xFFF || (v & 0xFFF == 0 && (v >> 12) <= 0xFFF)
    }

    /// Whether `value` fits a compare-with-immediate encoding. Compares share the
    /// arithmetic immediate class.
    #[must_use]
    pub fn can_encode_imm_compare(self, value: i64, width: u8) -> bool {
        self.can_encode_imm_add_sub(value, width)
    }

    /// Whether `value` is a valid bitmask immediate for and/or/xor at the given
    /// width: a contiguous run of ones, rotated, replicated across the register at
    /// some power-of-two element size. All-zero and all-one patterns are excluded.
    #[must_use]
    pub fn can_encode_imm_logical(self, value: i64, width: u8) -> bool {
        debug_assert!(width == 32 || width == 64);
        let mut val = value as u64;
        if width == 32 {
            val &= 0xFFFF_FFFF;
            val |= val << 32;
        }
        if val == 0 || val == u64::MAX {
            return false;
        }
        // Find the smallest repeating element size.
        let mut size: u32 = 64;
        while size > 2 {
            let half = size / 2;
            let mask = (1u64 << half) - 1;
            if (val & mask) != ((val >> half) & mask) {
                break;
            }
            size = half;
        }
        let mask = if size == 64 { u64::MAX } else { (1u64 << size) - 1 };
        let elem = val & mask;
        // A rotated run of ones has exactly one 0->1 and one 1->0 boundary when
        // read circularly.
        let rotated = ((elem << 1) | (elem >> (size - 1))) & mask;
        (elem ^ rotated).count_ones() == 2
    }

    /// Whether `value` is a legal immediate shift amount at the given width.
    #[must_use]
    pub fn can_encode_imm_shift(self, value: i64, width: u8) -> bool {
        debug_assert!(width == 32 || width == 64);
        (0..i64::from(width)).contains(&value)
    }
}

#[cfg(test)]
mod tests {
    use super::Target;

    #[test]
    fn test_add_sub_plain_12bit() {
        let t = Target;
        assert!(t.can_encode_imm_add_sub(0, 32));
        assert!(t.can_encode_imm_add_sub(0xFFF, 64));
        assert!(!t.can_encode_imm_add_sub(0x1001, 64));
        assert!(!t.can_encode_imm_add_sub(-1, 64));
    }

    #[test]
    fn test_add_sub_shifted_form() {
        let t = Target;
        assert!(t.can_encode_imm_add_sub(0x1000, 64));
        assert!(t.can_encode_imm_add_sub(0xFFF000, 64));
        assert!(!t.can_encode_imm_add_sub(0x1000001, 64));
    }

    #[test]
    fn test_logical_runs() {
        let t = Target;
        // 0b1100: one run of ones
        assert!(t.can_encode_imm_logical(12, 32));
        assert!(t.can_encode_imm_logical(12, 64));
        // 0xFF00FF00FF00FF00: replicated runs at element size 16
        assert!(t.can_encode_imm_logical(0xFF00_FF00_FF00_FF00u64 as i64, 64));
        // 0b110010: two runs
        assert!(!t.can_encode_imm_logical(50, 64));
        assert!(!t.can_encode_imm_logical(0, 64));
        assert!(!t.can_encode_imm_logical(-1i64, 64));
    }

    #[test]
    fn test_logical_32bit_replication() {
        let t = Target;
        // 0x0000_0001 replicates to a valid 64-bit pattern
        assert!(t.can_encode_imm_logical(1, 32));
        // all ones in 32-bit is excluded even though the 64-bit replication is not
        assert!(!t.can_encode_imm_logical(0xFFFF_FFFFu32 as i64, 32));
    }

    #[test]
    fn test_shift_bounds() {
        let t = Target;
        assert!(t.can_encode_imm_shift(0, 32));
        assert!(t.can_encode_imm_shift(31, 32));
        assert!(!t.can_encode_imm_shift(32, 32));
        assert!(t.can_encode_imm_shift(63, 64));
        assert!(!t.can_encode_imm_shift(64, 64));
        assert!(!t.can_encode_imm_shift(-2, 64));
    }
}
