//! Time-stamped snapshot naming.

/// Name of the never-overwritten snapshot for simulated time `t`:
/// `chk-NNNNNNN.NN.wo`, with a seven-digit zero-padded integer part and
/// two fractional digits.
pub fn snapshot_name(t: f64) -> String {
    format!("chk-{t:010.2}.wo")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_with_padded_integer_part() {
        assert_eq!(snapshot_name(12.34), "chk-0000012.34.wo");
        assert_eq!(snapshot_name(0.0), "chk-0000000.00.wo");
        assert_eq!(snapshot_name(3.1), "chk-0000003.10.wo");
        assert_eq!(snapshot_name(1234567.89), "chk-1234567.89.wo");
    }

    #[test]
    fn rounds_to_two_fractional_digits() {
        assert_eq!(snapshot_name(0.005), "chk-0000000.01.wo");
        assert_eq!(snapshot_name(99.999), "chk-0000100.00.wo");
    }
}
