//! DAP transfer request selectors.
//!
//! A transfer request selector is a single byte. Bits [3:0] encode the
//! register: bit 0 selects AP (1) or DP (0), bit 1 selects read (1) or
//! write (0), bits [3:2] are address lines A[3:2]. The upper bits are
//! modifiers: bit 4 requests a value-match read, bit 5 a match-mask write,
//! bit 7 a test-domain timestamp.

use once_cell::sync::Lazy;
use std::collections::HashMap;

bitfield::bitfield! {
    /// Bit-level view of a transfer request selector byte.
    #[derive(Copy, Clone, PartialEq, Eq)]
    pub struct Selector(u8);
    impl Debug;
    /// 0 = Debug Port, 1 = Access Port.
    pub ap_n_dp, set_ap_n_dp: 0;
    /// 0 = write register, 1 = read register.
    pub r_n_w, set_r_n_w: 1;
    /// Register address line A2.
    pub a2, set_a2: 2;
    /// Register address line A3.
    pub a3, set_a3: 3;
    /// Read with value match instead of a plain read.
    pub value_match, set_value_match: 4;
    /// Write the match mask instead of the register.
    pub match_mask, set_match_mask: 5;
    /// Prefix the transfer data with a test-domain timestamp.
    pub td_timestamp, set_td_timestamp: 7;
}

/// Selector modifier: read with value match.
pub const MATCH: u8 = 1 << 4;
/// Selector modifier: write match mask.
pub const MASK: u8 = 1 << 5;
/// Selector modifier: include test-domain timestamp.
pub const TIMESTAMP: u8 = 1 << 7;

/// Read selectors.
pub mod read {
    /// DP IDCODE register (addr 0x00).
    pub const IDCODE: u8 = 0x02;
    /// DP CTRL/STAT register (addr 0x04).
    pub const CTRLSTAT: u8 = 0x06;
    /// DP RDBUFF register (addr 0x0C).
    pub const RDBUFF: u8 = 0x0E;
    /// AP CSW register (addr 0x00).
    pub const CSW: u8 = 0x03;
    /// AP TAR register (addr 0x04).
    pub const TAR: u8 = 0x07;
    /// AP DRW register (addr 0x0C).
    pub const DRW: u8 = 0x0F;
}

/// Write selectors.
pub mod write {
    /// DP ABORT register (addr 0x00).
    pub const ABORT: u8 = 0x00;
    /// DP CTRL/STAT register (addr 0x04).
    pub const CTRLSTAT: u8 = 0x04;
    /// DP SELECT register (addr 0x08).
    pub const SELECT: u8 = 0x08;
    /// AP CSW register (addr 0x00).
    pub const CSW: u8 = 0x01;
    /// AP TAR register (addr 0x04).
    pub const TAR: u8 = 0x05;
    /// AP DRW register (addr 0x0C).
    pub const DRW: u8 = 0x0D;
}

/// Whether a transfer request with this selector carries a 32-bit data word.
///
/// Everything except a plain read does: writes, match-mask writes and
/// value-match reads.
pub fn carries_data(selector: u8) -> bool {
    (selector ^ 0x02) & 0x12 != 0
}

static SELECTOR_NAMES: Lazy<HashMap<u8, &'static str>> = Lazy::new(|| {
    HashMap::from([
        (read::IDCODE, "DP read IDCODE"),
        (read::CTRLSTAT, "DP read CTRL/STAT"),
        (read::RDBUFF, "DP read RDBUFF"),
        (read::CSW, "AP read CSW"),
        (read::TAR, "AP read TAR"),
        (read::DRW, "AP read DRW"),
        (write::ABORT, "DP write ABORT"),
        (write::CTRLSTAT, "DP write CTRL/STAT"),
        (write::SELECT, "DP write SELECT"),
        (write::CSW, "AP write CSW"),
        (write::TAR, "AP write TAR"),
        (write::DRW, "AP write DRW"),
    ])
});

/// Human-readable name of a selector, for diagnostics only.
pub fn selector_name(selector: u8) -> String {
    let base = selector & 0x0F;
    let mut name = match SELECTOR_NAMES.get(&base) {
        Some(name) => (*name).to_string(),
        None => format!("{selector:#04x}"),
    };
    if selector & MATCH != 0 {
        name.push_str(" | MATCH");
    }
    if selector & MASK != 0 {
        name.push_str(" | MASK");
    }
    if selector & TIMESTAMP != 0 {
        name.push_str(" | TIMESTAMP");
    }
    name
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(read::IDCODE, false; "plain DP read")]
    #[test_case(read::DRW, false; "plain AP read")]
    #[test_case(write::CTRLSTAT, true; "DP write")]
    #[test_case(write::DRW, true; "AP write")]
    #[test_case(read::IDCODE | MATCH, true; "value match read")]
    #[test_case(write::TAR | MASK, true; "match mask write")]
    fn data_presence(selector: u8, expected: bool) {
        assert_eq!(carries_data(selector), expected);
    }

    #[test]
    fn selector_bit_positions() {
        let mut selector = Selector(0);
        selector.set_ap_n_dp(true);
        selector.set_r_n_w(true);
        selector.set_a2(true);
        selector.set_a3(true);
        assert_eq!(selector.0, read::DRW);

        let ctrlstat = Selector(write::CTRLSTAT);
        assert!(!ctrlstat.ap_n_dp());
        assert!(!ctrlstat.r_n_w());
        assert!(ctrlstat.a2());
        assert!(!ctrlstat.a3());
    }

    #[test]
    fn names() {
        assert_eq!(selector_name(read::IDCODE), "DP read IDCODE");
        assert_eq!(
            selector_name(write::TAR | MASK),
            "AP write TAR | MASK"
        );
    }
}
