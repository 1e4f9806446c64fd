//! Data length code mapping.
//!
//! CAN FD uses a non-linear DLC to data length mapping for values > 8:
//!
//! | DLC | 0..=8 | 9  | 10 | 11 | 12 | 13 | 14 | 15 |
//! |-----|-------|----|----|----|----|----|----|----|
//! | FD  | DLC   | 12 | 16 | 20 | 24 | 32 | 48 | 64 |
//!
//! Classical frames carry at most 8 bytes; DLC 9..=15 still means 8 bytes.

use super::FrameKind;

/// Maximum CAN FD data length in bytes.
pub const MAX_FD_DATA_LEN: usize = 64;

/// Maximum Classical CAN data length in bytes.
pub const MAX_CLASSICAL_DATA_LEN: usize = 8;

/// Largest encodable DLC.
pub const MAX_DLC: u8 = 15;

/// Largest FD DLC still protected by CRC17.
pub const MAX_CRC17_DLC: u8 = 10;

/// CAN FD DLC to data length mapping.
#[inline]
pub const fn dlc_to_len(dlc: u8) -> usize {
    match dlc {
        0..=8 => dlc as usize,
        9 => 12,
        10 => 16,
        11 => 20,
        12 => 24,
        13 => 32,
        14 => 48,
        _ => 64,
    }
}

/// Payload length of a data frame of the given kind.
#[inline]
pub const fn data_len(kind: FrameKind, dlc: u8) -> usize {
    match kind {
        FrameKind::Classical => {
            if dlc as usize > MAX_CLASSICAL_DATA_LEN {
                MAX_CLASSICAL_DATA_LEN
            } else {
                dlc as usize
            }
        }
        FrameKind::Fd => dlc_to_len(dlc),
    }
}

/// Returns the minimum DLC that can hold the given data length.
#[inline]
pub const fn len_to_dlc(len: usize) -> u8 {
    match len {
        0..=8 => len as u8,
        9..=12 => 9,
        13..=16 => 10,
        17..=20 => 11,
        21..=24 => 12,
        25..=32 => 13,
        33..=48 => 14,
        _ => 15,
    }
}
