//! Bit frame integration test module
//!
//! End-to-end tests of the wire image:
//! - `construction`: field layout, CRC width selection, bit timing
//! - `surgery`: error and overload frames, arbitration loss, concatenation
//! - `scenarios`: worked test-vector constructions
//! - `properties`: stuffing, CRC and update invariants over random frames

mod construction;
mod surgery;

// Shared test utilities
use can_bitframe::frame::{
    BitRateShift, ErrorStateIndicator, Frame, FrameFlags, IdentifierType, RtrFlag,
};
use can_bitframe::{Bit, BitFrame, BitTiming, BitType, BitValue, FrameTiming, StuffBitKind};

/// 13 tq nominal bit and 7 tq data bit with prescalers 2 and 1.
pub fn test_timing() -> FrameTiming {
    FrameTiming::new(BitTiming::new(2, 3, 4, 5, 2), BitTiming::new(1, 1, 2, 3, 1))
}

pub fn fd_flags(identifier_type: IdentifierType, brs: BitRateShift) -> FrameFlags {
    FrameFlags::fd(identifier_type, brs, ErrorStateIndicator::ErrorActive)
}

pub fn classical_frame(identifier_type: IdentifierType, identifier: u32, data: &[u8]) -> BitFrame {
    let flags = FrameFlags::classical(identifier_type, RtrFlag::Data);
    let frame = Frame::with_data(flags, data.len() as u8, identifier, data).unwrap();
    BitFrame::new(&frame, &test_timing())
}

pub fn fd_frame(flags: FrameFlags, dlc: u8, identifier: u32, fill: u8) -> BitFrame {
    let len = can_bitframe::frame::dlc_to_len(dlc);
    let data: Vec<u8> = (0..len).map(|i| fill.wrapping_add(i as u8)).collect();
    let frame = Frame::with_data(flags, dlc, identifier, &data).unwrap();
    BitFrame::new(&frame, &test_timing())
}

/// Number of bits that are neither dynamic nor fixed stuff bits.
pub fn data_carrying_len(bit_frame: &BitFrame) -> usize {
    bit_frame.iter().filter(|b| !b.is_stuff_bit()).count()
}

/// Check the dynamic stuffing of `bits`: a stuff bit follows every run of
/// five equal bits, and only such runs.
pub fn assert_dynamically_stuffed(bits: &[Bit]) {
    let mut run_value: Option<BitValue> = None;
    let mut run_len = 0;
    for (i, bit) in bits.iter().enumerate() {
        if bit.stuff_kind() == StuffBitKind::Normal {
            assert_eq!(run_len, 5, "unexpected stuff bit at {i}");
            assert_eq!(Some(!bit.value()), run_value, "stuff bit at {i} has wrong polarity");
            run_value = Some(bit.value());
            run_len = 1;
            continue;
        }
        assert!(run_len < 5, "missing stuff bit before {i}");
        if run_value == Some(bit.value()) {
            run_len += 1;
        } else {
            run_value = Some(bit.value());
            run_len = 1;
        }
    }
    assert!(run_len < 5, "missing stuff bit at end of span");
}

/// Check the stuffing of the whole SOF..CRC region of a freshly built frame.
pub fn assert_stuffing_invariant(bit_frame: &BitFrame) {
    let region: Vec<&Bit> = bit_frame
        .iter()
        .take_while(|b| b.bit_type().is_stuffed_region())
        .collect();
    let dynamic_end = region
        .iter()
        .position(|b| b.stuff_kind() == StuffBitKind::Fixed)
        .unwrap_or(region.len());

    let dynamic: Vec<Bit> = region[..dynamic_end].iter().map(|b| (*b).clone()).collect();
    assert_dynamically_stuffed(&dynamic);

    if !bit_frame.flags().is_fd() {
        assert_eq!(dynamic_end, region.len());
        return;
    }

    let fixed = &region[dynamic_end..];
    assert!(!fixed.is_empty());
    for (i, bit) in fixed.iter().enumerate() {
        if i % 5 == 0 {
            assert_eq!(bit.stuff_kind(), StuffBitKind::Fixed, "expected fixed stuff bit at {i}");
            let previous = region[dynamic_end + i - 1].value();
            assert_eq!(
                bit.value(),
                !previous,
                "fixed stuff bit {i} must complement its predecessor"
            );
        } else {
            assert_eq!(bit.stuff_kind(), StuffBitKind::NoStuff);
        }
    }
    assert!(fixed.iter().all(|b| b.bit_type().is_fixed_stuffed()));
    assert_eq!(bit_frame.bit(region.len()).bit_type(), BitType::CrcDelimiter);
}
