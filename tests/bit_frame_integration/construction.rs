//! Layout, CRC width and timing of freshly built bit frames.

use super::*;
use can_bitframe::frame::dlc_to_len;
use can_bitframe::{BitPhase, CrcType, TestConfig};

/// Field tags in transmission order, one entry per field.
fn field_sequence(bit_frame: &BitFrame) -> Vec<BitType> {
    let mut fields: Vec<BitType> = Vec::new();
    for bit in bit_frame.iter() {
        if fields.last() != Some(&bit.bit_type()) {
            fields.push(bit.bit_type());
        }
    }
    fields
}

const TAIL: [BitType; 5] = [
    BitType::CrcDelimiter,
    BitType::Ack,
    BitType::AckDelimiter,
    BitType::Eof,
    BitType::Intermission,
];

fn with_tail(head: &[BitType]) -> Vec<BitType> {
    let mut fields = head.to_vec();
    fields.extend_from_slice(&TAIL);
    fields
}

#[test]
fn test_classical_base_layout() {
    let bf = classical_frame(IdentifierType::Base, 0x123, &[0xA5, 0x5A]);
    assert_eq!(
        field_sequence(&bf),
        with_tail(&[
            BitType::Sof,
            BitType::BaseIdentifier,
            BitType::Rtr,
            BitType::Ide,
            BitType::R0,
            BitType::Dlc,
            BitType::Data,
            BitType::Crc,
        ])
    );
    assert_eq!(data_carrying_len(&bf), 47 + 16);
    assert_eq!(bf.num_stuff_bits(StuffBitKind::Fixed, None), 0);
    assert_eq!(bf.crc_type(), CrcType::Crc15);
    assert_eq!(bf.stuff_count(), None);
    assert_eq!(bf.bit_of(0, BitType::Rtr).unwrap().value(), BitValue::Dominant);
    assert_eq!(bf.bit_of(0, BitType::Ide).unwrap().value(), BitValue::Dominant);
}

#[test]
fn test_classical_extended_layout() {
    let bf = classical_frame(IdentifierType::Extended, 0x1234_5678, &[0xFF]);
    assert_eq!(
        field_sequence(&bf),
        with_tail(&[
            BitType::Sof,
            BitType::BaseIdentifier,
            BitType::Srr,
            BitType::Ide,
            BitType::IdentifierExtension,
            BitType::Rtr,
            BitType::R1,
            BitType::R0,
            BitType::Dlc,
            BitType::Data,
            BitType::Crc,
        ])
    );
    assert_eq!(data_carrying_len(&bf), 67 + 8);
    assert_eq!(bf.bit_of(0, BitType::Srr).unwrap().value(), BitValue::Recessive);
    assert_eq!(bf.bit_of(0, BitType::Ide).unwrap().value(), BitValue::Recessive);
}

#[test]
fn test_remote_frame_has_no_data() {
    let flags = FrameFlags::classical(IdentifierType::Base, RtrFlag::Remote);
    let frame = Frame::with_data(flags, 4, 0x55, &[]).unwrap();
    let bf = BitFrame::new(&frame, &test_timing());
    assert_eq!(bf.field_len(BitType::Data), 0);
    assert_eq!(bf.bit_of(0, BitType::Rtr).unwrap().value(), BitValue::Recessive);
    assert_eq!(data_carrying_len(&bf), 47);
}

#[test]
fn test_fd_layouts() {
    let bf = fd_frame(fd_flags(IdentifierType::Base, BitRateShift::Shift), 2, 0x321, 0x10);
    assert_eq!(
        field_sequence(&bf),
        with_tail(&[
            BitType::Sof,
            BitType::BaseIdentifier,
            BitType::R1,
            BitType::Ide,
            BitType::Edl,
            BitType::R0,
            BitType::Brs,
            BitType::Esi,
            BitType::Dlc,
            BitType::Data,
            BitType::StuffCount,
            BitType::StuffParity,
            BitType::Crc,
        ])
    );
    assert_eq!(data_carrying_len(&bf), 39 + 16 + 17);
    assert_eq!(bf.bit_of(0, BitType::Edl).unwrap().value(), BitValue::Recessive);
    assert_eq!(bf.bit_of(0, BitType::Brs).unwrap().value(), BitValue::Recessive);
    assert_eq!(bf.bit_of(0, BitType::Esi).unwrap().value(), BitValue::Dominant);

    let flags = FrameFlags::fd(
        IdentifierType::Extended,
        BitRateShift::NoShift,
        ErrorStateIndicator::ErrorPassive,
    );
    let bf = fd_frame(flags, 0, 0x1ABC_DEF0, 0);
    assert_eq!(
        field_sequence(&bf)[..11],
        [
            BitType::Sof,
            BitType::BaseIdentifier,
            BitType::Srr,
            BitType::Ide,
            BitType::IdentifierExtension,
            BitType::R1,
            BitType::Edl,
            BitType::R0,
            BitType::Brs,
            BitType::Esi,
            BitType::Dlc,
        ]
    );
    assert_eq!(data_carrying_len(&bf), 58 + 17);
    assert_eq!(bf.bit_of(0, BitType::Brs).unwrap().value(), BitValue::Dominant);
    assert_eq!(bf.bit_of(0, BitType::Esi).unwrap().value(), BitValue::Recessive);
}

#[test]
fn test_crc_width_follows_dlc() {
    for dlc in 0..=15u8 {
        let bf = fd_frame(fd_flags(IdentifierType::Base, BitRateShift::Shift), dlc, 0x7FF, 0x33);
        let (crc_type, crc_field, fixed) = if dlc <= 10 {
            (CrcType::Crc17, 22, 6)
        } else {
            (CrcType::Crc21, 27, 7)
        };
        assert_eq!(bf.crc_type(), crc_type, "dlc {dlc}");
        assert_eq!(bf.crc_width(), crc_type.width());
        assert_eq!(bf.field_len(BitType::Crc), crc_field, "dlc {dlc}");
        assert_eq!(bf.num_stuff_bits(StuffBitKind::Fixed, None), fixed);
        assert_eq!(bf.field_len(BitType::StuffCount), 4);
        assert_eq!(bf.field_len(BitType::StuffParity), 1);
        assert_eq!(
            bf.iter().filter(|b| b.bit_type() == BitType::Data && !b.is_stuff_bit()).count(),
            8 * dlc_to_len(dlc)
        );
    }
}

#[test]
fn test_stuff_count_matches_dynamic_stuff_bits() {
    for fill in [0x00, 0x0F, 0xFF, 0x5A] {
        let bf = fd_frame(fd_flags(IdentifierType::Base, BitRateShift::Shift), 13, 0x000, fill);
        let dynamic = bf.num_stuff_bits(StuffBitKind::Normal, None);
        assert_eq!(bf.stuff_count(), Some((dynamic % 8) as u8));

        let count = (dynamic % 8) as u8;
        let gray = count ^ (count >> 1);
        let parity = BitValue::from_bit(gray.count_ones() % 2 == 1);
        assert_eq!(bf.stuff_parity(), Some(parity));
    }
}

#[test]
fn test_nominal_bit_lengths() {
    let bf = classical_frame(IdentifierType::Base, 0x42, &[1, 2, 3]);
    for bit in bf.iter() {
        assert_eq!(bit.len_tq(), 13);
        assert_eq!(bit.len_cycles(), 26);
        assert_eq!(bit.phase_len_tq(BitPhase::Sync), 1);
        assert_eq!(bit.phase_len_tq(BitPhase::Prop), 3);
        assert_eq!(bit.phase_len_tq(BitPhase::Ph1), 4);
        assert_eq!(bit.phase_len_tq(BitPhase::Ph2), 5);
    }
    assert_eq!(bf.len_cycles(), bf.len() * 26);
}

#[test]
fn test_bit_rate_switch_timing() {
    let bf = fd_frame(fd_flags(IdentifierType::Base, BitRateShift::Shift), 1, 0x100, 0xC3);

    let brs = bf.bit_of(0, BitType::Brs).unwrap();
    assert_eq!(brs.len_tq(), 1 + 3 + 4 + 3);
    assert_eq!(brs.len_cycles(), 2 * (1 + 3 + 4) + 3);

    for bit in bf.iter().filter(|b| {
        matches!(
            b.bit_type(),
            BitType::Esi | BitType::Dlc | BitType::Data | BitType::StuffCount | BitType::Crc
        )
    }) {
        assert_eq!(bit.len_tq(), 7, "{} bit", bit.bit_type());
        assert_eq!(bit.len_cycles(), 7);
    }

    let crc_delimiter = bf.bit_of(0, BitType::CrcDelimiter).unwrap();
    assert_eq!(crc_delimiter.len_tq(), 1 + 1 + 2 + 5);
    assert_eq!(crc_delimiter.len_cycles(), (1 + 1 + 2) + 2 * 5);

    for ty in [BitType::Sof, BitType::Edl, BitType::Ack, BitType::Eof] {
        assert_eq!(bf.bit_of(0, ty).unwrap().len_cycles(), 26);
    }
}

#[test]
fn test_no_shift_fd_frame_uses_nominal_timing() {
    let bf = fd_frame(fd_flags(IdentifierType::Base, BitRateShift::NoShift), 4, 0x100, 0);
    assert!(bf.iter().all(|b| b.len_cycles() == 26));
}

#[test]
fn test_timing_sum_invariant() {
    let flags = fd_flags(IdentifierType::Extended, BitRateShift::Shift);
    let bf = fd_frame(flags, 9, 0x1F0F_0F0F, 0x81);
    for bit in bf.iter() {
        let sum = 1
            + bit.phase_timing(BitPhase::Prop).prop
            + bit.phase_timing(BitPhase::Ph1).ph1
            + bit.phase_timing(BitPhase::Ph2).ph2;
        assert_eq!(bit.len_tq(), sum as usize);
    }

    let mut bf = bf;
    let index = bf.bit_index_of(2, BitType::Data).unwrap();
    let before = bf.bit(index).len_tq();
    bf.bit_mut(index).lengthen_phase(BitPhase::Ph1, 3);
    assert_eq!(bf.bit(index).len_tq(), before + 3);
    let residual = bf.bit_mut(index).shorten_phase(BitPhase::Ph2, 2);
    assert_eq!(residual, 0);
    assert_eq!(bf.bit(index).len_tq(), before + 1);
}

#[test]
fn test_randomized_frames_are_reproducible() {
    let config = TestConfig {
        seed: 2024,
        ..TestConfig::default()
    };
    let build = || {
        let mut rng = config.rng();
        (0..16)
            .map(|_| {
                let mut frame = Frame::new(FrameFlags::new()).unwrap();
                frame.randomize(&mut rng).unwrap();
                BitFrame::new(&frame, &config.timing())
            })
            .collect::<Vec<_>>()
    };
    assert_eq!(build(), build());
}

#[test]
fn test_display() {
    let bf = classical_frame(IdentifierType::Base, 0x000, &[]);
    let text = bf.to_string();
    assert!(text.starts_with("SOF:0 ID:0000[1]"), "{text}");
    assert!(text.ends_with("EOF:1111111 INT:111"), "{text}");
}
