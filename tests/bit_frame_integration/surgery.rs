//! Error frames, arbitration loss and frame concatenation.

use super::*;
use can_bitframe::{BitPhase, Error};

fn identifier_positions(bit_frame: &BitFrame) -> Vec<usize> {
    bit_frame
        .iter()
        .enumerate()
        .filter(|(_, b)| {
            matches!(
                b.bit_type(),
                BitType::BaseIdentifier | BitType::IdentifierExtension
            )
        })
        .map(|(i, _)| i)
        .collect()
}

#[test]
fn test_error_and_overload_shapes() {
    type Insert = fn(&mut BitFrame, usize);
    let cases: [(Insert, BitType, BitValue, BitType); 3] = [
        (
            BitFrame::insert_active_error_frame,
            BitType::ActiveErrorFlag,
            BitValue::Dominant,
            BitType::ErrorDelimiter,
        ),
        (
            BitFrame::insert_passive_error_frame,
            BitType::PassiveErrorFlag,
            BitValue::Recessive,
            BitType::ErrorDelimiter,
        ),
        (
            BitFrame::insert_overload_frame,
            BitType::OverloadFlag,
            BitValue::Dominant,
            BitType::OverloadDelimiter,
        ),
    ];

    let original = classical_frame(IdentifierType::Base, 0x3C3, &[0xF0, 0x0F, 0x99]);
    for (insert, flag, polarity, delimiter) in cases {
        for at in [1, 20, original.len() - 1, original.len()] {
            let mut bf = original.clone();
            insert(&mut bf, at);
            assert_eq!(bf.len(), at + 6 + 8 + 3);
            assert_eq!(bf.bits()[..at], original.bits()[..at]);
            for bit in &bf.bits()[at..at + 6] {
                assert_eq!(bit.bit_type(), flag);
                assert_eq!(bit.value(), polarity);
            }
            for bit in &bf.bits()[at + 6..at + 14] {
                assert_eq!(bit.bit_type(), delimiter);
                assert_eq!(bit.value(), BitValue::Recessive);
            }
            for bit in &bf.bits()[at + 14..] {
                assert_eq!(bit.bit_type(), BitType::Intermission);
                assert_eq!(bit.value(), BitValue::Recessive);
            }
        }
    }
}

#[test]
fn test_error_frame_lookup_by_field() {
    let mut bf = classical_frame(IdentifierType::Base, 0x3C3, &[0xF0]);
    let ack = bf.bit_index_of(0, BitType::Ack).unwrap();
    bf.insert_active_error_frame_of(0, BitType::Ack).unwrap();
    assert_eq!(bf.bit_index_of(0, BitType::ActiveErrorFlag).unwrap(), ack);
    assert!(matches!(
        bf.insert_overload_frame_of(0, BitType::Eof),
        Err(Error::BitNotFound(_))
    ));
}

#[test]
fn test_error_in_data_phase_switches_back_to_nominal() {
    let mut bf = fd_frame(fd_flags(IdentifierType::Base, BitRateShift::Shift), 8, 0x0AA, 0x3E);
    let index = bf.bit_index_of(17, BitType::Data).unwrap();
    bf.insert_active_error_frame(index + 1);

    let last = bf.bit(index);
    assert_eq!(last.phase_len_tq(BitPhase::Sync), 1);
    assert_eq!(last.phase_len_tq(BitPhase::Prop), 1);
    assert_eq!(last.phase_len_tq(BitPhase::Ph1), 2);
    assert_eq!(last.phase_len_tq(BitPhase::Ph2), 5);
    assert_eq!(last.len_cycles(), 4 + 10);
    // Flags are nominal-rate bits.
    assert_eq!(bf.bit(index + 1).len_cycles(), 26);
}

#[test]
fn test_received_frame_drives_only_ack() {
    let mut bf = fd_frame(fd_flags(IdentifierType::Extended, BitRateShift::Shift), 15, 0x0, 0);
    let len = bf.len();
    bf.turn_received_frame();
    assert_eq!(bf.len(), len);
    let dominant: Vec<BitType> = bf
        .iter()
        .filter(|b| b.value() == BitValue::Dominant)
        .map(|b| b.bit_type())
        .collect();
    assert_eq!(dominant, vec![BitType::Ack]);
}

#[test]
fn test_arbitration_loss_splices_winner() {
    for identifier_type in [IdentifierType::Base, IdentifierType::Extended] {
        let (loser_id, winner_id) = match identifier_type {
            IdentifierType::Base => (0x5A5, 0x1E1),
            IdentifierType::Extended => (0x1555_5555, 0x0AAA_AAAA),
        };
        let loser = classical_frame(identifier_type, loser_id, &[0x11, 0x22]);
        let mut winner = classical_frame(identifier_type, winner_id, &[0xEE]);
        winner.turn_received_frame();

        for p in identifier_positions(&loser) {
            let mut driven = loser.clone();
            driven.lose_arbitration(p).unwrap();
            driven.append_bits_from(&winner, p + 1);

            assert_eq!(driven.bits()[..=p], loser.bits()[..=p]);
            assert_eq!(driven.bits()[p + 1..], winner.bits()[p + 1..]);
            assert_eq!(driven.len(), winner.len());
        }
    }
}

#[test]
fn test_arbitration_loss_on_control_bits() {
    let mut bf = classical_frame(IdentifierType::Extended, 0x100, &[]);
    bf.lose_arbitration_of(0, BitType::Srr).unwrap();
    assert_eq!(bf.bit(bf.len() - 1).bit_type(), BitType::Srr);

    let mut bf = classical_frame(IdentifierType::Base, 0x100, &[]);
    for ty in [BitType::Sof, BitType::R0, BitType::Dlc, BitType::Crc, BitType::Eof] {
        let result = bf.lose_arbitration_of(0, ty);
        assert!(matches!(
            result,
            Err(Error::ArbitrationOutsideArbitrationField { bit_type }) if bit_type == ty
        ));
    }
    bf.lose_arbitration_of(0, BitType::Rtr).unwrap();
}

#[test]
fn test_arbitration_loss_keeps_driven_values() {
    // Recessive and dominant identifier bits alike are kept as driven.
    for identifier in [0x000, 0x7FF, 0x2A5] {
        let original = classical_frame(IdentifierType::Base, identifier, &[]);
        for n in 0..11 {
            let mut bf = original.clone();
            let index = bf.bit_index_of_no_stuff(n, BitType::BaseIdentifier).unwrap();
            bf.lose_arbitration(index).unwrap();
            assert_eq!(bf.len(), index + 1);
            assert_eq!(bf.bits(), &original.bits()[..=index]);
        }
    }
}

#[test]
fn test_retransmission_after_error() {
    let original = classical_frame(IdentifierType::Base, 0x10, &[0xAB]);
    let mut bf = original.clone();
    bf.insert_active_error_frame_of(3, BitType::Data).unwrap();
    let error_len = bf.len();
    bf.append_bit_frame(&original);
    assert_eq!(bf.len(), error_len + original.len());
    assert_eq!(bf.field_len(BitType::Sof), 2);
    assert_eq!(bf.bits()[error_len..], original.bits()[..]);
}

#[test]
fn test_suspend_transmission() {
    let mut bf = classical_frame(IdentifierType::Base, 0x10, &[0xAB]);
    bf.insert_passive_error_frame_of(0, BitType::Crc).unwrap();
    bf.append_suspend_transmission();
    let tail: Vec<BitType> = bf.iter().rev().take(11).map(|b| b.bit_type()).collect();
    assert!(tail[..8].iter().all(|t| *t == BitType::Suspend));
    assert!(tail[8..].iter().all(|t| *t == BitType::Intermission));
}

#[test]
fn test_insert_bit_then_update_restuffs() {
    let mut bf = classical_frame(IdentifierType::Base, 0x0F0, &[0x00]);
    let before = data_carrying_len(&bf);
    let index = bf.bit_index_of(0, BitType::Data).unwrap();
    bf.insert_bit(BitType::Data, BitValue::Dominant, index);
    bf.update_frame();
    assert_eq!(data_carrying_len(&bf), before + 1);
    assert_dynamically_stuffed(
        &bf.bits()[..bf.bit_index_of(0, BitType::CrcDelimiter).unwrap()],
    );

    let removed = bf.remove_bit_of(0, BitType::Sof).unwrap();
    assert_eq!(removed.bit_type(), BitType::Sof);
    assert!(bf.bit_of(0, BitType::Sof).is_err());
}
