//! In-place edits of the bit sequence.
//!
//! Most test vectors are built by expanding a valid frame and then editing
//! it: bits are corrupted, error or overload frames are spliced in where the
//! IUT is expected to react, and the frame that follows (a retransmission or
//! the frame of an arbitration winner) is appended.
//!
//! None of these edits re-stuff the frame; call
//! [`BitFrame::update_frame`] when the logical content of SOF..CRC changed.

use super::{BitFrame, DELIMITER_LEN, FLAG_LEN, INTERMISSION_LEN, SUSPEND_LEN};
use crate::bit::{Bit, BitPhase, BitType, BitValue, StuffBitKind};
use crate::error::{Error, Result};

impl BitFrame {
    /// Insert a data-carrying bit so that it ends up at `index`.
    ///
    /// # Panics
    /// Panics if `index > self.len()`.
    pub fn insert_bit(&mut self, bit_type: BitType, value: BitValue, index: usize) {
        self.check_insert_index(index);
        log::trace!("Insert {bit_type} bit {value} at {index}");
        let bit = self.new_bit(bit_type, value, StuffBitKind::NoStuff);
        self.bits.insert(index, bit);
    }

    /// Insert an already built bit (e.g. a copy of another frame's bit).
    ///
    /// # Panics
    /// Panics if `index > self.len()`.
    pub fn insert_raw_bit(&mut self, bit: Bit, index: usize) {
        self.check_insert_index(index);
        self.bits.insert(index, bit);
    }

    pub fn append_bit(&mut self, bit_type: BitType, value: BitValue) {
        self.push_bit(bit_type, value);
    }

    /// Remove and return the bit at `index`.
    ///
    /// # Panics
    /// Panics if `index >= self.len()`.
    pub fn remove_bit(&mut self, index: usize) -> Bit {
        self.check_index(index);
        log::trace!("Remove bit {index} ({})", self.bits[index].bit_type());
        self.bits.remove(index)
    }

    /// Remove and return the `n`-th bit of `bit_type`.
    pub fn remove_bit_of(&mut self, n: usize, bit_type: BitType) -> Result<Bit> {
        let index = self.bit_index_of(n, bit_type)?;
        Ok(self.bits.remove(index))
    }

    /// Remove every bit from `index` to the end.
    ///
    /// # Panics
    /// Panics if `index > self.len()`.
    pub fn remove_bits_from(&mut self, index: usize) {
        self.check_insert_index(index);
        log::trace!("Remove bits {index}..{}", self.bits.len());
        self.bits.truncate(index);
    }

    /// Remove every bit from the `n`-th bit of `bit_type` to the end.
    pub fn remove_bits_from_of(&mut self, n: usize, bit_type: BitType) -> Result<()> {
        let index = self.bit_index_of(n, bit_type)?;
        self.bits.truncate(index);
        Ok(())
    }

    /// Replace everything from `index` on with an active error frame: six
    /// dominant flag bits, eight recessive delimiter bits and intermission.
    ///
    /// If the bit before `index` belongs to the data phase of a bit-rate
    /// switching frame, its phase 2 is restored to nominal length, since the
    /// bit rate switches back at the sample point the error was detected at.
    ///
    /// # Panics
    /// Panics if `index > self.len()`.
    pub fn insert_active_error_frame(&mut self, index: usize) {
        self.insert_flag_frame(
            index,
            BitType::ActiveErrorFlag,
            BitValue::Dominant,
            BitType::ErrorDelimiter,
        );
    }

    /// [`BitFrame::insert_active_error_frame`] at the `n`-th bit of
    /// `bit_type`.
    pub fn insert_active_error_frame_of(&mut self, n: usize, bit_type: BitType) -> Result<()> {
        let index = self.bit_index_of(n, bit_type)?;
        self.insert_active_error_frame(index);
        Ok(())
    }

    /// Like [`BitFrame::insert_active_error_frame`] with six recessive
    /// passive error flag bits.
    ///
    /// # Panics
    /// Panics if `index > self.len()`.
    pub fn insert_passive_error_frame(&mut self, index: usize) {
        self.insert_flag_frame(
            index,
            BitType::PassiveErrorFlag,
            BitValue::Recessive,
            BitType::ErrorDelimiter,
        );
    }

    pub fn insert_passive_error_frame_of(&mut self, n: usize, bit_type: BitType) -> Result<()> {
        let index = self.bit_index_of(n, bit_type)?;
        self.insert_passive_error_frame(index);
        Ok(())
    }

    /// Replace everything from `index` on with an overload frame: six
    /// dominant flag bits, eight recessive delimiter bits and intermission.
    ///
    /// # Panics
    /// Panics if `index > self.len()`.
    pub fn insert_overload_frame(&mut self, index: usize) {
        self.insert_flag_frame(
            index,
            BitType::OverloadFlag,
            BitValue::Dominant,
            BitType::OverloadDelimiter,
        );
    }

    pub fn insert_overload_frame_of(&mut self, n: usize, bit_type: BitType) -> Result<()> {
        let index = self.bit_index_of(n, bit_type)?;
        self.insert_overload_frame(index);
        Ok(())
    }

    fn insert_flag_frame(
        &mut self,
        index: usize,
        flag_type: BitType,
        flag_value: BitValue,
        delimiter_type: BitType,
    ) {
        self.check_insert_index(index);
        log::debug!(
            "Insert {flag_type} frame at {index}, dropping {} bits",
            self.bits.len() - index
        );
        self.bits.truncate(index);
        if let Some(last) = self.bits.last_mut() {
            let nominal = last.timing().nominal;
            if *last.phase_timing(BitPhase::Ph2) != nominal {
                last.correct_phase2_to_nominal();
            }
        }
        self.push_repeated(flag_type, flag_value, FLAG_LEN);
        self.push_repeated(delimiter_type, BitValue::Recessive, DELIMITER_LEN);
        self.push_repeated(BitType::Intermission, BitValue::Recessive, INTERMISSION_LEN);
    }

    /// Append the eight recessive bits an error-passive transmitter waits
    /// after intermission before it may transmit again.
    pub fn append_suspend_transmission(&mut self) {
        self.push_repeated(BitType::Suspend, BitValue::Recessive, SUSPEND_LEN);
    }

    /// Turn a transmitter's frame into what a receiver of it drives: every
    /// bit recessive except the ACK, which becomes dominant.
    pub fn turn_received_frame(&mut self) {
        for bit in &mut self.bits {
            let value = if bit.bit_type() == BitType::Ack {
                BitValue::Dominant
            } else {
                BitValue::Recessive
            };
            bit.set_value(value);
        }
    }

    /// Lose arbitration at `index`: bits up to and including `index` are
    /// kept, everything after it is removed. The continuation (usually the
    /// winning frame's remaining bits, see [`BitFrame::append_bits_from`]) is
    /// appended by the caller.
    ///
    /// On the bus a transmitter only loses on a bit it drives recessive. The
    /// value at `index` is not checked, so a test can model the loss at any
    /// arbitration bit; bits `[0, index]` are kept exactly as driven.
    ///
    /// # Panics
    /// Panics if `index >= self.len()`.
    pub fn lose_arbitration(&mut self, index: usize) -> Result<()> {
        self.check_index(index);
        let bit_type = self.bits[index].bit_type();
        if !bit_type.is_arbitration() {
            return Err(Error::ArbitrationOutsideArbitrationField { bit_type });
        }
        log::debug!("Arbitration lost at bit {index} ({bit_type})");
        self.bits.truncate(index + 1);
        Ok(())
    }

    /// [`BitFrame::lose_arbitration`] at the `n`-th bit of `bit_type`.
    pub fn lose_arbitration_of(&mut self, n: usize, bit_type: BitType) -> Result<()> {
        let index = self.bit_index_of(n, bit_type)?;
        self.lose_arbitration(index)
    }

    /// Append a copy of every bit of `other`.
    pub fn append_bit_frame(&mut self, other: &BitFrame) {
        self.bits.extend_from_slice(&other.bits);
    }

    /// Append a copy of `other`'s bits from `start` to its end.
    ///
    /// # Panics
    /// Panics if `start > other.len()`.
    pub fn append_bits_from(&mut self, other: &BitFrame, start: usize) {
        other.check_insert_index(start);
        self.bits.extend_from_slice(&other.bits[start..]);
    }

    fn check_insert_index(&self, index: usize) {
        let len = self.bits.len();
        assert!(
            index <= len,
            "bit index {index} out of range for bit frame of {len} bits"
        );
    }
}
