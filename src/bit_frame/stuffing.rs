//! Stuffing, stuff count and CRC derivation.
//!
//! Only the leading run of bits that belong to SOF..CRC is processed. The
//! rest of the sequence (CRC delimiter onward, spliced-in error frames,
//! appended frames) is kept as is.
//!
//! Classical frames: the CRC15 is computed over the data-carrying bits from
//! SOF to the end of the data field, then dynamic stuff bits are inserted
//! from SOF to the end of the CRC sequence.
//!
//! CAN FD frames: dynamic stuff bits are inserted from SOF to the end of the
//! data field, their count is written to the stuff count (Gray code plus
//! parity), the CRC17/21 is computed over everything up to the stuff parity
//! bit (dynamic stuff bits included), and fixed stuff bits are inserted into
//! the stuff count and CRC fields.

use super::{BitFrame, CrcType};
use crate::bit::{Bit, BitType, BitValue, StuffBitKind};

/// Run length after which a dynamic stuff bit is inserted.
pub(crate) const STUFF_RUN_LEN: usize = 5;

/// Fixed stuff bits precede every 4th bit of the stuff count and CRC fields.
pub(crate) const FIXED_STUFF_INTERVAL: usize = 4;

impl BitFrame {
    /// Re-derive stuff bits, stuff count and CRC from the current bit values.
    ///
    /// Call this after edits that change the logical content of SOF..CRC
    /// (flipped data or control bits, inserted or removed bits) so that the
    /// frame is a valid wire image again. Stuff bits are rebuilt from scratch,
    /// so phase changes or forced quanta on stuff bits are lost.
    pub fn update_frame(&mut self) {
        self.rebuild(true);
    }

    /// Like [`BitFrame::update_frame`], but keep the current values of the
    /// CRC and stuff count bits.
    ///
    /// Used to build frames with a deliberately wrong CRC or stuff count that
    /// are still correctly stuffed.
    pub fn restuff(&mut self) {
        self.rebuild(false);
    }

    fn rebuild(&mut self, recompute: bool) {
        let end = self
            .bits
            .iter()
            .position(|b| !b.bit_type().is_stuffed_region())
            .unwrap_or(self.bits.len());
        let tail = self.bits.split_off(end);
        self.bits.retain(|b| !b.is_stuff_bit());

        if self.flags.is_fd() {
            let fixed_start = self
                .bits
                .iter()
                .position(|b| b.bit_type().is_fixed_stuffed())
                .unwrap_or(self.bits.len());
            let fixed_region = self.bits.split_off(fixed_start);
            let head = core::mem::take(&mut self.bits);
            self.bits = self.stuff_dynamic(head);
            let stuff_count = self.num_stuff_bits(StuffBitKind::Normal, None);
            let fixed_start = self.bits.len();
            self.bits.extend(fixed_region);
            if recompute {
                self.write_stuff_count(stuff_count);
                self.write_crc();
            }
            self.stuff_fixed(fixed_start);
        } else {
            if recompute {
                self.write_crc();
            }
            let head = core::mem::take(&mut self.bits);
            self.bits = self.stuff_dynamic(head);
        }

        self.bits.extend(tail);
        log::debug!(
            "Updated bit frame: bits={} stuff={} fixed_stuff={} crc={:#x}",
            self.bits.len(),
            self.num_stuff_bits(StuffBitKind::Normal, None),
            self.num_stuff_bits(StuffBitKind::Fixed, None),
            self.crc()
        );
    }

    /// Insert a dynamic stuff bit after every run of five equal bits.
    ///
    /// Stuff bits take part in the following runs and carry the field of the
    /// bit they follow.
    fn stuff_dynamic(&self, bits: Vec<Bit>) -> Vec<Bit> {
        let mut out = Vec::with_capacity(bits.len() + bits.len() / STUFF_RUN_LEN);
        let mut run_value = None;
        let mut run_len = 0;
        for bit in bits {
            let value = bit.value();
            let bit_type = bit.bit_type();
            if run_value == Some(value) {
                run_len += 1;
            } else {
                run_value = Some(value);
                run_len = 1;
            }
            out.push(bit);
            if run_len == STUFF_RUN_LEN {
                log::trace!("Dynamic stuff bit {} after {bit_type} at {}", !value, out.len());
                out.push(self.new_bit(bit_type, !value, StuffBitKind::Normal));
                run_value = Some(!value);
                run_len = 1;
            }
        }
        out
    }

    /// Insert fixed stuff bits into the region starting at `start`: one
    /// before its first bit and one before every 4th bit after that.
    fn stuff_fixed(&mut self, start: usize) {
        let region = self.bits.split_off(start);
        for (i, bit) in region.into_iter().enumerate() {
            if i % FIXED_STUFF_INTERVAL == 0 {
                let previous = self.bits.last().map_or(BitValue::Recessive, Bit::value);
                let stuff = self.new_bit(bit.bit_type(), !previous, StuffBitKind::Fixed);
                self.bits.push(stuff);
            }
            self.bits.push(bit);
        }
    }

    fn write_stuff_count(&mut self, stuff_count: usize) {
        let count = (stuff_count % 8) as u32;
        let gray = count ^ (count >> 1);
        let parity = gray.count_ones() % 2 == 1;

        let mut position = 0;
        for bit in self
            .bits
            .iter_mut()
            .filter(|b| b.bit_type() == BitType::StuffCount && !b.is_stuff_bit())
        {
            if position < 3 {
                bit.set_value(BitValue::from_bit((gray >> (2 - position)) & 1 == 1));
            }
            position += 1;
        }
        for bit in self
            .bits
            .iter_mut()
            .filter(|b| b.bit_type() == BitType::StuffParity && !b.is_stuff_bit())
        {
            bit.set_value(BitValue::from_bit(parity));
        }
    }

    fn write_crc(&mut self) {
        let width = self.crc_width();
        if width == 0 {
            return;
        }
        let crc = self.compute_crc();
        let bits = self
            .bits
            .iter_mut()
            .filter(|b| b.bit_type() == BitType::Crc && !b.is_stuff_bit());
        for (i, bit) in bits.enumerate() {
            let shift = width - 1 - i;
            bit.set_value(BitValue::from_bit((crc >> shift) & 1 == 1));
        }
    }

    /// Number of data-carrying CRC bits in the current sequence.
    pub fn crc_width(&self) -> usize {
        self.bits
            .iter()
            .filter(|b| b.bit_type() == BitType::Crc && !b.is_stuff_bit())
            .count()
    }

    /// CRC variant protecting this frame.
    pub fn crc_type(&self) -> CrcType {
        CrcType::select(self.flags.is_fd(), self.crc_width())
    }

    /// Recompute the CRC from the current bits preceding the CRC field.
    ///
    /// Classical frames use the data-carrying bits only; CAN FD frames
    /// include dynamic stuff bits and the stuff count but not fixed stuff
    /// bits.
    pub fn compute_crc(&self) -> u32 {
        let is_fd = self.flags.is_fd();
        let covered = self
            .bits
            .iter()
            .take_while(|b| b.bit_type().is_stuffed_region() && b.bit_type() != BitType::Crc)
            .filter(|b| match b.stuff_kind() {
                StuffBitKind::NoStuff => true,
                StuffBitKind::Normal => is_fd,
                StuffBitKind::Fixed => false,
            })
            .map(Bit::value);
        self.crc_type().compute(covered)
    }

    /// CRC as currently present in the CRC bits (stuff bits skipped).
    pub fn crc(&self) -> u32 {
        self.bits
            .iter()
            .filter(|b| b.bit_type() == BitType::Crc && !b.is_stuff_bit())
            .fold(0, |acc, b| (acc << 1) | u32::from(b.value().as_bit()))
    }

    /// Stuff count as currently present in the stuff count bits, Gray code
    /// decoded. `None` for frames without a stuff count field.
    pub fn stuff_count(&self) -> Option<u8> {
        let gray = self
            .bits
            .iter()
            .filter(|b| b.bit_type() == BitType::StuffCount && !b.is_stuff_bit())
            .fold(None, |acc: Option<u8>, b| {
                Some((acc.unwrap_or(0) << 1) | u8::from(b.value().as_bit()))
            })?;
        let mut count = gray;
        let mut shift = gray >> 1;
        while shift != 0 {
            count ^= shift;
            shift >>= 1;
        }
        Some(count)
    }

    /// Stuff parity bit as currently present.
    pub fn stuff_parity(&self) -> Option<BitValue> {
        self.bits
            .iter()
            .find(|b| b.bit_type() == BitType::StuffParity && !b.is_stuff_bit())
            .map(Bit::value)
    }
}
