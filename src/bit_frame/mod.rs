//! Bit-accurate wire image of a CAN / CAN FD frame.
//!
//! A [`BitFrame`] expands a [`Frame`] into the bits a transmitter drives on
//! the bus, in transmission order: SOF, arbitration and control fields, data,
//! (FD) stuff count, CRC, CRC delimiter, ACK, ACK delimiter, EOF and
//! intermission. Dynamic stuff bits, fixed stuff bits, the stuff count and
//! the CRC are derived from the bit values by [`BitFrame::update_frame`],
//! which the constructor runs once.
//!
//! The result is then edited by tests: bits are flipped, inserted or removed,
//! error and overload frames are spliced in and frames are concatenated.
//!
//! ```
//! use can_bitframe::{BitFrame, BitType, BitValue, FrameTiming};
//! use can_bitframe::frame::{Frame, FrameFlags};
//!
//! # fn main() -> can_bitframe::Result<()> {
//! let frame = Frame::with_data(FrameFlags::classical_base(), 1, 0x7EF, &[0x01])?;
//! let mut driver = BitFrame::new(&frame, &FrameTiming::default());
//! let mut monitor = driver.clone();
//! monitor.turn_received_frame();
//!
//! // Corrupt the first data bit and expect an error flag right after it.
//! let index = driver.bit_index_of(0, BitType::Data)?;
//! driver.bit_mut(index).flip_value();
//! driver.insert_active_error_frame(index + 1);
//! monitor.insert_active_error_frame(index + 1);
//! assert_eq!(monitor.field_len(BitType::ActiveErrorFlag), 6);
//! assert_eq!(monitor.bit(index + 1).value(), BitValue::Dominant);
//! # Ok(())
//! # }
//! ```

mod crc;
mod query;
mod stuffing;
mod surgery;

pub use crc::CrcType;

use core::fmt;

use crate::bit::{Bit, BitType, BitValue, StuffBitKind};
use crate::frame::{
    BitRateShift, ErrorStateIndicator, Frame, FrameFlags, FrameKind, IdentifierType, RtrFlag,
};
use crate::timing::FrameTiming;

/// Number of EOF bits.
pub const EOF_LEN: usize = 7;
/// Number of intermission bits.
pub const INTERMISSION_LEN: usize = 3;
/// Length of an error or overload flag.
pub const FLAG_LEN: usize = 6;
/// Length of an error or overload delimiter.
pub const DELIMITER_LEN: usize = 8;
/// Length of the suspend-transmission field of error-passive transmitters.
pub const SUSPEND_LEN: usize = 8;

const BASE_ID_BITS: usize = 11;
const EXTENSION_ID_BITS: usize = 18;
const DLC_BITS: usize = 4;
const STUFF_COUNT_BITS: usize = 3;

/// Ordered, owned sequence of bus bits.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BitFrame {
    flags: FrameFlags,
    timing: FrameTiming,
    bits: Vec<Bit>,
}

impl BitFrame {
    /// Expand `frame` into its stuffed, CRC-protected wire image.
    pub fn new(frame: &Frame, timing: &FrameTiming) -> Self {
        let mut bit_frame = Self {
            flags: *frame.flags(),
            timing: *timing,
            bits: Vec::with_capacity(64 + frame.data_len() * 10),
        };
        bit_frame.push_fields(frame);
        bit_frame.update_frame();
        log::debug!(
            "Built {:?} bit frame: id={:#x} dlc={} bits={} stuff={} fixed_stuff={}",
            frame.flags().frame_kind(),
            frame.identifier(),
            frame.dlc(),
            bit_frame.len(),
            bit_frame.num_stuff_bits(StuffBitKind::Normal, None),
            bit_frame.num_stuff_bits(StuffBitKind::Fixed, None)
        );
        bit_frame
    }

    /// Flags of the frame this bit frame was built from.
    pub fn flags(&self) -> &FrameFlags {
        &self.flags
    }

    /// Timing used to size new bits.
    pub fn timing(&self) -> &FrameTiming {
        &self.timing
    }

    fn new_bit(&self, bit_type: BitType, value: BitValue, stuff_kind: StuffBitKind) -> Bit {
        Bit::new(bit_type, value, stuff_kind, &self.flags, &self.timing)
    }

    fn push_bit(&mut self, bit_type: BitType, value: BitValue) {
        let bit = self.new_bit(bit_type, value, StuffBitKind::NoStuff);
        self.bits.push(bit);
    }

    /// Push the `width` low bits of `value`, most significant first.
    fn push_field(&mut self, bit_type: BitType, value: u32, width: usize) {
        for i in (0..width).rev() {
            self.push_bit(bit_type, BitValue::from_bit((value >> i) & 1 == 1));
        }
    }

    fn push_repeated(&mut self, bit_type: BitType, value: BitValue, count: usize) {
        for _ in 0..count {
            self.push_bit(bit_type, value);
        }
    }

    fn push_fields(&mut self, frame: &Frame) {
        use BitValue::{Dominant, Recessive};

        let flags = *frame.flags();
        let identifier = frame.identifier();

        self.push_bit(BitType::Sof, Dominant);

        match flags.identifier_type() {
            IdentifierType::Base => {
                self.push_field(BitType::BaseIdentifier, identifier, BASE_ID_BITS);
            }
            IdentifierType::Extended => {
                self.push_field(
                    BitType::BaseIdentifier,
                    identifier >> EXTENSION_ID_BITS,
                    BASE_ID_BITS,
                );
                self.push_bit(BitType::Srr, Recessive);
                self.push_bit(BitType::Ide, Recessive);
                self.push_field(
                    BitType::IdentifierExtension,
                    identifier,
                    EXTENSION_ID_BITS,
                );
            }
        }

        match flags.frame_kind() {
            FrameKind::Classical => {
                let rtr = match flags.rtr() {
                    RtrFlag::Data => Dominant,
                    RtrFlag::Remote => Recessive,
                };
                self.push_bit(BitType::Rtr, rtr);
                if flags.is_extended() {
                    self.push_bit(BitType::R1, Dominant);
                } else {
                    self.push_bit(BitType::Ide, Dominant);
                }
                self.push_bit(BitType::R0, Dominant);
            }
            FrameKind::Fd => {
                self.push_bit(BitType::R1, Dominant);
                if !flags.is_extended() {
                    self.push_bit(BitType::Ide, Dominant);
                }
                self.push_bit(BitType::Edl, Recessive);
                self.push_bit(BitType::R0, Dominant);
                let brs = match flags.brs() {
                    BitRateShift::Shift => Recessive,
                    BitRateShift::NoShift => Dominant,
                };
                self.push_bit(BitType::Brs, brs);
                let esi = match flags.esi() {
                    ErrorStateIndicator::ErrorPassive => Recessive,
                    ErrorStateIndicator::ErrorActive => Dominant,
                };
                self.push_bit(BitType::Esi, esi);
            }
        }

        self.push_field(BitType::Dlc, u32::from(frame.dlc()), DLC_BITS);
        for &byte in frame.data() {
            self.push_field(BitType::Data, u32::from(byte), 8);
        }

        if flags.is_fd() {
            self.push_field(BitType::StuffCount, 0, STUFF_COUNT_BITS);
            self.push_bit(BitType::StuffParity, Dominant);
        }
        self.push_field(BitType::Crc, 0, frame.crc_width());

        self.push_bit(BitType::CrcDelimiter, Recessive);
        self.push_bit(BitType::Ack, Recessive);
        self.push_bit(BitType::AckDelimiter, Recessive);
        self.push_repeated(BitType::Eof, Recessive, EOF_LEN);
        self.push_repeated(BitType::Intermission, Recessive, INTERMISSION_LEN);
    }
}

/// Renders one group per field, e.g. `SOF:0 ID:0111110[0]1111`, with stuff
/// bits in brackets (`[.]` dynamic, `{.}` fixed).
impl fmt::Display for BitFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut previous: Option<BitType> = None;
        for bit in &self.bits {
            if previous != Some(bit.bit_type()) {
                if previous.is_some() {
                    f.write_str(" ")?;
                }
                write!(f, "{}:", bit.bit_type())?;
                previous = Some(bit.bit_type());
            }
            match bit.stuff_kind() {
                StuffBitKind::NoStuff => write!(f, "{}", bit.value())?,
                StuffBitKind::Normal => write!(f, "[{}]", bit.value())?,
                StuffBitKind::Fixed => write!(f, "{{{}}}", bit.value())?,
            }
        }
        Ok(())
    }
}
