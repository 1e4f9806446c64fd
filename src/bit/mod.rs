//! Physical bus bits.
//!
//! A [`Bit`] is the unit a [`BitFrame`](crate::BitFrame) is made of. It knows
//! which frame field it belongs to ([`BitType`]), its logical level
//! ([`BitValue`]), whether it was inserted by the stuffing rules
//! ([`StuffBitKind`]) and owns its timing as a sequence of
//! [`TimeQuanta`], ordered Sync, Prop, Phase 1, Phase 2.
//!
//! The time quanta of a bit are sized from the [`FrameTiming`] of the frame:
//! bits of the CAN FD data phase use the data timing, all others the nominal
//! one. BRS and CRC delimiter switch bit rate at their sample point and mix
//! both.

mod time_quanta;

pub use time_quanta::{BitPhase, CycleValue, TimeQuanta};

use core::fmt;
use core::ops::{Not, Range};

use crate::frame::FrameFlags;
use crate::timing::{BitTiming, FrameTiming};

/// Logical level of a bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BitValue {
    /// Logic 0, wins arbitration.
    Dominant,
    /// Logic 1.
    Recessive,
}

impl BitValue {
    /// Level of a binary digit: `true` (1) is recessive.
    #[inline]
    pub const fn from_bit(bit: bool) -> Self {
        if bit {
            BitValue::Recessive
        } else {
            BitValue::Dominant
        }
    }

    /// Binary digit of this level.
    #[inline]
    pub const fn as_bit(self) -> bool {
        matches!(self, BitValue::Recessive)
    }

    #[inline]
    pub const fn opposite(self) -> Self {
        match self {
            BitValue::Dominant => BitValue::Recessive,
            BitValue::Recessive => BitValue::Dominant,
        }
    }

    #[inline]
    pub const fn is_dominant(self) -> bool {
        matches!(self, BitValue::Dominant)
    }
}

impl Not for BitValue {
    type Output = BitValue;

    fn not(self) -> Self::Output {
        self.opposite()
    }
}

impl fmt::Display for BitValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BitValue::Dominant => f.write_str("0"),
            BitValue::Recessive => f.write_str("1"),
        }
    }
}

/// Frame field a bit belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BitType {
    Sof,
    BaseIdentifier,
    IdentifierExtension,
    Srr,
    Rtr,
    Ide,
    R0,
    /// Reserved bit r1, also RRS in CAN FD frames.
    R1,
    Edl,
    Brs,
    Esi,
    Dlc,
    Data,
    StuffCount,
    StuffParity,
    Crc,
    CrcDelimiter,
    Ack,
    AckDelimiter,
    Eof,
    Intermission,
    ActiveErrorFlag,
    PassiveErrorFlag,
    ErrorDelimiter,
    OverloadFlag,
    OverloadDelimiter,
    Suspend,
    Idle,
}

impl BitType {
    /// Short mnemonic used when printing frames.
    pub const fn name(self) -> &'static str {
        match self {
            BitType::Sof => "SOF",
            BitType::BaseIdentifier => "ID",
            BitType::IdentifierExtension => "IDE_EXT",
            BitType::Srr => "SRR",
            BitType::Rtr => "RTR",
            BitType::Ide => "IDE",
            BitType::R0 => "R0",
            BitType::R1 => "R1",
            BitType::Edl => "EDL",
            BitType::Brs => "BRS",
            BitType::Esi => "ESI",
            BitType::Dlc => "DLC",
            BitType::Data => "DATA",
            BitType::StuffCount => "STC",
            BitType::StuffParity => "STP",
            BitType::Crc => "CRC",
            BitType::CrcDelimiter => "CRD",
            BitType::Ack => "ACK",
            BitType::AckDelimiter => "ACD",
            BitType::Eof => "EOF",
            BitType::Intermission => "INT",
            BitType::ActiveErrorFlag => "AEF",
            BitType::PassiveErrorFlag => "PEF",
            BitType::ErrorDelimiter => "ERD",
            BitType::OverloadFlag => "OVF",
            BitType::OverloadDelimiter => "OVD",
            BitType::Suspend => "SUS",
            BitType::Idle => "IDLE",
        }
    }

    /// Bits that take part in arbitration.
    pub const fn is_arbitration(self) -> bool {
        matches!(
            self,
            BitType::BaseIdentifier
                | BitType::IdentifierExtension
                | BitType::Srr
                | BitType::Rtr
                | BitType::Ide
                | BitType::R1
        )
    }

    /// Fields from SOF up to the end of the CRC sequence.
    ///
    /// These are the fields stuffing and CRC computation operate on.
    pub const fn is_stuffed_region(self) -> bool {
        matches!(
            self,
            BitType::Sof
                | BitType::BaseIdentifier
                | BitType::IdentifierExtension
                | BitType::Srr
                | BitType::Rtr
                | BitType::Ide
                | BitType::R0
                | BitType::R1
                | BitType::Edl
                | BitType::Brs
                | BitType::Esi
                | BitType::Dlc
                | BitType::Data
                | BitType::StuffCount
                | BitType::StuffParity
                | BitType::Crc
        )
    }

    /// Fields covered by fixed stuffing in CAN FD frames.
    pub const fn is_fixed_stuffed(self) -> bool {
        matches!(
            self,
            BitType::StuffCount | BitType::StuffParity | BitType::Crc
        )
    }

    /// Fields transmitted entirely in the data bit rate of a shifting frame.
    const fn is_data_phase(self) -> bool {
        matches!(
            self,
            BitType::Esi
                | BitType::Dlc
                | BitType::Data
                | BitType::StuffCount
                | BitType::StuffParity
                | BitType::Crc
        )
    }
}

impl fmt::Display for BitType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Stuff-bit classification.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StuffBitKind {
    /// A data-carrying bit.
    #[default]
    NoStuff,
    /// Dynamic stuff bit inserted after five equal bits.
    Normal,
    /// CAN FD fixed stuff bit of the stuff count / CRC region.
    Fixed,
}

/// One bit on the bus.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Bit {
    bit_type: BitType,
    value: BitValue,
    stuff_kind: StuffBitKind,
    flags: FrameFlags,
    timing: FrameTiming,
    tqs: Vec<TimeQuanta>,
}

impl Bit {
    /// Create a bit with the nominal length of its phases.
    pub fn new(
        bit_type: BitType,
        value: BitValue,
        stuff_kind: StuffBitKind,
        flags: &FrameFlags,
        timing: &FrameTiming,
    ) -> Self {
        let mut bit = Self {
            bit_type,
            value,
            stuff_kind,
            flags: *flags,
            timing: *timing,
            tqs: Vec::new(),
        };
        bit.reset_timing();
        bit
    }

    #[inline]
    pub fn bit_type(&self) -> BitType {
        self.bit_type
    }

    #[inline]
    pub fn value(&self) -> BitValue {
        self.value
    }

    #[inline]
    pub fn stuff_kind(&self) -> StuffBitKind {
        self.stuff_kind
    }

    #[inline]
    pub fn is_stuff_bit(&self) -> bool {
        self.stuff_kind != StuffBitKind::NoStuff
    }

    /// Flags of the frame this bit was built for.
    pub fn flags(&self) -> &FrameFlags {
        &self.flags
    }

    pub fn timing(&self) -> &FrameTiming {
        &self.timing
    }

    pub fn set_value(&mut self, value: BitValue) {
        self.value = value;
    }

    /// Invert the logical value. Forced cycles keep their forced level.
    pub fn flip_value(&mut self) {
        self.value = !self.value;
    }

    /// Relabel the field this bit belongs to. Phase lengths are kept; call
    /// [`Bit::reset_timing`] to resize them for the new field.
    pub fn set_bit_type(&mut self, bit_type: BitType) {
        self.bit_type = bit_type;
    }

    pub fn set_stuff_kind(&mut self, stuff_kind: StuffBitKind) {
        self.stuff_kind = stuff_kind;
    }

    /// Timing that sizes `phase` of this bit.
    pub fn phase_timing(&self, phase: BitPhase) -> &BitTiming {
        if !self.flags.shifts_bit_rate() {
            return &self.timing.nominal;
        }
        let data = match self.bit_type {
            BitType::Brs => phase == BitPhase::Ph2,
            BitType::CrcDelimiter => phase != BitPhase::Ph2,
            other => other.is_data_phase(),
        };
        if data {
            &self.timing.data
        } else {
            &self.timing.nominal
        }
    }

    /// Configured length of `phase` in time quanta.
    fn nominal_phase_len(&self, phase: BitPhase) -> usize {
        let t = self.phase_timing(phase);
        let len = match phase {
            BitPhase::Sync => crate::timing::SYNC_SEG_TQ,
            BitPhase::Prop => t.prop,
            BitPhase::Ph1 => t.ph1,
            BitPhase::Ph2 => t.ph2,
        };
        len as usize
    }

    /// Rebuild all time quanta from the frame timing, dropping any phase
    /// change or forced cycle.
    pub fn reset_timing(&mut self) {
        let mut tqs = Vec::new();
        for phase in BitPhase::ALL {
            let brp = self.phase_timing(phase).brp as usize;
            for _ in 0..self.nominal_phase_len(phase) {
                tqs.push(TimeQuanta::new(phase, brp));
            }
        }
        self.tqs = tqs;
    }

    /// Restore phase 2 to its configured nominal-rate length.
    ///
    /// Used when a frame leaves the data phase early (e.g. an error flag
    /// starts inside it) and the bit before the switch-back has to end with a
    /// nominal phase 2.
    pub fn correct_phase2_to_nominal(&mut self) {
        let nominal = self.timing.nominal;
        self.tqs.retain(|tq| tq.phase() != BitPhase::Ph2);
        for _ in 0..nominal.ph2 {
            self.tqs.push(TimeQuanta::new(BitPhase::Ph2, nominal.brp as usize));
        }
    }

    // ------------------------------------------------------------------
    // Lengths
    // ------------------------------------------------------------------

    /// Length in time quanta.
    #[inline]
    pub fn len_tq(&self) -> usize {
        self.tqs.len()
    }

    /// Length in clock cycles.
    pub fn len_cycles(&self) -> usize {
        self.tqs.iter().map(TimeQuanta::len_cycles).sum()
    }

    pub fn has_phase(&self, phase: BitPhase) -> bool {
        self.tqs.iter().any(|tq| tq.phase() == phase)
    }

    pub fn phase_len_tq(&self, phase: BitPhase) -> usize {
        self.tqs.iter().filter(|tq| tq.phase() == phase).count()
    }

    pub fn phase_len_cycles(&self, phase: BitPhase) -> usize {
        self.tqs
            .iter()
            .filter(|tq| tq.phase() == phase)
            .map(TimeQuanta::len_cycles)
            .sum()
    }

    // ------------------------------------------------------------------
    // Time quanta access
    // ------------------------------------------------------------------

    pub fn time_quanta_slice(&self) -> &[TimeQuanta] {
        &self.tqs
    }

    /// # Panics
    /// Panics if `index >= self.len_tq()`.
    pub fn time_quanta(&self, index: usize) -> &TimeQuanta {
        self.check_tq_index(index);
        &self.tqs[index]
    }

    /// # Panics
    /// Panics if `index >= self.len_tq()`.
    pub fn time_quanta_mut(&mut self, index: usize) -> &mut TimeQuanta {
        self.check_tq_index(index);
        &mut self.tqs[index]
    }

    /// The `index`-th time quantum of `phase`.
    ///
    /// # Panics
    /// Panics if the phase has `index` or fewer quanta.
    pub fn time_quanta_in_phase_mut(&mut self, phase: BitPhase, index: usize) -> &mut TimeQuanta {
        let abs = self.absolute_tq_index(phase, index);
        &mut self.tqs[abs]
    }

    fn check_tq_index(&self, index: usize) {
        let len = self.tqs.len();
        assert!(
            index < len,
            "time quantum index {index} out of range for {} bit of {len} quanta",
            self.bit_type
        );
    }

    fn absolute_tq_index(&self, phase: BitPhase, index: usize) -> usize {
        let len = self.phase_len_tq(phase);
        assert!(
            index < len,
            "time quantum {index} out of range for {phase:?} of {} bit ({len} quanta)",
            self.bit_type
        );
        let first = self
            .tqs
            .iter()
            .position(|tq| tq.phase() == phase)
            .unwrap_or_default();
        first + index
    }

    // ------------------------------------------------------------------
    // Phase resizing
    // ------------------------------------------------------------------

    /// Remove up to `n` quanta from the end of `phase`.
    ///
    /// Shortening stops at the phase boundary; the number of quanta that
    /// could not be removed is returned so the caller can continue in the
    /// adjacent phase.
    pub fn shorten_phase(&mut self, phase: BitPhase, n: usize) -> usize {
        let removable = n.min(self.phase_len_tq(phase));
        for _ in 0..removable {
            if let Some(last) = self.tqs.iter().rposition(|tq| tq.phase() == phase) {
                self.tqs.remove(last);
            }
        }
        n - removable
    }

    /// Append `n` quanta to the end of `phase`. A missing phase (e.g. a zero
    /// propagation segment) is created at its place in the bit.
    pub fn lengthen_phase(&mut self, phase: BitPhase, n: usize) {
        let brp = self.phase_timing(phase).brp as usize;
        let at = self
            .tqs
            .iter()
            .rposition(|tq| tq.phase() <= phase)
            .map_or(0, |i| i + 1);
        for _ in 0..n {
            self.tqs.insert(at, TimeQuanta::new(phase, brp));
        }
    }

    /// Resize `phase` to exactly `len_tq` quanta.
    pub fn set_phase_len(&mut self, phase: BitPhase, len_tq: usize) {
        let current = self.phase_len_tq(phase);
        if len_tq > current {
            self.lengthen_phase(phase, len_tq - current);
        } else {
            self.shorten_phase(phase, current - len_tq);
        }
    }

    // ------------------------------------------------------------------
    // Forcing
    // ------------------------------------------------------------------

    /// Force every cycle of the time quantum at `index` (counted over the
    /// whole bit) to `value`.
    ///
    /// # Panics
    /// Panics if `index >= self.len_tq()`.
    pub fn force_time_quanta(&mut self, index: usize, value: BitValue) {
        self.time_quanta_mut(index).force_value(value);
    }

    /// Force the `index`-th time quantum of `phase` to `value`.
    ///
    /// # Panics
    /// Panics if the phase has `index` or fewer quanta.
    pub fn force_time_quanta_in_phase(&mut self, phase: BitPhase, index: usize, value: BitValue) {
        self.time_quanta_in_phase_mut(phase, index).force_value(value);
    }

    /// Force a range of time quanta (counted over the whole bit).
    ///
    /// # Panics
    /// Panics if the range ends past `self.len_tq()`.
    pub fn force_time_quanta_range(&mut self, range: Range<usize>, value: BitValue) {
        let len = self.tqs.len();
        assert!(
            range.end <= len,
            "time quanta range {range:?} out of range for {} bit of {len} quanta",
            self.bit_type
        );
        self.tqs[range].iter_mut().for_each(|tq| tq.force_value(value));
    }

    /// Release every forced cycle of the bit.
    pub fn release_forced(&mut self) {
        self.tqs.iter_mut().for_each(TimeQuanta::release);
    }

    /// True if no cycle of the bit is forced.
    pub fn has_default_values(&self) -> bool {
        self.tqs.iter().all(TimeQuanta::has_default_values)
    }

    /// Effective level of clock cycle `cycle` counted from the start of the
    /// bit.
    ///
    /// # Panics
    /// Panics if `cycle >= self.len_cycles()`.
    pub fn value_at_cycle(&self, cycle: usize) -> BitValue {
        let mut rest = cycle;
        for tq in &self.tqs {
            if rest < tq.len_cycles() {
                return tq.cycle(rest).value(self.value);
            }
            rest -= tq.len_cycles();
        }
        panic!(
            "cycle {cycle} out of range for {} bit of {} cycles",
            self.bit_type,
            self.len_cycles()
        );
    }

    /// Effective level of every clock cycle, in order.
    pub fn cycle_values(&self) -> impl Iterator<Item = BitValue> + '_ {
        self.tqs
            .iter()
            .flat_map(|tq| tq.cycles().iter().map(|c| c.value(self.value)))
    }
}
