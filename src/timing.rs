//! Bit timing configuration.
//!
//! A CAN bit is divided into four segments, each an integer number of time
//! quanta:
//!
//! ```text
//! | Sync | Prop ... | Phase1 ... | Phase2 ... |
//!   1 tq    prop       ph1      ^     ph2
//!                         sample point
//! ```
//!
//! A time quantum is `brp` (prescaler) clock cycles long. CAN FD frames that
//! switch bit rate use a second, faster [`BitTiming`] for the data phase; the
//! pair is carried around as a [`FrameTiming`].

use crate::{Error, Result};

/// Synchronization segment length, fixed by ISO 11898-1.
pub const SYNC_SEG_TQ: u32 = 1;

/// Segment configuration of one bit-rate domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BitTiming {
    /// Prescaler: clock cycles per time quantum.
    pub brp: u32,
    /// Propagation segment in time quanta (may be zero).
    pub prop: u32,
    /// Phase segment 1 in time quanta.
    pub ph1: u32,
    /// Phase segment 2 in time quanta.
    pub ph2: u32,
    /// Synchronization jump width in time quanta.
    pub sjw: u32,
}

impl BitTiming {
    /// Create a timing without validating it. See [`BitTiming::validate`].
    pub const fn new(brp: u32, prop: u32, ph1: u32, ph2: u32, sjw: u32) -> Self {
        Self {
            brp,
            prop,
            ph1,
            ph2,
            sjw,
        }
    }

    /// Bit length in time quanta: `1 + prop + ph1 + ph2`.
    #[inline]
    pub const fn bit_len_tq(&self) -> u32 {
        SYNC_SEG_TQ + self.prop + self.ph1 + self.ph2
    }

    /// Bit length in clock cycles.
    #[inline]
    pub const fn bit_len_cycles(&self) -> u32 {
        self.bit_len_tq() * self.brp
    }

    /// Offset of the sample point from the start of the bit, in time quanta.
    #[inline]
    pub const fn sample_point_tq(&self) -> u32 {
        SYNC_SEG_TQ + self.prop + self.ph1
    }

    /// Offset of the sample point from the start of the bit, in clock cycles.
    #[inline]
    pub const fn sample_point_cycles(&self) -> u32 {
        self.sample_point_tq() * self.brp
    }

    /// Bit rate in bits per second for a given controller clock.
    pub fn bit_rate(&self, clock_hz: u32) -> u32 {
        match self.bit_len_cycles() {
            0 => 0,
            cycles => clock_hz / cycles,
        }
    }

    /// Check the segment invariants.
    ///
    /// The prescaler, phase 1 and phase 2 must be non-zero and the
    /// synchronization jump width must not exceed phase 2.
    pub fn validate(&self) -> Result<()> {
        if self.brp == 0 {
            return Err(Error::InvalidBitTiming {
                reason: "prescaler must be at least 1",
            });
        }
        if self.ph1 == 0 {
            return Err(Error::InvalidBitTiming {
                reason: "phase 1 must be at least 1 time quantum",
            });
        }
        if self.ph2 == 0 {
            return Err(Error::InvalidBitTiming {
                reason: "phase 2 must be at least 1 time quantum",
            });
        }
        if self.sjw == 0 || self.sjw > self.ph2 {
            return Err(Error::InvalidBitTiming {
                reason: "synchronization jump width must be within 1..=phase 2",
            });
        }
        Ok(())
    }
}

impl Default for BitTiming {
    /// 20 tq nominal bit, 75 % sample point, prescaler 4.
    fn default() -> Self {
        Self::new(4, 8, 6, 5, 4)
    }
}

/// Nominal and data bit timing used to size the bits of one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FrameTiming {
    /// Arbitration-phase timing, used by every bit of non-shifting frames.
    pub nominal: BitTiming,
    /// Data-phase timing, used after the bit-rate switch of CAN FD frames.
    pub data: BitTiming,
}

impl FrameTiming {
    pub const fn new(nominal: BitTiming, data: BitTiming) -> Self {
        Self { nominal, data }
    }

    /// Validate both timings.
    pub fn validate(&self) -> Result<()> {
        self.nominal.validate()?;
        self.data.validate()
    }
}

impl Default for FrameTiming {
    fn default() -> Self {
        Self {
            nominal: BitTiming::default(),
            data: BitTiming::new(1, 6, 5, 4, 3),
        }
    }
}
