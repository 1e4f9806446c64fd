//! Interface of the implementation under test.
//!
//! Test sequences drive an IUT through this trait: they program its bit
//! timing, hand it frames to transmit, read back what it received and check
//! its fault-confinement counters. The crate ships no implementation; a test
//! bench backed by a simulator or by real hardware implements it.

use crate::config::TestConfig;
use crate::frame::Frame;
use crate::timing::BitTiming;

/// Fault-confinement state of a CAN node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ErrorState {
    #[default]
    ErrorActive,
    ErrorPassive,
    BusOff,
}

impl ErrorState {
    /// Error state implied by the error counters (ISO 11898-1 fault
    /// confinement): bus-off above 255 transmit errors, error-passive when
    /// either counter exceeds 127.
    pub fn from_counters(rec: u32, tec: u32) -> Self {
        if tec > 255 {
            ErrorState::BusOff
        } else if rec > 127 || tec > 127 {
            ErrorState::ErrorPassive
        } else {
            ErrorState::ErrorActive
        }
    }
}

/// A CAN controller the test sequences talk to.
pub trait Dut {
    /// Queue `frame` for transmission.
    fn send_frame(&mut self, frame: &Frame);

    /// Take the oldest received frame, if any.
    fn read_frame(&mut self) -> Option<Frame>;

    fn has_rx_frame(&self) -> bool;

    /// Receive error counter.
    fn rec(&self) -> u32;

    /// Transmit error counter.
    fn tec(&self) -> u32;

    fn set_rec(&mut self, rec: u32);

    fn set_tec(&mut self, tec: u32);

    fn error_state(&self) -> ErrorState;

    fn configure_bit_timing(&mut self, nominal: BitTiming, data: BitTiming);

    fn enable(&mut self);

    fn disable(&mut self);

    /// Program the timing of a test run and enable the node.
    fn configure(&mut self, config: &TestConfig) {
        self.disable();
        self.configure_bit_timing(config.nominal, config.data);
        self.enable();
    }
}
