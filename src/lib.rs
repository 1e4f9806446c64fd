#![forbid(unsafe_code)]

//! # can-bitframe
//!
//! A bit-accurate model of CAN and CAN FD frames on the wire, for building
//! ISO 16845 conformance test vectors.
//!
//! A logical [`Frame`] (flags, identifier, DLC, payload) is expanded into a
//! [`BitFrame`]: the exact sequence of bits a transmitter drives, including
//! dynamic and fixed stuff bits, the FD stuff count and the CRC. Every
//! [`Bit`] is further split into time quanta and clock cycles, so a test can
//! shorten a phase, force a single cycle to the opposite level or flip a
//! whole bit and then compare what the IUT drives against what it should.
//!
//! ## Features
//!
//! - **Frame model**: Classical and FD, base and extended identifiers, remote
//!   frames, bit-rate switching and error state indicator
//! - **Wire image**: CRC15/17/21, dynamic and fixed bit stuffing, stuff count
//!   with parity
//! - **Frame surgery**: insert or remove bits, splice in error and overload
//!   frames, lose arbitration, concatenate frames
//! - **Timing**: per-bit time quanta sized from nominal and data bit timing
//! - **Reproducible randomization**: every random choice comes from a
//!   caller-provided generator, seeded once per test run
//!
//! ## Quick Start
//!
//! ```
//! use can_bitframe::{BitFrame, BitPhase, BitType, BitValue, FrameTiming};
//! use can_bitframe::frame::{Frame, FrameFlags};
//!
//! # fn main() -> can_bitframe::Result<()> {
//! let frame = Frame::with_data(FrameFlags::classical_base(), 1, 0x7EF, &[0x01])?;
//! let timing = FrameTiming::default();
//! let mut driver = BitFrame::new(&frame, &timing);
//! let mut monitor = driver.clone();
//!
//! // The IUT receives the frame: it only drives the ACK.
//! driver.turn_received_frame();
//!
//! // Flip the seventh data bit in what the test drives. The IUT has to
//! // answer with an error flag starting at the next bit.
//! let index = driver.bit_index_of_no_stuff(6, BitType::Data)?;
//! driver.bit_mut(index).flip_value();
//! monitor.insert_active_error_frame(index + 1);
//! driver.insert_passive_error_frame(index + 1);
//!
//! // Shorten the sampling phase of the first identifier bit.
//! monitor.bit_mut(1).shorten_phase(BitPhase::Ph1, 2);
//!
//! assert_eq!(monitor.bit(index + 1).value(), BitValue::Dominant);
//! assert_eq!(monitor.field_len(BitType::ActiveErrorFlag), 6);
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Overview
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`frame`] | Logical frames, flags and DLC mapping |
//! | [`bit_frame`] | Wire image: construction, stuffing, CRC, queries, surgery |
//! | [`bit`] | Bits, bit types and values, time quanta |
//! | [`timing`] | Nominal and data bit timing |
//! | [`config`] | Per-run configuration: timing and generator seed |
//! | [`dut`] | Interface of the implementation under test |
//! | [`error`] | Error types and [`Result`] alias |
//!
//! ## Error Handling
//!
//! Fallible operations return [`Result<T>`]. Invalid frame descriptions and
//! bit lookups that miss in the current frame are errors; indexing past the
//! end of a bit sequence is a programming error and panics.
//!
//! ## Logging
//!
//! The crate logs through the [`log`] facade: frame construction and
//! re-stuffing at `debug`, individual edits at `trace`. Install any logger to
//! see them.

pub mod bit;
pub mod bit_frame;
pub mod config;
pub mod dut;
pub mod error;
pub mod frame;
pub mod timing;

// Re-export commonly used types at the crate root
pub use bit::{Bit, BitPhase, BitType, BitValue, CycleValue, StuffBitKind, TimeQuanta};
pub use bit_frame::{BitFrame, CrcType};
pub use config::TestConfig;
pub use dut::{Dut, ErrorState};
pub use error::{BitQuery, Error, Result};
pub use frame::{Frame, FrameFlags};
pub use timing::{BitTiming, FrameTiming};
