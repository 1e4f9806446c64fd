//! Error types for frame construction and bit-frame queries.
//!
//! This module defines the [`Error`] enum. Two kinds of failure are expected
//! in normal use and are reported through it:
//!
//! - configuration errors: illegal flag combinations, out-of-range
//!   identifiers or DLCs, invalid bit timing, unreadable configuration files;
//! - lookup misses: a query for a bit that the current frame does not
//!   contain. Frame content is random, so e.g. a dominant fixed stuff bit does
//!   not exist in every frame. Callers regenerate the frame and retry:
//!
//! ```
//! use can_bitframe::{BitFrame, BitValue, Error, FrameTiming};
//! use can_bitframe::frame::{Frame, FrameFlags, FrameKind};
//! use rand::SeedableRng;
//! use rand_xoshiro::Xoshiro256StarStar;
//!
//! # fn main() -> can_bitframe::Result<()> {
//! let mut rng = Xoshiro256StarStar::seed_from_u64(42);
//! let flags = FrameFlags::new().with_frame_kind(FrameKind::Fd);
//! let mut found = None;
//! for _ in 0..100 {
//!     let mut frame = Frame::new(flags)?;
//!     frame.randomize(&mut rng)?;
//!     let bit_frame = BitFrame::new(&frame, &FrameTiming::default());
//!     match bit_frame.fixed_stuff_bit_index(0, Some(BitValue::Dominant)) {
//!         Ok(index) => {
//!             found = Some(index);
//!             break;
//!         }
//!         Err(Error::BitNotFound(_)) => continue,
//!         Err(e) => return Err(e),
//!     }
//! }
//! assert!(found.is_some());
//! # Ok(())
//! # }
//! ```
//!
//! Programming errors (raw indices past the end of a bit sequence) are not
//! represented here; they panic.

use core::fmt;

use crate::bit::{BitType, BitValue, StuffBitKind};
use crate::frame::IdentifierType;

/// Description of a failed bit lookup.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BitQuery {
    /// Zero-based occurrence that was requested.
    pub index: usize,
    /// Field restriction, if any.
    pub bit_type: Option<BitType>,
    /// Stuff-bit restriction, if any.
    pub stuff_kind: Option<StuffBitKind>,
    /// Value restriction, if any.
    pub value: Option<BitValue>,
    /// True when stuff bits were skipped while counting.
    pub skip_stuff_bits: bool,
}

impl fmt::Display for BitQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "bit #{}", self.index)?;
        if let Some(bit_type) = self.bit_type {
            write!(f, " of {bit_type}")?;
        }
        if let Some(kind) = self.stuff_kind {
            write!(f, " with stuff kind {kind:?}")?;
        }
        if let Some(value) = self.value {
            write!(f, " with value {value:?}")?;
        }
        if self.skip_stuff_bits {
            f.write_str(" (stuff bits skipped)")?;
        }
        Ok(())
    }
}

/// Errors produced by frame construction, configuration and bit lookups.
#[derive(Debug)]
pub enum Error {
    /// The requested flags cannot describe a frame on the bus.
    InvalidFlagCombination {
        /// Which rule was violated
        reason: &'static str,
    },

    /// The identifier does not fit its identifier width.
    InvalidIdentifier {
        /// The rejected identifier
        identifier: u32,
        /// The width it was checked against
        identifier_type: IdentifierType,
    },

    /// DLC above 15.
    InvalidDlc {
        /// The rejected DLC
        dlc: u8,
    },

    /// An explicit payload does not match the length its DLC decodes to.
    DataLengthMismatch {
        /// Length decoded from the DLC
        expected: usize,
        /// Length of the provided payload
        actual: usize,
    },

    /// A bit timing violates its segment invariants.
    InvalidBitTiming {
        /// Which rule was violated
        reason: &'static str,
    },

    /// No bit matches the query in the current frame.
    BitNotFound(BitQuery),

    /// Arbitration can only be lost in the arbitration field.
    ArbitrationOutsideArbitrationField {
        /// Field of the bit arbitration loss was requested at
        bit_type: BitType,
    },

    /// An I/O error occurred while reading a configuration file.
    ///
    /// Only available with the `std` feature.
    #[cfg(feature = "std")]
    IOError(std::io::Error),

    /// A configuration document could not be parsed.
    ConfigParseError(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidFlagCombination { reason } => {
                write!(f, "Invalid frame flag combination: {reason}")
            }
            Error::InvalidIdentifier {
                identifier,
                identifier_type,
            } => write!(
                f,
                "Identifier {identifier:#x} exceeds {identifier_type:?} range (max {:#x})",
                identifier_type.max_identifier()
            ),
            Error::InvalidDlc { dlc } => write!(f, "Invalid DLC {dlc}: expected 0..=15"),
            Error::DataLengthMismatch { expected, actual } => write!(
                f,
                "Payload length mismatch: DLC encodes {expected} bytes, got {actual}"
            ),
            Error::InvalidBitTiming { reason } => write!(f, "Invalid bit timing: {reason}"),
            Error::BitNotFound(query) => write!(f, "Bit not found: {query}"),
            Error::ArbitrationOutsideArbitrationField { bit_type } => {
                write!(f, "Arbitration cannot be lost in a {bit_type} bit")
            }
            #[cfg(feature = "std")]
            Error::IOError(e) => write!(f, "I/O error: {e}"),
            Error::ConfigParseError(s) => write!(f, "Configuration parse error: {s}"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::IOError(e) => Some(e),
            _ => None,
        }
    }
}

#[cfg(feature = "std")]
impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::IOError(err)
    }
}

#[cfg(feature = "serde")]
impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::ConfigParseError(err.to_string())
    }
}

/// A specialized Result type for bit-frame operations.
pub type Result<T> = core::result::Result<T, Error>;
