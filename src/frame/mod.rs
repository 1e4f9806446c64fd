//! Logical CAN frames.
//!
//! A [`Frame`] is what a test wants on the bus: flags, identifier, DLC and
//! payload. Any of identifier, DLC and payload (and any flag) can be left open
//! and filled in by [`Frame::randomize`] with a caller-provided generator:
//!
//! ```
//! use can_bitframe::frame::{Frame, FrameFlags, FrameKind};
//! use rand::SeedableRng;
//! use rand_xoshiro::Xoshiro256StarStar;
//!
//! # fn main() -> can_bitframe::Result<()> {
//! let mut rng = Xoshiro256StarStar::seed_from_u64(1);
//! let flags = FrameFlags::new().with_frame_kind(FrameKind::Fd);
//! let mut frame = Frame::with_dlc(flags, 9)?;
//! frame.randomize(&mut rng)?;
//! assert_eq!(frame.data().len(), 12);
//! # Ok(())
//! # }
//! ```

mod dlc;
mod flags;

pub use dlc::{
    MAX_CLASSICAL_DATA_LEN, MAX_CRC17_DLC, MAX_DLC, MAX_FD_DATA_LEN, data_len, dlc_to_len,
    len_to_dlc,
};
pub use flags::{BitRateShift, ErrorStateIndicator, FrameFlags, FrameKind, IdentifierType, RtrFlag};

use rand::Rng;

use crate::{Error, Result};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
struct Pinned {
    identifier: bool,
    dlc: bool,
    data: bool,
}

/// A logical CAN or CAN FD frame.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Frame {
    flags: FrameFlags,
    identifier: u32,
    dlc: u8,
    data: Vec<u8>,
    pinned: Pinned,
}

impl Frame {
    /// A frame with identifier, DLC and payload left open.
    ///
    /// Before [`Frame::randomize`] it is an identifier-0, DLC-0 frame.
    /// Fails with [`Error::InvalidFlagCombination`] on remote CAN FD flags.
    pub fn new(flags: FrameFlags) -> Result<Self> {
        flags.validate()?;
        Ok(Self {
            flags,
            identifier: 0,
            dlc: 0,
            data: Vec::new(),
            pinned: Pinned::default(),
        })
    }

    /// A frame with a fixed DLC; identifier and payload are left open.
    pub fn with_dlc(flags: FrameFlags, dlc: u8) -> Result<Self> {
        check_dlc(dlc)?;
        let mut frame = Self::new(flags)?;
        frame.dlc = dlc;
        frame.pinned.dlc = true;
        frame.data = vec![0; frame.data_len()];
        Ok(frame)
    }

    /// A frame with fixed DLC and identifier; the payload is left open.
    pub fn with_identifier(flags: FrameFlags, dlc: u8, identifier: u32) -> Result<Self> {
        let mut frame = Self::with_dlc(flags, dlc)?;
        check_identifier(identifier, flags.identifier_type())?;
        frame.identifier = identifier;
        frame.pinned.identifier = true;
        Ok(frame)
    }

    /// A fully specified frame.
    ///
    /// `data` must be exactly as long as the DLC decodes to for these flags.
    /// Remote frames carry no data; their payload is dropped.
    pub fn with_data(flags: FrameFlags, dlc: u8, identifier: u32, data: &[u8]) -> Result<Self> {
        let mut frame = Self::with_identifier(flags, dlc, identifier)?;
        frame.pinned.data = true;
        if flags.is_remote() {
            frame.flags = flags.with_rtr(RtrFlag::Remote);
            frame.data.clear();
            return Ok(frame);
        }
        let expected = frame.data_len();
        if data.len() != expected {
            return Err(Error::DataLengthMismatch {
                expected,
                actual: data.len(),
            });
        }
        frame.data = data.to_vec();
        Ok(frame)
    }

    /// Fill every field (and flag) that was not given explicitly.
    ///
    /// Identifiers are drawn from the full range of the identifier width,
    /// Classical DLCs from `0..=8` and FD DLCs from `0..=15`.
    ///
    /// A pinned non-empty payload keeps the frame a data frame, and above
    /// DLC 8 it also keeps the frame format its length was given for.
    pub fn randomize<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<()> {
        if self.pinned.data && !self.data.is_empty() {
            self.flags = self.flags.with_rtr(RtrFlag::Data);
            if self.dlc > MAX_CLASSICAL_DATA_LEN as u8 && !self.flags.is_frame_kind_pinned() {
                self.flags = self.flags.with_frame_kind(self.flags.frame_kind());
            }
        }
        self.flags.randomize(rng)?;

        let max_identifier = self.flags.identifier_type().max_identifier();
        if self.pinned.identifier {
            check_identifier(self.identifier, self.flags.identifier_type())?;
        } else {
            self.identifier = rng.gen_range(0..=max_identifier);
        }

        if !self.pinned.dlc {
            self.dlc = if self.flags.is_fd() {
                rng.gen_range(0..=MAX_DLC)
            } else {
                rng.gen_range(0..=MAX_CLASSICAL_DATA_LEN as u8)
            };
        }

        let len = self.data_len();
        if self.pinned.data {
            if self.data.len() != len {
                return Err(Error::DataLengthMismatch {
                    expected: len,
                    actual: self.data.len(),
                });
            }
        } else {
            self.data = vec![0; len];
            rng.fill(&mut self.data[..]);
        }

        log::debug!(
            "Randomized frame: {:?} id={:#x} dlc={} data_len={}",
            self.flags.frame_kind(),
            self.identifier,
            self.dlc,
            len
        );
        Ok(())
    }

    #[inline]
    pub fn flags(&self) -> &FrameFlags {
        &self.flags
    }

    #[inline]
    pub fn identifier(&self) -> u32 {
        self.identifier
    }

    #[inline]
    pub fn dlc(&self) -> u8 {
        self.dlc
    }

    /// Payload length encoded by the DLC; zero for remote frames.
    pub fn data_len(&self) -> usize {
        if self.flags.is_remote() {
            0
        } else {
            data_len(self.flags.frame_kind(), self.dlc)
        }
    }

    #[inline]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Payload byte `index`, if present.
    pub fn data_byte(&self, index: usize) -> Option<u8> {
        self.data.get(index).copied()
    }

    /// Width of the CRC sequence this frame is protected by.
    pub fn crc_width(&self) -> usize {
        if !self.flags.is_fd() {
            15
        } else if self.dlc <= MAX_CRC17_DLC {
            17
        } else {
            21
        }
    }

    /// Identifier as an `embedded-can` identifier.
    #[cfg(feature = "can")]
    pub fn id(&self) -> embedded_can::Id {
        use embedded_can::{ExtendedId, Id, StandardId};

        match self.flags.identifier_type() {
            IdentifierType::Base => StandardId::new((self.identifier & 0x7FF) as u16)
                .map_or(Id::Standard(StandardId::ZERO), Id::Standard),
            IdentifierType::Extended => ExtendedId::new(self.identifier & 0x1FFF_FFFF)
                .map_or(Id::Extended(ExtendedId::ZERO), Id::Extended),
        }
    }

    /// Pin a Classical frame from any `embedded-can` frame.
    #[cfg(feature = "can")]
    pub fn from_embedded<F: embedded_can::Frame>(frame: &F) -> Result<Self> {
        use embedded_can::Id;

        let (identifier_type, identifier) = match frame.id() {
            Id::Standard(id) => (IdentifierType::Base, u32::from(id.as_raw())),
            Id::Extended(id) => (IdentifierType::Extended, id.as_raw()),
        };
        let rtr = if frame.is_remote_frame() {
            RtrFlag::Remote
        } else {
            RtrFlag::Data
        };
        let flags = FrameFlags::classical(identifier_type, rtr);
        let dlc = u8::try_from(frame.dlc()).map_err(|_| Error::InvalidDlc { dlc: u8::MAX })?;
        Self::with_data(flags, dlc, identifier, frame.data())
    }
}

fn check_dlc(dlc: u8) -> Result<()> {
    if dlc > MAX_DLC {
        return Err(Error::InvalidDlc { dlc });
    }
    Ok(())
}

fn check_identifier(identifier: u32, identifier_type: IdentifierType) -> Result<()> {
    if identifier > identifier_type.max_identifier() {
        return Err(Error::InvalidIdentifier {
            identifier,
            identifier_type,
        });
    }
    Ok(())
}
