//! Frame format flags.
//!
//! [`FrameFlags`] combines the five choices that determine a frame's field
//! layout. Each flag is either pinned by the test or left open; open flags
//! are drawn by [`FrameFlags::randomize`].
//!
//! Not every combination exists on the bus:
//! - CAN FD has no remote frames. Pinning both is an
//!   [`Error::InvalidFlagCombination`]; when only one of them is pinned,
//!   randomization keeps the other legal.
//! - BRS and ESI only exist in CAN FD frames. On Classical frames they are
//!   normalized to [`BitRateShift::NoShift`] and [`ErrorStateIndicator::ErrorActive`].

use rand::Rng;

use crate::{Error, Result};

/// Classical CAN or CAN FD.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FrameKind {
    #[default]
    Classical,
    Fd,
}

/// Identifier width.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum IdentifierType {
    /// 11-bit identifier.
    #[default]
    Base,
    /// 29-bit identifier.
    Extended,
}

impl IdentifierType {
    /// Largest identifier of this width.
    pub const fn max_identifier(self) -> u32 {
        match self {
            IdentifierType::Base => 0x7FF,
            IdentifierType::Extended => 0x1FFF_FFFF,
        }
    }
}

/// Data or remote frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RtrFlag {
    #[default]
    Data,
    Remote,
}

/// CAN FD bit-rate switch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BitRateShift {
    #[default]
    NoShift,
    Shift,
}

/// CAN FD error state indicator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ErrorStateIndicator {
    #[default]
    ErrorActive,
    ErrorPassive,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
struct Pinned {
    frame_kind: bool,
    identifier_type: bool,
    rtr: bool,
    brs: bool,
    esi: bool,
}

/// Format flags of a CAN frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FrameFlags {
    frame_kind: FrameKind,
    identifier_type: IdentifierType,
    rtr: RtrFlag,
    brs: BitRateShift,
    esi: ErrorStateIndicator,
    pinned: Pinned,
}

impl FrameFlags {
    /// Flags with nothing pinned. Until randomized they describe a Classical
    /// base-identifier data frame.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fully pinned Classical flags.
    pub fn classical(identifier_type: IdentifierType, rtr: RtrFlag) -> Self {
        Self::new()
            .with_frame_kind(FrameKind::Classical)
            .with_identifier_type(identifier_type)
            .with_rtr(rtr)
    }

    /// Classical base-identifier data frame.
    pub fn classical_base() -> Self {
        Self::classical(IdentifierType::Base, RtrFlag::Data)
    }

    /// Fully pinned CAN FD flags.
    pub fn fd(
        identifier_type: IdentifierType,
        brs: BitRateShift,
        esi: ErrorStateIndicator,
    ) -> Self {
        Self::new()
            .with_frame_kind(FrameKind::Fd)
            .with_identifier_type(identifier_type)
            .with_rtr(RtrFlag::Data)
            .with_brs(brs)
            .with_esi(esi)
    }

    /// Pin every flag at once, rejecting remote CAN FD frames.
    pub fn try_new(
        frame_kind: FrameKind,
        identifier_type: IdentifierType,
        rtr: RtrFlag,
        brs: BitRateShift,
        esi: ErrorStateIndicator,
    ) -> Result<Self> {
        let flags = Self::new()
            .with_frame_kind(frame_kind)
            .with_identifier_type(identifier_type)
            .with_rtr(rtr)
            .with_brs(brs)
            .with_esi(esi);
        flags.validate()?;
        Ok(flags)
    }

    pub fn with_frame_kind(mut self, frame_kind: FrameKind) -> Self {
        self.frame_kind = frame_kind;
        self.pinned.frame_kind = true;
        self
    }

    pub fn with_identifier_type(mut self, identifier_type: IdentifierType) -> Self {
        self.identifier_type = identifier_type;
        self.pinned.identifier_type = true;
        self
    }

    pub fn with_rtr(mut self, rtr: RtrFlag) -> Self {
        self.rtr = rtr;
        self.pinned.rtr = true;
        self
    }

    pub fn with_brs(mut self, brs: BitRateShift) -> Self {
        self.brs = brs;
        self.pinned.brs = true;
        self
    }

    pub fn with_esi(mut self, esi: ErrorStateIndicator) -> Self {
        self.esi = esi;
        self.pinned.esi = true;
        self
    }

    /// Reject combinations that cannot be corrected silently.
    pub fn validate(&self) -> Result<()> {
        if self.frame_kind == FrameKind::Fd && self.rtr == RtrFlag::Remote {
            return Err(Error::InvalidFlagCombination {
                reason: "CAN FD frames have no remote variant",
            });
        }
        Ok(())
    }

    /// Draw every flag that is not pinned.
    ///
    /// Pinned flags are kept, randomized ones are chosen so that the result
    /// is legal. Fails only if the pinned flags alone are illegal.
    pub fn randomize<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<()> {
        self.validate()?;

        if !self.pinned.frame_kind {
            let remote_pinned = self.pinned.rtr && self.rtr == RtrFlag::Remote;
            self.frame_kind = if !remote_pinned && rng.gen_bool(0.5) {
                FrameKind::Fd
            } else {
                FrameKind::Classical
            };
        }
        if !self.pinned.identifier_type {
            self.identifier_type = if rng.gen_bool(0.5) {
                IdentifierType::Extended
            } else {
                IdentifierType::Base
            };
        }
        if !self.pinned.rtr {
            self.rtr = if self.frame_kind == FrameKind::Classical && rng.gen_bool(0.5) {
                RtrFlag::Remote
            } else {
                RtrFlag::Data
            };
        }
        if !self.pinned.brs {
            self.brs = if rng.gen_bool(0.5) {
                BitRateShift::Shift
            } else {
                BitRateShift::NoShift
            };
        }
        if !self.pinned.esi {
            self.esi = if rng.gen_bool(0.5) {
                ErrorStateIndicator::ErrorPassive
            } else {
                ErrorStateIndicator::ErrorActive
            };
        }
        log::trace!("Randomized frame flags: {self:?}");
        Ok(())
    }

    #[inline]
    pub fn frame_kind(&self) -> FrameKind {
        self.frame_kind
    }

    #[inline]
    pub fn identifier_type(&self) -> IdentifierType {
        self.identifier_type
    }

    #[inline]
    pub fn rtr(&self) -> RtrFlag {
        self.rtr
    }

    /// Bit-rate switch; always `NoShift` for Classical frames.
    #[inline]
    pub fn brs(&self) -> BitRateShift {
        match self.frame_kind {
            FrameKind::Fd => self.brs,
            FrameKind::Classical => BitRateShift::NoShift,
        }
    }

    /// Error state indicator; always `ErrorActive` for Classical frames.
    #[inline]
    pub fn esi(&self) -> ErrorStateIndicator {
        match self.frame_kind {
            FrameKind::Fd => self.esi,
            FrameKind::Classical => ErrorStateIndicator::ErrorActive,
        }
    }

    #[inline]
    pub fn is_fd(&self) -> bool {
        self.frame_kind == FrameKind::Fd
    }

    #[inline]
    pub fn is_extended(&self) -> bool {
        self.identifier_type == IdentifierType::Extended
    }

    #[inline]
    pub fn is_remote(&self) -> bool {
        self.rtr == RtrFlag::Remote
    }

    /// True for CAN FD frames that switch to the data bit rate.
    #[inline]
    pub fn shifts_bit_rate(&self) -> bool {
        self.brs() == BitRateShift::Shift
    }

    #[inline]
    pub(crate) fn is_frame_kind_pinned(&self) -> bool {
        self.pinned.frame_kind
    }
}
