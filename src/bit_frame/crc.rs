//! CAN CRC sequences.

use crate::bit::BitValue;

/// CRC sequence variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CrcType {
    /// Classical CAN.
    Crc15,
    /// CAN FD, up to 16 data bytes.
    Crc17,
    /// CAN FD, more than 16 data bytes.
    Crc21,
}

impl CrcType {
    /// Select the CRC for a frame format and the number of CRC bits it
    /// carries.
    pub const fn select(is_fd: bool, width: usize) -> Self {
        if !is_fd {
            CrcType::Crc15
        } else if width >= 21 {
            CrcType::Crc21
        } else {
            CrcType::Crc17
        }
    }

    pub const fn width(self) -> usize {
        match self {
            CrcType::Crc15 => 15,
            CrcType::Crc17 => 17,
            CrcType::Crc21 => 21,
        }
    }

    /// Generator polynomial, x^width term implicit.
    pub const fn polynomial(self) -> u32 {
        match self {
            CrcType::Crc15 => 0x4599,
            CrcType::Crc17 => 0x1_685B,
            CrcType::Crc21 => 0x10_2899,
        }
    }

    /// Initial register value. ISO 11898-1:2015 starts the FD CRCs with the
    /// top bit set.
    pub const fn init(self) -> u32 {
        match self {
            CrcType::Crc15 => 0,
            CrcType::Crc17 => 1 << 16,
            CrcType::Crc21 => 1 << 20,
        }
    }

    const fn mask(self) -> u32 {
        (1 << self.width()) - 1
    }

    /// Run the CRC register over a bit stream, first transmitted bit first.
    pub fn compute<I>(self, bits: I) -> u32
    where
        I: IntoIterator<Item = BitValue>,
    {
        let top = self.width() - 1;
        let mut crc = self.init();
        for bit in bits {
            let feedback = bit.as_bit() ^ ((crc >> top) & 1 == 1);
            crc = (crc << 1) & self.mask();
            if feedback {
                crc ^= self.polynomial();
            }
        }
        crc & self.mask()
    }
}
