//! Read-only lookups over the live bit sequence.
//!
//! Lookups that can legitimately miss in a random frame return
//! [`Error::BitNotFound`]; raw positional access panics when out of range.

use rand::Rng;

use super::BitFrame;
use crate::bit::{Bit, BitType, BitValue, StuffBitKind};
use crate::error::{BitQuery, Error, Result};

impl BitFrame {
    /// Number of bits.
    #[inline]
    pub fn len(&self) -> usize {
        self.bits.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    pub fn bits(&self) -> &[Bit] {
        &self.bits
    }

    pub fn iter(&self) -> core::slice::Iter<'_, Bit> {
        self.bits.iter()
    }

    pub fn iter_mut(&mut self) -> core::slice::IterMut<'_, Bit> {
        self.bits.iter_mut()
    }

    /// # Panics
    /// Panics if `index >= self.len()`.
    pub fn bit(&self, index: usize) -> &Bit {
        self.check_index(index);
        &self.bits[index]
    }

    /// # Panics
    /// Panics if `index >= self.len()`.
    pub fn bit_mut(&mut self, index: usize) -> &mut Bit {
        self.check_index(index);
        &mut self.bits[index]
    }

    pub(crate) fn check_index(&self, index: usize) {
        let len = self.bits.len();
        assert!(
            index < len,
            "bit index {index} out of range for bit frame of {len} bits"
        );
    }

    /// Total length in clock cycles.
    pub fn len_cycles(&self) -> usize {
        self.bits.iter().map(Bit::len_cycles).sum()
    }

    fn find<P>(&self, n: usize, query: BitQuery, predicate: P) -> Result<usize>
    where
        P: Fn(&Bit) -> bool,
    {
        self.bits
            .iter()
            .enumerate()
            .filter(|(_, bit)| predicate(bit))
            .nth(n)
            .map(|(index, _)| index)
            .ok_or(Error::BitNotFound(query))
    }

    /// Index of the `n`-th bit of `bit_type`, stuff bits included.
    pub fn bit_index_of(&self, n: usize, bit_type: BitType) -> Result<usize> {
        let query = BitQuery {
            index: n,
            bit_type: Some(bit_type),
            ..BitQuery::default()
        };
        self.find(n, query, |b| b.bit_type() == bit_type)
    }

    /// The `n`-th bit of `bit_type`, stuff bits included.
    pub fn bit_of(&self, n: usize, bit_type: BitType) -> Result<&Bit> {
        let index = self.bit_index_of(n, bit_type)?;
        Ok(&self.bits[index])
    }

    pub fn bit_of_mut(&mut self, n: usize, bit_type: BitType) -> Result<&mut Bit> {
        let index = self.bit_index_of(n, bit_type)?;
        Ok(&mut self.bits[index])
    }

    /// Index of the `n`-th data-carrying bit of `bit_type`.
    pub fn bit_index_of_no_stuff(&self, n: usize, bit_type: BitType) -> Result<usize> {
        let query = BitQuery {
            index: n,
            bit_type: Some(bit_type),
            skip_stuff_bits: true,
            ..BitQuery::default()
        };
        self.find(n, query, |b| b.bit_type() == bit_type && !b.is_stuff_bit())
    }

    /// The `n`-th data-carrying bit of `bit_type`.
    pub fn bit_of_no_stuff(&self, n: usize, bit_type: BitType) -> Result<&Bit> {
        let index = self.bit_index_of_no_stuff(n, bit_type)?;
        Ok(&self.bits[index])
    }

    pub fn bit_of_no_stuff_mut(&mut self, n: usize, bit_type: BitType) -> Result<&mut Bit> {
        let index = self.bit_index_of_no_stuff(n, bit_type)?;
        Ok(&mut self.bits[index])
    }

    /// Index of the `n`-th dynamic stuff bit, optionally restricted to a
    /// field and/or a value.
    pub fn stuff_bit_index(
        &self,
        n: usize,
        bit_type: Option<BitType>,
        value: Option<BitValue>,
    ) -> Result<usize> {
        let query = BitQuery {
            index: n,
            bit_type,
            stuff_kind: Some(StuffBitKind::Normal),
            value,
            skip_stuff_bits: false,
        };
        self.find(n, query, |b| {
            b.stuff_kind() == StuffBitKind::Normal
                && bit_type.is_none_or(|t| b.bit_type() == t)
                && value.is_none_or(|v| b.value() == v)
        })
    }

    /// Index of the `n`-th fixed stuff bit, optionally of a given value.
    pub fn fixed_stuff_bit_index(&self, n: usize, value: Option<BitValue>) -> Result<usize> {
        let query = BitQuery {
            index: n,
            bit_type: None,
            stuff_kind: Some(StuffBitKind::Fixed),
            value,
            skip_stuff_bits: false,
        };
        self.find(n, query, |b| {
            b.stuff_kind() == StuffBitKind::Fixed && value.is_none_or(|v| b.value() == v)
        })
    }

    /// Number of bits of the given stuff kind, optionally of a given value.
    pub fn num_stuff_bits(&self, kind: StuffBitKind, value: Option<BitValue>) -> usize {
        self.bits
            .iter()
            .filter(|b| b.stuff_kind() == kind && value.is_none_or(|v| b.value() == v))
            .count()
    }

    /// Position of `bit` if it is one of this frame's bits (identity, not
    /// equality).
    pub fn bit_index(&self, bit: &Bit) -> Option<usize> {
        self.bits.iter().position(|b| core::ptr::eq(b, bit))
    }

    /// Number of bits of a field, stuff bits included.
    pub fn field_len(&self, bit_type: BitType) -> usize {
        self.bits.iter().filter(|b| b.bit_type() == bit_type).count()
    }

    /// Index of a uniformly chosen bit, optionally of a given value.
    pub fn random_bit<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        value: Option<BitValue>,
    ) -> Result<usize> {
        let query = BitQuery {
            value,
            ..BitQuery::default()
        };
        self.pick(rng, query, |b| value.is_none_or(|v| b.value() == v))
    }

    /// Index of a uniformly chosen bit of `bit_type`, optionally of a given
    /// value. Stuff bits of the field are candidates too.
    pub fn random_bit_of<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        bit_type: BitType,
        value: Option<BitValue>,
    ) -> Result<usize> {
        let query = BitQuery {
            bit_type: Some(bit_type),
            value,
            ..BitQuery::default()
        };
        self.pick(rng, query, |b| {
            b.bit_type() == bit_type && value.is_none_or(|v| b.value() == v)
        })
    }

    fn pick<R, P>(&self, rng: &mut R, query: BitQuery, predicate: P) -> Result<usize>
    where
        R: Rng + ?Sized,
        P: Fn(&Bit) -> bool,
    {
        let candidates: Vec<usize> = self
            .bits
            .iter()
            .enumerate()
            .filter(|(_, bit)| predicate(bit))
            .map(|(index, _)| index)
            .collect();
        if candidates.is_empty() {
            return Err(Error::BitNotFound(query));
        }
        Ok(candidates[rng.gen_range(0..candidates.len())])
    }
}
