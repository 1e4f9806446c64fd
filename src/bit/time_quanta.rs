//! Time quanta and clock cycles of a single bit.

use super::BitValue;

/// Segment of a bit a time quantum belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BitPhase {
    Sync,
    Prop,
    Ph1,
    Ph2,
}

impl BitPhase {
    /// All phases in transmission order.
    pub const ALL: [BitPhase; 4] = [BitPhase::Sync, BitPhase::Prop, BitPhase::Ph1, BitPhase::Ph2];
}

/// One clock cycle of a time quantum.
///
/// Unless forced, a cycle carries the logical value of its bit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CycleValue {
    forced: Option<BitValue>,
}

impl CycleValue {
    /// A cycle following its bit's value.
    pub const fn new() -> Self {
        Self { forced: None }
    }

    /// A cycle forced to `value`.
    pub const fn forced(value: BitValue) -> Self {
        Self {
            forced: Some(value),
        }
    }

    /// Override the value of this cycle.
    pub fn force(&mut self, value: BitValue) {
        self.forced = Some(value);
    }

    /// Drop any override; the cycle follows its bit again.
    pub fn release(&mut self) {
        self.forced = None;
    }

    /// True if the cycle follows its bit's value.
    #[inline]
    pub fn has_default_value(&self) -> bool {
        self.forced.is_none()
    }

    /// Forced value, if any.
    #[inline]
    pub fn forced_value(&self) -> Option<BitValue> {
        self.forced
    }

    /// Effective level given the owning bit's value.
    #[inline]
    pub fn value(&self, bit_value: BitValue) -> BitValue {
        self.forced.unwrap_or(bit_value)
    }
}

/// A time quantum: `brp` clock cycles belonging to one [`BitPhase`].
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TimeQuanta {
    phase: BitPhase,
    cycles: Vec<CycleValue>,
}

impl TimeQuanta {
    /// Create a time quantum of `len_cycles` non-forced cycles.
    pub fn new(phase: BitPhase, len_cycles: usize) -> Self {
        Self {
            phase,
            cycles: vec![CycleValue::new(); len_cycles],
        }
    }

    #[inline]
    pub fn phase(&self) -> BitPhase {
        self.phase
    }

    /// Number of clock cycles.
    #[inline]
    pub fn len_cycles(&self) -> usize {
        self.cycles.len()
    }

    pub fn cycles(&self) -> &[CycleValue] {
        &self.cycles
    }

    /// # Panics
    /// Panics if `index >= self.len_cycles()`.
    pub fn cycle(&self, index: usize) -> &CycleValue {
        &self.cycles[index]
    }

    /// # Panics
    /// Panics if `index >= self.len_cycles()`.
    pub fn cycle_mut(&mut self, index: usize) -> &mut CycleValue {
        &mut self.cycles[index]
    }

    /// Force every cycle of this quantum to `value`.
    pub fn force_value(&mut self, value: BitValue) {
        self.cycles.iter_mut().for_each(|c| c.force(value));
    }

    /// Force a single cycle.
    ///
    /// # Panics
    /// Panics if `index >= self.len_cycles()`.
    pub fn force_cycle_value(&mut self, index: usize, value: BitValue) {
        let len = self.cycles.len();
        assert!(
            index < len,
            "cycle index {index} out of range for time quantum of {len} cycles"
        );
        self.cycles[index].force(value);
    }

    /// Release every forced cycle.
    pub fn release(&mut self) {
        self.cycles.iter_mut().for_each(CycleValue::release);
    }

    /// True if no cycle is forced.
    pub fn has_default_values(&self) -> bool {
        self.cycles.iter().all(CycleValue::has_default_value)
    }

    /// Append `n` non-forced cycles.
    pub fn lengthen(&mut self, n: usize) {
        self.cycles.extend(core::iter::repeat_n(CycleValue::new(), n));
    }

    /// Remove up to `n` cycles from the end; returns how many could not be
    /// removed.
    pub fn shorten(&mut self, n: usize) -> usize {
        let removed = n.min(self.cycles.len());
        self.cycles.truncate(self.cycles.len() - removed);
        n - removed
    }
}
