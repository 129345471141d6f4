//! The sparse mapping from fixation id to accumulated correction.

use std::collections::BTreeMap;
use std::ops::Range;
use std::str::FromStr;

use crate::error::{Error, InvalidRangeBound};
use crate::fixation::{Fixation, FIXATION_TOPIC};
use crate::fixations::FixationSet;
use crate::shared_types::{NormPos, Offset};
use crate::store::{RecordStore, StoreWriter};

/// An inclusive range of fixation ids, as entered by the user.
///
/// No validation is performed: an inverted range is simply empty, and the end
/// is clamped against the size of the collection when the range is resolved.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FixationRange {
    /// The first id in the range.
    pub start: u64,
    /// The last id in the range.
    pub end: u64,
}

impl FixationRange {
    /// Returns a new `FixationRange` covering `start..=end`.
    pub fn new(start: u64, end: u64) -> Self {
        FixationRange { start, end }
    }

    /// Resolve the range against a collection of `fixation_count` fixations.
    ///
    /// The result covers `start..=end`, but never reaches `fixation_count`.
    pub fn ids(&self, fixation_count: usize) -> Range<u64> {
        let end = (fixation_count as u64).min(self.end.saturating_add(1));
        self.start..end
    }
}

impl FromStr for FixationRange {
    type Err = InvalidRangeBound;

    /// Parses `"start-end"`, or a single id.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parse = |bound: &str| {
            bound.trim().parse::<u64>().map_err(|_| InvalidRangeBound(bound.trim().to_owned()))
        };
        match s.split_once('-') {
            Some((start, end)) => Ok(FixationRange::new(parse(start)?, parse(end)?)),
            None => {
                let id = parse(s)?;
                Ok(FixationRange::new(id, id))
            }
        }
    }
}

/// Accumulated position corrections, keyed by fixation id.
///
/// Only corrected fixations have an entry; a missing entry means no correction.
/// Entries whose corrections happen to cancel out are kept.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CorrectionLedger {
    offsets: BTreeMap<u64, Offset>,
}

impl CorrectionLedger {
    /// Returns a new, empty ledger.
    pub fn new() -> Self {
        CorrectionLedger::default()
    }

    /// The number of fixations with an entry.
    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    /// `true` if no fixation has been corrected.
    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    /// `true` if the fixation `id` has an entry.
    pub fn contains(&self, id: u64) -> bool {
        self.offsets.contains_key(&id)
    }

    /// Returns the correction for `id`, or [`Offset::ZERO`] if it has none.
    pub fn get(&self, id: u64) -> Offset {
        self.offsets.get(&id).copied().unwrap_or_default()
    }

    /// Iterate over all entries, in id order.
    pub fn iter(&self) -> impl Iterator<Item = (u64, Offset)> + '_ {
        self.offsets.iter().map(|(id, offset)| (*id, *offset))
    }

    /// Add `offset` to the correction of `id`.
    pub fn add(&mut self, id: u64, offset: Offset) {
        *self.offsets.entry(id).or_default() += offset;
    }

    /// Add `offset` to the correction of every id in `ids`.
    pub fn add_all(&mut self, ids: impl IntoIterator<Item = u64>, offset: Offset) {
        for id in ids {
            self.add(id, offset);
        }
    }

    /// Remove the correction for `id`, returning it if there was one.
    pub fn remove(&mut self, id: u64) -> Option<Offset> {
        self.offsets.remove(&id)
    }

    /// Remove the correction of every id in `ids`.
    pub fn remove_all(&mut self, ids: impl IntoIterator<Item = u64>) {
        for id in ids {
            self.offsets.remove(&id);
        }
    }

    /// Forget all corrections.
    pub fn clear(&mut self) {
        self.offsets.clear();
    }

    /// Returns the corrected position of `fixation`.
    pub fn corrected_position(&self, fixation: &Fixation) -> NormPos {
        fixation.norm_pos + self.get(fixation.id)
    }

    /// Returns a copy of `fixation` with its correction applied.
    pub fn correct(&self, fixation: &Fixation) -> Fixation {
        fixation.corrected(self.get(fixation.id))
    }

    /// Build a new collection with every correction applied.
    ///
    /// The new collection keeps the start timestamps of `fixations` and uses
    /// `stop_timestamps` as its stop timestamps. The ledger is left as is.
    pub fn correct_set(
        &self,
        fixations: &FixationSet,
        stop_timestamps: Vec<f64>,
    ) -> Result<FixationSet, Error> {
        let corrected = fixations.iter().map(|fixation| self.correct(fixation)).collect();
        FixationSet::new(corrected, fixations.start_timestamps().to_vec(), stop_timestamps)
    }

    /// Write every record of `store` to `writer`, with corrections applied.
    ///
    /// Records are written in timestamp order. Entries that are not fixations
    /// are copied verbatim.
    pub fn write_corrected(
        &self,
        store: &RecordStore,
        writer: &mut StoreWriter,
    ) -> Result<(), Error> {
        let mut entries: Vec<_> = store.entries().iter().collect();
        entries.sort_by(|a, b| a.timestamp.total_cmp(&b.timestamp));

        for entry in entries {
            if entry.topic != FIXATION_TOPIC {
                log::warn!("copying store entry with topic '{}' unchanged", entry.topic);
                writer.append_serialized(entry.timestamp, &entry.topic, entry.payload.clone());
                continue;
            }
            let fixation = entry.payload.decode()?;
            let corrected = self.correct(&fixation).encode()?;
            writer.append_serialized(entry.timestamp, FIXATION_TOPIC, corrected);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use maplit::btreemap;
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn missing_entries_default_to_zero() {
        let ledger = CorrectionLedger::new();
        assert_eq!(ledger.get(42), Offset::ZERO);
        assert!(!ledger.contains(42));
    }

    #[test]
    fn corrections_accumulate() {
        let mut ledger = CorrectionLedger::new();
        ledger.add(5, Offset::new(0.01, -0.02));
        ledger.add(5, Offset::new(0.01, 0.0));
        ledger.add(6, Offset::new(0.0, 0.5));

        let entries: BTreeMap<_, _> = ledger.iter().collect();
        assert_eq!(
            entries,
            btreemap! {
                5 => Offset::new(0.02, -0.02),
                6 => Offset::new(0.0, 0.5),
            }
        );
    }

    #[test]
    fn cancelled_entries_are_kept() {
        let mut ledger = CorrectionLedger::new();
        ledger.add(1, Offset::new(0.25, 0.5));
        ledger.add(1, Offset::new(-0.25, -0.5));
        assert!(ledger.contains(1));
        assert!(ledger.get(1).is_zero());
    }

    #[test]
    fn corrected_position_example() {
        let mut ledger = CorrectionLedger::new();
        ledger.add(5, Offset::new(0.01, -0.02));

        let five = Fixation::new(5, NormPos::new(0.5, 0.5), 1.0);
        let six = Fixation::new(6, NormPos::new(0.3, 0.3), 1.0);

        let pos = ledger.corrected_position(&five);
        assert!((pos.x - 0.51).abs() < 1e-12);
        assert!((pos.y - 0.48).abs() < 1e-12);
        assert_eq!(ledger.corrected_position(&six), NormPos::new(0.3, 0.3));
    }

    #[test]
    fn range_resolution() {
        assert_eq!(FixationRange::new(3, 5).ids(10), 3..6);
        assert_eq!(FixationRange::new(8, 12).ids(10), 8..10);
        assert_eq!(FixationRange::new(5, 3).ids(10).count(), 0);
        assert_eq!(FixationRange::new(0, u64::MAX).ids(4), 0..4);
        assert_eq!(FixationRange::new(2, 2).ids(0).count(), 0);
    }

    #[test]
    fn range_parsing() {
        assert_eq!("3-5".parse::<FixationRange>(), Ok(FixationRange::new(3, 5)));
        assert_eq!(" 7 ".parse::<FixationRange>(), Ok(FixationRange::new(7, 7)));
        assert_eq!("4 - 9".parse::<FixationRange>(), Ok(FixationRange::new(4, 9)));
        assert_eq!("x-9".parse::<FixationRange>(), Err(InvalidRangeBound("x".into())));
        assert!("".parse::<FixationRange>().is_err());
    }

    #[test]
    fn correct_set_keeps_timestamps() {
        let fixations = vec![
            Fixation::new(0, NormPos::new(0.1, 0.1), 1.0),
            Fixation::new(1, NormPos::new(0.2, 0.2), 1.0),
        ];
        let set = FixationSet::new(fixations, vec![1.0, 2.0], vec![1.5, 2.5]).unwrap();
        let mut ledger = CorrectionLedger::new();
        ledger.add(1, Offset::new(0.5, 0.0));

        let corrected = ledger.correct_set(&set, vec![1.25, 2.75]).unwrap();
        assert_eq!(corrected.start_timestamps(), &[1.0, 2.0]);
        assert_eq!(corrected.stop_timestamps(), &[1.25, 2.75]);
        assert_eq!(corrected.get(0), set.get(0));
        assert!((corrected.get(1).unwrap().norm_pos.x - 0.7).abs() < 1e-12);
        assert_eq!(ledger.len(), 1);
    }
}
