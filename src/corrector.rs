//! Interactive correction of fixation positions.

use std::path::Path;

use crate::error::Error;
use crate::fixations::{FixationSet, FixationWindow};
use crate::ledger::{CorrectionLedger, FixationRange};
use crate::options::{CorrectorOptions, CorrectorSettings};
use crate::overlay::{self, ScreenPoint};
use crate::shared_types::Offset;
use crate::store::{self, RecordStore, StoreWriter, FIXATIONS};
use crate::timeline::Frame;
use crate::write::WriteOptions;

/// The state of a fixation correction session.
///
/// A corrector holds a *pending* correction, set through
/// [`set_pending_x`]/[`set_pending_y`], and a [`CorrectionLedger`] of
/// corrections that have been applied to individual fixations. Applied
/// corrections only change fixation data once they are committed, either to the
/// live fixation collection ([`commit_to_memory`]) or to the store on disk
/// ([`commit_to_storage`]).
///
/// # Examples
///
/// ```
/// use fixcorr::{Fixation, FixationCorrector, FixationRange, FixationSet, NormPos};
///
/// let fixations = (0..4).map(|id| Fixation::new(id, NormPos::new(0.5, 0.5), 1.0)).collect();
/// let set = FixationSet::new(fixations, vec![0.0, 1.0, 2.0, 3.0], vec![0.5, 1.5, 2.5, 3.5])
///     .unwrap();
///
/// let mut corrector = FixationCorrector::default();
/// corrector.set_pending_x(0.02);
/// corrector.apply_to_range(FixationRange::new(1, 2), set.len());
///
/// let corrected = corrector.commit_to_memory(&set, set.stop_timestamps().to_vec()).unwrap();
/// assert!((corrected.get(1).unwrap().norm_pos.x - 0.52).abs() < 1e-9);
/// assert!(corrector.ledger().is_empty());
/// ```
///
/// [`set_pending_x`]: FixationCorrector::set_pending_x
/// [`set_pending_y`]: FixationCorrector::set_pending_y
/// [`commit_to_memory`]: FixationCorrector::commit_to_memory
/// [`commit_to_storage`]: FixationCorrector::commit_to_storage
#[derive(Debug, Clone, Default)]
pub struct FixationCorrector {
    ledger: CorrectionLedger,
    pending: Offset,
    selection: FixationRange,
    frame: Option<Frame>,
    options: CorrectorOptions,
}

impl FixationCorrector {
    /// Returns a new corrector with an empty ledger.
    pub fn new(options: CorrectorOptions) -> Self {
        FixationCorrector { options, ..Default::default() }
    }

    /// Restore a corrector from the state saved by a host.
    pub fn with_settings(settings: CorrectorSettings, options: CorrectorOptions) -> Self {
        let mut this = FixationCorrector::new(options);
        this.set_pending(settings.pending());
        this
    }

    /// The state a host should save to restore this corrector.
    ///
    /// The pending correction is not part of it.
    pub fn settings(&self) -> CorrectorSettings {
        CorrectorSettings::default()
    }

    /// The corrector's options.
    pub fn options(&self) -> &CorrectorOptions {
        &self.options
    }

    /// The applied, uncommitted corrections.
    pub fn ledger(&self) -> &CorrectionLedger {
        &self.ledger
    }

    /// The pending correction.
    pub fn pending(&self) -> Offset {
        self.pending
    }

    /// Set the pending correction, constrained to the slider range.
    pub fn set_pending(&mut self, pending: Offset) {
        self.set_pending_x(pending.x);
        self.set_pending_y(pending.y);
    }

    /// Set the horizontal pending correction, constrained to the slider range.
    pub fn set_pending_x(&mut self, x: f64) {
        self.pending.x = self.options.slider.constrain(x);
    }

    /// Set the vertical pending correction, constrained to the slider range.
    pub fn set_pending_y(&mut self, y: f64) {
        self.pending.y = self.options.slider.constrain(y);
    }

    /// The currently selected range of fixation ids.
    pub fn selection(&self) -> FixationRange {
        self.selection
    }

    /// Select a range of fixation ids for the range operations.
    pub fn set_selection(&mut self, selection: FixationRange) {
        self.selection = selection;
    }

    /// The most recent frame seen by [`on_frame`](FixationCorrector::on_frame).
    pub fn current_frame(&self) -> Option<Frame> {
        self.frame
    }

    /// Record the frame currently shown by the host.
    ///
    /// Passing `None` keeps the previously seen frame.
    pub fn on_frame(&mut self, frame: Option<Frame>) {
        if let Some(frame) = frame {
            self.frame = Some(frame);
        }
    }

    /// Add the pending correction to every fixation on the current frame.
    ///
    /// If there is at least one such fixation, the pending correction is reset
    /// afterwards. Without a current frame or without fixations on it, nothing
    /// changes.
    pub fn apply_to_single<W: FixationWindow + ?Sized>(&mut self, window: &W) {
        let Some(frame) = self.frame else {
            log::debug!("no current frame, nothing to correct");
            return;
        };
        let ids: Vec<u64> = window.fixations_at(frame.index).iter().map(|f| f.id).collect();
        if ids.is_empty() {
            log::debug!("no fixation on frame {}", frame.index);
            return;
        }
        log::debug!("correcting fixations {:?} by {:?}", ids, self.pending);
        self.ledger.add_all(ids, self.pending);
        self.pending = Offset::ZERO;
    }

    /// Add the pending correction to every fixation in `fixations`.
    ///
    /// The pending correction is kept.
    pub fn apply_to_all(&mut self, fixations: &FixationSet) {
        log::debug!("correcting all {} fixations by {:?}", fixations.len(), self.pending);
        self.ledger.add_all(fixations.iter().map(|f| f.id), self.pending);
    }

    /// Add the pending correction to every id in `range`, up to `fixation_count`.
    ///
    /// Ids are not checked against any collection. The pending correction is kept.
    pub fn apply_to_range(&mut self, range: FixationRange, fixation_count: usize) {
        let ids = range.ids(fixation_count);
        log::debug!("correcting fixations {:?} by {:?}", ids, self.pending);
        self.ledger.add_all(ids, self.pending);
    }

    /// [`apply_to_range`](FixationCorrector::apply_to_range) with the current selection.
    pub fn apply_to_selection(&mut self, fixations: &FixationSet) {
        self.apply_to_range(self.selection, fixations.len());
    }

    /// Forget the corrections of every fixation on the current frame.
    ///
    /// If there is at least one such fixation, the pending correction is reset
    /// as well. Without a current frame or without fixations on it, nothing
    /// changes.
    pub fn reset_single<W: FixationWindow + ?Sized>(&mut self, window: &W) {
        let Some(frame) = self.frame else {
            log::debug!("no current frame, nothing to reset");
            return;
        };
        let ids: Vec<u64> = window.fixations_at(frame.index).iter().map(|f| f.id).collect();
        if ids.is_empty() {
            log::debug!("no fixation on frame {}", frame.index);
            return;
        }
        self.ledger.remove_all(ids);
        self.pending = Offset::ZERO;
    }

    /// Forget the corrections of every id in `range`, up to `fixation_count`.
    pub fn reset_range(&mut self, range: FixationRange, fixation_count: usize) {
        self.ledger.remove_all(range.ids(fixation_count));
    }

    /// [`reset_range`](FixationCorrector::reset_range) with the current selection.
    pub fn reset_selection(&mut self, fixations: &FixationSet) {
        self.reset_range(self.selection, fixations.len());
    }

    /// Fold all corrections into a new fixation collection.
    ///
    /// The result keeps the start timestamps of `fixations` and uses
    /// `stop_timestamps` as its stop timestamps. The ledger is cleared.
    pub fn commit_to_memory(
        &mut self,
        fixations: &FixationSet,
        stop_timestamps: Vec<f64>,
    ) -> Result<FixationSet, Error> {
        let corrected = self.ledger.correct_set(fixations, stop_timestamps)?;
        log::info!("committed {} corrections to {} fixations", self.ledger.len(), corrected.len());
        self.ledger.clear();
        Ok(corrected)
    }

    /// [`commit_to_memory`](FixationCorrector::commit_to_memory), reading the
    /// stop timestamps from the recording's data directory `dir`.
    pub fn save_to_memory(
        &mut self,
        fixations: &FixationSet,
        dir: impl AsRef<Path>,
    ) -> Result<FixationSet, Error> {
        let stop_timestamps = store::load_stop_timestamps(dir, FIXATIONS)?;
        self.commit_to_memory(fixations, stop_timestamps)
    }

    /// Rewrite the fixation store in `dir` with all corrections applied.
    ///
    /// The ledger is kept, so corrections remain visible and can still be
    /// committed to memory.
    pub fn commit_to_storage(
        &self,
        dir: impl AsRef<Path>,
        options: &WriteOptions,
    ) -> Result<(), Error> {
        let dir = dir.as_ref();
        let store = RecordStore::load(dir, FIXATIONS)?;
        let mut writer =
            StoreWriter::create(dir, FIXATIONS, options).meta(store.meta().clone());
        self.ledger.write_corrected(&store, &mut writer)?;
        writer.finish()?;
        log::info!("wrote {} corrections to '{}'", self.ledger.len(), dir.display());
        Ok(())
    }

    /// [`commit_to_storage`](FixationCorrector::commit_to_storage) with the
    /// default [`WriteOptions`].
    pub fn save_to_directory(&self, dir: impl AsRef<Path>) -> Result<(), Error> {
        self.commit_to_storage(dir, &WriteOptions::default())
    }

    /// Where to draw the fixations of `frame`, with all corrections applied.
    ///
    /// Returns an empty list without querying `window` when there is nothing
    /// to correct: the ledger is empty and the pending correction is zero.
    pub fn render_overlay<W: FixationWindow + ?Sized>(
        &self,
        frame: &Frame,
        window: &W,
    ) -> Vec<ScreenPoint> {
        if self.ledger.is_empty() && self.pending.is_zero() {
            return Vec::new();
        }
        overlay::overlay_points(
            frame,
            window.fixations_at(frame.index),
            &self.ledger,
            self.pending,
            self.options.min_confidence,
        )
    }
}
