//! Correcting the positions of eye-tracking fixations.
//!
//! A recording's fixations are detected from gaze data, and their positions
//! can be off by a small, roughly constant amount. This crate keeps a ledger of
//! per-fixation position corrections, previews them on top of the world video,
//! and folds them back into the fixation data, either in memory or in the
//! fixation store of a recording's data directory.
//!
//! # Basic usage:
//!
//! ```no_run
//! use fixcorr::{FixationCorrector, FixationRange, RecordStore, WriteOptions, FIXATIONS};
//!
//! let dir = "recording/offline_data";
//! let store = RecordStore::load(dir, FIXATIONS).expect("failed to load fixations");
//! let stops = fixcorr::load_stop_timestamps(dir, FIXATIONS).expect("missing timestamps");
//! let fixations = store.fixation_set(stops).expect("invalid fixations");
//!
//! let mut corrector = FixationCorrector::default();
//! corrector.set_pending_x(0.015);
//! corrector.set_pending_y(-0.004);
//! corrector.apply_to_range(FixationRange::new(10, 25), fixations.len());
//!
//! corrector.commit_to_storage(dir, &WriteOptions::default()).expect("failed to write");
//! ```

#![deny(rustdoc::broken_intra_doc_links, unsafe_code)]

#[macro_use]
extern crate serde_derive;
#[macro_use]
extern crate serde_repr;

mod corrector;
pub mod error;
mod fixation;
mod fixations;
mod ledger;
mod options;
mod overlay;
mod shared_types;
mod store;
mod timeline;
mod write;

pub use corrector::FixationCorrector;
pub use error::Error;
pub use fixation::{Fixation, SerializedFixation, FIXATION_TOPIC};
pub use fixations::{FixationSet, FixationWindow, RecordingWindow};
pub use ledger::{CorrectionLedger, FixationRange};
pub use options::{CorrectorOptions, CorrectorSettings, MarkerStyle, SliderRange};
pub use overlay::{denormalize, overlay_points, ScreenPoint};
pub use shared_types::{Color, NormPos, Offset, Plist};
pub use store::{
    load_stop_timestamps, save_stop_timestamps, FormatVersion, MetaInfo, RecordStore, StoreEntry,
    StoreWriter, FIXATIONS,
};
pub use timeline::{Frame, TimeWindow, Timeline};
pub use write::{PlistFormat, WriteOptions};
