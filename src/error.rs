//! Error types.

use std::path::PathBuf;

use plist::Error as PlistError;

/// Errors that occur while loading, correcting or saving fixation data.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// An error returned when the requested store file is not present.
    #[error("store file '{}' was not found", .0.display())]
    MissingStore(PathBuf),
    /// An error returned when a store file could not be parsed.
    #[error("failed to load store file '{}'", path.display())]
    StoreLoad {
        /// The path of the store file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: PlistError,
    },
    /// An error returned when a store file could not be written.
    #[error("failed to write store file '{}'", path.display())]
    StoreWrite {
        /// The path of the store file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: StoreWriteError,
    },
    /// An error that wraps a [`RecordError`].
    #[error("invalid fixation record")]
    Record(#[from] RecordError),
    /// An error returned when fixations and their timestamps are of unequal length.
    #[error("{fixations} fixations but {timestamps} timestamps")]
    TimestampCountMismatch {
        /// The number of fixations.
        fixations: usize,
        /// The number of timestamps.
        timestamps: usize,
    },
}

/// The possible inner error types that can occur when writing a store file.
#[derive(Debug, thiserror::Error)]
pub enum StoreWriteError {
    /// Generic I/O error, including a failure to replace the previous file.
    #[error(transparent)]
    Io(#[from] std::io::Error),
    /// Plist serialization error.
    #[error(transparent)]
    Plist(#[from] PlistError),
}

/// An error representing a failure to decode or encode a single fixation record.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum RecordError {
    /// The record bytes are not a valid plist.
    #[error("malformed record data")]
    Plist(#[from] PlistError),
    /// The record is a plist, but not a dictionary.
    #[error("a record must be a dictionary")]
    NotADictionary,
    /// A mandatory field is missing.
    #[error("missing field '{0}'")]
    MissingField(&'static str),
    /// A mandatory field has the wrong type or shape.
    #[error("invalid value for field '{0}'")]
    InvalidField(&'static str),
}

/// An error returned when a fixation range bound cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("'{0}' is not a valid fixation id")]
pub struct InvalidRangeBound(pub(crate) String);

#[cfg(test)]
mod tests {
    use expect_test::expect;

    use super::*;

    #[test]
    fn display_messages() {
        let err = Error::TimestampCountMismatch { fixations: 3, timestamps: 2 };
        expect!["3 fixations but 2 timestamps"].assert_eq(&err.to_string());

        let err = Error::Record(RecordError::MissingField("norm_pos"));
        expect!["invalid fixation record"].assert_eq(&err.to_string());
        let source = std::error::Error::source(&err).map(|e| e.to_string());
        assert_eq!(source.as_deref(), Some("missing field 'norm_pos'"));

        let err = Error::MissingStore(PathBuf::from("offline_data/fixations.plist"));
        expect!["store file 'offline_data/fixations.plist' was not found"]
            .assert_eq(&err.to_string());
    }
}
