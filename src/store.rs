//! The file-backed store of serialized records in a recording's data directory.
//!
//! A store named `fixations` lives in `fixations.plist`: a plist with a small
//! header and an ordered list of `(timestamp, topic, payload)` entries, where
//! each payload is an opaque serialized record. The stop timestamps that go
//! along with a store live next to it, in `fixations_stop_timestamps.plist`.

use std::path::{Path, PathBuf};

#[cfg(feature = "rayon")]
use rayon::prelude::*;

use crate::error::Error;
use crate::fixation::{Fixation, SerializedFixation, FIXATION_TOPIC};
use crate::fixations::FixationSet;
use crate::write::{self, WriteOptions};

/// The name of the store holding a recording's fixations.
pub static FIXATIONS: &str = "fixations";
static STORE_EXTENSION: &str = "plist";
static STOP_TIMESTAMPS_SUFFIX: &str = "_stop_timestamps";
static DEFAULT_CREATOR: &str = "org.fixcorr";

/// A version of the store file format.
#[derive(Debug, Clone, Copy, Serialize_repr, Deserialize_repr, PartialEq, Eq)]
#[repr(u8)]
pub enum FormatVersion {
    /// The first, and so far only, version.
    V1 = 1,
}

/// The header of a store file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MetaInfo {
    /// The software that wrote the file.
    pub creator: Option<String>,
    /// Store format version.
    pub format_version: FormatVersion,
}

impl Default for MetaInfo {
    fn default() -> Self {
        MetaInfo { creator: Some(DEFAULT_CREATOR.to_string()), format_version: FormatVersion::V1 }
    }
}

/// A single entry of a [`RecordStore`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreEntry {
    /// The timestamp the record belongs to.
    pub timestamp: f64,
    /// The topic of the record, e.g. `"fixation"`.
    pub topic: String,
    /// The serialized record.
    #[serde(with = "payload_bytes")]
    pub payload: SerializedFixation,
}

#[derive(Deserialize)]
struct StoreFile {
    meta: MetaInfo,
    entries: Vec<StoreEntry>,
}

#[derive(Serialize)]
struct StoreFileRef<'a> {
    meta: &'a MetaInfo,
    entries: &'a [StoreEntry],
}

/// An ordered sequence of timestamped, serialized records.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordStore {
    meta: MetaInfo,
    entries: Vec<StoreEntry>,
}

impl RecordStore {
    /// Returns a new, empty store.
    pub fn new() -> Self {
        RecordStore::default()
    }

    /// Returns the path of the store `name` inside `dir`.
    pub fn path(dir: impl AsRef<Path>, name: &str) -> PathBuf {
        dir.as_ref().join(format!("{}.{}", name, STORE_EXTENSION))
    }

    /// Load the store `name` from the directory `dir`.
    pub fn load(dir: impl AsRef<Path>, name: &str) -> Result<RecordStore, Error> {
        let path = RecordStore::path(dir, name);
        if !path.exists() {
            return Err(Error::MissingStore(path));
        }
        let file: StoreFile =
            plist::from_file(&path).map_err(|source| Error::StoreLoad { path, source })?;
        log::debug!("loaded {} entries from store '{}'", file.entries.len(), name);
        Ok(RecordStore { meta: file.meta, entries: file.entries })
    }

    /// Write the store to `dir` as `name`, replacing any existing file.
    pub fn save(
        &self,
        dir: impl AsRef<Path>,
        name: &str,
        options: &WriteOptions,
    ) -> Result<(), Error> {
        let path = RecordStore::path(dir, name);
        save_entries(&path, &self.meta, &self.entries, options)
    }

    /// The store's header.
    pub fn meta(&self) -> &MetaInfo {
        &self.meta
    }

    /// Replace the store's header.
    pub fn set_meta(&mut self, meta: MetaInfo) {
        self.meta = meta;
    }

    /// The number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// `true` if the store has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All entries, in file order.
    pub fn entries(&self) -> &[StoreEntry] {
        &self.entries
    }

    /// The timestamp of every entry, in file order.
    pub fn timestamps(&self) -> Vec<f64> {
        self.entries.iter().map(|e| e.timestamp).collect()
    }

    /// Append a serialized record.
    pub fn push_serialized(&mut self, timestamp: f64, topic: &str, payload: SerializedFixation) {
        self.entries.push(StoreEntry { timestamp, topic: topic.to_owned(), payload });
    }

    /// Serialize and append a fixation.
    pub fn push(&mut self, timestamp: f64, fixation: &Fixation) -> Result<(), Error> {
        self.push_serialized(timestamp, FIXATION_TOPIC, fixation.encode()?);
        Ok(())
    }

    /// Decode every fixation entry, in file order.
    pub fn fixations(&self) -> Result<Vec<Fixation>, Error> {
        #[cfg(feature = "rayon")]
        let iter = self.entries.par_iter();
        #[cfg(not(feature = "rayon"))]
        let iter = self.entries.iter();

        let fixations = iter
            .filter(|entry| entry.topic == FIXATION_TOPIC)
            .map(|entry| entry.payload.decode())
            .collect::<Result<Vec<_>, _>>()?;
        Ok(fixations)
    }

    /// Decode the fixations into a [`FixationSet`].
    ///
    /// Entry timestamps become the start timestamps of the fixations.
    pub fn fixation_set(&self, stop_timestamps: Vec<f64>) -> Result<FixationSet, Error> {
        let start_timestamps = self
            .entries
            .iter()
            .filter(|entry| entry.topic == FIXATION_TOPIC)
            .map(|entry| entry.timestamp)
            .collect();
        FixationSet::new(self.fixations()?, start_timestamps, stop_timestamps)
    }
}

/// Collects entries and writes them out as a store when finished.
///
/// Nothing touches the disk until [`StoreWriter::finish`] is called, at which
/// point the previous contents of the store are fully replaced.
#[derive(Debug)]
pub struct StoreWriter {
    path: PathBuf,
    meta: MetaInfo,
    entries: Vec<StoreEntry>,
    options: WriteOptions,
}

impl StoreWriter {
    /// Start writing the store `name` in `dir`, with a default header.
    pub fn create(dir: impl AsRef<Path>, name: &str, options: &WriteOptions) -> Self {
        StoreWriter {
            path: RecordStore::path(dir, name),
            meta: MetaInfo::default(),
            entries: Vec::new(),
            options: options.clone(),
        }
    }

    /// Builder-style method to set the header that is written out.
    pub fn meta(mut self, meta: MetaInfo) -> Self {
        self.meta = meta;
        self
    }

    /// Append an already serialized record.
    pub fn append_serialized(&mut self, timestamp: f64, topic: &str, payload: SerializedFixation) {
        self.entries.push(StoreEntry { timestamp, topic: topic.to_owned(), payload });
    }

    /// The number of entries appended so far.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// `true` if nothing has been appended yet.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Write all appended entries to disk.
    pub fn finish(self) -> Result<(), Error> {
        save_entries(&self.path, &self.meta, &self.entries, &self.options)?;
        log::debug!("wrote {} entries to '{}'", self.entries.len(), self.path.display());
        Ok(())
    }
}

fn save_entries(
    path: &Path,
    meta: &MetaInfo,
    entries: &[StoreEntry],
    options: &WriteOptions,
) -> Result<(), Error> {
    let file = StoreFileRef { meta, entries };
    write::write_plist_to_file(path, &file, options)
        .map_err(|source| Error::StoreWrite { path: path.to_owned(), source })
}

fn stop_timestamps_path(dir: &Path, name: &str) -> PathBuf {
    dir.join(format!("{}{}.{}", name, STOP_TIMESTAMPS_SUFFIX, STORE_EXTENSION))
}

/// Load the stop timestamps that belong to the store `name` in `dir`.
pub fn load_stop_timestamps(dir: impl AsRef<Path>, name: &str) -> Result<Vec<f64>, Error> {
    let path = stop_timestamps_path(dir.as_ref(), name);
    if !path.exists() {
        return Err(Error::MissingStore(path));
    }
    plist::from_file(&path).map_err(|source| Error::StoreLoad { path, source })
}

/// Write the stop timestamps that belong to the store `name` in `dir`.
pub fn save_stop_timestamps(
    dir: impl AsRef<Path>,
    name: &str,
    timestamps: &[f64],
    options: &WriteOptions,
) -> Result<(), Error> {
    let path = stop_timestamps_path(dir.as_ref(), name);
    write::write_plist_to_file(&path, &timestamps, options)
        .map_err(|source| Error::StoreWrite { path, source })
}

/// (De)serializes payloads as plist `<data>`.
mod payload_bytes {
    use std::fmt;

    use serde::de::{self, Deserializer, SeqAccess, Visitor};
    use serde::ser::Serializer;

    use crate::fixation::SerializedFixation;

    pub(super) fn serialize<S: Serializer>(
        payload: &SerializedFixation,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_bytes(payload.as_bytes())
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<SerializedFixation, D::Error> {
        deserializer.deserialize_byte_buf(PayloadVisitor)
    }

    struct PayloadVisitor;

    impl<'de> Visitor<'de> for PayloadVisitor {
        type Value = SerializedFixation;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("record data")
        }

        fn visit_bytes<E: de::Error>(self, v: &[u8]) -> Result<Self::Value, E> {
            Ok(SerializedFixation::from_bytes(v))
        }

        fn visit_byte_buf<E: de::Error>(self, v: Vec<u8>) -> Result<Self::Value, E> {
            Ok(SerializedFixation::from_bytes(v))
        }

        fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
            let mut bytes = Vec::with_capacity(seq.size_hint().unwrap_or(0));
            while let Some(byte) = seq.next_element::<u8>()? {
                bytes.push(byte);
            }
            Ok(SerializedFixation::from_bytes(bytes))
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_test::{assert_tokens, Token};

    use super::*;
    use crate::write::PlistFormat;
    use crate::NormPos;

    fn sample_store() -> RecordStore {
        let mut store = RecordStore::new();
        for id in 0..3u64 {
            let fixation = Fixation::new(id, NormPos::new(0.1 * id as f64, 0.5), 0.9);
            store.push(10.0 + id as f64, &fixation).unwrap();
        }
        store
    }

    #[test]
    fn entry_tokens() {
        let entry = StoreEntry {
            timestamp: 1.5,
            topic: "fixation".into(),
            payload: SerializedFixation::from_bytes(vec![1, 2, 3]),
        };
        assert_tokens(
            &entry,
            &[
                Token::Struct { name: "StoreEntry", len: 3 },
                Token::Str("timestamp"),
                Token::F64(1.5),
                Token::Str("topic"),
                Token::Str("fixation"),
                Token::Str("payload"),
                Token::Bytes(&[1, 2, 3]),
                Token::StructEnd,
            ],
        );
    }

    #[test]
    fn save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = sample_store();
        store.save(&dir, FIXATIONS, &WriteOptions::default()).unwrap();

        let loaded = RecordStore::load(&dir, FIXATIONS).unwrap();
        assert_eq!(loaded, store);
        assert_eq!(loaded.timestamps(), vec![10.0, 11.0, 12.0]);
        assert_eq!(loaded.meta().format_version, FormatVersion::V1);

        let ids: Vec<_> = loaded.fixations().unwrap().iter().map(|f| f.id).collect();
        assert_eq!(ids, vec![0, 1, 2]);
    }

    #[test]
    fn save_and_load_xml() {
        let dir = tempfile::tempdir().unwrap();
        let store = sample_store();
        let options = WriteOptions::default().format(PlistFormat::Xml);
        store.save(&dir, FIXATIONS, &options).unwrap();

        let text = std::fs::read_to_string(RecordStore::path(&dir, FIXATIONS)).unwrap();
        assert!(text.contains("<key>formatVersion</key>"));
        assert_eq!(RecordStore::load(&dir, FIXATIONS).unwrap(), store);
    }

    #[test]
    fn header_survives_save() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = sample_store();
        let meta =
            MetaInfo { creator: Some("pupil_player".into()), format_version: FormatVersion::V1 };
        store.set_meta(meta.clone());
        store.save(&dir, FIXATIONS, &WriteOptions::default()).unwrap();

        let loaded = RecordStore::load(&dir, FIXATIONS).unwrap();
        assert_eq!(loaded.meta(), &meta);

        let writer = StoreWriter::create(&dir, FIXATIONS, &WriteOptions::default());
        writer.meta(loaded.meta().clone()).finish().unwrap();
        assert_eq!(RecordStore::load(&dir, FIXATIONS).unwrap().meta(), &meta);

        StoreWriter::create(&dir, FIXATIONS, &WriteOptions::default()).finish().unwrap();
        let creator = RecordStore::load(&dir, FIXATIONS).unwrap().meta().creator.clone();
        assert_eq!(creator.as_deref(), Some(DEFAULT_CREATOR));
    }

    #[test]
    fn missing_store() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(RecordStore::load(&dir, FIXATIONS), Err(Error::MissingStore(_))));
        assert!(matches!(load_stop_timestamps(&dir, FIXATIONS), Err(Error::MissingStore(_))));
    }

    #[test]
    fn malformed_store() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(RecordStore::path(&dir, FIXATIONS), b"bplist00garbage").unwrap();
        assert!(matches!(RecordStore::load(&dir, FIXATIONS), Err(Error::StoreLoad { .. })));
    }

    #[test]
    fn writer_replaces_previous_contents() {
        let dir = tempfile::tempdir().unwrap();
        sample_store().save(&dir, FIXATIONS, &WriteOptions::default()).unwrap();

        let mut writer = StoreWriter::create(&dir, FIXATIONS, &WriteOptions::default());
        let fixation = Fixation::new(9, NormPos::new(0.2, 0.2), 1.0);
        writer.append_serialized(3.0, FIXATION_TOPIC, fixation.encode().unwrap());
        assert_eq!(writer.len(), 1);
        writer.finish().unwrap();

        let loaded = RecordStore::load(&dir, FIXATIONS).unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded.fixations().unwrap(), vec![fixation]);
    }

    #[test]
    fn stop_timestamps_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        save_stop_timestamps(&dir, FIXATIONS, &[10.2, 11.3], &WriteOptions::default()).unwrap();
        assert_eq!(load_stop_timestamps(&dir, FIXATIONS).unwrap(), vec![10.2, 11.3]);
    }

    #[test]
    fn fixation_set_from_store() {
        let mut store = sample_store();
        store.push_serialized(10.5, "annotation", SerializedFixation::from_bytes(vec![0]));

        let set = store.fixation_set(vec![10.4, 11.4, 12.4]).unwrap();
        assert_eq!(set.len(), 3);
        assert_eq!(set.start_timestamps(), &[10.0, 11.0, 12.0]);
        assert!(store.fixation_set(vec![10.4]).is_err());
    }
}
