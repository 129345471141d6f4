//! Fixation records and their serialized form.

use std::io::Cursor;

use plist::Value;

use crate::error::RecordError;
use crate::shared_types::{NormPos, Offset, Plist};

static ID_KEY: &str = "id";
static NORM_POS_KEY: &str = "norm_pos";
static CONFIDENCE_KEY: &str = "confidence";

/// The topic under which fixations are stored.
pub static FIXATION_TOPIC: &str = "fixation";

/// A detected period of steady gaze.
///
/// Only the fields needed for correcting a fixation are exposed directly; all
/// other fields of the underlying record (timestamps, duration, dispersion and
/// so on) are carried along untouched, in their original order, and written
/// back out by [`Fixation::encode`].
#[derive(Debug, Clone)]
pub struct Fixation {
    /// Identifier of the fixation, stable across a recording.
    pub id: u64,
    /// Position of the fixation in normalized frame coordinates.
    pub norm_pos: NormPos,
    /// Detection confidence.
    pub confidence: f64,
    fields: Plist,
}

impl Fixation {
    /// Returns a new fixation with no additional fields.
    pub fn new(id: u64, norm_pos: NormPos, confidence: f64) -> Self {
        Fixation { id, norm_pos, confidence, fields: Plist::new() }
    }

    /// Attempt to build a `Fixation` from a decoded record dictionary.
    pub fn from_dictionary(fields: Plist) -> Result<Self, RecordError> {
        let id = match fields.get(ID_KEY) {
            Some(value) => value.as_unsigned_integer().ok_or(RecordError::InvalidField(ID_KEY))?,
            None => return Err(RecordError::MissingField(ID_KEY)),
        };
        let norm_pos = match fields.get(NORM_POS_KEY) {
            Some(value) => parse_norm_pos(value).ok_or(RecordError::InvalidField(NORM_POS_KEY))?,
            None => return Err(RecordError::MissingField(NORM_POS_KEY)),
        };
        let confidence = match fields.get(CONFIDENCE_KEY) {
            Some(value) => as_number(value).ok_or(RecordError::InvalidField(CONFIDENCE_KEY))?,
            None => return Err(RecordError::MissingField(CONFIDENCE_KEY)),
        };
        Ok(Fixation { id, norm_pos, confidence, fields })
    }

    /// Returns the record dictionary, with the typed fields written back into it.
    ///
    /// Fields that were present when the record was decoded keep their position.
    pub fn to_dictionary(&self) -> Plist {
        let mut fields = self.fields.clone();
        fields.insert(ID_KEY.into(), Value::Integer(self.id.into()));
        fields.insert(
            NORM_POS_KEY.into(),
            Value::Array(vec![Value::Real(self.norm_pos.x), Value::Real(self.norm_pos.y)]),
        );
        fields.insert(CONFIDENCE_KEY.into(), Value::Real(self.confidence));
        fields
    }

    /// Returns a reference to the additional field `key`, if present.
    pub fn field(&self, key: &str) -> Option<&Value> {
        if is_typed_key(key) {
            return None;
        }
        self.fields.get(key)
    }

    /// Sets an additional field, returning the previous value.
    ///
    /// The typed fields (`id`, `norm_pos`, `confidence`) cannot be set this way;
    /// assign to the struct fields instead.
    pub fn set_field(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        let key = key.into();
        if is_typed_key(&key) {
            return None;
        }
        self.fields.insert(key, value)
    }

    /// Iterate over the additional fields, in record order.
    pub fn fields(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.fields.iter().filter(|(key, _)| !is_typed_key(key))
    }

    /// Returns a copy of this fixation moved by `offset`.
    pub fn corrected(&self, offset: Offset) -> Fixation {
        Fixation { norm_pos: self.norm_pos + offset, ..self.clone() }
    }

    /// Encode this fixation into its serialized form.
    pub fn encode(&self) -> Result<SerializedFixation, RecordError> {
        let mut buf = Vec::new();
        Value::Dictionary(self.to_dictionary()).to_writer_binary(&mut buf)?;
        Ok(SerializedFixation(buf))
    }
}

// the typed fields may be stale copies inside `fields`, so they are compared separately
impl PartialEq for Fixation {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.norm_pos == other.norm_pos
            && self.confidence == other.confidence
            && self.fields().eq(other.fields())
    }
}

/// The opaque, serialized form of a fixation record.
#[derive(Clone, PartialEq, Eq)]
pub struct SerializedFixation(Vec<u8>);

impl SerializedFixation {
    /// Wraps raw record bytes. They are not validated until [`decode`] is called.
    ///
    /// [`decode`]: SerializedFixation::decode
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        SerializedFixation(bytes.into())
    }

    /// The raw record bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Attempt to decode the record.
    pub fn decode(&self) -> Result<Fixation, RecordError> {
        let value = Value::from_reader(Cursor::new(&self.0))?;
        let fields = value.into_dictionary().ok_or(RecordError::NotADictionary)?;
        Fixation::from_dictionary(fields)
    }
}

impl std::fmt::Debug for SerializedFixation {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "SerializedFixation({} bytes)", self.0.len())
    }
}

fn is_typed_key(key: &str) -> bool {
    key == ID_KEY || key == NORM_POS_KEY || key == CONFIDENCE_KEY
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Real(v) => Some(*v),
        Value::Integer(i) => i.as_signed().map(|v| v as f64),
        _ => None,
    }
}

fn parse_norm_pos(value: &Value) -> Option<NormPos> {
    match value.as_array()?.as_slice() {
        [x, y] => Some(NormPos::new(as_number(x)?, as_number(y)?)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn detector_record() -> Plist {
        let mut dict = Plist::new();
        dict.insert("topic".into(), Value::String("fixations".into()));
        dict.insert("norm_pos".into(), Value::Array(vec![Value::Real(0.5), Value::Real(0.25)]));
        dict.insert("dispersion".into(), Value::Real(1.2));
        dict.insert("method".into(), Value::String("pupil".into()));
        dict.insert("base_data".into(), Value::Array(vec![]));
        dict.insert("timestamp".into(), Value::Real(1234.5));
        dict.insert("duration".into(), Value::Real(220.0));
        dict.insert("confidence".into(), Value::Real(0.92));
        dict.insert("id".into(), Value::Integer(7u64.into()));
        dict
    }

    #[test]
    fn decode_typed_fields() {
        let fixation = Fixation::from_dictionary(detector_record()).unwrap();
        assert_eq!(fixation.id, 7);
        assert_eq!(fixation.norm_pos, NormPos::new(0.5, 0.25));
        assert_eq!(fixation.confidence, 0.92);
        assert_eq!(fixation.field("method"), Some(&Value::String("pupil".into())));
        assert_eq!(fixation.field("id"), None);
    }

    #[test]
    fn integer_coordinates() {
        let mut dict = detector_record();
        let norm_pos = Value::Array(vec![Value::Integer(1u64.into()), Value::Real(0.0)]);
        dict.insert("norm_pos".into(), norm_pos);
        let fixation = Fixation::from_dictionary(dict).unwrap();
        assert_eq!(fixation.norm_pos, NormPos::new(1.0, 0.0));
    }

    #[test]
    fn missing_and_invalid_fields() {
        let mut dict = detector_record();
        dict.remove("id");
        assert!(matches!(Fixation::from_dictionary(dict), Err(RecordError::MissingField("id"))));

        let mut dict = detector_record();
        dict.insert("norm_pos".into(), Value::Array(vec![Value::Real(0.5)]));
        assert!(matches!(
            Fixation::from_dictionary(dict),
            Err(RecordError::InvalidField("norm_pos"))
        ));

        let mut dict = detector_record();
        dict.insert("id".into(), Value::Integer((-3i64).into()));
        assert!(matches!(Fixation::from_dictionary(dict), Err(RecordError::InvalidField("id"))));
    }

    #[test]
    fn correction_keeps_other_fields_in_order() {
        let original = Fixation::from_dictionary(detector_record()).unwrap();
        let corrected = original.corrected(Offset::new(0.01, -0.05)).encode().unwrap();
        let decoded = corrected.decode().unwrap();

        assert!((decoded.norm_pos.x - 0.51).abs() < 1e-12);
        assert!((decoded.norm_pos.y - 0.2).abs() < 1e-12);

        let keys: Vec<_> = decoded.to_dictionary().keys().cloned().collect();
        let expected: Vec<_> = detector_record().keys().cloned().collect();
        assert_eq!(keys, expected);
        assert_eq!(decoded.field("duration"), original.field("duration"));
    }

    #[test]
    fn untouched_fixation_round_trips() {
        let original = Fixation::from_dictionary(detector_record()).unwrap();
        let decoded = original.corrected(Offset::ZERO).encode().unwrap().decode().unwrap();
        assert_eq!(decoded, original);

        let plain = Fixation::new(3, NormPos::new(0.1, 0.9), 0.5);
        assert_eq!(plain.encode().unwrap().decode().unwrap(), plain);
    }

    #[test]
    fn decode_rejects_non_dictionaries() {
        let mut buf = Vec::new();
        Value::Array(vec![]).to_writer_binary(&mut buf).unwrap();
        let record = SerializedFixation::from_bytes(buf);
        assert!(matches!(record.decode(), Err(RecordError::NotADictionary)));

        let garbage = SerializedFixation::from_bytes(b"bplist00garbage".to_vec());
        assert!(matches!(garbage.decode(), Err(RecordError::Plist(_))));
    }
}
