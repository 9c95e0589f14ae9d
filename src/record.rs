use crate::date;
use crate::locale::Labels;
use chrono::NaiveDate;
use log::debug;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

/// Keys of the fields the engine understands. Everything else is carried along in
/// `PlayEvent::extra`.
const KNOWN_FIELDS: [&str; 14] = [
    "ts",
    "ms_played",
    "master_metadata_track_name",
    "master_metadata_album_artist_name",
    "master_metadata_album_album_name",
    "platform",
    "conn_country",
    "spotify_track_uri",
    "reason_start",
    "reason_end",
    "shuffle",
    "skipped",
    "offline",
    "incognito_mode",
];

/// A boolean flag that is only ever `True` or `False` when the source said so literally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TriState {
    True,
    False,
    #[default]
    Unknown,
}

impl TriState {
    fn from_value(value: Option<&Value>) -> Self {
        match value {
            Some(Value::Bool(true)) => Self::True,
            Some(Value::Bool(false)) => Self::False,
            _ => Self::Unknown,
        }
    }

    pub fn as_bool(self) -> Option<bool> {
        match self {
            Self::True => Some(true),
            Self::False => Some(false),
            Self::Unknown => None,
        }
    }

    /// The localized yes/no/unknown label, also used as the ranking group key.
    pub fn label(self, labels: &Labels) -> &'static str {
        match self {
            Self::True => labels.yes,
            Self::False => labels.no,
            Self::Unknown => labels.unknown,
        }
    }
}

impl Serialize for TriState {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.as_bool().serialize(serializer)
    }
}

/// One normalized play event. Every field is populated; missing values were replaced by the
/// locale's sentinels during `normalize`.
///
/// Serializes back to the export's own field names, so a serialized event can be fed through
/// `normalize` again and comes out unchanged.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayEvent {
    /// ISO-like date-time. The first 10 characters are the calendar date. May be empty or
    /// garbage, in which case the event takes no part in date-based operations.
    #[serde(rename = "ts")]
    pub timestamp: String,

    /// Milliseconds played.
    pub ms_played: u64,

    #[serde(rename = "master_metadata_track_name")]
    pub track_name: String,

    #[serde(rename = "master_metadata_album_artist_name")]
    pub artist_name: String,

    #[serde(rename = "master_metadata_album_album_name")]
    pub album_name: String,

    pub platform: String,

    pub conn_country: String,

    /// Track URI, e.g. `spotify:track:...`.
    #[serde(rename = "spotify_track_uri")]
    pub track_uri: String,

    pub reason_start: String,

    pub reason_end: String,

    pub shuffle: TriState,

    pub skipped: TriState,

    pub offline: TriState,

    pub incognito_mode: TriState,

    /// Fields the engine does not use, preserved as they came.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl PlayEvent {
    /// The calendar date of the event, if its timestamp starts with a valid `YYYY-MM-DD`.
    pub fn date(&self) -> Option<NaiveDate> {
        date::record_date(&self.timestamp)
    }

    /// The `YYYY-MM` month key of the event, if its timestamp parses.
    pub fn month_key(&self) -> Option<String> {
        date::month_key(&self.timestamp)
    }

    pub fn has_known_track(&self, labels: &Labels) -> bool {
        self.track_name != labels.unknown_track
    }

    pub fn has_known_artist(&self, labels: &Labels) -> bool {
        self.artist_name != labels.unknown_artist
    }

    pub fn has_known_album(&self, labels: &Labels) -> bool {
        self.album_name != labels.unknown_album
    }
}

/// Converts one decoded JSON element into a `PlayEvent`. Never fails: anything unusable is
/// replaced by a default, and a non-object produces an all-default event.
pub fn normalize(raw: &Value, labels: &Labels) -> PlayEvent {
    let empty = Map::new();
    let obj = match raw.as_object() {
        Some(obj) => obj,
        None => {
            debug!("Play event is not a JSON object ({}), using defaults", kind_of(raw));
            &empty
        },
    };

    let timestamp = match obj.get("ts") {
        Some(Value::String(s)) => s.clone(),
        _ => String::new(),
    };

    let extra = obj.iter()
        .filter(|(k, _)| !KNOWN_FIELDS.contains(&k.as_str()))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();

    PlayEvent {
        timestamp,
        ms_played: coerce_ms(obj.get("ms_played")),
        track_name: text_or(obj, "master_metadata_track_name", labels.unknown_track),
        artist_name: text_or(obj, "master_metadata_album_artist_name", labels.unknown_artist),
        album_name: text_or(obj, "master_metadata_album_album_name", labels.unknown_album),
        platform: text_or(obj, "platform", labels.unknown_platform),
        conn_country: text_or(obj, "conn_country", labels.unknown_country),
        track_uri: text_or(obj, "spotify_track_uri", labels.unknown_uri),
        reason_start: text_or(obj, "reason_start", labels.unknown),
        reason_end: text_or(obj, "reason_end", labels.unknown),
        shuffle: TriState::from_value(obj.get("shuffle")),
        skipped: TriState::from_value(obj.get("skipped")),
        offline: TriState::from_value(obj.get("offline")),
        incognito_mode: TriState::from_value(obj.get("incognito_mode")),
        extra,
    }
}

/// Numbers are floored and clamped at zero, all-digit strings are parsed, anything else is 0.
fn coerce_ms(value: Option<&Value>) -> u64 {
    match value {
        Some(Value::Number(n)) => {
            if let Some(ms) = n.as_u64() {
                ms
            } else {
                match n.as_f64() {
                    Some(f) if f.is_finite() && f > 0.0 => f.floor() as u64,
                    _ => 0,
                }
            }
        },
        Some(Value::String(s)) if !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) => {
            s.parse().unwrap_or(0)
        },
        _ => 0,
    }
}

fn text_or(obj: &Map<String, Value>, key: &str, sentinel: &str) -> String {
    match obj.get(key) {
        Some(Value::String(s)) if !s.is_empty() => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => sentinel.to_string(),
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
