use crate::collate;
use crate::error::QueryError;
use crate::locale::Labels;
use crate::record::PlayEvent;
use indexmap::IndexMap;
use log::warn;
use std::borrow::Borrow;
use std::fmt;

/// Separator of composite group keys, e.g. `"Song - Artist"`.
pub const KEY_SEPARATOR: &str = " - ";

/// The dimension records are grouped by when ranking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GroupBy {
    /// `"<track> - <artist>"`
    TrackArtist,
    /// `"<album> - <artist>"`
    AlbumArtist,
    Artist,
    Platform,
    Country,
    TrackUri,
    ReasonStart,
    ReasonEnd,
    Shuffle,
    Skipped,
    Offline,
    IncognitoMode,
    /// The most specific identity available per record: track+artist, then album+artist, then
    /// the track URI.
    TotalDuration,
}

impl GroupBy {
    pub const ALL: [GroupBy; 13] = [
        Self::TrackArtist,
        Self::Artist,
        Self::AlbumArtist,
        Self::Platform,
        Self::Country,
        Self::TrackUri,
        Self::ReasonStart,
        Self::ReasonEnd,
        Self::Shuffle,
        Self::Skipped,
        Self::Offline,
        Self::IncognitoMode,
        Self::TotalDuration,
    ];

    /// Short name accepted on the command line.
    pub fn selector(self) -> &'static str {
        match self {
            Self::TrackArtist => "track",
            Self::AlbumArtist => "album",
            Self::Artist => "artist",
            Self::Platform => "platform",
            Self::Country => "country",
            Self::TrackUri => "uri",
            Self::ReasonStart => "reason_start",
            Self::ReasonEnd => "reason_end",
            Self::Shuffle => "shuffle",
            Self::Skipped => "skipped",
            Self::Offline => "offline",
            Self::IncognitoMode => "incognito_mode",
            Self::TotalDuration => "total_duration",
        }
    }

    /// The history export field the grouping is named after. Also accepted by `from_str`.
    pub fn field_name(self) -> &'static str {
        match self {
            Self::TrackArtist => "master_metadata_track_name",
            Self::AlbumArtist => "master_metadata_album_album_name",
            Self::Artist => "master_metadata_album_artist_name",
            Self::Platform => "platform",
            Self::Country => "conn_country",
            Self::TrackUri => "spotify_track_uri",
            Self::ReasonStart => "reason_start",
            Self::ReasonEnd => "reason_end",
            Self::Shuffle => "shuffle",
            Self::Skipped => "skipped",
            Self::Offline => "offline",
            Self::IncognitoMode => "incognito_mode",
            Self::TotalDuration => "ms_played",
        }
    }

    /// Whether keys are `"<name> - <artist>"` pairs.
    pub fn is_composite(self) -> bool {
        matches!(self, Self::TrackArtist | Self::AlbumArtist)
    }

    /// Computes the group key of a record.
    pub fn key(self, event: &PlayEvent, labels: &Labels) -> String {
        if let Some((name, artist)) = self.parts(event, labels) {
            return composite(name, artist);
        }
        match self {
            Self::Artist => event.artist_name.clone(),
            Self::Platform => event.platform.clone(),
            Self::Country => event.conn_country.clone(),
            Self::ReasonStart => event.reason_start.clone(),
            Self::ReasonEnd => event.reason_end.clone(),
            Self::Shuffle => event.shuffle.label(labels).to_string(),
            Self::Skipped => event.skipped.label(labels).to_string(),
            Self::Offline => event.offline.label(labels).to_string(),
            Self::IncognitoMode => event.incognito_mode.label(labels).to_string(),
            // Composite groupings returned above, total duration without known names lands here
            Self::TrackArtist | Self::AlbumArtist | Self::TrackUri | Self::TotalDuration => event.track_uri.clone(),
        }
    }

    /// The name and artist a composite key of this record is built from, or `None` when the key
    /// is a single value.
    pub fn parts<'a>(self, event: &'a PlayEvent, labels: &Labels) -> Option<(&'a str, &'a str)> {
        match self {
            Self::TrackArtist => Some((event.track_name.as_str(), event.artist_name.as_str())),
            Self::AlbumArtist => Some((event.album_name.as_str(), event.artist_name.as_str())),
            Self::TotalDuration => {
                if event.has_known_track(labels) && event.has_known_artist(labels) {
                    Some((event.track_name.as_str(), event.artist_name.as_str()))
                } else if event.has_known_album(labels) && event.has_known_artist(labels) {
                    Some((event.album_name.as_str(), event.artist_name.as_str()))
                } else {
                    None
                }
            },
            _ => None,
        }
    }
}

impl fmt::Display for GroupBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.selector())
    }
}

impl std::str::FromStr for GroupBy {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_ascii_lowercase();
        Self::ALL.into_iter()
            .find(|x| x.selector() == needle || x.field_name() == needle)
            .ok_or_else(|| QueryError::InvalidRankingField(s.to_string()))
    }
}

/// Which accumulated value a ranking is ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Metric {
    #[default]
    Count,
    Duration,
    AvgDuration,
}

impl Metric {
    pub fn name(self) -> &'static str {
        match self {
            Self::Count => "count",
            Self::Duration => "duration",
            Self::AvgDuration => "avg_duration",
        }
    }

    /// Whether the primary value is a duration in milliseconds.
    pub fn is_duration(self) -> bool {
        !matches!(self, Self::Count)
    }
}

impl std::str::FromStr for Metric {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "count" => Ok(Self::Count),
            "duration" => Ok(Self::Duration),
            "avg_duration" | "avg" => Ok(Self::AvgDuration),
            _ => Err(QueryError::InvalidMetric(s.to_string())),
        }
    }
}

/// How many ranked entries to keep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Limit {
    #[default]
    All,
    Top(usize),
}

impl Limit {
    /// Parses `"all"` (any case) or a positive integer. Anything else falls back to `All` with a
    /// warning, it never aborts a ranking.
    pub fn parse(s: &str) -> Self {
        let s = s.trim();
        if s.eq_ignore_ascii_case("all") {
            return Self::All;
        }
        match s.parse::<i64>() {
            Ok(n) if n > 0 => Self::Top(usize::try_from(n).unwrap_or(usize::MAX)),
            _ => {
                warn!("Result limit must be a positive number or 'all', got '{}', showing all results", s);
                Self::All
            },
        }
    }

    fn apply<T>(self, items: &mut Vec<T>) {
        if let Self::Top(n) = self {
            items.truncate(n);
        }
    }
}

impl fmt::Display for Limit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("all"),
            Self::Top(n) => write!(f, "{}", n),
        }
    }
}

/// Play count and summed duration of a group of records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Tally {
    pub count: u64,
    pub total_ms: u64,
}

impl Tally {
    pub fn add(&mut self, ms: u64) {
        self.count += 1;
        self.total_ms = self.total_ms.saturating_add(ms);
    }

    pub fn avg_ms(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.total_ms as f64 / self.count as f64
        }
    }
}

/// One row of a ranking.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedEntry {
    pub key: String,
    /// The value selected by the ranking metric: a count, or milliseconds.
    pub primary: f64,
    pub total_ms: u64,
    pub count: u64,
    pub avg_ms: f64,
    /// Name and artist of a composite key, as they were when the key was built. Either part may
    /// itself contain `KEY_SEPARATOR`.
    pub parts: Option<(String, String)>,
}

impl RankedEntry {
    /// The name and artist of a composite key. Plain keys are returned whole, with no artist.
    pub fn name_and_artist(&self) -> (&str, Option<&str>) {
        match &self.parts {
            Some((name, artist)) => (name.as_str(), Some(artist.as_str())),
            None => (self.key.as_str(), None),
        }
    }
}

/// Groups, measures, sorts and truncates. Ties on the primary value are ordered by group key, so
/// the output order is fully determined by the input.
pub fn rank<R: Borrow<PlayEvent>>(
    records: &[R],
    group_by: GroupBy,
    limit: Limit,
    metric: Metric,
    labels: &Labels,
) -> Vec<RankedEntry> {
    let mut groups = IndexMap::<String, (Tally, Option<(String, String)>)>::new();
    for record in records {
        let record = record.borrow();
        groups.entry(group_by.key(record, labels))
            .or_insert_with(|| {
                let parts = group_by.parts(record, labels)
                    .map(|(name, artist)| (name.to_string(), artist.to_string()));
                (Tally::default(), parts)
            })
            .0
            .add(record.ms_played);
    }

    let mut ranked = groups.into_iter()
        .map(|(key, (tally, parts))| {
            let avg_ms = tally.avg_ms();
            let primary = match metric {
                Metric::Count => tally.count as f64,
                Metric::Duration => tally.total_ms as f64,
                Metric::AvgDuration => avg_ms,
            };
            RankedEntry { key, primary, total_ms: tally.total_ms, count: tally.count, avg_ms, parts }
        })
        .collect::<Vec<_>>();

    ranked.sort_by(|a, b| {
        b.primary.total_cmp(&a.primary)
            .then_with(|| collate::compare(&a.key, &b.key))
    });
    limit.apply(&mut ranked);
    ranked
}

/// Case-insensitive substring search over a ranking kept by the caller. An empty term matches
/// everything.
pub fn search_ranked<'a>(ranked: &'a [RankedEntry], term: &str) -> Vec<&'a RankedEntry> {
    let term = term.trim().to_lowercase();
    ranked.iter()
        .filter(|entry| term.is_empty() || entry.key.to_lowercase().contains(&term))
        .collect()
}

pub(crate) fn composite(name: &str, artist: &str) -> String {
    format!("{}{}{}", name, KEY_SEPARATOR, artist)
}
