use crate::duration::format_ms;
use crate::error::QueryError;
use crate::locale::Labels;
use crate::rank::{rank, GroupBy, Limit, Metric};
use crate::record::PlayEvent;
use log::warn;
use std::borrow::Borrow;
use std::collections::BTreeMap;
use std::fmt;

/// Number of songs or artists listed per month when no usable count was given.
pub const DEFAULT_TOP_N: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrendKind {
    MonthlyTotalDuration,
    MonthlyTopSongs,
    MonthlyTopArtists,
}

impl TrendKind {
    pub fn name(self) -> &'static str {
        match self {
            Self::MonthlyTotalDuration => "monthly_total_duration",
            Self::MonthlyTopSongs => "monthly_top_songs",
            Self::MonthlyTopArtists => "monthly_top_artists",
        }
    }

    /// Parses a trend selector where `none` (or nothing) means plain ranking.
    pub fn parse_selector(s: &str) -> Result<Option<Self>, QueryError> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "none" => Ok(None),
            _ => s.parse().map(Some),
        }
    }
}

impl fmt::Display for TrendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for TrendKind {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "monthly_total_duration" | "duration" => Ok(Self::MonthlyTotalDuration),
            "monthly_top_songs" | "songs" => Ok(Self::MonthlyTopSongs),
            "monthly_top_artists" | "artists" => Ok(Self::MonthlyTopArtists),
            _ => Err(QueryError::InvalidTrendKind(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrendPayload {
    /// Total listening time of the month.
    Duration { formatted: String, total_ms: u64 },
    /// `"; "`-joined top entries of the month.
    Summary(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrendPoint {
    /// `YYYY-MM`
    pub month: String,
    pub payload: TrendPayload,
}

/// Interprets the per-month entry count. Zero or garbage means `DEFAULT_TOP_N`; a negative
/// number is handed to the ranking limit rules, which list everything.
pub fn top_n_limit(s: &str) -> Limit {
    match s.trim().parse::<i64>() {
        Ok(0) | Err(_) => Limit::Top(DEFAULT_TOP_N),
        Ok(n) => Limit::parse(&n.to_string()),
    }
}

/// Buckets records by the month of their timestamp and summarizes each month. Months come out in
/// ascending order; records whose timestamp does not parse are left out of every month.
pub fn analyze_trend<R: Borrow<PlayEvent>>(
    records: &[R],
    kind: TrendKind,
    top_n: Limit,
    labels: &Labels,
) -> Vec<TrendPoint> {
    let mut months = BTreeMap::<String, Vec<&PlayEvent>>::new();
    for record in records {
        let record = record.borrow();
        match record.month_key() {
            Some(month) => months.entry(month).or_default().push(record),
            None => warn!("Skipping record with invalid timestamp '{}' in trend analysis", record.timestamp),
        }
    }

    months.into_iter()
        .map(|(month, bucket)| {
            let payload = match kind {
                TrendKind::MonthlyTotalDuration => {
                    let total_ms = bucket.iter().map(|x| x.ms_played).fold(0u64, u64::saturating_add);
                    TrendPayload::Duration { formatted: format_ms(total_ms), total_ms }
                },
                TrendKind::MonthlyTopSongs => {
                    let summary = rank(&bucket, GroupBy::TrackArtist, top_n, Metric::Count, labels)
                        .iter()
                        .map(|entry| {
                            let (song, artist) = entry.name_and_artist();
                            format!("{} ({}) - {}", song, artist.unwrap_or_default(), labels.plays(entry.count))
                        })
                        .collect::<Vec<_>>()
                        .join("; ");
                    TrendPayload::Summary(summary)
                },
                TrendKind::MonthlyTopArtists => {
                    let summary = rank(&bucket, GroupBy::Artist, top_n, Metric::Count, labels)
                        .iter()
                        .map(|entry| format!("{} - {}", entry.key, labels.plays(entry.count)))
                        .collect::<Vec<_>>()
                        .join("; ");
                    TrendPayload::Summary(summary)
                },
            };
            TrendPoint { month, payload }
        })
        .collect()
}
