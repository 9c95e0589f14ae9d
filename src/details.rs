use crate::locale::Labels;
use crate::rank::GroupBy;
use crate::record::PlayEvent;
use std::borrow::Borrow;
use std::collections::HashMap;

/// The individual plays behind one ranked entry or song.
#[derive(Debug, Clone, PartialEq)]
pub struct ListeningDetails<'a> {
    /// In input order.
    pub records: Vec<&'a PlayEvent>,

    /// Longest single play of each track URI among `records`. A play's completion is measured
    /// against this, since the export carries no track lengths.
    pub max_ms_by_uri: HashMap<String, u64>,
}

impl<'a> ListeningDetails<'a> {
    fn new(records: Vec<&'a PlayEvent>) -> Self {
        let mut max_ms_by_uri = HashMap::<String, u64>::new();
        for record in &records {
            let max = max_ms_by_uri.entry(record.track_uri.clone()).or_default();
            *max = (*max).max(record.ms_played);
        }
        Self { records, max_ms_by_uri }
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// How much of its track's longest play `record` covered, in percent.
    pub fn completion_percent(&self, record: &PlayEvent) -> Option<f64> {
        self.max_ms_by_uri.get(&record.track_uri)
            .and_then(|&max| completion_percent(record.ms_played, max))
    }
}

/// `ms` as a percentage of `max_ms`, or `None` when there is nothing to compare against.
pub fn completion_percent(ms: u64, max_ms: u64) -> Option<f64> {
    if max_ms == 0 {
        return None;
    }
    Some(ms as f64 / max_ms as f64 * 100.0)
}

/// The records that make up the ranked entry `key` of a `group_by` ranking. A record belongs to
/// the entry exactly when ranking would have put it there.
pub fn listening_details<'a, R: Borrow<PlayEvent>>(
    records: &'a [R],
    group_by: GroupBy,
    key: &str,
    labels: &Labels,
) -> ListeningDetails<'a> {
    ListeningDetails::new(records.iter()
        .map(Borrow::borrow)
        .filter(|x| group_by.key(x, labels) == key)
        .collect())
}

/// The plays of one song by one artist, as opened from an artist's song list.
pub fn song_details<'a, R: Borrow<PlayEvent>>(records: &'a [R], artist: &str, song: &str) -> ListeningDetails<'a> {
    ListeningDetails::new(records.iter()
        .map(Borrow::borrow)
        .filter(|x| x.artist_name == artist && x.track_name == song)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locale::Locale;
    use crate::rank::{rank, Limit, Metric};
    use crate::record::normalize;
    use serde_json::{json, Value};

    fn labels() -> &'static Labels {
        Locale::ZhTw.labels()
    }

    fn events(raw: Value) -> Vec<PlayEvent> {
        raw.as_array().unwrap().iter().map(|x| normalize(x, labels())).collect()
    }

    fn sample() -> Vec<PlayEvent> {
        events(json!([
            { "ts": "1", "master_metadata_track_name": "A", "master_metadata_album_artist_name": "X", "spotify_track_uri": "u:a", "ms_played": 1000, "skipped": true },
            { "ts": "2", "master_metadata_track_name": "A", "master_metadata_album_artist_name": "Y", "spotify_track_uri": "u:a2", "ms_played": 700 },
            { "ts": "3", "master_metadata_track_name": "A", "master_metadata_album_artist_name": "X", "spotify_track_uri": "u:a", "ms_played": 4000, "skipped": false },
            { "ts": "4", "master_metadata_album_artist_name": "X", "spotify_track_uri": "u:z", "ms_played": 10 },
        ]))
    }

    #[test]
    fn matches_composite_keys_on_both_parts() {
        let records = sample();
        let details = listening_details(&records, GroupBy::TrackArtist, "A - X", labels());
        let ts: Vec<&str> = details.records.iter().map(|x| x.timestamp.as_str()).collect();
        assert_eq!(ts, ["1", "3"]);
        assert_eq!(details.max_ms_by_uri["u:a"], 4000);
        assert_eq!(details.completion_percent(details.records[0]), Some(25.0));
    }

    #[test]
    fn details_agree_with_ranking_counts() {
        let records = sample();
        for group_by in GroupBy::ALL {
            for entry in rank(&records, group_by, Limit::All, Metric::Count, labels()) {
                let details = listening_details(&records, group_by, &entry.key, labels());
                assert_eq!(details.records.len() as u64, entry.count, "{group_by} {}", entry.key);
            }
        }
    }

    #[test]
    fn tri_state_details_use_labels() {
        let records = sample();
        assert_eq!(listening_details(&records, GroupBy::Skipped, "是", labels()).records.len(), 1);
        assert_eq!(listening_details(&records, GroupBy::Skipped, "未知", labels()).records.len(), 2);
    }

    #[test]
    fn total_duration_uri_keys_match_on_uri() {
        let records = sample();
        let details = listening_details(&records, GroupBy::TotalDuration, "u:z", labels());
        assert_eq!(details.records.len(), 1);
        assert_eq!(details.records[0].timestamp, "4");
    }

    #[test]
    fn song_details_filter_on_artist_and_song() {
        let records = sample();
        let details = song_details(&records, "Y", "A");
        assert_eq!(details.records.len(), 1);
        assert!(song_details(&records, "Z", "A").is_empty());
    }

    #[test]
    fn completion_needs_a_positive_maximum() {
        assert_eq!(completion_percent(0, 0), None);
        assert_eq!(completion_percent(50, 200), Some(25.0));
    }
}
