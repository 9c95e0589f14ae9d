use crate::locale::Labels;
use crate::rank::{rank, GroupBy, Limit, Metric};
use crate::record::PlayEvent;
use chrono::NaiveDate;
use indexmap::IndexMap;
use log::debug;
use std::borrow::Borrow;
use std::collections::HashSet;

/// Number of songs and artists listed in a recap.
const RECAP_TOP: usize = 5;

/// How many of the most played songs count as "already familiar" when none is configured.
pub const DEFAULT_FAMILIAR_THRESHOLD: usize = 300;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecapSong {
    /// 1-based.
    pub rank: usize,
    pub song: String,
    pub artist: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecapArtist {
    /// 1-based.
    pub rank: usize,
    pub name: String,
    pub count: u64,
}

/// Headline numbers of a listening period.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recap {
    pub total_ms: u64,
    pub total_plays: u64,
    /// The day with the most listening time and that time. The earliest such day in input order
    /// wins a tie. Plays without a valid date count towards the totals only.
    pub biggest_day: Option<(NaiveDate, u64)>,
    pub top_songs: Vec<RecapSong>,
    pub top_artists: Vec<RecapArtist>,
}

pub fn recap<R: Borrow<PlayEvent>>(records: &[R], labels: &Labels) -> Recap {
    let mut total_ms = 0u64;
    let mut daily = IndexMap::<NaiveDate, u64>::new();
    for record in records {
        let record = record.borrow();
        total_ms = total_ms.saturating_add(record.ms_played);
        let Some(day) = record.date() else {
            debug!("Record with invalid timestamp '{}' has no day in the recap", record.timestamp);
            continue;
        };
        let ms = daily.entry(day).or_default();
        *ms = ms.saturating_add(record.ms_played);
    }

    let mut biggest_day: Option<(NaiveDate, u64)> = None;
    for (day, ms) in daily {
        if ms > biggest_day.map_or(0, |x| x.1) {
            biggest_day = Some((day, ms));
        }
    }

    let top_songs = rank(records, GroupBy::TrackArtist, Limit::Top(RECAP_TOP), Metric::Count, labels)
        .into_iter()
        .enumerate()
        .map(|(i, entry)| {
            let (song, artist) = entry.name_and_artist();
            RecapSong {
                rank: i + 1,
                song: song.to_string(),
                artist: artist.unwrap_or_default().to_string(),
                count: entry.count,
            }
        })
        .collect();

    let top_artists = rank(records, GroupBy::Artist, Limit::Top(RECAP_TOP), Metric::Count, labels)
        .into_iter()
        .enumerate()
        .map(|(i, entry)| RecapArtist { rank: i + 1, name: entry.key, count: entry.count })
        .collect();

    Recap {
        total_ms,
        total_plays: records.len() as u64,
        biggest_day,
        top_songs,
        top_artists,
    }
}

/// The `"<track> - <artist>"` keys of the `threshold` most played songs. Recommendations of
/// "unheard" music leave these out.
pub fn familiar_tracks<R: Borrow<PlayEvent>>(records: &[R], threshold: usize, labels: &Labels) -> HashSet<String> {
    if threshold == 0 {
        return HashSet::new();
    }
    rank(records, GroupBy::TrackArtist, Limit::Top(threshold), Metric::Count, labels)
        .into_iter()
        .map(|x| x.key)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locale::Locale;
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
            { "ts": "2023-01-02T10:00:00Z", "master_metadata_track_name": "A", "master_metadata_album_artist_name": "X", "ms_played": 60000 },
            { "ts": "2023-01-02T11:00:00Z", "master_metadata_track_name": "A", "master_metadata_album_artist_name": "X", "ms_played": 60000 },
            { "ts": "2023-01-03T10:00:00Z", "master_metadata_track_name": "B", "master_metadata_album_artist_name": "Y", "ms_played": 120000 },
            { "ts": "2023-01-04T10:00:00Z", "master_metadata_track_name": "C", "master_metadata_album_artist_name": "Y", "ms_played": 1000 },
        ]))
    }

    #[test]
    fn summarizes_period() {
        let recap = recap(&sample(), labels());
        assert_eq!(recap.total_ms, 241000);
        assert_eq!(recap.total_plays, 4);
        // 2023-01-02 and 2023-01-03 tie at two minutes, the earlier one wins
        assert_eq!(recap.biggest_day, Some((NaiveDate::from_ymd_opt(2023, 1, 2).unwrap(), 120000)));
        assert_eq!(recap.top_songs[0], RecapSong { rank: 1, song: "A".into(), artist: "X".into(), count: 2 });
        assert_eq!(recap.top_songs.len(), 3);
        let artists: Vec<(usize, &str, u64)> = recap.top_artists.iter().map(|x| (x.rank, x.name.as_str(), x.count)).collect();
        assert_eq!(artists, [(1, "X", 2), (2, "Y", 2)]);
    }

    #[test]
    fn undated_plays_never_make_the_biggest_day() {
        let records = events(json!([
            { "ts": "", "ms_played": 9000 },
            { "ms_played": 9000 },
            { "ts": "garbage", "ms_played": 9000 },
            { "ts": "2023-05-01T10:00:00Z", "ms_played": 10 },
        ]));
        let recap = recap(&records, labels());
        assert_eq!(recap.total_ms, 27010);
        assert_eq!(recap.biggest_day, Some((NaiveDate::from_ymd_opt(2023, 5, 1).unwrap(), 10)));

        let undated = events(json!([{ "ts": "", "ms_played": 9000 }]));
        assert_eq!(super::recap(&undated, labels()).biggest_day, None);
    }

    #[test]
    fn top_songs_keep_artist_when_title_has_separator() {
        let records = events(json!([
            { "ts": "2023-01-02T10:00:00Z", "master_metadata_track_name": "Help! - Remastered 2009", "master_metadata_album_artist_name": "The Beatles" },
        ]));
        let recap = recap(&records, labels());
        assert_eq!(recap.top_songs[0].song, "Help! - Remastered 2009");
        assert_eq!(recap.top_songs[0].artist, "The Beatles");
    }

    #[test]
    fn empty_period_has_no_biggest_day() {
        let records: Vec<PlayEvent> = Vec::new();
        let recap = recap(&records, labels());
        assert_eq!(recap.total_ms, 0);
        assert_eq!(recap.biggest_day, None);
        assert!(recap.top_songs.is_empty());
    }

    #[test]
    fn familiar_tracks_are_the_most_played() {
        let records = sample();
        let familiar = familiar_tracks(&records, 1, labels());
        assert_eq!(familiar, HashSet::from(["A - X".to_string()]));
        assert_eq!(familiar_tracks(&records, DEFAULT_FAMILIAR_THRESHOLD, labels()).len(), 3);
        assert!(familiar_tracks(&records, 0, labels()).is_empty());
    }
}
