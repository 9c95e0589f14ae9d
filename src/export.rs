//! CSV output of rankings, trends and listening details.
//!
//! Files start with a UTF-8 byte-order mark and quote every cell, so spreadsheet programs open
//! them with the right encoding regardless of the names inside.

use crate::date::DateRange;
use crate::details::ListeningDetails;
use crate::duration::{format_ms, format_ms_f64};
use crate::locale::Labels;
use crate::rank::{GroupBy, Metric, RankedEntry};
use crate::record::TriState;
use crate::trend::{TrendKind, TrendPayload, TrendPoint};
use anyhow::Result;
use csv::{QuoteStyle, Terminator, WriterBuilder};
use std::io::Write;

const BOM: &[u8] = b"\xEF\xBB\xBF";
const NOT_AVAILABLE: &str = "N/A";

fn writer<W: Write>(mut out: W) -> Result<csv::Writer<W>> {
    out.write_all(BOM)?;
    Ok(WriterBuilder::new()
        .quote_style(QuoteStyle::Always)
        .terminator(Terminator::Any(b'\n'))
        // The header row gains a cell when a date range is active
        .flexible(true)
        .from_writer(out))
}

fn with_range(mut header: Vec<String>, range: Option<&DateRange>) -> Vec<String> {
    if let Some(range) = range {
        header.push(format!("Date range: {} to {}", range.start().format("%Y%m%d"), range.end().format("%Y%m%d")));
    }
    header
}

fn range_suffix(range: Option<&DateRange>) -> String {
    match range {
        Some(range) => format!("_{}", range.label()),
        None => String::new(),
    }
}

/// Default file name of an exported ranking, e.g. `artist_ranking_20230101-20230131.csv`.
pub fn ranking_file_name(group_by: GroupBy, range: Option<&DateRange>) -> String {
    let prefix = match group_by {
        GroupBy::TrackArtist => "song_artist_ranking".to_string(),
        GroupBy::AlbumArtist => "album_artist_ranking".to_string(),
        GroupBy::Artist => "artist_ranking".to_string(),
        GroupBy::TrackUri => "track_uri_ranking".to_string(),
        GroupBy::TotalDuration => "total_duration_ranking".to_string(),
        other => format!("{}_ranking", other.selector()),
    };
    format!("{}{}.csv", prefix, range_suffix(range))
}

/// Default file name of an exported trend, e.g. `monthly_top_songs.csv`.
pub fn trend_file_name(kind: TrendKind, range: Option<&DateRange>) -> String {
    format!("{}{}.csv", kind.name(), range_suffix(range))
}

/// Default file name of exported listening details. Keeps letters (any script), digits,
/// whitespace, `-` and `_` of the title.
pub fn details_file_name(title: &str) -> String {
    let title = title.chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace() || *c == '-' || *c == '_')
        .collect::<String>();
    format!("{}_details.csv", title.trim())
}

/// Writes a ranking with a 1-based rank column. Composite keys are split into a name and an
/// artist column.
pub fn write_ranking<W: Write>(
    out: W,
    entries: &[RankedEntry],
    group_by: GroupBy,
    metric: Metric,
    range: Option<&DateRange>,
) -> Result<()> {
    let metric_header = match metric {
        Metric::Count => "Count",
        Metric::Duration => "Total Duration",
        Metric::AvgDuration => "Avg Duration",
    };
    let mut header = vec![String::from("Rank")];
    match group_by {
        GroupBy::TrackArtist => header.extend(["Song", "Artist"].map(String::from)),
        GroupBy::AlbumArtist => header.extend(["Album", "Artist"].map(String::from)),
        GroupBy::TrackUri => header.push(String::from("Track URI")),
        GroupBy::Artist => header.push(String::from("Artist")),
        GroupBy::TotalDuration => header.push(String::from("Song/Album/URI")),
        other => header.push(other.field_name().to_string()),
    }
    header.extend([metric_header, "Total Duration", "Avg Duration"].map(String::from));

    let mut writer = writer(out)?;
    writer.write_record(with_range(header, range))?;
    for (i, entry) in entries.iter().enumerate() {
        let mut row = vec![(i + 1).to_string()];
        if group_by.is_composite() {
            let (name, artist) = entry.name_and_artist();
            row.push(name.to_string());
            row.push(artist.unwrap_or(NOT_AVAILABLE).to_string());
        } else {
            row.push(entry.key.clone());
        }
        row.push(if metric.is_duration() {
            format_ms_f64(entry.primary)
        } else {
            entry.count.to_string()
        });
        row.push(format_ms(entry.total_ms));
        row.push(format_ms_f64(entry.avg_ms));
        writer.write_record(&row)?;
    }
    writer.flush()?;
    Ok(())
}

/// Writes one row per month.
pub fn write_trend<W: Write>(out: W, points: &[TrendPoint], kind: TrendKind, range: Option<&DateRange>) -> Result<()> {
    let header: &[&str] = match kind {
        TrendKind::MonthlyTotalDuration => &["Month", "Total Duration (MM:SS)", "Total Duration (ms)"],
        TrendKind::MonthlyTopSongs => &["Month", "Top Songs"],
        TrendKind::MonthlyTopArtists => &["Month", "Top Artists"],
    };
    let mut writer = writer(out)?;
    writer.write_record(with_range(header.iter().map(|x| x.to_string()).collect(), range))?;
    for point in points {
        match &point.payload {
            TrendPayload::Duration { formatted, total_ms } => {
                writer.write_record([point.month.as_str(), formatted.as_str(), total_ms.to_string().as_str()])?;
            },
            TrendPayload::Summary(summary) => {
                writer.write_record([point.month.as_str(), summary.as_str()])?;
            },
        }
    }
    writer.flush()?;
    Ok(())
}

/// Writes one row per play, with its completion against the longest play of the same track.
pub fn write_details<W: Write>(out: W, details: &ListeningDetails, labels: &Labels) -> Result<()> {
    let flag = |x: TriState| match x {
        TriState::Unknown => NOT_AVAILABLE,
        other => other.label(labels),
    };
    let mut writer = writer(out)?;
    writer.write_record([
        "Played At (UTC)", "Platform", "Duration (MM:SS)", "Song", "Artist", "Album", "Completion (%)",
        "Start Reason", "End Reason", "Shuffle", "Skipped", "Offline", "Incognito Mode",
    ])?;
    for record in &details.records {
        let completion = match details.completion_percent(record) {
            Some(percent) => format!("{:.1}%", percent),
            None => NOT_AVAILABLE.to_string(),
        };
        writer.write_record([
            record.timestamp.as_str(),
            record.platform.as_str(),
            format_ms(record.ms_played).as_str(),
            record.track_name.as_str(),
            record.artist_name.as_str(),
            record.album_name.as_str(),
            completion.as_str(),
            record.reason_start.as_str(),
            record.reason_end.as_str(),
            flag(record.shuffle),
            flag(record.skipped),
            flag(record.offline),
            flag(record.incognito_mode),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::details::listening_details;
    use crate::locale::Locale;
    use crate::rank::{rank, Limit};
    use crate::record::{normalize, PlayEvent};
    use crate::trend::analyze_trend;
    use serde_json::json;

    fn labels() -> &'static Labels {
        Locale::ZhTw.labels()
    }

    fn sample() -> Vec<PlayEvent> {
        json!([
            { "ts": "2023-01-02T10:00:00Z", "master_metadata_track_name": "A", "master_metadata_album_artist_name": "X", "spotify_track_uri": "u:a", "ms_played": 1000, "platform": "ios", "shuffle": true },
            { "ts": "2023-01-03T10:00:00Z", "master_metadata_track_name": "A", "master_metadata_album_artist_name": "X", "spotify_track_uri": "u:a", "ms_played": 2000, "platform": "ios" },
            { "ts": "2023-02-01T10:00:00Z", "master_metadata_track_name": "B \"live\"", "master_metadata_album_artist_name": "X", "ms_played": 500 },
        ])
        .as_array()
        .unwrap()
        .iter()
        .map(|x| normalize(x, labels()))
        .collect()
    }

    fn lines(buf: &[u8]) -> Vec<String> {
        assert!(buf.starts_with(BOM));
        String::from_utf8(buf[BOM.len()..].to_vec()).unwrap()
            .lines()
            .map(String::from)
            .collect()
    }

    #[test]
    fn ranking_splits_composite_keys() {
        let records = sample();
        let entries = rank(&records, GroupBy::TrackArtist, Limit::All, Metric::Count, labels());
        let mut buf = Vec::new();
        write_ranking(&mut buf, &entries, GroupBy::TrackArtist, Metric::Count, None).unwrap();
        assert_eq!(lines(&buf), [
            r#""Rank","Song","Artist","Count","Total Duration","Avg Duration""#,
            r#""1","A","X","2","00:03","00:01""#,
            r#""2","B ""live""","X","1","00:00","00:00""#,
        ]);
    }

    #[test]
    fn ranking_columns_keep_artist_when_title_has_separator() {
        let records: Vec<PlayEvent> = [json!({ "master_metadata_track_name": "A - B", "master_metadata_album_artist_name": "C" })]
            .iter()
            .map(|x| normalize(x, labels()))
            .collect();
        let entries = rank(&records, GroupBy::TrackArtist, Limit::All, Metric::Count, labels());
        let mut buf = Vec::new();
        write_ranking(&mut buf, &entries, GroupBy::TrackArtist, Metric::Count, None).unwrap();
        assert_eq!(lines(&buf)[1], r#""1","A - B","C","1","00:00","00:00""#);
    }

    #[test]
    fn ranking_header_names_the_date_range() {
        let records = sample();
        let range = DateRange::parse(Some("20230101"), Some("20230131")).unwrap();
        let entries = rank(&records, GroupBy::Platform, Limit::All, Metric::Duration, labels());
        let mut buf = Vec::new();
        write_ranking(&mut buf, &entries, GroupBy::Platform, Metric::Duration, range.as_ref()).unwrap();
        let lines = lines(&buf);
        assert_eq!(lines[0], r#""Rank","platform","Total Duration","Total Duration","Avg Duration","Date range: 20230101 to 20230131""#);
        assert_eq!(lines[1], r#""1","ios","00:03","00:03","00:01""#);
    }

    #[test]
    fn trend_rows_per_month() {
        let records = sample();
        let points = analyze_trend(&records, TrendKind::MonthlyTotalDuration, Limit::All, labels());
        let mut buf = Vec::new();
        write_trend(&mut buf, &points, TrendKind::MonthlyTotalDuration, None).unwrap();
        assert_eq!(lines(&buf)[1..], [r#""2023-01","00:03","3000""#, r#""2023-02","00:00","500""#]);
    }

    #[test]
    fn details_include_completion_and_flags() {
        let records = sample();
        let details = listening_details(&records, GroupBy::TrackArtist, "A - X", labels());
        let mut buf = Vec::new();
        write_details(&mut buf, &details, labels()).unwrap();
        let lines = lines(&buf);
        assert_eq!(lines.len(), 3);
        assert!(lines[1].contains(r#""50.0%""#));
        assert!(lines[1].ends_with(r#""是","N/A","N/A","N/A""#));
        assert!(lines[2].contains(r#""100.0%""#));
    }

    #[test]
    fn file_names_follow_grouping_and_range() {
        let range = DateRange::parse(Some("20230101"), Some("20231231")).unwrap();
        assert_eq!(ranking_file_name(GroupBy::TrackArtist, None), "song_artist_ranking.csv");
        assert_eq!(ranking_file_name(GroupBy::Country, range.as_ref()), "country_ranking_20230101-20231231.csv");
        assert_eq!(ranking_file_name(GroupBy::TotalDuration, None), "total_duration_ranking.csv");
        assert_eq!(trend_file_name(TrendKind::MonthlyTopArtists, range.as_ref()), "monthly_top_artists_20230101-20231231.csv");
        assert_eq!(details_file_name("周杰倫 - 晴天!?"), "周杰倫 - 晴天_details.csv");
    }
}
