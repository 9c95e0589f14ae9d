use listen_stats::{
    details::ListeningDetails,
    duration::{format_ms, format_ms_f64},
    hierarchy::{ArtistHierarchy, SongRollup},
    rank::{Metric, RankedEntry},
    recap::Recap,
    trend::{TrendPayload, TrendPoint},
    Labels,
};
use colored::Colorize;

/// Formats milliseconds as `HH:MM:SS` for table columns.
fn hms(ms: u64) -> String {
    let secs = ms / 1000;
    format!("{:02}:{:02}:{:02}", secs / 3600, (secs % 3600) / 60, secs % 60)
}

pub fn ranking(entries: &[&RankedEntry], metric: Metric) {
    if entries.is_empty() {
        println!("No data found.");
        return;
    }
    for (i, entry) in entries.iter().enumerate() {
        let primary = if metric.is_duration() {
            format_ms_f64(entry.primary)
        } else {
            entry.count.to_string()
        };
        let (name, artist) = entry.name_and_artist();
        let name = match artist {
            Some(artist) => format!("{}  {}", name, artist.dimmed()),
            None => name.to_string(),
        };
        println!("{:>4}. {:>8}│{}│{:<5}  {}",
            i + 1,
            primary.bold(),
            hms(entry.total_ms),
            entry.count,
            name);
    }
}

pub fn trend(points: &[TrendPoint]) {
    if points.is_empty() {
        println!("No data found.");
        return;
    }
    for point in points {
        match &point.payload {
            TrendPayload::Duration { formatted, total_ms } => {
                println!("{}  {:>9}  {}", point.month.bold(), formatted, format!("({} ms)", total_ms).dimmed());
            },
            TrendPayload::Summary(summary) => {
                println!("{}  {}", point.month.bold(), summary);
            },
        }
    }
}

pub fn hierarchy(hierarchy: &ArtistHierarchy) {
    println!("{}  {} plays, {}", hierarchy.artist.bold(), hierarchy.total_count(), hms(hierarchy.total_ms()));
    println!();
    println!("Albums ({}):", hierarchy.albums.len());
    for album in &hierarchy.albums {
        println!("  {}│{:<5}  {}", hms(album.total_ms), album.count, album.name);
    }
    println!();
    println!("Songs ({}):", hierarchy.songs.len());
    songs(&hierarchy.songs);
}

pub fn songs(songs: &[SongRollup]) {
    for song in songs {
        println!("  {}│{:<5}  {}  {}", hms(song.total_ms), song.count, song.name, song.album.dimmed());
    }
}

pub fn details(details: &ListeningDetails, labels: &Labels) {
    if details.is_empty() {
        println!("No plays found.");
        return;
    }
    for record in &details.records {
        let completion = match details.completion_percent(record) {
            Some(percent) => format!("{:5.1}%", percent),
            None => String::from("   N/A"),
        };
        println!("{}  {}  {}  {}  {}  {}",
            record.timestamp,
            format_ms(record.ms_played).bold(),
            completion,
            record.track_name,
            record.artist_name.dimmed(),
            format!("[{} → {}, skipped: {}]", record.reason_start, record.reason_end, record.skipped.label(labels)).dimmed());
    }
    println!("{} plays", details.records.len());
}

pub fn recap(recap: &Recap) {
    let secs = recap.total_ms / 1000;
    println!("Total listen time:   {}d, {}h, {}m, {}s", secs / 86400, (secs % 86400) / 3600, (secs % 3600) / 60, secs % 60);
    println!("Total no. plays:     {}", recap.total_plays);
    match &recap.biggest_day {
        Some((day, ms)) => println!("Biggest day:         {} ({})", day, hms(*ms)),
        None => println!("Biggest day:         -"),
    }
    println!();
    println!("Top songs:");
    for song in &recap.top_songs {
        println!("  {}. {:<5}  {}  {}", song.rank, song.count, song.song, song.artist.dimmed());
    }
    println!();
    println!("Top artists:");
    for artist in &recap.top_artists {
        println!("  {}. {:<5}  {}", artist.rank, artist.count, artist.name);
    }
}
