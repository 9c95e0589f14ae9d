use crate::rank::Tally;
use crate::record::PlayEvent;
use indexmap::IndexMap;
use std::borrow::Borrow;

/// One album of an artist, with its songs in order of first appearance.
#[derive(Debug, Clone, PartialEq)]
pub struct AlbumRollup {
    pub name: String,
    pub count: u64,
    pub total_ms: u64,
    pub songs: IndexMap<String, Tally>,
}

impl AlbumRollup {
    /// The album's songs, most played first.
    pub fn songs(&self) -> Vec<SongRollup> {
        let mut songs = self.songs.iter()
            .map(|(name, tally)| SongRollup {
                name: name.clone(),
                album: self.name.clone(),
                count: tally.count,
                total_ms: tally.total_ms,
            })
            .collect::<Vec<_>>();
        sort_by_count(&mut songs, |x| x.count);
        songs
    }
}

/// A song in a song list. In the cross-album list `album` is the first album the song was seen
/// on; the counts cover every album.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SongRollup {
    pub name: String,
    pub album: String,
    pub count: u64,
    pub total_ms: u64,
}

/// Albums and songs of one artist.
#[derive(Debug, Clone, PartialEq)]
pub struct ArtistHierarchy {
    pub artist: String,
    /// Most played first.
    pub albums: Vec<AlbumRollup>,
    /// Every song of the artist regardless of album, most played first.
    pub songs: Vec<SongRollup>,
}

impl ArtistHierarchy {
    /// The song list of a single album, replacing the cross-album view when the album is
    /// selected. Reads the already built roll-up, the records are not consulted again.
    pub fn album_songs(&self, album: &str) -> Option<Vec<SongRollup>> {
        self.albums.iter()
            .find(|x| x.name == album)
            .map(AlbumRollup::songs)
    }

    pub fn total_count(&self) -> u64 {
        self.albums.iter().map(|x| x.count).sum()
    }

    pub fn total_ms(&self) -> u64 {
        self.albums.iter().map(|x| x.total_ms).sum()
    }
}

/// Rolls up the records of `artist` (exact, case-sensitive match) into albums and songs.
/// Returns `None` when the artist has no records at all, so callers can tell "no data" apart
/// from an empty table.
pub fn build_artist_hierarchy<R: Borrow<PlayEvent>>(records: &[R], artist: &str) -> Option<ArtistHierarchy> {
    let mut albums = IndexMap::<String, AlbumRollup>::new();
    let mut songs = IndexMap::<String, SongRollup>::new();

    for record in records.iter().map(Borrow::borrow).filter(|x| x.artist_name == artist) {
        let album = albums.entry(record.album_name.clone())
            .or_insert_with(|| AlbumRollup {
                name: record.album_name.clone(),
                count: 0,
                total_ms: 0,
                songs: IndexMap::new(),
            });
        album.count += 1;
        album.total_ms = album.total_ms.saturating_add(record.ms_played);
        album.songs.entry(record.track_name.clone())
            .or_default()
            .add(record.ms_played);

        // The first album a song shows up on sticks
        let song = songs.entry(record.track_name.clone())
            .or_insert_with(|| SongRollup {
                name: record.track_name.clone(),
                album: record.album_name.clone(),
                count: 0,
                total_ms: 0,
            });
        song.count += 1;
        song.total_ms = song.total_ms.saturating_add(record.ms_played);
    }

    if albums.is_empty() {
        return None;
    }

    let mut albums = albums.into_values().collect::<Vec<_>>();
    sort_by_count(&mut albums, |x| x.count);
    let mut songs = songs.into_values().collect::<Vec<_>>();
    sort_by_count(&mut songs, |x| x.count);

    Some(ArtistHierarchy {
        artist: artist.to_string(),
        albums,
        songs,
    })
}

/// Stable descending sort; equal counts keep their order of first appearance.
fn sort_by_count<T, F: Fn(&T) -> u64>(items: &mut [T], count: F) {
    items.sort_by(|a, b| count(b).cmp(&count(a)));
}
