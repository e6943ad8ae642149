//! Post-enrichment playlist summary reporting.

use std::fmt;

use crate::playlist::EnrichedTrack;

/// Aggregate view of an enriched playlist, logged once per run.
///
/// Group orders follow first appearance in the playlist so the report reads
/// in playlist order, run after run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaylistSummary {
    pub track_count: usize,
    pub unique_song_count: usize,
    pub unique_artist_count: usize,
    pub tracks_by_era: Vec<(String, usize)>,
    pub tracks_by_contributor: Vec<(String, usize)>,
}

impl PlaylistSummary {
    pub fn from_tracks(tracks: &[EnrichedTrack]) -> Self {
        Self {
            track_count: tracks.len(),
            unique_song_count: count_unique(tracks, |track| &track.record.song),
            unique_artist_count: count_unique(tracks, |track| &track.record.artist),
            tracks_by_era: count_by(tracks, |track| &track.era),
            tracks_by_contributor: count_by(tracks, |track| &track.contributor_name),
        }
    }
}

impl fmt::Display for PlaylistSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} tracks ({} unique songs, {} unique artists)",
            self.track_count, self.unique_song_count, self.unique_artist_count
        )?;
        writeln!(f, "tracks by era:")?;
        for (era, count) in &self.tracks_by_era {
            writeln!(f, "  {era}: {count}")?;
        }
        writeln!(f, "tracks by contributor:")?;
        for (contributor, count) in &self.tracks_by_contributor {
            writeln!(f, "  {contributor}: {count}")?;
        }
        Ok(())
    }
}

fn count_unique<F>(tracks: &[EnrichedTrack], key: F) -> usize
where
    F: Fn(&EnrichedTrack) -> &str,
{
    let mut seen: Vec<&str> = Vec::new();
    for track in tracks {
        let value = key(track);
        if !seen.contains(&value) {
            seen.push(value);
        }
    }
    seen.len()
}

fn count_by<F>(tracks: &[EnrichedTrack], key: F) -> Vec<(String, usize)>
where
    F: Fn(&EnrichedTrack) -> &str,
{
    let mut groups: Vec<(String, usize)> = Vec::new();
    for track in tracks {
        let value = key(track);
        match groups.iter_mut().find(|(group, _)| group == value) {
            Some((_, count)) => *count += 1,
            None => groups.push((value.to_string(), 1)),
        }
    }
    groups
}
