//! Flat playlist record model shared by the extraction, enrichment, and deck stages.

/// Raw column names in the order the extractor fills them.
pub const RAW_COLUMNS: [&str; 8] = [
    "number",
    "song",
    "artist",
    "release_date",
    "contributor_id",
    "track_uri",
    "code_url",
    "code_file",
];

/// Enriched column names: the raw columns followed by the derived columns in
/// the order the enrichment stage appends them.
pub const ENRICHED_COLUMNS: [&str; 12] = [
    "number",
    "song",
    "artist",
    "release_date",
    "contributor_id",
    "track_uri",
    "code_url",
    "code_file",
    "contributor_name",
    "release_year",
    "original_release_year",
    "era",
];

/// One playlist entry as extracted from the metadata source.
///
/// `code_url` and `code_file` stay empty until the code-asset step fills them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrackRecord {
    /// 1-based position of the entry in the full playlist.
    pub number: usize,
    pub song: String,
    pub artist: String,
    pub release_date: String,
    pub contributor_id: String,
    pub track_uri: String,
    pub code_url: String,
    pub code_file: String,
}

impl TrackRecord {
    /// Column-name access used by snapshots. Numbers are rendered as text.
    pub fn value(&self, column: &str) -> Option<String> {
        match column {
            "number" => Some(self.number.to_string()),
            "song" => Some(self.song.clone()),
            "artist" => Some(self.artist.clone()),
            "release_date" => Some(self.release_date.clone()),
            "contributor_id" => Some(self.contributor_id.clone()),
            "track_uri" => Some(self.track_uri.clone()),
            "code_url" => Some(self.code_url.clone()),
            "code_file" => Some(self.code_file.clone()),
            _ => None,
        }
    }
}

/// A [`TrackRecord`] plus the derived and override-corrected fields.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnrichedTrack {
    pub record: TrackRecord,
    pub contributor_name: String,
    pub release_year: i32,
    pub original_release_year: i32,
    pub era: String,
}

impl EnrichedTrack {
    /// Column-name access used by snapshots and card construction.
    pub fn value(&self, column: &str) -> Option<String> {
        match column {
            "contributor_name" => Some(self.contributor_name.clone()),
            "release_year" => Some(self.release_year.to_string()),
            "original_release_year" => Some(self.original_release_year.to_string()),
            "era" => Some(self.era.clone()),
            _ => self.record.value(column),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{EnrichedTrack, TrackRecord, ENRICHED_COLUMNS, RAW_COLUMNS};

    fn sample_track() -> EnrichedTrack {
        EnrichedTrack {
            record: TrackRecord {
                number: 3,
                song: "Heart of Gold".to_string(),
                artist: "Neil Young".to_string(),
                release_date: "1972-02-01".to_string(),
                contributor_id: "listener-1".to_string(),
                track_uri: "spotify:track:abc123".to_string(),
                code_url: "https://example.invalid/code".to_string(),
                code_file: "results/images/3.png".to_string(),
            },
            contributor_name: "Nora".to_string(),
            release_year: 1972,
            original_release_year: 1972,
            era: "70s".to_string(),
        }
    }

    #[test]
    fn test_every_declared_column_resolves() {
        let track = sample_track();
        for column in ENRICHED_COLUMNS {
            assert!(track.value(column).is_some(), "column '{column}' missing");
        }
        for column in RAW_COLUMNS {
            assert!(
                track.record.value(column).is_some(),
                "column '{column}' missing"
            );
        }
    }

    #[test]
    fn test_numeric_columns_render_as_text() {
        let track = sample_track();
        assert_eq!(track.value("number").as_deref(), Some("3"));
        assert_eq!(track.value("release_year").as_deref(), Some("1972"));
    }

    #[test]
    fn test_unknown_column_is_none() {
        assert_eq!(sample_track().value("album"), None);
    }
}
