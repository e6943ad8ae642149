//! Override-merge and derivation steps between extraction and batching.
//!
//! Every step is copy-on-write: it takes the previous table by reference and
//! returns a fresh one, so a failed run never leaves a half-modified set.

use std::collections::HashMap;

use log::warn;

use crate::playlist::{EnrichedTrack, TrackRecord};

/// Correction tables supplied through configuration rather than ambient
/// state, so enrichment can be exercised with synthetic tables.
///
/// `song_to_contributor` replaces the adding-user id of specific songs (the
/// listed contributor is not always the person who actually added the song).
/// `song_to_year` keys are lower-cased song titles and pin the original
/// release year of remastered tracks.
#[derive(Debug, Clone, Default, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct OverrideTables {
    #[serde(default)]
    pub song_to_contributor: HashMap<String, String>,
    #[serde(default)]
    pub id_to_name: HashMap<String, String>,
    #[serde(default)]
    pub song_to_year: HashMap<String, i32>,
}

/// Replaces the contributor id of every record whose song title has an
/// override entry. Titles match exactly.
pub fn apply_contributor_overrides(
    records: &[TrackRecord],
    song_to_contributor: &HashMap<String, String>,
) -> Vec<TrackRecord> {
    records
        .iter()
        .map(|record| {
            let mut record = record.clone();
            if let Some(contributor_id) = song_to_contributor.get(&record.song) {
                record.contributor_id = contributor_id.clone();
            }
            record
        })
        .collect()
}

/// Accepts `YYYY-MM-DD`, `YYYY-MM`, or `YYYY`.
pub fn parse_release_year(release_date: &str) -> Result<i32, String> {
    let parts: Vec<&str> = release_date.split('-').collect();
    let well_formed = match parts.as_slice() {
        [year] => is_digits(year, 4),
        [year, month] => is_digits(year, 4) && is_digits(month, 2),
        [year, month, day] => is_digits(year, 4) && is_digits(month, 2) && is_digits(day, 2),
        _ => false,
    };
    if !well_formed {
        return Err(format!(
            "unrecognized release date '{release_date}'; expected YYYY-MM-DD, YYYY-MM, or YYYY"
        ));
    }
    parts[0]
        .parse::<i32>()
        .map_err(|error| format!("unrecognized release year in '{release_date}': {error}"))
}

fn is_digits(text: &str, count: usize) -> bool {
    text.len() == count && text.bytes().all(|byte| byte.is_ascii_digit())
}

/// Coarse period bucket for a resolved release year.
pub fn era_label(year: i32) -> &'static str {
    if year > 2019 {
        "2020s"
    } else if year > 2009 {
        "2010s"
    } else if year > 1999 {
        "2000s"
    } else if year > 1989 {
        "90s"
    } else if year > 1979 {
        "80s"
    } else if year > 1969 {
        "70s"
    } else if year > 1959 {
        "60s"
    } else if year > 1949 {
        "50s"
    } else {
        "Oldies"
    }
}

/// Runs the full derivation chain over a fresh copy of the record set:
/// contributor override, display-name resolution, release-year parse, year
/// override by lower-cased title, and era labelling.
pub fn enrich_records(
    records: &[TrackRecord],
    overrides: &OverrideTables,
) -> Result<Vec<EnrichedTrack>, String> {
    let adjusted = apply_contributor_overrides(records, &overrides.song_to_contributor);

    adjusted
        .into_iter()
        .map(|record| {
            let contributor_name = match overrides.id_to_name.get(&record.contributor_id) {
                Some(name) => name.clone(),
                None => {
                    warn!(
                        "no display name configured for contributor '{}'; keeping the raw id",
                        record.contributor_id
                    );
                    record.contributor_id.clone()
                }
            };
            let release_year = parse_release_year(&record.release_date)?;
            let original_release_year = overrides
                .song_to_year
                .get(&record.song.to_lowercase())
                .copied()
                .unwrap_or(release_year);
            let era = era_label(original_release_year).to_string();
            Ok(EnrichedTrack {
                record,
                contributor_name,
                release_year,
                original_release_year,
                era,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::{
        apply_contributor_overrides, enrich_records, era_label, parse_release_year, OverrideTables,
    };
    use crate::playlist::TrackRecord;

    fn record(song: &str, release_date: &str, contributor_id: &str) -> TrackRecord {
        TrackRecord {
            number: 1,
            song: song.to_string(),
            artist: "Artist".to_string(),
            release_date: release_date.to_string(),
            contributor_id: contributor_id.to_string(),
            track_uri: "spotify:track:t".to_string(),
            code_url: String::new(),
            code_file: String::new(),
        }
    }

    #[test]
    fn test_release_year_accepts_all_three_formats() {
        assert_eq!(parse_release_year("1984-01-09"), Ok(1984));
        assert_eq!(parse_release_year("1998-07"), Ok(1998));
        assert_eq!(parse_release_year("1967"), Ok(1967));
    }

    #[test]
    fn test_release_year_rejects_other_shapes() {
        for date in ["", "84-01-09", "1984-1-9", "1984-01-09-00", "198x", "01-1984"] {
            assert!(parse_release_year(date).is_err(), "accepted '{date}'");
        }
    }

    #[test]
    fn test_era_boundaries() {
        assert_eq!(era_label(2026), "2020s");
        assert_eq!(era_label(2020), "2020s");
        assert_eq!(era_label(2019), "2010s");
        assert_eq!(era_label(2000), "2000s");
        assert_eq!(era_label(1990), "90s");
        assert_eq!(era_label(1970), "70s");
        assert_eq!(era_label(1950), "50s");
        assert_eq!(era_label(1949), "Oldies");
        assert_eq!(era_label(1930), "Oldies");
    }

    #[test]
    fn test_contributor_override_matches_exact_title() {
        let records = vec![
            record("Jump", "1984-01-09", "someone-else"),
            record("jump", "1984-01-09", "someone-else"),
        ];
        let overrides: HashMap<String, String> =
            [("Jump".to_string(), "maria".to_string())].into();
        let adjusted = apply_contributor_overrides(&records, &overrides);
        assert_eq!(adjusted[0].contributor_id, "maria");
        assert_eq!(adjusted[1].contributor_id, "someone-else");
        // copy-on-write: the input table is untouched
        assert_eq!(records[0].contributor_id, "someone-else");
    }

    #[test]
    fn test_year_override_matches_lowercased_title() {
        let records = vec![record("Funky Town", "1995-03-01", "max")];
        let overrides = OverrideTables {
            song_to_year: [("funky town".to_string(), 1979)].into(),
            id_to_name: [("max".to_string(), "Max".to_string())].into(),
            ..OverrideTables::default()
        };
        let enriched = enrich_records(&records, &overrides).unwrap();
        assert_eq!(enriched[0].release_year, 1995);
        assert_eq!(enriched[0].original_release_year, 1979);
        assert_eq!(enriched[0].era, "70s");
    }

    #[test]
    fn test_missing_display_name_keeps_raw_id() {
        let records = vec![record("Jump", "1984-01-09", "9t0xn2xj")];
        let enriched = enrich_records(&records, &OverrideTables::default()).unwrap();
        assert_eq!(enriched[0].contributor_name, "9t0xn2xj");
    }

    #[test]
    fn test_contributor_override_applies_before_name_resolution() {
        let records = vec![record("Hotel California", "1976-12-08", "rexgameboy")];
        let overrides = OverrideTables {
            song_to_contributor: [("Hotel California".to_string(), "maria".to_string())].into(),
            id_to_name: [("maria".to_string(), "Maria".to_string())].into(),
            ..OverrideTables::default()
        };
        let enriched = enrich_records(&records, &overrides).unwrap();
        assert_eq!(enriched[0].record.contributor_id, "maria");
        assert_eq!(enriched[0].contributor_name, "Maria");
    }

    #[test]
    fn test_bad_release_date_fails_enrichment() {
        let records = vec![record("Jump", "sometime in 1984", "max")];
        let error = enrich_records(&records, &OverrideTables::default()).unwrap_err();
        assert!(error.contains("sometime in 1984"), "unexpected: {error}");
    }
}
