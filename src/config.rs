//! Persistent run configuration model and defaults.

use crate::enrichment::OverrideTables;

/// Root configuration persisted to `trackdeck.toml`.
#[derive(Debug, Clone, Default, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct Config {
    /// Which playlist to fetch.
    #[serde(default)]
    pub playlist: PlaylistConfig,
    /// Where run artifacts land.
    #[serde(default)]
    pub output: OutputConfig,
    /// Scannable code image style.
    #[serde(default)]
    pub code_image: CodeImageConfig,
    /// Card layout and field mapping.
    #[serde(default)]
    pub deck: DeckConfig,
    /// Extraction retry and pacing behavior.
    #[serde(default)]
    pub extraction: ExtractionConfig,
    /// Correction tables applied during enrichment.
    #[serde(default)]
    pub overrides: OverrideTables,
}

#[derive(Debug, Clone, Default, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct PlaylistConfig {
    /// Public playlist id, e.g. `0QoUa07l09WLh0ZTxBvgX4`.
    #[serde(default)]
    pub playlist_id: String,
}

/// Result directory layout. All subdirectories are created on startup.
#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct OutputConfig {
    #[serde(default = "default_result_dir")]
    pub result_dir: String,
    #[serde(default = "default_cards_file")]
    pub cards_file: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            result_dir: default_result_dir(),
            cards_file: default_cards_file(),
        }
    }
}

/// Style parameters baked into every scannable code URL.
#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct CodeImageConfig {
    #[serde(default = "default_code_format")]
    pub format: String,
    #[serde(default = "default_code_background_hex")]
    pub background_hex: String,
    #[serde(default = "default_code_color")]
    pub color: String,
    #[serde(default = "default_code_size")]
    pub size: u32,
}

impl Default for CodeImageConfig {
    fn default() -> Self {
        Self {
            format: default_code_format(),
            background_hex: default_code_background_hex(),
            color: default_code_color(),
            size: default_code_size(),
        }
    }
}

/// Field mapping and batch geometry. `content_columns[i]` fills
/// `template_fields[i]`; the two lists must stay the same length.
#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct DeckConfig {
    /// How many cards fit on one sheet of the template.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_template_path")]
    pub template_path: String,
    #[serde(default = "default_content_columns")]
    pub content_columns: Vec<String>,
    #[serde(default = "default_template_fields")]
    pub template_fields: Vec<String>,
}

impl Default for DeckConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            template_path: default_template_path(),
            content_columns: default_content_columns(),
            template_fields: default_template_fields(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct ExtractionConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_retry_delay_secs")]
    pub retry_delay_secs: u64,
    /// Purely cosmetic pacing between processed items; zero disables it.
    #[serde(default = "default_item_pacing_millis")]
    pub item_pacing_millis: u64,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            retry_delay_secs: default_retry_delay_secs(),
            item_pacing_millis: default_item_pacing_millis(),
        }
    }
}

fn default_result_dir() -> String {
    "results".to_string()
}

fn default_cards_file() -> String {
    "cards.html".to_string()
}

fn default_code_format() -> String {
    "png".to_string()
}

fn default_code_background_hex() -> String {
    "FFFFFF".to_string()
}

fn default_code_color() -> String {
    "black".to_string()
}

fn default_code_size() -> u32 {
    1024
}

fn default_batch_size() -> usize {
    9
}

fn default_template_path() -> String {
    "templates/card_sheet_a4.tmpl".to_string()
}

fn default_content_columns() -> Vec<String> {
    [
        "song",
        "original_release_year",
        "artist",
        "contributor_name",
        "number",
        "code_file",
    ]
    .map(str::to_string)
    .to_vec()
}

fn default_template_fields() -> Vec<String> {
    ["text1", "text2", "text3", "smallText", "number", "backImage"]
        .map(str::to_string)
        .to_vec()
}

fn default_max_attempts() -> u32 {
    5
}

fn default_retry_delay_secs() -> u64 {
    5
}

fn default_item_pacing_millis() -> u64 {
    10
}

#[cfg(test)]
mod tests {
    use super::Config;

    #[test]
    fn test_defaults_keep_the_mapping_lengths_equal() {
        let config = Config::default();
        assert_eq!(
            config.deck.content_columns.len(),
            config.deck.template_fields.len()
        );
        assert_eq!(config.deck.batch_size, 9);
    }

    #[test]
    fn test_empty_document_deserializes_to_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_override_tables_parse_from_toml() {
        let document = r#"
            [playlist]
            playlist_id = "0QoUa07l09WLh0ZTxBvgX4"

            [overrides.song_to_contributor]
            "Hotel California" = "maria"

            [overrides.id_to_name]
            maria = "Maria"

            [overrides.song_to_year]
            "funky town" = 1979
        "#;
        let config: Config = toml::from_str(document).unwrap();
        assert_eq!(config.playlist.playlist_id, "0QoUa07l09WLh0ZTxBvgX4");
        assert_eq!(
            config.overrides.song_to_contributor.get("Hotel California"),
            Some(&"maria".to_string())
        );
        assert_eq!(config.overrides.song_to_year.get("funky town"), Some(&1979));
    }

    #[test]
    fn test_partial_section_keeps_remaining_defaults() {
        let config: Config = toml::from_str("[deck]\nbatch_size = 12\n").unwrap();
        assert_eq!(config.deck.batch_size, 12);
        assert_eq!(config.deck.template_fields.len(), 6);
        assert_eq!(config.code_image.size, 1024);
    }
}
