//! Fixed-size card batching and document rendering for printable sheets.

use std::fs;
use std::path::{Path, PathBuf};

use log::info;

use crate::card_template::TemplateEnvironment;
use crate::playlist::EnrichedTrack;

const OUTPUT_EXTENSION: &str = ".html";

/// One rendered unit's field values: an ordered destination-field → value
/// mapping built by positional zip, or an all-empty padding placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Card {
    fields: Vec<(String, String)>,
}

impl Card {
    pub fn from_pairs(fields: Vec<(String, String)>) -> Self {
        Self { fields }
    }

    fn from_track(
        track: &EnrichedTrack,
        content_columns: &[String],
        template_fields: &[String],
    ) -> Result<Self, String> {
        let mut fields = Vec::with_capacity(template_fields.len());
        for (column, field) in content_columns.iter().zip(template_fields) {
            let value = track.value(column).ok_or_else(|| {
                format!("configuration error: unknown content column '{column}'")
            })?;
            fields.push((field.clone(), value));
        }
        Ok(Self { fields })
    }

    fn empty(template_fields: &[String]) -> Self {
        Self::from_pairs(
            template_fields
                .iter()
                .map(|field| (field.clone(), String::new()))
                .collect(),
        )
    }

    /// First match wins; destination field names may repeat.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value.as_str())
    }
}

/// Partitions an enriched record set into equal-size card batches and renders
/// them through a card-sheet template.
///
/// Batches are recomputed fully on construction; there is no incremental
/// update path.
#[derive(Debug, Clone)]
pub struct CardDeck {
    batches: Vec<Vec<Card>>,
    template_path: PathBuf,
}

impl CardDeck {
    /// Fails with a configuration error before any batching when the field
    /// mapping lengths differ or the batch size is zero.
    pub fn new(
        tracks: &[EnrichedTrack],
        content_columns: &[String],
        template_fields: &[String],
        batch_size: usize,
        template_path: impl Into<PathBuf>,
    ) -> Result<Self, String> {
        if content_columns.len() != template_fields.len() {
            return Err(format!(
                "configuration error: content_columns and template_fields must have the same \
                 length; got {} content columns and {} template fields",
                content_columns.len(),
                template_fields.len()
            ));
        }
        if batch_size == 0 {
            return Err("configuration error: batch_size must be a positive integer".to_string());
        }

        let batches = Self::build_batches(tracks, content_columns, template_fields, batch_size)?;
        Ok(Self {
            batches,
            template_path: template_path.into(),
        })
    }

    /// Contiguous groups in original order; the final group is padded with
    /// empty cards to exactly `batch_size` so every rendered sheet is full.
    /// Zero records produce zero batches and nothing to pad.
    fn build_batches(
        tracks: &[EnrichedTrack],
        content_columns: &[String],
        template_fields: &[String],
        batch_size: usize,
    ) -> Result<Vec<Vec<Card>>, String> {
        let mut batches = Vec::with_capacity(tracks.len().div_ceil(batch_size));
        for chunk in tracks.chunks(batch_size) {
            let batch = chunk
                .iter()
                .map(|track| Card::from_track(track, content_columns, template_fields))
                .collect::<Result<Vec<Card>, String>>()?;
            batches.push(batch);
        }
        if let Some(last) = batches.last_mut() {
            while last.len() < batch_size {
                last.push(Card::empty(template_fields));
            }
        }
        Ok(batches)
    }

    pub fn batches(&self) -> &[Vec<Card>] {
        &self.batches
    }

    pub fn n_batches(&self) -> usize {
        self.batches.len()
    }

    /// Renders every batch through the configured template and writes the
    /// document to `destination`, overwriting. The destination name must end
    /// in `.html` (any case); the template resolves only inside the template
    /// file's parent directory.
    pub fn render_to_file(&self, destination: &Path) -> Result<(), String> {
        validate_output_extension(destination)?;

        let root = self.template_path.parent().ok_or_else(|| {
            format!(
                "configuration error: template path '{}' has no parent directory",
                self.template_path.display()
            )
        })?;
        let name = self
            .template_path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| {
                format!(
                    "configuration error: template path '{}' has no file name",
                    self.template_path.display()
                )
            })?;

        let environment = TemplateEnvironment::new(root);
        let template = environment.get_template(name)?;
        let document = template.render(self.batches());
        fs::write(destination, document)
            .map_err(|error| format!("failed to write {}: {error}", destination.display()))?;
        info!(
            "rendered {} batches to {}",
            self.batches.len(),
            destination.display()
        );
        Ok(())
    }
}

fn validate_output_extension(destination: &Path) -> Result<(), String> {
    let file_name = destination
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or_default();
    if file_name.to_lowercase().ends_with(OUTPUT_EXTENSION) {
        return Ok(());
    }
    let actual = destination
        .extension()
        .and_then(|extension| extension.to_str())
        .map(|extension| format!(".{extension}"))
        .unwrap_or_default();
    Err(format!(
        "configuration error: invalid output extension; expected '{OUTPUT_EXTENSION}', got '{actual}'"
    ))
}
