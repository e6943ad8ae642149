//! Paginated playlist extraction with bounded whole-pass retry.
//!
//! A malformed item usually means the upstream listing is still settling, so
//! a failed pass is abandoned wholesale and the pages are fetched again after
//! a short delay instead of dropping the record.

use std::fmt;
use std::thread;
use std::time::Duration;

use log::{info, warn};
use serde_json::Value;

use crate::config::ExtractionConfig;
use crate::gateway::PlaylistSource;
use crate::playlist::TrackRecord;
use crate::progress::ProgressReporter;

const EXTRACT_PROGRESS_LABEL: &str = "Processing tracks.";

/// Shape mismatch at one node of an item's expected nested layout.
///
/// Carries the full path to the first missing or wrong-typed node so the
/// abandoned pass can be diagnosed from the log alone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShapeError {
    path: String,
}

impl ShapeError {
    fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }
}

impl fmt::Display for ShapeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "missing or malformed node at {}", self.path)
    }
}

#[derive(Debug, Clone, Copy)]
enum PathStep<'a> {
    Key(&'a str),
    Index(usize),
}

impl fmt::Display for PathStep<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathStep::Key(key) => write!(f, ".{key}"),
            PathStep::Index(index) => write!(f, "[{index}]"),
        }
    }
}

fn describe_path(item_index: usize, steps: &[PathStep<'_>], depth: usize) -> String {
    let mut path = format!("items[{item_index}]");
    for step in &steps[..depth] {
        path.push_str(&step.to_string());
    }
    path
}

/// Walks a fixed nested shape and returns the string at its leaf, or the
/// shape error naming the first node that is absent or of the wrong type.
fn string_at(item: &Value, item_index: usize, steps: &[PathStep<'_>]) -> Result<String, ShapeError> {
    let mut node = item;
    for (depth, step) in steps.iter().enumerate() {
        let child = match step {
            PathStep::Key(key) => node.get(*key),
            PathStep::Index(index) => node.get(*index),
        };
        node = child.filter(|value| !value.is_null()).ok_or_else(|| {
            ShapeError::new(describe_path(item_index, steps, depth + 1))
        })?;
    }
    node.as_str()
        .map(str::to_string)
        .ok_or_else(|| ShapeError::new(describe_path(item_index, steps, steps.len())))
}

/// Drives pagination and flattens raw items into [`TrackRecord`]s.
#[derive(Debug, Clone)]
pub struct Extractor {
    pub max_attempts: u32,
    pub retry_delay: Duration,
    pub item_pacing_delay: Duration,
}

impl Default for Extractor {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            retry_delay: Duration::from_secs(5),
            item_pacing_delay: Duration::from_millis(10),
        }
    }
}

impl Extractor {
    pub fn from_config(config: &ExtractionConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            retry_delay: Duration::from_secs(config.retry_delay_secs),
            item_pacing_delay: Duration::from_millis(config.item_pacing_millis),
        }
    }

    /// Follows the continuation signal until the source reports no further
    /// pages and returns the flattened item list in playlist order.
    pub fn fetch_all_pages(
        &self,
        source: &mut dyn PlaylistSource,
        playlist_id: &str,
    ) -> Result<Vec<Value>, String> {
        let first = source.first_page(playlist_id)?;
        let mut items = first.items;
        let mut next = first.next;
        while let Some(next_url) = next {
            let page = source.next_page(&next_url)?;
            items.extend(page.items);
            next = page.next;
        }
        Ok(items)
    }

    /// Fetches all pages and extracts one record per item, restarting the
    /// whole pass (including the page fetch) on any shape mismatch, up to
    /// `max_attempts` passes. Exhaustion is fatal and never yields a partial
    /// record set.
    pub fn extract_records(
        &self,
        source: &mut dyn PlaylistSource,
        playlist_id: &str,
        progress: &mut dyn ProgressReporter,
    ) -> Result<Vec<TrackRecord>, String> {
        let max_attempts = self.max_attempts.max(1);
        let mut last_error: Option<ShapeError> = None;

        for attempt in 1..=max_attempts {
            let items = self.fetch_all_pages(source, playlist_id)?;
            match self.extract_pass(&items, progress) {
                Ok(records) => {
                    info!("extracted {} tracks on attempt {attempt}", records.len());
                    return Ok(records);
                }
                Err(error) => {
                    warn!(
                        "extraction attempt {attempt}/{max_attempts} abandoned: {error}; \
                         restarting the full pass"
                    );
                    last_error = Some(error);
                    if attempt < max_attempts {
                        thread::sleep(self.retry_delay);
                    }
                }
            }
        }

        let cause = last_error
            .map(|error| error.to_string())
            .unwrap_or_else(|| "no extraction attempt was made".to_string());
        Err(format!("extraction failed after {max_attempts} attempts: {cause}"))
    }

    /// One full pass over the items. Stops at the first malformed item so the
    /// caller can restart; partial progress is discarded on retry.
    fn extract_pass(
        &self,
        items: &[Value],
        progress: &mut dyn ProgressReporter,
    ) -> Result<Vec<TrackRecord>, ShapeError> {
        let total = items.len();
        progress.begin(EXTRACT_PROGRESS_LABEL, total);

        let mut records = Vec::with_capacity(total);
        for (index, item) in items.iter().enumerate() {
            records.push(Self::record_from_item(item, index)?);
            progress.advance(index + 1, total);
            if !self.item_pacing_delay.is_zero() {
                thread::sleep(self.item_pacing_delay);
            }
        }
        Ok(records)
    }

    fn record_from_item(item: &Value, index: usize) -> Result<TrackRecord, ShapeError> {
        use PathStep::{Index, Key};

        Ok(TrackRecord {
            number: index + 1,
            song: string_at(item, index, &[Key("track"), Key("name")])?,
            artist: string_at(
                item,
                index,
                &[Key("track"), Key("artists"), Index(0), Key("name")],
            )?,
            release_date: string_at(
                item,
                index,
                &[Key("track"), Key("album"), Key("release_date")],
            )?,
            contributor_id: string_at(item, index, &[Key("added_by"), Key("id")])?,
            track_uri: string_at(item, index, &[Key("track"), Key("uri")])?,
            code_url: String::new(),
            code_file: String::new(),
        })
    }
}
