//! Scannable code assets: deterministic URL construction plus retrieval.
//!
//! The API does not serve codes, but every code lives behind a URL that can
//! be computed from the track reference alone, so no lookup request is
//! needed to know where an asset is.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Duration;

use log::debug;

use crate::config::CodeImageConfig;
use crate::playlist::TrackRecord;
use crate::progress::ProgressReporter;

const SCANNABLES_BASE_URL: &str = "https://scannables.scdn.co/uri/plain";
const CODE_PROGRESS_LABEL: &str = "Processing codes.";
const TRACKDECK_USER_AGENT: &str = "trackdeck/0.1.0 (code asset fetch)";

/// Builds the agent used for code downloads.
pub fn code_http_agent() -> ureq::Agent {
    ureq::AgentBuilder::new()
        .timeout_connect(Duration::from_secs(5))
        .timeout_read(Duration::from_secs(7))
        .timeout_write(Duration::from_secs(7))
        .build()
}

/// Pure string template; the CDN resolves the rest.
pub fn code_url(track_uri: &str, config: &CodeImageConfig) -> String {
    format!(
        "{SCANNABLES_BASE_URL}/{}/{}/{}/{}/{track_uri}",
        config.format, config.background_hex, config.color, config.size
    )
}

/// Constructs the code URL for one track, retrieves the asset, and persists
/// it to `output_path`. Returns the URL and the local path. Retrieval
/// failures are fatal here; any retry policy belongs to the caller.
pub fn derive_code_reference(
    http_client: &ureq::Agent,
    track_uri: &str,
    config: &CodeImageConfig,
    output_path: &Path,
) -> Result<(String, PathBuf), String> {
    let url = code_url(track_uri, config);
    debug!("GET {url}");

    let response = http_client
        .get(&url)
        .set("User-Agent", TRACKDECK_USER_AGENT)
        .call()
        .map_err(|error| format!("code request failed ({url}): {error}"))?;
    let mut bytes = Vec::new();
    response
        .into_reader()
        .read_to_end(&mut bytes)
        .map_err(|error| format!("failed to read code response ({url}): {error}"))?;
    if bytes.is_empty() {
        return Err(format!("code response was empty ({url})"));
    }

    if detect_image_extension(&bytes).is_none() {
        return Err(format!("code response is not a recognized image ({url})"));
    }
    image::load_from_memory(&bytes)
        .map_err(|error| format!("code image failed to decode ({url}): {error}"))?;

    std::fs::write(output_path, &bytes).map_err(|error| {
        format!("failed to write code asset {}: {error}", output_path.display())
    })?;
    Ok((url, output_path.to_path_buf()))
}

/// Fills `code_url`/`code_file` on a fresh copy of the record set, one asset
/// per track, named `<number>.<format>` under `image_dir`.
pub fn attach_code_references(
    http_client: &ureq::Agent,
    records: &[TrackRecord],
    config: &CodeImageConfig,
    image_dir: &Path,
    progress: &mut dyn ProgressReporter,
) -> Result<Vec<TrackRecord>, String> {
    let total = records.len();
    progress.begin(CODE_PROGRESS_LABEL, total);

    let mut updated = Vec::with_capacity(total);
    for (index, record) in records.iter().enumerate() {
        let file_name = format!("{}.{}", record.number, config.format);
        let output_path = image_dir.join(file_name);
        let (url, path) = derive_code_reference(http_client, &record.track_uri, config, &output_path)?;

        let mut record = record.clone();
        record.code_url = url;
        record.code_file = path.to_string_lossy().into_owned();
        updated.push(record);
        progress.advance(index + 1, total);
    }
    Ok(updated)
}

fn detect_image_extension(bytes: &[u8]) -> Option<&'static str> {
    if bytes.len() >= 8
        && bytes[0] == 0x89
        && bytes[1] == b'P'
        && bytes[2] == b'N'
        && bytes[3] == b'G'
        && bytes[4] == 0x0D
        && bytes[5] == 0x0A
        && bytes[6] == 0x1A
        && bytes[7] == 0x0A
    {
        return Some("png");
    }
    if bytes.len() >= 3 && bytes[0] == 0xFF && bytes[1] == 0xD8 && bytes[2] == 0xFF {
        return Some("jpg");
    }
    None
}

#[cfg(test)]
mod tests {
    use super::{code_url, detect_image_extension};
    use crate::config::CodeImageConfig;

    #[test]
    fn test_code_url_is_a_pure_template() {
        let config = CodeImageConfig::default();
        assert_eq!(
            code_url("spotify:track:abc123", &config),
            "https://scannables.scdn.co/uri/plain/png/FFFFFF/black/1024/spotify:track:abc123"
        );
    }

    #[test]
    fn test_code_url_honors_configured_style() {
        let config = CodeImageConfig {
            format: "jpeg".to_string(),
            background_hex: "1DB954".to_string(),
            color: "white".to_string(),
            size: 640,
        };
        assert_eq!(
            code_url("spotify:track:xyz", &config),
            "https://scannables.scdn.co/uri/plain/jpeg/1DB954/white/640/spotify:track:xyz"
        );
    }

    #[test]
    fn test_png_signature_is_recognized() {
        let header = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0x00];
        assert_eq!(detect_image_extension(&header), Some("png"));
    }

    #[test]
    fn test_html_error_body_is_rejected() {
        assert_eq!(detect_image_extension(b"<html>not found</html>"), None);
        assert_eq!(detect_image_extension(&[]), None);
    }
}
