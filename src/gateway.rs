//! Spotify Web API gateway: client-credentials auth and paginated track pages.

use std::io::Read;
use std::time::Duration;

use log::debug;
use serde_json::Value;

const ACCOUNTS_TOKEN_URL: &str = "https://accounts.spotify.com/api/token";
const PLAYLISTS_BASE_URL: &str = "https://api.spotify.com/v1/playlists";
const CLIENT_ID_ENV: &str = "SPOTIFY_CLIENT_ID";
const CLIENT_SECRET_ENV: &str = "SPOTIFY_CLIENT_SECRET";
const TRACKDECK_USER_AGENT: &str = "trackdeck/0.1.0 (playlist metadata fetch)";

/// One response unit from the metadata source: an ordered list of raw items
/// plus the continuation URL of the following page, if any.
#[derive(Debug, Clone, Default)]
pub struct Page {
    pub items: Vec<Value>,
    pub next: Option<String>,
}

/// A paginated source of raw playlist items.
///
/// Implementations must return pages whose `next` field is `None` once the
/// listing is exhausted; the extractor follows the continuation blindly and
/// never assumes a page size.
pub trait PlaylistSource {
    fn first_page(&mut self, playlist_id: &str) -> Result<Page, String>;
    fn next_page(&mut self, next_url: &str) -> Result<Page, String>;
}

/// Blocking Spotify Web API client scoped to playlist-track listings.
pub struct SpotifyGateway {
    http_client: ureq::Agent,
    access_token: String,
}

impl SpotifyGateway {
    /// Reads client credentials from the environment and exchanges them for a
    /// bearer token. Missing credentials fail before any playlist request.
    pub fn connect() -> Result<Self, String> {
        let client_id = std::env::var(CLIENT_ID_ENV)
            .map_err(|_| format!("configuration error: environment variable {CLIENT_ID_ENV} is not set"))?;
        let client_secret = std::env::var(CLIENT_SECRET_ENV).map_err(|_| {
            format!("configuration error: environment variable {CLIENT_SECRET_ENV} is not set")
        })?;

        let http_client = ureq::AgentBuilder::new()
            .timeout_connect(Duration::from_secs(5))
            .timeout_read(Duration::from_secs(10))
            .timeout_write(Duration::from_secs(10))
            .build();
        let access_token = Self::request_access_token(&http_client, &client_id, &client_secret)?;

        Ok(Self {
            http_client,
            access_token,
        })
    }

    fn request_access_token(
        http_client: &ureq::Agent,
        client_id: &str,
        client_secret: &str,
    ) -> Result<String, String> {
        let body = format!(
            "grant_type=client_credentials&client_id={}&client_secret={}",
            urlencoding::encode(client_id),
            urlencoding::encode(client_secret)
        );
        let response = http_client
            .post(ACCOUNTS_TOKEN_URL)
            .set("User-Agent", TRACKDECK_USER_AGENT)
            .set("Content-Type", "application/x-www-form-urlencoded")
            .send_string(&body)
            .map_err(|error| format!("token request failed: {error}"))?;

        let mut text = String::new();
        response
            .into_reader()
            .read_to_string(&mut text)
            .map_err(|error| format!("failed to read token response: {error}"))?;
        let parsed: Value = serde_json::from_str(&text)
            .map_err(|error| format!("invalid JSON in token response: {error}"))?;
        parsed["access_token"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| "token response carried no access_token".to_string())
    }

    fn get_json(&self, url: &str) -> Result<Value, String> {
        debug!("GET {url}");
        let response = self
            .http_client
            .get(url)
            .set("User-Agent", TRACKDECK_USER_AGENT)
            .set("Accept", "application/json")
            .set("Authorization", &format!("Bearer {}", self.access_token))
            .call()
            .map_err(|error| format!("request failed ({url}): {error}"))?;
        let mut body = String::new();
        response
            .into_reader()
            .read_to_string(&mut body)
            .map_err(|error| format!("failed to read response ({url}): {error}"))?;
        serde_json::from_str(&body)
            .map_err(|error| format!("invalid JSON response ({url}): {error}"))
    }

    fn page_from_value(value: &Value) -> Result<Page, String> {
        let items = value["items"]
            .as_array()
            .cloned()
            .ok_or_else(|| "playlist response carried no items array".to_string())?;
        let next = value["next"].as_str().map(str::to_string);
        Ok(Page { items, next })
    }
}

impl PlaylistSource for SpotifyGateway {
    fn first_page(&mut self, playlist_id: &str) -> Result<Page, String> {
        let url = format!("{PLAYLISTS_BASE_URL}/{playlist_id}/tracks");
        Self::page_from_value(&self.get_json(&url)?)
    }

    fn next_page(&mut self, next_url: &str) -> Result<Page, String> {
        Self::page_from_value(&self.get_json(next_url)?)
    }
}

#[cfg(test)]
mod tests {
    use super::{Page, SpotifyGateway};
    use serde_json::json;

    #[test]
    fn test_page_from_value_reads_items_and_continuation() {
        let value = json!({
            "items": [{"track": {"name": "One"}}, {"track": {"name": "Two"}}],
            "next": "https://api.spotify.com/v1/playlists/p1/tracks?offset=100",
        });
        let page = SpotifyGateway::page_from_value(&value).unwrap();
        assert_eq!(page.items.len(), 2);
        assert_eq!(
            page.next.as_deref(),
            Some("https://api.spotify.com/v1/playlists/p1/tracks?offset=100")
        );
    }

    #[test]
    fn test_page_from_value_treats_null_next_as_final() {
        let value = json!({"items": [], "next": null});
        let page = SpotifyGateway::page_from_value(&value).unwrap();
        assert!(page.items.is_empty());
        assert_eq!(page.next, None);
    }

    #[test]
    fn test_page_from_value_rejects_missing_items() {
        let value = json!({"next": null});
        let error = SpotifyGateway::page_from_value(&value).unwrap_err();
        assert!(error.contains("items"), "unexpected message: {error}");
    }

    #[test]
    fn test_default_page_is_terminal() {
        let page = Page::default();
        assert!(page.items.is_empty());
        assert!(page.next.is_none());
    }
}
