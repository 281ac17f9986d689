//! Spotify Web API playback controller

use std::{collections::HashMap, sync::RwLock};

use async_trait::async_trait;
use reqwest::{Client, Method, StatusCode, Url};
use serde::Deserialize;
use tracing::{debug, info};

use super::playback::{NowPlaying, PlaybackController, SkipDirection, NO_TRACK, UNKNOWN_ARTIST};

const AUTHORIZE_URL: &str = "https://accounts.spotify.com/authorize";
const API_BASE: &str = "https://api.spotify.com/v1";

/// Scopes the widget needs to read and control playback
pub const SCOPES: [&str; 5] = [
    "user-read-playback-state",
    "user-modify-playback-state",
    "user-read-currently-playing",
    "streaming",
    "app-remote-control",
];

/// Build the implicit-grant authorize URL
pub fn login_url(client_id: &str, redirect_uri: &str) -> Result<String, String> {
    let scopes = SCOPES.join(" ");
    Url::parse_with_params(
        AUTHORIZE_URL,
        &[
            ("client_id", client_id),
            ("response_type", "token"),
            ("redirect_uri", redirect_uri),
            ("scope", scopes.as_str()),
        ],
    )
    .map(String::from)
    .map_err(|e| format!("Failed to build login url: {}", e))
}

/// Parse the `#access_token=...&token_type=...` fragment of the redirect
pub fn token_from_fragment(fragment: &str) -> HashMap<String, String> {
    let fragment = fragment.trim_start_matches('#');
    let mut url = match Url::parse("http://localhost/") {
        Ok(url) => url,
        Err(_) => return HashMap::new(),
    };
    url.set_query(Some(fragment));
    url.query_pairs()
        .filter(|(key, _)| !key.is_empty())
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect()
}

#[derive(Debug, Deserialize)]
struct CurrentlyPlaying {
    #[serde(default)]
    is_playing: bool,
    item: Option<Track>,
}

#[derive(Debug, Deserialize)]
struct Track {
    name: Option<String>,
    #[serde(default)]
    artists: Vec<Artist>,
    album: Option<Album>,
}

#[derive(Debug, Deserialize)]
struct Artist {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Album {
    #[serde(default)]
    images: Vec<Image>,
}

#[derive(Debug, Deserialize)]
struct Image {
    url: String,
}

impl From<CurrentlyPlaying> for NowPlaying {
    fn from(current: CurrentlyPlaying) -> Self {
        let item = current.item;
        let track = item
            .as_ref()
            .and_then(|t| t.name.clone())
            .unwrap_or_else(|| NO_TRACK.to_string());
        let artist = item
            .as_ref()
            .and_then(|t| t.artists.first())
            .and_then(|a| a.name.clone())
            .unwrap_or_else(|| UNKNOWN_ARTIST.to_string());
        let artwork_url = item
            .as_ref()
            .and_then(|t| t.album.as_ref())
            .and_then(|a| a.images.first())
            .map(|i| i.url.clone());

        Self {
            track,
            artist,
            artwork_url,
            is_playing: current.is_playing,
        }
    }
}

/// Parse a currently-playing payload
pub fn parse_now_playing(body: &str) -> Result<NowPlaying, String> {
    serde_json::from_str::<CurrentlyPlaying>(body)
        .map(NowPlaying::from)
        .map_err(|e| format!("Failed to parse currently playing response: {}", e))
}

/// Playback controller backed by the Spotify Web API
#[derive(Debug)]
pub struct SpotifyController {
    http: Client,
    api_base: String,
    login_url: Option<String>,
    token: RwLock<Option<String>>,
}

impl SpotifyController {
    pub fn new(login_url: Option<String>) -> Self {
        Self::with_api_base(API_BASE.to_string(), login_url)
    }

    pub fn with_api_base(api_base: String, login_url: Option<String>) -> Self {
        Self {
            http: Client::new(),
            api_base,
            login_url,
            token: RwLock::new(None),
        }
    }

    fn token(&self) -> Result<String, String> {
        self.token
            .read()
            .map_err(|e| format!("Failed to lock access token: {}", e))?
            .clone()
            .ok_or_else(|| "Spotify account not connected".to_string())
    }

    async fn send(&self, method: Method, path: &str) -> Result<reqwest::Response, String> {
        let token = self.token()?;
        let url = format!("{}{}", self.api_base, path);
        debug!("Spotify request: {} {}", method, url);

        let response = self
            .http
            .request(method, &url)
            .bearer_auth(token)
            .header(reqwest::header::CONTENT_LENGTH, "0")
            .send()
            .await
            .map_err(|e| format!("Spotify request to {} failed: {}", path, e))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(format!("Spotify {} returned {}: {}", path, status, body.trim()));
        }

        Ok(response)
    }
}

#[async_trait]
impl PlaybackController for SpotifyController {
    fn is_connected(&self) -> bool {
        self.token.read().map(|t| t.is_some()).unwrap_or(false)
    }

    fn set_access_token(&self, token: String) {
        if let Ok(mut current) = self.token.write() {
            *current = Some(token);
            info!("Spotify access token updated");
        }
    }

    fn login_url(&self) -> Option<String> {
        self.login_url.clone()
    }

    async fn now_playing(&self) -> Result<Option<NowPlaying>, String> {
        let response = self.send(Method::GET, "/me/player/currently-playing").await?;
        if response.status() == StatusCode::NO_CONTENT {
            return Ok(None);
        }

        let body = response
            .text()
            .await
            .map_err(|e| format!("Failed to read currently playing response: {}", e))?;
        parse_now_playing(&body).map(Some)
    }

    async fn play(&self) -> Result<(), String> {
        self.send(Method::PUT, "/me/player/play").await.map(|_| ())
    }

    async fn pause(&self) -> Result<(), String> {
        self.send(Method::PUT, "/me/player/pause").await.map(|_| ())
    }

    async fn skip(&self, direction: SkipDirection) -> Result<(), String> {
        let path = match direction {
            SkipDirection::Next => "/me/player/next",
            SkipDirection::Previous => "/me/player/previous",
        };
        self.send(Method::POST, path).await.map(|_| ())
    }

    async fn set_volume(&self, percent: u8) -> Result<(), String> {
        let path = format!("/me/player/volume?volume_percent={}", percent.min(100));
        self.send(Method::PUT, &path).await.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_url_carries_client_and_scopes() {
        let url = login_url("abc123", "http://localhost:20554/callback").unwrap();
        let parsed = Url::parse(&url).unwrap();
        let params: HashMap<String, String> = parsed.query_pairs().into_owned().collect();

        assert!(url.starts_with(AUTHORIZE_URL));
        assert_eq!(params["client_id"], "abc123");
        assert_eq!(params["response_type"], "token");
        assert_eq!(params["redirect_uri"], "http://localhost:20554/callback");
        assert_eq!(params["scope"], SCOPES.join(" "));
    }

    #[test]
    fn test_token_from_fragment() {
        let values = token_from_fragment("#access_token=BQD%2Fxy&token_type=Bearer&expires_in=3600");
        assert_eq!(values["access_token"], "BQD/xy");
        assert_eq!(values["token_type"], "Bearer");
        assert_eq!(values["expires_in"], "3600");
    }

    #[test]
    fn test_token_from_empty_fragment() {
        assert!(token_from_fragment("").is_empty());
    }

    #[test]
    fn test_parse_now_playing() {
        let body = r#"{
            "is_playing": true,
            "item": {
                "name": "Eye of the Tiger",
                "artists": [{"name": "Survivor"}, {"name": "Someone Else"}],
                "album": {"images": [{"url": "https://img/1.jpg"}, {"url": "https://img/2.jpg"}]}
            }
        }"#;
        let now = parse_now_playing(body).unwrap();
        assert_eq!(now.track, "Eye of the Tiger");
        assert_eq!(now.artist, "Survivor");
        assert_eq!(now.artwork_url.as_deref(), Some("https://img/1.jpg"));
        assert!(now.is_playing);
    }

    #[test]
    fn test_parse_now_playing_without_item() {
        let now = parse_now_playing(r#"{"is_playing": false, "item": null}"#).unwrap();
        assert_eq!(now, NowPlaying::idle());
    }

    #[tokio::test]
    async fn test_requests_need_a_token() {
        let controller = SpotifyController::new(None);
        assert!(!controller.is_connected());
        assert!(controller.play().await.is_err());

        controller.set_access_token("token".to_string());
        assert!(controller.is_connected());
    }
}
