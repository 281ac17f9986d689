//! Music playback capability

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Shown when nothing is playing
pub const NO_TRACK: &str = "No track playing";
/// Shown when the track has no artist
pub const UNKNOWN_ARTIST: &str = "Unknown artist";

/// Currently playing track
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NowPlaying {
    pub track: String,
    pub artist: String,
    pub artwork_url: Option<String>,
    pub is_playing: bool,
}

impl NowPlaying {
    /// Placeholder used when the player reports nothing
    pub fn idle() -> Self {
        Self {
            track: NO_TRACK.to_string(),
            artist: UNKNOWN_ARTIST.to_string(),
            artwork_url: None,
            is_playing: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SkipDirection {
    Next,
    Previous,
}

/// Remote music player the widget controls
#[async_trait]
pub trait PlaybackController: Send + Sync {
    /// Whether an access token has been provided
    fn is_connected(&self) -> bool;

    fn set_access_token(&self, token: String);

    /// URL the user visits to connect an account
    fn login_url(&self) -> Option<String>;

    /// `Ok(None)` when the account is idle
    async fn now_playing(&self) -> Result<Option<NowPlaying>, String>;

    async fn play(&self) -> Result<(), String>;

    async fn pause(&self) -> Result<(), String>;

    async fn skip(&self, direction: SkipDirection) -> Result<(), String>;

    /// Volume in percent, 0 to 100
    async fn set_volume(&self, percent: u8) -> Result<(), String>;
}
