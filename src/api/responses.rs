//! API request and response structures

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    services::NowPlaying,
    state::{MediaState, TimerView},
};

/// Response for timer endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimerResponse {
    pub status: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub timer: TimerView,
}

impl TimerResponse {
    pub fn new(status: &str, message: String, timer: TimerView) -> Self {
        Self {
            status: status.to_string(),
            message,
            timestamp: Utc::now(),
            timer,
        }
    }

    /// The action was applied
    pub fn ok(message: String, timer: TimerView) -> Self {
        Self::new("ok", message, timer)
    }

    /// The action was not allowed in the current state
    pub fn rejected(message: String, timer: TimerView) -> Self {
        Self::new("rejected", message, timer)
    }
}

/// Response for capture endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaResponse {
    pub status: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub file: Option<PathBuf>,
    pub media: MediaState,
}

impl MediaResponse {
    fn new(status: &str, message: String, file: Option<PathBuf>, media: MediaState) -> Self {
        Self {
            status: status.to_string(),
            message,
            timestamp: Utc::now(),
            file,
            media,
        }
    }

    pub fn recording(message: String, media: MediaState) -> Self {
        Self::new("recording", message, None, media)
    }

    pub fn saved(file: PathBuf, media: MediaState) -> Self {
        Self::new("saved", format!("Saved {}", file.display()), Some(file), media)
    }

    /// Carries the user-facing alert
    pub fn alert(message: String, media: MediaState) -> Self {
        Self::new("alert", message, None, media)
    }
}

/// Response for playback endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaybackResponse {
    pub status: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub login_url: Option<String>,
    pub now_playing: Option<NowPlaying>,
}

impl PlaybackResponse {
    fn new(status: &str, message: String, login_url: Option<String>, now_playing: Option<NowPlaying>) -> Self {
        Self {
            status: status.to_string(),
            message,
            timestamp: Utc::now(),
            login_url,
            now_playing,
        }
    }

    pub fn ok(message: String, now_playing: Option<NowPlaying>) -> Self {
        Self::new("ok", message, None, now_playing)
    }

    pub fn login_required(login_url: Option<String>) -> Self {
        Self::new("login_required", "Connect a music account first".to_string(), login_url, None)
    }

    pub fn error(message: String) -> Self {
        Self::new("error", message, None, None)
    }
}

/// Full status response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub timer: TimerView,
    pub media: MediaState,
    pub playback_connected: bool,
    pub uptime: String,
    pub port: u16,
    pub host: String,
    pub last_action: Option<String>,
    pub last_action_time: Option<DateTime<Utc>>,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub version: String,
}

impl HealthResponse {
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
            timestamp: Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Body of `POST /timer/adjust`
#[derive(Debug, Clone, Deserialize)]
pub struct AdjustRequest {
    pub delta: i64,
}

/// Body of `POST /playback/token`: either the token itself or the raw
/// redirect fragment
#[derive(Debug, Clone, Deserialize)]
pub struct TokenRequest {
    pub access_token: Option<String>,
    pub fragment: Option<String>,
}
