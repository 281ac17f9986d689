//! Media widget state: recordings, now playing and alerts

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::services::NowPlaying;

/// State of the capture buttons and the music widget
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MediaState {
    /// A video recording is in progress
    pub recording_video: bool,
    /// A voice memo is being recorded
    pub recording_audio: bool,
    /// Last file written by a capture
    pub last_capture: Option<PathBuf>,
    /// Most recent now-playing snapshot, if a playback account is connected
    pub now_playing: Option<NowPlaying>,
    /// User-facing alerts from failed captures
    pub alerts: Vec<String>,
}

impl MediaState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_alert(&mut self, alert: String) {
        self.alerts.push(alert);
    }

    /// Drop alerts mentioning `device` (case-insensitive)
    pub fn clear_alerts_for(&mut self, device: &str) {
        let initial_count = self.alerts.len();
        let device = device.to_lowercase();
        self.alerts.retain(|alert| !alert.to_lowercase().contains(&device));

        if self.alerts.len() != initial_count {
            tracing::info!("Cleared {} alerts for device: {}", initial_count - self.alerts.len(), device);
        }
    }
}
