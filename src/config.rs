//! Configuration and CLI argument handling

use std::{path::PathBuf, time::Duration};

use clap::Parser;

use crate::{services::CaptureSettings, state::timer_state::DEFAULT_DURATION_SECONDS};

/// CLI argument parsing structure
#[derive(Parser, Debug, Clone)]
#[command(name = "trnrs")]
#[command(about = "Countdown timer service with media capture and now-playing controls")]
#[command(version)]
pub struct Config {
    /// Port to bind the server to
    #[arg(short, long, default_value = "20554")]
    pub port: u16,

    /// Host address to bind to
    #[arg(long, default_value = "0.0.0.0")]
    pub host: String,

    /// Initial countdown duration in seconds
    #[arg(short, long, default_value_t = DEFAULT_DURATION_SECONDS)]
    pub duration: u64,

    /// Seconds added or removed by the plus/minus buttons
    #[arg(short, long, default_value = "5")]
    pub step: u64,

    /// Command line played when the countdown finishes (terminal bell if unset)
    #[arg(long)]
    pub sound_command: Option<String>,

    /// Directory photos, videos and voice memos are written to
    #[arg(long, default_value = ".")]
    pub capture_dir: PathBuf,

    /// Camera device
    #[arg(long, default_value = "/dev/video0")]
    pub video_device: String,

    /// Microphone device
    #[arg(long, default_value = "default")]
    pub audio_device: String,

    /// ffmpeg binary used for capture
    #[arg(long, default_value = "ffmpeg")]
    pub ffmpeg: String,

    /// Spotify application client id
    #[arg(long, env = "SPOTIFY_CLIENT_ID")]
    pub spotify_client_id: Option<String>,

    /// Redirect URI registered for the Spotify application
    #[arg(long, default_value = "http://localhost:20554/callback")]
    pub redirect_uri: String,

    /// Now-playing refresh interval in seconds
    #[arg(long, default_value = "1")]
    pub poll_interval: u64,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Config {
    /// Parse configuration from command line arguments
    pub fn parse() -> Self {
        Parser::parse()
    }

    /// Get the server address as a formatted string
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Get the appropriate log level based on verbose flag
    pub fn log_level(&self) -> &'static str {
        if self.verbose { "debug" } else { "info" }
    }

    /// Adjustment step as a signed delta
    pub fn adjust_step(&self) -> i64 {
        i64::try_from(self.step).unwrap_or(i64::MAX)
    }

    pub fn poll_period(&self) -> Duration {
        Duration::from_secs(self.poll_interval.max(1))
    }

    pub fn capture_settings(&self) -> CaptureSettings {
        CaptureSettings {
            ffmpeg: self.ffmpeg.clone(),
            output_dir: self.capture_dir.clone(),
            video_device: self.video_device.clone(),
            audio_device: self.audio_device.clone(),
        }
    }
}
