//! Main application state management

use std::{
    path::PathBuf,
    sync::{Arc, Mutex},
    time::Instant,
};
use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tracing::{error, info, warn};

use crate::{
    services::{
        MediaCapture, NowPlaying, PlaybackController, SkipDirection, SoundPlayer, CAMERA_ALERT,
        MICROPHONE_ALERT,
    },
    timer::{Countdown, TickScheduler, TickStream},
};
use super::{MediaState, TickOutcome, TimerView, Toggle};

/// External capabilities the application state is built from
pub struct Capabilities {
    pub sound: Arc<dyn SoundPlayer>,
    pub scheduler: Box<dyn TickScheduler>,
    pub playback: Arc<dyn PlaybackController>,
    pub capture: Arc<dyn MediaCapture>,
}

/// Result of pressing a capture button
#[derive(Debug, Clone, PartialEq)]
pub enum CaptureOutcome {
    /// A recording started
    Started,
    /// A photo was taken or a recording stopped and saved
    Saved(PathBuf),
    /// The device could not be used; carries the user-facing alert
    Failed(String),
}

/// Result of pressing a playback button
#[derive(Debug, Clone, PartialEq)]
pub enum PlaybackOutcome {
    Updated(Option<NowPlaying>),
    /// No account connected; carries the login URL when one is configured
    LoginRequired(Option<String>),
    Failed(String),
}

/// Main application state shared by the HTTP handlers and background tasks
pub struct AppState {
    /// Countdown timer with its sound and tick source
    pub timer: Arc<Mutex<Countdown>>,
    /// Recording flags, now playing and alerts
    pub media: Arc<Mutex<MediaState>>,
    pub playback: Arc<dyn PlaybackController>,
    pub capture: Arc<dyn MediaCapture>,
    /// Seconds added or removed by the plus/minus buttons
    pub adjust_step: i64,
    /// Server metadata
    pub start_time: Instant,
    pub port: u16,
    pub host: String,
    /// Last action tracking
    pub last_action: Arc<Mutex<Option<String>>>,
    pub last_action_time: Arc<Mutex<Option<DateTime<Utc>>>>,
    /// Channel for timer updates
    pub timer_update_tx: watch::Sender<TimerView>,
    /// Keep the receiver alive to prevent channel closure
    pub _timer_update_rx: watch::Receiver<TimerView>,
}

impl AppState {
    pub fn new(
        port: u16,
        host: String,
        timer_seconds: u64,
        adjust_step: i64,
        capabilities: Capabilities,
    ) -> Self {
        let countdown = Countdown::new(timer_seconds, capabilities.sound, capabilities.scheduler);
        let (timer_update_tx, timer_update_rx) = watch::channel(countdown.view());

        Self {
            timer: Arc::new(Mutex::new(countdown)),
            media: Arc::new(Mutex::new(MediaState::new())),
            playback: capabilities.playback,
            capture: capabilities.capture,
            adjust_step,
            start_time: Instant::now(),
            port,
            host,
            last_action: Arc::new(Mutex::new(None)),
            last_action_time: Arc::new(Mutex::new(None)),
            timer_update_tx,
            _timer_update_rx: timer_update_rx,
        }
    }

    fn record_action(&self, action: &str) {
        if let Ok(mut last_action) = self.last_action.lock() {
            *last_action = Some(action.to_string());
        }
        if let Ok(mut last_time) = self.last_action_time.lock() {
            *last_time = Some(Utc::now());
        }
    }

    /// Apply `updater` to the countdown and publish the resulting view
    fn update_timer<F, R>(&self, updater: F) -> Result<(R, TimerView), String>
    where
        F: FnOnce(&mut Countdown) -> R,
    {
        let mut countdown = self.timer.lock()
            .map_err(|e| format!("Failed to lock timer state: {}", e))?;

        let result = updater(&mut *countdown);
        let view = countdown.view();
        drop(countdown); // Release the lock early

        self.timer_update_tx.send_if_modified(|current| {
            if *current != view {
                *current = view.clone();
                true
            } else {
                false
            }
        });

        Ok((result, view))
    }

    /// Start or pause the countdown, returning what the press did
    pub fn toggle_timer(&self) -> Result<(Toggle, TimerView), String> {
        let (toggle, view) = self.update_timer(|countdown| countdown.toggle())?;
        info!("Timer toggle: {:?}", toggle);
        self.record_action("timer-toggle");
        Ok((toggle, view))
    }

    /// Stop the countdown and rewind it
    pub fn reset_timer(&self) -> Result<TimerView, String> {
        let ((), view) = self.update_timer(|countdown| countdown.reset())?;
        self.record_action("timer-reset");
        Ok(view)
    }

    /// Change the duration by `delta` seconds; returns whether it was applied
    pub fn adjust_timer(&self, delta: i64) -> Result<(bool, TimerView), String> {
        let (adjusted, view) = self.update_timer(|countdown| countdown.adjust_duration(delta))?;
        if adjusted {
            self.record_action("timer-adjust");
        }
        Ok((adjusted, view))
    }

    /// Adjust by one step up or down
    pub fn step_timer(&self, up: bool) -> Result<(bool, TimerView), String> {
        let delta = if up { self.adjust_step } else { -self.adjust_step };
        self.adjust_timer(delta)
    }

    /// Deliver one tick from the tick source
    pub fn tick(&self, stream: TickStream) -> Result<TickOutcome, String> {
        let (outcome, _) = self.update_timer(|countdown| countdown.tick(stream))?;
        if outcome == TickOutcome::Completed {
            info!("Countdown completed");
        }
        Ok(outcome)
    }

    /// Get current timer view
    pub fn get_timer_view(&self) -> Result<TimerView, String> {
        self.timer.lock()
            .map(|countdown| countdown.view())
            .map_err(|e| format!("Failed to lock timer state: {}", e))
    }

    /// Watch every published timer view
    pub fn subscribe_timer(&self) -> watch::Receiver<TimerView> {
        self.timer_update_tx.subscribe()
    }

    /// Flip mute for the completion sound and the connected music player
    pub async fn toggle_mute(&self) -> Result<TimerView, String> {
        let (muted, view) = self.update_timer(|countdown| {
            let muted = !countdown.is_muted();
            countdown.set_muted(muted);
            muted
        })?;
        info!("Mute set to: {}", muted);
        self.record_action(if muted { "mute" } else { "unmute" });

        if self.playback.is_connected() {
            let volume = if muted { 0 } else { 100 };
            if let Err(e) = self.playback.set_volume(volume).await {
                warn!("Failed to set playback volume: {}", e);
            }
        }

        Ok(view)
    }

    /// Get current media state
    pub fn get_media_state(&self) -> Result<MediaState, String> {
        self.media.lock()
            .map(|state| state.clone())
            .map_err(|e| format!("Failed to lock media state: {}", e))
    }

    fn update_media<F>(&self, updater: F) -> Result<MediaState, String>
    where
        F: FnOnce(&mut MediaState),
    {
        let mut state = self.media.lock()
            .map_err(|e| format!("Failed to lock media state: {}", e))?;
        updater(&mut *state);
        Ok(state.clone())
    }

    fn capture_failed(&self, alert: &str, cause: String) -> Result<CaptureOutcome, String> {
        error!("Capture failed: {}", cause);
        self.update_media(|state| state.add_alert(alert.to_string()))?;
        Ok(CaptureOutcome::Failed(alert.to_string()))
    }

    /// Take a single photo
    pub async fn take_photo(&self) -> Result<CaptureOutcome, String> {
        self.update_media(|state| state.clear_alerts_for("camera"))?;
        self.record_action("photo");

        match self.capture.take_photo().await {
            Ok(path) => {
                self.update_media(|state| state.last_capture = Some(path.clone()))?;
                Ok(CaptureOutcome::Saved(path))
            }
            Err(e) => self.capture_failed(CAMERA_ALERT, e),
        }
    }

    /// Start or stop a video recording
    pub async fn toggle_video(&self) -> Result<CaptureOutcome, String> {
        let recording = self.update_media(|state| state.clear_alerts_for("camera"))?.recording_video;
        self.record_action(if recording { "video-stop" } else { "video-start" });

        if recording {
            match self.capture.stop_video().await {
                Ok(path) => {
                    self.update_media(|state| {
                        state.recording_video = false;
                        state.last_capture = Some(path.clone());
                    })?;
                    Ok(CaptureOutcome::Saved(path))
                }
                Err(e) => {
                    // the recorder is gone either way, so the next press starts a new one
                    self.update_media(|state| state.recording_video = false)?;
                    self.capture_failed(CAMERA_ALERT, e)
                }
            }
        } else {
            match self.capture.start_video().await {
                Ok(()) => {
                    self.update_media(|state| state.recording_video = true)?;
                    Ok(CaptureOutcome::Started)
                }
                Err(e) => self.capture_failed(CAMERA_ALERT, e),
            }
        }
    }

    /// Start or stop a voice memo
    pub async fn toggle_voice_memo(&self) -> Result<CaptureOutcome, String> {
        let recording = self.update_media(|state| state.clear_alerts_for("microphone"))?.recording_audio;
        self.record_action(if recording { "voice-memo-stop" } else { "voice-memo-start" });

        if recording {
            match self.capture.stop_voice_memo().await {
                Ok(path) => {
                    self.update_media(|state| {
                        state.recording_audio = false;
                        state.last_capture = Some(path.clone());
                    })?;
                    Ok(CaptureOutcome::Saved(path))
                }
                Err(e) => {
                    // the recorder is gone either way, so the next press starts a new one
                    self.update_media(|state| state.recording_audio = false)?;
                    self.capture_failed(MICROPHONE_ALERT, e)
                }
            }
        } else {
            match self.capture.start_voice_memo().await {
                Ok(()) => {
                    self.update_media(|state| state.recording_audio = true)?;
                    Ok(CaptureOutcome::Started)
                }
                Err(e) => self.capture_failed(MICROPHONE_ALERT, e),
            }
        }
    }

    /// Store a playback access token
    pub fn connect_playback(&self, token: String) {
        self.playback.set_access_token(token);
        self.record_action("playback-connect");
    }

    /// Fetch now playing from the music player and store it
    pub async fn refresh_now_playing(&self) -> Result<Option<NowPlaying>, String> {
        let now_playing = self.playback.now_playing().await?;
        self.update_media(|state| state.now_playing = now_playing.clone())?;
        Ok(now_playing)
    }

    async fn after_playback_command(&self, result: Result<(), String>) -> PlaybackOutcome {
        if let Err(e) = result {
            error!("Error controlling playback: {}", e);
            return PlaybackOutcome::Failed(e);
        }

        match self.refresh_now_playing().await {
            Ok(now_playing) => PlaybackOutcome::Updated(now_playing),
            Err(e) => {
                error!("Error fetching current track: {}", e);
                PlaybackOutcome::Failed(e)
            }
        }
    }

    /// Pause when playing, play when paused
    pub async fn toggle_playback(&self) -> Result<PlaybackOutcome, String> {
        if !self.playback.is_connected() {
            return Ok(PlaybackOutcome::LoginRequired(self.playback.login_url()));
        }

        let playing = self
            .get_media_state()?
            .now_playing
            .map(|now| now.is_playing)
            .unwrap_or(false);
        self.record_action(if playing { "playback-pause" } else { "playback-play" });

        let result = if playing {
            self.playback.pause().await
        } else {
            self.playback.play().await
        };
        Ok(self.after_playback_command(result).await)
    }

    /// Skip to the next or previous track
    pub async fn skip_track(&self, direction: SkipDirection) -> Result<PlaybackOutcome, String> {
        if !self.playback.is_connected() {
            return Ok(PlaybackOutcome::LoginRequired(self.playback.login_url()));
        }

        self.record_action(match direction {
            SkipDirection::Next => "playback-next",
            SkipDirection::Previous => "playback-previous",
        });
        let result = self.playback.skip(direction).await;
        Ok(self.after_playback_command(result).await)
    }

    /// Calculate server uptime as a formatted string
    pub fn get_uptime(&self) -> String {
        let duration = self.start_time.elapsed();
        let hours = duration.as_secs() / 3600;
        let minutes = (duration.as_secs() % 3600) / 60;
        let seconds = duration.as_secs() % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}s", seconds)
        }
    }

    /// Get last action information
    pub fn get_last_action(&self) -> (Option<String>, Option<DateTime<Utc>>) {
        let last_action = self.last_action.lock().ok().and_then(|a| a.clone());
        let last_action_time = self.last_action_time.lock().ok().and_then(|t| *t);
        (last_action, last_action_time)
    }
}
