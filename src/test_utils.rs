//! Shared test fakes for the timer, sound, capture and playback capabilities.
//!
//! Only compiled during testing (`#[cfg(test)]`).

use std::{
    path::{Path, PathBuf},
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc, Mutex,
    },
};

use async_trait::async_trait;

use crate::{
    services::{CaptureSettings, MediaCapture, NowPlaying, PlaybackController, SkipDirection, SoundPlayer},
    state::AppState,
    timer::{TickScheduler, TickStream},
};

/// Counts completion sounds
#[derive(Debug, Default)]
pub struct RecordingSoundPlayer {
    plays: AtomicUsize,
}

impl RecordingSoundPlayer {
    pub fn plays(&self) -> usize {
        self.plays.load(Ordering::SeqCst)
    }
}

impl SoundPlayer for RecordingSoundPlayer {
    fn play(&self) {
        self.plays.fetch_add(1, Ordering::SeqCst);
    }
}

#[derive(Debug, Default)]
struct ManualSchedulerInner {
    active: Option<TickStream>,
    starts: usize,
}

/// Scheduler that only records start/stop; tests deliver ticks by hand
#[derive(Debug, Default, Clone)]
pub struct ManualScheduler {
    inner: Arc<Mutex<ManualSchedulerInner>>,
}

impl ManualScheduler {
    pub fn active(&self) -> Option<TickStream> {
        self.inner.lock().unwrap().active
    }

    pub fn starts(&self) -> usize {
        self.inner.lock().unwrap().starts
    }
}

impl TickScheduler for ManualScheduler {
    fn start(&mut self, stream: TickStream) {
        let mut inner = self.inner.lock().unwrap();
        inner.active = Some(stream);
        inner.starts += 1;
    }

    fn stop(&mut self, stream: TickStream) {
        let mut inner = self.inner.lock().unwrap();
        if inner.active == Some(stream) {
            inner.active = None;
        }
    }
}

/// Capture fake that can be told to fail, or to fail only when stopping
#[derive(Debug, Default)]
pub struct FakeCapture {
    pub fail: AtomicBool,
    pub fail_stop: AtomicBool,
    pub photos: AtomicUsize,
    pub video_running: AtomicBool,
    pub memo_running: AtomicBool,
}

impl FakeCapture {
    pub fn failing() -> Self {
        let capture = Self::default();
        capture.fail.store(true, Ordering::SeqCst);
        capture
    }

    fn check(&self) -> Result<(), String> {
        if self.fail.load(Ordering::SeqCst) {
            Err("device busy".to_string())
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl MediaCapture for FakeCapture {
    async fn take_photo(&self) -> Result<PathBuf, String> {
        self.check()?;
        self.photos.fetch_add(1, Ordering::SeqCst);
        Ok(PathBuf::from("photo.jpg"))
    }

    async fn start_video(&self) -> Result<(), String> {
        self.check()?;
        self.video_running.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn stop_video(&self) -> Result<PathBuf, String> {
        self.check()?;
        self.video_running.store(false, Ordering::SeqCst);
        if self.fail_stop.load(Ordering::SeqCst) {
            return Err("recorder exited with 1".to_string());
        }
        Ok(PathBuf::from("video.mp4"))
    }

    async fn start_voice_memo(&self) -> Result<(), String> {
        self.check()?;
        self.memo_running.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn stop_voice_memo(&self) -> Result<PathBuf, String> {
        self.check()?;
        self.memo_running.store(false, Ordering::SeqCst);
        if self.fail_stop.load(Ordering::SeqCst) {
            return Err("recorder exited with 1".to_string());
        }
        Ok(PathBuf::from("voice-memo.wav"))
    }
}

/// In-memory music player whose commands can be told to fail
#[derive(Debug, Default)]
pub struct FakePlayback {
    pub fail: AtomicBool,
    pub token: Mutex<Option<String>>,
    pub playing: AtomicBool,
    pub skips: Mutex<Vec<SkipDirection>>,
    pub volumes: Mutex<Vec<u8>>,
}

impl FakePlayback {
    pub fn connected() -> Self {
        let playback = Self::default();
        playback.set_access_token("token".to_string());
        playback
    }

    pub fn connected_failing() -> Self {
        let playback = Self::connected();
        playback.fail.store(true, Ordering::SeqCst);
        playback
    }

    fn check(&self) -> Result<(), String> {
        if self.fail.load(Ordering::SeqCst) {
            Err("Spotify API error: 502 Bad Gateway".to_string())
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl PlaybackController for FakePlayback {
    fn is_connected(&self) -> bool {
        self.token.lock().unwrap().is_some()
    }

    fn set_access_token(&self, token: String) {
        *self.token.lock().unwrap() = Some(token);
    }

    fn login_url(&self) -> Option<String> {
        Some("https://accounts.example/authorize".to_string())
    }

    async fn now_playing(&self) -> Result<Option<NowPlaying>, String> {
        Ok(Some(NowPlaying {
            track: "Track".to_string(),
            artist: "Artist".to_string(),
            artwork_url: None,
            is_playing: self.playing.load(Ordering::SeqCst),
        }))
    }

    async fn play(&self) -> Result<(), String> {
        self.check()?;
        self.playing.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn pause(&self) -> Result<(), String> {
        self.check()?;
        self.playing.store(false, Ordering::SeqCst);
        Ok(())
    }

    async fn skip(&self, direction: SkipDirection) -> Result<(), String> {
        self.check()?;
        self.skips.lock().unwrap().push(direction);
        Ok(())
    }

    async fn set_volume(&self, percent: u8) -> Result<(), String> {
        self.volumes.lock().unwrap().push(percent);
        Ok(())
    }
}

/// Capture settings whose "ffmpeg" is a shell script with the given body
#[cfg(unix)]
pub fn script_recorder(dir: &Path, body: &str) -> CaptureSettings {
    use std::os::unix::fs::PermissionsExt;

    let script = dir.join("recorder.sh");
    std::fs::write(&script, format!("#!/bin/sh\n{}\n", body)).unwrap();
    std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

    CaptureSettings {
        ffmpeg: script.display().to_string(),
        output_dir: dir.to_path_buf(),
        video_device: "/dev/video0".to_string(),
        audio_device: "default".to_string(),
    }
}

/// Handles to the fakes behind a test `AppState`
pub struct TestHarness {
    pub state: Arc<AppState>,
    pub sound: Arc<RecordingSoundPlayer>,
    pub scheduler: ManualScheduler,
    pub capture: Arc<FakeCapture>,
    pub playback: Arc<FakePlayback>,
}

/// App state with a 30 second timer, 5 second step and fake capabilities
pub fn harness(capture: FakeCapture, playback: FakePlayback) -> TestHarness {
    let sound = Arc::new(RecordingSoundPlayer::default());
    let scheduler = ManualScheduler::default();
    let capture = Arc::new(capture);
    let playback = Arc::new(playback);

    let state = Arc::new(AppState::new(
        20554,
        "127.0.0.1".to_string(),
        30,
        5,
        crate::state::app_state::Capabilities {
            sound: sound.clone(),
            scheduler: Box::new(scheduler.clone()),
            playback: playback.clone(),
            capture: capture.clone(),
        },
    ));

    TestHarness {
        state,
        sound,
        scheduler,
        capture,
        playback,
    }
}
