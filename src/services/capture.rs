//! Camera and microphone capture through ffmpeg

use std::{
    path::{Path, PathBuf},
    process::Stdio,
    time::Duration,
};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::{
    io::AsyncWriteExt,
    process::{Child, Command},
    sync::Mutex,
    time::timeout,
};
use tracing::{debug, info, warn};

/// Shown when the camera cannot be opened
pub const CAMERA_ALERT: &str =
    "Unable to access camera. Please ensure you have granted camera permissions.";
/// Shown when the microphone cannot be opened
pub const MICROPHONE_ALERT: &str =
    "Unable to access microphone. Please ensure you have granted microphone permissions.";

/// Sample rate used for voice memos
pub const VOICE_MEMO_SAMPLE_RATE: u32 = 44_100;

/// How long a recorder has to fail before it counts as started
const START_GRACE: Duration = Duration::from_millis(500);

/// How long a recorder gets to finalise its file after being asked to quit
const STOP_GRACE: Duration = Duration::from_secs(5);

/// Kind of capture, used for file naming
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureKind {
    Photo,
    Video,
    VoiceMemo,
}

impl CaptureKind {
    fn prefix(&self) -> &'static str {
        match self {
            CaptureKind::Photo => "photo",
            CaptureKind::Video => "video",
            CaptureKind::VoiceMemo => "voice-memo",
        }
    }

    fn extension(&self) -> &'static str {
        match self {
            CaptureKind::Photo => "jpg",
            CaptureKind::Video => "mp4",
            CaptureKind::VoiceMemo => "wav",
        }
    }
}

/// File name for a capture taken at `at`, e.g. `photo-2024-05-01T10-15-00.123Z.jpg`
pub fn capture_file_name(kind: CaptureKind, at: DateTime<Utc>) -> String {
    format!(
        "{}-{}.{}",
        kind.prefix(),
        at.format("%Y-%m-%dT%H-%M-%S%.3fZ"),
        kind.extension()
    )
}

/// Camera and microphone capture
#[async_trait]
pub trait MediaCapture: Send + Sync {
    /// Take a single photo, returning the saved file
    async fn take_photo(&self) -> Result<PathBuf, String>;

    async fn start_video(&self) -> Result<(), String>;

    /// Stop the running video recording, returning the saved file.
    /// No recording is running afterwards, even when this fails.
    async fn stop_video(&self) -> Result<PathBuf, String>;

    async fn start_voice_memo(&self) -> Result<(), String>;

    /// Stop the running voice memo, returning the saved file.
    /// No recording is running afterwards, even when this fails.
    async fn stop_voice_memo(&self) -> Result<PathBuf, String>;

    /// Finalise any running recordings
    async fn shutdown(&self) {}
}

/// Capture devices and output location
#[derive(Debug, Clone)]
pub struct CaptureSettings {
    pub ffmpeg: String,
    pub output_dir: PathBuf,
    pub video_device: String,
    pub audio_device: String,
}

impl CaptureSettings {
    fn output_path(&self, kind: CaptureKind) -> PathBuf {
        self.output_dir.join(capture_file_name(kind, Utc::now()))
    }

    /// ffmpeg arguments for a single still frame
    pub fn photo_args(&self, output: &Path) -> Vec<String> {
        let mut args = base_args();
        args.extend(self.camera_input());
        args.extend(["-frames:v".to_string(), "1".to_string()]);
        args.push(output.display().to_string());
        args
    }

    /// ffmpeg arguments for a camera + microphone recording
    pub fn video_args(&self, output: &Path) -> Vec<String> {
        let mut args = base_args();
        args.extend(self.camera_input());
        args.extend(self.microphone_input());
        args.push(output.display().to_string());
        args
    }

    /// ffmpeg arguments for a microphone-only recording
    pub fn voice_memo_args(&self, output: &Path) -> Vec<String> {
        let mut args = base_args();
        args.extend(self.microphone_input());
        args.extend(["-ar".to_string(), VOICE_MEMO_SAMPLE_RATE.to_string()]);
        args.push(output.display().to_string());
        args
    }

    fn camera_input(&self) -> Vec<String> {
        vec![
            "-f".into(),
            "v4l2".into(),
            "-video_size".into(),
            "1920x1080".into(),
            "-i".into(),
            self.video_device.clone(),
        ]
    }

    fn microphone_input(&self) -> Vec<String> {
        vec!["-f".into(), "alsa".into(), "-i".into(), self.audio_device.clone()]
    }
}

fn base_args() -> Vec<String> {
    ["-hide_banner", "-loglevel", "error", "-y"]
        .into_iter()
        .map(String::from)
        .collect()
}

/// A recorder process and the file it writes
#[derive(Debug)]
struct Recording {
    child: Child,
    output: PathBuf,
}

/// Capture implementation that drives ffmpeg child processes
#[derive(Debug)]
pub struct FfmpegCapture {
    settings: CaptureSettings,
    video: Mutex<Option<Recording>>,
    voice_memo: Mutex<Option<Recording>>,
}

impl FfmpegCapture {
    pub fn new(settings: CaptureSettings) -> Self {
        Self {
            settings,
            video: Mutex::new(None),
            voice_memo: Mutex::new(None),
        }
    }

    fn spawn_recorder(&self, args: &[String]) -> Result<Child, String> {
        Command::new(&self.settings.ffmpeg)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| format!("Failed to execute {}: {}", self.settings.ffmpeg, e))
    }

    async fn start(&self, slot: &Mutex<Option<Recording>>, kind: CaptureKind) -> Result<(), String> {
        let mut slot = slot.lock().await;
        if slot.is_some() {
            return Err(format!("A {} recording is already running", kind.prefix()));
        }

        let output = self.settings.output_path(kind);
        let args = match kind {
            CaptureKind::Video => self.settings.video_args(&output),
            CaptureKind::VoiceMemo => self.settings.voice_memo_args(&output),
            CaptureKind::Photo => return Err("Photos are taken in one shot, not recorded".to_string()),
        };
        let mut child = self.spawn_recorder(&args)?;

        // a device that cannot be opened makes ffmpeg exit within moments;
        // `wait` closes stdin, which is still needed to ask for a clean stop
        let stdin = child.stdin.take();
        if let Ok(status) = timeout(START_GRACE, child.wait()).await {
            let status = status.map_err(|e| format!("Failed to wait for recorder: {}", e))?;
            return Err(format!("{} exited on start with {}", self.settings.ffmpeg, status));
        }
        child.stdin = stdin;

        info!("Recording {} to {}", kind.prefix(), output.display());
        *slot = Some(Recording { child, output });
        Ok(())
    }

    async fn stop(&self, slot: &Mutex<Option<Recording>>, kind: CaptureKind) -> Result<PathBuf, String> {
        let recording = slot
            .lock()
            .await
            .take()
            .ok_or_else(|| format!("No {} recording is running", kind.prefix()))?;

        finish_recording(recording).await
    }
}

/// Ask ffmpeg to quit so it writes the container trailer, killing it if it hangs
async fn finish_recording(mut recording: Recording) -> Result<PathBuf, String> {
    if let Some(mut stdin) = recording.child.stdin.take() {
        if let Err(e) = stdin.write_all(b"q").await {
            debug!("Recorder stdin closed early: {}", e);
        }
    }

    let status = match timeout(STOP_GRACE, recording.child.wait()).await {
        Ok(status) => status.map_err(|e| format!("Failed to wait for recorder: {}", e))?,
        Err(_) => {
            warn!("Recorder did not stop within {:?}, killing it", STOP_GRACE);
            recording
                .child
                .kill()
                .await
                .map_err(|e| format!("Failed to kill recorder: {}", e))?;
            return Ok(recording.output);
        }
    };

    if !status.success() && !recording.output.exists() {
        return Err(format!("Recorder exited with {}", status));
    }

    info!("Saved {}", recording.output.display());
    Ok(recording.output)
}

#[async_trait]
impl MediaCapture for FfmpegCapture {
    async fn take_photo(&self) -> Result<PathBuf, String> {
        let output = self.settings.output_path(CaptureKind::Photo);
        let args = self.settings.photo_args(&output);
        debug!("Taking photo with {} {:?}", self.settings.ffmpeg, args);

        let result = Command::new(&self.settings.ffmpeg)
            .args(&args)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| format!("Failed to execute {}: {}", self.settings.ffmpeg, e))?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            return Err(format!("Photo capture failed: {}", stderr.trim()));
        }

        info!("Saved {}", output.display());
        Ok(output)
    }

    async fn start_video(&self) -> Result<(), String> {
        self.start(&self.video, CaptureKind::Video).await
    }

    async fn stop_video(&self) -> Result<PathBuf, String> {
        self.stop(&self.video, CaptureKind::Video).await
    }

    async fn start_voice_memo(&self) -> Result<(), String> {
        self.start(&self.voice_memo, CaptureKind::VoiceMemo).await
    }

    async fn stop_voice_memo(&self) -> Result<PathBuf, String> {
        self.stop(&self.voice_memo, CaptureKind::VoiceMemo).await
    }

    async fn shutdown(&self) {
        for (slot, kind) in [(&self.video, CaptureKind::Video), (&self.voice_memo, CaptureKind::VoiceMemo)] {
            if slot.lock().await.is_some() {
                match self.stop(slot, kind).await {
                    Ok(path) => info!("Saved {} on shutdown", path.display()),
                    Err(e) => warn!("Failed to finalise {} on shutdown: {}", kind.prefix(), e),
                }
            }
        }
    }
}
