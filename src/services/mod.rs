//! External capability module
//!
//! This module contains the capabilities the page talks to: the completion
//! sound, the music player and the camera/microphone.

pub mod capture;
pub mod playback;
pub mod sound;
pub mod spotify;

// Re-export main types
pub use capture::{CaptureSettings, FfmpegCapture, MediaCapture, CAMERA_ALERT, MICROPHONE_ALERT};
pub use playback::{NowPlaying, PlaybackController, SkipDirection};
pub use sound::{sound_player_for, BellSoundPlayer, CommandSoundPlayer, SoundPlayer};
pub use spotify::SpotifyController;
