//! TRNRS - Countdown timer service for the TRNRS workout page
//!
//! This library provides the countdown timer behind the page together with
//! its completion sound, the camera/microphone capture buttons and the music
//! now-playing widget, exposed over a small HTTP API.

pub mod config;
pub mod state;
pub mod timer;
pub mod api;
pub mod services;
pub mod tasks;
pub mod utils;

#[cfg(test)]
pub(crate) mod test_utils;

// Re-export commonly used types
pub use config::Config;
pub use state::AppState;
pub use timer::Countdown;
pub use api::create_router;
pub use utils::signals::shutdown_signal;
