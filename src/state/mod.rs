//! State management module
//!
//! This module contains the timer state, the media widget state and the
//! shared application state tying them to their capabilities.

pub mod app_state;
pub mod media_state;
pub mod timer_state;

// Re-export main types
pub use app_state::AppState;
pub use media_state::MediaState;
pub use timer_state::{TickOutcome, TimerState, TimerView, Toggle};
