//! Background tasks module
//!
//! This module contains background tasks that run alongside the HTTP server.

pub mod countdown_ticker;
pub mod now_playing;

// Re-export main functions
pub use countdown_ticker::countdown_ticker_task;
pub use now_playing::now_playing_task;
