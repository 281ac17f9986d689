//! Countdown timer module
//!
//! The countdown itself is synchronous; time enters only through the tick
//! scheduler, so the timer can be stepped by hand in tests.

pub mod countdown;
pub mod scheduler;

pub use countdown::Countdown;
pub use scheduler::{TickScheduler, TickStream, WatchScheduler};
