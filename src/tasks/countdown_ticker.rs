//! Countdown ticker background task

use std::{sync::Arc, time::Duration};
use tokio::{
    sync::watch,
    time::{interval_at, Instant, MissedTickBehavior},
};
use tracing::{debug, error, info};

use crate::{
    state::{AppState, TickOutcome},
    timer::TickStream,
};

/// Period of the countdown tick
pub const TICK_PERIOD: Duration = Duration::from_secs(1);

/// Background task that delivers 1 Hz ticks while a tick stream is active
///
/// Every change on `streams` restarts the interval, so a resumed timer waits
/// a full second before its first tick.
pub async fn countdown_ticker_task(state: Arc<AppState>, mut streams: watch::Receiver<Option<TickStream>>) {
    info!("Starting countdown ticker task");

    loop {
        let active = *streams.borrow_and_update();

        let Some(stream) = active else {
            // Idle until the timer starts
            if streams.changed().await.is_err() {
                break;
            }
            continue;
        };

        debug!("Ticking stream {}", stream.id());
        let mut interval = interval_at(Instant::now() + TICK_PERIOD, TICK_PERIOD);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    match state.tick(stream) {
                        Ok(TickOutcome::Completed) => {
                            debug!("Stream {} finished", stream.id());
                        }
                        Ok(_) => {}
                        Err(e) => error!("Failed to apply tick: {}", e),
                    }
                }

                // Started, paused, reset or finished - pick up the new stream
                changed = streams.changed() => {
                    if changed.is_err() {
                        info!("Tick scheduler dropped, stopping countdown ticker");
                        return;
                    }
                    break;
                }
            }
        }
    }

    info!("Countdown ticker task stopped");
}
