//! Now-playing refresh background task

use std::{sync::Arc, time::Duration};
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::state::AppState;

/// Background task that keeps the now-playing widget current while an
/// account is connected
pub async fn now_playing_task(state: Arc<AppState>, period: Duration) {
    info!("Starting now-playing refresh task");

    let mut interval = interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        interval.tick().await;

        if !state.playback.is_connected() {
            continue;
        }

        match state.refresh_now_playing().await {
            Ok(Some(now)) => debug!("Now playing: {} - {}", now.artist, now.track),
            Ok(None) => debug!("Nothing playing"),
            Err(e) => warn!("Error fetching current track: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{harness, FakeCapture, FakePlayback};

    #[tokio::test(start_paused = true)]
    async fn test_refreshes_only_when_connected() {
        let h = harness(FakeCapture::default(), FakePlayback::default());
        tokio::spawn(now_playing_task(Arc::clone(&h.state), Duration::from_secs(1)));

        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert!(h.state.get_media_state().unwrap().now_playing.is_none());

        h.state.connect_playback("token".to_string());
        tokio::time::sleep(Duration::from_secs(1)).await;
        let now = h.state.get_media_state().unwrap().now_playing.unwrap();
        assert_eq!(now.track, "Track");
    }
}
