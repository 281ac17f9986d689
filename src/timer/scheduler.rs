//! Tick scheduling capability

use serde::Serialize;
use tokio::sync::watch;
use tracing::debug;

/// Identity of one run of the 1 Hz tick source
///
/// A new stream is opened each time the timer starts; ticks tagged with an
/// older stream are dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct TickStream(pub(crate) u64);

impl TickStream {
    pub fn id(&self) -> u64 {
        self.0
    }
}

/// Starts and stops the periodic tick that drives the countdown
pub trait TickScheduler: Send {
    /// Begin delivering ticks for `stream`, replacing any earlier stream
    fn start(&mut self, stream: TickStream);

    /// Stop delivering ticks for `stream`
    fn stop(&mut self, stream: TickStream);
}

/// Scheduler that publishes the active stream on a watch channel
///
/// The countdown ticker task watches the channel and runs a 1 Hz interval
/// while a stream is active.
#[derive(Debug)]
pub struct WatchScheduler {
    tx: watch::Sender<Option<TickStream>>,
}

impl WatchScheduler {
    /// Create the scheduler together with the receiver the ticker task consumes
    pub fn new() -> (Self, watch::Receiver<Option<TickStream>>) {
        let (tx, rx) = watch::channel(None);
        (Self { tx }, rx)
    }

    /// Currently published stream
    pub fn active(&self) -> Option<TickStream> {
        *self.tx.borrow()
    }
}

impl TickScheduler for WatchScheduler {
    fn start(&mut self, stream: TickStream) {
        debug!("Starting tick stream {}", stream.id());
        self.tx.send_replace(Some(stream));
    }

    fn stop(&mut self, stream: TickStream) {
        let stopped = self.tx.send_if_modified(|current| {
            if *current == Some(stream) {
                *current = None;
                true
            } else {
                false
            }
        });

        if stopped {
            debug!("Stopped tick stream {}", stream.id());
        }
    }
}
