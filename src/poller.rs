//! Repeating tick workers for the update loop.
//!
//! Each poller is a dedicated named thread that sends a fixed message into
//! the controller channel at a fixed interval. The tick work itself runs on
//! the update thread when the message is drained, so ticks never overlap and
//! never block the thread that owns the playback state.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::thread;
use std::time::Duration;

use crate::message::Message;

/// Independently startable/stoppable repeating timer.
pub struct Poller {
    name: &'static str,
    interval: Duration,
    message: Message,
    tx: Sender<Message>,
    stop: Option<Arc<AtomicBool>>,
}

impl Poller {
    pub fn new(
        name: &'static str,
        interval: Duration,
        message: Message,
        tx: Sender<Message>,
    ) -> Self {
        Poller {
            name,
            interval,
            message,
            tx,
            stop: None,
        }
    }

    /// Begin ticking. No-op while already running.
    pub fn start(&mut self) {
        if self.stop.is_some() {
            return;
        }

        let stop = Arc::new(AtomicBool::new(false));
        let thread_stop = stop.clone();
        let tx = self.tx.clone();
        let message = self.message;
        let interval = self.interval;
        let name = self.name;

        thread::Builder::new()
            .name(name.to_string())
            .spawn(move || {
                log::debug!("{} started ({}ms interval)", name, interval.as_millis());
                loop {
                    thread::sleep(interval);
                    if thread_stop.load(Ordering::Relaxed) {
                        break;
                    }
                    if tx.send(message).is_err() {
                        log::warn!("{}: update thread disconnected, stopping", name);
                        break;
                    }
                }
                log::debug!("{} stopped", name);
            })
            .expect("failed to spawn poller thread");

        self.stop = Some(stop);
    }

    /// Stop ticking. Idempotent; safe from teardown and from inside a handler
    /// triggered by this poller's own tick.
    pub fn stop(&mut self) {
        if let Some(stop) = self.stop.take() {
            stop.store(true, Ordering::Relaxed);
        }
    }

    pub fn is_running(&self) -> bool {
        self.stop.is_some()
    }
}

impl Drop for Poller {
    fn drop(&mut self) {
        self.stop();
    }
}
