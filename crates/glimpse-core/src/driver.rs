//! Periodic countdown driver.
//!
//! One interval task per open viewer: polls the controller on the
//! configured cadence and forwards emitted events to the host over a
//! channel. The task ends on its own when the controller goes idle (close,
//! release, expiry) and is aborted by [`CountdownDriver::stop`] or by
//! dropping the driver -- a leaked ticker against a closed session is a
//! defect, not harmless noise.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::events::ViewerEvent;
use crate::viewer::Pollable;

/// Handle to the poll task of one open viewer.
pub struct CountdownDriver {
    handle: JoinHandle<()>,
}

impl CountdownDriver {
    /// Start polling `controller` every `interval`. Events appear on the
    /// returned receiver; the task stops once the controller goes idle.
    pub fn spawn<C>(
        controller: Arc<Mutex<C>>,
        interval: Duration,
    ) -> (Self, mpsc::UnboundedReceiver<ViewerEvent>)
    where
        C: Pollable + 'static,
    {
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                let (event, idle) = {
                    let mut controller = controller.lock().unwrap();
                    (controller.poll(Utc::now()), controller.is_idle())
                };
                if let Some(event) = event {
                    if tx.send(event).is_err() {
                        break;
                    }
                }
                if idle {
                    break;
                }
            }
        });
        (Self { handle }, rx)
    }

    /// Stop polling immediately. No event is delivered after this returns
    /// and the receiver sees end-of-stream.
    pub fn stop(&self) {
        self.handle.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for CountdownDriver {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
