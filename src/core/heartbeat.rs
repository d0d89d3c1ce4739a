//=========================================================================
// Heartbeat Worker
//=========================================================================
//
// Keeps the coordinating peer convinced this client is alive while the
// foreground is busy loading.
//
// Each tick:
//  1. Sends a keepalive through the SessionLink (failures tolerated)
//  2. Waits one interval on the stop channel
//  3. Exits when stop is signalled or the sender is dropped
//
//=========================================================================

//=== External Dependencies ===============================================

use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};
use log::{debug, error, trace};

//=== Internal Dependencies ===============================================

use super::host::SessionLink;

//=== HeartbeatWorker =====================================================

/// Background thread sending periodic keepalives until stopped.
///
/// Stopped and joined by [`HeartbeatWorker::stop`] or on drop.
pub struct HeartbeatWorker {
    stop_tx: Option<Sender<()>>,
    handle: Option<JoinHandle<u64>>,
}

impl HeartbeatWorker {
    //--- Construction -----------------------------------------------------

    /// Spawns the heartbeat thread.
    ///
    /// # Errors
    ///
    /// Returns the OS error if the thread could not be created.
    pub fn spawn(link: Arc<dyn SessionLink>, interval: Duration) -> io::Result<Self> {
        let (stop_tx, stop_rx) = bounded::<()>(1);

        let handle = thread::Builder::new()
            .name("load-heartbeat".to_string())
            .spawn(move || Self::run(link.as_ref(), &stop_rx, interval))?;

        debug!(target: "loadscreen::heartbeat", "Heartbeat started ({:?} interval)", interval);

        Ok(Self {
            stop_tx: Some(stop_tx),
            handle: Some(handle),
        })
    }

    //--- Lifecycle --------------------------------------------------------

    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }

    /// Signals the thread to stop and joins it. Idempotent.
    pub fn stop(&mut self) {
        if let Some(stop_tx) = self.stop_tx.take() {
            // The thread may already be gone; dropping the sender wakes it too.
            let _ = stop_tx.try_send(());
        }

        let Some(handle) = self.handle.take() else {
            return;
        };

        match handle.join() {
            Ok(sent) => {
                debug!(target: "loadscreen::heartbeat", "Heartbeat stopped after {} keepalives", sent);
            }
            Err(e) => {
                error!(target: "loadscreen::heartbeat", "Heartbeat thread panicked: {:?}", e);
            }
        }
    }

    //--- Thread Body ------------------------------------------------------

    fn run(link: &dyn SessionLink, stop_rx: &Receiver<()>, interval: Duration) -> u64 {
        let mut sent = 0;

        loop {
            match link.send_keepalive() {
                Ok(()) => sent += 1,
                Err(e) => trace!(target: "loadscreen::heartbeat", "Keepalive not sent: {}", e),
            }

            match stop_rx.recv_timeout(interval) {
                Err(RecvTimeoutError::Timeout) => {}
                Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
            }
        }

        sent
    }
}

impl Drop for HeartbeatWorker {
    fn drop(&mut self) {
        self.stop();
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
