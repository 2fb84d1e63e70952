//! Background autosave worker.
//!
//! One worker thread per open buffer. It sleeps on a cancellation channel
//! for the configured interval; a timeout means "save now", a message or a
//! dropped sender means "stop". Save faults are logged and never surfaced.

use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use uesh_types::error::Result;

use crate::buffer::{BufferContent, Slot, lock_slot};

pub(crate) struct AutosaveWorker {
    cancel: mpsc::Sender<()>,
    handle: Option<JoinHandle<()>>,
}

impl AutosaveWorker {
    pub(crate) fn spawn<C: BufferContent>(
        slot: Arc<Mutex<Slot<C>>>,
        interval: Duration,
    ) -> Result<Self> {
        let (cancel, cancelled) = mpsc::channel();
        let handle = thread::Builder::new()
            .name(format!("autosave-{}", C::KIND))
            .spawn(move || run(&slot, interval, &cancelled))?;
        log::debug!("{} autosave started ({}s)", C::KIND, interval.as_secs());
        Ok(Self {
            cancel,
            handle: Some(handle),
        })
    }

    /// Signal the loop to stop and wait for it to finish.
    pub(crate) fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        let Some(handle) = self.handle.take() else {
            return;
        };
        // The worker may already have exited; a failed send is fine.
        let _ = self.cancel.send(());
        if handle.join().is_err() {
            log::warn!("autosave worker panicked");
        }
    }
}

impl Drop for AutosaveWorker {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn run<C: BufferContent>(slot: &Mutex<Slot<C>>, interval: Duration, cancelled: &mpsc::Receiver<()>) {
    loop {
        match cancelled.recv_timeout(interval) {
            Err(RecvTimeoutError::Timeout) => {
                let mut slot = lock_slot(slot);
                if slot.open.is_none() {
                    continue;
                }
                match slot.save(false) {
                    Ok(()) => log::debug!("{} buffer autosaved", C::KIND),
                    Err(e) => log::warn!("{} autosave failed: {e}", C::KIND),
                }
            },
            Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
        }
    }
    log::debug!("{} autosave stopped", C::KIND);
}
