//! Pause/resume/cancel handle shared between a transfer and whoever drives it

use std::sync::Arc;
use tokio::sync::watch;

use crate::types::TransferProgress;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Control {
    Run,
    Pause,
    Cancel,
}

/// Cloneable handle to a [`ResumableTransfer`](crate::ResumableTransfer).
///
/// Cancel is final: once cancelled, `pause` and `resume` have no effect.
#[derive(Debug, Clone)]
pub struct TransferHandle {
    control: Arc<watch::Sender<Control>>,
    progress: watch::Receiver<TransferProgress>,
}

impl TransferHandle {
    pub(crate) fn new(
        control: Arc<watch::Sender<Control>>,
        progress: watch::Receiver<TransferProgress>,
    ) -> Self {
        Self { control, progress }
    }

    /// Ask the transfer to stop at the next chunk boundary and keep what it has.
    /// Returns false if the transfer was already cancelled.
    pub fn pause(&self) -> bool {
        self.set(Control::Pause)
    }

    /// Let a paused transfer reconnect from its current byte offset.
    pub fn resume(&self) -> bool {
        self.set(Control::Run)
    }

    /// Abort the transfer and delete the partial file.
    pub fn cancel(&self) {
        self.control.send_replace(Control::Cancel);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.control.borrow() == Control::Cancel
    }

    /// Latest progress snapshot
    pub fn progress(&self) -> TransferProgress {
        self.progress.borrow().clone()
    }

    /// Receiver that is notified on every progress update
    pub fn subscribe(&self) -> watch::Receiver<TransferProgress> {
        self.progress.clone()
    }

    fn set(&self, next: Control) -> bool {
        let mut accepted = false;
        self.control.send_if_modified(|current| {
            if *current == Control::Cancel {
                return false;
            }
            accepted = true;
            if *current == next {
                return false;
            }
            *current = next;
            true
        });
        accepted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handle() -> (TransferHandle, watch::Receiver<Control>) {
        let (control_tx, control_rx) = watch::channel(Control::Run);
        let (_progress_tx, progress_rx) = watch::channel(TransferProgress::pending());
        (
            TransferHandle::new(Arc::new(control_tx), progress_rx),
            control_rx,
        )
    }

    #[test]
    fn pause_and_resume_toggle_control() {
        let (handle, control) = handle();
        assert!(handle.pause());
        assert_eq!(*control.borrow(), Control::Pause);
        assert!(handle.resume());
        assert_eq!(*control.borrow(), Control::Run);
    }

    #[test]
    fn cancel_is_sticky() {
        let (handle, control) = handle();
        handle.cancel();
        assert!(!handle.pause());
        assert!(!handle.resume());
        assert!(handle.is_cancelled());
        assert_eq!(*control.borrow(), Control::Cancel);
    }
}
