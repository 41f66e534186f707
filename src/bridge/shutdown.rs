// SPDX-License-Identifier: GPL-3.0-only

//! Shutdown signalling
//!
//! The trigger half may be fired from any thread (the Ctrl+C handler runs on
//! its own); the signal half is observed by the bridge loop between phases
//! and while it waits for a request.

use tokio::sync::watch;

/// Fires the shutdown signal
#[derive(Debug)]
pub struct ShutdownTrigger {
    tx: watch::Sender<bool>,
}

/// Observes the shutdown signal
#[derive(Debug, Clone)]
pub struct ShutdownSignal {
    rx: watch::Receiver<bool>,
}

/// Create a connected trigger/signal pair
pub fn shutdown_channel() -> (ShutdownTrigger, ShutdownSignal) {
    let (tx, rx) = watch::channel(false);
    (ShutdownTrigger { tx }, ShutdownSignal { rx })
}

impl ShutdownTrigger {
    pub fn trigger(&self) {
        self.tx.send_replace(true);
    }

    /// Fire this trigger on Ctrl+C
    pub fn install_ctrlc_handler(self) -> Result<(), ctrlc::Error> {
        ctrlc::set_handler(move || {
            tracing::info!("Interrupt received, shutting down");
            self.trigger();
        })
    }
}

impl ShutdownSignal {
    pub fn is_triggered(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolve once shutdown is triggered
    ///
    /// Never resolves if every trigger is dropped without firing.
    pub async fn triggered(&mut self) {
        if self.rx.wait_for(|fired| *fired).await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}
