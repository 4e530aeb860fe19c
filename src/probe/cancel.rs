use std::future::Future;
use std::io;

use tokio::sync::watch;

/// Creates a single-slot cancellation: the handle fires it, the signal observes it.
pub fn channel() -> (CancelHandle, CancelSignal) {
    let (tx, rx) = watch::channel(false);
    (CancelHandle { tx }, CancelSignal { rx })
}

#[derive(Debug)]
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

impl CancelHandle {
    /// Fire the cancellation. Returns `true` only for the call that fired it;
    /// later calls are no-ops.
    pub fn cancel(&self) -> bool {
        self.tx.send_if_modified(|fired| {
            if *fired {
                false
            } else {
                *fired = true;
                true
            }
        })
    }
}

#[derive(Debug, Clone)]
pub struct CancelSignal {
    rx: watch::Receiver<bool>,
}

impl CancelSignal {
    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once the cancellation has fired, immediately if it already has.
    /// Never resolves when the handle is dropped without firing.
    pub async fn cancelled(&mut self) {
        let fired = self.rx.wait_for(|fired| *fired).await.is_ok();
        if !fired {
            std::future::pending::<()>().await;
        }
    }
}

/// Fires `handle` on the first Ctrl-C, or SIGTERM on unix.
pub fn install_interrupt_handler(handle: CancelHandle) {
    tokio::spawn(forward_interrupt(wait_for_interrupt(), handle));
}

// A listener that failed to register drops the handle unfired, which leaves
// the signal pending forever instead of cancelling the run.
async fn forward_interrupt<F>(interrupt: F, handle: CancelHandle)
where
    F: Future<Output = io::Result<()>>,
{
    match interrupt.await {
        Ok(()) => {
            log::debug!("Interrupt received, stopping at the next wait");
            handle.cancel();
        }
        Err(e) => {
            log::warn!("Unable to listen for interrupts, the run will not stop on ^C: {e}");
        }
    }
}

#[cfg(unix)]
async fn wait_for_interrupt() -> io::Result<()> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut term = match signal(SignalKind::terminate()) {
        Ok(term) => term,
        Err(e) => {
            log::warn!("Unable to listen for SIGTERM: {e}");
            return tokio::signal::ctrl_c().await;
        }
    };

    let ctrl_c = tokio::select! {
        result = tokio::signal::ctrl_c() => result,
        _ = term.recv() => return Ok(()),
    };
    if let Err(e) = ctrl_c {
        log::warn!("Unable to listen for Ctrl-C, only SIGTERM stops the run: {e}");
        term.recv().await;
    }
    Ok(())
}

#[cfg(not(unix))]
async fn wait_for_interrupt() -> io::Result<()> {
    tokio::signal::ctrl_c().await
}
