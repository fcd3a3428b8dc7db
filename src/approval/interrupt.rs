// ABOUTME: Cancellation signal delivered by the hosting process.
// ABOUTME: Raised by Ctrl-C or a run deadline; observed at approval gates.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// Receiving side: cheap to clone, checked while waiting at a gate.
#[derive(Debug, Clone)]
pub struct Interrupt {
    rx: watch::Receiver<bool>,
}

/// Raising side.
#[derive(Debug, Clone)]
pub struct InterruptHandle {
    tx: Arc<watch::Sender<bool>>,
}

/// Create a connected handle and interrupt.
pub fn interrupt_pair() -> (InterruptHandle, Interrupt) {
    let (tx, rx) = watch::channel(false);
    (InterruptHandle { tx: Arc::new(tx) }, Interrupt { rx })
}

impl Interrupt {
    /// An interrupt that can never be raised.
    pub fn never() -> Self {
        let (_tx, rx) = watch::channel(false);
        Self { rx }
    }

    pub fn is_triggered(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once the interrupt is raised; pends forever if it never can be.
    pub async fn triggered(&self) {
        let mut rx = self.rx.clone();
        let sender_gone = rx.wait_for(|raised| *raised).await.is_err();
        if sender_gone {
            std::future::pending::<()>().await;
        }
    }
}

impl InterruptHandle {
    pub fn trigger(&self) {
        self.tx.send_replace(true);
    }

    /// Raise the interrupt when the process receives Ctrl-C.
    pub fn trigger_on_ctrl_c(&self) {
        let handle = self.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("interrupt received");
                handle.trigger();
            }
        });
    }

    /// Raise the interrupt once the run has been going for `deadline`.
    pub fn trigger_after(&self, deadline: Duration) {
        let handle = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(deadline).await;
            tracing::warn!(?deadline, "run deadline reached");
            handle.trigger();
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn never_is_not_triggered() {
        assert!(!Interrupt::never().is_triggered());
    }

    #[tokio::test]
    async fn trigger_is_seen_by_clones() {
        let (handle, interrupt) = interrupt_pair();
        let clone = interrupt.clone();

        handle.trigger();

        assert!(interrupt.is_triggered());
        clone.triggered().await;
    }

    #[tokio::test]
    async fn deadline_raises_interrupt() {
        let (handle, interrupt) = interrupt_pair();
        handle.trigger_after(Duration::from_millis(10));

        tokio::time::timeout(Duration::from_secs(5), interrupt.triggered())
            .await
            .expect("deadline should raise the interrupt");
    }
}
