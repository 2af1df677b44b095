//! Degrade notice fan-out.
//!
//! Notices go out two ways: a broadcast channel anyone can
//! [`subscribe`](Notifier::subscribe) to, and registered [`Observer`]s that
//! each run on their own task. Neither can block or fail the fetch that
//! raised the notice.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use keepsake_core::DegradeNotice;
use tokio::runtime::Handle;
use tokio::sync::broadcast;
use tracing::{Instrument, debug, info_span, warn};

use crate::config::NoticeCapacity;
use crate::metrics;

/// Boxed error returned by observers.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Receives degrade notices.
///
/// Each call runs on a task spawned on the current tokio runtime. An `Err`
/// or a panic is logged and otherwise ignored. Notices emitted outside a
/// runtime skip observers and only reach subscribers.
#[async_trait]
pub trait Observer: Send + Sync + 'static {
    /// Handles one notice.
    async fn on_degrade(&self, notice: DegradeNotice) -> Result<(), BoxError>;
}

/// Broadcasts degrade notices to subscribers and observers.
#[derive(Clone)]
pub struct Notifier {
    tx: broadcast::Sender<DegradeNotice>,
    observers: Arc<[Arc<dyn Observer>]>,
}

impl Notifier {
    /// Creates a notifier whose channel buffers `capacity` notices.
    pub fn new(capacity: NoticeCapacity, observers: Vec<Arc<dyn Observer>>) -> Self {
        let (tx, _rx) = broadcast::channel(usize::from(capacity.get()));
        Self {
            tx,
            observers: observers.into(),
        }
    }

    /// Subscribes to notices sent from now on.
    ///
    /// A receiver that falls more than the channel capacity behind gets
    /// `RecvError::Lagged` and skips the oldest notices.
    pub fn subscribe(&self) -> broadcast::Receiver<DegradeNotice> {
        self.tx.subscribe()
    }

    /// Number of registered observers.
    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }

    /// Sends `notice` to every subscriber and observer without waiting.
    pub fn emit(&self, notice: DegradeNotice) {
        metrics::record_notification();

        if !self.observers.is_empty() {
            match Handle::try_current() {
                Ok(runtime) => self.spawn_observers(&runtime, &notice),
                Err(error) => warn!(
                    address = %notice.address,
                    observers = self.observers.len(),
                    %error,
                    "Degrade observers skipped, no tokio runtime"
                ),
            }
        }

        let address = notice.address.clone();
        match self.tx.send(notice) {
            Ok(receivers) => debug!(%address, receivers, "Degrade notice sent"),
            Err(_) => debug!(%address, "Degrade notice dropped, no subscribers"),
        }
    }

    fn spawn_observers(&self, runtime: &Handle, notice: &DegradeNotice) {
        for observer in self.observers.iter() {
            let observer = Arc::clone(observer);
            let notice = notice.clone();
            let span = info_span!("degrade_observer", address = %notice.address);
            runtime.spawn(
                async move {
                    if let Err(error) = observer.on_degrade(notice).await {
                        warn!(%error, "Degrade observer failed");
                    }
                }
                .instrument(span),
            );
        }
    }
}

impl fmt::Debug for Notifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Notifier")
            .field("subscribers", &self.tx.receiver_count())
            .field("observers", &self.observers.len())
            .finish()
    }
}

#[async_trait]
impl<F> Observer for F
where
    F: Fn(DegradeNotice) -> Result<(), BoxError> + Send + Sync + 'static,
{
    async fn on_degrade(&self, notice: DegradeNotice) -> Result<(), BoxError> {
        self(notice)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::sync::mpsc;

    fn capacity(n: u16) -> NoticeCapacity {
        NoticeCapacity::new(n).unwrap()
    }

    fn notice(path: &str) -> DegradeNotice {
        DegradeNotice::failed(path.into(), "offline")
    }

    #[tokio::test]
    async fn test_emit_without_subscribers_is_fine() {
        let notifier = Notifier::new(capacity(4), Vec::new());
        notifier.emit(notice("/nobody"));
    }

    #[tokio::test]
    async fn test_subscriber_receives_notice() {
        let notifier = Notifier::new(capacity(4), Vec::new());
        let mut rx = notifier.subscribe();
        notifier.emit(notice("/a"));

        let received = rx.recv().await.unwrap();
        assert_eq!(received.address.as_str(), "/a");
        assert_eq!(received.message(), "offline");
    }

    #[tokio::test]
    async fn test_lagging_subscriber_loses_oldest() {
        let notifier = Notifier::new(capacity(2), Vec::new());
        let mut rx = notifier.subscribe();
        for i in 0..5 {
            notifier.emit(notice(&format!("/{i}")));
        }

        assert!(matches!(
            rx.recv().await,
            Err(broadcast::error::RecvError::Lagged(3))
        ));
        assert_eq!(rx.recv().await.unwrap().address.as_str(), "/3");
    }

    #[tokio::test]
    async fn test_failing_observer_does_not_affect_others() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let failing: Arc<dyn Observer> =
            Arc::new(|_: DegradeNotice| -> Result<(), BoxError> { Err("observer down".into()) });
        let panicking: Arc<dyn Observer> =
            Arc::new(|_: DegradeNotice| -> Result<(), BoxError> { panic!("observer bug") });
        let recording: Arc<dyn Observer> = Arc::new(move |n: DegradeNotice| -> Result<(), BoxError> {
            tx.send(n.address.to_string())?;
            Ok(())
        });

        let notifier = Notifier::new(capacity(4), vec![failing, panicking, recording]);
        notifier.emit(notice("/isolated"));

        let seen = tokio::time::timeout(Duration::from_secs(1), rx.recv())
            .await
            .unwrap();
        assert_eq!(seen.as_deref(), Some("/isolated"));
    }

    #[test]
    fn test_emit_outside_runtime_still_reaches_subscribers() {
        let calls = Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let observer: Arc<dyn Observer> = Arc::new(move |_: DegradeNotice| -> Result<(), BoxError> {
            counter.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            Ok(())
        });
        let notifier = Notifier::new(capacity(4), vec![observer]);
        let mut rx = notifier.subscribe();

        notifier.emit(notice("/no-runtime"));

        assert_eq!(rx.try_recv().unwrap().address.as_str(), "/no-runtime");
        assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 0);
    }
}
