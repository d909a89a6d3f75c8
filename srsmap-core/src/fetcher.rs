//! Background fetching of the requirement tree
//!
//! Loads the tree on a worker thread so the UI never blocks on the network.
//! Only one request is in flight at a time, and results belonging to a
//! cancelled request (or arriving after the fetcher is dropped) are discarded.

use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use crate::error::FetchError;
use crate::models::Entry;
use crate::source::EntrySource;

/// Result of one fetch, delivered to the UI thread
#[derive(Debug)]
pub struct FetchOutcome {
    /// Request number this outcome answers
    pub generation: u64,
    pub collection_id: String,
    pub result: Result<Vec<Entry>, FetchError>,
    pub finished_at: DateTime<Utc>,
}

/// Runs fetches on worker threads and hands results back through a channel
pub struct BackgroundFetcher {
    source: Arc<dyn EntrySource>,
    /// Sender cloned into each worker
    result_tx: mpsc::Sender<FetchOutcome>,
    /// Polled by the UI thread
    result_rx: mpsc::Receiver<FetchOutcome>,
    /// Latest issued request number (shared with workers)
    generation: Arc<AtomicU64>,
    /// Request currently in flight
    pending: Option<u64>,
}

impl BackgroundFetcher {
    pub fn new(source: Box<dyn EntrySource>) -> Self {
        let (result_tx, result_rx) = mpsc::channel();
        Self {
            source: Arc::from(source),
            result_tx,
            result_rx,
            generation: Arc::new(AtomicU64::new(0)),
            pending: None,
        }
    }

    /// Description of the underlying source
    pub fn describe(&self) -> String {
        self.source.describe()
    }

    /// Swaps the source; any request in flight is cancelled
    pub fn set_source(&mut self, source: Box<dyn EntrySource>) {
        self.cancel();
        self.source = Arc::from(source);
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Starts a fetch unless one is already in flight
    ///
    /// Returns `false` (and does nothing) while a previous request is pending.
    pub fn request(&mut self, collection_id: &str) -> bool {
        if self.pending.is_some() {
            log::debug!("Fetch already in progress, ignoring request");
            return false;
        }

        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.pending = Some(generation);

        let source = Arc::clone(&self.source);
        let latest = Arc::clone(&self.generation);
        let result_tx = self.result_tx.clone();
        let collection_id = collection_id.to_string();

        log::debug!(
            "Fetch #{} of collection '{}' from {}",
            generation,
            collection_id,
            source.describe()
        );

        thread::spawn(move || {
            let result = source.fetch_entries(&collection_id);

            if latest.load(Ordering::SeqCst) != generation {
                log::debug!("Discarding result of cancelled fetch #{}", generation);
                return;
            }

            let outcome = FetchOutcome {
                generation,
                collection_id,
                result,
                finished_at: Utc::now(),
            };
            if result_tx.send(outcome).is_err() {
                // Receiver dropped: the view is gone
                log::debug!("Fetch #{} finished after teardown", generation);
            }
        });

        true
    }

    /// Abandons the request in flight; its result will never be delivered
    pub fn cancel(&mut self) {
        if self.pending.take().is_some() {
            self.generation.fetch_add(1, Ordering::SeqCst);
        }
    }

    /// Non-blocking check for the current request's result
    pub fn poll(&mut self) -> Option<FetchOutcome> {
        while let Ok(outcome) = self.result_rx.try_recv() {
            if let Some(outcome) = self.accept(outcome) {
                return Some(outcome);
            }
        }
        None
    }

    /// Blocks until the current request finishes or `timeout` elapses
    pub fn wait(&mut self, timeout: Duration) -> Option<FetchOutcome> {
        let deadline = std::time::Instant::now() + timeout;
        while self.pending.is_some() {
            let remaining = deadline.saturating_duration_since(std::time::Instant::now());
            if remaining.is_zero() {
                return None;
            }
            match self.result_rx.recv_timeout(remaining) {
                Ok(outcome) => {
                    if let Some(outcome) = self.accept(outcome) {
                        return Some(outcome);
                    }
                }
                Err(_) => return None,
            }
        }
        None
    }

    fn accept(&mut self, outcome: FetchOutcome) -> Option<FetchOutcome> {
        if self.pending == Some(outcome.generation) {
            self.pending = None;
            Some(outcome)
        } else {
            log::debug!("Dropping stale fetch result #{}", outcome.generation);
            None
        }
    }
}

impl Drop for BackgroundFetcher {
    fn drop(&mut self) {
        // Workers are not joined: teardown must not wait on the network
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::SampleSource;
    use std::sync::Mutex;

    type Gate = mpsc::Sender<Result<Vec<Entry>, FetchError>>;

    /// Source whose fetches block until the test releases them
    struct GatedSource {
        gate: Mutex<mpsc::Receiver<Result<Vec<Entry>, FetchError>>>,
        done: Mutex<mpsc::Sender<()>>,
    }

    impl EntrySource for GatedSource {
        fn fetch_entries(&self, _collection_id: &str) -> Result<Vec<Entry>, FetchError> {
            let result = self
                .gate
                .lock()
                .unwrap()
                .recv()
                .unwrap_or_else(|_| Err(FetchError::Transport("gate closed".to_string())));
            let _ = self.done.lock().unwrap().send(());
            result
        }

        fn describe(&self) -> String {
            "gated".to_string()
        }
    }

    fn gated() -> (BackgroundFetcher, Gate, mpsc::Receiver<()>) {
        let (gate_tx, gate_rx) = mpsc::channel();
        let (done_tx, done_rx) = mpsc::channel();
        let fetcher = BackgroundFetcher::new(Box::new(GatedSource {
            gate: Mutex::new(gate_rx),
            done: Mutex::new(done_tx),
        }));
        (fetcher, gate_tx, done_rx)
    }

    #[test]
    fn test_fetch_delivers_entries() {
        let mut fetcher = BackgroundFetcher::new(Box::new(SampleSource::new()));
        assert!(fetcher.request("1"));
        let outcome = fetcher.wait(Duration::from_secs(5)).expect("fetch finished");
        assert_eq!(outcome.collection_id, "1");
        assert_eq!(outcome.result.unwrap().len(), 4);
        assert!(!fetcher.is_pending());
    }

    #[test]
    fn test_second_request_refused_while_pending() {
        let (mut fetcher, gate, _done) = gated();
        assert!(fetcher.request("1"));
        assert!(!fetcher.request("1"));
        gate.send(Ok(Vec::new())).unwrap();
        assert!(fetcher.wait(Duration::from_secs(5)).is_some());
        assert!(fetcher.request("1"));
    }

    #[test]
    fn test_cancelled_result_is_discarded() {
        let (mut fetcher, gate, done) = gated();
        assert!(fetcher.request("1"));
        fetcher.cancel();
        assert!(!fetcher.is_pending());
        gate.send(Ok(Vec::new())).unwrap();
        done.recv_timeout(Duration::from_secs(5)).unwrap();

        // New request gets the next gated answer; the cancelled one never shows up
        assert!(fetcher.request("2"));
        gate.send(Err(FetchError::Timeout(10))).unwrap();
        let outcome = fetcher.wait(Duration::from_secs(5)).expect("second fetch");
        assert_eq!(outcome.collection_id, "2");
        assert!(matches!(outcome.result, Err(FetchError::Timeout(10))));
        assert!(fetcher.poll().is_none());
    }

    #[test]
    fn test_drop_before_completion() {
        let (mut fetcher, gate, done) = gated();
        assert!(fetcher.request("1"));
        drop(fetcher);
        // Worker finishes after teardown without panicking
        gate.send(Ok(Vec::new())).unwrap();
        done.recv_timeout(Duration::from_secs(5)).unwrap();
    }

    #[test]
    fn test_poll_without_request() {
        let mut fetcher = BackgroundFetcher::new(Box::new(SampleSource::new()));
        assert!(fetcher.poll().is_none());
        assert!(fetcher.wait(Duration::from_millis(10)).is_none());
    }
}
