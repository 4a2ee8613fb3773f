//! Abortable text-content fetches.
//!
//! A session viewing text notes may have several blob fetches in flight;
//! navigating away aborts them all in one call. Fetches are never retried;
//! a failed fetch surfaces to whoever awaits the handle.

use std::sync::{Arc, Mutex};
use tokio::task::{AbortHandle, JoinHandle};
use tracing::debug;

use studynotes_core::{ObjectStore, Result};

/// Tracks in-flight text fetches so they can be aborted together.
pub struct ContentFetchTracker {
    objects: Arc<dyn ObjectStore>,
    inflight: Mutex<Vec<AbortHandle>>,
}

impl ContentFetchTracker {
    pub fn new(objects: Arc<dyn ObjectStore>) -> Self {
        Self {
            objects,
            inflight: Mutex::new(Vec::new()),
        }
    }

    /// Start fetching the text content stored under `key`.
    ///
    /// The returned handle yields the decoded text; dropping it does not
    /// cancel the fetch, only [`abort_all`](Self::abort_all) does.
    pub fn fetch_text(&self, key: &str) -> JoinHandle<Result<String>> {
        let objects = Arc::clone(&self.objects);
        let key = key.to_string();
        let handle = tokio::spawn(async move {
            let bytes = objects.get(&key).await?;
            Ok(String::from_utf8_lossy(&bytes).into_owned())
        });

        let mut inflight = self.inflight.lock().unwrap();
        inflight.retain(|h| !h.is_finished());
        inflight.push(handle.abort_handle());
        handle
    }

    /// Abort every tracked in-flight fetch.
    pub fn abort_all(&self) {
        let mut inflight = self.inflight.lock().unwrap();
        let count = inflight.len();
        for handle in inflight.drain(..) {
            handle.abort();
        }
        debug!(
            subsystem = "store",
            component = "fetch",
            op = "abort_all",
            result_count = count
        );
    }

    /// Number of fetches still tracked (finished handles are pruned on the
    /// next `fetch_text`).
    pub fn inflight_count(&self) -> usize {
        self.inflight.lock().unwrap().len()
    }
}
