//! Live resource lists.
//!
//! The fetch-with-refetch abstraction behind every list view: hold
//! `{data, loading, error}`, expose `refetch()`, and optionally follow
//! the change-event channel so the list refreshes itself when the server
//! announces a mutation. A generation counter discards responses from
//! requests that were superseded while in flight, and dropping the list
//! aborts its subscription task so no listener outlives its view.

use crate::client::{ApiClient, ClientError};
use crate::realtime::{ChangeEvent, ResourceKind};
use futures_util::StreamExt;
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::debug;

/// Snapshot of a list view's state.
#[derive(Debug, Clone)]
pub struct LiveState<T> {
    pub data: Option<T>,
    pub loading: bool,
    pub error: Option<String>,
}

impl<T> Default for LiveState<T> {
    fn default() -> Self {
        Self {
            data: None,
            loading: false,
            error: None,
        }
    }
}

pub struct LiveList<T> {
    client: ApiClient,
    path: String,
    state: Arc<Mutex<LiveState<T>>>,
    generation: Arc<AtomicU64>,
    watcher: Option<JoinHandle<()>>,
}

impl<T> LiveList<T>
where
    T: DeserializeOwned + Send + 'static,
{
    pub fn new(client: ApiClient, path: &str) -> Self {
        Self {
            client,
            path: path.to_string(),
            state: Arc::new(Mutex::new(LiveState::default())),
            generation: Arc::new(AtomicU64::new(0)),
            watcher: None,
        }
    }

    pub fn state(&self) -> LiveState<T>
    where
        T: Clone,
    {
        self.state.lock().clone()
    }

    /// Fetch the endpoint and replace the held data. A refetch started
    /// after this one supersedes it: the stale response is dropped.
    pub async fn refetch(&self) {
        fetch_once(
            &self.client,
            &self.path,
            &self.state,
            &self.generation,
        )
        .await;
    }

    /// Subscribe to the change-event channel and refetch whenever the
    /// given resource kind changes. Replaces any previous subscription.
    pub fn watch(&mut self, kind: ResourceKind) {
        self.unwatch();

        let client = self.client.clone();
        let path = self.path.clone();
        let state = Arc::clone(&self.state);
        let generation = Arc::clone(&self.generation);

        self.watcher = Some(tokio::spawn(async move {
            let url = client.ws_url();
            loop {
                let (mut stream, _) = match connect_async(&url).await {
                    Ok(conn) => conn,
                    Err(e) => {
                        debug!(error = %e, "Change-event connect failed, retrying");
                        tokio::time::sleep(Duration::from_secs(1)).await;
                        continue;
                    }
                };

                while let Some(frame) = stream.next().await {
                    let text = match frame {
                        Ok(Message::Text(text)) => text,
                        Ok(Message::Close(_)) | Err(_) => break,
                        Ok(_) => continue,
                    };
                    let Ok(event) = serde_json::from_str::<ChangeEvent>(&text) else {
                        continue;
                    };
                    if event.event == kind.event_name() {
                        debug!(event = %event.event, "Change event received, refetching");
                        fetch_once(&client, &path, &state, &generation).await;
                    }
                }
                // Connection dropped; reconnect after a beat.
                tokio::time::sleep(Duration::from_secs(1)).await;
            }
        }));
    }

    /// Stop following change events.
    pub fn unwatch(&mut self) {
        if let Some(watcher) = self.watcher.take() {
            watcher.abort();
        }
    }
}

impl<T> Drop for LiveList<T> {
    fn drop(&mut self) {
        if let Some(watcher) = self.watcher.take() {
            watcher.abort();
        }
    }
}

async fn fetch_once<T: DeserializeOwned>(
    client: &ApiClient,
    path: &str,
    state: &Arc<Mutex<LiveState<T>>>,
    generation: &Arc<AtomicU64>,
) {
    let my_generation = generation.fetch_add(1, Ordering::SeqCst) + 1;
    state.lock().loading = true;

    let result: Result<T, ClientError> = client.get_json(path).await;
    apply_fetch_result(state, generation, my_generation, result);
}

fn apply_fetch_result<T>(
    state: &Arc<Mutex<LiveState<T>>>,
    generation: &Arc<AtomicU64>,
    my_generation: u64,
    result: Result<T, ClientError>,
) {
    // A newer fetch started while this one was in flight; its answer
    // wins, ours is stale.
    if generation.load(Ordering::SeqCst) != my_generation {
        return;
    }

    let mut s = state.lock();
    s.loading = false;
    match result {
        Ok(data) => {
            s.data = Some(data);
            s.error = None;
        }
        Err(e) => {
            s.error = Some(e.to_string());
        }
    }
}
