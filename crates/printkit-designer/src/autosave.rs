//! Debounced autosave.
//!
//! A background task listens for document changes on the event bus and
//! writes the latest document once edits have been quiet for the configured
//! delay. Bursts of edits coalesce into one write. Dropping the handle
//! cancels any pending write.

use printkit_core::EventBus;
use printkit_settings::AutosaveSettings;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::events::{EditorEvent, PersistenceEvent};
use crate::model::Document;
use crate::storage::LocalDesignStore;

/// Handle to a running autosave task
#[derive(Debug)]
pub struct AutosaveHandle {
    task: JoinHandle<()>,
}

impl AutosaveHandle {
    /// Start autosaving documents published on `bus` into `store`
    pub fn spawn(
        bus: Arc<EventBus<EditorEvent>>,
        store: LocalDesignStore,
        delay: Duration,
    ) -> Self {
        let mut rx = bus.receiver();
        let task = tokio::spawn(async move {
            let mut pending: Option<Arc<Document>> = None;
            let mut deadline = Instant::now();

            loop {
                tokio::select! {
                    received = rx.recv() => match received {
                        Ok(event) => {
                            if let Some(document) = event.changed_document() {
                                pending = Some(document.clone());
                                deadline = Instant::now() + delay;
                            }
                        }
                        Err(RecvError::Lagged(skipped)) => {
                            tracing::debug!("Autosave lagged by {} events", skipped);
                        }
                        Err(RecvError::Closed) => break,
                    },
                    _ = tokio::time::sleep_until(deadline), if pending.is_some() => {
                        if let Some(document) = pending.take() {
                            save(&bus, &store, &document);
                        }
                    }
                }
            }
            tracing::debug!("Autosave stopped");
        });
        Self { task }
    }

    /// Start from settings; `None` when autosave is disabled
    pub fn from_settings(
        settings: &AutosaveSettings,
        bus: Arc<EventBus<EditorEvent>>,
        store: LocalDesignStore,
    ) -> Option<Self> {
        settings
            .enabled
            .then(|| Self::spawn(bus, store, Duration::from_millis(settings.delay_ms)))
    }

    /// Abort the task, dropping any pending write
    pub fn cancel(&self) {
        self.task.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for AutosaveHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

fn save(bus: &EventBus<EditorEvent>, store: &LocalDesignStore, document: &Document) {
    if !document.is_initialized() {
        tracing::debug!("Skipping autosave of unbound design {}", document.id);
        return;
    }
    let event = if store.save_local(document) {
        PersistenceEvent::Saved {
            document_id: document.id.clone(),
        }
    } else {
        PersistenceEvent::SaveFailed {
            document_id: document.id.clone(),
            reason: "local storage rejected the write".to_string(),
        }
    };
    bus.publish(EditorEvent::Persistence(event)).ok();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::design_state::DesignState;
    use crate::product::mug_template;
    use printkit_settings::MemoryStore;

    fn setup() -> (DesignState, MemoryStore, AutosaveHandle) {
        let state = DesignState::new();
        let memory = MemoryStore::new();
        let store = LocalDesignStore::new(Arc::new(memory.clone()));
        let handle = AutosaveHandle::spawn(state.bus().clone(), store, Duration::from_millis(1000));
        (state, memory, handle)
    }

    async fn advance(ms: u64) {
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_burst_is_coalesced() {
        let (mut state, memory, _handle) = setup();
        let store = LocalDesignStore::new(Arc::new(memory.clone()));
        state.initialize(&mug_template());
        for i in 0..5 {
            state.set_name(format!("Draft {}", i));
            advance(200).await;
        }
        assert!(memory.is_empty());

        advance(1000).await;
        let saved = store.load_local(&state.document().id).unwrap();
        assert_eq!(saved.name, "Draft 4");
    }

    #[tokio::test(start_paused = true)]
    async fn test_unbound_document_is_not_saved() {
        let (mut state, memory, _handle) = setup();
        state.set_name("Nothing yet");
        advance(1500).await;
        assert!(memory.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_drops_pending_write() {
        let (mut state, memory, handle) = setup();
        state.initialize(&mug_template());
        advance(500).await;
        handle.cancel();
        advance(2000).await;
        assert!(memory.is_empty());
        assert!(handle.is_finished());
    }

    #[tokio::test(start_paused = true)]
    async fn test_save_publishes_persistence_event() {
        let (mut state, _memory, _handle) = setup();
        let mut rx = state.bus().receiver();
        state.initialize(&mug_template());
        advance(1100).await;

        let mut saved = false;
        while let Ok(event) = rx.try_recv() {
            if let EditorEvent::Persistence(PersistenceEvent::Saved { document_id }) = event {
                saved = document_id == state.document().id;
            }
        }
        assert!(saved);
    }
}
