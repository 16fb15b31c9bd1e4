//! Editor events published on the session's event bus.
//!
//! Events are cloneable snapshots; document events carry the document as it
//! was right after the change so consumers (autosave) never read a
//! half-applied state.

use std::sync::Arc;

use crate::model::Document;

/// Root event enum for the editor
#[derive(Debug, Clone)]
pub enum EditorEvent {
    /// Document mutations
    Document(DocumentEvent),
    /// Undo/redo stack changes
    History(HistoryEvent),
    /// Local persistence results
    Persistence(PersistenceEvent),
}

impl EditorEvent {
    /// Short description for logging
    pub fn description(&self) -> String {
        match self {
            EditorEvent::Document(e) => e.description(),
            EditorEvent::History(e) => e.description(),
            EditorEvent::Persistence(e) => e.description(),
        }
    }

    /// The document snapshot of a change event
    pub fn changed_document(&self) -> Option<&Arc<Document>> {
        match self {
            EditorEvent::Document(DocumentEvent::Changed { document, .. }) => Some(document),
            _ => None,
        }
    }
}

/// Document-related events
#[derive(Debug, Clone)]
pub enum DocumentEvent {
    /// The document changed; `action` names the operation.
    Changed {
        action: &'static str,
        document: Arc<Document>,
    },
}

impl DocumentEvent {
    fn description(&self) -> String {
        match self {
            DocumentEvent::Changed { action, document } => {
                format!("Document {} changed by {}", document.id, action)
            }
        }
    }
}

/// History-related events
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HistoryEvent {
    Undone { past: usize, future: usize },
    Redone { past: usize, future: usize },
    Cleared,
}

impl HistoryEvent {
    fn description(&self) -> String {
        match self {
            HistoryEvent::Undone { past, future } => {
                format!("Undo ({} back, {} forward)", past, future)
            }
            HistoryEvent::Redone { past, future } => {
                format!("Redo ({} back, {} forward)", past, future)
            }
            HistoryEvent::Cleared => "History cleared".to_string(),
        }
    }
}

/// Persistence-related events
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersistenceEvent {
    Saved { document_id: String },
    SaveFailed { document_id: String, reason: String },
}

impl PersistenceEvent {
    fn description(&self) -> String {
        match self {
            PersistenceEvent::Saved { document_id } => format!("Saved design {}", document_id),
            PersistenceEvent::SaveFailed {
                document_id,
                reason,
            } => format!("Failed to save design {}: {}", document_id, reason),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use printkit_core::EventBus;

    #[tokio::test]
    async fn test_history_events_reach_receivers() {
        let bus: EventBus<EditorEvent> = EventBus::new();
        let mut rx = bus.receiver();

        bus.publish(EditorEvent::Document(DocumentEvent::Changed {
            action: "add_layer",
            document: Arc::new(Document::new()),
        }))
        .unwrap();
        bus.publish(EditorEvent::History(HistoryEvent::Cleared)).unwrap();

        let first = rx.recv().await.unwrap();
        assert_eq!(first.changed_document().map(|d| d.layer_count()), Some(0));
        assert!(matches!(
            rx.recv().await.unwrap(),
            EditorEvent::History(HistoryEvent::Cleared)
        ));
    }

    #[test]
    fn test_descriptions() {
        let event = EditorEvent::History(HistoryEvent::Undone { past: 1, future: 2 });
        assert_eq!(event.description(), "Undo (1 back, 2 forward)");
        assert!(event.changed_document().is_none());
    }
}
