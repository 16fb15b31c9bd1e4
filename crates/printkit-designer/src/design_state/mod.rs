//! History-wrapped design state.
//!
//! Every document mutation goes through [`DesignState`], which records a
//! snapshot for undo, refreshes `updatedAt` and publishes a change event.
//!
//! This module is split into submodules:
//! - `layers`: add, patch, duplicate and remove layers
//! - `ordering`: z-order moves and reorders
//! - `file_io`: JSON import/export and file save/load

mod file_io;
mod layers;
mod ordering;

use printkit_core::{DocumentError, EventBus};
use std::sync::Arc;

use crate::events::{DocumentEvent, EditorEvent, HistoryEvent};
use crate::history::{History, DEFAULT_HISTORY_CAPACITY};
use crate::model::Document;
use crate::product::ProductTemplate;

/// The live document plus its undo/redo history
pub struct DesignState {
    document: Document,
    history: History<Document>,
    bus: Arc<EventBus<EditorEvent>>,
}

impl DesignState {
    /// Blank document with a private event bus
    pub fn new() -> Self {
        Self::with_bus(Arc::new(EventBus::new()), DEFAULT_HISTORY_CAPACITY)
    }

    /// Blank document publishing on `bus`
    pub fn with_bus(bus: Arc<EventBus<EditorEvent>>, history_capacity: usize) -> Self {
        Self {
            document: Document::new(),
            history: History::new(history_capacity),
            bus,
        }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn bus(&self) -> &Arc<EventBus<EditorEvent>> {
        &self.bus
    }

    /// Start a new design on `template`, discarding prior content.
    ///
    /// The new design gets a fresh id, name and timestamps. Initializing a
    /// blank document starts history afresh; replacing a design is an
    /// undoable step.
    pub fn initialize(&mut self, template: &ProductTemplate) {
        let blank = !self.document.is_initialized() && self.document.layer_count() == 0;
        let next = Document::for_template(template);

        if blank {
            self.document = next;
            self.clear_history();
            self.publish_change("initialize");
        } else {
            self.commit("initialize", next);
        }
        tracing::info!(
            "Design {} initialized for template {}",
            self.document.id,
            template.id
        );
    }

    /// Replace the document wholesale as one undoable step
    pub fn load(&mut self, document: Document) -> Result<(), DocumentError> {
        document.check_invariants()?;
        tracing::info!(
            "Loading design {} ({} layers)",
            document.id,
            document.layer_count()
        );
        self.replace("load", document);
        Ok(())
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        let mut next = self.document.clone();
        next.name = name.into();
        self.commit("set_name", next);
    }

    /// Restore the previous snapshot. Returns false when there is none.
    pub fn undo(&mut self) -> bool {
        let Some(previous) = self.history.undo(self.document.clone()) else {
            return false;
        };
        self.document = previous;
        self.publish_history(HistoryEvent::Undone {
            past: self.history.past_len(),
            future: self.history.future_len(),
        });
        self.publish_change("undo");
        true
    }

    /// Re-apply the last undone snapshot. Returns false when there is none.
    pub fn redo(&mut self) -> bool {
        let Some(next) = self.history.redo(self.document.clone()) else {
            return false;
        };
        self.document = next;
        self.publish_history(HistoryEvent::Redone {
            past: self.history.past_len(),
            future: self.history.future_len(),
        });
        self.publish_change("redo");
        true
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn past_len(&self) -> usize {
        self.history.past_len()
    }

    pub fn future_len(&self) -> usize {
        self.history.future_len()
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
        self.publish_history(HistoryEvent::Cleared);
    }

    /// Apply `f` to a working copy and commit it if it succeeds. The live
    /// document is untouched on error.
    pub(crate) fn edit<R>(
        &mut self,
        action: &'static str,
        f: impl FnOnce(&mut Document) -> Result<R, DocumentError>,
    ) -> Result<R, DocumentError> {
        let mut next = self.document.clone();
        let out = f(&mut next)?;
        self.commit(action, next);
        Ok(out)
    }

    /// Make `next` the live document with a fresh `updatedAt`, recording
    /// the current one for undo
    pub(crate) fn commit(&mut self, action: &'static str, mut next: Document) {
        next.touch();
        self.replace(action, next);
    }

    /// Like [`commit`](Self::commit) but keeps `next` byte-for-byte, for
    /// wholesale loads
    pub(crate) fn replace(&mut self, action: &'static str, next: Document) {
        let previous = std::mem::replace(&mut self.document, next);
        self.history.record(previous);
        tracing::debug!("{} on design {}", action, self.document.id);
        self.publish_change(action);
    }

    fn publish_change(&self, action: &'static str) {
        self.bus
            .publish(EditorEvent::Document(DocumentEvent::Changed {
                action,
                document: Arc::new(self.document.clone()),
            }))
            .ok();
    }

    fn publish_history(&self, event: HistoryEvent) {
        self.bus.publish(EditorEvent::History(event)).ok();
    }
}

impl Default for DesignState {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for DesignState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DesignState")
            .field("document", &self.document.id)
            .field("layers", &self.document.layer_count())
            .field("past", &self.history.past_len())
            .field("future", &self.history.future_len())
            .finish()
    }
}
