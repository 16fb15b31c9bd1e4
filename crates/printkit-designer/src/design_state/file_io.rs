//! JSON import/export and file save/load for design state.

use std::path::Path;

use super::DesignState;
use crate::serialization;

impl DesignState {
    /// Current document as pretty JSON
    pub fn export_json(&self) -> serde_json::Result<String> {
        serialization::export_json(&self.document)
    }

    /// Replace the document with the one in `json` as an undoable step.
    ///
    /// Returns false, leaving the current document untouched, when the
    /// payload is rejected.
    pub fn import_json(&mut self, json: &str) -> bool {
        match serialization::import_json(json) {
            Some(document) => {
                let id = document.id.clone();
                self.replace("import", document);
                tracing::info!("Imported design {}", id);
                true
            }
            None => false,
        }
    }

    /// Save design to file.
    pub fn save_to_file(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        serialization::save_to_file(&self.document, path)
    }

    /// Load design from file as an undoable step.
    pub fn load_from_file(&mut self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let document = serialization::load_from_file(path)?;
        self.replace("load", document);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Layer, TextData, Transform};
    use crate::product::{mug_template, tshirt_template};

    #[test]
    fn test_import_is_single_undo_step() {
        let mut source = DesignState::new();
        source.initialize(&mug_template());
        source
            .add_layer(
                "wrap",
                Layer::text("Hello", Transform::default(), TextData::new("Hello")),
            )
            .unwrap();
        let json = source.export_json().unwrap();

        let mut state = DesignState::new();
        state.initialize(&tshirt_template());
        let steps = state.past_len();
        assert!(state.import_json(&json));
        assert_eq!(state.past_len(), steps + 1);
        assert_eq!(state.document().product_template_id, "mug-classic");

        assert!(state.undo());
        assert_eq!(state.document().product_template_id, "tshirt-classic");
    }

    #[test]
    fn test_rejected_import_keeps_document() {
        let mut state = DesignState::new();
        state.initialize(&tshirt_template());
        let before = state.document().clone();
        assert!(!state.import_json("{\"version\": \"1.0.0\"}"));
        assert_eq!(state.document(), &before);
    }

    #[test]
    fn test_save_and_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shirt.json");

        let mut state = DesignState::new();
        state.initialize(&tshirt_template());
        state.set_name("Team shirt");
        state.save_to_file(&path).unwrap();

        let mut other = DesignState::new();
        other.load_from_file(&path).unwrap();
        assert_eq!(other.document().name, "Team shirt");
        assert!(other.can_undo());
    }
}
