//! Z-order operations for design state.
//!
//! Moves at the edge of the stack are no-ops and do not create a history
//! step.

use printkit_core::DocumentError;

use super::DesignState;
use crate::model::{LayerId, View};

impl DesignState {
    /// Reorder the view to exactly `ordered_ids` (bottom to top)
    pub fn reorder_layers(&mut self, view_id: &str, ordered_ids: &[LayerId]) -> Result<(), DocumentError> {
        self.edit("reorder_layers", |doc| doc.view_mut(view_id)?.reorder(ordered_ids))
    }

    pub fn move_layer_forward(&mut self, view_id: &str, layer_id: &str) -> Result<bool, DocumentError> {
        self.move_layer("move_layer_forward", view_id, layer_id, View::move_forward)
    }

    pub fn move_layer_backward(&mut self, view_id: &str, layer_id: &str) -> Result<bool, DocumentError> {
        self.move_layer("move_layer_backward", view_id, layer_id, View::move_backward)
    }

    pub fn move_layer_to_front(&mut self, view_id: &str, layer_id: &str) -> Result<bool, DocumentError> {
        self.move_layer("move_layer_to_front", view_id, layer_id, View::move_to_front)
    }

    pub fn move_layer_to_back(&mut self, view_id: &str, layer_id: &str) -> Result<bool, DocumentError> {
        self.move_layer("move_layer_to_back", view_id, layer_id, View::move_to_back)
    }

    fn move_layer(
        &mut self,
        action: &'static str,
        view_id: &str,
        layer_id: &str,
        op: fn(&mut View, &str) -> bool,
    ) -> Result<bool, DocumentError> {
        self.document.layer(view_id, layer_id)?;

        let mut next = self.document.clone();
        let moved = op(next.view_mut(view_id)?, layer_id);
        if moved {
            self.commit(action, next);
        }
        Ok(moved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Layer, ShapeData, ShapeType, Transform};
    use crate::product::tshirt_template;

    fn state_with(ids: &[&str]) -> DesignState {
        let mut state = DesignState::new();
        state.initialize(&tshirt_template());
        for id in ids {
            let layer = Layer::shape(
                *id,
                Transform::default(),
                ShapeData::new(ShapeType::Triangle, "#123456"),
            )
            .with_id(*id);
            state.add_layer("front", layer).unwrap();
        }
        state
    }

    fn order(state: &DesignState) -> Vec<LayerId> {
        state.document().views["front"].layer_ids()
    }

    #[test]
    fn test_to_back_and_forward() {
        let mut state = state_with(&["A", "B", "C"]);
        assert!(state.move_layer_to_back("front", "C").unwrap());
        assert_eq!(order(&state), ["C", "A", "B"]);

        let mut state = state_with(&["A", "B", "C"]);
        assert!(state.move_layer_forward("front", "A").unwrap());
        assert_eq!(order(&state), ["B", "A", "C"]);
    }

    #[test]
    fn test_edge_moves_are_not_recorded() {
        let mut state = state_with(&["A", "B"]);
        let steps = state.past_len();
        assert!(!state.move_layer_to_front("front", "B").unwrap());
        assert!(!state.move_layer_backward("front", "A").unwrap());
        assert_eq!(state.past_len(), steps);
        assert!(state.move_layer_forward("front", "Z").is_err());
    }

    #[test]
    fn test_reorder_is_undoable() {
        let mut state = state_with(&["A", "B", "C"]);
        let ids: Vec<LayerId> = ["B", "C", "A"].iter().map(|s| s.to_string()).collect();
        state.reorder_layers("front", &ids).unwrap();
        assert_eq!(order(&state), ["B", "C", "A"]);
        assert!(state.undo());
        assert_eq!(order(&state), ["A", "B", "C"]);

        let partial: Vec<LayerId> = vec!["A".to_string()];
        assert!(matches!(
            state.reorder_layers("front", &partial),
            Err(DocumentError::InvalidLayerOrder { .. })
        ));
    }
}
