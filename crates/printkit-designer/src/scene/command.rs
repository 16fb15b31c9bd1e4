//! Commands accepted by the scene synchronizer.

use printkit_settings::ExportFormat;

use crate::model::{Layer, LayerId, TransformPatch};

/// Mirror axis of a flip
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlipDirection {
    Horizontal,
    Vertical,
}

/// Kind of pointer interaction on a node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractionKind {
    Move,
    Scale,
    Rotate,
}

/// One request to the scene, applied by
/// [`SceneSynchronizer::dispatch`](super::SceneSynchronizer::dispatch)
#[derive(Debug, Clone, PartialEq)]
pub enum SceneCommand {
    LayerAdded(Layer),
    LayersReordered(Vec<LayerId>),
    LayerTransformChanged {
        layer_id: LayerId,
        transform: TransformPatch,
    },
    LayerFlip {
        layer_id: LayerId,
        direction: FlipDirection,
    },
    ImageSourceUpdated {
        layer_id: LayerId,
        src: String,
    },
    EnterCrop {
        layer_id: LayerId,
    },
    ApplyCrop,
    CancelCrop,
    ToggleGrid,
    ToggleSnap,
    ExportRequested {
        format: ExportFormat,
        multiplier: f64,
    },
}

impl SceneCommand {
    /// Short name for logs
    pub fn name(&self) -> &'static str {
        match self {
            SceneCommand::LayerAdded(_) => "layer-added",
            SceneCommand::LayersReordered(_) => "layers-reordered",
            SceneCommand::LayerTransformChanged { .. } => "layer-transform-changed",
            SceneCommand::LayerFlip { .. } => "layer-flip",
            SceneCommand::ImageSourceUpdated { .. } => "image-source-updated",
            SceneCommand::EnterCrop { .. } => "enter-crop",
            SceneCommand::ApplyCrop => "apply-crop",
            SceneCommand::CancelCrop => "cancel-crop",
            SceneCommand::ToggleGrid => "toggle-grid",
            SceneCommand::ToggleSnap => "toggle-snap",
            SceneCommand::ExportRequested { .. } => "export-requested",
        }
    }
}
