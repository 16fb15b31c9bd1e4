//! The design document: views of z-ordered layers.

use chrono::{DateTime, Utc};
use printkit_core::DocumentError;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

use super::layer::{generate_id, Layer, LayerId};
use crate::product::ProductTemplate;

/// Format version written to and required from document JSON
pub const DOCUMENT_VERSION: &str = "1.0.0";

/// Name given to freshly created documents
pub const DEFAULT_DOCUMENT_NAME: &str = "Untitled Design";

/// Identifier of a product view (e.g. `front`)
pub type ViewId = String;

/// One printable face of the product and its layer stack.
///
/// `layers[0]` is painted first (bottommost).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct View {
    pub view_id: ViewId,
    pub layers: Vec<Layer>,
    /// Fill color behind the layers, when the design sets one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
}

impl View {
    pub fn new(view_id: impl Into<ViewId>) -> Self {
        Self {
            view_id: view_id.into(),
            layers: Vec::new(),
            background_color: None,
        }
    }

    pub fn layer(&self, layer_id: &str) -> Option<&Layer> {
        self.layers.iter().find(|l| l.id == layer_id)
    }

    pub fn layer_mut(&mut self, layer_id: &str) -> Option<&mut Layer> {
        self.layers.iter_mut().find(|l| l.id == layer_id)
    }

    pub fn index_of(&self, layer_id: &str) -> Option<usize> {
        self.layers.iter().position(|l| l.id == layer_id)
    }

    /// Layer ids bottom to top
    pub fn layer_ids(&self) -> Vec<LayerId> {
        self.layers.iter().map(|l| l.id.clone()).collect()
    }

    /// Swap with the layer above. Returns false at the top or when missing.
    pub fn move_forward(&mut self, layer_id: &str) -> bool {
        match self.index_of(layer_id) {
            Some(i) if i + 1 < self.layers.len() => {
                self.layers.swap(i, i + 1);
                true
            }
            _ => false,
        }
    }

    /// Swap with the layer below. Returns false at the bottom or when missing.
    pub fn move_backward(&mut self, layer_id: &str) -> bool {
        match self.index_of(layer_id) {
            Some(i) if i > 0 => {
                self.layers.swap(i, i - 1);
                true
            }
            _ => false,
        }
    }

    /// Move to the top of the stack
    pub fn move_to_front(&mut self, layer_id: &str) -> bool {
        match self.index_of(layer_id) {
            Some(i) if i + 1 < self.layers.len() => {
                let layer = self.layers.remove(i);
                self.layers.push(layer);
                true
            }
            _ => false,
        }
    }

    /// Move to the bottom of the stack
    pub fn move_to_back(&mut self, layer_id: &str) -> bool {
        match self.index_of(layer_id) {
            Some(i) if i > 0 => {
                let layer = self.layers.remove(i);
                self.layers.insert(0, layer);
                true
            }
            _ => false,
        }
    }

    /// Reorder to exactly `ordered_ids`, which must be a permutation of the
    /// current layer ids.
    pub fn reorder(&mut self, ordered_ids: &[LayerId]) -> Result<(), DocumentError> {
        let invalid = || DocumentError::InvalidLayerOrder {
            view_id: self.view_id.clone(),
            expected: self.layers.len(),
            actual: ordered_ids.len(),
        };

        if ordered_ids.len() != self.layers.len() {
            return Err(invalid());
        }
        let requested: HashSet<&str> = ordered_ids.iter().map(String::as_str).collect();
        let current: HashSet<&str> = self.layers.iter().map(|l| l.id.as_str()).collect();
        if requested.len() != ordered_ids.len() || requested != current {
            return Err(invalid());
        }

        let mut remaining = std::mem::take(&mut self.layers);
        for id in ordered_ids {
            if let Some(i) = remaining.iter().position(|l| &l.id == id) {
                self.layers.push(remaining.swap_remove(i));
            }
        }
        Ok(())
    }
}

/// A complete design for one product template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub version: String,
    pub id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub product_template_id: String,
    pub views: BTreeMap<ViewId, View>,
    #[serde(default)]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Empty document, not yet bound to a template
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            version: DOCUMENT_VERSION.to_string(),
            id: generate_id(),
            name: DEFAULT_DOCUMENT_NAME.to_string(),
            created_at: now,
            updated_at: now,
            product_template_id: String::new(),
            views: BTreeMap::new(),
            metadata: serde_json::Map::new(),
        }
    }

    /// Empty document with one empty view per template view
    pub fn for_template(template: &ProductTemplate) -> Self {
        Self {
            product_template_id: template.id.clone(),
            views: template
                .views
                .iter()
                .map(|v| (v.id.clone(), View::new(v.id.clone())))
                .collect(),
            ..Self::new()
        }
    }

    /// Whether the document has been bound to a template
    pub fn is_initialized(&self) -> bool {
        !self.product_template_id.is_empty()
    }

    /// Refresh `updated_at`
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    pub fn view(&self, view_id: &str) -> Result<&View, DocumentError> {
        self.views.get(view_id).ok_or_else(|| DocumentError::UnknownView {
            view_id: view_id.to_string(),
        })
    }

    pub fn view_mut(&mut self, view_id: &str) -> Result<&mut View, DocumentError> {
        self.views
            .get_mut(view_id)
            .ok_or_else(|| DocumentError::UnknownView {
                view_id: view_id.to_string(),
            })
    }

    pub fn layer(&self, view_id: &str, layer_id: &str) -> Result<&Layer, DocumentError> {
        self.view(view_id)?
            .layer(layer_id)
            .ok_or_else(|| DocumentError::UnknownLayer {
                view_id: view_id.to_string(),
                layer_id: layer_id.to_string(),
            })
    }

    pub fn layer_mut(&mut self, view_id: &str, layer_id: &str) -> Result<&mut Layer, DocumentError> {
        self.view_mut(view_id)?
            .layer_mut(layer_id)
            .ok_or_else(|| DocumentError::UnknownLayer {
                view_id: view_id.to_string(),
                layer_id: layer_id.to_string(),
            })
    }

    /// Whether any view holds a layer with this id
    pub fn contains_layer(&self, layer_id: &str) -> bool {
        self.views.values().any(|v| v.layer(layer_id).is_some())
    }

    /// Total number of layers across views
    pub fn layer_count(&self) -> usize {
        self.views.values().map(|v| v.layers.len()).sum()
    }

    /// Check the structural invariants: version literal, view keys matching
    /// their `viewId`, document-wide unique layer ids and valid transforms.
    pub fn check_invariants(&self) -> Result<(), DocumentError> {
        let mut seen = HashSet::new();
        for (key, view) in &self.views {
            if key != &view.view_id {
                return Err(DocumentError::UnknownView {
                    view_id: view.view_id.clone(),
                });
            }
            for layer in &view.layers {
                if !seen.insert(layer.id.as_str()) {
                    return Err(DocumentError::DuplicateLayerId {
                        layer_id: layer.id.clone(),
                    });
                }
                layer
                    .transform
                    .check()
                    .map_err(|reason| DocumentError::InvalidTransform {
                        layer_id: layer.id.clone(),
                        reason,
                    })?;
            }
        }
        Ok(())
    }
}
