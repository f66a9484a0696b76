use graph_layout::Vec2;
use layerwerk_data::DEFAULT_NODE_SIZE;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoordinatorConfig {
    /// Size of nodes that carry no size of their own
    pub default_node_size: Vec2,

    /// How far past the outer layers a drop still counts as inserting a
    /// new first or last layer
    pub band_margin: f32,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            default_node_size: DEFAULT_NODE_SIZE,
            band_margin: 40.0,
        }
    }
}
