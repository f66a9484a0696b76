use crate::LayerHint;
use graph_layout::{Drawing, NodeSizes};
use hecs::Entity;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Horizontal extent of one layer in a drawing
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LayerBand {
    pub layer: i32,
    pub start: f32,
    pub end: f32,
}

impl LayerBand {
    pub fn contains(&self, x: f32) -> bool {
        self.start <= x && x <= self.end
    }
}

/// Layer bands of the last drawing, ordered along the x axis
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LayerBands {
    bands: Vec<LayerBand>,
    margin: f32,
}

impl LayerBands {
    pub fn from_drawing<S>(drawing: &Drawing<Entity, Entity>, sizes: &S, margin: f32) -> Self
    where
        S: NodeSizes<Entity>,
    {
        let mut extents: BTreeMap<i32, (f32, f32)> = BTreeMap::new();
        for (&node, &layer) in &drawing.layers {
            let Some(position) = drawing.positions.get(&node) else {
                continue;
            };
            let end = position.x + sizes.size(node).x;
            extents
                .entry(layer)
                .and_modify(|(start, stop)| {
                    *start = start.min(position.x);
                    *stop = stop.max(end);
                })
                .or_insert((position.x, end));
        }

        let mut bands: Vec<LayerBand> = extents
            .into_iter()
            .map(|(layer, (start, end))| LayerBand { layer, start, end })
            .collect();
        bands.sort_by(|a, b| a.start.total_cmp(&b.start));

        Self { bands, margin }
    }

    pub fn iter(&self) -> impl Iterator<Item = &LayerBand> {
        self.bands.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.bands.is_empty()
    }

    /// Which layer a node dropped at `x` asks for
    pub fn hint_at(&self, x: f32) -> LayerHint {
        let (Some(first), Some(last)) = (self.bands.first(), self.bands.last()) else {
            return LayerHint::Outside;
        };

        if x < first.start {
            return if first.start - x <= self.margin {
                LayerHint::InsertBefore(first.layer)
            } else {
                LayerHint::Outside
            };
        }
        if x > last.end {
            return if x - last.end <= self.margin {
                LayerHint::InsertBefore(last.layer.saturating_add(1))
            } else {
                LayerHint::Outside
            };
        }

        for band in &self.bands {
            if band.contains(x) {
                return LayerHint::Layer(band.layer);
            }
            if x < band.start {
                return LayerHint::InsertBefore(band.layer);
            }
        }
        LayerHint::Outside
    }
}
