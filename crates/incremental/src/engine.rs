use crate::PortConstraintTable;
use anyhow::Context;
use graph_layout::{Drawing, IncrementalHints, LayeredLayout, LayoutEngine};
use hecs::Entity;
use layerwerk_data::GraphSnapshot;
use std::future::Future;
use tracing::debug;

/// Everything a backend needs for one pass
#[derive(Debug, Clone)]
pub struct LayoutRequest {
    pub graph: GraphSnapshot,
    pub hints: IncrementalHints<Entity, Entity>,
    pub ports: PortConstraintTable,
}

/// Asynchronous layout capability used by the coordinator
///
/// Implementations may run for a long time, the coordinator does not hold
/// any lock while waiting. A dropped future must not corrupt anything, the
/// work may finish in the background and be discarded.
pub trait LayoutBackend: Send + Sync {
    fn run_layout(
        &self,
        request: LayoutRequest,
    ) -> impl Future<Output = anyhow::Result<Drawing<Entity, Entity>>> + Send;
}

/// Runs [`LayeredLayout`] on the blocking thread pool
#[derive(Debug, Clone, Default)]
pub struct LayeredBackend {
    pub layout: LayeredLayout,
}

impl LayeredBackend {
    pub fn new(layout: LayeredLayout) -> Self {
        Self { layout }
    }
}

impl LayoutBackend for LayeredBackend {
    fn run_layout(
        &self,
        request: LayoutRequest,
    ) -> impl Future<Output = anyhow::Result<Drawing<Entity, Entity>>> + Send {
        let layout = self.layout.clone();
        async move {
            tokio::task::spawn_blocking(move || {
                let graph = request.graph.topology();
                debug!(
                    nodes = graph.node_count(),
                    edges = request.graph.connections().len(),
                    "Running layered layout"
                );
                layout
                    .layout(
                        &graph,
                        request.graph.connections(),
                        &request.hints,
                        request.graph.sizes(),
                        &request.ports,
                    )
                    .map_err(anyhow::Error::from)
            })
            .await
            .context("layout task did not complete")?
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use graph_layout::{EdgeEnd, PortSide, Vec2};
    use hecs::World;
    use layerwerk_data::WorldGraphExt;
    use test_log::test;

    #[test(tokio::test)]
    async fn layered_backend_keeps_given_layers() {
        let mut world = World::new();
        let size = Vec2::new(60.0, 30.0);
        let a = world.spawn_node("A", size);
        let b = world.spawn_node("B", size);
        let ab = world.spawn_edge(a, b).unwrap();

        let mut ports = PortConstraintTable::new();
        ports.set(ab, EdgeEnd::Source, Some(PortSide::South));
        let request = LayoutRequest {
            graph: GraphSnapshot::from_world(&world, size),
            hints: IncrementalHints::given([(a, 3), (b, 5)]),
            ports,
        };

        let drawing = LayeredBackend::default().run_layout(request).await.unwrap();

        assert_eq!(drawing.layers[&a], 3);
        assert_eq!(drawing.layers[&b], 5);
        let route = &drawing.routes[&ab];
        assert_eq!(route.source.y, drawing.positions[&a].y + size.y);
    }
}
