use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoordinatorError {
    /// A pass is already in flight, nothing was changed
    #[error("a layout pass is already running")]
    LayoutAlreadyRunning,

    /// The engine failed, the coordinator state is as before the request
    #[error("layout engine failed: {0:#}")]
    EngineFailure(anyhow::Error),
}
