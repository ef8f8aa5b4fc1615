//! Handler types and dependencies

use tdlcore::DownloadFlow;

/// Error type for handlers
pub type HandlerError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Dependencies required by handlers
#[derive(Clone)]
pub struct HandlerDeps {
    pub flow: DownloadFlow,
}

impl HandlerDeps {
    pub fn new(flow: DownloadFlow) -> Self {
        Self { flow }
    }
}
