use std::path::PathBuf;

use thiserror::Error;

use crate::driver::FramePhase;

/// Errors originating from the compute device, resource lifecycle, and frame loop.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("failed to create {resource}: {reason}")]
    ResourceCreation {
        resource: &'static str,
        reason: String,
    },

    #[error("{operation} called while the frame is {phase:?}")]
    FrameOrder {
        operation: &'static str,
        phase: FramePhase,
    },

    #[error("no compute resources; rebuild has not succeeded yet")]
    MissingResources,

    #[error("device error: {0}")]
    Device(String),

    #[error("frame capture failed: {0}")]
    Capture(String),

    #[error("i/o error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Core(#[from] mandelview_core::CoreError),
}

impl RenderError {
    pub(crate) fn creation(resource: &'static str, reason: impl Into<String>) -> Self {
        Self::ResourceCreation {
            resource,
            reason: reason.into(),
        }
    }
}
