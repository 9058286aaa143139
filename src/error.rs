//! Crate error type

use thiserror::Error;

use crate::sim::AnimationPhase;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// The wish was empty after trimming whitespace
    #[error("wish text is empty")]
    EmptyWish,

    /// A wish was submitted while another sequence is still playing
    #[error("a wish sequence is already in progress ({0:?})")]
    SequenceInProgress(AnimationPhase),

    /// Camera acquisition failed (permission denied, no device, insecure context)
    #[error("camera unavailable: {0}")]
    CameraUnavailable(String),

    #[error("invalid tuning: {0}")]
    InvalidTuning(String),

    #[error("failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("no compatible GPU adapter: {0}")]
    NoAdapter(#[from] wgpu::RequestAdapterError),

    #[error("failed to create surface: {0}")]
    CreateSurface(#[from] wgpu::CreateSurfaceError),

    #[error("failed to create device: {0}")]
    RequestDevice(#[from] wgpu::RequestDeviceError),
}
