//! Rendering error types.

use thiserror::Error;

/// Errors that can occur during rendering operations.
#[derive(Error, Debug)]
pub enum RenderError {
    /// Failed to create wgpu adapter.
    #[error("failed to create graphics adapter")]
    AdapterCreationFailed,

    /// Failed to create wgpu device.
    #[error("failed to create graphics device: {0}")]
    DeviceCreationFailed(#[from] wgpu::RequestDeviceError),

    /// The device has too few stencil bits for shadow volumes.
    #[error("stencil buffer has {available} bits, {required} required")]
    StencilUnavailable {
        /// Bits the device provides.
        available: u8,
        /// Bits the options ask for.
        required: u8,
    },

    /// A draw call was rejected by the device.
    #[error("draw failed: {0}")]
    DrawFailed(String),

    /// Reading back from the GPU failed.
    #[error("readback failed: {0}")]
    ReadbackFailed(String),

    /// A draw was issued outside of a frame.
    #[error("no frame in progress")]
    NoFrame,

    /// Rendering one node failed during a step of a shadow pass.
    #[error("node '{node}' failed during {step}: {source}")]
    NodeFailed {
        /// Name of the structure.
        node: String,
        /// Step that was running.
        step: &'static str,
        /// Underlying error.
        #[source]
        source: Box<RenderError>,
    },

    /// Error from the scene layer.
    #[error(transparent)]
    Core(#[from] umbra_core::UmbraError),
}

/// A specialized Result type for rendering operations.
pub type RenderResult<T> = std::result::Result<T, RenderError>;
