//! Error types for umbra.

use thiserror::Error;

/// The main error type for umbra operations.
#[derive(Error, Debug)]
pub enum UmbraError {
    /// The global context has not been initialized.
    #[error("umbra not initialized - call umbra::init() first")]
    NotInitialized,

    /// The global context has already been initialized.
    #[error("umbra already initialized")]
    AlreadyInitialized,

    /// A structure with the given name already exists.
    #[error("structure '{0}' already exists")]
    StructureExists(String),

    /// A structure handle no longer resolves to a live structure.
    #[error("structure {0} not found")]
    StructureNotFound(String),

    /// A light handle no longer resolves to a live light.
    #[error("light {0} not found")]
    LightNotFound(String),

    /// A triangle soup whose length is not a multiple of three.
    #[error("triangle soup has {len} points, which is not a multiple of 3")]
    InvalidTriangleSoup { len: usize },

    /// A face index refers past the end of the vertex list.
    #[error("face index {index} out of range for {vertex_count} vertices")]
    FaceIndexOutOfRange { index: usize, vertex_count: usize },

    /// Rendering error.
    #[error("render error: {0}")]
    RenderError(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Generic error with message.
    #[error("{0}")]
    Other(String),
}

/// A specialized Result type for umbra operations.
pub type Result<T> = std::result::Result<T, UmbraError>;
