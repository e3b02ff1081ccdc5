//! Error types for scene construction and rendering.
//!
//! Absorbed rays and total internal reflection are normal simulation
//! outcomes and never show up here.

use thiserror::Error;

use crate::MaterialId;

/// Errors that can occur while building a scene.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SceneError {
    #[error("Unknown material id: {0}")]
    UnknownMaterial(MaterialId),
}

/// Errors that can occur while starting the worker pool.
#[derive(Error, Debug)]
pub enum PoolError {
    #[error("Failed to spawn render worker: {0}")]
    Spawn(#[from] std::io::Error),
}

/// Errors that can occur during `Renderer::render`.
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Thread pool error: {0}")]
    Pool(#[from] PoolError),

    #[error("Output buffer holds {actual} pixels, viewport needs {expected}")]
    OutputSize { expected: usize, actual: usize },

    #[error("Render task for lines {min_line}..{max_line} did not complete")]
    TaskFailed { min_line: u32, max_line: u32 },
}

/// Result type for rendering operations.
pub type RenderResult<T> = Result<T, RenderError>;
