//! Render error types
//!
//! [`RenderError`] is what callers of the device see. Backends report the
//! narrower [`BackendError`](super::backend::BackendError), which the device
//! wraps with the context it has (resource kind, command position) before
//! handing it up.

use crate::config::ConfigError;
use crate::render::command::CommandKind;
use crate::render::handle::ResourceKind;
use thiserror::Error;

/// Errors surfaced by the graphics device
#[derive(Error, Debug)]
pub enum RenderError {
    /// Device or backend could not be brought up
    ///
    /// Raised at construction when the requested backend is not available
    /// or the configuration is rejected.
    #[error("Renderer initialization failed: {0}")]
    InitializationFailed(String),

    /// Backend rejected a resource description
    ///
    /// Recoverable: the device is unchanged and the caller may retry with a
    /// corrected description.
    #[error("Failed to create {kind}: {reason}")]
    BackendResource {
        /// Kind of resource being created
        kind: ResourceKind,
        /// Backend's explanation
        reason: String,
    },

    /// Handle used after destruction, or a cache lookup for an unknown key
    ///
    /// Always a programming error on the caller's side.
    #[error("Stale {kind} handle: {detail}")]
    StaleHandle {
        /// Kind of the offending handle
        kind: ResourceKind,
        /// Where the handle was used
        detail: String,
    },

    /// Backend call failed during submission
    ///
    /// Commands before `position` have already executed; the rest of the
    /// submission was abandoned.
    #[error("Backend failed on {command_kind} command at position {position}: {reason}")]
    BackendDispatch {
        /// Kind of the failing command
        command_kind: CommandKind,
        /// Index of the failing command in dispatch order
        position: usize,
        /// Backend's explanation
        reason: String,
    },

    /// Frame could not be presented
    #[error("Present failed: {0}")]
    PresentFailed(String),

    /// Configuration could not be loaded or validated
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl RenderError {
    /// Build a [`RenderError::StaleHandle`]
    pub fn stale(kind: ResourceKind, detail: impl Into<String>) -> Self {
        Self::StaleHandle { kind, detail: detail.into() }
    }

    /// Build a [`RenderError::BackendResource`]
    pub fn resource(kind: ResourceKind, reason: impl ToString) -> Self {
        Self::BackendResource { kind, reason: reason.to_string() }
    }
}

/// Result type for rendering operations
pub type RenderResult<T> = Result<T, RenderError>;
