/*! Error types for wintopo operations. */

use super::WindowHandle;

/// Errors that can occur during wintopo operations.
#[derive(Debug, thiserror::Error)]
pub enum WintopoError {
  #[error("Window not tracked: {0}")]
  WindowNotFound(WindowHandle),

  #[error("Event hook registration failed: {0}")]
  HookRegistration(String),
}

/// Result type for wintopo operations.
pub type WintopoResult<T> = Result<T, WintopoError>;
