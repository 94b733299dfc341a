/*! Core types for wintopo. */

#![allow(missing_docs)]

mod error;
mod event;
mod geometry;
mod ids;
mod window;

pub use error::{WintopoError, WintopoResult};
pub use event::{Event, Snapshot};
pub use geometry::Bounds;
pub use ids::{HookToken, WindowHandle};
pub use window::WindowInfo;
