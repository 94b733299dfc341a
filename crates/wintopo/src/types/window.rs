/*! Public window projection. */

use super::{Bounds, WindowHandle};
use serde::Serialize;

/// Copy-on-read projection of one cached window.
///
/// Attribute fields reflect the cache at projection time. `None` means the
/// value has never been fetched or was invalidated by an event; use the lazy
/// readers on [`Wintopo`](crate::Wintopo) to force a fetch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WindowInfo {
  pub handle: WindowHandle,
  /// Parent handle. `None` for top-level windows. May reference a window no
  /// longer cached if the parent was destroyed before this one.
  pub parent: Option<WindowHandle>,
  /// Child handles, in first-seen order.
  pub children: Vec<WindowHandle>,
  pub class_name: Option<String>,
  pub title: Option<String>,
  pub bounds: Option<Bounds>,
}
