/*! Event types for state changes and snapshots. */

use super::{WindowHandle, WindowInfo};
use serde::Serialize;

/// Consistent copy of the mirror state, taken under one read lock.
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
  /// All tracked windows, ordered by handle.
  pub windows: Vec<WindowInfo>,
  /// Top-level handles, most recently focused first.
  pub focus_order: Vec<WindowHandle>,
  /// Front of the focus order.
  pub frontmost: Option<WindowHandle>,
}

/// Events emitted when the mirrored topology changes.
///
/// Payloads carry handles only; consumers query the mirror for detail. During
/// ancestor materialization, descendants are announced before the ancestors
/// synthesized above them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "event", content = "data")]
pub enum Event {
  // Window lifecycle
  #[serde(rename = "window:added")]
  WindowAdded { window: WindowHandle },
  #[serde(rename = "window:removed")]
  WindowRemoved { window: WindowHandle },

  // Attribute invalidation. The cached value was dropped; re-read lazily.
  #[serde(rename = "window:title")]
  TitleChanged { window: WindowHandle },
  #[serde(rename = "window:bounds")]
  BoundsChanged { window: WindowHandle },

  // Focus order front changed. None when the last root went away.
  #[serde(rename = "focus:changed")]
  FocusChanged { window: Option<WindowHandle> },
}
