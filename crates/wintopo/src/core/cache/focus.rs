/*!
Top-level focus order - root windows, most recently focused first.
*/

use crate::types::WindowHandle;

/// Ordered top-level handles. Front = most recently focused (or created).
#[derive(Debug, Default)]
pub(crate) struct FocusOrder {
  order: Vec<WindowHandle>,
}

impl FocusOrder {
  /// Move (or insert) a handle to the front. Never duplicates.
  pub(super) fn push_front(&mut self, handle: WindowHandle) {
    self.order.retain(|&h| h != handle);
    self.order.insert(0, handle);
  }

  /// Register a handle at the back, without making it most-recent. No-op if
  /// already present anywhere in the order.
  pub(super) fn push_back(&mut self, handle: WindowHandle) {
    if !self.order.contains(&handle) {
      self.order.push(handle);
    }
  }

  /// Drop a handle. No-op if absent.
  pub(super) fn remove(&mut self, handle: WindowHandle) {
    self.order.retain(|&h| h != handle);
  }

  /// Most recently focused handle.
  pub(super) fn front(&self) -> Option<WindowHandle> {
    self.order.first().copied()
  }

  /// Owned copy of the order, front first.
  pub(super) fn snapshot(&self) -> Vec<WindowHandle> {
    self.order.clone()
  }
}
