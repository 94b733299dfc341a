/*!
Window property provider - the OS point-query seam.

The mirror never talks to the OS directly. A host supplies an implementation
backed by real window queries; tests use
[`StubProvider`](crate::testing::StubProvider).
*/

use crate::types::{Bounds, WindowHandle};

/// Point queries against a live window.
///
/// Every method may return `None` when the window has vanished between the
/// triggering event and the query. The mirror treats `None` as a soft
/// failure: it ends the current ancestor walk or leaves the cached field
/// unset, and never surfaces an error.
///
/// Implementations must be cheap and non-blocking. The reconciler calls
/// `parent` on the OS event-delivery thread, and the mirror never holds a
/// cache lock across a provider call.
pub trait WindowProvider: Send + Sync + 'static {
  /// Parent of `window`. `None` means top-level, or vanished, which is
  /// indistinguishable at this seam.
  fn parent(&self, window: WindowHandle) -> Option<WindowHandle>;

  /// Window class name. Immutable for the window's lifetime.
  fn class_name(&self, window: WindowHandle) -> Option<String>;

  /// Current window text (the title bar caption).
  fn text(&self, window: WindowHandle) -> Option<String>;

  /// Current window rectangle in screen coordinates.
  fn bounds(&self, window: WindowHandle) -> Option<Bounds>;
}
