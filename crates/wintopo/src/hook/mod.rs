/*!
Event hook subscriber - typed range subscriptions over a raw OS hook backend.

Each subscription pins its callback in a registry owned by the `EventHook`
instance (never process-wide, so independent subscribers coexist without
cross-contamination) for exactly as long as the OS may invoke it. Teardown
order matters: backend deregistration first, pin release second, so a
callback is never reclaimed while the OS can still call it.
*/

mod events;

pub use events::{EventKind, HookEvent, ObjectKind};

use crate::types::{HookToken, WintopoResult};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::ops::RangeInclusive;
use std::sync::Arc;

/// Callback registered with a backend. Invoked once per notification,
/// strictly on the thread that owns the host's message loop.
pub type HookSink = Arc<dyn Fn(HookEvent) + Send + Sync>;

type PinRegistry = Arc<Mutex<HashMap<HookToken, HookSink>>>;

/// Raw OS hook registration.
///
/// Implementations register a callback for raw event IDs in an inclusive
/// range and deliver notifications serially on their message-loop thread.
/// The mirror core never blocks inside a delivery.
pub trait HookBackend: Send + Sync + 'static {
  /// Register `sink` for raw event IDs in `min..=max`.
  ///
  /// Returns a token identifying the registration, or
  /// [`HookRegistration`](crate::WintopoError::HookRegistration) if the OS
  /// refuses; the caller may retry.
  fn install(&self, min: u32, max: u32, sink: HookSink) -> WintopoResult<HookToken>;

  /// Deregister. Idempotent; after return, the sink for `token` is never
  /// invoked again.
  fn remove(&self, token: HookToken);
}

/// Typed subscriptions over a [`HookBackend`].
#[derive(Clone)]
pub struct EventHook {
  backend: Arc<dyn HookBackend>,
  pins: PinRegistry,
}

impl std::fmt::Debug for EventHook {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("EventHook")
      .field("active", &self.active())
      .finish_non_exhaustive()
  }
}

impl EventHook {
  /// Wrap a backend. Nothing is registered with the OS until
  /// [`EventHook::subscribe`].
  pub fn new(backend: Arc<dyn HookBackend>) -> Self {
    Self {
      backend,
      pins: Arc::new(Mutex::new(HashMap::new())),
    }
  }

  /// Subscribe `handler` to every notification whose kind falls in `kinds`.
  ///
  /// The handler runs on the backend's delivery thread and must never block
  /// or perform long-running work. Dropping the returned handle
  /// unsubscribes.
  pub fn subscribe(
    &self,
    kinds: RangeInclusive<EventKind>,
    handler: impl Fn(HookEvent) + Send + Sync + 'static,
  ) -> WintopoResult<HookHandle> {
    let sink: HookSink = Arc::new(handler);
    let token = self
      .backend
      .install(kinds.start().raw(), kinds.end().raw(), Arc::clone(&sink))?;

    // Pin the sink until the backend acknowledges removal.
    self.pins.lock().insert(token, sink);

    Ok(HookHandle {
      token: Some(token),
      backend: Arc::clone(&self.backend),
      pins: Arc::clone(&self.pins),
    })
  }

  /// Number of live subscriptions made through this hook.
  pub fn active(&self) -> usize {
    self.pins.lock().len()
  }
}

/// Owned subscription. Unsubscribes on drop.
pub struct HookHandle {
  token: Option<HookToken>,
  backend: Arc<dyn HookBackend>,
  pins: PinRegistry,
}

impl std::fmt::Debug for HookHandle {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("HookHandle")
      .field("token", &self.token)
      .finish_non_exhaustive()
  }
}

impl HookHandle {
  /// Token identifying this subscription with the backend.
  pub const fn token(&self) -> Option<HookToken> {
    self.token
  }

  /// Tear the subscription down now instead of at drop.
  pub fn unsubscribe(self) {
    // Drop handles the teardown.
  }

  fn release(&mut self) {
    if let Some(token) = self.token.take() {
      // Backend first: once remove() returns the OS will not invoke the
      // sink again, so releasing the pin is safe.
      self.backend.remove(token);
      self.pins.lock().remove(&token);
    }
  }
}

impl Drop for HookHandle {
  fn drop(&mut self) {
    self.release();
  }
}
