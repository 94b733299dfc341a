/*!
Core Wintopo instance - owns the mirrored state and coordinates the
components.

# Module Structure

- `mod.rs` - `Wintopo` struct, attach/detach lifecycle, seeding, event
  subscriptions
- `cache/` - the mirrored state: node table, window tree, focus order
- `reconcile.rs` - the reconciler applying hook notifications to the cache
- `queries.rs` - read surface: cache lookups and lazy attribute reads
- `adapters.rs` - conversion from cache entries to public API types
*/

mod adapters;
mod cache;
mod queries;
mod reconcile;

pub(crate) use cache::Cache;

use crate::hook::{EventHook, EventKind, HookBackend, HookHandle};
use crate::provider::WindowProvider;
use crate::types::{Event, WindowHandle, WintopoResult};
use async_broadcast::{InactiveReceiver, Receiver};
use parking_lot::{Mutex, RwLock};
use reconcile::Reconciler;
use std::sync::Arc;

/// Capacity of the change-event broadcast channel.
const EVENT_CHANNEL_CAPACITY: usize = 1024;

/// Live mirror of the desktop window topology.
///
/// [`Wintopo::attach`] wires hook subscriptions to the reconciler; the cache
/// then tracks the OS for as long as the feed is attached. Cloning is cheap
/// and every clone observes the same cache. Dropping the last clone (or
/// calling [`Wintopo::detach`]) tears the hook subscriptions down; the cache
/// stays readable afterwards, frozen at the last processed notification.
pub struct Wintopo {
  reconciler: Reconciler,
  /// Keeps the event channel open while no subscriber is listening.
  events_keepalive: InactiveReceiver<Event>,
  /// Hook subscriptions driving the reconciler. Shared by clones and never
  /// captured by the hook sinks, so the last external drop releases them.
  feeds: Arc<Mutex<Vec<HookHandle>>>,
}

impl Clone for Wintopo {
  fn clone(&self) -> Self {
    Self {
      reconciler: self.reconciler.clone(),
      events_keepalive: self.events_keepalive.clone(),
      feeds: Arc::clone(&self.feeds),
    }
  }
}

impl std::fmt::Debug for Wintopo {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Wintopo").finish_non_exhaustive()
  }
}

impl Wintopo {
  /// Attach a new mirror to a hook backend and a property provider.
  ///
  /// Installs one subscription per notification range
  /// ([`EventKind::WINDOW_EVENTS`] and [`EventKind::SYSTEM_EVENTS`]), both
  /// feeding the reconciler. If either registration is refused, the one
  /// already installed is torn down and the error surfaces; the caller may
  /// retry.
  ///
  /// The cache starts empty and fills as notifications arrive. Call
  /// [`Wintopo::seed`] with the handles of already-open windows to mirror a
  /// session already in progress.
  pub fn attach(
    backend: Arc<dyn HookBackend>,
    provider: Arc<dyn WindowProvider>,
  ) -> WintopoResult<Self> {
    let (mut tx, rx) = async_broadcast::broadcast(EVENT_CHANNEL_CAPACITY);
    tx.set_overflow(true); // Drop oldest events when full

    let state = Arc::new(RwLock::new(Cache::new(tx)));
    let reconciler = Reconciler::new(state, provider);

    // Each feed captures its own reconciler clone. Neither captures the
    // subscription handles, so no cycle keeps the feed alive once every
    // external clone is gone.
    let hook = EventHook::new(backend);
    let window_feed = {
      let reconciler = reconciler.clone();
      hook.subscribe(EventKind::WINDOW_EVENTS, move |event| {
        reconciler.reconcile(event);
      })?
    };
    let system_feed = {
      let reconciler = reconciler.clone();
      hook.subscribe(EventKind::SYSTEM_EVENTS, move |event| {
        reconciler.reconcile(event);
      })?
    };

    Ok(Self {
      reconciler,
      events_keepalive: rx.deactivate(),
      feeds: Arc::new(Mutex::new(vec![window_feed, system_feed])),
    })
  }

  /// Subscribe to change events from this mirror.
  ///
  /// Events queue up to the channel capacity; beyond that the oldest are
  /// dropped. Subscribers see changes from the moment they subscribe,
  /// never a replay.
  pub fn subscribe(&self) -> Receiver<Event> {
    self.events_keepalive.activate_cloned()
  }

  /// Bootstrap the mirror from already-open windows.
  ///
  /// Runs the first-sighting path for each handle without promoting: roots
  /// discovered here join the back of the focus order, so seeding never
  /// rewrites what the user focused last. Already-tracked handles are
  /// skipped, and every mutation is idempotent against the live feed's own,
  /// so seeding while notifications flow is safe.
  pub fn seed(&self, handles: impl IntoIterator<Item = WindowHandle>) {
    for handle in handles {
      if self.read(|cache| cache.contains(handle)) {
        continue;
      }
      self.reconciler.sight(handle, false);
    }
  }

  /// Stop consuming OS notifications. Idempotent.
  ///
  /// Unsubscribes from the backend and releases the callback pins. The
  /// cache is not cleared: every query keeps answering with the topology as
  /// of the last processed notification.
  pub fn detach(&self) {
    self.feeds.lock().clear();
  }

  /// Read state. Lock released when the closure returns.
  /// **Never call the provider inside the closure.**
  #[inline]
  pub(crate) fn read<R>(&self, f: impl FnOnce(&Cache) -> R) -> R {
    self.reconciler.read(f)
  }

  /// Write state. Lock released when the closure returns.
  /// **Never call the provider inside the closure.**
  #[inline]
  pub(crate) fn write<R>(&self, f: impl FnOnce(&mut Cache) -> R) -> R {
    self.reconciler.write(f)
  }

  /// Provider reference for lazy attribute queries.
  fn provider(&self) -> &dyn WindowProvider {
    self.reconciler.provider.as_ref()
  }
}
