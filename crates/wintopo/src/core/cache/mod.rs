/*!
Cache - the single source of truth for mirrored window state.

All fields are private. Mutations go through methods that maintain invariants
and emit events. This guarantees:
- Tree links and the focus order stay consistent with the node table
- Events are always emitted

## Module Structure

- `mod.rs` - `Cache` struct, `WindowNode`, read accessors, event emission
- `nodes.rs` - node CRUD and attribute invalidation
- `tree.rs` - `WindowTree` for parent/child relationships
- `focus.rs` - `FocusOrder`, the top-level MRU list
*/

mod focus;
mod nodes;
mod tree;

use async_broadcast::Sender;
use std::collections::HashMap;

use crate::types::{Bounds, Event, WindowHandle};
use focus::FocusOrder;
use tree::WindowTree;

/// Per-window state in the cache.
///
/// Attribute fields are lazy: `None` until fetched, reset to `None` when an
/// event invalidates them. Parent/child links live in the tree.
pub(crate) struct WindowNode {
  pub(crate) handle: WindowHandle,
  /// Never invalidated once fetched; a window's class is immutable.
  pub(crate) class_name: Option<String>,
  /// Invalidated by name-change events.
  pub(crate) title: Option<String>,
  /// Invalidated by move/size events.
  pub(crate) bounds: Option<Bounds>,
  /// Freshness stamp for lazy write-backs. Drawn from the cache counter at
  /// insert and on every invalidation, so each value is unique for the
  /// cache's lifetime. A store carrying an older stamp is discarded: the
  /// value was fetched before an invalidation, or before the handle was
  /// reused for a new window.
  pub(crate) revision: u64,
}

impl WindowNode {
  const fn new(handle: WindowHandle, revision: u64) -> Self {
    Self {
      handle,
      class_name: None,
      title: None,
      bounds: None,
      revision,
    }
  }
}

/// The mirrored window topology. One per [`Wintopo`](crate::Wintopo)
/// instance, shared behind a lock.
pub(crate) struct Cache {
  /// Sender for outward change events.
  events_tx: Sender<Event>,

  nodes: HashMap<WindowHandle, WindowNode>,
  tree: WindowTree,
  focus: FocusOrder,

  /// Source of node revision stamps; advances on insert and invalidation.
  next_revision: u64,
}

impl Cache {
  pub(crate) fn new(events_tx: Sender<Event>) -> Self {
    Self {
      events_tx,
      nodes: HashMap::new(),
      tree: WindowTree::new(),
      focus: FocusOrder::default(),
      next_revision: 0,
    }
  }

  /// Whether `handle` is currently tracked.
  pub(crate) fn contains(&self, handle: WindowHandle) -> bool {
    self.nodes.contains_key(&handle)
  }

  pub(crate) fn node(&self, handle: WindowHandle) -> Option<&WindowNode> {
    self.nodes.get(&handle)
  }

  /// Tracked handles, in unspecified order.
  pub(crate) fn handles(&self) -> impl Iterator<Item = WindowHandle> + '_ {
    self.nodes.keys().copied()
  }

  /// Parent link, if any. A dangling link (parent destroyed first) is
  /// reported as cached; callers decide how to treat orphans.
  pub(crate) fn parent(&self, handle: WindowHandle) -> Option<WindowHandle> {
    self.tree.parent(handle)
  }

  pub(crate) fn children(&self, handle: WindowHandle) -> &[WindowHandle] {
    self.tree.children(handle)
  }

  /// Top-level handles, most recently focused first.
  pub(crate) fn focus_order(&self) -> Vec<WindowHandle> {
    self.focus.snapshot()
  }

  pub(crate) fn frontmost(&self) -> Option<WindowHandle> {
    self.focus.front()
  }

  pub(super) fn emit(&self, event: Event) {
    match self.events_tx.try_broadcast(event) {
      // Overflow mode makes room by evicting the oldest queued event.
      Ok(Some(_)) => {
        log::error!(
          "Event channel overflow - events are being dropped. \
           Consider processing events faster."
        );
      }
      // Delivered, or no active subscriber to deliver to.
      Ok(None) | Err(_) => {}
    }
  }

  /// Emit `FocusChanged` if the focus-order front moved across a mutation.
  pub(super) fn emit_if_front_changed(&self, before: Option<WindowHandle>) {
    let front = self.focus.front();
    if front != before {
      self.emit(Event::FocusChanged { window: front });
    }
  }
}
