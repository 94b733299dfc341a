/*!
Node operations for the cache.

CRUD: `insert`, `remove_window`
Tree: `link`
Focus order: `register_root`, `promote_focus`
Attributes: `invalidate_title`, `invalidate_bounds`, `store_*` write-backs
*/

use super::{Cache, WindowNode};
use crate::types::{Bounds, Event, WindowHandle};

impl Cache {
  /// Track a window. No-op if already tracked.
  ///
  /// Emits `WindowAdded` on an actual insert. Returns whether the node is
  /// new.
  pub(crate) fn insert(&mut self, handle: WindowHandle) -> bool {
    if self.nodes.contains_key(&handle) {
      return false;
    }
    let revision = self.next_revision;
    self.next_revision += 1;
    self.nodes.insert(handle, WindowNode::new(handle, revision));
    self.emit(Event::WindowAdded { window: handle });
    true
  }

  /// Link `child` under `parent`. Idempotent for the same pair. Returns
  /// whether the pair is linked when the call returns.
  ///
  /// Both ends must be tracked: a link naming an untracked window is
  /// refused, so the tree never grows edges to windows the cache has
  /// already dropped. The tree itself refuses links that would close a
  /// parent cycle.
  pub(crate) fn link(&mut self, parent: WindowHandle, child: WindowHandle) -> bool {
    if !self.nodes.contains_key(&parent) || !self.nodes.contains_key(&child) {
      log::warn!("link {child} under {parent} refused: both windows must be tracked");
      return false;
    }
    self.tree.link(parent, child)
  }

  /// Register a top-level window in the focus order.
  ///
  /// `most_recent` fronts the window; otherwise it joins the back, known
  /// but not promoted. No-op placement-wise if already present and not
  /// fronted. Refused for windows that are untracked (destroyed while a
  /// materialization walk was paused in a provider query) or linked under
  /// a parent: the focus order only ever names live top-level windows.
  pub(crate) fn register_root(&mut self, handle: WindowHandle, most_recent: bool) {
    if !self.nodes.contains_key(&handle) {
      log::warn!("register {handle} as a root refused: window is not tracked");
      return;
    }
    if self.tree.parent(handle).is_some() {
      log::warn!("register {handle} as a root refused: window is linked under a parent");
      return;
    }
    let before = self.focus.front();
    if most_recent {
      self.focus.push_front(handle);
    } else {
      self.focus.push_back(handle);
    }
    self.emit_if_front_changed(before);
  }

  /// Move a top-level window to the front of the focus order.
  pub(crate) fn promote_focus(&mut self, handle: WindowHandle) {
    let before = self.focus.front();
    self.focus.push_front(handle);
    self.emit_if_front_changed(before);
  }

  /// Stop tracking a destroyed window.
  ///
  /// Unlinks it from its parent's children, or from the focus order when
  /// top-level. The window's own children stay cached with dangling parent
  /// links until their own destroy events arrive - destruction never
  /// cascades.
  pub(crate) fn remove_window(&mut self, handle: WindowHandle) {
    if self.nodes.remove(&handle).is_none() {
      return;
    }

    let before = self.focus.front();
    if self.tree.detach(handle).is_none() {
      self.focus.remove(handle);
    }
    self.tree.take_children(handle);

    self.emit(Event::WindowRemoved { window: handle });
    self.emit_if_front_changed(before);
  }

  /// Drop the cached title and advance the node's revision; the next read
  /// re-queries. Emits `TitleChanged`.
  pub(crate) fn invalidate_title(&mut self, handle: WindowHandle) {
    let Some(node) = self.nodes.get_mut(&handle) else {
      return;
    };
    node.title = None;
    node.revision = self.next_revision;
    self.next_revision += 1;
    self.emit(Event::TitleChanged { window: handle });
  }

  /// Drop the cached bounds and advance the node's revision; the next read
  /// re-queries. Emits `BoundsChanged`.
  pub(crate) fn invalidate_bounds(&mut self, handle: WindowHandle) {
    let Some(node) = self.nodes.get_mut(&handle) else {
      return;
    };
    node.bounds = None;
    node.revision = self.next_revision;
    self.next_revision += 1;
    self.emit(Event::BoundsChanged { window: handle });
  }

  /// Cache a title fetched from the provider. No event. Discarded when
  /// `revision` is stale: an invalidation or a handle reuse landed after
  /// the reader sampled the node.
  pub(crate) fn store_title(&mut self, handle: WindowHandle, title: String, revision: u64) {
    if let Some(node) = self.nodes.get_mut(&handle) {
      if node.revision == revision {
        node.title = Some(title);
      }
    }
  }

  /// Cache a class name. Never cleared by events: a window's class is
  /// immutable. The revision check only defends against the handle being
  /// reused for a different window mid-fetch.
  pub(crate) fn store_class_name(
    &mut self,
    handle: WindowHandle,
    class_name: String,
    revision: u64,
  ) {
    if let Some(node) = self.nodes.get_mut(&handle) {
      if node.revision == revision {
        node.class_name = Some(class_name);
      }
    }
  }

  /// Cache a bounds rectangle fetched from the provider. No event.
  /// Discarded when `revision` is stale, like [`Cache::store_title`].
  pub(crate) fn store_bounds(&mut self, handle: WindowHandle, bounds: Bounds, revision: u64) {
    if let Some(node) = self.nodes.get_mut(&handle) {
      if node.revision == revision {
        node.bounds = Some(bounds);
      }
    }
  }
}
