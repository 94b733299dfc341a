/*!
Topology reconciliation - event-driven maintenance of the cache.

One `Reconciler` sits between the hook feeds and the cache. Notifications
arrive one at a time on the backend's delivery thread; each becomes a short
sequence of cache mutations. Provider queries happen between lock scopes,
never inside one, so the delivery thread is never blocked on the OS while
readers hold the lock.

A provider query can itself pump a nested notification: the OS delivers
re-entrantly while answering. Every walk therefore re-validates what it
believed before the query - a window destroyed or re-linked under a paused
walk cannot re-enter the tree or the focus order.

Per accepted notification:

1. Look the handle up in the cache.
2. Unknown handle + destroy: drop the notification. The OS reports destroys
   for windows the cache never tracked; they produce no state change.
3. Unknown handle + anything else: first sighting. Create a node, then
   materialize unseen ancestors upward until reaching a cached window or a
   root (see [`Reconciler::sight`]).
4. Kind-specific effect, whether the node is new or already tracked: renames
   and moves invalidate the affected attribute, a destroy unlinks and drops
   the node, focus promotes the top-level ancestor.
*/

use super::Cache;
use crate::hook::{EventKind, HookEvent};
use crate::provider::WindowProvider;
use crate::types::WindowHandle;
use parking_lot::RwLock;
use std::sync::Arc;

/// Event kinds that mark the sighted window as the user's current focus.
///
/// A creation or focus notification names a window the user is acting on,
/// so a root first sighted through one fronts the focus order. A rename or
/// move sighting merely reveals a window that was already open in the
/// background; its root joins the back.
const fn fronts_on_sighting(kind: EventKind) -> bool {
  matches!(
    kind,
    EventKind::Create | EventKind::Focus | EventKind::Foreground
  )
}

/// The topology maintainer.
///
/// Consumes hook notifications, queries the [`WindowProvider`] as needed,
/// and mutates the cache. The backend delivers on its message-loop thread;
/// a delivery may nest inside another's provider query, and the cache
/// mutators tolerate state that changed under a paused walk.
///
/// Holds only the shared state and the provider. Hook sinks capture a clone
/// of this, never the subscription handles, so sinks do not keep their own
/// subscriptions alive.
#[derive(Clone)]
pub(super) struct Reconciler {
  pub(super) state: Arc<RwLock<Cache>>,
  pub(super) provider: Arc<dyn WindowProvider>,
}

impl Reconciler {
  pub(super) fn new(state: Arc<RwLock<Cache>>, provider: Arc<dyn WindowProvider>) -> Self {
    Self { state, provider }
  }

  /// Read state. Lock released when the closure returns.
  /// **Never call the provider inside the closure.**
  #[inline]
  pub(super) fn read<R>(&self, f: impl FnOnce(&Cache) -> R) -> R {
    f(&self.state.read())
  }

  /// Write state. Lock released when the closure returns.
  /// **Never call the provider inside the closure.**
  #[inline]
  pub(super) fn write<R>(&self, f: impl FnOnce(&mut Cache) -> R) -> R {
    f(&mut self.state.write())
  }

  /// Apply one notification to the cache.
  pub(super) fn reconcile(&self, event: HookEvent) {
    // Topology-relevant notifications only: a window or client-area object
    // with a real handle. Cursor, caret, menu and scrollbar notifications
    // never touch the cache.
    let Some(handle) = event.window else {
      return;
    };
    if !event.object.is_window() {
      return;
    }

    if !self.read(|cache| cache.contains(handle)) {
      if event.kind == EventKind::Destroy {
        log::debug!("destroy for untracked window {handle}, dropping");
        return;
      }
      self.sight(handle, fronts_on_sighting(event.kind));
    }

    match event.kind {
      EventKind::NameChange => self.write(|cache| cache.invalidate_title(handle)),
      EventKind::MoveSizeStart | EventKind::MoveSizeEnd | EventKind::LocationChange => {
        self.write(|cache| cache.invalidate_bounds(handle));
      }
      EventKind::Destroy => self.write(|cache| cache.remove_window(handle)),
      EventKind::Foreground | EventKind::Focus => self.promote(handle),
      // The sighting above is the whole effect; for an already-tracked
      // window these carry no state the cache mirrors eagerly.
      EventKind::Create | EventKind::Show | EventKind::Hide => {}
    }
  }

  /// First sighting: track `handle`, then materialize its ancestor chain.
  ///
  /// Walks upward one provider query at a time. An unknown parent is
  /// synthesized and the walk continues; a cached parent ends the walk with
  /// a link; no parent means the current window is a root and registers in
  /// the focus order - at the front when `front` is set, at the back
  /// otherwise. A link the cache refuses (a nested walk closed the other
  /// half of a cycle, or an end died mid-walk) ends the walk with a root
  /// registration instead.
  ///
  /// A provider that reports no parent because the window vanished mid-walk
  /// is indistinguishable from one reporting a root. The walk ends the same
  /// way and the destroy notification already in flight cleans up.
  pub(super) fn sight(&self, handle: WindowHandle, front: bool) {
    self.write(|cache| cache.insert(handle));

    let mut chain = vec![handle];
    let mut current = handle;
    loop {
      // Provider query between lock scopes.
      let Some(parent) = self.provider.parent(current) else {
        self.write(|cache| cache.register_root(current, front));
        return;
      };

      if chain.contains(&parent) {
        // The provider named a window from this walk as its own ancestor.
        // Cut the chain here rather than loop forever.
        log::warn!("provider reports a parent cycle at {parent}; treating {current} as top-level");
        self.write(|cache| cache.register_root(current, front));
        return;
      }

      if self.read(|cache| cache.contains(parent)) {
        if !self.write(|cache| cache.link(parent, current)) {
          // The stale parent answer lost to a nested delivery. The chain
          // ends here; registration re-checks that `current` still is a
          // live root.
          self.write(|cache| cache.register_root(current, front));
        }
        return;
      }

      // Unseen ancestor: synthesize it and keep walking up.
      self.write(|cache| {
        cache.insert(parent);
        cache.link(parent, current);
      });
      chain.push(parent);
      current = parent;
    }
  }

  /// Focus effect: front the top-level ancestor of `handle`.
  fn promote(&self, handle: WindowHandle) {
    if let Some(root) = self.read(|cache| top_level_ancestor(cache, handle)) {
      self.write(|cache| cache.promote_focus(root));
    } else {
      log::debug!("focus in an orphaned subtree at {handle}, focus order unchanged");
    }
  }
}

/// Walk cached parent links from `handle` up to its top-level ancestor.
///
/// Returns `None` when the walk dead-ends in an orphaned subtree: a parent
/// link pointing at a window no longer cached, or at a reused handle that
/// does not list the child. The cache refuses links that would close a
/// parent cycle, so the chain never revisits a window and the walk
/// terminates.
fn top_level_ancestor(cache: &Cache, handle: WindowHandle) -> Option<WindowHandle> {
  let mut current = handle;
  loop {
    let Some(parent) = cache.parent(current) else {
      return Some(current);
    };
    if !cache.contains(parent) || !cache.children(parent).contains(&current) {
      return None;
    }
    current = parent;
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::hook::ObjectKind;
  use crate::testing::{QueryCounts, StubProvider};
  use crate::types::{Bounds, Event};

  fn h(n: u64) -> WindowHandle {
    WindowHandle(n)
  }

  fn event(kind: EventKind, window: u64) -> HookEvent {
    HookEvent::new(kind, Some(h(window)), ObjectKind::Window)
  }

  fn reconciler<P: WindowProvider>(
    provider: &Arc<P>,
  ) -> (Reconciler, async_broadcast::Receiver<Event>) {
    let (mut tx, rx) = async_broadcast::broadcast(256);
    tx.set_overflow(true);
    let state = Arc::new(RwLock::new(Cache::new(tx)));
    (Reconciler::new(state, Arc::clone(provider) as _), rx)
  }

  fn drain(rx: &mut async_broadcast::Receiver<Event>) -> Vec<Event> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
      events.push(event);
    }
    events
  }

  mod filtering {
    use super::*;

    #[test]
    fn null_handles_are_dropped() {
      let provider = Arc::new(StubProvider::new());
      let (reconciler, mut rx) = reconciler(&provider);

      reconciler.reconcile(HookEvent::new(EventKind::Create, None, ObjectKind::Window));

      assert_eq!(reconciler.read(|cache| cache.handles().count()), 0);
      assert!(drain(&mut rx).is_empty());
    }

    #[test]
    fn non_window_objects_are_dropped() {
      let provider = Arc::new(StubProvider::new());
      let (reconciler, mut rx) = reconciler(&provider);

      for object in [ObjectKind::Cursor, ObjectKind::Caret, ObjectKind::Menu] {
        reconciler.reconcile(HookEvent::new(EventKind::Create, Some(h(5)), object));
      }

      assert!(!reconciler.read(|cache| cache.contains(h(5))));
      assert!(drain(&mut rx).is_empty());
      assert_eq!(
        provider.queries(h(5)),
        QueryCounts::default(),
        "a dropped notification must not reach the provider"
      );
    }

    #[test]
    fn client_area_notifications_are_window_scoped() {
      let provider = Arc::new(StubProvider::new());
      let (reconciler, _rx) = reconciler(&provider);

      reconciler.reconcile(HookEvent::new(
        EventKind::Create,
        Some(h(5)),
        ObjectKind::Client,
      ));

      assert!(reconciler.read(|cache| cache.contains(h(5))));
    }
  }

  mod first_sighting {
    use super::*;

    #[test]
    fn create_materializes_the_ancestor_chain() {
      let provider = Arc::new(StubProvider::new());
      provider.set_parent(h(5), h(3));
      let (reconciler, mut rx) = reconciler(&provider);

      reconciler.reconcile(event(EventKind::Create, 5));

      reconciler.read(|cache| {
        assert!(cache.contains(h(5)));
        assert!(cache.contains(h(3)), "the unseen parent is synthesized");
        assert_eq!(cache.parent(h(5)), Some(h(3)));
        assert_eq!(cache.children(h(3)), &[h(5)]);
        assert_eq!(cache.focus_order(), vec![h(3)]);
      });
      assert_eq!(
        drain(&mut rx),
        vec![
          Event::WindowAdded { window: h(5) },
          Event::WindowAdded { window: h(3) },
          Event::FocusChanged {
            window: Some(h(3))
          },
        ],
        "the sighted window is announced before its synthesized ancestors"
      );
    }

    #[test]
    fn materialization_walks_to_the_deepest_root() {
      let provider = Arc::new(StubProvider::new());
      provider.set_parent(h(9), h(7));
      provider.set_parent(h(7), h(5));
      provider.set_parent(h(5), h(3));
      let (reconciler, _rx) = reconciler(&provider);

      reconciler.reconcile(event(EventKind::Create, 9));

      reconciler.read(|cache| {
        assert_eq!(cache.handles().count(), 4);
        assert_eq!(cache.parent(h(9)), Some(h(7)));
        assert_eq!(cache.parent(h(7)), Some(h(5)));
        assert_eq!(cache.parent(h(5)), Some(h(3)));
        assert_eq!(cache.parent(h(3)), None);
        assert_eq!(cache.focus_order(), vec![h(3)]);
      });
      for handle in [h(9), h(7), h(5), h(3)] {
        assert_eq!(
          provider.queries(handle).parent,
          1,
          "each window on the chain is queried exactly once"
        );
      }
    }

    #[test]
    fn materialization_stops_at_a_cached_ancestor() {
      let provider = Arc::new(StubProvider::new());
      provider.set_parent(h(5), h(3));
      let (reconciler, _rx) = reconciler(&provider);

      reconciler.reconcile(event(EventKind::Create, 3));
      reconciler.reconcile(event(EventKind::Create, 5));

      reconciler.read(|cache| {
        assert_eq!(cache.children(h(3)), &[h(5)]);
        assert_eq!(
          cache.focus_order(),
          vec![h(3)],
          "linking under a cached root must not re-register it"
        );
      });
      assert_eq!(
        provider.queries(h(3)).parent,
        1,
        "the walk stops at a cached window without re-querying it"
      );
    }

    #[test]
    fn sighting_through_a_rename_joins_the_back() {
      let provider = Arc::new(StubProvider::new());
      provider.set_parent(h(5), h(3));
      let (reconciler, mut rx) = reconciler(&provider);

      reconciler.reconcile(event(EventKind::Create, 1));
      drain(&mut rx);

      reconciler.reconcile(event(EventKind::NameChange, 5));

      reconciler.read(|cache| {
        assert!(cache.contains(h(5)));
        assert_eq!(
          cache.focus_order(),
          vec![h(1), h(3)],
          "a background sighting must not steal the front"
        );
      });
      assert_eq!(
        drain(&mut rx),
        vec![
          Event::WindowAdded { window: h(5) },
          Event::WindowAdded { window: h(3) },
          Event::TitleChanged { window: h(5) },
        ]
      );
    }

    #[test]
    fn a_vanished_ancestor_registers_as_a_root() {
      let provider = Arc::new(StubProvider::new());
      provider.set_parent(h(9), h(7));
      // 7 has no entries at all: it vanished between the notification and
      // the walk reaching it.
      let (reconciler, _rx) = reconciler(&provider);

      reconciler.reconcile(event(EventKind::Create, 9));

      reconciler.read(|cache| {
        assert_eq!(cache.parent(h(9)), Some(h(7)));
        assert_eq!(cache.focus_order(), vec![h(7)]);
      });
    }

    #[test]
    fn a_parent_cycle_from_the_provider_is_cut() {
      let provider = Arc::new(StubProvider::new());
      provider.set_parent(h(5), h(3));
      provider.set_parent(h(3), h(5));
      let (reconciler, _rx) = reconciler(&provider);

      reconciler.reconcile(event(EventKind::Create, 5));

      reconciler.read(|cache| {
        assert_eq!(cache.parent(h(5)), Some(h(3)));
        assert_eq!(cache.parent(h(3)), None, "the cycle edge is not linked");
        assert_eq!(cache.focus_order(), vec![h(3)]);
      });
    }

    #[test]
    fn a_self_parent_is_treated_as_top_level() {
      let provider = Arc::new(StubProvider::new());
      provider.set_parent(h(5), h(5));
      let (reconciler, _rx) = reconciler(&provider);

      reconciler.reconcile(event(EventKind::Create, 5));

      reconciler.read(|cache| {
        assert_eq!(cache.parent(h(5)), None);
        assert_eq!(cache.focus_order(), vec![h(5)]);
      });
    }
  }

  mod destroy {
    use super::*;

    #[test]
    fn destroy_for_an_unknown_window_is_dropped() {
      let provider = Arc::new(StubProvider::new());
      let (reconciler, mut rx) = reconciler(&provider);

      reconciler.reconcile(event(EventKind::Destroy, 99));

      assert_eq!(reconciler.read(|cache| cache.handles().count()), 0);
      assert!(drain(&mut rx).is_empty());
      assert_eq!(
        provider.queries(h(99)),
        QueryCounts::default(),
        "an unknown destroy must not bootstrap a node"
      );
    }

    #[test]
    fn destroy_unlinks_from_the_parent() {
      let provider = Arc::new(StubProvider::new());
      provider.set_parent(h(5), h(3));
      let (reconciler, mut rx) = reconciler(&provider);
      reconciler.reconcile(event(EventKind::Create, 5));
      drain(&mut rx);

      reconciler.reconcile(event(EventKind::Destroy, 5));

      reconciler.read(|cache| {
        assert!(!cache.contains(h(5)));
        assert!(cache.contains(h(3)));
        assert_eq!(cache.children(h(3)), &[] as &[WindowHandle]);
        assert_eq!(cache.focus_order(), vec![h(3)]);
      });
      assert_eq!(drain(&mut rx), vec![Event::WindowRemoved { window: h(5) }]);
    }

    #[test]
    fn destroying_a_parent_orphans_children_without_cascade() {
      let provider = Arc::new(StubProvider::new());
      provider.set_parent(h(5), h(3));
      let (reconciler, mut rx) = reconciler(&provider);
      reconciler.reconcile(event(EventKind::Create, 5));
      drain(&mut rx);

      reconciler.reconcile(event(EventKind::Destroy, 3));

      reconciler.read(|cache| {
        assert!(cache.contains(h(5)), "children are not cascade-deleted");
        assert_eq!(
          cache.parent(h(5)),
          Some(h(3)),
          "the orphan keeps its dangling parent link"
        );
        assert_eq!(cache.focus_order(), vec![] as Vec<WindowHandle>);
      });
      assert_eq!(
        drain(&mut rx),
        vec![
          Event::WindowRemoved { window: h(3) },
          Event::FocusChanged { window: None },
        ]
      );
    }

    #[test]
    fn a_reused_handle_is_a_new_window() {
      let provider = Arc::new(StubProvider::new());
      provider.set_parent(h(5), h(3));
      let (reconciler, _rx) = reconciler(&provider);
      reconciler.reconcile(event(EventKind::Create, 5));
      reconciler.reconcile(event(EventKind::Destroy, 5));

      // The OS hands the freed handle to an unrelated top-level window.
      provider.vanish(h(5));
      reconciler.reconcile(event(EventKind::Create, 5));

      reconciler.read(|cache| {
        assert_eq!(cache.parent(h(5)), None, "no state survives the reuse");
        assert_eq!(cache.children(h(3)), &[] as &[WindowHandle]);
        assert_eq!(cache.focus_order(), vec![h(5), h(3)]);
      });
    }
  }

  mod focus {
    use super::*;

    #[test]
    fn focus_promotes_the_top_level_ancestor() {
      let provider = Arc::new(StubProvider::new());
      provider.set_parent(h(5), h(3));
      let (reconciler, mut rx) = reconciler(&provider);
      reconciler.reconcile(event(EventKind::Create, 5));
      reconciler.reconcile(event(EventKind::Create, 7));
      drain(&mut rx);

      reconciler.reconcile(event(EventKind::Focus, 5));

      reconciler.read(|cache| {
        assert_eq!(cache.focus_order(), vec![h(3), h(7)]);
      });
      assert_eq!(
        drain(&mut rx),
        vec![Event::FocusChanged {
          window: Some(h(3))
        }]
      );
    }

    #[test]
    fn refocusing_the_front_is_silent() {
      let provider = Arc::new(StubProvider::new());
      let (reconciler, mut rx) = reconciler(&provider);
      reconciler.reconcile(event(EventKind::Create, 5));
      drain(&mut rx);

      reconciler.reconcile(event(EventKind::Focus, 5));

      reconciler.read(|cache| {
        assert_eq!(cache.focus_order(), vec![h(5)]);
      });
      assert!(drain(&mut rx).is_empty(), "no change, no announcement");
    }

    #[test]
    fn focus_on_an_unknown_window_bootstraps_it() {
      let provider = Arc::new(StubProvider::new());
      let (reconciler, mut rx) = reconciler(&provider);
      reconciler.reconcile(event(EventKind::Create, 5));
      reconciler.reconcile(event(EventKind::Focus, 5));
      drain(&mut rx);

      reconciler.reconcile(event(EventKind::Focus, 3));
      reconciler.reconcile(event(EventKind::Focus, 3));

      reconciler.read(|cache| {
        assert_eq!(
          cache.focus_order(),
          vec![h(3), h(5)],
          "re-focusing must not duplicate the entry"
        );
      });
      assert_eq!(
        drain(&mut rx),
        vec![
          Event::WindowAdded { window: h(3) },
          Event::FocusChanged {
            window: Some(h(3))
          },
        ],
        "the sighting fronts the window once; the repeat is silent"
      );
    }

    #[test]
    fn focus_in_an_orphaned_subtree_changes_nothing() {
      let provider = Arc::new(StubProvider::new());
      provider.set_parent(h(5), h(3));
      let (reconciler, mut rx) = reconciler(&provider);
      reconciler.reconcile(event(EventKind::Create, 5));
      reconciler.reconcile(event(EventKind::Create, 7));
      reconciler.reconcile(event(EventKind::Destroy, 3));
      drain(&mut rx);

      reconciler.reconcile(event(EventKind::Focus, 5));

      reconciler.read(|cache| {
        assert_eq!(cache.focus_order(), vec![h(7)]);
      });
      assert!(
        drain(&mut rx).is_empty(),
        "a dead-end focus walk must not touch the order"
      );
    }

    #[test]
    fn foreground_behaves_like_focus() {
      let provider = Arc::new(StubProvider::new());
      provider.set_parent(h(5), h(3));
      let (reconciler, _rx) = reconciler(&provider);
      reconciler.reconcile(event(EventKind::Create, 5));
      reconciler.reconcile(event(EventKind::Create, 7));

      reconciler.reconcile(event(EventKind::Foreground, 5));

      reconciler.read(|cache| {
        assert_eq!(cache.focus_order(), vec![h(3), h(7)]);
      });
    }
  }

  mod invalidation {
    use super::*;

    #[test]
    fn a_rename_clears_the_cached_title_without_querying() {
      let provider = Arc::new(StubProvider::new());
      provider.set_title(h(5), "before");
      let (reconciler, mut rx) = reconciler(&provider);
      reconciler.reconcile(event(EventKind::Create, 5));
      reconciler.write(|cache| {
        let revision = cache.node(h(5)).unwrap().revision;
        cache.store_title(h(5), "before".into(), revision);
      });
      drain(&mut rx);

      reconciler.reconcile(event(EventKind::NameChange, 5));

      reconciler.read(|cache| {
        assert_eq!(cache.node(h(5)).unwrap().title, None);
      });
      assert_eq!(
        provider.queries(h(5)).text,
        0,
        "invalidation is lazy; nothing re-reads the title"
      );
      assert_eq!(drain(&mut rx), vec![Event::TitleChanged { window: h(5) }]);
    }

    #[test]
    fn move_events_clear_bounds_for_the_moved_window_only() {
      let provider = Arc::new(StubProvider::new());
      provider.set_parent(h(5), h(3));
      provider.set_parent(h(6), h(3));
      let (reconciler, mut rx) = reconciler(&provider);
      reconciler.reconcile(event(EventKind::Create, 5));
      reconciler.reconcile(event(EventKind::Create, 6));
      reconciler.write(|cache| {
        let revision = cache.node(h(5)).unwrap().revision;
        cache.store_bounds(h(5), Bounds::new(0.0, 0.0, 100.0, 100.0), revision);
        let revision = cache.node(h(6)).unwrap().revision;
        cache.store_bounds(h(6), Bounds::new(200.0, 0.0, 100.0, 100.0), revision);
      });
      drain(&mut rx);

      reconciler.reconcile(event(EventKind::LocationChange, 5));

      reconciler.read(|cache| {
        assert_eq!(cache.node(h(5)).unwrap().bounds, None);
        assert!(
          cache.node(h(6)).unwrap().bounds.is_some(),
          "siblings keep their cached bounds"
        );
      });
      assert_eq!(drain(&mut rx), vec![Event::BoundsChanged { window: h(5) }]);
    }

    #[test]
    fn move_size_loop_edges_also_clear_bounds() {
      let provider = Arc::new(StubProvider::new());
      let (reconciler, _rx) = reconciler(&provider);
      reconciler.reconcile(event(EventKind::Create, 5));

      for kind in [EventKind::MoveSizeStart, EventKind::MoveSizeEnd] {
        reconciler.write(|cache| {
          let revision = cache.node(h(5)).unwrap().revision;
          cache.store_bounds(h(5), Bounds::new(0.0, 0.0, 10.0, 10.0), revision);
        });
        reconciler.reconcile(event(kind, 5));
        reconciler.read(|cache| {
          assert_eq!(
            cache.node(h(5)).unwrap().bounds,
            None,
            "{kind:?} must invalidate bounds"
          );
        });
      }
    }

    #[test]
    fn show_and_hide_only_bootstrap() {
      let provider = Arc::new(StubProvider::new());
      let (reconciler, mut rx) = reconciler(&provider);
      reconciler.reconcile(event(EventKind::Create, 5));
      drain(&mut rx);

      reconciler.reconcile(event(EventKind::Show, 9));

      reconciler.read(|cache| {
        assert!(cache.contains(h(9)));
        assert_eq!(
          cache.focus_order(),
          vec![h(5), h(9)],
          "a visibility sighting joins the back"
        );
      });
      drain(&mut rx);

      // For already-tracked windows they are pure no-ops.
      reconciler.reconcile(event(EventKind::Show, 5));
      reconciler.reconcile(event(EventKind::Hide, 5));
      assert!(drain(&mut rx).is_empty());
    }
  }

  mod reentrancy {
    use super::*;
    use parking_lot::Mutex;
    use std::collections::HashMap;

    type Script = Box<dyn FnOnce() + Send>;

    /// Table-backed provider that fires a one-shot script inside a chosen
    /// `parent` query, after the answer is fixed but before it returns -
    /// the point where the OS delivers a nested notification.
    #[derive(Default)]
    struct ScriptedProvider {
      parents: Mutex<HashMap<WindowHandle, WindowHandle>>,
      parent_script: Mutex<Option<(WindowHandle, Script)>>,
    }

    impl ScriptedProvider {
      fn set_parent(&self, child: WindowHandle, parent: WindowHandle) {
        self.parents.lock().insert(child, parent);
      }

      fn script_during_parent(
        &self,
        window: WindowHandle,
        script: impl FnOnce() + Send + 'static,
      ) {
        *self.parent_script.lock() = Some((window, Box::new(script)));
      }
    }

    impl WindowProvider for ScriptedProvider {
      fn parent(&self, window: WindowHandle) -> Option<WindowHandle> {
        let answer = self.parents.lock().get(&window).copied();
        let script = {
          let mut slot = self.parent_script.lock();
          match slot.take() {
            Some((target, script)) if target == window => Some(script),
            Some(kept) => {
              *slot = Some(kept);
              None
            }
            None => None,
          }
        };
        if let Some(script) = script {
          script();
        }
        answer
      }

      fn class_name(&self, _window: WindowHandle) -> Option<String> {
        None
      }

      fn text(&self, _window: WindowHandle) -> Option<String> {
        None
      }

      fn bounds(&self, _window: WindowHandle) -> Option<Bounds> {
        None
      }
    }

    #[test]
    fn a_destroy_inside_the_ancestry_query_leaves_no_ghost_root() {
      let provider = Arc::new(ScriptedProvider::default());
      let (reconciler, mut rx) = reconciler(&provider);
      provider.script_during_parent(h(5), {
        let nested = reconciler.clone();
        move || nested.reconcile(event(EventKind::Destroy, 5))
      });

      reconciler.reconcile(event(EventKind::Create, 5));

      reconciler.read(|cache| {
        assert!(!cache.contains(h(5)));
        assert_eq!(
          cache.focus_order(),
          vec![] as Vec<WindowHandle>,
          "a window destroyed under its own walk must not enter the focus order"
        );
        assert_eq!(cache.frontmost(), None);
      });
      assert_eq!(
        drain(&mut rx),
        vec![
          Event::WindowAdded { window: h(5) },
          Event::WindowRemoved { window: h(5) },
        ]
      );
    }

    #[test]
    fn a_destroy_inside_the_ancestry_query_still_materializes_ancestors() {
      let provider = Arc::new(ScriptedProvider::default());
      let (reconciler, mut rx) = reconciler(&provider);
      provider.set_parent(h(5), h(3));
      provider.script_during_parent(h(5), {
        let nested = reconciler.clone();
        move || nested.reconcile(event(EventKind::Destroy, 5))
      });

      reconciler.reconcile(event(EventKind::Create, 5));

      reconciler.read(|cache| {
        assert!(!cache.contains(h(5)));
        assert!(cache.contains(h(3)), "the ancestor is real and stays tracked");
        assert_eq!(
          cache.children(h(3)),
          &[] as &[WindowHandle],
          "no edge to the dead window"
        );
        assert_eq!(cache.focus_order(), vec![h(3)]);
      });
      assert_eq!(
        drain(&mut rx),
        vec![
          Event::WindowAdded { window: h(5) },
          Event::WindowRemoved { window: h(5) },
          Event::WindowAdded { window: h(3) },
          Event::FocusChanged {
            window: Some(h(3))
          },
        ]
      );
    }

    #[test]
    fn interleaved_sightings_with_contradictory_parents_stay_acyclic() {
      let provider = Arc::new(ScriptedProvider::default());
      let (reconciler, mut rx) = reconciler(&provider);
      provider.set_parent(h(1), h(2));
      provider.set_parent(h(2), h(1));
      provider.script_during_parent(h(1), {
        let nested = reconciler.clone();
        move || nested.reconcile(event(EventKind::Create, 2))
      });

      reconciler.reconcile(event(EventKind::Create, 1));

      reconciler.read(|cache| {
        assert_eq!(cache.parent(h(2)), Some(h(1)), "the nested link wins");
        assert_eq!(cache.parent(h(1)), None, "the stale half of the cycle is refused");
        assert_eq!(cache.children(h(1)), &[h(2)]);
        assert_eq!(cache.children(h(2)), &[] as &[WindowHandle]);
        assert_eq!(cache.focus_order(), vec![h(1)]);
      });
      assert_eq!(
        drain(&mut rx),
        vec![
          Event::WindowAdded { window: h(1) },
          Event::WindowAdded { window: h(2) },
          Event::FocusChanged {
            window: Some(h(1))
          },
        ]
      );

      // The walk a cycle would have trapped terminates.
      reconciler.reconcile(event(EventKind::Focus, 2));
      reconciler.read(|cache| assert_eq!(cache.frontmost(), Some(h(1))));
    }
  }
}
