/*!
Tree relationship management.

Single source of truth for parent-child links between cached windows.

## Invariants

1. **Single parent**: a child is linked to at most one parent for its
   lifetime. The OS never reparents a window that this mirror tracks; a
   second link request for a linked child is rejected.
2. **Bidirectional consistency**: if `parent_of[child] = parent`, then
   `children_of[parent]` contains `child` - except after the parent's
   destruction, when `take_children` drops the list and the children's
   parent links deliberately dangle until their own destroy events arrive.
3. **Acyclic**: a link that would make a window its own ancestor is
   rejected. Interleaved materialization walks can request the two halves
   of a cycle; whichever half arrives second loses.
*/

use crate::types::WindowHandle;
use std::collections::HashMap;

pub(crate) struct WindowTree {
  parent_of: HashMap<WindowHandle, WindowHandle>,
  children_of: HashMap<WindowHandle, Vec<WindowHandle>>,
}

impl WindowTree {
  pub(super) fn new() -> Self {
    Self {
      parent_of: HashMap::new(),
      children_of: HashMap::new(),
    }
  }

  /// Get the parent link of a window. Dangling links are reported as-is.
  pub(super) fn parent(&self, handle: WindowHandle) -> Option<WindowHandle> {
    self.parent_of.get(&handle).copied()
  }

  /// Get the children of a window (empty slice if none or not tracked).
  pub(super) fn children(&self, handle: WindowHandle) -> &[WindowHandle] {
    self.children_of.get(&handle).map_or(&[], Vec::as_slice)
  }

  /// Link a child to a parent. Returns whether the pair is linked when the
  /// call returns.
  ///
  /// - Same parent: no-op (idempotent, so repeated materialization from
  ///   different descendants is safe)
  /// - No parent: links, unless `child` already sits in the parent's own
  ///   ancestor chain - that closes a cycle and is rejected
  /// - Different parent: rejected (the OS does not reparent tracked windows;
  ///   a conflicting link request means the caller sighted a reused handle
  ///   it should have destroyed first)
  pub(super) fn link(&mut self, parent: WindowHandle, child: WindowHandle) -> bool {
    if let Some(&existing) = self.parent_of.get(&child) {
      if existing == parent {
        return true;
      }
      log::warn!("link: window {child} already has parent {existing}, not moving under {parent}");
      return false;
    }

    // Existing links are acyclic, so this walk terminates even when it
    // crosses dangling edges.
    let mut ancestor = Some(parent);
    while let Some(current) = ancestor {
      if current == child {
        log::warn!("link: window {child} is an ancestor of {parent}, refusing the cycle");
        return false;
      }
      ancestor = self.parent_of.get(&current).copied();
    }

    self.parent_of.insert(child, parent);
    self.children_of.entry(parent).or_default().push(child);
    true
  }

  /// Unlink a window from its parent, pruning it from the parent's child
  /// list. Returns the former parent, dangling or not.
  pub(super) fn detach(&mut self, handle: WindowHandle) -> Option<WindowHandle> {
    let parent = self.parent_of.remove(&handle)?;
    if let Some(siblings) = self.children_of.get_mut(&parent) {
      siblings.retain(|&h| h != handle);
    }
    Some(parent)
  }

  /// Drop a dying window's child list, returning it.
  ///
  /// The children's own parent links are kept: they dangle until each
  /// child's destroy event arrives. Destruction never cascades.
  pub(super) fn take_children(&mut self, handle: WindowHandle) -> Vec<WindowHandle> {
    self.children_of.remove(&handle).unwrap_or_default()
  }
}
