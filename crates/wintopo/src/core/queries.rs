/*!
Read surface of the mirror.

Topology and snapshot queries are pure cache lookups - fast and always
answerable, attached or not. Attribute reads (`title`, `class_name`,
`bounds`) are lazy: the cached value when present, otherwise one provider
query with write-back. The provider is never called while a lock is held.
*/

use super::{adapters, Cache, Wintopo};
use crate::types::{Bounds, Snapshot, WindowHandle, WindowInfo, WintopoError, WintopoResult};

impl Wintopo {
  // ==========================================================================
  // Cache lookups - no OS calls
  // ==========================================================================

  /// Whether `handle` is currently tracked.
  pub fn contains(&self, handle: WindowHandle) -> bool {
    self.read(|cache| cache.contains(handle))
  }

  /// Projection of one tracked window, or `None` if untracked.
  pub fn window(&self, handle: WindowHandle) -> Option<WindowInfo> {
    self.read(|cache| adapters::window_info(cache, handle))
  }

  /// Projections of every tracked window, ordered by handle.
  pub fn windows(&self) -> Vec<WindowInfo> {
    self.read(adapters::all_windows)
  }

  /// Parent link of a tracked window. `None` means top-level. The link may
  /// name a window no longer cached if the parent was destroyed first.
  pub fn parent(&self, handle: WindowHandle) -> WintopoResult<Option<WindowHandle>> {
    self.read(|cache| {
      if !cache.contains(handle) {
        return Err(WintopoError::WindowNotFound(handle));
      }
      Ok(cache.parent(handle))
    })
  }

  /// Children of a tracked window, in first-seen order.
  pub fn children(&self, handle: WindowHandle) -> WintopoResult<Vec<WindowHandle>> {
    self.read(|cache| {
      if !cache.contains(handle) {
        return Err(WintopoError::WindowNotFound(handle));
      }
      Ok(cache.children(handle).to_vec())
    })
  }

  /// Top-level handles, most recently focused first.
  pub fn focus_order(&self) -> Vec<WindowHandle> {
    self.read(Cache::focus_order)
  }

  /// The most recently focused top-level window.
  pub fn frontmost(&self) -> Option<WindowHandle> {
    self.read(Cache::frontmost)
  }

  /// Consistent copy of the whole mirror, taken under one read lock.
  pub fn snapshot(&self) -> Snapshot {
    self.read(adapters::build_snapshot)
  }

  // ==========================================================================
  // Lazy attribute reads - may call the provider, never under a lock
  // ==========================================================================

  /// Current title of a tracked window.
  ///
  /// Returns the cached value when present; otherwise queries the provider
  /// once and caches the result. `Ok(None)` means the provider could not
  /// answer (the window vanished); nothing is cached and a later read asks
  /// again. A rename that lands while the provider is answering wins: the
  /// fetched value is returned to this caller but not cached, and the next
  /// read queries again.
  pub fn title(&self, handle: WindowHandle) -> WintopoResult<Option<String>> {
    // Step 1: cached value and node revision (quick read)
    let (cached, revision) = self.read(|cache| {
      cache
        .node(handle)
        .map(|node| (node.title.clone(), node.revision))
        .ok_or(WintopoError::WindowNotFound(handle))
    })?;
    if cached.is_some() {
      return Ok(cached);
    }

    // Step 2: provider query (NO LOCK HELD)
    let Some(title) = self.provider().text(handle) else {
      return Ok(None);
    };

    // Step 3: write back (quick write), discarded if the revision moved
    self.write(|cache| cache.store_title(handle, title.clone(), revision));
    Ok(Some(title))
  }

  /// Class name of a tracked window.
  ///
  /// Class names never change for a live window, so the first successful
  /// fetch is cached for the window's whole lifetime.
  pub fn class_name(&self, handle: WindowHandle) -> WintopoResult<Option<String>> {
    let (cached, revision) = self.read(|cache| {
      cache
        .node(handle)
        .map(|node| (node.class_name.clone(), node.revision))
        .ok_or(WintopoError::WindowNotFound(handle))
    })?;
    if cached.is_some() {
      return Ok(cached);
    }

    let Some(class_name) = self.provider().class_name(handle) else {
      return Ok(None);
    };

    self.write(|cache| cache.store_class_name(handle, class_name.clone(), revision));
    Ok(Some(class_name))
  }

  /// Current bounds of a tracked window, in screen coordinates.
  pub fn bounds(&self, handle: WindowHandle) -> WintopoResult<Option<Bounds>> {
    let (cached, revision) = self.read(|cache| {
      cache
        .node(handle)
        .map(|node| (node.bounds, node.revision))
        .ok_or(WintopoError::WindowNotFound(handle))
    })?;
    if cached.is_some() {
      return Ok(cached);
    }

    let Some(bounds) = self.provider().bounds(handle) else {
      return Ok(None);
    };

    self.write(|cache| cache.store_bounds(handle, bounds, revision));
    Ok(Some(bounds))
  }
}
