/*!
Adapter functions converting cache entries into public API types.

All functions take `&Cache` and are called inside a read closure; they never
touch the OS, so unfetched attributes come out as `None`.
*/

use super::Cache;
use crate::types::{Snapshot, WindowHandle, WindowInfo};

/// Build the projection of one cached window, links included.
pub(super) fn window_info(cache: &Cache, handle: WindowHandle) -> Option<WindowInfo> {
  let node = cache.node(handle)?;
  Some(WindowInfo {
    handle: node.handle,
    parent: cache.parent(handle),
    children: cache.children(handle).to_vec(),
    class_name: node.class_name.clone(),
    title: node.title.clone(),
    bounds: node.bounds,
  })
}

/// Projections of every cached window, ordered by handle for stable output.
pub(super) fn all_windows(cache: &Cache) -> Vec<WindowInfo> {
  let mut handles: Vec<WindowHandle> = cache.handles().collect();
  handles.sort_unstable();
  handles
    .into_iter()
    .filter_map(|handle| window_info(cache, handle))
    .collect()
}

/// One consistent copy of the whole mirror.
pub(super) fn build_snapshot(cache: &Cache) -> Snapshot {
  Snapshot {
    windows: all_windows(cache),
    focus_order: cache.focus_order(),
    frontmost: cache.frontmost(),
  }
}
