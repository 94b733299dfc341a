/*!
Programmable stand-ins for the OS seams.

[`StubProvider`] answers property queries from in-memory tables and counts
every query, so tests can assert exactly when the mirror consults the OS.
[`FakeBackend`] implements hook registration with manual dispatch. Together
they drive a full mirror without a desktop session:

```ignore
let backend = Arc::new(FakeBackend::new());
let provider = Arc::new(StubProvider::new());
provider.set_parent(WindowHandle(5), WindowHandle(3));

let mirror = Wintopo::attach(Arc::clone(&backend) as _, Arc::clone(&provider) as _)?;
backend.emit(HookEvent::new(
  EventKind::Create,
  Some(WindowHandle(5)),
  ObjectKind::Window,
));
assert_eq!(mirror.frontmost(), Some(WindowHandle(3)));
```
*/

use crate::hook::{HookBackend, HookEvent, HookSink};
use crate::provider::WindowProvider;
use crate::types::{Bounds, HookToken, WindowHandle, WintopoError, WintopoResult};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

/// Per-handle provider query counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct QueryCounts {
  /// Calls to [`WindowProvider::parent`].
  pub parent: usize,
  /// Calls to [`WindowProvider::class_name`].
  pub class_name: usize,
  /// Calls to [`WindowProvider::text`].
  pub text: usize,
  /// Calls to [`WindowProvider::bounds`].
  pub bounds: usize,
}

#[derive(Default)]
struct StubState {
  parents: HashMap<WindowHandle, WindowHandle>,
  class_names: HashMap<WindowHandle, String>,
  titles: HashMap<WindowHandle, String>,
  bounds: HashMap<WindowHandle, Bounds>,
  counts: HashMap<WindowHandle, QueryCounts>,
}

/// Programmable [`WindowProvider`] backed by in-memory tables.
///
/// A handle absent from a table answers `None`, which the mirror reads as
/// "top-level" for parents and "vanished" for everything else.
#[derive(Default)]
pub struct StubProvider {
  state: Mutex<StubState>,
}

impl std::fmt::Debug for StubProvider {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("StubProvider").finish_non_exhaustive()
  }
}

impl StubProvider {
  /// Empty provider; every query answers `None` until declared.
  pub fn new() -> Self {
    Self::default()
  }

  /// Declare `child`'s parent. Absent entries read as top-level.
  pub fn set_parent(&self, child: WindowHandle, parent: WindowHandle) {
    self.state.lock().parents.insert(child, parent);
  }

  /// Declare a window's class name.
  pub fn set_class_name(&self, window: WindowHandle, class_name: impl Into<String>) {
    self.state.lock().class_names.insert(window, class_name.into());
  }

  /// Declare a window's current title.
  pub fn set_title(&self, window: WindowHandle, title: impl Into<String>) {
    self.state.lock().titles.insert(window, title.into());
  }

  /// Declare a window's current bounds.
  pub fn set_bounds(&self, window: WindowHandle, bounds: Bounds) {
    self.state.lock().bounds.insert(window, bounds);
  }

  /// Drop a window from every table, as if it vanished from the OS.
  pub fn vanish(&self, window: WindowHandle) {
    let mut state = self.state.lock();
    state.parents.remove(&window);
    state.class_names.remove(&window);
    state.titles.remove(&window);
    state.bounds.remove(&window);
  }

  /// Query counters for `window`. Zeroed until the first query.
  pub fn queries(&self, window: WindowHandle) -> QueryCounts {
    self
      .state
      .lock()
      .counts
      .get(&window)
      .copied()
      .unwrap_or_default()
  }
}

impl WindowProvider for StubProvider {
  fn parent(&self, window: WindowHandle) -> Option<WindowHandle> {
    let mut state = self.state.lock();
    state.counts.entry(window).or_default().parent += 1;
    state.parents.get(&window).copied()
  }

  fn class_name(&self, window: WindowHandle) -> Option<String> {
    let mut state = self.state.lock();
    state.counts.entry(window).or_default().class_name += 1;
    state.class_names.get(&window).cloned()
  }

  fn text(&self, window: WindowHandle) -> Option<String> {
    let mut state = self.state.lock();
    state.counts.entry(window).or_default().text += 1;
    state.titles.get(&window).cloned()
  }

  fn bounds(&self, window: WindowHandle) -> Option<Bounds> {
    let mut state = self.state.lock();
    state.counts.entry(window).or_default().bounds += 1;
    state.bounds.get(&window).copied()
  }
}

struct Installed {
  token: HookToken,
  min: u32,
  max: u32,
  sink: HookSink,
}

/// Manual-dispatch [`HookBackend`].
///
/// `install` hands out tokens and records the raw range;
/// [`FakeBackend::emit`] then delivers an event to every live sink whose
/// range contains the event's raw kind, in installation order - the same
/// serial delivery a real message loop provides. Installation failures can
/// be injected to exercise registration error paths.
#[derive(Default)]
pub struct FakeBackend {
  sinks: Mutex<Vec<Installed>>,
  next_token: AtomicU64,
  attempts: AtomicUsize,
  fail_from: AtomicUsize,
  removals: AtomicUsize,
}

impl std::fmt::Debug for FakeBackend {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("FakeBackend")
      .field("installed", &self.installed())
      .finish_non_exhaustive()
  }
}

impl FakeBackend {
  /// Backend with no registrations and no injected failures.
  pub fn new() -> Self {
    Self::default()
  }

  /// Make the `n`-th and every later install attempt fail, counting from 1.
  pub fn fail_installs_from(&self, n: usize) {
    self.fail_from.store(n, Ordering::SeqCst);
  }

  /// Number of currently installed (not yet removed) registrations.
  pub fn installed(&self) -> usize {
    self.sinks.lock().len()
  }

  /// Raw ranges of the live registrations, in installation order.
  pub fn installed_ranges(&self) -> Vec<(u32, u32)> {
    self
      .sinks
      .lock()
      .iter()
      .map(|installed| (installed.min, installed.max))
      .collect()
  }

  /// Number of `remove` calls that tore down a live registration.
  pub fn removals(&self) -> usize {
    self.removals.load(Ordering::SeqCst)
  }

  /// Deliver one notification to every registration covering its kind.
  pub fn emit(&self, event: HookEvent) {
    // Clone the matching sinks out first; a sink may call back into the
    // backend and must not find the registry locked.
    let sinks: Vec<HookSink> = self
      .sinks
      .lock()
      .iter()
      .filter(|installed| (installed.min..=installed.max).contains(&event.kind.raw()))
      .map(|installed| Arc::clone(&installed.sink))
      .collect();
    for sink in sinks {
      sink(event);
    }
  }
}

impl HookBackend for FakeBackend {
  fn install(&self, min: u32, max: u32, sink: HookSink) -> WintopoResult<HookToken> {
    let attempt = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;
    let fail_from = self.fail_from.load(Ordering::SeqCst);
    if fail_from != 0 && attempt >= fail_from {
      return Err(WintopoError::HookRegistration(format!(
        "backend refused install attempt {attempt}"
      )));
    }

    let token = HookToken(self.next_token.fetch_add(1, Ordering::SeqCst) + 1);
    self.sinks.lock().push(Installed {
      token,
      min,
      max,
      sink,
    });
    Ok(token)
  }

  fn remove(&self, token: HookToken) {
    let mut sinks = self.sinks.lock();
    let before = sinks.len();
    sinks.retain(|installed| installed.token != token);
    if sinks.len() < before {
      self.removals.fetch_add(1, Ordering::SeqCst);
    }
  }
}
