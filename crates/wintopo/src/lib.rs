/*!
Wintopo - Window Topology Mirror

```ignore
use wintopo::Wintopo;

// Attach to the OS seams the host supplies
let mirror = Wintopo::attach(backend, provider)?;
mirror.seed(already_open_windows);

// Query the mirrored topology (fast, no OS calls)
let windows = mirror.windows();
let front = mirror.frontmost();
let snapshot = mirror.snapshot();

// Attribute reads are lazy: cached value, or one OS query with write-back
let title = mirror.title(handle)?;
let bounds = mirror.bounds(handle)?;

// Subscribe to change events
let mut events = mirror.subscribe();
while let Ok(event) = events.recv().await {
  // handle event
}

// The feed stops when the last clone is dropped
drop(mirror);
```
*/

mod core;
mod hook;
mod provider;

pub mod testing;

mod types;
pub use types::*;

pub use crate::core::Wintopo;
pub use crate::hook::{
  EventHook, EventKind, HookBackend, HookEvent, HookHandle, HookSink, ObjectKind,
};
pub use crate::provider::WindowProvider;
