/*! Branded ID types for type-safe OS references. */

use derive_more::{Display, From, Into};
use serde::{Deserialize, Serialize};

/// OS-assigned window identifier.
///
/// Opaque and stable for the life of the window. The OS may reuse the value
/// after the window is destroyed, so a handle seen again after a destroy
/// event names a brand new window.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display, From,
  Into,
)]
pub struct WindowHandle(pub u64);

/// Backend-issued identifier for one live hook registration.
///
/// Runtime-only; never serialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, From, Into)]
pub struct HookToken(pub u64);
