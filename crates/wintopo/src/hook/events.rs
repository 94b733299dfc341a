/*! Typed window lifecycle notifications crossing the hook seam. */

#![allow(missing_docs)]

use crate::types::WindowHandle;
use std::ops::RangeInclusive;

/// Kind of a window lifecycle notification.
///
/// Discriminants are the OS numeric event IDs, which fall in two contiguous
/// ranges: [`EventKind::SYSTEM_EVENTS`] for desktop-wide notifications and
/// [`EventKind::WINDOW_EVENTS`] for per-object ones. The mirror subscribes
/// to both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u32)]
pub enum EventKind {
  /// The foreground window changed.
  Foreground = 0x0003,
  /// An interactive move/size loop started.
  MoveSizeStart = 0x000A,
  /// An interactive move/size loop finished.
  MoveSizeEnd = 0x000B,
  /// A window was created.
  Create = 0x8000,
  /// A window was destroyed.
  Destroy = 0x8001,
  /// A window became visible.
  Show = 0x8002,
  /// A window was hidden.
  Hide = 0x8003,
  /// A window received keyboard focus.
  Focus = 0x8005,
  /// A window moved, resized, or changed z-position.
  LocationChange = 0x800B,
  /// A window's text changed.
  NameChange = 0x800C,
}

impl EventKind {
  /// Desktop-wide range: foreground and move/size loop notifications.
  pub const SYSTEM_EVENTS: RangeInclusive<EventKind> =
    EventKind::Foreground..=EventKind::MoveSizeEnd;

  /// Per-object range: window lifecycle notifications.
  pub const WINDOW_EVENTS: RangeInclusive<EventKind> = EventKind::Create..=EventKind::NameChange;

  /// Numeric OS event ID.
  pub const fn raw(self) -> u32 {
    self as u32
  }

  /// Map a raw OS event ID to a kind. Unlisted IDs (the ranges contain gaps
  /// the mirror does not care about) yield `None`.
  pub const fn from_raw(raw: u32) -> Option<Self> {
    match raw {
      0x0003 => Some(Self::Foreground),
      0x000A => Some(Self::MoveSizeStart),
      0x000B => Some(Self::MoveSizeEnd),
      0x8000 => Some(Self::Create),
      0x8001 => Some(Self::Destroy),
      0x8002 => Some(Self::Show),
      0x8003 => Some(Self::Hide),
      0x8005 => Some(Self::Focus),
      0x800B => Some(Self::LocationChange),
      0x800C => Some(Self::NameChange),
      _ => None,
    }
  }
}

/// Which UI sub-element a notification concerns.
///
/// Only [`ObjectKind::Window`] and [`ObjectKind::Client`] are
/// topology-relevant; the reconciler discards events for every other kind
/// before touching the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum ObjectKind {
  Window = 0,
  SysMenu = -1,
  TitleBar = -2,
  Menu = -3,
  Client = -4,
  VScroll = -5,
  HScroll = -6,
  SizeGrip = -7,
  Caret = -8,
  Cursor = -9,
  Alert = -10,
  Sound = -11,
}

impl ObjectKind {
  /// Numeric OS object ID.
  pub const fn raw(self) -> i32 {
    self as i32
  }

  /// Map a raw OS object ID to a kind.
  pub const fn from_raw(raw: i32) -> Option<Self> {
    match raw {
      0 => Some(Self::Window),
      -1 => Some(Self::SysMenu),
      -2 => Some(Self::TitleBar),
      -3 => Some(Self::Menu),
      -4 => Some(Self::Client),
      -5 => Some(Self::VScroll),
      -6 => Some(Self::HScroll),
      -7 => Some(Self::SizeGrip),
      -8 => Some(Self::Caret),
      -9 => Some(Self::Cursor),
      -10 => Some(Self::Alert),
      -11 => Some(Self::Sound),
      _ => None,
    }
  }

  /// `true` for the window itself or its client area.
  pub const fn is_window(self) -> bool {
    matches!(self, Self::Window | Self::Client)
  }
}

/// One notification as delivered by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HookEvent {
  pub kind: EventKind,
  /// Subject window. The OS sends null handles for some desktop-wide
  /// notifications; those carry `None` and never reach the cache.
  pub window: Option<WindowHandle>,
  pub object: ObjectKind,
  /// Child element within the object; `0` is the object itself.
  pub child: i32,
  /// OS thread that generated the notification.
  pub thread: u32,
  /// OS tick timestamp, in milliseconds.
  pub time_ms: u32,
}

impl HookEvent {
  /// Construct a notification with the bookkeeping fields zeroed.
  pub const fn new(kind: EventKind, window: Option<WindowHandle>, object: ObjectKind) -> Self {
    Self {
      kind,
      window,
      object,
      child: 0,
      thread: 0,
      time_ms: 0,
    }
  }
}
