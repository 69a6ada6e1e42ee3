//! Terminal input module (engine-facing).
//!
//! Maps `crossterm` mouse and key events into pointer samples and session keys,
//! and drives the [`engine::Engine`] placement commands from a pointer stream.
//! Independent of any rendering.

pub mod handler;
pub mod map;

pub use crate_digger_engine as engine;
pub use crate_digger_types as types;

pub use handler::{Dispatched, PointerDispatcher, TrayRegion};
pub use map::{handle_key_event, map_mouse_event, should_quit, PointerInput, SessionKey};
