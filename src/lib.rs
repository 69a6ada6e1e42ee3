//! Crate Digger (workspace facade crate).
//!
//! Re-exports the member crates under one roof so binaries, integration tests and
//! benches can use `crate_digger::{core,engine,input,adapter,types}`.

pub use crate_digger_adapter as adapter;
pub use crate_digger_core as core;
pub use crate_digger_engine as engine;
pub use crate_digger_input as input;
pub use crate_digger_types as types;
