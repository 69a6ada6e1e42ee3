//! Adapter module - headless control via TCP socket with a JSON line protocol
//!
//! This module lets an external presentation (a GUI, a bot, a test harness)
//! drive the engine over a socket. The engine runs in its own task; the server
//! only parses, sequences and routes.
//!
//! # Protocol Overview
//!
//! One JSON object per line, discriminated by `type`:
//!
//! ## Client → Server
//!
//! | type | fields |
//! |------|--------|
//! | `start_session` | `progression`, `difficulty?`, `endless?` |
//! | `layout` | `containers: [{id,x,y}]`, `discard?: {x,y}`, radii |
//! | `arm` | `token_id`, `x`, `y` |
//! | `pointer` | `x`, `y` |
//! | `commit` | `x`, `y` |
//! | `hint`, `restart`, `snapshot` | - |
//! | `fling_settled` | `token_id` |
//!
//! Every message carries a strictly increasing `seq`.
//!
//! ## Server → Client
//!
//! - **ack** `{seq}`: command applied
//! - **error** `{seq, code, message}`: refused (engine or protocol code)
//! - **event** `{event}`: engine event, broadcast to every client
//! - **snapshot** `{seq, snapshot}`: reply to `snapshot`
//!
//! # Environment Variables
//!
//! - `CRATE_DIGGER_HOST`: bind address (default: "127.0.0.1")
//! - `CRATE_DIGGER_PORT`: port number (default: 7878)
//! - `CRATE_DIGGER_MAX_PENDING`: bounded command queue (default: 16)
//! - `CRATE_DIGGER_TICK_MS`: scheduler tick (default: 50)
//! - `CRATE_DIGGER_ADAPTER_DISABLED`: set to "1" or "true" to disable the adapter
//!
//! # Example Protocol Flow
//!
//! ```text
//! Client -> Server: {"type":"start_session","seq":1,"progression":0}
//! Server -> Client: {"type":"ack","seq":1}
//! Server -> Client: {"type":"event","event":{"event":"session_started","session_id":1,"progression":0}}
//! Client -> Server: {"type":"arm","seq":2,"token_id":3,"x":0,"y":0}
//! ```
//!
//! # Testing
//!
//! ```bash
//! nc 127.0.0.1 7878
//! {"type":"start_session","seq":1,"progression":0}
//! ```

pub mod protocol;
pub mod runtime;
pub mod server;

pub use crate_digger_engine as engine;
pub use crate_digger_engine::core;
pub use crate_digger_types as types;

pub use protocol::*;
pub use runtime::{apply, run_engine, InboundCommand, OutboundMessage};
pub use server::{run_server, serve, ServerConfig};
