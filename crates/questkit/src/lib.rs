//! Deterministic state-vector simulation behind a handle API.
//!
//! Transactions are mapped onto circuits, circuits run on a dense register,
//! and every execution yields a result buffer carrying a SHA3-256 digest of
//! the final state. [`api`] is the Rust boundary, [`ffi`] the C one.

pub mod api;
pub mod bench;
pub mod builder;
pub mod config;
pub mod decoder;
pub mod error;
pub mod ffi;
pub mod mapper;
pub mod result;
pub mod session;

pub use api::{
    calc_state_hash, execute_transaction, finalize, free_result, initialize, random_bytes,
    random_number, set_thread_count, simulate_circuit, Handle, QuestKit,
};
pub use builder::{encode_circuit, CircuitBuilder};
pub use config::SessionConfig;
pub use decoder::decode_circuit;
pub use error::{QuestError, Result};
pub use mapper::map_transaction;
pub use result::{ExecutionResult, ResultBuffer, ResultKind};
pub use session::{Session, SessionStats, MAX_RANDOM_BYTES};

pub fn version() -> &'static str {
    concat!("questkit/", env!("CARGO_PKG_VERSION"))
}
