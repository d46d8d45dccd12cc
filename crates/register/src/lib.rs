//! Dense amplitude storage for an n-qubit register.
//!
//! Amplitude `i` belongs to the basis state whose bit `q` is the value of
//! qubit `q`.

pub mod buffer;
pub mod error;

pub use buffer::{AmplitudeBuffer, C64, HARD_MAX_QUBITS};
pub use error::{RegisterError, Result};
