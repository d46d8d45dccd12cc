pub mod circuit;
pub mod engine;
pub mod error;
pub mod gates;
pub mod hasher;
pub mod measurement;
pub mod scheduler;

pub use circuit::{Circuit, GateOp, Instruction};
pub use engine::{Engine, RunReport};
pub use error::{QuantumError, Result};
pub use gates::{Gate, GateSpec, ParamKind};
pub use hasher::{state_digest, StateDigest};
pub use scheduler::{Scheduler, SchedulerConfig};
