use register::RegisterError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, QuantumError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum QuantumError {
    #[error(transparent)]
    Register(#[from] RegisterError),

    #[error("Qubit {qubit} out of range for {num_qubits}-qubit register")]
    QubitOutOfRange { qubit: usize, num_qubits: usize },

    #[error("Qubit {qubit} used more than once by {gate}")]
    DuplicateQubit { qubit: usize, gate: &'static str },

    #[error("{gate} expects {expected} qubit operands, got {actual}")]
    OperandCount {
        gate: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("Circuit is built for {circuit} qubits but the register holds {register}")]
    RegisterMismatch { circuit: usize, register: usize },

    #[error("Circuit contains a measurement and cannot be inverted")]
    Irreversible,

    #[error("Thread count must be at least 1")]
    InvalidThreadCount,

    #[error("Failed to build worker pool: {0}")]
    ThreadPool(String),
}
