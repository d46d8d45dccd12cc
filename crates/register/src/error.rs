use thiserror::Error;

pub type Result<T> = std::result::Result<T, RegisterError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegisterError {
    /// The register would not fit: either above the configured qubit limit,
    /// or the allocator refused the request.
    #[error("Out of memory: {qubits}-qubit register needs {bytes} bytes (limit {max_qubits} qubits)")]
    OutOfMemory {
        qubits: usize,
        max_qubits: usize,
        bytes: u128,
    },

    #[error("Register must hold at least one qubit")]
    InvalidQubitCount,

    #[error("Amplitude count {dimension} is not a power of two >= 2")]
    InvalidDimension { dimension: usize },

    #[error("Amplitude index {index} out of range for dimension {dimension}")]
    IndexOutOfRange { index: usize, dimension: usize },
}
