use quantum::QuantumError;
use register::RegisterError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, QuestError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum QuestError {
    #[error("Out of memory: {0}")]
    OutOfMemory(String),

    #[error("Malformed circuit at byte {offset}: {reason}")]
    MalformedCircuit { offset: usize, reason: String },

    #[error("Invalid transaction: {0}")]
    InvalidTransaction(String),

    #[error("Invalid handle: {0}")]
    InvalidHandle(u64),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Malformed result buffer: {0}")]
    MalformedResult(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Simulation failed: {0}")]
    Simulation(QuantumError),
}

impl QuestError {
    pub(crate) fn malformed(offset: usize, reason: impl Into<String>) -> Self {
        QuestError::MalformedCircuit {
            offset,
            reason: reason.into(),
        }
    }
}

impl From<RegisterError> for QuestError {
    fn from(e: RegisterError) -> Self {
        match e {
            RegisterError::OutOfMemory { .. } => QuestError::OutOfMemory(e.to_string()),
            other => QuestError::Simulation(QuantumError::Register(other)),
        }
    }
}

impl From<QuantumError> for QuestError {
    fn from(e: QuantumError) -> Self {
        match e {
            QuantumError::Register(r) => r.into(),
            QuantumError::InvalidThreadCount | QuantumError::ThreadPool(_) => {
                QuestError::InvalidConfig(e.to_string())
            }
            other => QuestError::Simulation(other),
        }
    }
}
