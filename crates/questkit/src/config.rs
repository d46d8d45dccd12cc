use crate::error::{QuestError, Result};
use quantum::SchedulerConfig;
use register::HARD_MAX_QUBITS;

/// Register width a fresh session starts with.
pub const DEFAULT_INITIAL_QUBITS: usize = 5;
pub const DEFAULT_MAX_QUBITS: usize = 25;
/// Ceiling for per-session worker threads.
pub const MAX_THREADS: usize = 256;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SessionConfig {
    pub initial_qubits: usize,
    /// Largest register a circuit may request; bigger ones fail with
    /// `OutOfMemory` before anything is allocated.
    pub max_qubits: usize,
    pub scheduler: SchedulerConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            initial_qubits: DEFAULT_INITIAL_QUBITS,
            max_qubits: DEFAULT_MAX_QUBITS,
            scheduler: SchedulerConfig::default(),
        }
    }
}

impl SessionConfig {
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.scheduler.threads = threads;
        self
    }

    pub fn with_max_qubits(mut self, max_qubits: usize) -> Self {
        self.max_qubits = max_qubits;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_qubits == 0 || self.max_qubits > HARD_MAX_QUBITS {
            return Err(QuestError::InvalidConfig(format!(
                "max_qubits must be in 1..={}, got {}",
                HARD_MAX_QUBITS, self.max_qubits
            )));
        }
        if self.initial_qubits == 0 || self.initial_qubits > self.max_qubits {
            return Err(QuestError::InvalidConfig(format!(
                "initial_qubits must be in 1..={}, got {}",
                self.max_qubits, self.initial_qubits
            )));
        }
        if self.scheduler.threads == 0 || self.scheduler.threads > MAX_THREADS {
            return Err(QuestError::InvalidConfig(format!(
                "threads must be in 1..={}, got {}",
                MAX_THREADS, self.scheduler.threads
            )));
        }
        Ok(())
    }
}
