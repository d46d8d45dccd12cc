//! Splits per-gate amplitude work into contiguous ranges for worker threads.
//!
//! A chunk always spans a whole number of gate blocks (the index span of
//! one amplitude tuple), so workers never share a tuple. Each call joins all
//! workers before returning, which is the barrier between consecutive gates.

use crate::error::{QuantumError, Result};
use rayon::prelude::*;
use register::C64;

/// Buffers shorter than this are processed on the calling thread.
pub const DEFAULT_PARALLEL_THRESHOLD: usize = 1 << 12;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SchedulerConfig {
    pub threads: usize,
    pub parallel_threshold: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            threads: 1,
            parallel_threshold: DEFAULT_PARALLEL_THRESHOLD,
        }
    }
}

impl SchedulerConfig {
    pub fn with_threads(threads: usize) -> Self {
        Self {
            threads,
            ..Self::default()
        }
    }
}

#[derive(Debug)]
pub struct Scheduler {
    config: SchedulerConfig,
    pool: Option<rayon::ThreadPool>,
}

impl Scheduler {
    pub fn new(config: SchedulerConfig) -> Result<Self> {
        if config.threads == 0 {
            return Err(QuantumError::InvalidThreadCount);
        }

        let pool = if config.threads > 1 {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(config.threads)
                .thread_name(|i| format!("quest-worker-{}", i))
                .build()
                .map_err(|e| QuantumError::ThreadPool(e.to_string()))?;
            Some(pool)
        } else {
            None
        };

        Ok(Self { config, pool })
    }

    pub fn single_threaded() -> Self {
        Self {
            config: SchedulerConfig::default(),
            pool: None,
        }
    }

    pub fn config(&self) -> SchedulerConfig {
        self.config
    }

    pub fn threads(&self) -> usize {
        self.config.threads
    }

    /// Chunk length for `len` amplitudes when one tuple spans `block`
    /// indices. Both are powers of two, so the result divides `len`.
    pub fn chunk_len(&self, len: usize, block: usize) -> usize {
        if self.pool.is_none() || len < self.config.parallel_threshold {
            return len;
        }
        let per_thread = len.div_ceil(self.config.threads).next_power_of_two();
        per_thread.max(block).min(len)
    }

    /// Runs `op(offset, chunk)` over consecutive chunks of `data`, where
    /// `offset` is the flat index of the chunk's first amplitude.
    pub fn for_each_chunk<F>(&self, data: &mut [C64], block: usize, op: F)
    where
        F: Fn(usize, &mut [C64]) + Send + Sync,
    {
        let chunk = self.chunk_len(data.len(), block);
        match &self.pool {
            Some(pool) if chunk < data.len() => pool.install(|| {
                data.par_chunks_mut(chunk)
                    .enumerate()
                    .for_each(|(i, c)| op(i * chunk, c));
            }),
            _ => op(0, data),
        }
    }
}
