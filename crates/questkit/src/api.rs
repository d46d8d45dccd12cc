//! Handle-based boundary: sessions are created, used and destroyed through
//! opaque ids so callers never hold a session directly.

use crate::config::{SessionConfig, MAX_THREADS};
use crate::error::{QuestError, Result};
use crate::result::ResultBuffer;
use crate::session::{Session, SessionStats};
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use quantum::StateDigest;
use register::C64;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

/// Opaque session id. Never 0, never reused within a process.
pub type Handle = u64;

type SharedSession = Arc<Mutex<Session>>;

pub struct QuestKit {
    base: SessionConfig,
    threads: AtomicUsize,
    next_handle: AtomicU64,
    sessions: Mutex<HashMap<Handle, SharedSession>>,
}

impl QuestKit {
    pub fn new(base: SessionConfig) -> Self {
        Self {
            threads: AtomicUsize::new(base.scheduler.threads.clamp(1, MAX_THREADS)),
            base,
            next_handle: AtomicU64::new(1),
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Worker threads for sessions initialized after this call. Sessions
    /// that already exist keep their pool. Clamped to `1..=MAX_THREADS`.
    pub fn set_thread_count(&self, threads: usize) {
        let threads = threads.clamp(1, MAX_THREADS);
        self.threads.store(threads, Ordering::Relaxed);
        debug!(threads, "Default thread count changed");
    }

    pub fn thread_count(&self) -> usize {
        self.threads.load(Ordering::Relaxed)
    }

    pub fn initialize(&self) -> Result<Handle> {
        let config = self.base.with_threads(self.thread_count());
        let session = Session::new(config)?;

        let handle = self.next_handle.fetch_add(1, Ordering::Relaxed);
        self.sessions
            .lock()
            .insert(handle, Arc::new(Mutex::new(session)));

        info!(handle, threads = config.scheduler.threads, "Session initialized");
        Ok(handle)
    }

    pub fn finalize(&self, handle: Handle) -> Result<()> {
        let removed = self.sessions.lock().remove(&handle);
        match removed {
            Some(_) => {
                info!(handle, "Session finalized");
                Ok(())
            }
            None => Err(QuestError::InvalidHandle(handle)),
        }
    }

    fn session(&self, handle: Handle) -> Result<SharedSession> {
        self.sessions
            .lock()
            .get(&handle)
            .cloned()
            .ok_or(QuestError::InvalidHandle(handle))
    }

    pub fn execute_transaction(
        &self,
        handle: Handle,
        data: &[u8],
        sender: &[u8],
    ) -> Result<ResultBuffer> {
        let session = self.session(handle)?;
        let mut session = session.lock();
        session.execute_transaction(data, sender)
    }

    pub fn simulate_circuit(&self, handle: Handle, circuit: &[u8]) -> Result<ResultBuffer> {
        let session = self.session(handle)?;
        let mut session = session.lock();
        session.simulate_circuit(circuit)
    }

    /// Releases a result. Dropping the buffer does the same.
    pub fn free_result(&self, result: ResultBuffer) {
        drop(result);
    }

    pub fn calc_state_hash(&self, handle: Handle) -> Result<StateDigest> {
        Ok(self.session(handle)?.lock().state_hash())
    }

    pub fn reset(&self, handle: Handle) -> Result<()> {
        self.session(handle)?.lock().reset()
    }

    pub fn probabilities(&self, handle: Handle) -> Result<Vec<f64>> {
        Ok(self.session(handle)?.lock().probabilities())
    }

    pub fn num_qubits(&self, handle: Handle) -> Result<usize> {
        Ok(self.session(handle)?.lock().num_qubits())
    }

    pub fn stats(&self, handle: Handle) -> Result<SessionStats> {
        Ok(self.session(handle)?.lock().stats())
    }

    pub fn state_vector(&self, handle: Handle) -> Result<Vec<C64>> {
        Ok(self.session(handle)?.lock().state_vector())
    }

    pub fn amplitude(&self, handle: Handle, index: usize) -> Result<C64> {
        self.session(handle)?.lock().amplitude(index)
    }

    /// Seeded random bytes from measured |+⟩ qubits; see
    /// [`Session::random_bytes`].
    pub fn random_bytes(&self, handle: Handle, len: usize, seed: u64) -> Result<Vec<u8>> {
        self.session(handle)?.lock().random_bytes(len, seed)
    }

    pub fn random_number(&self, handle: Handle, min: u64, max: u64, seed: u64) -> Result<u64> {
        self.session(handle)?.lock().random_number(min, max, seed)
    }

    pub fn active_sessions(&self) -> usize {
        self.sessions.lock().len()
    }
}

impl Default for QuestKit {
    fn default() -> Self {
        Self::new(SessionConfig::default())
    }
}

static GLOBAL: Lazy<QuestKit> = Lazy::new(QuestKit::default);

/// Process-wide registry behind the free functions and the C ABI.
pub fn global() -> &'static QuestKit {
    &GLOBAL
}

pub fn set_thread_count(threads: usize) {
    global().set_thread_count(threads)
}

pub fn initialize() -> Result<Handle> {
    global().initialize()
}

pub fn finalize(handle: Handle) -> Result<()> {
    global().finalize(handle)
}

pub fn execute_transaction(handle: Handle, data: &[u8], sender: &[u8]) -> Result<ResultBuffer> {
    global().execute_transaction(handle, data, sender)
}

pub fn simulate_circuit(handle: Handle, circuit: &[u8]) -> Result<ResultBuffer> {
    global().simulate_circuit(handle, circuit)
}

pub fn free_result(result: ResultBuffer) {
    global().free_result(result)
}

pub fn calc_state_hash(handle: Handle) -> Result<StateDigest> {
    global().calc_state_hash(handle)
}

pub fn random_bytes(handle: Handle, len: usize, seed: u64) -> Result<Vec<u8>> {
    global().random_bytes(handle, len, seed)
}

pub fn random_number(handle: Handle, min: u64, max: u64, seed: u64) -> Result<u64> {
    global().random_number(handle, min, max, seed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handles_are_unique_and_not_reused() {
        let kit = QuestKit::default();
        let a = kit.initialize().unwrap();
        let b = kit.initialize().unwrap();
        assert_ne!(a, 0);
        assert_ne!(a, b);

        kit.finalize(a).unwrap();
        let c = kit.initialize().unwrap();
        assert!(c != a && c != b);
        assert_eq!(kit.active_sessions(), 2);
    }

    #[test]
    fn finalized_handle_is_invalid() {
        let kit = QuestKit::default();
        let h = kit.initialize().unwrap();
        kit.finalize(h).unwrap();

        assert_eq!(kit.calc_state_hash(h), Err(QuestError::InvalidHandle(h)));
        assert_eq!(kit.finalize(h), Err(QuestError::InvalidHandle(h)));
        assert!(matches!(kit.simulate_circuit(h, b""), Err(QuestError::InvalidHandle(_))));
        assert!(matches!(kit.calc_state_hash(0), Err(QuestError::InvalidHandle(0))));
    }

    #[test]
    fn thread_count_applies_to_new_sessions() {
        let kit = QuestKit::default();
        let before = kit.initialize().unwrap();

        kit.set_thread_count(3);
        let after = kit.initialize().unwrap();

        let threads = |h| kit.session(h).unwrap().lock().threads();
        assert_eq!(threads(before), 1);
        assert_eq!(threads(after), 3);

        kit.set_thread_count(0);
        assert_eq!(kit.thread_count(), 1);
    }

    #[test]
    fn state_and_randomness_go_through_handles() {
        let kit = QuestKit::default();
        let h = kit.initialize().unwrap();

        let psi = kit.state_vector(h).unwrap();
        assert_eq!(psi.len(), 32);
        assert_eq!(kit.amplitude(h, 0).unwrap(), C64::new(1.0, 0.0));
        assert_eq!(psi[1..].iter().filter(|a| a.norm_sqr() != 0.0).count(), 0);

        let bytes = kit.random_bytes(h, 32, 5).unwrap();
        assert_eq!(bytes, kit.random_bytes(h, 32, 5).unwrap());
        let n = kit.random_number(h, 1, 6, 5).unwrap();
        assert!((1..=6).contains(&n));

        kit.finalize(h).unwrap();
        assert_eq!(kit.state_vector(h), Err(QuestError::InvalidHandle(h)));
        assert_eq!(kit.random_bytes(h, 4, 0), Err(QuestError::InvalidHandle(h)));
        assert_eq!(kit.random_number(h, 0, 1, 0), Err(QuestError::InvalidHandle(h)));
    }

    #[test]
    fn huge_thread_count_is_clamped() {
        let kit = QuestKit::new(SessionConfig::default().with_threads(usize::MAX));
        assert_eq!(kit.thread_count(), MAX_THREADS);

        kit.set_thread_count(i32::MAX as usize);
        assert_eq!(kit.thread_count(), MAX_THREADS);

        kit.set_thread_count(2);
        let h = kit.initialize().unwrap();
        assert_eq!(kit.session(h).unwrap().lock().threads(), 2);
    }
}
