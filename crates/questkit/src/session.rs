use crate::config::SessionConfig;
use crate::decoder::decode_circuit;
use crate::error::{QuestError, Result};
use crate::mapper::map_transaction;
use crate::result::{ExecutionResult, ResultBuffer, ResultKind};
use quantum::{
    measurement, state_digest, Circuit, Engine, Gate, GateOp, Scheduler, StateDigest,
};
use register::{AmplitudeBuffer, C64};
use rng::ShakeRng;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Largest single request to [`Session::random_bytes`].
pub const MAX_RANDOM_BYTES: usize = 1 << 16;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SessionStats {
    pub transactions: u64,
    pub circuits: u64,
    pub failures: u64,
    pub gates_applied: u64,
    pub measurements: u64,
    pub busy: Duration,
}

/// One simulator instance: a register, the engine that drives it, and
/// counters. Every execution starts from |0...0⟩ on a register sized for
/// the circuit; the state left behind is what [`Session::state_hash`]
/// reports.
#[derive(Debug)]
pub struct Session {
    config: SessionConfig,
    register: AmplitudeBuffer,
    engine: Engine,
    stats: SessionStats,
}

impl Session {
    pub fn new(config: SessionConfig) -> Result<Self> {
        config.validate()?;
        let register = AmplitudeBuffer::new(config.initial_qubits, config.max_qubits)?;
        let engine = Engine::new(Scheduler::new(config.scheduler)?);

        Ok(Self {
            config,
            register,
            engine,
            stats: SessionStats::default(),
        })
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn execute_transaction(&mut self, data: &[u8], sender: &[u8]) -> Result<ResultBuffer> {
        let outcome = map_transaction(data, sender)
            .and_then(|mapped| self.execute(&mapped.circuit, ResultKind::Transaction));
        self.record(outcome, |s| s.transactions += 1)
    }

    pub fn simulate_circuit(&mut self, bytes: &[u8]) -> Result<ResultBuffer> {
        let outcome = decode_circuit(bytes, self.config.max_qubits)
            .and_then(|circuit| self.execute(&circuit, ResultKind::Circuit));
        self.record(outcome, |s| s.circuits += 1)
    }

    fn record(
        &mut self,
        outcome: Result<ExecutionResult>,
        bump: impl FnOnce(&mut SessionStats),
    ) -> Result<ResultBuffer> {
        match outcome {
            Ok(result) => {
                bump(&mut self.stats);
                Ok(result.encode())
            }
            Err(e) => {
                self.stats.failures += 1;
                debug!(error = %e, "Execution rejected");
                Err(e)
            }
        }
    }

    /// Runs an already validated circuit on a fresh register. The session
    /// state is replaced only after the run succeeds.
    pub fn execute(&mut self, circuit: &Circuit, kind: ResultKind) -> Result<ExecutionResult> {
        let start = Instant::now();
        let num_qubits = u8::try_from(circuit.num_qubits())
            .map_err(|_| QuestError::OutOfMemory(format!("{} qubits", circuit.num_qubits())))?;
        let instruction_count = u32::try_from(circuit.len())
            .map_err(|_| QuestError::malformed(16, "too many instructions"))?;

        let mut register = AmplitudeBuffer::new(circuit.num_qubits(), self.config.max_qubits)?;
        let mut rng = ShakeRng::from_u64(circuit.seed());
        let report = self.engine.run(&mut register, circuit, &mut rng)?;
        let (outcome, probability) = measurement::sample_outcome(&register, &mut rng);
        let digest = state_digest(&register);

        self.register = register;
        self.stats.gates_applied += report.gates_applied as u64;
        self.stats.measurements += report.measurements.len() as u64;
        self.stats.busy += start.elapsed();

        info!(
            ?kind,
            qubits = num_qubits,
            instructions = instruction_count,
            outcome,
            elapsed_us = start.elapsed().as_micros() as u64,
            "Execution finished"
        );

        Ok(ExecutionResult {
            kind,
            num_qubits,
            instruction_count,
            digest,
            outcome: outcome as u64,
            outcome_probability: probability,
            measurements: report.measurements,
        })
    }

    pub fn state_hash(&self) -> StateDigest {
        state_digest(&self.register)
    }

    /// Back to |0...0⟩ at the configured initial width.
    pub fn reset(&mut self) -> Result<()> {
        if self.register.num_qubits() == self.config.initial_qubits {
            self.register.reset();
        } else {
            self.register = AmplitudeBuffer::new(self.config.initial_qubits, self.config.max_qubits)?;
        }
        Ok(())
    }

    pub fn probabilities(&self) -> Vec<f64> {
        measurement::probabilities(&self.register)
    }

    pub fn num_qubits(&self) -> usize {
        self.register.num_qubits()
    }

    pub fn threads(&self) -> usize {
        self.engine.scheduler().threads()
    }

    pub fn stats(&self) -> SessionStats {
        self.stats
    }

    pub fn register(&self) -> &AmplitudeBuffer {
        &self.register
    }

    /// Copy of the current amplitudes in basis-index order.
    pub fn state_vector(&self) -> Vec<C64> {
        self.register.amplitudes().to_vec()
    }

    pub fn amplitude(&self, index: usize) -> Result<C64> {
        self.register
            .amplitude(index)
            .map_err(|e| QuestError::InvalidArgument(e.to_string()))
    }

    /// `len` bytes, each bit the outcome of measuring a qubit prepared in
    /// |+⟩. The draws run on a scratch qubit; the session register is left
    /// alone. The same seed always yields the same bytes.
    pub fn random_bytes(&mut self, len: usize, seed: u64) -> Result<Vec<u8>> {
        if len == 0 || len > MAX_RANDOM_BYTES {
            return Err(QuestError::InvalidArgument(format!(
                "random byte count must be in 1..={}, got {}",
                MAX_RANDOM_BYTES, len
            )));
        }
        let mut out = vec![0u8; len];
        self.quantum_fill(&mut out, &mut ShakeRng::from_u64(seed))?;
        debug!(len, seed, "Quantum random bytes drawn");
        Ok(out)
    }

    /// Uniform value in `min..=max`, built from measured bits by rejection
    /// sampling.
    pub fn random_number(&mut self, min: u64, max: u64, seed: u64) -> Result<u64> {
        if min > max {
            return Err(QuestError::InvalidArgument(format!(
                "empty range {}..={}",
                min, max
            )));
        }
        let mut rng = ShakeRng::from_u64(seed);
        let mut word = [0u8; 8];
        let span = max - min;
        if span == u64::MAX {
            self.quantum_fill(&mut word, &mut rng)?;
            return Ok(u64::from_le_bytes(word));
        }

        let bound = span + 1;
        let zone = u64::MAX - (u64::MAX % bound);
        loop {
            self.quantum_fill(&mut word, &mut rng)?;
            let v = u64::from_le_bytes(word);
            if v < zone {
                return Ok(min + v % bound);
            }
        }
    }

    fn quantum_fill(&mut self, out: &mut [u8], rng: &mut ShakeRng) -> Result<()> {
        let mut qubit = AmplitudeBuffer::new(1, self.config.max_qubits)?;
        let hadamard = GateOp::single(Gate::Hadamard, 0);
        let scheduler = self.engine.scheduler();

        for byte in out.iter_mut() {
            *byte = 0;
            for bit in 0..8 {
                qubit.reset();
                self.engine.apply(&mut qubit, &hadamard)?;
                *byte |= measurement::measure_qubit(&mut qubit, 0, rng, scheduler)? << bit;
            }
        }
        self.stats.measurements += 8 * out.len() as u64;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::CircuitBuilder;

    #[test]
    fn fresh_session_is_ground_state() {
        let s = Session::new(SessionConfig::default()).unwrap();
        assert_eq!(s.num_qubits(), 5);
        assert_eq!(s.probabilities()[0], 1.0);
        assert_eq!(s.stats(), SessionStats::default());
    }

    #[test]
    fn failed_run_keeps_previous_state() {
        let mut s = Session::new(SessionConfig::default()).unwrap();
        let bell = CircuitBuilder::new(2).h(0).cnot(0, 1).encode().unwrap();
        s.simulate_circuit(&bell).unwrap();
        let before = s.state_hash();

        let mut bad = bell.clone();
        bad.truncate(bad.len() - 1);
        assert!(s.simulate_circuit(&bad).is_err());
        assert_eq!(s.state_hash(), before);

        let huge = CircuitBuilder::new(26).encode().unwrap();
        assert!(matches!(s.simulate_circuit(&huge), Err(QuestError::OutOfMemory(_))));
        assert_eq!(s.state_hash(), before);
        assert_eq!(s.num_qubits(), 2);

        let stats = s.stats();
        assert_eq!(stats.circuits, 1);
        assert_eq!(stats.failures, 2);
        assert_eq!(stats.gates_applied, 2);
    }

    #[test]
    fn reset_restores_initial_width() {
        let mut s = Session::new(SessionConfig::default()).unwrap();
        s.simulate_circuit(&CircuitBuilder::new(3).x(2).encode().unwrap())
            .unwrap();
        assert_eq!(s.num_qubits(), 3);

        s.reset().unwrap();
        assert_eq!(s.num_qubits(), 5);
        assert_eq!(s.register(), &AmplitudeBuffer::new(5, 25).unwrap());
    }

    #[test]
    fn random_bytes_are_seeded_and_balanced() {
        let mut s = Session::new(SessionConfig::default()).unwrap();
        let before = s.state_hash();

        let a = s.random_bytes(512, 7).unwrap();
        let b = s.random_bytes(512, 7).unwrap();
        let c = s.random_bytes(512, 8).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(s.state_hash(), before);
        assert_eq!(s.stats().measurements, 3 * 512 * 8);

        let ones: u32 = a.iter().map(|b| b.count_ones()).sum();
        let frac = ones as f64 / (512.0 * 8.0);
        assert!((frac - 0.5).abs() < 0.05, "P(1) = {}", frac);

        // a shorter draw is a prefix of a longer one
        assert_eq!(s.random_bytes(16, 7).unwrap(), a[..16].to_vec());

        assert!(matches!(s.random_bytes(0, 1), Err(QuestError::InvalidArgument(_))));
        assert!(s.random_bytes(MAX_RANDOM_BYTES + 1, 1).is_err());
    }

    #[test]
    fn random_numbers_stay_in_range() {
        let mut s = Session::new(SessionConfig::default()).unwrap();
        let mut seen = [false; 6];
        for seed in 0..200 {
            let v = s.random_number(10, 15, seed).unwrap();
            assert!((10..=15).contains(&v), "{}", v);
            seen[(v - 10) as usize] = true;
        }
        assert!(seen.iter().all(|&hit| hit), "{:?}", seen);

        assert_eq!(s.random_number(42, 42, 3).unwrap(), 42);
        assert_eq!(
            s.random_number(0, u64::MAX, 9).unwrap(),
            s.random_number(0, u64::MAX, 9).unwrap()
        );
        assert!(matches!(
            s.random_number(5, 4, 0),
            Err(QuestError::InvalidArgument(_))
        ));
    }

    #[test]
    fn state_vector_reads_current_register() {
        let mut s = Session::new(SessionConfig::default()).unwrap();
        s.simulate_circuit(&CircuitBuilder::new(2).h(0).encode().unwrap())
            .unwrap();

        let psi = s.state_vector();
        let r = 1.0 / 2.0_f64.sqrt();
        assert_eq!(psi.len(), 4);
        assert!((psi[0].re - r).abs() < 1e-15 && (psi[1].re - r).abs() < 1e-15);
        assert_eq!(psi[2], C64::new(0.0, 0.0));
        assert_eq!(s.amplitude(1).unwrap(), psi[1]);
        assert!(matches!(s.amplitude(4), Err(QuestError::InvalidArgument(_))));
    }

    #[test]
    fn result_reflects_circuit() {
        let mut s = Session::new(SessionConfig::default()).unwrap();
        let bytes = CircuitBuilder::new(3).seed(4).x(0).x(2).measure(2).encode().unwrap();
        let result = s.simulate_circuit(&bytes).unwrap().parse().unwrap();

        assert_eq!(result.kind, ResultKind::Circuit);
        assert_eq!(result.num_qubits, 3);
        assert_eq!(result.instruction_count, 3);
        assert_eq!(result.outcome, 0b101);
        assert_eq!(result.outcome_probability, 1.0);
        assert_eq!(result.measurements, vec![1]);
        assert_eq!(result.digest, s.state_hash());
    }
}
