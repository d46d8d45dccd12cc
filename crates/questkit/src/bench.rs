use crate::error::Result;
use quantum::{state_digest, Circuit, Engine, Scheduler, SchedulerConfig, StateDigest};
use register::AmplitudeBuffer;
use rng::ShakeRng;
use std::time::{Duration, Instant};

#[derive(Clone, Debug)]
pub struct BenchReport {
    pub qubits: usize,
    pub depth: usize,
    pub threads: usize,
    pub gates: usize,
    pub elapsed: Duration,
    /// Final state digest, identical for every thread count.
    pub digest: StateDigest,
}

impl BenchReport {
    pub fn gates_per_second(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs == 0.0 {
            return f64::INFINITY;
        }
        self.gates as f64 / secs
    }
}

/// Brickwork of Hadamards and nearest-neighbour CNOTs. Empty for a
/// zero-width register.
pub fn benchmark_circuit(n: usize, depth: usize) -> Circuit {
    let mut c = Circuit::new(n);
    if n == 0 {
        return c;
    }
    for t in 0..depth {
        c.h(t % n);
        if n > 1 {
            let k = t % (n - 1);
            c.cnot(k, k + 1);
        }
    }
    c
}

pub fn benchmark(n: usize, depth: usize, threads: usize, max_qubits: usize) -> Result<BenchReport> {
    let mut psi = AmplitudeBuffer::new(n, max_qubits)?;
    let engine = Engine::new(Scheduler::new(SchedulerConfig::with_threads(threads))?);
    let circuit = benchmark_circuit(n, depth);

    let start = Instant::now();
    let report = engine.run(&mut psi, &circuit, &mut ShakeRng::from_u64(0))?;
    let elapsed = start.elapsed();

    Ok(BenchReport {
        qubits: n,
        depth,
        threads,
        gates: report.gates_applied,
        elapsed,
        digest: state_digest(&psi),
    })
}
