//! Gate application on a dense amplitude buffer.
//!
//! Every kernel updates one amplitude tuple (a single amplitude, a pair, or
//! a quad) from that tuple's old values only, so the result does not depend
//! on how the scheduler splits the buffer.

use crate::circuit::{Circuit, GateOp, Instruction};
use crate::error::{QuantumError, Result};
use crate::gates::{Kernel, Matrix2, Matrix4, C64};
use crate::measurement;
use crate::scheduler::Scheduler;
use register::AmplitudeBuffer;
use rng::ShakeRng;
use tracing::{debug, warn};

/// Per-amplitude tolerance on Σ|a|² drift after a run.
pub const NORM_TOLERANCE: f64 = 1e-10;

/// What a circuit run did besides changing the state.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RunReport {
    pub gates_applied: usize,
    /// Measurement outcomes (0/1) in execution order.
    pub measurements: Vec<u8>,
}

#[derive(Debug)]
pub struct Engine {
    scheduler: Scheduler,
}

impl Engine {
    pub fn new(scheduler: Scheduler) -> Self {
        Self { scheduler }
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// Validates `op` against the register and applies it.
    pub fn apply(&self, buf: &mut AmplitudeBuffer, op: &GateOp) -> Result<()> {
        op.validate(buf.num_qubits())?;
        self.apply_unchecked(buf, op);
        Ok(())
    }

    fn apply_unchecked(&self, buf: &mut AmplitudeBuffer, op: &GateOp) {
        let mask = op.control_mask();
        let data = buf.amplitudes_mut();

        match op.gate.kernel() {
            Kernel::Diagonal(d) => {
                if d == [C64::new(1.0, 0.0); 2] {
                    return;
                }
                apply_diagonal(&self.scheduler, data, op.targets[0], mask, d);
            }
            Kernel::Single(m) => apply_single(&self.scheduler, data, op.targets[0], mask, m),
            Kernel::Pair(m) => {
                apply_pair(&self.scheduler, data, op.targets[0], op.targets[1], mask, m)
            }
        }
    }

    /// Runs `circuit` on `buf`. The whole circuit is validated first; an
    /// invalid instruction leaves the buffer untouched.
    pub fn run(
        &self,
        buf: &mut AmplitudeBuffer,
        circuit: &Circuit,
        rng: &mut ShakeRng,
    ) -> Result<RunReport> {
        if circuit.num_qubits() != buf.num_qubits() {
            return Err(QuantumError::RegisterMismatch {
                circuit: circuit.num_qubits(),
                register: buf.num_qubits(),
            });
        }
        circuit.validate()?;

        let mut report = RunReport::default();
        for instruction in circuit.instructions() {
            match instruction {
                Instruction::Gate(op) => {
                    self.apply_unchecked(buf, op);
                    report.gates_applied += 1;
                }
                Instruction::Measure { qubit } => {
                    let bit = measurement::measure_qubit(buf, *qubit, rng, &self.scheduler)?;
                    report.measurements.push(bit);
                }
            }
        }

        let drift = (buf.norm_sqr() - 1.0).abs();
        let tolerance = NORM_TOLERANCE * buf.dimension() as f64;
        if drift > tolerance {
            warn!(drift, tolerance, qubits = buf.num_qubits(), "State norm drifted");
        }

        debug!(
            gates = report.gates_applied,
            measurements = report.measurements.len(),
            threads = self.scheduler.threads(),
            "Circuit run complete"
        );
        Ok(report)
    }
}

#[inline]
fn controls_hold(index: usize, mask: usize) -> bool {
    index & mask == mask
}

/// 2x2 kernel on the pairs (j, j + stride) with the target bit of j clear.
pub fn apply_single(
    scheduler: &Scheduler,
    data: &mut [C64],
    target: usize,
    mask: usize,
    m: Matrix2,
) {
    let stride = 1usize << target;
    let block = stride << 1;

    scheduler.for_each_chunk(data, block, |offset, chunk| {
        for base in (0..chunk.len()).step_by(block) {
            for i0 in base..base + stride {
                if !controls_hold(offset + i0, mask) {
                    continue;
                }
                let i1 = i0 + stride;
                let a = chunk[i0];
                let b = chunk[i1];
                chunk[i0] = m[0][0] * a + m[0][1] * b;
                chunk[i1] = m[1][0] * a + m[1][1] * b;
            }
        }
    });
}

/// Scales each amplitude by `d[bit(target)]`.
pub fn apply_diagonal(
    scheduler: &Scheduler,
    data: &mut [C64],
    target: usize,
    mask: usize,
    d: [C64; 2],
) {
    let keep_zero = d[0] == C64::new(1.0, 0.0);

    scheduler.for_each_chunk(data, 1, |offset, chunk| {
        for (j, a) in chunk.iter_mut().enumerate() {
            let index = offset + j;
            if !controls_hold(index, mask) {
                continue;
            }
            if (index >> target) & 1 == 1 {
                *a *= d[1];
            } else if !keep_zero {
                *a *= d[0];
            }
        }
    });
}

/// 4x4 kernel on two targets. Sub-vector order is
/// `(bit(t0) << 1) | bit(t1)`.
pub fn apply_pair(
    scheduler: &Scheduler,
    data: &mut [C64],
    t0: usize,
    t1: usize,
    mask: usize,
    m: Matrix4,
) {
    let m0 = 1usize << t0;
    let m1 = 1usize << t1;
    let both = m0 | m1;
    let block = m0.max(m1) << 1;

    scheduler.for_each_chunk(data, block, |offset, chunk| {
        for j in 0..chunk.len() {
            if j & both != 0 || !controls_hold(offset + j, mask) {
                continue;
            }
            let idx = [j, j | m1, j | m0, j | both];
            let v = idx.map(|i| chunk[i]);
            for (r, &i) in idx.iter().enumerate() {
                chunk[i] = m[r][0] * v[0] + m[r][1] * v[1] + m[r][2] * v[2] + m[r][3] * v[3];
            }
        }
    });
}
