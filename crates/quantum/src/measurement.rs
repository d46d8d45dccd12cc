use crate::error::{QuantumError, Result};
use crate::scheduler::Scheduler;
use register::AmplitudeBuffer;
use rng::ShakeRng;

const MEASURE_CTX: &[u8] = b"MEASURE_Z";
const SAMPLE_CTX: &[u8] = b"SAMPLE_ALL";

/// |a_i|² for every basis state.
pub fn probabilities(buf: &AmplitudeBuffer) -> Vec<f64> {
    buf.amplitudes().iter().map(|a| a.norm_sqr()).collect()
}

/// Probability that `qubit` reads 1.
pub fn qubit_probability(buf: &AmplitudeBuffer, qubit: usize) -> Result<f64> {
    let (_, p1) = split_probability(buf, qubit)?;
    Ok(p1)
}

fn split_probability(buf: &AmplitudeBuffer, qubit: usize) -> Result<(f64, f64)> {
    if qubit >= buf.num_qubits() {
        return Err(QuantumError::QubitOutOfRange {
            qubit,
            num_qubits: buf.num_qubits(),
        });
    }

    let mut p = [0.0f64; 2];
    for (i, a) in buf.amplitudes().iter().enumerate() {
        p[(i >> qubit) & 1] += a.norm_sqr();
    }
    Ok((p[0], p[1]))
}

/// Draws a basis state from the Born distribution without touching the
/// state. Returns the index and its probability.
pub fn sample_outcome(buf: &AmplitudeBuffer, rng: &mut ShakeRng) -> (usize, f64) {
    let probs = probabilities(buf);
    let total: f64 = probs.iter().sum();
    if total == 0.0 {
        return (0, 0.0);
    }

    let mut x = rng.next_f64(SAMPLE_CTX) * total;
    let mut last_nonzero = 0;
    for (idx, &p) in probs.iter().enumerate() {
        if p == 0.0 {
            continue;
        }
        if x < p {
            return (idx, p);
        }
        x -= p;
        last_nonzero = idx;
    }
    // rounding left x just past the final bucket
    (last_nonzero, probs[last_nonzero])
}

/// Projective Z measurement of one qubit. The state collapses onto the
/// observed value and is renormalized.
pub fn measure_qubit(
    buf: &mut AmplitudeBuffer,
    qubit: usize,
    rng: &mut ShakeRng,
    scheduler: &Scheduler,
) -> Result<u8> {
    let (p0, p1) = split_probability(buf, qubit)?;
    let total = p0 + p1;
    if total == 0.0 {
        return Ok(0);
    }

    let x = rng.next_f64(MEASURE_CTX) * total;
    let outcome = if p1 == 0.0 || (x < p0 && p0 > 0.0) { 0 } else { 1 };
    let norm = if outcome == 0 { p0 } else { p1 }.sqrt();

    scheduler.for_each_chunk(buf.amplitudes_mut(), 1, |offset, chunk| {
        for (j, a) in chunk.iter_mut().enumerate() {
            if ((offset + j) >> qubit) & 1 == outcome {
                *a /= norm;
            } else {
                *a = Default::default();
            }
        }
    });

    Ok(outcome as u8)
}

/// Measures every qubit at once, leaving the register in the observed
/// basis state.
pub fn measure_all(buf: &mut AmplitudeBuffer, rng: &mut ShakeRng) -> Result<usize> {
    let (outcome, _) = sample_outcome(buf, rng);
    buf.set_basis_state(outcome)?;
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circuit::GateOp;
    use crate::engine::Engine;
    use crate::gates::{Gate, C64};

    fn plus_state(n: usize) -> AmplitudeBuffer {
        let engine = Engine::new(Scheduler::single_threaded());
        let mut buf = AmplitudeBuffer::new(n, 8).unwrap();
        for q in 0..n {
            engine.apply(&mut buf, &GateOp::single(Gate::Hadamard, q)).unwrap();
        }
        buf
    }

    #[test]
    fn probabilities_sum_to_one() {
        let buf = plus_state(3);
        let probs = probabilities(&buf);
        assert_eq!(probs.len(), 8);
        let total: f64 = probs.iter().sum();
        assert!((total - 1.0).abs() < 1e-12, "total = {}", total);
        assert!((qubit_probability(&buf, 2).unwrap() - 0.5).abs() < 1e-12);
        assert!(qubit_probability(&buf, 3).is_err());
    }

    #[test]
    fn measurement_collapses_and_renormalizes() {
        let mut buf = plus_state(2);
        let mut rng = ShakeRng::new(b"collapse");
        let bit = measure_qubit(&mut buf, 1, &mut rng, &Scheduler::single_threaded()).unwrap();

        assert!((qubit_probability(&buf, 1).unwrap() - bit as f64).abs() < 1e-12);
        assert!((buf.norm_sqr() - 1.0).abs() < 1e-12);

        let again = measure_qubit(&mut buf, 1, &mut rng, &Scheduler::single_threaded()).unwrap();
        assert_eq!(bit, again);
    }

    #[test]
    fn certain_outcomes_never_flip() {
        let mut buf = AmplitudeBuffer::new(1, 8).unwrap();
        buf.set_basis_state(1).unwrap();
        for seed in 0..50 {
            let mut rng = ShakeRng::from_u64(seed);
            let bit = measure_qubit(&mut buf, 0, &mut rng, &Scheduler::single_threaded()).unwrap();
            assert_eq!(bit, 1, "seed {}", seed);
        }
    }

    #[test]
    fn sampling_skips_zero_probability_states() {
        let buf = AmplitudeBuffer::from_amplitudes(vec![
            C64::new(0.0, 0.0),
            C64::new(0.0, 0.0),
            C64::new(0.0, 1.0),
            C64::new(0.0, 0.0),
        ])
        .unwrap();

        for seed in 0..20 {
            let (idx, p) = sample_outcome(&buf, &mut ShakeRng::from_u64(seed));
            assert_eq!(idx, 2);
            assert_eq!(p, 1.0);
        }
    }

    #[test]
    fn measure_all_lands_on_basis_state() {
        let mut buf = plus_state(3);
        let outcome = measure_all(&mut buf, &mut ShakeRng::new(b"all")).unwrap();
        assert!(outcome < 8);
        assert_eq!(buf.amplitude(outcome).unwrap(), C64::new(1.0, 0.0));
        assert!((buf.norm_sqr() - 1.0).abs() < 1e-15);
    }
}
