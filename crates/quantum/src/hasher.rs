//! Canonical SHA3-256 digest of a register state.
//!
//! Layout hashed: domain tag, qubit count as u32 LE, then for every
//! amplitude in ascending index order its real and imaginary parts as f64
//! LE. Negative zero is written as positive zero.

use register::AmplitudeBuffer;
use sha3::{Digest, Sha3_256};

pub const STATE_DOMAIN: &[u8] = b"questkit/state/v1";

pub type StateDigest = [u8; 32];

const STAGE_BYTES: usize = 4096;

pub fn state_digest(buf: &AmplitudeBuffer) -> StateDigest {
    let mut h = Sha3_256::new();
    h.update(STATE_DOMAIN);
    h.update((buf.num_qubits() as u32).to_le_bytes());

    let mut stage = Vec::with_capacity(STAGE_BYTES);
    for a in buf.amplitudes() {
        stage.extend_from_slice(&canonical(a.re).to_le_bytes());
        stage.extend_from_slice(&canonical(a.im).to_le_bytes());
        if stage.len() >= STAGE_BYTES {
            h.update(&stage);
            stage.clear();
        }
    }
    h.update(&stage);

    h.finalize().into()
}

#[inline]
fn canonical(x: f64) -> f64 {
    if x == 0.0 {
        0.0
    } else {
        x
    }
}
