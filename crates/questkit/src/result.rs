//! Result buffer, version 1. All integers little-endian.
//!
//! ```text
//! 0..4    magic "QRES"
//! 4       version (1)
//! 5       kind: 1 transaction, 2 circuit
//! 6       num_qubits
//! 7       reserved, 0
//! 8..12   instruction count u32
//! 12..44  state digest
//! 44..52  sampled basis outcome u64
//! 52..60  probability of that outcome, f64 bits
//! 60..64  measurement count u32
//! 64..    one byte (0/1) per measurement, in execution order
//! ```

use crate::error::{QuestError, Result};
use quantum::StateDigest;

pub const RESULT_MAGIC: &[u8; 4] = b"QRES";
pub const RESULT_VERSION: u8 = 1;
pub const RESULT_HEADER_LEN: usize = 64;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum ResultKind {
    Transaction = 1,
    Circuit = 2,
}

impl ResultKind {
    fn from_u8(v: u8) -> Option<Self> {
        match v {
            1 => Some(ResultKind::Transaction),
            2 => Some(ResultKind::Circuit),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ExecutionResult {
    pub kind: ResultKind,
    pub num_qubits: u8,
    pub instruction_count: u32,
    pub digest: StateDigest,
    pub outcome: u64,
    pub outcome_probability: f64,
    pub measurements: Vec<u8>,
}

impl ExecutionResult {
    pub fn encode(&self) -> ResultBuffer {
        let mut out = Vec::with_capacity(RESULT_HEADER_LEN + self.measurements.len());
        out.extend_from_slice(RESULT_MAGIC);
        out.push(RESULT_VERSION);
        out.push(self.kind as u8);
        out.push(self.num_qubits);
        out.push(0);
        out.extend_from_slice(&self.instruction_count.to_le_bytes());
        out.extend_from_slice(&self.digest);
        out.extend_from_slice(&self.outcome.to_le_bytes());
        out.extend_from_slice(&self.outcome_probability.to_bits().to_le_bytes());
        out.extend_from_slice(&(self.measurements.len() as u32).to_le_bytes());
        out.extend_from_slice(&self.measurements);
        ResultBuffer { bytes: out }
    }
}

/// Serialized result handed to callers. Dropping it frees it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResultBuffer {
    bytes: Vec<u8>,
}

impl ResultBuffer {
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn parse(&self) -> Result<ExecutionResult> {
        let b = &self.bytes;
        if b.len() < RESULT_HEADER_LEN {
            return Err(bad(format!("{} bytes is shorter than the header", b.len())));
        }
        if &b[..4] != RESULT_MAGIC {
            return Err(bad("bad magic"));
        }
        if b[4] != RESULT_VERSION {
            return Err(bad(format!("unsupported version {}", b[4])));
        }
        let kind = ResultKind::from_u8(b[5]).ok_or_else(|| bad(format!("unknown kind {}", b[5])))?;
        if b[7] != 0 {
            return Err(bad("reserved byte set"));
        }

        let count = u32::from_le_bytes(le(&b[60..64])) as usize;
        let measurements = &b[RESULT_HEADER_LEN..];
        if measurements.len() != count {
            return Err(bad(format!(
                "{} measurement bytes, header says {}",
                measurements.len(),
                count
            )));
        }
        if measurements.iter().any(|&m| m > 1) {
            return Err(bad("measurement byte is not 0 or 1"));
        }

        let mut digest = [0u8; 32];
        digest.copy_from_slice(&b[12..44]);

        Ok(ExecutionResult {
            kind,
            num_qubits: b[6],
            instruction_count: u32::from_le_bytes(le(&b[8..12])),
            digest,
            outcome: u64::from_le_bytes(le(&b[44..52])),
            outcome_probability: f64::from_bits(u64::from_le_bytes(le(&b[52..60]))),
            measurements: measurements.to_vec(),
        })
    }
}

impl AsRef<[u8]> for ResultBuffer {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

fn le<const N: usize>(s: &[u8]) -> [u8; N] {
    let mut out = [0u8; N];
    out.copy_from_slice(s);
    out
}

fn bad(reason: impl Into<String>) -> QuestError {
    QuestError::MalformedResult(reason.into())
}
