//! Deterministic mapping from a transaction onto a circuit.
//!
//! Only gates with exact constant matrices are emitted (rotations come from
//! [`Gate::RyStep`]'s table), so the same transaction yields the same final
//! state bit for bit on any machine.

use crate::error::{QuestError, Result};
use quantum::{Circuit, Gate, GateOp};
use rng::ShakeRng;
use sha3::{Digest, Sha3_256};

pub const MAX_TRANSACTION_LEN: usize = 16 * 1024;
pub const MAX_SENDER_LEN: usize = 64;
pub const MIN_TX_QUBITS: usize = 3;
pub const MAX_TX_QUBITS: usize = 12;

const TX_DOMAIN: &[u8] = b"questkit/tx/v1";
const SENDER_DOMAIN: &[u8] = b"questkit/sender/v1";

#[derive(Clone, Debug, PartialEq)]
pub struct MappedTransaction {
    pub circuit: Circuit,
    /// SHA3-256 over the domain tag, sender and data.
    pub tx_seed: [u8; 32],
}

/// One entry of the byte-to-gate table: the gate, and how many extra
/// controls it takes.
#[derive(Clone, Copy)]
struct TableEntry {
    gate: fn(u8) -> Gate,
    extra_controls: usize,
}

const fn entry(gate: fn(u8) -> Gate, extra_controls: usize) -> TableEntry {
    TableEntry {
        gate,
        extra_controls,
    }
}

/// Indexed by the low nibble of a data byte; the high nibble is the
/// rotation step for the RyStep entries.
const GATE_TABLE: [TableEntry; 16] = [
    entry(|_| Gate::Hadamard, 0),
    entry(|_| Gate::PauliX, 0),
    entry(|_| Gate::PauliY, 0),
    entry(|_| Gate::PauliZ, 0),
    entry(|_| Gate::S, 0),
    entry(|_| Gate::T, 0),
    entry(|_| Gate::SDagger, 0),
    entry(|_| Gate::TDagger, 0),
    entry(|_| Gate::Cnot, 0),
    entry(|_| Gate::Cz, 0),
    entry(|_| Gate::Swap, 0),
    entry(|_| Gate::Toffoli, 0),
    entry(Gate::RyStep, 0),
    entry(Gate::RyStep, 1),
    entry(|_| Gate::Hadamard, 1),
    entry(|_| Gate::Swap, 1),
];

/// Register width for a payload of `len` bytes.
pub fn qubits_for_len(len: usize) -> usize {
    let bits = (usize::BITS - len.leading_zeros()) as usize;
    (MIN_TX_QUBITS + bits / 2).min(MAX_TX_QUBITS)
}

pub fn validate_transaction(data: &[u8], sender: &[u8]) -> Result<()> {
    if data.is_empty() {
        return Err(QuestError::InvalidTransaction("empty data".into()));
    }
    if data.len() > MAX_TRANSACTION_LEN {
        return Err(QuestError::InvalidTransaction(format!(
            "data is {} bytes, limit is {}",
            data.len(),
            MAX_TRANSACTION_LEN
        )));
    }
    if sender.is_empty() || sender.len() > MAX_SENDER_LEN {
        return Err(QuestError::InvalidTransaction(format!(
            "sender must be 1..={} bytes, got {}",
            MAX_SENDER_LEN,
            sender.len()
        )));
    }
    Ok(())
}

pub fn transaction_seed(data: &[u8], sender: &[u8]) -> [u8; 32] {
    let mut h = Sha3_256::new();
    h.update(TX_DOMAIN);
    h.update((sender.len() as u32).to_le_bytes());
    h.update(sender);
    h.update((data.len() as u32).to_le_bytes());
    h.update(data);
    h.finalize().into()
}

fn sender_seed(sender: &[u8]) -> [u8; 32] {
    let mut h = Sha3_256::new();
    h.update(SENDER_DOMAIN);
    h.update(sender);
    h.finalize().into()
}

pub fn map_transaction(data: &[u8], sender: &[u8]) -> Result<MappedTransaction> {
    validate_transaction(data, sender)?;

    let n = qubits_for_len(data.len());
    let tx_seed = transaction_seed(data, sender);
    let mut seed8 = [0u8; 8];
    seed8.copy_from_slice(&tx_seed[..8]);

    let mut circuit = Circuit::new(n).with_seed(u64::from_le_bytes(seed8));

    // sender-keyed preparation layer
    let mut prep = ShakeRng::new(&sender_seed(sender));
    for q in 0..n {
        let k = prep.next_below(32, b"TX_PREP") as u8;
        circuit.push_op(GateOp::single(Gate::RyStep(k), q));
    }

    let mut rng = ShakeRng::new(&tx_seed);
    for &byte in data {
        let entry = GATE_TABLE[(byte & 0x0f) as usize];
        let gate = (entry.gate)(byte >> 4);
        let arity = gate.intrinsic_controls() + gate.num_targets();
        let qubits = distinct_qubits(&mut rng, n, arity + entry.extra_controls);
        let (operands, controls) = qubits.split_at(arity);

        let op = GateOp::from_operands(gate, operands, controls)?;
        circuit.push_op(op);
    }

    circuit.validate()?;
    Ok(MappedTransaction { circuit, tx_seed })
}

/// `k` distinct qubits below `n`, by partial Fisher-Yates.
fn distinct_qubits(rng: &mut ShakeRng, n: usize, k: usize) -> Vec<usize> {
    let mut pool: Vec<usize> = (0..n).collect();
    for i in 0..k {
        let j = i + rng.next_below((n - i) as u64, b"TX_OPERAND") as usize;
        pool.swap(i, j);
    }
    pool.truncate(k);
    pool
}
