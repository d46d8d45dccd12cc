//! Binary circuit format, version 1. All integers little-endian.
//!
//! ```text
//! 0..4    magic "QCIR"
//! 4       version (1)
//! 5       num_qubits u8, >= 1
//! 6..8    flags u16, must be 0
//! 8..16   sampling seed u64
//! 16..20  instruction count u32
//! 20..    instructions
//! ```
//!
//! Each instruction is `gate id u8, extra-control count u8`, the gate's
//! fixed operand qubits, the extra controls, then an f64 angle or a u8
//! step for parameterized gates. Id [`MEASURE_ID`] measures one qubit and
//! takes no controls.

use crate::error::{QuestError, Result};
use quantum::gates::{ParamKind, RY_STEPS};
use quantum::{Circuit, Gate, GateOp, GateSpec, Instruction};

pub const CIRCUIT_MAGIC: &[u8; 4] = b"QCIR";
pub const CIRCUIT_VERSION: u8 = 1;
pub const HEADER_LEN: usize = 20;
pub const MEASURE_ID: u8 = 32;

struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn take(&mut self, n: usize, what: &str) -> Result<&'a [u8]> {
        let end = self.pos.checked_add(n).filter(|&e| e <= self.bytes.len());
        match end {
            Some(end) => {
                let s = &self.bytes[self.pos..end];
                self.pos = end;
                Ok(s)
            }
            None => Err(QuestError::malformed(
                self.pos,
                format!("truncated while reading {}", what),
            )),
        }
    }

    fn array<const N: usize>(&mut self, what: &str) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N, what)?);
        Ok(out)
    }

    fn u8(&mut self, what: &str) -> Result<u8> {
        Ok(self.take(1, what)?[0])
    }

    fn u16(&mut self, what: &str) -> Result<u16> {
        self.array(what).map(u16::from_le_bytes)
    }

    fn u32(&mut self, what: &str) -> Result<u32> {
        self.array(what).map(u32::from_le_bytes)
    }

    fn u64(&mut self, what: &str) -> Result<u64> {
        self.array(what).map(u64::from_le_bytes)
    }

    fn f64(&mut self, what: &str) -> Result<f64> {
        self.array(what).map(f64::from_le_bytes)
    }

    fn qubits(&mut self, n: usize, what: &str) -> Result<Vec<usize>> {
        Ok(self.take(n, what)?.iter().map(|&q| q as usize).collect())
    }

    fn remaining(&self) -> usize {
        self.bytes.len() - self.pos
    }
}

/// Parses and fully validates a circuit.
///
/// A register wider than `max_qubits` is reported as
/// [`QuestError::OutOfMemory`] so the caller never attempts the allocation.
pub fn decode_circuit(bytes: &[u8], max_qubits: usize) -> Result<Circuit> {
    let mut r = Reader::new(bytes);

    if r.take(4, "magic")? != CIRCUIT_MAGIC {
        return Err(QuestError::malformed(0, "bad magic"));
    }
    let version = r.u8("version")?;
    if version != CIRCUIT_VERSION {
        return Err(QuestError::malformed(4, format!("unsupported version {}", version)));
    }
    let num_qubits = r.u8("qubit count")? as usize;
    if num_qubits == 0 {
        return Err(QuestError::malformed(5, "circuit needs at least one qubit"));
    }
    let flags = r.u16("flags")?;
    if flags != 0 {
        return Err(QuestError::malformed(6, format!("unknown flags {:#06x}", flags)));
    }
    let seed = r.u64("seed")?;
    let count = r.u32("instruction count")? as usize;

    if num_qubits > max_qubits {
        return Err(QuestError::OutOfMemory(format!(
            "circuit requests {} qubits, limit is {}",
            num_qubits, max_qubits
        )));
    }

    let mut circuit = Circuit::new(num_qubits).with_seed(seed);
    for _ in 0..count {
        let start = r.pos;
        let instruction = read_instruction(&mut r, start)?;
        instruction
            .validate(num_qubits)
            .map_err(|e| QuestError::malformed(start, e.to_string()))?;
        circuit.push(instruction);
    }

    if r.remaining() != 0 {
        return Err(QuestError::malformed(
            r.pos,
            format!("{} trailing bytes", r.remaining()),
        ));
    }

    Ok(circuit)
}

fn read_instruction(r: &mut Reader<'_>, start: usize) -> Result<Instruction> {
    let id = r.u8("gate id")?;
    let extra = r.u8("control count")? as usize;

    if id == MEASURE_ID {
        if extra != 0 {
            return Err(QuestError::malformed(start, "measurement cannot be controlled"));
        }
        let qubit = r.u8("measured qubit")? as usize;
        return Ok(Instruction::Measure { qubit });
    }

    let spec = GateSpec::lookup(id)
        .ok_or_else(|| QuestError::malformed(start, format!("unknown gate id {}", id)))?;
    let operands = r.qubits(spec.operands, "operands")?;
    let controls = r.qubits(extra, "controls")?;

    let (angle, step) = match spec.param {
        ParamKind::None => (0.0, 0),
        ParamKind::Angle => {
            let angle = r.f64("angle")?;
            if !angle.is_finite() {
                return Err(QuestError::malformed(start, format!("{} angle is not finite", spec.name)));
            }
            (angle, 0)
        }
        ParamKind::Step => {
            let step = r.u8("step")?;
            if step >= RY_STEPS {
                return Err(QuestError::malformed(
                    start,
                    format!("step {} out of range 0..{}", step, RY_STEPS),
                ));
            }
            (0.0, step)
        }
    };

    let gate = Gate::from_id(id, angle, step)
        .ok_or_else(|| QuestError::malformed(start, format!("unknown gate id {}", id)))?;
    let op = GateOp::from_operands(gate, &operands, &controls)
        .map_err(|e| QuestError::malformed(start, e.to_string()))?;
    Ok(Instruction::Gate(op))
}
