use crate::decoder::{CIRCUIT_MAGIC, CIRCUIT_VERSION, MEASURE_ID};
use crate::error::{QuestError, Result};
use quantum::gates::ParamKind;
use quantum::{Circuit, Gate, GateOp, Instruction};

/// Builds circuits in the wire format read by
/// [`decode_circuit`](crate::decoder::decode_circuit).
#[derive(Clone, Debug)]
pub struct CircuitBuilder {
    circuit: Circuit,
}

impl CircuitBuilder {
    pub fn new(num_qubits: usize) -> Self {
        Self {
            circuit: Circuit::new(num_qubits),
        }
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.circuit = self.circuit.with_seed(seed);
        self
    }

    /// Appends `gate` with wire-order operands (intrinsic controls first).
    pub fn gate(mut self, gate: Gate, operands: &[usize]) -> Self {
        self.circuit.gate(gate, operands);
        self
    }

    /// Appends `gate` with extra control qubits.
    pub fn controlled(mut self, gate: Gate, operands: &[usize], controls: &[usize]) -> Self {
        let (ctrl, targets) = operands.split_at(gate.intrinsic_controls().min(operands.len()));
        let mut all = ctrl.to_vec();
        all.extend_from_slice(controls);
        self.circuit.push_op(GateOp::from_parts(gate, all, targets.to_vec()));
        self
    }

    pub fn h(self, q: usize) -> Self {
        self.gate(Gate::Hadamard, &[q])
    }

    pub fn x(self, q: usize) -> Self {
        self.gate(Gate::PauliX, &[q])
    }

    pub fn cnot(self, control: usize, target: usize) -> Self {
        self.gate(Gate::Cnot, &[control, target])
    }

    pub fn measure(mut self, qubit: usize) -> Self {
        self.circuit.measure(qubit);
        self
    }

    pub fn build(self) -> Circuit {
        self.circuit
    }

    pub fn encode(&self) -> Result<Vec<u8>> {
        encode_circuit(&self.circuit)
    }
}

/// Serializes `circuit`. Operand lists are checked for shape only; qubit
/// ranges are left to the decoder so malformed inputs can be produced on
/// purpose in tests.
pub fn encode_circuit(circuit: &Circuit) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(20 + circuit.len() * 4);
    out.extend_from_slice(CIRCUIT_MAGIC);
    out.push(CIRCUIT_VERSION);
    out.push(wire_u8(circuit.num_qubits(), "qubit count")?);
    out.extend_from_slice(&0u16.to_le_bytes());
    out.extend_from_slice(&circuit.seed().to_le_bytes());
    let count = u32::try_from(circuit.len())
        .map_err(|_| QuestError::malformed(16, "too many instructions"))?;
    out.extend_from_slice(&count.to_le_bytes());

    for instruction in circuit.instructions() {
        match instruction {
            Instruction::Measure { qubit } => {
                out.extend_from_slice(&[MEASURE_ID, 0, wire_u8(*qubit, "qubit")?]);
            }
            Instruction::Gate(op) => encode_op(op, &mut out)?,
        }
    }
    Ok(out)
}

fn encode_op(op: &GateOp, out: &mut Vec<u8>) -> Result<()> {
    let intrinsic = op.gate.intrinsic_controls().min(op.controls.len());
    let (ctrl, extra) = op.controls.split_at(intrinsic);

    out.push(op.gate.id());
    out.push(wire_u8(extra.len(), "control count")?);
    for &q in ctrl.iter().chain(&op.targets).chain(extra) {
        out.push(wire_u8(q, "qubit")?);
    }

    match op.gate.spec().param {
        ParamKind::None => {}
        ParamKind::Angle => {
            let angle = op.gate.angle().unwrap_or_default();
            out.extend_from_slice(&angle.to_le_bytes());
        }
        ParamKind::Step => {
            if let Gate::RyStep(k) = op.gate {
                out.push(k);
            }
        }
    }
    Ok(())
}

fn wire_u8(v: usize, what: &str) -> Result<u8> {
    u8::try_from(v).map_err(|_| QuestError::malformed(0, format!("{} {} does not fit in a byte", what, v)))
}
