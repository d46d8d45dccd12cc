use crate::error::{QuantumError, Result};
use crate::gates::Gate;

/// One gate application: matrix, target qubits and the qubits that must all
/// be |1> for it to act.
#[derive(Clone, Debug, PartialEq)]
pub struct GateOp {
    pub gate: Gate,
    pub targets: Vec<usize>,
    pub controls: Vec<usize>,
}

impl GateOp {
    pub fn single(gate: Gate, target: usize) -> Self {
        Self {
            gate,
            targets: vec![target],
            controls: Vec::new(),
        }
    }

    /// Builds an op from raw control and target lists without checking
    /// them; [`GateOp::validate`] reports anything malformed.
    pub fn from_parts(gate: Gate, controls: Vec<usize>, targets: Vec<usize>) -> Self {
        Self {
            gate,
            targets,
            controls,
        }
    }

    /// Splits wire-order operands (intrinsic controls first, then targets)
    /// and appends any extra controls.
    pub fn from_operands(gate: Gate, operands: &[usize], extra_controls: &[usize]) -> Result<Self> {
        let expected = gate.intrinsic_controls() + gate.num_targets();
        if operands.len() != expected {
            return Err(QuantumError::OperandCount {
                gate: gate.name(),
                expected,
                actual: operands.len(),
            });
        }

        let (ctrl, targets) = operands.split_at(gate.intrinsic_controls());
        let mut controls = ctrl.to_vec();
        controls.extend_from_slice(extra_controls);

        Ok(Self {
            gate,
            targets: targets.to_vec(),
            controls,
        })
    }

    pub fn control_mask(&self) -> usize {
        self.controls.iter().fold(0, |mask, &c| mask | (1usize << c))
    }

    /// Checks ranges, operand counts and that no qubit appears twice.
    pub fn validate(&self, num_qubits: usize) -> Result<()> {
        let name = self.gate.name();
        if self.targets.len() != self.gate.num_targets()
            || self.controls.len() < self.gate.intrinsic_controls()
        {
            return Err(QuantumError::OperandCount {
                gate: name,
                expected: self.gate.intrinsic_controls() + self.gate.num_targets(),
                actual: self.controls.len() + self.targets.len(),
            });
        }

        let mut seen = 0u64;
        for &q in self.controls.iter().chain(self.targets.iter()) {
            if q >= num_qubits || q >= 64 {
                return Err(QuantumError::QubitOutOfRange {
                    qubit: q,
                    num_qubits,
                });
            }
            let bit = 1u64 << q;
            if seen & bit != 0 {
                return Err(QuantumError::DuplicateQubit { qubit: q, gate: name });
            }
            seen |= bit;
        }
        Ok(())
    }

    pub fn inverse(&self) -> Self {
        Self {
            gate: self.gate.inverse(),
            targets: self.targets.clone(),
            controls: self.controls.clone(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Instruction {
    Gate(GateOp),
    /// Projective Z measurement; the outcome is recorded as a classical bit.
    Measure { qubit: usize },
}

impl Instruction {
    pub fn validate(&self, num_qubits: usize) -> Result<()> {
        match self {
            Instruction::Gate(op) => op.validate(num_qubits),
            Instruction::Measure { qubit } if *qubit >= num_qubits => {
                Err(QuantumError::QubitOutOfRange {
                    qubit: *qubit,
                    num_qubits,
                })
            }
            Instruction::Measure { .. } => Ok(()),
        }
    }
}

/// Ordered instruction list for a fixed register width, plus the seed used
/// for any sampling done while or after running it.
#[derive(Clone, Debug, PartialEq)]
pub struct Circuit {
    num_qubits: usize,
    seed: u64,
    instructions: Vec<Instruction>,
}

impl Circuit {
    pub fn new(num_qubits: usize) -> Self {
        Self {
            num_qubits,
            seed: 0,
            instructions: Vec::new(),
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn num_qubits(&self) -> usize {
        self.num_qubits
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    pub fn gate_count(&self) -> usize {
        self.instructions
            .iter()
            .filter(|i| matches!(i, Instruction::Gate(_)))
            .count()
    }

    pub fn push(&mut self, instruction: Instruction) -> &mut Self {
        self.instructions.push(instruction);
        self
    }

    pub fn push_op(&mut self, op: GateOp) -> &mut Self {
        self.push(Instruction::Gate(op))
    }

    /// Appends `gate` with wire-order operands, intrinsic controls first.
    /// Malformed operand lists are reported by [`Circuit::validate`].
    pub fn gate(&mut self, gate: Gate, operands: &[usize]) -> &mut Self {
        let (controls, targets) = operands.split_at(gate.intrinsic_controls().min(operands.len()));
        self.push_op(GateOp::from_parts(gate, controls.to_vec(), targets.to_vec()))
    }

    pub fn h(&mut self, q: usize) -> &mut Self {
        self.gate(Gate::Hadamard, &[q])
    }

    pub fn x(&mut self, q: usize) -> &mut Self {
        self.gate(Gate::PauliX, &[q])
    }

    pub fn cnot(&mut self, control: usize, target: usize) -> &mut Self {
        self.gate(Gate::Cnot, &[control, target])
    }

    pub fn measure(&mut self, qubit: usize) -> &mut Self {
        self.push(Instruction::Measure { qubit })
    }

    pub fn validate(&self) -> Result<()> {
        for instruction in &self.instructions {
            instruction.validate(self.num_qubits)?;
        }
        Ok(())
    }

    /// The adjoint circuit: inverse gates in reverse order.
    pub fn inverse(&self) -> Result<Self> {
        let mut instructions = Vec::with_capacity(self.instructions.len());
        for instruction in self.instructions.iter().rev() {
            match instruction {
                Instruction::Gate(op) => instructions.push(Instruction::Gate(op.inverse())),
                Instruction::Measure { .. } => return Err(QuantumError::Irreversible),
            }
        }
        Ok(Self {
            num_qubits: self.num_qubits,
            seed: self.seed,
            instructions,
        })
    }
}
