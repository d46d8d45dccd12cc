use crate::error::{RegisterError, Result};
use num_complex::Complex64;

pub type C64 = Complex64;

/// No register above this size is ever allocated, whatever the caller's limit.
pub const HARD_MAX_QUBITS: usize = 32;

const AMPLITUDE_BYTES: usize = std::mem::size_of::<C64>();

#[derive(Clone, Debug, PartialEq)]
pub struct AmplitudeBuffer {
    data: Vec<C64>,
    num_qubits: usize,
}

impl AmplitudeBuffer {
    /// Allocates a register in the ground state |0...0⟩.
    ///
    /// The size check runs before any allocation, so an oversized request
    /// fails with [`RegisterError::OutOfMemory`] instead of aborting.
    pub fn new(num_qubits: usize, max_qubits: usize) -> Result<Self> {
        let dim = checked_dimension(num_qubits, max_qubits)?;

        let mut data = Vec::new();
        data.try_reserve_exact(dim)
            .map_err(|_| out_of_memory(num_qubits, max_qubits))?;
        data.resize(dim, C64::new(0.0, 0.0));
        data[0] = C64::new(1.0, 0.0);

        Ok(Self { data, num_qubits })
    }

    /// Wraps existing amplitudes. The length must be a power of two >= 2.
    pub fn from_amplitudes(data: Vec<C64>) -> Result<Self> {
        let dim = data.len();
        if dim < 2 || !dim.is_power_of_two() {
            return Err(RegisterError::InvalidDimension { dimension: dim });
        }
        let num_qubits = dim.trailing_zeros() as usize;
        Ok(Self { data, num_qubits })
    }

    /// Bytes needed for the amplitudes of an n-qubit register.
    pub fn required_bytes(num_qubits: usize) -> u128 {
        if num_qubits >= 120 {
            return u128::MAX;
        }
        (1u128 << num_qubits) * AMPLITUDE_BYTES as u128
    }

    #[inline]
    pub fn num_qubits(&self) -> usize {
        self.num_qubits
    }

    #[inline]
    pub fn dimension(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn amplitudes(&self) -> &[C64] {
        &self.data
    }

    #[inline]
    pub fn amplitudes_mut(&mut self) -> &mut [C64] {
        &mut self.data
    }

    pub fn amplitude(&self, index: usize) -> Result<C64> {
        self.data
            .get(index)
            .copied()
            .ok_or(RegisterError::IndexOutOfRange {
                index,
                dimension: self.data.len(),
            })
    }

    pub fn set_amplitude(&mut self, index: usize, value: C64) -> Result<()> {
        let dimension = self.data.len();
        let slot = self
            .data
            .get_mut(index)
            .ok_or(RegisterError::IndexOutOfRange { index, dimension })?;
        *slot = value;
        Ok(())
    }

    /// Collapses onto a single computational basis state.
    pub fn set_basis_state(&mut self, index: usize) -> Result<()> {
        if index >= self.data.len() {
            return Err(RegisterError::IndexOutOfRange {
                index,
                dimension: self.data.len(),
            });
        }
        self.data.fill(C64::new(0.0, 0.0));
        self.data[index] = C64::new(1.0, 0.0);
        Ok(())
    }

    pub fn reset(&mut self) {
        self.data.fill(C64::new(0.0, 0.0));
        self.data[0] = C64::new(1.0, 0.0);
    }

    /// Σ|a_i|², summed in ascending index order.
    pub fn norm_sqr(&self) -> f64 {
        let mut total = 0.0;
        for a in &self.data {
            total += a.norm_sqr();
        }
        total
    }
}

fn checked_dimension(num_qubits: usize, max_qubits: usize) -> Result<usize> {
    if num_qubits == 0 {
        return Err(RegisterError::InvalidQubitCount);
    }
    if num_qubits > max_qubits.min(HARD_MAX_QUBITS) {
        return Err(out_of_memory(num_qubits, max_qubits));
    }

    1usize
        .checked_shl(num_qubits as u32)
        .filter(|dim| dim.checked_mul(AMPLITUDE_BYTES).is_some())
        .ok_or_else(|| out_of_memory(num_qubits, max_qubits))
}

fn out_of_memory(qubits: usize, max_qubits: usize) -> RegisterError {
    RegisterError::OutOfMemory {
        qubits,
        max_qubits,
        bytes: AmplitudeBuffer::required_bytes(qubits),
    }
}
