use num_complex::Complex64;

/// Identical to `register::C64`.
pub type C64 = Complex64;

pub type Matrix2 = [[C64; 2]; 2];
pub type Matrix4 = [[C64; 4]; 4];

/// Number of distinct [`Gate::RyStep`] rotations; step `k` turns by `k·π/8`.
pub const RY_STEPS: u8 = 32;

/// cos(kπ/16) for k = 0..=8, exact at the endpoints.
const COS_SIXTEENTHS: [f64; 9] = [
    1.0,
    0.9807852804032304,
    0.9238795325112867,
    0.8314696123025452,
    0.7071067811865476,
    0.5555702330196023,
    0.38268343236508984,
    0.19509032201612833,
    0.0,
];

pub fn identity() -> Matrix2 {
    let z = C64::new(0.0, 0.0);
    let o = C64::new(1.0, 0.0);
    [[o, z], [z, o]]
}

pub fn hadamard() -> Matrix2 {
    let s = 1.0 / 2.0_f64.sqrt();
    [
        [C64::new(s, 0.0), C64::new(s, 0.0)],
        [C64::new(s, 0.0), C64::new(-s, 0.0)],
    ]
}

pub fn pauli_x() -> Matrix2 {
    let z = C64::new(0.0, 0.0);
    let o = C64::new(1.0, 0.0);
    [[z, o], [o, z]]
}

pub fn pauli_y() -> Matrix2 {
    let z = C64::new(0.0, 0.0);
    let i = C64::new(0.0, 1.0);
    let ni = C64::new(0.0, -1.0);
    [[z, ni], [i, z]]
}

pub fn rx(theta: f64) -> Matrix2 {
    let c = (theta / 2.0).cos();
    let s = (theta / 2.0).sin();
    [
        [C64::new(c, 0.0), C64::new(0.0, -s)],
        [C64::new(0.0, -s), C64::new(c, 0.0)],
    ]
}

pub fn ry(theta: f64) -> Matrix2 {
    let c = (theta / 2.0).cos();
    let s = (theta / 2.0).sin();
    [
        [C64::new(c, 0.0), C64::new(-s, 0.0)],
        [C64::new(s, 0.0), C64::new(c, 0.0)],
    ]
}

/// Ry(k·π/8) built from the cosine table instead of libm.
pub fn ry_step(k: u8) -> Matrix2 {
    let half = k % RY_STEPS;
    let c = cos_sixteenths(half);
    let s = cos_sixteenths((40 - half) % RY_STEPS);
    [
        [C64::new(c, 0.0), C64::new(-s, 0.0)],
        [C64::new(s, 0.0), C64::new(c, 0.0)],
    ]
}

fn cos_sixteenths(m: u8) -> f64 {
    let m = (m % RY_STEPS) as usize;
    match m {
        0..=8 => COS_SIXTEENTHS[m],
        9..=16 => -COS_SIXTEENTHS[16 - m],
        17..=24 => -COS_SIXTEENTHS[m - 16],
        _ => COS_SIXTEENTHS[32 - m],
    }
}

/// Diagonal entries of Z, S, T, their adjoints, Phase and Rz.
pub fn pauli_z_diag() -> [C64; 2] {
    [C64::new(1.0, 0.0), C64::new(-1.0, 0.0)]
}

pub fn s_diag() -> [C64; 2] {
    [C64::new(1.0, 0.0), C64::new(0.0, 1.0)]
}

pub fn s_dagger_diag() -> [C64; 2] {
    [C64::new(1.0, 0.0), C64::new(0.0, -1.0)]
}

pub fn t_diag() -> [C64; 2] {
    let h = std::f64::consts::FRAC_1_SQRT_2;
    [C64::new(1.0, 0.0), C64::new(h, h)]
}

pub fn t_dagger_diag() -> [C64; 2] {
    let h = std::f64::consts::FRAC_1_SQRT_2;
    [C64::new(1.0, 0.0), C64::new(h, -h)]
}

pub fn phase_diag(theta: f64) -> [C64; 2] {
    [C64::new(1.0, 0.0), C64::from_polar(1.0, theta)]
}

pub fn rz_diag(theta: f64) -> [C64; 2] {
    [
        C64::from_polar(1.0, -theta / 2.0),
        C64::from_polar(1.0, theta / 2.0),
    ]
}

/// |01> <-> |10>
pub fn swap() -> Matrix4 {
    let z = C64::new(0.0, 0.0);
    let o = C64::new(1.0, 0.0);
    [
        [o, z, z, z],
        [z, z, o, z],
        [z, o, z, z],
        [z, z, z, o],
    ]
}

/// How a gate acts on the amplitudes of its target qubit(s).
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Kernel {
    /// Scales |0> and |1> of one target independently.
    Diagonal([C64; 2]),
    /// General 2x2 on one target.
    Single(Matrix2),
    /// 4x4 on two targets; row index = (bit(t0) << 1) | bit(t1).
    Pair(Matrix4),
}

/// Parameter carried by a gate on the wire.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParamKind {
    None,
    /// f64 angle in radians.
    Angle,
    /// u8 step below [`RY_STEPS`].
    Step,
}

/// Static description of one catalog entry, keyed by wire id.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GateSpec {
    pub id: u8,
    pub name: &'static str,
    /// Qubit operands on the wire, intrinsic controls first.
    pub operands: usize,
    pub param: ParamKind,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Gate {
    Identity,
    Hadamard,
    PauliX,
    PauliY,
    PauliZ,
    S,
    T,
    Cnot,
    Swap,
    Toffoli,
    Phase(f64),
    Rx(f64),
    Ry(f64),
    Rz(f64),
    Cz,
    SDagger,
    TDagger,
    RyStep(u8),
}

const CATALOG: [GateSpec; 18] = [
    spec(0, "I", 1, ParamKind::None),
    spec(1, "H", 1, ParamKind::None),
    spec(2, "X", 1, ParamKind::None),
    spec(3, "Y", 1, ParamKind::None),
    spec(4, "Z", 1, ParamKind::None),
    spec(5, "S", 1, ParamKind::None),
    spec(6, "T", 1, ParamKind::None),
    spec(7, "CNOT", 2, ParamKind::None),
    spec(8, "SWAP", 2, ParamKind::None),
    spec(9, "TOFFOLI", 3, ParamKind::None),
    spec(10, "PHASE", 1, ParamKind::Angle),
    spec(11, "RX", 1, ParamKind::Angle),
    spec(12, "RY", 1, ParamKind::Angle),
    spec(13, "RZ", 1, ParamKind::Angle),
    spec(14, "CZ", 2, ParamKind::None),
    spec(15, "SDG", 1, ParamKind::None),
    spec(16, "TDG", 1, ParamKind::None),
    spec(17, "RYSTEP", 1, ParamKind::Step),
];

const fn spec(id: u8, name: &'static str, operands: usize, param: ParamKind) -> GateSpec {
    GateSpec {
        id,
        name,
        operands,
        param,
    }
}

impl GateSpec {
    pub fn lookup(id: u8) -> Option<&'static GateSpec> {
        CATALOG.get(id as usize)
    }

    pub fn all() -> &'static [GateSpec] {
        &CATALOG
    }
}

impl Gate {
    /// Builds a gate from its wire id and decoded parameter. Parameters that
    /// the gate does not take are ignored.
    pub fn from_id(id: u8, angle: f64, step: u8) -> Option<Gate> {
        let gate = match id {
            0 => Gate::Identity,
            1 => Gate::Hadamard,
            2 => Gate::PauliX,
            3 => Gate::PauliY,
            4 => Gate::PauliZ,
            5 => Gate::S,
            6 => Gate::T,
            7 => Gate::Cnot,
            8 => Gate::Swap,
            9 => Gate::Toffoli,
            10 => Gate::Phase(angle),
            11 => Gate::Rx(angle),
            12 => Gate::Ry(angle),
            13 => Gate::Rz(angle),
            14 => Gate::Cz,
            15 => Gate::SDagger,
            16 => Gate::TDagger,
            17 => Gate::RyStep(step),
            _ => return None,
        };
        Some(gate)
    }

    pub fn id(&self) -> u8 {
        match self {
            Gate::Identity => 0,
            Gate::Hadamard => 1,
            Gate::PauliX => 2,
            Gate::PauliY => 3,
            Gate::PauliZ => 4,
            Gate::S => 5,
            Gate::T => 6,
            Gate::Cnot => 7,
            Gate::Swap => 8,
            Gate::Toffoli => 9,
            Gate::Phase(_) => 10,
            Gate::Rx(_) => 11,
            Gate::Ry(_) => 12,
            Gate::Rz(_) => 13,
            Gate::Cz => 14,
            Gate::SDagger => 15,
            Gate::TDagger => 16,
            Gate::RyStep(_) => 17,
        }
    }

    pub fn spec(&self) -> &'static GateSpec {
        &CATALOG[self.id() as usize]
    }

    pub fn name(&self) -> &'static str {
        self.spec().name
    }

    /// Controls that are part of the gate itself (CNOT, CZ, Toffoli).
    pub fn intrinsic_controls(&self) -> usize {
        match self {
            Gate::Cnot | Gate::Cz => 1,
            Gate::Toffoli => 2,
            _ => 0,
        }
    }

    pub fn num_targets(&self) -> usize {
        match self {
            Gate::Swap => 2,
            _ => 1,
        }
    }

    pub fn angle(&self) -> Option<f64> {
        match *self {
            Gate::Phase(t) | Gate::Rx(t) | Gate::Ry(t) | Gate::Rz(t) => Some(t),
            _ => None,
        }
    }

    pub fn kernel(&self) -> Kernel {
        match *self {
            Gate::Identity => Kernel::Diagonal([C64::new(1.0, 0.0); 2]),
            Gate::Hadamard => Kernel::Single(hadamard()),
            Gate::PauliX | Gate::Cnot | Gate::Toffoli => Kernel::Single(pauli_x()),
            Gate::PauliY => Kernel::Single(pauli_y()),
            Gate::PauliZ | Gate::Cz => Kernel::Diagonal(pauli_z_diag()),
            Gate::S => Kernel::Diagonal(s_diag()),
            Gate::T => Kernel::Diagonal(t_diag()),
            Gate::SDagger => Kernel::Diagonal(s_dagger_diag()),
            Gate::TDagger => Kernel::Diagonal(t_dagger_diag()),
            Gate::Phase(theta) => Kernel::Diagonal(phase_diag(theta)),
            Gate::Rz(theta) => Kernel::Diagonal(rz_diag(theta)),
            Gate::Rx(theta) => Kernel::Single(rx(theta)),
            Gate::Ry(theta) => Kernel::Single(ry(theta)),
            Gate::RyStep(k) => Kernel::Single(ry_step(k)),
            Gate::Swap => Kernel::Pair(swap()),
        }
    }

    pub fn is_diagonal(&self) -> bool {
        matches!(self.kernel(), Kernel::Diagonal(_))
    }

    pub fn inverse(&self) -> Gate {
        match *self {
            Gate::S => Gate::SDagger,
            Gate::SDagger => Gate::S,
            Gate::T => Gate::TDagger,
            Gate::TDagger => Gate::T,
            Gate::Phase(t) => Gate::Phase(-t),
            Gate::Rx(t) => Gate::Rx(-t),
            Gate::Ry(t) => Gate::Ry(-t),
            Gate::Rz(t) => Gate::Rz(-t),
            Gate::RyStep(k) => Gate::RyStep((RY_STEPS - k % RY_STEPS) % RY_STEPS),
            g => g,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matrices_share_the_register_element_type() {
        let mut psi = register::AmplitudeBuffer::new(1, 1).unwrap();
        let h: Matrix2 = hadamard();
        psi.set_amplitude(1, h[1][1]).unwrap();
        assert_eq!(psi.amplitude(1).unwrap(), C64::new(-1.0 / 2.0_f64.sqrt(), 0.0));
    }

    #[test]
    fn catalog_ids_match_gates() {
        for spec in GateSpec::all() {
            let gate = Gate::from_id(spec.id, 0.5, 3).unwrap();
            assert_eq!(gate.id(), spec.id);
            assert_eq!(gate.name(), spec.name);
            assert_eq!(
                gate.intrinsic_controls() + gate.num_targets(),
                spec.operands,
                "{}",
                spec.name
            );
        }
        assert!(Gate::from_id(18, 0.0, 0).is_none());
        assert!(GateSpec::lookup(200).is_none());
    }

    #[test]
    fn ry_step_matches_ry() {
        for k in 0..RY_STEPS {
            let theta = k as f64 * std::f64::consts::PI / 8.0;
            let a = ry_step(k);
            let b = ry(theta);
            for r in 0..2 {
                for c in 0..2 {
                    assert!((a[r][c] - b[r][c]).norm() < 1e-15, "k = {}", k);
                }
            }
        }
    }

    #[test]
    fn ry_step_endpoints_are_exact() {
        let m = ry_step(0);
        assert_eq!(m, identity());

        let m = ry_step(8);
        assert_eq!(m[0][0], C64::new(0.0, 0.0));
        assert_eq!(m[1][0], C64::new(1.0, 0.0));
    }

    #[test]
    fn inverse_of_inverse() {
        let gates = [
            Gate::S,
            Gate::T,
            Gate::Phase(0.3),
            Gate::Rx(1.1),
            Gate::RyStep(5),
            Gate::RyStep(0),
            Gate::Swap,
        ];
        for g in gates {
            assert_eq!(g.inverse().inverse(), g);
        }
    }
}
