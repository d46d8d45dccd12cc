use proptest::prelude::*;
use quantum::{Gate, SchedulerConfig};
use questkit::{CircuitBuilder, QuestKit, SessionConfig};

fn kit(threads: usize) -> QuestKit {
    QuestKit::new(SessionConfig {
        scheduler: SchedulerConfig {
            threads,
            parallel_threshold: 0,
        },
        ..SessionConfig::default()
    })
}

fn gate_for(id: u8, param: u8) -> Gate {
    match id % 8 {
        0 => Gate::Hadamard,
        1 => Gate::T,
        2 => Gate::Cnot,
        3 => Gate::Swap,
        4 => Gate::Toffoli,
        5 => Gate::RyStep(param % 32),
        6 => Gate::Rx(param as f64 * 0.1),
        _ => Gate::Cz,
    }
}

fn encode(n: usize, seed: u64, ops: &[(u8, u8, u64)]) -> Vec<u8> {
    let mut b = CircuitBuilder::new(n).seed(seed);
    for &(id, param, pick) in ops {
        let gate = gate_for(id, param);
        let arity = gate.intrinsic_controls() + gate.num_targets();
        if arity > n {
            continue;
        }
        let mut qubits: Vec<usize> = (0..n).collect();
        for i in 0..arity {
            let j = i + ((pick >> (8 * i)) as usize & 0xff) % (n - i);
            qubits.swap(i, j);
        }
        b = b.gate(gate, &qubits[..arity]);
    }
    if pick_measure(seed) {
        b = b.measure(0);
    }
    b.encode().unwrap()
}

fn pick_measure(seed: u64) -> bool {
    seed % 3 == 0
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn thread_counts_agree(
        n in 1usize..=10,
        seed in any::<u64>(),
        t in 2usize..=6,
        ops in prop::collection::vec((any::<u8>(), any::<u8>(), any::<u64>()), 1..48),
    ) {
        let bytes = encode(n, seed, &ops);

        let single = kit(1);
        let multi = kit(t);
        let h1 = single.initialize().unwrap();
        let h2 = multi.initialize().unwrap();

        let r1 = single.simulate_circuit(h1, &bytes).unwrap();
        let r2 = multi.simulate_circuit(h2, &bytes).unwrap();
        prop_assert_eq!(r1, r2);
        prop_assert_eq!(
            single.calc_state_hash(h1).unwrap(),
            multi.calc_state_hash(h2).unwrap()
        );
    }

    #[test]
    fn transactions_agree_across_thread_counts(
        data in prop::collection::vec(any::<u8>(), 1..300),
        sender in prop::collection::vec(any::<u8>(), 1..=64),
        t in 2usize..=4,
    ) {
        let single = kit(1);
        let multi = kit(t);
        let h1 = single.initialize().unwrap();
        let h2 = multi.initialize().unwrap();

        let r1 = single.execute_transaction(h1, &data, &sender).unwrap();
        let r2 = multi.execute_transaction(h2, &data, &sender).unwrap();
        prop_assert_eq!(r1, r2);
    }
}

#[test]
fn stats_count_work() {
    let k = kit(2);
    let h = k.initialize().unwrap();
    k.execute_transaction(h, b"abc", b"sender").unwrap();
    let bytes = CircuitBuilder::new(2).h(0).measure(0).measure(1).encode().unwrap();
    k.simulate_circuit(h, &bytes).unwrap();
    let _ = k.execute_transaction(h, b"", b"sender");

    let stats = k.stats(h).unwrap();
    assert_eq!(stats.transactions, 1);
    assert_eq!(stats.circuits, 1);
    assert_eq!(stats.failures, 1);
    assert_eq!(stats.measurements, 2);
    assert_eq!(k.num_qubits(h).unwrap(), 2);

    k.reset(h).unwrap();
    let probs = k.probabilities(h).unwrap();
    assert_eq!(probs.len(), 32);
    assert_eq!(probs[0], 1.0);
}
