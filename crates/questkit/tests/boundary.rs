use questkit::{
    calc_state_hash, execute_transaction, finalize, initialize, simulate_circuit, CircuitBuilder,
    QuestError, ResultKind,
};

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

#[test]
fn transaction_is_reproducible_across_sessions() {
    let a = initialize().unwrap();
    let b = initialize().unwrap();

    let ra = execute_transaction(a, b"transfer 42", b"alice").unwrap();
    let rb = execute_transaction(b, b"transfer 42", b"alice").unwrap();
    assert_eq!(ra, rb);
    assert_eq!(calc_state_hash(a).unwrap(), calc_state_hash(b).unwrap());

    // same session, second run
    let again = execute_transaction(a, b"transfer 42", b"alice").unwrap();
    assert_eq!(ra, again);

    let parsed = ra.parse().unwrap();
    assert_eq!(parsed.kind, ResultKind::Transaction);
    assert_eq!(parsed.digest, calc_state_hash(a).unwrap());
    assert!(parsed.outcome_probability > 0.0 && parsed.outcome_probability <= 1.0);

    finalize(a).unwrap();
    finalize(b).unwrap();
}

#[test]
fn transaction_results_are_pinned() {
    let h = initialize().unwrap();

    // (data, sender, digest, outcome, probability bits, header prefix)
    let cases: [(&[u8], &[u8], &str, u64, u64, &str); 2] = [
        (
            b"transfer 42",
            b"alice",
            "bc888329250ec59523ab208914c6d47d8ba0b595986c15019a44a23c2cfe722a",
            24,
            0x3fb0_382e_c09c_8acc,
            "515245530101050010000000",
        ),
        (
            // low nibbles 0..=15: every table entry once
            b"0123456789:;<=>?",
            b"bob",
            "06d7e9e335161aa9d81b75194fff82dd166f3d84c57f17d29f7652351dc32877",
            9,
            0x3f7c_2c35_aed6_d849,
            "515245530101050015000000",
        ),
    ];

    for (data, sender, digest, outcome, prob_bits, prefix) in cases {
        let buffer = execute_transaction(h, data, sender).unwrap();
        let bytes = buffer.as_bytes();
        assert_eq!(hex(&bytes[..12]), prefix, "{:?}", data);
        assert_eq!(hex(&bytes[12..44]), digest, "{:?}", data);
        assert_eq!(&bytes[44..52], &outcome.to_le_bytes(), "{:?}", data);
        assert_eq!(&bytes[52..60], &prob_bits.to_le_bytes(), "{:?}", data);
        assert_eq!(&bytes[60..], &[0, 0, 0, 0], "{:?}", data);
        assert_eq!(hex(&calc_state_hash(h).unwrap()), digest);
    }

    finalize(h).unwrap();
}

#[test]
fn different_transactions_differ() {
    let h = initialize().unwrap();
    let one = execute_transaction(h, b"payload-1", b"alice").unwrap().parse().unwrap();
    let two = execute_transaction(h, b"payload-2", b"alice").unwrap().parse().unwrap();
    assert_ne!(one.digest, two.digest);
    finalize(h).unwrap();
}

#[test]
fn empty_transaction_is_invalid() {
    let h = initialize().unwrap();
    assert!(matches!(
        execute_transaction(h, b"", b"abc"),
        Err(QuestError::InvalidTransaction(_))
    ));
    finalize(h).unwrap();
}

#[test]
fn malformed_circuit_leaves_state_untouched() {
    let h = initialize().unwrap();
    let good = CircuitBuilder::new(3).h(0).cnot(0, 2).encode().unwrap();
    simulate_circuit(h, &good).unwrap();
    let before = calc_state_hash(h).unwrap();

    let truncated = &good[..good.len() - 2];
    assert!(matches!(
        simulate_circuit(h, truncated),
        Err(QuestError::MalformedCircuit { .. })
    ));

    let mut unknown = good.clone();
    unknown[20] = 0x7f;
    assert!(matches!(
        simulate_circuit(h, &unknown),
        Err(QuestError::MalformedCircuit { .. })
    ));

    assert_eq!(calc_state_hash(h).unwrap(), before);
    finalize(h).unwrap();
}

#[test]
fn hadamard_digest_and_outcome_balance() {
    let h = initialize().unwrap();

    let mut ones = 0;
    let runs = 400;
    for seed in 0..runs {
        let bytes = CircuitBuilder::new(1).seed(seed).h(0).encode().unwrap();
        let result = simulate_circuit(h, &bytes).unwrap().parse().unwrap();
        assert_eq!(
            hex(&result.digest),
            "b1d8c24a389d5b52751ae7f53c99450cc5bacda2ed44e6ebb13116dc0519e781"
        );
        assert!((result.outcome_probability - 0.5).abs() < 1e-12);
        ones += result.outcome as usize;
    }

    let frac = ones as f64 / runs as f64;
    assert!((frac - 0.5).abs() < 0.1, "P(1) = {}", frac);
    finalize(h).unwrap();
}

#[test]
fn finalized_handle_is_rejected() {
    let h = initialize().unwrap();
    finalize(h).unwrap();
    assert_eq!(calc_state_hash(h), Err(QuestError::InvalidHandle(h)));
    assert!(matches!(
        execute_transaction(h, b"x", b"y"),
        Err(QuestError::InvalidHandle(_))
    ));
}

#[test]
fn sessions_run_concurrently() {
    let bytes = CircuitBuilder::new(12)
        .h(0)
        .cnot(0, 5)
        .cnot(5, 11)
        .encode()
        .unwrap();

    let digests: Vec<_> = std::thread::scope(|s| {
        let workers: Vec<_> = (0..4)
            .map(|_| {
                let bytes = &bytes;
                s.spawn(move || {
                    let h = initialize().unwrap();
                    let r = simulate_circuit(h, bytes).unwrap().parse().unwrap();
                    finalize(h).unwrap();
                    r.digest
                })
            })
            .collect();
        workers.into_iter().map(|w| w.join().unwrap()).collect()
    });

    assert!(digests.windows(2).all(|w| w[0] == w[1]), "{:?}", digests);
}
