use quantum::{state_digest, Circuit, Engine, Scheduler};
use register::AmplitudeBuffer;
use rng::ShakeRng;

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

#[test]
fn single_hadamard_digest() {
    let engine = Engine::new(Scheduler::single_threaded());
    let mut c = Circuit::new(1);
    c.h(0);

    let mut psi = AmplitudeBuffer::new(1, 4).unwrap();
    engine.run(&mut psi, &c, &mut ShakeRng::from_u64(0)).unwrap();

    assert_eq!(
        hex(&state_digest(&psi)),
        "b1d8c24a389d5b52751ae7f53c99450cc5bacda2ed44e6ebb13116dc0519e781"
    );
}

#[test]
fn digest_depends_on_width() {
    let one = AmplitudeBuffer::new(1, 4).unwrap();
    let two = AmplitudeBuffer::new(2, 4).unwrap();
    assert_ne!(state_digest(&one), state_digest(&two));
}

#[test]
fn large_register_digest_is_stable() {
    let engine = Engine::new(Scheduler::single_threaded());
    let mut c = Circuit::new(12);
    for q in 0..12 {
        c.h(q);
    }

    let mut a = AmplitudeBuffer::new(12, 16).unwrap();
    let mut b = AmplitudeBuffer::new(12, 16).unwrap();
    engine.run(&mut a, &c, &mut ShakeRng::from_u64(0)).unwrap();
    engine.run(&mut b, &c, &mut ShakeRng::from_u64(5)).unwrap();
    assert_eq!(state_digest(&a), state_digest(&b));
}
