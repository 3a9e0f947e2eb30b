use super::*;

#[test]
fn fake_clock_advances_both_instant_and_epoch() {
    let clock = FakeClock::new();
    let before = clock.now();
    let before_ms = clock.epoch_ms();
    clock.advance(Duration::from_millis(500));
    assert!(clock.now() > before);
    assert_eq!(clock.epoch_ms(), before_ms + 500);
}

#[test]
fn fake_clock_epoch_can_be_pinned() {
    let clock = FakeClock::new();
    clock.set_epoch_ms(42);
    assert_eq!(clock.epoch_ms(), 42);
}

#[test]
fn system_clock_epoch_is_plausible() {
    let clock = SystemClock;
    // Anything after 2020-01-01T00:00:00Z in epoch ms.
    assert!(clock.epoch_ms() > 1_577_836_800_000);
}
