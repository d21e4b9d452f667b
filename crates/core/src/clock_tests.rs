// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn fake_clock_advances() {
    let clock = FakeClock::new();
    let before = clock.now();
    clock.advance(Duration::from_secs(30));
    assert_eq!(clock.now() - before, chrono::Duration::seconds(30));
}

#[test]
fn fake_clock_set() {
    let clock = FakeClock::new();
    let target = Utc.timestamp_opt(2_000_000, 0).single().unwrap();
    clock.set(target);
    assert_eq!(clock.now(), target);
}

#[test]
fn fake_clock_clones_share_state() {
    let clock = FakeClock::new();
    let other = clock.clone();
    clock.advance(Duration::from_secs(5));
    assert_eq!(clock.now(), other.now());
}

#[test]
fn system_clock_is_monotonic_enough() {
    let clock = SystemClock;
    let a = clock.now();
    let b = clock.now();
    assert!(b >= a);
}
