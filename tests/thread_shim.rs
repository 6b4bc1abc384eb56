// CLASSIFICATION: COMMUNITY
// Filename: thread_shim.rs v0.2
// Author: Lukas Bower
// Date Modified: 2027-02-12

//! Ad hoc thread creation and the sleep/join primitives.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use serial_test::serial;

use hostkern::{sleep_ms, spawn_thread, SpawnError, StartDelay, ThreadDescriptor, ThreadOptions};

static SUM: AtomicUsize = AtomicUsize::new(0);
static DELAYED_RAN: AtomicBool = AtomicBool::new(false);

fn summing_entry(a: usize, b: usize, c: usize) {
    SUM.store(a + b + c, Ordering::SeqCst);
}

fn delayed_entry(_a: usize, _b: usize, _c: usize) {
    DELAYED_RAN.store(true, Ordering::SeqCst);
}

fn panicking_entry(_a: usize, _b: usize, _c: usize) {
    panic!("entry gave up");
}

fn descriptor(
    name: &'static str,
    entry: fn(usize, usize, usize),
    args: (usize, usize, usize),
    start_delay: StartDelay,
) -> ThreadDescriptor {
    ThreadDescriptor {
        name,
        entry,
        args,
        priority: 0,
        options: ThreadOptions::empty(),
        stack_size: 0,
        start_delay,
    }
}

#[test]
#[serial]
fn spawned_thread_receives_its_arguments() {
    let handle = spawn_thread(descriptor(
        "summer",
        summing_entry,
        (4, 5, 6),
        StartDelay::Ms(0),
    ))
    .unwrap();
    assert_eq!(handle.name(), "summer");
    assert_eq!(handle.join(), 0);
    assert_eq!(SUM.load(Ordering::SeqCst), 15);
}

#[test]
#[serial]
fn spawn_returns_after_handoff_not_after_entry() {
    let started = Instant::now();
    let handle = spawn_thread(descriptor(
        "delayed",
        delayed_entry,
        (0, 0, 0),
        StartDelay::Ms(500),
    ))
    .unwrap();
    assert!(started.elapsed() < Duration::from_millis(500));
    assert!(!DELAYED_RAN.load(Ordering::SeqCst));
    assert_eq!(handle.join(), 0);
    assert!(DELAYED_RAN.load(Ordering::SeqCst));
    assert!(started.elapsed() >= Duration::from_millis(500));
}

#[test]
#[serial]
fn manual_start_is_rejected_for_ad_hoc_threads() {
    let result = spawn_thread(descriptor(
        "never",
        delayed_entry,
        (0, 0, 0),
        StartDelay::Manual,
    ));
    assert!(matches!(result, Err(SpawnError::NoAutoStart("never"))));
}

#[test]
#[serial]
fn join_reports_a_panicked_entry() {
    let handle = spawn_thread(descriptor(
        "doomed",
        panicking_entry,
        (0, 0, 0),
        StartDelay::Ms(0),
    ))
    .unwrap();
    assert_eq!(handle.join(), -libc::ECANCELED);
}

#[test]
#[serial]
fn sleep_waits_at_least_the_requested_time() {
    let started = Instant::now();
    assert_eq!(sleep_ms(20), 0);
    assert!(started.elapsed() >= Duration::from_millis(20));
}

#[test]
#[serial]
fn sleep_rejects_negative_durations() {
    assert_eq!(sleep_ms(-5), -libc::EINVAL);
}
