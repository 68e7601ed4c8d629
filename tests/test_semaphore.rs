// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// Named POSIX semaphore wrapper.

use std::io;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use tricolor::names::posix_name;
use tricolor::{NamedSemaphore, WaitOutcome};

static COUNTER: AtomicUsize = AtomicUsize::new(0);

fn unique_name(prefix: &str) -> String {
    let n = COUNTER.fetch_add(1, Ordering::Relaxed);
    posix_name(&format!("tc_{prefix}_{}_sem_{n}", std::process::id()))
}

#[test]
fn create_with_initial_count() {
    let name = unique_name("count");
    let sem = NamedSemaphore::create(&name, 3).expect("create");
    for _ in 0..3 {
        assert!(sem.try_wait().expect("try_wait"));
    }
    assert!(!sem.try_wait().expect("try_wait"));
    NamedSemaphore::unlink(&name).expect("unlink");
}

#[test]
fn create_is_exclusive() {
    let name = unique_name("exclusive");
    let _sem = NamedSemaphore::create(&name, 0).expect("create");
    let err = NamedSemaphore::create(&name, 0).err().expect("second create must fail");
    assert_eq!(err.raw_os_error(), Some(libc::EEXIST));
    NamedSemaphore::unlink(&name).expect("unlink");
}

#[test]
fn open_missing_fails() {
    let name = unique_name("missing");
    let err = NamedSemaphore::open(&name).err().expect("open must fail");
    assert_eq!(err.kind(), io::ErrorKind::NotFound);
}

#[test]
fn open_shares_count_with_creator() {
    let name = unique_name("shared");
    let a = NamedSemaphore::create(&name, 0).expect("create");
    let b = NamedSemaphore::open(&name).expect("open");
    a.post().expect("post");
    assert!(b.try_wait().expect("try_wait"));
    assert!(!a.try_wait().expect("try_wait"));
    NamedSemaphore::unlink(&name).expect("unlink");
}

#[test]
fn unlink_twice_is_ok() {
    let name = unique_name("unlink_twice");
    drop(NamedSemaphore::create(&name, 1).expect("create"));
    NamedSemaphore::unlink(&name).expect("first unlink");
    NamedSemaphore::unlink(&name).expect("second unlink");
}

#[test]
fn handle_outlives_unlink() {
    let name = unique_name("outlives");
    let sem = NamedSemaphore::create(&name, 0).expect("create");
    NamedSemaphore::unlink(&name).expect("unlink");
    sem.post().expect("post after unlink");
    assert!(sem.try_wait().expect("try_wait"));
    sem.close().expect("close");
}

#[test]
fn blocking_wait_woken_by_post() {
    let name = unique_name("blocking");
    let sem = NamedSemaphore::create(&name, 0).expect("create");
    let woke = Arc::new(AtomicBool::new(false));

    let waiter = {
        let name = name.clone();
        let woke = Arc::clone(&woke);
        thread::spawn(move || {
            let sem = NamedSemaphore::open(&name).expect("open");
            let outcome = sem.wait().expect("wait");
            woke.store(true, Ordering::SeqCst);
            outcome
        })
    };

    thread::sleep(Duration::from_millis(50));
    assert!(!woke.load(Ordering::SeqCst));
    sem.post().expect("post");
    assert_eq!(waiter.join().unwrap(), WaitOutcome::Acquired);
    NamedSemaphore::unlink(&name).expect("unlink");
}

#[test]
fn wait_timeout_expires_without_units() {
    let name = unique_name("timeout");
    let sem = NamedSemaphore::create(&name, 0).expect("create");
    let start = std::time::Instant::now();
    assert_eq!(
        sem.wait_timeout(Duration::from_millis(50)).expect("wait_timeout"),
        WaitOutcome::TimedOut
    );
    assert!(start.elapsed() >= Duration::from_millis(40));

    sem.post().expect("post");
    assert_eq!(
        sem.wait_timeout(Duration::from_millis(50)).expect("wait_timeout"),
        WaitOutcome::Acquired
    );
    NamedSemaphore::unlink(&name).expect("unlink");
}
