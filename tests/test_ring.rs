// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// Producer/consumer protocol over the shared ring buffer. Threads stand in
// for processes: each one attaches its own mapping and semaphore handles.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use tricolor::names::ResourceNames;
use tricolor::{
    Config, Error, NamedSemaphore, Publish, RegionState, ResultSet, RingBuffer, ShmHandle,
    ShmOpenMode, SupervisorContext, TerminationFlag, BUFSZ,
};

static COUNTER: AtomicUsize = AtomicUsize::new(0);

fn unique_name(prefix: &str) -> String {
    let n = COUNTER.fetch_add(1, Ordering::Relaxed);
    format!("tc_{prefix}_{}_{n}", std::process::id())
}

/// Removes the names when the test ends, even on panic.
struct Cleanup(ResourceNames);

impl Drop for Cleanup {
    fn drop(&mut self) {
        RingBuffer::unlink(&self.0);
    }
}

fn fresh(prefix: &str) -> (Config, ResourceNames, Cleanup) {
    let config = Config::with_namespace(&unique_name(prefix));
    let names = config.resource_names();
    (config, names.clone(), Cleanup(names))
}

/// A candidate tagging producer `id` and sequence number `seq`.
fn tagged(id: u16, seq: u16) -> ResultSet {
    ResultSet::from_edges([(id, seq)])
}

fn tag_of(rs: &ResultSet) -> (u16, u16) {
    let e = rs.edges()[0];
    (e.u(), e.v())
}

fn wait_until(timeout: Duration, cond: impl Fn() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if cond() {
            return true;
        }
        thread::sleep(Duration::from_millis(5));
    }
    cond()
}

#[test]
fn attach_without_supervisor_fails() {
    let (_, names, _cleanup) = fresh("no_supervisor");
    let err = RingBuffer::attach(&names).err().expect("attach must fail");
    assert!(matches!(err, Error::Attach { op: "shm_open", .. }), "{err:?}");
}

#[test]
fn second_supervisor_is_rejected() {
    let (config, _names, _cleanup) = fresh("second");
    let first = SupervisorContext::create(&config, TerminationFlag::detached()).expect("first");
    let err = SupervisorContext::create(&config, TerminationFlag::detached())
        .err()
        .expect("second supervisor must fail");
    assert!(matches!(err, Error::Create { op: "shm_open", .. }), "{err:?}");

    // The first supervisor's resources are untouched.
    let ring = RingBuffer::attach(first.names()).expect("attach to first");
    assert_eq!(ring.state(), RegionState::Running);
}

#[test]
fn partial_create_is_rolled_back() {
    let (_, names, _cleanup) = fresh("rollback");
    let stale = NamedSemaphore::create(&names.used, 0).expect("stale semaphore");

    let err = RingBuffer::create(&names).err().expect("create must fail");
    assert!(matches!(err, Error::Create { op: "sem_open used", .. }), "{err:?}");

    assert!(ShmHandle::acquire(&names.shm, 8, ShmOpenMode::Open).is_err());
    assert!(NamedSemaphore::open(&names.free).is_err());
    // Not ours to remove.
    assert!(NamedSemaphore::open(&names.used).is_ok());
    drop(stale);
}

#[test]
fn candidates_arrive_in_publish_order() {
    let (_, names, _cleanup) = fresh("order");
    let stop = TerminationFlag::detached();
    let ring = RingBuffer::create(&names).expect("create");
    let producer = RingBuffer::attach(&names).expect("attach");

    for seq in 0..10 {
        assert_eq!(
            producer.publish(&tagged(1, seq), stop).unwrap(),
            Publish::Written(seq as usize)
        );
    }
    let mut consumer = ring.consumer();
    for seq in 0..10 {
        let rs = consumer.recv(stop).unwrap().expect("candidate");
        assert_eq!(tag_of(&rs), (1, seq));
    }
    assert_eq!(consumer.read_pos(), 10);
}

#[test]
fn at_most_bufsz_unread_slots() {
    let (_, names, _cleanup) = fresh("bounded");
    let stop = TerminationFlag::detached();
    let ring = RingBuffer::create(&names).expect("create");
    let written = Arc::new(AtomicUsize::new(0));

    let producer = {
        let names = names.clone();
        let written = Arc::clone(&written);
        thread::spawn(move || {
            let ring = RingBuffer::attach(&names).expect("attach");
            for seq in 0..=BUFSZ as u16 {
                match ring.publish(&tagged(0, seq), stop).unwrap() {
                    Publish::Written(_) => written.fetch_add(1, Ordering::SeqCst),
                    other => panic!("unexpected {other:?}"),
                };
            }
        })
    };

    assert!(wait_until(Duration::from_secs(5), || written.load(Ordering::SeqCst) == BUFSZ));
    thread::sleep(Duration::from_millis(100));
    assert_eq!(written.load(Ordering::SeqCst), BUFSZ, "producer overran the ring");

    let mut consumer = ring.consumer();
    let first = consumer.recv(stop).unwrap().expect("candidate");
    assert_eq!(tag_of(&first), (0, 0));

    assert!(wait_until(Duration::from_secs(5), || written.load(Ordering::SeqCst) == BUFSZ + 1));
    producer.join().unwrap();

    // The 101st candidate wrapped around into slot 0.
    for seq in 1..=BUFSZ as u16 {
        let rs = consumer.recv(stop).unwrap().expect("candidate");
        assert_eq!(tag_of(&rs), (0, seq));
    }
}

#[test]
fn terminate_wakes_every_blocked_producer() {
    let (_, names, _cleanup) = fresh("wake");
    let stop = TerminationFlag::detached();
    let ring = RingBuffer::create(&names).expect("create");

    for seq in 0..BUFSZ as u16 {
        assert!(matches!(ring.publish(&tagged(9, seq), stop).unwrap(), Publish::Written(_)));
    }

    let returned = Arc::new(AtomicUsize::new(0));
    let producers: Vec<_> = (0..4)
        .map(|id| {
            let names = names.clone();
            let returned = Arc::clone(&returned);
            thread::spawn(move || {
                let ring = RingBuffer::attach(&names).expect("attach");
                let outcome = ring.publish(&tagged(id, 0), stop).unwrap();
                returned.fetch_add(1, Ordering::SeqCst);
                outcome
            })
        })
        .collect();

    thread::sleep(Duration::from_millis(100));
    assert_eq!(returned.load(Ordering::SeqCst), 0, "producers should be blocked");

    ring.terminate().expect("terminate");
    for p in producers {
        assert_eq!(p.join().unwrap(), Publish::Terminating);
    }

    // Later publishes bail out before touching `free`.
    assert_eq!(ring.publish(&tagged(0, 0), stop).unwrap(), Publish::Terminating);
    assert_eq!(ring.state(), RegionState::Terminating);
}

#[test]
fn many_producers_never_overwrite_unread_slots() {
    const PRODUCERS: u16 = 4;
    const PER_PRODUCER: u16 = 750;

    let (_, names, _cleanup) = fresh("stress");
    let stop = TerminationFlag::detached();
    let ring = RingBuffer::create(&names).expect("create");

    let producers: Vec<_> = (0..PRODUCERS)
        .map(|id| {
            let names = names.clone();
            thread::spawn(move || {
                let ring = RingBuffer::attach(&names).expect("attach");
                for seq in 0..PER_PRODUCER {
                    let outcome = ring.publish(&tagged(id, seq), stop).unwrap();
                    assert!(matches!(outcome, Publish::Written(_)));
                }
            })
        })
        .collect();

    let mut next = vec![0u16; PRODUCERS as usize];
    let mut consumer = ring.consumer();
    for _ in 0..PRODUCERS as usize * PER_PRODUCER as usize {
        let rs = consumer.recv(stop).unwrap().expect("candidate");
        let (id, seq) = tag_of(&rs);
        assert_eq!(seq, next[id as usize], "producer {id} out of sequence");
        next[id as usize] += 1;
    }
    for p in producers {
        p.join().unwrap();
    }
    assert!(next.iter().all(|&n| n == PER_PRODUCER));
    assert_eq!(consumer.read_pos(), (PRODUCERS as usize * PER_PRODUCER as usize) % BUFSZ);
}

#[test]
fn teardown_removes_names_and_is_idempotent() {
    let (config, names, _cleanup) = fresh("teardown");
    let mut ctx = SupervisorContext::create(&config, TerminationFlag::detached()).expect("create");
    let producer = RingBuffer::attach(&names).expect("attach");

    assert!(ctx.teardown().is_empty());
    assert!(ctx.teardown().is_empty());

    // Producers keep valid handles and observe the shutdown.
    assert_eq!(producer.state(), RegionState::Terminating);
    assert!(RingBuffer::attach(&names).is_err());
    assert!(NamedSemaphore::open(&names.wmutex).is_err());

    // A new supervisor can take over the namespace.
    let again = SupervisorContext::create(&config, TerminationFlag::detached());
    assert!(again.is_ok());
}

#[test]
fn recv_returns_none_when_stop_was_set_before_waiting() {
    // No signal ever arrives: the flag alone must end the wait.
    let (_, names, _cleanup) = fresh("stop_recv");
    let ring = RingBuffer::create(&names).expect("create");
    let stop = TerminationFlag::detached();
    stop.set();

    let start = Instant::now();
    assert!(ring.consumer().recv(stop).unwrap().is_none());
    assert!(start.elapsed() < Duration::from_secs(5));
}

#[test]
fn publish_on_full_ring_stops_when_flag_is_set() {
    let (_, names, _cleanup) = fresh("stop_publish");
    let ring = RingBuffer::create(&names).expect("create");
    let fill = TerminationFlag::detached();
    for seq in 0..BUFSZ as u16 {
        assert!(matches!(
            ring.publish(&tagged(0, seq), fill).unwrap(),
            Publish::Written(_)
        ));
    }

    let stop = TerminationFlag::detached();
    let blocked = {
        let names = names.clone();
        thread::spawn(move || {
            let ring = RingBuffer::attach(&names).expect("attach");
            ring.publish(&tagged(1, 0), stop).unwrap()
        })
    };
    thread::sleep(Duration::from_millis(150));
    assert!(!blocked.is_finished());
    stop.set();
    assert_eq!(blocked.join().unwrap(), Publish::Interrupted);

    // The write mutex was released on the way out.
    assert_eq!(ring.state(), RegionState::Running);
    ring.consumer().recv(fill).unwrap().expect("candidate");
    assert!(matches!(
        ring.publish(&tagged(2, 0), fill).unwrap(),
        Publish::Written(0)
    ));
}
