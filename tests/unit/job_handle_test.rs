//! Tests for job handles used from several threads

use sage_jobs::core::JobHandle;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

#[test]
fn test_completed_handle() {
    let handle = JobHandle::completed();
    assert!(handle.is_complete());
    assert_eq!(handle.pending(), 0);
    handle.wait();
}

#[test]
fn test_default_is_pending() {
    let handle = JobHandle::default();
    assert_eq!(handle.pending(), 1);
    assert!(!handle.wait_timeout(Duration::from_millis(5)));
}

#[test]
fn test_many_threads_complete_one_handle() {
    let handle = JobHandle::new();
    for _ in 0..16 {
        handle.add_dependency();
    }

    let threads: Vec<_> = (0..16)
        .map(|_| {
            let handle = handle.clone();
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(2));
                handle.complete();
            })
        })
        .collect();

    // The pending bias holds the handle open until released here.
    for t in threads {
        t.join().unwrap();
    }
    assert_eq!(handle.pending(), 1);
    handle.complete();
    handle.wait();
    assert!(handle.is_complete());
}

#[test]
fn test_many_waiters_all_wake() {
    let handle = JobHandle::new();
    let woke = Arc::new(AtomicUsize::new(0));

    let waiters: Vec<_> = (0..8)
        .map(|_| {
            let handle = handle.clone();
            let woke = Arc::clone(&woke);
            thread::spawn(move || {
                handle.wait();
                woke.fetch_add(1, Ordering::SeqCst);
            })
        })
        .collect();

    thread::sleep(Duration::from_millis(20));
    assert_eq!(woke.load(Ordering::SeqCst), 0);

    handle.complete();
    for w in waiters {
        w.join().unwrap();
    }
    assert_eq!(woke.load(Ordering::SeqCst), 8);
}

#[test]
fn test_when_all_with_completed_inputs() {
    let done = JobHandle::completed();
    let pending = JobHandle::new();
    let merged = JobHandle::when_all(&[done, pending.clone()]);

    assert!(!merged.is_complete());
    pending.complete();
    assert!(merged.is_complete());
}

#[test]
fn test_continuation_runs_on_completing_thread() {
    let handle = JobHandle::new();
    let (tx, rx) = crossbeam_channel::bounded(1);
    handle.on_complete(move || {
        tx.send(thread::current().name().map(str::to_string)).unwrap();
    });

    let remote = handle.clone();
    thread::Builder::new()
        .name("completer".into())
        .spawn(move || remote.complete())
        .unwrap()
        .join()
        .unwrap();

    assert_eq!(rx.recv().unwrap().as_deref(), Some("completer"));
}
