mod support;

use std::collections::HashSet;
use std::sync::{Arc, Barrier};
use std::thread;

use assert_cmd::Command;
use support::TestEnv;

/// Concurrent creates for one owner must never hand out the same
/// sequence number: allocation is serialized behind the owner's store
/// lock with the counter as the single source of truth.
#[test]
fn parallel_adds_get_unique_sequence_numbers() {
    let env = TestEnv::new();
    let data_dir = env.path().to_path_buf();

    let writers = 8;
    let barrier = Arc::new(Barrier::new(writers));
    let mut handles = Vec::with_capacity(writers);

    for idx in 0..writers {
        let barrier = Arc::clone(&barrier);
        let data_dir = data_dir.clone();

        handles.push(thread::spawn(move || {
            barrier.wait();
            Command::cargo_bin("tally")
                .expect("tally binary")
                .env("TALLY_DATA_DIR", &data_dir)
                .env_remove("TALLY_CONFIG")
                .args([
                    "--owner",
                    "alice",
                    "add",
                    &format!("task {idx}"),
                    "--start",
                    "2024-01-01T00:00:00Z",
                    "--end",
                    "2024-01-01T06:00:00Z",
                ])
                .assert()
                .success();
        }));
    }

    for handle in handles {
        handle.join().expect("writer thread");
    }

    let tasks = env.read_tasks("alice");
    assert_eq!(tasks.len(), writers);

    let seqs: HashSet<u64> = tasks
        .iter()
        .map(|task| task["seq"].as_u64().expect("seq"))
        .collect();
    assert_eq!(seqs.len(), writers, "duplicate sequence numbers: {tasks:?}");
    assert_eq!(*seqs.iter().max().unwrap(), writers as u64);
    assert_eq!(*seqs.iter().min().unwrap(), 1);
}
