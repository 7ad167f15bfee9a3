// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2025 Daniel Negri
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Concurrency tests for the ticket registry.
//!
//! Many threads hit one shared registry while parking_lot's deadlock
//! detector (enabled through the `deadlock_detection` dev feature) watches
//! the lock graph.

use crossbeam::channel;
use parking_lot::deadlock;
use rust_decimal_macros::dec;
use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;
use train_ticket_rs::{
    PurchaseOutcome, PurchaseRequest, RegistryConfig, RegistryError, Seat, Section,
    TicketRegistry, User,
};

fn make_request(i: usize) -> PurchaseRequest {
    PurchaseRequest::new(
        "CityX",
        "CityY",
        User::new("Concurrent", "User", format!("user_{i}@example.com")),
        dec!(25.0),
    )
}

// === Deadlock Detection Infrastructure ===

/// Starts a background thread that checks for deadlocks.
/// Returns a handle to stop the detector.
fn start_deadlock_detector() -> Arc<AtomicBool> {
    let running = Arc::new(AtomicBool::new(true));
    let running_clone = running.clone();

    thread::spawn(move || {
        while running_clone.load(Ordering::SeqCst) {
            thread::sleep(Duration::from_millis(100));
            let deadlocks = deadlock::check_deadlock();
            if !deadlocks.is_empty() {
                eprintln!("\n=== DEADLOCK DETECTED ===");
                for (i, threads) in deadlocks.iter().enumerate() {
                    eprintln!("\nDeadlock #{}", i + 1);
                    for t in threads {
                        eprintln!("Thread ID: {:?}", t.thread_id());
                        eprintln!("Backtrace:\n{:#?}", t.backtrace());
                    }
                }
                panic!("Deadlock detected! See output above for details.");
            }
        }
    });

    running
}

/// Stops the deadlock detector.
fn stop_deadlock_detector(running: Arc<AtomicBool>) {
    running.store(false, Ordering::SeqCst);
    thread::sleep(Duration::from_millis(150));
}

// === Tests ===

/// More buyers than seats: exactly `capacity` succeed, all on distinct seats.
#[test]
fn concurrent_purchases_never_share_a_seat() {
    let detector = start_deadlock_detector();
    let registry = Arc::new(TicketRegistry::default());

    const NUM_BUYERS: usize = 12;
    let capacity = 10;

    let (tx, rx) = channel::unbounded();
    let mut handles = Vec::with_capacity(NUM_BUYERS);

    for i in 0..NUM_BUYERS {
        let registry = registry.clone();
        let tx = tx.clone();
        handles.push(thread::spawn(move || {
            tx.send(registry.purchase_ticket(make_request(i))).unwrap();
        }));
    }
    drop(tx);

    for handle in handles {
        handle.join().expect("Thread panicked");
    }
    stop_deadlock_detector(detector);

    let mut seats = HashSet::new();
    let mut sold_out = 0;
    for result in rx.iter() {
        match result.expect("no system errors expected") {
            PurchaseOutcome::Purchased(receipt) => {
                assert!(seats.insert(receipt.seat), "seat {} allocated twice", receipt.seat);
            }
            outcome @ PurchaseOutcome::SoldOut => {
                assert_eq!(outcome.message(), "no available seats on the train");
                sold_out += 1;
            }
        }
    }

    assert_eq!(seats.len(), capacity);
    assert_eq!(sold_out, NUM_BUYERS - capacity);
    assert_eq!(registry.available_seats().unwrap(), 0);
}

/// Large buyer pool against a larger train.
#[test]
fn heavy_contention_fills_train_exactly() {
    let detector = start_deadlock_detector();
    let config = RegistryConfig::empty()
        .with_capacity(Section::A, 40)
        .with_capacity(Section::B, 40)
        .with_capacity(Section::C, 20);
    let registry = Arc::new(TicketRegistry::new(config));

    const NUM_THREADS: usize = 20;
    const ATTEMPTS_PER_THREAD: usize = 10;

    let (tx, rx) = channel::unbounded();
    let mut handles = Vec::with_capacity(NUM_THREADS);

    for thread_id in 0..NUM_THREADS {
        let registry = registry.clone();
        let tx = tx.clone();
        handles.push(thread::spawn(move || {
            for i in 0..ATTEMPTS_PER_THREAD {
                let outcome = registry
                    .purchase_ticket(make_request(thread_id * ATTEMPTS_PER_THREAD + i))
                    .unwrap();
                if let Some(receipt) = outcome.into_receipt() {
                    tx.send(receipt.seat).unwrap();
                }
            }
        }));
    }
    drop(tx);

    for handle in handles {
        handle.join().expect("Thread panicked");
    }
    stop_deadlock_detector(detector);

    let seats: Vec<Seat> = rx.iter().collect();
    let unique: HashSet<Seat> = seats.iter().copied().collect();
    assert_eq!(seats.len(), 100);
    assert_eq!(unique.len(), 100);
    assert_eq!(registry.occupied_seats(Section::C).unwrap(), 20);
}

/// Purchases, removals, moves and reads interleaved across threads.
#[test]
fn mixed_operations_keep_indexes_consistent() {
    let detector = start_deadlock_detector();
    let registry = Arc::new(TicketRegistry::default());

    const NUM_THREADS: usize = 8;
    const OPS_PER_THREAD: usize = 200;

    let mut handles = Vec::with_capacity(NUM_THREADS);

    for thread_id in 0..NUM_THREADS {
        let registry = registry.clone();
        handles.push(thread::spawn(move || {
            let email = format!("worker_{thread_id}@example.com");
            for i in 0..OPS_PER_THREAD {
                match i % 4 {
                    0 => {
                        let _ = registry.purchase_ticket(make_request(thread_id)).unwrap();
                    }
                    1 => {
                        let target = Seat::new(Section::ALL[(i / 4) % 2], ((i / 8) % 5 + 1) as u16);
                        if let Some(receipt) = registry
                            .get_users_by_section(Section::A)
                            .unwrap()
                            .holders
                            .first()
                            .and_then(|h| {
                                registry
                                    .receipts()
                                    .unwrap()
                                    .into_iter()
                                    .find(|r| r.seat == h.seat)
                            })
                        {
                            let _ = registry.modify_user_seat(&receipt, target).unwrap();
                        }
                    }
                    2 => {
                        let _ = registry.get_users_by_section(Section::B).unwrap();
                        let _ = registry.available_seats().unwrap();
                    }
                    _ => {
                        let _ = registry.remove_user(&email).unwrap();
                        let _ = registry
                            .remove_user(&format!("user_{thread_id}@example.com"))
                            .unwrap();
                    }
                }
            }
        }));
    }

    for handle in handles {
        handle.join().expect("Thread panicked");
    }
    stop_deadlock_detector(detector);

    let receipts = registry.receipts().unwrap();
    let seats: HashSet<Seat> = receipts.iter().map(|r| r.seat).collect();
    assert_eq!(seats.len(), receipts.len());
    assert_eq!(registry.available_seats().unwrap(), 10 - receipts.len());
    for receipt in &receipts {
        assert_eq!(
            registry.get_receipt_details(&receipt.ticket_id).unwrap().seat,
            receipt.seat
        );
    }
}

/// Two tickets racing for the same free seat: exactly one wins.
#[test]
fn racing_seat_changes_have_one_winner() {
    for _ in 0..50 {
        let registry = Arc::new(TicketRegistry::default());
        let first = registry
            .purchase_ticket(make_request(1))
            .unwrap()
            .into_receipt()
            .unwrap();
        let second = registry
            .purchase_ticket(make_request(2))
            .unwrap()
            .into_receipt()
            .unwrap();
        let target = Seat::new(Section::B, 5);

        let handles: Vec<_> = [first.clone(), second.clone()]
            .into_iter()
            .map(|receipt| {
                let registry = registry.clone();
                thread::spawn(move || registry.modify_user_seat(&receipt, target).unwrap())
            })
            .collect();

        let wins = handles
            .into_iter()
            .map(|h| h.join().expect("Thread panicked"))
            .filter(|outcome| outcome.is_success())
            .count();
        assert_eq!(wins, 1);

        let holders = registry.get_users_by_section(Section::B).unwrap();
        assert_eq!(holders.len(), 1);
        assert_eq!(holders.holders[0].seat, target);
    }
}

/// A registry with a lock deadline still serves callers under load and never
/// leaves partial state behind when a caller gives up.
#[test]
fn lock_timeout_never_corrupts_state() {
    let registry = Arc::new(TicketRegistry::new(
        RegistryConfig::default().with_lock_timeout(Duration::from_millis(1)),
    ));

    let handles: Vec<_> = (0..16)
        .map(|i| {
            let registry = registry.clone();
            thread::spawn(move || {
                let mut timeouts = 0;
                for _ in 0..50 {
                    match registry.purchase_ticket(make_request(i)) {
                        Ok(_) => {}
                        Err(RegistryError::LockTimeout(_)) => timeouts += 1,
                        Err(e) => panic!("unexpected error: {e}"),
                    }
                    let _ = registry.remove_user(&format!("user_{i}@example.com"));
                }
                timeouts
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("Thread panicked");
    }

    let receipts = loop {
        match registry.receipts() {
            Ok(receipts) => break receipts,
            Err(RegistryError::LockTimeout(_)) => continue,
            Err(e) => panic!("unexpected error: {e}"),
        }
    };
    let seats: HashSet<Seat> = receipts.iter().map(|r| r.seat).collect();
    assert_eq!(seats.len(), receipts.len());
    assert!(receipts.len() <= 10);
}

/// Async callers offloading to blocking threads, as a transport adapter would.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn async_callers_share_registry() {
    let registry = Arc::new(TicketRegistry::new(
        RegistryConfig::empty().with_capacity(Section::A, 3),
    ));

    let tasks = (0..8).map(|i| {
        let registry = registry.clone();
        tokio::task::spawn_blocking(move || registry.purchase_ticket(make_request(i)))
    });
    let results = futures::future::join_all(tasks).await;

    let purchased = results
        .into_iter()
        .map(|joined| joined.expect("task panicked").expect("system error"))
        .filter(PurchaseOutcome::is_success)
        .count();
    assert_eq!(purchased, 3);
    assert_eq!(registry.receipt_count().unwrap(), 3);
}
