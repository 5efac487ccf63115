use std::collections::HashSet;
use std::sync::Arc;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use super::Queue;

#[test]
fn test_queue_new_is_empty() {
    let q: Queue<u32> = Queue::new();
    assert!(q.is_empty());
    assert_eq!(q.len(), 0);
    assert!(!q.is_closed());
    assert_eq!(q.try_pop(), None);
}

#[test]
fn test_queue_is_fifo() {
    let q = Queue::new();
    for i in 0..5 {
        q.push(i);
    }
    assert_eq!(q.len(), 5);
    for i in 0..5 {
        assert_eq!(q.pop(), Some(i));
    }
    assert!(q.is_empty());
}

#[test]
fn test_pop_blocks_until_push() {
    let q = Arc::new(Queue::new());
    let (tx, rx) = mpsc::channel();

    let consumer = {
        let q = q.clone();
        thread::spawn(move || {
            let item = q.pop();
            tx.send(item).unwrap();
        })
    };

    // The consumer has nothing to pop yet.
    assert!(rx.recv_timeout(Duration::from_millis(100)).is_err());

    q.push("ping".to_string());
    let got = rx.recv_timeout(Duration::from_secs(5)).unwrap();
    assert_eq!(got.as_deref(), Some("ping"));
    consumer.join().unwrap();
    assert!(q.is_empty());
}

#[test]
fn test_multi_producer_delivers_every_item_once_in_order() {
    const PRODUCERS: usize = 8;
    const PER_PRODUCER: usize = 500;

    let q = Arc::new(Queue::new());
    let handles: Vec<_> = (0..PRODUCERS)
        .map(|p| {
            let q = q.clone();
            thread::spawn(move || {
                for i in 0..PER_PRODUCER {
                    q.push((p, i));
                }
            })
        })
        .collect();

    let mut next = vec![0usize; PRODUCERS];
    for _ in 0..PRODUCERS * PER_PRODUCER {
        let (p, i) = q.pop_timeout(Duration::from_secs(5)).expect("item lost");
        assert_eq!(i, next[p], "producer {p} out of order");
        next[p] += 1;
    }
    for h in handles {
        h.join().unwrap();
    }
    assert!(next.iter().all(|&n| n == PER_PRODUCER));
    assert!(q.is_empty());
}

#[test]
fn test_multi_consumer_never_duplicates() {
    const ITEMS: usize = 2_000;
    const CONSUMERS: usize = 4;

    let q = Arc::new(Queue::new());
    let consumers: Vec<_> = (0..CONSUMERS)
        .map(|_| {
            let q = q.clone();
            thread::spawn(move || {
                let mut seen = Vec::new();
                while let Some(item) = q.pop() {
                    seen.push(item);
                }
                seen
            })
        })
        .collect();

    for i in 0..ITEMS {
        q.push(i);
    }
    q.close();

    let mut all = HashSet::new();
    let mut total = 0;
    for c in consumers {
        for item in c.join().unwrap() {
            assert!(all.insert(item), "item {item} delivered twice");
            total += 1;
        }
    }
    assert_eq!(total, ITEMS);
}

#[test]
fn test_close_unblocks_waiting_consumer() {
    let q: Arc<Queue<u8>> = Arc::new(Queue::new());
    let consumer = {
        let q = q.clone();
        thread::spawn(move || q.pop())
    };
    thread::sleep(Duration::from_millis(50));
    q.close();
    assert_eq!(consumer.join().unwrap(), None);
    assert!(q.is_closed());
}

#[test]
fn test_closed_queue_drains_remaining_items() {
    let q = Queue::new();
    q.push(1);
    q.push(2);
    q.close();
    q.push(3);
    assert_eq!(q.pop(), Some(1));
    assert_eq!(q.pop(), Some(2));
    assert_eq!(q.pop(), Some(3));
    assert_eq!(q.pop(), None);
}

#[test]
fn test_pop_timeout_expires_on_empty_queue() {
    let q: Queue<u8> = Queue::new();
    assert_eq!(q.pop_timeout(Duration::from_millis(20)), None);
    q.push(7);
    assert_eq!(q.pop_timeout(Duration::from_millis(20)), Some(7));
}
