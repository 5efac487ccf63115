use std::io::ErrorKind;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use super::{Backoff, MessageQueue, SENTINEL, ShutdownSignal, State, signal};
use crate::request::{Method, Request};
use crate::utils::MqError;

fn engine(name: &str) -> MessageQueue {
    MessageQueue::create(name, "127.0.0.1", 9621).expect("create engine")
}

fn drain_outgoing(mq: &MessageQueue) -> Vec<Request> {
    let mut out = Vec::new();
    while let Some(r) = mq.shared().outgoing.try_pop() {
        out.push(r);
    }
    out
}

#[test]
fn test_create_queues_sentinel_subscription() {
    let mq = engine("alice");
    assert_eq!(mq.state(), State::Created);
    assert_eq!(mq.name(), "alice");
    assert_eq!(mq.host(), "127.0.0.1");
    assert_eq!(mq.port(), 9621);
    assert!(!mq.is_shutdown());

    let queued = drain_outgoing(&mq);
    assert_eq!(queued, vec![Request::subscribe("alice", SENTINEL).unwrap()]);
}

#[test]
fn test_create_rejects_bad_name() {
    for name in ["", "al ice", "a/b", "tab\t"] {
        let err = MessageQueue::create(name, "127.0.0.1", 9621).unwrap_err();
        assert!(matches!(err, MqError::InvalidName(_)), "{name:?}");
    }
}

#[test]
fn test_create_rejects_bad_address() {
    let err = MessageQueue::create("alice", "127.0.0.1", 0).unwrap_err();
    assert!(matches!(err, MqError::InvalidAddress { .. }));

    let err = MessageQueue::create("alice", "no such host", 9621).unwrap_err();
    assert!(matches!(err, MqError::InvalidAddress { .. }));
}

#[test]
fn test_publish_builds_exact_request() {
    let mq = engine("alice");
    drain_outgoing(&mq);

    mq.publish("general", "hello there").unwrap();
    let queued = drain_outgoing(&mq);
    assert_eq!(queued.len(), 1);
    let req = &queued[0];
    assert_eq!(req.method(), Method::Put);
    assert_eq!(req.resource(), "/topic/general");
    assert_eq!(req.body(), Some("alice general hello there"));
}

#[test]
fn test_subscribe_and_unsubscribe_are_not_deduplicated() {
    let mq = engine("bob");
    drain_outgoing(&mq);

    mq.subscribe("news").unwrap();
    mq.subscribe("news").unwrap();
    mq.unsubscribe("news").unwrap();

    let queued = drain_outgoing(&mq);
    assert_eq!(
        queued,
        vec![
            Request::subscribe("bob", "news").unwrap(),
            Request::subscribe("bob", "news").unwrap(),
            Request::unsubscribe("bob", "news").unwrap(),
        ]
    );
    assert_eq!(queued[2].method(), Method::Delete);
    assert_eq!(queued[2].resource(), "/subscription/bob/news");
}

#[test]
fn test_invalid_topic_is_rejected_and_not_queued() {
    let mq = engine("bob");
    drain_outgoing(&mq);

    assert!(matches!(mq.publish("two words", "x"), Err(MqError::InvalidTopic(_))));
    assert!(matches!(mq.subscribe(""), Err(MqError::InvalidTopic(_))));
    assert!(matches!(mq.unsubscribe("a/b"), Err(MqError::InvalidTopic(_))));
    assert!(drain_outgoing(&mq).is_empty());
}

#[test]
fn test_retrieve_absorbs_sentinel() {
    let mq = engine("alice");
    let mut sentinel = Request::poll("alice").unwrap();
    sentinel.set_body(SENTINEL.to_string());
    let mut real = Request::poll("alice").unwrap();
    real.set_body("bob general hi".to_string());

    mq.shared().incoming.push(sentinel);
    mq.shared().incoming.push(real);

    assert_eq!(mq.retrieve(), None);
    assert_eq!(mq.retrieve().as_deref(), Some("bob general hi"));
    assert_eq!(mq.try_retrieve(), None);
}

#[test]
fn test_retrieve_keeps_bodies_that_only_contain_sentinel() {
    let mq = engine("alice");
    let mut msg = Request::poll("alice").unwrap();
    msg.set_body(format!("bob {SENTINEL} {SENTINEL}"));
    mq.shared().incoming.push(msg);
    assert_eq!(
        mq.retrieve_timeout(Duration::from_millis(10)).as_deref(),
        Some("bob SHUTDOWN SHUTDOWN")
    );
}

#[test]
fn test_stop_without_start_unblocks_retrieve() {
    let mq = Arc::new(engine("alice"));
    let waiter = {
        let mq = mq.clone();
        thread::spawn(move || mq.retrieve())
    };
    thread::sleep(Duration::from_millis(50));

    mq.stop().unwrap();
    assert_eq!(waiter.join().unwrap(), None);
    assert_eq!(mq.state(), State::Stopped);
    assert!(mq.is_shutdown());

    // Stopping twice is harmless, restarting is not allowed.
    mq.stop().unwrap();
    assert!(matches!(
        mq.start(),
        Err(MqError::InvalidState {
            operation: "start",
            state: State::Stopped
        })
    ));
}

#[test]
fn test_shutdown_signal_wakes_sleeper() {
    let signal = Arc::new(ShutdownSignal::new());
    assert!(!signal.wait_timeout(Duration::from_millis(10)));

    let sleeper = {
        let signal = signal.clone();
        thread::spawn(move || {
            let started = Instant::now();
            let triggered = signal.wait_timeout(Duration::from_secs(30));
            (triggered, started.elapsed())
        })
    };
    thread::sleep(Duration::from_millis(50));
    signal.trigger();

    let (triggered, waited) = sleeper.join().unwrap();
    assert!(triggered);
    assert!(waited < Duration::from_secs(10));
    assert!(signal.is_triggered());
}

#[test]
fn test_backoff_grows_and_caps() {
    let backoff = Backoff::new(
        Duration::from_millis(50),
        Duration::from_millis(300),
        2.0,
        3,
    );
    assert_eq!(backoff.delay(0), Duration::from_millis(50));
    assert_eq!(backoff.delay(1), Duration::from_millis(100));
    assert_eq!(backoff.delay(2), Duration::from_millis(200));
    assert_eq!(backoff.delay(3), Duration::from_millis(300));
    assert_eq!(backoff.delay(u32::MAX), Duration::from_millis(300));

    assert!(!backoff.should_warn(0));
    assert!(!backoff.should_warn(2));
    assert!(backoff.should_warn(3));
    assert!(backoff.should_warn(6));
}

#[test]
fn test_backoff_clamps_shrinking_multiplier() {
    let backoff = Backoff::new(Duration::from_millis(10), Duration::from_secs(1), 0.5, 0);
    assert_eq!(backoff.delay(4), Duration::from_millis(10));
    assert!(!backoff.should_warn(10));
}

#[test]
fn test_readiness_fires_once_per_notification() {
    let (notifier, readiness) = signal::channel().unwrap();
    notifier.notify().unwrap();
    notifier.notify().unwrap();

    readiness.consume().unwrap();
    readiness.consume().unwrap();

    readiness.set_nonblocking(true).unwrap();
    let err = readiness.consume().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::WouldBlock);
}

#[test]
fn test_readiness_reports_closed_writer() {
    let (notifier, readiness) = signal::channel().unwrap();
    drop(notifier);
    let err = readiness.consume().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnexpectedEof);
}

#[test]
fn test_notify_never_blocks_on_full_pipe() {
    let (notifier, readiness) = signal::channel().unwrap();
    let (tx, rx) = std::sync::mpsc::channel();
    let writer = thread::spawn(move || {
        for _ in 0..100_000 {
            notifier.notify().unwrap();
        }
        let _ = tx.send(());
        notifier
    });
    rx.recv_timeout(Duration::from_secs(10))
        .expect("notify blocked on a full pipe");
    let _notifier = writer.join().unwrap();

    // Pending signals are still readable after the overflow.
    readiness.set_nonblocking(true).unwrap();
    readiness.consume().unwrap();
}
