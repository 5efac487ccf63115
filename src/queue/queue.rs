use std::collections::VecDeque;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

#[derive(Debug)]
struct Inner<T> {
    items: VecDeque<T>,
    closed: bool,
}

/// Unbounded FIFO shared between any number of producers and consumers.
///
/// `push` never blocks. `pop` blocks until an item is available or the queue
/// has been closed and drained. Closing does not discard queued items:
/// consumers keep receiving them until the queue is empty, and only then does
/// `pop` return `None`.
#[derive(Debug)]
pub struct Queue<T> {
    inner: Mutex<Inner<T>>,
    available: Condvar,
}

impl<T> Default for Queue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Queue<T> {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                items: VecDeque::new(),
                closed: false,
            }),
            available: Condvar::new(),
        }
    }

    /// Appends `item` at the tail and wakes one waiting consumer.
    pub fn push(&self, item: T) {
        let mut inner = self.inner.lock();
        inner.items.push_back(item);
        drop(inner);
        self.available.notify_one();
    }

    /// Removes the head, blocking while the queue is empty and open.
    pub fn pop(&self) -> Option<T> {
        let mut inner = self.inner.lock();
        loop {
            if let Some(item) = inner.items.pop_front() {
                return Some(item);
            }
            if inner.closed {
                return None;
            }
            self.available.wait(&mut inner);
        }
    }

    /// Like [`pop`](Self::pop) but gives up after `timeout`.
    pub fn pop_timeout(&self, timeout: Duration) -> Option<T> {
        let deadline = Instant::now() + timeout;
        let mut inner = self.inner.lock();
        loop {
            if let Some(item) = inner.items.pop_front() {
                return Some(item);
            }
            if inner.closed {
                return None;
            }
            if self.available.wait_until(&mut inner, deadline).timed_out() {
                return inner.items.pop_front();
            }
        }
    }

    pub fn try_pop(&self) -> Option<T> {
        self.inner.lock().items.pop_front()
    }

    /// Marks the queue closed and wakes every blocked consumer.
    pub fn close(&self) {
        self.inner.lock().closed = true;
        self.available.notify_all();
    }

    pub fn is_closed(&self) -> bool {
        self.inner.lock().closed
    }

    pub fn len(&self) -> usize {
        self.inner.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().items.is_empty()
    }
}
