//! Bounded FIFO between logging threads and the delivery worker
//!
//! Producers block while the queue is full, the single consumer blocks while
//! it is empty. Shutdown wakes everyone; the consumer keeps popping until the
//! queue is empty and only then sees `None`.
//!
//! Besides the queued items the queue tracks items that were popped but not
//! yet marked complete, so [`DeliveryQueue::wait_drained`] returns only after
//! the consumer has finished writing everything handed to it.

use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;

/// Returned by [`DeliveryQueue::push`] once the queue has been shut down.
///
/// Carries the rejected item back so the caller can deliver it another way.
#[derive(Debug)]
pub struct Stopped<T>(pub T);

/// Outcome of a successful push.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pushed {
    /// The producer had to wait for free space
    pub waited: bool,
}

struct QueueState<T> {
    items: VecDeque<T>,
    in_flight: usize,
    shutdown: bool,
}

impl<T> QueueState<T> {
    fn is_drained(&self) -> bool {
        self.items.is_empty() && self.in_flight == 0
    }
}

/// Bounded multi-producer, single-consumer queue
///
/// # Examples
///
/// ```
/// use rust_cascade_logger::core::DeliveryQueue;
///
/// let queue = DeliveryQueue::new(4);
/// queue.push("a").unwrap();
/// queue.push("b").unwrap();
///
/// assert_eq!(queue.pop(), Some("a"));
/// queue.complete();
/// assert_eq!(queue.len(), 1);
/// ```
pub struct DeliveryQueue<T> {
    state: Mutex<QueueState<T>>,
    not_empty: Condvar,
    not_full: Condvar,
    drained: Condvar,
    capacity: usize,
}

impl<T> DeliveryQueue<T> {
    /// Create a queue holding at most `capacity` items (at least one).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            state: Mutex::new(QueueState {
                items: VecDeque::with_capacity(capacity.min(1024)),
                in_flight: 0,
                shutdown: false,
            }),
            not_empty: Condvar::new(),
            not_full: Condvar::new(),
            drained: Condvar::new(),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Append `item`, waiting for space while the queue is full.
    pub fn push(&self, item: T) -> Result<Pushed, Stopped<T>> {
        let mut state = self.state.lock();
        let mut waited = false;

        while !state.shutdown && state.items.len() >= self.capacity {
            waited = true;
            self.not_full.wait(&mut state);
        }
        if state.shutdown {
            return Err(Stopped(item));
        }

        state.items.push_back(item);
        drop(state);
        self.not_empty.notify_one();
        Ok(Pushed { waited })
    }

    /// Take the oldest item, waiting while the queue is empty.
    ///
    /// Returns `None` once the queue is shut down and empty. Every item
    /// returned must be followed by a call to [`complete`](Self::complete).
    pub fn pop(&self) -> Option<T> {
        let mut state = self.state.lock();
        loop {
            if let Some(item) = state.items.pop_front() {
                state.in_flight += 1;
                drop(state);
                self.not_full.notify_one();
                return Some(item);
            }
            if state.shutdown {
                return None;
            }
            self.not_empty.wait(&mut state);
        }
    }

    /// Mark one popped item as fully handled.
    pub fn complete(&self) {
        let mut state = self.state.lock();
        state.in_flight = state.in_flight.saturating_sub(1);
        if state.is_drained() {
            self.drained.notify_all();
        }
    }

    /// Block until every pushed item has been popped and completed.
    pub fn wait_drained(&self) {
        let mut state = self.state.lock();
        while !state.is_drained() {
            self.drained.wait(&mut state);
        }
    }

    /// Refuse further pushes and wake all waiting threads.
    ///
    /// Items already queued stay available to [`pop`](Self::pop).
    pub fn shutdown(&self) {
        let mut state = self.state.lock();
        state.shutdown = true;
        drop(state);
        self.not_empty.notify_all();
        self.not_full.notify_all();
    }

    pub fn is_shutdown(&self) -> bool {
        self.state.lock().shutdown
    }

    /// Items waiting to be popped.
    pub fn len(&self) -> usize {
        self.state.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop whatever is still queued and release the drain waiters.
    ///
    /// Used when the consumer is gone and the items can no longer be delivered.
    pub(crate) fn take_remaining(&self) -> Vec<T> {
        let mut state = self.state.lock();
        let remaining: Vec<T> = state.items.drain(..).collect();
        state.in_flight = 0;
        drop(state);
        self.drained.notify_all();
        self.not_full.notify_all();
        remaining
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_fifo_order() {
        let queue = DeliveryQueue::new(8);
        for i in 0..5 {
            queue.push(i).unwrap();
        }
        let popped: Vec<i32> = (0..5)
            .map(|_| {
                let item = queue.pop().unwrap();
                queue.complete();
                item
            })
            .collect();
        assert_eq!(popped, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_push_after_shutdown_returns_item() {
        let queue = DeliveryQueue::new(2);
        queue.shutdown();
        let Stopped(item) = queue.push("late").unwrap_err();
        assert_eq!(item, "late");
    }

    #[test]
    fn test_shutdown_drains_before_none() {
        let queue = DeliveryQueue::new(4);
        queue.push(1).unwrap();
        queue.push(2).unwrap();
        queue.shutdown();

        assert_eq!(queue.pop(), Some(1));
        assert_eq!(queue.pop(), Some(2));
        assert_eq!(queue.pop(), None);
    }

    #[test]
    fn test_shutdown_wakes_idle_consumer() {
        let queue = Arc::new(DeliveryQueue::<u32>::new(4));
        let consumer = {
            let queue = Arc::clone(&queue);
            thread::spawn(move || queue.pop())
        };

        thread::sleep(Duration::from_millis(20));
        queue.shutdown();
        assert_eq!(consumer.join().unwrap(), None);
    }

    #[test]
    fn test_full_queue_blocks_producer() {
        let queue = Arc::new(DeliveryQueue::new(1));
        queue.push(0).unwrap();

        let producer = {
            let queue = Arc::clone(&queue);
            thread::spawn(move || queue.push(1).unwrap())
        };

        thread::sleep(Duration::from_millis(20));
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.pop(), Some(0));
        queue.complete();

        let pushed = producer.join().unwrap();
        assert!(pushed.waited);
        assert_eq!(queue.pop(), Some(1));
        queue.complete();
    }

    #[test]
    fn test_wait_drained_waits_for_completion() {
        let queue = Arc::new(DeliveryQueue::new(4));
        queue.push(7).unwrap();

        let consumer = {
            let queue = Arc::clone(&queue);
            thread::spawn(move || {
                let item = queue.pop().unwrap();
                thread::sleep(Duration::from_millis(30));
                queue.complete();
                item
            })
        };

        queue.wait_drained();
        assert!(queue.is_empty());
        assert_eq!(consumer.join().unwrap(), 7);
    }

    #[test]
    fn test_zero_capacity_is_clamped() {
        let queue = DeliveryQueue::new(0);
        assert_eq!(queue.capacity(), 1);
        queue.push(()).unwrap();
    }

    #[test]
    fn test_take_remaining() {
        let queue = DeliveryQueue::new(4);
        queue.push('a').unwrap();
        queue.push('b').unwrap();
        queue.shutdown();
        assert_eq!(queue.take_remaining(), vec!['a', 'b']);
        queue.wait_drained();
    }
}
