//! Bounded, mutex-guarded FIFO of logical events.
//!
//! The sole channel from the event source to its consumers; everything
//! else the two threads might touch is either thread-local or an atomic
//! flag.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Condvar, Mutex};

use crate::event::Event;

pub struct EventQueue {
    capacity: usize,
    inner: Mutex<VecDeque<Event>>,
    not_empty: Condvar,
    stopped: AtomicBool,
}

impl EventQueue {
    pub fn new(capacity: usize) -> Self {
        EventQueue {
            capacity: capacity.max(1),
            inner: Mutex::new(VecDeque::new()),
            not_empty: Condvar::new(),
            stopped: AtomicBool::new(false),
        }
    }

    /// Pushes an event, blocking the producer while the queue is full. A
    /// concurrent `stop()` wakes a blocked producer without enqueuing.
    pub fn enqueue(&self, event: Event) {
        let mut guard = self.inner.lock().unwrap();
        while guard.len() >= self.capacity && !self.stopped.load(Ordering::Acquire) {
            guard = self.not_empty.wait(guard).unwrap();
        }

        if self.stopped.load(Ordering::Acquire) {
            return;
        }

        guard.push_back(event);
        self.not_empty.notify_one();
    }

    /// Blocks until an event is available or the queue is stopped, then
    /// returns it. Returns `Event::none()` immediately (without blocking
    /// again) once stopped and drained.
    pub fn dequeue_blocking(&self) -> Event {
        let mut guard = self.inner.lock().unwrap();
        loop {
            if let Some(event) = guard.pop_front() {
                self.not_empty.notify_one();
                return event;
            }

            if self.stopped.load(Ordering::Acquire) {
                return Event::none();
            }

            guard = self.not_empty.wait(guard).unwrap();
        }
    }

    /// Signals the shutdown flag and wakes every waiter — `Condvar::notify_all`
    /// already wakes everyone blocked at the time of the call.
    pub fn stop(&self) {
        self.stopped.store(true, Ordering::Release);
        let _guard = self.inner.lock().unwrap();
        self.not_empty.notify_all();
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().len()
    }
}
