// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Blocking FIFO queue that hands ownership of items between threads.
//!
//! A prefetch pipeline owns two of these: one holding free slots for the worker, one
//! holding filled slots for the consumer. Items are boxed batches, so moving one through
//! the queue moves a pointer, never the data.
//!
//! # Examples
//!
//! ```rust
//! use the_stagehand::engine::handoff_queue::HandoffQueue;
//!
//! let queue = HandoffQueue::new("full");
//! queue.push(1);
//! queue.push(2);
//!
//! assert_eq!(queue.pop(), Ok(1));
//! assert_eq!(queue.try_pop(), Some(2));
//! assert_eq!(queue.try_pop(), None);
//!
//! queue.close();
//! assert!(queue.pop().is_err());
//! ```

use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;

use crate::errors::QueueClosed;
use crate::observability::messages::pipeline::WaitingOnQueue;
use crate::observability::messages::StructuredLog;

struct State<I> {
    items: VecDeque<I>,
    closed: bool,
}

/// Unbounded FIFO with blocking pop and a close signal.
///
/// The capacity is bounded in practice by the slot pool the pipeline allocates, so
/// `push` never blocks and never drops. Once closed, every pop fails immediately even if
/// items remain; closing is only used for teardown and fatal failures, where the
/// remaining items are no longer wanted.
pub struct HandoffQueue<I> {
    name: &'static str,
    state: Mutex<State<I>>,
    available: Condvar,
}

impl<I> HandoffQueue<I> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            state: Mutex::new(State {
                items: VecDeque::new(),
                closed: false,
            }),
            available: Condvar::new(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Append to the tail and wake one waiter.
    pub fn push(&self, item: I) {
        self.push_then(item, || {});
    }

    /// Append to the tail, running `on_push` while the queue lock is still held, so
    /// bookkeeping about where items live changes in the same step as the queue.
    pub fn push_then(&self, item: I, on_push: impl FnOnce()) {
        let mut state = self.state.lock();
        state.items.push_back(item);
        on_push();
        drop(state);
        self.available.notify_one();
    }

    /// Block until an item is available and take the head.
    pub fn pop(&self) -> Result<I, QueueClosed> {
        self.pop_then(None, || {})
    }

    /// Like [`pop`](Self::pop), logging `reason` once if the call has to wait.
    pub fn pop_labeled(&self, reason: &str) -> Result<I, QueueClosed> {
        self.pop_then(Some(reason), || {})
    }

    /// Blocking pop that runs `on_pop` under the queue lock once an item is taken.
    /// `on_pop` never runs when the queue is closed.
    pub fn pop_then(&self, reason: Option<&str>, on_pop: impl FnOnce()) -> Result<I, QueueClosed> {
        let mut state = self.state.lock();
        let mut logged = false;
        loop {
            if state.closed {
                return Err(QueueClosed);
            }
            if let Some(item) = state.items.pop_front() {
                on_pop();
                return Ok(item);
            }
            if let (Some(reason), false) = (reason, logged) {
                WaitingOnQueue {
                    queue: self.name,
                    reason,
                }
                .log();
                logged = true;
            }
            self.available.wait(&mut state);
        }
    }

    /// Take the head without waiting.
    pub fn try_pop(&self) -> Option<I> {
        let mut state = self.state.lock();
        if state.closed {
            return None;
        }
        state.items.pop_front()
    }

    /// Wake every waiter and fail all future pops.
    pub fn close(&self) {
        self.state.lock().closed = true;
        self.available.notify_all();
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    pub fn len(&self) -> usize {
        self.state.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
