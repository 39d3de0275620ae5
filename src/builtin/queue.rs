use std::collections::vec_deque;
use std::collections::VecDeque;

use crate::error::{BfmError, Result};

/// Strict FIFO with an optional capacity bound.
///
/// There is no eviction: enqueueing into a full bounded queue, or dequeueing/peeking an empty
/// one, is an error the caller is expected to propagate as fatal.
#[derive(Debug, Clone)]
pub struct BoundedQueue<T> {
    name: String,
    storage: VecDeque<T>,
    capacity: Option<usize>,
}

impl<T> BoundedQueue<T> {
    pub fn new(capacity: Option<usize>, label: Option<&str>) -> Self {
        if let Some(capacity) = capacity {
            assert!(capacity > 0, "the capacity of the queue should be greater than zero");
        }
        let name = match label {
            Some(label) => format!("{label}_queue"),
            None => "queue".to_string(),
        };
        Self {
            name,
            storage: VecDeque::with_capacity(capacity.unwrap_or(0)),
            capacity,
        }
    }

    pub fn bounded(capacity: usize, label: &str) -> Self {
        Self::new(Some(capacity), Some(label))
    }

    pub fn unbounded(label: &str) -> Self {
        Self::new(None, Some(label))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.storage.len()
    }

    pub fn is_empty(&self) -> bool {
        self.storage.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.capacity.is_some_and(|cap| self.storage.len() >= cap)
    }

    pub fn enq(&mut self, item: T) -> Result<()> {
        if let Some(capacity) = self.capacity.filter(|_| self.is_full()) {
            return Err(BfmError::QueueFull {
                queue: self.name.clone(),
                capacity,
            });
        }
        self.storage.push_back(item);
        Ok(())
    }

    pub fn deq(&mut self) -> Result<T> {
        self.storage
            .pop_front()
            .ok_or_else(|| self.empty_error("deq"))
    }

    pub fn peek(&self) -> Result<&T> {
        self.storage.front().ok_or_else(|| self.empty_error("peek"))
    }

    pub fn peek_mut(&mut self) -> Result<&mut T> {
        if self.storage.is_empty() {
            return Err(self.empty_error("peek"));
        }
        Ok(&mut self.storage[0])
    }

    pub fn back(&self) -> Result<&T> {
        self.storage.back().ok_or_else(|| self.empty_error("back"))
    }

    pub fn iter(&self) -> vec_deque::Iter<'_, T> {
        self.storage.iter()
    }

    pub fn iter_mut(&mut self) -> vec_deque::IterMut<'_, T> {
        self.storage.iter_mut()
    }

    pub fn clear(&mut self) {
        self.storage.clear();
    }

    fn empty_error(&self, op: &'static str) -> BfmError {
        BfmError::QueueEmpty {
            queue: self.name.clone(),
            op,
        }
    }
}
