use std::collections::{HashSet, VecDeque};
use std::hash::Hash;

/// First-in first-out queue which ignores items that are already queued
///
/// Single threaded: an analysis owns its worklist for the whole run.
#[derive(Debug)]
pub struct Worklist<T> {
    queue: VecDeque<T>,
    queued: HashSet<T>,
}

impl<T: Copy + Eq + Hash> Worklist<T> {
    pub fn new() -> Self {
        Worklist {
            queue: VecDeque::new(),
            queued: HashSet::new(),
        }
    }

    /// Enqueue an item, returning `false` if it was already queued
    pub fn push(&mut self, item: T) -> bool {
        let is_new = self.queued.insert(item);
        if is_new {
            self.queue.push_back(item);
        }
        is_new
    }

    pub fn pop(&mut self) -> Option<T> {
        let item = self.queue.pop_front()?;
        self.queued.remove(&item);
        Some(item)
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }
}

impl<T: Copy + Eq + Hash> Default for Worklist<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Copy + Eq + Hash> Extend<T> for Worklist<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, items: I) {
        for item in items {
            self.push(item);
        }
    }
}
