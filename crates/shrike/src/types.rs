//! Utility types.

use std::{collections::VecDeque, hash::Hash};

type BuildHasher = std::hash::BuildHasherDefault<rustc_hash::FxHasher>;

/// Insertion-ordered hash map used for every table in this crate, so that
/// iteration order (and thus state numbering and diagnostics) is stable.
pub type Map<K, V> = indexmap::IndexMap<K, V, BuildHasher>;
pub type Set<T> = indexmap::IndexSet<T, BuildHasher>;

/// A FIFO worklist that ignores values which are already waiting in it.
#[derive(Debug)]
pub struct Queue<T> {
    queue: VecDeque<T>,
    pending: Set<T>,
}

impl<T> Default for Queue<T> {
    fn default() -> Self {
        Self {
            queue: VecDeque::new(),
            pending: Set::default(),
        }
    }
}

impl<T> Queue<T>
where
    T: Clone + Eq + Hash,
{
    /// Enqueue `value`, returning `false` if it was already waiting.
    pub fn push(&mut self, value: T) -> bool {
        if self.pending.insert(value.clone()) {
            self.queue.push_back(value);
            true
        } else {
            false
        }
    }

    pub fn pop(&mut self) -> Option<T> {
        let value = self.queue.pop_front()?;
        self.pending.swap_remove(&value);
        Some(value)
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn queue_skips_waiting_values() {
        let mut queue = Queue::default();
        assert!(queue.push(1));
        assert!(queue.push(2));
        assert!(!queue.push(1));
        assert_eq!(queue.len(), 2);

        assert_eq!(queue.pop(), Some(1));
        // once popped, the value may be scheduled again.
        assert!(queue.push(1));
        assert_eq!(queue.pop(), Some(2));
        assert_eq!(queue.pop(), Some(1));
        assert!(queue.is_empty());
    }
}
