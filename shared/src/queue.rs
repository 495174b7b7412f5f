//! Thread-safe inbox for raw command payloads.
//!
//! One I/O task per connection pushes into the queue; the thread that owns
//! the grid model drains it on its own schedule. The queue is the only
//! structure shared between the two domains, and the lock is held just long
//! enough to append or to swap the list out — decoding and model mutation
//! always happen outside it.

use std::sync::Mutex;

#[derive(Default)]
pub struct PendingCommands {
    inner: Mutex<Vec<Vec<u8>>>,
}

impl PendingCommands {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a raw message. Safe to call concurrently with [`drain`](Self::drain).
    pub fn push(&self, raw: Vec<u8>) {
        self.lock().push(raw);
    }

    /// Takes every queued message and leaves the queue empty.
    pub fn drain(&self) -> Vec<Vec<u8>> {
        std::mem::take(&mut *self.lock())
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Vec<u8>>> {
        // A panic while holding the lock leaves the list itself intact.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn drain_returns_messages_in_order_and_clears() {
        let queue = PendingCommands::new();
        queue.push(vec![1]);
        queue.push(vec![2]);
        queue.push(vec![3]);

        assert_eq!(queue.drain(), vec![vec![1], vec![2], vec![3]]);
        assert!(queue.is_empty());
        assert!(queue.drain().is_empty());
    }

    #[test]
    fn concurrent_pushes_are_not_lost() {
        let queue = Arc::new(PendingCommands::new());
        let mut handles = Vec::new();

        for t in 0..4u8 {
            let queue = Arc::clone(&queue);
            handles.push(thread::spawn(move || {
                for i in 0..100u8 {
                    queue.push(vec![t, i]);
                }
            }));
        }

        let mut drained = Vec::new();
        while drained.len() < 400 {
            drained.extend(queue.drain());
        }

        for handle in handles {
            handle.join().unwrap();
        }

        // Per-producer order is preserved even though drains interleave.
        for t in 0..4u8 {
            let seen: Vec<u8> = drained
                .iter()
                .filter(|m| m[0] == t)
                .map(|m| m[1])
                .collect();
            assert_eq!(seen, (0..100u8).collect::<Vec<_>>());
        }
    }
}
