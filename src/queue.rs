//!
//! bounded multi-producer multi-consumer work queue
//!
//! Thin wrapper over a crossbeam bounded channel. Scheduler threads `put`
//! work items, worker threads `take` them, and both sides also have
//! non-blocking variants for drain loops. Handles are cheaply cloneable and
//! can be moved across threads.
//!
use crossbeam_channel::{bounded, Receiver, Sender, TryRecvError, TrySendError};

///
/// Error returned by `WorkQueue::try_put` when the queue is at capacity.
///
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QueueFullError;

impl std::fmt::Display for QueueFullError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "work queue is full")
    }
}

impl std::error::Error for QueueFullError {}

///
/// A bounded FIFO queue of work items.
///
#[derive(Clone, Debug)]
pub struct WorkQueue<T> {
    tx: Sender<T>,
    rx: Receiver<T>,
}

impl<T> WorkQueue<T> {
    ///
    /// Queue holding at most `capacity` pending items.
    ///
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0);
        let (tx, rx) = bounded(capacity);
        WorkQueue { tx, rx }
    }
    ///
    /// Enqueue an item, blocking while the queue is at capacity.
    ///
    pub fn put(&self, item: T) {
        // both endpoints live as long as self, so send cannot disconnect
        if self.tx.send(item).is_err() {
            unreachable!()
        }
    }
    ///
    /// Enqueue an item without blocking.
    ///
    pub fn try_put(&self, item: T) -> Result<(), QueueFullError> {
        match self.tx.try_send(item) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => Err(QueueFullError),
            Err(TrySendError::Disconnected(_)) => unreachable!(),
        }
    }
    ///
    /// Dequeue an item, blocking while the queue is empty.
    ///
    pub fn take(&self) -> T {
        match self.rx.recv() {
            Ok(item) => item,
            Err(_) => unreachable!(),
        }
    }
    ///
    /// Dequeue an item, or `None` when the queue is currently empty.
    ///
    pub fn try_take(&self) -> Option<T> {
        match self.rx.try_recv() {
            Ok(item) => Some(item),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => unreachable!(),
        }
    }
    pub fn len(&self) -> usize {
        self.rx.len()
    }
    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}

//
// tests
//

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn queue_fifo_order() {
        let q = WorkQueue::new(8);
        q.put(1);
        q.put(2);
        q.put(3);
        assert_eq!(q.len(), 3);
        assert_eq!(q.try_take(), Some(1));
        assert_eq!(q.take(), 2);
        assert_eq!(q.try_take(), Some(3));
        assert_eq!(q.try_take(), None);
        assert!(q.is_empty());
    }
    #[test]
    fn queue_rejects_when_full() {
        let q = WorkQueue::new(2);
        q.put("a");
        q.put("b");
        assert_eq!(q.try_put("c"), Err(QueueFullError));
        assert_eq!(q.try_take(), Some("a"));
        q.try_put("c").unwrap();
    }
    #[test]
    fn queue_is_shared_across_threads() {
        let q = WorkQueue::new(100);
        for i in 0..100 {
            q.put(i);
        }
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let q = q.clone();
                std::thread::spawn(move || {
                    let mut taken = Vec::new();
                    while let Some(item) = q.try_take() {
                        taken.push(item);
                    }
                    taken
                })
            })
            .collect();
        let mut all: Vec<usize> = handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect();
        all.sort();
        assert_eq!(all, (0..100).collect::<Vec<_>>());
        assert!(q.is_empty());
    }
}
