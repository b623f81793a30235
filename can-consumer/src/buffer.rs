//! Bounded signal buffer
//!
//! Hand-off point between the per-channel consumer threads and the
//! inspection stage. Multiple producers share one buffer; pushes never
//! block and fail fast when the buffer is full, leaving backpressure
//! handling to the caller.

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};

use crate::types::CollectedDataFrame;

/// Thread-safe bounded queue of collected data frames
pub struct SignalBuffer {
    tx: Sender<CollectedDataFrame>,
    rx: Receiver<CollectedDataFrame>,
    capacity: usize,
}

impl SignalBuffer {
    /// Create a buffer holding at most `capacity` frames
    pub fn new(capacity: usize) -> Self {
        let (tx, rx) = bounded(capacity);
        Self { tx, rx, capacity }
    }

    /// Push a frame without blocking
    ///
    /// Returns `false` when the buffer is full (or the consumer side is
    /// gone); ownership of the frame transfers only on success.
    pub fn push(&self, frame: CollectedDataFrame) -> bool {
        match self.tx.try_send(frame) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) | Err(TrySendError::Disconnected(_)) => false,
        }
    }

    /// Take the oldest frame, if any, without blocking
    pub fn pop(&self) -> Option<CollectedDataFrame> {
        self.rx.try_recv().ok()
    }

    /// Number of frames currently queued
    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }

    /// Maximum number of frames the buffer can hold
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_pop_fifo() {
        let buffer = SignalBuffer::new(4);
        assert!(buffer.push(CollectedDataFrame::default()));
        assert!(buffer.push(CollectedDataFrame::default()));
        assert_eq!(buffer.len(), 2);
        assert!(buffer.pop().is_some());
        assert!(buffer.pop().is_some());
        assert!(buffer.pop().is_none());
    }

    #[test]
    fn test_push_fails_fast_when_full() {
        let buffer = SignalBuffer::new(1);
        assert!(buffer.push(CollectedDataFrame::default()));
        assert!(!buffer.push(CollectedDataFrame::default()));
        assert_eq!(buffer.len(), 1);
    }

    #[test]
    fn test_concurrent_producers() {
        use std::sync::Arc;
        use std::thread;

        let buffer = Arc::new(SignalBuffer::new(64));
        let mut handles = Vec::new();
        for _ in 0..4 {
            let buffer = Arc::clone(&buffer);
            handles.push(thread::spawn(move || {
                for _ in 0..16 {
                    assert!(buffer.push(CollectedDataFrame::default()));
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(buffer.len(), 64);
    }
}
