use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, Mutex,
};

use super::{FeedPayload, Muxer};
use crate::error::SegfeedResult;

/// Keeps every fed payload in memory. Clones share the same storage.
#[derive(Clone, Default)]
pub struct MemoryMuxer {
    payloads: Arc<Mutex<Vec<FeedPayload>>>,
    resets: Arc<AtomicUsize>,
}

impl MemoryMuxer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn payloads(&self) -> Vec<FeedPayload> {
        self.payloads.lock().unwrap().clone()
    }

    pub fn resets(&self) -> usize {
        self.resets.load(Ordering::Relaxed)
    }
}

impl Muxer for MemoryMuxer {
    async fn feed(&mut self, payload: FeedPayload) -> SegfeedResult<()> {
        self.payloads.lock().unwrap().push(payload);
        Ok(())
    }

    async fn reset(&mut self) -> SegfeedResult<()> {
        self.payloads.lock().unwrap().clear();
        self.resets.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}
