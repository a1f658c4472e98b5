use super::{FeedPayload, Muxer, MuxerConfig};
use crate::error::SegfeedResult;

/// Discards every payload.
pub struct SkipMuxer {
    config: MuxerConfig,
    fed: usize,
    bytes: usize,
}

impl SkipMuxer {
    pub fn new(config: MuxerConfig) -> Self {
        Self {
            config,
            fed: 0,
            bytes: 0,
        }
    }
}

impl Muxer for SkipMuxer {
    async fn feed(&mut self, payload: FeedPayload) -> SegfeedResult<()> {
        self.fed += 1;
        self.bytes += payload.len();
        if self.config.debug {
            log::info!("[{}] skipped {} bytes", self.config.node, payload.len());
        }
        Ok(())
    }

    async fn reset(&mut self) -> SegfeedResult<()> {
        Ok(())
    }

    async fn finish(&mut self) -> SegfeedResult<()> {
        log::info!(
            "Skip muxing. {} payload(s) with {} bytes were discarded.",
            self.fed,
            self.bytes
        );
        Ok(())
    }
}
