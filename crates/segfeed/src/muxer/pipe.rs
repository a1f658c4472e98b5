use std::{path::PathBuf, pin::Pin};

use tokio::{
    io::{AsyncWrite, AsyncWriteExt, BufWriter},
    time::Instant,
};

use super::{FeedPayload, FrameClock, Muxer, MuxerConfig};
use crate::{
    error::{SegfeedError, SegfeedResult},
    util::path::NumberedOutputNamer,
};

type PipeWriter = BufWriter<Pin<Box<dyn AsyncWrite + Send>>>;

enum PipeTarget {
    Stdout,
    File {
        current: PathBuf,
        namer: NumberedOutputNamer,
    },
}

/// Writes the selected tracks of every payload to stdout or a file.
///
/// Output is buffered. The flush deadline is only checked when a payload
/// arrives, so once `flushing_time` has passed the next feed flushes; data
/// fed last stays buffered until [Muxer::finish] or [Muxer::reset].
///
/// A reset closes a file target and continues in `<name>.1.<ext>`,
/// `<name>.2.<ext>`, ... Failures of the output itself are returned as
/// [SegfeedError::IOError], not as muxer internal errors.
pub struct PipeMuxer {
    config: MuxerConfig,
    target: PipeTarget,
    writer: Option<PipeWriter>,

    clock: FrameClock,
    last_flush: Instant,
    bytes_written: u64,
}

impl PipeMuxer {
    pub fn stdout(config: MuxerConfig) -> Self {
        Self::new(config, PipeTarget::Stdout)
    }

    pub fn file(config: MuxerConfig, target_path: PathBuf) -> Self {
        let namer = NumberedOutputNamer::new(target_path.clone());
        Self::new(
            config,
            PipeTarget::File {
                current: target_path,
                namer,
            },
        )
    }

    fn new(config: MuxerConfig, target: PipeTarget) -> Self {
        let clock = FrameClock::new(config.fps);
        Self {
            config,
            target,
            writer: None,
            clock,
            last_flush: Instant::now(),
            bytes_written: 0,
        }
    }

    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    async fn writer(&mut self) -> SegfeedResult<&mut PipeWriter> {
        if self.writer.is_none() {
            let inner: Pin<Box<dyn AsyncWrite + Send>> = match &self.target {
                PipeTarget::Stdout => Box::pin(tokio::io::stdout()),
                PipeTarget::File { current, .. } => {
                    log::info!("Writing {} output to {}", self.config.node, current.display());
                    Box::pin(tokio::fs::File::create(current).await?)
                }
            };
            self.writer = Some(BufWriter::new(inner));
            self.last_flush = Instant::now();
        }
        self.writer
            .as_mut()
            .ok_or_else(|| SegfeedError::MuxerInternal("output is not open".to_string()))
    }

    async fn write(&mut self, data: &[u8]) -> SegfeedResult<()> {
        let writer = self.writer().await?;
        writer.write_all(data).await?;
        self.bytes_written += data.len() as u64;
        Ok(())
    }

    async fn flush(&mut self) -> SegfeedResult<()> {
        if let Some(writer) = &mut self.writer {
            writer.flush().await?;
        }
        self.last_flush = Instant::now();
        Ok(())
    }
}

impl Muxer for PipeMuxer {
    async fn feed(&mut self, payload: FeedPayload) -> SegfeedResult<()> {
        let mode = self.config.mode;
        let mut frames = 0;

        if let Some(video) = payload.video {
            if mode.accepts_video() {
                frames = self.clock.push(&video);
                self.write(&video).await?;
            } else {
                log::debug!("Dropping {} bytes of video in {mode:?} mode", video.len());
            }
        }
        if let Some(audio) = payload.audio {
            if mode.accepts_audio() {
                self.write(&audio).await?;
            } else {
                log::debug!("Dropping {} bytes of audio in {mode:?} mode", audio.len());
            }
        }

        let pts = self.clock.presentation_time();
        if self.config.debug {
            log::info!(
                "[{}] fed {frames} frame(s), {} bytes written, position {:.3}s",
                self.config.node,
                self.bytes_written,
                pts.as_secs_f64()
            );
        } else {
            log::debug!("[{}] fed {frames} frame(s)", self.config.node);
        }

        if self.last_flush.elapsed() >= self.config.flushing_time {
            self.flush().await?;
        }
        Ok(())
    }

    async fn reset(&mut self) -> SegfeedResult<()> {
        self.finish().await?;
        let opened = self.writer.take().is_some();
        self.clock.reset();

        // nothing was written to the current file yet, keep using it
        if opened {
            if let PipeTarget::File { current, namer } = &mut self.target {
                *current = namer.next_path();
            }
        }
        log::warn!("[{}] muxer reset", self.config.node);
        Ok(())
    }

    async fn finish(&mut self) -> SegfeedResult<()> {
        self.flush().await?;
        if let Some(writer) = &mut self.writer {
            writer.shutdown().await?;
        }
        Ok(())
    }
}
