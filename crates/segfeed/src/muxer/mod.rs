mod frames;
mod memory;
mod pipe;
mod skip;

pub use frames::FrameClock;
pub use memory::MemoryMuxer;
pub use pipe::PipeMuxer;
pub use skip::SkipMuxer;

use std::{future::Future, path::PathBuf, time::Duration};

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::error::{SegfeedError, SegfeedResult};

/// Which tracks the muxer handles. Payload parts outside the mode are dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MuxerMode {
    #[default]
    Video,
    Audio,
    Both,
}

impl MuxerMode {
    pub fn accepts_video(&self) -> bool {
        matches!(self, Self::Video | Self::Both)
    }

    pub fn accepts_audio(&self) -> bool {
        matches!(self, Self::Audio | Self::Both)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MuxerConfig {
    /// Rendering surface the output is attached to.
    pub node: String,
    pub mode: MuxerMode,
    /// Interval at which buffered output is flushed, in milliseconds in config files.
    #[serde(with = "millis")]
    pub flushing_time: Duration,
    /// Assumed frame rate used to synthesize timestamps.
    pub fps: u32,
    /// Verbose per-payload logging.
    pub debug: bool,
}

impl Default for MuxerConfig {
    fn default() -> Self {
        Self {
            node: "player".to_string(),
            mode: MuxerMode::Video,
            flushing_time: Duration::from_millis(1000),
            fps: 20,
            debug: true,
        }
    }
}

impl MuxerConfig {
    pub fn validate(&self) -> SegfeedResult<()> {
        if self.fps == 0 {
            return Err(SegfeedError::InvalidConfig("fps must be positive".to_string()));
        }
        Ok(())
    }
}

mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

/// One unit of media handed to the muxer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedPayload {
    pub video: Option<Bytes>,
    pub audio: Option<Bytes>,
}

impl FeedPayload {
    pub fn video(data: Bytes) -> Self {
        Self {
            video: Some(data),
            audio: None,
        }
    }

    pub fn len(&self) -> usize {
        self.video.as_ref().map_or(0, Bytes::len) + self.audio.as_ref().map_or(0, Bytes::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

pub trait Muxer {
    /// Incorporate a payload into the output.
    ///
    /// Failures inside the muxer are reported as [SegfeedError::MuxerInternal].
    fn feed(&mut self, payload: FeedPayload) -> impl Future<Output = SegfeedResult<()>> + Send;

    /// Discard internal decoding state.
    fn reset(&mut self) -> impl Future<Output = SegfeedResult<()>> + Send;

    /// Flush whatever is still buffered. The muxer is not used afterwards.
    fn finish(&mut self) -> impl Future<Output = SegfeedResult<()>> + Send {
        async { Ok(()) }
    }
}

/// Builds the muxer. Consumed on use, so a factory constructs at most one muxer.
pub trait MuxerFactory {
    type Muxer: Muxer;

    fn construct(self, config: &MuxerConfig) -> SegfeedResult<Self::Muxer>;
}

impl<F, M> MuxerFactory for F
where
    F: FnOnce(&MuxerConfig) -> SegfeedResult<M>,
    M: Muxer,
{
    type Muxer = M;

    fn construct(self, config: &MuxerConfig) -> SegfeedResult<Self::Muxer> {
        self(config)
    }
}

/// Output selected on the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MuxerTarget {
    Stdout,
    File(PathBuf),
    Skip,
}

impl MuxerFactory for MuxerTarget {
    type Muxer = SegfeedMuxer;

    fn construct(self, config: &MuxerConfig) -> SegfeedResult<Self::Muxer> {
        config.validate()?;
        Ok(match self {
            Self::Stdout => SegfeedMuxer::Pipe(PipeMuxer::stdout(config.clone())),
            Self::File(path) => SegfeedMuxer::Pipe(PipeMuxer::file(config.clone(), path)),
            Self::Skip => SegfeedMuxer::Skip(SkipMuxer::new(config.clone())),
        })
    }
}

pub enum SegfeedMuxer {
    Pipe(PipeMuxer),
    Memory(MemoryMuxer),
    Skip(SkipMuxer),
}

impl Muxer for SegfeedMuxer {
    async fn feed(&mut self, payload: FeedPayload) -> SegfeedResult<()> {
        match self {
            Self::Pipe(muxer) => muxer.feed(payload).await,
            Self::Memory(muxer) => muxer.feed(payload).await,
            Self::Skip(muxer) => muxer.feed(payload).await,
        }
    }

    async fn reset(&mut self) -> SegfeedResult<()> {
        match self {
            Self::Pipe(muxer) => muxer.reset().await,
            Self::Memory(muxer) => muxer.reset().await,
            Self::Skip(muxer) => muxer.reset().await,
        }
    }

    async fn finish(&mut self) -> SegfeedResult<()> {
        match self {
            Self::Pipe(muxer) => muxer.finish().await,
            Self::Memory(muxer) => muxer.finish().await,
            Self::Skip(muxer) => muxer.finish().await,
        }
    }
}
