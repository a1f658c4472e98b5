pub mod config;
pub mod error;
pub mod feeder;
pub mod fetch;
pub mod muxer;
pub mod policy;
pub mod segment;
pub mod util;

pub use config::FeederConfig;
pub use error::{SegfeedError, SegfeedResult};
pub use feeder::{ErrorHandler, FeederState, SegmentFeeder, SegmentFeederBuilder};
pub use muxer::{FeedPayload, Muxer, MuxerConfig, MuxerFactory, MuxerMode, MuxerTarget};
pub use policy::{Environment, NeverReset, ResetPolicy, SafariPolicy};
pub use segment::{SegmentPlan, SegmentRequest, VideoType};
pub use util::http::HttpClient;

pub use bytes::Bytes;

// ┌──────────────┐  GET /v1/segment/<id>?offset=0      ┌─────────────┐
// │              ├────────────────────────────────────►│             │
// │              │◄────────────── bytes 0 ─────────────┤   Segment   │
// │    Segment   │                                     │   server    │
// │    Feeder    │  GET /v1/segment/<id>?offset=10000  │             │
// │              ├────────────────────────────────────►│             │
// │              │◄─────────── bytes 10000 ────────────┤             │
// └──────┬───────┘                                     └─────────────┘
//        │ construct, feed(bytes 0), feed(bytes 10000), reset on error
// ┌──────▼───────┐
// │    Muxer     │
// └──────────────┘
