use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, Mutex,
};

use segfeed::{
    muxer::{MemoryMuxer, SegfeedMuxer},
    Environment, FeederState, MuxerConfig, MuxerMode, MuxerTarget, NeverReset,
    SegfeedError, SegmentFeeder, SegmentFeederBuilder, SegmentPlan, SegmentRequest,
};
use url::Url;
use wiremock::MockServer;

use crate::{count, Events, RecordingMuxer, SegmentMock, SEGMENT_ID};

const SAFARI_UA: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 14_4) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4 Safari/605.1.15";
const FIREFOX_UA: &str =
    "Mozilla/5.0 (X11; Linux x86_64; rv:125.0) Gecko/20100101 Firefox/125.0";

fn feeder(server: &MockServer, environment: Environment) -> SegmentFeeder<RecordingMuxer> {
    SegmentFeederBuilder::new()
        .base_url(Url::parse(&server.uri()).unwrap())
        .segment_id(SEGMENT_ID)
        .environment(environment)
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_feeds_segments_in_order() -> anyhow::Result<()> {
    let events = Events::default();
    let server = MockServer::start().await;
    server
        .mock_segment(&events, 0, 10000, 0xa0, 1)
        .await
        .mock_segment(&events, 10000, 10000, 0xb0, 1)
        .await;

    let mut feeder = feeder(&server, Environment::default());
    let muxer_events = events.clone();
    feeder
        .run(move |_: &MuxerConfig| Ok(RecordingMuxer::new(muxer_events)))
        .await?;

    assert_eq!(feeder.state(), FeederState::Streaming);
    assert_eq!(count(&events, "feed"), 2);
    let feeds: Vec<_> = events
        .lock()
        .unwrap()
        .iter()
        .filter(|e| e.starts_with("feed"))
        .cloned()
        .collect();
    assert_eq!(feeds, vec!["feed(10000:160)", "feed(10000:176)"]);
    Ok(())
}

#[tokio::test]
async fn test_observable_sequence() -> anyhow::Result<()> {
    let events = Events::default();
    let server = MockServer::start().await;
    server
        .mock_segment(&events, 0, 10000, 1, 1)
        .await
        .mock_segment(&events, 10000, 10000, 2, 1)
        .await;

    let mut feeder = feeder(&server, Environment::default());
    let muxer_events = events.clone();
    feeder
        .run(move |_: &MuxerConfig| {
            muxer_events.lock().unwrap().push("construct".to_string());
            Ok(RecordingMuxer::new(muxer_events))
        })
        .await?;

    assert_eq!(
        *events.lock().unwrap(),
        vec![
            "construct",
            "fetch(0)",
            "feed(10000:1)",
            "fetch(10000)",
            "feed(10000:2)",
        ]
    );
    Ok(())
}

#[tokio::test]
async fn test_first_fetch_failure_stops_sequence() {
    let events = Events::default();
    let server = MockServer::start().await;
    server.mock_failure(&events, 0, 404).await;
    // second segment must never be requested
    server.mock_segment(&events, 10000, 10000, 2, 0).await;

    let mut feeder = feeder(&server, Environment::default());
    let muxer_events = events.clone();
    let result = feeder
        .run(move |_: &MuxerConfig| Ok(RecordingMuxer::new(muxer_events)))
        .await;

    let error = result.unwrap_err();
    assert!(matches!(&error, SegfeedError::RequestFailed(text) if text == "Not Found"));
    assert!(error.to_string().contains("Not Found"));
    assert_eq!(count(&events, "fetch"), 1);
    assert_eq!(count(&events, "feed"), 0);
}

#[tokio::test]
async fn test_second_fetch_failure_after_one_feed() {
    let events = Events::default();
    let server = MockServer::start().await;
    server.mock_segment(&events, 0, 10000, 1, 1).await;
    server.mock_failure(&events, 10000, 500).await;

    let mut feeder = feeder(&server, Environment::default());
    let muxer_events = events.clone();
    let result = feeder
        .run(move |_: &MuxerConfig| Ok(RecordingMuxer::new(muxer_events)))
        .await;

    assert!(matches!(
        result,
        Err(SegfeedError::RequestFailed(text)) if text == "Internal Server Error"
    ));
    assert_eq!(
        *events.lock().unwrap(),
        vec!["fetch(0)", "feed(10000:1)", "fetch(10000)"]
    );
}

#[tokio::test]
async fn test_muxer_constructed_once_with_defaults() -> anyhow::Result<()> {
    let events = Events::default();
    let server = MockServer::start().await;
    server
        .mock_segment(&events, 0, 10000, 1, 1)
        .await
        .mock_segment(&events, 10000, 10000, 2, 1)
        .await;

    let constructed = Arc::new(AtomicUsize::new(0));
    let seen_config = Arc::new(Mutex::new(None));

    let mut feeder = feeder(&server, Environment::default());
    assert_eq!(feeder.state(), FeederState::Idle);

    let counter = constructed.clone();
    let seen = seen_config.clone();
    let muxer_events = events.clone();
    feeder
        .run(move |config: &MuxerConfig| {
            counter.fetch_add(1, Ordering::SeqCst);
            *seen.lock().unwrap() = Some(config.clone());
            Ok(RecordingMuxer::new(muxer_events))
        })
        .await?;

    // a second run must not build another muxer
    let counter = constructed.clone();
    let muxer_events = events.clone();
    let second = feeder
        .run(move |_: &MuxerConfig| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(RecordingMuxer::new(muxer_events))
        })
        .await;
    assert!(matches!(second, Err(SegfeedError::AlreadyStreaming)));
    assert_eq!(constructed.load(Ordering::SeqCst), 1);

    let config = seen_config.lock().unwrap().clone().unwrap();
    assert_eq!(config.node, "player");
    assert_eq!(config.mode, MuxerMode::Video);
    assert_eq!(config.flushing_time.as_millis(), 1000);
    assert_eq!(config.fps, 20);
    assert!(config.debug);
    Ok(())
}

#[tokio::test]
async fn test_safari_resets_on_muxer_error() -> anyhow::Result<()> {
    let events = Events::default();
    let server = MockServer::start().await;
    let mut feeder = feeder(
        &server,
        Environment::new(SAFARI_UA, "Apple Computer, Inc."),
    );

    let muxer_events = events.clone();
    feeder.start(move |_: &MuxerConfig| Ok(RecordingMuxer::new(muxer_events)))?;

    let reset = feeder
        .on_muxer_error(&SegfeedError::MuxerInternal("decode failed".to_string()))
        .await;
    assert!(reset);
    assert_eq!(count(&events, "reset"), 1);
    Ok(())
}

#[tokio::test]
async fn test_other_browsers_ignore_muxer_error() -> anyhow::Result<()> {
    let events = Events::default();
    let server = MockServer::start().await;

    for environment in [
        Environment::new(FIREFOX_UA, ""),
        Environment::new(SAFARI_UA, "Google Inc."),
        Environment::default(),
    ] {
        let mut feeder = feeder(&server, environment);
        let muxer_events = events.clone();
        feeder.start(move |_: &MuxerConfig| Ok(RecordingMuxer::new(muxer_events)))?;

        let reset = feeder
            .on_muxer_error(&SegfeedError::MuxerInternal("decode failed".to_string()))
            .await;
        assert!(!reset);
    }

    assert_eq!(count(&events, "reset"), 0);
    Ok(())
}

#[tokio::test]
async fn test_feed_errors_are_absorbed() -> anyhow::Result<()> {
    let events = Events::default();
    let server = MockServer::start().await;
    server
        .mock_segment(&events, 0, 10000, 1, 1)
        .await
        .mock_segment(&events, 10000, 10000, 2, 1)
        .await;

    let mut feeder = feeder(
        &server,
        Environment::new(SAFARI_UA, "Apple Computer, Inc."),
    );
    let muxer_events = events.clone();
    feeder
        .run(move |_: &MuxerConfig| Ok(RecordingMuxer::failing(muxer_events)))
        .await?;

    assert_eq!(
        *events.lock().unwrap(),
        vec![
            "fetch(0)",
            "feed(10000:1)",
            "reset",
            "fetch(10000)",
            "feed(10000:2)",
            "reset",
        ]
    );
    Ok(())
}

#[tokio::test]
async fn test_custom_policy_and_memory_muxer() -> anyhow::Result<()> {
    let events = Events::default();
    let server = MockServer::start().await;
    server.mock_segment(&events, 0, 10000, 7, 1).await;

    let mut feeder: SegmentFeeder<MemoryMuxer> = SegmentFeederBuilder::new()
        .base_url(Url::parse(&server.uri())?)
        .segment_id(SEGMENT_ID)
        .plan(SegmentPlan::new(vec![SegmentRequest::raw(0, 10000)]))
        .policy(NeverReset)
        .build()?;

    let muxer = MemoryMuxer::new();
    let handle = muxer.clone();
    feeder.run(move |_: &MuxerConfig| Ok(muxer)).await?;

    let payloads = handle.payloads();
    assert_eq!(payloads.len(), 1);
    assert_eq!(payloads[0].video.as_deref(), Some(&[7u8; 10000][..]));

    assert!(!feeder
        .on_muxer_error(&SegfeedError::MuxerInternal("late".to_string()))
        .await);
    assert_eq!(handle.resets(), 0);
    Ok(())
}

#[test]
fn test_builder_requires_segment_id() {
    let result = SegmentFeederBuilder::new().build::<MemoryMuxer>();
    assert!(matches!(result, Err(SegfeedError::InvalidConfig(_))));
}

#[tokio::test]
async fn test_output_failure_is_not_absorbed() -> anyhow::Result<()> {
    let events = Events::default();
    let server = MockServer::start().await;
    server.mock_segment(&events, 0, 10000, 1, 1).await;
    // the run stops at the first failed feed
    server.mock_segment(&events, 10000, 10000, 2, 0).await;

    let dir = tempfile::tempdir()?;
    let output = dir.path().join("missing").join("out.h264");

    let mut feeder: SegmentFeeder<SegfeedMuxer> = SegmentFeederBuilder::new()
        .base_url(Url::parse(&server.uri())?)
        .segment_id(SEGMENT_ID)
        .build()?;
    let result = feeder.run(MuxerTarget::File(output.clone())).await;

    assert!(matches!(result, Err(SegfeedError::IOError(_))));
    assert!(!output.exists());
    Ok(())
}

#[tokio::test]
async fn test_feed_before_start() -> anyhow::Result<()> {
    let events = Events::default();
    let server = MockServer::start().await;
    server.mock_segment(&events, 0, 10000, 1, 0).await;

    let mut feeder = feeder(&server, Environment::default());
    let result = feeder.feed_all().await;

    assert!(matches!(result, Err(SegfeedError::NotStarted)));
    assert_eq!(feeder.state(), FeederState::Idle);
    assert_eq!(count(&events, "fetch"), 0);
    Ok(())
}
