use url::Url;

use crate::{
    config::{FeederConfig, DEFAULT_BASE_URL},
    error::{SegfeedError, SegfeedResult},
    fetch::fetch,
    muxer::{FeedPayload, Muxer, MuxerConfig, MuxerFactory},
    policy::{Environment, ResetPolicy, SafariPolicy},
    segment::SegmentPlan,
    util::http::HttpClient,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeederState {
    Idle,
    Streaming,
}

/// Reaction to errors the muxer reports about itself.
pub struct ErrorHandler {
    environment: Environment,
    policy: Box<dyn ResetPolicy>,
}

impl ErrorHandler {
    pub fn new<P>(environment: Environment, policy: P) -> Self
    where
        P: ResetPolicy + 'static,
    {
        Self {
            environment,
            policy: Box::new(policy),
        }
    }

    pub fn environment(&self) -> &Environment {
        &self.environment
    }

    /// Resets `muxer` once if the policy matches the environment, otherwise
    /// the error is dropped. Returns whether a reset was issued.
    pub async fn on_error<M>(&self, muxer: &mut M, error: &SegfeedError) -> bool
    where
        M: Muxer,
    {
        if !self.policy.should_reset(&self.environment) {
            tracing::debug!("Ignoring muxer error: {error}");
            return false;
        }

        tracing::warn!("Resetting muxer after error: {error}");
        if let Err(e) = muxer.reset().await {
            tracing::error!("Failed to reset muxer: {e}");
        }
        true
    }
}

impl Default for ErrorHandler {
    fn default() -> Self {
        Self::new(Environment::default(), SafariPolicy::new())
    }
}

/// ┌──────────┐ construct ┌───────────┐
/// │   Idle   ├──────────►│ Streaming │──┐ fetch(segment N)
/// └──────────┘           └─────▲─────┘  │ feed(bytes N)
///                              └────────┘
///
/// Fetches every segment of the plan in order and feeds it to the muxer.
/// The next fetch starts only after the previous segment has been fed.
pub struct SegmentFeeder<M>
where
    M: Muxer,
{
    client: HttpClient,
    base_url: Url,
    segment_id: String,
    plan: SegmentPlan,
    muxer_config: MuxerConfig,
    error_handler: ErrorHandler,

    muxer: Option<M>,
}

impl<M> SegmentFeeder<M>
where
    M: Muxer,
{
    pub fn state(&self) -> FeederState {
        if self.muxer.is_some() {
            FeederState::Streaming
        } else {
            FeederState::Idle
        }
    }

    pub fn muxer(&self) -> Option<&M> {
        self.muxer.as_ref()
    }

    pub fn into_muxer(self) -> Option<M> {
        self.muxer
    }

    pub fn plan(&self) -> &SegmentPlan {
        &self.plan
    }

    /// Constructs the muxer. Fails if one was constructed before.
    pub fn start<F>(&mut self, factory: F) -> SegfeedResult<()>
    where
        F: MuxerFactory<Muxer = M>,
    {
        if self.muxer.is_some() {
            return Err(SegfeedError::AlreadyStreaming);
        }

        self.muxer_config.validate()?;
        let muxer = factory.construct(&self.muxer_config)?;
        self.muxer = Some(muxer);
        tracing::info!(
            "Muxer constructed for {} ({:?} mode, {} fps)",
            self.muxer_config.node,
            self.muxer_config.mode,
            self.muxer_config.fps
        );
        Ok(())
    }

    /// Fetches and feeds every planned segment.
    ///
    /// A failed fetch stops the sequence and is returned as is. Errors the
    /// muxer raises while being fed go to the error handler.
    pub async fn feed_all(&mut self) -> SegfeedResult<()> {
        let Some(muxer) = self.muxer.as_mut() else {
            return Err(SegfeedError::NotStarted);
        };

        for request in self.plan.iter() {
            let url = request.to_url(&self.base_url, &self.segment_id)?;
            tracing::debug!("Fetching {url}");

            let bytes = match fetch(&self.client, url).await {
                Ok(bytes) => bytes,
                Err(e) => {
                    tracing::error!(
                        "Failed to fetch segment at offset {}: {e}",
                        request.offset
                    );
                    return Err(e);
                }
            };
            tracing::info!(
                "Feeding segment at offset {} ({} bytes)",
                request.offset,
                bytes.len()
            );

            if let Err(e) = muxer.feed(FeedPayload::video(bytes)).await {
                if !e.is_muxer_internal() {
                    return Err(e);
                }
                self.error_handler.on_error(muxer, &e).await;
            }
        }

        Ok(())
    }

    /// The whole startup sequence: construct the muxer, then feed the plan.
    pub async fn run<F>(&mut self, factory: F) -> SegfeedResult<()>
    where
        F: MuxerFactory<Muxer = M>,
    {
        self.start(factory)?;
        self.feed_all().await
    }

    /// Entry point for errors the muxer reports outside of a feed call.
    pub async fn on_muxer_error(&mut self, error: &SegfeedError) -> bool {
        match self.muxer.as_mut() {
            Some(muxer) => self.error_handler.on_error(muxer, error).await,
            None => false,
        }
    }
}

pub struct SegmentFeederBuilder {
    client: Option<HttpClient>,
    base_url: Option<Url>,
    segment_id: Option<String>,
    plan: SegmentPlan,
    muxer_config: MuxerConfig,
    error_handler: ErrorHandler,
}

impl SegmentFeederBuilder {
    pub fn new() -> Self {
        Self {
            client: None,
            base_url: None,
            segment_id: None,
            plan: SegmentPlan::default(),
            muxer_config: MuxerConfig::default(),
            error_handler: ErrorHandler::default(),
        }
    }

    pub fn from_config(config: FeederConfig) -> Self {
        let handler = ErrorHandler::new(config.environment, SafariPolicy::new());
        Self::new()
            .base_url(config.base_url)
            .segment_id(config.segment_id)
            .plan(config.segments)
            .muxer_config(config.muxer)
            .error_handler(handler)
    }

    pub fn client(mut self, client: HttpClient) -> Self {
        self.client = Some(client);
        self
    }

    pub fn base_url(mut self, base_url: Url) -> Self {
        self.base_url = Some(base_url);
        self
    }

    pub fn segment_id<S>(mut self, segment_id: S) -> Self
    where
        S: Into<String>,
    {
        self.segment_id = Some(segment_id.into());
        self
    }

    pub fn plan(mut self, plan: SegmentPlan) -> Self {
        self.plan = plan;
        self
    }

    pub fn muxer_config(mut self, config: MuxerConfig) -> Self {
        self.muxer_config = config;
        self
    }

    pub fn error_handler(mut self, handler: ErrorHandler) -> Self {
        self.error_handler = handler;
        self
    }

    /// Replaces the reset policy, keeping the environment.
    pub fn policy<P>(mut self, policy: P) -> Self
    where
        P: ResetPolicy + 'static,
    {
        let environment = self.error_handler.environment.clone();
        self.error_handler = ErrorHandler::new(environment, policy);
        self
    }

    /// Replaces the environment, keeping the reset policy.
    pub fn environment(mut self, environment: Environment) -> Self {
        self.error_handler.environment = environment;
        self
    }

    pub fn build<M>(self) -> SegfeedResult<SegmentFeeder<M>>
    where
        M: Muxer,
    {
        let base_url = match self.base_url {
            Some(base_url) => base_url,
            None => Url::parse(DEFAULT_BASE_URL)?,
        };
        let segment_id = self
            .segment_id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| SegfeedError::InvalidConfig("segment_id is required".to_string()))?;

        Ok(SegmentFeeder {
            client: self.client.unwrap_or_default(),
            base_url,
            segment_id,
            plan: self.plan,
            muxer_config: self.muxer_config,
            error_handler: self.error_handler,
            muxer: None,
        })
    }
}

impl Default for SegmentFeederBuilder {
    fn default() -> Self {
        Self::new()
    }
}
