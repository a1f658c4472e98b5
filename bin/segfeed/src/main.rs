use std::{path::PathBuf, time::Duration};

use clap::Parser;
use segfeed::{
    muxer::SegfeedMuxer, Environment, FeederConfig, HttpClient, Muxer,
    MuxerTarget, SegmentFeeder, SegmentFeederBuilder, SegmentPlan, VideoType,
};
use tracing_subscriber::filter::LevelFilter;

#[derive(Parser, Debug, Clone)]
#[clap(version, about)]
pub struct SegfeedArgs {
    /// Debug output
    #[clap(long, alias = "debug")]
    verbose: bool,

    /// TOML config file
    #[clap(short, long)]
    config: Option<PathBuf>,

    /// Root url of the segment server [default: http://127.0.0.1:18080]
    #[clap(long, env = "SEGFEED_BASE_URL")]
    base_url: Option<String>,

    /// Output file path. Pipes to stdout when omitted or set to `-`.
    #[clap(short, long)]
    output: Option<PathBuf>,

    /// Discard fetched segments instead of writing them
    #[clap(long, conflicts_with = "output")]
    skip: bool,

    /// User agent of the environment, used by the reset policy
    #[clap(long, env = "SEGFEED_USER_AGENT")]
    user_agent: Option<String>,

    /// Vendor of the environment, used by the reset policy
    #[clap(long, env = "SEGFEED_VENDOR")]
    vendor: Option<String>,

    /// HTTP timeout in seconds. Requests never time out by default.
    #[clap(long)]
    timeout: Option<u64>,

    /// Fetch `count` contiguous segments of `length` instead of the configured plan
    #[clap(long, requires = "length")]
    count: Option<usize>,

    /// Length of each generated segment
    #[clap(long, requires = "count")]
    length: Option<u64>,

    /// Video type of generated segments
    #[clap(long, default_value = "Raw")]
    video_type: VideoType,

    /// Segment resource id
    id: Option<String>,
}

impl SegfeedArgs {
    fn config(&self) -> anyhow::Result<FeederConfig> {
        let mut config = match &self.config {
            Some(path) => {
                log::info!("Loading config from {}", path.display());
                FeederConfig::load(path)?
            }
            None => FeederConfig::default(),
        };

        if let Some(base_url) = &self.base_url {
            config.base_url = base_url.parse()?;
        }
        if let Some(id) = &self.id {
            config.segment_id = id.clone();
        }
        if let (Some(count), Some(length)) = (self.count, self.length) {
            config.segments = SegmentPlan::contiguous(0, length, count, self.video_type);
        }

        let Environment { user_agent, vendor } = &mut config.environment;
        if let Some(ua) = &self.user_agent {
            *user_agent = ua.clone();
        }
        if let Some(v) = &self.vendor {
            *vendor = v.clone();
        }

        config.validate()?;
        Ok(config)
    }

    fn target(&self) -> MuxerTarget {
        if self.skip {
            return MuxerTarget::Skip;
        }
        match &self.output {
            Some(path) if path.as_os_str() != "-" => MuxerTarget::File(path.clone()),
            _ => MuxerTarget::Stdout,
        }
    }

    fn client(&self) -> anyhow::Result<HttpClient> {
        let client = HttpClient::with_timeout(self.timeout.map(Duration::from_secs))?;
        Ok(client)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = SegfeedArgs::parse();

    // logs go to stderr, stdout may carry the muxed stream
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(if args.verbose {
                    LevelFilter::DEBUG.into()
                } else {
                    LevelFilter::INFO.into()
                })
                .from_env_lossy(),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = args.config()?;
    log::info!(
        "Feeding {} segment(s) of {} from {}",
        config.segments.len(),
        config.segment_id,
        config.base_url
    );

    let mut feeder: SegmentFeeder<SegfeedMuxer> = SegmentFeederBuilder::from_config(config)
        .client(args.client()?)
        .build()?;

    let result = feeder.run(args.target()).await;
    if let Some(mut muxer) = feeder.into_muxer() {
        muxer.finish().await?;
    }
    result?;

    Ok(())
}
