use std::path::Path;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::{
    error::{SegfeedError, SegfeedResult},
    muxer::MuxerConfig,
    policy::Environment,
    segment::SegmentPlan,
};

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:18080";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeederConfig {
    /// Root of the segment server, `/v1/segment/<id>` is appended to it.
    pub base_url: Url,
    pub segment_id: String,
    pub segments: SegmentPlan,
    pub muxer: MuxerConfig,
    pub environment: Environment,
}

impl Default for FeederConfig {
    fn default() -> Self {
        Self {
            base_url: Url::parse(DEFAULT_BASE_URL).unwrap(),
            segment_id: String::new(),
            segments: SegmentPlan::default(),
            muxer: MuxerConfig::default(),
            environment: Environment::default(),
        }
    }
}

impl FeederConfig {
    pub fn load<P>(path: P) -> SegfeedResult<Self>
    where
        P: AsRef<Path>,
    {
        let data = std::fs::read_to_string(path)?;
        Self::from_toml(&data)
    }

    pub fn from_toml(data: &str) -> SegfeedResult<Self> {
        let config = toml::from_str(data)?;
        Ok(config)
    }

    pub fn validate(&self) -> SegfeedResult<()> {
        if self.segment_id.is_empty() {
            return Err(SegfeedError::InvalidConfig(
                "segment_id is required".to_string(),
            ));
        }
        if self.base_url.cannot_be_a_base() {
            return Err(SegfeedError::InvalidConfig(format!(
                "{} can not be a base url",
                self.base_url
            )));
        }
        self.muxer.validate()
    }
}
