use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{SegfeedError, SegfeedResult};

/// Container the segment server wraps the requested frames in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum VideoType {
    MpegTs,
    Mp4,
    #[default]
    Raw,
}

impl VideoType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MpegTs => "MpegTs",
            Self::Mp4 => "Mp4",
            Self::Raw => "Raw",
        }
    }
}

impl fmt::Display for VideoType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VideoType {
    type Err = SegfeedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "MpegTs" => Ok(Self::MpegTs),
            "Mp4" => Ok(Self::Mp4),
            "Raw" => Ok(Self::Raw),
            _ => Err(SegfeedError::InvalidVideoType(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentRequest {
    pub offset: u64,
    pub length: u64,
    #[serde(default)]
    pub video_type: VideoType,
}

impl SegmentRequest {
    pub fn new(offset: u64, length: u64, video_type: VideoType) -> Self {
        Self {
            offset,
            length,
            video_type,
        }
    }

    pub fn raw(offset: u64, length: u64) -> Self {
        Self::new(offset, length, VideoType::Raw)
    }

    /// Renders `<base>/v1/segment/<id>?offset=..&length=..&video_type=..`.
    ///
    /// Any path already present on `base` is kept as a prefix.
    pub fn to_url(&self, base: &Url, id: &str) -> SegfeedResult<Url> {
        let mut url = base.clone();
        url.path_segments_mut()
            .map_err(|_| SegfeedError::InvalidConfig(format!("{base} can not be a base url")))?
            .pop_if_empty()
            .extend(["v1", "segment", id]);
        url.set_query(None);
        url.query_pairs_mut()
            .append_pair("offset", &self.offset.to_string())
            .append_pair("length", &self.length.to_string())
            .append_pair("video_type", self.video_type.as_str());
        Ok(url)
    }
}

/// Ordered list of segments to fetch and feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SegmentPlan(Vec<SegmentRequest>);

impl SegmentPlan {
    pub fn new(segments: Vec<SegmentRequest>) -> Self {
        Self(segments)
    }

    /// `count` back-to-back segments of `length` starting at `start`.
    pub fn contiguous(start: u64, length: u64, count: usize, video_type: VideoType) -> Self {
        let segments = (0..count as u64)
            .map(|i| SegmentRequest::new(start + i * length, length, video_type))
            .collect();
        Self(segments)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SegmentRequest> {
        self.0.iter()
    }
}

impl Default for SegmentPlan {
    fn default() -> Self {
        Self::contiguous(0, 10000, 2, VideoType::Raw)
    }
}

impl<'a> IntoIterator for &'a SegmentPlan {
    type Item = &'a SegmentRequest;
    type IntoIter = std::slice::Iter<'a, SegmentRequest>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
