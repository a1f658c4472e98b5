use regex::Regex;
use serde::{Deserialize, Serialize};

/// Describes the runtime the feeder runs in, the way a browser exposes
/// `navigator.userAgent` and `navigator.vendor`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Environment {
    pub user_agent: String,
    pub vendor: String,
}

impl Environment {
    pub fn new<U, V>(user_agent: U, vendor: V) -> Self
    where
        U: Into<String>,
        V: Into<String>,
    {
        Self {
            user_agent: user_agent.into(),
            vendor: vendor.into(),
        }
    }
}

/// Decides whether a muxer internal error should be answered with a reset.
pub trait ResetPolicy: Send + Sync {
    fn should_reset(&self, env: &Environment) -> bool;
}

impl<F> ResetPolicy for F
where
    F: Fn(&Environment) -> bool + Send + Sync,
{
    fn should_reset(&self, env: &Environment) -> bool {
        self(env)
    }
}

/// Resets on Safari shipped by Apple, whose media decoder needs its state
/// discarded after an internal error.
pub struct SafariPolicy {
    user_agent: Regex,
    vendor: Regex,
}

impl SafariPolicy {
    pub fn new() -> Self {
        Self {
            user_agent: Regex::new("Safari").unwrap(),
            vendor: Regex::new("Apple Computer").unwrap(),
        }
    }
}

impl Default for SafariPolicy {
    fn default() -> Self {
        Self::new()
    }
}

impl ResetPolicy for SafariPolicy {
    fn should_reset(&self, env: &Environment) -> bool {
        self.user_agent.is_match(&env.user_agent) && self.vendor.is_match(&env.vendor)
    }
}

pub struct NeverReset;

impl ResetPolicy for NeverReset {
    fn should_reset(&self, _env: &Environment) -> bool {
        false
    }
}
