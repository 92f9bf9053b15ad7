use crate::supervisor::RetryPolicy;
use beam_core::IceServerConfig;
use beam_core::utils::{DEFAULT_STUN_ADDR, DEFAULT_STUN_ADDR_2};
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// How long an interrupted transport may take to recover on its own.
    pub grace_period: Duration,
    /// Upper bound for reaching `Connected` after a transport is opened.
    pub negotiation_timeout: Duration,
    pub retry: RetryPolicy,
    /// Used until the relay pushes its own list.
    pub ice_servers: Vec<IceServerConfig>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            grace_period: Duration::from_secs(3),
            negotiation_timeout: Duration::from_secs(15),
            retry: RetryPolicy::default(),
            ice_servers: vec![
                IceServerConfig::stun(DEFAULT_STUN_ADDR),
                IceServerConfig::stun(DEFAULT_STUN_ADDR_2),
            ],
        }
    }
}
