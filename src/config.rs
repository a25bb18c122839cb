use std::time::Duration;

use anyhow::{Context, Result};
use config::{Config as ConfigBuilder, Environment};
use secrecy::SecretString;
use serde::Deserialize;

use crate::poller::PollSettings;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    // Value of the backend's session cookie, e.g. `sid=...`
    pub session_cookie: Option<SecretString>,
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
    // Deployment polling
    #[serde(default = "default_poll_max_attempts")]
    pub poll_max_attempts: u32,
    #[serde(default = "default_poll_delay_ms")]
    pub poll_delay_ms: u64,
    #[serde(default = "default_detail_refresh_secs")]
    pub detail_refresh_secs: u64,
    // HTTP client timeouts
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

fn default_api_base_url() -> String {
    "http://localhost:5000".to_string()
}

fn default_bind_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_poll_max_attempts() -> u32 {
    40
}

fn default_poll_delay_ms() -> u64 {
    2000
}

fn default_detail_refresh_secs() -> u64 {
    5
}

fn default_request_timeout() -> u64 {
    30
}

fn default_connect_timeout() -> u64 {
    15
}

impl Config {
    pub fn load() -> Result<Self> {
        #[cfg(debug_assertions)]
        if let Err(e) = dotenvy::from_filename(".env.local") {
            tracing::debug!(error = %e, ".env.local not loaded");
        }

        Self::from_builder(ConfigBuilder::builder().add_source(Environment::default().separator("__")))
    }

    fn from_builder(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<Self> {
        let config = builder
            .build()
            .context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    pub fn poll_settings(&self) -> PollSettings {
        PollSettings {
            max_attempts: self.poll_max_attempts,
            delay: Duration::from_millis(self.poll_delay_ms),
        }
    }

    pub fn detail_refresh_interval(&self) -> Duration {
        Duration::from_secs(self.detail_refresh_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}
