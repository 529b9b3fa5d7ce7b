use std::env;
use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::common::ViewerRole;
use crate::render::time::DEFAULT_OFFSET_HOURS;

pub const DEFAULT_CONFIG_PATH: &str = "config/chat.json";
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 3000;

pub const ENV_BASE_URL: &str = "SKILLSWAP_BASE_URL";
pub const ENV_SESSION_COOKIE: &str = "SKILLSWAP_SESSION_COOKIE";
pub const ENV_ROLE: &str = "SKILLSWAP_ROLE";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub base_url: String,
    pub role: ViewerRole,
    pub poll_interval_ms: u64,
    pub request_timeout_secs: u64,
    /// Hours added to server UTC timestamps for display.
    pub display_offset_hours: i32,
    /// Raw `Cookie` header carrying the server's login session.
    pub session_cookie: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:5000".to_string(),
            role: ViewerRole::User,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            request_timeout_secs: 10,
            display_offset_hours: DEFAULT_OFFSET_HOURS,
            session_cookie: None,
        }
    }
}

impl AppConfig {
    pub fn poll_interval(&self) -> Duration {
        // A zero interval would spin the poller.
        Duration::from_millis(self.poll_interval_ms.max(250))
    }

    /// Applies `SKILLSWAP_*` variables on top of the file values.
    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| env::var(key).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup(ENV_BASE_URL).filter(|url| !url.trim().is_empty()) {
            self.base_url = url.trim().to_string();
        }
        if let Some(cookie) = lookup(ENV_SESSION_COOKIE).filter(|c| !c.trim().is_empty()) {
            self.session_cookie = Some(cookie.trim().to_string());
        }
        if let Some(role) = lookup(ENV_ROLE) {
            match role.parse::<ViewerRole>() {
                Ok(role) => self.role = role,
                Err(err) => log::warn!("Ignoring {ENV_ROLE}: {err}"),
            }
        }
    }
}

pub fn load_config(path: &str) -> AppConfig {
    let path = Path::new(path);
    match fs::read_to_string(path) {
        Ok(content) => match serde_json::from_str::<AppConfig>(&content) {
            Ok(config) => config,
            Err(err) => {
                log::warn!("Failed to parse config file {}: {err}", path.display());
                AppConfig::default()
            }
        },
        Err(err) => {
            log::info!(
                "Config file {} not found ({err}); using defaults",
                path.display()
            );
            AppConfig::default()
        }
    }
}
