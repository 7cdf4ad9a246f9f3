use std::{collections::HashMap, fs, time::Duration};

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server_url: String,
    pub bearer_token: Option<String>,
    pub upload_timeout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_url: "https://your-api.com".into(),
            bearer_token: None,
            upload_timeout_secs: 30,
        }
    }
}

impl Settings {
    pub fn upload_timeout(&self) -> Duration {
        Duration::from_secs(self.upload_timeout_secs)
    }
}

/// Defaults, overridden by `attendance.toml`, overridden by environment.
pub fn load_settings() -> Settings {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string("attendance.toml") {
        if let Ok(file_cfg) = toml::from_str::<HashMap<String, String>>(&raw) {
            if let Some(v) = file_cfg.get("server_url") {
                settings.server_url = v.clone();
            }
            if let Some(v) = file_cfg.get("bearer_token") {
                settings.bearer_token = Some(v.clone());
            }
            if let Some(v) = file_cfg.get("upload_timeout_secs") {
                if let Ok(parsed) = v.parse::<u64>() {
                    settings.upload_timeout_secs = parsed;
                }
            }
        }
    }

    if let Ok(v) = std::env::var("ATTENDANCE_SERVER_URL") {
        settings.server_url = v;
    }
    if let Ok(v) = std::env::var("ATTENDANCE_BEARER_TOKEN") {
        settings.bearer_token = Some(v);
    }
    if let Ok(v) = std::env::var("ATTENDANCE_UPLOAD_TIMEOUT_SECS") {
        if let Ok(parsed) = v.parse::<u64>() {
            settings.upload_timeout_secs = parsed;
        }
    }

    settings
}

#[cfg(test)]
mod tests {
    use std::env;

    use super::*;

    // Single test so the env mutations cannot race a parallel sibling.
    #[test]
    fn env_overrides_defaults_and_bad_values_are_ignored() {
        env::remove_var("ATTENDANCE_SERVER_URL");
        env::remove_var("ATTENDANCE_BEARER_TOKEN");
        env::remove_var("ATTENDANCE_UPLOAD_TIMEOUT_SECS");

        let defaults = load_settings();
        assert_eq!(defaults.upload_timeout_secs, 30);
        assert!(defaults.bearer_token.is_none());

        env::set_var("ATTENDANCE_SERVER_URL", "http://127.0.0.1:9999");
        env::set_var("ATTENDANCE_BEARER_TOKEN", "token-123");
        env::set_var("ATTENDANCE_UPLOAD_TIMEOUT_SECS", "not-a-number");

        let overridden = load_settings();
        assert_eq!(overridden.server_url, "http://127.0.0.1:9999");
        assert_eq!(overridden.bearer_token.as_deref(), Some("token-123"));
        assert_eq!(overridden.upload_timeout_secs, 30);

        env::set_var("ATTENDANCE_UPLOAD_TIMEOUT_SECS", "5");
        assert_eq!(load_settings().upload_timeout_secs, 5);
        assert_eq!(load_settings().upload_timeout(), Duration::from_secs(5));

        env::remove_var("ATTENDANCE_SERVER_URL");
        env::remove_var("ATTENDANCE_BEARER_TOKEN");
        env::remove_var("ATTENDANCE_UPLOAD_TIMEOUT_SECS");
    }
}
