// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Application configuration.
//
// Raw settings are read once at startup (JSON file, then environment
// overrides) and validated into a `RetentionWindow` that is passed explicitly
// into the sweeper.  Nothing here is global.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{Result, TransientError};

pub const DEFAULT_TTL_HOURS: u64 = 1;
pub const DEFAULT_SWEEP_INTERVAL_MINUTES: u64 = 15;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 300;
pub const DEFAULT_LIST_PAGE_SIZE: u32 = 500;
pub const DEFAULT_MAX_LIST_PAGES: u32 = 100;

/// Upper bounds for operator-supplied windows (ten years and one year).
pub const MAX_TTL_HOURS: u64 = 24 * 365 * 10;
pub const MAX_SWEEP_INTERVAL_MINUTES: u64 = 60 * 24 * 365;

/// Name of the JSON settings file inside the data directory.
pub const CONFIG_FILE: &str = "config.json";

/// Environment variables that override the file settings.
pub const ENV_TTL_HOURS: &str = "TRANSIENT_TTL_HOURS";
pub const ENV_SWEEP_INTERVAL_MINUTES: &str = "TRANSIENT_SWEEP_INTERVAL_MINUTES";
pub const ENV_REQUEST_TIMEOUT_SECS: &str = "TRANSIENT_REQUEST_TIMEOUT_SECS";
pub const ENV_DATA_DIR: &str = "TRANSIENT_DATA_DIR";

/// Persistent application settings as written by the operator.
///
/// Numeric fields are signed so that a bad value (zero, negative) still
/// deserializes and can be replaced by its default during validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Maximum age of a temporary object, in hours.
    pub ttl_hours: i64,
    /// Time between scheduled retention sweeps, in minutes.
    pub sweep_interval_minutes: i64,
    /// Wall-clock bound for a single document request, in seconds.
    pub request_timeout_secs: i64,
    /// Items requested per listing page from the object store.
    pub list_page_size: u32,
    /// Upper bound on listing pages fetched per resource kind per sweep.
    pub max_list_pages: u32,
    /// Where the local object store keeps its files.
    pub data_dir: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            ttl_hours: DEFAULT_TTL_HOURS as i64,
            sweep_interval_minutes: DEFAULT_SWEEP_INTERVAL_MINUTES as i64,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS as i64,
            list_page_size: DEFAULT_LIST_PAGE_SIZE,
            max_list_pages: DEFAULT_MAX_LIST_PAGES,
            data_dir: None,
        }
    }
}

impl AppConfig {
    /// Load `config.json` from `dir`, falling back to defaults when the file
    /// is absent.  Individual fields of the wrong type are dropped with a
    /// warning and take their defaults; a file that is not a JSON object at
    /// all is a `Config` error.
    pub fn load(dir: &Path) -> Result<Self> {
        let path = dir.join(CONFIG_FILE);
        match std::fs::read_to_string(&path) {
            Ok(data) => {
                let config = Self::from_json(&data).map_err(|err| match err {
                    TransientError::Config(detail) => {
                        TransientError::Config(format!("{}: {detail}", path.display()))
                    }
                    other => other,
                })?;
                debug!(path = %path.display(), "configuration loaded");
                Ok(config)
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(err.into()),
        }
    }

    /// Parse settings leniently from JSON text.
    pub fn from_json(data: &str) -> Result<Self> {
        let mut raw: Value = serde_json::from_str(data)
            .map_err(|err| TransientError::Config(format!("not valid JSON: {err}")))?;
        let fields = raw
            .as_object_mut()
            .ok_or_else(|| TransientError::Config("expected a JSON object".to_string()))?;

        fields.retain(|key, value| {
            let usable = field_is_usable(key, value);
            if !usable {
                warn!(setting = %key, %value, "invalid setting, using default");
            }
            usable
        });

        serde_json::from_value(raw).map_err(|err| TransientError::Config(err.to_string()))
    }

    /// Apply overrides from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary key lookup.  Unparsable values are
    /// logged and ignored.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(raw) = lookup(ENV_TTL_HOURS) {
            override_i64(&mut self.ttl_hours, ENV_TTL_HOURS, &raw);
        }
        if let Some(raw) = lookup(ENV_SWEEP_INTERVAL_MINUTES) {
            override_i64(&mut self.sweep_interval_minutes, ENV_SWEEP_INTERVAL_MINUTES, &raw);
        }
        if let Some(raw) = lookup(ENV_REQUEST_TIMEOUT_SECS) {
            override_i64(&mut self.request_timeout_secs, ENV_REQUEST_TIMEOUT_SECS, &raw);
        }
        if let Some(raw) = lookup(ENV_DATA_DIR) {
            let trimmed = raw.trim();
            if !trimmed.is_empty() {
                self.data_dir = Some(PathBuf::from(trimmed));
            }
        }
    }

    /// Validate the retention settings, replacing non-positive values with
    /// their defaults and capping oversized ones.
    pub fn retention_window(&self) -> RetentionWindow {
        let ttl_hours = capped(
            "ttl_hours",
            positive_or_default("ttl_hours", self.ttl_hours, DEFAULT_TTL_HOURS),
            MAX_TTL_HOURS,
        );
        let interval_minutes = capped(
            "sweep_interval_minutes",
            positive_or_default(
                "sweep_interval_minutes",
                self.sweep_interval_minutes,
                DEFAULT_SWEEP_INTERVAL_MINUTES,
            ),
            MAX_SWEEP_INTERVAL_MINUTES,
        );
        RetentionWindow::new(
            Duration::from_secs(ttl_hours * 3600),
            Duration::from_secs(interval_minutes * 60),
        )
    }

    /// Validated per-request timeout.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(positive_or_default(
            "request_timeout_secs",
            self.request_timeout_secs,
            DEFAULT_REQUEST_TIMEOUT_SECS,
        ))
    }

    /// Listing page size, clamped to the provider cap.
    pub fn list_page_size(&self) -> u32 {
        self.list_page_size.clamp(1, DEFAULT_LIST_PAGE_SIZE)
    }

    pub fn max_list_pages(&self) -> u32 {
        self.max_list_pages.max(1)
    }
}

fn override_i64(slot: &mut i64, key: &str, raw: &str) {
    match raw.trim().parse::<i64>() {
        Ok(value) => *slot = value,
        Err(err) => warn!(key, value = raw, %err, "ignoring unparsable override"),
    }
}

/// Whether a raw JSON value can populate the named field.
fn field_is_usable(key: &str, value: &Value) -> bool {
    match key {
        "ttl_hours" | "sweep_interval_minutes" | "request_timeout_secs" => value.is_i64(),
        "list_page_size" | "max_list_pages" => value
            .as_u64()
            .is_some_and(|number| u32::try_from(number).is_ok()),
        "data_dir" => value.is_string() || value.is_null(),
        _ => true,
    }
}

fn positive_or_default(name: &str, value: i64, default: u64) -> u64 {
    if value > 0 {
        value as u64
    } else {
        warn!(setting = name, value, default, "non-positive setting, using default");
        default
    }
}

fn capped(name: &str, value: u64, max: u64) -> u64 {
    if value > max {
        warn!(setting = name, value, max, "setting too large, capping");
        max
    } else {
        value
    }
}

/// How long temporary objects live and how often they are swept.
///
/// Constructed once at startup and never mutated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetentionWindow {
    ttl: Duration,
    interval: Duration,
}

impl RetentionWindow {
    pub fn new(ttl: Duration, interval: Duration) -> Self {
        Self { ttl, interval }
    }

    /// Maximum age before an object is eligible for deletion.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Time between scheduled sweeps.
    pub fn interval(&self) -> Duration {
        self.interval
    }
}

impl Default for RetentionWindow {
    fn default() -> Self {
        Self::new(
            Duration::from_secs(DEFAULT_TTL_HOURS * 3600),
            Duration::from_secs(DEFAULT_SWEEP_INTERVAL_MINUTES * 60),
        )
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn defaults_are_one_hour_and_fifteen_minutes() {
        let window = AppConfig::default().retention_window();
        assert_eq!(window.ttl(), Duration::from_secs(3600));
        assert_eq!(window.interval(), Duration::from_secs(900));
        assert_eq!(window, RetentionWindow::default());
    }

    #[test]
    fn non_positive_values_fall_back_to_defaults() {
        let config = AppConfig {
            ttl_hours: 0,
            sweep_interval_minutes: -5,
            request_timeout_secs: 0,
            ..Default::default()
        };
        let window = config.retention_window();
        assert_eq!(window.ttl(), Duration::from_secs(3600));
        assert_eq!(window.interval(), Duration::from_secs(900));
        assert_eq!(config.request_timeout(), Duration::from_secs(300));
    }

    #[test]
    fn overrides_replace_valid_values_and_skip_garbage() {
        let env: HashMap<&str, &str> = [
            (ENV_TTL_HOURS, "6"),
            (ENV_SWEEP_INTERVAL_MINUTES, "soon"),
            (ENV_DATA_DIR, " /var/lib/transient "),
        ]
        .into_iter()
        .collect();

        let mut config = AppConfig::default();
        config.apply_overrides(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.ttl_hours, 6);
        assert_eq!(config.sweep_interval_minutes, 15);
        assert_eq!(config.data_dir, Some(PathBuf::from("/var/lib/transient")));
    }

    #[test]
    fn partial_json_keeps_defaults_for_missing_fields() {
        let config = AppConfig::from_json(r#"{ "ttl_hours": 24 }"#).unwrap();
        assert_eq!(config.ttl_hours, 24);
        assert_eq!(config.sweep_interval_minutes, 15);
        assert_eq!(config.list_page_size, 500);
    }

    #[test]
    fn page_size_is_capped() {
        let config = AppConfig {
            list_page_size: 10_000,
            ..Default::default()
        };
        assert_eq!(config.list_page_size(), 500);
    }

    #[test]
    fn mistyped_fields_take_their_defaults() {
        let config = AppConfig::from_json(
            r#"{
                "ttl_hours": "two",
                "sweep_interval_minutes": 1.5,
                "request_timeout_secs": 60,
                "list_page_size": -1,
                "max_list_pages": 99999999999,
                "data_dir": 7
            }"#,
        )
        .unwrap();
        assert_eq!(config.ttl_hours, 1);
        assert_eq!(config.sweep_interval_minutes, 15);
        assert_eq!(config.request_timeout_secs, 60);
        assert_eq!(config.list_page_size, 500);
        assert_eq!(config.max_list_pages, 100);
        assert_eq!(config.data_dir, None);
    }

    #[test]
    fn unreadable_file_is_a_config_error() {
        for data in ["{ ttl_hours: 1", "[1, 2]"] {
            let err = AppConfig::from_json(data).unwrap_err();
            assert!(matches!(err, TransientError::Config(_)), "{data}: {err}");
            assert_eq!(err.kind(), crate::error::ErrorKind::BadInput);
        }
    }

    #[test]
    fn load_reads_the_data_dir_file() {
        let dir = std::env::temp_dir().join(format!("transient-config-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        assert_eq!(AppConfig::load(&dir).unwrap().ttl_hours, 1);

        std::fs::write(dir.join(CONFIG_FILE), r#"{ "ttl_hours": "x", "max_list_pages": 3 }"#).unwrap();
        let config = AppConfig::load(&dir).unwrap();
        assert_eq!(config.ttl_hours, 1);
        assert_eq!(config.max_list_pages, 3);

        std::fs::write(dir.join(CONFIG_FILE), "not json").unwrap();
        let err = AppConfig::load(&dir).unwrap_err();
        assert!(err.to_string().contains(CONFIG_FILE));

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn oversized_windows_are_capped() {
        let config = AppConfig {
            ttl_hours: i64::MAX,
            sweep_interval_minutes: i64::MAX / 2,
            ..Default::default()
        };
        let window = config.retention_window();
        assert_eq!(window.ttl(), Duration::from_secs(MAX_TTL_HOURS * 3600));
        assert_eq!(window.interval(), Duration::from_secs(MAX_SWEEP_INTERVAL_MINUTES * 60));
    }
}
