//! Configuration loading and validation
//!
//! Everything the client needs is injected through the environment. The API
//! credential in particular has no default and is never written to logs.

use crate::error::{AppError, AppResult};
use crate::http_config::DEFAULT_REQUEST_TIMEOUT;
use crate::models::ConferenceDays;
use chrono::{DateTime, Utc};
use log::{info, warn};
use std::env;
use std::fmt;
use std::time::Duration;
use url::Url;

pub const ENV_API_URL: &str = "SCHEDULE_API_URL";
pub const ENV_API_TOKEN: &str = "SCHEDULE_API_TOKEN";
pub const ENV_TIMEOUT_SECS: &str = "SCHEDULE_API_TIMEOUT_SECS";
pub const ENV_DAY_STARTS: &str = "SCHEDULE_DAY_STARTS";
pub const ENV_ALLOW_INSECURE: &str = "SCHEDULE_ALLOW_INSECURE";

#[derive(Clone)]
pub struct ScheduleConfig {
    pub endpoint: Url,
    pub api_token: String,
    pub timeout: Duration,
    pub days: ConferenceDays,
}

impl fmt::Debug for ScheduleConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScheduleConfig")
            .field("endpoint", &self.endpoint.as_str())
            .field("api_token", &"<redacted>")
            .field("timeout", &self.timeout)
            .field("days", &self.days)
            .finish()
    }
}

impl ScheduleConfig {
    pub fn from_env() -> AppResult<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup; `from_env` passes the process environment.
    pub fn from_lookup<F>(lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let allow_insecure = matches!(
            lookup(ENV_ALLOW_INSECURE).as_deref().map(str::trim),
            Some("1") | Some("true") | Some("yes")
        );

        let raw_url = lookup(ENV_API_URL)
            .ok_or_else(|| AppError::config(format!("{} must be set", ENV_API_URL)))?;
        let endpoint = validate_endpoint(&raw_url, allow_insecure)?;

        let api_token = lookup(ENV_API_TOKEN)
            .map(|token| token.trim().to_string())
            .ok_or_else(|| AppError::config(format!("{} must be set", ENV_API_TOKEN)))?;

        let timeout = match lookup(ENV_TIMEOUT_SECS) {
            Some(raw) => {
                let secs: u64 = raw.trim().parse().map_err(|_| {
                    AppError::config(format!("{} must be a whole number of seconds", ENV_TIMEOUT_SECS))
                })?;
                if secs == 0 {
                    return Err(AppError::config(format!("{} must be greater than zero", ENV_TIMEOUT_SECS)));
                }
                Duration::from_secs(secs)
            }
            None => DEFAULT_REQUEST_TIMEOUT,
        };

        let days = match lookup(ENV_DAY_STARTS) {
            Some(raw) => parse_day_starts(&raw)?,
            None => ConferenceDays::default(),
        };

        let config = Self {
            endpoint,
            api_token,
            timeout,
            days,
        };
        validate_config(&config)?;
        Ok(config)
    }
}

/// Parse a comma-separated list of RFC 3339 UTC midnights.
pub fn parse_day_starts(raw: &str) -> AppResult<ConferenceDays> {
    let starts = raw
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            DateTime::parse_from_rfc3339(part)
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|e| AppError::config(format!("invalid day start '{}': {}", part, e)))
        })
        .collect::<AppResult<Vec<_>>>()?;

    ConferenceDays::new(starts)
}

/// Checks the schedule endpoint for format and transport security.
pub fn validate_endpoint(raw: &str, allow_insecure: bool) -> AppResult<Url> {
    if raw.trim().is_empty() {
        return Err(AppError::config("schedule API URL cannot be empty"));
    }

    let url = Url::parse(raw.trim())
        .map_err(|e| AppError::config(format!("invalid schedule API URL: {}", e)))?;

    match url.scheme() {
        "https" => {}
        "http" if allow_insecure => {
            warn!("Schedule API URL uses plain HTTP; the bearer token is sent unencrypted");
        }
        scheme => {
            return Err(AppError::config(format!(
                "schedule API URL must use HTTPS, got '{}://'",
                scheme
            )));
        }
    }

    if url.host_str().map_or(true, str::is_empty) {
        return Err(AppError::config("schedule API URL must have a host"));
    }

    Ok(url)
}

/// Validates a loaded configuration and logs a redacted summary.
pub fn validate_config(config: &ScheduleConfig) -> AppResult<()> {
    if config.api_token.is_empty() {
        return Err(AppError::config(format!("{} cannot be empty", ENV_API_TOKEN)));
    }

    info!(
        "Schedule source: {} (timeout {}s, {} conference days)",
        config.endpoint.host_str().unwrap_or("unknown"),
        config.timeout.as_secs(),
        config.days.len()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DayId;
    use chrono::TimeZone;
    use serial_test::serial;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config = ScheduleConfig::from_lookup(lookup_from(&[
            (ENV_API_URL, "https://api.airtable.com/v0/appXYZ/Schedule"),
            (ENV_API_TOKEN, "patSecret"),
        ]))
        .unwrap();

        assert_eq!(config.timeout, Duration::from_secs(100));
        assert_eq!(config.days, ConferenceDays::default());
        assert_eq!(config.api_token, "patSecret");
    }

    #[test]
    fn test_missing_token_is_rejected() {
        let result = ScheduleConfig::from_lookup(lookup_from(&[(
            ENV_API_URL,
            "https://api.airtable.com/v0/appXYZ/Schedule",
        )]));
        assert!(matches!(result, Err(AppError::Config(msg)) if msg.contains(ENV_API_TOKEN)));

        let blank = ScheduleConfig::from_lookup(lookup_from(&[
            (ENV_API_URL, "https://api.airtable.com/v0/appXYZ/Schedule"),
            (ENV_API_TOKEN, "   "),
        ]));
        assert!(blank.is_err());
    }

    #[test]
    fn test_debug_redacts_token() {
        let config = ScheduleConfig::from_lookup(lookup_from(&[
            (ENV_API_URL, "https://api.airtable.com/v0/appXYZ/Schedule"),
            (ENV_API_TOKEN, "patSecret"),
        ]))
        .unwrap();

        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("patSecret"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn test_http_requires_opt_in() {
        assert!(validate_endpoint("http://127.0.0.1:8080/schedule", false).is_err());
        assert!(validate_endpoint("http://127.0.0.1:8080/schedule", true).is_ok());
        assert!(validate_endpoint("ftp://example.com/schedule", true).is_err());
        assert!(validate_endpoint("  ", false).is_err());
    }

    #[test]
    fn test_custom_timeout_and_days() {
        let config = ScheduleConfig::from_lookup(lookup_from(&[
            (ENV_API_URL, "https://api.airtable.com/v0/appXYZ/Schedule"),
            (ENV_API_TOKEN, "patSecret"),
            (ENV_TIMEOUT_SECS, "5"),
            (ENV_DAY_STARTS, "2025-03-01T00:00:00Z, 2025-03-02T00:00:00Z, 2025-03-03T00:00:00Z"),
        ]))
        .unwrap();

        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.days.len(), 3);
        assert_eq!(
            config.days.window(DayId(3)).unwrap().start,
            Utc.with_ymd_and_hms(2025, 3, 3, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_invalid_timeout() {
        for bad in ["0", "soon", "-3"] {
            let result = ScheduleConfig::from_lookup(lookup_from(&[
                (ENV_API_URL, "https://api.airtable.com/v0/appXYZ/Schedule"),
                (ENV_API_TOKEN, "patSecret"),
                (ENV_TIMEOUT_SECS, bad),
            ]));
            assert!(result.is_err(), "timeout '{}' should be rejected", bad);
        }
    }

    #[test]
    fn test_day_starts_with_offset_are_normalized() {
        // +01:00 midnight is 23:00 UTC, not a UTC midnight
        assert!(parse_day_starts("2024-02-08T00:00:00+01:00").is_err());
        assert!(parse_day_starts("2024-02-08T01:00:00+01:00").is_ok());
    }

    #[test]
    #[serial]
    fn test_from_env() {
        env::set_var(ENV_API_URL, "https://api.airtable.com/v0/appXYZ/Schedule");
        env::set_var(ENV_API_TOKEN, "patFromEnv");
        env::remove_var(ENV_TIMEOUT_SECS);
        env::remove_var(ENV_DAY_STARTS);

        let config = ScheduleConfig::from_env().unwrap();
        assert_eq!(config.api_token, "patFromEnv");

        env::remove_var(ENV_API_TOKEN);
        assert!(ScheduleConfig::from_env().is_err());
        env::remove_var(ENV_API_URL);
    }
}
