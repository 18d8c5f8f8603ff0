//! Constants and environment-driven settings.
//!
//! `.env` is loaded by the binary before [`Settings::from_env`] runs, so every
//! value here can come from the process environment or a local `.env` file.

use crate::models::Ipv4;
use chrono_tz::Tz;
use std::env;
use std::error::Error;
use std::net::Ipv4Addr;
use std::path::PathBuf;

/// Maximum number of addresses produced when expanding WAN subnets.
pub const DEFAULT_EXPAND_LIMIT: usize = 512;
/// Range every internal address must fall in.
pub const DEFAULT_INTERNAL_RANGE: Ipv4 = Ipv4 {
    addr: Ipv4Addr::new(172, 16, 0, 0),
    mask: 16,
};
/// JSON document holding servers, lookups and pools.
pub const DEFAULT_STORE_FILE: &str = "dc_servers.json";
/// Days a soft-deleted server stays in the trash before `purge --expired`.
pub const DEFAULT_TRASH_RETENTION_DAYS: u32 = 30;
/// Longest accepted retention, one hundred years.
pub const MAX_TRASH_RETENTION_DAYS: u32 = 36_500;
/// Zone used when rendering timestamps for people.
pub const DEFAULT_TIMEZONE: &str = "Asia/Jerusalem";

pub const ENV_STORE: &str = "DC_SERVERS_STORE";
pub const ENV_EXPAND_LIMIT: &str = "DC_SERVERS_EXPAND_LIMIT";
pub const ENV_INTERNAL_RANGE: &str = "DC_SERVERS_INTERNAL_RANGE";
pub const ENV_TRASH_RETENTION_DAYS: &str = "DC_SERVERS_TRASH_RETENTION_DAYS";
pub const ENV_TIMEZONE: &str = "DC_SERVERS_TZ";

/// Runtime settings.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub store_file: PathBuf,
    pub expand_limit: usize,
    pub internal_range: Ipv4,
    pub trash_retention_days: u32,
    pub timezone: Tz,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            store_file: PathBuf::from(DEFAULT_STORE_FILE),
            expand_limit: DEFAULT_EXPAND_LIMIT,
            internal_range: DEFAULT_INTERNAL_RANGE,
            trash_retention_days: DEFAULT_TRASH_RETENTION_DAYS,
            timezone: chrono_tz::Asia::Jerusalem,
        }
    }
}

impl Settings {
    /// Read settings from the process environment.
    pub fn from_env() -> Result<Settings, Box<dyn Error>> {
        Settings::from_lookup(|key| env::var(key).ok())
    }

    /// Build settings from any key lookup; unset keys keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Settings, Box<dyn Error>>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = Settings::default();

        if let Some(path) = lookup(ENV_STORE) {
            settings.store_file = PathBuf::from(path);
        }
        if let Some(limit) = lookup(ENV_EXPAND_LIMIT) {
            settings.expand_limit = limit
                .trim()
                .parse()
                .map_err(|e| format!("{ENV_EXPAND_LIMIT}={limit}: {e}"))?;
        }
        if let Some(range) = lookup(ENV_INTERNAL_RANGE) {
            settings.internal_range =
                Ipv4::new(&range).map_err(|e| format!("{ENV_INTERNAL_RANGE}={range}: {e}"))?;
        }
        if let Some(days) = lookup(ENV_TRASH_RETENTION_DAYS) {
            let parsed: u32 = days
                .trim()
                .parse()
                .map_err(|e| format!("{ENV_TRASH_RETENTION_DAYS}={days}: {e}"))?;
            if parsed > MAX_TRASH_RETENTION_DAYS {
                return Err(format!(
                    "{ENV_TRASH_RETENTION_DAYS}={days}: more than {MAX_TRASH_RETENTION_DAYS} days"
                )
                .into());
            }
            settings.trash_retention_days = parsed;
        }
        if let Some(tz) = lookup(ENV_TIMEZONE) {
            settings.timezone = tz
                .trim()
                .parse()
                .map_err(|e| format!("{ENV_TIMEZONE}={tz}: {e}"))?;
        }

        log::debug!("settings: {:?}", settings);
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::from_lookup(|_| None).unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.internal_range, DEFAULT_INTERNAL_RANGE);
        assert_eq!(DEFAULT_INTERNAL_RANGE.to_string(), "172.16.0.0/16");
        assert_eq!(settings.timezone.name(), DEFAULT_TIMEZONE);
    }

    #[test]
    fn test_overrides() {
        let settings = Settings::from_lookup(lookup_from(&[
            (ENV_STORE, "/tmp/servers.json"),
            (ENV_EXPAND_LIMIT, "64"),
            (ENV_INTERNAL_RANGE, "10.20.0.0/16"),
            (ENV_TRASH_RETENTION_DAYS, "7"),
            (ENV_TIMEZONE, "Pacific/Auckland"),
        ]))
        .unwrap();
        assert_eq!(settings.store_file, PathBuf::from("/tmp/servers.json"));
        assert_eq!(settings.expand_limit, 64);
        assert_eq!(settings.internal_range.to_string(), "10.20.0.0/16");
        assert_eq!(settings.trash_retention_days, 7);
        assert_eq!(settings.timezone, chrono_tz::Pacific::Auckland);
    }

    #[test]
    fn test_invalid_values_are_errors() {
        assert!(Settings::from_lookup(lookup_from(&[(ENV_EXPAND_LIMIT, "many")])).is_err());
        assert!(Settings::from_lookup(lookup_from(&[(ENV_INTERNAL_RANGE, "10.0.0.0")])).is_err());
        assert!(Settings::from_lookup(lookup_from(&[(ENV_TIMEZONE, "Mars/Olympus")])).is_err());
    }

    #[test]
    fn test_trash_retention_bounds() {
        for bad in ["-5", "999999999999", "36501", "1.5"] {
            assert!(
                Settings::from_lookup(lookup_from(&[(ENV_TRASH_RETENTION_DAYS, bad)])).is_err(),
                "{bad} should be rejected"
            );
        }
        let zero = Settings::from_lookup(lookup_from(&[(ENV_TRASH_RETENTION_DAYS, "0")])).unwrap();
        assert_eq!(zero.trash_retention_days, 0);
        let max = Settings::from_lookup(lookup_from(&[(ENV_TRASH_RETENTION_DAYS, "36500")])).unwrap();
        assert_eq!(max.trash_retention_days, MAX_TRASH_RETENTION_DAYS);
    }
}
