use crate::error::Error;
use serde::Deserialize;
use serde_with::{serde_as, DurationMilliSeconds, DurationSeconds};
use std::fs::File;
use std::io::BufReader;
use std::net::Ipv4Addr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

pub type SharedConfig = Arc<Config>;

const MAX_SSID_BYTES: usize = 32;
const WPA2_PASSPHRASE_CHARS: std::ops::RangeInclusive<usize> = 8..=63;

#[serde_as]
#[derive(Deserialize, Debug, Clone)]
pub struct Config {
    pub ssid: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub radio: RadioConfig,
    #[serde(default)]
    pub start_active: bool,

    #[serde(default = "default_dns_port")]
    pub dns_port: u16,
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    #[serde(default = "default_dns_backoff")]
    pub dns_backoff: Duration,
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    #[serde(default = "default_dns_yield")]
    pub dns_yield: Duration,

    #[serde(default = "default_http_port")]
    pub http_port: u16,
    #[serde_as(as = "DurationSeconds<u64>")]
    #[serde(default = "default_http_timeout")]
    pub http_timeout: Duration,
    #[serde(default = "default_html_path")]
    pub html_path: PathBuf,
    #[serde(default = "default_scripts_dir")]
    pub scripts_dir: PathBuf,

    #[serde_as(as = "DurationMilliSeconds<u64>")]
    #[serde(default = "default_activation_timeout")]
    pub activation_timeout: Duration,
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    #[serde(default = "default_activation_poll_interval")]
    pub activation_poll_interval: Duration,
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    #[serde(default = "default_shutdown_grace")]
    pub shutdown_grace: Duration,

    pub config_state_path: Option<PathBuf>,
    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,
    #[serde(default = "default_max_log_bytes")]
    pub max_log_bytes: u64,
    pub crash_log_path: Option<PathBuf>,
}

/// Selects the [`Radio`][crate::radio::Radio] backend driving the access point.
#[derive(Deserialize, Debug, Clone)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RadioConfig {
    /// No AP hardware: the portal is served on a fixed local address.
    Loopback { address: Ipv4Addr },
    /// A NetworkManager managed wireless interface.
    Nmcli { ifname: String },
}

impl Default for RadioConfig {
    fn default() -> Self {
        RadioConfig::Loopback {
            address: Ipv4Addr::LOCALHOST,
        }
    }
}

fn default_dns_port() -> u16 {
    53
}

fn default_dns_backoff() -> Duration {
    Duration::from_millis(50)
}

fn default_dns_yield() -> Duration {
    Duration::from_millis(10)
}

fn default_http_port() -> u16 {
    80
}

fn default_http_timeout() -> Duration {
    Duration::from_secs(10)
}

fn default_html_path() -> PathBuf {
    PathBuf::from("server/index.html")
}

fn default_scripts_dir() -> PathBuf {
    PathBuf::from("server/scripts")
}

fn default_activation_timeout() -> Duration {
    Duration::from_secs(10)
}

fn default_activation_poll_interval() -> Duration {
    Duration::from_millis(50)
}

fn default_shutdown_grace() -> Duration {
    Duration::from_secs(2)
}

fn default_log_dir() -> PathBuf {
    PathBuf::from("logs")
}

fn default_max_log_bytes() -> u64 {
    64 * 1024
}

impl Config {
    pub fn try_from_file(p: impl AsRef<Path>) -> Result<Self, Error> {
        let f = File::open(p)?;
        let reader = BufReader::new(f);
        let conf: Config = serde_json::from_reader(reader)?;
        conf.validate()?;
        Ok(conf)
    }

    /// A config with every optional field at its default, for the given AP credentials.
    pub fn new(ssid: impl Into<String>, password: impl Into<String>) -> Self {
        Config {
            ssid: ssid.into(),
            password: password.into(),
            radio: RadioConfig::default(),
            start_active: false,
            dns_port: default_dns_port(),
            dns_backoff: default_dns_backoff(),
            dns_yield: default_dns_yield(),
            http_port: default_http_port(),
            http_timeout: default_http_timeout(),
            html_path: default_html_path(),
            scripts_dir: default_scripts_dir(),
            activation_timeout: default_activation_timeout(),
            activation_poll_interval: default_activation_poll_interval(),
            shutdown_grace: default_shutdown_grace(),
            config_state_path: None,
            log_dir: default_log_dir(),
            max_log_bytes: default_max_log_bytes(),
            crash_log_path: None,
        }
    }

    pub fn validate(&self) -> Result<(), Error> {
        if self.ssid.is_empty() || self.ssid.len() > MAX_SSID_BYTES {
            return Err(Error::InvalidConfig(format!(
                "ssid must be 1 to {MAX_SSID_BYTES} bytes, found {}",
                self.ssid.len()
            )));
        }
        let pw_chars = self.password.chars().count();
        if pw_chars != 0 && !WPA2_PASSPHRASE_CHARS.contains(&pw_chars) {
            return Err(Error::InvalidConfig(format!(
                "password must be empty or 8 to 63 characters, found {pw_chars}"
            )));
        }
        if self.activation_poll_interval.is_zero() {
            return Err(Error::InvalidConfig(
                "activation_poll_interval must be non-zero".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_fill_missing_fields() {
        let conf: Config = serde_json::from_str(r#"{"ssid":"freakwan"}"#).unwrap();
        assert_eq!(conf.dns_port, 53);
        assert_eq!(conf.http_port, 80);
        assert_eq!(conf.dns_backoff, Duration::from_millis(50));
        assert_eq!(conf.activation_timeout, Duration::from_secs(10));
        assert!(matches!(
            conf.radio,
            RadioConfig::Loopback { address } if address == Ipv4Addr::LOCALHOST
        ));
        assert!(conf.validate().is_ok());
    }

    #[test]
    fn parses_nmcli_radio_and_durations() {
        let conf: Config = serde_json::from_str(
            r#"{
                "ssid": "freakwan",
                "password": "correct horse",
                "radio": { "kind": "nmcli", "ifname": "wlan0" },
                "dns_backoff": 20,
                "http_timeout": 3
            }"#,
        )
        .unwrap();
        assert!(matches!(conf.radio, RadioConfig::Nmcli { ref ifname } if ifname == "wlan0"));
        assert_eq!(conf.dns_backoff, Duration::from_millis(20));
        assert_eq!(conf.http_timeout, Duration::from_secs(3));
    }

    #[test]
    fn rejects_bad_credentials() {
        assert!(Config::new("", "").validate().is_err());
        assert!(Config::new("a".repeat(33), "").validate().is_err());
        assert!(Config::new("freakwan", "short").validate().is_err());
        assert!(Config::new("freakwan", "").validate().is_ok());
        assert!(Config::new("freakwan", "longenough").validate().is_ok());
    }
}
