//! A NetworkManager backed [`Radio`][super::Radio], driven through the `nmcli` command line tool.
use crate::error::Error;
use crate::radio::Radio;
use std::net::Ipv4Addr;
use tokio::process::Command;

const CONNECTION_NAME: &str = "portalcrab-hotspot";

#[derive(Debug, Clone)]
pub struct NmcliRadio {
    ifname: String,
    ssid: String,
    password: String,
}

impl NmcliRadio {
    pub fn new(ifname: String) -> Self {
        NmcliRadio {
            ifname,
            ssid: String::new(),
            password: String::new(),
        }
    }

    async fn nmcli(args: &[&str]) -> Result<String, Error> {
        tracing::debug!("running nmcli {}", args.join(" "));
        let output = Command::new("nmcli").args(args).output().await?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::Radio(format!(
                "nmcli {} failed ({}): {}",
                args.first().unwrap_or(&""),
                output.status,
                stderr.trim()
            )));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// Parse `nmcli -g GENERAL.STATE connection show <name>` output.
fn parse_connection_state(output: &str) -> bool {
    output.lines().any(|line| line.trim() == "activated")
}

/// Parse `nmcli -g IP4.ADDRESS device show <ifname>` output, e.g. `10.42.0.1/24`. Multiple
/// addresses are separated by ` | `; the first IPv4 address wins.
fn parse_ipv4_address(output: &str) -> Option<Ipv4Addr> {
    output
        .split(|c| c == '|' || c == '\n')
        .filter_map(|entry| entry.trim().split('/').next())
        .find_map(|addr| addr.parse().ok())
}

#[async_trait::async_trait]
impl Radio for NmcliRadio {
    async fn configure(&mut self, ssid: &str, password: &str) -> Result<(), Error> {
        self.ssid = ssid.to_string();
        self.password = password.to_string();
        Ok(())
    }

    async fn set_active(&mut self, active: bool) -> Result<(), Error> {
        if active {
            let mut args = vec![
                "device",
                "wifi",
                "hotspot",
                "ifname",
                self.ifname.as_str(),
                "con-name",
                CONNECTION_NAME,
                "ssid",
                self.ssid.as_str(),
            ];
            if !self.password.is_empty() {
                args.extend(["password", self.password.as_str()]);
            }
            Self::nmcli(&args).await?;
        } else {
            Self::nmcli(&["connection", "down", CONNECTION_NAME]).await?;
        }
        Ok(())
    }

    async fn is_active(&self) -> Result<bool, Error> {
        // `connection show` fails for connections that don't exist (yet).
        let args = ["-g", "GENERAL.STATE", "connection", "show", CONNECTION_NAME];
        match Self::nmcli(&args).await {
            Ok(output) => Ok(parse_connection_state(&output)),
            Err(Error::Radio(_)) => Ok(false),
            Err(err) => Err(err),
        }
    }

    async fn ipv4_address(&self) -> Result<Option<Ipv4Addr>, Error> {
        let args = ["-g", "IP4.ADDRESS", "device", "show", self.ifname.as_str()];
        let output = Self::nmcli(&args).await?;
        Ok(parse_ipv4_address(&output))
    }
}
