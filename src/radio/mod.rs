//! Access point control.
//!
//! The [`AccessPointController`] owns the wireless [`Radio`] exclusively: nothing else in the
//! portal touches the radio, and the controller itself is owned by the
//! [`PortalLifecycleManager`][crate::portal::PortalLifecycleManager].
//!
//! Two backends are provided, [`loopback::LoopbackRadio`] for hosts without access point
//! hardware and [`nmcli::NmcliRadio`] for Linux hosts running NetworkManager.

use crate::config::{Config, RadioConfig};
use crate::error::Error;
use std::net::Ipv4Addr;
use std::time::Duration;

pub mod loopback;
pub mod nmcli;

pub use loopback::LoopbackRadio;
pub use nmcli::NmcliRadio;

pub type DynRadio = Box<dyn Radio + Send + Sync>;

/// An async trait describing a wireless radio that can host an access point.
#[async_trait::async_trait]
pub trait Radio {
    /// Set the credentials used the next time the access point is activated.
    async fn configure(&mut self, ssid: &str, password: &str) -> Result<(), Error>;

    /// Request activation or deactivation. Activation may complete asynchronously, see
    /// [`Radio::is_active`].
    async fn set_active(&mut self, active: bool) -> Result<(), Error>;

    /// Whether the access point is up and serving.
    async fn is_active(&self) -> Result<bool, Error>;

    /// The IPv4 address assigned to the access point interface, if any.
    async fn ipv4_address(&self) -> Result<Option<Ipv4Addr>, Error>;
}

/// Build the radio backend selected by `config`.
pub fn from_config(config: &Config) -> DynRadio {
    match &config.radio {
        RadioConfig::Loopback { address } => Box::new(LoopbackRadio::new(*address)),
        RadioConfig::Nmcli { ifname } => Box::new(NmcliRadio::new(ifname.clone())),
    }
}

pub struct AccessPointController {
    radio: DynRadio,
    ssid: String,
    password: String,
    activation_timeout: Duration,
    poll_interval: Duration,
}

impl AccessPointController {
    pub fn new(config: &Config, radio: DynRadio) -> Self {
        AccessPointController {
            radio,
            ssid: config.ssid.clone(),
            password: config.password.clone(),
            activation_timeout: config.activation_timeout,
            poll_interval: config.activation_poll_interval,
        }
    }

    pub fn ssid(&self) -> &str {
        &self.ssid
    }

    pub async fn configure(&mut self) -> Result<(), Error> {
        self.radio.configure(&self.ssid, &self.password).await
    }

    /// Request activation and wait until the radio reports itself active.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RadioActivationTimeout`] if the radio is not active within the
    /// configured activation timeout. The radio is left as it was, callers roll back.
    pub async fn activate(&mut self) -> Result<(), Error> {
        self.radio.set_active(true).await?;
        let radio = &self.radio;
        let poll_interval = self.poll_interval;
        let wait_active = async {
            while !radio.is_active().await? {
                tokio::time::sleep(poll_interval).await;
            }
            Ok::<(), Error>(())
        };
        match tokio::time::timeout(self.activation_timeout, wait_active).await {
            Ok(res) => res,
            Err(_) => Err(Error::RadioActivationTimeout(self.activation_timeout)),
        }
    }

    pub async fn deactivate(&mut self) -> Result<(), Error> {
        self.radio.set_active(false).await
    }

    /// The address assigned to the access point.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RadioInactive`] unless the radio is active and has an address.
    pub async fn current_address(&self) -> Result<Ipv4Addr, Error> {
        if !self.radio.is_active().await? {
            return Err(Error::RadioInactive);
        }
        self.radio.ipv4_address().await?.ok_or(Error::RadioInactive)
    }
}
