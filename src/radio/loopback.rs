//! A [`Radio`][super::Radio] stand-in for hosts without access point hardware.
//!
//! The "access point" is whatever network the host is already on: activation only flips a flag
//! and the reported address is fixed at construction.
use crate::error::Error;
use crate::radio::Radio;
use std::net::Ipv4Addr;
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Clone)]
pub struct LoopbackRadio {
    address: Ipv4Addr,
    activation_delay: Duration,
    never_activates: bool,
    activated_at: Option<Instant>,
    ssid: Option<String>,
}

impl LoopbackRadio {
    pub fn new(address: Ipv4Addr) -> Self {
        LoopbackRadio {
            address,
            activation_delay: Duration::ZERO,
            never_activates: false,
            activated_at: None,
            ssid: None,
        }
    }

    /// Report active only once `delay` has passed since activation was requested.
    #[must_use]
    pub fn with_activation_delay(mut self, delay: Duration) -> Self {
        self.activation_delay = delay;
        self
    }

    /// Accept activation requests but never report active.
    #[must_use]
    pub fn never_activating(mut self) -> Self {
        self.never_activates = true;
        self
    }

    pub fn ssid(&self) -> Option<&str> {
        self.ssid.as_deref()
    }
}

#[async_trait::async_trait]
impl Radio for LoopbackRadio {
    async fn configure(&mut self, ssid: &str, _password: &str) -> Result<(), Error> {
        self.ssid = Some(ssid.to_string());
        Ok(())
    }

    async fn set_active(&mut self, active: bool) -> Result<(), Error> {
        self.activated_at = active.then(Instant::now);
        Ok(())
    }

    async fn is_active(&self) -> Result<bool, Error> {
        Ok(!self.never_activates
            && self
                .activated_at
                .map_or(false, |at| at.elapsed() >= self.activation_delay))
    }

    async fn ipv4_address(&self) -> Result<Option<Ipv4Addr>, Error> {
        Ok(self.is_active().await?.then_some(self.address))
    }
}
