//! Portal lifecycle.
//!
//! The [`PortalLifecycleManager`] brings the access point, the
//! [catch-all DNS responder][crate::dns] and the [portal HTTP server][crate::http] up and down as
//! one unit:
//!
//! ```text
//! Inactive --toggle()--> Activating --> Active --toggle()--> Deactivating --> Inactive
//!                            |
//!                            +--(failure, rolled back)--> Inactive
//! ```
//!
//! Transitions are serialized: a [`toggle`][PortalLifecycleManager::toggle] issued while another
//! is in flight fails with [`Error::TransitionInProgress`]. A transition only completes once every
//! task it stopped has been observed to finish, so the DNS and HTTP ports are free again when
//! `toggle()` returns [`PortalState::Inactive`]. The transition is owned by a spawned task, so a
//! caller giving up on `toggle()` never leaves the portal in [`PortalState::Activating`].
use crate::collaborators::{Collaborators, DisplayToggle};
use crate::config::SharedConfig;
use crate::crash::SharedCrashLog;
use crate::dns::DnsCatchallResponder;
use crate::error::Error;
use crate::http::CaptivePortalHttpServer;
use crate::radio::{AccessPointController, DynRadio};
use crate::task::PortalTask;
use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;
use tokio::sync::{watch, Mutex};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortalState {
    Inactive,
    Activating,
    Active,
    Deactivating,
}

/// Snapshot of the portal for status displays.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerInfo {
    pub ssid: String,
    pub active: bool,
}

/// Where a running portal can be reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortalEndpoints {
    pub address: Ipv4Addr,
    pub dns: SocketAddr,
    pub http: SocketAddr,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortalStatus {
    pub state: PortalState,
    pub endpoints: Option<PortalEndpoints>,
}

/// Everything a transition may have started. Components are recorded as soon as they exist, so
/// teardown finds them even after a partial activation.
struct Components {
    ap: AccessPointController,
    ap_requested: bool,
    dns: Option<PortalTask>,
    http: Option<PortalTask>,
}

impl Components {
    fn is_up(&self) -> bool {
        self.ap_requested || self.dns.is_some() || self.http.is_some()
    }
}

/// State shared by the manager and the transition task it spawns.
struct Shared {
    config: SharedConfig,
    collaborators: Collaborators,
    crash_log: SharedCrashLog,
    ssid: String,
    status: watch::Sender<PortalStatus>,
}

pub struct PortalLifecycleManager {
    shared: Arc<Shared>,
    components: Arc<Mutex<Components>>,
}

impl PortalLifecycleManager {
    pub fn new(
        config: SharedConfig,
        radio: DynRadio,
        collaborators: Collaborators,
        crash_log: SharedCrashLog,
    ) -> Self {
        let ap = AccessPointController::new(&config, radio);
        let (status, _) = watch::channel(PortalStatus {
            state: PortalState::Inactive,
            endpoints: None,
        });
        PortalLifecycleManager {
            shared: Arc::new(Shared {
                ssid: ap.ssid().to_string(),
                config,
                collaborators,
                crash_log,
                status,
            }),
            components: Arc::new(Mutex::new(Components {
                ap,
                ap_requested: false,
                dns: None,
                http: None,
            })),
        }
    }

    pub fn info(&self) -> ServerInfo {
        ServerInfo {
            ssid: self.shared.ssid.clone(),
            active: self.state() == PortalState::Active,
        }
    }

    pub fn state(&self) -> PortalState {
        self.shared.status.borrow().state
    }

    pub fn endpoints(&self) -> Option<PortalEndpoints> {
        self.shared.status.borrow().endpoints
    }

    pub fn subscribe(&self) -> watch::Receiver<PortalStatus> {
        self.shared.status.subscribe()
    }

    pub fn set_display_toggle_callback(&self, callback: impl Fn() + Send + Sync + 'static) {
        let callback: DisplayToggle = Arc::new(callback);
        self.shared.collaborators.set_display_toggle(callback);
    }

    /// Activate the portal if it is inactive, deactivate it otherwise. Returns the state reached.
    ///
    /// The transition runs on its own task. Dropping the returned future does not interrupt it:
    /// it still finishes in [`PortalState::Active`] or [`PortalState::Inactive`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::TransitionInProgress`] if another transition is in flight.
    ///
    /// Returns the activation failure ([`Error::RadioActivationTimeout`],
    /// [`Error::BindFailure`], ...) after rolling back to [`PortalState::Inactive`].
    pub async fn toggle(&self) -> Result<PortalState, Error> {
        let mut components = self
            .components
            .clone()
            .try_lock_owned()
            .map_err(|_| Error::TransitionInProgress)?;
        let shared = self.shared.clone();
        let transition = tokio::spawn(async move {
            if components.is_up() {
                shared.deactivate(&mut components).await;
                Ok::<_, Error>(PortalState::Inactive)
            } else {
                shared.activate(&mut components).await?;
                Ok::<_, Error>(PortalState::Active)
            }
        });
        transition.await.map_err(|err| Error::UnhandledTaskFailure {
            task: "toggle",
            reason: err.to_string(),
        })?
    }

    /// Deactivate the portal if it is up, waiting for any in-flight transition first.
    pub async fn shutdown(&self) {
        let mut components = self.components.lock().await;
        if components.is_up() {
            self.shared.deactivate(&mut components).await;
        }
    }
}

impl Shared {
    fn publish(&self, state: PortalState, endpoints: Option<PortalEndpoints>) {
        tracing::debug!("portal {state:?}");
        self.status.send_replace(PortalStatus { state, endpoints });
    }

    async fn activate(&self, components: &mut Components) -> Result<(), Error> {
        tracing::info!("activating portal \"{}\"", self.ssid);
        self.publish(PortalState::Activating, None);
        match self.bring_up(components).await {
            Ok(endpoints) => {
                tracing::info!(
                    "portal active on {}, DNS {}, HTTP {}",
                    endpoints.address,
                    endpoints.dns,
                    endpoints.http
                );
                self.publish(PortalState::Active, Some(endpoints));
                Ok(())
            }
            Err(err) => {
                tracing::error!("portal activation failed, rolling back: {err}");
                self.tear_down(components).await;
                self.publish(PortalState::Inactive, None);
                Err(err)
            }
        }
    }

    async fn bring_up(&self, components: &mut Components) -> Result<PortalEndpoints, Error> {
        components.ap.configure().await?;
        components.ap_requested = true;
        components.ap.activate().await?;
        let address = components.ap.current_address().await?;
        tracing::info!("access point active with address {address}");

        let responder = DnsCatchallResponder::bind(&self.config, address)?;
        let dns = responder.local_addr()?;
        components.dns = Some(PortalTask::spawn("DNS", self.crash_log.clone(), |token| {
            responder.run(token)
        }));

        let server =
            CaptivePortalHttpServer::bind(self.config.clone(), self.collaborators.clone(), address)?;
        let http = server.local_addr()?;
        components.http = Some(PortalTask::spawn("HTTP", self.crash_log.clone(), |token| {
            server.run(token)
        }));

        Ok(PortalEndpoints { address, dns, http })
    }

    async fn deactivate(&self, components: &mut Components) {
        tracing::info!("deactivating portal \"{}\"", self.ssid);
        self.publish(PortalState::Deactivating, None);
        self.tear_down(components).await;
        self.publish(PortalState::Inactive, None);
        tracing::info!("portal inactive");
    }

    /// Stop whatever is running: the radio first, then the DNS task, then the HTTP task. Each
    /// task is awaited until it has finished.
    async fn tear_down(&self, components: &mut Components) {
        if components.ap_requested {
            if let Err(err) = components.ap.deactivate().await {
                tracing::warn!("unable to deactivate access point: {err}");
            }
            components.ap_requested = false;
        }
        for task in [components.dns.take(), components.http.take()]
            .into_iter()
            .flatten()
        {
            let name = task.name();
            if let Err(err) = task.terminate(self.config.shutdown_grace).await {
                self.crash_log.record(&format!("{name} task"), &err).await;
            }
        }
    }
}
