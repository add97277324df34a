//! Portal Crab
//!
//! A captive portal for devices that are configured over their own Wi-Fi access point.
//!
//! Bringing the portal up activates the access point, starts a [catch-all DNS responder][dns]
//! that resolves every name to the access point's address, and starts the
//! [portal HTTP server][http] on that address. Clients joining the network detect the captive
//! portal and open the device's configuration page. Bringing it down stops all three again.
//!
//! Everything is driven through [`PortalLifecycleManager::toggle`], typically from a button
//! handler on the device.
//!
#![warn(clippy::pedantic)]

#[doc(hidden)]
pub mod banner;
pub mod collaborators;
pub mod config;
pub mod crash;
pub mod dns;
pub mod error;
pub mod http;
pub mod portal;
pub mod radio;
pub mod store;
pub mod task;

pub use collaborators::Collaborators;
pub use config::{Config, SharedConfig};
pub use crash::CrashLog;
pub use portal::{PortalLifecycleManager, PortalState, ServerInfo};
pub use store::{DirLogSource, FileConfigStore, InMemoryConfigStore};
