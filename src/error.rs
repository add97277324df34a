//! Error types.

use crate::dns::codec::FrameError;
use std::net::SocketAddr;
use std::time::Duration;

/// Error enumerates the possible portal error states.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Returned when an inbound DNS datagram can't be decoded. The datagram is dropped and the
    /// responder keeps running.
    #[error("malformed DNS frame: {0}")]
    MalformedFrame(#[from] FrameError),

    /// Returned when the DNS responder's UDP socket or the HTTP server's TCP listener can't be
    /// bound, e.g. because the port is in use or the process lacks the privilege to bind it.
    #[error("unable to bind {addr}")]
    BindFailure {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    /// Returned when the radio did not report itself active within
    /// [`Config::activation_timeout`][crate::config::Config::activation_timeout].
    #[error("access point did not become active within {0:?}")]
    RadioActivationTimeout(Duration),

    /// Returned when the assigned address is requested from a radio that is not active.
    #[error("access point is not active")]
    RadioInactive,

    /// Returned when a [`Radio`][crate::radio::Radio] backend fails.
    #[error("radio error: {0}")]
    Radio(String),

    /// Returned when a `/log` or `/scripts` path contains a parent-directory segment.
    #[error("path \"{0}\" is not allowed")]
    PathTraversalAttempt(String),

    /// Returned when clients `POST` a `/data` body that isn't a JSON object.
    #[error("invalid configuration body: {0}")]
    ConfigDecode(#[source] serde_json::Error),

    /// Returned when `/display` is requested before a display toggle callback was set.
    #[error("display toggle callback is not set")]
    DisplayCallbackUnset,

    /// Returned when the log source has no log of the requested type.
    #[error("no log found for \"{0}\"")]
    LogNotFound(String),

    /// Returned when a static file served by the portal doesn't exist.
    #[error("file \"{0}\" not found")]
    FileNotFound(String),

    /// Returned when the configuration store's mapping has no `decorated` member.
    #[error("configuration has no decorated view")]
    MissingDecoratedView,

    /// Returned by [`PortalLifecycleManager::toggle`][crate::portal::PortalLifecycleManager::toggle]
    /// while another transition is still in flight.
    #[error("a portal transition is already in progress")]
    TransitionInProgress,

    /// Returned when a portal task panicked or could not be joined.
    #[error("{task} task failed: {reason}")]
    UnhandledTaskFailure { task: &'static str, reason: String },

    /// Returned when a loaded [`Config`][crate::config::Config] fails validation.
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    /// Returned when a generic IO error occurs.
    #[error("an IO error occurred")]
    IO(#[from] std::io::Error),

    /// Returned when processing JSON from disk fails due to invalid JSON content.
    #[error("invalid JSON")]
    InvalidJSON(#[from] serde_json::Error),

    /// Returned when the HTTP server fails while serving.
    #[error("HTTP server error")]
    Http(#[from] hyper::Error),
}
