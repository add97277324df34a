//! Collaborators the portal's HTTP server delegates to.
//!
//! Configuration persistence, log storage and the status display live outside the portal. They
//! are handed to the [`PortalLifecycleManager`][crate::portal::PortalLifecycleManager] at
//! construction as a [`Collaborators`] bundle; host-side implementations are in
//! [`crate::store`].

use crate::error::Error;
use serde_json::{Map, Value};
use std::sync::{Arc, PoisonError, RwLock};

/// A JSON object, as exchanged with the [`ConfigStore`].
pub type ConfigMap = Map<String, Value>;

#[allow(clippy::module_name_repetitions)]
pub type DynConfigStore = Arc<tokio::sync::RwLock<dyn ConfigStore + Send + Sync>>;

pub type DynLogSource = Arc<dyn LogSource + Send + Sync>;

/// Callback invoked by the `/display` route.
pub type DisplayToggle = Arc<dyn Fn() + Send + Sync>;

#[async_trait::async_trait]
pub trait ConfigStore {
    /// The full configuration mapping. The `decorated` member is the view served to the portal
    /// page.
    async fn get_config(&self) -> Result<ConfigMap, Error>;

    /// Apply a (possibly partial) configuration mapping posted by the portal page.
    async fn update_config(&mut self, update: ConfigMap) -> Result<(), Error>;
}

#[async_trait::async_trait]
pub trait LogSource {
    /// The CSV contents of the log named `log_type` (e.g. `msg` or `sys`).
    async fn get_log(&self, log_type: &str) -> Result<String, Error>;
}

#[derive(Clone)]
pub struct Collaborators {
    pub config_store: DynConfigStore,
    pub log_source: DynLogSource,
    display_toggle: Arc<RwLock<Option<DisplayToggle>>>,
}

impl Collaborators {
    pub fn new(config_store: DynConfigStore, log_source: DynLogSource) -> Self {
        Collaborators {
            config_store,
            log_source,
            display_toggle: Arc::default(),
        }
    }

    pub fn set_display_toggle(&self, callback: DisplayToggle) {
        *self
            .display_toggle
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(callback);
    }

    /// Invoke the display toggle callback.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DisplayCallbackUnset`] if no callback was set.
    pub fn toggle_display(&self) -> Result<(), Error> {
        let callback = self
            .display_toggle
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or(Error::DisplayCallbackUnset)?;
        callback();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{InMemoryConfigStore, InMemoryLogSource};
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn display_toggle_must_be_set() {
        let collaborators = Collaborators::new(
            Arc::new(tokio::sync::RwLock::new(InMemoryConfigStore::default())),
            Arc::new(InMemoryLogSource::default()),
        );
        assert!(matches!(
            collaborators.toggle_display(),
            Err(Error::DisplayCallbackUnset)
        ));

        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        collaborators.set_display_toggle(Arc::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        }));
        collaborators.toggle_display().unwrap();
        collaborators.clone().toggle_display().unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
