//! A JSON file-backed implementation of the [`ConfigStore`][crate::collaborators::ConfigStore]
//! trait.
//!
//! Wraps a [`InMemoryConfigStore`][super::memory::InMemoryConfigStore] instance, persisting
//! updates to a JSON file on disk that can be reloaded across restarts.
use crate::collaborators::{ConfigMap, ConfigStore};
use crate::error::Error;
use crate::store::memory::InMemoryConfigStore;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs::File;
use tokio::io;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

/// A file-backed configuration store. After each update the JSON file on disk is rewritten with
/// the merged configuration.
#[derive(Default, Debug, Clone)]
pub struct FileConfigStore {
    config_store: InMemoryConfigStore,
    path: PathBuf,
}

impl FileConfigStore {
    /// Save the configuration as JSON to the store's configured path, or return an Error.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IO`] if the configuration can't be written to the backing file path.
    pub async fn save(&self) -> Result<(), Error> {
        let data = serde_json::to_string_pretty(&self.config_store)?;
        let mut output_file = File::create(&self.path).await?;
        output_file.write_all(data.as_bytes()).await?;
        output_file.flush().await?;
        Ok(())
    }

    /// Load a [`FileConfigStore`] from the JSON located at the given path, creating an empty
    /// configuration file if there is none yet.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidJSON`] if the file isn't a JSON object.
    ///
    /// Returns [`Error::IO`] if the path can't be opened or read.
    pub async fn try_from_file(p: impl AsRef<Path>) -> Result<Self, Error> {
        let p = p.as_ref();
        let contents = match File::open(p).await {
            Ok(mut f) => {
                let mut buf = vec![];
                f.read_to_end(&mut buf).await?;
                buf
            }
            Err(err) => match err.kind() {
                ErrorKind::NotFound => Self::write_empty_state(File::create(p).await?).await?,
                _ => return Err(Error::IO(err)),
            },
        };

        let config: ConfigMap = serde_json::from_slice(&contents)?;
        Ok(Self {
            path: p.to_path_buf(),
            config_store: InMemoryConfigStore::new(config),
        })
    }

    async fn write_empty_state(mut f: File) -> io::Result<Vec<u8>> {
        let default_data = serde_json::to_string_pretty(&InMemoryConfigStore::default())?;
        let default_bytes = default_data.as_bytes();
        f.write_all(default_bytes).await?;
        f.flush().await?;
        Ok(default_bytes.to_vec())
    }
}

#[async_trait::async_trait]
impl ConfigStore for FileConfigStore {
    async fn get_config(&self) -> Result<ConfigMap, Error> {
        self.config_store.get_config().await
    }

    async fn update_config(&mut self, update: ConfigMap) -> Result<(), Error> {
        self.config_store.update_config(update).await?;
        self.save().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    #[tokio::test]
    async fn updates_survive_reload() {
        let path = std::env::temp_dir().join(format!(
            "portalcrab-config-{}.json",
            std::process::id()
        ));
        let _ = tokio::fs::remove_file(&path).await;

        let mut store = FileConfigStore::try_from_file(&path).await.unwrap();
        let Value::Object(update) = json!({ "ap": { "ssid": "newnet" } }) else {
            unreachable!()
        };
        store.update_config(update).await.unwrap();

        let reloaded = FileConfigStore::try_from_file(&path).await.unwrap();
        let view = reloaded.get_config().await.unwrap();
        assert_eq!(view["plain"]["ap"]["ssid"], "newnet");
        let _ = tokio::fs::remove_file(&path).await;
    }
}
