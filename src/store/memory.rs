use crate::collaborators::{ConfigMap, ConfigStore, LogSource};
use crate::error::Error;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

const SECRET_KEYS: [&str; 4] = ["pw", "pass", "password", "key"];
const MAX_MASK_LEN: usize = 8;

#[derive(Default, Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InMemoryConfigStore {
    config: ConfigMap,
}

impl InMemoryConfigStore {
    pub fn new(config: ConfigMap) -> Self {
        InMemoryConfigStore { config }
    }

    pub fn plain(&self) -> &ConfigMap {
        &self.config
    }

    fn is_secret(key: &str) -> bool {
        SECRET_KEYS.contains(&key)
    }

    fn is_mask(value: &Value) -> bool {
        matches!(value, Value::String(s) if !s.is_empty() && s.chars().all(|c| c == '*'))
    }

    fn decorate(config: &ConfigMap) -> ConfigMap {
        config
            .iter()
            .map(|(key, value)| {
                let decorated = match value {
                    Value::Object(inner) => Value::Object(Self::decorate(inner)),
                    Value::String(s) if Self::is_secret(key) && !s.is_empty() => {
                        Value::String("*".repeat(s.chars().count().min(MAX_MASK_LEN)))
                    }
                    other => other.clone(),
                };
                (key.clone(), decorated)
            })
            .collect()
    }

    fn merge(target: &mut ConfigMap, update: ConfigMap) {
        for (key, value) in update {
            if Self::is_secret(&key) && Self::is_mask(&value) {
                continue;
            }
            match (target.get_mut(&key), value) {
                (Some(Value::Object(existing)), Value::Object(inner)) => {
                    Self::merge(existing, inner);
                }
                (_, value) => {
                    target.insert(key, value);
                }
            }
        }
    }
}

#[async_trait::async_trait]
impl ConfigStore for InMemoryConfigStore {
    async fn get_config(&self) -> Result<ConfigMap, Error> {
        let mut view = ConfigMap::new();
        view.insert("plain".to_string(), Value::Object(self.config.clone()));
        view.insert(
            "decorated".to_string(),
            Value::Object(Self::decorate(&self.config)),
        );
        Ok(view)
    }

    async fn update_config(&mut self, update: ConfigMap) -> Result<(), Error> {
        Self::merge(&mut self.config, update);
        Ok(())
    }
}

/// Logs kept in memory, keyed by log type.
#[derive(Default, Debug, Clone)]
pub struct InMemoryLogSource {
    logs: HashMap<String, String>,
}

impl InMemoryLogSource {
    pub fn new(logs: HashMap<String, String>) -> Self {
        InMemoryLogSource { logs }
    }
}

#[async_trait::async_trait]
impl LogSource for InMemoryLogSource {
    async fn get_log(&self, log_type: &str) -> Result<String, Error> {
        self.logs
            .get(log_type)
            .cloned()
            .ok_or_else(|| Error::LogNotFound(log_type.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn store() -> InMemoryConfigStore {
        let Value::Object(config) = json!({
            "status": "Hi There!",
            "ap": { "ssid": "freakwan", "pw": "secret123" },
            "lora_sp": 12
        }) else {
            unreachable!()
        };
        InMemoryConfigStore::new(config)
    }

    fn object(value: Value) -> ConfigMap {
        match value {
            Value::Object(map) => map,
            _ => panic!("not an object"),
        }
    }

    #[tokio::test]
    async fn decorated_view_masks_secrets() {
        let view = store().get_config().await.unwrap();
        assert_eq!(view["plain"]["ap"]["pw"], "secret123");
        assert_eq!(view["decorated"]["ap"]["pw"], "********");
        assert_eq!(view["decorated"]["ap"]["ssid"], "freakwan");
        assert_eq!(view["decorated"]["lora_sp"], 12);
    }

    #[tokio::test]
    async fn partial_updates_merge() {
        let mut store = store();
        store
            .update_config(object(json!({ "ap": { "ssid": "newnet" } })))
            .await
            .unwrap();
        assert_eq!(store.plain()["ap"]["ssid"], "newnet");
        assert_eq!(store.plain()["ap"]["pw"], "secret123");
        assert_eq!(store.plain()["status"], "Hi There!");
    }

    #[tokio::test]
    async fn masked_secrets_are_not_written_back() {
        let mut store = store();
        store
            .update_config(object(json!({ "ap": { "pw": "********" }, "lora_sp": 7 })))
            .await
            .unwrap();
        assert_eq!(store.plain()["ap"]["pw"], "secret123");
        assert_eq!(store.plain()["lora_sp"], 7);

        store
            .update_config(object(json!({ "ap": { "pw": "hunter22" } })))
            .await
            .unwrap();
        assert_eq!(store.plain()["ap"]["pw"], "hunter22");
    }

    #[tokio::test]
    async fn unknown_log_type_is_not_found() {
        let logs = InMemoryLogSource::new(HashMap::from([(
            "msg".to_string(),
            "time,tx_rx\n".to_string(),
        )]));
        assert_eq!(logs.get_log("msg").await.unwrap(), "time,tx_rx\n");
        assert!(matches!(
            logs.get_log("sys").await,
            Err(Error::LogNotFound(t)) if t == "sys"
        ));
    }
}
