use anyhow::{anyhow, Result};
use is_terminal::IsTerminal;
use portalcrab::collaborators::{ConfigMap, DynConfigStore};
use portalcrab::{
    Collaborators, Config, CrashLog, DirLogSource, FileConfigStore, InMemoryConfigStore,
    PortalLifecycleManager, SharedConfig,
};
use serde_json::json;
use std::sync::Arc;
use tokio::signal;
use tokio::sync::RwLock;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_init();

    let mut first_args = std::env::args().take(2);
    let (program_name, config_file) = (
        first_args.next().unwrap_or("portalcrab".to_string()),
        first_args.next(),
    );

    let config = config_init(&program_name, config_file)?;
    let collaborators = collaborators_init(&config).await?;
    let crash_log = Arc::new(CrashLog::new(config.crash_log_path.clone()));
    let radio = portalcrab::radio::from_config(&config);
    let portal = PortalLifecycleManager::new(config.clone(), radio, collaborators, crash_log);
    portal.set_display_toggle_callback(|| tracing::info!("display toggle requested"));

    if std::io::stdout().is_terminal() {
        println!("{}", portalcrab::banner::BANNER);
    }

    if config.start_active {
        portal.toggle().await?;
    }

    let mut toggle_signal = ToggleSignal::new()?;
    loop {
        tokio::select! {
            _ = signal::ctrl_c() => {
                tracing::info!("quitting from signal");
                break;
            },
            Some(()) = toggle_signal.recv() => {
                match portal.toggle().await {
                    Ok(state) => tracing::info!("portal toggled: {state:?}"),
                    Err(err) => tracing::error!("portal toggle failed: {err}"),
                }
            }
        }
    }

    portal.shutdown().await;
    tracing::info!("goodbye");
    Ok(())
}

fn tracing_init() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "portalcrab=info".into()),
        )
        .init();
}

fn config_init(program_name: &str, config_file: Option<String>) -> Result<SharedConfig> {
    match config_file {
        None => Err(anyhow!("usage: {program_name} /path/to/config.json")),
        Some(config_file) => {
            tracing::debug!("loaded config from {config_file}");
            let config = Config::try_from_file(&config_file)?;
            Ok(Arc::new(config))
        }
    }
}

async fn collaborators_init(config: &Config) -> Result<Collaborators> {
    let config_store: DynConfigStore = match &config.config_state_path {
        Some(path) => {
            tracing::info!("device configuration stored in {}", path.display());
            Arc::new(RwLock::new(FileConfigStore::try_from_file(path).await?))
        }
        None => {
            let seed = json!({ "ap": { "ssid": config.ssid, "pw": config.password } });
            let seed: ConfigMap = serde_json::from_value(seed)?;
            Arc::new(RwLock::new(InMemoryConfigStore::new(seed)))
        }
    };
    let log_source = Arc::new(DirLogSource::new(
        config.log_dir.clone(),
        config.max_log_bytes,
    ));
    Ok(Collaborators::new(config_store, log_source))
}

/// `SIGUSR1` toggles the portal, standing in for the device's button.
#[cfg(unix)]
struct ToggleSignal(signal::unix::Signal);

#[cfg(unix)]
impl ToggleSignal {
    fn new() -> Result<Self> {
        Ok(Self(signal::unix::signal(
            signal::unix::SignalKind::user_defined1(),
        )?))
    }

    async fn recv(&mut self) -> Option<()> {
        self.0.recv().await
    }
}

#[cfg(not(unix))]
struct ToggleSignal;

#[cfg(not(unix))]
impl ToggleSignal {
    #[allow(clippy::unnecessary_wraps)]
    fn new() -> Result<Self> {
        Ok(Self)
    }

    async fn recv(&mut self) -> Option<()> {
        std::future::pending().await
    }
}
