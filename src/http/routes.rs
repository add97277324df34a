use crate::collaborators::ConfigMap;
use crate::error::Error;
use crate::http::html;
use crate::http::http_error::HttpError;
use crate::http::server::AppState;
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::Value;
use std::ffi::OsStr;
use std::io::ErrorKind;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

const CONFIG_UPDATED: &str = "Config data updated successfully!";
const DISPLAY_TOGGLED: &str = "Display toggled!";

/// Paths probed by Android, Apple and Windows clients to detect a captive portal.
const PROBE_PATHS: [&str; 4] = [
    "/generate_204",
    "/hotspot-detect.html",
    "/connecttest.txt",
    "/redirect",
];

pub(super) fn new(state: AppState) -> Router {
    let router = PROBE_PATHS
        .iter()
        .fold(Router::new(), |router, path| router.route(path, get(config_page)));
    router
        .route("/", get(index))
        .route("/config", get(config_page))
        .route("/log/*log_type", get(log))
        .route("/scripts/*path", get(script))
        .route("/data", get(get_data).post(post_data))
        .route("/display", get(display))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(state.config.http_timeout))
        .with_state(state)
}

/// Reject paths that could leave the directory they are resolved against. Any `..` is refused,
/// whether or not it forms a whole segment.
fn reject_unsafe_path(path: &str) -> Result<(), Error> {
    if path.starts_with(['/', '\\']) || path.contains("..") {
        return Err(Error::PathTraversalAttempt(path.to_string()));
    }
    Ok(())
}

fn content_type(path: &str) -> &'static str {
    match std::path::Path::new(path)
        .extension()
        .and_then(OsStr::to_str)
    {
        Some("js") => "application/javascript",
        Some("css") => "text/css",
        Some("html" | "htm") => "text/html",
        Some("json") => "application/json",
        Some("csv") => "text/csv",
        Some("svg") => "image/svg+xml",
        Some("png") => "image/png",
        Some("ico") => "image/x-icon",
        _ => "application/octet-stream",
    }
}

#[allow(clippy::unused_async)]
async fn index() -> impl IntoResponse {
    (StatusCode::FOUND, [(header::LOCATION, "/config")])
}

async fn config_page(State(state): State<AppState>) -> Html<String> {
    match tokio::fs::read_to_string(&state.config.html_path).await {
        Ok(page) => Html(page),
        Err(err) => {
            tracing::warn!(
                "unable to read portal page {}: {err}",
                state.config.html_path.display()
            );
            Html(html::FALLBACK_PAGE.to_string())
        }
    }
}

async fn log(
    State(state): State<AppState>,
    Path(log_type): Path<String>,
) -> Result<impl IntoResponse, HttpError> {
    reject_unsafe_path(&log_type)?;
    let log = state.collaborators.log_source.get_log(&log_type).await?;
    Ok(([(header::CONTENT_TYPE, "text/csv")], log))
}

async fn script(
    State(state): State<AppState>,
    Path(path): Path<String>,
) -> Result<impl IntoResponse, HttpError> {
    reject_unsafe_path(&path)?;
    let file = state.config.scripts_dir.join(&path);
    match tokio::fs::read(&file).await {
        Ok(bytes) => Ok(([(header::CONTENT_TYPE, content_type(&path))], bytes)),
        Err(err) if err.kind() == ErrorKind::NotFound => Err(Error::FileNotFound(path).into()),
        Err(err) => Err(Error::IO(err).into()),
    }
}

async fn get_data(State(state): State<AppState>) -> Result<Json<Value>, HttpError> {
    let config = state.collaborators.config_store.read().await.get_config().await?;
    let decorated = config
        .get("decorated")
        .cloned()
        .ok_or(Error::MissingDecoratedView)?;
    Ok(Json(decorated))
}

async fn post_data(State(state): State<AppState>, body: Bytes) -> Result<&'static str, HttpError> {
    let update: ConfigMap = serde_json::from_slice(&body).map_err(Error::ConfigDecode)?;
    tracing::info!("config update with keys {:?}", update.keys().collect::<Vec<_>>());
    state
        .collaborators
        .config_store
        .write()
        .await
        .update_config(update)
        .await?;
    Ok(CONFIG_UPDATED)
}

#[allow(clippy::unused_async)]
async fn display(State(state): State<AppState>) -> Result<&'static str, HttpError> {
    state.collaborators.toggle_display()?;
    Ok(DISPLAY_TOGGLED)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::{Collaborators, ConfigStore, LogSource};
    use crate::config::Config;
    use crate::store::InMemoryConfigStore;
    use axum::body::Body;
    use axum::http::Request;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use tower::ServiceExt;

    #[derive(Default)]
    struct CountingLogs {
        calls: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl LogSource for CountingLogs {
        async fn get_log(&self, log_type: &str) -> Result<String, Error> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(format!("time,tag\n00:00:01,{log_type}\n"))
        }
    }

    #[derive(Default)]
    struct RecordingStore {
        updates: Arc<Mutex<Vec<ConfigMap>>>,
    }

    #[async_trait::async_trait]
    impl ConfigStore for RecordingStore {
        async fn get_config(&self) -> Result<ConfigMap, Error> {
            Ok(ConfigMap::new())
        }

        async fn update_config(&mut self, update: ConfigMap) -> Result<(), Error> {
            self.updates.lock().unwrap().push(update);
            Ok(())
        }
    }

    fn config() -> Config {
        let mut config = Config::new("freakwan", "");
        let dir = std::env::temp_dir().join("portalcrab-routes-missing");
        config.html_path = dir.join("index.html");
        config.scripts_dir = dir.join("scripts");
        config
    }

    fn app_with(config: Config, collaborators: Collaborators) -> Router {
        new(AppState {
            config: Arc::new(config),
            collaborators,
        })
    }

    fn app(logs: Arc<CountingLogs>) -> Router {
        let Value::Object(stored) = json!({ "ap": { "ssid": "freakwan", "pw": "secret123" } })
        else {
            unreachable!()
        };
        let store = Arc::new(tokio::sync::RwLock::new(InMemoryConfigStore::new(stored)));
        app_with(config(), Collaborators::new(store, logs))
    }

    async fn get(app: Router, uri: &str) -> (StatusCode, Vec<u8>) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = hyper::body::to_bytes(response.into_body()).await.unwrap();
        (status, body.to_vec())
    }

    #[tokio::test]
    async fn index_redirects_to_config() {
        let response = app(Arc::default())
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(response.headers()[header::LOCATION], "/config");
    }

    #[tokio::test]
    async fn probes_serve_the_config_page() {
        let (_, config_page) = get(app(Arc::default()), "/config").await;
        for probe in PROBE_PATHS {
            let (status, body) = get(app(Arc::default()), probe).await;
            assert_eq!(status, StatusCode::OK, "{probe}");
            assert_eq!(body, config_page, "{probe}");
        }
        assert_eq!(config_page, html::FALLBACK_PAGE.as_bytes());
    }

    #[tokio::test]
    async fn config_page_is_read_from_disk() {
        let dir = std::env::temp_dir().join(format!("portalcrab-page-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("index.html"), "<h1>portal</h1>").unwrap();
        let mut config = config();
        config.html_path = dir.join("index.html");
        let store = Arc::new(tokio::sync::RwLock::new(InMemoryConfigStore::default()));
        let app = app_with(config, Collaborators::new(store, Arc::new(CountingLogs::default())));

        let (status, body) = get(app, "/hotspot-detect.html").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, b"<h1>portal</h1>");
        std::fs::remove_dir_all(dir).unwrap();
    }

    #[tokio::test]
    async fn log_is_served_as_csv() {
        let logs = Arc::new(CountingLogs::default());
        let response = app(logs.clone())
            .oneshot(Request::builder().uri("/log/msg").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "text/csv");
        let body = hyper::body::to_bytes(response.into_body()).await.unwrap();
        assert_eq!(&body[..], b"time,tag\n00:00:01,msg\n");
        assert_eq!(logs.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn traversal_attempts_never_reach_collaborators() {
        let logs = Arc::new(CountingLogs::default());
        for uri in ["/log/..%2Fsecret", "/log/../secret", "/scripts/../../x", "/scripts/a/../../x"] {
            let (status, _) = get(app(logs.clone()), uri).await;
            assert_eq!(status, StatusCode::NOT_FOUND, "{uri}");
        }
        assert_eq!(logs.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn scripts_are_served_with_content_type() {
        let dir = std::env::temp_dir().join(format!("portalcrab-scripts-{}", std::process::id()));
        std::fs::create_dir_all(dir.join("lib")).unwrap();
        std::fs::write(dir.join("lib/app.js"), "console.log('hi');").unwrap();
        let mut config = config();
        config.scripts_dir = dir.clone();
        let store = Arc::new(tokio::sync::RwLock::new(InMemoryConfigStore::default()));
        let collaborators = Collaborators::new(store, Arc::new(CountingLogs::default()));

        let response = app_with(config.clone(), collaborators.clone())
            .oneshot(
                Request::builder()
                    .uri("/scripts/lib/app.js")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "application/javascript"
        );

        let (status, _) = get(app_with(config, collaborators), "/scripts/missing.js").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        std::fs::remove_dir_all(dir).unwrap();
    }

    #[tokio::test]
    async fn get_data_serves_decorated_view() {
        let (status, body) = get(app(Arc::default()), "/data").await;
        assert_eq!(status, StatusCode::OK);
        let view: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(view, json!({ "ap": { "ssid": "freakwan", "pw": "********" } }));
    }

    #[tokio::test]
    async fn get_data_without_decorated_view_is_server_error() {
        let store = Arc::new(tokio::sync::RwLock::new(RecordingStore::default()));
        let app = app_with(config(), Collaborators::new(store, Arc::new(CountingLogs::default())));
        let (status, _) = get(app, "/data").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn post_data_forwards_mapping_once() {
        let store = RecordingStore::default();
        let updates = store.updates.clone();
        let collaborators = Collaborators::new(
            Arc::new(tokio::sync::RwLock::new(store)),
            Arc::new(CountingLogs::default()),
        );
        let response = app_with(config(), collaborators)
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/data")
                    .body(Body::from(r#"{"ap":{"ssid":"newnet"}}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = hyper::body::to_bytes(response.into_body()).await.unwrap();
        assert_eq!(&body[..], CONFIG_UPDATED.as_bytes());

        let updates = updates.lock().unwrap();
        assert_eq!(updates.len(), 1);
        assert_eq!(Value::Object(updates[0].clone()), json!({ "ap": { "ssid": "newnet" } }));
    }

    #[tokio::test]
    async fn post_data_rejects_invalid_json() {
        let store = RecordingStore::default();
        let updates = store.updates.clone();
        let collaborators = Collaborators::new(
            Arc::new(tokio::sync::RwLock::new(store)),
            Arc::new(CountingLogs::default()),
        );
        for body in ["not json", "[1, 2]"] {
            let response = app_with(config(), collaborators.clone())
                .oneshot(
                    Request::builder()
                        .method("POST")
                        .uri("/data")
                        .body(Body::from(body))
                        .unwrap(),
                )
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{body}");
        }
        assert!(updates.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn display_requires_callback() {
        let store = Arc::new(tokio::sync::RwLock::new(InMemoryConfigStore::default()));
        let collaborators = Collaborators::new(store, Arc::new(CountingLogs::default()));

        let (status, _) = get(app_with(config(), collaborators.clone()), "/display").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        collaborators.set_display_toggle(Arc::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        }));
        let (status, body) = get(app_with(config(), collaborators), "/display").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, DISPLAY_TOGGLED.as_bytes());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn unsafe_paths() {
        for path in ["..", "../x", "a/../../x", "a\\..\\x", "..%2Fx", "/etc/passwd", "\\x"] {
            assert!(reject_unsafe_path(path).is_err(), "{path}");
        }
        for path in ["app.js", "lib/app.js", "msg", "sys_2024-01-01"] {
            assert!(reject_unsafe_path(path).is_ok(), "{path}");
        }
    }
}
