use crate::collaborators::Collaborators;
use crate::config::SharedConfig;
use crate::error::Error;
use crate::http::routes;
use axum::Router;
use std::net::{Ipv4Addr, SocketAddr, TcpListener};
use tokio_util::sync::CancellationToken;

#[derive(Clone)]
pub(super) struct AppState {
    pub config: SharedConfig,
    pub collaborators: Collaborators,
}

/// The portal's HTTP server, bound but not yet serving.
pub struct CaptivePortalHttpServer {
    listener: TcpListener,
    router: Router,
}

impl CaptivePortalHttpServer {
    /// Bind the listener to `<address>:<http_port>`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BindFailure`] if the listener can't be bound.
    pub fn bind(
        config: SharedConfig,
        collaborators: Collaborators,
        address: Ipv4Addr,
    ) -> Result<Self, Error> {
        let bind_addr = SocketAddr::from((address, config.http_port));
        let listener = TcpListener::bind(bind_addr)
            .and_then(|listener| {
                listener.set_nonblocking(true)?;
                Ok(listener)
            })
            .map_err(|source| Error::BindFailure {
                addr: bind_addr,
                source,
            })?;
        Ok(CaptivePortalHttpServer {
            listener,
            router: routes::new(AppState {
                config,
                collaborators,
            }),
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, Error> {
        Ok(self.listener.local_addr()?)
    }

    /// Serve until `token` is cancelled. In-flight requests are completed before the future
    /// resolves.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Http`] if the server fails.
    pub async fn run(self, token: CancellationToken) -> Result<(), Error> {
        let addr = self.local_addr()?;
        tracing::info!("HTTP listening on {addr}");
        axum::Server::from_tcp(self.listener)?
            .serve(self.router.into_make_service())
            .with_graceful_shutdown(async move { token.cancelled().await })
            .await?;
        tracing::info!("HTTP server on {addr} stopped");
        Ok(())
    }
}
