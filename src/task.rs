//! Cancellable portal tasks.
//!
//! A [`PortalTask`] pairs a spawned task with the [`CancellationToken`] it observes. Requesting a
//! stop and observing the stop are separate steps: [`PortalTask::request_stop`] only cancels the
//! token, [`PortalTask::terminate`] also waits until the task has actually finished.
use crate::crash::SharedCrashLog;
use crate::error::Error;
use std::future::Future;
use std::time::Duration;
use tokio::task::{JoinError, JoinHandle};
use tokio_util::sync::CancellationToken;

#[derive(Debug)]
pub struct PortalTask {
    name: &'static str,
    token: CancellationToken,
    handle: JoinHandle<()>,
}

impl PortalTask {
    /// Spawn `body` with a fresh cancellation token. Errors returned by the body are recorded to
    /// the crash log, so the task itself always completes with `()`. A body that returns before
    /// a stop was requested is recorded too.
    pub fn spawn<F, Fut>(name: &'static str, crash_log: SharedCrashLog, body: F) -> Self
    where
        F: FnOnce(CancellationToken) -> Fut,
        Fut: Future<Output = Result<(), Error>> + Send + 'static,
    {
        let token = CancellationToken::new();
        let fut = body(token.clone());
        let observed = token.clone();
        let handle = tokio::spawn(async move {
            match fut.await {
                Ok(()) if observed.is_cancelled() => tracing::debug!("{name} task stopped"),
                Ok(()) => {
                    crash_log
                        .record(&format!("{name} task"), &"exited before it was asked to stop")
                        .await;
                }
                Err(err) => crash_log.record(&format!("{name} task error"), &err).await,
            }
        });
        PortalTask {
            name,
            token,
            handle,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn request_stop(&self) {
        self.token.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Cancel the task and wait for it to finish. If it has not finished within `grace` it is
    /// aborted, and the aborted task is still awaited before returning.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnhandledTaskFailure`] if the task panicked.
    pub async fn terminate(self, grace: Duration) -> Result<(), Error> {
        self.request_stop();
        let name = self.name;
        let mut handle = self.handle;
        let joined = match tokio::time::timeout(grace, &mut handle).await {
            Ok(joined) => joined,
            Err(_) => {
                tracing::warn!("{name} task did not stop within {grace:?}, aborting");
                handle.abort();
                handle.await
            }
        };
        Self::joined(name, joined)
    }

    fn joined(name: &'static str, joined: Result<(), JoinError>) -> Result<(), Error> {
        match joined {
            Ok(()) => Ok(()),
            Err(err) if err.is_cancelled() => {
                tracing::debug!("{name} task cancelled");
                Ok(())
            }
            Err(err) => Err(Error::UnhandledTaskFailure {
                task: name,
                reason: err.to_string(),
            }),
        }
    }
}
