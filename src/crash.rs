//! Durable record of task failures.
//!
//! Every failure is emitted through `tracing` and, when a path is configured, appended as one
//! line to a crash file so it survives a reboot of the device.
use lazy_static::lazy_static;
use std::fmt::Display;
use std::path::PathBuf;
use std::sync::Arc;
use time::macros::format_description;
use time::OffsetDateTime;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;

pub type SharedCrashLog = Arc<CrashLog>;

lazy_static! {
    static ref TIMESTAMP_FORMATTER: &'static [time::format_description::FormatItem<'static>] =
        format_description!(
            version = 2,
            "[year]-[month]-[day]T[hour]:[minute]:[second]Z"
        );
}

#[derive(Debug, Clone, Default)]
pub struct CrashLog {
    path: Option<PathBuf>,
}

impl CrashLog {
    pub fn new(path: Option<PathBuf>) -> Self {
        CrashLog { path }
    }

    /// Log `err` and append it to the crash file. Failing to write the file is itself only
    /// logged, the original error is never lost from the tracing output.
    pub async fn record(&self, context: &str, err: &(dyn Display + Sync)) {
        tracing::error!("{context}: {err}");
        let Some(path) = &self.path else {
            return;
        };
        let line = format!("{} {context}: {err}\n", Self::timestamp());
        let written = async {
            let mut f = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .await?;
            f.write_all(line.as_bytes()).await?;
            f.flush().await
        }
        .await;
        if let Err(write_err) = written {
            tracing::warn!("unable to write crash record to {}: {write_err}", path.display());
        }
    }

    fn timestamp() -> String {
        OffsetDateTime::now_utc()
            .format(*TIMESTAMP_FORMATTER)
            .unwrap_or_else(|_| "unknown-time".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn appends_one_line_per_record() {
        let path = std::env::temp_dir().join(format!("portalcrab-crash-{}.txt", std::process::id()));
        let _ = tokio::fs::remove_file(&path).await;

        let log = CrashLog::new(Some(path.clone()));
        log.record("DNS task", &"socket error").await;
        log.record("HTTP task", &"listener closed").await;

        let contents = tokio::fs::read_to_string(&path).await.unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with("DNS task: socket error"));
        assert!(lines[1].ends_with("HTTP task: listener closed"));
        let _ = tokio::fs::remove_file(&path).await;
    }

    #[tokio::test]
    async fn without_path_only_traces() {
        CrashLog::default().record("DNS task", &"ignored").await;
    }
}
