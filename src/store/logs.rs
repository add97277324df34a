use crate::collaborators::LogSource;
use crate::error::Error;
use std::io::ErrorKind;
use std::path::PathBuf;
use tokio::fs::File;
use tokio::io::AsyncReadExt;

/// Serves `<log_dir>/<log_type>.csv`, reading at most `max_bytes` of it.
#[derive(Debug, Clone)]
pub struct DirLogSource {
    log_dir: PathBuf,
    max_bytes: u64,
}

impl DirLogSource {
    pub fn new(log_dir: PathBuf, max_bytes: u64) -> Self {
        DirLogSource { log_dir, max_bytes }
    }
}

#[async_trait::async_trait]
impl LogSource for DirLogSource {
    async fn get_log(&self, log_type: &str) -> Result<String, Error> {
        if log_type.is_empty() || log_type.contains(['/', '\\']) || log_type.contains("..") {
            return Err(Error::PathTraversalAttempt(log_type.to_string()));
        }
        let path = self.log_dir.join(format!("{log_type}.csv"));
        let f = match File::open(&path).await {
            Ok(f) => f,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                return Err(Error::LogNotFound(log_type.to_string()));
            }
            Err(err) => return Err(err.into()),
        };

        let mut buf = Vec::new();
        f.take(self.max_bytes + 1).read_to_end(&mut buf).await?;
        if buf.len() as u64 > self.max_bytes {
            tracing::warn!(
                "{} is larger than {} bytes, serving a truncated log",
                path.display(),
                self.max_bytes
            );
            buf.truncate(self.max_bytes as usize);
        }
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }
}
