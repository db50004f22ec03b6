//! Directory transport
//!
//! Serves each location as a JSON file below a root directory, so
//! `/data/user.json` maps to `<root>/data/user.json`. Writes are atomic
//! (write to temp file, then rename).

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use serde_json::Value;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use super::{Transport, WriteMethod};
use crate::error::TransportError;

/// Transport reading and writing JSON files on disk
#[derive(Debug, Clone)]
pub struct DirTransport {
    root: PathBuf,
}

impl DirTransport {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a location to a file below the root
    ///
    /// Only normal path components are accepted.
    pub fn path_for(&self, location: &str) -> Result<PathBuf, TransportError> {
        let relative = Path::new(location.trim_start_matches('/'));
        let mut path = self.root.clone();
        let mut depth = 0;

        for component in relative.components() {
            match component {
                Component::Normal(part) => {
                    path.push(part);
                    depth += 1;
                }
                Component::CurDir => {}
                _ => {
                    return Err(TransportError::InvalidLocation {
                        location: location.to_string(),
                        reason: "only plain relative paths are allowed".to_string(),
                    })
                }
            }
        }

        if depth == 0 {
            return Err(TransportError::InvalidLocation {
                location: location.to_string(),
                reason: "location names no file".to_string(),
            });
        }
        Ok(path)
    }
}

#[async_trait]
impl Transport for DirTransport {
    async fn read(&self, location: &str) -> Result<Value, TransportError> {
        let path = self.path_for(location)?;
        debug!("read {:?}", path);

        let content = fs::read_to_string(&path)
            .await
            .map_err(|e| TransportError::from_io(e, path.clone(), location))?;

        serde_json::from_str(&content).map_err(|e| TransportError::Malformed {
            location: location.to_string(),
            details: e.to_string(),
        })
    }

    async fn write(
        &self,
        location: &str,
        method: WriteMethod,
        payload: &Value,
    ) -> Result<Value, TransportError> {
        let path = self.path_for(location)?;
        debug!("{} {:?}", method, path);

        let bytes = serde_json::to_vec_pretty(payload).map_err(|e| TransportError::Malformed {
            location: location.to_string(),
            details: e.to_string(),
        })?;
        atomic_write(&path, &bytes)
            .await
            .map_err(|e| TransportError::from_io(e, path.clone(), location))?;

        Ok(payload.clone())
    }

    fn describe(&self) -> String {
        format!("dir ({})", self.root.display())
    }
}

/// Write data atomically (write to temp file, then rename)
async fn atomic_write(path: &Path, data: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await?;
    }

    let temp_path = path.with_extension("tmp");
    let mut file = fs::File::create(&temp_path).await?;
    file.write_all(data).await?;
    file.sync_all().await?;
    drop(file);

    fs::rename(&temp_path, path).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_path_for() {
        let transport = DirTransport::new("/srv/site");
        assert_eq!(
            transport.path_for("/data/user.json").unwrap(),
            PathBuf::from("/srv/site/data/user.json")
        );
        assert_eq!(
            transport.path_for("./data/user.json").unwrap(),
            PathBuf::from("/srv/site/data/user.json")
        );
    }

    #[test]
    fn test_path_for_rejects_escape() {
        let transport = DirTransport::new("/srv/site");
        assert!(matches!(
            transport.path_for("/data/../../etc/passwd"),
            Err(TransportError::InvalidLocation { .. })
        ));
        assert!(matches!(
            transport.path_for("/"),
            Err(TransportError::InvalidLocation { .. })
        ));
    }

    #[tokio::test]
    async fn test_write_then_read() {
        let temp_dir = TempDir::new().unwrap();
        let transport = DirTransport::new(temp_dir.path());
        let payload = json!({"firstname": "foo", "lastname": "something", "age": 29});

        let echoed = transport
            .write("/data/user.json", WriteMethod::Create, &payload)
            .await
            .unwrap();
        assert_eq!(echoed, payload);
        assert!(temp_dir.path().join("data/user.json").exists());
        assert!(!temp_dir.path().join("data/user.tmp").exists());

        let read = transport.read("/data/user.json").await.unwrap();
        assert_eq!(read, payload);
    }

    #[tokio::test]
    async fn test_read_missing() {
        let temp_dir = TempDir::new().unwrap();
        let transport = DirTransport::new(temp_dir.path());

        let err = transport.read("/data/user.json").await.unwrap_err();
        assert!(matches!(err, TransportError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_read_malformed() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join("user.json"), "{not json").unwrap();
        let transport = DirTransport::new(temp_dir.path());

        let err = transport.read("user.json").await.unwrap_err();
        assert!(matches!(err, TransportError::Malformed { .. }));
    }
}
