//! Key-value backends the credential store persists into.

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::errors::FeedbackError;

/// Minimal persistent key-value store. `remove` is idempotent.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, FeedbackError>;
    async fn set(&self, key: &str, value: &str) -> Result<(), FeedbackError>;
    async fn remove(&self, key: &str) -> Result<(), FeedbackError>;
}

/// In-process store; contents are lost when the process exits.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, BTreeMap<String, String>>, FeedbackError> {
        self.entries
            .lock()
            .map_err(|e| FeedbackError::Storage(format!("memory store poisoned: {e}")))
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, FeedbackError> {
        Ok(self.lock()?.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), FeedbackError> {
        self.lock()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), FeedbackError> {
        self.lock()?.remove(key);
        Ok(())
    }
}

/// Stores every entry in a single JSON object file.
///
/// A missing file reads as an empty store; parent directories are created on
/// first write. Writes replace the whole file, and a file that does not parse
/// is overwritten by the next `set` or `remove`.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read(&self) -> Result<Option<String>, FeedbackError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(text) if text.trim().is_empty() => Ok(None),
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn load(&self) -> Result<BTreeMap<String, String>, FeedbackError> {
        match self.read().await? {
            Some(text) => Ok(serde_json::from_str(&text)?),
            None => Ok(BTreeMap::new()),
        }
    }

    /// Loads the entries ahead of a write. An unparseable file reads as empty
    /// and is flagged so the caller rewrites it.
    async fn load_for_write(&self) -> Result<(BTreeMap<String, String>, bool), FeedbackError> {
        let Some(text) = self.read().await? else {
            return Ok((BTreeMap::new(), false));
        };
        match serde_json::from_str(&text) {
            Ok(entries) => Ok((entries, false)),
            Err(e) => {
                warn!(
                    "Discarding unreadable store file {}: {}",
                    self.path.display(),
                    e
                );
                Ok((BTreeMap::new(), true))
            }
        }
    }

    async fn persist(&self, entries: &BTreeMap<String, String>) -> Result<(), FeedbackError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await?;
        }
        let text = serde_json::to_string_pretty(entries)?;
        // Write beside the target, then swap it in.
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, text).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        debug!("Wrote {} entries to {}", entries.len(), self.path.display());
        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<String>, FeedbackError> {
        Ok(self.load().await?.remove(key))
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), FeedbackError> {
        let (mut entries, _) = self.load_for_write().await?;
        entries.insert(key.to_string(), value.to_string());
        self.persist(&entries).await
    }

    async fn remove(&self, key: &str) -> Result<(), FeedbackError> {
        let (mut entries, corrupt) = self.load_for_write().await?;
        if entries.remove(key).is_some() || corrupt {
            self.persist(&entries).await?;
        }
        Ok(())
    }
}

#[cfg(feature = "ssm")]
pub use ssm::SsmStore;

#[cfg(feature = "ssm")]
mod ssm {
    use async_trait::async_trait;
    use aws_sdk_ssm::{Client as SsmClient, types::ParameterType};

    use super::KeyValueStore;
    use crate::errors::FeedbackError;

    /// One `SecureString` parameter per key, named `<prefix>/<key>`.
    pub struct SsmStore {
        client: SsmClient,
        prefix: String,
    }

    impl SsmStore {
        pub async fn from_env(prefix: &str) -> Self {
            let shared = aws_config::from_env().load().await;
            Self::new(SsmClient::new(&shared), prefix)
        }

        pub fn new(client: SsmClient, prefix: &str) -> Self {
            Self {
                client,
                prefix: prefix.to_string(),
            }
        }

        fn name_for(&self, key: &str) -> String {
            let mut p = self.prefix.clone();
            if !p.ends_with('/') {
                p.push('/');
            }
            format!("{p}{key}")
        }
    }

    #[async_trait]
    impl KeyValueStore for SsmStore {
        async fn get(&self, key: &str) -> Result<Option<String>, FeedbackError> {
            match self
                .client
                .get_parameter()
                .name(self.name_for(key))
                .with_decryption(true)
                .send()
                .await
            {
                Ok(resp) => Ok(resp
                    .parameter
                    .and_then(|param| param.value().map(str::to_string))),
                Err(e)
                    if e.as_service_error()
                        .is_some_and(|se| se.is_parameter_not_found()) =>
                {
                    Ok(None)
                }
                Err(e) => Err(FeedbackError::Storage(format!("ssm get_parameter: {e}"))),
            }
        }

        async fn set(&self, key: &str, value: &str) -> Result<(), FeedbackError> {
            self.client
                .put_parameter()
                .name(self.name_for(key))
                .value(value)
                .r#type(ParameterType::SecureString)
                .overwrite(true)
                .send()
                .await
                .map_err(|e| FeedbackError::Storage(format!("ssm put_parameter: {e}")))?;
            Ok(())
        }

        async fn remove(&self, key: &str) -> Result<(), FeedbackError> {
            match self
                .client
                .delete_parameter()
                .name(self.name_for(key))
                .send()
                .await
            {
                Ok(_) => Ok(()),
                Err(e)
                    if e.as_service_error()
                        .is_some_and(|se| se.is_parameter_not_found()) =>
                {
                    Ok(())
                }
                Err(e) => Err(FeedbackError::Storage(format!(
                    "ssm delete_parameter: {e}"
                ))),
            }
        }
    }
}
