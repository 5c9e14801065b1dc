use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;

use akania_core::config::AppConfig;
use akania_core::error::{AkaniaError, Result};
use akania_core::profile::CompanyProfile;
use akania_core::store::ProfileStore;

const PROFILE_EXTENSION: &str = "json";
const TEMP_EXTENSION: &str = "tmp";

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// One pretty-printed JSON file per company under `dir`, named by the
/// profile's storage key.
pub struct FileProfileStore {
    dir: PathBuf,
}

impl FileProfileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.data_dir.clone())
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.{PROFILE_EXTENSION}"))
    }

    /// Sibling path the record is written to before being renamed into
    /// place. Unique per process and call so parallel writers never share it;
    /// the `.tmp` extension keeps it out of [`ProfileStore::load_all`].
    fn temp_path_for(&self, key: &str) -> PathBuf {
        let n = TEMP_COUNTER.fetch_add(1, Ordering::Relaxed);
        self.dir
            .join(format!("{key}.{}.{n}.{TEMP_EXTENSION}", std::process::id()))
    }
}

fn is_profile_file(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some(PROFILE_EXTENSION)
}

#[async_trait]
impl ProfileStore for FileProfileStore {
    async fn save(&self, profile: &CompanyProfile) -> Result<bool> {
        let Some(key) = profile.storage_key() else {
            tracing::debug!("Not saving profile without a company name");
            return Ok(false);
        };

        tokio::fs::create_dir_all(&self.dir).await?;

        let body = serde_json::to_string_pretty(profile)?;
        let target = self.path_for(&key);
        let temp = self.temp_path_for(&key);

        tokio::fs::write(&temp, body.as_bytes()).await?;
        if let Err(e) = tokio::fs::rename(&temp, &target).await {
            let _ = tokio::fs::remove_file(&temp).await;
            return Err(AkaniaError::Store(format!(
                "Failed to move profile into {}: {e}",
                target.display()
            )));
        }

        tracing::info!(
            company = %key,
            path = %target.display(),
            "Saved company profile"
        );
        Ok(true)
    }

    async fn load_all(&self) -> Result<Vec<serde_json::Value>> {
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(dir = %self.dir.display(), "Profile directory does not exist yet");
                return Ok(Vec::new());
            }
            Err(e) => return Err(e.into()),
        };

        let mut paths = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if is_profile_file(&path) {
                paths.push(path);
            }
        }
        paths.sort();

        let mut profiles = Vec::with_capacity(paths.len());
        for path in paths {
            let raw = match tokio::fs::read_to_string(&path).await {
                Ok(raw) => raw,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Skipping unreadable profile file");
                    continue;
                }
            };
            match serde_json::from_str::<serde_json::Value>(&raw) {
                Ok(value) => profiles.push(value),
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Skipping malformed profile file");
                }
            }
        }

        tracing::info!(
            dir = %self.dir.display(),
            count = profiles.len(),
            "Loaded stored profiles"
        );
        Ok(profiles)
    }
}
