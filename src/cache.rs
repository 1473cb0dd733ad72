use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use tokio::fs;
use tracing::{debug, info, warn};

use crate::model::ProfileSnapshot;

/// Directory used by [`CacheStore::open_default`].
pub const DEFAULT_CACHE_DIR: &str = "data_cache";

/// Entries older than this are ignored.
pub const CACHE_EXPIRATION: Duration = Duration::from_secs(24 * 60 * 60);

#[derive(thiserror::Error, Debug)]
enum CacheError {
    #[error("cache i/o failed for {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("cache entry {path} is not a valid snapshot: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// File-backed cache of profile snapshots, one JSON file per user.
///
/// Freshness comes from the file's modification time. Every failure is
/// logged and treated as a miss, so a broken cache never breaks a scrape.
#[derive(Debug, Clone)]
pub struct CacheStore {
    dir: PathBuf,
    expiration: Duration,
}

impl CacheStore {
    /// Cache rooted at `dir`, which is created lazily on the first save.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            expiration: CACHE_EXPIRATION,
        }
    }

    /// Cache rooted at `dir`, creating the directory now.
    pub async fn open(dir: impl Into<PathBuf>) -> std::io::Result<Self> {
        let store = Self::new(dir);
        fs::create_dir_all(&store.dir).await?;
        Ok(store)
    }

    /// Cache in [`DEFAULT_CACHE_DIR`] under the working directory.
    pub async fn open_default() -> std::io::Result<Self> {
        Self::open(DEFAULT_CACHE_DIR).await
    }

    pub fn with_expiration(mut self, expiration: Duration) -> Self {
        self.expiration = expiration;
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File backing the entry for `identifier`. Keys are case-insensitive.
    ///
    /// Anything other than ASCII letters, digits, `-` and `_` becomes `_`, so
    /// the entry always sits directly inside [`CacheStore::dir`].
    pub fn path_for(&self, identifier: &str) -> PathBuf {
        let key: String = identifier
            .trim()
            .chars()
            .map(|c| match c {
                'a'..='z' | '0'..='9' | '-' | '_' => c,
                'A'..='Z' => c.to_ascii_lowercase(),
                _ => '_',
            })
            .collect();
        self.dir.join(format!("{key}.json"))
    }

    /// Return the cached snapshot for `identifier` if it exists and is fresh.
    pub async fn load(&self, identifier: &str) -> Option<ProfileSnapshot> {
        let path = self.path_for(identifier);
        match self.read_fresh(&path).await {
            Ok(Some(snapshot)) => {
                info!(identifier, "loaded profile from cache");
                Some(snapshot)
            }
            Ok(None) => None,
            Err(err) => {
                warn!(identifier, error = %err, "ignoring unreadable cache entry");
                None
            }
        }
    }

    async fn read_fresh(&self, path: &Path) -> Result<Option<ProfileSnapshot>, CacheError> {
        let io_err = |source| CacheError::Io {
            path: path.to_path_buf(),
            source,
        };

        let metadata = match fs::metadata(path).await {
            Ok(metadata) => metadata,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(io_err(err)),
        };

        let modified = metadata.modified().map_err(io_err)?;
        // A timestamp in the future counts as fresh.
        let age = SystemTime::now()
            .duration_since(modified)
            .unwrap_or_default();
        if age >= self.expiration {
            debug!(path = %path.display(), age_secs = age.as_secs(), "cache entry expired");
            return Ok(None);
        }

        let contents = fs::read(path).await.map_err(io_err)?;
        serde_json::from_slice(&contents)
            .map(Some)
            .map_err(|source| CacheError::Json {
                path: path.to_path_buf(),
                source,
            })
    }

    /// Store `snapshot` for `identifier`, replacing any previous entry.
    ///
    /// Returns whether the entry was written. Failures are only logged.
    pub async fn save(&self, identifier: &str, snapshot: &ProfileSnapshot) -> bool {
        let path = self.path_for(identifier);
        match self.write(&path, snapshot).await {
            Ok(()) => {
                debug!(identifier, path = %path.display(), "saved profile to cache");
                true
            }
            Err(err) => {
                warn!(identifier, error = %err, "failed to save profile to cache");
                false
            }
        }
    }

    async fn write(&self, path: &Path, snapshot: &ProfileSnapshot) -> Result<(), CacheError> {
        let io_err = |source| CacheError::Io {
            path: path.to_path_buf(),
            source,
        };

        let json = serde_json::to_vec_pretty(snapshot).map_err(|source| CacheError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        fs::create_dir_all(&self.dir).await.map_err(io_err)?;
        fs::write(path, json).await.map_err(io_err)
    }

    /// Drop the entry for `identifier`. Returns whether a file was removed.
    pub async fn remove(&self, identifier: &str) -> bool {
        let path = self.path_for(identifier);
        match fs::remove_file(&path).await {
            Ok(()) => true,
            Err(err) => {
                if err.kind() != std::io::ErrorKind::NotFound {
                    warn!(identifier, error = %err, "failed to remove cache entry");
                }
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::fs::File;

    use super::*;
    use crate::model::{Grade, ProfileSummary, TrophyRecord, TrophyTier};

    fn snapshot() -> ProfileSnapshot {
        ProfileSnapshot {
            profile_summary: ProfileSummary {
                username: "Hakoom".to_string(),
                avatar_url: "https://i.psnprofiles.com/avatars/m/Gb3a4f.png".to_string(),
                total_trophies: BTreeMap::from([
                    (TrophyTier::Total, 2),
                    (TrophyTier::Gold, 1),
                    (TrophyTier::Bronze, 1),
                ]),
                stats: BTreeMap::from([("Games Played".to_string(), "1".to_string())]),
            },
            trophy_log: vec![
                TrophyRecord {
                    game: "Bloodborne".to_string(),
                    icon_url: "https://i.psnprofiles.com/t/1.png".to_string(),
                    title: "Yharnam Sunrise".to_string(),
                    timestamp: "21st Mar 2024 9:14:03 PM".to_string(),
                    rarity_percent: "3.2%".to_string(),
                    grade: Grade::Gold,
                },
                TrophyRecord {
                    game: "Bloodborne".to_string(),
                    icon_url: "N/A".to_string(),
                    title: "Cleric Beast".to_string(),
                    timestamp: "20th Mar 2024 8:00:00 PM".to_string(),
                    rarity_percent: "N/A".to_string(),
                    grade: Grade::Bronze,
                },
            ],
        }
    }

    fn age_file(path: &Path, age: Duration) {
        let file = File::options().write(true).open(path).unwrap();
        file.set_modified(SystemTime::now() - age).unwrap();
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = CacheStore::new(dir.path());

        assert!(store.save("Hakoom", &snapshot()).await);
        assert_eq!(store.load("Hakoom").await, Some(snapshot()));
    }

    #[tokio::test]
    async fn test_keys_are_lowercased() {
        let dir = tempfile::tempdir().unwrap();
        let store = CacheStore::new(dir.path());

        store.save("HaKooM", &snapshot()).await;
        assert!(dir.path().join("hakoom.json").exists());
        assert_eq!(store.load("hakoom").await, Some(snapshot()));
        assert_eq!(store.load("HAKOOM").await, Some(snapshot()));
    }

    #[tokio::test]
    async fn test_keys_stay_inside_dir() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("cache");
        let store = CacheStore::new(&root);

        for key in ["../x", "..\\x", "a/b", "/etc/passwd", ".."] {
            let path = store.path_for(key);
            assert_eq!(path.parent(), Some(root.as_path()), "{key}");
        }
        assert_eq!(store.path_for("../x"), root.join("___x.json"));

        assert!(store.save("../x", &snapshot()).await);
        assert!(!dir.path().join("x.json").exists());
        assert_eq!(store.load("../x").await, Some(snapshot()));
    }

    #[tokio::test]
    async fn test_missing_entry() {
        let dir = tempfile::tempdir().unwrap();
        let store = CacheStore::new(dir.path().join("not-created-yet"));
        assert_eq!(store.load("nobody").await, None);
    }

    #[tokio::test]
    async fn test_expired_entry_is_absent() {
        let dir = tempfile::tempdir().unwrap();
        let store = CacheStore::new(dir.path());
        store.save("Hakoom", &snapshot()).await;

        age_file(&store.path_for("Hakoom"), Duration::from_secs(25 * 60 * 60));
        assert_eq!(store.load("Hakoom").await, None);

        // A fresh save replaces the stale entry.
        store.save("Hakoom", &snapshot()).await;
        assert_eq!(store.load("Hakoom").await, Some(snapshot()));
    }

    #[tokio::test]
    async fn test_recent_entry_is_fresh() {
        let dir = tempfile::tempdir().unwrap();
        let store = CacheStore::new(dir.path());
        store.save("Hakoom", &snapshot()).await;

        age_file(&store.path_for("Hakoom"), Duration::from_secs(23 * 60 * 60));
        assert_eq!(store.load("Hakoom").await, Some(snapshot()));
    }

    #[tokio::test]
    async fn test_custom_expiration() {
        let dir = tempfile::tempdir().unwrap();
        let store = CacheStore::new(dir.path()).with_expiration(Duration::from_secs(60));
        store.save("Hakoom", &snapshot()).await;

        age_file(&store.path_for("Hakoom"), Duration::from_secs(120));
        assert_eq!(store.load("Hakoom").await, None);
    }

    #[tokio::test]
    async fn test_corrupt_entry_is_absent() {
        let dir = tempfile::tempdir().unwrap();
        let store = CacheStore::new(dir.path());
        std::fs::write(store.path_for("Hakoom"), b"{\"profile_summary\": [").unwrap();

        assert_eq!(store.load("Hakoom").await, None);
    }

    #[tokio::test]
    async fn test_load_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = CacheStore::new(dir.path());
        store.save("Hakoom", &snapshot()).await;

        let first = store.load("Hakoom").await;
        let second = store.load("Hakoom").await;
        assert_eq!(first, second);
        assert!(first.is_some());
    }

    #[tokio::test]
    async fn test_save_failure_is_swallowed() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, b"not a directory").unwrap();

        let store = CacheStore::new(blocker.join("cache"));
        assert!(!store.save("Hakoom", &snapshot()).await);
        assert_eq!(store.load("Hakoom").await, None);
    }

    #[tokio::test]
    async fn test_open_creates_dir_and_remove() {
        let dir = tempfile::tempdir().unwrap();
        let store = CacheStore::open(dir.path().join("data_cache")).await.unwrap();
        assert!(store.dir().is_dir());

        store.save("Hakoom", &snapshot()).await;
        assert!(store.remove("hakoom").await);
        assert!(!store.remove("hakoom").await);
        assert_eq!(store.load("Hakoom").await, None);
    }

    #[test]
    fn test_snapshot_json_layout() {
        let json = serde_json::to_value(snapshot()).unwrap();
        assert_eq!(json["profile_summary"]["total_trophies"]["gold"], 1);
        assert_eq!(json["trophy_log"][0]["grade"], "Gold");
        assert_eq!(json["trophy_log"].as_array().map(Vec::len), Some(2));
    }
}
