use crate::errors::{LectureError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;

pub const SESSION_CACHE_FILE: &str = "sessionCache.json";

#[derive(Debug, Default, Serialize, Deserialize)]
struct CacheFile {
    sessions: Vec<String>,
}

/// Names of sessions that have been downloaded, persisted under the cache directory.
///
/// Every operation reads the whole file and mutations rewrite it in full.
/// There is no locking, two runs sharing a cache directory will race.
#[derive(Debug, Clone)]
pub struct SessionCache {
    path: PathBuf,
}

impl SessionCache {
    pub fn new(cache_dir: &Path) -> Self {
        Self {
            path: cache_dir.join(SESSION_CACHE_FILE),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether `name` has been recorded. Creates an empty cache file on first use.
    #[tracing::instrument]
    pub async fn is_cached(&self, name: &str) -> Result<bool> {
        if !fs::try_exists(&self.path)
            .await
            .map_err(|e| LectureError::file_op(&self.path, e))?
        {
            tracing::debug!("No session cache yet, creating {}", self.path.to_string_lossy());
            self.save(&CacheFile::default()).await?;
            return Ok(false);
        }
        let cache = self.load().await?;
        Ok(cache.sessions.iter().any(|s| s == name))
    }

    /// Adds `name` to the cache. Recording a name twice keeps a single entry.
    #[tracing::instrument]
    pub async fn record(&self, name: &str) -> Result<()> {
        let mut cache = if fs::try_exists(&self.path)
            .await
            .map_err(|e| LectureError::file_op(&self.path, e))?
        {
            self.load().await?
        } else {
            CacheFile::default()
        };
        if cache.sessions.iter().any(|s| s == name) {
            tracing::debug!("{} already recorded", name);
            return Ok(());
        }
        cache.sessions.push(name.to_string());
        self.save(&cache).await
    }

    async fn load(&self) -> Result<CacheFile> {
        let content = match fs::read_to_string(&self.path).await {
            Ok(c) => c,
            Err(e) => {
                tracing::error!("Error reading session cache {}", self.path.to_string_lossy());
                return Err(LectureError::file_op(&self.path, e));
            }
        };
        serde_json::from_str(&content).map_err(|e| {
            tracing::error!("Session cache {} is corrupted : {}", self.path.to_string_lossy(), e);
            LectureError::CacheCorrupted(self.path.to_string_lossy().to_string())
        })
    }

    async fn save(&self, cache: &CacheFile) -> Result<()> {
        let content = serde_json::to_string(cache)
            .map_err(|_| LectureError::CacheCorrupted(self.path.to_string_lossy().to_string()))?;
        if let Err(e) = fs::write(&self.path, content).await {
            tracing::error!("Error writing session cache {}", self.path.to_string_lossy());
            return Err(LectureError::file_op(&self.path, e));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_bootstrap_creates_empty_cache() {
        let tmp = tempfile::tempdir().unwrap();
        let cache = SessionCache::new(tmp.path());
        assert!(!cache.is_cached("Lecture_1").await.unwrap());
        let content = std::fs::read_to_string(tmp.path().join(SESSION_CACHE_FILE)).unwrap();
        assert_eq!(content, r#"{"sessions":[]}"#);
    }

    #[tokio::test]
    async fn test_record_then_cached_across_instances() {
        let tmp = tempfile::tempdir().unwrap();
        let cache = SessionCache::new(tmp.path());
        cache.record("Lecture_1").await.unwrap();
        assert!(cache.is_cached("Lecture_1").await.unwrap());
        assert!(!cache.is_cached("Lecture_2").await.unwrap());

        let reopened = SessionCache::new(tmp.path());
        assert!(reopened.is_cached("Lecture_1").await.unwrap());
    }

    #[tokio::test]
    async fn test_record_twice_keeps_one_entry() {
        let tmp = tempfile::tempdir().unwrap();
        let cache = SessionCache::new(tmp.path());
        cache.record("Lecture_1").await.unwrap();
        cache.record("Lecture_1").await.unwrap();
        cache.record("Lecture_2").await.unwrap();
        let content = std::fs::read_to_string(cache.path()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert_eq!(value, serde_json::json!({"sessions": ["Lecture_1", "Lecture_2"]}));
    }

    #[tokio::test]
    async fn test_corrupted_cache_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join(SESSION_CACHE_FILE), "{not json").unwrap();
        let cache = SessionCache::new(tmp.path());
        assert!(matches!(
            cache.is_cached("x").await,
            Err(LectureError::CacheCorrupted(_))
        ));
        assert!(matches!(
            cache.record("x").await,
            Err(LectureError::CacheCorrupted(_))
        ));
    }
}
