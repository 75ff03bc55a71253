//! Local cache for the card reference database.
//!
//! Card database files are downloaded lazily from the configured base URL on
//! first access and refreshed once they are older than the refresh age.

use crate::config;
use crate::error::{MetagameError, Result};
use flate2::read::GzDecoder;
use reqwest::blocking::Client;
use std::fs;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tracing::{info, warn};

/// Downloads and caches card database files.
pub struct CacheManager {
    /// Directory where cached files are stored.
    pub cache_dir: PathBuf,
    /// If true, never download (use cached files only).
    pub offline: bool,
    /// Base URL the file names from [`config::json_files`] are appended to.
    pub base_url: String,
    refresh_after: Duration,
    timeout: Duration,
    client: Option<Client>,
}

impl CacheManager {
    /// Create a new cache manager.
    ///
    /// If `cache_dir` is `None`, uses the platform-appropriate default cache directory.
    /// Creates the cache directory if it does not exist.
    pub fn new(cache_dir: Option<PathBuf>, offline: bool, timeout: Duration) -> Result<Self> {
        let dir = cache_dir.unwrap_or_else(config::default_cache_dir);
        fs::create_dir_all(&dir)?;
        Ok(Self {
            cache_dir: dir,
            offline,
            base_url: config::CARD_DB_BASE.to_string(),
            refresh_after: config::DEFAULT_REFRESH_AFTER,
            timeout,
            client: None,
        })
    }

    /// Override how old a cached file may get before it is downloaded again.
    pub fn with_refresh_after(mut self, refresh_after: Duration) -> Self {
        self.refresh_after = refresh_after;
        self
    }

    /// Override the download base URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Lazy HTTP client, created on first use.
    fn client(&mut self) -> Result<Client> {
        if let Some(client) = &self.client {
            return Ok(client.clone());
        }
        let client = Client::builder()
            .timeout(self.timeout)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()?;
        self.client = Some(client.clone());
        Ok(client)
    }

    /// Whether a cached file is missing or older than the refresh age.
    pub fn is_stale(&self, path: &Path) -> bool {
        let modified = fs::metadata(path).and_then(|m| m.modified());
        match modified {
            Ok(at) => SystemTime::now()
                .duration_since(at)
                .map(|age| age > self.refresh_after)
                .unwrap_or(false),
            Err(_) => true,
        }
    }

    /// Download a single file.
    ///
    /// Downloads to a temp file first and renames on success, so an
    /// interrupted download never leaves a corrupt partial file behind.
    fn download_file(&mut self, filename: &str, dest: &Path) -> Result<()> {
        let url = format!("{}/{}", self.base_url.trim_end_matches('/'), filename);
        info!(%url, "downloading card database file");

        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }

        let tmp_dest = dest.with_extension(format!(
            "{}.tmp",
            dest.extension().and_then(|e| e.to_str()).unwrap_or("")
        ));

        let client = self.client()?;
        let result = (|| -> Result<()> {
            let resp = client.get(&url).send()?.error_for_status()?;
            let bytes = resp.bytes()?;
            fs::write(&tmp_dest, &bytes)?;
            fs::rename(&tmp_dest, dest)?;
            Ok(())
        })();

        if result.is_err() {
            let _ = fs::remove_file(&tmp_dest);
        }

        result
    }

    /// Ensure a JSON file is cached locally, downloading if needed.
    ///
    /// # Arguments
    ///
    /// * `name` - Logical file name (e.g. `"cards"`, `"sets"`).
    ///
    /// # Returns
    ///
    /// Local filesystem path to the cached JSON file.
    pub fn ensure_json(&mut self, name: &str) -> Result<PathBuf> {
        let json_files = config::json_files();
        let filename = json_files
            .get(name)
            .ok_or_else(|| MetagameError::NotFound(format!("Unknown JSON file: {}", name)))?;

        let local_path = self.cache_dir.join(filename);

        if self.is_stale(&local_path) {
            if self.offline {
                if local_path.exists() {
                    return Ok(local_path);
                }
                return Err(MetagameError::NotFound(format!(
                    "Card database file {} not cached and offline mode is enabled",
                    filename
                )));
            }
            if let Err(e) = self.download_file(filename, &local_path) {
                // A stale copy beats no copy at all.
                if local_path.exists() {
                    warn!(file = %filename, error = %e, "refresh failed, using stale cache");
                    return Ok(local_path);
                }
                return Err(e);
            }
        }

        Ok(local_path)
    }

    /// Load and parse a cached JSON file (handles `.gz` transparently).
    ///
    /// A corrupt cached file is deleted so the next call downloads a fresh copy.
    pub fn load_json(&mut self, name: &str) -> Result<serde_json::Value> {
        let path = self.ensure_json(name)?;
        read_json_file(&path).map_err(|e| {
            warn!(path = %path.display(), error = %e, "corrupt cache file, removing");
            let _ = fs::remove_file(&path);
            MetagameError::NotFound(format!(
                "Cache file '{}' was corrupt and has been removed. \
                 Retry to re-download. Original error: {}",
                path.file_name().and_then(|n| n.to_str()).unwrap_or("unknown"),
                e
            ))
        })
    }

    /// Remove all cached files and recreate the cache directory.
    pub fn clear(&self) -> Result<()> {
        if self.cache_dir.exists() {
            fs::remove_dir_all(&self.cache_dir)?;
            fs::create_dir_all(&self.cache_dir)?;
        }
        Ok(())
    }
}

/// Read a JSON document from disk, decompressing `.gz` files.
pub fn read_json_file(path: &Path) -> Result<serde_json::Value> {
    let contents = if path.extension().and_then(|e| e.to_str()) == Some("gz") {
        let file = fs::File::open(path)?;
        let mut decoder = BufReader::new(GzDecoder::new(BufReader::new(file)));
        let mut contents = String::new();
        decoder.read_to_string(&mut contents)?;
        contents
    } else {
        fs::read_to_string(path)?
    };
    Ok(serde_json::from_str(&contents)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;

    #[test]
    fn offline_without_cached_file_is_not_found() {
        let tmp = tempfile::tempdir().unwrap();
        let mut cache =
            CacheManager::new(Some(tmp.path().to_path_buf()), true, Duration::from_secs(5))
                .unwrap();
        let err = cache.ensure_json("cards").unwrap_err();
        assert!(matches!(err, MetagameError::NotFound(_)));
    }

    #[test]
    fn offline_uses_existing_file_even_when_stale() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("cards.json"), "[]").unwrap();
        let mut cache =
            CacheManager::new(Some(tmp.path().to_path_buf()), true, Duration::from_secs(5))
                .unwrap()
                .with_refresh_after(Duration::ZERO);
        let value = cache.load_json("cards").unwrap();
        assert_eq!(value, serde_json::json!([]));
    }

    #[test]
    fn unknown_logical_name_is_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let mut cache =
            CacheManager::new(Some(tmp.path().to_path_buf()), true, Duration::from_secs(5))
                .unwrap();
        assert!(cache.ensure_json("prices").is_err());
    }

    #[test]
    fn read_json_file_decompresses_gzip() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("cards.json.gz");
        let mut enc = GzEncoder::new(Vec::new(), Compression::default());
        enc.write_all(br#"[{"set":"A1","number":1}]"#).unwrap();
        fs::write(&path, enc.finish().unwrap()).unwrap();

        let value = read_json_file(&path).unwrap();
        assert_eq!(value[0]["set"], "A1");
    }

    #[test]
    fn missing_file_is_stale() {
        let tmp = tempfile::tempdir().unwrap();
        let cache =
            CacheManager::new(Some(tmp.path().to_path_buf()), true, Duration::from_secs(5))
                .unwrap();
        assert!(cache.is_stale(&tmp.path().join("nope.json")));
    }
}
