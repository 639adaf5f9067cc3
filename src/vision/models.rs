//! Recognition model management
//!
//! Downloads and caches the text detection/recognition models the OCR
//! engine needs. Models are fetched once, verified by size and digest,
//! and reused from the local cache on every later run; a connectivity
//! failure here is what surfaces to the user as "scanner unavailable".

use anyhow::{Context, Result};
use futures_util::StreamExt;
use sha2::{Digest, Sha256};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Model identifier for the OCR engine components
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelKind {
    /// Text detection model (finds word regions)
    Detection,
    /// Text recognition model (reads the regions)
    Recognition,
}

impl ModelKind {
    /// File name for this model in the cache directory
    pub fn filename(&self) -> &'static str {
        match self {
            ModelKind::Detection => "text-detection.rten",
            ModelKind::Recognition => "text-recognition.rten",
        }
    }

    /// Download URL for this model
    pub fn download_url(&self) -> &'static str {
        match self {
            ModelKind::Detection => {
                "https://ocrs-models.s3-accelerate.amazonaws.com/text-detection.rten"
            }
            ModelKind::Recognition => {
                "https://ocrs-models.s3-accelerate.amazonaws.com/text-recognition.rten"
            }
        }
    }

    /// Plausible file size range for integrity checking, in bytes
    pub fn expected_size_range(&self) -> (u64, u64) {
        match self {
            ModelKind::Detection => (500_000, 20_000_000),
            ModelKind::Recognition => (1_000_000, 40_000_000),
        }
    }

    /// Expected SHA-256 digest, when pinned
    pub fn expected_sha256(&self) -> Option<&'static str> {
        // Upstream publishes unversioned model URLs; digests are recorded
        // in the manifest at download time instead of pinned here.
        match self {
            ModelKind::Detection => None,
            ModelKind::Recognition => None,
        }
    }

    /// Display name for log messages
    pub fn display_name(&self) -> &'static str {
        match self {
            ModelKind::Detection => "Text Detection",
            ModelKind::Recognition => "Text Recognition",
        }
    }
}

/// Manifest recording what was downloaded, when, and with which digest
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct ModelManifest {
    pub models: Vec<ModelInfo>,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ModelInfo {
    pub filename: String,
    pub size_bytes: u64,
    pub sha256: String,
    pub downloaded_at_unix: u64,
}

/// Downloads and caches OCR models
pub struct ModelManager {
    models_dir: PathBuf,
}

impl ModelManager {
    /// Create a model manager using the application data directory
    pub fn new() -> Result<Self> {
        let data_dir = crate::config::get_data_dir()?;
        Self::with_dir(data_dir.join("models"))
    }

    /// Create a model manager with a custom cache directory
    pub fn with_dir(models_dir: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(&models_dir)
            .with_context(|| format!("Failed to create models directory {:?}", models_dir))?;
        Ok(Self { models_dir })
    }

    /// Cache directory path
    pub fn models_dir(&self) -> &Path {
        &self.models_dir
    }

    /// Path a model lives at once cached
    pub fn model_path(&self, kind: ModelKind) -> PathBuf {
        self.models_dir.join(kind.filename())
    }

    /// Whether a model is cached and passes the size sanity check
    pub fn is_model_available(&self, kind: ModelKind) -> bool {
        let path = self.model_path(kind);
        if !path.exists() {
            return false;
        }
        match std::fs::metadata(&path) {
            Ok(metadata) => {
                let (min, max) = kind.expected_size_range();
                let size = metadata.len();
                size >= min && size <= max
            }
            Err(_) => false,
        }
    }

    /// Whether both models the engine needs are cached
    pub fn are_models_ready(&self) -> bool {
        self.is_model_available(ModelKind::Detection) && self.is_model_available(ModelKind::Recognition)
    }

    /// Download a model if not already cached; returns its path
    pub async fn ensure_model(&self, kind: ModelKind) -> Result<PathBuf> {
        let path = self.model_path(kind);
        if self.is_model_available(kind) {
            debug!("{} model already cached at {:?}", kind.display_name(), path);
            return Ok(path);
        }

        info!("Downloading {} model...", kind.display_name());
        self.download_model(kind).await?;
        Ok(path)
    }

    /// Download every model the engine needs
    pub async fn ensure_all_models(&self) -> Result<()> {
        self.ensure_model(ModelKind::Detection).await?;
        self.ensure_model(ModelKind::Recognition).await?;
        Ok(())
    }

    async fn download_model(&self, kind: ModelKind) -> Result<()> {
        let url = kind.download_url();
        let path = self.model_path(kind);

        if std::env::var("CARDLENS_OFFLINE").is_ok() {
            anyhow::bail!(
                "Offline mode: cannot download models. Download manually from {} and place at {:?}",
                url,
                path
            );
        }

        let digest = self.download_file(url, &path).await?;

        if !self.is_model_available(kind) {
            anyhow::bail!("Download completed but model verification failed");
        }

        if let Some(expected) = kind.expected_sha256() {
            if digest != expected {
                std::fs::remove_file(&path).ok();
                anyhow::bail!(
                    "Checksum mismatch for {}: expected {}, got {}",
                    kind.filename(),
                    expected,
                    digest
                );
            }
        }

        self.record_download(kind, &digest)?;
        info!("Downloaded {} model", kind.display_name());
        Ok(())
    }

    /// Stream a file to disk via a temp path, returning its SHA-256 digest
    async fn download_file(&self, url: &str, path: &Path) -> Result<String> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(300))
            .build()
            .context("Failed to create HTTP client")?;

        let response = client
            .get(url)
            .send()
            .await
            .context("Failed to send download request")?;

        if !response.status().is_success() {
            anyhow::bail!("Download failed with status {}: {}", response.status(), url);
        }

        debug!("Download size: {:?} bytes", response.content_length());

        let temp_path = path.with_extension("tmp");
        let mut file =
            std::fs::File::create(&temp_path).context("Failed to create temp file")?;

        let mut hasher = Sha256::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.context("Error reading download stream")?;
            file.write_all(&chunk).context("Failed to write to temp file")?;
            hasher.update(&chunk);
        }
        file.flush().context("Failed to flush temp file")?;
        drop(file);

        std::fs::rename(&temp_path, path)
            .context("Failed to move downloaded file into place")?;

        Ok(format!("{:x}", hasher.finalize()))
    }

    fn record_download(&self, kind: ModelKind, digest: &str) -> Result<()> {
        let mut manifest = self.load_manifest().unwrap_or_default();
        let path = self.model_path(kind);
        let metadata = std::fs::metadata(&path)?;

        let info = ModelInfo {
            filename: kind.filename().to_string(),
            size_bytes: metadata.len(),
            sha256: digest.to_string(),
            downloaded_at_unix: std::time::SystemTime::now()
                .duration_since(std::time::SystemTime::UNIX_EPOCH)
                .unwrap_or_default()
                .as_secs(),
        };

        if let Some(existing) = manifest
            .models
            .iter_mut()
            .find(|m| m.filename == info.filename)
        {
            *existing = info;
        } else {
            manifest.models.push(info);
        }

        self.save_manifest(&manifest)
    }

    /// Load the manifest, or an empty one when none exists yet
    pub fn load_manifest(&self) -> Result<ModelManifest> {
        let manifest_path = self.models_dir.join("manifest.json");
        if manifest_path.exists() {
            let content = std::fs::read_to_string(&manifest_path)?;
            Ok(serde_json::from_str(&content)?)
        } else {
            Ok(ModelManifest::default())
        }
    }

    /// Persist the manifest next to the models
    pub fn save_manifest(&self, manifest: &ModelManifest) -> Result<()> {
        let manifest_path = self.models_dir.join("manifest.json");
        let content = serde_json::to_string_pretty(manifest)?;
        std::fs::write(manifest_path, content)?;
        Ok(())
    }
}
