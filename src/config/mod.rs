//! Application Configuration
//!
//! One TOML structure holds every knob the scan pipeline exposes:
//! binarization threshold, zone geometry, recognition passes, candidate
//! filtering, and the remote service endpoints with their deadlines.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::vision::ZoneRect;

/// Application settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Capture and recognition tuning
    pub scan: ScanSettings,
    /// OCR engine settings
    pub ocr: OcrSettings,
    /// Card catalog settings
    pub lookup: LookupSettings,
    /// Translation service settings
    pub translation: TranslationSettings,
}

/// Capture and recognition tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanSettings {
    /// Brightness cutoff for binarization (empirically 100-160)
    pub threshold: u8,
    /// Name/title band geometry
    pub title_zone: ZoneRect,
    /// Collector-info band geometry
    pub collector_zone: ZoneRect,
    /// Number of recognition passes; passes beyond the first step the
    /// threshold up and down to rescue difficult lighting
    pub passes: u32,
    /// Candidate lines must be longer than this many characters
    pub candidate_min_len: usize,
    /// Scan the whole frame instead of the two zones
    pub full_frame: bool,
    /// Detect the card boundary and warp it upright before cropping
    pub perspective_correction: bool,
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            threshold: 140,
            title_zone: ZoneRect::title_band(),
            collector_zone: ZoneRect::collector_band(),
            passes: 1,
            candidate_min_len: 4,
            full_frame: false,
            perspective_correction: false,
        }
    }
}

/// OCR engine settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OcrSettings {
    /// Source language of the printed cards, for recognition purposes.
    /// Fixed to the cards' base language regardless of the target locale.
    pub language: String,
    /// Model cache directory; `None` uses the application data directory
    pub models_dir: Option<PathBuf>,
}

impl Default for OcrSettings {
    fn default() -> Self {
        Self {
            language: "en".to_string(),
            models_dir: None,
        }
    }
}

/// Card catalog settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LookupSettings {
    /// Base URL of the catalog API
    pub base_url: String,
    /// Per-request deadline in seconds
    pub timeout_secs: u64,
}

impl Default for LookupSettings {
    fn default() -> Self {
        Self {
            base_url: "https://api.scryfall.com".to_string(),
            timeout_secs: 10,
        }
    }
}

/// Translation service settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslationSettings {
    /// Translation endpoint URL
    pub endpoint: String,
    /// Language the cards' rules text is written in
    pub source_lang: String,
    /// Language to localize and translate into
    pub target_lang: String,
    /// Per-request deadline in seconds
    pub timeout_secs: u64,
}

impl Default for TranslationSettings {
    fn default() -> Self {
        Self {
            endpoint: "https://translate.googleapis.com/translate_a/single".to_string(),
            source_lang: "en".to_string(),
            target_lang: "pt".to_string(),
            timeout_secs: 10,
        }
    }
}

/// Load configuration from file
pub fn load_config(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)?;
    let config: AppConfig = toml::from_str(&content)?;
    Ok(config)
}

/// Save configuration to file
pub fn save_config(config: &AppConfig, path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content)?;
    Ok(())
}

/// Get the application configuration directory
pub fn get_config_dir() -> Result<PathBuf> {
    let proj_dirs = directories::ProjectDirs::from("io", "cardlens", "CardLens")
        .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;

    let config_dir = proj_dirs.config_dir().to_path_buf();
    std::fs::create_dir_all(&config_dir)?;

    Ok(config_dir)
}

/// Get the application data directory (model cache lives here)
pub fn get_data_dir() -> Result<PathBuf> {
    let proj_dirs = directories::ProjectDirs::from("io", "cardlens", "CardLens")
        .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))?;

    let data_dir = proj_dirs.data_dir().to_path_buf();
    std::fs::create_dir_all(&data_dir)?;

    Ok(data_dir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_app_config() {
        let config = AppConfig::default();

        assert_eq!(config.scan.threshold, 140);
        assert_eq!(config.scan.passes, 1);
        assert_eq!(config.scan.candidate_min_len, 4);
        assert!(!config.scan.full_frame);
        assert!(!config.scan.perspective_correction);

        assert_eq!(config.ocr.language, "en");
        assert!(config.ocr.models_dir.is_none());

        assert_eq!(config.lookup.base_url, "https://api.scryfall.com");
        assert_eq!(config.lookup.timeout_secs, 10);

        assert_eq!(config.translation.source_lang, "en");
        assert_eq!(config.translation.target_lang, "pt");
    }

    #[test]
    fn test_default_threshold_in_empirical_range() {
        let config = AppConfig::default();
        assert!((100..=160).contains(&config.scan.threshold));
    }

    #[test]
    fn test_config_serialization_roundtrip() {
        let config = AppConfig::default();

        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();

        assert_eq!(config.scan.threshold, parsed.scan.threshold);
        assert_eq!(config.scan.title_zone, parsed.scan.title_zone);
        assert_eq!(config.lookup.base_url, parsed.lookup.base_url);
        assert_eq!(config.translation.target_lang, parsed.translation.target_lang);
    }

    #[test]
    fn test_config_with_custom_values() {
        let mut config = AppConfig::default();
        config.scan.threshold = 120;
        config.scan.passes = 3;
        config.translation.target_lang = "de".to_string();

        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();

        assert_eq!(parsed.scan.threshold, 120);
        assert_eq!(parsed.scan.passes, 3);
        assert_eq!(parsed.translation.target_lang, "de");
    }

    #[test]
    fn test_save_and_load_config() {
        let config = AppConfig::default();
        let temp_file = NamedTempFile::new().unwrap();

        save_config(&config, temp_file.path()).unwrap();
        let loaded = load_config(temp_file.path()).unwrap();

        assert_eq!(config.scan.threshold, loaded.scan.threshold);
        assert_eq!(config.lookup.base_url, loaded.lookup.base_url);
    }

    #[test]
    fn test_load_config_file_not_found() {
        let result = load_config(Path::new("/nonexistent/path/config.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn test_load_config_invalid_toml() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(temp_file, "this is not valid toml {{{{").unwrap();

        let result = load_config(temp_file.path());
        assert!(result.is_err());
    }
}
