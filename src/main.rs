//! CardLens - trading card scanner
//!
//! Scans a card photo, identifies the card against the public catalog,
//! and optionally translates its rules text.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use cardlens::capture;
use cardlens::config::{self, AppConfig};
use cardlens::lookup::CatalogClient;
use cardlens::scan::ScanPipeline;
use cardlens::translate::HttpTranslator;
use cardlens::vision::{ModelManager, TextExtractor};
use cardlens::CardRecord;

/// CardLens - photograph, identify, and translate trading cards
#[derive(Parser, Debug)]
#[command(name = "cardlens")]
#[command(about = "Scan a trading card photo and look the card up in the catalog")]
struct Args {
    /// Card photo to scan
    image: Option<PathBuf>,

    /// Translate the resolved card's rules text
    #[arg(long)]
    translate: bool,

    /// Target language for localization and translation (e.g. "pt")
    #[arg(long)]
    target_lang: Option<String>,

    /// Scan the whole frame instead of the title/collector bands
    #[arg(long)]
    full_frame: bool,

    /// Detect the card boundary and correct perspective before cropping
    #[arg(long)]
    perspective: bool,

    /// Binarization threshold override (1-254)
    #[arg(long)]
    threshold: Option<u8>,

    /// Number of recognition passes
    #[arg(long)]
    passes: Option<u32>,

    /// Directory holding the OCR models (downloaded there when absent)
    #[arg(long)]
    models_dir: Option<PathBuf>,

    /// Download the OCR models and exit
    #[arg(long)]
    download_models: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let args = Args::parse();
    let mut config = load_or_create_config();
    apply_overrides(&mut config, &args);

    let models = match config.ocr.models_dir.clone() {
        Some(dir) => ModelManager::with_dir(dir)?,
        None => ModelManager::new()?,
    };

    if args.download_models {
        models.ensure_all_models().await?;
        info!("Models ready at {:?}", models.models_dir());
        return Ok(());
    }

    let image = args
        .image
        .context("No image given. Pass a card photo to scan, or --download-models.")?;

    if config.ocr.language != "en" {
        warn!(
            "Recognition models cover Latin-script text; OCR language {:?} may read poorly",
            config.ocr.language
        );
    }

    // The recognition models are the one expensive load; fetch them once
    // and reuse the engine for every zone of the scan
    models
        .ensure_all_models()
        .await
        .context("Scanner unavailable: could not fetch recognition models")?;
    let extractor = TextExtractor::new(models.models_dir())?;

    let catalog = CatalogClient::new(
        &config.lookup.base_url,
        std::time::Duration::from_secs(config.lookup.timeout_secs),
    )?;
    let translator = HttpTranslator::new(
        &config.translation.endpoint,
        std::time::Duration::from_secs(config.translation.timeout_secs),
    )?;

    let pipeline = ScanPipeline::new(extractor, catalog, translator, &config);

    info!("Scanning {:?}", image);
    let frame = capture::load_frame(&image)?;
    let record = pipeline.scan(&frame).await?;
    print_record(&record);

    if args.translate {
        let translated = pipeline.translate().await?;
        if let Some(text) = &translated.translated_text {
            println!();
            println!("--- {} translation ---", config.translation.target_lang);
            println!("{}", text);
        }
    }

    Ok(())
}

/// Load configuration from the config directory or fall back to defaults
fn load_or_create_config() -> AppConfig {
    if let Ok(config_dir) = config::get_config_dir() {
        let config_path = config_dir.join("config.toml");
        if config_path.exists() {
            if let Ok(loaded) = config::load_config(&config_path) {
                info!("Loaded configuration from {:?}", config_path);
                return loaded;
            }
        }
    }
    info!("Using default configuration");
    AppConfig::default()
}

fn apply_overrides(config: &mut AppConfig, args: &Args) {
    if let Some(lang) = &args.target_lang {
        config.translation.target_lang = lang.clone();
    }
    if let Some(threshold) = args.threshold {
        config.scan.threshold = threshold;
    }
    if let Some(passes) = args.passes {
        config.scan.passes = passes;
    }
    if args.full_frame {
        config.scan.full_frame = true;
    }
    if args.perspective {
        config.scan.perspective_correction = true;
    }
    if let Some(dir) = &args.models_dir {
        config.ocr.models_dir = Some(dir.clone());
    }
}

fn print_record(record: &CardRecord) {
    println!("{}", record.display_name());
    println!("{}", record.display_type_line());

    if let (Some(set), Some(number)) = (&record.set_code, &record.collector_number) {
        println!("{} #{} [{}]", set.to_uppercase(), number, record.language_tag);
    }
    if let Some(text) = record.display_rules_text() {
        println!();
        println!("{}", text);
    }
    if let Some(uri) = record.image_uri() {
        println!();
        println!("Image: {}", uri);
    }
}
