use batchgen::scheduler::{BatchConfig, DEFAULT_CONCURRENCY, DEFAULT_MAX_RETRIES};
use eyre::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub log_level: Option<String>,
    pub batch: BatchSection,
    pub generator: GeneratorSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct BatchSection {
    pub concurrency: usize,
    pub item_delay_ms: u64,
    pub max_retries: u32,
}

impl Default for BatchSection {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            item_delay_ms: 0,
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct GeneratorSection {
    /// Shell command run once per item; empty means it must come from `--command`
    pub command: String,
    pub timeout_ms: u64,
}

impl Default for GeneratorSection {
    fn default() -> Self {
        Self {
            command: String::new(),
            timeout_ms: 300000,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: Some("info".to_string()),
            batch: BatchSection::default(),
            generator: GeneratorSection::default(),
        }
    }
}

impl Config {
    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        // Try primary location: ~/.config/<project>/<project>.yml
        if let Some(config_dir) = dirs::config_dir() {
            let project_name = env!("CARGO_PKG_NAME");
            let primary_config = config_dir.join(project_name).join(format!("{}.yml", project_name));
            if primary_config.exists() {
                match Self::load_from_file(&primary_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        log::warn!("Failed to load config from {}: {}", primary_config.display(), e);
                    }
                }
            }
        }

        // Try fallback location: ./<project>.yml
        let project_name = env!("CARGO_PKG_NAME");
        let fallback_config = PathBuf::from(format!("{}.yml", project_name));
        if fallback_config.exists() {
            match Self::load_from_file(&fallback_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    log::warn!("Failed to load config from {}: {}", fallback_config.display(), e);
                }
            }
        }

        log::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;
        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        log::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }

    /// Apply command-line overrides on top of file values
    pub fn with_overrides(
        mut self,
        concurrency: Option<usize>,
        item_delay_ms: Option<u64>,
        max_retries: Option<u32>,
        command: Option<&str>,
    ) -> Self {
        if let Some(concurrency) = concurrency {
            self.batch.concurrency = concurrency;
        }
        if let Some(delay) = item_delay_ms {
            self.batch.item_delay_ms = delay;
        }
        if let Some(retries) = max_retries {
            self.batch.max_retries = retries;
        }
        if let Some(command) = command {
            self.generator.command = command.to_string();
        }
        self
    }

    /// Check that a batch can actually be run with these settings
    pub fn validate(&self) -> Result<()> {
        if self.batch.concurrency == 0 {
            bail!("batch.concurrency must be at least 1");
        }
        if self.generator.command.trim().is_empty() {
            bail!("No generator command configured (set generator.command or pass --command)");
        }
        if self.generator.timeout_ms == 0 {
            bail!("generator.timeout-ms must be greater than 0");
        }
        Ok(())
    }

    pub fn batch_config(&self) -> BatchConfig {
        BatchConfig::default()
            .with_concurrency(self.batch.concurrency)
            .with_item_delay(Duration::from_millis(self.batch.item_delay_ms))
            .with_max_retries(self.batch.max_retries)
    }
}
