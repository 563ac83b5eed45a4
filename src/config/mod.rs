//! Extractor Configuration
//!
//! Tunable heuristics stored in TOML format. The defaults encode the
//! schedule layout this tool was built for (Brazilian trucking schedules);
//! every token set stays configurable so a different table layout or
//! document regime only needs a config file, not a code change.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::analysis::rows::DEFAULT_Y_TOLERANCE;

/// Extractor settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractorConfig {
    /// Row grouping settings
    pub grouping: GroupingConfig,
    /// Field extraction settings
    pub parsing: ParsingConfig,
    /// Output rendering settings
    pub output: OutputConfig,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            grouping: GroupingConfig::default(),
            parsing: ParsingConfig::default(),
            output: OutputConfig::default(),
        }
    }
}

/// Row grouping settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupingConfig {
    /// Vertical tolerance (pixels) for two detections to share a table line
    pub y_tolerance: f32,
}

impl Default for GroupingConfig {
    fn default() -> Self {
        Self {
            y_tolerance: DEFAULT_Y_TOLERANCE,
        }
    }
}

/// Field extraction settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParsingConfig {
    /// State abbreviations recognized as destination candidates
    pub state_tokens: Vec<String>,
    /// City names stripped from the text before name extraction
    pub city_tokens: Vec<String>,
    /// Rows containing any of these markers are header/noise and skipped
    pub skip_keywords: Vec<String>,
}

impl Default for ParsingConfig {
    fn default() -> Self {
        Self {
            state_tokens: to_strings(&[
                "SP", "RJ", "MG", "BA", "PR", "SC", "RS", "GO", "MT", "MS", "ES", "PB", "DF",
            ]),
            city_tokens: to_strings(&["CAJAMAR", "PAVUNA", "RIBEIRÃO", "UBERLÂNDIA"]),
            skip_keywords: to_strings(&["TERÇA", "SAÍDA", "ORIG"]),
        }
    }
}

/// Output rendering settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Constant origin tag printed as the first line of every driver block
    pub origin_tag: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            origin_tag: "FSJ".to_string(),
        }
    }
}

fn to_strings(tokens: &[&str]) -> Vec<String> {
    tokens.iter().map(|t| (*t).to_string()).collect()
}

/// Load configuration from file
pub fn load_config(path: &Path) -> Result<ExtractorConfig> {
    let content = std::fs::read_to_string(path)?;
    let config: ExtractorConfig = toml::from_str(&content)?;
    Ok(config)
}

/// Save configuration to file
pub fn save_config(config: &ExtractorConfig, path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content)?;
    Ok(())
}

/// Path of the user-level config file, creating the directory if needed
pub fn default_config_path() -> Result<PathBuf> {
    let proj_dirs = directories::ProjectDirs::from("com", "schedule-extractor", "ScheduleExtractor")
        .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;

    let config_dir = proj_dirs.config_dir().to_path_buf();
    std::fs::create_dir_all(&config_dir)?;

    Ok(config_dir.join("config.toml"))
}
