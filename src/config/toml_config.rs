use crate::core::importer::DEFAULT_MAX_IMAGE_BYTES;
use crate::domain::model::ExportFormat;
use crate::domain::ports::ConfigProvider;
use crate::utils::error::{CardError, Result};
use crate::utils::validation::{self, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    pub storage: StorageConfig,
    pub import: ImportConfig,
    pub export: ExportConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub data_dir: String,
    pub cards_file: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: "./data".to_string(),
            cards_file: "cards.json".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportConfig {
    pub max_image_bytes: usize,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            max_image_bytes: DEFAULT_MAX_IMAGE_BYTES,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    pub default_format: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            default_format: "csv".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: Option<String>,
    pub json: bool,
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(CardError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| CardError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${CARD_DATA_DIR})，未設定的保持原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| CardError::ConfigError {
            message: e.to_string(),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn validate_config(&self) -> Result<()> {
        validation::validate_path("storage.data_dir", &self.storage.data_dir)?;
        validation::validate_path("storage.cards_file", &self.storage.cards_file)?;
        validation::validate_positive_number("import.max_image_bytes", self.import.max_image_bytes, 1)?;
        validation::validate_one_of(
            "export.default_format",
            &self.export.default_format.to_ascii_lowercase(),
            &["csv", "xml"],
        )?;
        if let Some(level) = &self.logging.level {
            validation::validate_one_of(
                "logging.level",
                &level.to_ascii_lowercase(),
                &["trace", "debug", "info", "warn", "error"],
            )?;
        }
        Ok(())
    }

    pub fn export_format(&self) -> Result<ExportFormat> {
        self.export.default_format.parse()
    }
}

impl ConfigProvider for TomlConfig {
    fn data_dir(&self) -> &str {
        &self.storage.data_dir
    }

    fn cards_file(&self) -> &str {
        &self.storage.cards_file
    }

    fn max_image_bytes(&self) -> usize {
        self.import.max_image_bytes
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
