use crate::core::ConfigProvider;
use crate::domain::model::CanonicalBase;
use crate::domain::settings::TableNames;
use crate::utils::error::{Result, SiteError};
use crate::utils::validation::{
    validate_distinct_copy, validate_existing_file, validate_non_empty_string, validate_path,
    validate_positive_number, validate_relative_subdir, Validate,
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::LazyLock;
use std::time::Duration;

static ENV_VAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([^}]+)\}").expect("env var pattern is valid"));

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    pub site: SiteSection,
    pub database: DatabaseSection,
    #[serde(default)]
    pub images: ImagesSection,
    #[serde(default)]
    pub homepage: HomepageSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteSection {
    pub name: Option<String>,
    pub dnamod_version: String,
    pub chebi_version: String,
    pub output_path: String,
    #[serde(default = "default_image_subdir")]
    pub image_subdir: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseSection {
    pub path: String,
    pub copy_path: Option<String>,
    #[serde(default)]
    pub tables: TableNames,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImagesSection {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_obabel")]
    pub obabel_path: String,
    pub timeout_seconds: Option<u64>,
}

impl Default for ImagesSection {
    fn default() -> Self {
        Self {
            enabled: true,
            obabel_path: default_obabel(),
            timeout_seconds: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HomepageSection {
    #[serde(default = "default_shade_origins")]
    pub shade_origins: Vec<String>,
    #[serde(default = "default_other_ratio")]
    pub other_ratio: usize,
    #[serde(default = "default_other_base")]
    pub other_shared_base: CanonicalBase,
}

impl Default for HomepageSection {
    fn default() -> Self {
        Self {
            shade_origins: default_shade_origins(),
            other_ratio: default_other_ratio(),
            other_shared_base: default_other_base(),
        }
    }
}

fn default_image_subdir() -> String {
    "images".to_string()
}

fn default_true() -> bool {
    true
}

fn default_obabel() -> String {
    "obabel".to_string()
}

fn default_shade_origins() -> Vec<String> {
    vec!["synthetic".to_string()]
}

fn default_other_ratio() -> usize {
    8
}

fn default_other_base() -> CanonicalBase {
    CanonicalBase::Thymine
}

impl SiteConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(SiteError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| SiteError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${DNAMOD_DB})，未設定的保留原樣
    fn substitute_env_vars(content: &str) -> String {
        ENV_VAR
            .replace_all(content, |caps: &regex::Captures| {
                let var_name = &caps[1];
                std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
            })
            .into_owned()
    }

    /// 驗證配置的合理性
    pub fn validate_config(&self) -> Result<()> {
        validate_non_empty_string("site.dnamod_version", &self.site.dnamod_version)?;
        validate_non_empty_string("site.chebi_version", &self.site.chebi_version)?;
        validate_path("site.output_path", &self.site.output_path)?;
        validate_relative_subdir("site.image_subdir", &self.site.image_subdir)?;

        validate_existing_file("database.path", &self.database.path)?;
        if let Some(copy) = &self.database.copy_path {
            validate_path("database.copy_path", copy)?;
            validate_distinct_copy("database.copy_path", &self.database.path, copy)?;
        }
        self.database.tables.validate("database.tables")?;

        if self.images.enabled {
            validate_non_empty_string("images.obabel_path", &self.images.obabel_path)?;
            if let Some(timeout) = self.images.timeout_seconds {
                validate_positive_number("images.timeout_seconds", timeout as usize, 1)?;
            }
        }

        validate_positive_number("homepage.other_ratio", self.homepage.other_ratio, 1)?;
        for origin in &self.homepage.shade_origins {
            validate_non_empty_string("homepage.shade_origins", origin)?;
        }

        Ok(())
    }

    pub fn site_name(&self) -> &str {
        self.site.name.as_deref().unwrap_or("DNAmod")
    }

    pub fn images_enabled(&self) -> bool {
        self.images.enabled
    }

    pub fn render_timeout(&self) -> Duration {
        Duration::from_secs(self.images.timeout_seconds.unwrap_or(30))
    }
}

impl ConfigProvider for SiteConfig {
    fn database_path(&self) -> &str {
        &self.database.path
    }

    fn database_copy_path(&self) -> Option<&str> {
        self.database.copy_path.as_deref()
    }

    fn output_path(&self) -> &str {
        &self.site.output_path
    }

    fn image_subdir(&self) -> &str {
        &self.site.image_subdir
    }

    fn tables(&self) -> &TableNames {
        &self.database.tables
    }

    fn dnamod_version(&self) -> &str {
        &self.site.dnamod_version
    }

    fn chebi_version(&self) -> &str {
        &self.site.chebi_version
    }

    fn shade_origins(&self) -> &[String] {
        &self.homepage.shade_origins
    }

    fn other_ratio(&self) -> usize {
        self.homepage.other_ratio
    }

    fn other_shared_base(&self) -> CanonicalBase {
        self.homepage.other_shared_base
    }
}

impl Validate for SiteConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
