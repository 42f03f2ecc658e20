use crate::core::{ConfigProvider, Storage};
use crate::domain::model::CanonicalBase;
use crate::domain::settings::TableNames;
use crate::utils::error::Result;
use crate::utils::validation::{
    validate_distinct_copy, validate_existing_file, validate_non_empty_string, validate_path,
    validate_positive_number, validate_relative_subdir, Validate,
};
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "dnamod-site")]
#[command(about = "Generate the DNAmod static website from the modification database")]
pub struct CliConfig {
    #[arg(long, default_value = "DNA_mod_database.db")]
    pub database: String,

    #[arg(long, help = "Working copy of the database (default: <database>.copy)")]
    pub database_copy: Option<String>,

    #[arg(long, default_value = "./www")]
    pub output_path: String,

    #[arg(long, default_value = "images")]
    pub image_subdir: String,

    #[arg(long, help = "Write pages without structure images")]
    pub no_images: bool,

    #[arg(long, default_value = "obabel")]
    pub obabel: String,

    #[arg(long, default_value = "30")]
    pub render_timeout_seconds: u64,

    #[arg(long)]
    pub dnamod_version: String,

    #[arg(long)]
    pub chebi_version: String,

    #[arg(long, value_delimiter = ',', default_value = "synthetic")]
    pub shade_origins: Vec<String>,

    #[arg(long, default_value = "8")]
    pub other_ratio: usize,

    #[arg(long, default_value = "thymine")]
    pub other_base: CanonicalBase,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(skip)]
    #[serde(default)]
    pub tables: TableNames,
}

impl ConfigProvider for CliConfig {
    fn database_path(&self) -> &str {
        &self.database
    }

    fn database_copy_path(&self) -> Option<&str> {
        self.database_copy.as_deref()
    }

    fn output_path(&self) -> &str {
        &self.output_path
    }

    fn image_subdir(&self) -> &str {
        &self.image_subdir
    }

    fn tables(&self) -> &TableNames {
        &self.tables
    }

    fn dnamod_version(&self) -> &str {
        &self.dnamod_version
    }

    fn chebi_version(&self) -> &str {
        &self.chebi_version
    }

    fn shade_origins(&self) -> &[String] {
        &self.shade_origins
    }

    fn other_ratio(&self) -> usize {
        self.other_ratio
    }

    fn other_shared_base(&self) -> CanonicalBase {
        self.other_base
    }
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validate_existing_file("database", &self.database)?;
        if let Some(copy) = &self.database_copy {
            validate_path("database_copy", copy)?;
            validate_distinct_copy("database_copy", &self.database, copy)?;
        }
        validate_path("output_path", &self.output_path)?;
        validate_relative_subdir("image_subdir", &self.image_subdir)?;
        if !self.no_images {
            validate_non_empty_string("obabel", &self.obabel)?;
            validate_positive_number(
                "render_timeout_seconds",
                self.render_timeout_seconds as usize,
                1,
            )?;
        }
        validate_non_empty_string("dnamod_version", &self.dnamod_version)?;
        validate_non_empty_string("chebi_version", &self.chebi_version)?;
        validate_positive_number("other_ratio", self.other_ratio, 1)?;
        self.tables.validate("tables")
    }
}

/// Writes the generated site under a local output directory.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    base_path: String,
}

impl LocalStorage {
    pub fn new(base_path: String) -> Self {
        Self { base_path }
    }
}

impl Storage for LocalStorage {
    async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
        let full_path = Path::new(&self.base_path).join(path);

        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(&full_path, data)?;
        tracing::debug!("Wrote {} ({} bytes)", full_path.display(), data.len());
        Ok(())
    }
}
