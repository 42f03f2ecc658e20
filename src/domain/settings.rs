use crate::domain::ports::ConfigProvider;
use crate::utils::error::Result;
use crate::utils::validation::validate_sql_identifier;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Names of the tables whose shape may differ between database releases.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableNames {
    pub citation_lookup: String,
    pub references: String,
    pub sequencing_annotations: String,
    pub nature_annotations: String,
    pub expanded_alphabet: String,
    pub parents: String,
    pub names: String,
}

impl Default for TableNames {
    fn default() -> Self {
        Self {
            citation_lookup: "citation_lookup".to_string(),
            references: "citations".to_string(),
            sequencing_annotations: "sequencing_citations".to_string(),
            nature_annotations: "nature_citations".to_string(),
            expanded_alphabet: "expanded_alphabet".to_string(),
            parents: "modbase_parents".to_string(),
            names: "names".to_string(),
        }
    }
}

impl TableNames {
    pub fn validate(&self, prefix: &str) -> Result<()> {
        for (field, value) in [
            ("citation_lookup", &self.citation_lookup),
            ("references", &self.references),
            ("sequencing_annotations", &self.sequencing_annotations),
            ("nature_annotations", &self.nature_annotations),
            ("expanded_alphabet", &self.expanded_alphabet),
            ("parents", &self.parents),
            ("names", &self.names),
        ] {
            validate_sql_identifier(&format!("{}.{}", prefix, field), value)?;
        }
        Ok(())
    }
}

/// Owned copy of what extraction needs, so it can move onto a blocking thread.
#[derive(Debug, Clone)]
pub struct DatabaseSettings {
    pub path: PathBuf,
    pub copy_path: PathBuf,
    pub tables: TableNames,
}

impl DatabaseSettings {
    pub fn from_provider<C: ConfigProvider + ?Sized>(config: &C) -> Self {
        let path = PathBuf::from(config.database_path());
        let copy_path = match config.database_copy_path() {
            Some(copy) => PathBuf::from(copy),
            None => default_copy_path(&path),
        };
        Self {
            path,
            copy_path,
            tables: config.tables().clone(),
        }
    }
}

fn default_copy_path(original: &std::path::Path) -> PathBuf {
    let file_name = original
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "database.db".to_string());
    original.with_file_name(format!("{}.copy", file_name))
}
