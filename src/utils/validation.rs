use crate::utils::error::{Result, SiteError};
use std::path::Path;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(SiteError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path cannot be empty".to_string(),
        });
    }

    if path.contains('\0') {
        return Err(SiteError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path contains null bytes".to_string(),
        });
    }

    Ok(())
}

/// 資料庫檔案必須存在，之後才會被複製
pub fn validate_existing_file(field_name: &str, path: &str) -> Result<()> {
    validate_path(field_name, path)?;
    if !Path::new(path).is_file() {
        return Err(SiteError::DatabaseNotFound {
            path: path.to_string(),
        });
    }
    Ok(())
}

/// 工作副本不可與原始資料庫為同一檔案，否則複製會清空原檔
pub fn validate_distinct_copy(field_name: &str, original: &str, copy: &str) -> Result<()> {
    if resolves_to_same_file(Path::new(original), Path::new(copy)) {
        return Err(SiteError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: copy.to_string(),
            reason: format!("Working copy must not be the original database {}", original),
        });
    }
    Ok(())
}

fn resolves_to_same_file(original: &Path, copy: &Path) -> bool {
    let Ok(original) = std::fs::canonicalize(original) else {
        return false;
    };
    let copy = match std::fs::canonicalize(copy) {
        Ok(path) => path,
        // 副本尚不存在：以父目錄的實際路徑加上檔名比較
        Err(_) => {
            let parent = match copy.parent() {
                Some(parent) if !parent.as_os_str().is_empty() => parent,
                _ => Path::new("."),
            };
            match (std::fs::canonicalize(parent), copy.file_name()) {
                (Ok(dir), Some(name)) => dir.join(name),
                _ => return false,
            }
        }
    };
    original == copy
}

/// 輸出目錄下的相對子路徑，不可跳出輸出目錄
pub fn validate_relative_subdir(field_name: &str, path: &str) -> Result<()> {
    validate_path(field_name, path)?;
    let candidate = Path::new(path);
    let escapes = candidate.is_absolute()
        || candidate
            .components()
            .any(|c| matches!(c, std::path::Component::ParentDir));
    if escapes {
        return Err(SiteError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Must be a relative path inside the output directory".to_string(),
        });
    }
    Ok(())
}

pub fn validate_positive_number(field_name: &str, value: usize, min_value: usize) -> Result<()> {
    if value < min_value {
        return Err(SiteError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be at least {}", min_value),
        });
    }
    Ok(())
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(SiteError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value cannot be empty or whitespace-only".to_string(),
        });
    }
    Ok(())
}

/// Table names are spliced into SQL text, so only plain identifiers pass.
pub fn validate_sql_identifier(field_name: &str, value: &str) -> Result<()> {
    let mut chars = value.chars();
    let valid = match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    };

    if !valid {
        return Err(SiteError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Table names may only contain ASCII letters, digits and underscores"
                .to_string(),
        });
    }
    Ok(())
}
