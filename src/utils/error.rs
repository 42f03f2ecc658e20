use thiserror::Error;

#[derive(Error, Debug)]
pub enum SiteError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] rusqlite::Error),

    #[error("Template rendering failed: {0}")]
    TemplateError(#[from] askama::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration validation failed for '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Database file not found: {path}")]
    DatabaseNotFound { path: String },

    #[error("Structure rendering failed for '{smiles}': {message}")]
    RenderError { smiles: String, message: String },

    #[error("Data processing error: {message}")]
    ProcessingError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Database,
    Rendering,
    FileSystem,
    Processing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl SiteError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            SiteError::ConfigValidationError { .. } | SiteError::InvalidConfigValueError { .. } => {
                ErrorCategory::Configuration
            }
            SiteError::DatabaseError(_) | SiteError::DatabaseNotFound { .. } => {
                ErrorCategory::Database
            }
            SiteError::TemplateError(_) | SiteError::RenderError { .. } => {
                ErrorCategory::Rendering
            }
            SiteError::IoError(_) => ErrorCategory::FileSystem,
            SiteError::SerializationError(_) | SiteError::ProcessingError { .. } => {
                ErrorCategory::Processing
            }
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            // 結構圖繪製失敗只影響單一頁面
            SiteError::RenderError { .. } => ErrorSeverity::Low,
            SiteError::ProcessingError { .. } | SiteError::SerializationError(_) => {
                ErrorSeverity::Medium
            }
            SiteError::ConfigValidationError { .. }
            | SiteError::InvalidConfigValueError { .. }
            | SiteError::TemplateError(_) => ErrorSeverity::High,
            SiteError::DatabaseError(_)
            | SiteError::DatabaseNotFound { .. }
            | SiteError::IoError(_) => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Configuration => {
                "Check the command-line flags or the TOML configuration file"
            }
            ErrorCategory::Database => {
                "Make sure the database path is correct and the file is a DNAmod SQLite database"
            }
            ErrorCategory::Rendering => {
                "Check that Open Babel (obabel) is installed, or run with --no-images"
            }
            ErrorCategory::FileSystem => {
                "Check permissions and free space for the output and database copy paths"
            }
            ErrorCategory::Processing => "Inspect the offending records in the database",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            SiteError::DatabaseNotFound { path } => {
                format!("Could not find the modification database at {}", path)
            }
            SiteError::DatabaseError(e) => format!("Reading the modification database failed: {}", e),
            SiteError::TemplateError(e) => format!("A page template could not be rendered: {}", e),
            other => other.to_string(),
        }
    }

    /// CLI 結束碼
    pub fn exit_code(&self) -> i32 {
        match self.severity() {
            ErrorSeverity::Low => 0,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        }
    }
}

pub type Result<T> = std::result::Result<T, SiteError>;
