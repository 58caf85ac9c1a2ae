use thiserror::Error;

#[derive(Error, Debug)]
pub enum CardError {
    #[error("Failed to parse '{value}': {message}")]
    ParseError { value: String, message: String },

    #[error("{message}")]
    StructuralError { message: String },

    #[error("Validation failed for {field}: {message}")]
    ValidationError { field: String, message: String },

    #[error("Image size ({size} bytes) exceeds the maximum limit of {max} bytes")]
    ImageTooLarge { size: usize, max: usize },

    #[error("A card with {field} '{value}' already exists")]
    DuplicateError { field: String, value: String },

    #[error("Card with ID {id} not found")]
    NotFound { id: i64 },

    #[error("Unsupported file format: '{extension}'. Supported formats: .csv, .xml")]
    UnsupportedFormat { extension: String },

    #[error("XML error: {message}")]
    XmlError { message: String },

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Parse,
    Structural,
    Validation,
    NotFound,
    Io,
    Config,
    Internal,
}

impl CardError {
    pub fn parse(value: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ParseError {
            value: value.into(),
            message: message.into(),
        }
    }

    pub fn structural(message: impl Into<String>) -> Self {
        Self::StructuralError {
            message: message.into(),
        }
    }

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ValidationError {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::ParseError { .. } => ErrorCategory::Parse,
            Self::StructuralError { .. }
            | Self::UnsupportedFormat { .. }
            | Self::XmlError { .. }
            | Self::CsvError(_) => ErrorCategory::Structural,
            Self::ValidationError { .. }
            | Self::ImageTooLarge { .. }
            | Self::DuplicateError { .. } => ErrorCategory::Validation,
            Self::NotFound { .. } => ErrorCategory::NotFound,
            Self::IoError(_) => ErrorCategory::Io,
            Self::ConfigError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::MissingConfigError { .. } => ErrorCategory::Config,
            Self::SerializationError(_) => ErrorCategory::Internal,
        }
    }

    /// CLI 結束代碼
    pub fn exit_code(&self) -> i32 {
        match self.category() {
            ErrorCategory::NotFound => 3,
            ErrorCategory::Parse | ErrorCategory::Structural | ErrorCategory::Validation => 4,
            ErrorCategory::Config => 7,
            ErrorCategory::Io => 8,
            ErrorCategory::Internal => 1,
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            Self::NotFound { id } => format!("Card with ID {} not found.", id),
            Self::IoError(e) => format!("File operation failed: {}", e),
            other => other.to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Parse => "Check the value format (dates: yyyy-MM-dd or M/d/yyyy)",
            ErrorCategory::Structural => {
                "Make sure the file is a .csv with the required headers or an .xml with <Card> elements"
            }
            ErrorCategory::Validation => "Fix the card fields and try again",
            ErrorCategory::NotFound => "Run `card-etl list` to see available card IDs",
            ErrorCategory::Io => "Check that the path exists and is readable/writable",
            ErrorCategory::Config => "Check the TOML configuration file and command line flags",
            ErrorCategory::Internal => "Re-run with --verbose and report the log output",
        }
    }
}

pub type Result<T> = std::result::Result<T, CardError>;
