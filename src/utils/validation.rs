use crate::utils::error::{CardError, Result};
use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(CardError::MissingConfigError {
            field: field_name.to_string(),
        });
    }

    if path.contains('\0') {
        return Err(CardError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path contains null bytes".to_string(),
        });
    }

    Ok(())
}

pub fn validate_positive_number(field_name: &str, value: usize, min_value: usize) -> Result<()> {
    if value < min_value {
        return Err(CardError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be at least {}", min_value),
        });
    }
    Ok(())
}

pub fn validate_one_of(field_name: &str, value: &str, allowed: &[&str]) -> Result<()> {
    if !allowed.contains(&value) {
        return Err(CardError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Supported values: {}", allowed.join(", ")),
        });
    }
    Ok(())
}

/// 副檔名比對不分大小寫，`allowed` 需為小寫且不含點
pub fn validate_file_extension(file_name: &str, allowed: &[&str]) -> Result<()> {
    let extension = Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("");

    if !allowed.contains(&extension.to_ascii_lowercase().as_str()) {
        return Err(CardError::UnsupportedFormat {
            extension: if extension.is_empty() {
                "(none)".to_string()
            } else {
                format!(".{}", extension)
            },
        });
    }
    Ok(())
}

// 以下為卡片欄位驗證

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(CardError::validation(
            field_name,
            "Value cannot be empty or whitespace-only",
        ));
    }
    Ok(())
}

/// 長度以字元數計算，不是位元組
pub fn validate_max_length(field_name: &str, value: &str, max_length: usize) -> Result<()> {
    let length = value.chars().count();
    if length > max_length {
        return Err(CardError::validation(
            field_name,
            format!("Length {} exceeds the maximum of {}", length, max_length),
        ));
    }
    Ok(())
}

pub fn validate_email(field_name: &str, value: &str) -> Result<()> {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    let re = EMAIL.get_or_init(|| {
        Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email pattern is valid")
    });

    if !re.is_match(value) {
        return Err(CardError::validation(
            field_name,
            format!("'{}' is not a valid email address", value),
        ));
    }
    Ok(())
}

pub fn validate_phone(field_name: &str, value: &str) -> Result<()> {
    static PHONE: OnceLock<Regex> = OnceLock::new();
    let re = PHONE.get_or_init(|| Regex::new(r"^[0-9+\-(). ]+$").expect("phone pattern is valid"));

    if !re.is_match(value) {
        return Err(CardError::validation(
            field_name,
            format!("'{}' is not a valid phone number", value),
        ));
    }
    Ok(())
}
