use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::utils::error::CardError;
use crate::utils::validation::{self, Validate};

/// 一張卡片的聯絡資料：匯入檔解析的結果，也是建立卡片的輸入
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactRecord {
    pub name: String,
    pub gender: String,
    pub date_of_birth: NaiveDate,
    pub email: String,
    pub phone: String,
    pub image: Option<String>,
    pub address: String,
}

pub type NewCard = ContactRecord;

pub const MAX_NAME_LENGTH: usize = 100;
pub const MAX_GENDER_LENGTH: usize = 10;
pub const MAX_EMAIL_LENGTH: usize = 100;
pub const MAX_PHONE_LENGTH: usize = 20;
pub const MAX_ADDRESS_LENGTH: usize = 500;
pub const MAX_IMAGE_LENGTH: usize = 1024 * 1024;

impl Validate for NewCard {
    fn validate(&self) -> crate::utils::error::Result<()> {
        let required = [
            ("name", self.name.as_str(), MAX_NAME_LENGTH),
            ("gender", self.gender.as_str(), MAX_GENDER_LENGTH),
            ("email", self.email.as_str(), MAX_EMAIL_LENGTH),
            ("phone", self.phone.as_str(), MAX_PHONE_LENGTH),
            ("address", self.address.as_str(), MAX_ADDRESS_LENGTH),
        ];
        for (field, value, max_length) in required {
            validation::validate_non_empty_string(field, value)?;
            validation::validate_max_length(field, value, max_length)?;
        }

        validation::validate_email("email", &self.email)?;
        validation::validate_phone("phone", &self.phone)?;

        if let Some(image) = &self.image {
            validation::validate_max_length("image", image, MAX_IMAGE_LENGTH)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredCard {
    pub id: i64,
    pub name: String,
    pub gender: String,
    pub date_of_birth: NaiveDate,
    pub email: String,
    pub phone: String,
    pub image: Option<String>,
    pub address: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub is_deleted: bool,
}

impl StoredCard {
    pub fn from_new(id: i64, card: NewCard, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            name: card.name,
            gender: card.gender,
            date_of_birth: card.date_of_birth,
            email: card.email,
            phone: card.phone,
            image: card.image,
            address: card.address,
            created_at,
            is_deleted: false,
        }
    }

    /// 去掉 id 與時間戳記，還原成匯入時的資料形狀
    pub fn to_contact_record(&self) -> ContactRecord {
        ContactRecord {
            name: self.name.clone(),
            gender: self.gender.clone(),
            date_of_birth: self.date_of_birth,
            email: self.email.clone(),
            phone: self.phone.clone(),
            image: self.image.clone(),
            address: self.address.clone(),
        }
    }
}

/// 一次匯入的結果
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportOutcome {
    pub created_cards: Vec<StoredCard>,
    pub total_count: usize,
    pub errors: Vec<String>,
}

impl ImportOutcome {
    pub fn failed(errors: Vec<String>) -> Self {
        Self {
            created_cards: Vec::new(),
            total_count: 0,
            errors,
        }
    }
}

/// 單一列或單一元素的錯誤，`position` 從 1 開始
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowError {
    pub label: &'static str,
    pub position: usize,
    pub message: String,
}

impl std::fmt::Display for RowError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}: {}", self.label, self.position, self.message)
    }
}

/// 解析器的輸出：結構性錯誤會中止整個匯入，列錯誤則不會
#[derive(Debug, Clone, Default)]
pub struct ParseReport {
    pub records: Vec<ContactRecord>,
    pub structural_errors: Vec<String>,
    pub row_errors: Vec<RowError>,
}

impl ParseReport {
    pub fn structural(message: impl Into<String>) -> Self {
        Self {
            structural_errors: vec![message.into()],
            ..Self::default()
        }
    }

    pub fn has_structural_errors(&self) -> bool {
        !self.structural_errors.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportFormat {
    Csv,
    Xml,
}

impl ImportFormat {
    /// 依副檔名判斷格式 (不分大小寫)
    pub fn from_file_name(file_name: &str) -> Result<Self, CardError> {
        validation::validate_file_extension(file_name, &["csv", "xml"])?;

        let is_csv = std::path::Path::new(file_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
        Ok(if is_csv { Self::Csv } else { Self::Xml })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Csv,
    Xml,
}

impl std::str::FromStr for ExportFormat {
    type Err = CardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "xml" => Ok(Self::Xml),
            other => Err(CardError::UnsupportedFormat {
                extension: other.to_string(),
            }),
        }
    }
}

/// 建立卡片的兩種模式，在服務入口一次解析
#[derive(Debug, Clone)]
pub enum CardSubmission {
    Manual(NewCard),
    Import { file_name: String, content: Vec<u8> },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum SubmissionResult {
    Created(StoredCard),
    Imported(ImportOutcome),
}
