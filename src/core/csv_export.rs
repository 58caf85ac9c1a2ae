use crate::domain::model::StoredCard;
use crate::utils::error::{CardError, Result};

pub const EXPORT_HEADERS: [&str; 9] = [
    "Id",
    "Name",
    "Gender",
    "DateOfBirth",
    "Email",
    "Phone",
    "Address",
    "Image",
    "CreatedAt",
];

pub const DATE_OF_BIRTH_FORMAT: &str = "%Y-%m-%d";
pub const CREATED_AT_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// 將卡片輸出成 CSV (UTF-8)
///
/// 含有 `,`、`"`、換行的欄位會加上雙引號，內部的 `"` 會重複一次。
pub fn export_csv(cards: &[StoredCard]) -> Result<Vec<u8>> {
    let mut writer = csv::WriterBuilder::new()
        .quote_style(csv::QuoteStyle::Necessary)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    writer.write_record(EXPORT_HEADERS)?;

    for card in cards {
        let id = card.id.to_string();
        let date_of_birth = card.date_of_birth.format(DATE_OF_BIRTH_FORMAT).to_string();
        let created_at = card.created_at.format(CREATED_AT_FORMAT).to_string();

        writer.write_record([
            id.as_str(),
            card.name.as_str(),
            card.gender.as_str(),
            date_of_birth.as_str(),
            card.email.as_str(),
            card.phone.as_str(),
            card.address.as_str(),
            card.image.as_deref().unwrap_or(""),
            created_at.as_str(),
        ])?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| CardError::IoError(e.into_error()))?;

    tracing::debug!("Exported {} cards to CSV ({} bytes)", cards.len(), bytes.len());
    Ok(bytes)
}
