use crate::core::csv_import::parse_csv;
use crate::core::xml_import::parse_xml;
use crate::domain::model::{ContactRecord, ImportFormat, ImportOutcome, ParseReport, StoredCard};
use crate::domain::ports::CardRepository;
use crate::utils::error::{CardError, Result};
use std::sync::Arc;

pub const DEFAULT_MAX_IMAGE_BYTES: usize = 1024 * 1024;

/// 估算 base64 圖片解碼後的位元組數；`<meta>,<data>` 形式只計算逗號之後
pub fn image_size_in_bytes(image: &str) -> usize {
    let payload = image.split_once(',').map(|(_, data)| data).unwrap_or(image);
    payload.len() * 3 / 4
}

pub fn validate_image_size(image: &str, max_bytes: usize) -> Result<()> {
    let size = image_size_in_bytes(image);
    if size > max_bytes {
        return Err(CardError::ImageTooLarge {
            size,
            max: max_bytes,
        });
    }
    Ok(())
}

/// 依檔名副檔名選擇解析器
pub fn parse_content(file_name: &str, content: &[u8]) -> ParseReport {
    let format = match ImportFormat::from_file_name(file_name) {
        Ok(format) => format,
        Err(e) => return ParseReport::structural(e.to_string()),
    };

    let text = match std::str::from_utf8(content) {
        Ok(text) => text.strip_prefix('\u{feff}').unwrap_or(text),
        Err(e) => {
            return ParseReport::structural(format!("File is not valid UTF-8 text: {}", e));
        }
    };

    tracing::debug!("Parsing {} bytes as {:?}", content.len(), format);
    match format {
        ImportFormat::Csv => parse_csv(text),
        ImportFormat::Xml => parse_xml(text),
    }
}

/// 匯入流程：解析 → 逐筆驗證 → 逐筆寫入
///
/// 每筆紀錄獨立處理，一筆失敗不影響其他筆。
pub struct CardImporter<R: CardRepository> {
    repository: Arc<R>,
    max_image_bytes: usize,
}

impl<R: CardRepository> CardImporter<R> {
    pub fn new(repository: Arc<R>) -> Self {
        Self::with_max_image_bytes(repository, DEFAULT_MAX_IMAGE_BYTES)
    }

    pub fn with_max_image_bytes(repository: Arc<R>, max_image_bytes: usize) -> Self {
        Self {
            repository,
            max_image_bytes,
        }
    }

    pub async fn import(&self, file_name: &str, content: &[u8]) -> ImportOutcome {
        tracing::info!("📥 Importing cards from: {}", file_name);

        let report = parse_content(file_name, content);
        if report.has_structural_errors() {
            tracing::warn!(
                "❌ Import of {} aborted: {}",
                file_name,
                report.structural_errors.join("; ")
            );
            return ImportOutcome::failed(report.structural_errors);
        }

        tracing::info!(
            "Parsed {} records ({} rows rejected)",
            report.records.len(),
            report.row_errors.len()
        );

        let mut errors: Vec<String> = report.row_errors.iter().map(ToString::to_string).collect();
        let mut created_cards = Vec::with_capacity(report.records.len());

        for record in report.records {
            let name = record.name.clone();
            match self.persist(record).await {
                Ok(card) => {
                    tracing::debug!("Created card {} for '{}'", card.id, card.name);
                    created_cards.push(card);
                }
                Err(e) => {
                    tracing::warn!("⚠️ Failed to import card '{}': {}", name, e);
                    errors.push(format!("Failed to import card '{}': {}", name, e));
                }
            }
        }

        tracing::info!(
            "✅ Import finished: {} created, {} errors",
            created_cards.len(),
            errors.len()
        );

        ImportOutcome {
            total_count: created_cards.len(),
            created_cards,
            errors,
        }
    }

    async fn persist(&self, record: ContactRecord) -> Result<StoredCard> {
        if let Some(image) = &record.image {
            validate_image_size(image, self.max_image_bytes)?;
        }
        self.repository.add(record).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory_repository::InMemoryCardRepository;

    const HEADER: &str = "Name,Gender,DateOfBirth,Email,Phone,Address,Image";

    fn importer() -> (Arc<InMemoryCardRepository>, CardImporter<InMemoryCardRepository>) {
        let repository = Arc::new(InMemoryCardRepository::new());
        let importer = CardImporter::new(repository.clone());
        (repository, importer)
    }

    #[test]
    fn test_image_size_ignores_data_url_prefix() {
        assert_eq!(image_size_in_bytes("AAAA"), 3);
        assert_eq!(image_size_in_bytes("data:image/png;base64,AAAAAAAA"), 6);
        assert!(validate_image_size(&"A".repeat(1_398_101), DEFAULT_MAX_IMAGE_BYTES).is_ok());
        assert!(validate_image_size(&"A".repeat(1_398_104), DEFAULT_MAX_IMAGE_BYTES).is_err());
    }

    #[test]
    fn test_unsupported_extension_is_structural() {
        let report = parse_content("cards.json", b"[]");

        assert_eq!(report.structural_errors.len(), 1);
        assert!(report.structural_errors[0].contains(".json"));
    }

    #[test]
    fn test_invalid_utf8_is_structural() {
        let report = parse_content("cards.csv", &[0xff, 0xfe, 0x00]);

        assert_eq!(report.structural_errors.len(), 1);
    }

    #[test]
    fn test_bom_is_stripped() {
        let content = format!(
            "\u{feff}{}\nJane,F,2000-01-01,j@x.io,123,Addr,\n",
            HEADER
        );

        let report = parse_content("cards.csv", content.as_bytes());

        assert!(report.structural_errors.is_empty());
        assert_eq!(report.records.len(), 1);
    }

    #[tokio::test]
    async fn test_import_valid_and_invalid_rows() {
        let (repository, importer) = importer();
        let content = format!(
            "{}\nJane,F,2000-01-01,jane@x.io,111,Addr,\nJohn,M,not-a-date,john@x.io,222,Addr,\n",
            HEADER
        );

        let outcome = importer.import("cards.csv", content.as_bytes()).await;

        assert_eq!(outcome.total_count, 1);
        assert_eq!(outcome.created_cards.len(), 1);
        assert_eq!(outcome.created_cards[0].name, "Jane");
        assert_eq!(outcome.errors.len(), 1);
        assert!(outcome.errors[0].starts_with("Row 3:"));
        assert_eq!(repository.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_structural_error_aborts_import() {
        let (repository, importer) = importer();
        let content = "Name,Email\nJane,jane@x.io\n";

        let outcome = importer.import("cards.csv", content.as_bytes()).await;

        assert_eq!(outcome.total_count, 0);
        assert!(outcome.created_cards.is_empty());
        assert_eq!(outcome.errors.len(), 4);
        assert!(repository.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_oversized_image_fails_only_that_record() {
        let (_, importer) = importer();
        let big_image = format!("data:image/png;base64,{}", "A".repeat(1_500_000));
        let content = format!(
            "{}\nBig,F,2000-01-01,big@x.io,111,Addr,\"{}\"\nSmall,M,2000-01-02,small@x.io,222,Addr,\n",
            HEADER, big_image
        );

        let outcome = importer.import("cards.csv", content.as_bytes()).await;

        assert_eq!(outcome.total_count, 1);
        assert_eq!(outcome.created_cards[0].name, "Small");
        assert_eq!(outcome.errors.len(), 1);
        assert!(outcome.errors[0].contains("'Big'"));
        assert!(outcome.errors[0].contains("exceeds"));
    }

    #[tokio::test]
    async fn test_duplicate_email_fails_second_record() {
        let (_, importer) = importer();
        let content = format!(
            "{}\nFirst,F,2000-01-01,same@x.io,111,Addr,\nSecond,M,2000-01-02,same@x.io,222,Addr,\n",
            HEADER
        );

        let outcome = importer.import("cards.csv", content.as_bytes()).await;

        assert_eq!(outcome.total_count, 1);
        assert_eq!(outcome.created_cards[0].name, "First");
        assert_eq!(outcome.errors.len(), 1);
        assert!(outcome.errors[0].contains("'Second'"));
        assert!(outcome.errors[0].contains("same@x.io"));
    }

    #[tokio::test]
    async fn test_custom_image_limit() {
        let repository = Arc::new(InMemoryCardRepository::new());
        let importer = CardImporter::with_max_image_bytes(repository, 3);
        let content = format!(
            "{}\nJane,F,2000-01-01,jane@x.io,111,Addr,AAAAAAAA\n",
            HEADER
        );

        let outcome = importer.import("cards.csv", content.as_bytes()).await;

        assert_eq!(outcome.total_count, 0);
        assert_eq!(outcome.errors.len(), 1);
        assert!(outcome.errors[0].starts_with("Failed to import card 'Jane':"));
        assert!(outcome.errors[0].contains("6 bytes"));
        assert!(outcome.errors[0].contains("exceeds"));
    }
}
