use crate::core::csv_export::export_csv;
use crate::core::importer::{validate_image_size, CardImporter, DEFAULT_MAX_IMAGE_BYTES};
use crate::core::xml_export::export_xml;
use crate::domain::model::{
    CardSubmission, ExportFormat, ImportOutcome, NewCard, StoredCard, SubmissionResult,
};
use crate::domain::ports::CardRepository;
use crate::utils::error::{CardError, Result};
use std::sync::Arc;

/// 卡片操作的入口：查詢、建立、刪除、匯入、匯出
pub struct CardService<R: CardRepository> {
    repository: Arc<R>,
    importer: CardImporter<R>,
    max_image_bytes: usize,
}

impl<R: CardRepository> CardService<R> {
    pub fn new(repository: Arc<R>) -> Self {
        Self::with_max_image_bytes(repository, DEFAULT_MAX_IMAGE_BYTES)
    }

    pub fn with_max_image_bytes(repository: Arc<R>, max_image_bytes: usize) -> Self {
        Self {
            importer: CardImporter::with_max_image_bytes(repository.clone(), max_image_bytes),
            repository,
            max_image_bytes,
        }
    }

    pub async fn list_cards(&self) -> Result<Vec<StoredCard>> {
        self.repository.list().await
    }

    pub async fn get_card(&self, id: i64) -> Result<StoredCard> {
        self.repository
            .get_by_id(id)
            .await?
            .ok_or(CardError::NotFound { id })
    }

    pub async fn card_exists(&self, id: i64) -> Result<bool> {
        self.repository.exists(id).await
    }

    /// 手動建立；圖片過大或欄位不合法時直接回傳錯誤
    pub async fn create_card(&self, card: NewCard) -> Result<StoredCard> {
        if let Some(image) = &card.image {
            validate_image_size(image, self.max_image_bytes)?;
        }

        let created = self.repository.add(card).await?;
        tracing::info!("✅ Created card {} ({})", created.id, created.name);
        Ok(created)
    }

    pub async fn delete_card(&self, id: i64) -> Result<bool> {
        let deleted = self.repository.delete(id).await?;
        if deleted {
            tracing::info!("🗑️ Card {} marked as deleted", id);
        } else {
            tracing::debug!("Card {} not found or already deleted", id);
        }
        Ok(deleted)
    }

    pub async fn import_file(&self, file_name: &str, content: &[u8]) -> ImportOutcome {
        self.importer.import(file_name, content).await
    }

    pub async fn export_card(&self, id: i64, format: ExportFormat) -> Result<Vec<u8>> {
        let card = self.get_card(id).await?;
        render(&[card], format)
    }

    /// 依給定順序匯出；任何一個 id 不存在就失敗
    pub async fn export_cards(&self, ids: &[i64], format: ExportFormat) -> Result<Vec<u8>> {
        let mut cards = Vec::with_capacity(ids.len());
        for &id in ids {
            cards.push(self.get_card(id).await?);
        }

        tracing::info!("📤 Exporting {} cards as {:?}", cards.len(), format);
        render(&cards, format)
    }

    pub async fn export_all(&self, format: ExportFormat) -> Result<Vec<u8>> {
        let cards = self.list_cards().await?;
        tracing::info!("📤 Exporting all {} cards as {:?}", cards.len(), format);
        render(&cards, format)
    }

    pub async fn submit(&self, submission: CardSubmission) -> Result<SubmissionResult> {
        match submission {
            CardSubmission::Manual(card) => self.create_card(card).await.map(SubmissionResult::Created),
            CardSubmission::Import { file_name, content } => Ok(SubmissionResult::Imported(
                self.import_file(&file_name, &content).await,
            )),
        }
    }
}

fn render(cards: &[StoredCard], format: ExportFormat) -> Result<Vec<u8>> {
    match format {
        ExportFormat::Csv => export_csv(cards),
        ExportFormat::Xml => export_xml(cards),
    }
}
