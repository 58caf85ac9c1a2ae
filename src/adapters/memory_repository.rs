use crate::domain::model::{NewCard, StoredCard};
use crate::domain::ports::{CardRepository, Storage};
use crate::utils::error::{CardError, Result};
use crate::utils::validation::Validate;
use async_trait::async_trait;
use chrono::Utc;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

#[derive(Debug, Default)]
struct CardTable {
    cards: BTreeMap<i64, StoredCard>,
    next_id: i64,
}

impl CardTable {
    fn active(&self) -> impl Iterator<Item = &StoredCard> {
        self.cards.values().filter(|card| !card.is_deleted)
    }

    fn check_unique(&self, card: &NewCard) -> Result<()> {
        if self.active().any(|existing| existing.email == card.email) {
            return Err(CardError::DuplicateError {
                field: "email".to_string(),
                value: card.email.clone(),
            });
        }
        if self.active().any(|existing| existing.phone == card.phone) {
            return Err(CardError::DuplicateError {
                field: "phone".to_string(),
                value: card.phone.clone(),
            });
        }
        Ok(())
    }
}

/// 記憶體內的卡片儲存，寫入由鎖序列化
///
/// 軟刪除的卡片仍保留在表中 (快照也會包含)，但不會出現在查詢結果。
#[derive(Debug, Default)]
pub struct InMemoryCardRepository {
    table: RwLock<CardTable>,
}

impl InMemoryCardRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// 從快照還原，新 id 接在最大 id 之後
    pub fn from_snapshot(cards: Vec<StoredCard>) -> Self {
        let next_id = cards.iter().map(|card| card.id).max().unwrap_or(0);
        let cards = cards.into_iter().map(|card| (card.id, card)).collect();
        Self {
            table: RwLock::new(CardTable { cards, next_id }),
        }
    }

    /// 所有資料列，包含已軟刪除的
    pub async fn snapshot(&self) -> Vec<StoredCard> {
        self.table.read().await.cards.values().cloned().collect()
    }

    pub async fn load<S: Storage>(storage: &S, path: &str) -> Result<Self> {
        if !storage.exists(path).await {
            tracing::debug!("No snapshot at {}, starting with an empty store", path);
            return Ok(Self::new());
        }

        let data = storage.read_file(path).await?;
        let cards: Vec<StoredCard> = serde_json::from_slice(&data)?;
        tracing::debug!("Loaded {} cards from {}", cards.len(), path);
        Ok(Self::from_snapshot(cards))
    }

    pub async fn save<S: Storage>(&self, storage: &S, path: &str) -> Result<()> {
        let cards = self.snapshot().await;
        let data = serde_json::to_vec_pretty(&cards)?;
        storage.write_file(path, &data).await?;
        tracing::debug!("Saved {} cards to {}", cards.len(), path);
        Ok(())
    }
}

#[async_trait]
impl CardRepository for InMemoryCardRepository {
    async fn add(&self, card: NewCard) -> Result<StoredCard> {
        card.validate()?;

        let mut table = self.table.write().await;
        table.check_unique(&card)?;

        table.next_id += 1;
        let id = table.next_id;
        let stored = StoredCard::from_new(id, card, Utc::now());
        table.cards.insert(id, stored.clone());

        Ok(stored)
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<StoredCard>> {
        let table = self.table.read().await;
        Ok(table.cards.get(&id).filter(|card| !card.is_deleted).cloned())
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let mut table = self.table.write().await;
        match table.cards.get_mut(&id) {
            Some(card) if !card.is_deleted => {
                card.is_deleted = true;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn list(&self) -> Result<Vec<StoredCard>> {
        let table = self.table.read().await;
        let cards = table.active().cloned().collect();
        Ok(cards)
    }

    async fn exists(&self, id: i64) -> Result<bool> {
        let table = self.table.read().await;
        let found = table.active().any(|card| card.id == id);
        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::collections::HashMap;
    use std::sync::Arc;
    use tokio::sync::Mutex;

    #[derive(Clone)]
    struct MockStorage {
        files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    }

    impl MockStorage {
        fn new() -> Self {
            Self {
                files: Arc::new(Mutex::new(HashMap::new())),
            }
        }
    }

    impl Storage for MockStorage {
        async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
            let files = self.files.lock().await;
            files.get(path).cloned().ok_or_else(|| {
                CardError::IoError(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("File not found: {}", path),
                ))
            })
        }

        async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
            let mut files = self.files.lock().await;
            files.insert(path.to_string(), data.to_vec());
            Ok(())
        }

        async fn exists(&self, path: &str) -> bool {
            self.files.lock().await.contains_key(path)
        }
    }

    fn new_card(email: &str, phone: &str) -> NewCard {
        NewCard {
            name: "Jane Doe".to_string(),
            gender: "Female".to_string(),
            date_of_birth: NaiveDate::from_ymd_opt(1990, 4, 12).unwrap(),
            email: email.to_string(),
            phone: phone.to_string(),
            image: None,
            address: "1 Main St".to_string(),
        }
    }

    #[tokio::test]
    async fn test_add_assigns_sequential_ids() {
        let repo = InMemoryCardRepository::new();

        let first = repo.add(new_card("a@x.io", "111")).await.unwrap();
        let second = repo.add(new_card("b@x.io", "222")).await.unwrap();

        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);
        assert!(!first.is_deleted);
    }

    #[tokio::test]
    async fn test_add_rejects_duplicates_among_active_rows() {
        let repo = InMemoryCardRepository::new();
        repo.add(new_card("a@x.io", "111")).await.unwrap();

        let dup_email = repo.add(new_card("a@x.io", "222")).await.unwrap_err();
        assert!(matches!(dup_email, CardError::DuplicateError { ref field, .. } if field == "email"));

        let dup_phone = repo.add(new_card("b@x.io", "111")).await.unwrap_err();
        assert!(matches!(dup_phone, CardError::DuplicateError { ref field, .. } if field == "phone"));
    }

    #[tokio::test]
    async fn test_deleted_rows_release_uniqueness() {
        let repo = InMemoryCardRepository::new();
        let card = repo.add(new_card("a@x.io", "111")).await.unwrap();
        assert!(repo.delete(card.id).await.unwrap());

        let again = repo.add(new_card("a@x.io", "111")).await.unwrap();
        assert_eq!(again.id, 2);
    }

    #[tokio::test]
    async fn test_add_validates_fields() {
        let repo = InMemoryCardRepository::new();
        let mut card = new_card("a@x.io", "111");
        card.address = String::new();

        assert!(matches!(
            repo.add(card).await,
            Err(CardError::ValidationError { .. })
        ));
        assert!(repo.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_soft_delete() {
        let repo = InMemoryCardRepository::new();
        let card = repo.add(new_card("a@x.io", "111")).await.unwrap();

        assert!(repo.delete(card.id).await.unwrap());
        assert!(!repo.delete(card.id).await.unwrap());
        assert!(!repo.delete(999).await.unwrap());

        assert!(repo.get_by_id(card.id).await.unwrap().is_none());
        assert!(!repo.exists(card.id).await.unwrap());
        assert!(repo.list().await.unwrap().is_empty());

        let snapshot = repo.snapshot().await;
        assert_eq!(snapshot.len(), 1);
        assert!(snapshot[0].is_deleted);
    }

    #[tokio::test]
    async fn test_save_and_load_snapshot() {
        let storage = MockStorage::new();
        let repo = InMemoryCardRepository::new();
        repo.add(new_card("a@x.io", "111")).await.unwrap();
        let deleted = repo.add(new_card("b@x.io", "222")).await.unwrap();
        repo.delete(deleted.id).await.unwrap();

        repo.save(&storage, "cards.json").await.unwrap();
        let restored = InMemoryCardRepository::load(&storage, "cards.json").await.unwrap();

        assert_eq!(restored.list().await.unwrap().len(), 1);
        let next = restored.add(new_card("c@x.io", "333")).await.unwrap();
        assert_eq!(next.id, 3);
    }

    #[tokio::test]
    async fn test_load_missing_snapshot_is_empty() {
        let storage = MockStorage::new();

        let repo = InMemoryCardRepository::load(&storage, "missing.json").await.unwrap();

        assert!(repo.list().await.unwrap().is_empty());
    }
}
