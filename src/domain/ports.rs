use crate::domain::model::{NewCard, StoredCard};
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
    fn exists(&self, path: &str) -> impl std::future::Future<Output = bool> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn data_dir(&self) -> &str;
    fn cards_file(&self) -> &str;
    fn max_image_bytes(&self) -> usize;
}

/// 卡片儲存閘道。唯一性與軟刪除由實作負責
#[async_trait]
pub trait CardRepository: Send + Sync {
    async fn add(&self, card: NewCard) -> Result<StoredCard>;
    async fn get_by_id(&self, id: i64) -> Result<Option<StoredCard>>;
    /// 已不存在或已刪除時回傳 `false`
    async fn delete(&self, id: i64) -> Result<bool>;
    async fn list(&self) -> Result<Vec<StoredCard>>;
    async fn exists(&self, id: i64) -> Result<bool>;
}
