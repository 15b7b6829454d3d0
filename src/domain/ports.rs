use crate::domain::model::{ForecastVariant, ImageAsset, ImageCategory, StoreHealth};
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
    /// 給使用者看的完整輸出位置
    fn location(&self, path: &str) -> String;
}

/// 依 (語言, 數字) 查詢預測文字，結果依 variant 排序
#[async_trait]
pub trait ContentStore: Send + Sync {
    async fn fetch_variants(&self, language: &str, number: u32) -> Result<Vec<ForecastVariant>>;
    async fn ping(&self) -> Result<StoreHealth>;
}

#[async_trait]
pub trait ImageStore: Send + Sync {
    async fn fetch_images(&self, category: ImageCategory, number: u32) -> Result<Vec<ImageAsset>>;
    async fn download(&self, url: &str) -> Result<Vec<u8>>;
    /// 上傳檔案並回傳公開 URL
    async fn upload(&self, storage_path: &str, data: Vec<u8>, content_type: &str)
        -> Result<String>;
    async fn record(&self, asset: &ImageAsset) -> Result<()>;
}
