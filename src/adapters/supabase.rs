use crate::config::toml_config::StoreConfig;
use crate::domain::model::{ForecastVariant, ImageAsset, ImageCategory, StoreHealth};
use crate::domain::ports::{ContentStore, ImageStore};
use crate::utils::error::{ForecastError, Result};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::Deserialize;
use std::time::Duration;

const DAILY_TEXTS_TABLE: &str = "daily_texts";

/// Supabase (PostgREST + Storage) 客戶端。啟動時建立一次並共用。
#[derive(Debug, Clone)]
pub struct SupabaseClient {
    client: Client,
    base_url: String,
    service_key: String,
    bucket: String,
}

/// 圖片表的列：gada 表沒有 variant 欄位
#[derive(Debug, Deserialize)]
struct ImageRow {
    #[serde(alias = "gada_cipars", alias = "menesa_cipars")]
    number: u32,
    #[serde(default)]
    variant: Option<serde_json::Value>,
    image_url: String,
}

impl SupabaseClient {
    pub fn new(config: &StoreConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            service_key: config.service_key.clone(),
            bucket: config.bucket.clone(),
        })
    }

    fn rest_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    fn object_url(&self, storage_path: &str) -> String {
        format!(
            "{}/storage/v1/object/{}/{}",
            self.base_url, self.bucket, storage_path
        )
    }

    pub fn public_url(&self, storage_path: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{}/{}",
            self.base_url, self.bucket, storage_path
        )
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .header("apikey", &self.service_key)
            .bearer_auth(&self.service_key)
    }

    async fn check(response: Response) -> Result<Response> {
        let status = response.status();
        tracing::debug!("Store response status: {}", status);

        if status.is_success() {
            return Ok(response);
        }

        let message = response.text().await.unwrap_or_default();
        Err(ForecastError::StoreError {
            status: status.as_u16(),
            message,
        })
    }
}

/// "0-0/57" -> 57，"*/0" -> 0
fn parse_content_range_total(value: &str) -> Option<u64> {
    value.rsplit_once('/')?.1.parse().ok()
}

fn variant_to_string(value: serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) => Some(s),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[async_trait]
impl ContentStore for SupabaseClient {
    async fn fetch_variants(&self, language: &str, number: u32) -> Result<Vec<ForecastVariant>> {
        let request = self
            .client
            .get(self.rest_url(DAILY_TEXTS_TABLE))
            .query(&[
                ("select", "*".to_string()),
                ("lang", format!("eq.{}", language)),
                ("number", format!("eq.{}", number)),
                ("order", "variant.asc".to_string()),
            ]);

        tracing::debug!("Fetching forecast texts: lang={}, number={}", language, number);
        let response = Self::check(self.authorized(request).send().await?).await?;
        let variants: Vec<ForecastVariant> = response.json().await?;
        tracing::debug!("Fetched {} variants", variants.len());

        Ok(variants)
    }

    async fn ping(&self) -> Result<StoreHealth> {
        let request = self
            .client
            .get(self.rest_url(DAILY_TEXTS_TABLE))
            .query(&[("select", "number"), ("limit", "1")])
            .header("Prefer", "count=exact");

        let response = Self::check(self.authorized(request).send().await?).await?;
        let count = response
            .headers()
            .get("content-range")
            .and_then(|v| v.to_str().ok())
            .and_then(parse_content_range_total);

        Ok(StoreHealth { count })
    }
}

#[async_trait]
impl ImageStore for SupabaseClient {
    async fn fetch_images(&self, category: ImageCategory, number: u32) -> Result<Vec<ImageAsset>> {
        let mut query = vec![
            ("select", "*".to_string()),
            (category.number_column(), format!("eq.{}", number)),
        ];
        if category == ImageCategory::Menesa {
            query.push(("order", "variant.asc".to_string()));
        }

        let request = self.client.get(self.rest_url(category.table())).query(&query);
        let response = Self::check(self.authorized(request).send().await?).await?;
        let rows: Vec<ImageRow> = response.json().await?;

        Ok(rows
            .into_iter()
            .map(|row| ImageAsset {
                category,
                number: row.number,
                variant: row.variant.and_then(variant_to_string),
                image_url: row.image_url,
            })
            .collect())
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>> {
        tracing::debug!("Downloading {}", url);
        let response = Self::check(self.client.get(url).send().await?).await?;
        Ok(response.bytes().await?.to_vec())
    }

    async fn upload(
        &self,
        storage_path: &str,
        data: Vec<u8>,
        content_type: &str,
    ) -> Result<String> {
        let request = self
            .client
            .post(self.object_url(storage_path))
            .header("content-type", content_type)
            .header("x-upsert", "true")
            .body(data);

        Self::check(self.authorized(request).send().await?).await?;
        Ok(self.public_url(storage_path))
    }

    async fn record(&self, asset: &ImageAsset) -> Result<()> {
        let request = match asset.category {
            // gada 每個數字只有一張圖，以 gada_cipars 做 upsert
            ImageCategory::Gada => self
                .client
                .post(self.rest_url(asset.category.table()))
                .query(&[("on_conflict", asset.category.number_column())])
                .header("Prefer", "resolution=merge-duplicates,return=minimal")
                .json(&serde_json::json!({
                    "gada_cipars": asset.number,
                    "image_url": asset.image_url,
                })),
            ImageCategory::Menesa => self
                .client
                .post(self.rest_url(asset.category.table()))
                .header("Prefer", "return=minimal")
                .json(&serde_json::json!({
                    "menesa_cipars": asset.number,
                    "variant": asset.variant,
                    "image_url": asset.image_url,
                })),
        };

        Self::check(self.authorized(request).send().await?).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    fn client_for(server: &MockServer) -> SupabaseClient {
        let config = StoreConfig {
            url: format!("{}/", server.base_url()),
            service_key: "test-key".to_string(),
            bucket: "astro-forecasts".to_string(),
            timeout_seconds: 5,
        };
        SupabaseClient::new(&config).unwrap()
    }

    #[test]
    fn test_parse_content_range_total() {
        assert_eq!(parse_content_range_total("0-0/57"), Some(57));
        assert_eq!(parse_content_range_total("*/0"), Some(0));
        assert_eq!(parse_content_range_total("0-0/*"), None);
        assert_eq!(parse_content_range_total("garbage"), None);
    }

    #[tokio::test]
    async fn test_fetch_variants_sends_filters_and_auth() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.method(GET)
                .path("/rest/v1/daily_texts")
                .query_param("lang", "eq.lv")
                .query_param("number", "eq.9")
                .query_param("order", "variant.asc")
                .header("apikey", "test-key")
                .header("authorization", "Bearer test-key");
            then.status(200)
                .header("Content-Type", "application/json")
                .json_body(serde_json::json!([
                    {"id": 1, "number": 9, "lang": "lv", "variant": "1", "title": "A", "content": "a"},
                    {"id": 2, "number": 9, "lang": "lv", "variant": "1.1", "title": "B", "content": "b"}
                ]));
        });

        let client = client_for(&server);
        let variants = client.fetch_variants("lv", 9).await.unwrap();

        api_mock.assert();
        assert_eq!(variants.len(), 2);
        assert_eq!(variants[1].variant, "1.1");
        assert_eq!(variants[1].title, "B");
    }

    #[tokio::test]
    async fn test_store_error_status_is_reported() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/rest/v1/daily_texts");
            then.status(401).body("Invalid API key");
        });

        let client = client_for(&server);
        let err = client.fetch_variants("lv", 9).await.unwrap_err();

        match err {
            ForecastError::StoreError { status, message } => {
                assert_eq!(status, 401);
                assert_eq!(message, "Invalid API key");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_ping_reads_exact_count() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.method(GET)
                .path("/rest/v1/daily_texts")
                .query_param("limit", "1")
                .header("prefer", "count=exact");
            then.status(200)
                .header("Content-Type", "application/json")
                .header("Content-Range", "0-0/57")
                .json_body(serde_json::json!([{"number": 1}]));
        });

        let client = client_for(&server);
        let health = client.ping().await.unwrap();

        api_mock.assert();
        assert_eq!(health.count, Some(57));
    }

    #[tokio::test]
    async fn test_fetch_menesa_images() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.method(GET)
                .path("/rest/v1/forecast_menesa_images")
                .query_param("menesa_cipars", "eq.10")
                .query_param("order", "variant.asc");
            then.status(200)
                .header("Content-Type", "application/json")
                .json_body(serde_json::json!([
                    {"menesa_cipars": 10, "variant": "1", "image_url": "https://x/mc10v1.jpg"},
                    {"menesa_cipars": 10, "variant": 2, "image_url": "https://x/mc10v2.jpg"}
                ]));
        });

        let client = client_for(&server);
        let images = client
            .fetch_images(ImageCategory::Menesa, 10)
            .await
            .unwrap();

        api_mock.assert();
        assert_eq!(images.len(), 2);
        assert_eq!(images[0].variant.as_deref(), Some("1"));
        assert_eq!(images[1].variant.as_deref(), Some("2"));
        assert_eq!(images[1].category, ImageCategory::Menesa);
    }

    #[tokio::test]
    async fn test_fetch_gada_images_without_variant() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET)
                .path("/rest/v1/forecast_gada_images")
                .query_param("gada_cipars", "eq.19");
            then.status(200)
                .header("Content-Type", "application/json")
                .json_body(serde_json::json!([
                    {"id": 4, "gada_cipars": 19, "image_url": "https://x/gc19.jpg"}
                ]));
        });

        let client = client_for(&server);
        let images = client.fetch_images(ImageCategory::Gada, 19).await.unwrap();

        assert_eq!(images.len(), 1);
        assert_eq!(images[0].number, 19);
        assert!(images[0].variant.is_none());
    }

    #[tokio::test]
    async fn test_upload_returns_public_url() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.method(POST)
                .path("/storage/v1/object/astro-forecasts/gada/gc1.jpg")
                .header("x-upsert", "true")
                .header("content-type", "image/jpeg")
                .body("jpeg-bytes");
            then.status(200)
                .json_body(serde_json::json!({"Key": "astro-forecasts/gada/gc1.jpg"}));
        });

        let client = client_for(&server);
        let url = client
            .upload("gada/gc1.jpg", b"jpeg-bytes".to_vec(), "image/jpeg")
            .await
            .unwrap();

        api_mock.assert();
        assert_eq!(
            url,
            server.url("/storage/v1/object/public/astro-forecasts/gada/gc1.jpg")
        );
    }

    #[tokio::test]
    async fn test_record_gada_upserts_on_number() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.method(POST)
                .path("/rest/v1/forecast_gada_images")
                .query_param("on_conflict", "gada_cipars")
                .header("prefer", "resolution=merge-duplicates,return=minimal")
                .json_body(serde_json::json!({"gada_cipars": 3, "image_url": "https://x/gc3.jpg"}));
            then.status(201);
        });

        let client = client_for(&server);
        client
            .record(&ImageAsset {
                category: ImageCategory::Gada,
                number: 3,
                variant: None,
                image_url: "https://x/gc3.jpg".to_string(),
            })
            .await
            .unwrap();

        api_mock.assert();
    }

    #[tokio::test]
    async fn test_record_menesa_inserts_variant() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.method(POST)
                .path("/rest/v1/forecast_menesa_images")
                .json_body(serde_json::json!({
                    "menesa_cipars": 10,
                    "variant": "1.1",
                    "image_url": "https://x/mc10v1.1.jpg"
                }));
            then.status(201);
        });

        let client = client_for(&server);
        client
            .record(&ImageAsset {
                category: ImageCategory::Menesa,
                number: 10,
                variant: Some("1.1".to_string()),
                image_url: "https://x/mc10v1.1.jpg".to_string(),
            })
            .await
            .unwrap();

        api_mock.assert();
    }
}
