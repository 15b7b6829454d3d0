use crate::core::forecast::{today, VariantClock};
use crate::core::numerology::{group_by_main_variant, parse_date, select_variant, NumerologyEngine};
use crate::domain::model::{ForecastPackage, ImageCategory};
use crate::domain::ports::{ImageStore, Storage};
use crate::utils::error::{ForecastError, Result};
use chrono::{DateTime, Utc};
use std::io::Write;
use std::sync::Arc;
use url::Url;
use zip::write::{FileOptions, ZipWriter};

pub const STAR_FILE: &str = "Tava_Astrologiska_Zvaigzne.png";
pub const SUMMARY_FILE: &str = "summary.json";

/// 年度與月份圖片打包成 ZIP
pub struct ForecastPackager<S: Storage> {
    engine: NumerologyEngine,
    images: Arc<dyn ImageStore>,
    storage: S,
    variant_clock: VariantClock,
    star_endpoint: Option<String>,
}

impl<S: Storage> ForecastPackager<S> {
    pub fn new(
        engine: NumerologyEngine,
        images: Arc<dyn ImageStore>,
        storage: S,
        variant_clock: VariantClock,
    ) -> Self {
        Self {
            engine,
            images,
            storage,
            variant_clock,
            star_endpoint: None,
        }
    }

    pub fn with_star_endpoint(mut self, endpoint: Option<String>) -> Self {
        self.star_endpoint = endpoint;
        self
    }

    /// 回傳輸出位置與摘要
    pub async fn build(
        &self,
        birth_date: &str,
        target_date: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<(String, ForecastPackage)> {
        let birth = parse_date(birth_date)?;
        let target = match target_date {
            Some(text) => parse_date(text)?,
            None => today(now),
        };

        let year_number = self.engine.year_number(birth, target.year())?;
        let month_number = self.engine.month_number(birth, target)?;
        tracing::info!(
            "🔢 gada_cipars={}, menesa_cipars={} ({} for {})",
            year_number,
            month_number,
            birth,
            target
        );

        let mut files: Vec<(String, Vec<u8>)> = Vec::new();

        if let Some(star_url) = self.star_url(&birth.to_string())? {
            let bytes = self.images.download(&star_url).await?;
            files.push((STAR_FILE.to_string(), bytes));
        }

        let gada = self
            .images
            .fetch_images(ImageCategory::Gada, year_number)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| ForecastError::NotFound {
                message: format!("No gada_cipars {} image", year_number),
            })?;
        let bytes = self.images.download(&gada.image_url).await?;
        files.push((
            format!("Tava_Gada_Prognoze.{}", extension_of(&gada.image_url)),
            bytes,
        ));

        let menesa = self
            .images
            .fetch_images(ImageCategory::Menesa, month_number)
            .await?;
        let groups = group_by_main_variant(menesa, |asset| asset.variant.as_deref().unwrap_or(""));
        let reference = self.variant_clock.reference(now, target);
        let (chosen_main, chosen) =
            select_variant(&groups, reference).ok_or_else(|| ForecastError::NotFound {
                message: format!("No menesa_cipars {} images", month_number),
            })?;
        tracing::info!(
            "📂 Chosen menesa variant: {} ({} images)",
            chosen_main,
            chosen.len()
        );

        for (i, asset) in chosen.iter().enumerate() {
            let bytes = self.images.download(&asset.image_url).await?;
            files.push((
                format!(
                    "Tava_Menesa_Prognoze_{}_{}.{}",
                    chosen_main,
                    i + 1,
                    extension_of(&asset.image_url)
                ),
                bytes,
            ));
        }

        let summary = ForecastPackage {
            birth_date: birth.to_string(),
            target_date: target.to_string(),
            year_number,
            month_number,
            chosen_variant: chosen_main.clone(),
            files: files.iter().map(|(name, _)| name.clone()).collect(),
        };

        let zip_data = write_zip(&files, &summary)?;
        let file_name = format!("prognoze_{}.zip", birth.compact());

        tracing::debug!("Writing ZIP file ({} bytes) to storage", zip_data.len());
        self.storage.write_file(&file_name, &zip_data).await?;

        Ok((self.storage.location(&file_name), summary))
    }

    fn star_url(&self, birth_date: &str) -> Result<Option<String>> {
        let Some(endpoint) = &self.star_endpoint else {
            return Ok(None);
        };
        let mut url = Url::parse(endpoint).map_err(|e| ForecastError::InvalidConfigValueError {
            field: "package.star_endpoint".to_string(),
            value: endpoint.clone(),
            reason: e.to_string(),
        })?;
        url.query_pairs_mut()
            .append_pair("date", birth_date)
            .append_pair("format", "png");
        Ok(Some(url.to_string()))
    }
}

fn write_zip(files: &[(String, Vec<u8>)], summary: &ForecastPackage) -> Result<Vec<u8>> {
    let mut zip = ZipWriter::new(std::io::Cursor::new(Vec::new()));

    for (name, bytes) in files {
        zip.start_file::<_, ()>(name.as_str(), FileOptions::default())?;
        zip.write_all(bytes)?;
    }

    zip.start_file::<_, ()>(SUMMARY_FILE, FileOptions::default())?;
    let json_data = serde_json::to_string_pretty(summary)?;
    zip.write_all(json_data.as_bytes())?;

    // 完成並取回底層 Vec<u8>
    let cursor = zip.finish()?;
    Ok(cursor.into_inner())
}

/// URL 路徑的副檔名，無法判斷時用 jpg
fn extension_of(url: &str) -> String {
    let path = Url::parse(url)
        .map(|u| u.path().to_string())
        .unwrap_or_else(|_| url.to_string());
    path.rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .filter(|ext| matches!(ext.as_str(), "jpg" | "jpeg" | "png"))
        .unwrap_or_else(|| "jpg".to_string())
}
