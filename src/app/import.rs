use crate::core::numerology::MAX_NUMBER;
use crate::domain::model::{ImageAsset, ImageCategory};
use crate::domain::ports::ImageStore;
use crate::utils::error::{ForecastError, Result};
use regex::Regex;
use std::path::Path;
use std::sync::Arc;

/// gc1.jpg .. gc22.jpg
const GADA_PATTERN: &str = r"(?i)^gc([1-9]|1\d|2[0-2])\.jpe?g$";
/// mc10v1.jpg → (10, "1")，mc10v1.1.jpg → (10, "1.1")
const MENESA_PATTERN: &str = r"(?i)^mc(\d{1,2})v([\d.]+)\.jpe?g$";

#[derive(Debug, Default)]
pub struct ImportReport {
    pub uploaded: Vec<ImageAsset>,
    pub skipped: Vec<String>,
}

pub struct ImageImporter {
    store: Arc<dyn ImageStore>,
    gada: Regex,
    menesa: Regex,
}

impl ImageImporter {
    pub fn new(store: Arc<dyn ImageStore>) -> Result<Self> {
        let compile = |pattern: &str| {
            Regex::new(pattern).map_err(|e| ForecastError::ConfigError {
                message: format!("file name pattern: {}", e),
            })
        };
        Ok(Self {
            store,
            gada: compile(GADA_PATTERN)?,
            menesa: compile(MENESA_PATTERN)?,
        })
    }

    /// 依檔名取得 (數字, 版本)；不符合規則回傳 `None`
    pub fn parse_file_name(&self, category: ImageCategory, name: &str) -> Option<(u32, Option<String>)> {
        match category {
            ImageCategory::Gada => {
                let caps = self.gada.captures(name)?;
                let number = caps[1].parse().ok()?;
                Some((number, None))
            }
            ImageCategory::Menesa => {
                let caps = self.menesa.captures(name)?;
                let number: u32 = caps[1].parse().ok()?;
                if !(1..=MAX_NUMBER).contains(&number) {
                    return None;
                }
                Some((number, Some(caps[2].to_string())))
            }
        }
    }

    pub async fn import_folder(&self, category: ImageCategory, folder: &Path) -> Result<ImportReport> {
        let mut names: Vec<String> = Vec::new();
        let mut entries = tokio::fs::read_dir(folder).await?;
        while let Some(entry) = entries.next_entry().await? {
            // metadata 會跟隨 symlink
            let is_file = tokio::fs::metadata(entry.path())
                .await
                .map(|meta| meta.is_file())
                .unwrap_or(false);
            if !is_file {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                names.push(name.to_string());
            }
        }
        names.sort();

        tracing::info!(
            "📁 Importing {} images from {} ({} files)",
            category,
            folder.display(),
            names.len()
        );

        let mut report = ImportReport::default();

        for name in names {
            let Some((number, variant)) = self.parse_file_name(category, &name) else {
                tracing::debug!("Skipping {}", name);
                report.skipped.push(name);
                continue;
            };

            let data = tokio::fs::read(folder.join(&name)).await?;
            let storage_path = format!("{}/{}", category, name);
            let image_url = self.store.upload(&storage_path, data, "image/jpeg").await?;

            let asset = ImageAsset {
                category,
                number,
                variant,
                image_url,
            };
            self.store.record(&asset).await?;

            match &asset.variant {
                Some(v) => tracing::info!("✅ {} {} v{} → {}", category, number, v, asset.image_url),
                None => tracing::info!("✅ {} {} → {}", category, number, asset.image_url),
            }
            report.uploaded.push(asset);
        }

        tracing::info!(
            "🎉 Imported {} {} images ({} skipped)",
            report.uploaded.len(),
            category,
            report.skipped.len()
        );
        Ok(report)
    }
}
