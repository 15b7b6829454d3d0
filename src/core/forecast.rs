use crate::core::numerology::{parse_date, select_variant, NumerologyEngine};
use crate::domain::model::{CalendarDate, DailyForecast};
use crate::domain::ports::ContentStore;
use crate::utils::error::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// 版本選擇使用哪一天的序數
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VariantClock {
    /// 請求當下的 UTC 日期
    #[default]
    Now,
    /// 預測的目標日期
    Target,
}

impl VariantClock {
    pub fn reference(&self, now: DateTime<Utc>, target: CalendarDate) -> CalendarDate {
        match self {
            VariantClock::Now => today(now),
            VariantClock::Target => target,
        }
    }
}

pub fn today(now: DateTime<Utc>) -> CalendarDate {
    CalendarDate::from(now.date_naive())
}

/// 啟動時建立一次，之後唯讀共用
pub struct ForecastService {
    engine: NumerologyEngine,
    store: Arc<dyn ContentStore>,
    default_language: String,
    variant_clock: VariantClock,
}

impl ForecastService {
    pub fn new(
        engine: NumerologyEngine,
        store: Arc<dyn ContentStore>,
        default_language: String,
        variant_clock: VariantClock,
    ) -> Self {
        Self {
            engine,
            store,
            default_language,
            variant_clock,
        }
    }

    pub fn engine(&self) -> &NumerologyEngine {
        &self.engine
    }

    pub fn store(&self) -> &Arc<dyn ContentStore> {
        &self.store
    }

    pub async fn daily_forecast(
        &self,
        birth_date: &str,
        target_date: Option<&str>,
        language: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<DailyForecast> {
        let birth = parse_date(birth_date)?;
        let target = match target_date {
            Some(text) => parse_date(text)?,
            None => today(now),
        };
        let language = language
            .map(str::trim)
            .filter(|lang| !lang.is_empty())
            .unwrap_or(&self.default_language);

        let daily_number = self.engine.daily_number(birth, target)?;
        tracing::debug!(
            "Daily number for {} on {}: {} (lang={})",
            birth,
            target,
            daily_number,
            language
        );

        let variants = self.store.fetch_variants(language, daily_number).await?;
        let reference = self.variant_clock.reference(now, target);
        let forecast = select_variant(&variants, reference).cloned();

        if forecast.is_none() {
            tracing::warn!(
                "No forecast text for number {} (lang={})",
                daily_number,
                language
            );
        }

        Ok(DailyForecast {
            daily_number,
            forecast,
        })
    }
}
