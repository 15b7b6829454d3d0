use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

/// 已驗證的日曆日期
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CalendarDate(NaiveDate);

impl CalendarDate {
    /// 不存在的日期 (例如 31.02) 回傳 `None`
    pub fn new(year: i32, month: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day).map(Self)
    }

    pub fn day(&self) -> u32 {
        self.0.day()
    }

    pub fn month(&self) -> u32 {
        self.0.month()
    }

    pub fn year(&self) -> i32 {
        self.0.year()
    }

    /// 一年中的第幾天 (1–366)
    pub fn day_of_year(&self) -> u32 {
        self.0.ordinal()
    }

    /// DDMMYYYY，用於輸出檔名
    pub fn compact(&self) -> String {
        self.0.format("%d%m%Y").to_string()
    }
}

impl From<NaiveDate> for CalendarDate {
    fn from(date: NaiveDate) -> Self {
        Self(date)
    }
}

impl fmt::Display for CalendarDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%d.%m.%Y"))
    }
}

/// `daily_texts` 表中的一筆預測文字
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastVariant {
    pub number: u32,
    #[serde(rename = "lang")]
    pub language: String,
    /// 支援點號子版本，例如 "1.1"
    #[serde(default, deserialize_with = "variant_id")]
    pub variant: String,
    pub title: String,
    pub content: String,
}

/// 表中的 variant 欄位可能是數字或字串
fn variant_id<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        serde_json::Value::Null => Ok(String::new()),
        other => Err(serde::de::Error::custom(format!(
            "unexpected variant id: {}",
            other
        ))),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageCategory {
    /// 年度數字 (gada cipars)
    Gada,
    /// 月份數字 (mēneša cipars)，可有多個版本
    Menesa,
}

impl ImageCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImageCategory::Gada => "gada",
            ImageCategory::Menesa => "menesa",
        }
    }

    pub fn table(&self) -> &'static str {
        match self {
            ImageCategory::Gada => "forecast_gada_images",
            ImageCategory::Menesa => "forecast_menesa_images",
        }
    }

    pub fn number_column(&self) -> &'static str {
        match self {
            ImageCategory::Gada => "gada_cipars",
            ImageCategory::Menesa => "menesa_cipars",
        }
    }
}

impl fmt::Display for ImageCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ImageCategory {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "gada" => Ok(ImageCategory::Gada),
            "menesa" => Ok(ImageCategory::Menesa),
            other => Err(format!("unknown image category '{}' (gada|menesa)", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageAsset {
    pub category: ImageCategory,
    pub number: u32,
    pub variant: Option<String>,
    pub image_url: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DailyForecast {
    pub daily_number: u32,
    pub forecast: Option<ForecastVariant>,
}

/// 打包結果摘要，同時寫入 ZIP 的 summary.json
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastPackage {
    pub birth_date: String,
    pub target_date: String,
    pub year_number: u32,
    pub month_number: u32,
    pub chosen_variant: String,
    pub files: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreHealth {
    pub count: Option<u64>,
}
