use crate::core::forecast::VariantClock;
use crate::core::numerology::{YearOffsetTable, MAX_NUMBER};
use crate::utils::error::{ForecastError, Result};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

pub const SUPABASE_URL_VAR: &str = "SUPABASE_URL";
pub const SUPABASE_KEY_VAR: &str = "SUPABASE_SERVICE_ROLE_KEY";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub store: StoreConfig,
    pub forecast: ForecastConfig,
    pub package: PackageConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 10000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub url: String,
    pub service_key: String,
    pub bucket: String,
    pub timeout_seconds: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            service_key: String::new(),
            bucket: "astro-forecasts".to_string(),
            timeout_seconds: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecastConfig {
    pub default_language: String,
    pub variant_clock: VariantClock,
    /// TOML 的 key 一定是字串，載入後再轉成年份
    pub year_offsets: BTreeMap<String, u32>,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            default_language: "lv".to_string(),
            variant_clock: VariantClock::default(),
            year_offsets: BTreeMap::from([("2025".to_string(), 9), ("2026".to_string(), 10)]),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PackageConfig {
    pub output_path: String,
    /// 星盤圖服務，例如 http://localhost:3333/api/star
    pub star_endpoint: Option<String>,
}

impl Default for PackageConfig {
    fn default() -> Self {
        Self {
            output_path: "./output".to_string(),
            star_endpoint: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl AppConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(ForecastError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        // 處理環境變數替換
        let processed_content = Self::substitute_env_vars(content)?;

        let mut config: Self =
            toml::from_str(&processed_content).map_err(|e| ForecastError::ConfigError {
                message: format!("TOML parsing error: {}", e),
            })?;
        config.apply_env_fallbacks();
        Ok(config)
    }

    /// 沒有配置檔時使用預設值與環境變數
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env_fallbacks();
        config
    }

    /// 檔案存在就載入，否則退回 `from_env`
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        if path.as_ref().exists() {
            Self::from_file(path)
        } else {
            tracing::debug!(
                "Config file {} not found, using defaults and environment",
                path.as_ref().display()
            );
            Ok(Self::from_env())
        }
    }

    /// 替換環境變數 (例如 ${SUPABASE_URL})
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| ForecastError::ConfigError {
            message: format!("env substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    fn apply_env_fallbacks(&mut self) {
        if self.store.url.trim().is_empty() {
            self.store.url = std::env::var(SUPABASE_URL_VAR).unwrap_or_default();
        }
        if self.store.service_key.trim().is_empty() {
            self.store.service_key = std::env::var(SUPABASE_KEY_VAR).unwrap_or_default();
        }
        self.store.url = self.store.url.trim().to_string();
        self.store.service_key = self.store.service_key.trim().to_string();
    }

    pub fn year_offset_table(&self) -> Result<YearOffsetTable> {
        let mut offsets = BTreeMap::new();
        for (year, offset) in &self.forecast.year_offsets {
            let field = format!("forecast.year_offsets.{}", year);
            let parsed: i32 = year
                .trim()
                .parse()
                .map_err(|_| ForecastError::InvalidConfigValueError {
                    field: field.clone(),
                    value: year.clone(),
                    reason: "Year must be an integer".to_string(),
                })?;
            validation::validate_range(&field, *offset, 1, MAX_NUMBER)?;
            offsets.insert(parsed, *offset);
        }
        Ok(YearOffsetTable::new(offsets))
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// 驗證配置的合理性
    pub fn validate_config(&self) -> Result<()> {
        validation::validate_resolved("store.url", &self.store.url)?;
        if self.store.url.is_empty() {
            return Err(ForecastError::MissingConfigError {
                field: format!("store.url (or {})", SUPABASE_URL_VAR),
            });
        }
        validation::validate_url("store.url", &self.store.url)?;

        validation::validate_resolved("store.service_key", &self.store.service_key)?;
        if self.store.service_key.is_empty() {
            return Err(ForecastError::MissingConfigError {
                field: format!("store.service_key (or {})", SUPABASE_KEY_VAR),
            });
        }

        validation::validate_non_empty_string("store.bucket", &self.store.bucket)?;
        validation::validate_range("store.timeout_seconds", self.store.timeout_seconds, 1, 300)?;
        validation::validate_non_empty_string(
            "forecast.default_language",
            &self.forecast.default_language,
        )?;
        validation::validate_path("package.output_path", &self.package.output_path)?;

        if let Some(endpoint) = &self.package.star_endpoint {
            validation::validate_url("package.star_endpoint", endpoint)?;
        }

        if self.forecast.year_offsets.is_empty() {
            return Err(ForecastError::MissingConfigError {
                field: "forecast.year_offsets".to_string(),
            });
        }
        self.year_offset_table()?;

        Ok(())
    }
}

impl Validate for AppConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_basic_toml_config() {
        let toml_content = r#"
[server]
port = 8080

[store]
url = "https://abc.supabase.co"
service_key = "service-key"

[forecast]
default_language = "en"
variant_clock = "target"

[forecast.year_offsets]
2025 = 9
2026 = 10
2027 = 11

[package]
output_path = "./test-output"
star_endpoint = "http://localhost:3333/api/star"
"#;

        let config = AppConfig::from_toml_str(toml_content).unwrap();

        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.store.bucket, "astro-forecasts");
        assert_eq!(config.forecast.default_language, "en");
        assert_eq!(config.forecast.variant_clock, VariantClock::Target);
        assert!(config.validate().is_ok());

        let table = config.year_offset_table().unwrap();
        assert_eq!(table.offset(2027).unwrap(), 11);
    }

    #[test]
    fn test_defaults_when_sections_missing() {
        let config = AppConfig::from_toml_str(
            r#"
[store]
url = "https://abc.supabase.co"
service_key = "k"
"#,
        )
        .unwrap();

        assert_eq!(config.bind_address(), "0.0.0.0:10000");
        assert_eq!(config.forecast.default_language, "lv");
        assert_eq!(config.forecast.variant_clock, VariantClock::Now);
        assert_eq!(config.package.output_path, "./output");
        assert_eq!(
            config.year_offset_table().unwrap(),
            YearOffsetTable::default()
        );
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("TEST_FORECAST_STORE_URL", "https://test.supabase.co");

        let toml_content = r#"
[store]
url = "${TEST_FORECAST_STORE_URL}"
service_key = "k"
"#;

        let config = AppConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(config.store.url, "https://test.supabase.co");

        std::env::remove_var("TEST_FORECAST_STORE_URL");
    }

    #[test]
    fn test_unresolved_variable_fails_validation() {
        let toml_content = r#"
[store]
url = "https://abc.supabase.co"
service_key = "${TEST_FORECAST_UNSET_KEY}"
"#;

        let config = AppConfig::from_toml_str(toml_content).unwrap();
        assert!(matches!(
            config.validate(),
            Err(ForecastError::MissingConfigError { .. })
        ));
    }

    #[test]
    fn test_config_validation() {
        let toml_content = r#"
[store]
url = "invalid-url"
service_key = "k"
"#;

        let config = AppConfig::from_toml_str(toml_content).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_year_offset_out_of_range_rejected() {
        let toml_content = r#"
[store]
url = "https://abc.supabase.co"
service_key = "k"

[forecast.year_offsets]
2025 = 40
"#;

        let config = AppConfig::from_toml_str(toml_content).unwrap();
        assert!(config.year_offset_table().is_err());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_non_numeric_year_rejected() {
        let mut config = AppConfig::default();
        config
            .forecast
            .year_offsets
            .insert("next".to_string(), 9);
        assert!(matches!(
            config.year_offset_table(),
            Err(ForecastError::InvalidConfigValueError { .. })
        ));
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();

        let toml_content = r#"
[store]
url = "https://file.supabase.co"
service_key = "k"
bucket = "other-bucket"
"#;

        temp_file.write_all(toml_content.as_bytes()).unwrap();

        let config = AppConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.store.bucket, "other-bucket");
        assert_eq!(config.store.url, "https://file.supabase.co");
    }

    #[test]
    fn test_example_config_parses() {
        let config = AppConfig::from_toml_str(include_str!("../../forecast.example.toml")).unwrap();

        assert_eq!(config.server.port, 10000);
        assert_eq!(config.forecast.variant_clock, VariantClock::Now);
        assert_eq!(
            config.year_offset_table().unwrap(),
            YearOffsetTable::default()
        );
    }
}
