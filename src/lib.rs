pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use adapters::{local::LocalStorage, supabase::SupabaseClient};
pub use config::toml_config::AppConfig;
pub use core::{
    forecast::{ForecastService, VariantClock},
    numerology::{parse_date, reduce_to_range, select_variant, NumerologyEngine, YearOffsetTable},
    package::ForecastPackager,
};
pub use domain::model::CalendarDate;
pub use utils::error::{ForecastError, Result};
