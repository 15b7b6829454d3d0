pub mod forecast;
pub mod numerology;
pub mod package;

pub use crate::domain::model::{CalendarDate, DailyForecast, ForecastVariant};
pub use crate::domain::ports::{ContentStore, ImageStore, Storage};
pub use crate::utils::error::Result;
