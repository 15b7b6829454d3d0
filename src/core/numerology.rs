//! 數字學核心運算：數字縮減、個人年、每日數字以及版本選擇。
//!
//! 本模組為純函式，不做 I/O、不讀系統時鐘、不寫日誌。需要「今天」的地方一律由呼叫端傳入。
//!
//! 縮減規則是「單次」位數和：大於 22 的數只加總一次，不會反覆縮減到不動點。
//! 例如 `reduce_to_range(999) == 27`。

use crate::domain::model::CalendarDate;
use crate::utils::error::{ForecastError, Result};
use chrono::NaiveDate;
use std::collections::BTreeMap;

/// 縮減後的上限
pub const MAX_NUMBER: u32 = 22;

/// 依序嘗試的日期格式
const DATE_FORMATS: [&str; 3] = ["%d.%m.%Y", "%Y-%m-%d", "%d/%m/%Y"];

pub fn reduce_to_range(n: u32) -> u32 {
    if n <= MAX_NUMBER {
        return n;
    }
    digit_sum(n)
}

fn digit_sum(mut n: u32) -> u32 {
    let mut sum = 0;
    while n > 0 {
        sum += n % 10;
        n /= 10;
    }
    sum
}

pub fn parse_date(text: &str) -> Result<CalendarDate> {
    let trimmed = text.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(trimmed, fmt).ok())
        .map(CalendarDate::from)
        .ok_or_else(|| ForecastError::InvalidDateFormat {
            input: text.to_string(),
        })
}

/// 依參考日期在一年中的序數挑選版本。
///
/// 呼叫端需先排序好 `variants`，這裡不會重新排序。
pub fn select_variant<T>(variants: &[T], reference: CalendarDate) -> Option<&T> {
    if variants.is_empty() {
        return None;
    }
    let index = reference.day_of_year() as usize % variants.len();
    variants.get(index)
}

/// "1.2" -> "1"，"3" -> "3"
pub fn main_variant(variant_id: &str) -> &str {
    variant_id
        .split_once('.')
        .map(|(main, _)| main)
        .unwrap_or(variant_id)
}

/// 依主版本分組。組依主版本字典序排列，組內依完整版本 id 字典序排列。
pub fn group_by_main_variant<T, F>(items: Vec<T>, variant_of: F) -> Vec<(String, Vec<T>)>
where
    F: Fn(&T) -> &str,
{
    let mut groups: BTreeMap<String, Vec<T>> = BTreeMap::new();
    for item in items {
        let main = main_variant(variant_of(&item)).to_string();
        groups.entry(main).or_default().push(item);
    }

    groups
        .into_iter()
        .map(|(main, mut members)| {
            members.sort_by(|a, b| variant_of(a).cmp(variant_of(b)));
            (main, members)
        })
        .collect()
}

/// 年份 -> 年度偏移量
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct YearOffsetTable {
    offsets: BTreeMap<i32, u32>,
}

impl YearOffsetTable {
    pub fn new(offsets: BTreeMap<i32, u32>) -> Self {
        Self { offsets }
    }

    /// 表中沒有的年份一律回傳 `UnsupportedYear`，不使用預設偏移量
    pub fn offset(&self, year: i32) -> Result<u32> {
        self.offsets
            .get(&year)
            .copied()
            .ok_or(ForecastError::UnsupportedYear { year })
    }

    pub fn years(&self) -> impl Iterator<Item = i32> + '_ {
        self.offsets.keys().copied()
    }
}

impl Default for YearOffsetTable {
    fn default() -> Self {
        Self::new(BTreeMap::from([(2025, 9), (2026, 10)]))
    }
}

#[derive(Debug, Clone, Default)]
pub struct NumerologyEngine {
    offsets: YearOffsetTable,
}

impl NumerologyEngine {
    pub fn new(offsets: YearOffsetTable) -> Self {
        Self { offsets }
    }

    pub fn offsets(&self) -> &YearOffsetTable {
        &self.offsets
    }

    pub fn personal_year(&self, birth_day: u32, birth_month: u32, target_year: i32) -> Result<u32> {
        let offset = self.offsets.offset(target_year)?;
        Ok(reduce_to_range(
            reduce_to_range(birth_day) + birth_month + offset,
        ))
    }

    pub fn daily_number(&self, birth: CalendarDate, target: CalendarDate) -> Result<u32> {
        let personal_year = self.personal_year(birth.day(), birth.month(), target.year())?;
        Ok(reduce_to_range(
            personal_year + target.month() + reduce_to_range(target.day()),
        ))
    }

    /// 年度數字 (gada cipars)，與個人年相同
    pub fn year_number(&self, birth: CalendarDate, year: i32) -> Result<u32> {
        self.personal_year(birth.day(), birth.month(), year)
    }

    /// 月份數字 (mēneša cipars)
    pub fn month_number(&self, birth: CalendarDate, target: CalendarDate) -> Result<u32> {
        let year_number = self.year_number(birth, target.year())?;
        Ok(reduce_to_range(year_number + target.month()))
    }
}
