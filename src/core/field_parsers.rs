//! 容錯的欄位解析：日期、電話、CSV 單行切割

use crate::utils::error::{CardError, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime};

#[derive(Debug, Clone, Copy)]
enum DateLayout {
    Date(&'static str),
    DateTime(&'static str),
}

impl DateLayout {
    fn format(&self) -> &'static str {
        match self {
            Self::Date(fmt) | Self::DateTime(fmt) => fmt,
        }
    }

    fn parse(&self, value: &str) -> Option<NaiveDate> {
        if !year_width_matches(value, self.format()) {
            return None;
        }
        match self {
            Self::Date(fmt) => NaiveDate::parse_from_str(value, fmt).ok(),
            Self::DateTime(fmt) => NaiveDateTime::parse_from_str(value, fmt)
                .ok()
                .map(|dt| dt.date()),
        }
    }
}

fn all_digits(bytes: &[u8]) -> bool {
    !bytes.is_empty() && bytes.iter().all(u8::is_ascii_digit)
}

/// chrono 的 `%Y` 接受任意位數，這裡先確認年份欄位的寬度：
/// `%Y` 必須剛好四位數，`%y` 必須剛好兩位數
fn year_width_matches(value: &str, fmt: &str) -> bool {
    let bytes = value.as_bytes();
    let n = bytes.len();

    if fmt == "%Y%m%d" {
        return n == 8 && all_digits(bytes);
    }
    if fmt.starts_with("%Y") {
        return n > 4 && all_digits(&bytes[..4]) && !bytes[4].is_ascii_digit();
    }
    if fmt.ends_with("%Y") {
        return n > 4 && all_digits(&bytes[n - 4..]) && !bytes[n - 5].is_ascii_digit();
    }
    if fmt.ends_with("%y") {
        return n > 2 && all_digits(&bytes[n - 2..]) && !bytes[n - 3].is_ascii_digit();
    }
    true
}

/// 依序嘗試，第一個完整匹配的格式勝出
const IMPORT_LAYOUTS: [DateLayout; 6] = [
    DateLayout::Date("%Y-%-m-%-d"),
    DateLayout::Date("%Y-%m-%d"),
    DateLayout::Date("%-m/%-d/%Y"),
    DateLayout::Date("%m/%d/%Y"),
    DateLayout::DateTime("%Y-%m-%dT%H:%M:%S"),
    DateLayout::DateTime("%Y-%m-%dT%H:%M:%S%.fZ"),
];

/// 兩位數年份：00-69 視為 20xx，70-99 視為 19xx
const FALLBACK_LAYOUTS: [DateLayout; 8] = [
    DateLayout::Date("%Y/%m/%d"),
    DateLayout::DateTime("%Y-%m-%d %H:%M:%S"),
    DateLayout::DateTime("%Y-%m-%d %H:%M"),
    DateLayout::Date("%d %B %Y"),
    DateLayout::Date("%B %d, %Y"),
    DateLayout::Date("%B %d %Y"),
    DateLayout::Date("%Y%m%d"),
    DateLayout::Date("%-m/%-d/%y"),
];

/// 解析匯入檔中的日期，先試固定格式，失敗再走寬鬆解析
pub fn parse_date(value: &str) -> Result<NaiveDate> {
    let value = value.trim();
    if value.is_empty() {
        return Err(CardError::parse(value, "date cannot be empty"));
    }

    if let Some(date) = IMPORT_LAYOUTS.iter().find_map(|layout| layout.parse(value)) {
        return Ok(date);
    }

    parse_date_lenient(value)
        .ok_or_else(|| CardError::parse(value, "unrecognized date format"))
}

/// 只接受 `yyyy-MM-dd`，沒有退路
pub fn parse_date_strict(value: &str) -> Result<NaiveDate> {
    let value = value.trim();
    if value.is_empty() {
        return Err(CardError::parse(value, "date cannot be empty"));
    }

    let bytes = value.as_bytes();
    let shaped = bytes.len() == 10
        && bytes[4] == b'-'
        && bytes[7] == b'-'
        && bytes
            .iter()
            .enumerate()
            .all(|(i, b)| i == 4 || i == 7 || b.is_ascii_digit());
    if !shaped {
        return Err(CardError::parse(value, "expected date in yyyy-MM-dd format"));
    }

    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|e| CardError::parse(value, e.to_string()))
}

fn parse_date_lenient(value: &str) -> Option<NaiveDate> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.date_naive());
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(value) {
        return Some(dt.date_naive());
    }
    FALLBACK_LAYOUTS.iter().find_map(|layout| layout.parse(value))
}

/// 還原被試算表轉成科學記號的電話號碼，例如 `1.234567E+9`
///
/// 無法解析時原樣回傳，不會報錯。
pub fn normalize_phone(value: &str) -> String {
    let value = value.trim();
    if !(value.contains("E+") || value.contains("e+")) {
        return value.to_string();
    }

    match value.parse::<f64>() {
        Ok(number) if number.is_finite() => format!("{:.0}", number.trunc()),
        _ => {
            tracing::debug!("Leaving unparsable scientific-notation phone as-is: {}", value);
            value.to_string()
        }
    }
}

/// 以逗號切割一行 CSV，雙引號內的逗號不切
///
/// 引號只切換狀態、不會出現在結果中，也不處理 `""` 跳脫。
pub fn split_csv_line(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;

    for c in line.chars() {
        match c {
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => fields.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    fields.push(current);

    fields
}
