//! 时间类型模块
//!
//! - `Timestamp`: 秒级 Unix 时间戳，用于 token 过期判断
//! - `format_date`: 将后端返回的时间字符串格式化为日期

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::ops::{Add, Sub};
use std::time::Duration;

// =========================================================
// Timestamp
// =========================================================

/// 自 Unix 纪元以来的秒数
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct Timestamp(f64);

impl Timestamp {
    #[inline]
    pub const fn from_secs(secs: f64) -> Self {
        Self(secs)
    }

    /// 当前时间（wasm 下由 chrono 的 `wasmbind` 特性读取 `Date.now()`）
    pub fn now() -> Self {
        Self(Utc::now().timestamp_millis() as f64 / 1000.0)
    }

    #[inline]
    pub const fn as_secs(&self) -> f64 {
        self.0
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(dt: DateTime<Utc>) -> Self {
        Self(dt.timestamp_millis() as f64 / 1000.0)
    }
}

impl Add<Duration> for Timestamp {
    type Output = Self;

    fn add(self, rhs: Duration) -> Self::Output {
        Self(self.0 + rhs.as_secs_f64())
    }
}

impl Sub<Duration> for Timestamp {
    type Output = Self;

    fn sub(self, rhs: Duration) -> Self::Output {
        Self(self.0 - rhs.as_secs_f64())
    }
}

// =========================================================
// 日期格式化
// =========================================================

/// 将 RFC 3339、`YYYY-MM-DD HH:MM(:SS)` 或纯日期格式化为 `YYYY-MM-DD`
///
/// 无法解析时原样返回。
pub fn format_date(raw: &str) -> String {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return dt.date_naive().to_string();
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return dt.date().to_string();
        }
    }
    if let Ok(d) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return d.to_string();
    }
    raw.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamp_arithmetic() {
        let t = Timestamp::from_secs(100.0);
        assert_eq!((t + Duration::from_secs(20)).as_secs(), 120.0);
        assert_eq!((t - Duration::from_millis(500)).as_secs(), 99.5);
        assert!(t < t + Duration::from_secs(1));
    }

    #[test]
    fn now_is_after_2020() {
        assert!(Timestamp::now().as_secs() > 1_577_836_800.0);
    }

    #[test]
    fn formats_known_shapes() {
        assert_eq!(format_date("2024-01-15T14:30:00Z"), "2024-01-15");
        assert_eq!(format_date("2024-01-15T14:30:00.123"), "2024-01-15");
        assert_eq!(format_date("2024-01-15 14:30"), "2024-01-15");
        assert_eq!(format_date("2024-01-15"), "2024-01-15");
        assert_eq!(format_date("yesterday"), "yesterday");
    }
}
