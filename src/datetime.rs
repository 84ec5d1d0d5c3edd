use anyhow::{Context, Result};
use chrono::{DateTime, Local, NaiveDate, Utc};

#[cfg(not(test))]
/// 現在のUTC時間を取得する。
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// `YYYY-MM-DD`形式の文字列を日付としてパースする。
pub fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").with_context(|| format!("Failed to parse date: {}", s))
}

/// `YYYY-MM-DD HH:MM:SS`形式の文字列をLocalタイムゾーンの日時としてパースする。
///
/// タイムゾーンの切り替わりで日時が不定になる場合はエラーを返す。
/// UTCへの暗黙のフォールバックは行わない。
pub fn parse_local_timestamp(s: &str) -> Result<DateTime<Local>> {
    use chrono::{NaiveDateTime, TimeZone};

    let naive_datetime = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .with_context(|| format!("Failed to parse timestamp: {}", s))?;
    Local
        .from_local_datetime(&naive_datetime)
        .single()
        .with_context(|| format!("Timestamp is not a valid local time: {}", s))
}

/// テスト時に利用するモック時間を取得する。
#[cfg(test)]
pub mod mock_datetime {
    use std::cell::RefCell;

    use super::DateTime;
    use super::Utc;

    thread_local! {
        static MOCK_TIME: RefCell<Option<DateTime<Utc>>> = RefCell::new(None);
    }

    /// モック時間を取得する。
    pub fn now() -> DateTime<Utc> {
        MOCK_TIME.with(|cell| cell.borrow().as_ref().cloned().unwrap_or_else(Utc::now))
    }

    /// モック時間を設定する。
    pub fn set_mock_time(time: DateTime<Utc>) {
        MOCK_TIME.with(|cell| *cell.borrow_mut() = Some(time));
    }

    // 設定したモック時間をクリアする。
    pub fn clear_mock_time() {
        MOCK_TIME.with(|cell| *cell.borrow_mut() = None);
    }
}

#[cfg(test)]
pub use mock_datetime::now;
