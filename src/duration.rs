use std::collections::HashMap;

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Local, NaiveDate};

use crate::datetime::parse_local_timestamp;
use crate::time_entry::{RunningTimer, TimeEntry, WeeklyBucket};

/// time entryのduration算出方法を指定するオプション。
#[derive(Clone, Copy, Debug)]
pub struct ReconcileOptions {
    /// 動作中のentryについて、現在時刻からの経過時間を計算するかどうか。
    /// `false`の場合はAPIが返したduration(=0)をそのまま利用する。
    pub compute_elapsed: bool,
}

impl Default for ReconcileOptions {
    fn default() -> Self {
        Self {
            compute_elapsed: true,
        }
    }
}

/// 1日分のtime entryとその合計durationを表す構造体。
#[derive(Debug)]
pub struct DailyReport {
    /// 取得順を保持したentryとそのdurationの組。
    pub rows: Vec<(TimeEntry, Duration)>,
    pub total: Duration,
}

/// 1週間分の日毎の集計結果を表す構造体。
#[derive(Debug)]
pub struct WeekReport {
    /// 日付昇順にソート済みのbucket。
    pub buckets: Vec<WeeklyBucket>,
    pub today: NaiveDate,
}

/// 動作中のtimerとその経過時間の一覧を表す構造体。
#[derive(Debug)]
pub struct TimersReport {
    pub rows: Vec<(RunningTimer, Duration)>,
    pub total: Duration,
}

/// 1件のtime entryの実際のdurationを計算する。
///
/// APIはまだ停止していないentryのdurationを0として返すため、
/// durationが0かつ開始時刻と終了時刻が一致するentryは動作中とみなし、
/// `date + start_time`をLocalタイムゾーンでパースして現在時刻までの
/// 経過時間を秒単位に丸めて返す。durationが整数として解釈できない場合は
/// 0秒のentryとして扱い、エラーにはしない。
///
/// # Arguments
///
/// * `entry` - 対象のtime entry
/// * `now` - 現在時刻。純粋関数にするため内部では取得しない
/// * `options` - duration算出方法のオプション
pub fn entry_duration(
    entry: &TimeEntry,
    now: &DateTime<Local>,
    options: &ReconcileOptions,
) -> Result<Duration> {
    // 整数として解釈できないdurationは長さ0のentryとして扱う
    let seconds = match entry.duration.parse::<i64>() {
        Ok(seconds) => seconds,
        Err(_) => return Ok(Duration::zero()),
    };
    if seconds != 0 {
        return Ok(Duration::seconds(seconds));
    }

    let running = entry.start_time == entry.end_time;
    if !running || !options.compute_elapsed {
        // durationが0で開始時刻と終了時刻が異なるentryは長さ0の正当なentry
        return Ok(Duration::seconds(0));
    }

    let started_at = parse_local_timestamp(&format!("{} {}", entry.date, entry.start_time))
        .with_context(|| format!("Failed to parse start time of entry: {}", entry.id))?;

    Ok(round_to_second(*now - started_at))
}

/// 動作中のtimerの経過時間を計算する。
///
/// timerは常に動作中のため、`started_at`をLocalタイムゾーンでパースして
/// 現在時刻までの経過時間を秒単位に丸めて返す。
pub fn timer_duration(timer: &RunningTimer, now: &DateTime<Local>) -> Result<Duration> {
    let started_at = parse_local_timestamp(&timer.started_at)
        .with_context(|| format!("Failed to parse started_at of timer: {}", timer.timer_id))?;

    Ok(round_to_second(*now - started_at))
}

/// 1日分のtime entryのdurationを計算し、合計とともに返す。
///
/// entryの順序は入力のまま保持する。duration0のentryも合計の対象に含める。
/// いずれかのentryのタイムスタンプがパースできない場合は、
/// そのentry以降を処理せずエラーを返す。
pub fn aggregate_daily(
    entries: Vec<TimeEntry>,
    now: &DateTime<Local>,
    options: &ReconcileOptions,
) -> Result<DailyReport> {
    let rows = entries
        .into_iter()
        .map(|entry| {
            let duration = entry_duration(&entry, now, options)?;
            Ok((entry, duration))
        })
        .collect::<Result<Vec<_>>>()?;
    let total = rows
        .iter()
        .fold(Duration::zero(), |acc, (_, duration)| acc + *duration);

    Ok(DailyReport { rows, total })
}

/// 週次APIが返す日付文字列と秒数のマップを、日付昇順のbucket列に変換する。
///
/// 日毎の合計はAPI側で集計済みのため、秒数はそのまま利用する。
/// 出力のbucket数は入力のマップと常に一致する。
pub fn aggregate_weekly(week: HashMap<String, i64>, today: NaiveDate) -> Result<WeekReport> {
    let mut buckets = week
        .into_iter()
        .map(|(date, seconds)| {
            let date = NaiveDate::parse_from_str(&date, "%Y-%m-%d")
                .with_context(|| format!("Failed to parse date in weekly summary: {}", date))?;
            Ok(WeeklyBucket { date, seconds })
        })
        .collect::<Result<Vec<_>>>()?;
    buckets.sort_by_key(|bucket| bucket.date);

    Ok(WeekReport { buckets, today })
}

/// 動作中のtimerの経過時間を計算し、合計とともに返す。
pub fn aggregate_timers(timers: Vec<RunningTimer>, now: &DateTime<Local>) -> Result<TimersReport> {
    let rows = timers
        .into_iter()
        .map(|timer| {
            let duration = timer_duration(&timer, now)?;
            Ok((timer, duration))
        })
        .collect::<Result<Vec<_>>>()?;
    let total = rows
        .iter()
        .fold(Duration::zero(), |acc, (_, duration)| acc + *duration);

    Ok(TimersReport { rows, total })
}

/// durationを`1h30m0s`のような文字列に整形する。
///
/// 1時間未満の場合は`30m0s`、1分未満の場合は`5s`のように上位の単位を省略する。
/// 負のdurationには先頭に`-`を付ける。
pub fn format_duration(duration: &Duration) -> String {
    let total_seconds = duration.num_seconds();
    let sign = if total_seconds < 0 { "-" } else { "" };
    let total_seconds = total_seconds.abs();

    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    if hours > 0 {
        format!("{}{}h{}m{}s", sign, hours, minutes, seconds)
    } else if minutes > 0 {
        format!("{}{}m{}s", sign, minutes, seconds)
    } else {
        format!("{}{}s", sign, seconds)
    }
}

/// durationを最も近い秒に丸める。ちょうど0.5秒の場合は0から遠い方に丸める。
fn round_to_second(duration: Duration) -> Duration {
    let milliseconds = duration.num_milliseconds();
    let seconds = if milliseconds >= 0 {
        (milliseconds + 500) / 1000
    } else {
        -((-milliseconds + 500) / 1000)
    };

    Duration::seconds(seconds)
}
