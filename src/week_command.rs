use anyhow::{Context, Result};
use chrono::Local;
use log::info;

use crate::datetime;
use crate::duration::{aggregate_weekly, WeekReport};
use crate::timecamp::TimecampRepository;

/// `entries week`サブコマンドの引数を表す構造体。
#[derive(Debug, clap::Args)]
pub struct WeekArgs {}

pub struct WeekCommand<'a, T: TimecampRepository> {
    timecamp_client: &'a T,
}

impl<'a, T: TimecampRepository> WeekCommand<'a, T> {
    /// 新しい`WeekCommand`を返す。
    pub fn new(timecamp_client: &'a T) -> Self {
        Self { timecamp_client }
    }

    /// `entries week`サブコマンドの処理を行う。
    ///
    /// Localタイムゾーンの今日を含む週の日毎の合計を取得し、
    /// 日付昇順のbucket列として返す。
    pub async fn run(&self, _args: WeekArgs) -> Result<WeekReport> {
        let today = datetime::now().with_timezone(&Local).date_naive();
        info!("Day: {}", today);

        let week = self
            .timecamp_client
            .read_weekly_summary(&today)
            .await
            .context("Failed to retrieve weekly summary")?;
        info!("Weekly summary retrieved successfully.");

        aggregate_weekly(week, today).context("Failed to build weekly summary")
    }
}
