use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use log::info;

use crate::datetime;
use crate::duration::{aggregate_daily, DailyReport, ReconcileOptions};
use crate::timecamp::TimecampRepository;
use crate::week_command::WeekArgs;

/// `entries`サブコマンドの引数を表す構造体。
#[derive(Debug, clap::Args)]
pub struct EntriesArgs {
    #[clap(subcommand)]
    pub subcommand: Option<EntriesSubCommands>,

    #[clap(
        long = "from",
        help = "Sets a custom date in the format YYYY-MM-DD",
        parse(try_from_str = datetime::parse_date),
    )]
    from: Option<NaiveDate>,
}

/// `entries`のサブコマンドを表す列挙型。
#[derive(Debug, clap::Subcommand)]
pub enum EntriesSubCommands {
    #[clap(about = "Get entries for this week")]
    Week(WeekArgs),
}

pub struct EntriesCommand<'a, T: TimecampRepository> {
    timecamp_client: &'a T,
}

impl<'a, T: TimecampRepository> EntriesCommand<'a, T> {
    /// 新しい`EntriesCommand`を返す。
    ///
    /// # Arguments
    /// * `timecamp_client` - TimeCamp APIと通信するためのリポジトリ
    pub fn new(timecamp_client: &'a T) -> Self {
        Self { timecamp_client }
    }

    /// `entries`サブコマンドの処理を行う。
    ///
    /// Localタイムゾーンで指定された日付のtime entryを取得し、durationを集計して返す。
    /// 日付が指定されていない場合は、Localタイムゾーンで現在の日付を利用する。
    ///
    /// # Arguments
    ///
    /// * `args` - `entries`サブコマンドの引数
    pub async fn run(&self, args: EntriesArgs) -> Result<(NaiveDate, DailyReport)> {
        let now = datetime::now().with_timezone(&Local);
        let date = args.from.unwrap_or_else(|| now.date_naive());
        info!("From: {}, To: {}", date, date);

        let time_entries = self
            .timecamp_client
            .read_time_entries(&date, &date)
            .await
            .context("Failed to retrieve time entries")?;
        info!("Time entries retrieved successfully.");

        let report = aggregate_daily(time_entries, &now, &ReconcileOptions::default())
            .context("Failed to calculate durations")?;

        Ok((date, report))
    }
}
