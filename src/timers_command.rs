use anyhow::{Context, Result};
use chrono::{Duration, Local};
use log::info;

use crate::datetime;
use crate::duration::{aggregate_timers, TimersReport};
use crate::timecamp::TimecampRepository;

/// `timers`サブコマンドの引数を表す構造体。
#[derive(Debug, clap::Args)]
pub struct TimersArgs {
    #[clap(subcommand)]
    pub subcommand: Option<TimersSubCommands>,
}

/// `timers`のサブコマンドを表す列挙型。
#[derive(Debug, clap::Subcommand)]
pub enum TimersSubCommands {
    #[clap(about = "Start a timer")]
    Start,
    #[clap(about = "Stop a timer")]
    Stop(StopArgs),
}

/// `timers stop`サブコマンドの引数を表す構造体。
#[derive(Debug, clap::Args)]
pub struct StopArgs {
    #[clap(short = 'i', long = "id", help = "Timer ID")]
    id: Option<String>,
}

pub struct TimersCommand<'a, T: TimecampRepository> {
    timecamp_client: &'a T,
}

impl<'a, T: TimecampRepository> TimersCommand<'a, T> {
    /// 新しい`TimersCommand`を返す。
    pub fn new(timecamp_client: &'a T) -> Self {
        Self { timecamp_client }
    }

    /// 動作中のtimerを取得し、経過時間を集計して返す。
    pub async fn run_list(&self) -> Result<TimersReport> {
        let now = datetime::now().with_timezone(&Local);

        let timers = self
            .timecamp_client
            .read_running_timers()
            .await
            .context("Failed to retrieve running timers")?;
        info!("Running timers retrieved successfully.");

        aggregate_timers(timers, &now).context("Failed to calculate elapsed times")
    }

    /// timerを開始し、作成されたentryのIDを返す。
    pub async fn run_start(&self) -> Result<i64> {
        let entry_id = self
            .timecamp_client
            .start_timer()
            .await
            .context("Failed to start timer")?;
        info!("Timer started: entry {}", entry_id);

        Ok(entry_id)
    }

    /// timerを停止し、経過時間を返す。
    ///
    /// # Arguments
    ///
    /// * `args` - 停止するtimerのIDを含む引数
    pub async fn run_stop(&self, args: StopArgs) -> Result<Duration> {
        let stopped = self
            .timecamp_client
            .stop_timer(args.id)
            .await
            .context("Failed to stop timer")?;
        info!("Timer stopped: entry {}", stopped.entry_id);

        Ok(Duration::seconds(stopped.elapsed))
    }
}
