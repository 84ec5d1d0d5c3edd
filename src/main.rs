use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use fern::colors::{Color, ColoredLevelConfig};

mod console;
mod datetime;
mod duration;
mod entries_command;
mod time_entry;
mod timecamp;
mod timers_command;
mod week_command;

use console::{ConsoleEntriesTable, ConsoleTimersList, ConsoleWeekTable};
use entries_command::{EntriesArgs, EntriesCommand, EntriesSubCommands};
use timecamp::TimecampClient;
use timers_command::{TimersArgs, TimersCommand, TimersSubCommands};
use week_command::WeekCommand;

/// TimeCampのtime entryとtimerを操作するCLIアプリケーション。
///
/// # Examples
/// ```
/// $ cargo run -- entries
/// $ cargo run -- entries week
/// $ cargo run -- timers
/// $ cargo run -- timers start
/// $ cargo run -- timers stop
/// ```
#[derive(Debug, Parser)]
#[clap(version, about)]
struct Args {
    #[clap(subcommand)]
    subcommand: SubCommands,
}

/// サブコマンドを表す列挙型。
#[derive(Debug, Subcommand)]
enum SubCommands {
    #[clap(about = "Get today's entries")]
    Entries(EntriesArgs),
    #[clap(about = "Get information about running timers")]
    Timers(TimersArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    setup_logger().context("Failed to initialize logger")?;

    let client = TimecampClient::new().context("Failed to new timecamp client")?;
    let mut stdout = std::io::stdout();

    match args.subcommand {
        SubCommands::Entries(mut entries) => match entries.subcommand.take() {
            Some(EntriesSubCommands::Week(week)) => {
                let report = WeekCommand::new(&client).run(week).await?;
                ConsoleWeekTable::new(&mut stdout).show(&report)?;
            }
            None => {
                let (date, report) = EntriesCommand::new(&client).run(entries).await?;
                ConsoleEntriesTable::new(&mut stdout).show(&date, &report)?;
            }
        },
        SubCommands::Timers(timers) => {
            let command = TimersCommand::new(&client);
            let mut presenter = ConsoleTimersList::new(&mut stdout);
            match timers.subcommand {
                Some(TimersSubCommands::Start) => {
                    let entry_id = command.run_start().await?;
                    presenter.show_started(entry_id)?;
                }
                Some(TimersSubCommands::Stop(stop)) => {
                    let elapsed = command.run_stop(stop).await?;
                    presenter.show_stopped(&elapsed)?;
                }
                None => {
                    let report = command.run_list().await?;
                    presenter.show(&report)?;
                }
            }
        }
    }

    Ok(())
}

/// ログの出力先とフォーマットを設定する。
fn setup_logger() -> Result<()> {
    let colors = ColoredLevelConfig::new()
        .info(Color::Green)
        .warn(Color::Yellow)
        .error(Color::Red);
    fern::Dispatch::new()
        .format(move |out, message, record| {
            out.finish(format_args!(
                "[{} {}] {}",
                colors.color(record.level()),
                record.target(),
                message
            ))
        })
        .level(log::LevelFilter::Info)
        .chain(std::io::stderr())
        .apply()
        .context("Failed to set logger")?;

    Ok(())
}
