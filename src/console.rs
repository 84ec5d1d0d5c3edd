use std::io::Write;

use anyhow::{Context, Result};
use chrono::{Duration, NaiveDate};
use colored::Colorize;
use prettytable::{
    format::{Alignment, FormatBuilder, LinePosition, LineSeparator, TableFormat},
    Cell, Row, Table,
};

use crate::duration::{format_duration, DailyReport, TimersReport, WeekReport};

// 元のTimeCamp Webアプリに合わせた配色
const BLUE: (u8, u8, u8) = (0x8E, 0xB8, 0xE5);
const EMERALD: (u8, u8, u8) = (0x23, 0xCE, 0x6B);
const GRAY: (u8, u8, u8) = (0x61, 0x70, 0x7D);

/// 1日分のtime entryをテーブル形式で表示する。
pub struct ConsoleEntriesTable<'a, W: Write> {
    writer: &'a mut W,
}

impl<'a, W: Write> ConsoleEntriesTable<'a, W> {
    /// 新しい`ConsoleEntriesTable`を返す。
    pub fn new(writer: &'a mut W) -> Self {
        Self { writer }
    }

    /// 日付の見出しとentryのテーブル、合計durationを表示する。
    ///
    /// entryはreportが保持する順序のまま表示する。
    pub fn show(&mut self, date: &NaiveDate, report: &DailyReport) -> Result<()> {
        let heading = date.format("%A, %B %d, %Y").to_string();
        writeln!(
            self.writer,
            " {}",
            heading.truecolor(BLUE.0, BLUE.1, BLUE.2).bold()
        )
        .context("Failed to write heading")?;

        let mut table = Table::new();
        table.set_format(table_format());
        table.set_titles(Row::new(vec![
            header_cell("Entry ID"),
            header_cell("Task"),
            header_cell("From"),
            header_cell("To"),
            header_cell("Duration"),
        ]));
        for (entry, duration) in &report.rows {
            table.add_row(Row::new(vec![
                Cell::new(&entry.id.to_string()),
                Cell::new(&task_cell_content(&entry.name, &entry.color)),
                Cell::new(&entry.start_time),
                Cell::new(&entry.end_time),
                Cell::new_align(&format_duration(duration).bold().to_string(), Alignment::RIGHT),
            ]));
        }

        let width = write_table(self.writer, &table)?;
        let total = format!("Total {}", format_duration(&report.total));
        let padding = width.saturating_sub(total.chars().count());
        writeln!(self.writer, "{}{}", " ".repeat(padding), total.bold())
            .context("Failed to write total duration")?;

        Ok(())
    }
}

/// 1週間分の日毎の合計をテーブル形式で表示する。
pub struct ConsoleWeekTable<'a, W: Write> {
    writer: &'a mut W,
}

impl<'a, W: Write> ConsoleWeekTable<'a, W> {
    /// 新しい`ConsoleWeekTable`を返す。
    pub fn new(writer: &'a mut W) -> Self {
        Self { writer }
    }

    /// 日付を列見出し、durationを1行に持つテーブルを表示する。
    ///
    /// 今日の列見出しは強調し、duration0のセルは薄い色で表示する。
    pub fn show(&mut self, report: &WeekReport) -> Result<()> {
        let mut table = Table::new();
        table.set_format(table_format());

        let titles = report
            .buckets
            .iter()
            .map(|bucket| {
                let label = bucket.date.format("%a, %d %b").to_string();
                let label = if bucket.date == report.today {
                    label
                        .truecolor(EMERALD.0, EMERALD.1, EMERALD.2)
                        .bold()
                        .to_string()
                } else {
                    label.truecolor(BLUE.0, BLUE.1, BLUE.2).bold().to_string()
                };
                Cell::new_align(&label, Alignment::CENTER)
            })
            .collect();
        table.set_titles(Row::new(titles));

        let durations = report
            .buckets
            .iter()
            .map(|bucket| {
                let formatted = format_duration(&Duration::seconds(bucket.seconds));
                let formatted = if bucket.seconds == 0 {
                    formatted.truecolor(GRAY.0, GRAY.1, GRAY.2).to_string()
                } else {
                    formatted
                };
                Cell::new(&formatted)
            })
            .collect();
        table.add_row(Row::new(durations));

        write_table(self.writer, &table)?;

        Ok(())
    }
}

/// 動作中のtimerとtimer操作の結果を表示する。
pub struct ConsoleTimersList<'a, W: Write> {
    writer: &'a mut W,
}

impl<'a, W: Write> ConsoleTimersList<'a, W> {
    /// 新しい`ConsoleTimersList`を返す。
    pub fn new(writer: &'a mut W) -> Self {
        Self { writer }
    }

    /// 動作中のtimerの一覧と経過時間の合計を表示する。
    pub fn show(&mut self, report: &TimersReport) -> Result<()> {
        for (timer, duration) in &report.rows {
            writeln!(self.writer, "Timer ID: {}", timer.timer_id)
                .context("Failed to write timer")?;
            writeln!(self.writer, "Started At: {}", timer.started_at)
                .context("Failed to write timer")?;
            writeln!(self.writer, "{}", format_duration(duration))
                .context("Failed to write timer")?;

            if report.rows.len() > 1 {
                writeln!(self.writer, "---").context("Failed to write timer")?;
            }
        }

        writeln!(
            self.writer,
            "{}",
            format!("Total: {}", format_duration(&report.total)).bold()
        )
        .context("Failed to write total duration")?;

        Ok(())
    }

    /// timer開始で作成されたentryのIDを表示する。
    pub fn show_started(&mut self, entry_id: i64) -> Result<()> {
        writeln!(self.writer, "Entry ID: {}", entry_id).context("Failed to write entry ID")
    }

    /// 停止したtimerの経過時間を表示する。
    pub fn show_stopped(&mut self, elapsed: &Duration) -> Result<()> {
        writeln!(self.writer, "Stopped timer: {}", format_duration(elapsed))
            .context("Failed to write stopped timer")
    }
}

/// 列見出しのセルを作成する。
fn header_cell(label: &str) -> Cell {
    Cell::new_align(
        &label.truecolor(BLUE.0, BLUE.1, BLUE.2).bold().to_string(),
        Alignment::CENTER,
    )
}

/// タスク名のセルの内容を作成する。APIが返した色が`#rrggbb`形式の場合に適用する。
fn task_cell_content(name: &str, color: &str) -> String {
    match parse_hex_color(color) {
        Some((r, g, b)) => name.truecolor(r, g, b).to_string(),
        None => name.to_string(),
    }
}

/// `#rrggbb`形式の色文字列をRGBに変換する。
fn parse_hex_color(color: &str) -> Option<(u8, u8, u8)> {
    let hex = color.strip_prefix('#')?;
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }
    let red = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let green = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let blue = u8::from_str_radix(&hex[4..6], 16).ok()?;

    Some((red, green, blue))
}

/// テーブルをwriterに書き込み、テーブルの幅を返す。
fn write_table<W: Write>(writer: &mut W, table: &Table) -> Result<usize> {
    let mut buffer = Vec::new();
    table
        .print(&mut buffer)
        .context("Failed to render table")?;
    let rendered = String::from_utf8(buffer).context("Table is not valid UTF-8")?;
    let width = rendered
        .lines()
        .next()
        .map(|line| line.chars().count())
        .unwrap_or(0);
    writer
        .write_all(rendered.as_bytes())
        .context("Failed to write table")?;

    Ok(width)
}

/// 枠線ありヘッダー区切りありのテーブルフォーマットを作成する。
fn table_format() -> TableFormat {
    FormatBuilder::new()
        .column_separator('|')
        .borders('|')
        .separators(
            &[
                LinePosition::Top,
                LinePosition::Title,
                LinePosition::Bottom,
            ],
            LineSeparator::new('-', '+', '+', '+'),
        )
        .padding(1, 1)
        .build()
}
