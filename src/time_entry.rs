use chrono::NaiveDate;

/// TimeCampの1件のtime entryを表す構造体。
///
/// `duration`はAPIが文字列でエンコードした秒数をそのまま保持し、
/// 集計時に初めて整数として解釈する。
#[derive(Clone, Debug)]
pub struct TimeEntry {
    pub id: i64,
    pub duration: String,
    pub date: String,
    pub start_time: String,
    pub end_time: String,
    pub name: String,
    pub color: String,
}

/// 現在動作中のtimerを表す構造体。
///
/// 停止していないためdurationフィールドは存在せず、
/// 経過時間は常に`started_at`と現在時刻から導出する。
#[derive(Clone, Debug)]
pub struct RunningTimer {
    pub timer_id: String,
    pub started_at: String,
    pub task_id: Option<String>,
    pub name: Option<String>,
}

/// 週次サマリの1日分の集計値。
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WeeklyBucket {
    pub date: NaiveDate,
    pub seconds: i64,
}
