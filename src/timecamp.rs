use std::{collections::HashMap, env};

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use log::info;
use reqwest::{
    header::{ACCEPT, CONTENT_TYPE},
    Client,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::time_entry::{RunningTimer, TimeEntry};

/// TimeCamp APIのtime entryをデシリアライズするための構造体。
#[derive(Debug, Deserialize)]
struct TimecampTimeEntry {
    id: i64,
    duration: String,
    date: String,
    start_time: String,
    end_time: String,
    name: String,
    color: String,
}

/// TimeCamp APIの動作中timerをデシリアライズするための構造体。
#[derive(Debug, Deserialize)]
struct TimecampRunningTimer {
    timer_id: String,
    started_at: String,
    task_id: Option<String>,
    name: Option<String>,
}

/// timer開始APIのレスポンスをデシリアライズするための構造体。
#[derive(Debug, Deserialize)]
struct StartedTimer {
    entry_id: i64,
}

/// timer停止APIのレスポンス。
#[derive(Debug, Deserialize)]
pub struct StoppedTimer {
    pub elapsed: i64,
    pub entry_id: String,
    pub entry_time: i64,
}

/// timer操作APIのリクエストボディ。
#[derive(Debug, Serialize)]
struct TimerAction {
    action: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    task_id: Option<String>,
}

/// エラーレスポンスをデシリアライズするための構造体。
#[derive(Debug, Deserialize)]
struct ErrorMessage {
    message: String,
}

/// TimeCamp APIへの操作を表すtrait。
///
/// テストでは`MockTimecampRepository`に差し替える。
#[cfg_attr(test, mockall::automock)]
pub trait TimecampRepository {
    /// 指定された期間のtime entryを取得する。
    async fn read_time_entries(&self, from: &NaiveDate, to: &NaiveDate) -> Result<Vec<TimeEntry>>;

    /// 指定された日を含む週の日毎の合計秒数を取得する。
    async fn read_weekly_summary(&self, day: &NaiveDate) -> Result<HashMap<String, i64>>;

    /// 動作中のtimerを取得する。
    async fn read_running_timers(&self) -> Result<Vec<RunningTimer>>;

    /// timerを開始し、作成されたentryのIDを返す。
    async fn start_timer(&self) -> Result<i64>;

    /// timerを停止する。
    ///
    /// # Arguments
    ///
    /// * `timer_id` - 停止するtimerのID。`None`の場合は現在のtimerを停止する
    async fn stop_timer(&self, timer_id: Option<String>) -> Result<StoppedTimer>;
}

/// TimeCamp APIと通信するためのクライアント。
///
/// # Examples
///
/// ```ignore
/// let client = TimecampClient::new().unwrap();
/// let time_entries = client.read_time_entries(&from, &to).await.unwrap();
/// ```
pub struct TimecampClient {
    client: Client,
    api_url: String,
    api_token: String,
}

impl TimecampClient {
    /// 新しい`TimecampClient`を返す。
    ///
    /// 環境変数`TIMECAMP_API_TOKEN`が設定されていない場合はエラーを返す。
    pub fn new() -> Result<Self> {
        let api_token =
            env::var("TIMECAMP_API_TOKEN").context("TIMECAMP_API_TOKEN must be set")?;

        Ok(Self {
            client: Client::new(),
            api_url: "https://app.timecamp.com/third_party/api".to_string(),
            api_token,
        })
    }

    /// timer操作APIにリクエストを送る。
    async fn post_timer_action<T: DeserializeOwned>(&self, action: TimerAction) -> Result<T> {
        let response = self
            .client
            .post(format!("{}/timer", self.api_url))
            .bearer_auth(&self.api_token)
            .header(ACCEPT, "application/json")
            .header(CONTENT_TYPE, "application/json")
            .json(&action)
            .send()
            .await
            .with_context(|| {
                format!("Failed to send request to TimeCamp API at {}", self.api_url)
            })?;

        deserialize_response(response).await
    }
}

impl TimecampRepository for TimecampClient {
    async fn read_time_entries(&self, from: &NaiveDate, to: &NaiveDate) -> Result<Vec<TimeEntry>> {
        let response = self
            .client
            .get(format!("{}/entries", self.api_url))
            .bearer_auth(&self.api_token)
            .header(ACCEPT, "application/json")
            .query(&[
                ("from", from.format("%Y-%m-%d").to_string()),
                ("to", to.format("%Y-%m-%d").to_string()),
            ])
            .send()
            .await
            .with_context(|| {
                format!("Failed to send request to TimeCamp API at {}", self.api_url)
            })?;
        let timecamp_entries: Vec<TimecampTimeEntry> = deserialize_response(response).await?;
        info!("length of time entries: {}", timecamp_entries.len());

        let time_entries = timecamp_entries
            .into_iter()
            .map(|entry| TimeEntry {
                id: entry.id,
                duration: entry.duration,
                date: entry.date,
                start_time: entry.start_time,
                end_time: entry.end_time,
                name: entry.name,
                color: entry.color,
            })
            .collect();

        Ok(time_entries)
    }

    async fn read_weekly_summary(&self, day: &NaiveDate) -> Result<HashMap<String, i64>> {
        let response = self
            .client
            .get(format!("{}/logged_time_in_week", self.api_url))
            .bearer_auth(&self.api_token)
            .header(ACCEPT, "application/json")
            .query(&[("day", day.format("%Y-%m-%d").to_string())])
            .send()
            .await
            .with_context(|| {
                format!("Failed to send request to TimeCamp API at {}", self.api_url)
            })?;

        deserialize_response(response).await
    }

    async fn read_running_timers(&self) -> Result<Vec<RunningTimer>> {
        let response = self
            .client
            .get(format!("{}/timer_running", self.api_url))
            .bearer_auth(&self.api_token)
            .header(ACCEPT, "application/json")
            .send()
            .await
            .with_context(|| {
                format!("Failed to send request to TimeCamp API at {}", self.api_url)
            })?;
        let timecamp_timers: Vec<TimecampRunningTimer> = deserialize_response(response).await?;
        info!("length of running timers: {}", timecamp_timers.len());

        let timers = timecamp_timers
            .into_iter()
            .map(|timer| RunningTimer {
                timer_id: timer.timer_id,
                started_at: timer.started_at,
                task_id: timer.task_id,
                name: timer.name,
            })
            .collect();

        Ok(timers)
    }

    async fn start_timer(&self) -> Result<i64> {
        let started: StartedTimer = self
            .post_timer_action(TimerAction {
                action: "start",
                task_id: None,
            })
            .await?;

        Ok(started.entry_id)
    }

    async fn stop_timer(&self, timer_id: Option<String>) -> Result<StoppedTimer> {
        self.post_timer_action(TimerAction {
            action: "stop",
            task_id: timer_id,
        })
        .await
    }
}

/// レスポンスをデシリアライズする。
///
/// ステータスコードが2xx以外の場合はAPIが返したエラーメッセージを含むエラーを返す。
async fn deserialize_response<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    if !response.status().is_success() {
        let error: ErrorMessage = response
            .json()
            .await
            .context("Failed to deserialize error response")?;
        bail!("TimeCamp API returned an error: {}", error.message);
    }

    response
        .json::<T>()
        .await
        .context("Failed to deserialize response")
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use mockito::Matcher;
    use reqwest::Client;
    use serde_json::json;

    use super::{TimecampClient, TimecampRepository};

    /// mockitoサーバーに向けたテスト用クライアントを作成する。
    fn test_client(server: &mockito::ServerGuard) -> TimecampClient {
        TimecampClient {
            client: Client::new(),
            api_url: server.url(),
            api_token: "test-token".to_string(),
        }
    }

    /// time entryの取得と、利用しないフィールドの無視を確認する。
    #[tokio::test]
    async fn test_read_time_entries() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/entries")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("from".into(), "2024-01-10".into()),
                Matcher::UrlEncoded("to".into(), "2024-01-10".into()),
            ]))
            .match_header("authorization", "Bearer test-token")
            .with_status(200)
            .with_body(
                json!([{
                    "id": 123,
                    "duration": "5400",
                    "user_id": "1",
                    "user_name": "user",
                    "task_id": "42",
                    "last_modify": "2024-01-10 10:30:00",
                    "date": "2024-01-10",
                    "start_time": "09:00:00",
                    "end_time": "10:30:00",
                    "locked": "0",
                    "name": "task",
                    "billable": 0,
                    "color": "#8EB8E5",
                    "description": ""
                }])
                .to_string(),
            )
            .create_async()
            .await;
        let date = NaiveDate::from_ymd_opt(2024, 1, 10).unwrap();

        let entries = test_client(&server)
            .read_time_entries(&date, &date)
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].id, 123);
        assert_eq!(entries[0].duration, "5400");
        assert_eq!(entries[0].start_time, "09:00:00");
        assert_eq!(entries[0].end_time, "10:30:00");
        assert_eq!(entries[0].name, "task");
        assert_eq!(entries[0].color, "#8EB8E5");
    }

    /// エラーレスポンスのメッセージがエラーに含まれることを確認する。
    #[tokio::test]
    async fn test_read_time_entries_api_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/entries")
            .match_query(Matcher::Any)
            .with_status(401)
            .with_body(json!({"message": "Invalid token"}).to_string())
            .create_async()
            .await;
        let date = NaiveDate::from_ymd_opt(2024, 1, 10).unwrap();

        let result = test_client(&server).read_time_entries(&date, &date).await;

        let error = result.unwrap_err();
        assert!(error.to_string().contains("Invalid token"));
    }

    /// 週次サマリの取得を確認する。
    #[tokio::test]
    async fn test_read_weekly_summary() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/logged_time_in_week")
            .match_query(Matcher::UrlEncoded("day".into(), "2024-01-10".into()))
            .with_status(200)
            .with_body(json!({"2024-01-08": 3600, "2024-01-09": 1800}).to_string())
            .create_async()
            .await;
        let day = NaiveDate::from_ymd_opt(2024, 1, 10).unwrap();

        let week = test_client(&server).read_weekly_summary(&day).await.unwrap();

        mock.assert_async().await;
        assert_eq!(week.len(), 2);
        assert_eq!(week.get("2024-01-08"), Some(&3600));
        assert_eq!(week.get("2024-01-09"), Some(&1800));
    }

    /// 動作中timerの取得とnullableフィールドの扱いを確認する。
    #[tokio::test]
    async fn test_read_running_timers() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/timer_running")
            .with_status(200)
            .with_body(
                json!([{
                    "timer_id": "98765",
                    "user_id": "1",
                    "task_id": null,
                    "started_at": "2024-01-10 09:00:00",
                    "name": null
                }])
                .to_string(),
            )
            .create_async()
            .await;

        let timers = test_client(&server).read_running_timers().await.unwrap();

        mock.assert_async().await;
        assert_eq!(timers.len(), 1);
        assert_eq!(timers[0].timer_id, "98765");
        assert_eq!(timers[0].started_at, "2024-01-10 09:00:00");
        assert_eq!(timers[0].task_id, None);
        assert_eq!(timers[0].name, None);
    }

    /// timer開始のリクエストボディとレスポンスの解釈を確認する。
    #[tokio::test]
    async fn test_start_timer() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/timer")
            .match_body(Matcher::Json(json!({"action": "start"})))
            .with_status(200)
            .with_body(json!({"entry_id": 123}).to_string())
            .create_async()
            .await;

        let entry_id = test_client(&server).start_timer().await.unwrap();

        mock.assert_async().await;
        assert_eq!(entry_id, 123);
    }

    /// timer IDなしの停止リクエストを確認する。
    #[tokio::test]
    async fn test_stop_timer() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/timer")
            .match_body(Matcher::Json(json!({"action": "stop"})))
            .with_status(200)
            .with_body(
                json!({"elapsed": 330, "entry_id": "123", "entry_time": 330}).to_string(),
            )
            .create_async()
            .await;

        let stopped = test_client(&server).stop_timer(None).await.unwrap();

        mock.assert_async().await;
        assert_eq!(stopped.elapsed, 330);
        assert_eq!(stopped.entry_id, "123");
    }

    /// timer IDを指定した停止リクエストを確認する。
    #[tokio::test]
    async fn test_stop_timer_with_id() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/timer")
            .match_body(Matcher::Json(json!({"action": "stop", "task_id": "42"})))
            .with_status(200)
            .with_body(
                json!({"elapsed": 330, "entry_id": "123", "entry_time": 330}).to_string(),
            )
            .create_async()
            .await;

        let stopped = test_client(&server)
            .stop_timer(Some("42".to_string()))
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(stopped.elapsed, 330);
    }
}
