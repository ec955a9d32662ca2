//! History sources
//!
//! Past days come either from the collector's `history/` directory (an
//! `index.json` listing one CSV per day) or from a realtime database holding
//! a map of dates to rows. Both resolve a day to readings or CSV bytes only
//! when asked.

use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Arc, Mutex};

use super::authenticator::RequestAuthenticator;
use super::error::{ClientError, ClientResult};
use super::schema::{HistoryIndex, HistoryRow, WeatherReading};

/// Date format of history keys and file names
pub const DAY_FORMAT: &str = "%Y-%m-%d";

/// Reference to one stored day; the data itself is fetched on demand
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryDay {
    pub date: NaiveDate,
    /// File name or key the day is stored under
    pub resource: String,
}

impl HistoryDay {
    /// Name used when the day is saved locally
    pub fn file_name(&self) -> String {
        format!("{}.csv", self.date.format(DAY_FORMAT))
    }
}

#[async_trait]
pub trait HistorySource: Send + Sync {
    /// Every stored day, in source order
    async fn days(&self) -> ClientResult<Vec<HistoryDay>>;

    /// Readings of one day, oldest first
    async fn readings(&self, date: NaiveDate) -> ClientResult<Vec<WeatherReading>>;

    /// The day as a CSV document, fetched from the resource it was listed under
    async fn csv(&self, day: &HistoryDay) -> ClientResult<Vec<u8>>;
}

/// `2025-11-10.csv` → 2025-11-10
pub fn parse_day_file(filename: &str) -> Option<NaiveDate> {
    let stem = filename.strip_suffix(".csv")?;
    NaiveDate::parse_from_str(stem, DAY_FORMAT).ok()
}

// ============ Index of CSV files ============

/// Reads `history/index.json` and the CSV files it lists
pub struct IndexHistory {
    auth: Arc<RequestAuthenticator>,
    base_url: String,
    /// File names from the last listing, by date
    listed: Mutex<HashMap<NaiveDate, String>>,
}

impl IndexHistory {
    /// `data_base` is the directory containing `history/`
    pub fn new(auth: Arc<RequestAuthenticator>, data_base: &str) -> Self {
        Self {
            auth,
            base_url: format!("{}/history", data_base.trim_end_matches('/')),
            listed: Mutex::new(HashMap::new()),
        }
    }

    fn file_url(&self, name: &str) -> String {
        format!("{}/{}", self.base_url, urlencoding::encode(name))
    }

    /// Listed file name for a date, or `YYYY-MM-DD.csv` if it was never listed
    fn resource_for(&self, date: NaiveDate) -> String {
        let listed = self.listed.lock().unwrap_or_else(|p| p.into_inner());
        listed
            .get(&date)
            .cloned()
            .unwrap_or_else(|| format!("{}.csv", date.format(DAY_FORMAT)))
    }
}

#[async_trait]
impl HistorySource for IndexHistory {
    async fn days(&self) -> ClientResult<Vec<HistoryDay>> {
        let url = format!("{}/index.json", self.base_url);
        let index: HistoryIndex = self.auth.get_json(&url).await?;
        let files = index.files.ok_or_else(|| {
            ClientError::Malformed("index.json does not contain a list of files".into())
        })?;

        let days = files
            .into_iter()
            .filter(|f| f.ends_with(".csv"))
            .filter_map(|resource| match parse_day_file(&resource) {
                Some(date) => Some(HistoryDay { date, resource }),
                None => {
                    tracing::warn!(file = %resource, "Skipping history file without a date name");
                    None
                }
            })
            .collect::<Vec<HistoryDay>>();

        let mut listed = self.listed.lock().unwrap_or_else(|p| p.into_inner());
        listed.clear();
        listed.extend(days.iter().map(|d| (d.date, d.resource.clone())));
        drop(listed);

        Ok(days)
    }

    async fn readings(&self, date: NaiveDate) -> ClientResult<Vec<WeatherReading>> {
        let url = self.file_url(&self.resource_for(date));
        let bytes = self.auth.get_bytes(&url).await?;
        let mut reader = csv::Reader::from_reader(bytes.as_slice());
        let readings = reader.deserialize().collect::<Result<Vec<WeatherReading>, _>>()?;
        Ok(readings)
    }

    async fn csv(&self, day: &HistoryDay) -> ClientResult<Vec<u8>> {
        self.auth.get_bytes(&self.file_url(&day.resource)).await
    }
}

// ============ Remote keyed map ============

/// Reads `<url>.json` (all days) and `<url>/<day>.json` (one day)
pub struct RemoteHistory {
    auth: Arc<RequestAuthenticator>,
    url: String,
}

impl RemoteHistory {
    pub fn new(auth: Arc<RequestAuthenticator>, url: &str) -> Self {
        Self {
            auth,
            url: url.trim_end_matches('/').to_string(),
        }
    }

    async fn rows(&self, key: &str) -> ClientResult<Vec<HistoryRow>> {
        let url = format!("{}/{}.json", self.url, urlencoding::encode(key));
        // The database answers `null` for missing keys
        let rows: Option<Vec<HistoryRow>> = self.auth.get_json(&url).await?;
        rows.ok_or_else(|| ClientError::NotFound(key.to_string()))
    }
}

#[async_trait]
impl HistorySource for RemoteHistory {
    async fn days(&self) -> ClientResult<Vec<HistoryDay>> {
        let url = format!("{}.json", self.url);
        let map: Option<BTreeMap<String, serde_json::Value>> = self.auth.get_json(&url).await?;

        let days = map
            .unwrap_or_default()
            .into_keys()
            .filter_map(|key| match NaiveDate::parse_from_str(&key, DAY_FORMAT) {
                Ok(date) => Some(HistoryDay { date, resource: key }),
                Err(_) => {
                    tracing::warn!(%key, "Skipping history key that is not a date");
                    None
                }
            })
            .collect();

        Ok(days)
    }

    async fn readings(&self, date: NaiveDate) -> ClientResult<Vec<WeatherReading>> {
        self.rows(&date.format(DAY_FORMAT).to_string())
            .await?
            .into_iter()
            .map(|row| {
                let object = serde_json::Map::from_iter(row);
                serde_json::from_value(serde_json::Value::Object(object)).map_err(ClientError::from)
            })
            .collect()
    }

    async fn csv(&self, day: &HistoryDay) -> ClientResult<Vec<u8>> {
        rows_to_csv(&self.rows(&day.resource).await?)
    }
}

/// Export rows as CSV. Columns are the sorted union of all row keys, so rows
/// with missing fields still line up.
pub fn rows_to_csv(rows: &[HistoryRow]) -> ClientResult<Vec<u8>> {
    let columns: BTreeSet<&str> = rows
        .iter()
        .flat_map(|row| row.keys().map(String::as_str))
        .collect();

    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(&columns)?;

    for row in rows {
        let record: Vec<String> = columns
            .iter()
            .map(|col| match row.get(*col) {
                None | Some(serde_json::Value::Null) => String::new(),
                Some(serde_json::Value::String(s)) => s.clone(),
                Some(other) => other.to_string(),
            })
            .collect();
        writer.write_record(&record)?;
    }

    writer
        .into_inner()
        .map_err(|e| ClientError::Io(e.into_error()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{MemoryTokenStore, SessionService};
    use crate::shell::Router;
    use reqwest::Client;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn auth(server: &MockServer) -> Arc<RequestAuthenticator> {
        let session = Arc::new(SessionService::new(
            Client::new(),
            server.uri(),
            Arc::new(MemoryTokenStore::new()),
            Arc::new(Router::new()),
        ));
        Arc::new(RequestAuthenticator::new(Client::new(), session))
    }

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, DAY_FORMAT).unwrap()
    }

    #[test]
    fn test_parse_day_file() {
        assert_eq!(parse_day_file("2025-11-10.csv"), Some(day("2025-11-10")));
        assert_eq!(parse_day_file("2025-11-10.json"), None);
        assert_eq!(parse_day_file("notes.csv"), None);
    }

    #[test]
    fn test_rows_to_csv_sorted_union() {
        let rows: Vec<HistoryRow> = serde_json::from_str(
            r#"[{"temp": 19.5, "timestamp": "2025-11-10 10:00:00"},
                {"humidity": 40, "temp": null, "timestamp": "2025-11-10 10:15:00"}]"#,
        )
        .unwrap();

        let csv = String::from_utf8(rows_to_csv(&rows).unwrap()).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "humidity,temp,timestamp");
        assert_eq!(lines[1], ",19.5,2025-11-10 10:00:00");
        assert_eq!(lines[2], "40,,2025-11-10 10:15:00");
    }

    #[tokio::test]
    async fn test_index_history() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/history/index.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "files": ["2025-11-09.csv", "README.md", "2025-11-10.csv", "bad.csv"]
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/history/2025-11-10.csv"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                "temp,timestamp\n18,2025-11-10 10:00:00\n19.5,2025-11-10 10:15:00\n",
            ))
            .mount(&server)
            .await;

        let history = IndexHistory::new(auth(&server), &server.uri());
        let days = history.days().await.unwrap();
        assert_eq!(
            days,
            vec![
                HistoryDay { date: day("2025-11-09"), resource: "2025-11-09.csv".into() },
                HistoryDay { date: day("2025-11-10"), resource: "2025-11-10.csv".into() },
            ]
        );

        let readings = history.readings(day("2025-11-10")).await.unwrap();
        assert_eq!(readings.len(), 2);
        assert_eq!(readings[1].temp, Some(19.5));
    }

    #[tokio::test]
    async fn test_index_fetches_files_as_listed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/history/index.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "files": ["2025-1-5.csv"]
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/history/2025-1-5.csv"))
            .respond_with(
                ResponseTemplate::new(200).set_body_string("temp,timestamp\n12,2025-01-05 08:00:00\n"),
            )
            .expect(2)
            .mount(&server)
            .await;

        let history = IndexHistory::new(auth(&server), &server.uri());
        let days = history.days().await.unwrap();
        assert_eq!(days[0].date, day("2025-01-05"));
        assert_eq!(days[0].file_name(), "2025-01-05.csv");

        let csv = history.csv(&days[0]).await.unwrap();
        assert!(String::from_utf8(csv).unwrap().contains("2025-01-05 08:00:00"));

        let readings = history.readings(day("2025-01-05")).await.unwrap();
        assert_eq!(readings[0].temp, Some(12.0));
    }

    #[tokio::test]
    async fn test_index_without_files_is_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/history/index.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .mount(&server)
            .await;

        let history = IndexHistory::new(auth(&server), &server.uri());
        assert!(matches!(history.days().await, Err(ClientError::Malformed(_))));
    }

    #[tokio::test]
    async fn test_remote_history() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/historial.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "2025-11-10": [], "2025-11-08": [], "-Nxyz": []
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/historial/2025-11-10.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {"temp": 17, "timestamp": "2025-11-10 09:00:00"}
            ])))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/historial/2025-11-11.json"))
            .respond_with(ResponseTemplate::new(200).set_body_string("null"))
            .mount(&server)
            .await;

        let history = RemoteHistory::new(auth(&server), &format!("{}/historial", server.uri()));
        let days = history.days().await.unwrap();
        assert_eq!(days.len(), 2);
        assert_eq!(days[0].date, day("2025-11-08"));

        let readings = history.readings(day("2025-11-10")).await.unwrap();
        assert_eq!(readings[0].temp, Some(17.0));

        let csv = history.csv(&days[1]).await.unwrap();
        assert!(String::from_utf8(csv).unwrap().starts_with("temp,timestamp"));

        assert!(matches!(
            history.readings(day("2025-11-11")).await,
            Err(ClientError::NotFound(_))
        ));
    }
}
