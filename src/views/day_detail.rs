//! One stored day: cards and the general table from its last reading

use chrono::{Local, NaiveDate};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;

use super::cards::{detail_cards, general_data, GeneralRow, WeatherCard};
use super::format::{capitalize, long_date};
use super::history::{save_day, DOWNLOAD_FAILED};
use crate::api::{ClientError, HistoryDay, HistorySource, DAY_FORMAT};
use crate::shell::Notifier;

pub const INVALID_DAY: &str = "Fecha no válida";
pub const NO_RECORDS: &str = "Sin registros para este día.";
pub const DAY_ERROR: &str = "Error al cargar los datos del día.";

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DayDetailView {
    pub date: Option<NaiveDate>,
    pub selected_date: String,
    pub cards: Vec<WeatherCard>,
    pub general: Vec<GeneralRow>,
    pub status: Option<String>,
}

pub struct DayDetailScreen {
    history: Arc<dyn HistorySource>,
    downloads_dir: PathBuf,
    notifier: Arc<dyn Notifier>,
}

impl DayDetailScreen {
    pub fn new(
        history: Arc<dyn HistorySource>,
        downloads_dir: impl Into<PathBuf>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            history,
            downloads_dir: downloads_dir.into(),
            notifier,
        }
    }

    /// `id` is the route parameter; without one the day is today.
    pub async fn activate(&self, id: Option<&str>) -> DayDetailView {
        self.activate_on(id, Local::now().date_naive()).await
    }

    pub async fn activate_on(&self, id: Option<&str>, today: NaiveDate) -> DayDetailView {
        let date = match id {
            None => today,
            Some(id) => match NaiveDate::parse_from_str(id.trim(), DAY_FORMAT) {
                Ok(date) => date,
                Err(_) => {
                    tracing::warn!(id, "Invalid day id");
                    return DayDetailView {
                        selected_date: INVALID_DAY.to_string(),
                        status: Some(INVALID_DAY.to_string()),
                        ..Default::default()
                    };
                }
            },
        };

        let mut view = DayDetailView {
            date: Some(date),
            selected_date: capitalize(&long_date(date)),
            ..Default::default()
        };

        match self.history.readings(date).await {
            Ok(readings) => match readings.last() {
                Some(latest) => {
                    view.cards = detail_cards(latest);
                    view.general = general_data(latest);
                }
                None => view.status = Some(NO_RECORDS.to_string()),
            },
            Err(ClientError::NotFound(_)) => {
                tracing::debug!(%date, "No history stored for day");
                view.status = Some(NO_RECORDS.to_string());
            }
            Err(e) => {
                tracing::error!("Failed to load day {}: {}", date, e);
                view.status = Some(DAY_ERROR.to_string());
            }
        }

        view
    }

    pub async fn download(&self, date: NaiveDate) -> Option<PathBuf> {
        let day = HistoryDay {
            date,
            resource: format!("{}.csv", date.format(DAY_FORMAT)),
        };
        match save_day(self.history.as_ref(), &day, &self.downloads_dir).await {
            Ok(path) => {
                tracing::info!(path = %path.display(), "Downloaded day detail");
                Some(path)
            }
            Err(e) => {
                tracing::error!("Failed to download {}: {}", date, e);
                self.notifier.alert(DOWNLOAD_FAILED);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::WeatherReading;
    use crate::shell::testing::RecordingNotifier;
    use crate::views::testing::FakeHistory;
    use tempfile::TempDir;

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, DAY_FORMAT).unwrap()
    }

    fn history_with_day() -> FakeHistory {
        let mut history = FakeHistory::with_days(&["2025-09-21"]);
        history.readings.insert(
            day("2025-09-21"),
            vec![
                WeatherReading { temp: Some(11.0), ..Default::default() },
                WeatherReading {
                    temp: Some(19.0),
                    pressure: Some(1008.32),
                    precip_rate: Some(2.5),
                    ..Default::default()
                },
            ],
        );
        history
    }

    fn build_screen(history: FakeHistory, dir: &TempDir) -> (DayDetailScreen, Arc<RecordingNotifier>) {
        let notifier = Arc::new(RecordingNotifier::default());
        let screen = DayDetailScreen::new(Arc::new(history), dir.path(), notifier.clone());
        (screen, notifier)
    }

    #[tokio::test]
    async fn test_cards_from_last_row() {
        let dir = TempDir::new().unwrap();
        let (screen, _) = build_screen(history_with_day(), &dir);

        let view = screen.activate_on(Some("2025-09-21"), day("2025-11-10")).await;

        assert_eq!(view.selected_date, "Domingo, 21 de septiembre de 2025");
        assert_eq!(view.cards[0].main_value.as_deref(), Some("19°C"));
        assert_eq!(view.cards[1].main_value.as_deref(), Some("2.5 mm/h"));
        assert_eq!(view.general.len(), 10);
        assert_eq!(view.status, None);
    }

    #[tokio::test]
    async fn test_without_id_uses_today() {
        let dir = TempDir::new().unwrap();
        let (screen, _) = build_screen(history_with_day(), &dir);

        let view = screen.activate_on(None, day("2025-09-21")).await;

        assert_eq!(view.date, Some(day("2025-09-21")));
        assert_eq!(view.cards.len(), 4);
    }

    #[tokio::test]
    async fn test_placeholders() {
        let dir = TempDir::new().unwrap();
        let (screen, _) = build_screen(history_with_day(), &dir);
        let today = day("2025-11-10");

        let invalid = screen.activate_on(Some("yesterday"), today).await;
        assert_eq!(invalid.status.as_deref(), Some(INVALID_DAY));
        assert!(invalid.cards.is_empty());

        let unknown = screen.activate_on(Some("2025-01-01"), today).await;
        assert_eq!(unknown.status.as_deref(), Some(NO_RECORDS));

        let mut broken = history_with_day();
        broken.broken = true;
        let (screen, _) = build_screen(broken, &dir);
        let failed = screen.activate_on(Some("2025-09-21"), today).await;
        assert_eq!(failed.status.as_deref(), Some(DAY_ERROR));
    }

    #[tokio::test]
    async fn test_download() {
        let dir = TempDir::new().unwrap();
        let (screen, notifier) = build_screen(history_with_day(), &dir);

        let path = screen.download(day("2025-09-21")).await.unwrap();
        assert_eq!(path.file_name().unwrap(), "2025-09-21.csv");
        assert!(notifier.messages().is_empty());
    }
}
