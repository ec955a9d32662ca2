//! History listing and CSV download

use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::format::{capitalize, long_date, month_name};
use crate::api::{ClientResult, HistoryDay, HistorySource};
use crate::shell::Notifier;

pub const HISTORY_ERROR: &str = "Error al cargar el historial.";
pub const HISTORY_EMPTY: &str = "Sin registros.";
pub const DOWNLOAD_FAILED: &str = "No se pudo descargar el archivo.";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayRecord {
    /// Position in the source listing, starting at 1
    pub id: usize,
    pub date: NaiveDate,
    pub date_label: String,
    #[serde(skip)]
    pub resource: String,
}

impl DayRecord {
    pub fn day(&self) -> HistoryDay {
        HistoryDay {
            date: self.date,
            resource: self.resource.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct HistoryView {
    pub current_month: String,
    /// Newest first
    pub days: Vec<DayRecord>,
    pub status: Option<String>,
}

impl HistoryView {
    pub fn record(&self, id: usize) -> Option<&DayRecord> {
        self.days.iter().find(|day| day.id == id)
    }
}

pub struct HistoryScreen {
    history: Arc<dyn HistorySource>,
    downloads_dir: PathBuf,
    notifier: Arc<dyn Notifier>,
}

impl HistoryScreen {
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

    pub async fn activate(&self) -> HistoryView {
        let listed = match self.history.days().await {
            Ok(days) => days,
            Err(e) => {
                tracing::error!("Failed to load history index: {}", e);
                return HistoryView {
                    status: Some(HISTORY_ERROR.to_string()),
                    ..Default::default()
                };
            }
        };

        let mut days: Vec<DayRecord> = listed
            .into_iter()
            .enumerate()
            .map(|(i, day)| DayRecord {
                id: i + 1,
                date: day.date,
                date_label: long_date(day.date),
                resource: day.resource,
            })
            .collect();
        days.sort_by(|a, b| b.date.cmp(&a.date));

        let current_month = days
            .first()
            .map(|newest| capitalize(month_name(newest.date.month())))
            .unwrap_or_default();
        let status = days.is_empty().then(|| HISTORY_EMPTY.to_string());

        tracing::debug!(days = days.len(), "History loaded");
        HistoryView {
            current_month,
            days,
            status,
        }
    }

    /// Save the day's CSV; failures are reported to the user, not returned.
    pub async fn download(&self, record: &DayRecord) -> Option<PathBuf> {
        match save_day(self.history.as_ref(), &record.day(), &self.downloads_dir).await {
            Ok(path) => {
                tracing::info!(path = %path.display(), "Downloaded history day");
                Some(path)
            }
            Err(e) => {
                tracing::error!("Failed to download {}: {}", record.resource, e);
                self.notifier.alert(DOWNLOAD_FAILED);
                None
            }
        }
    }
}

/// Write one day as `<dir>/YYYY-MM-DD.csv`
pub(crate) async fn save_day(
    history: &dyn HistorySource,
    day: &HistoryDay,
    dir: &Path,
) -> ClientResult<PathBuf> {
    let bytes = history.csv(day).await?;
    tokio::fs::create_dir_all(dir).await?;
    let path = dir.join(day.file_name());
    tokio::fs::write(&path, bytes).await?;
    Ok(path)
}
