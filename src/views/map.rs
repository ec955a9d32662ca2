//! Flood map
//!
//! Markers come from two places: points the user clicks, and reports the
//! backend knows about. Reporting a flood adds an optimistic marker keyed by
//! a correlation id, which is dropped once the server confirms and the
//! reported set is fetched again.

use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Local, NaiveDateTime, Timelike, Utc};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

use super::conditions::WeatherState;
use super::format::{long_date, num};
use super::home::TEMP_PLACEHOLDER;
use crate::api::{FloodReport, FloodReportRecord, WeatherSource};
use crate::config::MapConfig;
use crate::shell::Notifier;

pub const PLACED_TITLE: &str = "Siniestro reportado";
pub const REPORTED_TITLE: &str = "Inundación Reportada";
pub const REPORT_MESSAGE: &str = "Se ha reportado una posible inundación desde el mapa.";
pub const REPORT_SENT: &str = "Reporte enviado.";
pub const REPORT_FAILED: &str = "No se pudo enviar el correo.";

/// Zoom applied when focusing a clicked point
const FOCUS_ZOOM: i32 = 15;
const MIN_ZOOM: i32 = 0;
const MAX_ZOOM: i32 = 21;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// `"GPS: 20.5888, -100.3961"`
    pub fn gps_label(&self) -> String {
        format!("GPS: {:.4}, {:.4}", self.lat, self.lng)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkerKind {
    /// Dropped by a click; survives marker reloads
    UserPlaced,
    /// Flood report, confirmed or pending
    Reported,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkerId {
    Placed(Uuid),
    /// Shown before the backend confirmed the report
    Pending { correlation: Uuid },
    /// Server-side report id
    Confirmed(i64),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapMarker {
    pub id: MarkerId,
    pub position: Coordinates,
    pub title: &'static str,
    pub kind: MarkerKind,
}

// ============ Geolocation ============

#[derive(Debug, Clone, Error, PartialEq)]
pub enum GeolocationError {
    #[error("device position unavailable")]
    Unavailable,

    #[error("geolocation timed out after {0:?}")]
    Timeout(Duration),
}

/// Source of the device position
#[async_trait]
pub trait Geolocator: Send + Sync {
    async fn locate(&self) -> Result<Coordinates, GeolocationError>;
}

/// A position known up front, e.g. from configuration
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedGeolocator(pub Option<Coordinates>);

#[async_trait]
impl Geolocator for FixedGeolocator {
    async fn locate(&self) -> Result<Coordinates, GeolocationError> {
        self.0.ok_or(GeolocationError::Unavailable)
    }
}

// ============ Screen ============

#[derive(Debug, Clone)]
pub struct MapSettings {
    pub center: Coordinates,
    pub zoom: i32,
    /// Location reported when no position is known
    pub location_label: String,
    pub report_window: ChronoDuration,
    pub geolocation_timeout: Duration,
}

impl From<&MapConfig> for MapSettings {
    fn from(config: &MapConfig) -> Self {
        Self {
            center: Coordinates::new(config.center_lat, config.center_lng),
            zoom: config.zoom,
            location_label: config.location_label.clone(),
            report_window: ChronoDuration::hours(config.report_window_hours),
            geolocation_timeout: Duration::from_secs(config.geolocation_timeout_secs),
        }
    }
}

/// Result of a report attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportOutcome {
    Sent,
    Failed,
    /// Another report was still in flight
    Busy,
}

/// Snapshot for rendering
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapView {
    pub center: Coordinates,
    pub zoom: i32,
    pub selected: Option<Coordinates>,
    pub markers: Vec<MapMarker>,
    pub current_date: String,
    pub current_temp: String,
    pub location: String,
    pub description: &'static str,
    pub icon: &'static str,
}

struct MapState {
    center: Coordinates,
    zoom: i32,
    selected: Option<Coordinates>,
    markers: Vec<MapMarker>,
    current_date: String,
    current_temp: String,
    weather: WeatherState,
}

pub struct MapScreen {
    source: Arc<dyn WeatherSource>,
    geolocator: Arc<dyn Geolocator>,
    notifier: Arc<dyn Notifier>,
    settings: MapSettings,
    state: Mutex<MapState>,
    reporting: AtomicBool,
}

/// Clears the in-flight flag however the report ends
struct ReportGuard<'a>(&'a AtomicBool);

impl Drop for ReportGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl MapScreen {
    pub fn new(
        source: Arc<dyn WeatherSource>,
        geolocator: Arc<dyn Geolocator>,
        notifier: Arc<dyn Notifier>,
        settings: MapSettings,
    ) -> Self {
        let state = MapState {
            center: settings.center,
            zoom: settings.zoom,
            selected: None,
            markers: Vec::new(),
            current_date: long_date(Local::now().date_naive()),
            current_temp: TEMP_PLACEHOLDER.to_string(),
            weather: WeatherState::default(),
        };
        Self {
            source,
            geolocator,
            notifier,
            settings,
            state: Mutex::new(state),
            reporting: AtomicBool::new(false),
        }
    }

    fn state(&self) -> MutexGuard<'_, MapState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn view(&self) -> MapView {
        let state = self.state();
        MapView {
            center: state.center,
            zoom: state.zoom,
            selected: state.selected,
            markers: state.markers.clone(),
            current_date: state.current_date.clone(),
            current_temp: state.current_temp.clone(),
            location: self.settings.location_label.clone(),
            description: state.weather.description(),
            icon: state.weather.icon(),
        }
    }

    pub fn markers(&self) -> Vec<MapMarker> {
        self.state().markers.clone()
    }

    pub fn is_reporting(&self) -> bool {
        self.reporting.load(Ordering::SeqCst)
    }

    /// Date, current weather and markers
    pub async fn activate(&self) {
        let now = Local::now();
        self.state().current_date = long_date(now.date_naive());
        tokio::join!(self.load_weather(now.hour()), self.load_markers());
    }

    async fn load_weather(&self, local_hour: u32) {
        match self.source.readings().await {
            Ok(readings) => match readings.last() {
                Some(latest) => {
                    let mut state = self.state();
                    state.current_temp = format!("{} °C", num(latest.temp));
                    state.weather = WeatherState::classify(latest, local_hour);
                }
                None => tracing::warn!("No readings available for the map"),
            },
            Err(e) => tracing::error!("Failed to load readings: {}", e),
        }
    }

    /// Drop a marker at a clicked point and focus it
    pub fn click(&self, lat: f64, lng: f64) -> MarkerId {
        let position = Coordinates::new(lat, lng);
        let id = MarkerId::Placed(Uuid::new_v4());

        let mut state = self.state();
        state.selected = Some(position);
        state.markers.push(MapMarker {
            id,
            position,
            title: PLACED_TITLE,
            kind: MarkerKind::UserPlaced,
        });
        state.center = position;
        state.zoom = FOCUS_ZOOM;
        id
    }

    pub fn zoom_in(&self) -> i32 {
        let mut state = self.state();
        state.zoom = (state.zoom + 1).min(MAX_ZOOM);
        state.zoom
    }

    pub fn zoom_out(&self) -> i32 {
        let mut state = self.state();
        state.zoom = (state.zoom - 1).max(MIN_ZOOM);
        state.zoom
    }

    pub fn recenter(&self) {
        let mut state = self.state();
        state.center = self.settings.center;
        state.zoom = self.settings.zoom;
    }

    /// Keep user-placed markers and replace every reported one with the
    /// server's recent reports. On failure the markers stay as they are.
    pub async fn load_markers(&self) {
        match self.source.flood_history().await {
            Ok(records) => {
                let reported =
                    reported_markers(&records, Utc::now(), self.settings.report_window);
                let mut state = self.state();
                state.markers.retain(|m| m.kind == MarkerKind::UserPlaced);
                tracing::debug!(
                    placed = state.markers.len(),
                    reported = reported.len(),
                    "Markers reconciled"
                );
                state.markers.extend(reported);
            }
            Err(e) => tracing::error!("Failed to load flood reports: {}", e),
        }
    }

    /// Report a flood at the best known position.
    ///
    /// Position is the clicked point if there is one, else the device
    /// position, else the map center labelled with the station name.
    pub async fn report_flood(&self) -> ReportOutcome {
        if self.reporting.swap(true, Ordering::SeqCst) {
            tracing::debug!("Report already in flight, ignoring");
            return ReportOutcome::Busy;
        }
        let _guard = ReportGuard(&self.reporting);

        let selected = self.state().selected;
        let (position, ubicacion) = match selected {
            Some(position) => (position, position.gps_label()),
            None => match self.locate_device().await {
                Ok(position) => (position, position.gps_label()),
                Err(e) => {
                    tracing::warn!("Using map center for report: {}", e);
                    (self.settings.center, self.settings.location_label.clone())
                }
            },
        };

        let correlation = Uuid::new_v4();
        let pending = MarkerId::Pending { correlation };
        let report = {
            let mut state = self.state();
            state.markers.push(MapMarker {
                id: pending,
                position,
                title: REPORTED_TITLE,
                kind: MarkerKind::Reported,
            });
            FloodReport {
                mensaje: REPORT_MESSAGE.to_string(),
                ubicacion,
                fecha: state.current_date.clone(),
                temperatura: state.current_temp.clone(),
                descripcion_clima: state.weather.description().to_string(),
            }
        };

        match self.source.report_flood(&report).await {
            Ok(()) => {
                tracing::info!(%correlation, ubicacion = %report.ubicacion, "Flood report sent");
                self.notifier.alert(REPORT_SENT);
                self.state().markers.retain(|m| m.id != pending);
                self.load_markers().await;
                ReportOutcome::Sent
            }
            Err(e) => {
                tracing::error!(%correlation, "Flood report failed: {}", e);
                self.notifier.alert(REPORT_FAILED);
                ReportOutcome::Failed
            }
        }
    }

    async fn locate_device(&self) -> Result<Coordinates, GeolocationError> {
        let timeout = self.settings.geolocation_timeout;
        tokio::time::timeout(timeout, self.geolocator.locate())
            .await
            .map_err(|_| GeolocationError::Timeout(timeout))?
    }
}

/// Reports with a position created after `now - window`, as markers.
pub fn reported_markers(
    records: &[FloodReportRecord],
    now: DateTime<Utc>,
    window: ChronoDuration,
) -> Vec<MapMarker> {
    let cutoff = now - window;
    records
        .iter()
        .filter(|r| {
            r.created_at
                .as_deref()
                .and_then(parse_created_at)
                .is_some_and(|created| created > cutoff)
        })
        .filter_map(|r| {
            Some(MapMarker {
                id: MarkerId::Confirmed(r.id),
                position: Coordinates::new(r.lat?, r.lng?),
                title: REPORTED_TITLE,
                kind: MarkerKind::Reported,
            })
        })
        .collect()
}

/// RFC 3339, RFC 2822 / HTTP-date, or a zone-less local timestamp
fn parse_created_at(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(value) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .and_then(|naive| naive.and_local_timezone(Local).earliest())
        .map(|local| local.with_timezone(&Utc))
}
