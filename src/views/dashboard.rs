//! Live dashboard
//!
//! Polls the readings feed while active. The poller is a tokio task owned by
//! a [`DashboardHandle`]; dropping or deactivating the handle aborts it, so
//! leaving the screen can never leave a timer behind.

use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::cards::{dashboard_cards, general_data, GeneralRow, WeatherCard};
use super::format::MISSING;
use crate::api::WeatherSource;

pub const LOADING: &str = "Cargando...";
pub const LOAD_ERROR: &str = "Error al cargar los datos.";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardView {
    pub last_update: String,
    pub cards: Vec<WeatherCard>,
    pub general: Vec<GeneralRow>,
}

impl Default for DashboardView {
    fn default() -> Self {
        Self {
            last_update: LOADING.to_string(),
            cards: Vec::new(),
            general: Vec::new(),
        }
    }
}

pub struct DashboardScreen {
    source: Arc<dyn WeatherSource>,
    view: watch::Sender<DashboardView>,
    interval: Duration,
}

impl DashboardScreen {
    pub fn new(source: Arc<dyn WeatherSource>, interval: Duration) -> Self {
        let (view, _) = watch::channel(DashboardView::default());
        Self {
            source,
            view,
            interval: interval.max(Duration::from_secs(1)),
        }
    }

    pub fn view(&self) -> DashboardView {
        self.view.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<DashboardView> {
        self.view.subscribe()
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Fetch once. An empty feed leaves the view untouched; a failure only
    /// replaces the status line.
    pub async fn refresh(&self) {
        match self.source.readings().await {
            Ok(readings) => match readings.last() {
                Some(latest) => {
                    let view = DashboardView {
                        last_update: format!(
                            "Última actualización: {}",
                            latest.timestamp.as_deref().unwrap_or(MISSING)
                        ),
                        cards: dashboard_cards(latest),
                        general: general_data(latest),
                    };
                    self.view.send_replace(view);
                }
                None => tracing::warn!("Readings feed is empty"),
            },
            Err(e) => {
                tracing::error!("Failed to refresh dashboard: {}", e);
                self.view
                    .send_modify(|view| view.last_update = LOAD_ERROR.to_string());
            }
        }
    }

    /// Refresh now and then every interval until the handle goes away
    pub fn activate(self: &Arc<Self>) -> DashboardHandle {
        let screen = Arc::clone(self);
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(screen.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                screen.refresh().await;
            }
        });

        tracing::debug!("Dashboard polling every {:?}", self.interval);
        DashboardHandle { task }
    }
}

/// Keeps the poller alive
pub struct DashboardHandle {
    task: JoinHandle<()>,
}

impl DashboardHandle {
    pub fn deactivate(self) {
        tracing::debug!("Dashboard polling stopped");
    }

    pub fn is_active(&self) -> bool {
        !self.task.is_finished()
    }
}

impl Drop for DashboardHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}
