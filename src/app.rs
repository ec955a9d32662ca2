//! Application wiring
//!
//! Builds the shared services once from [`Config`] and hands out screens
//! bound to them.

use std::sync::Arc;
use std::time::Duration;

use crate::api::{
    build_http_client, ClientResult, HistorySource, IndexHistory, RemoteHistory,
    RequestAuthenticator, WeatherApi, WeatherSource,
};
use crate::config::{Config, HistorySourceKind};
use crate::session::{FileTokenStore, SessionService};
use crate::shell::{Notifier, Route, Router};
use crate::views::{
    Coordinates, DashboardScreen, DayDetailScreen, FixedGeolocator, HistoryScreen, HomeScreen,
    LoginScreen, MapScreen, MapSettings,
};

pub struct App {
    pub config: Config,
    pub router: Arc<Router>,
    pub session: Arc<SessionService>,
    pub auth: Arc<RequestAuthenticator>,
    pub weather: Arc<dyn WeatherSource>,
    pub history: Arc<dyn HistorySource>,
    pub notifier: Arc<dyn Notifier>,
}

impl App {
    pub fn new(config: Config, notifier: Arc<dyn Notifier>) -> ClientResult<Self> {
        let http = build_http_client(config.api.request_timeout_secs)?;
        let router = Arc::new(Router::new());
        let store = Arc::new(FileTokenStore::new(&config.storage.state_dir));

        let session = Arc::new(SessionService::new(
            http.clone(),
            config.api.base_url.clone(),
            store,
            router.clone(),
        ));
        let auth = Arc::new(RequestAuthenticator::new(http, Arc::clone(&session)));

        let weather: Arc<dyn WeatherSource> = Arc::new(WeatherApi::new(
            Arc::clone(&auth),
            &config.api.base_url,
            &config.data.base_url,
        ));

        let history: Arc<dyn HistorySource> = match config.history.source {
            HistorySourceKind::Index => {
                Arc::new(IndexHistory::new(Arc::clone(&auth), &config.data.base_url))
            }
            HistorySourceKind::Remote => {
                Arc::new(RemoteHistory::new(Arc::clone(&auth), &config.history.remote_url))
            }
        };

        tracing::debug!(
            api = %config.api.base_url,
            data = %config.data.base_url,
            history = ?config.history.source,
            "Client wired"
        );

        Ok(Self {
            config,
            router,
            session,
            auth,
            weather,
            history,
            notifier,
        })
    }

    /// Guarded navigation by path
    pub fn open(&self, path: &str) -> Route {
        self.router.open(path, self.session.is_authenticated())
    }

    pub fn login_screen(&self) -> LoginScreen {
        LoginScreen::new(
            Arc::clone(&self.session),
            self.router.clone(),
            Arc::clone(&self.notifier),
        )
    }

    pub fn home_screen(&self) -> HomeScreen {
        HomeScreen::new(Arc::clone(&self.weather), self.config.map.location_label.clone())
    }

    pub fn dashboard_screen(&self) -> Arc<DashboardScreen> {
        Arc::new(DashboardScreen::new(
            Arc::clone(&self.weather),
            Duration::from_secs(self.config.dashboard.refresh_interval_secs),
        ))
    }

    pub fn history_screen(&self) -> HistoryScreen {
        HistoryScreen::new(
            Arc::clone(&self.history),
            &self.config.storage.downloads_dir,
            Arc::clone(&self.notifier),
        )
    }

    pub fn day_detail_screen(&self) -> DayDetailScreen {
        DayDetailScreen::new(
            Arc::clone(&self.history),
            &self.config.storage.downloads_dir,
            Arc::clone(&self.notifier),
        )
    }

    pub fn map_screen(&self) -> MapScreen {
        let map = &self.config.map;
        let device = match (map.device_lat, map.device_lng) {
            (Some(lat), Some(lng)) => Some(Coordinates::new(lat, lng)),
            _ => None,
        };

        MapScreen::new(
            Arc::clone(&self.weather),
            Arc::new(FixedGeolocator(device)),
            Arc::clone(&self.notifier),
            MapSettings::from(map),
        )
    }
}
