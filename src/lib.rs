//! # Weatheria
//!
//! Client for the Weatheria weather-station dashboard: live conditions, a
//! rain forecast, stored daily history and a map of flood reports, behind a
//! token-authenticated session.
//!
//! ## Features
//!
//! - **Session**: bearer token persisted locally, restored on start, dropped
//!   on expiry or on any 401
//! - **Live data**: latest station reading shaped into cards and tables
//! - **History**: day listing and CSV download from either history backend
//! - **Flood map**: optimistic report markers reconciled with the server
//!
//! ## Modules
//!
//! - [`session`]: Token store and session service
//! - [`api`]: Request authenticator and typed backend calls
//! - [`shell`]: Routes, guarded navigation, alerts
//! - [`views`]: Screens and their view models
//! - [`config`]: TOML configuration with environment overrides
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use weatheria::{App, Config, ConsoleNotifier};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let app = App::new(Config::load_default(), Arc::new(ConsoleNotifier))?;
//!
//!     // Log in, then show the dashboard once
//!     app.login_screen().submit("ana", "secreto").await;
//!     let dashboard = app.dashboard_screen();
//!     dashboard.refresh().await;
//!     println!("{}", dashboard.view().last_update);
//!
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod app;
pub mod config;
pub mod session;
pub mod shell;
pub mod views;

// Re-export top-level types for convenience
pub use app::App;

pub use api::{
    ClientError, ClientResult, FloodReport, FloodReportRecord, ForecastDay, HistoryDay,
    HistorySource, RequestAuthenticator, WeatherApi, WeatherReading, WeatherSource,
};

pub use config::{Config, ConfigError, HistorySourceKind, LoggingConfig};

pub use session::{
    FileTokenStore, LoginOutcome, MemoryTokenStore, SessionError, SessionService, TokenPayload,
    TokenStore,
};

pub use shell::{ConsoleNotifier, Navigator, Notifier, Route, Router};

pub use views::{
    DashboardScreen, DayDetailScreen, HistoryScreen, HomeScreen, LoginScreen, MapScreen,
};
