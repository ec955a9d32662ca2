//! Screens
//!
//! Each screen fetches what it needs on activation, takes the newest entry
//! of the server's ordered sequence as "current", and shapes it into a view
//! model. Fetch failures end here: they are logged and replaced with a
//! placeholder, never passed up.

mod cards;
mod conditions;
mod dashboard;
mod day_detail;
mod format;
mod history;
mod home;
mod login;
mod map;

pub use cards::{dashboard_cards, detail_cards, general_data, GeneralRow, WeatherCard};
pub use conditions::WeatherState;
pub use dashboard::{DashboardHandle, DashboardScreen, DashboardView, LOAD_ERROR, LOADING};
pub use day_detail::{DayDetailScreen, DayDetailView};
pub use format::{capitalize, long_date, month_name, MISSING};
pub use history::{DayRecord, HistoryScreen, HistoryView};
pub use home::{forecast_strip, ForecastTile, HomeScreen, HomeView, TEMP_PLACEHOLDER};
pub use login::{LoginScreen, LoginSubmission};
pub use map::{
    reported_markers, Coordinates, FixedGeolocator, GeolocationError, Geolocator, MapMarker,
    MapScreen, MapSettings, MapView, MarkerId, MarkerKind, ReportOutcome,
};
