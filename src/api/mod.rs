//! Weatheria backend client
//!
//! Typed access to everything the client reads or writes remotely. All data
//! calls go through the [`RequestAuthenticator`], which attaches the session
//! token and logs the user out on a 401.
//!
//! # Endpoints
//!
//! ## Backend API
//! - `POST {api}/login` - Exchange credentials for a token
//! - `GET {api}/flood_history` - Flood reports with coordinates
//! - `POST {api}/report_flood` - Send a flood report
//!
//! ## Published data
//! - `GET {data}/registros.json` - Ordered readings, newest last
//! - `GET {data}/pronostico_lluvia_queretaro.json` - Rain forecast by day
//! - `GET {data}/history/index.json` - Stored day files
//! - `GET {data}/history/<YYYY-MM-DD>.csv` - One stored day
//!
//! # Example
//!
//! ```rust,ignore
//! use weatheria::api::{build_http_client, RequestAuthenticator, WeatherApi, WeatherSource};
//! use std::sync::Arc;
//!
//! let http = build_http_client(30)?;
//! let auth = Arc::new(RequestAuthenticator::new(http, session));
//! let api = WeatherApi::new(auth, "http://localhost:5001", "http://localhost:8080");
//! let readings = api.readings().await?;
//! ```

mod authenticator;
mod client;
mod error;
mod history;
pub mod schema;

pub use authenticator::RequestAuthenticator;
pub use client::{WeatherApi, WeatherSource, FORECAST_FILE, READINGS_FILE};
pub use error::{ClientError, ClientResult};
pub use history::{
    parse_day_file, rows_to_csv, HistoryDay, HistorySource, IndexHistory, RemoteHistory,
    DAY_FORMAT,
};
pub use schema::{FloodReport, FloodReportRecord, ForecastDay, WeatherReading};

use reqwest::Client;
use std::time::Duration;

/// Shared HTTP client with the configured request timeout
pub fn build_http_client(timeout_secs: u64) -> ClientResult<Client> {
    let client = Client::builder()
        .timeout(Duration::from_secs(timeout_secs.max(1)))
        .user_agent(concat!("weatheria/", env!("CARGO_PKG_VERSION")))
        .build()?;
    Ok(client)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_http_client() {
        assert!(build_http_client(30).is_ok());
        assert!(build_http_client(0).is_ok());
    }
}
