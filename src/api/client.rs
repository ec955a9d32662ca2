//! Weather data client
//!
//! Station readings and the forecast are static files published by the
//! collector; flood reports live on the backend API.

use async_trait::async_trait;
use std::sync::Arc;

use super::authenticator::RequestAuthenticator;
use super::error::ClientResult;
use super::schema::{
    FloodHistoryEnvelope, FloodReport, FloodReportRecord, ForecastDay, LenientList, WeatherReading,
};

pub const READINGS_FILE: &str = "registros.json";
pub const FORECAST_FILE: &str = "pronostico_lluvia_queretaro.json";

/// Remote data the screens read from
#[async_trait]
pub trait WeatherSource: Send + Sync {
    /// Station readings, oldest first
    async fn readings(&self) -> ClientResult<Vec<WeatherReading>>;

    /// Per-day rain forecast
    async fn forecast(&self) -> ClientResult<Vec<ForecastDay>>;

    /// Flood reports known to the backend
    async fn flood_history(&self) -> ClientResult<Vec<FloodReportRecord>>;

    /// Submit a new flood report
    async fn report_flood(&self, report: &FloodReport) -> ClientResult<()>;
}

/// HTTP implementation of [`WeatherSource`]
pub struct WeatherApi {
    auth: Arc<RequestAuthenticator>,
    api_base: String,
    data_base: String,
}

impl WeatherApi {
    pub fn new(auth: Arc<RequestAuthenticator>, api_base: &str, data_base: &str) -> Self {
        Self {
            auth,
            api_base: api_base.trim_end_matches('/').to_string(),
            data_base: data_base.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl WeatherSource for WeatherApi {
    async fn readings(&self) -> ClientResult<Vec<WeatherReading>> {
        let url = format!("{}/{}", self.data_base, READINGS_FILE);
        let readings: LenientList<WeatherReading> = self.auth.get_json(&url).await?;
        Ok(readings.into_inner())
    }

    async fn forecast(&self) -> ClientResult<Vec<ForecastDay>> {
        let url = format!("{}/{}", self.data_base, FORECAST_FILE);
        let days: LenientList<ForecastDay> = self.auth.get_json(&url).await?;
        Ok(days.into_inner())
    }

    async fn flood_history(&self) -> ClientResult<Vec<FloodReportRecord>> {
        let url = format!("{}/flood_history", self.api_base);
        let envelope: FloodHistoryEnvelope = self.auth.get_json(&url).await?;
        Ok(envelope.int_data.data.into_inner())
    }

    async fn report_flood(&self, report: &FloodReport) -> ClientResult<()> {
        let url = format!("{}/report_flood", self.api_base);
        tracing::debug!(ubicacion = %report.ubicacion, "Sending flood report");
        self.auth.post_json(&url, report).await
    }
}
