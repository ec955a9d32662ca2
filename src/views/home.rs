//! Home screen
//!
//! Current temperature and sky state from the latest reading, plus the
//! multi-day rain forecast strip.

use chrono::{Datelike, Local, NaiveDate, NaiveDateTime, Timelike};
use serde::Serialize;
use std::sync::Arc;

use super::conditions::WeatherState;
use super::format::{capitalize, long_date, num, weekday_short, MISSING};
use crate::api::{ForecastDay, WeatherSource, DAY_FORMAT};

/// Temperature shown before (or instead of) a reading
pub const TEMP_PLACEHOLDER: &str = "— °C";

/// One day of the forecast strip
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastTile {
    pub day: String,
    pub icon: &'static str,
    /// Rain probability, e.g. `"80%"`
    pub temp: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HomeView {
    pub current_date: String,
    pub current_temp: String,
    pub location: String,
    #[serde(skip)]
    pub state: WeatherState,
    pub description: &'static str,
    pub icon: &'static str,
    pub forecast: Vec<ForecastTile>,
}

pub struct HomeScreen {
    source: Arc<dyn WeatherSource>,
    location: String,
}

impl HomeScreen {
    pub fn new(source: Arc<dyn WeatherSource>, location: impl Into<String>) -> Self {
        Self {
            source,
            location: location.into(),
        }
    }

    pub async fn activate(&self) -> HomeView {
        self.activate_at(Local::now().naive_local()).await
    }

    /// Build the screen as of the given local time
    pub async fn activate_at(&self, now: NaiveDateTime) -> HomeView {
        let mut state = WeatherState::default();
        let mut current_temp = TEMP_PLACEHOLDER.to_string();

        let (readings, forecast) = tokio::join!(self.source.readings(), self.source.forecast());

        match readings {
            Ok(readings) => match readings.last() {
                Some(latest) => {
                    current_temp = format!("{} °C", num(latest.temp));
                    state = WeatherState::classify(latest, now.hour());
                }
                None => tracing::warn!("No readings available"),
            },
            Err(e) => tracing::error!("Failed to load readings: {}", e),
        }

        let forecast = match forecast {
            Ok(days) => forecast_strip(&days, now.date()),
            Err(e) => {
                tracing::error!("Failed to load forecast: {}", e);
                Vec::new()
            }
        };

        HomeView {
            current_date: long_date(now.date()),
            current_temp,
            location: self.location.clone(),
            state,
            description: state.description(),
            icon: state.icon(),
            forecast,
        }
    }
}

/// Days from `today` on, earliest first. Days with unreadable dates are dropped.
pub fn forecast_strip(days: &[ForecastDay], today: NaiveDate) -> Vec<ForecastTile> {
    let mut valid: Vec<(NaiveDate, &ForecastDay)> = days
        .iter()
        .filter_map(|day| {
            NaiveDate::parse_from_str(day.fecha.trim(), DAY_FORMAT)
                .ok()
                .map(|date| (date, day))
        })
        .filter(|(date, _)| *date >= today)
        .collect();
    valid.sort_by_key(|(date, _)| *date);

    if valid.is_empty() && !days.is_empty() {
        tracing::warn!("No forecast for today or later");
    }

    valid
        .into_iter()
        .map(|(date, day)| ForecastTile {
            day: capitalize(weekday_short(date.weekday())),
            icon: forecast_icon(day),
            temp: day
                .prob_lluvia_api
                .map(|p| format!("{}%", p))
                .unwrap_or_else(|| MISSING.to_string()),
        })
        .collect()
}

fn forecast_icon(day: &ForecastDay) -> &'static str {
    if day.llovera_modelo.is_some_and(|flag| flag.is_set()) {
        return "🌧️";
    }

    let condition = match &day.condicion {
        Some(serde_json::Value::String(s)) => s.to_lowercase(),
        Some(serde_json::Value::Null) | None => String::new(),
        Some(other) => other.to_string().to_lowercase(),
    };

    if condition.contains("sunny") || condition.contains("soleado") {
        "☀️"
    } else {
        "☁️"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::WeatherReading;
    use crate::views::testing::FakeWeather;

    fn forecast_day(fecha: &str, rain: serde_json::Value, condicion: &str, prob: serde_json::Value) -> ForecastDay {
        serde_json::from_value(serde_json::json!({
            "fecha": fecha,
            "llovera_modelo": rain,
            "condicion": condicion,
            "prob_lluvia_api": prob,
        }))
        .unwrap()
    }

    fn noon(date: &str) -> NaiveDateTime {
        NaiveDate::parse_from_str(date, DAY_FORMAT)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_forecast_strip_filters_and_sorts() {
        let days = vec![
            forecast_day("2025-11-12", serde_json::json!(0), "Soleado", serde_json::json!(5)),
            forecast_day("2025-11-09", serde_json::json!(1), "Rain", serde_json::json!(90)),
            forecast_day("2025-11-10", serde_json::json!(true), "Sunny", serde_json::json!(80)),
            forecast_day("not a date", serde_json::json!(0), "", serde_json::json!(1)),
            forecast_day("2025-11-11", serde_json::json!(false), "Cloudy", serde_json::json!(null)),
        ];
        let today = NaiveDate::from_ymd_opt(2025, 11, 10).unwrap();

        let strip = forecast_strip(&days, today);

        assert_eq!(strip.len(), 3);
        assert_eq!(strip[0], ForecastTile { day: "Lun".into(), icon: "🌧️", temp: "80%".into() });
        assert_eq!(strip[1], ForecastTile { day: "Mar".into(), icon: "☁️", temp: "—".into() });
        assert_eq!(strip[2], ForecastTile { day: "Mié".into(), icon: "☀️", temp: "5%".into() });
    }

    #[tokio::test]
    async fn test_current_values_come_from_last_reading() {
        let source = FakeWeather::new().with_readings(vec![
            WeatherReading { temp: Some(10.0), precip_rate: Some(3.0), ..Default::default() },
            WeatherReading { temp: Some(21.5), humidity: Some(80.0), ..Default::default() },
        ]);
        let screen = HomeScreen::new(Arc::new(source), "Estación");

        let view = screen.activate_at(noon("2025-11-10")).await;

        assert_eq!(view.current_temp, "21.5 °C");
        assert_eq!(view.state, WeatherState::Cloudy);
        assert_eq!(view.icon, "🌥️");
        assert_eq!(view.current_date, "lunes, 10 de noviembre de 2025");
        assert_eq!(view.location, "Estación");
    }

    #[tokio::test]
    async fn test_failures_become_placeholders() {
        let source = FakeWeather::new().with_forecast(None);
        let screen = HomeScreen::new(Arc::new(source), "Estación");

        let view = screen.activate_at(noon("2025-11-10")).await;

        assert_eq!(view.current_temp, TEMP_PLACEHOLDER);
        assert_eq!(view.state, WeatherState::Sunny);
        assert!(view.forecast.is_empty());
    }
}
