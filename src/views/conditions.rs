//! Sky condition shown on the home and map screens

use crate::api::WeatherReading;

/// Rain above this rate (mm/h) counts as raining
const RAIN_THRESHOLD: f64 = 0.1;
/// Humidity (%) from which the sky reads as cloudy
const CLOUDY_HUMIDITY: f64 = 75.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WeatherState {
    Night,
    Cloudy,
    Rainy,
    #[default]
    Sunny,
}

impl WeatherState {
    /// Rain beats night, night beats humidity.
    pub fn classify(reading: &WeatherReading, local_hour: u32) -> Self {
        if reading.precip_rate.is_some_and(|rate| rate > RAIN_THRESHOLD) {
            WeatherState::Rainy
        } else if local_hour >= 20 || local_hour < 6 {
            WeatherState::Night
        } else if reading.humidity.is_some_and(|h| h >= CLOUDY_HUMIDITY) {
            WeatherState::Cloudy
        } else {
            WeatherState::Sunny
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            WeatherState::Night => "Noche despejada, sin riesgo de lluvia.",
            WeatherState::Cloudy => "Cielo parcialmente cubierto o neblina matutina.",
            WeatherState::Rainy => "Lluvias moderadas, mantén precaución al conducir.",
            WeatherState::Sunny => "Cielos despejados y temperaturas agradables.",
        }
    }

    pub fn icon(self) -> &'static str {
        match self {
            WeatherState::Night => "🌙",
            WeatherState::Cloudy => "🌥️",
            WeatherState::Rainy => "🌧️",
            WeatherState::Sunny => "☀️",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reading(precip_rate: Option<f64>, humidity: Option<f64>) -> WeatherReading {
        WeatherReading {
            precip_rate,
            humidity,
            ..Default::default()
        }
    }

    #[test]
    fn test_rain_wins_at_night() {
        assert_eq!(WeatherState::classify(&reading(Some(0.5), None), 23), WeatherState::Rainy);
    }

    #[test]
    fn test_night_hours() {
        let dry = reading(Some(0.0), Some(90.0));
        assert_eq!(WeatherState::classify(&dry, 20), WeatherState::Night);
        assert_eq!(WeatherState::classify(&dry, 5), WeatherState::Night);
        assert_eq!(WeatherState::classify(&dry, 6), WeatherState::Cloudy);
    }

    #[test]
    fn test_daytime() {
        assert_eq!(WeatherState::classify(&reading(Some(0.1), Some(40.0)), 12), WeatherState::Sunny);
        assert_eq!(WeatherState::classify(&reading(None, Some(75.0)), 12), WeatherState::Cloudy);
        assert_eq!(WeatherState::classify(&reading(None, None), 12), WeatherState::Sunny);
    }
}
