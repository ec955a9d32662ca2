//! Reading cards and the general-data table
//!
//! Shared by the dashboard (live reading) and the day detail (last reading of
//! a stored day).

use serde::Serialize;

use super::format::num;
use crate::api::WeatherReading;

/// One of the four headline cards
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeatherCard {
    pub icon: &'static str,
    pub title: String,
    /// Big number; only the day detail shows one
    pub main_value: Option<String>,
    pub details: Vec<String>,
    pub color: &'static str,
}

/// Row of the general-data table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeneralRow {
    pub label: &'static str,
    pub value: String,
}

fn is_raining(reading: &WeatherReading) -> bool {
    reading.precip_rate.is_some_and(|rate| rate > 0.0)
}

fn precipitation_details(reading: &WeatherReading) -> Vec<String> {
    let raining = is_raining(reading);
    vec![
        format!("Acumulado hoy: {} mm", num(reading.precip_total)),
        format!("Probabilidad: {}%", if raining { 80 } else { 10 }),
        format!("Tipo: {}", if raining { "Lluvia ligera" } else { "Sin lluvia" }),
    ]
}

fn temperature_details(reading: &WeatherReading) -> Vec<String> {
    vec![
        format!("Sensación térmica: {}°C", num(reading.heat_index)),
        format!("Punto de rocío: {}°C", num(reading.dewpt)),
        format!("Enfriamiento por viento: {}°C", num(reading.wind_chill)),
    ]
}

/// Cards for the live dashboard
pub fn dashboard_cards(reading: &WeatherReading) -> Vec<WeatherCard> {
    vec![
        WeatherCard {
            icon: "🌡️",
            title: format!("Temperatura: {}°C", num(reading.temp)),
            main_value: None,
            details: temperature_details(reading),
            color: "#4A9EFF",
        },
        WeatherCard {
            icon: "💧",
            title: format!("Precipitación: {} mm/h", num(reading.precip_rate)),
            main_value: None,
            details: precipitation_details(reading),
            color: "#4CAF50",
        },
        WeatherCard {
            icon: "⬇️",
            title: format!("Presión atmosférica: {} hPa", num(reading.pressure)),
            main_value: None,
            details: vec![format!("Presión registrada: {} hPa", num(reading.pressure))],
            color: "#9C27B0",
        },
        WeatherCard {
            icon: "💨",
            title: format!("Viento: {} km/h", num(reading.wind_speed)),
            main_value: None,
            details: vec![format!("Ráfagas: {} km/h", num(reading.wind_gust))],
            color: "#FF9800",
        },
    ]
}

/// Cards for a stored day, each with its headline value
pub fn detail_cards(reading: &WeatherReading) -> Vec<WeatherCard> {
    let temp = format!("{}°C", num(reading.temp));
    let rate = format!("{} mm/h", num(reading.precip_rate));

    vec![
        WeatherCard {
            icon: "🌡️",
            title: format!("Temperatura {}", temp),
            main_value: Some(temp),
            details: temperature_details(reading),
            color: "#4A9EFF",
        },
        WeatherCard {
            icon: "💧",
            title: format!("Precipitación {}", rate),
            main_value: Some(rate),
            details: precipitation_details(reading),
            color: "#4CAF50",
        },
        WeatherCard {
            icon: "⬇️",
            title: "Presión".to_string(),
            main_value: Some(format!("{} hPa", num(reading.pressure))),
            details: Vec::new(),
            color: "#9C27B0",
        },
        WeatherCard {
            icon: "💨",
            title: "Viento".to_string(),
            main_value: Some(format!("{} km/h", num(reading.wind_speed))),
            details: vec![format!("Ráfagas: {} km/h", num(reading.wind_gust))],
            color: "#FF9800",
        },
    ]
}

/// Table rows; sea-level pressure only appears when reported.
pub fn general_data(reading: &WeatherReading) -> Vec<GeneralRow> {
    let row = |label, value: Option<f64>| GeneralRow {
        label,
        value: num(value),
    };

    let mut rows = vec![
        row("Dewpoint", reading.dewpt),
        row("HeatIndex", reading.heat_index),
        GeneralRow {
            label: "Humedad",
            value: format!("{}%", num(reading.humidity)),
        },
        row("Presión (local)", reading.pressure),
    ];

    if let Some(sea_level) = reading.pressure_sea_level.filter(|p| *p != 0.0) {
        rows.push(row("Presión (nivel del mar)", Some(sea_level)));
    }

    rows.extend([
        row("Precipitación", reading.precip_rate),
        row("Precipitación Total", reading.precip_total),
        row("Temperatura", reading.temp),
        row("Sensación Térmica", reading.heat_index),
        row("Ráfagas", reading.wind_gust),
        row("Velocidad del Viento", reading.wind_speed),
    ]);

    rows
}
