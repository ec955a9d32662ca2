//! Wire schemas
//!
//! One type per endpoint payload. Station data is loosely typed upstream
//! (nulls, numbers as strings, flags as 0/1 or booleans), so numeric fields
//! go through a lenient parser instead of failing the whole document.

use serde::de::{self, DeserializeOwned, Deserializer, Visitor};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// `statusCode` value of a successful login
pub const LOGIN_SUCCESS: i64 = 200;

// ============ Login ============

#[derive(Debug, Serialize)]
pub struct LoginRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct LoginEnvelope {
    #[serde(rename = "statusCode")]
    pub status_code: i64,
    #[serde(rename = "intData", default)]
    pub int_data: LoginData,
}

#[derive(Debug, Default, Deserialize)]
pub struct LoginData {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

// ============ Station data ============

/// One observation from the station
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherReading {
    #[serde(default, deserialize_with = "lenient_f64")]
    pub temp: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub heat_index: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub dewpt: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub wind_chill: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub wind_speed: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub wind_gust: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub humidity: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub pressure: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub pressure_sea_level: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub precip_rate: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub precip_total: Option<f64>,
    #[serde(default)]
    pub timestamp: Option<String>,
}

/// Model output or flag that arrives as either `true`/`false` or `0`/`1`
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Flag {
    Bool(bool),
    Number(f64),
}

impl Flag {
    pub fn is_set(self) -> bool {
        match self {
            Flag::Bool(b) => b,
            Flag::Number(n) => n == 1.0,
        }
    }
}

/// One day of the rain forecast
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ForecastDay {
    /// `YYYY-MM-DD`
    #[serde(default)]
    pub fecha: String,
    #[serde(default, deserialize_with = "lenient_flag")]
    pub llovera_modelo: Option<Flag>,
    #[serde(default)]
    pub condicion: Option<serde_json::Value>,
    #[serde(default, deserialize_with = "strict_number")]
    pub prob_lluvia_api: Option<f64>,
}

/// `history/index.json`
#[derive(Debug, Deserialize)]
pub struct HistoryIndex {
    #[serde(default)]
    pub files: Option<Vec<String>>,
}

/// Row of a remote history day, kept as-is for CSV export
pub type HistoryRow = BTreeMap<String, serde_json::Value>;

// ============ Flood reports ============

#[derive(Debug, Deserialize)]
pub struct FloodHistoryEnvelope {
    #[serde(rename = "intData", default)]
    pub int_data: FloodHistoryData,
}

#[derive(Debug, Default, Deserialize)]
pub struct FloodHistoryData {
    #[serde(default)]
    pub data: LenientList<FloodReportRecord>,
}

/// A flood report as stored by the backend
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FloodReportRecord {
    pub id: i64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub lat: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub lng: Option<f64>,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// Body of `POST /report_flood`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FloodReport {
    pub mensaje: String,
    pub ubicacion: String,
    pub fecha: String,
    pub temperatura: String,
    pub descripcion_clima: String,
}

// ============ Lenient parsing ============

/// JSON array read element by element. Malformed elements are logged and
/// skipped; `null` reads as empty.
#[derive(Debug, Clone, PartialEq)]
pub struct LenientList<T>(pub Vec<T>);

impl<T> Default for LenientList<T> {
    fn default() -> Self {
        Self(Vec::new())
    }
}

impl<T> LenientList<T> {
    pub fn into_inner(self) -> Vec<T> {
        self.0
    }
}

impl<'de, T: DeserializeOwned> Deserialize<'de> for LenientList<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let values = Option::<Vec<serde_json::Value>>::deserialize(deserializer)?;
        let mut items = Vec::new();
        for (index, value) in values.unwrap_or_default().into_iter().enumerate() {
            match serde_json::from_value(value) {
                Ok(item) => items.push(item),
                Err(e) => tracing::warn!(index, error = %e, "Skipping malformed element"),
            }
        }
        Ok(Self(items))
    }
}

/// Accepts numbers, numeric strings, null and empty strings.
fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    deserializer.deserialize_any(LenientNumber { accept_strings: true })
}

/// Accepts numbers only; anything else reads as absent.
fn strict_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    deserializer.deserialize_any(LenientNumber { accept_strings: false })
}

struct LenientNumber {
    accept_strings: bool,
}

impl<'de> Visitor<'de> for LenientNumber {
    type Value = Option<f64>;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a number, numeric string or null")
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
        Ok(Some(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
        Ok(Some(v as f64))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
        Ok(Some(v as f64))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        if !self.accept_strings {
            return Ok(None);
        }
        Ok(v.trim().parse::<f64>().ok())
    }

    fn visit_bool<E: de::Error>(self, _: bool) -> Result<Self::Value, E> {
        Ok(None)
    }

    fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(None)
    }

    fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(None)
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Self::Value, D::Error> {
        deserializer.deserialize_any(self)
    }

    fn visit_seq<A: de::SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
        while seq.next_element::<de::IgnoredAny>()?.is_some() {}
        Ok(None)
    }

    fn visit_map<A: de::MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
        while map.next_entry::<de::IgnoredAny, de::IgnoredAny>()?.is_some() {}
        Ok(None)
    }
}

fn lenient_flag<'de, D>(deserializer: D) -> Result<Option<Flag>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::Bool(b)) => Some(Flag::Bool(b)),
        Some(serde_json::Value::Number(n)) => n.as_f64().map(Flag::Number),
        _ => None,
    })
}
